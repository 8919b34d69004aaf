// Copyright (c) the Coral project contributors.

//! Generic class instantiation: explicit applications, constructor-driven type-variable
//! solving, and per-instantiation instance-variable maps.

use coralc::ast::Param;
use coralc::test_helpers::*;

// class Foo(T); def set(v : T); @coco = v; end; end
// f = Foo(Int).new
// f.set 2
// g = Foo(Double).new
// g.set 2.5
// g
#[test]
fn explicit_instantiations_type_their_ivars_independently() {
    let mut f_assign = None;
    let (mut session, root) = infer_program(|s| {
        let v = s.tree.var("v");
        let coco = s.tree.var("@coco");
        let assign = s.tree.assign(coco, v);
        let set_body = s.tree.expressions(vec![assign]);
        let set = s.tree.method(None, "set", vec![Param::restricted("v", "T")], set_body);
        let class_body = s.tree.expressions(vec![set]);
        let class = s.tree.class_def("Foo", vec!["T"], None, class_body);

        let int_arg = s.tree.var("Int");
        let foo_int = s.tree.generic("Foo", vec![int_arg]);
        let f_new = s.tree.call(Some(foo_int), "new", Vec::new(), None);
        let f = s.tree.var("f");
        let assign_f = s.tree.assign(f, f_new);
        f_assign = Some(assign_f);
        let f_read = s.tree.var("f");
        let two = s.tree.int_literal(2);
        let f_set = s.tree.call(Some(f_read), "set", vec![two], None);

        let double_arg = s.tree.var("Double");
        let foo_double = s.tree.generic("Foo", vec![double_arg]);
        let g_new = s.tree.call(Some(foo_double), "new", Vec::new(), None);
        let g = s.tree.var("g");
        let assign_g = s.tree.assign(g, g_new);
        let g_read = s.tree.var("g");
        let half = s.tree.double_literal(2.5);
        let g_set = s.tree.call(Some(g_read), "set", vec![half], None);
        let g_again = s.tree.var("g");

        vec![class, assign_f, f_set, assign_g, g_set, g_again]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    let (nil, int, double) = (session.module.nil(), session.module.int(), session.module.double());

    let f_type = session.tree.ty(f_assign.unwrap()).unwrap();
    assert_eq!(session.module.type_string(f_type), "Foo(Int)");
    assert_eq!(session.module.class(f_type).type_var("T"), Some(int));
    let expected_f = session.module.union_of(&[nil, int]);
    assert_eq!(session.module.ivar_type(f_type, "@coco"), Some(expected_f));

    let g_type = session.tree.ty(root).unwrap();
    assert_eq!(session.module.type_string(g_type), "Foo(Double)");
    assert_eq!(session.module.class(g_type).type_var("T"), Some(double));
    let expected_g = session.module.union_of(&[nil, double]);
    assert_eq!(session.module.ivar_type(g_type, "@coco"), Some(expected_g));

    // The two instantiations share a generic class but not an ivar map.
    assert_ne!(f_type, g_type);
}

// class Box(T); def initialize(x, value : T); @value = value; end; end
// Box.new(1, false)
#[test]
fn constructors_solve_type_variables_from_their_restricted_parameters() {
    let (mut session, root) = infer_program(|s| {
        let value = s.tree.var("value");
        let ivar = s.tree.var("@value");
        let assign = s.tree.assign(ivar, value);
        let init_body = s.tree.expressions(vec![assign]);
        let params = vec![Param::new("x"), Param::restricted("value", "T")];
        let init = s.tree.method(None, "initialize", params, init_body);
        let class_body = s.tree.expressions(vec![init]);
        let class = s.tree.class_def("Box", vec!["T"], None, class_body);

        let receiver = s.tree.var("Box");
        let one = s.tree.int_literal(1);
        let no = s.tree.bool_literal(false);
        let new = s.tree.call(Some(receiver), "new", vec![one, no], None);
        vec![class, new]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    let (nil, bool_) = (session.module.nil(), session.module.bool());
    let box_type = session.tree.ty(root).unwrap();
    assert_eq!(session.module.type_string(box_type), "Box(Bool)");
    assert_eq!(session.module.class(box_type).type_var("T"), Some(bool_));
    let expected = session.module.union_of(&[nil, bool_]);
    assert_eq!(session.module.ivar_type(box_type, "@value"), Some(expected));
}

// Two `Foo(Int)` applications anywhere in the program denote the same type.
#[test]
fn equal_applications_are_identity_equal() {
    let mut first = None;
    let (session, root) = infer_program(|s| {
        let body = s.tree.expressions(Vec::new());
        let class = s.tree.class_def("Foo", vec!["T"], None, body);

        let int_one = s.tree.var("Int");
        let apply_one = s.tree.generic("Foo", vec![int_one]);
        first = Some(apply_one);
        let int_two = s.tree.var("Int");
        let apply_two = s.tree.generic("Foo", vec![int_two]);
        vec![class, apply_one, apply_two]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    assert_eq!(session.tree.ty(first.unwrap()), session.tree.ty(root));
}
