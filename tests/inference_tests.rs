// Copyright (c) the Coral project contributors.

//! End-to-end inference scenarios: programs are built the way the parser would build them,
//! inferred, and checked through the public surface of the session.

use coralc::ast::{NodeKind, Param};
use coralc::test_helpers::*;
use test_case::test_case;

#[test_case("nil", "Nil"; "nil literal")]
#[test_case("bool", "Bool"; "bool literal")]
#[test_case("int", "Int"; "int literal")]
#[test_case("float", "Float"; "float literal")]
#[test_case("double", "Double"; "double literal")]
#[test_case("char", "Char"; "char literal")]
fn literals_have_fixed_types(kind: &str, expected: &str) {
    let (session, ty) = assert_infers(|s| {
        vec![match kind {
            "nil" => s.tree.nil_literal(),
            "bool" => s.tree.bool_literal(true),
            "int" => s.tree.int_literal(1),
            "float" => s.tree.float_literal(2.5),
            "double" => s.tree.double_literal(2.5),
            "char" => s.tree.char_literal('a'),
            _ => unreachable!("unknown literal kind"),
        }]
    });
    assert_eq!(session.module.type_string(ty), expected);
}

// class Foo; end
// Foo.allocate
#[test]
fn allocate_returns_an_instance_of_the_class() {
    let (session, ty) = assert_infers(|s| {
        let body = s.tree.expressions(Vec::new());
        let class = s.tree.class_def("Foo", Vec::new(), None, body);
        let receiver = s.tree.var("Foo");
        let allocate = s.tree.call(Some(receiver), "allocate", Vec::new(), None);
        vec![class, allocate]
    });
    assert_eq!(Some(ty), session.module.lookup_constant("Foo"));
}

// class Foo; def coco; 1; end; end
// Foo.new.coco
#[test]
fn calling_a_method_on_a_new_instance_infers_its_return_type() {
    let (session, ty) = assert_infers(|s| {
        let one = s.tree.int_literal(1);
        let coco_body = s.tree.expressions(vec![one]);
        let coco = s.tree.method(None, "coco", Vec::new(), coco_body);
        let class_body = s.tree.expressions(vec![coco]);
        let class = s.tree.class_def("Foo", Vec::new(), None, class_body);

        let receiver = s.tree.var("Foo");
        let new = s.tree.call(Some(receiver), "new", Vec::new(), None);
        let call = s.tree.call(Some(new), "coco", Vec::new(), None);
        vec![class, call]
    });
    assert_eq!(ty, session.module.int());
}

// class Node; def add; if @next; @next.add; else; @next = Node.new; end; end; end
// n = Node.new
// n.add
// n
#[test]
fn recursive_class_through_an_instance_variable_terminates() {
    let (mut session, ty) = assert_infers(|s| {
        let cond = s.tree.var("@next");
        let then_receiver = s.tree.var("@next");
        let then = s.tree.call(Some(then_receiver), "add", Vec::new(), None);
        let ivar = s.tree.var("@next");
        let node_const = s.tree.var("Node");
        let new = s.tree.call(Some(node_const), "new", Vec::new(), None);
        let els = s.tree.assign(ivar, new);
        let if_expr = s.tree.if_expr(cond, then, els);
        let add_body = s.tree.expressions(vec![if_expr]);
        let add = s.tree.method(None, "add", Vec::new(), add_body);
        let class_body = s.tree.expressions(vec![add]);
        let class = s.tree.class_def("Node", Vec::new(), None, class_body);

        let n = s.tree.var("n");
        let node_const = s.tree.var("Node");
        let new = s.tree.call(Some(node_const), "new", Vec::new(), None);
        let n_assign = s.tree.assign(n, new);
        let n_call_receiver = s.tree.var("n");
        let n_add = s.tree.call(Some(n_call_receiver), "add", Vec::new(), None);
        let n_read = s.tree.var("n");
        vec![class, n_assign, n_add, n_read]
    });

    let node = session.module.lookup_constant("Node").unwrap();
    assert_eq!(ty, node);

    let nil = session.module.nil();
    let expected = session.module.union_of(&[nil, node]);
    assert_eq!(session.module.ivar_type(node, "@next"), Some(expected));
}

// class Foo; end
// class Bar < Foo; end
// a = Foo.new || Bar.new      (disjunctions reach inference as two-armed conditionals)
#[test]
fn disjunction_of_related_classes_collapses_to_the_hierarchy() {
    let (mut session, ty) = assert_infers(|s| {
        let foo_body = s.tree.expressions(Vec::new());
        let foo = s.tree.class_def("Foo", Vec::new(), None, foo_body);
        let bar_body = s.tree.expressions(Vec::new());
        let bar = s.tree.class_def("Bar", Vec::new(), Some("Foo"), bar_body);

        let cond = s.tree.bool_literal(true);
        let foo_const = s.tree.var("Foo");
        let then = s.tree.call(Some(foo_const), "new", Vec::new(), None);
        let bar_const = s.tree.var("Bar");
        let els = s.tree.call(Some(bar_const), "new", Vec::new(), None);
        let if_expr = s.tree.if_expr(cond, then, els);
        let a = s.tree.var("a");
        let assign = s.tree.assign(a, if_expr);
        vec![foo, bar, assign]
    });

    let foo = session.module.lookup_constant("Foo").unwrap();
    assert_eq!(ty, session.module.hierarchy_of(foo));
    assert_eq!(session.module.type_string(ty), "Foo+");
}

// class Foo; def tag; 1; end; end
// class Bar < Foo; def tag; 'b'; end; end
// a = Foo.new || Bar.new
// a.tag
#[test]
fn hierarchy_calls_dispatch_per_subclass_and_union_their_results() {
    let mut tag_call = None;
    let (mut session, root) = infer_program(|s| {
        let one = s.tree.int_literal(1);
        let foo_tag_body = s.tree.expressions(vec![one]);
        let foo_tag = s.tree.method(None, "tag", Vec::new(), foo_tag_body);
        let foo_body = s.tree.expressions(vec![foo_tag]);
        let foo = s.tree.class_def("Foo", Vec::new(), None, foo_body);

        let b = s.tree.char_literal('b');
        let bar_tag_body = s.tree.expressions(vec![b]);
        let bar_tag = s.tree.method(None, "tag", Vec::new(), bar_tag_body);
        let bar_body = s.tree.expressions(vec![bar_tag]);
        let bar = s.tree.class_def("Bar", Vec::new(), Some("Foo"), bar_body);

        let cond = s.tree.bool_literal(true);
        let foo_const = s.tree.var("Foo");
        let then = s.tree.call(Some(foo_const), "new", Vec::new(), None);
        let bar_const = s.tree.var("Bar");
        let els = s.tree.call(Some(bar_const), "new", Vec::new(), None);
        let if_expr = s.tree.if_expr(cond, then, els);
        let a = s.tree.var("a");
        let assign = s.tree.assign(a, if_expr);

        let a_read = s.tree.var("a");
        let call = s.tree.call(Some(a_read), "tag", Vec::new(), None);
        tag_call = Some(call);
        vec![foo, bar, assign, call]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    let int = session.module.int();
    let char_ = session.module.char();
    let expected = session.module.union_of(&[int, char_]);
    assert_eq!(session.tree.ty(root), Some(expected));

    // The call fans out to one instance per subclass in the family.
    assert_eq!(session.tree.call_targets(tag_call.unwrap()).len(), 2);
}

#[test]
fn while_loops_are_nil_typed() {
    let (session, ty) = assert_infers(|s| {
        let cond = s.tree.bool_literal(true);
        let body_exp = s.tree.int_literal(1);
        let body = s.tree.expressions(vec![body_exp]);
        let while_expr = s.tree.while_expr(cond, body);
        vec![while_expr]
    });
    assert_eq!(ty, session.module.nil());
}

#[test]
fn a_conditional_without_an_else_arm_includes_nil() {
    let (mut session, ty) = assert_infers(|s| {
        let cond = s.tree.bool_literal(true);
        let then = s.tree.int_literal(1);
        let els = s.tree.expressions(Vec::new());
        vec![s.tree.if_expr(cond, then, els)]
    });
    let (nil, int) = (session.module.nil(), session.module.int());
    assert_eq!(ty, session.module.union_of(&[nil, int]));
}

// def pick; if true; return 1; end; 'x'; end
// pick
#[test]
fn return_types_union_explicit_returns_with_the_tail_expression() {
    let (mut session, ty) = assert_infers(|s| {
        let one = s.tree.int_literal(1);
        let ret = s.tree.return_expr(vec![one]);
        let cond = s.tree.bool_literal(true);
        let els = s.tree.expressions(Vec::new());
        let if_expr = s.tree.if_expr(cond, ret, els);
        let tail = s.tree.char_literal('x');
        let body = s.tree.expressions(vec![if_expr, tail]);
        let pick = s.tree.method(None, "pick", Vec::new(), body);
        let call = s.tree.call(None, "pick", Vec::new(), None);
        vec![pick, call]
    });
    let (int, char_) = (session.module.int(), session.module.char());
    // The explicit return contributes Int; the body's tail expression contributes Char.
    assert_eq!(ty, session.module.union_of(&[int, char_]));
}

// def each; yield 1; end
// each { |x| x }
#[test]
fn yield_binds_block_parameters_from_the_yielded_types() {
    let (session, ty) = assert_infers(|s| {
        let one = s.tree.int_literal(1);
        let yield_expr = s.tree.yield_expr(vec![one]);
        let each_body = s.tree.expressions(vec![yield_expr]);
        let each = s.tree.method(None, "each", Vec::new(), each_body);

        let x = s.tree.var("x");
        let block_body = s.tree.expressions(vec![x]);
        let block = s.tree.block(vec![Param::new("x")], block_body);
        let call = s.tree.call(None, "each", Vec::new(), Some(block));
        vec![each, call]
    });
    // The block's parameter took the yielded Int, and the yield (and through it the method)
    // took the block body's type.
    assert_eq!(ty, session.module.int());
}

// def each; end
// each { |x| x }
#[test]
fn a_block_passed_to_a_method_that_never_yields_is_still_typed() {
    let mut block_parts = None;
    let (session, root) = infer_program(|s| {
        let each_body = s.tree.expressions(Vec::new());
        let each = s.tree.method(None, "each", Vec::new(), each_body);

        let x = s.tree.var("x");
        let block_body = s.tree.expressions(vec![x]);
        let block = s.tree.block(vec![Param::new("x")], block_body);
        let call = s.tree.call(None, "each", Vec::new(), Some(block));
        block_parts = Some((block, block_body, x));
        vec![each, call]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    // With no yield to supply bindings, the block's parameter and body fall back to `Nil`,
    // but nothing is left untyped.
    let nil = session.module.nil();
    let (block, body, x) = block_parts.unwrap();
    assert_eq!(session.tree.ty(block), Some(nil));
    assert_eq!(session.tree.ty(body), Some(nil));
    assert_eq!(session.tree.ty(x), Some(nil));
    assert_eq!(session.tree.ty(root), Some(nil));
}

// After successful inference every reachable expression carries a type, and every call a
// non-empty target list.
#[test]
fn inference_types_every_reachable_node_and_binds_every_call() {
    let (session, root) = infer_program(|s| {
        let one = s.tree.int_literal(1);
        let coco_body = s.tree.expressions(vec![one]);
        let coco = s.tree.method(None, "coco", Vec::new(), coco_body);
        let class_body = s.tree.expressions(vec![coco]);
        let class = s.tree.class_def("Foo", Vec::new(), None, class_body);

        let receiver = s.tree.var("Foo");
        let new = s.tree.call(Some(receiver), "new", Vec::new(), None);
        let call = s.tree.call(Some(new), "coco", Vec::new(), None);
        vec![class, call]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        assert!(session.tree.ty(id).is_some(), "node {id:?} was left untyped");

        match &session.tree.node(id).kind {
            // Method declarations are only typed per instantiation; follow the instances that
            // calls resolved to instead of the pristine definition.
            NodeKind::Def { .. } => continue,
            NodeKind::Call { .. } => {
                let targets = session.tree.call_targets(id);
                assert!(!targets.is_empty(), "call {id:?} has no target");
                pending.extend(targets.iter().copied());
            }
            _ => {}
        }
        pending.extend(session.tree.children_of(id));
    }
}

#[test]
fn clone_resets_inferred_types_and_call_targets() {
    let mut new_call = None;
    let (mut session, _) = infer_program(|s| {
        let body = s.tree.expressions(Vec::new());
        let class = s.tree.class_def("Foo", Vec::new(), None, body);
        let receiver = s.tree.var("Foo");
        let call = s.tree.call(Some(receiver), "new", Vec::new(), None);
        new_call = Some(call);
        vec![class, call]
    });
    assert!(!session.diagnostics.has_errors(), "{:?}", session.diagnostics);

    let call = new_call.unwrap();
    assert!(session.tree.ty(call).is_some());
    assert!(!session.tree.call_targets(call).is_empty());

    let copy = session.tree.clone_subtree(call);
    assert!(session.tree.structurally_equal(copy, call));
    assert!(session.tree.ty(copy).is_none());
    assert!(session.tree.call_targets(copy).is_empty());
}
