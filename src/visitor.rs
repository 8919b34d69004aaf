// Copyright (c) the Coral project contributors.

//! The double-dispatch protocol every analysis pass is written against.
//!
//! A visitor exposes one `visit_<kind>` and one `end_visit_<kind>` function per node variant.
//! [`accept`] calls `visit_<kind>` pre-order; when it returns `true` the node's children are
//! visited in their fixed order (see [`NodeKind::children`](crate::ast::NodeKind::children));
//! `end_visit_<kind>` is then called post-order. Any method may return a [`Diagnostic`] to
//! abort the walk, which is how inference reports its single fatal fault.

use crate::ast::{NodeId, NodeTag, SyntaxTree};
use crate::diagnostics::Diagnostic;

/// Generates the [`Visitor`] trait and the [`accept`] dispatch from one row per node variant.
macro_rules! generate_visitor {
    ($(($tag:ident, $visit_fn:ident, $end_visit_fn:ident)),* $(,)?) => {
        /// Base trait for all passes over the syntax tree. It provides default implementations
        /// for every method: `visit_*` descends, `end_visit_*` is inert.
        ///
        /// These functions should never be called directly by code outside of this module.
        /// Instead, visiting should be done by calling [`accept`] on a node, which dispatches to
        /// the node's `visit_*` function, walks through its children (when asked to), and then
        /// dispatches to its `end_visit_*` function.
        // Keep parameter names for doc generation, even if they're unused in the default implementations.
        #[allow(unused_variables)]
        pub trait Visitor {
            $(
                fn $visit_fn(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
                    Ok(true)
                }

                fn $end_visit_fn(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
                    Ok(())
                }
            )*
        }

        /// Visits the node `id` with `visitor`: `visit_<kind>` first, the node's children if it
        /// said to descend, and `end_visit_<kind>` last.
        pub fn accept(tree: &mut SyntaxTree, id: NodeId, visitor: &mut dyn Visitor) -> Result<(), Diagnostic> {
            let tag = tree.node(id).kind.tag();

            let descend = match tag {
                $(NodeTag::$tag => visitor.$visit_fn(tree, id)?,)*
            };

            if descend {
                accept_children(tree, id, visitor)?;
            }

            match tag {
                $(NodeTag::$tag => visitor.$end_visit_fn(tree, id),)*
            }
        }
    };
}

generate_visitor! {
    (Expressions, visit_expressions, end_visit_expressions),
    (NilLiteral, visit_nil_literal, end_visit_nil_literal),
    (BoolLiteral, visit_bool_literal, end_visit_bool_literal),
    (IntLiteral, visit_int_literal, end_visit_int_literal),
    (FloatLiteral, visit_float_literal, end_visit_float_literal),
    (DoubleLiteral, visit_double_literal, end_visit_double_literal),
    (CharLiteral, visit_char_literal, end_visit_char_literal),
    (Var, visit_var, end_visit_var),
    (ClassDef, visit_class_def, end_visit_class_def),
    (Def, visit_def, end_visit_def),
    (Call, visit_call, end_visit_call),
    (Generic, visit_generic, end_visit_generic),
    (If, visit_if, end_visit_if),
    (While, visit_while, end_visit_while),
    (Assign, visit_assign, end_visit_assign),
    (Block, visit_block, end_visit_block),
    (ControlExit, visit_control_exit, end_visit_control_exit),
}

/// Visits each of a node's children in order, without visiting the node itself.
pub fn accept_children(tree: &mut SyntaxTree, id: NodeId, visitor: &mut dyn Visitor) -> Result<(), Diagnostic> {
    for child in tree.children_of(id) {
        accept(tree, child, visitor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the order nodes are entered and left in.
    #[derive(Default)]
    struct OrderRecorder {
        entered: Vec<NodeId>,
        left: Vec<NodeId>,
        skip_while_bodies: bool,
    }

    impl Visitor for OrderRecorder {
        fn visit_if(&mut self, _tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
            self.entered.push(id);
            Ok(true)
        }

        fn end_visit_if(&mut self, _tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
            self.left.push(id);
            Ok(())
        }

        fn visit_int_literal(&mut self, _tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
            self.entered.push(id);
            Ok(true)
        }

        fn end_visit_int_literal(&mut self, _tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
            self.left.push(id);
            Ok(())
        }

        fn visit_bool_literal(&mut self, _tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
            self.entered.push(id);
            Ok(true)
        }

        fn visit_while(&mut self, _tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
            self.entered.push(id);
            Ok(!self.skip_while_bodies)
        }
    }

    #[test]
    fn traversal_is_preorder_for_visit_and_postorder_for_end_visit() {
        let mut tree = SyntaxTree::new();
        let cond = tree.bool_literal(true);
        let then = tree.int_literal(1);
        let els = tree.int_literal(2);
        let if_id = tree.if_expr(cond, then, els);

        let mut recorder = OrderRecorder::default();
        accept(&mut tree, if_id, &mut recorder).unwrap();

        // Pre-order: the `if` is entered first, then cond, then, else in their fixed order.
        assert_eq!(recorder.entered, vec![if_id, cond, then, els]);
        // Post-order: the `if` is left last.
        assert_eq!(recorder.left, vec![then, els, if_id]);
    }

    #[test]
    fn returning_false_prunes_children() {
        let mut tree = SyntaxTree::new();
        let cond = tree.bool_literal(true);
        let body = tree.int_literal(1);
        let while_id = tree.while_expr(cond, body);

        let mut recorder = OrderRecorder {
            skip_while_bodies: true,
            ..Default::default()
        };
        accept(&mut tree, while_id, &mut recorder).unwrap();

        assert_eq!(recorder.entered, vec![while_id]);
    }
}
