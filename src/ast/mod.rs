// Copyright (c) the Coral project contributors.

//! The syntax tree handed to the inference core by the parser.
//!
//! The tree is a flat arena: every node lives in a single `Vec` and is addressed by a stable
//! [`NodeId`]. Child links always point down the tree, and every node carries a `parent`
//! back-link that is maintained by the constructors. Parents are pure back-references for
//! scope-walking; ownership is strictly top-down.
//!
//! Nodes are created through the constructor methods on [`SyntaxTree`] (`int_literal`, `call`,
//! `class_def`, ...), which is the interface parsers build against.

pub mod node;

use crate::module::TypeId;
use crate::span::Span;
pub use node::{ExitKind, NodeKind, NodeTag, Param};

/// The index of a node in its [`SyntaxTree`]. Stable for the lifetime of the tree.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A single node: its kind, optional source span, parent back-link, and the type slot that
/// inference fills in.
#[derive(Debug)]
pub struct AstNode {
    pub kind: NodeKind,
    pub span: Option<Span>,
    pub parent: Option<NodeId>,
    pub ty: Option<TypeId>,
}

/// Owns every node of a parsed program as a flattened vector.
///
/// Nodes are stored in the order they're created, but this order shouldn't be relied upon;
/// method instantiation appends typed clones of method bodies after parsing is done.
#[derive(Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<AstNode>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0]
    }

    /// Returns the inferred type of a node, if inference has assigned one.
    pub fn ty(&self, id: NodeId) -> Option<TypeId> {
        self.nodes[id.0].ty
    }

    pub fn set_ty(&mut self, id: NodeId, ty: TypeId) {
        self.nodes[id.0].ty = Some(ty);
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.0].span = Some(span);
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Returns a node's children in traversal order.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0].kind.children()
    }

    /// Returns the method instances a call dispatches to. Empty until inference has run.
    pub fn call_targets(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Call { targets, .. } => targets,
            _ => &[],
        }
    }

    /// Returns the first (and for single dispatch, only) method instance a call resolved to.
    pub fn target_def(&self, id: NodeId) -> Option<NodeId> {
        self.call_targets(id).first().copied()
    }

    pub(crate) fn set_call_targets(&mut self, id: NodeId, new_targets: Vec<NodeId>) {
        if let NodeKind::Call { targets, .. } = &mut self.nodes[id.0].kind {
            *targets = new_targets;
        }
    }

    /// Adds a node to the tree and re-parents its children onto it.
    fn add(&mut self, kind: NodeKind) -> NodeId {
        self.add_with_span(kind, None)
    }

    fn add_with_span(&mut self, kind: NodeKind, span: Option<Span>) -> NodeId {
        let id = NodeId(self.nodes.len());
        for child in kind.children() {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(AstNode {
            kind,
            span,
            parent: None,
            ty: None,
        });
        id
    }

    // ===========================================================================================
    // Node constructors. These are the parser's interface: each binds the parent link on every
    // child it's given.
    // ===========================================================================================

    pub fn nil_literal(&mut self) -> NodeId {
        self.add(NodeKind::NilLiteral)
    }

    pub fn bool_literal(&mut self, value: bool) -> NodeId {
        self.add(NodeKind::BoolLiteral { value })
    }

    pub fn int_literal(&mut self, value: i64) -> NodeId {
        self.add(NodeKind::IntLiteral { value })
    }

    pub fn float_literal(&mut self, value: f64) -> NodeId {
        self.add(NodeKind::FloatLiteral { value })
    }

    pub fn double_literal(&mut self, value: f64) -> NodeId {
        self.add(NodeKind::DoubleLiteral { value })
    }

    pub fn char_literal(&mut self, value: char) -> NodeId {
        self.add(NodeKind::CharLiteral { value })
    }

    pub fn var(&mut self, name: &str) -> NodeId {
        self.add(NodeKind::Var { name: name.to_owned() })
    }

    pub fn expressions(&mut self, children: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Expressions { children })
    }

    /// Normalizes a list of nodes into a single node:
    /// - an empty list becomes an empty `Expressions`,
    /// - a single `Expressions` node is passed through unchanged,
    /// - a single node of any other kind is wrapped,
    /// - several nodes become an `Expressions` sequence.
    pub fn expressions_from(&mut self, nodes: Vec<NodeId>) -> NodeId {
        if let [single] = nodes.as_slice() {
            if matches!(self.nodes[single.0].kind, NodeKind::Expressions { .. }) {
                return *single;
            }
        }
        self.expressions(nodes)
    }

    pub fn class_def(
        &mut self,
        name: &str,
        type_params: Vec<&str>,
        superclass: Option<&str>,
        body: NodeId,
    ) -> NodeId {
        self.add(NodeKind::ClassDef {
            name: name.to_owned(),
            type_params: type_params.into_iter().map(str::to_owned).collect(),
            superclass: superclass.map(str::to_owned),
            body,
        })
    }

    pub fn method(&mut self, receiver: Option<NodeId>, name: &str, params: Vec<Param>, body: NodeId) -> NodeId {
        self.add(NodeKind::Def {
            receiver,
            name: name.to_owned(),
            params,
            body,
        })
    }

    pub fn call(&mut self, obj: Option<NodeId>, name: &str, args: Vec<NodeId>, block: Option<NodeId>) -> NodeId {
        self.add(NodeKind::Call {
            obj,
            name: name.to_owned(),
            args,
            block,
            targets: Vec::new(),
        })
    }

    pub fn generic(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Generic {
            name: name.to_owned(),
            args,
        })
    }

    pub fn if_expr(&mut self, cond: NodeId, then: NodeId, els: NodeId) -> NodeId {
        self.add(NodeKind::If { cond, then, els })
    }

    pub fn while_expr(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.add(NodeKind::While { cond, body })
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.add(NodeKind::Assign { target, value })
    }

    pub fn block(&mut self, params: Vec<Param>, body: NodeId) -> NodeId {
        self.add(NodeKind::Block { params, body })
    }

    pub fn return_expr(&mut self, exps: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::ControlExit {
            kind: ExitKind::Return,
            exps,
        })
    }

    pub fn break_expr(&mut self, exps: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::ControlExit {
            kind: ExitKind::Break,
            exps,
        })
    }

    pub fn next_expr(&mut self, exps: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::ControlExit {
            kind: ExitKind::Next,
            exps,
        })
    }

    pub fn yield_expr(&mut self, exps: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::ControlExit {
            kind: ExitKind::Yield,
            exps,
        })
    }

    // ===========================================================================================
    // Tree operations.
    // ===========================================================================================

    /// Deep-copies the subtree rooted at `id` and returns the copy's root.
    ///
    /// Spans are preserved. Parent links inside the copy point at copied nodes, so the two
    /// subtrees share no structure. Inferred types and call targets are cleared: a clone exists
    /// to be typed afresh, as a method instance specialized to new argument types.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let span = self.nodes[id.0].span.clone();
        let kind = self.nodes[id.0].kind.clone();
        let cloned_kind = match kind {
            NodeKind::Expressions { children } => NodeKind::Expressions {
                children: children.into_iter().map(|c| self.clone_subtree(c)).collect(),
            },
            leaf @ (NodeKind::NilLiteral
            | NodeKind::BoolLiteral { .. }
            | NodeKind::IntLiteral { .. }
            | NodeKind::FloatLiteral { .. }
            | NodeKind::DoubleLiteral { .. }
            | NodeKind::CharLiteral { .. }
            | NodeKind::Var { .. }) => leaf,
            NodeKind::ClassDef {
                name,
                type_params,
                superclass,
                body,
            } => NodeKind::ClassDef {
                name,
                type_params,
                superclass,
                body: self.clone_subtree(body),
            },
            NodeKind::Def {
                receiver,
                name,
                params,
                body,
            } => NodeKind::Def {
                receiver: receiver.map(|r| self.clone_subtree(r)),
                name,
                params,
                body: self.clone_subtree(body),
            },
            NodeKind::Call {
                obj,
                name,
                args,
                block,
                targets: _,
            } => NodeKind::Call {
                obj: obj.map(|o| self.clone_subtree(o)),
                name,
                args: args.into_iter().map(|a| self.clone_subtree(a)).collect(),
                block: block.map(|b| self.clone_subtree(b)),
                targets: Vec::new(),
            },
            NodeKind::Generic { name, args } => NodeKind::Generic {
                name,
                args: args.into_iter().map(|a| self.clone_subtree(a)).collect(),
            },
            NodeKind::If { cond, then, els } => NodeKind::If {
                cond: self.clone_subtree(cond),
                then: self.clone_subtree(then),
                els: self.clone_subtree(els),
            },
            NodeKind::While { cond, body } => NodeKind::While {
                cond: self.clone_subtree(cond),
                body: self.clone_subtree(body),
            },
            NodeKind::Assign { target, value } => NodeKind::Assign {
                target: self.clone_subtree(target),
                value: self.clone_subtree(value),
            },
            NodeKind::Block { params, body } => NodeKind::Block {
                params,
                body: self.clone_subtree(body),
            },
            NodeKind::ControlExit { kind, exps } => NodeKind::ControlExit {
                kind,
                exps: exps.into_iter().map(|e| self.clone_subtree(e)).collect(),
            },
        };
        self.add_with_span(cloned_kind, span)
    }

    /// Compares two subtrees structurally: kinds, names, literal values, and children, in order.
    /// Spans, parent links, inferred types, and call targets are ignored.
    pub fn structurally_equal(&self, a: NodeId, b: NodeId) -> bool {
        let eq_opt = |x: &Option<NodeId>, y: &Option<NodeId>| match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => self.structurally_equal(*x, *y),
            _ => false,
        };
        let eq_all = |xs: &[NodeId], ys: &[NodeId]| {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.structurally_equal(*x, *y))
        };

        match (&self.nodes[a.0].kind, &self.nodes[b.0].kind) {
            (NodeKind::Expressions { children: x }, NodeKind::Expressions { children: y }) => eq_all(x, y),
            (NodeKind::NilLiteral, NodeKind::NilLiteral) => true,
            (NodeKind::BoolLiteral { value: x }, NodeKind::BoolLiteral { value: y }) => x == y,
            (NodeKind::IntLiteral { value: x }, NodeKind::IntLiteral { value: y }) => x == y,
            (NodeKind::FloatLiteral { value: x }, NodeKind::FloatLiteral { value: y }) => {
                x.to_bits() == y.to_bits()
            }
            (NodeKind::DoubleLiteral { value: x }, NodeKind::DoubleLiteral { value: y }) => {
                x.to_bits() == y.to_bits()
            }
            (NodeKind::CharLiteral { value: x }, NodeKind::CharLiteral { value: y }) => x == y,
            (NodeKind::Var { name: x }, NodeKind::Var { name: y }) => x == y,
            (
                NodeKind::ClassDef {
                    name: n1,
                    type_params: t1,
                    superclass: s1,
                    body: b1,
                },
                NodeKind::ClassDef {
                    name: n2,
                    type_params: t2,
                    superclass: s2,
                    body: b2,
                },
            ) => n1 == n2 && t1 == t2 && s1 == s2 && self.structurally_equal(*b1, *b2),
            (
                NodeKind::Def {
                    receiver: r1,
                    name: n1,
                    params: p1,
                    body: b1,
                },
                NodeKind::Def {
                    receiver: r2,
                    name: n2,
                    params: p2,
                    body: b2,
                },
            ) => n1 == n2 && p1 == p2 && eq_opt(r1, r2) && self.structurally_equal(*b1, *b2),
            (
                NodeKind::Call {
                    obj: o1,
                    name: n1,
                    args: a1,
                    block: bl1,
                    ..
                },
                NodeKind::Call {
                    obj: o2,
                    name: n2,
                    args: a2,
                    block: bl2,
                    ..
                },
            ) => n1 == n2 && eq_opt(o1, o2) && eq_all(a1, a2) && eq_opt(bl1, bl2),
            (NodeKind::Generic { name: n1, args: a1 }, NodeKind::Generic { name: n2, args: a2 }) => {
                n1 == n2 && eq_all(a1, a2)
            }
            (
                NodeKind::If {
                    cond: c1,
                    then: t1,
                    els: e1,
                },
                NodeKind::If {
                    cond: c2,
                    then: t2,
                    els: e2,
                },
            ) => {
                self.structurally_equal(*c1, *c2)
                    && self.structurally_equal(*t1, *t2)
                    && self.structurally_equal(*e1, *e2)
            }
            (NodeKind::While { cond: c1, body: b1 }, NodeKind::While { cond: c2, body: b2 }) => {
                self.structurally_equal(*c1, *c2) && self.structurally_equal(*b1, *b2)
            }
            (
                NodeKind::Assign { target: t1, value: v1 },
                NodeKind::Assign { target: t2, value: v2 },
            ) => self.structurally_equal(*t1, *t2) && self.structurally_equal(*v1, *v2),
            (NodeKind::Block { params: p1, body: b1 }, NodeKind::Block { params: p2, body: b2 }) => {
                p1 == p2 && self.structurally_equal(*b1, *b2)
            }
            (
                NodeKind::ControlExit { kind: k1, exps: e1 },
                NodeKind::ControlExit { kind: k2, exps: e2 },
            ) => k1 == k2 && eq_all(e1, e2),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_bind_parent_links() {
        let mut tree = SyntaxTree::new();
        let cond = tree.bool_literal(true);
        let then = tree.int_literal(1);
        let els = tree.int_literal(2);
        let if_id = tree.if_expr(cond, then, els);

        assert_eq!(tree.parent(cond), Some(if_id));
        assert_eq!(tree.parent(then), Some(if_id));
        assert_eq!(tree.parent(els), Some(if_id));
        assert_eq!(tree.parent(if_id), None);
    }

    #[test]
    fn expressions_from_normalizes() {
        let mut tree = SyntaxTree::new();

        // An empty list becomes an empty sequence.
        let empty = tree.expressions_from(Vec::new());
        assert!(matches!(&tree.node(empty).kind, NodeKind::Expressions { children } if children.is_empty()));

        // A single sequence is passed through unchanged.
        let one = tree.int_literal(1);
        let seq = tree.expressions(vec![one]);
        assert_eq!(tree.expressions_from(vec![seq]), seq);

        // A single non-sequence node is wrapped.
        let two = tree.int_literal(2);
        let wrapped = tree.expressions_from(vec![two]);
        assert!(matches!(&tree.node(wrapped).kind, NodeKind::Expressions { children } if children == &[two]));
    }

    #[test]
    fn clone_preserves_structure_and_rewires_parents() {
        let mut tree = SyntaxTree::new();
        let value = tree.int_literal(7);
        let target = tree.var("x");
        let assign = tree.assign(target, value);

        let copy = tree.clone_subtree(assign);

        assert_ne!(copy, assign);
        assert!(tree.structurally_equal(copy, assign));
        assert_eq!(tree.parent(copy), None);

        // The copy's children must point back at the copy, not the original.
        for child in tree.children_of(copy) {
            assert_eq!(tree.parent(child), Some(copy));
            assert!(!tree.children_of(assign).contains(&child));
        }
    }

    #[test]
    fn structural_equality_ignores_spans() {
        let mut tree = SyntaxTree::new();
        let a = tree.int_literal(1);
        let b = tree.int_literal(1);
        tree.set_span(
            b,
            crate::span::Span::new((1, 1).into(), (1, 2).into(), "main.coral"),
        );

        assert!(tree.structurally_equal(a, b));

        let c = tree.int_literal(2);
        assert!(!tree.structurally_equal(a, c));
    }
}
