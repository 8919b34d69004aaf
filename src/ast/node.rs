// Copyright (c) the Coral project contributors.

use super::NodeId;
use std::fmt;

/// A method or block parameter.
///
/// Parameters are plain data rather than child nodes: they carry no type of their own, and only
/// exist to be bound when a method is instantiated. A `restriction` is the optional type
/// annotation on the parameter (`value : T`), stored as the annotated name; it is resolved
/// against the receiver's type variables and the constant scope at instantiation time.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub restriction: Option<String>,
}

impl Param {
    pub fn new(name: &str) -> Self {
        Param {
            name: name.to_owned(),
            restriction: None,
        }
    }

    pub fn restricted(name: &str, restriction: &str) -> Self {
        Param {
            name: name.to_owned(),
            restriction: Some(restriction.to_owned()),
        }
    }
}

/// Distinguishes the four control-flow exits, which share a single node variant since they all
/// carry the same payload: zero or more value expressions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitKind {
    Return,
    Break,
    Next,
    Yield,
}

/// The kind of a node in the [syntax tree](super::SyntaxTree).
///
/// There is one variant per Coral grammar construct. Variants reference their children through
/// [`NodeId`]s; the tree owns every node, and child links always point "down" the tree.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// An ordered sequence of expressions. Its value is the value of its last child.
    Expressions { children: Vec<NodeId> },

    NilLiteral,
    BoolLiteral { value: bool },
    IntLiteral { value: i64 },
    /// A 32-bit float literal (`2.5f`).
    FloatLiteral { value: f64 },
    /// A 64-bit float literal (`2.5`). Plain decimal literals are double-precision.
    DoubleLiteral { value: f64 },
    CharLiteral { value: char },

    /// A named reference: a local variable, an instance variable (`@`-prefixed), or a constant
    /// (leading uppercase).
    Var { name: String },

    /// A class declaration or re-opening.
    ClassDef {
        name: String,
        type_params: Vec<String>,
        superclass: Option<String>,
        body: NodeId,
    },

    /// A method declaration. `receiver` is present for class-level methods (`def Foo.x`).
    Def {
        receiver: Option<NodeId>,
        name: String,
        params: Vec<Param>,
        body: NodeId,
    },

    /// An invocation. `targets` is empty until inference binds the monomorphized method
    /// instances this call dispatches to (one per union/hierarchy variant).
    Call {
        obj: Option<NodeId>,
        name: String,
        args: Vec<NodeId>,
        block: Option<NodeId>,
        targets: Vec<NodeId>,
    },

    /// A class constant applied to explicit type arguments: `Foo(Int)`.
    Generic { name: String, args: Vec<NodeId> },

    /// A two-armed conditional. A missing else arm is an empty `Expressions`.
    If { cond: NodeId, then: NodeId, els: NodeId },

    While { cond: NodeId, body: NodeId },

    Assign { target: NodeId, value: NodeId },

    /// A block argument attached to a call.
    Block { params: Vec<Param>, body: NodeId },

    /// `return` / `break` / `next` / `yield`, with zero or more value expressions.
    ControlExit { kind: ExitKind, exps: Vec<NodeId> },
}

/// A lightweight, payload-free discriminant for [`NodeKind`], used to drive visitor dispatch
/// without holding a borrow of the tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeTag {
    Expressions,
    NilLiteral,
    BoolLiteral,
    IntLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    Var,
    ClassDef,
    Def,
    Call,
    Generic,
    If,
    While,
    Assign,
    Block,
    ControlExit,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Expressions { .. } => NodeTag::Expressions,
            NodeKind::NilLiteral => NodeTag::NilLiteral,
            NodeKind::BoolLiteral { .. } => NodeTag::BoolLiteral,
            NodeKind::IntLiteral { .. } => NodeTag::IntLiteral,
            NodeKind::FloatLiteral { .. } => NodeTag::FloatLiteral,
            NodeKind::DoubleLiteral { .. } => NodeTag::DoubleLiteral,
            NodeKind::CharLiteral { .. } => NodeTag::CharLiteral,
            NodeKind::Var { .. } => NodeTag::Var,
            NodeKind::ClassDef { .. } => NodeTag::ClassDef,
            NodeKind::Def { .. } => NodeTag::Def,
            NodeKind::Call { .. } => NodeTag::Call,
            NodeKind::Generic { .. } => NodeTag::Generic,
            NodeKind::If { .. } => NodeTag::If,
            NodeKind::While { .. } => NodeTag::While,
            NodeKind::Assign { .. } => NodeTag::Assign,
            NodeKind::Block { .. } => NodeTag::Block,
            NodeKind::ControlExit { .. } => NodeTag::ControlExit,
        }
    }

    /// Returns this node's children, in traversal order.
    ///
    /// The order is fixed per variant: `If` yields cond, then, else; `Call` yields the receiver,
    /// each argument, then the block; `Def` yields the receiver, then the body.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Expressions { children } => children.clone(),
            NodeKind::NilLiteral
            | NodeKind::BoolLiteral { .. }
            | NodeKind::IntLiteral { .. }
            | NodeKind::FloatLiteral { .. }
            | NodeKind::DoubleLiteral { .. }
            | NodeKind::CharLiteral { .. }
            | NodeKind::Var { .. } => Vec::new(),
            NodeKind::ClassDef { body, .. } => vec![*body],
            NodeKind::Def { receiver, body, .. } => {
                let mut children = Vec::new();
                children.extend(receiver.iter().copied());
                children.push(*body);
                children
            }
            NodeKind::Call { obj, args, block, .. } => {
                let mut children = Vec::new();
                children.extend(obj.iter().copied());
                children.extend(args.iter().copied());
                children.extend(block.iter().copied());
                children
            }
            NodeKind::Generic { args, .. } => args.clone(),
            NodeKind::If { cond, then, els } => vec![*cond, *then, *els],
            NodeKind::While { cond, body } => vec![*cond, *body],
            NodeKind::Assign { target, value } => vec![*target, *value],
            NodeKind::Block { body, .. } => vec![*body],
            NodeKind::ControlExit { exps, .. } => exps.clone(),
        }
    }
}

impl fmt::Display for NodeTag {
    /// Writes the name of this tag's variant to the given formatter (pascal cased).
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Returns true if `name` names an instance variable (`@`-prefixed).
pub fn is_instance_var(name: &str) -> bool {
    name.starts_with('@')
}

/// Returns true if `name` names a constant (leading uppercase).
pub fn is_constant(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
