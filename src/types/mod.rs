// Copyright (c) the Coral project contributors.

//! The type lattice: nominal classes (including primitives and generic instantiations),
//! tagged unions, and hierarchy types.
//!
//! Types are owned by the [`Module`](crate::module::Module) and addressed by
//! [`TypeId`](crate::module::TypeId); all interning and identity comparison happens there.
//! Instance-variable maps refer to other types by id, never by value, which is what lets
//! self-referential classes (`Node` with `@next : Nil|Node`) exist without ownership cycles.

use crate::ast::NodeId;
use crate::diagnostics::Error;
use crate::module::TypeId;
use convert_case::{Case, Casing};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An entry in a class's method table: enough to match a call without touching the syntax tree.
#[derive(Clone, Debug)]
pub struct MethodSlot {
    pub name: String,
    pub arity: usize,
    pub def: NodeId,
}

/// A nominal class type.
///
/// Primitives, user classes, uninstantiated generic classes, and generic instantiations are all
/// `ClassType`s:
/// - a primitive or plain user class has empty `type_params` and no `generic_origin`;
/// - an uninstantiated generic class has non-empty `type_params` (it is not usable as an
///   expression type by itself);
/// - an instantiation has a `generic_origin` and carries its `type_vars` bindings. Method
///   tables live on the origin; instance variables live on the instantiation.
#[derive(Debug, Default)]
pub struct ClassType {
    pub name: String,
    /// `None` only for `Object`, the hierarchy root.
    pub superclass: Option<TypeId>,
    /// Ordered type parameter names of a generic class.
    pub type_params: Vec<String>,
    /// The generic class this type instantiates, if any.
    pub generic_origin: Option<TypeId>,
    /// The ordered `(parameter, argument)` bindings of an instantiation.
    pub type_vars: Vec<(String, TypeId)>,
    /// Instance variable types, keyed by `@`-prefixed name.
    pub ivars: BTreeMap<String, TypeId>,
    pub methods: Vec<MethodSlot>,
    /// Class-level methods (`def Foo.x`).
    pub metaclass_methods: Vec<MethodSlot>,
    /// Class constants nested inside this class's body.
    pub constants: HashMap<String, TypeId>,
    /// Direct subclasses, in declaration order. Drives hierarchy dispatch.
    pub subclasses: Vec<TypeId>,
    /// Synthesized zero-argument constructor/allocator defs, created on first use so that
    /// `new`/`allocate` calls always have a target to bind.
    pub synthesized_initialize: Option<NodeId>,
    pub synthesized_allocate: Option<NodeId>,
}

impl ClassType {
    /// Returns true for a generic class that hasn't been applied to type arguments yet.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Looks up a type-var binding on an instantiation.
    pub fn type_var(&self, name: &str) -> Option<TypeId> {
        self.type_vars
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, ty)| *ty)
    }

    /// Registers a method slot. A slot with the same name and arity is replaced; returns true
    /// when a replacement happened.
    pub fn add_method(&mut self, slot: MethodSlot) -> bool {
        add_slot(&mut self.methods, slot)
    }

    /// Registers a class-level method slot, with the same replacement rule as [`add_method`].
    ///
    /// [`add_method`]: Self::add_method
    pub fn add_metaclass_method(&mut self, slot: MethodSlot) -> bool {
        add_slot(&mut self.metaclass_methods, slot)
    }
}

pub(crate) fn add_slot(slots: &mut Vec<MethodSlot>, slot: MethodSlot) -> bool {
    if let Some(existing) = slots.iter_mut().find(|s| s.name == slot.name && s.arity == slot.arity) {
        *existing = slot;
        true
    } else {
        slots.push(slot);
        false
    }
}

/// A tagged union of two or more distinct types.
///
/// Members are stored sorted by id so that equality (and the interning key) is insensitive to
/// the order members were supplied in. Members are never themselves unions; `union_of`
/// flattens before interning.
#[derive(Debug)]
pub struct UnionType {
    pub members: Vec<TypeId>,
}

/// The covering type for a class and all its transitive subclasses. One per root class.
#[derive(Debug)]
pub struct HierarchyType {
    pub base: TypeId,
}

/// Represents an entry in the module's type arena, one variant per kind of type.
#[derive(Debug)]
pub enum TypeNode {
    Class(ClassType),
    Union(UnionType),
    Hierarchy(HierarchyType),
}

impl fmt::Display for TypeNode {
    /// Writes the identifier of this node's variant to the given formatter (pascal cased).
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TypeNode::Class(_) => "Class",
            TypeNode::Union(_) => "Union",
            TypeNode::Hierarchy(_) => "Hierarchy",
        };
        write!(f, "{name}")
    }
}

// Helper macro for generating `TryFrom` conversion functions to unwrap `TypeNode`s to concrete
// types, when the kind of type the node is holding is known.
macro_rules! generate_try_from_type_node_impl {
    ($variant:ident, $to_type:ty) => {
        impl<'a> TryFrom<&'a TypeNode> for &'a $to_type {
            type Error = Error;

            /// Attempts to unwrap a type node to the specified concrete kind.
            fn try_from(node: &'a TypeNode) -> Result<&'a $to_type, Self::Error> {
                if let TypeNode::$variant(x) = node {
                    Ok(x)
                } else {
                    Err(Error::TypeKindMismatch {
                        expected: stringify!($variant).to_case(Case::Lower),
                        actual: node.to_string().to_case(Case::Lower),
                    })
                }
            }
        }

        impl<'a> TryFrom<&'a mut TypeNode> for &'a mut $to_type {
            type Error = Error;

            /// Attempts to unwrap a type node to a mutable reference of the specified concrete kind.
            fn try_from(node: &'a mut TypeNode) -> Result<&'a mut $to_type, Self::Error> {
                if let TypeNode::$variant(x) = node {
                    Ok(x)
                } else {
                    Err(Error::TypeKindMismatch {
                        expected: stringify!($variant).to_case(Case::Lower),
                        actual: node.to_string().to_case(Case::Lower),
                    })
                }
            }
        }
    };
}

generate_try_from_type_node_impl!(Class, ClassType);
generate_try_from_type_node_impl!(Union, UnionType);
generate_try_from_type_node_impl!(Hierarchy, HierarchyType);
