// Copyright (c) the Coral project contributors.

//! The root environment of a compilation.
//!
//! The [`Module`] owns every type as a flattened vector of [`TypeNode`]s, mirroring how the
//! syntax tree owns its nodes. All type construction goes through the module so that types can
//! be interned: generic instantiations with equal bindings, unions with equal member sets, and
//! the hierarchy type of a class are all id-equal wherever they appear.

use crate::ast::NodeId;
use crate::types::{add_slot, ClassType, HierarchyType, MethodSlot, TypeNode, UnionType};
use std::collections::HashMap;

/// The index of a type in its [`Module`]'s arena. Interned types compare equal by id.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The key under which a method instantiation is cached: the method's definition, the receiver
/// type (`None` for module-level methods), the argument types, and the call-site block (blocks
/// monomorphize per call site).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct InstanceKey {
    pub def: NodeId,
    pub receiver: Option<TypeId>,
    pub arg_types: Vec<TypeId>,
    pub block: Option<NodeId>,
}

/// A monomorphized method: a typed clone of the definition, specialized to one instantiation
/// key. The return type starts as `Nil` (the recursion placeholder) and is widened once the
/// body has been fully typed.
#[derive(Clone, Debug)]
pub struct MethodInstance {
    pub def: NodeId,
    pub return_type: TypeId,
}

/// The top-level environment: the type arena, the constant table, the module's own method
/// table, and the interning caches.
///
/// One module exists per compilation. It is created before inference (seeded with the
/// primitive classes), populated during inference, and discarded after the backend consumes it.
#[derive(Debug)]
pub struct Module {
    /// Stores every type in this compilation as a flattened vector of [`TypeNode`]s.
    types: Vec<TypeNode>,

    /// Maps top-level constant names to their types. Seeded with the primitives.
    constants: HashMap<String, TypeId>,

    /// Methods defined at the top level, callable without a receiver from anywhere.
    methods: Vec<MethodSlot>,

    /// Interning table for unions, keyed by the sorted member set.
    unions: HashMap<Vec<TypeId>, TypeId>,

    /// Interning table for hierarchy types, keyed by root class.
    hierarchies: HashMap<TypeId, TypeId>,

    /// Interning table for generic instantiations, keyed by class and ordered arguments.
    instantiations: HashMap<(TypeId, Vec<TypeId>), TypeId>,

    /// The method-instantiation cache. Entries are installed (with a `Nil` return type) before
    /// their bodies are typed, which is what terminates recursive instantiation.
    pub(crate) instances: HashMap<InstanceKey, MethodInstance>,
}

// The primitives are seeded into the arena in this fixed order.
const OBJECT: TypeId = TypeId(0);
const NIL: TypeId = TypeId(1);
const BOOL: TypeId = TypeId(2);
const INT: TypeId = TypeId(3);
const FLOAT: TypeId = TypeId(4);
const DOUBLE: TypeId = TypeId(5);
const CHAR: TypeId = TypeId(6);

impl Module {
    /// Creates a module that contains only the primitive classes.
    ///
    /// Primitive types are built in to the compiler. Since they aren't defined in Coral source,
    /// we 'define' them here, when the module is created, to ensure they're always available.
    pub fn create() -> Module {
        let mut module = Module {
            types: Vec::new(),
            constants: HashMap::new(),
            methods: Vec::new(),
            unions: HashMap::new(),
            hierarchies: HashMap::new(),
            instantiations: HashMap::new(),
            instances: HashMap::new(),
        };

        let object = module.add_primitive("Object", None);
        debug_assert_eq!(object, OBJECT);
        for (name, id) in [
            ("Nil", NIL),
            ("Bool", BOOL),
            ("Int", INT),
            ("Float", FLOAT),
            ("Double", DOUBLE),
            ("Char", CHAR),
        ] {
            let added = module.add_primitive(name, Some(object));
            debug_assert_eq!(added, id);
        }

        module
    }

    fn add_primitive(&mut self, name: &str, superclass: Option<TypeId>) -> TypeId {
        let class = ClassType {
            name: name.to_owned(),
            superclass,
            ..Default::default()
        };
        let id = self.add_type(TypeNode::Class(class));
        self.constants.insert(name.to_owned(), id);
        if let Some(parent) = superclass {
            self.class_mut(parent).subclasses.push(id);
        }
        id
    }

    // Primitive accessors.
    pub fn object(&self) -> TypeId {
        OBJECT
    }
    pub fn nil(&self) -> TypeId {
        NIL
    }
    pub fn bool(&self) -> TypeId {
        BOOL
    }
    pub fn int(&self) -> TypeId {
        INT
    }
    pub fn float(&self) -> TypeId {
        FLOAT
    }
    pub fn double(&self) -> TypeId {
        DOUBLE
    }
    pub fn char(&self) -> TypeId {
        CHAR
    }

    /// Moves a type into this module's arena and returns its id.
    pub(crate) fn add_type(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(node);
        id
    }

    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0]
    }

    /// Unwraps the type with the provided id as a class.
    ///
    /// # Panics
    ///
    /// If the id refers to a union or hierarchy type. This almost definitely indicates a
    /// mistake in the compiler's logic; use [`TryFrom`] on [`type_node`](Self::type_node) at
    /// call sites that legitimately don't know the kind.
    pub fn class(&self, id: TypeId) -> &ClassType {
        (&self.types[id.0])
            .try_into()
            .unwrap_or_else(|_| panic!("type {} is not a class", id.0))
    }

    pub fn class_mut(&mut self, id: TypeId) -> &mut ClassType {
        (&mut self.types[id.0])
            .try_into()
            .unwrap_or_else(|_| panic!("type {} is not a class", id.0))
    }

    /// Returns true if `id` refers to a class (of any flavor, including instantiations).
    pub fn is_class(&self, id: TypeId) -> bool {
        matches!(self.types[id.0], TypeNode::Class(_))
    }

    // ===========================================================================================
    // Constants and module-level methods.
    // ===========================================================================================

    pub fn lookup_constant(&self, name: &str) -> Option<TypeId> {
        self.constants.get(name).copied()
    }

    pub fn define_constant(&mut self, name: &str, id: TypeId) {
        self.constants.insert(name.to_owned(), id);
    }

    /// Registers a top-level method. Returns true if a slot was replaced.
    pub fn add_method(&mut self, slot: MethodSlot) -> bool {
        add_slot(&mut self.methods, slot)
    }

    /// Returns every top-level method slot named `name`.
    pub fn find_methods(&self, name: &str) -> Vec<MethodSlot> {
        self.methods.iter().filter(|s| s.name == name).cloned().collect()
    }

    // ===========================================================================================
    // Lattice operations.
    // ===========================================================================================

    /// Returns the tagged union of the given types.
    ///
    /// Union members are spliced in, duplicates are removed by identity, and a single surviving
    /// member is returned unchanged. When the surviving members are a class and its subclasses,
    /// the union collapses to the [hierarchy type](Self::hierarchy_of) of the common ancestor.
    pub fn union_of(&mut self, members: &[TypeId]) -> TypeId {
        let mut flattened = Vec::new();
        for &member in members {
            match &self.types[member.0] {
                TypeNode::Union(union) => flattened.extend(union.members.iter().copied()),
                _ => flattened.push(member),
            }
        }
        flattened.sort_unstable();
        flattened.dedup();

        match flattened.as_slice() {
            [] => self.nil(),
            [single] => *single,
            _ => {
                if let Some(root) = self.hierarchy_root_of(&flattened) {
                    return self.hierarchy_of(root);
                }
                if let Some(&id) = self.unions.get(&flattened) {
                    return id;
                }
                let id = self.add_type(TypeNode::Union(UnionType {
                    members: flattened.clone(),
                }));
                self.unions.insert(flattened, id);
                id
            }
        }
    }

    /// Finds the member (or hierarchy base) that is an ancestor of every other member, if one
    /// exists. Only class and hierarchy members can collapse.
    fn hierarchy_root_of(&self, members: &[TypeId]) -> Option<TypeId> {
        let mut roots = Vec::with_capacity(members.len());
        for &member in members {
            match &self.types[member.0] {
                TypeNode::Class(_) => roots.push(member),
                TypeNode::Hierarchy(hierarchy) => roots.push(hierarchy.base),
                TypeNode::Union(_) => return None,
            }
        }
        roots
            .iter()
            .copied()
            .find(|&candidate| roots.iter().all(|&root| self.is_ancestor(candidate, root)))
    }

    /// Returns the hierarchy type rooted at `class`, creating it on first request.
    pub fn hierarchy_of(&mut self, class: TypeId) -> TypeId {
        if let Some(&id) = self.hierarchies.get(&class) {
            return id;
        }
        let id = self.add_type(TypeNode::Hierarchy(HierarchyType { base: class }));
        self.hierarchies.insert(class, id);
        id
    }

    /// Returns the interned instantiation of the generic class `class` with the given ordered
    /// type arguments, creating it (with an empty instance-variable map) on a miss.
    pub fn generic_of(&mut self, class: TypeId, args: Vec<TypeId>) -> TypeId {
        if let Some(&id) = self.instantiations.get(&(class, args.clone())) {
            return id;
        }

        let origin = self.class(class);
        debug_assert_eq!(origin.type_params.len(), args.len());
        let instance = ClassType {
            name: origin.name.clone(),
            superclass: origin.superclass,
            generic_origin: Some(class),
            type_vars: origin.type_params.iter().cloned().zip(args.iter().copied()).collect(),
            ..Default::default()
        };
        let id = self.add_type(TypeNode::Class(instance));
        self.instantiations.insert((class, args), id);
        id
    }

    /// Returns true when `ancestor` appears on `descendant`'s superclass chain (a type is its
    /// own ancestor).
    pub fn is_ancestor(&self, ancestor: TypeId, descendant: TypeId) -> bool {
        let mut current = Some(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = match &self.types[id.0] {
                TypeNode::Class(class) => class.superclass,
                _ => None,
            };
        }
        false
    }

    /// Returns `class` and every transitive subclass of it, in declaration order.
    pub fn family_of(&self, class: TypeId) -> Vec<TypeId> {
        let mut family = vec![class];
        let mut cursor = 0;
        while cursor < family.len() {
            family.extend(self.class(family[cursor]).subclasses.iter().copied());
            cursor += 1;
        }
        family
    }

    // ===========================================================================================
    // Method and instance-variable lookup.
    // ===========================================================================================

    /// Walks the superclass chain of `receiver` collecting every method slot named `name`,
    /// nearest class first. Instantiations look through to their generic class's table.
    pub fn lookup_method(&self, receiver: TypeId, name: &str) -> Vec<MethodSlot> {
        let mut results = Vec::new();
        let mut current = Some(receiver);
        while let Some(id) = current {
            let TypeNode::Class(class) = &self.types[id.0] else { break };
            let holder = match class.generic_origin {
                Some(origin) => self.class(origin),
                None => class,
            };
            results.extend(holder.methods.iter().filter(|slot| slot.name == name).cloned());
            current = holder.superclass;
        }
        results
    }

    /// Like [`lookup_method`](Self::lookup_method), but over class-level method tables.
    pub fn lookup_metaclass_method(&self, class: TypeId, name: &str) -> Vec<MethodSlot> {
        let mut results = Vec::new();
        let mut current = Some(class);
        while let Some(id) = current {
            let TypeNode::Class(class) = &self.types[id.0] else { break };
            let holder = match class.generic_origin {
                Some(origin) => self.class(origin),
                None => class,
            };
            results.extend(
                holder
                    .metaclass_methods
                    .iter()
                    .filter(|slot| slot.name == name)
                    .cloned(),
            );
            current = holder.superclass;
        }
        results
    }

    /// Looks up the type of an instance variable on `class`. Only the class's own map is
    /// consulted; instance variables are not inherited.
    pub fn ivar_type(&self, class: TypeId, name: &str) -> Option<TypeId> {
        self.class(class).ivars.get(name).copied()
    }

    pub fn set_ivar_type(&mut self, class: TypeId, name: &str, ty: TypeId) {
        self.class_mut(class).ivars.insert(name.to_owned(), ty);
    }

    // ===========================================================================================
    // Rendering.
    // ===========================================================================================

    /// Renders a type's name the way diagnostics print it: `Foo`, `Box(Bool)`, `Nil|Node`,
    /// or `Foo+` for hierarchy types.
    pub fn type_string(&self, id: TypeId) -> String {
        match &self.types[id.0] {
            TypeNode::Class(class) => {
                if class.generic_origin.is_some() {
                    let args = class
                        .type_vars
                        .iter()
                        .map(|(_, arg)| self.type_string(*arg))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}({args})", class.name)
                } else if class.is_generic() {
                    format!("{}({})", class.name, class.type_params.join(", "))
                } else {
                    class.name.clone()
                }
            }
            TypeNode::Union(union) => union
                .members
                .iter()
                .map(|member| self.type_string(*member))
                .collect::<Vec<_>>()
                .join("|"),
            TypeNode::Hierarchy(hierarchy) => format!("{}+", self.class(hierarchy.base).name),
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::create()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_a_single_type_is_that_type() {
        let mut module = Module::create();
        let int = module.int();
        assert_eq!(module.union_of(&[int]), int);
        assert_eq!(module.union_of(&[int, int]), int);
    }

    #[test]
    fn unions_are_interned_and_order_insensitive() {
        let mut module = Module::create();
        let (int, nil, bool_) = (module.int(), module.nil(), module.bool());

        let a = module.union_of(&[nil, int]);
        let b = module.union_of(&[int, nil]);
        assert_eq!(a, b);

        let c = module.union_of(&[nil, int, bool_]);
        assert_ne!(a, c);
    }

    #[test]
    fn unions_of_unions_are_flattened() {
        let mut module = Module::create();
        let (int, nil, bool_) = (module.int(), module.nil(), module.bool());

        let inner = module.union_of(&[nil, int]);
        let flattened = module.union_of(&[inner, bool_]);
        let direct = module.union_of(&[nil, int, bool_]);
        assert_eq!(flattened, direct);
    }

    #[test]
    fn hierarchy_types_are_interned_per_root() {
        let mut module = Module::create();
        let int = module.int();
        assert_eq!(module.hierarchy_of(int), module.hierarchy_of(int));
    }

    #[test]
    fn generic_instantiations_with_equal_bindings_are_id_equal() {
        let mut module = Module::create();
        let object = module.object();
        let boxed = module.add_type(TypeNode::Class(ClassType {
            name: "Box".to_owned(),
            superclass: Some(object),
            type_params: vec!["T".to_owned()],
            ..Default::default()
        }));

        let int = module.int();
        let double = module.double();
        assert_eq!(module.generic_of(boxed, vec![int]), module.generic_of(boxed, vec![int]));
        assert_ne!(
            module.generic_of(boxed, vec![int]),
            module.generic_of(boxed, vec![double])
        );
    }

    #[test]
    fn type_strings_render_each_kind() {
        let mut module = Module::create();
        let (int, nil) = (module.int(), module.nil());
        assert_eq!(module.type_string(int), "Int");

        let union = module.union_of(&[nil, int]);
        assert_eq!(module.type_string(union), "Nil|Int");

        let hierarchy = module.hierarchy_of(int);
        assert_eq!(module.type_string(hierarchy), "Int+");
    }
}
