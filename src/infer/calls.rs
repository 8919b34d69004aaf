// Copyright (c) the Coral project contributors.

//! Call resolution and monomorphization.
//!
//! Each distinct `(method, receiver type, argument types, block)` combination gets its own
//! typed clone of the method body. Instances are installed in the module's cache with a `Nil`
//! return type *before* their bodies are typed, so recursive calls resolve against a sound
//! placeholder instead of diverging; the cached return type is widened once the body is done.
//!
//! Bodies are typed twice. The first, lenient pass tolerates resolution failures (typing them
//! `Nil`) while still performing instance-variable accumulation and nested instantiation; the
//! second, strict pass assigns the final types and reports the first fault. This is what makes
//! ivar typing flow-insensitive: an assignment in a later branch is visible to a use in an
//! earlier one by the time the strict pass runs.

use crate::ast::node::is_constant;
use crate::ast::{NodeId, NodeKind, Param, SyntaxTree};
use crate::diagnostics::{Diagnostic, Error};
use crate::module::{InstanceKey, MethodInstance, TypeId};
use crate::span::Span;
use crate::types::TypeNode;
use crate::visitor::accept;

use super::pass::TypeInference;

impl TypeInference<'_> {
    pub(crate) fn infer_call(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::Call {
            obj, args, name, block, ..
        } = tree.node(id).kind.clone()
        else {
            unreachable!("visit_call dispatched on a non-call node");
        };
        let span = tree.node(id).span.clone();

        // Infer the receiver and every argument to concrete types first.
        if let Some(obj) = obj {
            accept(tree, obj, self)?;
        }
        for arg in &args {
            accept(tree, *arg, self)?;
        }
        let arg_types: Vec<TypeId> = args.iter().map(|arg| self.type_of(tree, *arg)).collect();

        // The block itself is not an expression; it's typed `Nil` here and its body gets a
        // provisional typing with `Nil`-bound parameters. The yields of whichever method
        // instantiation receives the block re-type the body with the real bindings.
        if let Some(block) = block {
            let nil = self.module.nil();
            tree.set_ty(block, nil);
            self.pretype_block(tree, block)?;
        }

        let outcome = match obj {
            Some(obj) if is_class_reference(tree, obj) => {
                let class = self.type_of(tree, obj);
                self.infer_class_call(tree, class, &name, &arg_types, block, span.as_ref())
            }
            Some(obj) => {
                let receiver = self.type_of(tree, obj);
                self.infer_instance_call(tree, receiver, &name, &arg_types, block, span.as_ref())
            }
            None => self.infer_receiverless_call(tree, &name, &arg_types, block, span.as_ref()),
        };

        match outcome {
            Ok((ty, targets)) => {
                tree.set_ty(id, ty);
                tree.set_call_targets(id, targets);
            }
            Err(_) if self.lenient => {
                // The strict pass re-resolves this call after ivar accumulation has settled.
                let nil = self.module.nil();
                tree.set_ty(id, nil);
            }
            Err(fault) => return Err(fault),
        }
        Ok(())
    }

    /// Resolves `Foo(Int)`: an explicit application of a generic class to type arguments.
    pub(crate) fn infer_generic_apply(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::Generic { name, args } = tree.node(id).kind.clone() else {
            unreachable!("visit_generic dispatched on a non-generic node");
        };
        let span = tree.node(id).span.clone();

        for arg in &args {
            accept(tree, *arg, self)?;
        }

        let resolved = self.resolve_constant(&name).ok_or_else(|| {
            self.fault(Error::UninitializedConstant { identifier: name.clone() }, span.as_ref())
        });
        let class = self.suppress(resolved)?;

        if self.module.class(class).type_params.len() != args.len() {
            let fault = self.fault(Error::WrongNumberOfArguments, span.as_ref());
            let result = self.suppress(Err(fault))?;
            tree.set_ty(id, result);
            return Ok(());
        }

        let arg_types: Vec<TypeId> = args.iter().map(|arg| self.type_of(tree, *arg)).collect();
        let instantiation = self.module.generic_of(class, arg_types);
        tree.set_ty(id, instantiation);
        Ok(())
    }

    /// Dispatches a call whose receiver is a class constant: `new`, `allocate`, or a
    /// class-level method.
    fn infer_class_call(
        &mut self,
        tree: &mut SyntaxTree,
        class: TypeId,
        name: &str,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<(TypeId, Vec<NodeId>), Diagnostic> {
        match name {
            "new" => self.infer_new(tree, class, arg_types, block, span),
            "allocate" => self.infer_allocate(tree, class, arg_types, span),
            _ => {
                let slots = self.module.lookup_metaclass_method(class, name);
                if slots.is_empty() {
                    return Err(self.fault(
                        Error::UndefinedMethod {
                            method: name.to_owned(),
                            receiver: self.module.type_string(class),
                        },
                        span,
                    ));
                }
                let Some(slot) = slots.iter().find(|slot| slot.arity == arg_types.len()) else {
                    return Err(self.fault(Error::WrongNumberOfArguments, span));
                };
                let instance = self.instantiate(tree, slot.def, Some(class), arg_types, block, span)?;
                Ok((instance.return_type, vec![instance.def]))
            }
        }
    }

    /// `new` allocates an instance and typechecks `initialize` against it.
    fn infer_new(
        &mut self,
        tree: &mut SyntaxTree,
        class: TypeId,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<(TypeId, Vec<NodeId>), Diagnostic> {
        let constructors = self.module.lookup_method(class, "initialize");

        if constructors.is_empty() {
            if !arg_types.is_empty() {
                return Err(self.fault(Error::WrongNumberOfArguments, span));
            }
            let allocated = self.allocated_type(class);
            let target = self.synthesized_def(tree, allocated, "initialize");
            return Ok((allocated, vec![target]));
        }

        let Some(slot) = constructors.iter().find(|slot| slot.arity == arg_types.len()) else {
            return Err(self.fault(Error::WrongNumberOfArguments, span));
        };

        // For a generic class, solve the type variables from the constructor's restricted
        // parameters: each binding overwrites the last, so the most recent one wins.
        let allocated = if self.module.class(class).is_generic() {
            let NodeKind::Def { params, .. } = tree.node(slot.def).kind.clone() else {
                unreachable!("method slot points at a non-def node");
            };
            let type_params = self.module.class(class).type_params.clone();
            let mut bindings: Vec<Option<TypeId>> = vec![None; type_params.len()];
            for (param, arg_type) in params.iter().zip(arg_types) {
                if let Some(restriction) = &param.restriction {
                    if let Some(index) = type_params.iter().position(|p| p == restriction) {
                        bindings[index] = Some(*arg_type);
                    }
                }
            }
            let nil = self.module.nil();
            let args = bindings.into_iter().map(|b| b.unwrap_or(nil)).collect();
            self.module.generic_of(class, args)
        } else {
            class
        };

        let instance = self.instantiate(tree, slot.def, Some(allocated), arg_types, block, span)?;
        Ok((allocated, vec![instance.def]))
    }

    /// `allocate` produces an instance without running `initialize`.
    fn infer_allocate(
        &mut self,
        tree: &mut SyntaxTree,
        class: TypeId,
        arg_types: &[TypeId],
        span: Option<&Span>,
    ) -> Result<(TypeId, Vec<NodeId>), Diagnostic> {
        if !arg_types.is_empty() {
            return Err(self.fault(Error::WrongNumberOfArguments, span));
        }
        let allocated = self.allocated_type(class);
        let target = self.synthesized_def(tree, allocated, "allocate");
        Ok((allocated, vec![target]))
    }

    /// The instance type a class allocates: itself, or for a generic class with nothing to
    /// solve the type variables from, the instantiation with every parameter bound to `Nil`.
    fn allocated_type(&mut self, class: TypeId) -> TypeId {
        if self.module.class(class).is_generic() {
            let nil = self.module.nil();
            let args = vec![nil; self.module.class(class).type_params.len()];
            self.module.generic_of(class, args)
        } else {
            class
        }
    }

    /// Returns the synthesized empty def bound as the target of `new`/`allocate` calls on
    /// classes without a user-defined constructor, creating and caching it on first use.
    fn synthesized_def(&mut self, tree: &mut SyntaxTree, class: TypeId, which: &str) -> NodeId {
        let cached = match which {
            "initialize" => self.module.class(class).synthesized_initialize,
            _ => self.module.class(class).synthesized_allocate,
        };
        if let Some(def) = cached {
            return def;
        }

        let body = tree.expressions(Vec::new());
        let def = tree.method(None, which, Vec::new(), body);
        let nil = self.module.nil();
        tree.set_ty(body, nil);
        tree.set_ty(def, nil);

        let class = self.module.class_mut(class);
        match which {
            "initialize" => class.synthesized_initialize = Some(def),
            _ => class.synthesized_allocate = Some(def),
        }
        def
    }

    /// Dispatches a call on an expression receiver. Union and hierarchy receivers fan out over
    /// their variants; the call's type is the union of the per-variant results.
    fn infer_instance_call(
        &mut self,
        tree: &mut SyntaxTree,
        receiver: TypeId,
        name: &str,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<(TypeId, Vec<NodeId>), Diagnostic> {
        let variants = self.dispatch_variants(receiver);
        self.dispatch(tree, &variants, receiver, name, arg_types, block, span)
    }

    /// Dispatches a receiverless call: the enclosing method's `self`, with the module's own
    /// methods as the fallback.
    fn infer_receiverless_call(
        &mut self,
        tree: &mut SyntaxTree,
        name: &str,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<(TypeId, Vec<NodeId>), Diagnostic> {
        if let Some(self_type) = self.scopes.self_type() {
            if !self.module.lookup_method(self_type, name).is_empty() {
                return self.dispatch(tree, &[self_type], self_type, name, arg_types, block, span);
            }
        }

        let slots = self.module.find_methods(name);
        if slots.is_empty() {
            return Err(self.fault(
                Error::UndefinedLocalVariableOrMethod { name: name.to_owned() },
                span,
            ));
        }
        let Some(slot) = slots.iter().find(|slot| slot.arity == arg_types.len()) else {
            return Err(self.fault(Error::WrongNumberOfArguments, span));
        };
        let instance = self.instantiate(tree, slot.def, None, arg_types, block, span)?;
        Ok((instance.return_type, vec![instance.def]))
    }

    /// Expands a receiver type into the concrete classes a call on it dispatches over: a class
    /// is itself, a hierarchy is its root and every transitive subclass, and a union is the
    /// expansion of each member.
    fn dispatch_variants(&self, receiver: TypeId) -> Vec<TypeId> {
        match self.module.type_node(receiver) {
            TypeNode::Class(_) => vec![receiver],
            TypeNode::Hierarchy(hierarchy) => self.module.family_of(hierarchy.base),
            TypeNode::Union(union) => union
                .members
                .clone()
                .into_iter()
                .flat_map(|member| self.dispatch_variants(member))
                .collect(),
        }
    }

    /// Resolves and instantiates `name` against each variant of the receiver. Variants without
    /// a method of that name are skipped; if none has one, the call is undefined for the
    /// receiver as a whole. A variant that has the name but no matching arity is a hard fault.
    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        &mut self,
        tree: &mut SyntaxTree,
        variants: &[TypeId],
        receiver: TypeId,
        name: &str,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<(TypeId, Vec<NodeId>), Diagnostic> {
        let mut return_types = Vec::new();
        let mut targets = Vec::new();
        let mut any_named = false;

        for &variant in variants {
            let slots = self.module.lookup_method(variant, name);
            if slots.is_empty() {
                continue;
            }
            any_named = true;
            let Some(slot) = slots.iter().find(|slot| slot.arity == arg_types.len()) else {
                return Err(self.fault(Error::WrongNumberOfArguments, span));
            };
            let instance = self.instantiate(tree, slot.def, Some(variant), arg_types, block, span)?;
            return_types.push(instance.return_type);
            targets.push(instance.def);
        }

        if !any_named {
            return Err(self.fault(
                Error::UndefinedMethod {
                    method: name.to_owned(),
                    receiver: self.module.type_string(receiver),
                },
                span,
            ));
        }

        Ok((self.module.union_of(&return_types), targets))
    }

    /// Monomorphizes a method: returns the cached instance for this key, or clones the
    /// definition, types its body against the receiver and argument types, and caches it.
    fn instantiate(
        &mut self,
        tree: &mut SyntaxTree,
        def: NodeId,
        receiver: Option<TypeId>,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<MethodInstance, Diagnostic> {
        let key = InstanceKey {
            def,
            receiver,
            arg_types: arg_types.to_vec(),
            block,
        };
        if let Some(instance) = self.module.instances.get(&key) {
            return Ok(instance.clone());
        }

        let NodeKind::Def { params, .. } = tree.node(def).kind.clone() else {
            unreachable!("instantiated a non-def node");
        };
        if params.len() != arg_types.len() {
            return Err(self.fault(Error::WrongNumberOfArguments, span));
        }

        // Clone the definition and install the instance with a provisional `Nil` return type,
        // so recursive calls back into this key terminate against the placeholder.
        let instance_def = tree.clone_subtree(def);
        let nil = self.module.nil();
        tree.set_ty(instance_def, nil);
        let body = match &tree.node(instance_def).kind {
            NodeKind::Def { body, .. } => *body,
            _ => unreachable!("clone of a def is not a def"),
        };
        self.module.instances.insert(
            key.clone(),
            MethodInstance {
                def: instance_def,
                return_type: nil,
            },
        );

        let lexical_class = receiver.map(|r| {
            self.module
                .class(r)
                .generic_origin
                .unwrap_or(r)
        });

        let result = self.infer_instance_body(tree, body, &params, receiver, lexical_class, arg_types, block, span);
        match result {
            Ok(return_type) => {
                let instance = MethodInstance {
                    def: instance_def,
                    return_type,
                };
                self.module.instances.insert(key, instance.clone());
                Ok(instance)
            }
            Err(fault) => {
                // A failed instantiation must not satisfy later cache lookups.
                self.module.instances.remove(&key);
                Err(fault)
            }
        }
    }

    /// Runs the lenient pass then the strict pass over an instance body, and computes the
    /// final return type: explicit returns unioned with the body's tail expression.
    #[allow(clippy::too_many_arguments)]
    fn infer_instance_body(
        &mut self,
        tree: &mut SyntaxTree,
        body: NodeId,
        params: &[Param],
        receiver: Option<TypeId>,
        lexical_class: Option<TypeId>,
        arg_types: &[TypeId],
        block: Option<NodeId>,
        span: Option<&Span>,
    ) -> Result<TypeId, Diagnostic> {
        let was_lenient = self.lenient;

        // Lenient pass: accumulate instance-variable types without judging uses.
        self.lenient = true;
        self.scopes.push_method(receiver, lexical_class, block);
        let mut result = self.bind_params(params, receiver, arg_types, span);
        if result.is_ok() {
            result = accept(tree, body, self);
        }
        self.scopes.pop();
        if let Err(fault) = result {
            self.lenient = was_lenient;
            return Err(fault);
        }

        // Strict pass: assign the final types; the first fault aborts inference.
        self.lenient = false;
        self.scopes.push_method(receiver, lexical_class, block);
        let mut result = self.bind_params(params, receiver, arg_types, span);
        if result.is_ok() {
            result = accept(tree, body, self);
        }
        let returns = self.scopes.pop_method();
        self.lenient = was_lenient;
        result?;

        let mut return_types = returns;
        return_types.push(self.type_of(tree, body));
        Ok(self.module.union_of(&return_types))
    }

    fn bind_params(
        &mut self,
        params: &[Param],
        receiver: Option<TypeId>,
        arg_types: &[TypeId],
        span: Option<&Span>,
    ) -> Result<(), Diagnostic> {
        for (param, arg_type) in params.iter().zip(arg_types) {
            self.bind_param(param, *arg_type, receiver, span)?;
        }
        Ok(())
    }
}

/// A call's receiver denotes a class (enabling `new`/`allocate`/class-method dispatch) when it
/// is syntactically a constant or an explicit generic application.
fn is_class_reference(tree: &SyntaxTree, obj: NodeId) -> bool {
    match &tree.node(obj).kind {
        NodeKind::Var { name } => is_constant(name),
        NodeKind::Generic { .. } => true,
        _ => false,
    }
}
