// Copyright (c) the Coral project contributors.

//! The type inference visitor.
//!
//! This pass walks the program assigning a type to every expression node. Most nodes use the
//! default traversal and compute their type in `end_visit_*`; the nodes that manage their own
//! scopes or control resolution order (`Assign`, `ClassDef`, `Def`, `Call`, `Generic`,
//! `ControlExit`) do their work in `visit_*` and return `false` to suppress the default
//! descent. Call resolution and monomorphization live in [`calls`](super::calls).

use crate::ast::node::{is_constant, is_instance_var};
use crate::ast::{ExitKind, NodeId, NodeKind, Param, SyntaxTree};
use crate::diagnostics::{Diagnostic, Error, Lint};
use crate::module::{Module, TypeId};
use crate::span::Span;
use crate::types::{ClassType, MethodSlot, TypeNode};
use crate::visitor::{accept, Visitor};

use super::scope::Scopes;

pub(crate) struct TypeInference<'a> {
    pub(crate) module: &'a mut Module,
    pub(crate) scopes: Scopes,
    /// While set, resolution failures type as `Nil` instead of faulting. This drives the first
    /// of the two passes every method body gets; see [`calls`](super::calls).
    pub(crate) lenient: bool,
    /// Non-fatal findings, surfaced alongside the result.
    pub(crate) lints: Vec<Diagnostic>,
}

impl<'a> TypeInference<'a> {
    pub(crate) fn new(module: &'a mut Module) -> Self {
        let mut scopes = Scopes::new();
        scopes.push_top_level();
        TypeInference {
            module,
            scopes,
            lenient: false,
            lints: Vec::new(),
        }
    }

    /// Builds the single fatal fault inference reports.
    pub(crate) fn fault(&self, error: Error, span: Option<&Span>) -> Diagnostic {
        let diagnostic = Diagnostic::new(error);
        match span {
            Some(span) => diagnostic.set_span(span),
            None => diagnostic,
        }
    }

    /// Applies the lenient-pass policy to a resolution failure: `Nil` while lenient, fatal
    /// otherwise.
    pub(crate) fn suppress(&mut self, result: Result<TypeId, Diagnostic>) -> Result<TypeId, Diagnostic> {
        match result {
            Err(_) if self.lenient => Ok(self.module.nil()),
            other => other,
        }
    }

    /// Resolves a constant name through the lexically enclosing classes, then the module.
    pub(crate) fn resolve_constant(&self, name: &str) -> Option<TypeId> {
        for class in self.scopes.class_chain() {
            let holder = match self.module.class(class).generic_origin {
                Some(origin) => self.module.class(origin),
                None => self.module.class(class),
            };
            if let Some(&found) = holder.constants.get(name) {
                return Some(found);
            }
        }
        self.module.lookup_constant(name)
    }

    fn node_span(&self, tree: &SyntaxTree, id: NodeId) -> Option<Span> {
        tree.node(id).span.clone()
    }

    /// The type of an expression that has already been visited.
    pub(crate) fn type_of(&self, tree: &SyntaxTree, id: NodeId) -> TypeId {
        tree.ty(id).expect("expression was visited but carries no type")
    }

    /// Folds a list of expression types into one: `Nil` for none, the type itself for one, and
    /// their union otherwise.
    pub(crate) fn union_of_exps(&mut self, tree: &SyntaxTree, exps: &[NodeId]) -> TypeId {
        let types: Vec<TypeId> = exps.iter().map(|e| self.type_of(tree, *e)).collect();
        if types.is_empty() {
            self.module.nil()
        } else {
            self.module.union_of(&types)
        }
    }

    fn infer_var(&mut self, tree: &SyntaxTree, id: NodeId, name: &str) -> Result<TypeId, Diagnostic> {
        if is_instance_var(name) {
            // Reading an instance variable creates its entry, defaulting to `Nil`: an unset
            // ivar is still a readable, nil-valued slot.
            let Some(self_type) = self.scopes.self_type() else {
                return Ok(self.module.nil());
            };
            return Ok(match self.module.ivar_type(self_type, name) {
                Some(ty) => ty,
                None => {
                    let nil = self.module.nil();
                    self.module.set_ivar_type(self_type, name, nil);
                    nil
                }
            });
        }

        if is_constant(name) {
            let result = self.resolve_constant(name).ok_or_else(|| {
                self.fault(
                    Error::UninitializedConstant {
                        identifier: name.to_owned(),
                    },
                    self.node_span(tree, id).as_ref(),
                )
            });
            return self.suppress(result);
        }

        let result = self.scopes.lookup_local(name).ok_or_else(|| {
            self.fault(
                Error::UndefinedLocalVariableOrMethod { name: name.to_owned() },
                self.node_span(tree, id).as_ref(),
            )
        });
        self.suppress(result)
    }

    fn infer_class_def(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::ClassDef {
            name,
            type_params,
            superclass,
            body,
        } = tree.node(id).kind.clone()
        else {
            unreachable!("visit_class_def dispatched on a non-class node");
        };
        let span = self.node_span(tree, id);

        // Resolve the superclass name before anything else; an unknown name is fatal even when
        // the class itself was already registered. Class registration is structural, so this
        // fault is never downgraded by the lenient pass.
        let declared_parent = match &superclass {
            Some(parent_name) => Some(self.resolve_constant(parent_name).ok_or_else(|| {
                self.fault(
                    Error::UninitializedConstant {
                        identifier: parent_name.clone(),
                    },
                    span.as_ref(),
                )
            })?),
            None => None,
        };

        let class_id = match self.resolve_constant(&name) {
            Some(existing) if self.module.is_class(existing) => {
                // Re-opening. A redeclared superclass must match the registered one.
                if let Some(declared) = declared_parent {
                    let registered = self.module.class(existing).superclass.unwrap_or(self.module.object());
                    if declared != registered {
                        return Err(self.fault(
                            Error::SuperclassMismatch {
                                class: name,
                                declared: self.module.type_string(declared),
                                registered: self.module.type_string(registered),
                            },
                            span.as_ref(),
                        ));
                    }
                }
                existing
            }
            _ => {
                let parent = declared_parent.unwrap_or(self.module.object());
                let class = ClassType {
                    name: name.clone(),
                    superclass: Some(parent),
                    type_params,
                    ..Default::default()
                };
                let class_id = self.module.add_type(TypeNode::Class(class));
                self.module.class_mut(parent).subclasses.push(class_id);

                // Register under the enclosing class, or the module at the top level.
                match self.scopes.nearest_class() {
                    Some(enclosing) => {
                        self.module.class_mut(enclosing).constants.insert(name, class_id);
                    }
                    None => self.module.define_constant(&name, class_id),
                }
                class_id
            }
        };

        self.scopes.push_class(class_id);
        let body_result = accept(tree, body, self);
        self.scopes.pop();
        body_result?;

        let nil = self.module.nil();
        tree.set_ty(id, nil);
        Ok(())
    }

    fn infer_def(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::Def {
            receiver, name, params, ..
        } = tree.node(id).kind.clone()
        else {
            unreachable!("visit_def dispatched on a non-def node");
        };
        let span = self.node_span(tree, id);

        // Declaration only registers the method; its body is typed once per call signature.
        let slot = MethodSlot {
            name: name.clone(),
            arity: params.len(),
            def: id,
        };

        let replaced = match receiver {
            Some(receiver_node) => {
                let class = self.metaclass_target(tree, receiver_node)?;
                match class {
                    Some(class) => self.module.class_mut(class).add_metaclass_method(slot),
                    None => self.module.add_method(slot),
                }
            }
            None => match self.scopes.nearest_class() {
                Some(class) => self.module.class_mut(class).add_method(slot),
                None => self.module.add_method(slot),
            },
        };

        if replaced {
            let lint = Diagnostic::new(Lint::RedefinedMethod { identifier: name });
            self.lints.push(match &span {
                Some(span) => lint.set_span(span),
                None => lint,
            });
        }

        let nil = self.module.nil();
        tree.set_ty(id, nil);
        Ok(())
    }

    /// Resolves the class a `def Foo.x` (or `def self.x`) registers on.
    fn metaclass_target(&mut self, tree: &SyntaxTree, receiver: NodeId) -> Result<Option<TypeId>, Diagnostic> {
        match &tree.node(receiver).kind {
            NodeKind::Var { name } if is_constant(name) => {
                let result = self.resolve_constant(name).ok_or_else(|| {
                    self.fault(
                        Error::UninitializedConstant { identifier: name.clone() },
                        self.node_span(tree, receiver).as_ref(),
                    )
                });
                self.suppress(result).map(Some)
            }
            _ => Ok(self.scopes.nearest_class()),
        }
    }

    fn infer_assign(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let (target, value) = match &tree.node(id).kind {
            NodeKind::Assign { target, value } => (*target, *value),
            _ => unreachable!("visit_assign dispatched on a non-assign node"),
        };
        accept(tree, value, self)?;
        let value_type = self.type_of(tree, value);

        let target_kind = tree.node(target).kind.clone();
        match &target_kind {
            NodeKind::Var { name } if is_instance_var(name) => {
                let assigned = match self.scopes.self_type() {
                    Some(self_type) => {
                        // Accumulate: the entry becomes the union of everything ever assigned,
                        // plus `Nil` for the unset case. A first assignment unions with `Nil`.
                        let nil = self.module.nil();
                        let previous = self.module.ivar_type(self_type, name).unwrap_or(nil);
                        let entry = self.module.union_of(&[previous, value_type]);
                        self.module.set_ivar_type(self_type, name, entry);
                        entry
                    }
                    None => value_type,
                };
                tree.set_ty(target, assigned);
                tree.set_ty(id, assigned);
            }
            NodeKind::Var { name } => {
                self.scopes.assign_local(name, value_type);
                tree.set_ty(target, value_type);
                tree.set_ty(id, value_type);
            }
            _ => {
                accept(tree, target, self)?;
                tree.set_ty(id, value_type);
            }
        }
        Ok(())
    }

    fn infer_control_exit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::ControlExit { kind, exps } = tree.node(id).kind.clone() else {
            unreachable!("visit_control_exit dispatched on a non-exit node");
        };
        for exp in &exps {
            accept(tree, *exp, self)?;
        }

        let ty = match kind {
            ExitKind::Return => {
                let ty = self.union_of_exps(tree, &exps);
                self.scopes.record_return(ty);
                ty
            }
            ExitKind::Break | ExitKind::Next => self.module.nil(),
            ExitKind::Yield => self.infer_yield(tree, &exps)?,
        };
        tree.set_ty(id, ty);
        Ok(())
    }

    /// Types a `yield`: feed the yielded types into the block's parameters, re-type the block
    /// body, and take its type as the value of the `yield` expression.
    fn infer_yield(&mut self, tree: &mut SyntaxTree, exps: &[NodeId]) -> Result<TypeId, Diagnostic> {
        let Some(block_node) = self.scopes.current_block() else {
            // Yielding with no block attached at the call site produces nothing.
            return Ok(self.module.nil());
        };
        let NodeKind::Block { params, body } = tree.node(block_node).kind.clone() else {
            return Ok(self.module.nil());
        };

        let exp_types: Vec<TypeId> = exps.iter().map(|e| self.type_of(tree, *e)).collect();
        let mut bindings: Vec<(String, TypeId)> = Vec::with_capacity(params.len());
        for (index, param) in params.iter().enumerate() {
            let incoming = exp_types.get(index).copied().unwrap_or(self.module.nil());
            let merged = match self.scopes.block_param_type(index) {
                Some(previous) => self.module.union_of(&[previous, incoming]),
                None => incoming,
            };
            self.scopes.set_block_param_type(index, merged);
            bindings.push((param.name.clone(), merged));
        }

        self.scopes.push_block();
        for (name, ty) in &bindings {
            self.scopes.declare_local(name, *ty);
        }
        let body_result = accept(tree, body, self);
        self.scopes.pop();
        body_result?;

        let body_type = self.type_of(tree, body);
        let nil = self.module.nil();
        tree.set_ty(block_node, nil);
        Ok(body_type)
    }

    /// Types a block body before its receiving method is instantiated, with every parameter
    /// bound to `Nil`. Only a `yield` supplies real bindings, and a method that never yields
    /// would otherwise leave the block's body untyped; this pass is lenient for the same
    /// reason, since uses of the placeholder bindings aren't to be judged.
    pub(crate) fn pretype_block(&mut self, tree: &mut SyntaxTree, block_node: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::Block { params, body } = tree.node(block_node).kind.clone() else {
            return Ok(());
        };
        // A body that already carries types got them from a yield on an earlier visit of this
        // call; the placeholder typing must not overwrite them.
        if tree.ty(body).is_some() {
            return Ok(());
        }

        let was_lenient = self.lenient;
        self.lenient = true;
        self.scopes.push_block();
        let nil = self.module.nil();
        for param in &params {
            self.scopes.declare_local(&param.name, nil);
        }
        let result = accept(tree, body, self);
        self.scopes.pop();
        self.lenient = was_lenient;
        result
    }

    /// Binds a method parameter at instantiation time: a restriction fixes the binding type
    /// when it resolves, otherwise the argument's type flows in.
    pub(crate) fn bind_param(
        &mut self,
        param: &Param,
        arg_type: TypeId,
        receiver: Option<TypeId>,
        span: Option<&Span>,
    ) -> Result<(), Diagnostic> {
        let bound = match &param.restriction {
            Some(restriction) => self.resolve_restriction(restriction, receiver, span)?,
            None => arg_type,
        };
        self.scopes.declare_local(&param.name, bound);
        Ok(())
    }

    /// Resolves a parameter restriction: the receiver's type variables win, then the constant
    /// scope.
    fn resolve_restriction(
        &mut self,
        restriction: &str,
        receiver: Option<TypeId>,
        span: Option<&Span>,
    ) -> Result<TypeId, Diagnostic> {
        if let Some(receiver) = receiver {
            if let TypeNode::Class(class) = self.module.type_node(receiver) {
                if let Some(bound) = class.type_var(restriction) {
                    return Ok(bound);
                }
            }
        }
        let result = self.resolve_constant(restriction).ok_or_else(|| {
            self.fault(
                Error::UninitializedConstant {
                    identifier: restriction.to_owned(),
                },
                span,
            )
        });
        self.suppress(result)
    }
}

impl Visitor for TypeInference<'_> {
    fn end_visit_expressions(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = match tree.children_of(id).last() {
            Some(last) => self.type_of(tree, *last),
            None => self.module.nil(),
        };
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_nil_literal(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.nil();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_bool_literal(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.bool();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_int_literal(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.int();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_float_literal(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.float();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_double_literal(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.double();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_char_literal(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.char();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_var(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::Var { name } = tree.node(id).kind.clone() else {
            unreachable!("end_visit_var dispatched on a non-var node");
        };
        let ty = self.infer_var(tree, id, &name)?;
        tree.set_ty(id, ty);
        Ok(())
    }

    fn visit_class_def(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        self.infer_class_def(tree, id)?;
        Ok(false)
    }

    fn visit_def(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        self.infer_def(tree, id)?;
        Ok(false)
    }

    fn visit_call(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        self.infer_call(tree, id)?;
        Ok(false)
    }

    fn visit_generic(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        self.infer_generic_apply(tree, id)?;
        Ok(false)
    }

    fn end_visit_if(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let (then, els) = match &tree.node(id).kind {
            NodeKind::If { then, els, .. } => (*then, *els),
            _ => unreachable!("end_visit_if dispatched on a non-if node"),
        };
        // No flow-sensitive narrowing: the conditional is simply the union of its arms.
        let then_type = self.type_of(tree, then);
        let else_type = self.type_of(tree, els);
        let ty = self.module.union_of(&[then_type, else_type]);
        tree.set_ty(id, ty);
        Ok(())
    }

    fn end_visit_while(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Diagnostic> {
        let ty = self.module.nil();
        tree.set_ty(id, ty);
        Ok(())
    }

    fn visit_assign(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        self.infer_assign(tree, id)?;
        Ok(false)
    }

    fn visit_block(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        // Blocks are only typed through the calls they're attached to; a stray block is inert.
        let ty = self.module.nil();
        tree.set_ty(id, ty);
        Ok(false)
    }

    fn visit_control_exit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<bool, Diagnostic> {
        self.infer_control_exit(tree, id)?;
        Ok(false)
    }
}
