// Copyright (c) the Coral project contributors.

//! The scope chain used during inference.
//!
//! Frames come in four flavors. `TopLevel`, `Class`, and `Method` frames are binding
//! boundaries: local lookups stop at the nearest one. `Block` frames are transparent, so block
//! bodies read and write the locals of the method they appear in, while block parameters shadow
//! them.

use crate::ast::NodeId;
use crate::module::TypeId;
use std::collections::HashMap;

#[derive(Debug)]
enum Frame {
    TopLevel {
        locals: HashMap<String, TypeId>,
    },
    Class {
        class: TypeId,
        locals: HashMap<String, TypeId>,
    },
    Method {
        /// The receiver's type; `None` for module-level methods.
        receiver: Option<TypeId>,
        /// The class constants are resolved against: the receiver's declared class (an
        /// instantiation's generic origin).
        lexical_class: Option<TypeId>,
        locals: HashMap<String, TypeId>,
        /// Types contributed by explicit `return` expressions in the body.
        returns: Vec<TypeId>,
        /// The call-site block this instantiation was given, if any.
        block: Option<NodeId>,
        /// Accumulated positional types of the block's parameters, grown at each `yield`.
        block_params: Vec<Option<TypeId>>,
    },
    Block {
        locals: HashMap<String, TypeId>,
    },
}

impl Frame {
    fn locals(&self) -> &HashMap<String, TypeId> {
        match self {
            Frame::TopLevel { locals }
            | Frame::Class { locals, .. }
            | Frame::Method { locals, .. }
            | Frame::Block { locals } => locals,
        }
    }

    fn locals_mut(&mut self) -> &mut HashMap<String, TypeId> {
        match self {
            Frame::TopLevel { locals }
            | Frame::Class { locals, .. }
            | Frame::Method { locals, .. }
            | Frame::Block { locals } => locals,
        }
    }

    /// Block frames are transparent to local lookups; everything else is a boundary.
    fn is_boundary(&self) -> bool {
        !matches!(self, Frame::Block { .. })
    }
}

#[derive(Debug, Default)]
pub(crate) struct Scopes {
    frames: Vec<Frame>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_top_level(&mut self) {
        self.frames.push(Frame::TopLevel { locals: HashMap::new() });
    }

    pub fn push_class(&mut self, class: TypeId) {
        self.frames.push(Frame::Class {
            class,
            locals: HashMap::new(),
        });
    }

    pub fn push_method(&mut self, receiver: Option<TypeId>, lexical_class: Option<TypeId>, block: Option<NodeId>) {
        self.frames.push(Frame::Method {
            receiver,
            lexical_class,
            locals: HashMap::new(),
            returns: Vec::new(),
            block,
            block_params: Vec::new(),
        });
    }

    pub fn push_block(&mut self) {
        self.frames.push(Frame::Block { locals: HashMap::new() });
    }

    pub fn pop(&mut self) {
        self.frames.pop().expect("scope stack underflow");
    }

    /// Pops a method frame and returns the `return` types its body contributed.
    pub fn pop_method(&mut self) -> Vec<TypeId> {
        match self.frames.pop() {
            Some(Frame::Method { returns, .. }) => returns,
            _ => panic!("popped frame was not a method scope"),
        }
    }

    /// Looks a local up through the visible frames: the innermost frames up to and including
    /// the nearest boundary.
    pub fn lookup_local(&self, name: &str) -> Option<TypeId> {
        for frame in self.frames.iter().rev() {
            if let Some(&ty) = frame.locals().get(name) {
                return Some(ty);
            }
            if frame.is_boundary() {
                break;
            }
        }
        None
    }

    /// Binds a local the way assignment does: rebinding it in the frame where it's visible, or
    /// declaring it in the innermost frame otherwise.
    pub fn assign_local(&mut self, name: &str, ty: TypeId) {
        let top = self.frames.len() - 1;
        let mut index = top;
        loop {
            if self.frames[index].locals().contains_key(name) {
                self.frames[index].locals_mut().insert(name.to_owned(), ty);
                return;
            }
            if self.frames[index].is_boundary() || index == 0 {
                break;
            }
            index -= 1;
        }
        self.frames[top].locals_mut().insert(name.to_owned(), ty);
    }

    /// Declares a binding in the innermost frame unconditionally. Used for method and block
    /// parameters, which shadow rather than rebind.
    pub fn declare_local(&mut self, name: &str, ty: TypeId) {
        self.frames
            .last_mut()
            .expect("scope stack underflow")
            .locals_mut()
            .insert(name.to_owned(), ty);
    }

    /// The type of `self`: the nearest enclosing method's receiver.
    pub fn self_type(&self) -> Option<TypeId> {
        for frame in self.frames.iter().rev() {
            if let Frame::Method { receiver, .. } = frame {
                return *receiver;
            }
        }
        None
    }

    /// The classes to resolve constants against, innermost first.
    pub fn class_chain(&self) -> Vec<TypeId> {
        let mut chain = Vec::new();
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Class { class, .. } => chain.push(*class),
                Frame::Method {
                    lexical_class: Some(class),
                    ..
                } => chain.push(*class),
                _ => {}
            }
        }
        chain
    }

    /// The class new definitions register on: the nearest enclosing `Class` frame.
    pub fn nearest_class(&self) -> Option<TypeId> {
        for frame in self.frames.iter().rev() {
            if let Frame::Class { class, .. } = frame {
                return Some(*class);
            }
        }
        None
    }

    /// Records a `return` type on the nearest enclosing method frame. A `return` at the top
    /// level has no method to contribute to and is dropped.
    pub fn record_return(&mut self, ty: TypeId) {
        for frame in self.frames.iter_mut().rev() {
            if let Frame::Method { returns, .. } = frame {
                returns.push(ty);
                return;
            }
        }
    }

    /// The block attached to the nearest enclosing method instantiation, if any.
    pub fn current_block(&self) -> Option<NodeId> {
        for frame in self.frames.iter().rev() {
            if let Frame::Method { block, .. } = frame {
                return *block;
            }
        }
        None
    }

    /// The accumulated type of the block parameter at `index`.
    pub fn block_param_type(&self, index: usize) -> Option<TypeId> {
        for frame in self.frames.iter().rev() {
            if let Frame::Method { block_params, .. } = frame {
                return block_params.get(index).copied().flatten();
            }
        }
        None
    }

    pub fn set_block_param_type(&mut self, index: usize, ty: TypeId) {
        for frame in self.frames.iter_mut().rev() {
            if let Frame::Method { block_params, .. } = frame {
                if block_params.len() <= index {
                    block_params.resize(index + 1, None);
                }
                block_params[index] = Some(ty);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;

    #[test]
    fn blocks_are_transparent_to_local_lookups() {
        let module = Module::create();
        let scopes = &mut Scopes::new();
        scopes.push_top_level();
        scopes.push_method(None, None, None);
        scopes.declare_local("x", module.int());

        scopes.push_block();
        assert_eq!(scopes.lookup_local("x"), Some(module.int()));

        // Assignment inside the block rebinds the method-level local.
        scopes.assign_local("x", module.bool());
        scopes.pop();
        assert_eq!(scopes.lookup_local("x"), Some(module.bool()));
    }

    #[test]
    fn method_frames_are_binding_boundaries() {
        let module = Module::create();
        let scopes = &mut Scopes::new();
        scopes.push_top_level();
        scopes.declare_local("x", module.int());

        scopes.push_method(None, None, None);
        assert_eq!(scopes.lookup_local("x"), None);

        // Declaring shadows instead of rebinding.
        scopes.declare_local("x", module.bool());
        scopes.pop();
        assert_eq!(scopes.lookup_local("x"), Some(module.int()));
    }
}
