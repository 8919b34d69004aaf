// Copyright (c) the Coral project contributors.

//! The flow-insensitive type inference pass.
//!
//! Given a program rooted at an `Expressions` node, [`run`] decorates every expression with a
//! type, binds every call to its monomorphized target, and fills in class type-variable and
//! instance-variable maps on the [`Module`]. On success it returns the non-fatal lints the run
//! produced; the first inference fault aborts the run and is returned instead, with no partial
//! results guaranteed beyond the module's interning state.

mod calls;
mod pass;
mod scope;

use crate::ast::{NodeId, SyntaxTree};
use crate::diagnostics::Diagnostic;
use crate::module::Module;
use crate::visitor::accept;

use pass::TypeInference;

pub fn run(tree: &mut SyntaxTree, module: &mut Module, root: NodeId) -> Result<Vec<Diagnostic>, Diagnostic> {
    let mut inference = TypeInference::new(module);
    accept(tree, root, &mut inference)?;
    Ok(inference.lints)
}
