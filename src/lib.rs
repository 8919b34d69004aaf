// Copyright (c) the Coral project contributors.

//! The type inference core of the Coral compiler front-end.
//!
//! Given a syntax tree produced by an external parser (built through the constructors on
//! [`ast::SyntaxTree`]), inference decorates every expression node with a type, binds every
//! call to its monomorphized method instance, and populates the [`module::Module`] with the
//! program's classes, generic instantiations, and instance-variable types. The first
//! inference fault aborts the run; no partial results are produced.

pub mod ast;
pub mod diagnostic_emitter;
pub mod diagnostics;
pub mod infer;
pub mod module;
pub mod options;
pub mod session;
pub mod source_file;
pub mod span;
pub mod test_helpers;
pub mod types;
pub mod utils;
pub mod visitor;

// Re-export the `clap` and `convert_case` dependencies.
pub extern crate clap;
pub extern crate convert_case;

use crate::ast::{NodeId, SyntaxTree};
use crate::session::Session;

/// Runs type inference over a parsed program and returns the resulting session.
///
/// This is the convenience entry point for drivers that already hold a finished tree; use
/// [`Session`] directly to register source files for snippet rendering first.
pub fn infer_from_tree(tree: SyntaxTree, root: NodeId) -> Session {
    let mut session = Session {
        tree,
        ..Session::create()
    };
    session.infer(root);
    session
}
