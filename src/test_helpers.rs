// Copyright (c) the Coral project contributors.

//! This module contains helper functions that are useful for testing both coralc and the
//! compilers that use it.

use crate::ast::NodeId;
use crate::diagnostics::Diagnostic;
use crate::module::TypeId;
use crate::session::Session;

/// Builds a program with the provided closure, runs inference over it, and returns the session
/// together with the root node.
///
/// The closure plays the role of the parser: it creates nodes through the session's
/// [`SyntaxTree`](crate::ast::SyntaxTree) and returns them in program order.
pub fn infer_program(build: impl FnOnce(&mut Session) -> Vec<NodeId>) -> (Session, NodeId) {
    let mut session = Session::create();
    let nodes = build(&mut session);
    let root = session.tree.expressions_from(nodes);
    session.infer(root);
    (session, root)
}

/// Like [`infer_program`], but asserts that inference succeeded and returns the type of the
/// program's final expression alongside the session.
#[must_use]
pub fn assert_infers(build: impl FnOnce(&mut Session) -> Vec<NodeId>) -> (Session, TypeId) {
    let (session, root) = infer_program(build);
    if session.diagnostics.has_errors() {
        panic!("inference failed: {:?}", session.diagnostics);
    }
    let ty = session.tree.ty(root).expect("program root was not typed");
    (session, ty)
}

/// Compares diagnostics emitted by the compiler to an array of expected diagnostics.
/// It ensures that the expected number of diagnostics were emitted (ie: that both lists are the
/// same length).
///
/// If the correct number were emitted, it checks each diagnostic against the expected array in
/// order. For each diagnostic we ensure:
/// - It has the correct code.
/// - It has the correct message.
/// - If a span was expected, that it has the correct span.
///
/// If the expected diagnostics don't include spans, this function doesn't check them.
/// This is useful for the majority of tests that aren't explicitly testing spans.
pub fn check_diagnostics<const L: usize>(diagnostics: Vec<Diagnostic>, expected: [impl Into<Diagnostic>; L]) {
    // Check that the correct number of diagnostics were emitted.
    if expected.len() != diagnostics.len() {
        eprintln!("Expected {} diagnostics, but got {}.", expected.len(), diagnostics.len());
        eprintln!("The emitted diagnostics were:");
        for diagnostic in diagnostics {
            eprintln!("\t{diagnostic:?}");
        }
        eprintln!();
        panic!("test failure");
    }

    // Check that the emitted diagnostics match what was expected.
    for (expect, diagnostic) in expected.into_iter().zip(diagnostics) {
        let expect: Diagnostic = expect.into();
        let mut failed = false;

        // Check that the codes match.
        if expect.code() != diagnostic.code() {
            eprintln!("diagnostic codes didn't match:");
            eprintln!("\texpected '{:?}', but got '{:?}'", expect.code(), diagnostic.code());
            failed = true;
        }

        // Check that the messages match.
        if expect.message() != diagnostic.message() {
            eprintln!("diagnostic messages didn't match:");
            eprintln!("\texpected: \"{}\"", expect.message());
            eprintln!("\t but got: \"{}\"", diagnostic.message());
            failed = true;
        }

        // If a span was provided, check that it matches.
        if expect.span().is_some() && expect.span() != diagnostic.span() {
            eprintln!("diagnostic spans didn't match:");
            eprintln!("\texpected: \"{:?}\"", expect.span());
            eprintln!("\t but got: \"{:?}\"", diagnostic.span());
            failed = true;
        }

        // If the checks failed, panic to signal a test failure.
        if failed {
            eprintln!();
            panic!("test failure");
        }
    }
}
