// Copyright (c) the Coral project contributors.

use super::DiagnosticLevel;
use crate::implement_diagnostic_functions;

#[derive(Debug)]
pub enum Lint {
    /// A method was defined with the same name and arity as an existing method on the same class.
    /// The new definition replaces the old one, which is usually intentional when re-opening a
    /// class, but is worth flagging when it happens inside a single class body.
    RedefinedMethod {
        /// The method's name.
        identifier: String,
    },
}

impl Lint {
    /// Returns the default diagnostic level this lint should use when reporting violations.
    pub fn get_default_level(&self) -> DiagnosticLevel {
        match self {
            Self::RedefinedMethod { .. } => DiagnosticLevel::Warning,
        }
    }
}

implement_diagnostic_functions!(
    Lint,
    (
        RedefinedMethod,
        format!("method '{identifier}' is already defined; the new definition replaces it"),
        identifier
    )
);
