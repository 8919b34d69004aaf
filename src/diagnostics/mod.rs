// Copyright (c) the Coral project contributors.

use crate::span::Span;
use serde::Serialize;

mod errors;
mod lints;

pub use errors::Error;
pub use lints::Lint;

/// Stores additional information about a diagnostic.
#[derive(Serialize, Debug, Clone)]
pub struct Note {
    pub message: String,
    pub span: Option<Span>,
}

/// A diagnostic is a message that is reported to the user during compilation.
/// It can either hold an [Error] or a [Lint].
#[derive(Debug)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    level: DiagnosticLevel,
    span: Option<Span>,
    notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(kind: impl Into<DiagnosticKind>) -> Self {
        let kind = kind.into();
        let level = match &kind {
            DiagnosticKind::Error(_) => DiagnosticLevel::Error,
            DiagnosticKind::Lint(lint) => lint.get_default_level(),
        };

        Diagnostic {
            kind,
            level,
            span: None,
            notes: Vec::new(),
        }
    }

    /// Returns the message of this diagnostic.
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::Error(error) => error.message(),
            DiagnosticKind::Lint(lint) => lint.message(),
        }
    }

    /// Returns this diagnostic's code. This is either the name of a lint or of the form `E###`.
    pub fn code(&self) -> &str {
        match &self.kind {
            DiagnosticKind::Error(error) => error.code(),
            DiagnosticKind::Lint(lint) => lint.code(),
        }
    }

    /// Returns true if this diagnostic holds an [Error], the fatal kind.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Error(_))
    }

    /// Returns the [level](DiagnosticLevel) of this diagnostic.
    /// Note that this value may change after the diagnostic is reported, since lint levels can be
    /// altered by command line options.
    pub fn level(&self) -> DiagnosticLevel {
        self.level
    }

    /// Returns the [Span] of this diagnostic if it has one.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Returns any [Notes](Note) associated with this diagnostic.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn set_span(mut self, span: &Span) -> Self {
        self.span = Some(span.to_owned());
        self
    }

    pub fn add_note(mut self, message: impl Into<String>, span: Option<&Span>) -> Self {
        self.notes.push(Note {
            message: message.into(),
            span: span.cloned(),
        });
        self
    }

    pub fn push_into(self, diagnostics: &mut Diagnostics) {
        diagnostics.0.push(self);
    }
}

#[derive(Debug)]
pub enum DiagnosticKind {
    Error(Error),
    Lint(Lint),
}

impl From<Error> for DiagnosticKind {
    fn from(error: Error) -> Self {
        DiagnosticKind::Error(error)
    }
}

impl From<Lint> for DiagnosticKind {
    fn from(lint: Lint) -> Self {
        DiagnosticKind::Lint(lint)
    }
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        Diagnostic::new(error)
    }
}

impl From<Lint> for Diagnostic {
    fn from(lint: Lint) -> Self {
        Diagnostic::new(lint)
    }
}

/// Diagnostic levels describe the severity of a diagnostic, and how the compiler should react to their emission.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// Diagnostics with the `Error` level will be emitted and will cause compilation to fail with a non-zero exit
    /// code. Inference faults always carry this level.
    Error,

    /// Diagnostics with the `Warning` level will be emitted, but will not influence the exit code of the compiler.
    Warning,

    /// Diagnostics with the `Allowed` level will be suppressed and will not emit any message.
    Allowed,
}

#[derive(Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Creates a new diagnostics container that is empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Returns true if this contains any diagnostics that are errors.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Returns true if this contains no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the diagnostics this struct contains after it has patched and updated them.
    /// Lint levels can be configured via command line options, but these aren't applied until this runs.
    pub fn into_updated(mut self, options: &crate::options::InferOptions) -> Vec<Diagnostic> {
        // Helper function that checks whether a lint should be allowed according to the provided identifiers.
        fn is_lint_allowed_by<'b>(mut identifiers: impl Iterator<Item = &'b String>, lint: &Lint) -> bool {
            identifiers.any(|identifier| identifier == "All" || identifier == lint.code())
        }

        for diagnostic in &mut self.0 {
            // If this diagnostic is a lint, update its diagnostic level. Errors always have a level of `Error`.
            if let DiagnosticKind::Lint(lint) = &diagnostic.kind {
                if is_lint_allowed_by(options.allowed_lints.iter(), lint) {
                    diagnostic.level = DiagnosticLevel::Allowed;
                } else if options.warn_as_error && diagnostic.level == DiagnosticLevel::Warning {
                    diagnostic.level = DiagnosticLevel::Error;
                }
            }
        }
        self.0
    }

    /// Returns the diagnostics held by this without any updates or patches.
    /// This should only be called by tests that want to bypass this behavior.
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.0
    }
}

pub fn get_totals(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let (mut total_warnings, mut total_errors) = (0, 0);

    for diagnostic in diagnostics {
        match diagnostic.level() {
            DiagnosticLevel::Error => total_errors += 1,
            DiagnosticLevel::Warning => total_warnings += 1,
            DiagnosticLevel::Allowed => {}
        }
    }

    (total_warnings, total_errors)
}

/// A macro that implements the `code` and `message` functions for [Lint] and [Error] enums.
#[macro_export]
macro_rules! implement_diagnostic_functions {
    (Lint, $(($kind:ident, $message:expr $(, $variant:ident)* )),*) => {
        impl Lint {
            /// This array contains all the valid arguments for the 'allow' option.
            pub const ALLOWABLE_LINT_IDENTIFIERS: [&'static str; 2] = [
                "All",
                $(stringify!($kind)),*
            ];

            pub fn code(&self) -> &str {
                match self {
                    $(
                        implement_diagnostic_functions!(@error Lint::$kind, $($variant),*) => stringify!($kind),
                    )*
                }
            }

            pub fn message(&self) -> String {
                match self {
                    $(
                        implement_diagnostic_functions!(@description Lint::$kind, $($variant),*) => $message.into(),
                    )*
                }
            }
        }
    };

    (Error, $(($code:literal, $kind:ident, $message:expr $(, $variant:ident)* )),*) => {
        impl Error {
            pub fn code(&self) -> &str {
                match self {
                    $(
                        implement_diagnostic_functions!(@error Error::$kind, $($variant),*) => $code,
                    )*
                }
            }

            pub fn message(&self) -> String {
                match self {
                    $(
                        implement_diagnostic_functions!(@description Error::$kind, $($variant),*) => $message.into(),
                    )*
                }
            }
        }
    };

    (@error $kind:path,) => {
        $kind
    };

    (@error $kind:path, $($variant:ident),+) => {
        $kind {..}
    };

    (@description $kind:path,) => {
        $kind
    };

    (@description $kind:path, $($variant:ident),+) => {
        $kind{$($variant),*}
    };
}
