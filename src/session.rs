// Copyright (c) the Coral project contributors.

use crate::ast::{NodeId, SyntaxTree};
use crate::diagnostic_emitter::{emit_totals, DiagnosticEmitter};
use crate::diagnostics::{get_totals, Diagnostic, Diagnostics};
use crate::module::Module;
use crate::options::InferOptions;
use crate::source_file::SourceFile;
use console::Term;
use std::collections::HashMap;

/// The per-compilation state threaded through the front-end: the syntax tree being decorated,
/// the module holding every type, the diagnostics reported so far, and the registered source
/// files (used for snippet extraction when emitting).
#[derive(Debug, Default)]
pub struct Session {
    pub tree: SyntaxTree,
    pub module: Module,
    pub diagnostics: Diagnostics,
    pub files: HashMap<String, SourceFile>,
}

impl Session {
    pub fn create() -> Self {
        Session {
            tree: SyntaxTree::new(),
            module: Module::create(),
            diagnostics: Diagnostics::new(),
            files: HashMap::new(),
        }
    }

    /// Registers a source file so diagnostics spanning it can render snippets.
    pub fn add_file(&mut self, file: SourceFile) {
        self.files.insert(file.relative_path.clone(), file);
    }

    /// Runs type inference over the program rooted at `root`.
    ///
    /// On success every expression node carries a type and every call a target; any lints the
    /// run produced are added to [`diagnostics`](Self::diagnostics). On failure the single
    /// fatal fault is recorded there instead, and no typing of the tree should be relied on.
    /// Check [`Diagnostics::has_errors`] to tell the two apart.
    pub fn infer(&mut self, root: NodeId) {
        match crate::infer::run(&mut self.tree, &mut self.module, root) {
            Ok(lints) => {
                for lint in lints {
                    lint.push_into(&mut self.diagnostics);
                }
            }
            Err(fault) => fault.push_into(&mut self.diagnostics),
        }
    }

    /// Emits every diagnostic to the console and converts this session into the process exit
    /// code: 1 if any errors were reported, and 0 otherwise.
    pub fn into_exit_code(self, options: &InferOptions) -> i32 {
        let diagnostics = self.diagnostics.into_updated(options);
        let (total_warnings, total_errors) = get_totals(&diagnostics);

        // Print any diagnostics to the console, along with the total number of warnings and
        // errors emitted.
        let mut stderr = Term::stderr();
        let mut emitter = DiagnosticEmitter::new(&mut stderr, options, &self.files);
        emitter.emit_diagnostics(diagnostics).expect("failed to emit diagnostics");
        emit_totals(total_warnings, total_errors).expect("failed to emit totals");

        i32::from(total_errors != 0)
    }

    /// Consumes this session and returns the diagnostics it contains, with lint levels
    /// patched according to `options`.
    /// This method exists to simplify the testing of diagnostic emission.
    pub fn into_diagnostics(self, options: &InferOptions) -> Vec<Diagnostic> {
        self.diagnostics.into_updated(options)
    }
}
