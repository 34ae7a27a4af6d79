//! Advisory script lint.
//!
//! Runs every script input through the oxc parser and semantic syntax
//! check and prints the diagnostics. Findings never fail the pipeline;
//! the task exists to surface problems early, not to gate the build.

use crate::build::{BuildContext, ScriptSource};
use oxc::{allocator::Allocator, parser::Parser, semantic::SemanticBuilder, span::SourceType};
use std::fs;
use std::path::{Path, PathBuf};

/// A single lint finding.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// File the finding came from
    pub path: PathBuf,
    /// Diagnostic message
    pub message: String,
}

impl std::fmt::Display for LintDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Aggregate result of a lint run.
#[derive(Debug, Default)]
pub struct LintReport {
    /// Number of files checked
    pub files_checked: usize,
    /// All findings, in file order
    pub diagnostics: Vec<LintDiagnostic>,
}

impl LintReport {
    /// Whether the run produced no findings.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Lint a single script file.
pub fn lint_file(path: &Path) -> Vec<LintDiagnostic> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return vec![LintDiagnostic {
                path: path.to_path_buf(),
                message: format!("could not read file: {}", e),
            }]
        }
    };
    lint_source(&source, path)
}

/// Lint script source text: parser errors plus semantic syntax errors.
pub fn lint_source(source: &str, path: &Path) -> Vec<LintDiagnostic> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::default()).parse();

    let mut diagnostics: Vec<LintDiagnostic> = ret
        .errors
        .iter()
        .map(|error| LintDiagnostic {
            path: path.to_path_buf(),
            message: error.message.to_string(),
        })
        .collect();

    // Semantic checks only make sense on a program that parsed
    if diagnostics.is_empty() {
        let semantic_ret =
            SemanticBuilder::new().with_check_syntax_error(true).build(&ret.program);
        diagnostics.extend(semantic_ret.errors.iter().map(|error| LintDiagnostic {
            path: path.to_path_buf(),
            message: error.message.to_string(),
        }));
    }

    diagnostics
}

/// Lint every script input for the project.
///
/// Reads the same input set as the script build: plain file matches and
/// the immediate `.js` children of directory matches.
pub fn run_lint(ctx: &BuildContext) -> Result<LintReport, String> {
    let sources = crate::build::discover_script_sources(ctx).map_err(|e| e.to_string())?;

    let mut files = Vec::new();
    for source in sources {
        match source {
            ScriptSource::File(path) => files.push(path),
            ScriptSource::Directory(dir) => {
                let entries = fs::read_dir(&dir).map_err(|e| e.to_string())?;
                let mut children: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| {
                        p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("js")
                    })
                    .collect();
                children.sort();
                files.extend(children);
            }
        }
    }

    let mut report = LintReport::default();
    for file in files {
        report.files_checked += 1;
        report.diagnostics.extend(lint_file(&file));
    }
    Ok(report)
}

/// Print a lint report to the console.
pub fn print_report(report: &LintReport) {
    for diagnostic in &report.diagnostics {
        eprintln!("  {}", diagnostic);
    }
    if report.is_clean() {
        println!("  lint: {} files, no problems", report.files_checked);
    } else {
        println!(
            "  lint: {} files, {} problem{}",
            report.files_checked,
            report.diagnostics.len(),
            if report.diagnostics.len() == 1 { "" } else { "s" }
        );
    }
}
