//! Script pipeline: transpile, optimize, and minify JS bundles.
//!
//! Each bundle is concatenated, lowered to the fixed ES target with the
//! oxc transformer, dead-code optimized, and written out twice: once
//! expanded (`<name>.js`) and once minified (`<name>.min.js`).

use crate::build::{BuildContext, ScriptBundle};
use oxc::{
    allocator::Allocator,
    codegen::{Codegen, CodegenOptions},
    minifier::{
        CompressOptions, CompressOptionsKeepNames, Compressor, MangleOptions, Minifier,
        MinifierOptions,
    },
    parser::Parser,
    semantic::SemanticBuilder,
    span::SourceType,
    transformer::{ESTarget, TransformOptions, Transformer},
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error in the script pipeline
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Source failed to parse
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Bundle or file the error came from
        path: String,
        /// First parser diagnostic
        message: String,
    },
    /// Transpilation failed
    #[error("Failed to transform {path}: {message}")]
    Transform {
        /// Bundle or file the error came from
        path: String,
        /// First transformer diagnostic
        message: String,
    },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transpile a script to the fixed ES2015 target and strip dead code.
///
/// Runs parse → semantic → transform → dead-code elimination and prints
/// the program expanded. The returned source is the unminified artifact.
pub fn transpile(source: &str, path: &Path) -> Result<String, ScriptError> {
    let display = path.display().to_string();
    let allocator = Allocator::default();

    let ret = Parser::new(&allocator, source, SourceType::default()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(ScriptError::Parse { path: display, message: error.message.to_string() });
    }
    let program = allocator.alloc(ret.program);

    let scoping = SemanticBuilder::new().build(program).semantic.into_scoping();
    let transformed = Transformer::new(&allocator, path, &TransformOptions::from(ESTarget::ES2015))
        .build_with_scoping(scoping, program);
    if let Some(error) = transformed.errors.first() {
        return Err(ScriptError::Transform { path: display, message: error.message.to_string() });
    }

    // The transform invalidates semantic data; rebuild it before the
    // dead-code pass.
    let scoping = SemanticBuilder::new().build(program).semantic.into_scoping();
    Compressor::new(&allocator, CompressOptions::safest())
        .dead_code_elimination_with_scoping(scoping, program);

    Ok(Codegen::new().build(program).code)
}

/// Minify a script: compress, mangle, and print compactly.
pub fn minify(source: &str, path: &Path) -> Result<String, ScriptError> {
    let display = path.display().to_string();
    let allocator = Allocator::default();

    let ret = Parser::new(&allocator, source, SourceType::default()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(ScriptError::Parse { path: display, message: error.message.to_string() });
    }
    let program = allocator.alloc(ret.program);

    let ret = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions {
            target: ESTarget::ES2015,
            drop_debugger: false,
            drop_console: false,
            keep_names: CompressOptionsKeepNames { function: true, class: true },
            ..CompressOptions::default()
        }),
    })
    .build(&allocator, program);

    let ret = Codegen::new()
        .with_options(CodegenOptions { minify: true, ..CodegenOptions::default() })
        .with_scoping(ret.scoping)
        .build(program);

    Ok(ret.code)
}

/// Concatenate a bundle's sources into one script.
pub fn concat_sources(bundle: &ScriptBundle) -> Result<String, ScriptError> {
    let mut combined = String::new();
    for source in &bundle.sources {
        let contents = fs::read_to_string(source)?;
        combined.push_str(&contents);
        if !combined.ends_with('\n') {
            combined.push('\n');
        }
    }
    Ok(combined)
}

/// Run one bundle through the script pipeline.
///
/// Writes `<name>.js` and `<name>.min.js` into `out_dir` and returns
/// the paths written.
pub fn build_bundle(bundle: &ScriptBundle, out_dir: &Path) -> Result<Vec<PathBuf>, ScriptError> {
    let label = Path::new(&bundle.name);
    let combined = concat_sources(bundle)?;

    let expanded = transpile(&combined, label)?;
    let minified = minify(&expanded, label)?;

    fs::create_dir_all(out_dir)?;

    let expanded_path = out_dir.join(format!("{}.js", bundle.name));
    fs::write(&expanded_path, &expanded)?;

    let minified_path = out_dir.join(format!("{}.min.js", bundle.name));
    fs::write(&minified_path, &minified)?;

    Ok(vec![expanded_path, minified_path])
}

/// Build all script bundles for the project.
///
/// Every bundle independently yields exactly two artifacts; there is no
/// shared state across bundles.
pub fn build_scripts(ctx: &BuildContext) -> Result<Vec<PathBuf>, String> {
    let bundles = crate::build::script_bundles(ctx).map_err(|e| e.to_string())?;
    let out_dir = ctx.scripts_out_dir();

    let mut outputs = Vec::new();
    for bundle in &bundles {
        if ctx.is_verbose() {
            println!("  bundle {} ({} files)", bundle.name, bundle.sources.len());
        }
        let written = build_bundle(bundle, &out_dir).map_err(|e| e.to_string())?;
        outputs.extend(written);
    }
    Ok(outputs)
}
