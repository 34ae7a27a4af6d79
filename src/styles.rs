//! Style pipeline: compile Sass/SCSS and post-process the CSS.
//!
//! Each stylesheet is compiled with grass in expanded style, then run
//! through lightningcss against a fixed browser target set, which adds
//! the vendor prefixes those browsers still need and drops obsolete
//! ones. Two artifacts are written per sheet: `<name>.css` and a
//! minified `<name>.min.css` with comments stripped.
//!
//! Files whose names start with `_` are Sass partials and produce no
//! output of their own.

use crate::build::BuildContext;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error in the style pipeline
#[derive(Debug, Error)]
pub enum StyleError {
    /// Sass compilation failed
    #[error("Failed to compile {path}: {message}")]
    Compile {
        /// Stylesheet the error came from
        path: String,
        /// Compiler diagnostic
        message: String,
    },
    /// CSS post-processing failed
    #[error("Failed to post-process {path}: {message}")]
    Css {
        /// Stylesheet the error came from
        path: String,
        /// lightningcss diagnostic
        message: String,
    },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a browser version the way lightningcss expects.
const fn version(major: u32, minor: u32) -> Option<u32> {
    Some((major << 16) | (minor << 8))
}

/// The browser set prefixes are generated for.
///
/// There is no browserslist file in an assetpipe project; this is the
/// explicit equivalent of a conservative "last few years of evergreen
/// browsers plus Safari 12" query.
pub fn browser_targets() -> Browsers {
    Browsers {
        chrome: version(80, 0),
        edge: version(80, 0),
        firefox: version(72, 0),
        safari: version(12, 0),
        ios_saf: version(12, 0),
        opera: version(67, 0),
        samsung: version(12, 0),
        ..Browsers::default()
    }
}

/// Compile a Sass/SCSS file to expanded CSS.
///
/// The sheet's own directory is on the load path, so `@use`/`@import`
/// of sibling partials resolves.
pub fn compile_stylesheet(path: &Path) -> Result<String, StyleError> {
    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    if let Some(parent) = path.parent() {
        options = options.load_path(parent);
    }

    grass::from_path(path, &options).map_err(|e| StyleError::Compile {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Post-process compiled CSS: vendor prefixing and optional minification.
pub fn postprocess_css(css: &str, path: &Path, minify: bool) -> Result<String, StyleError> {
    let display = path.display().to_string();

    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| StyleError::Css { path: display.clone(), message: e.to_string() })?;

    sheet
        .minify(MinifyOptions {
            targets: Targets::from(browser_targets()),
            ..MinifyOptions::default()
        })
        .map_err(|e| StyleError::Css { path: display.clone(), message: e.to_string() })?;

    let result = sheet
        .to_css(PrinterOptions {
            minify,
            targets: Targets::from(browser_targets()),
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Css { path: display, message: e.to_string() })?;

    Ok(result.code)
}

/// Whether a stylesheet is a Sass partial (underscore-prefixed).
pub fn is_partial(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('_'))
}

/// Build all stylesheets for the project.
///
/// A compile failure propagates and fails the task; no partial output
/// is written for the failing sheet.
pub fn build_styles(ctx: &BuildContext) -> Result<Vec<PathBuf>, String> {
    let sheets =
        crate::build::discover_with_rel(&ctx.src_dir(), &ctx.config().styles.sources)
            .map_err(|e| e.to_string())?;
    let out_dir = ctx.styles_out_dir();

    let mut outputs = Vec::new();
    for (path, rel) in sheets {
        if is_partial(&path) {
            continue;
        }
        if ctx.is_verbose() {
            println!("  stylesheet {}", rel.display());
        }

        let css = compile_stylesheet(&path).map_err(|e| e.to_string())?;
        let expanded = postprocess_css(&css, &path, false).map_err(|e| e.to_string())?;
        let minified = postprocess_css(&css, &path, true).map_err(|e| e.to_string())?;

        let expanded_path = out_dir.join(rel.with_extension("css"));
        if let Some(parent) = expanded_path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::write(&expanded_path, &expanded).map_err(|e| e.to_string())?;

        let minified_path = out_dir.join(rel.with_extension("min.css"));
        fs::write(&minified_path, &minified).map_err(|e| e.to_string())?;

        outputs.push(expanded_path);
        outputs.push(minified_path);
    }
    Ok(outputs)
}
