//! SVG minification.
//!
//! Rewrites each SVG through a quick-xml event loop, dropping what a
//! browser never needs: the XML declaration, doctype, comments,
//! processing instructions, `<metadata>` subtrees, and inter-element
//! whitespace. Element structure, attributes, and text content pass
//! through untouched. One input file produces one output file.

use crate::build::BuildContext;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during SVG minification
#[derive(Debug, Error)]
pub enum SvgError {
    /// XML parsing or writing failed
    #[error("Failed to minify {path}: {message}")]
    Xml {
        /// File the error came from
        path: String,
        /// quick-xml diagnostic
        message: String,
    },
    /// Output was not valid UTF-8
    #[error("Minified output for {path} is not valid UTF-8")]
    Encoding {
        /// File the error came from
        path: String,
    },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minify SVG source text.
pub fn minify_svg(source: &str, path: &Path) -> Result<String, SvgError> {
    let display = path.display().to_string();

    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new(Vec::new());
    // Depth inside a <metadata> subtree; everything in it is dropped
    let mut metadata_depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SvgError::Xml { path: display.clone(), message: e.to_string() })?;

        match event {
            Event::Eof => break,
            Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Start(_) if metadata_depth > 0 => {
                metadata_depth += 1;
            }
            Event::Start(ref start) if start.local_name().as_ref() == b"metadata" => {
                metadata_depth = 1;
            }
            Event::End(_) if metadata_depth > 0 => {
                metadata_depth -= 1;
            }
            Event::Empty(ref empty)
                if metadata_depth > 0 || empty.local_name().as_ref() == b"metadata" => {}
            _ if metadata_depth > 0 => {}
            Event::Text(ref text) if text.is_empty() => {}
            event => writer
                .write_event(event)
                .map_err(|e| SvgError::Xml { path: display.clone(), message: e.to_string() })?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|_| SvgError::Encoding { path: display })
}

/// Minify one SVG file into the output directory, preserving its
/// relative path.
pub fn build_svg(path: &Path, rel: &Path, out_dir: &Path) -> Result<PathBuf, SvgError> {
    let source = fs::read_to_string(path)?;
    let minified = minify_svg(&source, path)?;

    let out_path = out_dir.join(rel);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, minified)?;
    Ok(out_path)
}

/// Minify all SVG inputs for the project, in parallel over files.
pub fn build_svgs(ctx: &BuildContext) -> Result<Vec<PathBuf>, String> {
    let files = crate::build::discover_with_rel(&ctx.src_dir(), &ctx.config().svgs.sources)
        .map_err(|e| e.to_string())?;
    let out_dir = ctx.svgs_out_dir();

    let mut outputs: Vec<PathBuf> = files
        .par_iter()
        .map(|(path, rel)| build_svg(path, rel, &out_dir).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, String>>()?;

    outputs.sort();
    Ok(outputs)
}
