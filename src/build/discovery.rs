//! Source file discovery for the build system.
//!
//! Expands the configured glob patterns into concrete inputs and groups
//! script sources into bundles. A script glob match is either a plain
//! file (processed on its own) or a directory (a concatenated bundle of
//! its immediate `.js` children, named after the directory).

use crate::build::BuildContext;
use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// IO error during file enumeration
    Io(std::io::Error),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::Io(err) => write!(f, "IO error during discovery: {}", err),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<std::io::Error> for DiscoveryError {
    fn from(err: std::io::Error) -> Self {
        DiscoveryError::Io(err)
    }
}

/// A script glob match, tagged by what it is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// A single script file, processed directly
    File(PathBuf),
    /// A directory whose immediate `.js` children form a bundle
    Directory(PathBuf),
}

/// A named, concatenated group of script files treated as one build unit.
///
/// The bundle's output name is `<name>.js` (and `<name>.min.js`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBundle {
    /// Bundle name: the source file stem or the directory name,
    /// optionally suffixed `.polyfills`
    pub name: String,
    /// Source files, concatenated in order
    pub sources: Vec<PathBuf>,
}

/// The static prefix of a glob pattern, before the first wildcard
/// component.
///
/// Used to compute output paths relative to the pattern's root, so
/// `sass/**/*.scss` matching `sass/sub/x.scss` yields the relative path
/// `sub/x.scss`.
pub fn pattern_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains('*') || text.contains('?') || text.contains('[') {
            break;
        }
        base.push(component);
    }
    // A pattern naming a single concrete file has no wildcard; its base
    // is the containing directory.
    if base == Path::new(pattern) {
        base.pop();
    }
    base
}

/// Discover regular files matching a glob pattern.
///
/// # Arguments
/// - `base_dir` - Base directory to resolve patterns from
/// - `pattern` - Glob pattern to match
///
/// # Returns
/// Sorted list of matching file paths.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths =
        glob(&pattern_str).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                // Log but continue on glob errors
                eprintln!("Warning: error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Discover files for a set of patterns, pairing each match with its
/// path relative to the pattern's static prefix.
///
/// Deduplicates across patterns; results are sorted by relative path.
pub fn discover_with_rel(
    base_dir: &Path,
    patterns: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>, DiscoveryError> {
    let mut seen = BTreeSet::new();
    for pattern in patterns {
        let root = base_dir.join(pattern_base(pattern));
        for path in discover_files(base_dir, pattern)? {
            let rel = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();
            seen.insert((rel, path));
        }
    }
    Ok(seen.into_iter().map(|(rel, path)| (path, rel)).collect())
}

/// Expand the script glob patterns into tagged file/directory entries.
pub fn discover_script_sources(ctx: &BuildContext) -> Result<Vec<ScriptSource>, DiscoveryError> {
    let src_dir = ctx.src_dir();
    let mut seen = BTreeSet::new();

    for pattern in &ctx.config().scripts.sources {
        let full_pattern = src_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();
        let paths = glob(&pattern_str)
            .map_err(|e| DiscoveryError::InvalidPattern(pattern.clone(), e))?;

        for entry in paths {
            match entry {
                Ok(path) => {
                    seen.insert(path);
                }
                Err(e) => {
                    eprintln!("Warning: error reading path: {}", e);
                }
            }
        }
    }

    Ok(seen
        .into_iter()
        .map(|path| {
            if path.is_dir() {
                ScriptSource::Directory(path)
            } else {
                ScriptSource::File(path)
            }
        })
        .collect())
}

/// Group script sources into bundles.
///
/// A file entry becomes a single-source bundle named after its stem. A
/// directory entry becomes a bundle of its immediate `.js` children
/// named after the directory; when polyfill bundling is enabled, a
/// second `<dir>.polyfills` bundle is added that excludes files whose
/// names end with the configured polyfill suffix.
pub fn script_bundles(ctx: &BuildContext) -> Result<Vec<ScriptBundle>, DiscoveryError> {
    let polyfills = ctx.config().settings.polyfills;
    let suffix = ctx.config().scripts.polyfill_suffix.as_str();

    let mut bundles = Vec::new();
    for source in discover_script_sources(ctx)? {
        match source {
            ScriptSource::File(path) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unnamed".to_string());
                bundles.push(ScriptBundle { name, sources: vec![path] });
            }
            ScriptSource::Directory(dir) => {
                let children = directory_scripts(&dir)?;
                if children.is_empty() {
                    continue;
                }

                let name = dir
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unnamed".to_string());

                bundles.push(ScriptBundle { name: name.clone(), sources: children.clone() });

                if polyfills {
                    let without_polyfills: Vec<PathBuf> = children
                        .into_iter()
                        .filter(|p| !is_polyfill_file(p, suffix))
                        .collect();
                    bundles.push(ScriptBundle {
                        name: format!("{}.polyfills", name),
                        sources: without_polyfills,
                    });
                }
            }
        }
    }

    Ok(bundles)
}

/// Immediate `.js` children of a directory, sorted by name.
fn directory_scripts(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("js") {
            children.push(path);
        }
    }
    children.sort();
    Ok(children)
}

/// Check if a file name matches the polyfill suffix convention.
fn is_polyfill_file(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix))
}
