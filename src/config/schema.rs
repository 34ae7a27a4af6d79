//! Configuration schema types for `apx.toml`
//!
//! Defines the structure and validation rules for assetpipe project
//! configuration: the settings table that toggles build tasks, and the
//! path tables that map asset groups to input globs and output
//! directories.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Project version
    #[serde(default = "default_version")]
    pub version: String,
    /// Source directory for asset inputs
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Build output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("dist")
}

/// Build feature toggles.
///
/// Each flag gates one task body; a disabled task reports `skipped` and
/// produces no output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Delete the output directory before building
    #[serde(default = "default_true")]
    pub clean: bool,
    /// Build (and lint) script bundles
    #[serde(default = "default_true")]
    pub scripts: bool,
    /// Produce an extra `.polyfills` bundle per script directory
    #[serde(default)]
    pub polyfills: bool,
    /// Compile stylesheets
    #[serde(default = "default_true")]
    pub styles: bool,
    /// Minify SVG files
    #[serde(default = "default_true")]
    pub svgs: bool,
    /// Copy static files
    #[serde(default = "default_true")]
    pub copy: bool,
    /// Run the dev server and reload browsers in watch mode
    #[serde(default = "default_true")]
    pub reload: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            clean: true,
            scripts: true,
            polyfills: false,
            styles: true,
            svgs: true,
            copy: true,
            reload: true,
        }
    }
}

/// Script bundle inputs and output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Glob patterns for script sources, relative to the src dir.
    /// Matches may be files or directories; a directory becomes a
    /// concatenated bundle of its immediate `.js` children.
    #[serde(default = "default_script_sources")]
    pub sources: Vec<String>,
    /// Filename suffix marking polyfill files
    #[serde(default = "default_polyfill_suffix")]
    pub polyfill_suffix: String,
    /// Output directory, relative to the out dir
    #[serde(default = "default_scripts_out")]
    pub out: PathBuf,
}

fn default_script_sources() -> Vec<String> {
    vec!["js/*".to_string()]
}

fn default_polyfill_suffix() -> String {
    ".polyfill.js".to_string()
}

fn default_scripts_out() -> PathBuf {
    PathBuf::from("js")
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            sources: default_script_sources(),
            polyfill_suffix: default_polyfill_suffix(),
            out: default_scripts_out(),
        }
    }
}

/// Stylesheet inputs and output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Glob patterns for stylesheet sources, relative to the src dir
    #[serde(default = "default_style_sources")]
    pub sources: Vec<String>,
    /// Output directory, relative to the out dir
    #[serde(default = "default_styles_out")]
    pub out: PathBuf,
}

fn default_style_sources() -> Vec<String> {
    vec!["sass/**/*.scss".to_string(), "sass/**/*.sass".to_string()]
}

fn default_styles_out() -> PathBuf {
    PathBuf::from("css")
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self { sources: default_style_sources(), out: default_styles_out() }
    }
}

/// SVG inputs and output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvgsConfig {
    /// Glob patterns for SVG sources, relative to the src dir
    #[serde(default = "default_svg_sources")]
    pub sources: Vec<String>,
    /// Output directory, relative to the out dir
    #[serde(default = "default_svgs_out")]
    pub out: PathBuf,
}

fn default_svg_sources() -> Vec<String> {
    vec!["svg/*.svg".to_string()]
}

fn default_svgs_out() -> PathBuf {
    PathBuf::from("svg")
}

impl Default for SvgsConfig {
    fn default() -> Self {
        Self { sources: default_svg_sources(), out: default_svgs_out() }
    }
}

/// Static file copy inputs.
///
/// Copied files land in the output root, preserving paths relative to
/// the copy root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Glob patterns for files to copy unchanged, relative to the src dir
    #[serde(default = "default_copy_sources")]
    pub sources: Vec<String>,
}

fn default_copy_sources() -> Vec<String> {
    vec!["copy/**/*".to_string()]
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self { sources: default_copy_sources() }
    }
}

/// Dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: true }
    }
}

/// Complete apx.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApxConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Build feature toggles
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Script bundle paths
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Stylesheet paths
    #[serde(default)]
    pub styles: StylesConfig,
    /// SVG paths
    #[serde(default)]
    pub svgs: SvgsConfig,
    /// Static copy paths
    #[serde(default)]
    pub copy: CopyConfig,
    /// Dev server settings
    #[serde(default)]
    pub serve: ServeConfig,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "scripts.sources")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "apx.toml: '{}' {}", self.field, self.message)
    }
}

impl ApxConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        // Validate project.name is non-empty
        if self.project.name.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        // Output must not alias the source tree: the clean task deletes it
        if self.project.out == self.project.src {
            errors.push(ConfigValidationError {
                field: "project.out".to_string(),
                message: "must differ from project.src".to_string(),
            });
        }

        for (field, sources) in [
            ("scripts.sources", &self.scripts.sources),
            ("styles.sources", &self.styles.sources),
            ("svgs.sources", &self.svgs.sources),
            ("copy.sources", &self.copy.sources),
        ] {
            if sources.is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must contain at least one glob pattern".to_string(),
                });
            }
        }

        if self.scripts.polyfill_suffix.is_empty() {
            errors.push(ConfigValidationError {
                field: "scripts.polyfill_suffix".to_string(),
                message: "must be a non-empty suffix".to_string(),
            });
        }

        if self.serve.port == 0 {
            errors.push(ConfigValidationError {
                field: "serve.port".to_string(),
                message: "must be a positive port number".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
