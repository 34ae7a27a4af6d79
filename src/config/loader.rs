//! Configuration loading and discovery for `apx.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::ApxConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse apx.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override source directory
    pub src: Option<PathBuf>,
    /// Override dev server port
    pub port: Option<u16>,
}

/// Find apx.toml by walking up from the current working directory.
///
/// # Returns
/// - `Some(path)` if an apx.toml file is found
/// - `None` if no config file is found
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find apx.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start
/// directory, useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join("apx.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        // Move to parent directory
        if !current.pop() {
            // Reached root, no config found
            return None;
        }
    }
}

/// Load configuration from an apx.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// `find_config()` to locate the config file. If no config file is
/// found, returns a default configuration.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<ApxConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<ApxConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: ApxConfig = toml::from_str(&contents)?;

    // Validate the config
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Create a default configuration when no apx.toml is found.
///
/// Returns a minimal valid configuration with the project name set to
/// the current directory name.
pub fn default_config() -> ApxConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    ApxConfig {
        project: super::schema::ProjectConfig {
            name: project_name,
            version: "0.1.0".to_string(),
            src: PathBuf::from("src"),
            out: PathBuf::from("dist"),
        },
        settings: Default::default(),
        scripts: Default::default(),
        styles: Default::default(),
        svgs: Default::default(),
        copy: Default::default(),
        serve: Default::default(),
        watch: Default::default(),
    }
}

/// Apply CLI overrides on top of a loaded configuration.
pub fn merge_cli_overrides(config: &mut ApxConfig, overrides: &CliOverrides) {
    if let Some(out) = &overrides.out {
        config.project.out = out.clone();
    }
    if let Some(src) = &overrides.src {
        config.project.src = src.clone();
    }
    if let Some(port) = overrides.port {
        config.serve.port = port;
    }
}
