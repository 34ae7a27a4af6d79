//! Command implementations (build, watch, init)

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildContext, BuildPipeline};
use crate::config::loader::{find_config, load_config, merge_cli_overrides, CliOverrides};

/// Load config and project root, applying CLI overrides.
fn load_context(
    out: Option<&Path>,
    src: Option<&Path>,
    port: Option<u16>,
    verbose: bool,
) -> Result<BuildContext, String> {
    let (config, project_root) = match find_config() {
        Some(config_path) => {
            if verbose {
                println!("Using config: {}", config_path.display());
            }
            let cfg = load_config(Some(&config_path))
                .map_err(|e| format!("Error loading config: {}", e))?;
            let root = config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (cfg, root)
        }
        None => {
            if verbose {
                println!("No apx.toml found, using defaults");
            }
            let root = std::env::current_dir().unwrap_or_default();
            (crate::config::loader::default_config(), root)
        }
    };

    let mut config = config;
    let overrides = CliOverrides {
        out: out.map(|p| p.to_path_buf()),
        src: src.map(|p| p.to_path_buf()),
        port,
    };
    merge_cli_overrides(&mut config, &overrides);

    Ok(BuildContext::new(config, project_root).with_verbose(verbose))
}

/// Run the build command
pub fn run_build(out: Option<&Path>, src: Option<&Path>, dry_run: bool, verbose: bool) -> ExitCode {
    let context = match load_context(out, src, None, verbose) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let src_dir = context.src_dir();
    if !src_dir.exists() {
        eprintln!("Error: Source directory not found: {}", src_dir.display());
        eprintln!("Create the directory or specify a different path with --src");
        return ExitCode::from(EXIT_ERROR);
    }

    let pipeline = BuildPipeline::new(context);

    if dry_run {
        println!("Dry run - would build:");
        match pipeline.plan_summary() {
            Ok(lines) => {
                for line in lines {
                    println!("  {}", line);
                }
                return ExitCode::from(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("  Error discovering inputs: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    match pipeline.build() {
        Ok(result) => {
            if result.is_success() {
                println!("{}", result.summary());
                ExitCode::from(EXIT_SUCCESS)
            } else {
                eprintln!("{}", result.summary());
                ExitCode::from(EXIT_ERROR)
            }
        }
        Err(e) => {
            eprintln!("Build error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the watch command: build once, serve the output, rebuild on
/// changes.
pub fn run_watch(
    out: Option<&Path>,
    src: Option<&Path>,
    port: Option<u16>,
    verbose: bool,
) -> ExitCode {
    let context = match load_context(out, src, port, verbose) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let src_dir = context.src_dir();
    if !src_dir.exists() {
        eprintln!("Error: Source directory not found: {}", src_dir.display());
        return ExitCode::from(EXIT_ERROR);
    }

    // Initial build
    match BuildPipeline::new(context.clone()).build() {
        Ok(result) => {
            if result.is_success() {
                println!("{}", result.summary());
            } else {
                // Watch mode keeps going on a failed build; the next
                // change gets another chance
                eprintln!("{}", result.summary());
            }
        }
        Err(e) => {
            eprintln!("Build error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    // Dev server with reload channel, when enabled
    let reload = if context.config().settings.reload {
        let sender = crate::serve::reload_channel();
        let serve_config = context.config().serve.clone();
        // Detached for the life of the process; watch below never returns
        let _server = crate::serve::start_background(
            context.out_dir(),
            serve_config.host.clone(),
            serve_config.port,
            sender.clone(),
        );
        println!("Serving {} at http://{}:{}", context.out_dir().display(), serve_config.host, serve_config.port);
        Some(sender)
    } else {
        None
    };

    let watch_config = context.config().watch.clone();
    println!("Press Ctrl+C to stop");
    println!();

    match crate::watch::watch_and_rebuild(context, watch_config, reload) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Starter apx.toml written by `apx init`.
const STARTER_CONFIG: &str = r#"[project]
name = "{name}"

# Turn build features on or off here; the CLI takes no feature flags.
[settings]
clean = true
scripts = true
polyfills = false
styles = true
svgs = true
copy = true
reload = true
"#;

/// Starter stylesheet written by `apx init`.
const STARTER_STYLESHEET: &str = "body {\n  margin: 0;\n}\n";

/// Starter script written by `apx init`.
const STARTER_SCRIPT: &str = "(function () {\n  'use strict';\n})();\n";

/// Scaffold a project directory: starter config plus the src tree.
fn init_project(project_path: &Path, project_name: &str) -> Result<(), String> {
    let config_path = project_path.join("apx.toml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    let write_all = || -> std::io::Result<()> {
        fs::create_dir_all(project_path.join("src/js"))?;
        fs::create_dir_all(project_path.join("src/sass"))?;
        fs::create_dir_all(project_path.join("src/svg"))?;
        fs::create_dir_all(project_path.join("src/copy"))?;
        fs::write(&config_path, STARTER_CONFIG.replace("{name}", project_name))?;
        fs::write(project_path.join("src/sass/main.scss"), STARTER_STYLESHEET)?;
        fs::write(project_path.join("src/js/main.js"), STARTER_SCRIPT)?;
        Ok(())
    };
    write_all().map_err(|e| e.to_string())
}

/// Run the init command
pub fn run_init(path: Option<&Path>, name: Option<&str>) -> ExitCode {
    let project_path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let project_name = name
        .map(|n| n.to_string())
        .or_else(|| project_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "my-site".to_string());

    match init_project(&project_path, &project_name) {
        Ok(()) => {
            println!("Created assetpipe project '{}' at {}", project_name, project_path.display());
            println!();
            println!("Project structure:");
            println!("  apx.toml");
            println!("  src/js/      script files or bundle directories");
            println!("  src/sass/    stylesheets");
            println!("  src/svg/     svg icons");
            println!("  src/copy/    static files copied as-is");
            println!();
            println!("Next steps:");
            println!("  apx build    one-shot build into dist/");
            println!("  apx watch    build, serve, and rebuild on changes");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
