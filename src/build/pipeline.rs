//! Build pipeline orchestration.
//!
//! The pipeline runs the clean task first (the output tree must not be
//! deleted out from under a writer), then fans the five build tasks out
//! onto scoped threads. The tasks read disjoint input globs and write
//! disjoint output paths, so they share nothing but the filesystem; a
//! failing task never stops the others.

use crate::build::{BuildContext, BuildResult, TaskKind, TaskResult};
use std::fs;
use std::io::ErrorKind;
use std::sync::Mutex;
use std::time::Instant;

/// Error during build execution.
#[derive(Debug)]
pub enum BuildError {
    /// Discovery error
    Discovery(crate::build::DiscoveryError),
    /// IO error
    Io(std::io::Error),
    /// Generic build error
    Build(String),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Discovery(e) => write!(f, "Discovery error: {}", e),
            BuildError::Io(e) => write!(f, "IO error: {}", e),
            BuildError::Build(e) => write!(f, "Build error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<crate::build::DiscoveryError> for BuildError {
    fn from(e: crate::build::DiscoveryError) -> Self {
        BuildError::Discovery(e)
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}

/// Build pipeline for executing the default task set.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context }
    }

    /// Get the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Run the default pipeline: clean, then all build tasks in parallel.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let mut result = BuildResult::new();

        // Clean must finish before any task writes into the output tree
        result.add_result(self.run_clean());

        fs::create_dir_all(self.context.out_dir())?;

        let collected: Mutex<Vec<TaskResult>> = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for kind in TaskKind::PARALLEL {
                let collected = &collected;
                s.spawn(move || {
                    let task_result = self.execute_task(kind);
                    if let Ok(mut results) = collected.lock() {
                        results.push(task_result);
                    }
                });
            }
        });

        let mut tasks = collected.into_inner().unwrap_or_default();
        // Thread completion order is arbitrary; report in task order
        tasks.sort_by_key(|r| TaskKind::PARALLEL.iter().position(|k| *k == r.task));
        for task_result in tasks {
            result.add_result(task_result);
        }

        result.total_duration = start.elapsed();
        Ok(result)
    }

    /// Describe what the pipeline would do, without doing it.
    pub fn plan_summary(&self) -> Result<Vec<String>, BuildError> {
        let settings = &self.context.config().settings;
        let mut lines = Vec::new();

        lines.push(format!(
            "clean: {}",
            if settings.clean { self.context.out_dir().display().to_string() } else { "off".into() }
        ));

        if settings.scripts {
            let bundles = crate::build::script_bundles(&self.context)?;
            lines.push(format!("scripts: {} bundles", bundles.len()));
            for bundle in &bundles {
                lines.push(format!("  - {} ({} files)", bundle.name, bundle.sources.len()));
            }
        } else {
            lines.push("scripts: off".to_string());
        }

        let src_dir = self.context.src_dir();
        for (kind, enabled, sources) in [
            (TaskKind::Styles, settings.styles, &self.context.config().styles.sources),
            (TaskKind::Svgs, settings.svgs, &self.context.config().svgs.sources),
            (TaskKind::Copy, settings.copy, &self.context.config().copy.sources),
        ] {
            if enabled {
                let files = crate::build::discover_with_rel(&src_dir, sources)?;
                lines.push(format!("{}: {} files", kind, files.len()));
            } else {
                lines.push(format!("{}: off", kind));
            }
        }

        Ok(lines)
    }

    /// Run the clean task: delete the output tree if enabled.
    ///
    /// A missing output directory is success (idempotent).
    fn run_clean(&self) -> TaskResult {
        if !self.context.config().settings.clean {
            return TaskResult::skipped(TaskKind::Clean);
        }

        let start = Instant::now();
        let out_dir = self.context.out_dir();
        if self.context.is_verbose() {
            println!("Cleaning {} ...", out_dir.display());
        }

        match fs::remove_dir_all(&out_dir) {
            Ok(()) => TaskResult::success(TaskKind::Clean, vec![], start.elapsed()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                TaskResult::success(TaskKind::Clean, vec![], start.elapsed())
            }
            Err(e) => TaskResult::failed(TaskKind::Clean, e.to_string(), start.elapsed()),
        }
    }

    /// Execute a single build task, honoring its settings flag.
    fn execute_task(&self, kind: TaskKind) -> TaskResult {
        let settings = &self.context.config().settings;
        let enabled = match kind {
            TaskKind::Clean => settings.clean,
            TaskKind::Scripts | TaskKind::Lint => settings.scripts,
            TaskKind::Styles => settings.styles,
            TaskKind::Svgs => settings.svgs,
            TaskKind::Copy => settings.copy,
        };
        if !enabled {
            return TaskResult::skipped(kind);
        }

        let start = Instant::now();
        if self.context.is_verbose() {
            println!("Running: {} ...", kind);
        }

        // Lint is advisory: findings become warnings, never a failure
        if kind == TaskKind::Lint {
            return match crate::lint::run_lint(&self.context) {
                Ok(report) => {
                    crate::lint::print_report(&report);
                    let warnings =
                        report.diagnostics.iter().map(|d| d.to_string()).collect();
                    TaskResult::success(TaskKind::Lint, vec![], start.elapsed())
                        .with_warnings(warnings)
                }
                Err(e) => TaskResult::failed(TaskKind::Lint, e, start.elapsed()),
            };
        }

        let outputs = match kind {
            TaskKind::Scripts => crate::scripts::build_scripts(&self.context),
            TaskKind::Styles => crate::styles::build_styles(&self.context),
            TaskKind::Svgs => crate::svgs::build_svgs(&self.context),
            TaskKind::Copy => crate::copy::copy_files(&self.context),
            TaskKind::Clean | TaskKind::Lint => unreachable!("handled above"),
        };

        let duration = start.elapsed();
        match outputs {
            Ok(outputs) => {
                if self.context.is_verbose() {
                    println!("  {} done in {:?}", kind, duration);
                }
                TaskResult::success(kind, outputs, duration)
            }
            Err(e) => {
                if self.context.is_verbose() {
                    println!("  {} failed: {}", kind, e);
                }
                TaskResult::failed(kind, e, duration)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::TaskStatus;
    use crate::config::default_config;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(contents.as_bytes()).unwrap();
    }

    fn seed_project(root: &Path) {
        write_file(root, "src/js/app/a.js", "var a = 1;\n");
        write_file(root, "src/sass/main.scss", ".a { color: red; }\n");
        write_file(root, "src/svg/icon.svg", "<svg><rect width=\"1\"/></svg>");
        write_file(root, "src/copy/robots.txt", "User-agent: *\n");
    }

    fn test_context(root: &Path) -> BuildContext {
        let mut config = default_config();
        config.project.name = "test".to_string();
        BuildContext::new(config, root.to_path_buf())
    }

    #[test]
    fn test_pipeline_full_build() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());

        let result = BuildPipeline::new(test_context(temp.path())).build().unwrap();
        assert!(result.is_success());

        assert!(temp.path().join("dist/js/app.js").exists());
        assert!(temp.path().join("dist/js/app.min.js").exists());
        assert!(temp.path().join("dist/css/main.css").exists());
        assert!(temp.path().join("dist/css/main.min.css").exists());
        assert!(temp.path().join("dist/svg/icon.svg").exists());
        assert!(temp.path().join("dist/robots.txt").exists());
    }

    #[test]
    fn test_pipeline_empty_project() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let result = BuildPipeline::new(test_context(temp.path())).build().unwrap();
        // Missing inputs are not errors; tasks complete with no artifacts
        assert!(result.is_success());
        assert!(result.all_outputs().is_empty());
    }

    #[test]
    fn test_pipeline_disabled_tasks_skip() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());

        let mut config = default_config();
        config.project.name = "test".to_string();
        config.settings.scripts = false;
        config.settings.styles = false;
        config.settings.svgs = false;
        config.settings.copy = false;
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = BuildPipeline::new(ctx).build().unwrap();
        assert!(result.is_success());

        for kind in [TaskKind::Scripts, TaskKind::Lint, TaskKind::Styles, TaskKind::Svgs, TaskKind::Copy]
        {
            assert_eq!(result.task(kind).unwrap().status, TaskStatus::Skipped);
        }
        assert!(!temp.path().join("dist/js").exists());
        assert!(!temp.path().join("dist/css").exists());
    }

    #[test]
    fn test_pipeline_clean_removes_stale_output() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());
        write_file(temp.path(), "dist/stale.txt", "old artifact\n");

        BuildPipeline::new(test_context(temp.path())).build().unwrap();
        assert!(!temp.path().join("dist/stale.txt").exists());
    }

    #[test]
    fn test_pipeline_clean_disabled_keeps_stale_output() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());
        write_file(temp.path(), "dist/stale.txt", "old artifact\n");

        let mut config = default_config();
        config.project.name = "test".to_string();
        config.settings.clean = false;
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = BuildPipeline::new(ctx).build().unwrap();
        assert_eq!(result.task(TaskKind::Clean).unwrap().status, TaskStatus::Skipped);
        assert!(temp.path().join("dist/stale.txt").exists());
    }

    #[test]
    fn test_pipeline_clean_missing_output_is_success() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let result = BuildPipeline::new(test_context(temp.path())).build().unwrap();
        assert_eq!(result.task(TaskKind::Clean).unwrap().status, TaskStatus::Success);
    }

    #[test]
    fn test_pipeline_style_failure_is_isolated() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());
        write_file(temp.path(), "src/sass/broken.scss", ".a { color: }\n");

        let result = BuildPipeline::new(test_context(temp.path())).build().unwrap();
        assert!(!result.is_success());
        assert_eq!(result.failed_count(), 1);
        assert!(result.task(TaskKind::Styles).unwrap().status.is_failure());

        // The other tasks still completed and wrote their outputs
        assert!(result.task(TaskKind::Scripts).unwrap().is_success());
        assert!(temp.path().join("dist/js/app.js").exists());
        assert!(temp.path().join("dist/svg/icon.svg").exists());
        assert!(temp.path().join("dist/robots.txt").exists());
    }

    #[test]
    fn test_pipeline_lint_findings_do_not_fail_build() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/js/bad.js", "var = ;");

        let result = BuildPipeline::new(test_context(temp.path())).build().unwrap();
        // The script build fails on the broken source, but lint itself
        // reports success with warnings
        let lint = result.task(TaskKind::Lint).unwrap();
        assert!(lint.is_success());
        assert!(!lint.warnings.is_empty());
    }

    #[test]
    fn test_pipeline_double_build_is_idempotent() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());

        let ctx = test_context(temp.path());
        BuildPipeline::new(ctx.clone()).build().unwrap();
        let first = fs::read_to_string(temp.path().join("dist/js/app.min.js")).unwrap();
        let first_css = fs::read_to_string(temp.path().join("dist/css/main.min.css")).unwrap();

        BuildPipeline::new(ctx).build().unwrap();
        let second = fs::read_to_string(temp.path().join("dist/js/app.min.js")).unwrap();
        let second_css = fs::read_to_string(temp.path().join("dist/css/main.min.css")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_css, second_css);
    }

    #[test]
    fn test_plan_summary_lists_bundles() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());

        let pipeline = BuildPipeline::new(test_context(temp.path()));
        let lines = pipeline.plan_summary().unwrap();
        assert!(lines.iter().any(|l| l.contains("scripts: 1 bundles")));
        assert!(lines.iter().any(|l| l.contains("app (1 files)")));
        assert!(lines.iter().any(|l| l.contains("styles: 1 files")));
    }
}
