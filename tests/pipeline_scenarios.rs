//! End-to-end pipeline scenarios.
//!
//! Builds real projects in temp directories and checks the output tree:
//! polyfill bundle partitioning, settings toggles, clean behavior, and
//! per-task failure isolation.

use assetpipe::build::{BuildContext, BuildPipeline, TaskKind, TaskStatus};
use assetpipe::config::ApxConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn config(toml: &str) -> ApxConfig {
    toml::from_str(toml).unwrap()
}

fn base_config() -> ApxConfig {
    config("[project]\nname = \"scenario\"\n")
}

fn build(root: &Path, config: ApxConfig) -> assetpipe::build::BuildResult {
    let ctx = BuildContext::new(config, root.to_path_buf());
    BuildPipeline::new(ctx).build().unwrap()
}

/// A directory of scripts with polyfills disabled yields exactly one
/// bundle pair containing the concatenation of all files.
#[test]
fn script_directory_without_polyfill_bundling() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/js/app/a.js", "console.log('alpha');\n");
    write_file(temp.path(), "src/js/app/b.polyfill.js", "console.log('poly');\n");

    let result = build(temp.path(), base_config());
    assert!(result.is_success());

    let js_dir = temp.path().join("dist/js");
    let mut entries: Vec<String> = fs::read_dir(&js_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["app.js", "app.min.js"]);

    let bundle = fs::read_to_string(js_dir.join("app.js")).unwrap();
    assert!(bundle.contains("alpha"));
    assert!(bundle.contains("poly"));
}

/// With polyfill bundling enabled, a second bundle pair appears that
/// excludes the polyfill-suffixed files. File counts partition: every
/// source is in the full bundle; non-polyfill sources are in both.
#[test]
fn script_directory_with_polyfill_bundling() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/js/app/a.js", "console.log('alpha');\n");
    write_file(temp.path(), "src/js/app/b.polyfill.js", "console.log('poly');\n");

    let mut cfg = base_config();
    cfg.settings.polyfills = true;
    let result = build(temp.path(), cfg);
    assert!(result.is_success());

    let js_dir = temp.path().join("dist/js");
    let mut entries: Vec<String> = fs::read_dir(&js_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(
        entries,
        vec!["app.js", "app.min.js", "app.polyfills.js", "app.polyfills.min.js"]
    );

    let full = fs::read_to_string(js_dir.join("app.js")).unwrap();
    assert!(full.contains("alpha"));
    assert!(full.contains("poly"));

    let polyfills = fs::read_to_string(js_dir.join("app.polyfills.js")).unwrap();
    assert!(polyfills.contains("alpha"));
    assert!(!polyfills.contains("poly"));
}

/// Unminified output is never smaller than its minified sibling.
#[test]
fn minified_artifacts_are_no_larger() {
    let temp = TempDir::new().unwrap();
    write_file(
        temp.path(),
        "src/js/app/a.js",
        "function greeting(audience) {\n    return 'hello ' + audience;\n}\nconsole.log(greeting('world'));\n",
    );
    write_file(temp.path(), "src/sass/main.scss", "/* banner */\nbody {\n  margin: 0;\n}\n");

    let result = build(temp.path(), base_config());
    assert!(result.is_success());

    let js = fs::metadata(temp.path().join("dist/js/app.js")).unwrap().len();
    let js_min = fs::metadata(temp.path().join("dist/js/app.min.js")).unwrap().len();
    assert!(js >= js_min);

    let css = fs::metadata(temp.path().join("dist/css/main.css")).unwrap().len();
    let css_min = fs::metadata(temp.path().join("dist/css/main.min.css")).unwrap().len();
    assert!(css >= css_min);
}

/// Disabled tasks are reported skipped and write nothing.
#[test]
fn disabled_settings_produce_no_output() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/js/main.js", "console.log('x');\n");
    write_file(temp.path(), "src/sass/main.scss", "body { margin: 0; }\n");
    write_file(temp.path(), "src/svg/icon.svg", "<svg><rect width=\"1\"/></svg>");
    write_file(temp.path(), "src/copy/robots.txt", "User-agent: *\n");

    let cfg = config(
        "[project]\nname = \"scenario\"\n\n[settings]\nscripts = false\nsvgs = false\ncopy = false\n",
    );
    let result = build(temp.path(), cfg);
    assert!(result.is_success());

    assert_eq!(result.task(TaskKind::Scripts).unwrap().status, TaskStatus::Skipped);
    assert_eq!(result.task(TaskKind::Lint).unwrap().status, TaskStatus::Skipped);
    assert_eq!(result.task(TaskKind::Svgs).unwrap().status, TaskStatus::Skipped);
    assert_eq!(result.task(TaskKind::Copy).unwrap().status, TaskStatus::Skipped);

    // Styles stayed enabled and ran
    assert!(temp.path().join("dist/css/main.css").exists());
    assert!(!temp.path().join("dist/js").exists());
    assert!(!temp.path().join("dist/svg").exists());
    assert!(!temp.path().join("dist/robots.txt").exists());
}

/// With clean disabled, stale files in the output tree survive a run.
#[test]
fn stale_output_persists_when_clean_disabled() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/copy/fresh.txt", "fresh\n");
    write_file(temp.path(), "dist/stale.txt", "left over from an old run\n");

    let cfg = config("[project]\nname = \"scenario\"\n\n[settings]\nclean = false\n");
    let result = build(temp.path(), cfg);
    assert!(result.is_success());

    assert!(temp.path().join("dist/stale.txt").exists());
    assert!(temp.path().join("dist/fresh.txt").exists());
}

/// A broken stylesheet fails the style task; scripts, svgs, and copy
/// still complete and write their outputs.
#[test]
fn broken_stylesheet_does_not_block_other_tasks() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/js/main.js", "console.log('ok');\n");
    write_file(temp.path(), "src/sass/broken.scss", ".a { color: }\n");
    write_file(temp.path(), "src/svg/icon.svg", "<svg><rect width=\"1\"/></svg>");
    write_file(temp.path(), "src/copy/robots.txt", "User-agent: *\n");

    let result = build(temp.path(), base_config());
    assert!(!result.is_success());
    assert_eq!(result.failed_count(), 1);
    assert!(result.task(TaskKind::Styles).unwrap().status.is_failure());

    assert!(temp.path().join("dist/js/main.js").exists());
    assert!(temp.path().join("dist/js/main.min.js").exists());
    assert!(temp.path().join("dist/svg/icon.svg").exists());
    assert!(temp.path().join("dist/robots.txt").exists());
}

/// Two runs over unchanged inputs produce identical output trees.
#[test]
fn repeated_builds_are_idempotent() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/js/app/a.js", "console.log('alpha');\n");
    write_file(temp.path(), "src/sass/main.scss", "body { margin: 0; }\n");
    write_file(temp.path(), "src/svg/icon.svg", "<svg><rect width=\"1\"/></svg>");

    build(temp.path(), base_config());
    let snapshot = |name: &str| fs::read(temp.path().join(name)).unwrap();
    let first = [
        snapshot("dist/js/app.js"),
        snapshot("dist/js/app.min.js"),
        snapshot("dist/css/main.css"),
        snapshot("dist/css/main.min.css"),
        snapshot("dist/svg/icon.svg"),
    ];

    build(temp.path(), base_config());
    let second = [
        snapshot("dist/js/app.js"),
        snapshot("dist/js/app.min.js"),
        snapshot("dist/css/main.css"),
        snapshot("dist/css/main.min.css"),
        snapshot("dist/svg/icon.svg"),
    ];

    assert_eq!(first, second);
}

/// Empty input globs complete trivially with zero artifacts.
#[test]
fn missing_inputs_are_not_errors() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();

    let result = build(temp.path(), base_config());
    assert!(result.is_success());
    assert!(result.all_outputs().is_empty());
}
