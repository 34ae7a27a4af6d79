//! Static file copy.
//!
//! Copies every file matching the copy globs into the output root,
//! preserving paths relative to the copy root. No transformation.

use crate::build::BuildContext;
use std::fs;
use std::path::PathBuf;

/// Copy all static inputs for the project.
pub fn copy_files(ctx: &BuildContext) -> Result<Vec<PathBuf>, String> {
    let files = crate::build::discover_with_rel(&ctx.src_dir(), &ctx.config().copy.sources)
        .map_err(|e| e.to_string())?;
    let out_dir = ctx.out_dir();

    let mut outputs = Vec::new();
    for (path, rel) in files {
        let out_path = out_dir.join(&rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::copy(&path, &out_path)
            .map_err(|e| format!("Failed to copy {}: {}", path.display(), e))?;
        if ctx.is_verbose() {
            println!("  copied {}", rel.display());
        }
        outputs.push(out_path);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildContext;
    use crate::config::default_config;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(contents).unwrap();
    }

    fn test_context(root: &Path) -> BuildContext {
        let mut config = default_config();
        config.project.name = "test".to_string();
        BuildContext::new(config, root.to_path_buf())
    }

    #[test]
    fn test_copy_preserves_relative_paths() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/copy/robots.txt", b"User-agent: *\n");
        write_file(temp.path(), "src/copy/fonts/mono.woff2", b"\x00\x01");

        let outputs = copy_files(&test_context(temp.path())).unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(temp.path().join("dist/robots.txt").exists());
        assert!(temp.path().join("dist/fonts/mono.woff2").exists());
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let payload = b"<!doctype html><html></html>\n";
        write_file(temp.path(), "src/copy/index.html", payload);

        copy_files(&test_context(temp.path())).unwrap();
        let copied = fs::read(temp.path().join("dist/index.html")).unwrap();
        assert_eq!(copied, payload);
    }

    #[test]
    fn test_copy_no_inputs_is_empty() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let outputs = copy_files(&test_context(temp.path())).unwrap();
        assert!(outputs.is_empty());
    }
}
