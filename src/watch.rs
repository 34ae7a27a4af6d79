//! Watch mode for automatic rebuilds on file changes
//!
//! Watches the source tree and re-runs the full default pipeline on any
//! change, then signals the reload channel so connected browsers
//! refresh. Rebuilds are serialized by this loop: a change arriving
//! mid-build queues behind it, and an in-flight build is never
//! cancelled. The only coalescing is the debounce window.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::build::{BuildContext, BuildPipeline, BuildResult};
use crate::config::WatchConfig;

/// Error during watch mode
#[derive(Debug)]
pub enum WatchError {
    /// Failed to initialize file watcher
    WatcherInit(notify::Error),
    /// Failed to add watch path
    WatchPath(notify::Error),
    /// Channel receive error
    ChannelError(String),
    /// Source directory not found
    SourceNotFound(PathBuf),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::WatcherInit(e) => write!(f, "Failed to initialize file watcher: {}", e),
            WatchError::WatchPath(e) => write!(f, "Failed to watch path: {}", e),
            WatchError::ChannelError(msg) => write!(f, "Watch channel error: {}", msg),
            WatchError::SourceNotFound(path) => {
                write!(f, "Source directory not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for WatchError {}

/// Clear the terminal screen
fn clear_screen() {
    // ANSI escape code to clear screen and move cursor to top-left
    print!("\x1B[2J\x1B[1;1H");
}

/// Format duration for display
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Run one pipeline pass and print its outcome.
fn rebuild(context: &BuildContext) -> Option<BuildResult> {
    println!("[{}] Building...", timestamp());
    match BuildPipeline::new(context.clone()).build() {
        Ok(result) => {
            if result.is_success() {
                println!(
                    "[{}] Build complete ({}) - {} files written",
                    timestamp(),
                    format_duration(result.total_duration),
                    result.all_outputs().len()
                );
            } else {
                println!(
                    "[{}] Build failed ({}) - {} task{} failed",
                    timestamp(),
                    format_duration(result.total_duration),
                    result.failed_count(),
                    if result.failed_count() == 1 { "" } else { "s" }
                );
                for task in result.failures() {
                    eprintln!("[{}] Error in {}: {}", timestamp(), task.task, task.status);
                }
            }
            Some(result)
        }
        Err(e) => {
            eprintln!("[{}] Build error: {}", timestamp(), e);
            None
        }
    }
}

/// Watch the source tree and rebuild on changes.
///
/// Blocks until interrupted (Ctrl+C). Every event batch triggers a full
/// pipeline run followed by a reload broadcast; the reload is sent even
/// for failed builds so an open error page can recover once sources are
/// fixed.
///
/// # Arguments
/// * `context` - Build context for the rebuilds
/// * `watch_config` - Debounce and screen-clear settings
/// * `reload` - Reload channel sender, when the dev server is running
///
/// # Returns
/// * `Err(WatchError)` if watch setup fails; does not return otherwise
pub fn watch_and_rebuild(
    context: BuildContext,
    watch_config: WatchConfig,
    reload: Option<broadcast::Sender<()>>,
) -> Result<(), WatchError> {
    let src_dir = context.src_dir();
    if !src_dir.exists() {
        return Err(WatchError::SourceNotFound(src_dir));
    }

    // Create channel for debounced events
    let (tx, rx) = channel();

    // Create debounced watcher
    let debounce_duration = Duration::from_millis(u64::from(watch_config.debounce_ms));
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;

    // Start watching the source directory
    debouncer
        .watcher()
        .watch(&src_dir, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());

    // Watch loop
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changes: Vec<_> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .collect();

                if !changes.is_empty() {
                    for event in &changes {
                        if let Some(name) = event.path.file_name() {
                            println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                        }
                    }

                    if watch_config.clear_screen {
                        clear_screen();
                    }

                    rebuild(&context);

                    if let Some(sender) = &reload {
                        let notified = crate::serve::notify_reload(sender);
                        if context.is_verbose() && notified > 0 {
                            println!("[{}] Reloaded {} client(s)", timestamp(), notified);
                        }
                    }

                    println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());
                }
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
                eprintln!("[{}] Continuing to watch...", timestamp());
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_timestamp_shape() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp.as_bytes()[2], b':');
        assert_eq!(stamp.as_bytes()[5], b':');
    }

    #[test]
    fn test_watch_error_source_not_found() {
        let mut config = default_config();
        config.project.name = "test".to_string();
        config.project.src = PathBuf::from("/nonexistent/path");
        let context = BuildContext::new(config, PathBuf::from("/"));

        let result = watch_and_rebuild(context, WatchConfig::default(), None);
        assert!(matches!(result, Err(WatchError::SourceNotFound(_))));
    }

    #[test]
    fn test_rebuild_reports_result() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let mut config = default_config();
        config.project.name = "test".to_string();
        let context = BuildContext::new(config, temp.path().to_path_buf());

        let result = rebuild(&context).unwrap();
        assert!(result.is_success());
    }
}
