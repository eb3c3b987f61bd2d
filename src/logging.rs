use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initializes the logging system with console output and, when enabled,
/// a daily-rotated JSON log file.
pub fn init_logging(config: &LoggingConfig) {
    let (subscriber, guard) = build_subscriber(config);
    subscriber.init();

    // We need to keep the guard in scope to ensure logs are flushed on exit
    if let Some(guard) = guard {
        std::mem::forget(guard);
    }
}

fn build_subscriber(config: &LoggingConfig) -> (impl tracing::Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let (file_layer, guard) = if config.file_output {
        // Ensure logs directory exists
        let _ = fs::create_dir_all(&config.dir);

        // Create a non-blocking file appender for daily log rotation
        let file_appender = tracing_appender::rolling::daily(&config.dir, &config.file);
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
        (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
    } else {
        (None, None)
    };

    // Create a formatted layer for console logging
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);
    (subscriber, guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &std::path::Path, file_output: bool) -> LoggingConfig {
        LoggingConfig {
            dir: dir.to_path_buf(),
            file: "catalog.log".to_string(),
            filter: "info".to_string(),
            file_output,
        }
    }

    #[test]
    fn test_file_output_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let (subscriber, guard) = build_subscriber(&config(dir.path(), true));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(brand = "sony", "Unknown brand");
        });
        drop(guard);

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0]).unwrap();
        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["message"], "Unknown brand");
        assert_eq!(line["fields"]["brand"], "sony");
    }

    #[test]
    fn test_console_only_creates_no_files() {
        let dir = TempDir::new().unwrap();
        let (subscriber, guard) = build_subscriber(&config(&dir.path().join("logs"), false));
        assert!(guard.is_none());

        tracing::subscriber::with_default(subscriber, || tracing::warn!("console only"));
        assert!(!dir.path().join("logs").exists());
    }
}
