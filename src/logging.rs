use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Where and how to log.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Directory for daily rotating log files; no file output when `None`
    pub log_dir: Option<Utf8PathBuf>,
    /// Prefix for log file names (e.g., "splitlayout")
    pub log_prefix: String,
    /// Start at debug level instead of info
    pub debug_mode: bool,
    /// Also log to stderr
    pub console_output: bool,
    /// Console lines as JSON objects
    pub json_console: bool,
}

/// Keeps logging alive and lets the level change after start-up.
///
/// Must be held for the duration of the program; dropping it flushes and
/// stops the file writer.
pub struct LoggingHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    _guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    /// Switch between `debug` and `info`, e.g. once an app's `debug` flag is known.
    pub fn set_debug(&self, debug_mode: bool) -> Result<()> {
        self.filter
            .modify(|filter| *filter = level_filter(debug_mode))
            .context("Failed to change log level")?;
        tracing::debug!("Log level set, debug={}", debug_mode);
        Ok(())
    }
}

fn level_filter(debug_mode: bool) -> EnvFilter {
    if debug_mode {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Install the global subscriber.
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn setup_logging(options: &LoggingOptions) -> Result<LoggingHandle> {
    let (filter, filter_handle) = reload::Layer::new(level_filter(options.debug_mode));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if let Some(log_dir) = &options.log_dir {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir)
                .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
        }

        let file_appender = rolling::daily(log_dir, &options.log_prefix);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log files
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        );
    }

    if options.console_output {
        let console = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        layers.push(if options.json_console {
            console.json().boxed()
        } else {
            console.with_ansi(true).boxed()
        });
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={:?}, prefix={}, debug={}, console={}",
        options.log_dir,
        options.log_prefix,
        options.debug_mode,
        options.console_output
    );

    Ok(LoggingHandle {
        filter: filter_handle,
        _guard: guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_setup_logging_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("logs")).unwrap();

        let options = LoggingOptions {
            log_dir: Some(log_dir.clone()),
            log_prefix: "test".to_string(),
            ..Default::default()
        };

        // Only one global subscriber per process; a second install may fail,
        // but the directory is created before that.
        if let Ok(handle) = setup_logging(&options) {
            handle.set_debug(true).unwrap();
        }

        assert!(log_dir.exists());
    }
}
