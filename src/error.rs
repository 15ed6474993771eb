use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while resolving an app's data layout.
///
/// None of these are retried. Each one points at a configuration or
/// environment defect that has to be fixed outside the running process.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("App '{app}' not found in config file {path}")]
    ConfigMissing { app: String, path: Utf8PathBuf },

    #[error("Malformed config for app '{app}': {reason}")]
    ConfigMalformed { app: String, reason: String },

    #[error("Split discovery failed at {path}: {reason}")]
    SplitDiscovery { path: Utf8PathBuf, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LayoutError {
    pub(crate) fn discovery(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::SplitDiscovery {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
