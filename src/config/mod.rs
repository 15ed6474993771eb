pub mod settings;

use crate::error::LayoutError;
use crate::models::AppConfig;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;

pub use settings::Settings;

/// Name of the configuration file inside the input root, echoed verbatim into the output root.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Input root used inside the app container when none is given.
pub const DEFAULT_INPUT_DIR: &str = "/mnt/input";

/// Output root used inside the app container when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "/mnt/output";

/// A `config.yml` file holding sections for one or more apps.
///
/// The file is keyed by app name at the top level. Only the section of the
/// requested app is interpreted; the other sections are left alone.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: Utf8PathBuf,
}

impl ConfigFile {
    /// Wrap the configuration file at `path`. Nothing is read until [`load_app`](Self::load_app).
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The configuration file found in an input root.
    pub fn in_dir<P: AsRef<Utf8Path>>(input_dir: P) -> Self {
        Self::new(input_dir.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Load and validate the section of `app_name`.
    ///
    /// # Errors
    /// - [`LayoutError::ConfigRead`] if the file cannot be read
    /// - [`LayoutError::ConfigParse`] if it is not a YAML mapping
    /// - [`LayoutError::ConfigMissing`] if `app_name` is not a top-level key
    /// - [`LayoutError::ConfigMalformed`] if the section does not fit [`AppConfig`]
    pub fn load_app(&self, app_name: &str) -> Result<AppConfig, LayoutError> {
        let file_contents =
            fs::read_to_string(&self.path).map_err(|source| LayoutError::ConfigRead {
                path: self.path.clone(),
                source,
            })?;

        let mut document: IndexMap<String, serde_yaml_ng::Value> =
            serde_yaml_ng::from_str(&file_contents).map_err(|source| {
                LayoutError::ConfigParse {
                    path: self.path.clone(),
                    source,
                }
            })?;

        let section = document
            .shift_remove(app_name)
            .ok_or_else(|| LayoutError::ConfigMissing {
                app: app_name.to_string(),
                path: self.path.clone(),
            })?;

        // `app:` with nothing under it is an empty section, which still lacks
        // the required dataset keys
        let section = if section.is_null() {
            serde_yaml_ng::Value::Mapping(serde_yaml_ng::Mapping::new())
        } else {
            section
        };
        let config: AppConfig =
            serde_yaml_ng::from_value(section).map_err(|e| LayoutError::ConfigMalformed {
                app: app_name.to_string(),
                reason: e.to_string(),
            })?;

        config
            .validate()
            .map_err(|reason| LayoutError::ConfigMalformed {
                app: app_name.to_string(),
                reason,
            })?;

        tracing::info!("Loaded config for app '{}' from {}", app_name, self.path);
        Ok(config)
    }

    /// Copy the file byte for byte to `{output_dir}/config.yml`.
    ///
    /// The output root is created if it does not exist yet.
    pub fn echo_to<P: AsRef<Utf8Path>>(&self, output_dir: P) -> Result<Utf8PathBuf, LayoutError> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).map_err(|e| LayoutError::io(output_dir, e))?;

        let destination = output_dir.join(CONFIG_FILE_NAME);
        if destination == self.path {
            tracing::debug!("Config file already at {}, not copying", destination);
            return Ok(destination);
        }

        fs::copy(&self.path, &destination).map_err(|e| LayoutError::io(&destination, e))?;

        tracing::info!("Copied config file to {}", destination);
        Ok(destination)
    }
}
