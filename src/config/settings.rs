use super::{CONFIG_FILE_NAME, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::Deserialize;

/// Prefix of environment variables read into [`Settings`], e.g. `SPLITLAYOUT_INPUT_DIR`.
pub const ENV_PREFIX: &str = "SPLITLAYOUT";

/// Host-side settings of one resolver run.
///
/// Layered from built-in defaults, then `SPLITLAYOUT_*` environment
/// variables, then explicit overrides (normally the command line).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub app_name: String,
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    #[serde(default)]
    pub log_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub console: bool,
    #[serde(default)]
    pub json: bool,
}

/// Values that win over both defaults and the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub app_name: Option<String>,
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub log_dir: Option<String>,
    pub console: Option<bool>,
    pub json: Option<bool>,
}

impl Settings {
    /// Build settings from defaults, the process environment and `overrides`.
    pub fn load(overrides: SettingsOverrides) -> Result<Self> {
        Self::load_from(
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
            overrides,
        )
    }

    /// Same as [`load`](Self::load) with an explicit environment source.
    pub fn load_from(env: config::Environment, overrides: SettingsOverrides) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .set_default("input_dir", DEFAULT_INPUT_DIR)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("console", false)?
            .set_default("json", false)?
            .add_source(env)
            .set_override_option("app_name", overrides.app_name)?
            .set_override_option("input_dir", overrides.input_dir)?
            .set_override_option("output_dir", overrides.output_dir)?
            .set_override_option("log_dir", overrides.log_dir)?
            .set_override_option("console", overrides.console)?
            .set_override_option("json", overrides.json)?
            .build()
            .context("Failed to assemble settings")?
            .try_deserialize()
            .context("Invalid settings (is the app name set?)")?;

        Ok(settings)
    }

    /// Path of `config.yml` inside the input root.
    pub fn config_file(&self) -> Utf8PathBuf {
        self.input_dir.join(CONFIG_FILE_NAME)
    }
}
