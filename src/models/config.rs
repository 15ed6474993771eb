use camino::{Utf8Component, Utf8Path};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How the input data is split.
///
/// `File` means the input root holds one file per dataset. `Directory` means
/// every immediate subdirectory of `{input_root}/{dir}` is one split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    #[default]
    File,
    Directory,
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitMode::File => write!(f, "file"),
            SplitMode::Directory => write!(f, "directory"),
        }
    }
}

/// The `logic` block of an app section. Both keys are required once the block exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicConfig {
    pub mode: SplitMode,
    pub dir: String,
}

/// One app's section of `config.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub debug: Option<bool>,

    #[serde(default)]
    pub logic: Option<LogicConfig>,

    /// Logical dataset name → input filename relative to each split
    pub local_dataset: IndexMap<String, String>,

    /// Logical dataset name → output filename relative to each output split
    pub result: IndexMap<String, String>,

    /// App-specific keys this resolver does not interpret
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

/// Split mode and directory after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLogic {
    pub mode: SplitMode,
    pub dir: String,
}

impl Default for ResolvedLogic {
    fn default() -> Self {
        Self {
            mode: SplitMode::File,
            dir: ".".to_string(),
        }
    }
}

impl AppConfig {
    /// Mode and directory, falling back to `file` and `.` when `logic` is absent.
    pub fn resolved_logic(&self) -> ResolvedLogic {
        match &self.logic {
            Some(logic) => ResolvedLogic {
                mode: logic.mode,
                dir: logic.dir.clone(),
            },
            None => ResolvedLogic::default(),
        }
    }

    /// Check the parts of the section serde cannot express.
    ///
    /// In `directory` mode `logic.dir` must stay under the input root: no
    /// absolute paths and no `..`. `file` mode never reads `dir`.
    pub fn validate(&self) -> Result<(), String> {
        let Some(logic) = &self.logic else {
            return Ok(());
        };
        if logic.mode != SplitMode::Directory {
            return Ok(());
        }

        let dir = Utf8Path::new(&logic.dir);
        if dir.is_absolute() {
            return Err(format!("logic.dir must be relative, got '{}'", logic.dir));
        }
        if dir
            .components()
            .any(|c| matches!(c, Utf8Component::ParentDir | Utf8Component::Prefix(_)))
        {
            return Err(format!(
                "logic.dir must not leave the input directory, got '{}'",
                logic.dir
            ));
        }
        Ok(())
    }

    /// Look up an app-specific key that is not part of the layout schema.
    pub fn extra(&self, key: &str) -> Option<&serde_yaml_ng::Value> {
        self.extra.get(key)
    }
}
