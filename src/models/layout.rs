use crate::models::config::{AppConfig, ResolvedLogic};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Shared layout slots read by the app's later processing stages.
///
/// Held by [`crate::state::StateManager`]. The resolver is the only writer:
/// the Initializer resets every slot, the Reader sets `debug`, and the
/// Finalizer fills `splits`, `input_files` and `output_files`. `smpc_used`
/// is only declared here and is flipped by downstream logic.
///
/// `splits` is an ordered list of unique paths. Index `i` of every entry in
/// `input_files` and `output_files` belongs to `splits[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutState {
    pub smpc_used: bool,
    pub splits: Vec<Utf8PathBuf>,
    pub input_files: IndexMap<String, Vec<Utf8PathBuf>>,
    pub output_files: IndexMap<String, Vec<Utf8PathBuf>>,
    pub debug: bool,
}

impl LayoutState {
    /// True once the Finalizer has published at least one split.
    pub fn is_finalized(&self) -> bool {
        !self.splits.is_empty()
    }
}

/// Result of the Finalizer phase, handed to downstream consumers by value.
#[derive(Clone, Debug)]
pub struct ResolvedLayout {
    pub app_name: String,
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub logic: ResolvedLogic,
    pub config: AppConfig,
    pub splits: Vec<Utf8PathBuf>,
    pub output_splits: Vec<Utf8PathBuf>,
    pub input_files: IndexMap<String, Vec<Utf8PathBuf>>,
    pub output_files: IndexMap<String, Vec<Utf8PathBuf>>,
    pub debug: bool,
}

impl ResolvedLayout {
    pub fn split_count(&self) -> usize {
        self.splits.len()
    }

    /// Input paths for one logical dataset, one per split.
    pub fn input_files(&self, dataset: &str) -> Option<&[Utf8PathBuf]> {
        self.input_files.get(dataset).map(Vec::as_slice)
    }

    /// Output paths for one logical result, one per split.
    pub fn output_files(&self, dataset: &str) -> Option<&[Utf8PathBuf]> {
        self.output_files.get(dataset).map(Vec::as_slice)
    }

    /// Output directory belonging to the split at `index`.
    pub fn output_split(&self, index: usize) -> Option<&Utf8Path> {
        self.output_splits.get(index).map(Utf8PathBuf::as_path)
    }

    /// Location of the echoed configuration file.
    pub fn config_echo_path(&self) -> Utf8PathBuf {
        self.output_dir.join(crate::config::CONFIG_FILE_NAME)
    }

    /// Copy of the shared slots this layout publishes.
    pub fn to_state(&self, smpc_used: bool) -> LayoutState {
        LayoutState {
            smpc_used,
            splits: self.splits.clone(),
            input_files: self.input_files.clone(),
            output_files: self.output_files.clone(),
            debug: self.debug,
        }
    }
}
