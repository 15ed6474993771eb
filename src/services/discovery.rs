//! Split discovery.
//!
//! In `file` mode the input root itself is the only split. In `directory`
//! mode every immediate subdirectory of `{input_root}/{dir}` is a split.
//! Either way the result is sorted and deduplicated, so the order logged
//! here is the order every file list is built in.

use crate::error::LayoutError;
use crate::models::{ResolvedLogic, SplitMode};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::ErrorKind;

/// Lists the immediate child directories of a split root.
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryLister {
    /// Child directories of `root`, in any order. Non-directory entries are skipped.
    fn list_dirs(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, LayoutError>;
}

/// [`DirectoryLister`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list_dirs(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, LayoutError> {
        let entries = fs::read_dir(root).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LayoutError::discovery(root, "directory does not exist"),
            _ if root.is_file() => LayoutError::discovery(root, "not a directory"),
            _ => LayoutError::discovery(root, e.to_string()),
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LayoutError::discovery(root, e.to_string()))?;
            let path = entry.path();
            // Follows symlinks, so a linked split directory counts
            if !path.is_dir() {
                continue;
            }
            let path = Utf8PathBuf::try_from(path).map_err(|e| {
                LayoutError::discovery(
                    root,
                    format!("non UTF-8 split directory {}", e.as_path().display()),
                )
            })?;
            dirs.push(path);
        }

        Ok(dirs)
    }
}

/// `{input_root}/{dir}` with `.` components dropped.
pub fn split_root(input_root: &Utf8Path, dir: &str) -> Utf8PathBuf {
    let mut root = input_root.to_path_buf();
    for component in Utf8Path::new(dir).components() {
        if let Utf8Component::Normal(part) = component {
            root.push(part);
        }
    }
    root
}

/// Discover the splits for `logic` under `input_root`.
///
/// # Errors
/// [`LayoutError::SplitDiscovery`] if the split root cannot be listed or holds no directories.
pub fn discover_splits<L: DirectoryLister + ?Sized>(
    lister: &L,
    input_root: &Utf8Path,
    logic: &ResolvedLogic,
) -> Result<Vec<Utf8PathBuf>, LayoutError> {
    let mut splits = match logic.mode {
        SplitMode::Directory => {
            let root = split_root(input_root, &logic.dir);
            tracing::debug!("Listing split directories under {}", root);
            let splits = lister.list_dirs(&root)?;
            if splits.is_empty() {
                return Err(LayoutError::discovery(root, "no split directories found"));
            }
            splits
        }
        SplitMode::File => vec![input_root.to_path_buf()],
    };

    splits.sort();
    splits.dedup();

    tracing::info!("Splits order:");
    for (i, split) in splits.iter().enumerate() {
        tracing::info!("Split {}: {}", i, split);
    }

    Ok(splits)
}
