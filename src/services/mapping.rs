use crate::error::LayoutError;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;

/// Output directory that mirrors `split`.
///
/// The split's path relative to `input_root` is joined onto `output_root`;
/// the input root itself maps to the output root.
///
/// # Errors
/// [`LayoutError::SplitDiscovery`] if `split` is not inside `input_root`.
pub fn output_split_path(
    split: &Utf8Path,
    input_root: &Utf8Path,
    output_root: &Utf8Path,
) -> Result<Utf8PathBuf, LayoutError> {
    let relative = split.strip_prefix(input_root).map_err(|_| {
        LayoutError::discovery(split, format!("split is not inside {}", input_root))
    })?;

    if relative.as_str().is_empty() {
        Ok(output_root.to_path_buf())
    } else {
        Ok(output_root.join(relative))
    }
}

/// Output directory for every split, index for index.
pub fn output_splits(
    splits: &[Utf8PathBuf],
    input_root: &Utf8Path,
    output_root: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, LayoutError> {
    splits
        .iter()
        .map(|split| output_split_path(split, input_root, output_root))
        .collect()
}

/// `{split}/{filename}` for each split, keyed by logical dataset name.
pub fn build_file_map(
    splits: &[Utf8PathBuf],
    datasets: &IndexMap<String, String>,
) -> IndexMap<String, Vec<Utf8PathBuf>> {
    datasets
        .iter()
        .map(|(name, filename)| {
            let files = splits.iter().map(|split| split.join(filename)).collect();
            (name.clone(), files)
        })
        .collect()
}

/// Create every output split directory and its ancestors.
///
/// Directories that already exist are left alone.
pub fn materialize_output_dirs(output_splits: &[Utf8PathBuf]) -> Result<(), LayoutError> {
    for dir in output_splits {
        fs::create_dir_all(dir).map_err(|e| LayoutError::io(dir, e))?;
        tracing::debug!("Output directory ready: {}", dir);
    }
    Ok(())
}
