//! Local directory tree fixtures

use std::fs;
use std::path::{Path, PathBuf};

/// Writes every `(relative_path, content)` pair below `root`, creating
/// parent directories as needed
///
/// # Panics
///
/// Panics if a file cannot be written.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(relative, content)| {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .unwrap_or_else(|e| panic!("create {}: {e}", parent.display()));
            }
            fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
            path
        })
        .collect()
}

/// Relative names of `count` files spread over a few subdirectories
pub fn numbered_files(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("dir{}/file{i:03}.txt", i % 3))
        .collect()
}
