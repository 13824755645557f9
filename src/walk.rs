use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Lazy depth-first walk over a cables tree, yielding files whose name ends
/// with `suffix` (case-sensitive). Siblings are visited in file-name order.
///
/// Symlinks are followed. Loops, permission errors and entries that vanish
/// mid-walk are logged and skipped.
pub struct CableFiles {
    entries: walkdir::IntoIter,
    suffix: String,
}

impl CableFiles {
    pub fn new(root: &Path, suffix: &str) -> Self {
        CableFiles {
            entries: WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter(),
            suffix: suffix.to_string(),
        }
    }
}

impl Iterator for CableFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if entry.file_type().is_file()
                        && entry.file_name().to_string_lossy().ends_with(&self.suffix)
                    {
                        return Some(entry.into_path());
                    }
                }
                Err(e) => {
                    if let Some(ancestor) = e.loop_ancestor() {
                        warn!(path = ?e.path(), ancestor = ?ancestor, "Skipping symlink loop");
                    } else {
                        warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                    }
                }
            }
        }
    }
}
