use std::borrow::Cow;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::Interrupt;
use crate::error::{Result, TagFixError};
use crate::format::{FormatRegistry, Strategy};

/// A supported file found during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    pub strategy: Strategy,
}

impl FileTask {
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
    }
}

/// Fail unless `root` exists and is a directory
pub fn check_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(TagFixError::PathNotFound(root.display().to_string()));
    }
    if !root.is_dir() {
        return Err(TagFixError::NotADirectory(root.display().to_string()));
    }
    Ok(())
}

/// Recursively yield every file under `root` whose extension resolves.
///
/// Entries are visited in file-name order. Files with unsupported
/// extensions are skipped; entries that cannot be read are yielded as
/// errors so the caller can report them. The walk stops at the first entry
/// seen after `interrupt` is raised, supported or not.
pub fn discover<'a>(
    root: &Path,
    registry: &'a FormatRegistry,
    interrupt: &'a Interrupt,
) -> impl Iterator<Item = Result<FileTask>> + 'a {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .take_while(move |_| !interrupt.is_triggered())
        .filter_map(move |entry| match entry {
            Err(e) => Some(Err(TagFixError::Walk(e))),
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    return None;
                }
                registry.resolve_path(entry.path()).map(|strategy| {
                    Ok(FileTask {
                        path: entry.into_path(),
                        strategy,
                    })
                })
            }
        })
}
