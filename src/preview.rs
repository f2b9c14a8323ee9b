//! Read-only preview of what a run would touch.

use std::path::{Path, PathBuf};

use crate::engine::Interrupt;
use crate::error::{Result, TagFixError};
use crate::format::FormatRegistry;
use crate::report::{self, Reporter};
use crate::scan;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewOutcome {
    pub files: usize,
    pub total_bytes: u64,
    /// Matched paths relative to the root, when requested
    pub paths: Option<Vec<PathBuf>>,
}

impl PreviewOutcome {
    pub fn total_size(&self) -> String {
        report::format_gib(self.total_bytes)
    }
}

/// Dry-run traversal: same discovery as a real run, but only file sizes
/// are read and nothing is opened for writing.
pub struct DryRun {
    registry: FormatRegistry,
    interrupt: Interrupt,
    collect_paths: bool,
}

impl DryRun {
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            registry: FormatRegistry::new(),
            interrupt,
            collect_paths: false,
        }
    }

    /// Keep the relative path of every match in the outcome
    pub fn collect_paths(mut self, collect: bool) -> Self {
        self.collect_paths = collect;
        self
    }

    pub fn run(&self, root: &Path, reporter: &mut dyn Reporter) -> Result<PreviewOutcome> {
        scan::check_root(root)?;

        let mut outcome = PreviewOutcome {
            paths: self.collect_paths.then(Vec::new),
            ..Default::default()
        };

        for task in scan::discover(root, &self.registry, &self.interrupt) {
            let size = match task.and_then(|t| Ok((std::fs::metadata(&t.path)?.len(), t))) {
                Ok((size, task)) => {
                    let relative = pathdiff::diff_paths(&task.path, root).unwrap_or(task.path);
                    reporter.file_matched(&relative, size);
                    if let Some(paths) = outcome.paths.as_mut() {
                        paths.push(relative);
                    }
                    size
                }
                Err(e) => {
                    reporter.entry_skipped(&e);
                    continue;
                }
            };

            outcome.files += 1;
            outcome.total_bytes += size;
        }

        if self.interrupt.is_triggered() {
            reporter.interrupted(outcome.files);
            return Err(TagFixError::Interrupted);
        }

        Ok(outcome)
    }
}
