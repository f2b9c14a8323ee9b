use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::config::TagVersion;
use crate::error::{Result, TagFixError};
use crate::format::FormatRegistry;
use crate::normalize::{self, Normalized};
use crate::report::Reporter;
use crate::scan::{self, FileTask};

/// Shared flag raised by the signal handler.
///
/// Traversals check it before every directory entry and once more at the
/// end, so the file being processed when the flag goes up is always
/// finished first and a raised flag never ends in a clean outcome.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters accumulated over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Files normalized successfully, including tag-less WAV files
    pub processed: usize,
    /// Files that failed to open or save
    pub errors: usize,
    /// Processed files that carried no tags and were not written
    pub untagged: usize,
}

/// Walks a directory tree and normalizes every supported file
pub struct Engine {
    registry: FormatRegistry,
    version: TagVersion,
    interrupt: Interrupt,
}

impl Engine {
    pub fn new(version: TagVersion, interrupt: Interrupt) -> Self {
        Self {
            registry: FormatRegistry::new(),
            version,
            interrupt,
        }
    }

    /// Normalize every supported file under `root`.
    ///
    /// A failing file is reported and counted; it never stops the run. Only
    /// an invalid root or an interrupt ends the run early.
    pub fn run(&self, root: &Path, reporter: &mut dyn Reporter) -> Result<RunOutcome> {
        scan::check_root(root)?;
        info!("Normalizing tags under {} ({})", root.display(), self.version);

        let mut outcome = RunOutcome::default();
        for task in scan::discover(root, &self.registry, &self.interrupt) {
            let task = match task {
                Ok(task) => task,
                Err(e) => {
                    reporter.entry_skipped(&e);
                    continue;
                }
            };

            match self.process(&task) {
                Ok(normalized) => {
                    outcome.processed += 1;
                    if normalized == Normalized::NoTags {
                        outcome.untagged += 1;
                    }
                    reporter.file_normalized(&task, normalized, self.version);
                }
                Err(e) => {
                    outcome.errors += 1;
                    reporter.file_failed(&task, &e);
                }
            }
        }

        if self.interrupt.is_triggered() {
            reporter.interrupted(outcome.processed + outcome.errors);
            return Err(TagFixError::Interrupted);
        }

        Ok(outcome)
    }

    fn process(&self, task: &FileTask) -> Result<Normalized> {
        debug!("Normalizing {} as {}", task.path.display(), task.strategy);
        normalize::normalize(task.strategy, &task.path, self.version)
    }
}
