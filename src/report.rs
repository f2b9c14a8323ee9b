use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::TagVersion;
use crate::error::TagFixError;
use crate::normalize::Normalized;
use crate::scan::FileTask;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Sink for per-file events raised during a run or a dry run
pub trait Reporter {
    /// A file was normalized (or left alone because it has no tags)
    fn file_normalized(&mut self, task: &FileTask, outcome: Normalized, version: TagVersion);

    /// Normalizing a file failed; the run continues
    fn file_failed(&mut self, task: &FileTask, error: &TagFixError);

    /// A dry run matched a file
    fn file_matched(&mut self, _relative: &Path, _size: u64) {}

    /// An entry could not be read and was left out
    fn entry_skipped(&mut self, error: &TagFixError);

    /// The run stopped early after `completed` files
    fn interrupted(&mut self, _completed: usize) {}

    fn finish(&mut self) {}
}

/// Production reporter: one log record per file, plus an optional spinner
pub struct TracingReporter {
    progress: Option<ProgressBar>,
    list_matches: bool,
}

impl TracingReporter {
    pub fn new(show_progress: bool, list_matches: bool) -> Self {
        let progress = show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} files {wide_msg}")
            {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        Self {
            progress,
            list_matches,
        }
    }

    fn tick(&self, message: &str) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
            pb.set_message(message.to_string());
        }
    }
}

impl Reporter for TracingReporter {
    fn file_normalized(&mut self, task: &FileTask, outcome: Normalized, version: TagVersion) {
        let name = task.file_name();
        match (outcome, task.strategy) {
            (Normalized::NoTags, _) => info!("Processed (no tags): {}", name),
            (Normalized::Written, strategy) if strategy.is_version_sensitive() => {
                info!("Processed v2.{}: {}", version.minor(), name)
            }
            (Normalized::Written, _) => info!("Processed: {}", name),
        }
        self.tick(&name);
    }

    fn file_failed(&mut self, task: &FileTask, error: &TagFixError) {
        let name = task.file_name();
        error!("Failed on {}: {}", name, error);
        self.tick(&name);
    }

    fn file_matched(&mut self, relative: &Path, _size: u64) {
        if self.list_matches {
            info!("  {}", relative.display());
        }
        self.tick(&relative.to_string_lossy());
    }

    fn entry_skipped(&mut self, error: &TagFixError) {
        warn!("Skipping unreadable entry: {}", error);
    }

    fn interrupted(&mut self, completed: usize) {
        warn!("Stopped after {} files", completed);
    }

    fn finish(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

/// Format a byte count in gibibytes with two decimals
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GIB)
}

/// Format a duration as a short human readable string
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m {}s", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Strategy;

    #[test]
    fn test_format_gib() {
        assert_eq!(format_gib(0), "0.00 GB");
        assert_eq!(format_gib(600), "0.00 GB");
        assert_eq!(format_gib(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_gib(3 * 1024 * 1024 * 1024 / 2), "1.50 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
    }

    #[test]
    fn test_tracing_reporter_without_progress() {
        let mut reporter = TracingReporter::new(false, true);
        let task = FileTask {
            path: "music/song.mp3".into(),
            strategy: Strategy::Mp3,
        };
        reporter.file_normalized(&task, Normalized::Written, TagVersion::V2_4);
        reporter.file_failed(&task, &TagFixError::MissingTag("APEv2"));
        reporter.file_matched(Path::new("song.mp3"), 10);
        reporter.finish();
        assert!(reporter.progress.is_none());
    }
}
