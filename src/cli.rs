use chrono::{DateTime, Local};
use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, TagVersion};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fix tag encoding in audio files by rewriting them in a canonical layout",
    long_about = None,
    after_help = "Examples:\n  tagfix D:\\music --id3-v24\n  tagfix /home/user/music --log music_convert.log\n  tagfix . --verbose --test"
)]
pub struct Args {
    /// Folder containing audio files
    #[arg(required_unless_present = "print_config")]
    pub path: Option<PathBuf>,

    /// Write ID3v2.4 tags instead of ID3v2.3
    #[arg(long = "id3-v24", conflicts_with = "id3_v23")]
    pub id3_v24: bool,

    /// Write ID3v2.3 tags (the default)
    #[arg(long = "id3-v23")]
    pub id3_v23: bool,

    /// Enable verbose console output
    #[arg(short, long)]
    pub verbose: bool,

    /// Test mode: only show what would be processed
    #[arg(short, long)]
    pub test: bool,

    /// Write the log to this file
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Directory for automatically named log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Override configuration values with the flags that were given
    pub fn apply(&self, config: &mut Config) {
        if self.id3_v24 {
            config.tags.id3_version = TagVersion::V2_4;
        } else if self.id3_v23 {
            config.tags.id3_version = TagVersion::V2_3;
        }
        if let Some(dir) = &self.log_dir {
            config.logging.directory = dir.clone();
        }
    }

    /// Where this run should log to, if anywhere.
    ///
    /// An explicit `--log` always wins. Otherwise real runs get a
    /// timestamped file in the log directory, and dry runs get none.
    pub fn log_file(&self, config: &Config, now: DateTime<Local>) -> Option<PathBuf> {
        if let Some(path) = &self.log {
            return Some(path.clone());
        }
        if self.test || !config.logging.file {
            return None;
        }
        let name = format!("audio_tags_convert_{}.log", now.format("%Y%m%d_%H%M%S"));
        Some(config.logging.directory.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tagfix").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_version_flags() {
        let mut config = Config::default();
        parse(&["music"]).apply(&mut config);
        assert_eq!(config.tags.id3_version, TagVersion::V2_3);

        parse(&["music", "--id3-v24"]).apply(&mut config);
        assert_eq!(config.tags.id3_version, TagVersion::V2_4);

        parse(&["music", "--id3-v23"]).apply(&mut config);
        assert_eq!(config.tags.id3_version, TagVersion::V2_3);

        let conflict = Args::try_parse_from(["tagfix", "music", "--id3-v23", "--id3-v24"]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_path_required_unless_printing_config() {
        assert!(Args::try_parse_from(["tagfix"]).is_err());
        let args = parse(&["--print-config"]);
        assert!(args.path.is_none());
    }

    #[test]
    fn test_log_file_selection() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let config = Config::default();

        let args = parse(&["music"]);
        assert_eq!(
            args.log_file(&config, now),
            Some(PathBuf::from("logs").join("audio_tags_convert_20240309_140507.log"))
        );

        let args = parse(&["music", "-t"]);
        assert_eq!(args.log_file(&config, now), None);

        let args = parse(&["music", "-t", "-l", "run.log"]);
        assert_eq!(args.log_file(&config, now), Some(PathBuf::from("run.log")));

        let mut config = Config::default();
        let args = parse(&["music", "--log-dir", "/tmp/tagfix"]);
        args.apply(&mut config);
        assert_eq!(
            args.log_file(&config, now),
            Some(PathBuf::from("/tmp/tagfix").join("audio_tags_convert_20240309_140507.log"))
        );

        config.logging.file = false;
        assert_eq!(args.log_file(&config, now), None);
    }
}
