use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use crate::error::{Result, TagFixError};

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_logging() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tags: TagConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagConfig {
    /// ID3v2 sub-version written to MP3 files
    #[serde(default)]
    pub id3_version: TagVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the automatically named log file
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    /// Write a log file during real (non dry-run) runs
    #[serde(default = "default_file_logging")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file: default_file_logging(),
        }
    }
}

/// ID3v2 tag version written by the MP3 strategy.
///
/// Other strategies have a single canonical layout and ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagVersion {
    /// ID3v2.3: widest player compatibility
    #[default]
    #[serde(rename = "v2.3")]
    V2_3,
    /// ID3v2.4: UTF-8 text frames
    #[serde(rename = "v2.4")]
    V2_4,
}

impl TagVersion {
    pub fn minor(self) -> u8 {
        match self {
            TagVersion::V2_3 => 3,
            TagVersion::V2_4 => 4,
        }
    }

    pub fn id3(self) -> id3::Version {
        match self {
            TagVersion::V2_3 => id3::Version::Id3v23,
            TagVersion::V2_4 => id3::Version::Id3v24,
        }
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID3v2.{}", self.minor())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TagFixError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TagFixError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;

        std::fs::write(path, content)
            .map_err(|e| TagFixError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
