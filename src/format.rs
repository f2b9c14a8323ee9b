//! Supported audio formats and the normalization strategy for each extension.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Tag-container handling strategy selected per file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// ID3v2 tag in an MPEG audio stream
    Mp3,
    /// Native FLAC metadata blocks
    Flac,
    /// MP4/M4A/AAC/ALAC box-based tags
    Mp4,
    /// Ogg Vorbis comment
    OggVorbis,
    /// Ogg Opus comment
    OggOpus,
    /// Windows Media header objects
    Asf,
    /// RIFF INFO list or ID3 chunk, both optional
    Wav,
    /// APEv2 footer tag
    Ape,
    /// APEv2 tag in a WavPack container
    WavPack,
}

impl Strategy {
    /// Whether the write step depends on the tag-version policy
    pub fn is_version_sensitive(self) -> bool {
        matches!(self, Strategy::Mp3)
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Mp3 => "MP3",
            Strategy::Flac => "FLAC",
            Strategy::Mp4 => "MP4",
            Strategy::OggVorbis => "Ogg Vorbis",
            Strategy::OggOpus => "Ogg Opus",
            Strategy::Asf => "ASF",
            Strategy::Wav => "WAV",
            Strategy::Ape => "APE",
            Strategy::WavPack => "WavPack",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grouping used when listing supported formats at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lossy,
    Lossless,
    Container,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Lossy, Category::Lossless, Category::Container];

    pub fn label(self) -> &'static str {
        match self {
            Category::Lossy => "Lossy",
            Category::Lossless => "Lossless",
            Category::Container => "Containers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Lower-case extension including the leading dot
    pub extension: &'static str,
    pub strategy: Strategy,
    pub category: Category,
}

static FORMATS: [FormatDescriptor; 13] = [
    FormatDescriptor { extension: ".mp3", strategy: Strategy::Mp3, category: Category::Lossy },
    FormatDescriptor { extension: ".aac", strategy: Strategy::Mp4, category: Category::Lossy },
    FormatDescriptor { extension: ".ogg", strategy: Strategy::OggVorbis, category: Category::Lossy },
    FormatDescriptor { extension: ".opus", strategy: Strategy::OggOpus, category: Category::Lossy },
    FormatDescriptor { extension: ".wma", strategy: Strategy::Asf, category: Category::Lossy },
    FormatDescriptor { extension: ".flac", strategy: Strategy::Flac, category: Category::Lossless },
    FormatDescriptor { extension: ".alac", strategy: Strategy::Mp4, category: Category::Lossless },
    FormatDescriptor { extension: ".ape", strategy: Strategy::Ape, category: Category::Lossless },
    FormatDescriptor { extension: ".wav", strategy: Strategy::Wav, category: Category::Lossless },
    FormatDescriptor { extension: ".wave", strategy: Strategy::Wav, category: Category::Lossless },
    FormatDescriptor { extension: ".wv", strategy: Strategy::WavPack, category: Category::Lossless },
    FormatDescriptor { extension: ".m4a", strategy: Strategy::Mp4, category: Category::Container },
    FormatDescriptor { extension: ".mp4", strategy: Strategy::Mp4, category: Category::Container },
];

/// Lookup table from file extension to format descriptor.
///
/// Built once and never mutated. Extensions that are not in the table
/// are simply unsupported; resolving them yields `None`.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    by_extension: HashMap<&'static str, FormatDescriptor>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        let by_extension = FORMATS.iter().map(|d| (d.extension, *d)).collect();
        Self { by_extension }
    }

    /// Resolve an extension such as `.MP3` to its strategy.
    ///
    /// Matching is case-insensitive and otherwise exact.
    pub fn resolve(&self, extension: &str) -> Option<Strategy> {
        self.descriptor(extension).map(|d| d.strategy)
    }

    pub fn descriptor(&self, extension: &str) -> Option<&FormatDescriptor> {
        self.by_extension.get(extension.to_lowercase().as_str())
    }

    /// Resolve the final extension of `path`
    pub fn resolve_path(&self, path: &Path) -> Option<Strategy> {
        let extension = path.extension()?.to_str()?;
        self.resolve(&format!(".{}", extension))
    }

    /// All descriptors in listing order
    pub fn descriptors(&self) -> impl Iterator<Item = &'static FormatDescriptor> {
        FORMATS.iter()
    }

    pub fn extensions_in(&self, category: Category) -> Vec<&'static str> {
        self.descriptors()
            .filter(|d| d.category == category)
            .map(|d| d.extension)
            .collect()
    }
}
