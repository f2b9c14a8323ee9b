// Per-format tag normalization
//
// Each strategy reopens a file with a format-aware tag reader and writes it
// back, which re-serializes the tag block in the codec's canonical layout:
// - id3v2: MP3 files through the `id3` crate, version chosen by policy
// - container: lofty-backed formats (FLAC, MP4, Ogg, WAV, APE, WavPack)
// - asf: Windows Media header objects

pub mod asf;
pub mod container;
pub mod id3v2;

use std::path::Path;

use crate::config::TagVersion;
use crate::error::Result;
use crate::format::Strategy;

/// Result of normalizing a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    /// The tag block was written back
    Written,
    /// The file carries no tag data, nothing was written
    NoTags,
}

/// Normalize the tags of `path` using `strategy`.
///
/// `version` only affects [`Strategy::Mp3`].
pub fn normalize(strategy: Strategy, path: &Path, version: TagVersion) -> Result<Normalized> {
    match strategy {
        Strategy::Mp3 => id3v2::normalize(path, version),
        Strategy::Flac => container::normalize_flac(path),
        Strategy::Mp4 => container::normalize_mp4(path),
        Strategy::OggVorbis => container::normalize_vorbis(path),
        Strategy::OggOpus => container::normalize_opus(path),
        Strategy::Asf => asf::normalize(path),
        Strategy::Wav => container::normalize_wav(path),
        Strategy::Ape => container::normalize_ape(path),
        Strategy::WavPack => container::normalize_wavpack(path),
    }
}
