//! Normalization for formats handled by `lofty`.
//!
//! Every strategy here follows the same shape: open the file, parse it with
//! the concrete `lofty` file type, then save it back with the default write
//! options. Stream properties are parsed too, so a file whose container
//! structure is broken fails on open rather than on save.

use lofty::ape::ApeFile;
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::flac::FlacFile;
use lofty::iff::wav::WavFile;
use lofty::mp4::Mp4File;
use lofty::ogg::{OpusFile, VorbisFile};
use lofty::tag::TagType;
use lofty::wavpack::WavPackFile;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use super::Normalized;
use crate::error::{Result, TagFixError};

/// Parse `path` as `F`; the read handle is closed before returning
fn open<F: AudioFile>(path: &Path) -> Result<F> {
    let mut file = File::open(path)?;
    Ok(F::read_from(&mut file, ParseOptions::new())?)
}

fn save<F: AudioFile>(audio: &F, path: &Path) -> Result<Normalized> {
    audio.save_to_path(path, WriteOptions::default())?;
    Ok(Normalized::Written)
}

/// Open and write back unconditionally
fn resave<F: AudioFile>(path: &Path) -> Result<Normalized> {
    let audio: F = open(path)?;
    save(&audio, path)
}

pub fn normalize_flac(path: &Path) -> Result<Normalized> {
    resave::<FlacFile>(path)
}

pub fn normalize_mp4(path: &Path) -> Result<Normalized> {
    resave::<Mp4File>(path)
}

pub fn normalize_vorbis(path: &Path) -> Result<Normalized> {
    resave::<VorbisFile>(path)
}

pub fn normalize_opus(path: &Path) -> Result<Normalized> {
    resave::<OpusFile>(path)
}

pub fn normalize_wavpack(path: &Path) -> Result<Normalized> {
    resave::<WavPackFile>(path)
}

/// APE files are expected to carry an APEv2 footer; a file without one is
/// not something this strategy can normalize.
pub fn normalize_ape(path: &Path) -> Result<Normalized> {
    let audio: ApeFile = open(path)?;
    if !audio.contains_tag_type(TagType::Ape) {
        return Err(TagFixError::MissingTag("APEv2"));
    }
    save(&audio, path)
}

/// WAV files commonly have no tags at all. That is not an error, and the
/// file is left untouched.
pub fn normalize_wav(path: &Path) -> Result<Normalized> {
    let audio: WavFile = open(path)?;
    if !audio.contains_tag() {
        debug!("No RIFF INFO or ID3 chunk in {}, skipping write", path.display());
        return Ok(Normalized::NoTags);
    }
    save(&audio, path)
}
