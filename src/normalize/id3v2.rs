//! ID3v2 normalization for MP3 files.

use id3::{ErrorKind, Tag, v1v2};
use std::path::Path;
use tracing::debug;

use super::Normalized;
use crate::config::TagVersion;
use crate::error::Result;

/// Rewrite the ID3v2 tag of `path` at the requested version.
///
/// The ID3v2 tag is read first. A file that only carries an ID3v1 tag has
/// its fields carried over into the new ID3v2 tag; the ID3v1 block itself
/// stays in place. A file with neither has never been tagged, so an empty
/// tag is written instead of failing. Any other read error propagates.
pub fn normalize(path: &Path, version: TagVersion) -> Result<Normalized> {
    let tag = match v1v2::read_from_path(path) {
        Ok(tag) => tag,
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => {
            debug!("No ID3 tag in {}, starting from an empty tag", path.display());
            Tag::new()
        }
        Err(e) => return Err(e.into()),
    };

    tag.write_to_path(path, version.id3())?;
    Ok(Normalized::Written)
}
