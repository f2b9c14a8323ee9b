//! ASF (Windows Media) header normalization.
//!
//! The ASF header object is a list of child objects, each a GUID, a 64-bit
//! size and a payload. Text metadata lives in two of them: the Content
//! Description object (five fixed fields) and the Extended Content
//! Description object (named descriptors). Both store UTF-16LE strings
//! whose byte length includes a terminating NUL, and writers disagree
//! about that terminator. Normalization decodes every string and encodes
//! it again with exactly one NUL. All other objects are copied unchanged.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

use super::Normalized;
use crate::error::{Result, TagFixError};

pub type Guid = [u8; 16];

pub const HEADER_OBJECT: Guid = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
pub const CONTENT_DESCRIPTION: Guid = [
    0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
pub const EXTENDED_CONTENT_DESCRIPTION: Guid = [
    0x40, 0xA4, 0xD0, 0xD2, 0x07, 0xE3, 0xD2, 0x11, 0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50,
];
pub const FILE_PROPERTIES: Guid = [
    0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];

const HEADER_PREFIX_LEN: u64 = 30;
const OBJECT_PREFIX_LEN: usize = 24;
/// Offset of the file size field inside the File Properties payload
const FILE_SIZE_OFFSET: usize = 16;
/// Upper bound on a header we are willing to load
const MAX_HEADER_LEN: u64 = 64 * 1024 * 1024;

const VALUE_TYPE_UNICODE: u16 = 0;
const VALUE_TYPE_MAX: u16 = 5;

fn malformed(message: impl Into<String>) -> TagFixError {
    TagFixError::Asf(message.into())
}

/// Child object of the header, kept as raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderChild {
    pub guid: Guid,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsfHeader {
    reserved: [u8; 2],
    pub children: Vec<HeaderChild>,
}

impl AsfHeader {
    /// Read the header object at the start of `reader`.
    ///
    /// Returns the header and the size it occupies on disk.
    pub fn read_from<R: Read>(reader: &mut R, file_len: u64) -> Result<(Self, u64)> {
        let mut prefix = [0u8; HEADER_PREFIX_LEN as usize];
        reader
            .read_exact(&mut prefix)
            .map_err(|_| malformed("file is shorter than an ASF header"))?;

        if prefix[..16] != HEADER_OBJECT {
            return Err(malformed("missing ASF header object"));
        }

        let size = read_u64(&prefix[16..24]);
        let count = read_u32(&prefix[24..28]);
        if size < HEADER_PREFIX_LEN || size > file_len || size > MAX_HEADER_LEN {
            return Err(malformed(format!("invalid header size {}", size)));
        }

        let mut body = vec![0u8; (size - HEADER_PREFIX_LEN) as usize];
        reader.read_exact(&mut body)?;

        let mut children = Vec::with_capacity((count as usize).min(body.len() / OBJECT_PREFIX_LEN));
        let mut rest = body.as_slice();
        for index in 0..count {
            if rest.len() < OBJECT_PREFIX_LEN {
                return Err(malformed(format!("header object {} is truncated", index)));
            }
            let mut guid = [0u8; 16];
            guid.copy_from_slice(&rest[..16]);
            let object_len = read_u64(&rest[16..24]);
            if object_len < OBJECT_PREFIX_LEN as u64 || object_len > rest.len() as u64 {
                return Err(malformed(format!("header object {} has invalid size {}", index, object_len)));
            }
            let (object, tail) = rest.split_at(object_len as usize);
            children.push(HeaderChild {
                guid,
                payload: object[OBJECT_PREFIX_LEN..].to_vec(),
            });
            rest = tail;
        }

        if !rest.is_empty() {
            return Err(malformed(format!("{} stray bytes after header objects", rest.len())));
        }

        let header = Self {
            reserved: [prefix[28], prefix[29]],
            children,
        };
        Ok((header, size))
    }

    pub fn child(&self, guid: &Guid) -> Option<&HeaderChild> {
        self.children.iter().find(|c| &c.guid == guid)
    }

    fn child_mut(&mut self, guid: &Guid) -> Option<&mut HeaderChild> {
        self.children.iter_mut().find(|c| &c.guid == guid)
    }

    pub fn encoded_len(&self) -> u64 {
        HEADER_PREFIX_LEN
            + self
                .children
                .iter()
                .map(|c| (OBJECT_PREFIX_LEN + c.payload.len()) as u64)
                .sum::<u64>()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len() as usize);
        out.extend_from_slice(&HEADER_OBJECT);
        out.extend_from_slice(&self.encoded_len().to_le_bytes());
        out.extend_from_slice(&(self.children.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.reserved);
        for child in &self.children {
            out.extend_from_slice(&child.guid);
            out.extend_from_slice(&((OBJECT_PREFIX_LEN + child.payload.len()) as u64).to_le_bytes());
            out.extend_from_slice(&child.payload);
        }
        out
    }

    /// Re-encode both description objects in canonical form
    pub fn canonicalize(&mut self) -> Result<()> {
        if let Some(child) = self.child_mut(&CONTENT_DESCRIPTION) {
            child.payload = ContentDescription::parse(&child.payload)?.to_bytes()?;
        }
        if let Some(child) = self.child_mut(&EXTENDED_CONTENT_DESCRIPTION) {
            child.payload = encode_descriptors(&parse_descriptors(&child.payload)?)?;
        }
        Ok(())
    }

    /// Store `file_len` in the File Properties object, if there is one
    pub fn set_file_size(&mut self, file_len: u64) {
        if let Some(child) = self.child_mut(&FILE_PROPERTIES) {
            if child.payload.len() >= FILE_SIZE_OFFSET + 8 {
                child.payload[FILE_SIZE_OFFSET..FILE_SIZE_OFFSET + 8].copy_from_slice(&file_len.to_le_bytes());
            }
        }
    }
}

/// The five fixed fields of the Content Description object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDescription {
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub description: String,
    pub rating: String,
}

impl ContentDescription {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 10 {
            return Err(malformed("content description is truncated"));
        }
        let lengths: Vec<usize> = payload[..10]
            .chunks_exact(2)
            .map(|c| read_u16(c) as usize)
            .collect();

        let mut cursor = &payload[10..];
        let mut fields = Vec::with_capacity(5);
        for len in lengths {
            if len > cursor.len() {
                return Err(malformed("content description field overruns object"));
            }
            let (field, tail) = cursor.split_at(len);
            fields.push(decode_utf16(field)?);
            cursor = tail;
        }

        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Ok(Self {
            title: next(),
            author: next(),
            copyright: next(),
            description: next(),
            rating: next(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let fields = [&self.title, &self.author, &self.copyright, &self.description, &self.rating];
        let encoded = fields
            .iter()
            .map(|f| encode_utf16(f))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Vec::new();
        for field in &encoded {
            out.extend_from_slice(&(field.len() as u16).to_le_bytes());
        }
        for field in &encoded {
            out.extend_from_slice(field);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorValue {
    Text(String),
    /// Any non-string value type, kept byte for byte
    Other { kind: u16, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub value: DescriptorValue,
}

pub fn parse_descriptors(payload: &[u8]) -> Result<Vec<Descriptor>> {
    let mut cursor = Cursor::new(payload);
    let count = cursor.u16()?;
    let mut descriptors = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let name_len = cursor.u16()? as usize;
        let name = decode_utf16(cursor.take(name_len)?)?;
        let kind = cursor.u16()?;
        let value_len = cursor.u16()? as usize;
        let data = cursor.take(value_len)?;

        let value = match kind {
            VALUE_TYPE_UNICODE => DescriptorValue::Text(decode_utf16(data)?),
            k if k <= VALUE_TYPE_MAX => DescriptorValue::Other { kind: k, data: data.to_vec() },
            k => return Err(malformed(format!("unknown descriptor value type {} for {}", k, name))),
        };
        descriptors.push(Descriptor { name, value });
    }

    if !cursor.is_empty() {
        return Err(malformed("stray bytes after extended content descriptors"));
    }
    Ok(descriptors)
}

pub fn encode_descriptors(descriptors: &[Descriptor]) -> Result<Vec<u8>> {
    let count = u16::try_from(descriptors.len())
        .map_err(|_| malformed("too many extended content descriptors"))?;

    let mut out = Vec::new();
    out.extend_from_slice(&count.to_le_bytes());
    for descriptor in descriptors {
        let name = encode_utf16(&descriptor.name)?;
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&name);

        let (kind, data) = match &descriptor.value {
            DescriptorValue::Text(text) => (VALUE_TYPE_UNICODE, encode_utf16(text)?),
            DescriptorValue::Other { kind, data } => (*kind, data.clone()),
        };
        let data_len = u16::try_from(data.len())
            .map_err(|_| malformed(format!("value of {} is too long", descriptor.name)))?;
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&data);
    }
    Ok(out)
}

/// Decode UTF-16LE, dropping any trailing NUL terminators
pub fn decode_utf16(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(malformed("odd byte length in UTF-16 string"));
    }
    let mut units: Vec<u16> = bytes.chunks_exact(2).map(read_u16).collect();
    while units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16(&units).map_err(|_| malformed("invalid UTF-16 string"))
}

/// Encode as UTF-16LE with a single NUL terminator; empty strings stay empty
pub fn encode_utf16(text: &str) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let bytes: Vec<u8> = text
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect();
    if bytes.len() > u16::MAX as usize {
        return Err(malformed("string does not fit a 16-bit length"));
    }
    Ok(bytes)
}

/// Rewrite the ASF header of `path` in canonical form.
///
/// The header is always written back. When its length changes, the file is
/// rebuilt in a temporary file next to it and renamed over the original.
pub fn normalize(path: &Path) -> Result<Normalized> {
    let (mut header, original_len, file_len) = {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let (header, original_len) = AsfHeader::read_from(&mut file, file_len)?;
        (header, original_len, file_len)
    };

    header.canonicalize()?;
    let encoded_len = header.encoded_len();

    if encoded_len == original_len {
        let mut file = OpenOptions::new().write(true).open(path)?;
        file.write_all(&header.to_bytes())?;
        file.flush()?;
        return Ok(Normalized::Written);
    }

    debug!(
        "ASF header of {} changes size {} -> {}, rebuilding file",
        path.display(),
        original_len,
        encoded_len
    );
    header.set_file_size(file_len - original_len + encoded_len);
    rebuild(path, &header.to_bytes(), original_len)?;
    Ok(Normalized::Written)
}

fn rebuild(path: &Path, header: &[u8], original_len: u64) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(header)?;
    {
        let mut source = File::open(path)?;
        source.seek(SeekFrom::Start(original_len))?;
        io::copy(&mut source, &mut temp)?;
    }
    temp.flush()?;
    temp.as_file().set_permissions(permissions)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

struct Cursor<'a> {
    data: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(malformed("extended content description is truncated"));
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn u16(&mut self) -> Result<u16> {
        self.take(2).map(read_u16)
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
