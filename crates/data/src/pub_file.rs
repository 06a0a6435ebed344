//! # Pub Files
//!
//! Container for one kind of record (`dat001.eif`, `.enf`, `.esf`, `.ecf`).
//!
//! ## File Format
//! ```text
//! {RAW3 magic}{INT checksum}{SHORT record count}{BYTE version}{record}*
//! ```
//! Record ids are 1-based positions in the file.

use std::path::{Path, PathBuf};
use bytes::{Buf, BytesMut};
use eoclient_core::{EoError, Result};
use eoclient_protocol::codecs::{read_number, write_number, CHAR_WIDTH, INT_WIDTH, SHORT_WIDTH};
use eoclient_protocol::InitFileType;
use crate::record::{deserialize, encoded_len, serialize, PubRecord};

/// Magic + checksum + count + version
pub const PUB_HEADER_SIZE: usize = 3 + INT_WIDTH + SHORT_WIDTH + CHAR_WIDTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubFile<R> {
    checksum: u32,
    version: u8,
    records: Vec<R>,
}

impl<R: PubRecord> PubFile<R> {
    /// Build a file from records, renumbering them from 1
    pub fn new(checksum: u32, records: Vec<R>) -> Self {
        let mut file = Self {
            checksum,
            version: 0,
            records,
        };
        file.renumber();
        file
    }

    fn renumber(&mut self) {
        for (index, record) in self.records.iter_mut().enumerate() {
            record.set_id(index as u32 + 1);
        }
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Record count, the "length" the server advertises
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record by 1-based id
    pub fn record(&self, id: u32) -> Option<&R> {
        id.checked_sub(1).and_then(|index| self.records.get(index as usize))
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Parse a complete file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PUB_HEADER_SIZE {
            return Err(EoError::InvalidData(format!(
                "Pub file too short: {} byte(s)",
                bytes.len()
            )));
        }
        if bytes[..3] != R::FILE_MAGIC {
            return Err(EoError::InvalidData(format!(
                "Bad pub file magic {:?}, expected {}",
                &bytes[..3],
                String::from_utf8_lossy(&R::FILE_MAGIC)
            )));
        }

        let mut buf = &bytes[3..];
        let checksum = read_number(&mut buf, INT_WIDTH)?;
        let count = read_number(&mut buf, SHORT_WIDTH)? as usize;
        let version = buf.get_u8();

        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let size = encoded_len::<R>(buf)?;
            let mut record: R = deserialize(&buf[..size])?;
            record.set_id(index as u32 + 1);
            records.push(record);
            buf.advance(size);
        }

        if buf.has_remaining() {
            tracing::warn!(
                "Ignoring {} trailing byte(s) in {} file",
                buf.remaining(),
                String::from_utf8_lossy(&R::FILE_MAGIC)
            );
        }

        Ok(Self {
            checksum,
            version,
            records,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(PUB_HEADER_SIZE + self.records.len() * (R::DATA_SIZE + 8));
        buf.extend_from_slice(&R::FILE_MAGIC);
        write_number(&mut buf, self.checksum, INT_WIDTH)?;
        write_number(&mut buf, self.records.len() as u32, SHORT_WIDTH)?;
        buf.extend_from_slice(&[self.version]);

        for record in &self.records {
            buf.extend_from_slice(&serialize(record)?);
        }
        Ok(buf.to_vec())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file = Self::from_bytes(&bytes)?;
        tracing::debug!("Loaded {} record(s) from {}", file.len(), path.display());
        Ok(file)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_data_file(path, &self.to_bytes()?)?;
        tracing::debug!("Saved {} record(s) to {}", self.len(), path.display());
        Ok(())
    }
}

/// Write `bytes` to `path`, creating parent directories
///
/// Received files go through here unchanged so the cached copy has exactly
/// the length the server advertises.
pub fn write_data_file(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Default location of a pub file under the data directory
pub fn pub_file_path(data_dir: impl AsRef<Path>, file_type: InitFileType) -> Option<PathBuf> {
    let name = match file_type {
        InitFileType::Item => "dat001.eif",
        InitFileType::Npc => "dtn001.enf",
        InitFileType::Spell => "dsl001.esf",
        InitFileType::Class => "dat001.ecf",
        InitFileType::Map => return None,
    };
    Some(data_dir.as_ref().join("pub").join(name))
}
