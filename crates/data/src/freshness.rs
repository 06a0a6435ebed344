//! # File Freshness
//!
//! Decides whether a pub file or map must be requested from the server by
//! comparing what the server advertised with what is cached locally.
//! Missing data on either side means the file is needed; nothing here
//! returns an error.

use dashmap::DashMap;
use eoclient_core::MapId;
use eoclient_protocol::codecs::{decode_number, INT_WIDTH};
use eoclient_protocol::{InitFileType, PubFileInfo, WelcomeFileInfo};
use crate::repository::DataRepositories;

/// Advertised metadata of one map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapFileInfo {
    /// Encoded checksum bytes
    pub checksum: [u8; INT_WIDTH],
    pub length: u32,
}

/// Server-advertised checksums and lengths
#[derive(Debug, Default)]
pub struct FileChecksumProvider {
    maps: DashMap<MapId, MapFileInfo>,
    pub_files: DashMap<InitFileType, PubFileInfo>,
}

impl FileChecksumProvider {
    pub fn set_map(&self, id: MapId, info: MapFileInfo) {
        self.maps.insert(id, info);
    }

    pub fn map(&self, id: MapId) -> Option<MapFileInfo> {
        self.maps.get(&id).map(|entry| *entry)
    }

    pub fn set_pub_file(&self, file_type: InitFileType, info: PubFileInfo) {
        self.pub_files.insert(file_type, info);
    }

    pub fn pub_file(&self, file_type: InitFileType) -> Option<PubFileInfo> {
        self.pub_files.get(&file_type).map(|entry| *entry)
    }

    /// Record everything a `Welcome_Reply` advertises
    pub fn record_welcome(&self, welcome: &WelcomeFileInfo) {
        self.set_map(
            welcome.map_id,
            MapFileInfo {
                checksum: welcome.map_checksum,
                length: welcome.map_length,
            },
        );
        for file_type in [InitFileType::Item, InitFileType::Npc, InitFileType::Spell, InitFileType::Class] {
            if let Some(info) = welcome.pub_file(file_type) {
                self.set_pub_file(file_type, info);
            }
        }
    }

    pub fn clear(&self) {
        self.maps.clear();
        self.pub_files.clear();
    }
}

impl DataRepositories {
    /// Whether `file_type` (and for maps, `map_id`) must be fetched
    pub fn needs_file(&self, file_type: InitFileType, map_id: Option<MapId>) -> bool {
        let needed = match file_type {
            InitFileType::Map => map_id.map_or(true, |id| self.needs_map(id)),
            other => self.needs_pub_file(other),
        };
        tracing::debug!("needs_file({:?}, {:?}) = {}", file_type, map_id, needed);
        needed
    }

    fn needs_map(&self, id: MapId) -> bool {
        let (Some(expected), Some(cached)) = (self.checksums().map(id), self.map(id)) else {
            return true;
        };

        let (Ok(expected_checksum), Ok(actual_checksum)) = (
            decode_number(&expected.checksum),
            cached.properties.decoded_checksum(),
        ) else {
            return true;
        };

        expected_checksum != actual_checksum || expected.length as usize != cached.properties.file_size
    }

    fn needs_pub_file(&self, file_type: InitFileType) -> bool {
        let (Some(expected), Some((checksum, length))) =
            (self.checksums().pub_file(file_type), self.pub_file_metadata(file_type))
        else {
            return true;
        };

        expected.checksum != checksum || expected.length as usize != length
    }
}
