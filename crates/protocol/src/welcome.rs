//! Character-select reply carrying the server's file metadata

use eoclient_core::{MapId, Result};
use super::{codecs::INT_WIDTH, frame::PacketFrame, packets::InitFileType};

/// Advertised checksum and length of one pub file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PubFileInfo {
    pub checksum: u32,
    pub length: u32,
}

/// Decoded `Welcome_Reply` file section
///
/// ```text
/// {SHORT session id}{INT character id}{SHORT map id}{RAW4 map checksum}{THREE map length}
/// {INT eif checksum}{SHORT eif length} ... enf, esf, ecf
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeFileInfo {
    pub session_id: u16,
    pub character_id: u32,
    pub map_id: MapId,
    /// Encoded map checksum bytes, kept raw like the map file header
    pub map_checksum: [u8; INT_WIDTH],
    pub map_length: u32,
    pub eif: PubFileInfo,
    pub enf: PubFileInfo,
    pub esf: PubFileInfo,
    pub ecf: PubFileInfo,
}

impl WelcomeFileInfo {
    pub fn parse(frame: &mut PacketFrame) -> Result<Self> {
        let session_id = frame.get_short()? as u16;
        let character_id = frame.get_int()?;
        let map_id = MapId::new(frame.get_short()? as u16);

        let mut map_checksum = [0u8; INT_WIDTH];
        map_checksum.copy_from_slice(&frame.get_bytes(INT_WIDTH)?);
        let map_length = frame.get_three()?;

        let mut read_pub = || -> Result<PubFileInfo> {
            Ok(PubFileInfo {
                checksum: frame.get_int()?,
                length: frame.get_short()?,
            })
        };
        let eif = read_pub()?;
        let enf = read_pub()?;
        let esf = read_pub()?;
        let ecf = read_pub()?;

        Ok(Self {
            session_id,
            character_id,
            map_id,
            map_checksum,
            map_length,
            eif,
            enf,
            esf,
            ecf,
        })
    }

    /// Advertised info for a pub file type (`None` for maps)
    pub fn pub_file(&self, file_type: InitFileType) -> Option<PubFileInfo> {
        match file_type {
            InitFileType::Item => Some(self.eif),
            InitFileType::Npc => Some(self.enf),
            InitFileType::Spell => Some(self.esf),
            InitFileType::Class => Some(self.ecf),
            InitFileType::Map => None,
        }
    }
}
