//! # Map Files
//!
//! Binary map files (`maps/NNNNN.emf`) hold the map header and the entity
//! lists this core works with.
//!
//! ## File Format
//! ```text
//! {RAW3 "EMF"}{RAW4 checksum}{STR name}{BYTE width}{BYTE height}
//! {BYTE count}{npc spawn}*
//! {BYTE count}{chest spawn}*
//! {BYTE count}{tile spec}*
//! {BYTE count}{warp}*
//! ```
//! The checksum is kept as raw encoded bytes; the server advertises it the
//! same way.

use std::path::{Path, PathBuf};
use bytes::{Buf, BytesMut};
use eoclient_core::{EoError, MapId, Result};
use eoclient_protocol::codecs::{
    decode_number, read_number, read_prefixed_string, write_number, write_prefixed_string,
    EoSerializable, CHAR_WIDTH, INT_WIDTH,
};
use crate::entities::*;
use crate::pub_file::write_data_file;
use crate::tile_info::{TileInfo, TileOccupant};

pub const MAP_MAGIC: [u8; 3] = *b"EMF";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapFileProperties {
    /// Encoded checksum bytes
    pub checksum: [u8; INT_WIDTH],
    /// Size of the file this map was loaded from
    pub file_size: usize,
    pub name: String,
    pub width: u8,
    pub height: u8,
}

impl MapFileProperties {
    pub fn decoded_checksum(&self) -> Result<u32> {
        decode_number(&self.checksum)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFile {
    pub id: MapId,
    pub properties: MapFileProperties,
    pub npc_spawns: Vec<NpcSpawnMapEntity>,
    pub chests: Vec<ChestSpawnMapEntity>,
    pub tile_specs: Vec<TileSpecMapEntity>,
    pub warps: Vec<WarpMapEntity>,
}

impl MapFile {
    pub fn new(id: MapId, properties: MapFileProperties) -> Self {
        Self {
            id,
            properties,
            npc_spawns: Vec::new(),
            chests: Vec::new(),
            tile_specs: Vec::new(),
            warps: Vec::new(),
        }
    }

    pub fn from_bytes(id: MapId, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MAP_MAGIC.len() + INT_WIDTH || bytes[..3] != MAP_MAGIC {
            return Err(EoError::InvalidData(format!("Map {} is not an EMF file", id)));
        }

        let mut buf = BytesMut::from(&bytes[3..]);
        let mut checksum = [0u8; INT_WIDTH];
        buf.copy_to_slice(&mut checksum);

        let name = read_prefixed_string(&mut buf)?;
        let width = read_byte(&mut buf)?;
        let height = read_byte(&mut buf)?;

        let properties = MapFileProperties {
            checksum,
            file_size: bytes.len(),
            name,
            width,
            height,
        };

        let map = Self {
            id,
            properties,
            npc_spawns: read_list(&mut buf)?,
            chests: read_list(&mut buf)?,
            tile_specs: read_list(&mut buf)?,
            warps: read_list(&mut buf)?,
        };

        if buf.has_remaining() {
            tracing::warn!("Ignoring {} trailing byte(s) in map {}", buf.remaining(), id);
        }
        Ok(map)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&MAP_MAGIC);
        buf.extend_from_slice(&self.properties.checksum);
        write_prefixed_string(&mut buf, &self.properties.name)?;
        write_number(&mut buf, self.properties.width as u32, CHAR_WIDTH)?;
        write_number(&mut buf, self.properties.height as u32, CHAR_WIDTH)?;

        write_list(&mut buf, &self.npc_spawns)?;
        write_list(&mut buf, &self.chests)?;
        write_list(&mut buf, &self.tile_specs)?;
        write_list(&mut buf, &self.warps)?;
        Ok(buf.to_vec())
    }

    /// Load a map, taking its id from the file name
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let id = map_id_from_path(path)?;
        let bytes = std::fs::read(path)?;
        let map = Self::from_bytes(id, &bytes)?;
        tracing::debug!("Loaded map {} ({}) from {}", id, map.properties.name, path.display());
        Ok(map)
    }

    /// Write the map under `data_dir/maps/` and record the written size
    pub fn save(&mut self, data_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let bytes = self.to_bytes()?;
        let path = Self::save_raw(data_dir, self.id, &bytes)?;
        self.properties.file_size = bytes.len();
        Ok(path)
    }

    /// Write map file bytes exactly as received from the server
    pub fn save_raw(data_dir: impl AsRef<Path>, id: MapId, bytes: &[u8]) -> Result<PathBuf> {
        let path = map_file_path(data_dir, id);
        write_data_file(&path, bytes)?;
        Ok(path)
    }

    /// Resolve what is on a tile
    ///
    /// An actor reported by the caller wins over static map data; `None`
    /// means an ordinary tile.
    pub fn tile_info(&self, x: u8, y: u8, occupant: Option<TileOccupant>) -> Option<TileInfo> {
        if let Some(occupant) = occupant {
            return Some(occupant.into());
        }
        if let Some(warp) = self.warps.iter().find(|w| w.x == x && w.y == y) {
            return Some(TileInfo::Warp(*warp));
        }
        self.tile_specs
            .iter()
            .find(|t| t.x == x && t.y == y)
            .map(|t| TileInfo::TileSpec(t.spec))
    }
}

fn read_byte(buf: &mut BytesMut) -> Result<u8> {
    let value = read_number(buf, CHAR_WIDTH)?;
    u8::try_from(value).map_err(|_| EoError::InvalidData(format!("Byte field out of range: {}", value)))
}

fn read_list<E: EoSerializable>(buf: &mut BytesMut) -> Result<Vec<E>> {
    let count = read_number(buf, CHAR_WIDTH)? as usize;
    let mut entities = Vec::with_capacity(count);
    for _ in 0..count {
        if buf.remaining() < E::DATA_SIZE {
            return Err(EoError::InvalidRecordLength {
                expected: E::DATA_SIZE,
                actual: buf.remaining(),
            });
        }
        let chunk = buf.split_to(E::DATA_SIZE);
        entities.push(deserialize_entity(&chunk)?);
    }
    Ok(entities)
}

fn write_list<E: EoSerializable>(buf: &mut BytesMut, entities: &[E]) -> Result<()> {
    write_number(buf, entities.len() as u32, CHAR_WIDTH)?;
    for entity in entities {
        buf.extend_from_slice(&serialize_entity(entity)?);
    }
    Ok(())
}

/// Map id from a path like `maps/00005.emf`
pub fn map_id_from_path(path: impl AsRef<Path>) -> Result<MapId> {
    let path = path.as_ref();
    let invalid = || EoError::InvalidData(format!("Not a map file path: {}", path.display()));

    let text = path.to_string_lossy();
    let file_name = text.rsplit(['/', '\\']).next().ok_or_else(invalid)?;
    let digits = file_name.get(..5).ok_or_else(invalid)?;
    digits.parse::<u16>().map(MapId::new).map_err(|_| invalid())
}

/// Location of a map file under the data directory
pub fn map_file_path(data_dir: impl AsRef<Path>, id: MapId) -> PathBuf {
    data_dir.as_ref().join("maps").join(format!("{}.emf", id))
}
