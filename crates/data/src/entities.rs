//! # Map Entities
//!
//! Fixed-size structs stored in map files. Every entity declares its
//! encoded size; [`serialize_entity`] and [`deserialize_entity`] check it.
//!
//! | entity      | bytes | layout |
//! |-------------|-------|--------|
//! | NPC spawn   | 8     | x, y, npc id(2), spawn type, spawn time(2), amount |
//! | chest spawn | 12    | x, y, key(2), slot, item id(2), respawn time(2), amount(3) |
//! | tile spec   | 3     | x, y, spec |
//! | warp        | 9     | x, y, dest map(2), dest x, dest y, level required, door(2) |

use bytes::BytesMut;
use eoclient_core::{EoError, MapId, Result};
use eoclient_protocol::codecs::{read_number, write_number, EoSerializable};

/// Encode an entity, checking the produced size
pub fn serialize_entity<E: EoSerializable>(entity: &E) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(E::DATA_SIZE);
    entity.write_eo(&mut buf)?;
    if buf.len() != E::DATA_SIZE {
        return Err(EoError::InvalidRecordLength {
            expected: E::DATA_SIZE,
            actual: buf.len(),
        });
    }
    Ok(buf.to_vec())
}

/// Decode an entity from exactly `E::DATA_SIZE` bytes
pub fn deserialize_entity<E: EoSerializable>(data: &[u8]) -> Result<E> {
    if data.len() != E::DATA_SIZE {
        return Err(EoError::InvalidRecordLength {
            expected: E::DATA_SIZE,
            actual: data.len(),
        });
    }
    E::read_eo(&mut BytesMut::from(data))
}

fn read_u8(buf: &mut BytesMut) -> Result<u8> {
    let value = read_number(buf, 1)?;
    u8::try_from(value).map_err(|_| EoError::InvalidData(format!("Byte field out of range: {}", value)))
}

fn read_u16(buf: &mut BytesMut) -> Result<u16> {
    let value = read_number(buf, 2)?;
    u16::try_from(value).map_err(|_| EoError::InvalidData(format!("Short field out of range: {}", value)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NpcSpawnMapEntity {
    pub x: u8,
    pub y: u8,
    pub npc_id: u16,
    pub spawn_type: u8,
    pub spawn_time: u16,
    pub amount: u8,
}

impl EoSerializable for NpcSpawnMapEntity {
    const DATA_SIZE: usize = 8;

    fn write_eo(&self, buf: &mut BytesMut) -> Result<()> {
        write_number(buf, self.x as u32, 1)?;
        write_number(buf, self.y as u32, 1)?;
        write_number(buf, self.npc_id as u32, 2)?;
        write_number(buf, self.spawn_type as u32, 1)?;
        write_number(buf, self.spawn_time as u32, 2)?;
        write_number(buf, self.amount as u32, 1)
    }

    fn read_eo(buf: &mut BytesMut) -> Result<Self> {
        Ok(Self {
            x: read_u8(buf)?,
            y: read_u8(buf)?,
            npc_id: read_u16(buf)?,
            spawn_type: read_u8(buf)?,
            spawn_time: read_u16(buf)?,
            amount: read_u8(buf)?,
        })
    }
}

/// Key required to open a chest (0 = none)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChestKey(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChestSpawnMapEntity {
    pub x: u8,
    pub y: u8,
    pub key: ChestKey,
    pub slot: u8,
    pub item_id: u16,
    pub respawn_time: u16,
    pub amount: u32,
}

impl EoSerializable for ChestSpawnMapEntity {
    const DATA_SIZE: usize = 12;

    fn write_eo(&self, buf: &mut BytesMut) -> Result<()> {
        write_number(buf, self.x as u32, 1)?;
        write_number(buf, self.y as u32, 1)?;
        write_number(buf, self.key.0 as u32, 2)?;
        write_number(buf, self.slot as u32, 1)?;
        write_number(buf, self.item_id as u32, 2)?;
        write_number(buf, self.respawn_time as u32, 2)?;
        write_number(buf, self.amount, 3)
    }

    fn read_eo(buf: &mut BytesMut) -> Result<Self> {
        Ok(Self {
            x: read_u8(buf)?,
            y: read_u8(buf)?,
            key: ChestKey(read_u16(buf)?),
            slot: read_u8(buf)?,
            item_id: read_u16(buf)?,
            respawn_time: read_u16(buf)?,
            amount: read_number(buf, 3)?,
        })
    }
}

/// Special tile attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSpec {
    Wall,
    ChairDown,
    ChairLeft,
    ChairRight,
    ChairUp,
    ChairDownRight,
    ChairUpLeft,
    ChairAll,
    Chest,
    BankVault,
    NpcBoundary,
    MapEdge,
    FakeWall,
    Board(u8),
    Jukebox,
    Jump,
    Water,
    Arena,
    AmbientSource,
    Spikes,
    SpikesTrap,
    SpikesTimed,
    Other(u8),
}

impl TileSpec {
    pub fn from_u8(value: u8) -> Self {
        use TileSpec::*;
        match value {
            0 => Wall,
            1 => ChairDown,
            2 => ChairLeft,
            3 => ChairRight,
            4 => ChairUp,
            5 => ChairDownRight,
            6 => ChairUpLeft,
            7 => ChairAll,
            9 => Chest,
            16 => BankVault,
            17 => NpcBoundary,
            18 => MapEdge,
            19 => FakeWall,
            20..=27 => Board(value - 19),
            28 => Jukebox,
            29 => Jump,
            30 => Water,
            32 => Arena,
            33 => AmbientSource,
            34 => Spikes,
            35 => SpikesTrap,
            36 => SpikesTimed,
            other => Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        use TileSpec::*;
        match self {
            Wall => 0,
            ChairDown => 1,
            ChairLeft => 2,
            ChairRight => 3,
            ChairUp => 4,
            ChairDownRight => 5,
            ChairUpLeft => 6,
            ChairAll => 7,
            Chest => 9,
            BankVault => 16,
            NpcBoundary => 17,
            MapEdge => 18,
            FakeWall => 19,
            Board(n) => n + 19,
            Jukebox => 28,
            Jump => 29,
            Water => 30,
            Arena => 32,
            AmbientSource => 33,
            Spikes => 34,
            SpikesTrap => 35,
            SpikesTimed => 36,
            Other(n) => n,
        }
    }

    /// Whether a character may stand on this tile
    pub fn is_walkable(self) -> bool {
        !matches!(
            self,
            TileSpec::Wall
                | TileSpec::Chest
                | TileSpec::BankVault
                | TileSpec::MapEdge
                | TileSpec::Board(_)
                | TileSpec::Jukebox
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpecMapEntity {
    pub x: u8,
    pub y: u8,
    pub spec: TileSpec,
}

impl EoSerializable for TileSpecMapEntity {
    const DATA_SIZE: usize = 3;

    fn write_eo(&self, buf: &mut BytesMut) -> Result<()> {
        write_number(buf, self.x as u32, 1)?;
        write_number(buf, self.y as u32, 1)?;
        write_number(buf, self.spec.as_u8() as u32, 1)
    }

    fn read_eo(buf: &mut BytesMut) -> Result<Self> {
        Ok(Self {
            x: read_u8(buf)?,
            y: read_u8(buf)?,
            spec: TileSpec::from_u8(read_u8(buf)?),
        })
    }
}

/// Door attached to a warp (0 = no door, 1 = door, 2+ = locked with key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoorSpec(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpMapEntity {
    pub x: u8,
    pub y: u8,
    pub destination_map: MapId,
    pub destination_x: u8,
    pub destination_y: u8,
    pub level_required: u8,
    pub door: DoorSpec,
}

impl EoSerializable for WarpMapEntity {
    const DATA_SIZE: usize = 9;

    fn write_eo(&self, buf: &mut BytesMut) -> Result<()> {
        write_number(buf, self.x as u32, 1)?;
        write_number(buf, self.y as u32, 1)?;
        write_number(buf, self.destination_map.get() as u32, 2)?;
        write_number(buf, self.destination_x as u32, 1)?;
        write_number(buf, self.destination_y as u32, 1)?;
        write_number(buf, self.level_required as u32, 1)?;
        write_number(buf, self.door.0 as u32, 2)
    }

    fn read_eo(buf: &mut BytesMut) -> Result<Self> {
        Ok(Self {
            x: read_u8(buf)?,
            y: read_u8(buf)?,
            destination_map: MapId::new(read_u16(buf)?),
            destination_x: read_u8(buf)?,
            destination_y: read_u8(buf)?,
            level_required: read_u8(buf)?,
            door: DoorSpec(read_u16(buf)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoclient_protocol::codecs::encode_number;

    fn chest() -> ChestSpawnMapEntity {
        ChestSpawnMapEntity {
            x: 4,
            y: 9,
            key: ChestKey(2),
            slot: 1,
            item_id: 270,
            respawn_time: 300,
            amount: 100_000,
        }
    }

    #[test]
    fn test_chest_layout() {
        let bytes = serialize_entity(&chest()).unwrap();
        let mut expected = vec![5u8, 10];
        expected.extend(encode_number(2, 2).unwrap());
        expected.push(2);
        expected.extend(encode_number(270, 2).unwrap());
        expected.extend(encode_number(300, 2).unwrap());
        expected.extend(encode_number(100_000, 3).unwrap());
        assert_eq!(bytes, expected);
        assert_eq!(deserialize_entity::<ChestSpawnMapEntity>(&bytes).unwrap(), chest());
    }

    #[test]
    fn test_wrong_size_rejected() {
        assert!(matches!(
            deserialize_entity::<ChestSpawnMapEntity>(&[1; 11]),
            Err(EoError::InvalidRecordLength { expected: 12, actual: 11 })
        ));
        assert!(matches!(
            deserialize_entity::<WarpMapEntity>(&[1; 10]),
            Err(EoError::InvalidRecordLength { expected: 9, .. })
        ));
    }

    #[test]
    fn test_oversized_amount_rejected() {
        let mut entity = chest();
        entity.amount = 20_000_000;
        assert!(matches!(
            serialize_entity(&entity),
            Err(EoError::EncodingOverflow { width: 3, .. })
        ));
    }

    #[test]
    fn test_warp_and_spawn_roundtrip() {
        let warp = WarpMapEntity {
            x: 1,
            y: 2,
            destination_map: MapId::new(300),
            destination_x: 10,
            destination_y: 11,
            level_required: 5,
            door: DoorSpec(1),
        };
        let bytes = serialize_entity(&warp).unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(deserialize_entity::<WarpMapEntity>(&bytes).unwrap(), warp);

        let spawn = NpcSpawnMapEntity {
            x: 3,
            y: 3,
            npc_id: 17,
            spawn_type: 7,
            spawn_time: 60,
            amount: 2,
        };
        let bytes = serialize_entity(&spawn).unwrap();
        assert_eq!(deserialize_entity::<NpcSpawnMapEntity>(&bytes).unwrap(), spawn);
    }

    #[test]
    fn test_tile_spec_values() {
        for value in 0..=40u8 {
            assert_eq!(TileSpec::from_u8(value).as_u8(), value);
        }
        assert_eq!(TileSpec::from_u8(21), TileSpec::Board(2));
        assert!(!TileSpec::Wall.is_walkable());
        assert!(TileSpec::Water.is_walkable());
    }
}
