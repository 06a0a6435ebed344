//! What occupies a map tile
//!
//! A tile resolves to exactly one of these, so consumers match on the
//! variant instead of probing optional fields.

use crate::entities::{TileSpec, WarpMapEntity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileInfo {
    TileSpec(TileSpec),
    Warp(WarpMapEntity),
    /// Player id of the character standing on the tile
    OtherPlayer(u16),
    /// Map index of the NPC standing on the tile
    OtherNpc(u8),
}

/// Actor reported on a tile by the domain layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOccupant {
    Player(u16),
    Npc(u8),
}

impl TileInfo {
    /// Whether the local character may step onto the tile
    pub fn is_walkable(&self) -> bool {
        match self {
            TileInfo::TileSpec(spec) => spec.is_walkable(),
            TileInfo::Warp(warp) => warp.door.0 == 0,
            TileInfo::OtherPlayer(_) | TileInfo::OtherNpc(_) => false,
        }
    }
}

impl From<TileOccupant> for TileInfo {
    fn from(occupant: TileOccupant) -> Self {
        match occupant {
            TileOccupant::Player(id) => TileInfo::OtherPlayer(id),
            TileOccupant::Npc(index) => TileInfo::OtherNpc(index),
        }
    }
}
