//! # EO Data Files
//!
//! Binary game data used by the client.
//!
//! ## Features
//! - Fixed-layout record codec with typed property access
//! - NPC, item, spell and class records and their pub file container
//! - Map files with NPC spawn, chest, tile spec and warp entities
//! - Session-owned repositories and the file-freshness check
//!
//! ## Record Format
//!
//! ```text
//! {BYTE name length}{name}{fixed data with 254 padding}
//! ```

pub mod class;
pub mod entities;
pub mod freshness;
pub mod item;
pub mod map;
pub mod npc;
pub mod pub_file;
pub mod record;
pub mod repository;
pub mod spell;
pub mod tile_info;

pub use class::{ClassRecord, ClassType};
pub use entities::*;
pub use freshness::{FileChecksumProvider, MapFileInfo};
pub use item::{ItemRecord, ItemSpecial, ItemSubType, ItemType};
pub use map::{map_file_path, map_id_from_path, MapFile, MapFileProperties};
pub use npc::{NpcRecord, NpcType};
pub use pub_file::{pub_file_path, write_data_file, PubFile};
pub use record::{
    deserialize, deserialize_data, serialize, serialize_data, FromProperty, LayoutEntry, PropertyValue,
    PubRecord, RecordProperty,
};
pub use repository::{DataRepositories, PubFileSlot};
pub use spell::{SpellRecord, SpellTargetRestrict, SpellTargetType, SpellType};
pub use tile_info::{TileInfo, TileOccupant};
