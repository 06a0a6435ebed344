//! # Packet Builder
//!
//! Builder functions for client-to-server frames. Each builder returns a
//! ready [`PacketFrame`]; sequencing and obfuscation are applied later by
//! the connection's writer.
//!
//! ## Usage
//!
//! ```rust
//! use eoclient_protocol::packet_builder::*;
//!
//! let frame = build_locker_open(10, 12).unwrap();
//! assert_eq!(frame.payload().len(), 2);
//! ```

use eoclient_core::{ClientVersion, MapId, Result};
use super::{frame::PacketFrame, init::InitData, packets::*};

/// Build the handshake request (`Init_Init`)
///
/// # Packet Format
/// ```text
/// {THREE challenge}{BYTE major}{BYTE minor}{BYTE build}{STR hdid}
/// ```
///
/// # Arguments
/// * `challenge` - Random value the server must answer (see [`crate::init`])
/// * `version` - Client version the server checks against its minimum
/// * `hdid` - Hardware id string, sent length-prefixed
pub fn build_init_request(challenge: u32, version: ClientVersion, hdid: &str) -> Result<PacketFrame> {
    let mut frame = PacketFrame::new(PacketFamily::Init, PacketAction::Init);
    frame.add_three(challenge)?;
    frame.add_byte(version.major as u32)?;
    frame.add_byte(version.minor as u32)?;
    frame.add_byte(version.build as u32)?;
    frame.add_prefixed_string(hdid)?;
    Ok(frame)
}

/// Build the handshake confirmation (`Connection_Accept`)
///
/// # Packet Format
/// ```text
/// {SHORT decode multiple}{SHORT encode multiple}{SHORT player id}
/// ```
pub fn build_connection_accept(init: &InitData) -> Result<PacketFrame> {
    let mut frame = PacketFrame::new(PacketFamily::Connection, PacketAction::Accept);
    frame.add_short(init.decode_multiple as u32)?;
    frame.add_short(init.encode_multiple as u32)?;
    frame.add_short(init.player_id.get() as u32)?;
    Ok(frame)
}

/// Build the keep-alive answer (`Connection_Ping`)
///
/// # Packet Format
/// ```text
/// {STR "k"}
/// ```
pub fn build_ping_reply() -> PacketFrame {
    let mut frame = PacketFrame::new(PacketFamily::Connection, PacketAction::Ping);
    frame.add_string("k");
    frame
}

/// Build a data file request (`Welcome_Agree`)
///
/// # Packet Format
/// ```text
/// {BYTE file type}{SHORT session id}[{SHORT map id}]
/// ```
/// The map id is only sent for map requests.
pub fn build_file_request(file_type: InitFileType, session_id: u16, map_id: Option<MapId>) -> Result<PacketFrame> {
    let mut frame = PacketFrame::new(PacketFamily::Welcome, PacketAction::Agree);
    frame.add_byte(file_type.as_u8() as u32)?;
    frame.add_short(session_id as u32)?;
    if file_type == InitFileType::Map {
        frame.add_short(map_id.map(|id| id.get()).unwrap_or_default() as u32)?;
    }
    Ok(frame)
}

/// Open a locker (`Locker_Open`)
///
/// # Packet Format
/// ```text
/// {BYTE x}{BYTE y}
/// ```
pub fn build_locker_open(x: u8, y: u8) -> Result<PacketFrame> {
    let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Open);
    frame.add_byte(x as u32)?;
    frame.add_byte(y as u32)?;
    Ok(frame)
}

/// Deposit an item in the locker (`Locker_Add`)
///
/// # Packet Format
/// ```text
/// {BYTE x}{BYTE y}{SHORT item id}{THREE amount}
/// ```
pub fn build_locker_add(x: u8, y: u8, item_id: u16, amount: u32) -> Result<PacketFrame> {
    let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Add);
    frame.add_byte(x as u32)?;
    frame.add_byte(y as u32)?;
    frame.add_short(item_id as u32)?;
    frame.add_three(amount)?;
    Ok(frame)
}

/// Withdraw an item from the locker (`Locker_Take`)
///
/// # Packet Format
/// ```text
/// {BYTE x}{BYTE y}{SHORT item id}
/// ```
pub fn build_locker_take(x: u8, y: u8, item_id: u16) -> Result<PacketFrame> {
    let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Take);
    frame.add_byte(x as u32)?;
    frame.add_byte(y as u32)?;
    frame.add_short(item_id as u32)?;
    Ok(frame)
}

/// Buy a locker size upgrade (`Locker_Buy`, empty payload)
pub fn build_locker_buy() -> PacketFrame {
    PacketFrame::new(PacketFamily::Locker, PacketAction::Buy)
}
