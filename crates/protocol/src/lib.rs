//! # EO Protocol Library
//!
//! Byte-level building blocks of the Endless Online client protocol.
//!
//! ## Architecture
//!
//! ### 1. Codecs Layer ([`codecs`])
//! Base-253 number encoding used by every numeric field:
//! - CHAR: 1 byte (max 252)
//! - SHORT: 2 bytes (max 64008)
//! - THREE: 3 bytes (max 16194276)
//! - INT: 4 bytes (max 4097152080)
//!
//! ### 2. Packet Types ([`packets`])
//! Family/action header enumerations and the [`FamilyActionKey`] used for
//! dispatch.
//!
//! ### 3. Frames ([`frame`])
//! [`PacketFrame`]: header plus payload with typed cursor readers/writers.
//!
//! ### 4. Connection Scheme ([`init`], [`sequence`], [`encryption`])
//! The init handshake, the per-frame sequence value and the body
//! scrambling armed by the handshake.
//!
//! ### 5. Messages ([`packet_builder`], [`locker`], [`welcome`])
//! Client command builders and translators for server frames.
//!
//! ## Usage Example
//!
//! ```rust
//! use eoclient_protocol::{PacketFrame, PacketFamily, PacketAction};
//!
//! let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Open);
//! frame.add_byte(10).unwrap();
//! frame.add_byte(12).unwrap();
//!
//! let wire = frame.to_wire().unwrap();
//! assert_eq!(wire.len(), 2 + 2 + 2);
//! ```

pub mod codecs;
pub mod encryption;
pub mod frame;
pub mod init;
pub mod locker;
pub mod packet_builder;
pub mod packets;
pub mod sequence;
pub mod welcome;

// Re-export commonly used items
pub use codecs::*;
pub use encryption::PacketEncoder;
pub use frame::*;
pub use init::{InitData, InitResponse};
pub use locker::*;
pub use packet_builder::*;
pub use packets::*;
pub use sequence::*;
pub use welcome::*;
