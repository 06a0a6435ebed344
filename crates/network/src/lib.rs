//! # EO Client Networking Layer
//!
//! This crate provides Tokio-based async networking for the EO client.
//!
//! ## Modules
//!
//! - [`config`] - Connection options
//! - [`queue`] - Outbound packet queue drained by the writer task
//! - [`transport`] - Length-prefixed frame codec and TCP dialing
//! - [`handlers`] - Packet handler registry
//! - [`connection`] - Client state machine, handshake, receiver and writer tasks
//! - [`commands`] - Typed command surface on [`Client`]
//! - [`files`] - File transfer handlers feeding the data repositories

pub mod commands;
pub mod config;
pub mod connection;
pub mod files;
pub mod handlers;
pub mod queue;
pub mod transport;

// Re-export commonly used items
pub use config::NetworkConfig;
pub use connection::{Client, ConnectionEvent, ConnectionState};
pub use files::FileTransferHandlers;
pub use handlers::{HandlerFunction, HandlerRegistry};
pub use queue::PacketQueue;
pub use transport::{connect_tcp, FrameCodec, SharedEncoder};
