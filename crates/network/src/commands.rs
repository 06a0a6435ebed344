//! # Client Commands
//!
//! Typed wrappers that build a frame and queue it on the [`Client`].
//! All of them fail with `NotInitialized` before the handshake completes.

use eoclient_core::{MapId, Result};
use eoclient_protocol::{
    build_file_request, build_locker_add, build_locker_buy, build_locker_open, build_locker_take, build_ping_reply,
    InitFileType,
};

use crate::connection::Client;

impl Client {
    /// Open the locker at (`x`, `y`)
    pub fn open_locker(&self, x: u8, y: u8) -> Result<()> {
        self.send(build_locker_open(x, y)?)
    }

    /// Deposit `amount` of `item_id` into the locker at (`x`, `y`)
    pub fn deposit_item(&self, x: u8, y: u8, item_id: u16, amount: u32) -> Result<()> {
        self.send(build_locker_add(x, y, item_id, amount)?)
    }

    /// Withdraw all of `item_id` from the locker at (`x`, `y`)
    pub fn withdraw_item(&self, x: u8, y: u8, item_id: u16) -> Result<()> {
        self.send(build_locker_take(x, y, item_id)?)
    }

    /// Buy one locker size upgrade
    pub fn buy_locker_upgrade(&self) -> Result<()> {
        self.send(build_locker_buy())
    }

    /// Answer a keep-alive out of band
    ///
    /// The receiver already replies to every `Connection_Player`; this is
    /// for callers that need to poke the server themselves.
    pub fn send_ping(&self) -> Result<()> {
        self.send(build_ping_reply())
    }

    /// Ask the server for a data file (`Welcome_Agree`)
    ///
    /// `map_id` is only sent for [`InitFileType::Map`].
    pub fn request_file(&self, file_type: InitFileType, session_id: u16, map_id: Option<MapId>) -> Result<()> {
        tracing::info!("Requesting {:?} file (map {:?})", file_type, map_id);
        self.send(build_file_request(file_type, session_id, map_id)?)
    }
}
