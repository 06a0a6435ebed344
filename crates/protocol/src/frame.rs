//! # Packet Frame
//!
//! A [`PacketFrame`] is one unit of wire data: a family/action header plus
//! an ordered payload with a read cursor.
//!
//! ## Wire Format
//! ```text
//! {SHORT length}{family}{action}{payload...}
//! ```
//! `length` is NumberCodec-encoded and covers family + action + payload.
//!
//! ## Invariant
//! `read_position <= payload.len()`. Reading past the end is a
//! `TruncatedFrame` error and leaves the cursor where it was.

use bytes::{BufMut, BytesMut};
use eoclient_core::{EoError, Result};
use super::{codecs::*, packets::*};

/// Header size (family + action)
pub const HEADER_SIZE: usize = 2;

/// Largest body (header + payload) the 2-byte length can describe
pub const MAX_FRAME_BODY: usize = (NUMBER_MAX[1] - 1) as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFrame {
    family: PacketFamily,
    action: PacketAction,
    payload: BytesMut,
    read_position: usize,
}

impl PacketFrame {
    /// Create an empty frame
    #[inline]
    pub fn new(family: PacketFamily, action: PacketAction) -> Self {
        Self {
            family,
            action,
            payload: BytesMut::new(),
            read_position: 0,
        }
    }

    /// Create a frame over an existing payload, cursor at 0
    pub fn with_payload(family: PacketFamily, action: PacketAction, payload: &[u8]) -> Self {
        Self {
            family,
            action,
            payload: BytesMut::from(payload),
            read_position: 0,
        }
    }

    /// Parse a frame body (`{family}{action}{payload}`, no length prefix)
    ///
    /// Returns `Ok(None)` for header bytes this client does not know.
    pub fn from_body(body: &[u8]) -> Result<Option<Self>> {
        if body.len() < HEADER_SIZE {
            return Err(EoError::TruncatedFrame {
                needed: HEADER_SIZE,
                available: body.len(),
            });
        }

        let (Some(family), Some(action)) =
            (PacketFamily::from_u8(body[0]), PacketAction::from_u8(body[1]))
        else {
            return Ok(None);
        };

        Ok(Some(Self::with_payload(family, action, &body[HEADER_SIZE..])))
    }

    pub fn family(&self) -> PacketFamily {
        self.family
    }

    pub fn action(&self) -> PacketAction {
        self.action
    }

    /// Dispatch key for this frame
    pub fn key(&self) -> FamilyActionKey {
        FamilyActionKey::new(self.family, self.action)
    }

    /// Payload bytes (header excluded)
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn read_position(&self) -> usize {
        self.read_position
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.read_position
    }

    pub fn has_more_data(&self) -> bool {
        self.read_position < self.payload.len()
    }

    /// Move the cursor back to the start of the payload
    pub fn rewind(&mut self) {
        self.read_position = 0;
    }

    /// Body bytes as sent after the length prefix
    pub fn body(&self) -> BytesMut {
        let mut body = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        body.put_u8(self.family.as_u8());
        body.put_u8(self.action.as_u8());
        body.put_slice(&self.payload);
        body
    }

    /// Full wire form including the 2-byte length prefix
    pub fn to_wire(&self) -> Result<BytesMut> {
        let body = self.body();
        let mut out = BytesMut::with_capacity(SHORT_WIDTH + body.len());
        write_number(&mut out, body.len() as u32, SHORT_WIDTH)?;
        out.put_slice(&body);
        Ok(out)
    }

    /// Insert the sequence value in front of the payload
    ///
    /// Values below 253 take one byte, larger ones a short.
    pub fn prepend_sequence(&mut self, sequence: u32) -> Result<()> {
        let width = if (sequence as u64) < NUMBER_MAX[0] {
            CHAR_WIDTH
        } else {
            SHORT_WIDTH
        };
        let mut payload = BytesMut::with_capacity(width + self.payload.len());
        write_number(&mut payload, sequence, width)?;
        payload.put_slice(&self.payload);
        self.payload = payload;
        Ok(())
    }

    //=== Writers ===//

    /// Append an unencoded byte
    pub fn add_raw_byte(&mut self, value: u8) {
        self.payload.put_u8(value);
    }

    /// Append a 1-byte encoded number
    pub fn add_byte(&mut self, value: u32) -> Result<()> {
        write_number(&mut self.payload, value, CHAR_WIDTH)
    }

    /// Append a 2-byte encoded number
    pub fn add_short(&mut self, value: u32) -> Result<()> {
        write_number(&mut self.payload, value, SHORT_WIDTH)
    }

    /// Append a 3-byte encoded number
    pub fn add_three(&mut self, value: u32) -> Result<()> {
        write_number(&mut self.payload, value, THREE_WIDTH)
    }

    /// Append a 4-byte encoded number
    pub fn add_int(&mut self, value: u32) -> Result<()> {
        write_number(&mut self.payload, value, INT_WIDTH)
    }

    /// Append raw bytes
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.payload.put_slice(bytes);
    }

    /// Append a string's raw bytes
    pub fn add_string(&mut self, value: &str) {
        self.payload.put_slice(value.as_bytes());
    }

    /// Append a 1-byte encoded length followed by the raw string
    pub fn add_prefixed_string(&mut self, value: &str) -> Result<()> {
        write_prefixed_string(&mut self.payload, value)
    }

    /// Append a raw string terminated by the break byte (255)
    pub fn add_break_string(&mut self, value: &str) {
        self.payload.put_slice(value.as_bytes());
        self.payload.put_u8(BREAK_BYTE);
    }

    //=== Readers ===//

    fn take(&mut self, count: usize) -> Result<&[u8]> {
        if self.remaining() < count {
            return Err(EoError::TruncatedFrame {
                needed: count,
                available: self.remaining(),
            });
        }
        let start = self.read_position;
        self.read_position += count;
        Ok(&self.payload[start..start + count])
    }

    fn get_number(&mut self, width: usize) -> Result<u32> {
        let bytes = self.take(width)?;
        decode_number(bytes)
    }

    /// Next byte without advancing
    pub fn peek_byte(&self) -> Result<u8> {
        self.payload
            .get(self.read_position)
            .copied()
            .ok_or(EoError::TruncatedFrame { needed: 1, available: 0 })
    }

    /// Advance the cursor by `count` bytes
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    pub fn get_raw_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_byte(&mut self) -> Result<u32> {
        self.get_number(CHAR_WIDTH)
    }

    pub fn get_short(&mut self) -> Result<u32> {
        self.get_number(SHORT_WIDTH)
    }

    pub fn get_three(&mut self) -> Result<u32> {
        self.get_number(THREE_WIDTH)
    }

    pub fn get_int(&mut self) -> Result<u32> {
        self.get_number(INT_WIDTH)
    }

    pub fn get_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    /// Read `len` raw bytes as a string
    pub fn get_string(&mut self, len: usize) -> Result<String> {
        Ok(bytes_to_string(self.take(len)?))
    }

    /// Read a 1-byte encoded length and that many raw bytes
    ///
    /// The cursor is restored if the string body is truncated.
    pub fn get_prefixed_string(&mut self) -> Result<String> {
        let start = self.read_position;
        let len = self.get_byte()? as usize;
        self.get_string(len).inspect_err(|_| self.read_position = start)
    }

    /// Read up to the next break byte (consumed, not returned)
    ///
    /// A missing terminator reads to the end of the payload.
    pub fn get_break_string(&mut self) -> Result<String> {
        let rest = &self.payload[self.read_position..];
        let (len, consumed) = match rest.iter().position(|&b| b == BREAK_BYTE) {
            Some(pos) => (pos, pos + 1),
            None => (rest.len(), rest.len()),
        };
        let value = bytes_to_string(&rest[..len]);
        self.read_position += consumed;
        Ok(value)
    }

    /// Read the rest of the payload as a string
    pub fn get_end_string(&mut self) -> Result<String> {
        let len = self.remaining();
        self.get_string(len)
    }
}
