//! # Packet Sequence
//!
//! Every frame the client sends after the init handshake carries a sequence
//! value computed from two server-supplied seeds and a counter that cycles
//! through 0..10. The server computes the same values and drops the client
//! on a mismatch, which makes replaying or injecting raw packets harder.
//! This is obfuscation, not security.
//!
//! Seeds arrive twice:
//! - in the `Init_Init` reply: `start = s1 * 7 - 11 + s2 - 2`
//! - in `Connection_Player` keep-alives: `start = s1 - s2`

use eoclient_core::{EoError, Result};
use parking_lot::Mutex;

/// Counter cycle length
pub const SEQUENCE_CYCLE: u32 = 10;

/// Seeded sequence generator for one direction of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceState {
    start: u32,
    counter: u32,
}

impl SequenceState {
    /// Create a state with an explicit start value
    pub const fn new(start: u32) -> Self {
        Self { start, counter: 0 }
    }

    /// Seed from the `Init_Init` reply bytes
    pub fn from_init(s1: u32, s2: u32) -> Result<Self> {
        let start = (s1 as i64) * 7 - 11 + (s2 as i64) - 2;
        Self::checked(start, s1, s2)
    }

    /// Seed from a `Connection_Player` keep-alive
    pub fn from_ping(s1: u32, s2: u32) -> Result<Self> {
        let start = s1 as i64 - s2 as i64;
        Self::checked(start, s1, s2)
    }

    fn checked(start: i64, s1: u32, s2: u32) -> Result<Self> {
        u32::try_from(start)
            .map(Self::new)
            .map_err(|_| EoError::Handshake(format!("Invalid sequence seeds ({}, {})", s1, s2)))
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance the counter and return the next sequence value
    pub fn next_value(&mut self) -> u32 {
        self.counter = (self.counter + 1) % SEQUENCE_CYCLE;
        self.start + self.counter
    }

    /// Value the next call to [`next_value`](Self::next_value) will return
    pub fn peek(&self) -> u32 {
        self.start + (self.counter + 1) % SEQUENCE_CYCLE
    }
}

/// Sequence bookkeeping for one connection
///
/// Holds independent states for outgoing frames (advanced by the writer
/// task) and for incoming keep-alives (advanced by the receiver loop).
/// Both are `None` until the handshake completes and after `reset`.
#[derive(Debug, Default)]
pub struct SequenceService {
    outgoing: Mutex<Option<SequenceState>>,
    incoming: Mutex<Option<SequenceState>>,
}

impl SequenceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed both directions from the init handshake
    pub fn initialize(&self, s1: u32, s2: u32) -> Result<()> {
        let state = SequenceState::from_init(s1, s2)?;
        *self.outgoing.lock() = Some(state);
        *self.incoming.lock() = Some(state);
        tracing::debug!("Sequence initialized: start={}", state.start());
        Ok(())
    }

    /// Re-seed both directions from a keep-alive
    pub fn reseed(&self, s1: u32, s2: u32) -> Result<()> {
        let state = SequenceState::from_ping(s1, s2)?;
        *self.outgoing.lock() = Some(state);
        *self.incoming.lock() = Some(state);
        tracing::debug!("Sequence re-seeded: start={}", state.start());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.outgoing.lock().is_some()
    }

    /// Next outgoing sequence value, `None` before initialization
    pub fn compute_sequence(&self) -> Option<u32> {
        self.outgoing.lock().as_mut().map(SequenceState::next_value)
    }

    /// Check a received sequence value, advancing the incoming state once
    ///
    /// Returns `false` on mismatch or when not initialized.
    pub fn validate_sequence(&self, received: u32) -> bool {
        self.check_sequence(received).is_ok()
    }

    /// Like [`validate_sequence`](Self::validate_sequence) but reports the expected value
    pub fn check_sequence(&self, received: u32) -> Result<()> {
        let mut incoming = self.incoming.lock();
        let state = incoming.as_mut().ok_or(EoError::NotInitialized)?;
        let expected = state.next_value();
        if expected == received {
            Ok(())
        } else {
            Err(EoError::SequenceDesync { expected, received })
        }
    }

    /// Discard all state (disconnect)
    pub fn reset(&self) {
        *self.outgoing.lock() = None;
        *self.incoming.lock() = None;
    }
}
