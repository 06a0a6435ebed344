//! # Init Handshake
//!
//! The first exchange on a fresh connection, sent and received as raw
//! (unobfuscated, unsequenced) `Init_Init` frames.
//!
//! ## Client Request
//! ```text
//! {THREE challenge}{BYTE major}{BYTE minor}{BYTE build}{STR hdid}
//! ```
//!
//! ## Server Reply
//! ```text
//! {BYTE reply}                                          reply code
//! Ok:        {BYTE s1}{BYTE s2}{BYTE decode}{BYTE encode}{SHORT player}{THREE response}
//! OutOfDate: {BYTE major}{BYTE minor}{BYTE build}
//! Banned:    {BYTE ban type}{BYTE minutes}
//! ```
//!
//! The server proves it knows the scheme by answering the challenge with
//! [`server_verification_hash`].

use eoclient_core::{ClientVersion, EoError, PlayerId, Result};
use rand::Rng;
use super::{frame::PacketFrame, packets::*};

/// Largest challenge value the hash accepts without going negative
pub const CHALLENGE_MAX: u32 = 11_092_003;

/// Draw a random handshake challenge
pub fn generate_challenge() -> u32 {
    rand::thread_rng().gen_range(1..=CHALLENGE_MAX)
}

/// Expected server response to `challenge`
pub fn server_verification_hash(challenge: u32) -> u32 {
    let c = challenge as i64 + 1;
    let hash = 110_905 + (c % 9 + 1) * ((11_092_004 - c) % ((c % 11 + 1) * 119)) * 119 + c % 2004;
    hash as u32
}

/// Handshake parameters from an `Ok` init reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitData {
    pub seq1: u32,
    pub seq2: u32,
    /// Multiple used to unscramble server frames
    pub decode_multiple: u8,
    /// Multiple used to scramble client frames
    pub encode_multiple: u8,
    pub player_id: PlayerId,
    pub challenge_response: u32,
}

impl InitData {
    /// Check the server's answer to our challenge
    pub fn verify(&self, challenge: u32) -> Result<()> {
        let expected = server_verification_hash(challenge);
        if self.challenge_response != expected {
            return Err(EoError::Handshake(format!(
                "Challenge response mismatch: expected {}, got {}",
                expected, self.challenge_response
            )));
        }
        Ok(())
    }
}

/// Decoded handshake reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitResponse {
    Ok(InitData),
    OutOfDate(ClientVersion),
    Banned { ban_type: u8, minutes: u8 },
}

impl InitResponse {
    /// Parse an `Init_Init` frame received during the handshake
    pub fn parse(frame: &mut PacketFrame) -> Result<Self> {
        if frame.key() != FamilyActionKey::INIT {
            return Err(EoError::Handshake(format!(
                "Unexpected frame during handshake: {}",
                frame.key()
            )));
        }

        let code = frame.get_byte()?;
        match u8::try_from(code).ok().and_then(InitReply::from_u8) {
            Some(InitReply::Ok) => {
                let seq1 = frame.get_byte()?;
                let seq2 = frame.get_byte()?;
                let decode_multiple = narrow(frame.get_byte()?)?;
                let encode_multiple = narrow(frame.get_byte()?)?;
                let player_id = PlayerId::new(frame.get_short()? as u16);
                let challenge_response = frame.get_three()?;
                Ok(InitResponse::Ok(InitData {
                    seq1,
                    seq2,
                    decode_multiple,
                    encode_multiple,
                    player_id,
                    challenge_response,
                }))
            }
            Some(InitReply::OutOfDate) => {
                let major = narrow(frame.get_byte()?)?;
                let minor = narrow(frame.get_byte()?)?;
                let build = narrow(frame.get_byte()?)?;
                Ok(InitResponse::OutOfDate(ClientVersion::new(major, minor, build)))
            }
            Some(InitReply::Banned) => {
                let ban_type = narrow(frame.get_byte()?)?;
                let minutes = narrow(frame.get_byte()?)?;
                Ok(InitResponse::Banned { ban_type, minutes })
            }
            _ => Err(EoError::Handshake(format!("Unexpected init reply code {}", code))),
        }
    }

    /// Accept only `Ok` replies whose challenge response checks out
    pub fn into_init_data(self, challenge: u32) -> Result<InitData> {
        match self {
            InitResponse::Ok(data) => {
                data.verify(challenge)?;
                Ok(data)
            }
            InitResponse::OutOfDate(required) => Err(EoError::Handshake(format!(
                "Client version is out of date (server requires {})",
                required
            ))),
            InitResponse::Banned { ban_type, minutes } => Err(EoError::Handshake(format!(
                "Connection banned (type {}, {} minutes)",
                ban_type, minutes
            ))),
        }
    }
}

// Encoded single bytes decode to at most 252, which always fits
fn narrow(value: u32) -> Result<u8> {
    u8::try_from(value).map_err(|_| EoError::Protocol(format!("Byte field out of range: {}", value)))
}
