//! # Frame Transport
//!
//! [`FrameCodec`] turns a byte stream into [`PacketFrame`]s and back.
//!
//! # Wire Format
//!
//! ```text
//! {SHORT length}{family}{action}{payload...}
//! ```
//!
//! Once the handshake arms the shared [`PacketEncoder`] every body after the
//! length prefix is scrambled in both directions. Raw `Init_Init` bodies
//! (file transfers) pass through untouched.
//!
//! # Unknown Frames
//!
//! Bodies whose family or action byte this client does not know are
//! logged at debug level and skipped; the stream stays in sync because the
//! length prefix still says where the next frame starts.

use bytes::{Buf, BufMut, BytesMut};
use eoclient_core::{EoError, Result};
use eoclient_protocol::{
    decode_number, write_number, PacketEncoder, PacketFrame, HEADER_SIZE, MAX_FRAME_BODY, SHORT_WIDTH,
};
use parking_lot::RwLock;
use socket2::{SockRef, TcpKeepalive};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::NetworkConfig;

/// Obfuscation parameters shared by the codec halves and the client
///
/// `None` until the handshake completes and again after a disconnect.
pub type SharedEncoder = Arc<RwLock<Option<PacketEncoder>>>;

/// Length-prefixed frame codec with optional obfuscation
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    encoder: SharedEncoder,
}

impl FrameCodec {
    pub fn new(encoder: SharedEncoder) -> Self {
        Self { encoder }
    }

    /// Handle to the obfuscation slot
    pub fn encoder(&self) -> &SharedEncoder {
        &self.encoder
    }
}

impl Decoder for FrameCodec {
    type Item = PacketFrame;
    type Error = EoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<PacketFrame>> {
        loop {
            if src.len() < SHORT_WIDTH {
                return Ok(None);
            }

            let length = decode_number(&src[..SHORT_WIDTH])? as usize;
            if length < HEADER_SIZE {
                return Err(EoError::TruncatedFrame {
                    needed: HEADER_SIZE,
                    available: length,
                });
            }

            let total = SHORT_WIDTH + length;
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }

            src.advance(SHORT_WIDTH);
            let mut body = src.split_to(length);
            if let Some(encoder) = *self.encoder.read() {
                encoder.decode(&mut body);
            }

            match PacketFrame::from_body(&body)? {
                Some(frame) => {
                    tracing::debug!("<- {} ({} byte payload)", frame.key(), frame.length());
                    return Ok(Some(frame));
                }
                None => {
                    tracing::debug!(
                        "Skipping unknown frame (family {}, action {}, {} bytes)",
                        body[0],
                        body[1],
                        body.len()
                    );
                }
            }
        }
    }
}

impl Encoder<PacketFrame> for FrameCodec {
    type Error = EoError;

    fn encode(&mut self, frame: PacketFrame, dst: &mut BytesMut) -> Result<()> {
        let mut body = frame.body();
        if body.len() > MAX_FRAME_BODY {
            return Err(EoError::EncodingOverflow {
                value: body.len() as u64,
                width: SHORT_WIDTH,
            });
        }

        if let Some(encoder) = *self.encoder.read() {
            encoder.encode(&mut body);
        }

        dst.reserve(SHORT_WIDTH + body.len());
        write_number(dst, body.len() as u32, SHORT_WIDTH)?;
        dst.put_slice(&body);
        tracing::debug!("-> {} ({} byte payload)", frame.key(), frame.length());
        Ok(())
    }
}

/// Open the TCP connection described by `config`
///
/// # Errors
/// - `Network` when the connect is refused, fails or exceeds
///   `connect_timeout`
pub async fn connect_tcp(config: &NetworkConfig) -> Result<TcpStream> {
    let address = config.address();
    tracing::info!("Connecting to {}", address);

    let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::error!("Failed to connect to {}: {}", address, e);
            return Err(EoError::Network(format!("Failed to connect to {}: {}", address, e)));
        }
        Err(_) => {
            tracing::error!("Connection to {} timed out", address);
            return Err(EoError::Network(format!(
                "Connection to {} timed out after {:?}",
                address, config.connect_timeout
            )));
        }
    };

    stream.set_nodelay(true)?;
    if let Some(idle) = config.keepalive {
        let keepalive = TcpKeepalive::new().with_time(idle);
        SockRef::from(&stream).set_tcp_keepalive(&keepalive)?;
    }

    tracing::info!("Connected to {}", address);
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoclient_protocol::{encode_number, PacketAction, PacketFamily};

    fn armed() -> FrameCodec {
        FrameCodec::new(Arc::new(RwLock::new(Some(PacketEncoder::new(6, 9)))))
    }

    #[test]
    fn test_plain_roundtrip() {
        let mut codec = FrameCodec::default();
        let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Open);
        frame.add_byte(10).unwrap();
        frame.add_byte(12).unwrap();

        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).unwrap();
        assert_eq!(&wire[..], &frame.to_wire().unwrap()[..]);

        let decoded = codec.decode(&mut wire).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(wire.is_empty());
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut codec = FrameCodec::default();
        let frame = PacketFrame::with_payload(PacketFamily::Locker, PacketAction::Buy, &[5, 6, 7]);
        let wire = frame.to_wire().unwrap();

        let mut buf = BytesMut::from(&wire[..1]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&wire[1..4]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&wire[4..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), frame);
    }

    #[test]
    fn test_short_length_is_truncated() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&encode_number(1, SHORT_WIDTH).unwrap()[..]);
        buf.put_u8(PacketFamily::Locker.as_u8());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(EoError::TruncatedFrame { needed: 2, available: 1 })
        ));
    }

    #[test]
    fn test_unknown_frame_skipped() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_number(3, SHORT_WIDTH).unwrap());
        buf.extend_from_slice(&[200, 200, 1]);
        let known = PacketFrame::with_payload(PacketFamily::Locker, PacketAction::Buy, &[9]);
        buf.extend_from_slice(&known.to_wire().unwrap());

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), known);
    }

    #[test]
    fn test_obfuscated_roundtrip() {
        let mut client = armed();
        let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Add);
        frame.add_byte(1).unwrap();
        frame.add_byte(2).unwrap();
        frame.add_short(300).unwrap();
        frame.add_three(5000).unwrap();

        let mut wire = BytesMut::new();
        client.encode(frame.clone(), &mut wire).unwrap();
        assert_ne!(&wire[..], &frame.to_wire().unwrap()[..]);

        // The server decodes with the opposite multiple
        let mut server = FrameCodec::new(Arc::new(RwLock::new(Some(PacketEncoder::new(6, 9).mirrored()))));
        assert_eq!(server.decode(&mut wire).unwrap().unwrap(), frame);
    }

    #[test]
    fn test_raw_init_not_obfuscated() {
        let mut codec = armed();
        let frame = PacketFrame::with_payload(PacketFamily::Init, PacketAction::Init, &[5, 1, 2, 3]);

        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).unwrap();
        assert_eq!(&wire[..], &frame.to_wire().unwrap()[..]);
        assert_eq!(codec.decode(&mut wire).unwrap().unwrap(), frame);
    }
}
