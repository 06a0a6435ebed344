//! # Packet Obfuscation
//!
//! After the init handshake every frame body (family, action, payload) is
//! scrambled in both directions with three invertible steps:
//!
//! ```text
//! outgoing: flip MSB -> interleave   -> swap multiples(encode multiple)
//! incoming: swap multiples(decode multiple) -> de-interleave -> flip MSB
//! ```
//!
//! The multiples are exchanged in the `Init_Init` reply. Raw `Init_Init`
//! frames (file transfers) are never scrambled.

use super::packets::{PacketAction, PacketFamily};

/// Per-connection scrambling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketEncoder {
    decode_multiple: u8,
    encode_multiple: u8,
}

impl PacketEncoder {
    pub fn new(decode_multiple: u8, encode_multiple: u8) -> Self {
        Self {
            decode_multiple,
            encode_multiple,
        }
    }

    pub fn decode_multiple(&self) -> u8 {
        self.decode_multiple
    }

    pub fn encode_multiple(&self) -> u8 {
        self.encode_multiple
    }

    /// Scramble an outgoing body in place
    pub fn encode(&self, body: &mut [u8]) {
        if is_raw_init(body) {
            return;
        }
        flip_msb(body);
        interleave(body);
        swap_multiples(body, self.encode_multiple);
    }

    /// Unscramble an incoming body in place
    pub fn decode(&self, body: &mut [u8]) {
        if is_raw_init(body) {
            return;
        }
        swap_multiples(body, self.decode_multiple);
        deinterleave(body);
        flip_msb(body);
    }

    /// The peer's view: what it encodes we decode and vice versa
    pub fn mirrored(&self) -> Self {
        Self::new(self.encode_multiple, self.decode_multiple)
    }
}

fn is_raw_init(body: &[u8]) -> bool {
    body.len() >= 2
        && body[0] == PacketFamily::Init.as_u8()
        && body[1] == PacketAction::Init.as_u8()
}

/// Toggle the high bit of every byte except 0x00 and 0x80
pub fn flip_msb(data: &mut [u8]) {
    for byte in data.iter_mut() {
        if *byte & 0x7F != 0 {
            *byte ^= 0x80;
        }
    }
}

fn last_odd_index(len: usize) -> usize {
    if len % 2 == 0 {
        len.saturating_sub(1)
    } else {
        len.saturating_sub(2)
    }
}

/// First half to even indices ascending, second half to odd indices descending
pub fn interleave(data: &mut [u8]) {
    let len = data.len();
    let half = len.div_ceil(2);
    let last_odd = last_odd_index(len);
    let mut out = vec![0u8; len];

    for (k, &byte) in data[..half].iter().enumerate() {
        out[2 * k] = byte;
    }
    for (j, &byte) in data[half..].iter().enumerate() {
        out[last_odd - 2 * j] = byte;
    }

    data.copy_from_slice(&out);
}

/// Inverse of [`interleave`]
pub fn deinterleave(data: &mut [u8]) {
    let len = data.len();
    let half = len.div_ceil(2);
    let last_odd = last_odd_index(len);
    let mut out = vec![0u8; len];

    for k in 0..half {
        out[k] = data[2 * k];
    }
    for j in 0..(len - half) {
        out[half + j] = data[last_odd - 2 * j];
    }

    data.copy_from_slice(&out);
}

/// Reverse every run of consecutive bytes divisible by `multiple`
///
/// Applying it twice restores the input.
pub fn swap_multiples(data: &mut [u8], multiple: u8) {
    if multiple == 0 {
        return;
    }

    let mut run_start = None;
    for index in 0..=data.len() {
        let in_run = index < data.len() && data[index] % multiple == 0;
        match (in_run, run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                data[start..index].reverse();
                run_start = None;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_known() {
        let mut data = [0u8, 1, 2, 3, 4, 5];
        interleave(&mut data);
        assert_eq!(data, [0, 5, 1, 4, 2, 3]);

        let mut odd = [0u8, 1, 2, 3, 4];
        interleave(&mut odd);
        assert_eq!(odd, [0, 4, 1, 3, 2]);
    }

    #[test]
    fn test_interleave_inverse() {
        for len in 0..20 {
            let original: Vec<u8> = (0..len as u8).collect();
            let mut data = original.clone();
            interleave(&mut data);
            deinterleave(&mut data);
            assert_eq!(data, original, "len {}", len);
        }
    }

    #[test]
    fn test_swap_multiples() {
        let mut data = [1u8, 6, 12, 18, 5, 3, 9];
        swap_multiples(&mut data, 3);
        assert_eq!(data, [1, 18, 12, 6, 5, 9, 3]);
        swap_multiples(&mut data, 3);
        assert_eq!(data, [1, 6, 12, 18, 5, 3, 9]);
    }

    #[test]
    fn test_flip_msb_keeps_zero_and_128() {
        let mut data = [0u8, 0x80, 0x01, 0xFF];
        flip_msb(&mut data);
        assert_eq!(data, [0, 0x80, 0x81, 0x7F]);
    }

    #[test]
    fn test_encode_decode_between_peers() {
        let client = PacketEncoder::new(6, 9);
        let server = client.mirrored();

        let original = vec![37u8, 13, 4, 5, 18, 27, 200, 0, 128, 9];
        let mut wire = original.clone();
        client.encode(&mut wire);
        assert_ne!(wire, original);
        server.decode(&mut wire);
        assert_eq!(wire, original);

        let mut reply = original.clone();
        server.encode(&mut reply);
        client.decode(&mut reply);
        assert_eq!(reply, original);
    }

    #[test]
    fn test_raw_init_untouched() {
        let encoder = PacketEncoder::new(6, 9);
        let mut body = vec![255u8, 255, 5, 1, 2];
        encoder.encode(&mut body);
        assert_eq!(body, vec![255, 255, 5, 1, 2]);
        encoder.decode(&mut body);
        assert_eq!(body, vec![255, 255, 5, 1, 2]);
    }
}
