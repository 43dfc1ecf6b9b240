// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Byte-level encoding of frames and inbound messages.
//!
//! Everything on the wire is little-endian `f32`. Outbound frames have a
//! fixed size; inbound messages are length-prefixed by the transport and
//! decoded here once the body has been read.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use wrx_core::{SpectrumFrame, FRAME_LEN};

use crate::ProtocolError;

/// Encoded size of one [`SpectrumFrame`].
pub const FRAME_BYTES: usize = FRAME_LEN * 4;

/// Largest inbound message body accepted from a client.
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024;

pub fn encode_frame(frame: &SpectrumFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_BYTES);
    for &value in frame.as_slice() {
        buf.put_f32_le(value);
    }
    buf.freeze()
}

/// Decode an inbound message body into its float slots.
pub fn decode_message(mut body: &[u8]) -> Result<Vec<f32>, ProtocolError> {
    if body.len() > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::TooLong(body.len()));
    }
    if body.len() % 4 != 0 {
        return Err(ProtocolError::Misaligned(body.len()));
    }
    let mut out = Vec::with_capacity(body.len() / 4);
    while body.has_remaining() {
        out.push(body.get_f32_le());
    }
    Ok(out)
}
