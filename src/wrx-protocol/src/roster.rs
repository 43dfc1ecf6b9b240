// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use wrx_core::{FrameKind, SpectrumFrame, PAYLOAD_LEN};

/// Longest roster text that still leaves room for the terminator.
pub const MAX_ROSTER_CHARS: usize = PAYLOAD_LEN - 1;

/// Build a roster frame: identities joined by `,`, one byte per slot,
/// zero terminated. Text beyond [`MAX_ROSTER_CHARS`] bytes is cut off.
pub fn pack_roster<'a>(identities: impl IntoIterator<Item = &'a str>) -> SpectrumFrame {
    let text = identities.into_iter().collect::<Vec<_>>().join(",");
    let mut frame = SpectrumFrame::new(FrameKind::Roster);
    let payload = frame.payload_mut();
    for (slot, byte) in payload.iter_mut().zip(text.bytes().take(MAX_ROSTER_CHARS)) {
        *slot = f32::from(byte);
    }
    frame
}

/// Read the roster text back out of a frame payload.
pub fn unpack_roster(payload: &[f32]) -> String {
    payload
        .iter()
        .take_while(|&&v| v != 0.0)
        .map(|&v| char::from(v as u8))
        .collect()
}
