// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fixed-size outbound frame shared by every feed the server produces.
//!
//! A frame is 1025 `f32` values: slot 0 carries the [`FrameKind`] tag and
//! slots 1..=1024 carry the payload. Spectrum levels, audio samples,
//! configuration snapshots and roster text all travel in this one shape.

use serde::{Deserialize, Serialize};

/// Total slot count of a frame (tag + payload).
pub const FRAME_LEN: usize = 1025;

/// Payload slot count of a frame.
pub const PAYLOAD_LEN: usize = FRAME_LEN - 1;

/// Value stored in slot 0 of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FrameKind {
    Wideband = 0,
    Narrowband = 1,
    Config = 2,
    Audio = 3,
    Roster = 4,
    AuthRejected = 5,
}

impl FrameKind {
    pub fn tag(self) -> f32 {
        self as u8 as f32
    }

    pub fn from_tag(tag: f32) -> Option<Self> {
        if tag.fract() != 0.0 {
            return None;
        }
        match tag as i32 {
            0 => Some(Self::Wideband),
            1 => Some(Self::Narrowband),
            2 => Some(Self::Config),
            3 => Some(Self::Audio),
            4 => Some(Self::Roster),
            5 => Some(Self::AuthRejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    slots: Box<[f32]>,
}

impl SpectrumFrame {
    /// Zero-filled frame carrying `kind` in slot 0.
    pub fn new(kind: FrameKind) -> Self {
        let mut slots = vec![0.0_f32; FRAME_LEN].into_boxed_slice();
        slots[0] = kind.tag();
        Self { slots }
    }

    /// Frame whose payload starts with `payload`. Values past
    /// [`PAYLOAD_LEN`] are dropped, missing ones stay zero.
    pub fn with_payload(kind: FrameKind, payload: &[f32]) -> Self {
        let mut frame = Self::new(kind);
        let n = payload.len().min(PAYLOAD_LEN);
        frame.slots[1..=n].copy_from_slice(&payload[..n]);
        frame
    }

    pub fn kind(&self) -> Option<FrameKind> {
        FrameKind::from_tag(self.slots[0])
    }

    pub fn payload(&self) -> &[f32] {
        &self.slots[1..]
    }

    pub fn payload_mut(&mut self) -> &mut [f32] {
        &mut self.slots[1..]
    }

    /// All 1025 slots, tag first.
    pub fn as_slice(&self) -> &[f32] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_tagged_and_zeroed() {
        let frame = SpectrumFrame::new(FrameKind::Audio);
        assert_eq!(frame.as_slice().len(), FRAME_LEN);
        assert_eq!(frame.as_slice()[0], 3.0);
        assert!(frame.payload().iter().all(|&v| v == 0.0));
        assert_eq!(frame.kind(), Some(FrameKind::Audio));
    }

    #[test]
    fn test_with_payload_truncates_long_input() {
        let long: Vec<f32> = (0..2000).map(|i| i as f32).collect();
        let frame = SpectrumFrame::with_payload(FrameKind::Wideband, &long);
        assert_eq!(frame.payload().len(), PAYLOAD_LEN);
        assert_eq!(frame.payload()[PAYLOAD_LEN - 1], (PAYLOAD_LEN - 1) as f32);
    }

    #[test]
    fn test_with_payload_pads_short_input() {
        let frame = SpectrumFrame::with_payload(FrameKind::Config, &[2.0, 7.0]);
        assert_eq!(&frame.payload()[..2], &[2.0, 7.0]);
        assert_eq!(frame.payload()[2], 0.0);
    }

    #[test]
    fn test_from_tag_rejects_unknown_values() {
        assert_eq!(FrameKind::from_tag(0.0), Some(FrameKind::Wideband));
        assert_eq!(FrameKind::from_tag(5.0), Some(FrameKind::AuthRejected));
        assert_eq!(FrameKind::from_tag(6.0), None);
        assert_eq!(FrameKind::from_tag(0.5), None);
        assert_eq!(FrameKind::from_tag(-1.0), None);
    }
}
