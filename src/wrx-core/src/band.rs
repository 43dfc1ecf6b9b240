// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Amateur band plan and the globally selected band window.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WORKING_RATE;

/// Widest window the receiver can cover at the working rate.
pub const MAX_WINDOW_HZ: u32 = WORKING_RATE;

/// Distance from the window start to the receiver centre frequency.
pub const CENTER_OFFSET_HZ: u32 = WORKING_RATE / 2;

/// Band selected at startup (20 m).
pub const DEFAULT_BAND: u32 = 20;

const BAND_PLAN: &[(u32, u32, u32)] = &[
    (630, 400_000, 500_000),
    (160, 1_800_000, 2_000_000),
    (80, 3_500_000, 3_800_000),
    (60, 5_300_000, 5_400_000),
    (40, 7_000_000, 7_200_000),
    (30, 10_100_000, 10_150_000),
    (20, 14_000_000, 14_350_000),
    (17, 18_068_000, 18_168_000),
    (15, 21_000_000, 21_450_000),
    (12, 24_890_000, 24_990_000),
    (11, 26_965_000, 27_405_000),
    (280, 28_000_000, 28_500_000),
    (285, 28_450_000, 29_000_000),
    (290, 29_100_000, 29_600_000),
    (6, 50_000_000, 54_000_000),
    (4, 70_000_000, 70_500_000),
    (144, 144_000_000, 144_500_000),
    (145, 144_500_000, 145_000_000),
    (146, 145_000_000, 145_500_000),
    (147, 145_500_000, 146_000_000),
    (70, 433_500_000, 434_000_000),
    (438, 438_800_000, 439_300_000),
    (446, 446_000_000, 446_200_000),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BandError {
    #[error("unknown band code {0}")]
    UnknownBand(u32),
}

/// Frequency window of the selected band, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandWindow {
    pub start_hz: u32,
    pub end_hz: u32,
}

impl BandWindow {
    pub fn new(start_hz: u32, end_hz: u32) -> Self {
        Self { start_hz, end_hz }
    }

    /// Window for a band code, with the end clamped to what the receiver
    /// can cover from the band start.
    pub fn for_band(code: u32) -> Result<Self, BandError> {
        let (_, start, end) = BAND_PLAN
            .iter()
            .copied()
            .find(|(c, _, _)| *c == code)
            .ok_or(BandError::UnknownBand(code))?;
        Ok(Self {
            start_hz: start,
            end_hz: end.min(start + MAX_WINDOW_HZ),
        })
    }

    /// Receiver centre frequency for this window.
    pub fn tuned_hz(&self) -> u32 {
        self.start_hz + CENTER_OFFSET_HZ
    }

    pub fn span_hz(&self) -> u32 {
        self.end_hz.saturating_sub(self.start_hz)
    }

    fn pack(self) -> u64 {
        (u64::from(self.start_hz) << 32) | u64::from(self.end_hz)
    }

    fn unpack(raw: u64) -> Self {
        Self {
            start_hz: (raw >> 32) as u32,
            end_hz: raw as u32,
        }
    }
}

impl fmt::Display for BandWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} Hz", self.start_hz, self.end_hz)
    }
}

impl Default for BandWindow {
    fn default() -> Self {
        Self {
            start_hz: 14_000_000,
            end_hz: 14_350_000,
        }
    }
}

/// Lock-free holder of the current [`BandWindow`].
///
/// Both edges live in one atomic word so a reader always observes a
/// window that was actually stored, never a mix of two.
#[derive(Debug)]
pub struct BandWindowCell {
    raw: AtomicU64,
}

impl BandWindowCell {
    pub fn new(window: BandWindow) -> Self {
        Self {
            raw: AtomicU64::new(window.pack()),
        }
    }

    pub fn load(&self) -> BandWindow {
        BandWindow::unpack(self.raw.load(Ordering::Acquire))
    }

    pub fn store(&self, window: BandWindow) {
        self.raw.store(window.pack(), Ordering::Release);
    }
}

impl Default for BandWindowCell {
    fn default() -> Self {
        Self::new(BandWindow::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_20m() {
        let window = BandWindow::default();
        assert_eq!(window, BandWindow::for_band(DEFAULT_BAND).unwrap());
        assert_eq!(window.tuned_hz(), 14_240_000);
    }

    #[test]
    fn test_wide_band_is_clamped() {
        let window = BandWindow::for_band(6).unwrap();
        assert_eq!(window.start_hz, 50_000_000);
        assert_eq!(window.end_hz, 50_480_000);
        assert_eq!(window.span_hz(), MAX_WINDOW_HZ);
    }

    #[test]
    fn test_narrow_band_keeps_its_end() {
        let window = BandWindow::for_band(30).unwrap();
        assert_eq!(window.end_hz, 10_150_000);
        assert_eq!(window.span_hz(), 50_000);
    }

    #[test]
    fn test_unknown_band_is_rejected() {
        assert_eq!(BandWindow::for_band(99), Err(BandError::UnknownBand(99)));
    }

    #[test]
    fn test_cell_round_trip() {
        let cell = BandWindowCell::default();
        let uhf = BandWindow::for_band(446).unwrap();
        cell.store(uhf);
        assert_eq!(cell.load(), uhf);
        assert_eq!(cell.load().tuned_hz(), 446_240_000);
    }
}
