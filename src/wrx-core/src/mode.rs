// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::{Deserialize, Serialize};

/// Demodulation mode selectable per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemodMode {
    Lsb,
    #[default]
    Usb,
    Fm,
}

impl DemodMode {
    /// Numeric code used by control messages and configuration snapshots.
    pub fn code(self) -> u8 {
        match self {
            DemodMode::Lsb => 0,
            DemodMode::Usb => 1,
            DemodMode::Fm => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DemodMode::Lsb),
            1 => Some(DemodMode::Usb),
            2 => Some(DemodMode::Fm),
            _ => None,
        }
    }
}

impl fmt::Display for DemodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DemodMode::Lsb => "LSB",
            DemodMode::Usb => "USB",
            DemodMode::Fm => "FM",
        };
        f.write_str(name)
    }
}

/// Discrete channel filter widths offered to viewers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterBandwidth {
    Hz500,
    Hz1800,
    Hz2700,
    #[default]
    Hz3600,
}

impl FilterBandwidth {
    pub const ALL: [FilterBandwidth; 4] = [
        FilterBandwidth::Hz500,
        FilterBandwidth::Hz1800,
        FilterBandwidth::Hz2700,
        FilterBandwidth::Hz3600,
    ];

    pub fn hz(self) -> u32 {
        match self {
            FilterBandwidth::Hz500 => 500,
            FilterBandwidth::Hz1800 => 1800,
            FilterBandwidth::Hz2700 => 2700,
            FilterBandwidth::Hz3600 => 3600,
        }
    }

    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|bw| bw.hz() == hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes_round_trip() {
        for mode in [DemodMode::Lsb, DemodMode::Usb, DemodMode::Fm] {
            assert_eq!(DemodMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(DemodMode::from_code(3), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DemodMode::default(), DemodMode::Usb);
        assert_eq!(FilterBandwidth::default(), FilterBandwidth::Hz3600);
    }

    #[test]
    fn test_filter_from_hz() {
        assert_eq!(FilterBandwidth::from_hz(2700), Some(FilterBandwidth::Hz2700));
        assert_eq!(FilterBandwidth::from_hz(2400), None);
    }
}
