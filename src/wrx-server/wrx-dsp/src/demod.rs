// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod fm;
mod math;
mod ssb;

use num_complex::Complex;
use wrx_core::DemodMode;

pub use fm::FmDemod;
pub use ssb::{Sideband, SsbDemod};

/// Stateful demodulator for one [`DemodMode`].
#[derive(Debug, Clone)]
pub enum Demodulator {
    Ssb(SsbDemod),
    Fm(FmDemod),
}

impl Demodulator {
    pub fn for_mode(mode: DemodMode, sample_rate: u32) -> Self {
        match mode {
            DemodMode::Usb => Self::Ssb(SsbDemod::new(Sideband::Upper, sample_rate)),
            DemodMode::Lsb => Self::Ssb(SsbDemod::new(Sideband::Lower, sample_rate)),
            DemodMode::Fm => Self::Fm(FmDemod::default()),
        }
    }

    /// Demodulate baseband IQ centred at 0 Hz into real audio of the same
    /// length.
    pub fn demodulate(&mut self, samples: &[Complex<f32>]) -> Vec<f32> {
        match self {
            Self::Ssb(d) => d.demodulate(samples),
            Self::Fm(d) => d.demodulate(samples),
        }
    }
}
