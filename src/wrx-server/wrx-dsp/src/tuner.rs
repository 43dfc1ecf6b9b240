// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-session frequency translation from the receiver stream to the
//! demodulator rate.

use std::f64::consts::TAU;

use num_complex::Complex;
use wrx_core::band::CENTER_OFFSET_HZ;
use wrx_core::{CHANNEL_RATE, WORKING_RATE};

use crate::dsp::{ComplexResampler, Nco};

pub struct Tuner {
    frequency_shift: f32,
    pending: Option<f64>,
    nco: Nco,
    resampler: ComplexResampler,
    mixed: Vec<Complex<f32>>,
}

impl Tuner {
    pub fn new() -> Self {
        Self {
            frequency_shift: 0.0,
            pending: None,
            nco: Nco::new(0.0),
            resampler: ComplexResampler::new(f64::from(CHANNEL_RATE) / f64::from(WORKING_RATE)),
            mixed: Vec::new(),
        }
    }

    /// Tune to `offset_hz` above the start of the band window. The receiver
    /// centre sits at the middle of the window, so the mixer shift is
    /// `offset_hz - 240 kHz`. The new shift applies from the next block.
    /// Non-finite offsets are ignored.
    pub fn set_frequency_offset(&mut self, offset_hz: f32) {
        if !offset_hz.is_finite() {
            return;
        }
        self.frequency_shift = offset_hz - CENTER_OFFSET_HZ as f32;
        self.pending = Some(TAU * f64::from(self.frequency_shift) / f64::from(WORKING_RATE));
    }

    /// Current shift from the receiver centre, in Hz.
    pub fn frequency_shift(&self) -> f32 {
        self.frequency_shift
    }

    /// Mix the block down and resample it to the demodulator rate.
    ///
    /// The output holds `floor(len * 0.1 + 0.5)` samples.
    pub fn tune(&mut self, samples: &[Complex<f32>]) -> Vec<Complex<f32>> {
        if let Some(freq) = self.pending.take() {
            self.nco.set_frequency(freq);
        }
        self.nco.mix_down_into(samples, &mut self.mixed);
        self.resampler.process(&self.mixed)
    }
}

impl Default for Tuner {
    fn default() -> Self {
        Self::new()
    }
}
