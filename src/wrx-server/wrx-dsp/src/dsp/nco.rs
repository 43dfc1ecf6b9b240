// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::f64::consts::TAU;

use num_complex::Complex;

/// Numerically controlled oscillator used to shift a signal to baseband.
///
/// The phase runs on across calls so consecutive blocks join without a
/// discontinuity.
#[derive(Debug, Clone, Default)]
pub struct Nco {
    phase: f64,
    phase_inc: f64,
}

impl Nco {
    /// `freq_norm` is the angular frequency in radians per sample.
    pub fn new(freq_norm: f64) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_norm,
        }
    }

    pub fn set_frequency(&mut self, freq_norm: f64) {
        self.phase_inc = freq_norm;
    }

    /// Multiply every sample by `exp(-j*phase)`, moving a component at
    /// `+freq` down to DC.
    pub fn mix_down_into(&mut self, input: &[Complex<f32>], output: &mut Vec<Complex<f32>>) {
        output.clear();
        output.reserve(input.len());
        let phase_start = self.phase;
        let (mut sin_phase, mut cos_phase) = phase_start.sin_cos();
        let (sin_inc, cos_inc) = self.phase_inc.sin_cos();
        for &sample in input {
            let lo = Complex::new(cos_phase as f32, -(sin_phase as f32));
            output.push(sample * lo);
            let next_sin = sin_phase * cos_inc + cos_phase * sin_inc;
            let next_cos = cos_phase * cos_inc - sin_phase * sin_inc;
            sin_phase = next_sin;
            cos_phase = next_cos;
        }
        self.phase = (phase_start + input.len() as f64 * self.phase_inc).rem_euclid(TAU);
    }
}
