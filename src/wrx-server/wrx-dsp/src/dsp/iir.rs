// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Second-order IIR sections with real coefficients and complex state.

use std::f32::consts::PI;

use num_complex::Complex;

/// Section Q values of a 4th-order Butterworth response.
const BUTTERWORTH_Q4: [f32; 2] = [0.541_196_1, 1.306_563];

#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: Complex<f32>,
    x2: Complex<f32>,
    y1: Complex<f32>,
    y2: Complex<f32>,
}

impl Biquad {
    fn from_coeffs(b: [f32; 3], a: [f32; 3]) -> Self {
        let inv_a0 = 1.0 / a[0];
        let zero = Complex::new(0.0, 0.0);
        Self {
            b0: b[0] * inv_a0,
            b1: b[1] * inv_a0,
            b2: b[2] * inv_a0,
            a1: a[1] * inv_a0,
            a2: a[2] * inv_a0,
            x1: zero,
            x2: zero,
            y1: zero,
            y2: zero,
        }
    }

    fn low_pass(sample_rate: f32, cutoff_hz: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * cutoff_hz.clamp(1.0, sample_rate * 0.45) / sample_rate;
        let alpha = w0.sin() / (2.0 * q.max(0.1));
        let cos_w0 = w0.cos();
        Self::from_coeffs(
            [(1.0 - cos_w0) * 0.5, 1.0 - cos_w0, (1.0 - cos_w0) * 0.5],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        )
    }

    /// Constant 0 dB peak band-pass.
    fn band_pass(sample_rate: f32, center_hz: f32, q: f32) -> Self {
        let w0 = 2.0 * PI * center_hz.clamp(1.0, sample_rate * 0.45) / sample_rate;
        let alpha = w0.sin() / (2.0 * q.max(0.1));
        let cos_w0 = w0.cos();
        Self::from_coeffs(
            [alpha, 0.0, -alpha],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        )
    }

    #[inline]
    fn process(&mut self, x: Complex<f32>) -> Complex<f32> {
        let y = x * self.b0 + self.x1 * self.b1 + self.x2 * self.b2
            - self.y1 * self.a1
            - self.y2 * self.a2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// A chain of biquad sections applied in series.
#[derive(Debug, Clone)]
pub struct BiquadCascade {
    sections: Vec<Biquad>,
}

impl BiquadCascade {
    /// 4th-order Butterworth low-pass.
    pub fn low_pass(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self {
            sections: BUTTERWORTH_Q4
                .iter()
                .map(|&q| Biquad::low_pass(sample_rate, cutoff_hz, q))
                .collect(),
        }
    }

    /// 4th-order band-pass of `bandwidth_hz` centred on `center_hz`.
    pub fn band_pass(sample_rate: f32, center_hz: f32, bandwidth_hz: f32) -> Self {
        let q = center_hz / bandwidth_hz.max(1.0);
        Self {
            sections: (0..2)
                .map(|_| Biquad::band_pass(sample_rate, center_hz, q))
                .collect(),
        }
    }

    #[inline]
    pub fn process(&mut self, x: Complex<f32>) -> Complex<f32> {
        self.sections.iter_mut().fold(x, |acc, s| s.process(acc))
    }

    pub fn process_in_place(&mut self, samples: &mut [Complex<f32>]) {
        for s in samples {
            *s = self.process(*s);
        }
    }
}
