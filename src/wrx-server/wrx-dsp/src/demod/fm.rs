// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use num_complex::Complex;

use super::math::fast_atan2;

/// Modulation index the discriminator output is normalised to.
const MODULATION_INDEX: f32 = 0.5;

/// FM quadrature discriminator: `arg(s[n] * conj(s[n-1]))` scaled by
/// `1 / (2π * modulation_index)`. The last sample of a block is kept so
/// the next block continues without a glitch.
#[derive(Debug, Clone, Default)]
pub struct FmDemod {
    prev: Option<Complex<f32>>,
}

impl FmDemod {
    pub fn demodulate(&mut self, samples: &[Complex<f32>]) -> Vec<f32> {
        let scale = 1.0 / (std::f32::consts::TAU * MODULATION_INDEX);
        let mut output = Vec::with_capacity(samples.len());
        for &sample in samples {
            let value = match self.prev {
                Some(prev) => {
                    let product = sample * prev.conj();
                    fast_atan2(product.im, product.re) * scale
                }
                None => 0.0,
            };
            output.push(value);
            self.prev = Some(sample);
        }
        output
    }
}
