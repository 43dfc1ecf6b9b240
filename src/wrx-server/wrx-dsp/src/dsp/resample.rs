// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Rational-ratio down-samplers.
//!
//! Each call filters the block with an anti-alias FIR and then picks
//! evenly spaced samples. The number of samples produced for an input of
//! `n` is always `floor(n * ratio + 0.5)`, independent of earlier calls.

use num_complex::Complex;

use super::filter::{BlockFirFilter, BlockFirFilterPair};

const ANTI_ALIAS_TAPS: usize = 63;
const FILTER_BLOCK: usize = 4096;

/// Output length produced for `input_len` samples at `ratio`.
pub fn expected_output_len(input_len: usize, ratio: f64) -> usize {
    (input_len as f64 * ratio + 0.5).floor() as usize
}

/// Index of the `k`-th picked sample when keeping `m` out of `n`.
#[inline]
fn pick_index(k: usize, n: usize, m: usize) -> usize {
    ((k + 1) * n / m).saturating_sub(1)
}

fn anti_alias_cutoff(ratio: f64) -> f32 {
    (0.45 * ratio).min(0.45) as f32
}

pub struct ComplexResampler {
    ratio: f64,
    lpf: BlockFirFilterPair,
    filtered: Vec<Complex<f32>>,
}

impl ComplexResampler {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio,
            lpf: BlockFirFilterPair::new(anti_alias_cutoff(ratio), ANTI_ALIAS_TAPS, FILTER_BLOCK),
            filtered: Vec::new(),
        }
    }

    pub fn process(&mut self, input: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let n = input.len();
        let m = expected_output_len(n, self.ratio);
        self.filtered.clear();
        self.lpf.filter_into(input, &mut self.filtered);
        (0..m).map(|k| self.filtered[pick_index(k, n, m)]).collect()
    }
}

pub struct RealResampler {
    ratio: f64,
    lpf: BlockFirFilter,
    filtered: Vec<f32>,
}

impl RealResampler {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio,
            lpf: BlockFirFilter::new(anti_alias_cutoff(ratio), ANTI_ALIAS_TAPS, FILTER_BLOCK),
            filtered: Vec::new(),
        }
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let n = input.len();
        let m = expected_output_len(n, self.ratio);
        self.filtered.clear();
        self.lpf.filter_into(input, &mut self.filtered);
        (0..m).map(|k| self.filtered[pick_index(k, n, m)]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_output_len_rounds_to_nearest() {
        assert_eq!(expected_output_len(4800, 0.1), 480);
        assert_eq!(expected_output_len(4805, 0.1), 481);
        assert_eq!(expected_output_len(4804, 0.1), 480);
        assert_eq!(expected_output_len(480, 1.0 / 6.0), 80);
        assert_eq!(expected_output_len(100, 1.0 / 6.0), 17);
        assert_eq!(expected_output_len(2, 0.1), 0);
        assert_eq!(expected_output_len(0, 0.1), 0);
    }

    #[test]
    fn test_pick_index_stays_in_bounds() {
        for n in [1usize, 7, 100, 4800] {
            for ratio in [0.1, 1.0 / 6.0, 0.9] {
                let m = expected_output_len(n, ratio);
                for k in 0..m {
                    assert!(pick_index(k, n, m) < n);
                }
            }
        }
    }

    #[test]
    fn test_complex_resampler_lengths() {
        let mut rs = ComplexResampler::new(0.1);
        for n in [4800usize, 1234, 15, 0] {
            let out = rs.process(&vec![Complex::new(1.0, 0.0); n]);
            assert_eq!(out.len(), expected_output_len(n, 0.1));
        }
    }

    #[test]
    fn test_real_resampler_keeps_dc_level() {
        let mut rs = RealResampler::new(1.0 / 6.0);
        let mut last = Vec::new();
        for _ in 0..4 {
            last = rs.process(&[0.5; 480]);
        }
        assert_eq!(last.len(), 80);
        for v in last {
            assert!((v - 0.5).abs() < 1e-3, "{v}");
        }
    }
}
