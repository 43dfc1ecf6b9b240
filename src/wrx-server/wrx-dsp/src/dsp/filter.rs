// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Windowed-sinc FIR low-pass filters evaluated with FFT overlap-save.

use std::f32::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Hann-windowed sinc low-pass taps normalised to unity DC gain.
///
/// `cutoff_norm` is `cutoff_hz / sample_rate` (0.0–0.5).
pub fn windowed_sinc_coeffs(cutoff_norm: f32, taps: usize) -> Vec<f32> {
    let taps = taps.max(1);
    let m = (taps - 1) as f32;
    let mut coeffs: Vec<f32> = (0..taps)
        .map(|i| {
            let x = i as f32 - m / 2.0;
            let sinc = if x == 0.0 {
                2.0 * cutoff_norm
            } else {
                (2.0 * PI * cutoff_norm * x).sin() / (PI * x)
            };
            let window = if taps == 1 {
                1.0
            } else {
                0.5 * (1.0 - (2.0 * PI * i as f32 / m).cos())
            };
            sinc * window
        })
        .collect();
    let sum: f32 = coeffs.iter().sum();
    if sum.abs() > 1e-12 {
        let inv = 1.0 / sum;
        coeffs.iter_mut().for_each(|c| *c *= inv);
    }
    coeffs
}

/// Frequency-domain kernel plus the FFT plans sized for it.
struct Kernel {
    h_freq: Vec<Complex<f32>>,
    n_taps: usize,
    block_size: usize,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
}

impl Kernel {
    fn new(cutoff_norm: f32, taps: usize, block_size: usize) -> Self {
        let coeffs = windowed_sinc_coeffs(cutoff_norm, taps);
        let n_taps = coeffs.len();
        let block_size = block_size.max(1);
        let fft_size = (block_size + n_taps - 1).next_power_of_two();

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let mut h_freq: Vec<Complex<f32>> =
            coeffs.iter().map(|&c| Complex::new(c, 0.0)).collect();
        h_freq.resize(fft_size, Complex::new(0.0, 0.0));
        fft.process(&mut h_freq);

        Self {
            h_freq,
            n_taps,
            block_size,
            fft_size,
            fft,
            ifft,
        }
    }

    /// Filter one chunk of at most `block_size` samples. `overlap` holds
    /// the last `n_taps - 1` inputs of the previous chunk.
    fn run_chunk(
        &self,
        overlap: &mut [Complex<f32>],
        input: &[Complex<f32>],
        scratch: &mut Vec<Complex<f32>>,
        output: &mut Vec<Complex<f32>>,
    ) {
        let n_new = input.len();
        let n_overlap = overlap.len();

        scratch.clear();
        scratch.extend_from_slice(overlap);
        scratch.extend_from_slice(input);
        scratch.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(scratch);
        let scale = 1.0 / self.fft_size as f32;
        for (x, &h) in scratch.iter_mut().zip(&self.h_freq) {
            *x = *x * h * scale;
        }
        self.ifft.process(scratch);

        output.extend_from_slice(&scratch[n_overlap..n_overlap + n_new]);

        if n_overlap > 0 {
            if n_new >= n_overlap {
                overlap.copy_from_slice(&input[n_new - n_overlap..]);
            } else {
                overlap.copy_within(n_new.., 0);
                overlap[n_overlap - n_new..].copy_from_slice(input);
            }
        }
    }
}

/// Complex-input FIR low-pass with state carried across calls.
pub struct BlockFirFilterPair {
    kernel: Kernel,
    overlap: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl BlockFirFilterPair {
    pub fn new(cutoff_norm: f32, taps: usize, block_size: usize) -> Self {
        let kernel = Kernel::new(cutoff_norm, taps, block_size);
        Self {
            overlap: vec![Complex::new(0.0, 0.0); kernel.n_taps - 1],
            scratch: Vec::with_capacity(kernel.fft_size),
            kernel,
        }
    }

    /// Append the filtered `input` to `output`. Inputs longer than the
    /// planned block size are processed in several chunks.
    pub fn filter_into(&mut self, input: &[Complex<f32>], output: &mut Vec<Complex<f32>>) {
        output.reserve(input.len());
        for chunk in input.chunks(self.kernel.block_size) {
            self.kernel
                .run_chunk(&mut self.overlap, chunk, &mut self.scratch, output);
        }
    }

}

/// Real-input variant of [`BlockFirFilterPair`].
pub struct BlockFirFilter {
    inner: BlockFirFilterPair,
    staging: Vec<Complex<f32>>,
    filtered: Vec<Complex<f32>>,
}

impl BlockFirFilter {
    pub fn new(cutoff_norm: f32, taps: usize, block_size: usize) -> Self {
        Self {
            inner: BlockFirFilterPair::new(cutoff_norm, taps, block_size),
            staging: Vec::new(),
            filtered: Vec::new(),
        }
    }

    pub fn filter_into(&mut self, input: &[f32], output: &mut Vec<f32>) {
        self.staging.clear();
        self.staging
            .extend(input.iter().map(|&s| Complex::new(s, 0.0)));
        self.filtered.clear();
        self.inner.filter_into(&self.staging, &mut self.filtered);
        output.extend(self.filtered.iter().map(|s| s.re));
    }
}
