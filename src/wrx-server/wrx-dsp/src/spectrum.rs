// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Spectrum analysis shared by the wideband and narrowband engines:
//! FFT, bin rearrangement, level conversion and max-pool decimation.

pub mod narrowband;
pub mod wideband;

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use thiserror::Error;

/// Level offset added to `20*log10(|X|)`, in dB.
pub const DEFAULT_CALIBRATION_DB: f32 = -115.0;

/// Minimum spacing between two frames from one engine.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpectrumError {
    #[error("invalid bin range {first}..={last} for {len} bins")]
    InvalidRange {
        first: usize,
        last: usize,
        len: usize,
    },
    #[error("bin range of {bins} is narrower than the {target} output bins")]
    RangeTooNarrow { bins: usize, target: usize },
}

/// Swap the two halves so the lowest frequency comes first and DC sits in
/// the middle. Applying it twice restores the input for even lengths.
pub fn rearrange<T>(bins: &mut [T]) {
    let half = bins.len() / 2;
    bins.rotate_left(half);
}

/// Magnitude in dB plus `calibration_db`. Zero magnitude is floored at
/// -200 dB rather than producing `-inf`.
pub fn to_levels(bins: &[Complex<f32>], calibration_db: f32) -> Vec<f32> {
    bins.iter()
        .map(|b| 20.0 * b.norm().max(1e-10).log10() + calibration_db)
        .collect()
}

/// Reduce `levels[first_bin..=last_bin]` to `target` values, each the
/// maximum over its share of the range.
pub fn decimate_max(
    levels: &[f32],
    first_bin: usize,
    last_bin: usize,
    target: usize,
) -> Result<Vec<f32>, SpectrumError> {
    if first_bin > last_bin || last_bin >= levels.len() {
        return Err(SpectrumError::InvalidRange {
            first: first_bin,
            last: last_bin,
            len: levels.len(),
        });
    }
    let range = &levels[first_bin..=last_bin];
    if range.len() < target {
        return Err(SpectrumError::RangeTooNarrow {
            bins: range.len(),
            target,
        });
    }
    let out = (0..target)
        .map(|i| {
            let start = i * range.len() / target;
            let end = ((i + 1) * range.len() / target).max(start + 1);
            range[start..end]
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .collect();
    Ok(out)
}

/// Decimate the part of a spectrum spanning `first_hz..=last_hz`, where the
/// whole of `levels` covers `span_hz`. The last bin is clamped to the end
/// of the spectrum.
pub fn decimate_band(
    levels: &[f32],
    first_hz: u32,
    last_hz: u32,
    span_hz: u32,
    target: usize,
) -> Result<Vec<f32>, SpectrumError> {
    let resolution = f64::from(span_hz) / levels.len().max(1) as f64;
    let first_bin = (f64::from(first_hz) / resolution) as usize;
    let last_bin =
        ((f64::from(last_hz) / resolution) as usize).min(levels.len().saturating_sub(1));
    decimate_max(levels, first_bin, last_bin, target)
}

/// Hamming window coefficients.
pub fn hamming_window(len: usize) -> Vec<f32> {
    let denom = len.saturating_sub(1).max(1) as f32;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / denom).cos())
        .collect()
}

/// Lets the first event through, then at most one per `interval`.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&self, now: Instant) -> bool {
        self.last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Record an emission at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Fixed-size FFT fed in arbitrary chunks. Samples left over after a
/// window completes start the next window.
struct WindowedFft {
    size: usize,
    window: Option<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
    buf: Vec<Complex<f32>>,
}

impl WindowedFft {
    fn new(size: usize, window: Option<Vec<f32>>) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            size,
            window,
            fft: planner.plan_fft_forward(size),
            buf: Vec::with_capacity(size),
        }
    }

    /// Feed samples; every completed window is transformed and handed to
    /// `on_spectrum` as bins in natural FFT order.
    fn push(
        &mut self,
        mut samples: &[Complex<f32>],
        mut on_spectrum: impl FnMut(&mut [Complex<f32>]),
    ) {
        while !samples.is_empty() {
            let take = (self.size - self.buf.len()).min(samples.len());
            self.buf.extend_from_slice(&samples[..take]);
            samples = &samples[take..];
            if self.buf.len() == self.size {
                if let Some(window) = &self.window {
                    for (s, &w) in self.buf.iter_mut().zip(window) {
                        *s *= w;
                    }
                }
                self.fft.process(&mut self.buf);
                on_spectrum(&mut self.buf);
                self.buf.clear();
            }
        }
    }

    fn buffered(&self) -> usize {
        self.buf.len()
    }
}
