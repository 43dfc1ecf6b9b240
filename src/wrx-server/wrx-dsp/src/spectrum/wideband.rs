// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::time::{Duration, Instant};

use num_complex::Complex;
use wrx_core::{BandWindow, FrameKind, SpectrumFrame, PAYLOAD_LEN, WORKING_RATE};

use super::{decimate_band, hamming_window, rearrange, to_levels, RateLimiter, WindowedFft};

pub const WIDEBAND_FFT_SIZE: usize = 16_384;

/// Spectrum of the whole receiver stream, trimmed to the active band.
///
/// Each completed 16384-point Hamming-windowed transform covers the full
/// working rate. Only bins `0..=(end - start)` Hz are kept, so a band
/// narrower than the receiver span is shown edge to edge.
pub struct WidebandSpectrumEngine {
    fft: WindowedFft,
    calibration_db: f32,
    limiter: RateLimiter,
}

impl WidebandSpectrumEngine {
    pub fn new(calibration_db: f32, min_interval: Duration) -> Self {
        Self {
            fft: WindowedFft::new(WIDEBAND_FFT_SIZE, Some(hamming_window(WIDEBAND_FFT_SIZE))),
            calibration_db,
            limiter: RateLimiter::new(min_interval),
        }
    }

    pub fn push(
        &mut self,
        samples: &[Complex<f32>],
        window: BandWindow,
        now: Instant,
    ) -> Option<SpectrumFrame> {
        let calibration_db = self.calibration_db;
        let limiter = &mut self.limiter;
        let mut emitted = None;
        self.fft.push(samples, |bins| {
            if !limiter.ready(now) {
                return;
            }
            rearrange(bins);
            let levels = to_levels(bins, calibration_db);
            match decimate_band(&levels, 0, window.span_hz(), WORKING_RATE, PAYLOAD_LEN) {
                Ok(payload) => {
                    limiter.mark(now);
                    emitted = Some(SpectrumFrame::with_payload(FrameKind::Wideband, &payload));
                }
                Err(e) => tracing::warn!("wideband spectrum skipped ({}): {}", window, e),
            }
        });
        emitted
    }

    pub fn buffered(&self) -> usize {
        self.fft.buffered()
    }
}
