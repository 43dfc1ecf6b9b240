// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::time::{Duration, Instant};

use num_complex::Complex;
use wrx_core::{FrameKind, SpectrumFrame, PAYLOAD_LEN};

use super::{decimate_max, rearrange, to_levels, RateLimiter, SpectrumError, WindowedFft};

/// Transform size for the per-session spectrum.
pub const NARROWBAND_FFT_SIZE: usize = 8192;

/// Spectrum of one session's demodulator-rate signal.
///
/// Unwindowed FFT, halves swapped, levels in dB, max-pooled to 1024 bins.
/// Frames are tagged [`FrameKind::Narrowband`] and rate limited.
pub struct NarrowbandSpectrumEngine {
    fft: WindowedFft,
    calibration_db: f32,
    limiter: RateLimiter,
}

impl NarrowbandSpectrumEngine {
    /// The transform must be at least twice the output width.
    pub fn new(
        fft_size: usize,
        calibration_db: f32,
        min_interval: Duration,
    ) -> Result<Self, SpectrumError> {
        if fft_size < 2 * PAYLOAD_LEN {
            return Err(SpectrumError::RangeTooNarrow {
                bins: fft_size,
                target: 2 * PAYLOAD_LEN,
            });
        }
        Ok(Self {
            fft: WindowedFft::new(fft_size, None),
            calibration_db,
            limiter: RateLimiter::new(min_interval),
        })
    }

    /// Accumulate samples. Returns a frame when a window completed and
    /// the rate limit allows one at `now`. Completed windows that fall
    /// inside the rate limit are discarded.
    pub fn push(&mut self, samples: &[Complex<f32>], now: Instant) -> Option<SpectrumFrame> {
        let calibration_db = self.calibration_db;
        let limiter = &mut self.limiter;
        let mut emitted = None;
        self.fft.push(samples, |bins| {
            if !limiter.ready(now) {
                return;
            }
            rearrange(bins);
            let levels = to_levels(bins, calibration_db);
            match decimate_max(&levels, 0, levels.len() - 1, PAYLOAD_LEN) {
                Ok(payload) => {
                    limiter.mark(now);
                    emitted = Some(SpectrumFrame::with_payload(FrameKind::Narrowband, &payload));
                }
                Err(e) => tracing::warn!("narrowband spectrum skipped: {}", e),
            }
        });
        emitted
    }

    pub fn buffered(&self) -> usize {
        self.fft.buffered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{DEFAULT_CALIBRATION_DB, DEFAULT_MIN_INTERVAL};

    fn engine() -> NarrowbandSpectrumEngine {
        NarrowbandSpectrumEngine::new(
            NARROWBAND_FFT_SIZE,
            DEFAULT_CALIBRATION_DB,
            DEFAULT_MIN_INTERVAL,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_small_transform() {
        assert!(NarrowbandSpectrumEngine::new(2047, -115.0, DEFAULT_MIN_INTERVAL).is_err());
        assert!(NarrowbandSpectrumEngine::new(2048, -115.0, DEFAULT_MIN_INTERVAL).is_ok());
    }

    #[test]
    fn test_emits_after_full_window() {
        let mut nb = engine();
        let t0 = Instant::now();
        let block = vec![Complex::new(0.1, 0.0); 480];
        let mut frames = 0;
        for _ in 0..17 {
            if nb.push(&block, t0).is_some() {
                frames += 1;
            }
        }
        // 17 * 480 = 8160 < 8192
        assert_eq!(frames, 0);
        let frame = nb.push(&block, t0).unwrap();
        assert_eq!(frame.kind(), Some(FrameKind::Narrowband));
        assert_eq!(nb.buffered(), 18 * 480 - NARROWBAND_FFT_SIZE);
    }

    #[test]
    fn test_rate_limit_between_windows() {
        let mut nb = engine();
        let t0 = Instant::now();
        let window = vec![Complex::new(0.0, 0.1); NARROWBAND_FFT_SIZE];
        assert!(nb.push(&window, t0).is_some());
        assert!(nb.push(&window, t0 + Duration::from_millis(50)).is_none());
        assert!(nb.push(&window, t0 + Duration::from_millis(100)).is_some());
    }

    #[test]
    fn test_dc_tone_peaks_in_the_middle() {
        let mut nb = engine();
        let window = vec![Complex::new(1.0, 0.0); NARROWBAND_FFT_SIZE];
        let frame = nb.push(&window, Instant::now()).unwrap();
        let payload = frame.payload();
        let (peak, _) = payload
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        assert_eq!(peak, PAYLOAD_LEN / 2);
        // |X[0]| = 8192 -> 78.27 dB - 115 dB
        assert!((payload[peak] - (20.0 * 8192f32.log10() - 115.0)).abs() < 0.01);
    }
}
