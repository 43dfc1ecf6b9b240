// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! IQ sample sources feeding the receiver loop at the working rate.

use std::f64::consts::TAU;

use num_complex::Complex;
use wrx_core::WORKING_RATE;

/// Abstraction over any IQ sample source (hardware front end or synthetic).
pub trait IqSource: Send + 'static {
    /// Read the next block of IQ samples into `buf`.
    /// Returns the number of samples written, or an error string.
    fn read_into(&mut self, buf: &mut [Complex<f32>]) -> Result<usize, String>;

    /// Move the receiver centre to `center_hz`.
    fn retune(&mut self, _center_hz: u32) -> Result<(), String> {
        Ok(())
    }
}

/// IQ source that produces silence (all zeros).
pub struct MockIqSource;

impl IqSource for MockIqSource {
    fn read_into(&mut self, buf: &mut [Complex<f32>]) -> Result<usize, String> {
        buf.fill(Complex::new(0.0, 0.0));
        Ok(buf.len())
    }
}

/// A single carrier at a fixed offset from the receiver centre with a
/// low deterministic noise floor. The carrier follows the receiver: a
/// retune keeps it at the same offset.
pub struct ToneIqSource {
    phase: f64,
    phase_inc: f64,
    amplitude: f32,
    noise_state: u32,
    center_hz: u32,
}

impl ToneIqSource {
    const NOISE_LEVEL: f32 = 1e-4;

    pub fn new(offset_hz: i32, amplitude: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: TAU * f64::from(offset_hz) / f64::from(WORKING_RATE),
            amplitude,
            noise_state: 0x2545_f491,
            center_hz: 0,
        }
    }

    pub fn center_hz(&self) -> u32 {
        self.center_hz
    }

    // Numerical Recipes LCG, mapped to [-1, 1).
    fn noise(&mut self) -> f32 {
        self.noise_state = self
            .noise_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        (self.noise_state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
    }
}

impl IqSource for ToneIqSource {
    fn read_into(&mut self, buf: &mut [Complex<f32>]) -> Result<usize, String> {
        for slot in buf.iter_mut() {
            let (sin, cos) = self.phase.sin_cos();
            let noise = Complex::new(self.noise(), self.noise()) * Self::NOISE_LEVEL;
            *slot = Complex::new(cos as f32, sin as f32) * self.amplitude + noise;
            self.phase = (self.phase + self.phase_inc).rem_euclid(TAU);
        }
        Ok(buf.len())
    }

    fn retune(&mut self, center_hz: u32) -> Result<(), String> {
        self.center_hz = center_hz;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_fills_zeros() {
        let mut src = MockIqSource;
        let mut buf = vec![Complex::new(1.0_f32, 1.0_f32); 64];
        assert_eq!(src.read_into(&mut buf).unwrap(), 64);
        assert!(buf.iter().all(|s| s.re == 0.0 && s.im == 0.0));
        assert!(src.retune(7_240_000).is_ok());
    }

    #[test]
    fn test_tone_is_phase_continuous_across_reads() {
        let mut src = ToneIqSource::new(48_000, 0.5);
        let mut a = vec![Complex::new(0.0, 0.0); 7];
        let mut b = vec![Complex::new(0.0, 0.0); 7];
        src.read_into(&mut a).unwrap();
        src.read_into(&mut b).unwrap();
        // 48 kHz at 480 kS/s advances a tenth of a turn per sample.
        let step = (b[0] * a[6].conj()).arg();
        assert!((step - std::f32::consts::TAU / 10.0).abs() < 0.01, "step {step}");
        assert!(a.iter().chain(&b).all(|s| (s.norm() - 0.5).abs() < 0.01));
    }

    #[test]
    fn test_noise_is_small_and_bounded() {
        let mut src = ToneIqSource::new(0, 0.0);
        let mut buf = vec![Complex::new(0.0, 0.0); 4800];
        src.read_into(&mut buf).unwrap();
        assert!(buf.iter().all(|s| s.re.abs() <= 1e-4 && s.im.abs() <= 1e-4));
        assert!(buf.iter().any(|s| s.re != 0.0));
    }

    #[test]
    fn test_retune_records_centre() {
        let mut src = ToneIqSource::new(100_000, 0.1);
        src.retune(14_240_000).unwrap();
        assert_eq!(src.center_hz(), 14_240_000);
    }
}
