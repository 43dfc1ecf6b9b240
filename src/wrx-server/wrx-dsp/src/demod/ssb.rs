// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::f64::consts::TAU;

use num_complex::Complex;

use crate::dsp::BiquadCascade;

/// Widest audio passband kept on the selected side of the carrier.
const SIDEBAND_WIDTH_HZ: f32 = 3_600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sideband {
    Upper,
    Lower,
}

/// Single-sideband product detector.
///
/// The wanted sideband is shifted so it straddles DC, low-pass filtered
/// to half the sideband width, shifted back and the real part taken.
/// This keeps `[0, W]` (upper) or `[-W, 0]` (lower) and rejects the
/// opposite sideband.
#[derive(Debug, Clone)]
pub struct SsbDemod {
    phase: f64,
    phase_inc: f64,
    lpf: BiquadCascade,
}

impl SsbDemod {
    pub fn new(sideband: Sideband, sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f32;
        let half = SIDEBAND_WIDTH_HZ / 2.0;
        let shift = match sideband {
            Sideband::Upper => half,
            Sideband::Lower => -half,
        };
        Self {
            phase: 0.0,
            phase_inc: TAU * f64::from(shift) / f64::from(sr),
            lpf: BiquadCascade::low_pass(sr, half),
        }
    }

    pub fn demodulate(&mut self, samples: &[Complex<f32>]) -> Vec<f32> {
        let mut out = Vec::with_capacity(samples.len());
        for &sample in samples {
            let (sin, cos) = self.phase.sin_cos();
            let lo = Complex::new(cos as f32, sin as f32);
            let centred = self.lpf.process(sample * lo.conj());
            out.push((centred * lo).re);
            self.phase = (self.phase + self.phase_inc).rem_euclid(TAU);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_power(demod: &mut SsbDemod, freq_hz: f32) -> f32 {
        let sr = 48_000.0;
        let input: Vec<Complex<f32>> = (0..9600)
            .map(|n| Complex::from_polar(1.0, std::f32::consts::TAU * freq_hz * n as f32 / sr))
            .collect();
        let out = demod.demodulate(&input);
        let tail = &out[4800..];
        tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32
    }

    #[test]
    fn test_usb_keeps_upper_and_rejects_lower() {
        let upper = tone_power(&mut SsbDemod::new(Sideband::Upper, 48_000), 1_000.0);
        let lower = tone_power(&mut SsbDemod::new(Sideband::Upper, 48_000), -1_000.0);
        assert!(upper > 0.3, "upper {upper}");
        assert!(lower < upper * 0.1, "lower {lower}");
    }

    #[test]
    fn test_lsb_keeps_lower_and_rejects_upper() {
        let lower = tone_power(&mut SsbDemod::new(Sideband::Lower, 48_000), -1_000.0);
        let upper = tone_power(&mut SsbDemod::new(Sideband::Lower, 48_000), 1_000.0);
        assert!(lower > 0.3, "lower {lower}");
        assert!(upper < lower * 0.1, "upper {upper}");
    }
}
