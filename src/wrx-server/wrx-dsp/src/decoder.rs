// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Channel filtering, demodulation, AGC and audio framing for one session.

use std::collections::VecDeque;

use num_complex::Complex;
use wrx_core::{
    DemodMode, FilterBandwidth, FrameKind, SpectrumFrame, AUDIO_RATE, CHANNEL_RATE, PAYLOAD_LEN,
};

use crate::agc::AudioAgc;
use crate::demod::Demodulator;
use crate::dsp::{BiquadCascade, RealResampler};

/// Cutoff actually used for each filter width. The 2700 Hz setting keeps
/// a 2.4 kHz corner so the selected sideband stays narrower than nominal.
fn cutoff_hz(bw: FilterBandwidth) -> f32 {
    match bw {
        FilterBandwidth::Hz500 => 500.0,
        FilterBandwidth::Hz1800 => 1_800.0,
        FilterBandwidth::Hz2700 => 2_400.0,
        FilterBandwidth::Hz3600 => 3_600.0,
    }
}

fn build_channel_filter(bw: FilterBandwidth) -> BiquadCascade {
    let sr = CHANNEL_RATE as f32;
    match bw {
        // CW width: 1 kHz wide around a 500 Hz audio tone.
        FilterBandwidth::Hz500 => BiquadCascade::band_pass(sr, cutoff_hz(bw), 1_000.0),
        _ => BiquadCascade::low_pass(sr, cutoff_hz(bw)),
    }
}

/// Collects audio samples and releases them in fixed 1024-sample frames,
/// oldest first.
#[derive(Debug, Default)]
pub struct AudioFramer {
    pending: VecDeque<f32>,
}

impl AudioFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Append `samples`; when at least one frame's worth is buffered,
    /// drain exactly one frame. Never emits more than one per call.
    pub fn push(&mut self, samples: &[f32]) -> Option<SpectrumFrame> {
        self.pending.extend(samples.iter().copied());
        if self.pending.len() < PAYLOAD_LEN {
            return None;
        }
        let mut frame = SpectrumFrame::new(FrameKind::Audio);
        for (slot, sample) in frame
            .payload_mut()
            .iter_mut()
            .zip(self.pending.drain(..PAYLOAD_LEN))
        {
            *slot = sample;
        }
        Some(frame)
    }
}

pub struct SignalDecoder {
    mode: DemodMode,
    filter: FilterBandwidth,
    channel_filters: Vec<(FilterBandwidth, BiquadCascade)>,
    demodulator: Demodulator,
    agc: AudioAgc,
    resampler: RealResampler,
    framer: AudioFramer,
    filtered: Vec<Complex<f32>>,
}

impl SignalDecoder {
    pub fn new() -> Self {
        let mode = DemodMode::default();
        Self {
            mode,
            filter: FilterBandwidth::default(),
            channel_filters: FilterBandwidth::ALL
                .into_iter()
                .map(|bw| (bw, build_channel_filter(bw)))
                .collect(),
            demodulator: Demodulator::for_mode(mode, CHANNEL_RATE),
            agc: AudioAgc::default(),
            resampler: RealResampler::new(f64::from(AUDIO_RATE) / f64::from(CHANNEL_RATE)),
            framer: AudioFramer::new(),
            filtered: Vec::new(),
        }
    }

    pub fn mode(&self) -> DemodMode {
        self.mode
    }

    pub fn channel_filter(&self) -> FilterBandwidth {
        self.filter
    }

    pub fn set_mode(&mut self, mode: DemodMode) {
        if mode != self.mode {
            self.mode = mode;
            self.demodulator = Demodulator::for_mode(mode, CHANNEL_RATE);
        }
    }

    pub fn set_channel_filter(&mut self, filter: FilterBandwidth) {
        self.filter = filter;
    }

    /// Run one block of demodulator-rate IQ through the chain. Returns an
    /// audio frame once 1024 audio samples have accumulated.
    pub fn demodulate(&mut self, samples: &[Complex<f32>]) -> Option<SpectrumFrame> {
        self.filtered.clear();
        self.filtered.extend_from_slice(samples);
        if self.mode != DemodMode::Fm {
            if let Some((_, filter)) = self
                .channel_filters
                .iter_mut()
                .find(|(bw, _)| *bw == self.filter)
            {
                filter.process_in_place(&mut self.filtered);
            }
        }

        let mut audio = self.demodulator.demodulate(&self.filtered);
        self.agc.process_in_place(&mut audio);
        let audio = self.resampler.process(&audio);
        self.framer.push(&audio)
    }
}

impl Default for SignalDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framer_emits_in_fifo_order() {
        let mut framer = AudioFramer::new();
        let sequence: Vec<f32> = (0..3000).map(|i| i as f32).collect();

        let mut frames = Vec::new();
        for chunk in sequence.chunks(500) {
            if let Some(frame) = framer.push(chunk) {
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 2);
        for (n, frame) in frames.iter().enumerate() {
            assert_eq!(frame.kind(), Some(FrameKind::Audio));
            let expected: Vec<f32> = (n * 1024..(n + 1) * 1024).map(|i| i as f32).collect();
            assert_eq!(frame.payload(), &expected[..]);
        }
        assert_eq!(framer.buffered(), 3000 - 2048);
    }

    #[test]
    fn test_framer_waits_for_full_frame() {
        let mut framer = AudioFramer::new();
        assert!(framer.push(&[0.1; 1023]).is_none());
        let frame = framer.push(&[0.2]).unwrap();
        assert_eq!(frame.payload()[1022], 0.1);
        assert_eq!(frame.payload()[1023], 0.2);
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_framer_emits_one_frame_per_call() {
        let mut framer = AudioFramer::new();
        assert!(framer.push(&[0.0; 3000]).is_some());
        assert_eq!(framer.buffered(), 3000 - 1024);
        assert!(framer.push(&[]).is_some());
        assert!(framer.push(&[]).is_none());
    }

    #[test]
    fn test_defaults() {
        let decoder = SignalDecoder::new();
        assert_eq!(decoder.mode(), DemodMode::Usb);
        assert_eq!(decoder.channel_filter(), FilterBandwidth::Hz3600);
    }

    #[test]
    fn test_decoder_frames_after_enough_audio() {
        let mut decoder = SignalDecoder::new();
        decoder.set_mode(DemodMode::Fm);
        // 480 IQ samples at 48 kS/s yield 80 audio samples at 8 kS/s.
        let block = vec![Complex::new(1.0_f32, 0.0); 480];
        let frames: Vec<_> = (0..13).filter_map(|_| decoder.demodulate(&block)).collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0]
            .payload()
            .iter()
            .all(|s| s.abs() <= 0.99));
    }

    #[test]
    fn test_set_filter_and_mode() {
        let mut decoder = SignalDecoder::new();
        decoder.set_channel_filter(FilterBandwidth::Hz500);
        decoder.set_mode(DemodMode::Lsb);
        assert_eq!(decoder.channel_filter(), FilterBandwidth::Hz500);
        assert_eq!(decoder.mode(), DemodMode::Lsb);
        let block = vec![Complex::new(0.5_f32, 0.25); 4800];
        let frame = decoder.demodulate(&block);
        assert!(frame.is_none());
    }
}
