// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Signal processing for the receiver: per-session tuning and
//! demodulation, and the spectrum engines.

pub mod agc;
pub mod decoder;
pub mod demod;
pub mod dsp;
pub mod source;
pub mod spectrum;
pub mod tuner;

pub use decoder::{AudioFramer, SignalDecoder};
pub use source::{IqSource, MockIqSource, ToneIqSource};
pub use spectrum::narrowband::NarrowbandSpectrumEngine;
pub use spectrum::wideband::WidebandSpectrumEngine;
pub use spectrum::{RateLimiter, SpectrumError};
pub use tuner::Tuner;
