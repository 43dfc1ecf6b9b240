// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod band;
pub mod event;
pub mod frame;
pub mod mode;
pub mod queue;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use band::{BandError, BandWindow, BandWindowCell};
pub use event::{ControlEvent, OutboundEnvelope, RawSampleBlock, SessionId, Target};
pub use frame::{FrameKind, SpectrumFrame, FRAME_LEN, PAYLOAD_LEN};
pub use mode::{DemodMode, FilterBandwidth};
pub use queue::{spsc, Consumer, Producer};

/// Receiver working rate after hardware decimation (samples per second).
pub const WORKING_RATE: u32 = 480_000;

/// Demodulator stage rate produced by the tuner.
pub const CHANNEL_RATE: u32 = 48_000;

/// Audio output rate.
pub const AUDIO_RATE: u32 = 8_000;
