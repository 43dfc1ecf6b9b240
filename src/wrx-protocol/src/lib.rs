// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Wire format shared by the server transport and its tests.

pub mod codec;
pub mod control;
pub mod roster;

pub use codec::{decode_message, encode_frame, FRAME_BYTES, MAX_MESSAGE_BYTES};
pub use control::{ControlCommand, Credentials};
pub use roster::{pack_roster, unpack_roster};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("empty control message")]
    Empty,
    #[error("unknown control command {0}")]
    UnknownCommand(f32),
    #[error("control command {0} is missing its argument")]
    MissingArgument(u8),
    #[error("invalid tuning offset {0}")]
    InvalidFrequency(f32),
    #[error("invalid demodulation mode {0}")]
    InvalidMode(f32),
    #[error("unsupported filter bandwidth {0}")]
    InvalidFilter(f32),
    #[error("invalid band code {0}")]
    InvalidBand(f32),
    #[error("credentials must be formatted as identity:secret")]
    MissingDelimiter,
    #[error("credential byte {0} is out of range")]
    InvalidCredentialByte(f32),
    #[error("message length {0} is not a whole number of floats")]
    Misaligned(usize),
    #[error("message length {0} exceeds limit")]
    TooLong(usize),
}
