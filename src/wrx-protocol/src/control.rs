// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Inbound control commands.
//!
//! Slot 0 of a control message selects the command:
//!
//! | code | command          | argument                                  |
//! |------|------------------|-------------------------------------------|
//! | 0    | set tuning offset| Hz from the start of the band window      |
//! | 1    | set band         | band code                                 |
//! | 2    | set mode         | 0 = LSB, 1 = USB, 2 = FM                  |
//! | 3    | set filter       | 500, 1800, 2700 or 3600 Hz                |
//! | 4    | set credentials  | byte codes of `identity:secret`           |

use wrx_core::{DemodMode, FilterBandwidth};

use crate::ProtocolError;

const MIN_IDENTITY_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetFrequency(f32),
    SetBand(u32),
    SetMode(DemodMode),
    SetFilter(FilterBandwidth),
    SetCredentials(Credentials),
}

impl ControlCommand {
    pub fn decode(message: &[f32]) -> Result<Self, ProtocolError> {
        let (&code, args) = message.split_first().ok_or(ProtocolError::Empty)?;
        if code.fract() != 0.0 || !(0.0..=4.0).contains(&code) {
            return Err(ProtocolError::UnknownCommand(code));
        }
        let code = code as u8;
        if code == 4 {
            return Credentials::decode(args).map(ControlCommand::SetCredentials);
        }

        let arg = *args.first().ok_or(ProtocolError::MissingArgument(code))?;
        match code {
            0 if arg.is_finite() => Ok(ControlCommand::SetFrequency(arg)),
            0 => Err(ProtocolError::InvalidFrequency(arg)),
            1 => {
                let band = arg.round();
                if !(1.0..=u32::MAX as f32).contains(&band) {
                    return Err(ProtocolError::InvalidBand(arg));
                }
                Ok(ControlCommand::SetBand(band as u32))
            }
            2 => {
                let mode = (arg.fract() == 0.0 && (0.0..=255.0).contains(&arg))
                    .then(|| DemodMode::from_code(arg as u8))
                    .flatten()
                    .ok_or(ProtocolError::InvalidMode(arg))?;
                Ok(ControlCommand::SetMode(mode))
            }
            _ => {
                let bw = (arg.fract() == 0.0 && arg >= 0.0)
                    .then(|| FilterBandwidth::from_hz(arg as u32))
                    .flatten()
                    .ok_or(ProtocolError::InvalidFilter(arg))?;
                Ok(ControlCommand::SetFilter(bw))
            }
        }
    }
}

/// Viewer identity and secret supplied by command 4.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Parse byte codes (one per float, optionally zero terminated).
    /// The text is split at the first `:`.
    pub fn decode(bytes: &[f32]) -> Result<Self, ProtocolError> {
        let mut text = String::with_capacity(bytes.len());
        for &value in bytes {
            let rounded = value.round();
            if !(0.0..=255.0).contains(&rounded) {
                return Err(ProtocolError::InvalidCredentialByte(value));
            }
            let byte = rounded as u8;
            if byte == 0 {
                break;
            }
            text.push(char::from(byte));
        }
        let (identity, secret) = text
            .split_once(':')
            .ok_or(ProtocolError::MissingDelimiter)?;
        Ok(Self::new(identity, secret))
    }

    /// Placeholder credential check: the secret must repeat an identity
    /// of at least three characters.
    pub fn is_authenticated(&self) -> bool {
        self.identity.chars().count() >= MIN_IDENTITY_LEN && self.secret == self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(text: &str) -> Vec<f32> {
        std::iter::once(4.0)
            .chain(text.bytes().map(f32::from))
            .collect()
    }

    #[test]
    fn test_decode_frequency() {
        assert_eq!(
            ControlCommand::decode(&[0.0, 123_456.0]).unwrap(),
            ControlCommand::SetFrequency(123_456.0)
        );
    }

    #[test]
    fn test_decode_rejects_non_finite_frequency() {
        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                ControlCommand::decode(&[0.0, value]),
                Err(ProtocolError::InvalidFrequency(_))
            ));
        }
    }

    #[test]
    fn test_decode_band_rounds() {
        assert_eq!(
            ControlCommand::decode(&[1.0, 40.2]).unwrap(),
            ControlCommand::SetBand(40)
        );
        assert!(ControlCommand::decode(&[1.0, -3.0]).is_err());
    }

    #[test]
    fn test_decode_mode() {
        assert_eq!(
            ControlCommand::decode(&[2.0, 0.0]).unwrap(),
            ControlCommand::SetMode(DemodMode::Lsb)
        );
        assert_eq!(
            ControlCommand::decode(&[2.0, 2.0]).unwrap(),
            ControlCommand::SetMode(DemodMode::Fm)
        );
        assert_eq!(
            ControlCommand::decode(&[2.0, 7.0]),
            Err(ProtocolError::InvalidMode(7.0))
        );
    }

    #[test]
    fn test_decode_filter() {
        assert_eq!(
            ControlCommand::decode(&[3.0, 500.0]).unwrap(),
            ControlCommand::SetFilter(FilterBandwidth::Hz500)
        );
        assert_eq!(
            ControlCommand::decode(&[3.0, 1000.0]),
            Err(ProtocolError::InvalidFilter(1000.0))
        );
    }

    #[test]
    fn test_decode_credentials() {
        let cmd = ControlCommand::decode(&text_message("abc:abc")).unwrap();
        assert_eq!(
            cmd,
            ControlCommand::SetCredentials(Credentials::new("abc", "abc"))
        );
    }

    #[test]
    fn test_credentials_split_at_first_colon() {
        let creds = Credentials::decode(&text_message("ab:c:d")[1..]).unwrap();
        assert_eq!(creds.identity, "ab");
        assert_eq!(creds.secret, "c:d");
    }

    #[test]
    fn test_credentials_stop_at_terminator() {
        let mut msg = text_message("abc:abc");
        msg.extend([0.0, 65.0, 66.0]);
        let creds = Credentials::decode(&msg[1..]).unwrap();
        assert_eq!(creds.secret, "abc");
    }

    #[test]
    fn test_credentials_without_delimiter_fail() {
        assert_eq!(
            ControlCommand::decode(&text_message("abcabc")),
            Err(ProtocolError::MissingDelimiter)
        );
    }

    #[test]
    fn test_authentication_predicate() {
        assert!(Credentials::new("abc", "abc").is_authenticated());
        assert!(!Credentials::new("ab", "ab").is_authenticated());
        assert!(!Credentials::new("abc", "abd").is_authenticated());
        assert!(!Credentials::default().is_authenticated());
    }

    #[test]
    fn test_rejects_unknown_and_empty() {
        assert_eq!(ControlCommand::decode(&[]), Err(ProtocolError::Empty));
        assert_eq!(
            ControlCommand::decode(&[9.0, 1.0]),
            Err(ProtocolError::UnknownCommand(9.0))
        );
        assert_eq!(
            ControlCommand::decode(&[2.0]),
            Err(ProtocolError::MissingArgument(2))
        );
    }
}
