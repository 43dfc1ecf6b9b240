// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::frame::SpectrumFrame;

/// Connection identity assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One receiver read at the working rate.
///
/// The samples are immutable once captured, so every consumer (wideband
/// engine, each session) shares the same allocation.
#[derive(Debug, Clone)]
pub struct RawSampleBlock {
    samples: Arc<[Complex<f32>]>,
}

impl RawSampleBlock {
    pub fn new(samples: Vec<Complex<f32>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    pub fn samples(&self) -> &[Complex<f32>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Control-plane event routed by the dispatcher.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    Connect {
        session: SessionId,
        addr: SocketAddr,
    },
    Disconnect {
        session: SessionId,
    },
    /// Raw inbound float message; slot 0 is the command code.
    ControlMessage {
        session: SessionId,
        payload: Vec<f32>,
    },
    RawRelay {
        session: SessionId,
        block: RawSampleBlock,
    },
}

impl ControlEvent {
    pub fn session(&self) -> SessionId {
        match self {
            ControlEvent::Connect { session, .. }
            | ControlEvent::Disconnect { session }
            | ControlEvent::ControlMessage { session, .. }
            | ControlEvent::RawRelay { session, .. } => *session,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Session(SessionId),
    All,
}

/// A frame on its way to the transport.
///
/// `authenticated` is only consulted for unicast frames: when false the
/// transport sends an auth-rejected frame in place of the payload.
#[derive(Debug, Clone)]
pub struct OutboundEnvelope {
    pub frame: SpectrumFrame,
    pub target: Target,
    pub authenticated: bool,
}

impl OutboundEnvelope {
    pub fn unicast(session: SessionId, frame: SpectrumFrame, authenticated: bool) -> Self {
        Self {
            frame,
            target: Target::Session(session),
            authenticated,
        }
    }

    pub fn broadcast(frame: SpectrumFrame) -> Self {
        Self {
            frame,
            target: Target::All,
            authenticated: true,
        }
    }
}
