// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Band selection shared by all sessions.
//!
//! A session may only request a band change while it is the sole viewer.
//! The request is parked and later installed by the receiver thread, which
//! also retunes the front end, so the window and the hardware change
//! together between two reads.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::{info, warn};
use wrx_core::{BandError, BandWindow, BandWindowCell};
use wrx_dsp::IqSource;

use crate::registry::SessionCounter;

const NO_PENDING: u32 = 0;

pub struct BandControl {
    window: Arc<BandWindowCell>,
    pending: AtomicU32,
    sessions: SessionCounter,
}

impl BandControl {
    pub fn new(window: Arc<BandWindowCell>, sessions: SessionCounter) -> Self {
        Self {
            window,
            pending: AtomicU32::new(NO_PENDING),
            sessions,
        }
    }

    pub fn window(&self) -> BandWindow {
        self.window.load()
    }

    /// Park a band change. Returns `Ok(false)` when other viewers are
    /// connected and the request was ignored.
    pub fn request(&self, code: u32) -> Result<bool, BandError> {
        BandWindow::for_band(code)?;
        if self.sessions.get() != 1 {
            return Ok(false);
        }
        self.pending.store(code, Ordering::Release);
        Ok(true)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) != NO_PENDING
    }

    /// Install the parked band, if any, and retune `source` to its centre.
    /// Returns the new window.
    pub fn apply_pending(&self, source: &mut dyn IqSource) -> Option<BandWindow> {
        let code = self.pending.swap(NO_PENDING, Ordering::AcqRel);
        if code == NO_PENDING {
            return None;
        }
        let window = match BandWindow::for_band(code) {
            Ok(window) => window,
            Err(e) => {
                warn!("Dropping band change: {}", e);
                return None;
            }
        };
        self.window.store(window);
        if let Err(e) = source.retune(window.tuned_hz()) {
            warn!("Receiver retune to {} Hz failed: {}", window.tuned_hz(), e);
        }
        info!("Band {} selected ({})", code, window);
        Some(window)
    }
}
