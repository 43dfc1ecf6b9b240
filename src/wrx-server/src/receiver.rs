// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Receiver read loop: pulls working-rate IQ blocks from the source and
//! fans them out to the wideband engine and the dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use num_complex::Complex;
use tracing::{info, warn};
use wrx_core::{Producer, RawSampleBlock, WORKING_RATE};
use wrx_dsp::IqSource;

use crate::band_control::BandControl;
use crate::registry::RawInlet;

/// Samples per read: 10 ms at the working rate.
pub const BLOCK_SIZE: usize = 4800;

pub struct Receiver {
    source: Box<dyn IqSource>,
    wideband: Producer<RawSampleBlock>,
    raw: RawInlet,
    band: Arc<BandControl>,
    block: Vec<Complex<f32>>,
    throttle: bool,
}

impl Receiver {
    /// `throttle` paces reads to real time, for sources that return
    /// immediately.
    pub fn new(
        source: Box<dyn IqSource>,
        wideband: Producer<RawSampleBlock>,
        raw: RawInlet,
        band: Arc<BandControl>,
        throttle: bool,
    ) -> Self {
        Self {
            source,
            wideband,
            raw,
            band,
            block: vec![Complex::new(0.0, 0.0); BLOCK_SIZE],
            throttle,
        }
    }

    /// Read one block and distribute it, then apply any parked band change.
    /// Returns the number of samples read.
    pub fn read_once(&mut self) -> Result<usize, String> {
        let n = self.source.read_into(&mut self.block)?;
        if n > 0 {
            let block = RawSampleBlock::new(self.block[..n].to_vec());
            if self.wideband.try_push(block.clone()).is_err() {
                warn!("Wideband input queue full, dropping block");
            }
            if !self.raw.submit(block) {
                warn!("Raw sample queue full, dropping block");
            }
        }
        if self.band.has_pending() {
            self.band.apply_pending(self.source.as_mut());
        }
        Ok(n)
    }

    pub fn spawn(mut self, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        let block_duration =
            Duration::from_secs_f64(BLOCK_SIZE as f64 / f64::from(WORKING_RATE));
        std::thread::Builder::new()
            .name("receiver".to_string())
            .spawn(move || {
                info!("Receiver started");
                while !stop.load(Ordering::Acquire) {
                    match self.read_once() {
                        Ok(0) => {
                            std::thread::sleep(Duration::from_millis(1));
                            continue;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!("IQ source read error: {}; retrying", e);
                            std::thread::sleep(Duration::from_millis(10));
                            continue;
                        }
                    }
                    if self.throttle {
                        std::thread::sleep(block_duration);
                    }
                }
                info!("Receiver stopped");
            })
    }
}
