// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use wrx_core::{spsc, BandWindowCell, Consumer, Producer, RawSampleBlock};
use wrx_dsp::WidebandSpectrumEngine;

use crate::registry::WidebandInlet;

pub const WIDEBAND_INPUT_QUEUE: usize = 1024;

const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Runs the wideband spectrum engine on its own thread and hands the
/// frames to the dispatcher for broadcast.
pub struct WidebandService {
    input: Consumer<RawSampleBlock>,
    engine: WidebandSpectrumEngine,
    window: Arc<BandWindowCell>,
    frames: WidebandInlet,
}

impl WidebandService {
    /// Returns the service and the producer half of its input queue.
    pub fn new(
        engine: WidebandSpectrumEngine,
        window: Arc<BandWindowCell>,
        frames: WidebandInlet,
    ) -> (Self, Producer<RawSampleBlock>) {
        let (tx, input) = spsc(WIDEBAND_INPUT_QUEUE);
        (
            Self {
                input,
                engine,
                window,
                frames,
            },
            tx,
        )
    }

    pub fn poll_once(&mut self, now: Instant) -> bool {
        let Some(block) = self.input.try_pop() else {
            return false;
        };
        let window = self.window.load();
        if let Some(frame) = self.engine.push(block.samples(), window, now) {
            if !self.frames.submit(frame) {
                warn!("Wideband frame queue full, dropping frame");
            }
        }
        true
    }

    pub fn spawn(mut self, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("wideband".to_string())
            .spawn(move || {
                info!("Wideband spectrum started");
                while !stop.load(Ordering::Acquire) {
                    if !self.poll_once(Instant::now()) {
                        std::thread::sleep(IDLE_SLEEP);
                    }
                }
                info!("Wideband spectrum stopped");
            })
    }
}
