// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! One connected viewer: its tuner, decoder and narrowband spectrum, run
//! on a dedicated thread fed by a private queue.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use wrx_core::{
    spsc, BandWindow, Consumer, ControlEvent, DemodMode, FrameKind, OutboundEnvelope, Producer,
    RawSampleBlock, SessionId, SpectrumFrame,
};
use wrx_dsp::spectrum::narrowband::NARROWBAND_FFT_SIZE;
use wrx_dsp::{NarrowbandSpectrumEngine, SignalDecoder, SpectrumError, Tuner};
use wrx_protocol::{ControlCommand, Credentials};

use crate::band_control::BandControl;
use crate::registry::SessionCounter;
use crate::relay::{send_outbound, OutboundTx};

/// Private queue depth of each session.
pub const SESSION_QUEUE: usize = 100;

const IDLE_SLEEP: Duration = Duration::from_micros(100);

/// Delay after which the configuration snapshot is sent once more, for
/// viewers that were not yet listening when the first one went out.
const SNAPSHOT_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn session thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("failed to set up narrowband spectrum: {0}")]
    Spectrum(#[from] SpectrumError),
}

/// Services every session shares.
#[derive(Clone)]
pub struct SessionContext {
    pub band: Arc<BandControl>,
    pub sessions: SessionCounter,
    pub outbound: OutboundTx,
    pub calibration_db: f32,
    pub spectrum_interval: Duration,
}

/// Receiver configuration as reported to one viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSnapshot {
    pub tuned_hz: u32,
    pub shift_hz: f32,
    pub mode: DemodMode,
    pub window: BandWindow,
    pub sessions: usize,
}

impl ConfigSnapshot {
    /// Payload layout: tuned frequency, shift, mode code, band start,
    /// band end, session count.
    pub fn to_frame(&self) -> SpectrumFrame {
        SpectrumFrame::with_payload(
            FrameKind::Config,
            &[
                self.tuned_hz as f32,
                self.shift_hz,
                f32::from(self.mode.code()),
                self.window.start_hz as f32,
                self.window.end_hz as f32,
                self.sessions as f32,
            ],
        )
    }
}

/// Registry-side handle of a running session.
pub struct SessionHandle {
    id: SessionId,
    addr: SocketAddr,
    inbox: Producer<ControlEvent>,
    identity: watch::Receiver<String>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn spawn(
        id: SessionId,
        addr: SocketAddr,
        ctx: SessionContext,
    ) -> Result<Self, SessionError> {
        let (inbox, queue) = spsc(SESSION_QUEUE);
        let (identity_tx, identity) = watch::channel(String::new());
        let session = Session::new(id, ctx, queue, identity_tx)?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name(format!("session-{}", id.0))
            .spawn(move || session.run(thread_stop))?;
        Ok(Self {
            id,
            addr,
            inbox,
            identity,
            stop,
            thread: Some(thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queue an event without waiting. Returns false when the queue is full.
    pub fn submit(&self, event: ControlEvent) -> bool {
        self.inbox.try_push(event).is_ok()
    }

    /// Identity from the viewer's most recent credentials.
    pub fn identity(&self) -> String {
        self.identity.borrow().clone()
    }

    /// Signal the thread to stop and wait for it.
    pub fn stop_and_join(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Session {} thread panicked", self.id);
            }
        }
    }
}

pub(crate) struct Session {
    id: SessionId,
    ctx: SessionContext,
    queue: Consumer<ControlEvent>,
    identity: watch::Sender<String>,
    credentials: Credentials,
    tuner: Tuner,
    decoder: SignalDecoder,
    narrowband: NarrowbandSpectrumEngine,
    started: Instant,
    last_snapshot: Option<ConfigSnapshot>,
    grace_sent: bool,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        ctx: SessionContext,
        queue: Consumer<ControlEvent>,
        identity: watch::Sender<String>,
    ) -> Result<Self, SpectrumError> {
        let narrowband = NarrowbandSpectrumEngine::new(
            NARROWBAND_FFT_SIZE,
            ctx.calibration_db,
            ctx.spectrum_interval,
        )?;
        Ok(Self {
            id,
            ctx,
            queue,
            identity,
            credentials: Credentials::default(),
            tuner: Tuner::new(),
            decoder: SignalDecoder::new(),
            narrowband,
            started: Instant::now(),
            last_snapshot: None,
            grace_sent: false,
        })
    }

    fn run(mut self, stop: Arc<AtomicBool>) {
        debug!("Session {} started", self.id);
        while !stop.load(Ordering::Acquire) {
            if !self.poll_once(Instant::now()) {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        debug!("Session {} stopped", self.id);
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Handle one queued event, or push the configuration snapshot when
    /// the queue is empty. Returns true when an event was handled.
    pub(crate) fn poll_once(&mut self, now: Instant) -> bool {
        match self.queue.try_pop() {
            Some(ControlEvent::ControlMessage { payload, .. }) => {
                self.handle_message(&payload);
                true
            }
            Some(ControlEvent::RawRelay { block, .. }) => {
                self.handle_block(&block, now);
                true
            }
            Some(other) => {
                debug!("Session {} ignoring {:?}", self.id, other);
                true
            }
            None => {
                self.push_snapshot(now);
                false
            }
        }
    }

    fn handle_message(&mut self, payload: &[f32]) {
        let command = match ControlCommand::decode(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!("Session {}: bad control message: {}", self.id, e);
                return;
            }
        };
        match command {
            ControlCommand::SetFrequency(offset_hz) => {
                self.tuner.set_frequency_offset(offset_hz);
                debug!(
                    "Session {} tuned to shift {} Hz",
                    self.id,
                    self.tuner.frequency_shift()
                );
            }
            ControlCommand::SetBand(code) => match self.ctx.band.request(code) {
                Ok(true) => info!("Session {} requested band {}", self.id, code),
                Ok(false) => info!(
                    "Session {}: band change to {} ignored, {} viewers connected",
                    self.id,
                    code,
                    self.ctx.sessions.get()
                ),
                Err(e) => warn!("Session {}: {}", self.id, e),
            },
            ControlCommand::SetMode(mode) => {
                self.decoder.set_mode(mode);
                debug!("Session {} mode {}", self.id, mode);
            }
            ControlCommand::SetFilter(bw) => {
                self.decoder.set_channel_filter(bw);
                debug!("Session {} filter {} Hz", self.id, bw.hz());
            }
            ControlCommand::SetCredentials(credentials) => {
                self.identity.send_replace(credentials.identity.clone());
                self.credentials = credentials;
                info!(
                    "Session {} identified as '{}' (authenticated: {})",
                    self.id,
                    self.credentials.identity,
                    self.is_authenticated()
                );
            }
        }
    }

    fn handle_block(&mut self, block: &RawSampleBlock, now: Instant) {
        let channel = self.tuner.tune(block.samples());
        let authenticated = self.is_authenticated();
        if let Some(audio) = self.decoder.demodulate(&channel) {
            self.send(audio, authenticated);
        }
        if authenticated {
            if let Some(spectrum) = self.narrowband.push(&channel, now) {
                self.send(spectrum, true);
            }
        }
    }

    fn snapshot(&self) -> ConfigSnapshot {
        let window = self.ctx.band.window();
        ConfigSnapshot {
            tuned_hz: window.tuned_hz(),
            shift_hz: self.tuner.frequency_shift(),
            mode: self.decoder.mode(),
            window,
            sessions: self.ctx.sessions.get(),
        }
    }

    fn push_snapshot(&mut self, now: Instant) {
        let snapshot = self.snapshot();
        let grace_due =
            !self.grace_sent && now.saturating_duration_since(self.started) >= SNAPSHOT_GRACE;
        if self.last_snapshot == Some(snapshot) && !grace_due {
            return;
        }
        if grace_due {
            self.grace_sent = true;
        }
        self.last_snapshot = Some(snapshot);
        self.send(snapshot.to_frame(), self.is_authenticated());
    }

    fn send(&self, frame: SpectrumFrame, authenticated: bool) {
        send_outbound(
            &self.ctx.outbound,
            OutboundEnvelope::unicast(self.id, frame, authenticated),
        );
    }
}
