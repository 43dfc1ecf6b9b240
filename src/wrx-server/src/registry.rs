// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Session registry and dispatcher.
//!
//! The registry owns every session and is the single consumer of three
//! queues: control events from the transport, raw sample blocks from the
//! receiver and finished wideband frames. Each queue has exactly one
//! producer, held by the matching inlet.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use wrx_core::{
    spsc, Consumer, ControlEvent, OutboundEnvelope, Producer, RawSampleBlock, SessionId,
    SpectrumFrame,
};
use wrx_protocol::pack_roster;

use crate::relay::send_outbound;
use crate::session::{SessionContext, SessionHandle};

pub const CONTROL_QUEUE: usize = 100;
pub const RAW_QUEUE: usize = 1024;
pub const WIDEBAND_QUEUE: usize = 100;

const IDLE_SLEEP: Duration = Duration::from_micros(100);
const ROSTER_INTERVAL: Duration = Duration::from_secs(1);

/// Number of live sessions, readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct SessionCounter(Arc<AtomicUsize>);

impl SessionCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, count: usize) {
        self.0.store(count, Ordering::Release);
    }
}

pub struct ControlInlet(Producer<ControlEvent>);

impl ControlInlet {
    pub(crate) fn new(producer: Producer<ControlEvent>) -> Self {
        Self(producer)
    }

    /// Queue an event, handing it back when the queue is full.
    pub fn try_submit(&self, event: ControlEvent) -> Result<(), ControlEvent> {
        self.0.try_push(event)
    }

    pub fn submit(&self, event: ControlEvent) -> bool {
        self.try_submit(event).is_ok()
    }
}

pub struct RawInlet(Producer<RawSampleBlock>);

impl RawInlet {
    pub fn submit(&self, block: RawSampleBlock) -> bool {
        self.0.try_push(block).is_ok()
    }
}

pub struct WidebandInlet(Producer<SpectrumFrame>);

impl WidebandInlet {
    pub fn submit(&self, frame: SpectrumFrame) -> bool {
        self.0.try_push(frame).is_ok()
    }
}

/// Producer halves of the registry queues, handed out once at startup.
pub struct RegistryInlets {
    pub control: ControlInlet,
    pub raw: RawInlet,
    pub wideband: WidebandInlet,
}

pub struct SessionRegistry {
    ctx: SessionContext,
    max_sessions: usize,
    control_rx: Consumer<ControlEvent>,
    raw_rx: Consumer<RawSampleBlock>,
    wideband_rx: Consumer<SpectrumFrame>,
    sessions: BTreeMap<SessionId, SessionHandle>,
    last_roster: Option<Instant>,
}

impl SessionRegistry {
    pub fn new(ctx: SessionContext, max_sessions: usize) -> (Self, RegistryInlets) {
        let (control_tx, control_rx) = spsc(CONTROL_QUEUE);
        let (raw_tx, raw_rx) = spsc(RAW_QUEUE);
        let (wideband_tx, wideband_rx) = spsc(WIDEBAND_QUEUE);
        let registry = Self {
            ctx,
            max_sessions,
            control_rx,
            raw_rx,
            wideband_rx,
            sessions: BTreeMap::new(),
            last_roster: None,
        };
        let inlets = RegistryInlets {
            control: ControlInlet::new(control_tx),
            raw: RawInlet(raw_tx),
            wideband: WidebandInlet(wideband_tx),
        };
        (registry, inlets)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// One dispatch cycle. Returns true when any queue yielded work.
    pub fn poll_once(&mut self, now: Instant) -> bool {
        let mut busy = false;

        if let Some(event) = self.control_rx.try_pop() {
            busy = true;
            self.handle_control(event);
        }

        if let Some(frame) = self.wideband_rx.try_pop() {
            busy = true;
            send_outbound(&self.ctx.outbound, OutboundEnvelope::broadcast(frame));
        }

        if let Some(block) = self.raw_rx.try_pop() {
            busy = true;
            self.relay_block(block);
        }

        if self
            .last_roster
            .map_or(true, |last| now.saturating_duration_since(last) >= ROSTER_INTERVAL)
        {
            self.last_roster = Some(now);
            self.broadcast_roster();
        }

        busy
    }

    /// Dispatch until `stop` is set, then stop and join every session.
    pub fn run(mut self, stop: Arc<AtomicBool>) {
        info!("Dispatcher started (max {} sessions)", self.max_sessions);
        while !stop.load(Ordering::Acquire) {
            if !self.poll_once(Instant::now()) {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        self.shutdown();
        info!("Dispatcher stopped");
    }

    pub fn spawn(self, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || self.run(stop))
    }

    /// Stop and join all sessions.
    pub fn shutdown(&mut self) {
        let sessions = std::mem::take(&mut self.sessions);
        self.ctx.sessions.set(0);
        for (_, session) in sessions {
            session.stop_and_join();
        }
    }

    fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Connect { session, addr } => {
                if self.contains(session) {
                    warn!("Session {} already connected", session);
                    return;
                }
                if self.sessions.len() >= self.max_sessions {
                    warn!(
                        "Session limit of {} reached, dropping {} from {}",
                        self.max_sessions, session, addr
                    );
                    return;
                }
                match SessionHandle::spawn(session, addr, self.ctx.clone()) {
                    Ok(handle) => {
                        self.sessions.insert(session, handle);
                        self.ctx.sessions.set(self.sessions.len());
                        info!(
                            "Session {} connected from {} ({} active)",
                            session,
                            addr,
                            self.sessions.len()
                        );
                    }
                    Err(e) => warn!("Session {} from {} not started: {}", session, addr, e),
                }
            }
            ControlEvent::Disconnect { session } => match self.sessions.remove(&session) {
                Some(handle) => {
                    self.ctx.sessions.set(self.session_count());
                    let addr = handle.addr();
                    handle.stop_and_join();
                    info!(
                        "Session {} from {} disconnected ({} active)",
                        session,
                        addr,
                        self.session_count()
                    );
                }
                None => debug!("Disconnect for unknown session {}", session),
            },
            event @ ControlEvent::ControlMessage { .. } => {
                let id = event.session();
                match self.sessions.get(&id) {
                    Some(handle) => {
                        if !handle.submit(event) {
                            warn!("Session {} queue full, dropping control message", id);
                        }
                    }
                    None => warn!("Control message for unknown session {}", id),
                }
            }
            ControlEvent::RawRelay { session, .. } => {
                debug!("Unexpected raw relay for {} on control queue", session);
            }
        }
    }

    fn relay_block(&self, block: RawSampleBlock) {
        for (&id, handle) in &self.sessions {
            let event = ControlEvent::RawRelay {
                session: id,
                block: block.clone(),
            };
            if !handle.submit(event) {
                warn!("Session {} queue full, dropping sample block", id);
            }
        }
    }

    fn broadcast_roster(&self) {
        let identities: Vec<String> = self.sessions.values().map(|s| s.identity()).collect();
        let frame = pack_roster(identities.iter().map(String::as_str));
        send_outbound(&self.ctx.outbound, OutboundEnvelope::broadcast(frame));
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
