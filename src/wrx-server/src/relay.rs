// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Outbound frame relay: envelopes from the dispatcher and the sessions
//! are encoded once and handed to the writer queue of each addressed
//! connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use wrx_core::{FrameKind, OutboundEnvelope, SessionId, SpectrumFrame, Target};
use wrx_protocol::encode_frame;

/// Envelopes buffered between the producers and the relay task.
pub const OUTBOUND_QUEUE: usize = 1024;

/// Encoded frames buffered per connection before frames are dropped.
pub const WRITER_QUEUE: usize = 64;

pub type OutboundTx = mpsc::Sender<OutboundEnvelope>;
pub type OutboundRx = mpsc::Receiver<OutboundEnvelope>;

pub fn outbound_channel() -> (OutboundTx, OutboundRx) {
    mpsc::channel(OUTBOUND_QUEUE)
}

/// Queue an envelope for the relay without waiting. Returns false when it
/// was dropped.
pub fn send_outbound(tx: &OutboundTx, envelope: OutboundEnvelope) -> bool {
    match tx.try_send(envelope) {
        Ok(()) => true,
        Err(TrySendError::Full(envelope)) => {
            warn!("Outbound queue full, dropping frame for {:?}", envelope.target);
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// The frame that actually goes on the wire for `envelope`. Unicast frames
/// for an unauthenticated viewer are replaced by an auth-rejected frame.
pub fn wire_frame(envelope: OutboundEnvelope) -> SpectrumFrame {
    match envelope.target {
        Target::Session(_) if !envelope.authenticated => SpectrumFrame::new(FrameKind::AuthRejected),
        _ => envelope.frame,
    }
}

/// Writer queues of all open connections, keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    inner: Arc<Mutex<HashMap<SessionId, mpsc::Sender<Bytes>>>>,
}

impl ConnectionTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, mpsc::Sender<Bytes>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, id: SessionId, writer: mpsc::Sender<Bytes>) {
        self.lock().insert(id, writer);
    }

    pub fn remove(&self, id: SessionId) {
        self.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Hand `bytes` to the addressed connections. Returns how many
    /// accepted it.
    pub fn deliver(&self, target: Target, bytes: Bytes) -> usize {
        let table = self.lock();
        let mut delivered = 0;
        let mut offer = |id: &SessionId, writer: &mpsc::Sender<Bytes>| {
            match writer.try_send(bytes.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => debug!("Writer queue of {} full, dropping frame", id),
                Err(TrySendError::Closed(_)) => {}
            }
        };
        match target {
            Target::All => table.iter().for_each(|(id, writer)| offer(id, writer)),
            Target::Session(id) => match table.get(&id) {
                Some(writer) => offer(&id, writer),
                None => debug!("No connection for {}, dropping frame", id),
            },
        }
        delivered
    }
}

/// Drain outbound envelopes until every producer is gone or shutdown is
/// signalled.
pub async fn run_relay(
    mut rx: OutboundRx,
    connections: ConnectionTable,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let target = envelope.target;
                let bytes = encode_frame(&wire_frame(envelope));
                connections.deliver(target, bytes);
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    info!("Outbound relay stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrx_protocol::FRAME_BYTES;

    fn audio_frame() -> SpectrumFrame {
        SpectrumFrame::with_payload(FrameKind::Audio, &[0.5; 16])
    }

    #[test]
    fn test_unauthenticated_unicast_is_rejected() {
        let frame = wire_frame(OutboundEnvelope::unicast(SessionId(1), audio_frame(), false));
        assert_eq!(frame.kind(), Some(FrameKind::AuthRejected));
        assert!(frame.payload().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_authenticated_unicast_passes() {
        let frame = wire_frame(OutboundEnvelope::unicast(SessionId(1), audio_frame(), true));
        assert_eq!(frame, audio_frame());
    }

    #[test]
    fn test_broadcast_ignores_auth() {
        let mut envelope = OutboundEnvelope::broadcast(audio_frame());
        envelope.authenticated = false;
        assert_eq!(wire_frame(envelope).kind(), Some(FrameKind::Audio));
    }

    #[test]
    fn test_deliver_targets() {
        let table = ConnectionTable::default();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        table.insert(SessionId(1), tx1);
        table.insert(SessionId(2), tx2);
        assert_eq!(table.len(), 2);

        let bytes = encode_frame(&audio_frame());
        assert_eq!(table.deliver(Target::All, bytes.clone()), 2);
        assert_eq!(table.deliver(Target::Session(SessionId(2)), bytes.clone()), 1);
        assert_eq!(table.deliver(Target::Session(SessionId(7)), bytes), 0);

        assert_eq!(rx1.try_recv().unwrap().len(), FRAME_BYTES);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());

        table.remove(SessionId(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_full_writer_drops() {
        let table = ConnectionTable::default();
        let (tx, _rx) = mpsc::channel(1);
        table.insert(SessionId(1), tx);
        let bytes = encode_frame(&audio_frame());
        assert_eq!(table.deliver(Target::All, bytes.clone()), 1);
        assert_eq!(table.deliver(Target::All, bytes), 0);
    }

    #[test]
    fn test_send_outbound_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(send_outbound(&tx, OutboundEnvelope::broadcast(audio_frame())));
        assert!(!send_outbound(&tx, OutboundEnvelope::broadcast(audio_frame())));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_relay_substitutes_and_stops() {
        let table = ConnectionTable::default();
        let (writer_tx, mut writer_rx) = mpsc::channel(4);
        table.insert(SessionId(3), writer_tx);
        let (tx, rx) = outbound_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay = tokio::spawn(run_relay(rx, table, shutdown_rx));

        tx.send(OutboundEnvelope::unicast(SessionId(3), audio_frame(), false))
            .await
            .unwrap();
        let bytes = writer_rx.recv().await.unwrap();
        assert_eq!(bytes.len(), FRAME_BYTES);
        assert_eq!(&bytes[..4], &5.0_f32.to_le_bytes());

        shutdown_tx.send(true).unwrap();
        relay.await.unwrap();
    }
}
