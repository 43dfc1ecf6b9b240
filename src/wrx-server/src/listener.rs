// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Binary TCP listener for wrx-server.
//!
//! Inbound: `u32` little-endian byte length, then that many bytes of
//! little-endian `f32` control message. Outbound: fixed 4100-byte frames
//! written by a per-connection writer task.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use wrx_core::{ControlEvent, SessionId};
use wrx_protocol::{decode_message, ProtocolError, MAX_MESSAGE_BYTES};

use crate::registry::ControlInlet;
use crate::relay::{ConnectionTable, WRITER_QUEUE};

/// Events buffered from the connection tasks towards the ingress task.
pub const INGRESS_QUEUE: usize = 256;

const LIFECYCLE_RETRY: Duration = Duration::from_millis(1);

pub type IngressTx = mpsc::Sender<ControlEvent>;

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    if *shutdown_rx.borrow() {
        return;
    }
    while shutdown_rx.changed().await.is_ok() {
        if *shutdown_rx.borrow() {
            break;
        }
    }
}

/// Forward events from all connections into the dispatcher's control
/// queue. This task is the queue's only producer.
///
/// Connects and disconnects are retried until accepted; control messages
/// are dropped when the queue is full.
pub async fn run_ingress(
    mut rx: mpsc::Receiver<ControlEvent>,
    inlet: ControlInlet,
    shutdown_rx: watch::Receiver<bool>,
) {
    let shutdown = wait_for_shutdown(shutdown_rx);
    tokio::pin!(shutdown);
    loop {
        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = &mut shutdown => break,
        };
        if matches!(event, ControlEvent::ControlMessage { .. }) {
            let session = event.session();
            if !inlet.submit(event) {
                warn!("Control queue full, dropping message from {}", session);
            }
            continue;
        }
        let mut pending = event;
        while let Err(event) = inlet.try_submit(pending) {
            pending = event;
            tokio::select! {
                _ = tokio::time::sleep(LIFECYCLE_RETRY) => {}
                _ = &mut shutdown => return,
            }
        }
    }
    debug!("Ingress stopped");
}

/// Read one length-prefixed message body. `Ok(None)` on clean EOF.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let len = match reader.read_u32_le().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    if len > MAX_MESSAGE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            ProtocolError::TooLong(len),
        ));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Accept connections until shutdown. Each connection gets the next id;
/// connections beyond `max_sessions` are closed straight away.
pub async fn serve(
    listener: TcpListener,
    max_sessions: usize,
    ingress: IngressTx,
    connections: ConnectionTable,
    shutdown_rx: watch::Receiver<bool>,
) -> io::Result<()> {
    let mut next_id = 1u64;
    let shutdown = wait_for_shutdown(shutdown_rx.clone());
    tokio::pin!(shutdown);

    loop {
        let (socket, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = &mut shutdown => break,
        };
        if connections.len() >= max_sessions {
            warn!(
                "Refusing {}: {} of {} sessions in use",
                peer,
                connections.len(),
                max_sessions
            );
            drop(socket);
            continue;
        }

        let id = SessionId(next_id);
        next_id += 1;
        info!("Client {} connected: {}", id, peer);

        let ingress = ingress.clone();
        let connections = connections.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, id, peer, ingress, connections, shutdown_rx).await
            {
                error!("Client {} error: {:?}", id, e);
            }
        });
    }
    info!("Listener stopped");
    Ok(())
}

async fn handle_client(
    socket: TcpStream,
    id: SessionId,
    addr: SocketAddr,
    ingress: IngressTx,
    connections: ConnectionTable,
    shutdown_rx: watch::Receiver<bool>,
) -> io::Result<()> {
    let (mut reader, mut writer) = socket.into_split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<Bytes>(WRITER_QUEUE);
    connections.insert(id, frame_tx);

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = frame_rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                debug!("Client {} write failed: {}", id, e);
                break;
            }
        }
    });

    if ingress
        .send(ControlEvent::Connect { session: id, addr })
        .await
        .is_err()
    {
        connections.remove(id);
        writer_task.abort();
        return Ok(());
    }

    let shutdown = wait_for_shutdown(shutdown_rx);
    tokio::pin!(shutdown);
    let result = loop {
        let body = tokio::select! {
            body = read_message(&mut reader) => body,
            _ = &mut shutdown => break Ok(()),
        };
        let body = match body {
            Ok(Some(body)) => body,
            Ok(None) => {
                info!("Client {} disconnected", id);
                break Ok(());
            }
            Err(e) => break Err(e),
        };
        match decode_message(&body) {
            Ok(payload) => {
                let event = ControlEvent::ControlMessage {
                    session: id,
                    payload,
                };
                if ingress.send(event).await.is_err() {
                    break Ok(());
                }
            }
            Err(e) => warn!("Client {} sent a malformed message: {}", id, e),
        }
    };

    // The slot stays taken until the registry has the disconnect queued,
    // so a new connection cannot overtake it.
    let _ = ingress.send(ControlEvent::Disconnect { session: id }).await;
    connections.remove(id);
    writer_task.abort();
    result
}
