//! Per-connection read/write pumps.
//!
//! Each live connection runs two loops: the read pump drains inbound
//! frames under a rolling liveness deadline and hands decoded events to
//! the [`EventRouter`]; the write pump drains the connection's outbound
//! queue and emits heartbeat pings. The pumps are generic over the split
//! socket halves so tests can drive them with in-memory streams.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};

use super::{ConnectionId, HubHandle, router::EventRouter};

/// Maximum silence (no frame, no pong) before a peer is presumed dead.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Heartbeat ping cadence. Must stay under [`CLIENT_TIMEOUT`] with enough
/// margin for a ping/pong round trip, or live peers would be reaped.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(54);

/// Deadline for one transport write.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Drain inbound frames until transport error, close, or liveness expiry,
/// dispatching each text frame to the router. On exit the connection is
/// unregistered from the hub.
pub async fn read_pump<S>(
    mut stream: S,
    connection_id: ConnectionId,
    user_id: String,
    router: Arc<EventRouter>,
    hub: HubHandle,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = match timeout(CLIENT_TIMEOUT, stream.next()).await {
            Err(_) => {
                tracing::warn!(
                    "connection {} of user '{}' silent for {:?}, presuming dead",
                    connection_id,
                    user_id,
                    CLIENT_TIMEOUT
                );
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!(
                    "read error on connection {} of user '{}': {}",
                    connection_id,
                    user_id,
                    e
                );
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => router.dispatch(&user_id, text.as_str()).await,
            Message::Close(_) => {
                tracing::debug!("user '{}' closed connection {}", user_id, connection_id);
                break;
            }
            // Any inbound frame refreshes the liveness deadline; pings are
            // answered by the protocol layer itself.
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    // Either pump may lose the race to tear down; unregistering twice is
    // harmless.
    hub.unregister(connection_id);
}

/// Drain the outbound queue into the socket and emit heartbeat pings.
/// A closed queue means the hub dropped this connection: a close frame is
/// written and the pump exits. Any write failure or timeout exits as well.
pub async fn write_pump<W>(mut sink: W, mut frames: mpsc::Receiver<String>)
where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(frame) => {
                    if write(&mut sink, Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    // Queue closed: the hub removed this connection.
                    let _ = write(&mut sink, Message::Close(None)).await;
                    break;
                }
            },
            _ = heartbeat.tick() => {
                if write(&mut sink, Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn write<W>(sink: &mut W, message: Message) -> Result<(), ()>
where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    match timeout(WRITE_TIMEOUT, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!("write error: {}", e);
            Err(())
        }
        Err(_) => {
            tracing::warn!("write timed out after {:?}", WRITE_TIMEOUT);
            Err(())
        }
    }
}
