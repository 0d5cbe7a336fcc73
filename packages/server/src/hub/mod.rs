//! Connection hub: the registry of live WebSocket connections and the
//! broadcast protocol.
//!
//! A single worker task exclusively owns the membership map. Every
//! register/unregister/broadcast flows through one command channel, so
//! membership mutations and broadcast iteration are serialized and never
//! interleave: a connection is never sent to after removal, and nothing
//! here ever races on shared state. The worker performs no transport I/O;
//! it only moves frames onto per-connection bounded queues.

pub mod connection;
pub mod router;

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Unique id of one live connection, valid for the process lifetime.
pub type ConnectionId = Uuid;

/// Capacity of a connection's outbound frame queue. A recipient that falls
/// this many frames behind is disconnected rather than allowed to stall
/// the broadcaster.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// One live connection as registered with the hub: its identity plus the
/// sending half of its outbound frame queue.
///
/// The hub holds the only `frame_tx`; removing a connection from the
/// membership map drops the sender and thereby closes the queue exactly
/// once. The write pump owns the receiving half.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: String,
    frame_tx: mpsc::Sender<String>,
}

impl Connection {
    /// Allocate a connection with a fresh id and a bounded outbound queue,
    /// returning the receiving half for the write pump.
    pub fn new(user_id: impl Into<String>) -> (Self, mpsc::Receiver<String>) {
        Self::with_queue_capacity(user_id, OUTBOUND_QUEUE_CAPACITY)
    }

    /// Same as [`Connection::new`] with an explicit queue capacity.
    pub fn with_queue_capacity(
        user_id: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<String>) {
        let (frame_tx, frame_rx) = mpsc::channel(capacity);
        (
            Self {
                id: Uuid::new_v4(),
                user_id: user_id.into(),
                frame_tx,
            },
            frame_rx,
        )
    }
}

enum Command {
    Register(Connection),
    Unregister(ConnectionId),
    Broadcast {
        frame: String,
        sender_user_id: String,
    },
    OnlineUsers(oneshot::Sender<Vec<String>>),
}

/// Cloneable handle to the hub worker.
///
/// Operations are submitted over one channel and processed strictly in
/// submission order. The worker exits once every handle has been dropped.
#[derive(Clone)]
pub struct HubHandle {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl HubHandle {
    /// Start the hub worker and return a handle to it.
    pub fn spawn() -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(command_rx));
        Self { command_tx }
    }

    /// Add a connection to the membership set.
    pub fn register(&self, connection: Connection) {
        self.submit(Command::Register(connection));
    }

    /// Remove a connection and close its outbound queue. Unregistering an
    /// id that is not (or no longer) a member is a no-op.
    pub fn unregister(&self, id: ConnectionId) {
        self.submit(Command::Unregister(id));
    }

    /// Enqueue `frame` onto every live connection whose user id differs
    /// from `sender_user_id`. Non-blocking: recipients whose queue is full
    /// are disconnected within the same broadcast pass.
    pub fn broadcast(&self, frame: String, sender_user_id: &str) {
        self.submit(Command::Broadcast {
            frame,
            sender_user_id: sender_user_id.to_string(),
        });
    }

    /// Sorted distinct user ids with at least one live connection. Flows
    /// through the command channel, so the snapshot observes every
    /// previously submitted operation.
    pub async fn online_users(&self) -> Vec<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(Command::OnlineUsers(reply_tx));
        reply_rx.await.unwrap_or_default()
    }

    fn submit(&self, command: Command) {
        // Fails only when the worker is gone, i.e. during shutdown.
        if self.command_tx.send(command).is_err() {
            tracing::debug!("hub worker is gone, dropping command");
        }
    }
}

async fn run(mut command_rx: mpsc::UnboundedReceiver<Command>) {
    let mut connections: HashMap<ConnectionId, Connection> = HashMap::new();

    while let Some(command) = command_rx.recv().await {
        match command {
            Command::Register(connection) => {
                tracing::debug!(
                    "registered connection {} for user '{}'",
                    connection.id,
                    connection.user_id
                );
                connections.insert(connection.id, connection);
            }
            Command::Unregister(id) => {
                if let Some(connection) = connections.remove(&id) {
                    tracing::debug!(
                        "unregistered connection {} for user '{}'",
                        id,
                        connection.user_id
                    );
                }
            }
            Command::Broadcast {
                frame,
                sender_user_id,
            } => {
                let mut dead: Vec<ConnectionId> = Vec::new();
                for (id, connection) in &connections {
                    // Self-exclusion is by user id: none of the sender's
                    // connections sees their own echo.
                    if connection.user_id == sender_user_id {
                        continue;
                    }
                    match connection.frame_tx.try_send(frame.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::warn!(
                                "outbound queue full for user '{}', dropping connection {}",
                                connection.user_id,
                                id
                            );
                            dead.push(*id);
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            dead.push(*id);
                        }
                    }
                }
                for id in dead {
                    connections.remove(&id);
                }
            }
            Command::OnlineUsers(reply_tx) => {
                let mut users: Vec<String> = connections
                    .values()
                    .map(|c| c.user_id.clone())
                    .collect();
                users.sort();
                users.dedup();
                let _ = reply_tx.send(users);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_membership_follows_register_unregister_order() {
        let hub = HubHandle::spawn();
        let (alice, _alice_rx) = Connection::new("alice");
        let (bob, _bob_rx) = Connection::new("bob");
        let bob_id = bob.id;

        hub.register(alice);
        hub.register(bob);
        hub.unregister(bob_id);

        assert_eq!(hub.online_users().await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn test_one_user_may_hold_multiple_connections() {
        let hub = HubHandle::spawn();
        let (first, _rx1) = Connection::new("alice");
        let (second, _rx2) = Connection::new("alice");
        let first_id = first.id;

        hub.register(first);
        hub.register(second);
        assert_eq!(hub.online_users().await, vec!["alice".to_string()]);

        // Dropping one of the two connections keeps the user online.
        hub.unregister(first_id);
        assert_eq!(hub.online_users().await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn test_unregister_twice_is_a_no_op() {
        let hub = HubHandle::spawn();
        let (alice, _alice_rx) = Connection::new("alice");
        let alice_id = alice.id;
        hub.register(alice);

        hub.unregister(alice_id);
        hub.unregister(alice_id);

        assert!(hub.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_unknown_id_is_a_no_op() {
        let hub = HubHandle::spawn();

        hub.unregister(Uuid::new_v4());

        assert!(hub.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_excludes_every_connection_of_the_sender() {
        let hub = HubHandle::spawn();
        let (alice_first, mut alice_first_rx) = Connection::new("alice");
        let (alice_second, mut alice_second_rx) = Connection::new("alice");
        let (bob, mut bob_rx) = Connection::new("bob");
        hub.register(alice_first);
        hub.register(alice_second);
        hub.register(bob);

        hub.broadcast("hello".to_string(), "alice");
        // Query to make sure the broadcast has been processed.
        hub.online_users().await;

        assert_eq!(bob_rx.try_recv(), Ok("hello".to_string()));
        assert!(alice_first_rx.try_recv().is_err());
        assert!(alice_second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_slow_consumer_is_dropped_by_the_overflowing_broadcast() {
        let hub = HubHandle::spawn();
        let (alice, _alice_rx) = Connection::new("alice");
        let (slow_bob, mut bob_rx) = Connection::with_queue_capacity("bob", 1);
        hub.register(alice);
        hub.register(slow_bob);

        // First frame fills bob's queue, second overflows it.
        hub.broadcast("frame-1".to_string(), "alice");
        hub.broadcast("frame-2".to_string(), "alice");

        assert_eq!(hub.online_users().await, vec!["alice".to_string()]);
        // The queued frame is still readable, then the queue is closed.
        assert_eq!(bob_rx.recv().await, Some("frame-1".to_string()));
        assert_eq!(bob_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_broadcast_skips_connections_with_closed_queues() {
        let hub = HubHandle::spawn();
        let (alice, _alice_rx) = Connection::new("alice");
        let (bob, bob_rx) = Connection::new("bob");
        hub.register(alice);
        hub.register(bob);
        drop(bob_rx);

        hub.broadcast("hello".to_string(), "alice");

        // The dead connection is reaped instead of erroring the broadcast.
        assert_eq!(hub.online_users().await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn test_online_users_are_sorted_and_distinct() {
        let hub = HubHandle::spawn();
        let (carol, _rx1) = Connection::new("carol");
        let (alice, _rx2) = Connection::new("alice");
        let (alice_again, _rx3) = Connection::new("alice");
        hub.register(carol);
        hub.register(alice);
        hub.register(alice_again);

        assert_eq!(
            hub.online_users().await,
            vec!["alice".to_string(), "carol".to_string()]
        );
    }
}
