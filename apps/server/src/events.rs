//! Server events and the broadcast hub.
//!
//! The hub keeps the set of live dashboard connections and fans watcher
//! events out to all of them. Delivery is fire-and-forget per connection: a
//! send is a non-blocking push into that connection's queue, and a closed
//! connection is dropped from the set without affecting the others.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::mpsc;

/// Canonical event name pushed to dashboard clients on every order insert.
pub const NEW_ORDER: &str = "new-order";

/// Serializable envelope that carries event names and optional payloads.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub payload: Option<Value>,
}

impl ServerEvent {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    pub fn with_payload(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    connections: HashMap<u64, mpsc::UnboundedSender<ServerEvent>>,
}

/// Fan-out hub over the set of currently-connected clients.
///
/// No handshake, no per-client filtering, no replay: a connection
/// established after an event was broadcast never sees it and catches up via
/// the bulk-fetch endpoint instead.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    inner: Arc<Mutex<HubInner>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new live connection and hands back its receiving end.
    /// Dropping the handle deregisters it.
    pub fn accept(&self) -> HubConnection {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.connections.insert(id, tx);
            id
        };
        tracing::debug!("Client connected: {id}");
        HubConnection {
            id,
            rx,
            hub: self.clone(),
        }
    }

    /// Deregisters a connection. Idempotent.
    pub fn disconnect(&self, id: u64) {
        let removed = self.inner.lock().unwrap().connections.remove(&id);
        if removed.is_some() {
            tracing::debug!("Client disconnected: {id}");
        }
    }

    /// Delivers the event to every currently-registered connection.
    ///
    /// Iterates a snapshot copy of the connection set, so connects and
    /// disconnects racing with the fan-out never invalidate the iteration.
    /// A connection whose receiver is gone is pruned; the rest still get
    /// their delivery.
    pub fn broadcast(&self, event: ServerEvent) {
        let targets: Vec<(u64, mpsc::UnboundedSender<ServerEvent>)> = {
            let inner = self.inner.lock().unwrap();
            inner
                .connections
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };
        for (id, tx) in targets {
            if tx.send(event.clone()).is_err() {
                self.disconnect(id);
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().unwrap().connections.len()
    }
}

/// One live client connection. Receives events in broadcast order;
/// deregisters itself from the hub on drop.
pub struct HubConnection {
    id: u64,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
    hub: BroadcastHub,
}

impl HubConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for HubConnection {
    type Item = ServerEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for HubConnection {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_all_connections_receive_each_broadcast() {
        let hub = BroadcastHub::new();
        let mut c1 = hub.accept();
        let mut c2 = hub.accept();

        hub.broadcast(ServerEvent::with_payload(NEW_ORDER, json!({"id": "O5"})));

        for conn in [&mut c1, &mut c2] {
            let event = conn.recv().await.unwrap();
            assert_eq!(event.name, NEW_ORDER);
            assert_eq!(event.payload.unwrap()["id"], "O5");
        }
    }

    #[tokio::test]
    async fn test_per_connection_delivery_preserves_broadcast_order() {
        let hub = BroadcastHub::new();
        let mut conn = hub.accept();

        hub.broadcast(ServerEvent::with_payload(NEW_ORDER, json!({"id": "A"})));
        hub.broadcast(ServerEvent::with_payload(NEW_ORDER, json!({"id": "B"})));

        assert_eq!(conn.recv().await.unwrap().payload.unwrap()["id"], "A");
        assert_eq!(conn.recv().await.unwrap().payload.unwrap()["id"], "B");
    }

    #[tokio::test]
    async fn test_closed_connection_does_not_block_the_rest() {
        // One client going away must not affect delivery to the rest.
        let hub = BroadcastHub::new();
        let c1 = hub.accept();
        let mut c2 = hub.accept();

        drop(c1);
        hub.broadcast(ServerEvent::with_payload(NEW_ORDER, json!({"id": "O5"})));

        let event = c2.recv().await.unwrap();
        assert_eq!(event.payload.unwrap()["id"], "O5");
        assert_eq!(hub.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let hub = BroadcastHub::new();
        let conn = hub.accept();
        let id = conn.id();

        hub.disconnect(id);
        hub.disconnect(id);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_late_connection_gets_no_replay() {
        let hub = BroadcastHub::new();
        hub.broadcast(ServerEvent::with_payload(NEW_ORDER, json!({"id": "old"})));

        let mut late = hub.accept();
        hub.broadcast(ServerEvent::with_payload(NEW_ORDER, json!({"id": "new"})));

        let event = late.recv().await.unwrap();
        assert_eq!(event.payload.unwrap()["id"], "new");
    }
}
