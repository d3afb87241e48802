use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::entity::role;

/// Buffered messages per receiver before it is considered lagged and dropped.
const CHANNEL_CAPACITY: usize = 256;

/// A fan-out message. `room: None` broadcasts to every connected client.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(skip)]
    pub room: Option<String>,
    pub event: String,
    pub data: serde_json::Value,
}

/// Fan-out hub shared through `AppState`.
///
/// Emission never blocks and never fails: with no connected clients the
/// message is simply dropped, which is the delivery guarantee this channel
/// offers.
#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<Envelope>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn emit_to_all(&self, event: &str, data: serde_json::Value) {
        let _ = self.tx.send(Envelope {
            room: None,
            event: event.to_string(),
            data,
        });
    }

    pub fn emit_to_room(&self, room: &str, event: &str, data: serde_json::Value) {
        let _ = self.tx.send(Envelope {
            room: Some(room.to_string()),
            event: event.to_string(),
            data,
        });
    }
}

pub fn role_room(role: &str) -> String {
    format!("role-{role}")
}

pub fn event_room(event_id: i32) -> String {
    format!("event-{event_id}")
}

/// Whether a client with `role` may join `room`.
///
/// Role rooms are restricted to the client's own role (admins may join any);
/// event rooms are open to all authenticated clients.
pub fn can_join(role: &str, room: &str) -> bool {
    if let Some(target) = room.strip_prefix("role-") {
        return role == role::ADMIN_ROLE || role == target;
    }
    if let Some(id) = room.strip_prefix("event-") {
        return id.parse::<i32>().is_ok();
    }
    false
}

/// Whether a message should be delivered to a client with `joined` rooms.
pub fn should_deliver(joined: &HashSet<String>, envelope: &Envelope) -> bool {
    match &envelope.room {
        None => true,
        Some(room) => joined.contains(room),
    }
}
