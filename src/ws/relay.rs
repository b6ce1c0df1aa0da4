//! Session relay: connection bookkeeping and per-session fan-out
//!
//! The relay never inspects player state; it only knows which connection
//! belongs to which session.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::{RelayInbound, RelayNotice, RelayOutbound};

/// Outbound queue depth per connection
const OUTBOUND_BUFFER: usize = 64;

pub type ConnectionId = Uuid;

struct RelayConnection {
    tx: mpsc::Sender<String>,
    session_id: Option<String>,
}

#[derive(Clone, Default)]
pub struct RelayHub {
    connections: Arc<DashMap<ConnectionId, RelayConnection>>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. The receiver yields serialized outbound frames.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let id = Uuid::new_v4();
        self.connections.insert(
            id,
            RelayConnection {
                tx,
                session_id: None,
            },
        );
        debug!(connection_id = %id, "Relay connection registered");
        (id, rx)
    }

    /// Forget a connection without notifying anyone
    pub fn disconnect(&self, connection_id: ConnectionId) {
        if self.connections.remove(&connection_id).is_some() {
            debug!(connection_id = %connection_id, "Relay connection removed");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn session_size(&self, session_id: &str) -> usize {
        self.connections
            .iter()
            .filter(|c| c.session_id.as_deref() == Some(session_id))
            .count()
    }

    /// Handle one text frame from `connection_id`
    pub fn handle_text(&self, connection_id: ConnectionId, text: &str) {
        let msg = match serde_json::from_str::<RelayInbound>(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "Bad relay message");
                self.notify(connection_id, format!("Invalid message: {}", e));
                return;
            }
        };

        match msg {
            RelayInbound::Join { session_id, data } => {
                if let Some(mut conn) = self.connections.get_mut(&connection_id) {
                    conn.session_id = Some(session_id.clone());
                }
                info!(
                    connection_id = %connection_id,
                    session_id = %session_id,
                    player_id = %data.player_id,
                    "Relay join"
                );
                let out = RelayOutbound::PlayerJoined {
                    session_id: session_id.clone(),
                    player_id: data.player_id,
                    player_name: data.player_name,
                };
                self.broadcast(&session_id, &out, None);
            }
            RelayInbound::Update { session_id, data } => {
                let out = RelayOutbound::PlayerUpdate {
                    session_id: session_id.clone(),
                    player_id: data.player_id,
                    position: data.position,
                    rotation: data.rotation,
                    health: data.health,
                    weapon: data.weapon,
                    last_action: data.action,
                };
                self.broadcast(&session_id, &out, Some(connection_id));
            }
            RelayInbound::Leave { session_id, data } => {
                if let Some(mut conn) = self.connections.get_mut(&connection_id) {
                    conn.session_id = None;
                }
                info!(
                    connection_id = %connection_id,
                    session_id = %session_id,
                    player_id = %data.player_id,
                    "Relay leave"
                );
                let out = RelayOutbound::PlayerLeft {
                    session_id: session_id.clone(),
                    player_id: data.player_id,
                };
                self.broadcast(&session_id, &out, None);
            }
        }
    }

    /// Publish a message to every connection in a session
    pub fn publish(&self, session_id: &str, msg: &RelayOutbound) {
        self.broadcast(session_id, msg, None);
    }

    /// Send `msg` to every connection in `session_id` except `skip`.
    /// Connections whose receiver is gone are dropped.
    fn broadcast(&self, session_id: &str, msg: &RelayOutbound, skip: Option<ConnectionId>) {
        let payload = match serde_json::to_string(msg) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize relay message");
                return;
            }
        };

        let mut stale = Vec::new();
        for entry in self.connections.iter() {
            if Some(*entry.key()) == skip || entry.session_id.as_deref() != Some(session_id) {
                continue;
            }
            match entry.tx.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(connection_id = %entry.key(), "Relay client lagging, message dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => stale.push(*entry.key()),
            }
        }

        for id in stale {
            self.disconnect(id);
        }
    }

    /// Reply to a single connection with a `{"message": ..}` notice
    fn notify(&self, connection_id: ConnectionId, message: String) {
        let Ok(payload) = serde_json::to_string(&RelayNotice { message }) else {
            return;
        };
        let tx = self.connections.get(&connection_id).map(|c| c.tx.clone());
        if let Some(tx) = tx {
            let _ = tx.try_send(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recv_json(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
        let text = rx.try_recv().expect("message queued");
        serde_json::from_str(&text).unwrap()
    }

    fn join(hub: &RelayHub, conn: ConnectionId, session: &str, player: &str) {
        hub.handle_text(
            conn,
            &format!(
                r#"{{"action":"join","sessionId":"{}","data":{{"playerId":"{}","playerName":"{}"}}}}"#,
                session, player, player
            ),
        );
    }

    #[test]
    fn join_broadcasts_to_whole_session_including_sender() {
        let hub = RelayHub::new();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        let (_, mut rx_other) = hub.connect();

        join(&hub, a, "s1", "pa");
        assert_eq!(recv_json(&mut rx_a)["action"], "playerJoined");

        join(&hub, b, "s1", "pb");
        let seen_by_a = recv_json(&mut rx_a);
        assert_eq!(seen_by_a["playerId"], "pb");
        assert_eq!(seen_by_a["playerName"], "pb");
        assert_eq!(recv_json(&mut rx_b)["playerId"], "pb");

        assert!(rx_other.try_recv().is_err());
        assert_eq!(hub.session_size("s1"), 2);
    }

    #[test]
    fn update_skips_sender() {
        let hub = RelayHub::new();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        join(&hub, a, "s1", "pa");
        join(&hub, b, "s1", "pb");
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        hub.handle_text(
            a,
            r#"{"action":"update","sessionId":"s1","data":{"playerId":"pa","health":50,"action":"shoot"}}"#,
        );

        assert!(rx_a.try_recv().is_err());
        let update = recv_json(&mut rx_b);
        assert_eq!(update["action"], "playerUpdate");
        assert_eq!(update["health"], 50.0);
        assert_eq!(update["lastAction"], "shoot");
    }

    #[test]
    fn leave_unmaps_and_notifies() {
        let hub = RelayHub::new();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        join(&hub, a, "s1", "pa");
        join(&hub, b, "s1", "pb");
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        hub.handle_text(a, r#"{"action":"leave","sessionId":"s1","data":{"playerId":"pa"}}"#);

        assert_eq!(recv_json(&mut rx_b)["action"], "playerLeft");
        assert!(rx_a.try_recv().is_err());
        assert_eq!(hub.session_size("s1"), 1);
    }

    #[test]
    fn malformed_messages_get_notice() {
        let hub = RelayHub::new();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        join(&hub, b, "s1", "pb");
        while rx_b.try_recv().is_ok() {}

        hub.handle_text(a, r#"{"action":"teleport","sessionId":"s1"}"#);

        let notice = recv_json(&mut rx_a);
        assert!(notice["message"].as_str().unwrap().starts_with("Invalid message"));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn closed_connections_are_dropped_during_fanout() {
        let hub = RelayHub::new();
        let (a, rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        join(&hub, a, "s1", "pa");
        join(&hub, b, "s1", "pb");
        drop(rx_a);

        hub.handle_text(b, r#"{"action":"update","sessionId":"s1","data":{"playerId":"pb"}}"#);

        assert_eq!(hub.connection_count(), 1);
        assert!(rx_b.try_recv().is_ok());
    }
}
