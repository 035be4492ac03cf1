use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Identity plus outbound-send capability for one client connection.
/// The transport owns the socket; sessions hold cloned handles. Sending
/// pushes onto the connection's outbound channel and never blocks - a
/// closed channel means the socket is already gone and the disconnect
/// path owns the cleanup.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: UnboundedSender<Value>,
}

impl ConnectionHandle {
    pub fn new(sender: UnboundedSender<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn send(&self, message: Value) {
        if self.sender.send(message).is_err() {
            log::debug!("send to closed connection {} dropped", self.id);
        }
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_handles_compare_by_identity() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = ConnectionHandle::new(tx.clone());
        let b = ConnectionHandle::new(tx);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_send_reaches_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = ConnectionHandle::new(tx);
        conn.send(serde_json::json!({"status": "startGame"}));
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg["status"], "startGame");
    }

    #[test]
    fn test_send_after_receiver_dropped_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let conn = ConnectionHandle::new(tx);
        conn.send(serde_json::json!({"status": "kicked"}));
    }
}
