use std::collections::HashMap;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::core::protocol::ServerEvent;
use crate::core::registry::ConnectionId;

/// Events queued per connection before further ones are dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Outbound half of one connection. Create with [`outbound_channel`].
pub type EventSender = mpsc::Sender<ServerEvent>;
pub type EventReceiver = mpsc::Receiver<ServerEvent>;

pub fn outbound_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Live connections and how to reach them.
///
/// Delivery is fire-and-forget: a recipient whose socket is gone is skipped,
/// and one that stops reading loses events once its queue is full.
#[derive(Default)]
pub struct ConnectionHub {
    senders: RwLock<HashMap<ConnectionId, EventSender>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, conn: ConnectionId, sender: EventSender) {
        self.senders.write().await.insert(conn, sender);
    }

    pub async fn unregister(&self, conn: &ConnectionId) {
        self.senders.write().await.remove(conn);
    }

    pub async fn emit(&self, conn: &ConnectionId, event: ServerEvent) {
        let senders = self.senders.read().await;
        Self::deliver(&senders, conn, event);
    }

    /// Emit to every member of a room, the sender included.
    pub async fn emit_to_group(&self, members: &[ConnectionId], event: ServerEvent) {
        let senders = self.senders.read().await;
        for conn in members {
            Self::deliver(&senders, conn, event.clone());
        }
    }

    pub async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    fn deliver(senders: &HashMap<ConnectionId, EventSender>, conn: &ConnectionId, event: ServerEvent) {
        match senders.get(conn) {
            Some(tx) => match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => warn!(%conn, "outbound queue full, dropping event"),
                Err(TrySendError::Closed(_)) => debug!(%conn, "dropping event for closed connection"),
            },
            None => debug!(%conn, "dropping event for unknown connection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn group_emit_reaches_every_member() {
        let hub = ConnectionHub::new();
        let (a_tx, mut a_rx) = outbound_channel();
        let (b_tx, mut b_rx) = outbound_channel();
        let a = ConnectionId::new("a");
        let b = ConnectionId::new("b");
        hub.register(a.clone(), a_tx).await;
        hub.register(b.clone(), b_tx).await;

        hub.emit_to_group(&[a.clone(), b.clone()], ServerEvent::GameStart("go".into())).await;

        assert_eq!(a_rx.try_recv().unwrap(), ServerEvent::GameStart("go".into()));
        assert_eq!(b_rx.try_recv().unwrap(), ServerEvent::GameStart("go".into()));
    }

    #[tokio::test]
    async fn closed_and_unknown_recipients_are_skipped() {
        let hub = ConnectionHub::new();
        let (tx, rx) = outbound_channel();
        let gone = ConnectionId::new("gone");
        hub.register(gone.clone(), tx).await;
        drop(rx);

        hub.emit(&gone, ServerEvent::Error("x".into())).await;
        hub.emit(&ConnectionId::new("ghost"), ServerEvent::Error("x".into())).await;

        hub.unregister(&gone).await;
        assert_eq!(hub.len().await, 0);
    }

    #[tokio::test]
    async fn stalled_reader_does_not_block_the_group() {
        let hub = ConnectionHub::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = outbound_channel();
        let slow = ConnectionId::new("slow");
        let fast = ConnectionId::new("fast");
        hub.register(slow.clone(), slow_tx).await;
        hub.register(fast.clone(), fast_tx).await;

        let members = [slow.clone(), fast.clone()];
        hub.emit_to_group(&members, ServerEvent::Error("first".into())).await;
        hub.emit_to_group(&members, ServerEvent::Error("second".into())).await;

        assert_eq!(slow_rx.try_recv().unwrap(), ServerEvent::Error("first".into()));
        assert!(slow_rx.try_recv().is_err());
        assert_eq!(fast_rx.try_recv().unwrap(), ServerEvent::Error("first".into()));
        assert_eq!(fast_rx.try_recv().unwrap(), ServerEvent::Error("second".into()));
    }
}
