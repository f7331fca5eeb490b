//! Notice bus between the core components and the terminal.

use super::Notice;
use tokio::sync::broadcast;

/// Sender half of the notice bus.
#[derive(Clone)]
pub struct NoticeSender {
    tx: broadcast::Sender<Notice>,
}

impl NoticeSender {
    /// Send a notice.
    pub fn send(&self, notice: Notice) -> Result<(), BusError> {
        self.tx.send(notice).map_err(|_| BusError::Closed)?;
        Ok(())
    }

    /// Send an info notice.
    pub fn info(&self, text: impl Into<String>) {
        let _ = self.send(Notice::info(text));
    }

    /// Send a success notice.
    pub fn success(&self, text: impl Into<String>) {
        let _ = self.send(Notice::success(text));
    }

    /// Send a warning notice.
    pub fn warning(&self, text: impl Into<String>) {
        let _ = self.send(Notice::warning(text));
    }

    /// Send an error notice.
    pub fn error(&self, text: impl Into<String>) {
        let _ = self.send(Notice::error(text));
    }
}

/// Receiver half of the notice bus.
pub struct NoticeReceiver {
    rx: broadcast::Receiver<Notice>,
}

impl NoticeReceiver {
    /// Receive the next notice.
    pub async fn recv(&mut self) -> Result<Notice, BusError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BusError::Closed,
            broadcast::error::RecvError::Lagged(n) => BusError::Lagged(n),
        })
    }

    /// Try to receive a notice without waiting.
    pub fn try_recv(&mut self) -> Result<Option<Notice>, BusError> {
        match self.rx.try_recv() {
            Ok(notice) => Ok(Some(notice)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(BusError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(BusError::Lagged(n)),
        }
    }

    /// Take every notice queued so far.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(notice)) => notices.push(notice),
                Ok(None) | Err(BusError::Closed) => break,
                Err(BusError::Lagged(n)) => {
                    tracing::warn!("Dropped {} notices", n);
                }
            }
        }
        notices
    }
}

/// Broadcast bus for user notices.
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBus {
    /// Create a new notice bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Get a sender.
    pub fn sender(&self) -> NoticeSender {
        NoticeSender {
            tx: self.tx.clone(),
        }
    }

    /// Subscribe to notices.
    pub fn subscribe(&self) -> NoticeReceiver {
        NoticeReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus errors.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Channel closed")]
    Closed,
    #[error("Lagged behind by {0} notices")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::NoticeLevel;

    #[test]
    fn test_sender_is_clone() {
        let bus = NoticeBus::new();
        let sender1 = bus.sender();
        let sender2 = sender1.clone();

        let mut receiver = bus.subscribe();
        sender1.info("from sender1");
        sender2.info("from sender2");

        assert_eq!(receiver.drain().len(), 2);
    }

    #[test]
    fn test_multiple_subscribers() {
        let bus = NoticeBus::new();
        let sender = bus.sender();

        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        sender.warning("broadcast");

        assert_eq!(receiver1.try_recv().unwrap(), Some(Notice::warning("broadcast")));
        assert_eq!(receiver2.try_recv().unwrap(), Some(Notice::warning("broadcast")));
    }

    #[test]
    fn test_send_without_subscribers_is_closed() {
        let bus = NoticeBus::new();
        let result = bus.sender().send(Notice::info("nobody listening"));
        assert!(matches!(result, Err(BusError::Closed)));
    }

    #[test]
    fn test_helpers_swallow_closed_channel() {
        let bus = NoticeBus::new();
        // Must not panic with no receiver.
        bus.sender().error("ignored");
    }

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let bus = NoticeBus::new();
        let sender = bus.sender();
        let mut receiver = bus.subscribe();

        sender.info("one");
        sender.success("two");
        sender.error("three");

        let levels: Vec<NoticeLevel> = receiver.drain().into_iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Info, NoticeLevel::Success, NoticeLevel::Error]);
        assert!(receiver.drain().is_empty());
    }

    #[tokio::test]
    async fn test_recv_async() {
        let bus = NoticeBus::new();
        let mut receiver = bus.subscribe();
        bus.sender().success("saved");

        let notice = receiver.recv().await.unwrap();
        assert_eq!(notice.text, "saved");
    }
}
