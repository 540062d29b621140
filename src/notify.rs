use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::LedgerEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for ledger changes, one channel per hall.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<LedgerEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes on a hall. Creates the channel if needed.
    pub fn subscribe(&self, hall_id: &str) -> broadcast::Receiver<LedgerEvent> {
        let sender = self
            .channels
            .entry(hall_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, hall_id: &str, event: LedgerEvent) {
        if let Some(sender) = self.channels.get(hall_id) {
            let _ = sender.send(event);
        }
    }

    pub fn subscriber_count(&self, hall_id: &str) -> usize {
        self.channels
            .get(hall_id)
            .map_or(0, |s| s.receiver_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BookingStatus;
    use ulid::Ulid;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe("1");

        let event = LedgerEvent::BookingReviewed {
            id: Ulid::new(),
            hall_id: "1".into(),
            status: BookingStatus::Approved,
        };
        hub.send("1", event.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn channels_are_per_hall() {
        let hub = NotifyHub::new();
        let mut rx_one = hub.subscribe("1");
        let _rx_two = hub.subscribe("2");

        hub.send(
            "2",
            LedgerEvent::BookingReviewed {
                id: Ulid::new(),
                hall_id: "2".into(),
                status: BookingStatus::Rejected,
            },
        );
        assert!(matches!(
            rx_one.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(hub.subscriber_count("2"), 1);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        // No subscriber: must not panic
        hub.send(
            "9",
            LedgerEvent::BookingReviewed {
                id: Ulid::new(),
                hall_id: "9".into(),
                status: BookingStatus::Pending,
            },
        );
        assert_eq!(hub.subscriber_count("9"), 0);
    }
}
