//! Real-Time Publisher - per-run message fan-out.
//!
//! Each subscriber owns its own unbounded channel, decoupling slow consumers
//! from run progress: publishing is a non-blocking enqueue, and a subscriber
//! whose receiver is gone is dropped without affecting the run or other
//! subscribers (transport failures are counted, never retried beyond the
//! send itself).
//!
//! Subscription protocol: a new subscriber first receives a full `state`
//! snapshot (late joiners miss no history), then incremental messages in
//! production order, and finally `complete`, after which the channel closes.

use crate::models::message::WsMessage;
use std::sync::mpsc;

/// Receiving end of one subscriber's message stream.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<WsMessage>,
}

impl Subscription {
    /// Block for the next message; `None` once the stream has closed.
    pub fn recv(&self) -> Option<WsMessage> {
        self.rx.recv().ok()
    }

    /// Drain whatever has been delivered so far without blocking.
    pub fn try_drain(&self) -> Vec<WsMessage> {
        self.rx.try_iter().collect()
    }

    /// Iterate messages, blocking until the stream closes.
    pub fn iter(&self) -> impl Iterator<Item = WsMessage> + '_ {
        self.rx.iter()
    }

    /// Collect the remainder of the stream (blocks until close).
    pub fn drain(&self) -> Vec<WsMessage> {
        self.rx.iter().collect()
    }
}

/// Fan-out endpoint for one run.
#[derive(Debug, Default)]
pub struct Publisher {
    subscribers: Vec<mpsc::Sender<WsMessage>>,
    closed: bool,
    dropped: usize,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber, delivering `catchup` (snapshot, plus `complete`
    /// if the run already finished) before any future incremental message.
    /// After close the subscriber only ever sees the catch-up messages.
    pub fn attach(&mut self, catchup: Vec<WsMessage>) -> Subscription {
        let (tx, rx) = mpsc::channel();
        for msg in catchup {
            // Receiver is held locally; the send cannot fail here.
            let _ = tx.send(msg);
        }
        if !self.closed {
            self.subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Deliver one message to every live subscriber, in attach order.
    /// Subscribers with a dropped receiver are pruned.
    pub fn publish(&mut self, msg: WsMessage) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(msg.clone()).is_ok());
        self.dropped += before - self.subscribers.len();
    }

    /// Close the stream: all subscriber channels disconnect and later
    /// attaches receive only their catch-up.
    pub fn close(&mut self) {
        self.closed = true;
        self.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Subscribers pruned after a failed delivery.
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::broadcast::{AlertSeverity, BroadcastType};
    use crate::models::module::default_pipeline;
    use crate::models::state::SimulationState;

    fn state_msg() -> WsMessage {
        WsMessage::State(SimulationState::new(
            "run_1".into(),
            "s".into(),
            &default_pipeline(),
            0,
        ))
    }

    fn broadcast_msg(text: &str) -> WsMessage {
        WsMessage::Broadcast(crate::models::broadcast::Broadcast {
            id: text.into(),
            timestamp: 0,
            kind: BroadcastType::Info,
            severity: AlertSeverity::Low,
            message: text.into(),
        })
    }

    #[test]
    fn test_catchup_arrives_before_increments() {
        let mut publisher = Publisher::new();
        let sub = publisher.attach(vec![state_msg()]);
        publisher.publish(broadcast_msg("after"));
        let messages = sub.try_drain();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message_type(), "state");
        assert_eq!(messages[1].message_type(), "broadcast");
    }

    #[test]
    fn test_delivery_order_preserved() {
        let mut publisher = Publisher::new();
        let sub = publisher.attach(vec![]);
        for i in 0..10 {
            publisher.publish(broadcast_msg(&format!("m{}", i)));
        }
        let messages = sub.try_drain();
        let ids: Vec<String> = messages
            .iter()
            .map(|m| match m {
                WsMessage::Broadcast(b) => b.id.clone(),
                _ => unreachable!(),
            })
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("m{}", i)).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_dead_subscriber_pruned_without_affecting_others() {
        let mut publisher = Publisher::new();
        let alive = publisher.attach(vec![]);
        let dead = publisher.attach(vec![]);
        drop(dead);
        publisher.publish(broadcast_msg("still delivered"));
        assert_eq!(publisher.subscriber_count(), 1);
        assert_eq!(publisher.dropped_count(), 1);
        assert_eq!(alive.try_drain().len(), 1);
    }

    #[test]
    fn test_close_disconnects_streams() {
        let mut publisher = Publisher::new();
        let sub = publisher.attach(vec![]);
        publisher.publish(broadcast_msg("last"));
        publisher.close();
        let collected = sub.drain();
        assert_eq!(collected.len(), 1);
        assert!(publisher.is_closed());
    }

    #[test]
    fn test_attach_after_close_gets_only_catchup() {
        let mut publisher = Publisher::new();
        publisher.close();
        let sub = publisher.attach(vec![state_msg()]);
        publisher.publish(broadcast_msg("never seen"));
        let collected = sub.drain();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].message_type(), "state");
    }
}
