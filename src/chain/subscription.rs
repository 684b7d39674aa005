//! Cancellable push subscriptions between a node adapter and its consumers.
//!
//! A `Subscription` is the consumer half: it yields items and owns the
//! unsubscribe signal. A `SubscriptionSink` is the producer half kept by the
//! node. Unsubscribing is idempotent and also happens on drop, so the node
//! sees exactly one teardown per subscription.

use futures::channel::oneshot;
use tokio::sync::mpsc;

pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    unsub: Option<oneshot::Sender<()>>,
}

pub struct SubscriptionSink<T> {
    tx: mpsc::UnboundedSender<T>,
    cancelled: oneshot::Receiver<()>,
}

/// Create a connected subscription / sink pair.
pub fn subscription<T>() -> (SubscriptionSink<T>, Subscription<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (unsub_tx, unsub_rx) = oneshot::channel();
    (
        SubscriptionSink { tx, cancelled: unsub_rx },
        Subscription { rx, unsub: Some(unsub_tx) },
    )
}

impl<T> Subscription<T> {
    /// Next item, or `None` once the producer is gone or we unsubscribed.
    pub async fn next(&mut self) -> Option<T> {
        if self.unsub.is_none() {
            return None;
        }
        self.rx.recv().await
    }

    /// Release the subscription. Returns `true` only on the first call.
    pub fn unsubscribe(&mut self) -> bool {
        match self.unsub.take() {
            Some(tx) => {
                let _ = tx.send(());
                self.rx.close();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsub.is_some()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> SubscriptionSink<T> {
    /// Whether the consumer has unsubscribed or gone away.
    pub fn is_closed(&mut self) -> bool {
        if self.tx.is_closed() {
            return true;
        }
        !matches!(self.cancelled.try_recv(), Ok(None))
    }

    /// Push an item. Returns `false` when the subscription is closed and the
    /// sink should be discarded.
    pub fn send(&mut self, item: T) -> bool {
        if self.is_closed() {
            return false;
        }
        self.tx.send(item).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_items_flow_until_unsubscribe() {
        let (mut sink, mut sub) = subscription::<u32>();
        assert!(sink.send(1));
        assert!(sink.send(2));
        assert_eq!(sub.next().await, Some(1));
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(sink.is_closed());
        assert!(!sink.send(3));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let (mut sink, sub) = subscription::<u32>();
        assert!(!sink.is_closed());
        drop(sub);
        assert!(sink.is_closed());
    }
}
