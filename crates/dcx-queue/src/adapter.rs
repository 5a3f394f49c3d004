use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use dcx_core::ports::adapter::{AdapterError, MessageCallback, MessageQueueAdapter, ProtocolAdapter};

const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 256;

struct Subscription {
    sender: mpsc::Sender<Value>,
    task: JoinHandle<()>,
}

/// In-process publish/subscribe broker. Each `subscribe` call spawns a
/// dedicated task reading from its own bounded channel and invoking the
/// callback; `publish` fans a message out to every subscriber on a topic via
/// `try_send`, dropping (with a warning) into any subscriber whose channel
/// is full rather than blocking the publisher. `unsubscribe` aborts every
/// task registered for a topic.
pub struct InProcessMessageQueueAdapter {
    subscriptions: tokio::sync::RwLock<HashMap<String, Vec<Subscription>>>,
    connected: AtomicBool,
}

impl Default for InProcessMessageQueueAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessMessageQueueAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: tokio::sync::RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for InProcessMessageQueueAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        let mut subscriptions = self.subscriptions.write().await;
        for (_, subs) in subscriptions.drain() {
            for sub in subs {
                sub.task.abort();
            }
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageQueueAdapter for InProcessMessageQueueAdapter {
    async fn publish(&self, topic: &str, message: Value) -> Result<(), AdapterError> {
        if !self.is_connected() {
            return Err(AdapterError::NotConnected);
        }
        let subscriptions = self.subscriptions.read().await;
        let Some(subs) = subscriptions.get(topic) else {
            return Ok(());
        };
        for sub in subs {
            if let Err(err) = sub.sender.try_send(message.clone()) {
                tracing::warn!(topic, %err, "dropping message, subscriber channel unavailable");
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, callback: MessageCallback) -> Result<(), AdapterError> {
        if !self.is_connected() {
            return Err(AdapterError::NotConnected);
        }
        let (tx, mut rx) = mpsc::channel(SUBSCRIPTION_CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                callback(message);
            }
        });

        self.subscriptions
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(Subscription { sender: tx, task });
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), AdapterError> {
        if let Some(subs) = self.subscriptions.write().await.remove(topic) {
            for sub in subs {
                sub.task.abort();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let adapter = InProcessMessageQueueAdapter::new();
        adapter.connect().await.unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        adapter
            .subscribe(
                "orders",
                Box::new(move |msg| received_clone.lock().unwrap().push(msg)),
            )
            .await
            .unwrap();

        adapter.publish("orders", serde_json::json!({"id": 1})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let got = received.lock().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0]["id"], 1);
    }

    #[tokio::test]
    async fn publish_to_unknown_topic_is_a_no_op() {
        let adapter = InProcessMessageQueueAdapter::new();
        adapter.connect().await.unwrap();
        adapter.publish("nobody-listens", Value::Null).await.unwrap();
    }

    #[tokio::test]
    async fn unsubscribe_stops_further_delivery() {
        let adapter = InProcessMessageQueueAdapter::new();
        adapter.connect().await.unwrap();

        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        adapter
            .subscribe("ticks", Box::new(move |_| *count_clone.lock().unwrap() += 1))
            .await
            .unwrap();
        adapter.unsubscribe("ticks").await.unwrap();
        adapter.publish("ticks", Value::Null).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn publish_before_connect_is_rejected() {
        let adapter = InProcessMessageQueueAdapter::new();
        let err = adapter.publish("orders", Value::Null).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotConnected));
    }
}
