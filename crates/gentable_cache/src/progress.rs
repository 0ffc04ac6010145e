//! Progress channel: keyed, overwritable, auto-expiring status pub/sub
//! (spec §4.I).

use gentable_core::{ProgressRecord, ProgressState};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Publishes [`ProgressRecord`] updates under a request-supplied key and
/// lets callers subscribe to a key's updates as they arrive.
///
/// A key's channel is created on first publish and torn down
/// `expire_after` past the record reaching `Completed`/`Failed`, so a
/// subscriber that arrives late still sees the terminal state for a
/// while, but the table does not grow unbounded across requests.
pub struct ProgressPublisher {
    channels: Mutex<HashMap<String, watch::Sender<ProgressRecord>>>,
    expire_after: Duration,
}

impl ProgressPublisher {
    /// Create a publisher whose completed/failed records are torn down
    /// `expire_after` after their terminal update.
    pub fn new(expire_after: Duration) -> Self {
        Self { channels: Mutex::new(HashMap::new()), expire_after }
    }

    /// Publish `record`, creating its channel if this is the first update
    /// for `record.key`. Every subscriber (existing or future) observes
    /// this value.
    pub fn publish(self: &std::sync::Arc<Self>, record: ProgressRecord) {
        let key = record.key.clone();
        let terminal = matches!(record.state, ProgressState::Completed | ProgressState::Failed);

        let mut channels = self.channels.lock().expect("progress channel table mutex poisoned");
        match channels.get(&key) {
            Some(sender) => {
                let _ = sender.send(record);
            }
            None => {
                let (sender, _receiver) = watch::channel(record);
                channels.insert(key.clone(), sender);
            }
        }
        drop(channels);

        if terminal {
            let this = self.clone();
            let expire_after = self.expire_after;
            tokio::spawn(async move {
                tokio::time::sleep(expire_after).await;
                this.channels.lock().expect("progress channel table mutex poisoned").remove(&key);
            });
        }
    }

    /// Subscribe to `key`'s updates, immediately observing the current
    /// record if one exists. Returns `None` if no record has ever been
    /// published under `key` (or it has since expired).
    pub fn subscribe(&self, key: &str) -> Option<watch::Receiver<ProgressRecord>> {
        self.channels.lock().expect("progress channel table mutex poisoned").get(key).map(|s| s.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn subscriber_sees_current_record_immediately() {
        let publisher = Arc::new(ProgressPublisher::new(Duration::from_millis(50)));
        publisher.publish(ProgressRecord::started("import:req_1".to_string()));
        let receiver = publisher.subscribe("import:req_1").unwrap();
        assert_eq!(receiver.borrow().state, ProgressState::Started);
    }

    #[tokio::test]
    async fn update_is_observed_by_existing_subscriber() {
        let publisher = Arc::new(ProgressPublisher::new(Duration::from_millis(50)));
        publisher.publish(ProgressRecord::started("import:req_1".to_string()));
        let mut receiver = publisher.subscribe("import:req_1").unwrap();

        let mut record = ProgressRecord::started("import:req_1".to_string());
        record.complete();
        publisher.publish(record);

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().state, ProgressState::Completed);
    }

    #[tokio::test]
    async fn unknown_key_has_no_subscription() {
        let publisher = Arc::new(ProgressPublisher::new(Duration::from_millis(50)));
        assert!(publisher.subscribe("nope").is_none());
    }

    #[tokio::test]
    async fn completed_record_expires_after_grace_period() {
        let publisher = Arc::new(ProgressPublisher::new(Duration::from_millis(5)));
        let mut record = ProgressRecord::started("import:req_1".to_string());
        record.complete();
        publisher.publish(record);
        assert!(publisher.subscribe("import:req_1").is_some());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(publisher.subscribe("import:req_1").is_none());
    }
}
