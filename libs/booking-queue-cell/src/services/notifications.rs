use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

pub type ChannelSender = broadcast::Sender<String>;
pub type ChannelReceiver = broadcast::Receiver<String>;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
pub const DEFAULT_GLOBAL_CHANNEL_CAPACITY: usize = 1000;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Push side of the real-time fan-out.
///
/// Channel keys are appointment ids in their canonical string form.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: Value,
    ) -> Result<(), NotificationError>;

    async fn broadcast(&self, event: &str, payload: Value) -> Result<(), NotificationError>;
}

/// In-process pub/sub over tokio broadcast channels.
///
/// Each appointment channel is created when the first subscriber joins. The
/// global channel carries doctor status changes to every connected client.
#[derive(Clone)]
pub struct NotificationHub {
    channels: Arc<RwLock<HashMap<String, ChannelSender>>>,
    global_sender: ChannelSender,
    channel_capacity: usize,
}

impl NotificationHub {
    pub fn new(channel_capacity: usize, global_capacity: usize) -> Self {
        let (global_sender, _) = broadcast::channel(global_capacity.max(1));

        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            global_sender,
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub async fn join_channel(&self, channel: &str) -> ChannelReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels.entry(channel.to_string()).or_insert_with(|| {
            debug!("Created notification channel {}", channel);
            broadcast::channel(self.channel_capacity).0
        });
        sender.subscribe()
    }

    pub fn subscribe_global(&self) -> ChannelReceiver {
        self.global_sender.subscribe()
    }

    pub async fn active_channels(&self) -> Vec<String> {
        let channels = self.channels.read().await;
        channels.keys().cloned().collect()
    }

    /// Drop channels nobody listens to any more. Returns how many were removed.
    pub async fn prune_idle_channels(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        let removed = before - channels.len();
        if removed > 0 {
            debug!("Pruned {} idle notification channels", removed);
        }
        removed
    }

    fn envelope(event: &str, payload: Value) -> Result<String, NotificationError> {
        let message = json!({
            "event": event,
            "data": payload,
            "timestamp": Utc::now().to_rfc3339(),
        });
        Ok(serde_json::to_string(&message)?)
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY, DEFAULT_GLOBAL_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl Notifier for NotificationHub {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: Value,
    ) -> Result<(), NotificationError> {
        let message = Self::envelope(event, payload)?;

        let channels = self.channels.read().await;
        match channels.get(channel) {
            // A send error only means every receiver went away.
            Some(sender) => {
                if sender.send(message).is_err() {
                    debug!("No listeners left on channel {} for {}", channel, event);
                }
            }
            None => debug!("No subscriber on channel {}, dropping {}", channel, event),
        }
        Ok(())
    }

    async fn broadcast(&self, event: &str, payload: Value) -> Result<(), NotificationError> {
        let message = Self::envelope(event, payload)?;

        if self.global_sender.send(message).is_err() {
            debug!("No global listeners for {}", event);
        }
        Ok(())
    }
}
