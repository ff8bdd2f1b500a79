// Configuration change broadcast
// Typed single-producer, multi-consumer channel carrying immutable
// configuration snapshots to every subscriber.

use crate::config::Configuration;
use crate::constants::CHANGE_BROADCAST_BUFFER_SIZE;
use tokio::sync::broadcast;

/// A new configuration was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationChanged(pub Configuration);

/// Publishes [`ConfigurationChanged`] to all current subscribers, in order.
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<ConfigurationChanged>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_BROADCAST_BUFFER_SIZE);
        Self { tx }
    }

    /// Receive every change published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigurationChanged> {
        self.tx.subscribe()
    }

    /// Publish a snapshot. Fire-and-forget: having no subscribers is logged,
    /// never escalated. Returns the number of subscribers reached.
    pub fn publish(&self, configuration: Configuration) -> usize {
        match self.tx.send(ConfigurationChanged(configuration)) {
            Ok(receivers) => {
                tracing::info!(receivers = receivers, "Configuration change published");
                receivers
            }
            Err(_) => {
                tracing::warn!("Configuration change published with no subscribers");
                0
            }
        }
    }

    /// Get the number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
