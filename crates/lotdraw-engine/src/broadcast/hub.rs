//! Channel fan-out

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use super::event::{Channel, EventEnvelope};
use crate::error::BroadcastError;

/// Destination of broadcast emissions.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn emit(&self, envelope: EventEnvelope) -> Result<(), BroadcastError>;
}

/// One `tokio::sync::broadcast` channel per audience channel.
///
/// Slow subscribers lag and lose the oldest envelopes instead of blocking
/// the sequence.
#[derive(Debug)]
pub struct ChannelHub {
    senders: BTreeMap<Channel, broadcast::Sender<EventEnvelope>>,
}

impl ChannelHub {
    pub fn new(capacity: usize) -> Self {
        let senders = Channel::ALL
            .into_iter()
            .map(|channel| (channel, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self { senders }
    }

    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<EventEnvelope> {
        self.sender(channel).subscribe()
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.sender(channel).receiver_count()
    }

    fn sender(&self, channel: Channel) -> &broadcast::Sender<EventEnvelope> {
        // populated for every channel in `new`
        &self.senders[&channel]
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl BroadcastSink for ChannelHub {
    async fn emit(&self, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        let channel = envelope.channel;
        let receivers = self
            .sender(channel)
            .send(envelope)
            .map_err(|_| BroadcastError::NoSubscribers(channel))?;
        trace!(channel = %channel, receivers, "Envelope delivered");
        Ok(())
    }
}
