//! Test doubles for the broadcast seams.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::broadcast::{BroadcastSink, Channel, EventEnvelope, Timer};
use crate::error::BroadcastError;

/// Timer that records every requested delay and returns at once.
///
/// It yields to the scheduler instead of sleeping, so cancellation between
/// steps can still be observed.
#[derive(Debug, Default)]
pub struct RecordingTimer {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Timer for RecordingTimer {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
        tokio::task::yield_now().await;
    }
}

/// Sink that keeps every envelope in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    envelopes: Mutex<Vec<EventEnvelope>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn envelopes(&self) -> Vec<EventEnvelope> {
        self.envelopes.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// `(channel, event name)` pairs in emission order.
    pub fn timeline(&self) -> Vec<(Channel, &'static str)> {
        self.envelopes()
            .iter()
            .map(|e| (e.channel, e.event.name()))
            .collect()
    }

    pub fn on(&self, channel: Channel) -> Vec<EventEnvelope> {
        self.envelopes()
            .into_iter()
            .filter(|e| e.channel == channel)
            .collect()
    }
}

#[async_trait]
impl BroadcastSink for RecordingSink {
    async fn emit(&self, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        if let Ok(mut envelopes) = self.envelopes.lock() {
            envelopes.push(envelope);
        }
        Ok(())
    }
}

/// Sink whose selected channels always fail; the rest are recorded.
#[derive(Debug, Default)]
pub struct FailingSink {
    failing: BTreeSet<Channel>,
    delivered: RecordingSink,
}

impl FailingSink {
    pub fn new(failing: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            delivered: RecordingSink::new(),
        }
    }

    pub fn delivered(&self) -> &RecordingSink {
        &self.delivered
    }
}

#[async_trait]
impl BroadcastSink for FailingSink {
    async fn emit(&self, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        if self.failing.contains(&envelope.channel) {
            return Err(BroadcastError::Closed(envelope.channel));
        }
        self.delivered.emit(envelope).await
    }
}
