//! Broadcast Orchestrator
//!
//! Plays the script of a committed result as a detached Tokio task. Each
//! emission is best-effort: a failure is logged and counted, and the rest of
//! the sequence still plays. Sequences never share state; overlapping
//! sequences from quick consecutive commits interleave freely on a channel.

use std::sync::Arc;

use lotdraw_types::ResultId;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::event::{BroadcastEvent, Channel, EventEnvelope, WinnerDetails};
use super::hub::BroadcastSink;
use super::script::{script_for, BroadcastDelays, Emission};
use super::timer::{Timer, TokioTimer};
use crate::error::{BroadcastError, EngineError};
use crate::next_draw::NextDrawCalculator;
use crate::store::{Registry, ResultFilter};

/// Broadcast settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub delays: BroadcastDelays,
    /// Buffered envelopes per channel before slow subscribers start lagging
    pub channel_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            delays: BroadcastDelays::default(),
            channel_capacity: 64,
        }
    }
}

/// Outcome of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceReport {
    pub result_id: ResultId,
    pub emitted: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Handle to a running sequence.
///
/// Dropping the handle detaches the task; it keeps running to completion.
#[derive(Debug)]
pub struct SequenceHandle {
    result_id: ResultId,
    cancel: CancellationToken,
    join: JoinHandle<SequenceReport>,
}

impl SequenceHandle {
    pub fn result_id(&self) -> ResultId {
        self.result_id
    }

    /// Stop the sequence before its next step. Emissions of the current step
    /// that already went out are not recalled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn join(self) -> Result<SequenceReport, BroadcastError> {
        self.join
            .await
            .map_err(|e| BroadcastError::Task(e.to_string()))
    }
}

struct Inner {
    registry: Registry,
    calculator: NextDrawCalculator,
    sink: Arc<dyn BroadcastSink>,
    timer: Arc<dyn Timer>,
    delays: BroadcastDelays,
}

/// Drives broadcast sequences and on-demand publications.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    /// Broadcaster sleeping on the Tokio clock.
    pub fn new(
        registry: Registry,
        calculator: NextDrawCalculator,
        sink: Arc<dyn BroadcastSink>,
        delays: BroadcastDelays,
    ) -> Self {
        Self::with_timer(registry, calculator, sink, Arc::new(TokioTimer), delays)
    }

    pub fn with_timer(
        registry: Registry,
        calculator: NextDrawCalculator,
        sink: Arc<dyn BroadcastSink>,
        timer: Arc<dyn Timer>,
        delays: BroadcastDelays,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                calculator,
                sink,
                timer,
                delays,
            }),
        }
    }

    pub fn delays(&self) -> &BroadcastDelays {
        &self.inner.delays
    }

    /// Start the sequence for a committed result on a background task.
    pub fn spawn(&self, details: WinnerDetails) -> SequenceHandle {
        let result_id = details.result.id;
        let cancel = CancellationToken::new();
        let span = info_span!(
            "broadcast_sequence",
            result_id = %result_id,
            kind = %details.result.kind()
        );

        let broadcaster = self.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move { broadcaster.run(details, token).await }.instrument(span));

        SequenceHandle {
            result_id,
            cancel,
            join,
        }
    }

    /// Play the sequence for a committed result on the current task.
    pub async fn run(&self, details: WinnerDetails, token: CancellationToken) -> SequenceReport {
        let script = script_for(details.result.kind(), &self.inner.delays);
        let mut report = SequenceReport {
            result_id: details.result.id,
            emitted: 0,
            failed: 0,
            cancelled: false,
        };
        info!(steps = script.len(), "Broadcast sequence started");

        for step in script {
            let proceed = if step.delay.is_zero() {
                !token.is_cancelled()
            } else {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => false,
                    _ = self.inner.timer.sleep(step.delay) => true,
                }
            };
            if !proceed {
                report.cancelled = true;
                break;
            }

            for (channel, emission) in step.emissions {
                match self.play(channel, emission, &details).await {
                    Ok(()) => report.emitted += 1,
                    Err(e) => {
                        warn!(channel = %channel, emission = ?emission, error = %e, "Emission failed");
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            emitted = report.emitted,
            failed = report.failed,
            cancelled = report.cancelled,
            "Broadcast sequence finished"
        );
        report
    }

    async fn play(
        &self,
        channel: Channel,
        emission: Emission,
        details: &WinnerDetails,
    ) -> Result<(), BroadcastError> {
        let event = match emission {
            Emission::WinnerAnnounced => BroadcastEvent::WinnerAnnounced(details.result.clone()),
            Emission::FullInfo => BroadcastEvent::FullInfo(details.clone()),
            Emission::DefaultPage => BroadcastEvent::DefaultPage,
            Emission::RecentResults(limit) => self.recent_results(limit).await?,
            Emission::NextDrawPreview => self.next_draw_preview().await?,
        };
        self.emit(channel, event).await
    }

    async fn emit(&self, channel: Channel, event: BroadcastEvent) -> Result<(), BroadcastError> {
        debug!(channel = %channel, event = event.name(), "Emitting");
        self.inner
            .sink
            .emit(EventEnvelope::new(channel, event))
            .await
    }

    async fn recent_results(&self, limit: usize) -> Result<BroadcastEvent, BroadcastError> {
        let results = self
            .inner
            .registry
            .results
            .find_many(&ResultFilter::new().newest_first().limit(limit))
            .await
            .map_err(payload_error)?;
        Ok(BroadcastEvent::RecentResults { limit, results })
    }

    async fn next_draw_preview(&self) -> Result<BroadcastEvent, BroadcastError> {
        let next = self
            .inner
            .calculator
            .resolve(&self.inner.registry)
            .await
            .map_err(payload_error)?;
        Ok(BroadcastEvent::NextDrawPreview(next))
    }

    /// Send the latest `limit` results to one channel.
    pub async fn publish_recent_results(
        &self,
        channel: Channel,
        limit: usize,
    ) -> Result<(), BroadcastError> {
        if limit == 0 {
            return Err(BroadcastError::InvalidRequest(
                "result limit must be greater than zero".into(),
            ));
        }
        let event = self.recent_results(limit).await?;
        self.emit(channel, event).await
    }

    /// Send the upcoming draw to one channel.
    pub async fn publish_next_draw(&self, channel: Channel) -> Result<(), BroadcastError> {
        let event = self.next_draw_preview().await?;
        self.emit(channel, event).await
    }

    /// Return one channel to its idle page.
    pub async fn publish_default_page(&self, channel: Channel) -> Result<(), BroadcastError> {
        self.emit(channel, BroadcastEvent::DefaultPage).await
    }
}

fn payload_error(error: impl Into<EngineError>) -> BroadcastError {
    BroadcastError::Payload(error.into().to_string())
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("delays", &self.inner.delays)
            .finish_non_exhaustive()
    }
}
