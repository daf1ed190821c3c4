//! Draw Engine: the entry point collaborators talk to.

use std::collections::BTreeSet;
use std::sync::Arc;

use lotdraw_types::{
    Bucket, DrawClass, DrawResult, Group, Lot, LotId, Participant, ParticipantId,
    ResultCandidate, ResultId, ResultKind,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::broadcast::{
    BroadcastDelays, BroadcastSink, Broadcaster, SequenceHandle, Timer, TokioTimer,
    WinnerDetails,
};
use crate::error::{EngineResult, NotFoundError};
use crate::next_draw::{NextDraw, NextDrawCalculator};
use crate::quota::QuotaSchedule;
use crate::schedule::{DrawSchedule, DrawSlot};
use crate::store::{ParticipantFilter, Registry, ResultFilter};
use crate::validator::{ResultValidator, ValidatedCandidate};

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How often `submit` validates and commits before giving up on
    /// conflicting concurrent commits (default: 3)
    pub commit_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { commit_attempts: 3 }
    }
}

/// A stored result and the broadcast sequence it started, if broadcasting is
/// enabled.
#[derive(Debug)]
pub struct Committed {
    pub result: DrawResult,
    pub sequence: Option<SequenceHandle>,
}

/// Fill level of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketProgress {
    pub bucket: Bucket,
    pub committed: u64,
    pub limit: u32,
}

impl BucketProgress {
    pub fn remaining(&self) -> u64 {
        u64::from(self.limit).saturating_sub(self.committed)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }
}

pub struct DrawEngineBuilder {
    quota: Arc<QuotaSchedule>,
    registry: Registry,
    config: EngineConfig,
    sink: Option<Arc<dyn BroadcastSink>>,
    timer: Arc<dyn Timer>,
    delays: BroadcastDelays,
}

impl DrawEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Broadcast every commit to `sink`.
    pub fn broadcast_to(mut self, sink: Arc<dyn BroadcastSink>, delays: BroadcastDelays) -> Self {
        self.sink = Some(sink);
        self.delays = delays;
        self
    }

    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn build(self) -> DrawEngine {
        let schedule = Arc::new(DrawSchedule::new(self.quota.clone()));
        let calculator = NextDrawCalculator::new(schedule);
        let broadcaster = self.sink.map(|sink| {
            Broadcaster::with_timer(
                self.registry.clone(),
                calculator.clone(),
                sink,
                self.timer,
                self.delays,
            )
        });

        DrawEngine {
            validator: ResultValidator::new(self.quota.clone(), self.registry.clone()),
            quota: self.quota,
            registry: self.registry,
            calculator,
            broadcaster,
            config: self.config,
        }
    }
}

/// Validates, commits and announces draw results.
///
/// The quota schedule is shared by the validator and the next-draw
/// calculator, so both always see the same limits.
#[derive(Debug)]
pub struct DrawEngine {
    quota: Arc<QuotaSchedule>,
    registry: Registry,
    validator: ResultValidator,
    calculator: NextDrawCalculator,
    broadcaster: Option<Broadcaster>,
    config: EngineConfig,
}

impl DrawEngine {
    pub fn builder(quota: Arc<QuotaSchedule>, registry: Registry) -> DrawEngineBuilder {
        DrawEngineBuilder {
            quota,
            registry,
            config: EngineConfig::default(),
            sink: None,
            timer: Arc::new(TokioTimer),
            delays: BroadcastDelays::default(),
        }
    }

    /// Engine without broadcasting.
    pub fn new(quota: Arc<QuotaSchedule>, registry: Registry) -> Self {
        Self::builder(quota, registry).build()
    }

    pub fn quota(&self) -> &Arc<QuotaSchedule> {
        &self.quota
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn schedule(&self) -> &Arc<DrawSchedule> {
        self.calculator.schedule()
    }

    pub fn broadcaster(&self) -> Option<&Broadcaster> {
        self.broadcaster.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Commit path ─────────────────────────────────────────────────────

    pub async fn validate(&self, candidate: ResultCandidate) -> EngineResult<ValidatedCandidate> {
        self.validator.validate(candidate).await
    }

    /// Store a validated candidate, then start its broadcast.
    ///
    /// A store failure (including a fence conflict) is returned unchanged
    /// and nothing is broadcast.
    pub async fn commit(&self, validated: ValidatedCandidate) -> EngineResult<Committed> {
        let (new_result, fence, participant, lot) = validated.into_parts();
        let result = self.registry.results.create(new_result, &fence).await?;

        info!(
            result_id = %result.id,
            participant = %result.participant_id,
            bucket = %result.bucket(),
            order_number = ?result.order_number(),
            lot = ?result.lot_id(),
            "Result committed"
        );

        let sequence = self.broadcaster.as_ref().map(|b| {
            b.spawn(WinnerDetails {
                result: result.clone(),
                participant,
                lot,
            })
        });
        Ok(Committed { result, sequence })
    }

    /// Validate and commit, validating again when a concurrent commit moved
    /// the bucket in between.
    pub async fn submit(&self, candidate: ResultCandidate) -> EngineResult<Committed> {
        let attempts = self.config.commit_attempts.max(1);
        let mut attempt = 1;
        loop {
            let validated = self.validate(candidate.clone()).await?;
            match self.commit(validated).await {
                Err(e) if e.is_conflict() && attempt < attempts => {
                    warn!(
                        attempt,
                        participant = %candidate.participant_id,
                        bucket = %candidate.bucket(),
                        error = %e,
                        "Commit conflict, validating again"
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    // ── Next draw ───────────────────────────────────────────────────────

    pub fn compute_next_draw(&self, committed: u64) -> Option<DrawSlot> {
        self.calculator.compute(committed)
    }

    pub async fn next_draw(&self) -> EngineResult<Option<NextDraw>> {
        self.calculator.resolve(&self.registry).await
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub async fn results(&self, filter: &ResultFilter) -> EngineResult<Vec<DrawResult>> {
        Ok(self.registry.results.find_many(filter).await?)
    }

    pub async fn result(&self, id: ResultId) -> EngineResult<DrawResult> {
        self.registry
            .results
            .find_one(id)
            .await?
            .ok_or_else(|| NotFoundError::Result(id).into())
    }

    /// The most recently committed result.
    pub async fn last_result(&self) -> EngineResult<DrawResult> {
        self.recent_results(1)
            .await?
            .pop()
            .ok_or_else(|| NotFoundError::NoResults.into())
    }

    /// Every result a participant holds, oldest first.
    pub async fn result_for_participant(&self, id: ParticipantId) -> EngineResult<Vec<DrawResult>> {
        if self.registry.participants.get_by_id(id).await?.is_none() {
            return Err(NotFoundError::Participant(id).into());
        }
        self.results(&ResultFilter::new().with_participant(id)).await
    }

    /// The result a lot was awarded by, if any.
    pub async fn result_for_lot(&self, id: LotId) -> EngineResult<Option<DrawResult>> {
        if self.registry.lots.get_by_id(id).await?.is_none() {
            return Err(NotFoundError::Lot(id).into());
        }
        Ok(self
            .results(&ResultFilter::new().with_lot(id).limit(1))
            .await?
            .pop())
    }

    /// Newest first.
    pub async fn recent_results(&self, limit: usize) -> EngineResult<Vec<DrawResult>> {
        self.results(&ResultFilter::new().newest_first().limit(limit))
            .await
    }

    /// Administrative removal.
    ///
    /// The lot becomes available again. Later order numbers are not
    /// renumbered, and the pool's order high-water mark is kept so a deleted
    /// order number is never issued again.
    pub async fn delete_result(&self, id: ResultId) -> EngineResult<DrawResult> {
        let result = self.result(id).await?;
        if !self.registry.results.delete(id).await? {
            return Err(NotFoundError::Result(id).into());
        }
        warn!(
            result_id = %id,
            bucket = %result.bucket(),
            "Result deleted"
        );
        Ok(result)
    }

    /// Participants the physical draw may pick for `slot`.
    pub async fn eligible_participants(&self, slot: &DrawSlot) -> EngineResult<Vec<Participant>> {
        let held = self
            .results(&ResultFilter::new().with_group(slot.group))
            .await?;
        let excluded: BTreeSet<ParticipantId> = held
            .iter()
            .filter(|r| r.kind() == ResultKind::Incumbent || slot.kind == ResultKind::Alternate)
            .map(|r| r.participant_id)
            .collect();

        let filter = ParticipantFilter::new()
            .with_group(slot.group)
            .eligible_for(slot.draw_class)
            .excluding(excluded);
        let participants = self.registry.participants.filter(&filter).await?;
        debug!(
            slot = slot.global_draw_number,
            eligible = participants.len(),
            "Eligible participants resolved"
        );
        Ok(participants)
    }

    /// Lots of a pool that no result links to yet, ordered by id.
    pub async fn available_lots(&self, group: Group, draw_class: DrawClass) -> EngineResult<Vec<Lot>> {
        let awarded: BTreeSet<LotId> = self
            .results(
                &ResultFilter::new()
                    .with_group(group)
                    .with_draw_class(draw_class)
                    .with_kind(ResultKind::Incumbent),
            )
            .await?
            .iter()
            .filter_map(|r| r.lot_id())
            .collect();

        Ok(self
            .registry
            .lots
            .get_by_pool(group, draw_class)
            .await?
            .into_iter()
            .filter(|lot| !awarded.contains(&lot.id))
            .collect())
    }

    /// Committed against configured count of every bucket, in draw order.
    pub async fn progress(&self) -> EngineResult<Vec<BucketProgress>> {
        let mut progress = Vec::new();
        for bucket in self.quota.buckets() {
            let committed = self
                .registry
                .results
                .count(&ResultFilter::for_bucket(bucket))
                .await?;
            progress.push(BucketProgress {
                bucket,
                committed,
                limit: self.quota.limit(bucket),
            });
        }
        Ok(progress)
    }
}
