//! Result Validator: staged checks a candidate passes before it is committed.
//!
//! Stages run in a fixed order and the first rejection wins:
//!
//! 1. Quota
//! 2. Participant eligibility
//! 3. Existing assignment in the group
//! 4. Lot availability (incumbents)
//! 5. Order number (alternates)
//!
//! The validator only reads. The snapshot it took of the target bucket
//! travels with the [`ValidatedCandidate`] as a [`CommitFence`], so the store
//! can refuse the insert if the bucket changed in between.

pub mod context;
pub mod stages;

use std::sync::Arc;

use async_trait::async_trait;
use lotdraw_types::{Lot, NewResult, Participant, ResultCandidate, ResultKind};
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::quota::QuotaSchedule;
use crate::store::{CommitFence, Registry, ResultFilter};

pub use context::{BucketSnapshot, StageResult, ValidationContext};

/// A single validation stage.
#[async_trait]
pub trait ValidationStage: Send + Sync {
    fn stage_name(&self) -> &str;

    fn stage_number(&self) -> u8;

    /// Inspect (and enrich) the context. `Err` is reserved for lookups that
    /// failed outright; rule violations are `Ok(StageResult::Reject(..))`.
    async fn evaluate(&self, context: &mut ValidationContext) -> EngineResult<StageResult>;
}

/// A candidate that passed every stage, paired with the fence its insert must
/// honour and the records the stages resolved. Only the validator constructs
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCandidate {
    result: NewResult,
    fence: CommitFence,
    participant: Participant,
    lot: Option<Lot>,
}

impl ValidatedCandidate {
    pub(crate) fn new(
        result: NewResult,
        fence: CommitFence,
        participant: Participant,
        lot: Option<Lot>,
    ) -> Self {
        Self {
            result,
            fence,
            participant,
            lot,
        }
    }

    pub fn result(&self) -> &NewResult {
        &self.result
    }

    pub fn fence(&self) -> &CommitFence {
        &self.fence
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// The awarded lot, for incumbents
    pub fn lot(&self) -> Option<&Lot> {
        self.lot.as_ref()
    }

    pub(crate) fn into_parts(self) -> (NewResult, CommitFence, Participant, Option<Lot>) {
        (self.result, self.fence, self.participant, self.lot)
    }
}

/// The five-stage pipeline over one registry and quota schedule.
pub struct ResultValidator {
    stages: Vec<Box<dyn ValidationStage>>,
    registry: Registry,
}

impl ResultValidator {
    /// Standard pipeline.
    pub fn new(quota: Arc<QuotaSchedule>, registry: Registry) -> Self {
        let stages: Vec<Box<dyn ValidationStage>> = vec![
            Box::new(stages::QuotaStage::new(quota)),
            Box::new(stages::EligibilityStage::new(registry.participants.clone())),
            Box::new(stages::AssignmentStage::new(registry.results.clone())),
            Box::new(stages::LotStage::new(
                registry.lots.clone(),
                registry.results.clone(),
            )),
            Box::new(stages::OrderNumberStage::new()),
        ];
        Self { stages, registry }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.stage_name()).collect()
    }

    /// Run every stage against the candidate.
    pub async fn validate(&self, candidate: ResultCandidate) -> EngineResult<ValidatedCandidate> {
        let bucket = candidate.bucket();
        let in_bucket = self
            .registry
            .results
            .find_many(&ResultFilter::for_bucket(bucket))
            .await?;
        let order_high_water = match bucket.kind {
            ResultKind::Alternate => {
                self.registry
                    .results
                    .order_high_water(bucket.group, bucket.draw_class)
                    .await?
            }
            ResultKind::Incumbent => 0,
        };
        let snapshot = BucketSnapshot::new(bucket, in_bucket, order_high_water);
        let mut context = ValidationContext::new(candidate, snapshot);

        for stage in &self.stages {
            let result = stage.evaluate(&mut context).await?;
            debug!(
                stage = stage.stage_number(),
                name = stage.stage_name(),
                passed = result.is_pass(),
                "Validation stage evaluated"
            );

            if let StageResult::Reject(error) = result {
                warn!(
                    stage = stage.stage_name(),
                    participant = %context.candidate.participant_id,
                    bucket = %bucket,
                    error = %error,
                    "Candidate rejected"
                );
                return Err(error.into());
            }
        }

        context.into_validated()
    }
}

impl std::fmt::Debug for ResultValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultValidator")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}
