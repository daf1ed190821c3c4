use lotdraw_types::{
    Award, Bucket, DrawResult, Lot, NewResult, Participant, ResultCandidate, ResultKind,
};

use crate::error::{EngineResult, NotFoundError, ValidationError};
use crate::store::CommitFence;

/// Result of a single validation stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageResult {
    /// Stage passed, continue with the next one
    Pass,
    /// Stage rejected the candidate; later stages do not run
    Reject(ValidationError),
}

impl StageResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, StageResult::Pass)
    }
}

/// Committed results of the candidate's bucket and the pool's order
/// high-water mark, read once before any stage runs. Quota, order number and
/// commit fence all derive from it.
#[derive(Clone, Debug)]
pub struct BucketSnapshot {
    pub bucket: Bucket,
    pub results: Vec<DrawResult>,
    pub order_high_water: u32,
}

impl BucketSnapshot {
    pub fn new(bucket: Bucket, results: Vec<DrawResult>, order_high_water: u32) -> Self {
        Self {
            bucket,
            results,
            order_high_water,
        }
    }

    pub fn committed(&self) -> u32 {
        self.results.len() as u32
    }

    /// Order number the next alternate of this bucket receives.
    ///
    /// Continues from the highest number ever issued in the pool, which is
    /// `committed` unless a result was deleted.
    pub fn next_order_number(&self) -> u32 {
        self.order_high_water + 1
    }

    pub fn fence(&self) -> CommitFence {
        CommitFence {
            bucket: self.bucket,
            committed: self.committed(),
            order_high_water: self.order_high_water,
        }
    }
}

/// State carried through the validation stages.
pub struct ValidationContext {
    pub candidate: ResultCandidate,
    pub snapshot: BucketSnapshot,
    /// Set by the eligibility stage
    pub participant: Option<Participant>,
    /// Set by the lot stage for incumbents
    pub lot: Option<Lot>,
    /// Set by the order stage for alternates
    pub order_number: Option<u32>,
}

impl ValidationContext {
    pub fn new(candidate: ResultCandidate, snapshot: BucketSnapshot) -> Self {
        Self {
            candidate,
            snapshot,
            participant: None,
            lot: None,
            order_number: None,
        }
    }

    /// Assemble the insert once every stage has passed.
    pub(crate) fn into_validated(self) -> EngineResult<super::ValidatedCandidate> {
        let participant = self
            .participant
            .ok_or(NotFoundError::Participant(self.candidate.participant_id))?;
        let (award, lot) = match self.candidate.kind {
            ResultKind::Incumbent => {
                let lot_id = self.candidate.lot_id.ok_or(ValidationError::LotRequired)?;
                let lot = self.lot.ok_or(NotFoundError::Lot(lot_id))?;
                (Award::Incumbent { lot_id }, Some(lot))
            }
            ResultKind::Alternate => {
                let order_number = self
                    .order_number
                    .unwrap_or_else(|| self.snapshot.next_order_number());
                (Award::Alternate { order_number }, None)
            }
        };
        let result = NewResult {
            group: self.candidate.group,
            draw_class: self.candidate.draw_class,
            participant_id: self.candidate.participant_id,
            award,
        };
        Ok(super::ValidatedCandidate::new(
            result,
            self.snapshot.fence(),
            participant,
            lot,
        ))
    }
}
