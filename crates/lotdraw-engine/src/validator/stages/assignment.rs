use std::sync::Arc;

use async_trait::async_trait;
use lotdraw_types::ResultKind;

use crate::error::{EngineResult, ValidationError};
use crate::store::{ResultFilter, ResultStore};
use crate::validator::context::{StageResult, ValidationContext};
use crate::validator::ValidationStage;

/// Stage 3: Existing assignment
///
/// Nobody wins twice in a group: a current incumbent of the group cannot be
/// drawn again, and a current alternate cannot be drawn as another alternate.
/// Only the candidate's group is inspected, regardless of draw class.
pub struct AssignmentStage {
    results: Arc<dyn ResultStore>,
}

impl AssignmentStage {
    pub fn new(results: Arc<dyn ResultStore>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ValidationStage for AssignmentStage {
    fn stage_name(&self) -> &str {
        "Assignment"
    }

    fn stage_number(&self) -> u8 {
        3
    }

    async fn evaluate(&self, context: &mut ValidationContext) -> EngineResult<StageResult> {
        let candidate = &context.candidate;
        let held = self
            .results
            .find_many(
                &ResultFilter::new()
                    .with_participant(candidate.participant_id)
                    .with_group(candidate.group),
            )
            .await?;

        let blocking = held.iter().find(|r| match candidate.kind {
            ResultKind::Incumbent => r.kind() == ResultKind::Incumbent,
            ResultKind::Alternate => true,
        });

        match blocking {
            Some(existing) => Ok(StageResult::Reject(ValidationError::ParticipantAlreadyAssigned {
                participant: candidate.participant_id,
                group: candidate.group,
                kind: existing.kind(),
            })),
            None => Ok(StageResult::Pass),
        }
    }
}
