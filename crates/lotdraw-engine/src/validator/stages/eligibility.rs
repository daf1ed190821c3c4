use std::sync::Arc;

use async_trait::async_trait;
use lotdraw_types::DrawClass;

use crate::error::{EngineResult, IneligibleReason, NotFoundError, ValidationError};
use crate::store::ParticipantDirectory;
use crate::validator::context::{StageResult, ValidationContext};
use crate::validator::ValidationStage;

/// Stage 2: Participant eligibility
///
/// The participant must exist and be registered in the candidate's group.
/// Priority draws only admit priority-pool participants; general draws admit
/// everyone in the group.
pub struct EligibilityStage {
    participants: Arc<dyn ParticipantDirectory>,
}

impl EligibilityStage {
    pub fn new(participants: Arc<dyn ParticipantDirectory>) -> Self {
        Self { participants }
    }
}

#[async_trait]
impl ValidationStage for EligibilityStage {
    fn stage_name(&self) -> &str {
        "Eligibility"
    }

    fn stage_number(&self) -> u8 {
        2
    }

    async fn evaluate(&self, context: &mut ValidationContext) -> EngineResult<StageResult> {
        let candidate = &context.candidate;
        let participant = self
            .participants
            .get_by_id(candidate.participant_id)
            .await?
            .ok_or(NotFoundError::Participant(candidate.participant_id))?;

        if participant.group != candidate.group {
            return Ok(StageResult::Reject(ValidationError::ParticipantIneligible {
                participant: participant.id,
                reason: IneligibleReason::WrongGroup {
                    registered: participant.group,
                },
            }));
        }

        if candidate.draw_class == DrawClass::Priority
            && !participant.eligible_for(DrawClass::Priority)
        {
            return Ok(StageResult::Reject(ValidationError::ParticipantIneligible {
                participant: participant.id,
                reason: IneligibleReason::NotInPriorityPool,
            }));
        }

        context.participant = Some(participant);
        Ok(StageResult::Pass)
    }
}
