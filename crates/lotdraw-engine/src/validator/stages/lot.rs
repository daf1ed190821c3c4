use std::sync::Arc;

use async_trait::async_trait;
use lotdraw_types::ResultKind;
use tracing::debug;

use crate::error::{EngineResult, LotUnavailableReason, NotFoundError, ValidationError};
use crate::store::{LotDirectory, ResultFilter, ResultStore};
use crate::validator::context::{StageResult, ValidationContext};
use crate::validator::ValidationStage;

/// Stage 4: Lot
///
/// Incumbents must name a lot from their own pool that no committed result
/// links to yet. Alternates never carry a lot.
pub struct LotStage {
    lots: Arc<dyn LotDirectory>,
    results: Arc<dyn ResultStore>,
}

impl LotStage {
    pub fn new(lots: Arc<dyn LotDirectory>, results: Arc<dyn ResultStore>) -> Self {
        Self { lots, results }
    }
}

#[async_trait]
impl ValidationStage for LotStage {
    fn stage_name(&self) -> &str {
        "Lot"
    }

    fn stage_number(&self) -> u8 {
        4
    }

    async fn evaluate(&self, context: &mut ValidationContext) -> EngineResult<StageResult> {
        let candidate = &context.candidate;
        if candidate.kind != ResultKind::Incumbent {
            if let Some(lot) = candidate.lot_id {
                debug!(lot = %lot, "Ignoring lot reference on alternate candidate");
            }
            return Ok(StageResult::Pass);
        }

        let Some(lot_id) = candidate.lot_id else {
            return Ok(StageResult::Reject(ValidationError::LotRequired));
        };

        let lot = self
            .lots
            .get_by_id(lot_id)
            .await?
            .ok_or(NotFoundError::Lot(lot_id))?;

        if !lot.belongs_to(candidate.group, candidate.draw_class) {
            return Ok(StageResult::Reject(ValidationError::LotUnavailable {
                lot: lot_id,
                reason: LotUnavailableReason::WrongPool,
            }));
        }

        let linked = self
            .results
            .find_many(&ResultFilter::new().with_lot(lot_id).limit(1))
            .await?;
        if let Some(holder) = linked.first() {
            return Ok(StageResult::Reject(ValidationError::LotUnavailable {
                lot: lot_id,
                reason: LotUnavailableReason::AlreadyAwarded(holder.id),
            }));
        }

        context.lot = Some(lot);
        Ok(StageResult::Pass)
    }
}
