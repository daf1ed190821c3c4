use async_trait::async_trait;
use lotdraw_types::ResultKind;

use crate::error::EngineResult;
use crate::validator::context::{StageResult, ValidationContext};
use crate::validator::ValidationStage;

/// Stage 5: Order number
///
/// Alternates receive the next order number of their bucket, taken from the
/// same snapshot the quota stage checked.
pub struct OrderNumberStage;

impl OrderNumberStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrderNumberStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValidationStage for OrderNumberStage {
    fn stage_name(&self) -> &str {
        "Order Number"
    }

    fn stage_number(&self) -> u8 {
        5
    }

    async fn evaluate(&self, context: &mut ValidationContext) -> EngineResult<StageResult> {
        if context.candidate.kind == ResultKind::Alternate {
            context.order_number = Some(context.snapshot.next_order_number());
        }
        Ok(StageResult::Pass)
    }
}
