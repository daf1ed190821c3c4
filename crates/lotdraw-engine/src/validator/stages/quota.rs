use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{EngineResult, ValidationError};
use crate::quota::QuotaSchedule;
use crate::validator::context::{StageResult, ValidationContext};
use crate::validator::ValidationStage;

/// Stage 1: Quota
///
/// The candidate's bucket must still have room: committed count strictly
/// below the configured limit.
pub struct QuotaStage {
    quota: Arc<QuotaSchedule>,
}

impl QuotaStage {
    pub fn new(quota: Arc<QuotaSchedule>) -> Self {
        Self { quota }
    }
}

#[async_trait]
impl ValidationStage for QuotaStage {
    fn stage_name(&self) -> &str {
        "Quota"
    }

    fn stage_number(&self) -> u8 {
        1
    }

    async fn evaluate(&self, context: &mut ValidationContext) -> EngineResult<StageResult> {
        let bucket = context.snapshot.bucket;
        let limit = self.quota.limit(bucket);
        let committed = context.snapshot.committed();

        if committed >= limit {
            return Ok(StageResult::Reject(ValidationError::QuotaExceeded {
                bucket,
                limit,
                committed,
            }));
        }
        Ok(StageResult::Pass)
    }
}
