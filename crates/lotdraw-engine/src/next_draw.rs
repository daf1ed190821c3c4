//! Next-Draw Calculator
//!
//! Answers "what draw comes next" from the global committed-result count.
//! The count is the only input read from storage; everything else comes from
//! the draw schedule.

use std::sync::Arc;

use lotdraw_types::{Lot, ResultKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;
use crate::quota::QuotaSchedule;
use crate::schedule::{DrawSchedule, DrawSlot};
use crate::store::{LotDirectory, Registry, ResultFilter};

/// The upcoming draw, with the lot an incumbent draw is expected to award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDraw {
    #[serde(flatten)]
    pub slot: DrawSlot,
    /// Lot at the slot's position in its pool. Always `None` for alternates,
    /// and `None` when the pool holds fewer lots than the quota.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_lot: Option<Lot>,
}

#[derive(Debug, Clone)]
pub struct NextDrawCalculator {
    schedule: Arc<DrawSchedule>,
}

impl NextDrawCalculator {
    pub fn new(schedule: Arc<DrawSchedule>) -> Self {
        Self { schedule }
    }

    pub fn from_quota(quota: Arc<QuotaSchedule>) -> Self {
        Self::new(Arc::new(DrawSchedule::new(quota)))
    }

    pub fn schedule(&self) -> &Arc<DrawSchedule> {
        &self.schedule
    }

    /// Pure lookup: the slot at index `committed`, or `None` once exhausted.
    pub fn compute(&self, committed: u64) -> Option<DrawSlot> {
        self.schedule.next_after(committed)
    }

    /// Read the committed count and resolve the next draw with its preview lot.
    pub async fn resolve(&self, registry: &Registry) -> EngineResult<Option<NextDraw>> {
        let committed = registry.results.count(&ResultFilter::new()).await?;
        let Some(slot) = self.compute(committed) else {
            debug!(committed, "Draw schedule exhausted");
            return Ok(None);
        };
        let preview_lot = self.preview_lot(&slot, registry.lots.as_ref()).await?;
        Ok(Some(NextDraw { slot, preview_lot }))
    }

    /// The pool's lot at `position` (1-based), for incumbent slots.
    pub async fn preview_lot(
        &self,
        slot: &DrawSlot,
        lots: &dyn LotDirectory,
    ) -> EngineResult<Option<Lot>> {
        if slot.kind != ResultKind::Incumbent {
            return Ok(None);
        }
        let mut pool = lots.get_by_pool(slot.group, slot.draw_class).await?;
        let index = slot.position as usize - 1;
        if index >= pool.len() {
            return Ok(None);
        }
        Ok(Some(pool.swap_remove(index)))
    }
}
