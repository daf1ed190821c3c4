//! Draw schedule: the quota schedule flattened into one ordered run of draws.
//!
//! The flattening is derived from configuration alone, so the next draw is a
//! pure function of how many results have been committed. Nothing about the
//! cursor is persisted; a restarted process computes the same answer.

use std::sync::Arc;

use lotdraw_types::{Bucket, DrawClass, Group, ResultKind};
use serde::{Deserialize, Serialize};

use crate::quota::QuotaSchedule;

/// One scheduled draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSlot {
    pub group: Group,
    pub draw_class: DrawClass,
    #[serde(rename = "resultKind")]
    pub kind: ResultKind,
    /// 1-based position inside the bucket. For alternates this is the order
    /// number the draw would receive.
    pub position: u32,
    /// 1-based position in the whole schedule
    pub global_draw_number: u64,
}

impl DrawSlot {
    pub const fn bucket(&self) -> Bucket {
        Bucket::new(self.group, self.draw_class, self.kind)
    }
}

/// A contiguous run of slots belonging to one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRun {
    pub bucket: Bucket,
    /// 0-based index of the run's first slot in the schedule
    pub first_index: u64,
    pub len: u32,
}

impl SlotRun {
    fn end(&self) -> u64 {
        self.first_index + u64::from(self.len)
    }
}

/// Deterministic total order of every scheduled draw.
///
/// Slots are stored as one run per non-empty bucket rather than expanded, so
/// lookups are a binary search over at most four runs per group.
#[derive(Debug, Clone)]
pub struct DrawSchedule {
    quota: Arc<QuotaSchedule>,
    runs: Vec<SlotRun>,
    total: u64,
}

impl DrawSchedule {
    pub fn new(quota: Arc<QuotaSchedule>) -> Self {
        let mut runs = Vec::new();
        let mut total = 0u64;
        for bucket in quota.buckets() {
            let len = quota.limit(bucket);
            if len == 0 {
                continue;
            }
            runs.push(SlotRun {
                bucket,
                first_index: total,
                len,
            });
            total += u64::from(len);
        }
        Self { quota, runs, total }
    }

    pub fn quota(&self) -> &Arc<QuotaSchedule> {
        &self.quota
    }

    pub fn runs(&self) -> &[SlotRun] {
        &self.runs
    }

    pub fn total_slots(&self) -> u64 {
        self.total
    }

    /// The slot at a 0-based cursor, or `None` once the schedule is exhausted.
    pub fn slot_at(&self, cursor: u64) -> Option<DrawSlot> {
        let idx = self.runs.partition_point(|run| run.end() <= cursor);
        let run = self.runs.get(idx)?;
        let offset = cursor - run.first_index;
        Some(DrawSlot {
            group: run.bucket.group,
            draw_class: run.bucket.draw_class,
            kind: run.bucket.kind,
            // offset < run.len, which is a u32
            position: offset as u32 + 1,
            global_draw_number: cursor + 1,
        })
    }

    /// The next draw given the number of committed results.
    pub fn next_after(&self, committed: u64) -> Option<DrawSlot> {
        self.slot_at(committed)
    }

    /// Every slot in order.
    pub fn slots(&self) -> impl Iterator<Item = DrawSlot> + '_ {
        (0..self.total).filter_map(move |cursor| self.slot_at(cursor))
    }
}
