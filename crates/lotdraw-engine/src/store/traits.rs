//! Storage and lookup contracts consumed by the engine

use std::collections::BTreeSet;

use async_trait::async_trait;
use lotdraw_types::{
    Bucket, DrawClass, DrawResult, Group, Lot, LotId, NewResult, Participant, ParticipantId,
    ResultId, ResultKind,
};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Ordering by commit order (result id).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Predicate over committed results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub group: Option<Group>,
    pub draw_class: Option<DrawClass>,
    pub kind: Option<ResultKind>,
    pub participant: Option<ParticipantId>,
    pub lot: Option<LotId>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every result of one quota bucket.
    pub fn for_bucket(bucket: Bucket) -> Self {
        Self::new()
            .with_group(bucket.group)
            .with_draw_class(bucket.draw_class)
            .with_kind(bucket.kind)
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_draw_class(mut self, draw_class: DrawClass) -> Self {
        self.draw_class = Some(draw_class);
        self
    }

    pub fn with_kind(mut self, kind: ResultKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }

    pub fn with_lot(mut self, lot: LotId) -> Self {
        self.lot = Some(lot);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::Desc;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check the predicate part of the filter (ordering and limit aside).
    pub fn matches(&self, result: &DrawResult) -> bool {
        self.group.map_or(true, |g| result.group == g)
            && self.draw_class.map_or(true, |c| result.draw_class == c)
            && self.kind.map_or(true, |k| result.kind() == k)
            && self.participant.map_or(true, |p| result.participant_id == p)
            && self.lot.map_or(true, |l| result.lot_id() == Some(l))
    }
}

/// What validation observed about the target bucket.
///
/// Handed to [`ResultStore::create`], which must refuse the insert if the
/// bucket moved on since the snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitFence {
    pub bucket: Bucket,
    /// Committed results in the bucket at validation time
    pub committed: u32,
    /// Order-number high-water mark of the pool at validation time
    pub order_high_water: u32,
}

/// Persisted draw results.
///
/// `create` is the only write on the commit path and must be atomic with
/// respect to other creates on the same bucket: implementations re-check the
/// fence, lot uniqueness and participant exclusivity under their own
/// exclusion (lock, transaction or unique constraint) and answer
/// [`StoreError::Conflict`] when any of them fails.
///
/// Each (group, draw class) pool keeps an order-number high-water mark: the
/// highest alternate order number ever stored there. Deleting a result never
/// lowers it, so a deleted number is never handed out again.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn create(&self, result: NewResult, fence: &CommitFence) -> StoreResult<DrawResult>;

    async fn find_many(&self, filter: &ResultFilter) -> StoreResult<Vec<DrawResult>>;

    async fn count(&self, filter: &ResultFilter) -> StoreResult<u64>;

    async fn find_one(&self, id: ResultId) -> StoreResult<Option<DrawResult>>;

    /// Highest order number ever issued in a pool, `0` before the first
    /// alternate.
    async fn order_high_water(&self, group: Group, draw_class: DrawClass) -> StoreResult<u32>;

    /// Remove a result. Returns whether it existed.
    async fn delete(&self, id: ResultId) -> StoreResult<bool>;
}

/// Participant selection criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantFilter {
    pub group: Option<Group>,
    /// Restrict to participants eligible for this draw class
    pub eligible_for: Option<DrawClass>,
    /// Participants to leave out, e.g. those already holding a result
    pub exclude: BTreeSet<ParticipantId>,
}

impl ParticipantFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    pub fn eligible_for(mut self, draw_class: DrawClass) -> Self {
        self.eligible_for = Some(draw_class);
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = ParticipantId>) -> Self {
        self.exclude.extend(ids);
        self
    }

    pub fn matches(&self, participant: &Participant) -> bool {
        self.group.map_or(true, |g| participant.group == g)
            && self
                .eligible_for
                .map_or(true, |c| participant.eligible_for(c))
            && !self.exclude.contains(&participant.id)
    }
}

/// Read access to registered participants
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn get_by_id(&self, id: ParticipantId) -> StoreResult<Option<Participant>>;

    /// Participants matching the filter, ordered by id
    async fn filter(&self, filter: &ParticipantFilter) -> StoreResult<Vec<Participant>>;
}

/// Read access to the lots on offer
#[async_trait]
pub trait LotDirectory: Send + Sync {
    async fn get_by_id(&self, id: LotId) -> StoreResult<Option<Lot>>;

    /// The lot pool of one (group, draw class), ordered by id
    async fn get_by_pool(&self, group: Group, draw_class: DrawClass) -> StoreResult<Vec<Lot>>;
}
