//! In-memory adapters for development and testing

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lotdraw_types::{
    DrawClass, DrawResult, Group, Lot, LotId, NewResult, Participant, ParticipantId, ResultId,
    ResultKind,
};
use tokio::sync::RwLock;

use super::traits::*;
use crate::error::StoreError;

/// Results and per-pool order high-water marks, guarded together.
#[derive(Debug, Default)]
struct ResultState {
    results: BTreeMap<ResultId, DrawResult>,
    order_marks: BTreeMap<(Group, DrawClass), u32>,
}

impl ResultState {
    fn order_mark(&self, group: Group, draw_class: DrawClass) -> u32 {
        self.order_marks
            .get(&(group, draw_class))
            .copied()
            .unwrap_or(0)
    }
}

/// In-memory result store.
///
/// `create` holds the write lock for the whole fence check and insert, which
/// serialises concurrent commits.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    state: Arc<RwLock<ResultState>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored results.
    pub async fn len(&self) -> usize {
        self.state.read().await.results.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.results.is_empty()
    }
}

fn check_fence(state: &ResultState, new: &NewResult, fence: &CommitFence) -> StoreResult<()> {
    let results = &state.results;
    let bucket = new.bucket();
    if fence.bucket != bucket {
        return Err(StoreError::Conflict(format!(
            "fence is for {} but result targets {}",
            fence.bucket, bucket
        )));
    }

    let in_bucket = results.values().filter(|r| r.bucket() == bucket).count();
    if in_bucket as u64 != u64::from(fence.committed) {
        return Err(StoreError::Conflict(format!(
            "{} moved from {} to {} results",
            bucket, fence.committed, in_bucket
        )));
    }

    if let Some(order) = new.award.order_number() {
        let mark = state.order_mark(new.group, new.draw_class);
        if mark != fence.order_high_water || order <= mark {
            return Err(StoreError::Conflict(format!(
                "order number {} is not above the high-water mark {} of {}",
                order, mark, bucket
            )));
        }
    }

    if let Some(lot) = new.award.lot_id() {
        if let Some(holder) = results.values().find(|r| r.lot_id() == Some(lot)) {
            return Err(StoreError::Conflict(format!(
                "{} is already linked to {}",
                lot, holder.id
            )));
        }
    }

    // An incumbent blocks everything in its group; an alternate only blocks
    // another alternate.
    let kind = new.award.kind();
    if let Some(held) = results.values().find(|r| {
        r.participant_id == new.participant_id
            && r.group == new.group
            && (kind == ResultKind::Alternate || r.kind() == ResultKind::Incumbent)
    }) {
        return Err(StoreError::Conflict(format!(
            "{} already holds an {} result in group {}",
            new.participant_id,
            held.kind(),
            new.group
        )));
    }

    Ok(())
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn create(&self, result: NewResult, fence: &CommitFence) -> StoreResult<DrawResult> {
        let mut state = self.state.write().await;
        check_fence(&state, &result, fence)?;

        if let Some(order) = result.award.order_number() {
            let mark = state
                .order_marks
                .entry((result.group, result.draw_class))
                .or_insert(0);
            *mark = (*mark).max(order);
        }

        let id = ResultId::new(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        let committed = result.into_committed(id, Utc::now());
        state.results.insert(id, committed.clone());
        Ok(committed)
    }

    async fn find_many(&self, filter: &ResultFilter) -> StoreResult<Vec<DrawResult>> {
        let state = self.state.read().await;
        let matching = state.results.values().filter(|r| filter.matches(r)).cloned();
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(match filter.order {
            SortOrder::Asc => matching.take(limit).collect(),
            SortOrder::Desc => {
                let mut all: Vec<DrawResult> = matching.collect();
                all.reverse();
                all.truncate(limit);
                all
            }
        })
    }

    async fn count(&self, filter: &ResultFilter) -> StoreResult<u64> {
        let state = self.state.read().await;
        let count = state.results.values().filter(|r| filter.matches(r)).count() as u64;
        Ok(filter.limit.map_or(count, |l| count.min(l as u64)))
    }

    async fn find_one(&self, id: ResultId) -> StoreResult<Option<DrawResult>> {
        let state = self.state.read().await;
        Ok(state.results.get(&id).cloned())
    }

    async fn order_high_water(&self, group: Group, draw_class: DrawClass) -> StoreResult<u32> {
        let state = self.state.read().await;
        Ok(state.order_mark(group, draw_class))
    }

    /// Removes the result only; the pool's order high-water mark stays.
    async fn delete(&self, id: ResultId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.results.remove(&id).is_some())
    }
}

/// In-memory registry of participants and lots
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    participants: Arc<RwLock<BTreeMap<ParticipantId, Participant>>>,
    lots: Arc<RwLock<BTreeMap<LotId, Lot>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with records.
    pub async fn with_records(
        participants: impl IntoIterator<Item = Participant>,
        lots: impl IntoIterator<Item = Lot>,
    ) -> Self {
        let directory = Self::new();
        for participant in participants {
            directory.upsert_participant(participant).await;
        }
        for lot in lots {
            directory.upsert_lot(lot).await;
        }
        directory
    }

    pub async fn upsert_participant(&self, participant: Participant) {
        let mut participants = self.participants.write().await;
        participants.insert(participant.id, participant);
    }

    pub async fn upsert_lot(&self, lot: Lot) {
        let mut lots = self.lots.write().await;
        lots.insert(lot.id, lot);
    }

    pub async fn participant_count(&self) -> usize {
        self.participants.read().await.len()
    }

    pub async fn lot_count(&self) -> usize {
        self.lots.read().await.len()
    }
}

#[async_trait]
impl ParticipantDirectory for InMemoryDirectory {
    async fn get_by_id(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants.get(&id).cloned())
    }

    async fn filter(&self, filter: &ParticipantFilter) -> StoreResult<Vec<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LotDirectory for InMemoryDirectory {
    async fn get_by_id(&self, id: LotId) -> StoreResult<Option<Lot>> {
        let lots = self.lots.read().await;
        Ok(lots.get(&id).cloned())
    }

    async fn get_by_pool(&self, group: Group, draw_class: DrawClass) -> StoreResult<Vec<Lot>> {
        let lots = self.lots.read().await;
        Ok(lots
            .values()
            .filter(|l| l.belongs_to(group, draw_class))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotdraw_types::{Award, Bucket};

    fn g(n: u32) -> Group {
        Group::new(n).unwrap()
    }

    fn alternate(participant: u64, order_number: u32) -> NewResult {
        NewResult {
            group: g(1),
            draw_class: DrawClass::General,
            participant_id: ParticipantId::new(participant),
            award: Award::Alternate { order_number },
        }
    }

    fn incumbent(participant: u64, lot: u64) -> NewResult {
        NewResult {
            group: g(1),
            draw_class: DrawClass::General,
            participant_id: ParticipantId::new(participant),
            award: Award::Incumbent {
                lot_id: LotId::new(lot),
            },
        }
    }

    fn fence(kind: ResultKind, committed: u32, order_high_water: u32) -> CommitFence {
        CommitFence {
            bucket: Bucket::new(g(1), DrawClass::General, kind),
            committed,
            order_high_water,
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = InMemoryResultStore::new();
        let first = store
            .create(alternate(1, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap();
        let second = store
            .create(alternate(2, 2), &fence(ResultKind::Alternate, 1, 1))
            .await
            .unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn stale_fence_is_a_conflict() {
        let store = InMemoryResultStore::new();
        store
            .create(alternate(1, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap();

        let err = store
            .create(alternate(2, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn linked_lot_is_a_conflict() {
        let store = InMemoryResultStore::new();
        store
            .create(incumbent(1, 10), &fence(ResultKind::Incumbent, 0, 0))
            .await
            .unwrap();
        let err = store
            .create(incumbent(2, 10), &fence(ResultKind::Incumbent, 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn second_result_of_same_kind_for_participant_is_a_conflict() {
        let store = InMemoryResultStore::new();
        store
            .create(alternate(1, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap();
        let err = store
            .create(alternate(1, 2), &fence(ResultKind::Alternate, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn alternate_after_incumbent_in_group_is_a_conflict() {
        let store = InMemoryResultStore::new();
        store
            .create(incumbent(1, 10), &fence(ResultKind::Incumbent, 0, 0))
            .await
            .unwrap();

        // fence taken before the incumbent was stored
        let err = store
            .create(alternate(1, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn alternate_may_become_incumbent() {
        let store = InMemoryResultStore::new();
        store
            .create(alternate(1, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap();
        store
            .create(incumbent(1, 10), &fence(ResultKind::Incumbent, 0, 0))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn order_high_water_survives_deletion() {
        let store = InMemoryResultStore::new();
        store
            .create(alternate(1, 1), &fence(ResultKind::Alternate, 0, 0))
            .await
            .unwrap();
        let newest = store
            .create(alternate(2, 2), &fence(ResultKind::Alternate, 1, 1))
            .await
            .unwrap();
        assert!(store.delete(newest.id).await.unwrap());
        assert_eq!(store.order_high_water(g(1), DrawClass::General).await.unwrap(), 2);
        assert_eq!(store.order_high_water(g(1), DrawClass::Priority).await.unwrap(), 0);

        let err = store
            .create(alternate(3, 2), &fence(ResultKind::Alternate, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let next = store
            .create(alternate(3, 3), &fence(ResultKind::Alternate, 1, 2))
            .await
            .unwrap();
        assert_eq!(next.order_number(), Some(3));
    }

    #[tokio::test]
    async fn find_many_orders_and_limits() {
        let store = InMemoryResultStore::new();
        for i in 0..4u32 {
            store
                .create(
                    alternate(u64::from(i) + 1, i + 1),
                    &fence(ResultKind::Alternate, i, i),
                )
                .await
                .unwrap();
        }

        let newest = store
            .find_many(&ResultFilter::new().newest_first().limit(2))
            .await
            .unwrap();
        let orders: Vec<u32> = newest.iter().filter_map(|r| r.order_number()).collect();
        assert_eq!(orders, vec![4, 3]);

        let oldest = store.find_many(&ResultFilter::new().limit(3)).await.unwrap();
        assert_eq!(oldest.len(), 3);
        assert_eq!(oldest[0].order_number(), Some(1));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = InMemoryResultStore::new();
        let result = store
            .create(incumbent(1, 10), &fence(ResultKind::Incumbent, 0, 0))
            .await
            .unwrap();
        assert!(store.delete(result.id).await.unwrap());
        assert!(!store.delete(result.id).await.unwrap());
        assert!(store.find_one(result.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn directory_filters_by_pool() {
        let directory = InMemoryDirectory::new();
        for (id, class) in [(1, DrawClass::Priority), (2, DrawClass::General), (3, DrawClass::General)] {
            directory
                .upsert_lot(Lot {
                    id: LotId::new(id),
                    group: g(1),
                    draw_class: class,
                    denomination: format!("MZ-{}", id),
                    image: None,
                })
                .await;
        }
        let general = directory.get_by_pool(g(1), DrawClass::General).await.unwrap();
        assert_eq!(general.iter().map(|l| l.id.value()).collect::<Vec<_>>(), vec![2, 3]);
        assert!(directory.get_by_pool(g(2), DrawClass::General).await.unwrap().is_empty());
    }
}
