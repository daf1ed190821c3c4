mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::{g, registry, small_quota};
use lotdraw_engine::{
    BroadcastDelays, CommitFence, DrawEngine, EngineConfig, EngineError, InMemoryResultStore,
    LotUnavailableReason, NotFoundError, RecordingSink, RecordingTimer, Registry, ResultFilter,
    ResultStore, StoreError, ValidationError,
};
use lotdraw_types::{
    DrawClass, DrawResult, Group, LotId, NewResult, ParticipantId, ResultCandidate, ResultId,
    ResultKind,
};

fn incumbent(participant: u64, class: DrawClass, lot: u64) -> ResultCandidate {
    ResultCandidate::incumbent(g(1), class, ParticipantId::new(participant), LotId::new(lot))
}

fn alternate(participant: u64, class: DrawClass) -> ResultCandidate {
    ResultCandidate::alternate(g(1), class, ParticipantId::new(participant))
}

async fn engine() -> DrawEngine {
    DrawEngine::new(small_quota(), registry().await)
}

#[tokio::test]
async fn third_priority_incumbent_exceeds_quota() {
    let engine = engine().await;
    engine.submit(incumbent(1, DrawClass::Priority, 101)).await.unwrap();
    engine.submit(incumbent(2, DrawClass::Priority, 102)).await.unwrap();

    let err = engine
        .submit(incumbent(3, DrawClass::Priority, 101))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::QuotaExceeded { limit: 2, committed: 2, .. })
    ));
}

#[tokio::test]
async fn alternates_are_numbered_in_commit_order() {
    let engine = engine().await;
    let mut orders = Vec::new();
    for id in [4, 7, 2] {
        let committed = engine.submit(alternate(id, DrawClass::Priority)).await.unwrap();
        orders.push(committed.result.order_number());
    }
    assert_eq!(orders, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn incumbent_lot_rules() {
    let engine = engine().await;

    let err = engine
        .submit(incumbent(1, DrawClass::Priority, 101).with_lot(None))
        .await
        .unwrap_err();
    assert_eq!(err.as_validation(), Some(&ValidationError::LotRequired));

    let first = engine.submit(incumbent(1, DrawClass::Priority, 101)).await.unwrap();
    let err = engine
        .submit(incumbent(2, DrawClass::Priority, 101))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::LotUnavailable {
            lot: LotId::new(101),
            reason: LotUnavailableReason::AlreadyAwarded(first.result.id),
        })
    );
}

#[tokio::test]
async fn rejected_candidates_leave_no_trace() {
    let engine = engine().await;
    let _ = engine.submit(alternate(11, DrawClass::Priority)).await.unwrap_err();
    let _ = engine.submit(alternate(99, DrawClass::General)).await.unwrap_err();
    assert!(engine.recent_results(10).await.unwrap().is_empty());
    assert_eq!(
        engine.last_result().await.unwrap_err(),
        EngineError::NotFound(NotFoundError::NoResults)
    );
}

#[tokio::test]
async fn next_draw_walks_the_schedule() {
    let engine = engine().await;

    let first = engine.next_draw().await.unwrap().unwrap();
    assert_eq!(first.slot.global_draw_number, 1);
    assert_eq!(first.slot.draw_class, DrawClass::Priority);
    assert_eq!(first.slot.kind, ResultKind::Incumbent);
    assert_eq!(first.preview_lot.map(|l| l.id), Some(LotId::new(101)));

    engine.submit(incumbent(1, DrawClass::Priority, 101)).await.unwrap();
    engine.submit(incumbent(2, DrawClass::Priority, 102)).await.unwrap();

    let third = engine.next_draw().await.unwrap().unwrap();
    assert_eq!(third.slot.global_draw_number, 3);
    assert_eq!(third.slot.kind, ResultKind::Alternate);
    assert_eq!(third.slot.position, 1);
    assert!(third.preview_lot.is_none());

    assert_eq!(engine.compute_next_draw(2), Some(third.slot));
    assert_eq!(engine.compute_next_draw(15), None);
}

#[tokio::test]
async fn eligibility_and_availability_follow_commits() {
    let engine = engine().await;
    engine.submit(incumbent(1, DrawClass::Priority, 101)).await.unwrap();
    engine.submit(alternate(2, DrawClass::Priority)).await.unwrap();

    let slot = engine.compute_next_draw(2).unwrap();
    assert_eq!((slot.draw_class, slot.kind), (DrawClass::Priority, ResultKind::Alternate));
    let ids: BTreeSet<u64> = engine
        .eligible_participants(&slot)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id.value())
        .collect();
    assert_eq!(ids, (3..=10).collect());

    let general_incumbent = engine.compute_next_draw(10).unwrap();
    assert_eq!(general_incumbent.draw_class, DrawClass::General);
    assert_eq!(general_incumbent.kind, ResultKind::Incumbent);
    let ids: BTreeSet<u64> = engine
        .eligible_participants(&general_incumbent)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id.value())
        .collect();
    // the priority alternate may still win a general lot; the incumbent may not
    assert!(ids.contains(&2));
    assert!(!ids.contains(&1));
    assert_eq!(ids.len(), 29);

    let lots: Vec<u64> = engine
        .available_lots(g(1), DrawClass::Priority)
        .await
        .unwrap()
        .iter()
        .map(|l| l.id.value())
        .collect();
    assert_eq!(lots, vec![102]);
}

#[tokio::test]
async fn deletion_frees_the_lot_but_never_reuses_order_numbers() {
    let engine = engine().await;
    let awarded = engine.submit(incumbent(1, DrawClass::Priority, 101)).await.unwrap();
    let first = engine.submit(alternate(2, DrawClass::Priority)).await.unwrap();
    engine.submit(alternate(3, DrawClass::Priority)).await.unwrap();

    engine.delete_result(first.result.id).await.unwrap();
    let next = engine.submit(alternate(4, DrawClass::Priority)).await.unwrap();
    assert_eq!(next.result.order_number(), Some(3));

    engine.delete_result(awarded.result.id).await.unwrap();
    assert_eq!(engine.result_for_lot(LotId::new(101)).await.unwrap(), None);
    assert!(engine
        .available_lots(g(1), DrawClass::Priority)
        .await
        .unwrap()
        .iter()
        .any(|l| l.id == LotId::new(101)));

    assert_eq!(
        engine.delete_result(awarded.result.id).await.unwrap_err(),
        EngineError::NotFound(NotFoundError::Result(awarded.result.id))
    );
}

#[tokio::test]
async fn deleting_the_newest_alternate_does_not_free_its_order_number() {
    let engine = engine().await;
    engine.submit(alternate(2, DrawClass::Priority)).await.unwrap();
    let newest = engine.submit(alternate(3, DrawClass::Priority)).await.unwrap();
    assert_eq!(newest.result.order_number(), Some(2));

    engine.delete_result(newest.result.id).await.unwrap();
    let next = engine.submit(alternate(4, DrawClass::Priority)).await.unwrap();
    assert_eq!(next.result.order_number(), Some(3));

    let orders: Vec<u32> = engine
        .results(&ResultFilter::new().with_kind(ResultKind::Alternate))
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.order_number())
        .collect();
    assert_eq!(orders, vec![1, 3]);
}

#[tokio::test]
async fn stale_alternate_validation_cannot_follow_an_incumbent() {
    let engine = engine().await;
    let as_incumbent = engine.validate(incumbent(12, DrawClass::General, 201)).await.unwrap();
    let as_alternate = engine.validate(alternate(12, DrawClass::General)).await.unwrap();

    engine.commit(as_incumbent).await.unwrap();
    let err = engine.commit(as_alternate).await.unwrap_err();
    assert!(err.is_conflict());

    let err = engine.submit(alternate(12, DrawClass::General)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(ValidationError::ParticipantAlreadyAssigned {
            participant: ParticipantId::new(12),
            group: g(1),
            kind: ResultKind::Incumbent,
        })
    );
    assert_eq!(
        engine
            .result_for_participant(ParticipantId::new(12))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn lookups_by_participant_and_lot() {
    let engine = engine().await;
    let alt = engine.submit(alternate(5, DrawClass::Priority)).await.unwrap();
    let inc = engine.submit(incumbent(5, DrawClass::General, 202)).await.unwrap();

    let held = engine
        .result_for_participant(ParticipantId::new(5))
        .await
        .unwrap();
    assert_eq!(held, vec![alt.result.clone(), inc.result.clone()]);
    assert_eq!(
        engine.result_for_lot(LotId::new(202)).await.unwrap(),
        Some(inc.result.clone())
    );
    assert_eq!(engine.last_result().await.unwrap(), inc.result);
    assert_eq!(engine.result(alt.result.id).await.unwrap(), alt.result);

    assert!(matches!(
        engine.result_for_participant(ParticipantId::new(404)).await,
        Err(EngineError::NotFound(NotFoundError::Participant(_)))
    ));
    assert!(matches!(
        engine.result_for_lot(LotId::new(404)).await,
        Err(EngineError::NotFound(NotFoundError::Lot(_)))
    ));
    assert!(matches!(
        engine.result(ResultId::new(404)).await,
        Err(EngineError::NotFound(NotFoundError::Result(_)))
    ));
}

#[tokio::test]
async fn progress_reports_every_bucket_in_draw_order() {
    let engine = engine().await;
    engine.submit(incumbent(1, DrawClass::Priority, 101)).await.unwrap();
    engine.submit(alternate(12, DrawClass::General)).await.unwrap();

    let progress = engine.progress().await.unwrap();
    let summary: Vec<(DrawClass, ResultKind, u64, u32)> = progress
        .iter()
        .map(|p| (p.bucket.draw_class, p.bucket.kind, p.committed, p.limit))
        .collect();
    assert_eq!(
        summary,
        vec![
            (DrawClass::Priority, ResultKind::Incumbent, 1, 2),
            (DrawClass::Priority, ResultKind::Alternate, 0, 8),
            (DrawClass::General, ResultKind::Incumbent, 0, 3),
            (DrawClass::General, ResultKind::Alternate, 1, 2),
        ]
    );
    assert!(!progress[0].is_complete());
    assert_eq!(progress[2].remaining(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_never_overrun_a_bucket() {
    let engine = Arc::new(engine().await);

    let handles: Vec<_> = (11..=20)
        .map(|id| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.submit(alternate(id, DrawClass::General)).await })
        })
        .collect();

    let mut orders = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(committed) => orders.push(committed.result.order_number().unwrap()),
            Err(e) => assert!(
                e.is_conflict() || matches!(e.as_validation(), Some(ValidationError::QuotaExceeded { .. })),
                "unexpected error: {e}"
            ),
        }
    }
    orders.sort_unstable();
    assert_eq!(orders, vec![1, 2]);

    let stored = engine
        .results(&ResultFilter::new().with_draw_class(DrawClass::General))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}

/// Store whose inserts always fail at the backend.
struct BrokenStore(InMemoryResultStore);

#[async_trait]
impl ResultStore for BrokenStore {
    async fn create(&self, _: NewResult, _: &CommitFence) -> Result<DrawResult, StoreError> {
        Err(StoreError::Backend("disk full".into()))
    }

    async fn find_many(&self, filter: &ResultFilter) -> Result<Vec<DrawResult>, StoreError> {
        self.0.find_many(filter).await
    }

    async fn count(&self, filter: &ResultFilter) -> Result<u64, StoreError> {
        self.0.count(filter).await
    }

    async fn find_one(&self, id: ResultId) -> Result<Option<DrawResult>, StoreError> {
        self.0.find_one(id).await
    }

    async fn order_high_water(&self, group: Group, draw_class: DrawClass) -> Result<u32, StoreError> {
        self.0.order_high_water(group, draw_class).await
    }

    async fn delete(&self, id: ResultId) -> Result<bool, StoreError> {
        self.0.delete(id).await
    }
}

#[tokio::test]
async fn store_failure_aborts_commit_without_broadcast() {
    let base = registry().await;
    let registry = Registry::new(
        Arc::new(BrokenStore(InMemoryResultStore::new())),
        base.participants.clone(),
        base.lots.clone(),
    );
    let sink = Arc::new(RecordingSink::new());
    let engine = DrawEngine::builder(small_quota(), registry)
        .config(EngineConfig { commit_attempts: 5 })
        .broadcast_to(sink.clone(), BroadcastDelays::immediate())
        .timer(Arc::new(RecordingTimer::new()))
        .build();

    let err = engine
        .submit(incumbent(1, DrawClass::Priority, 101))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Store(StoreError::Backend("disk full".into())));
    assert!(sink.envelopes().is_empty());
}
