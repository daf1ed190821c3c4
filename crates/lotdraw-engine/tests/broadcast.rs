mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{g, registry, small_quota};
use lotdraw_engine::{
    BroadcastDelays, BroadcastError, BroadcastEvent, BroadcastSink, Channel, ChannelHub,
    DrawEngine, FailingSink, RecordingSink, RecordingTimer, Timer,
};
use lotdraw_types::{DrawClass, LotId, ParticipantId, ResultCandidate};

use Channel::{Broadcast, MainScreen, Prompter};

async fn engine_with(sink: Arc<dyn BroadcastSink>, timer: Arc<dyn Timer>) -> DrawEngine {
    DrawEngine::builder(small_quota(), registry().await)
        .broadcast_to(sink, BroadcastDelays::default())
        .timer(timer)
        .build()
}

fn first_incumbent() -> ResultCandidate {
    ResultCandidate::incumbent(g(1), DrawClass::Priority, ParticipantId::new(1), LotId::new(101))
}

#[tokio::test]
async fn incumbent_sequence_plays_in_order() {
    let sink = Arc::new(RecordingSink::new());
    let timer = Arc::new(RecordingTimer::new());
    let engine = engine_with(sink.clone(), timer.clone()).await;

    let committed = engine.submit(first_incumbent()).await.unwrap();
    let report = committed.sequence.unwrap().join().await.unwrap();

    assert_eq!(
        sink.timeline(),
        vec![
            (Prompter, "winnerAnnounced"),
            (MainScreen, "winnerAnnounced"),
            (Broadcast, "winnerAnnounced"),
            (Prompter, "fullInfo"),
            (MainScreen, "defaultPage"),
            (Broadcast, "recentResults"),
            (MainScreen, "recentResults"),
            (MainScreen, "nextDrawPreview"),
            (Broadcast, "nextDrawPreview"),
        ]
    );
    assert_eq!(
        timer.delays(),
        vec![
            Duration::from_millis(3_000),
            Duration::from_millis(7_000),
            Duration::from_millis(5_000),
            Duration::from_millis(5_000),
        ]
    );
    assert_eq!(report.emitted, 9);
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);
    assert_eq!(report.result_id, committed.result.id);
}

#[tokio::test]
async fn incumbent_payloads_carry_winner_and_next_draw() {
    let sink = Arc::new(RecordingSink::new());
    let engine = engine_with(sink.clone(), Arc::new(RecordingTimer::new())).await;

    let committed = engine.submit(first_incumbent()).await.unwrap();
    committed.sequence.unwrap().join().await.unwrap();

    let prompter = sink.on(Prompter);
    match &prompter[1].event {
        BroadcastEvent::FullInfo(details) => {
            assert_eq!(details.participant.id, ParticipantId::new(1));
            assert_eq!(details.lot.as_ref().map(|l| l.id), Some(LotId::new(101)));
            assert_eq!(details.result, committed.result);
        }
        other => panic!("expected full info, got {other:?}"),
    }

    let feed = sink.on(Broadcast);
    match &feed[1].event {
        BroadcastEvent::RecentResults { limit, results } => {
            assert_eq!(*limit, 3);
            assert_eq!(results, &vec![committed.result.clone()]);
        }
        other => panic!("expected recent results, got {other:?}"),
    }
    match &feed[2].event {
        BroadcastEvent::NextDrawPreview(Some(next)) => {
            assert_eq!(next.slot.global_draw_number, 2);
            assert_eq!(next.preview_lot.as_ref().map(|l| l.id), Some(LotId::new(102)));
        }
        other => panic!("expected next draw preview, got {other:?}"),
    }
}

#[tokio::test]
async fn alternate_sequence_lists_results_before_full_info() {
    let sink = Arc::new(RecordingSink::new());
    let timer = Arc::new(RecordingTimer::new());
    let engine = engine_with(sink.clone(), timer.clone()).await;

    let committed = engine
        .submit(ResultCandidate::alternate(g(1), DrawClass::Priority, ParticipantId::new(3)))
        .await
        .unwrap();
    committed.sequence.unwrap().join().await.unwrap();

    assert_eq!(
        sink.timeline(),
        vec![
            (Prompter, "winnerAnnounced"),
            (MainScreen, "winnerAnnounced"),
            (Broadcast, "winnerAnnounced"),
            (MainScreen, "recentResults"),
            (Broadcast, "recentResults"),
            (Prompter, "fullInfo"),
        ]
    );
    assert_eq!(timer.delays(), vec![Duration::from_millis(3_000)]);
}

#[tokio::test]
async fn failed_emissions_do_not_stop_the_sequence() {
    let sink = Arc::new(FailingSink::new([Prompter]));
    let engine = engine_with(sink.clone(), Arc::new(RecordingTimer::new())).await;

    let committed = engine.submit(first_incumbent()).await.unwrap();
    let report = committed.sequence.unwrap().join().await.unwrap();

    assert_eq!(report.failed, 2);
    assert_eq!(report.emitted, 7);
    assert!(sink.delivered().on(Prompter).is_empty());
    assert_eq!(sink.delivered().on(MainScreen).len(), 4);
    // the result stays committed
    assert_eq!(engine.last_result().await.unwrap(), committed.result);
}

/// Timer whose sleeps never finish.
struct StalledTimer;

#[async_trait]
impl Timer for StalledTimer {
    async fn sleep(&self, _: Duration) {
        std::future::pending::<()>().await
    }
}

#[tokio::test]
async fn cancelled_sequence_stops_before_next_step() {
    let sink = Arc::new(RecordingSink::new());
    let engine = engine_with(sink.clone(), Arc::new(StalledTimer)).await;

    let committed = engine.submit(first_incumbent()).await.unwrap();
    let sequence = committed.sequence.unwrap();
    while sink.envelopes().len() < 3 {
        tokio::task::yield_now().await;
    }
    assert!(!sequence.is_finished());

    sequence.cancel();
    let report = sequence.join().await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.emitted, 3);
    assert_eq!(sink.envelopes().len(), 3);
}

#[tokio::test]
async fn on_demand_publications() {
    let hub = Arc::new(ChannelHub::new(16));
    let mut screen = hub.subscribe(MainScreen);
    let engine = engine_with(hub.clone(), Arc::new(RecordingTimer::new())).await;
    let broadcaster = engine.broadcaster().unwrap().clone();

    assert!(matches!(
        broadcaster.publish_recent_results(MainScreen, 0).await,
        Err(BroadcastError::InvalidRequest(_))
    ));

    broadcaster.publish_next_draw(MainScreen).await.unwrap();
    let envelope = screen.recv().await.unwrap();
    assert!(matches!(envelope.event, BroadcastEvent::NextDrawPreview(Some(_))));

    broadcaster.publish_default_page(MainScreen).await.unwrap();
    assert_eq!(screen.recv().await.unwrap().event, BroadcastEvent::DefaultPage);

    assert_eq!(
        broadcaster.publish_default_page(Prompter).await,
        Err(BroadcastError::NoSubscribers(Prompter))
    );
}
