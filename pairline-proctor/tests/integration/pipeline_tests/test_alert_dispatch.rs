use std::time::Duration;
use tokio::time::Instant;

use pairline_core::{AlertKind, Outbound};
use pairline_proctor::FrameOutcome;

use crate::integration::{create_test_pipeline, init_tracing, room};
use crate::utils::{ScriptedDetector, ScriptedSource, face, frontal_face};

#[tokio::test]
async fn test_no_face_alert_respects_cooldown() {
    init_tracing();

    let (mut pipeline, bus) =
        create_test_pipeline(ScriptedSource::live(10), ScriptedDetector::always(vec![]));
    let t0 = Instant::now();

    assert_eq!(pipeline.tick(t0).await, FrameOutcome::Alerted(AlertKind::NoFace));
    assert_eq!(
        pipeline.tick(t0 + Duration::from_millis(1200)).await,
        FrameOutcome::Suppressed(AlertKind::NoFace)
    );
    assert_eq!(
        pipeline.tick(t0 + Duration::from_millis(5000)).await,
        FrameOutcome::Alerted(AlertKind::NoFace)
    );

    let events = bus.events().await;
    assert_eq!(events.len(), 2);
    let Outbound::Alert(alert) = &events[0] else {
        panic!("expected an alert, got {:?}", events[0]);
    };
    assert_eq!(alert.message, "No face detected");
    assert_eq!(alert.room_id, room());
}

#[tokio::test]
async fn test_multiple_faces_regardless_of_geometry() {
    init_tracing();

    let faces = vec![frontal_face(), face(900.0, 0.0001, 10.0)];
    let (mut pipeline, bus) =
        create_test_pipeline(ScriptedSource::live(3), ScriptedDetector::always(faces));

    assert_eq!(
        pipeline.tick(Instant::now()).await,
        FrameOutcome::Alerted(AlertKind::MultipleFaces)
    );
    assert_eq!(bus.alert_kinds().await, vec![AlertKind::MultipleFaces]);
    assert_eq!(pipeline.classifier().smoothed_angle(), None);
}

#[tokio::test]
async fn test_nominal_face_raises_nothing() {
    init_tracing();

    let (mut pipeline, bus) = create_test_pipeline(
        ScriptedSource::live(12),
        ScriptedDetector::always(vec![frontal_face()]),
    );
    let t0 = Instant::now();

    for i in 0..12 {
        let outcome = pipeline.tick(t0 + Duration::from_millis(33 * i)).await;
        assert_eq!(outcome, FrameOutcome::Nominal);
    }
    assert!(bus.events().await.is_empty());
}

#[tokio::test]
async fn test_steep_angle_is_head_turn_when_centered() {
    init_tracing();

    let (mut pipeline, bus) = create_test_pipeline(
        ScriptedSource::live(3),
        ScriptedDetector::always(vec![face(310.0, 0.5, 140.0)]),
    );

    assert_eq!(
        pipeline.tick(Instant::now()).await,
        FrameOutcome::Alerted(AlertKind::HeadTurn)
    );
    assert_eq!(bus.alert_kinds().await, vec![AlertKind::HeadTurn]);
}

#[tokio::test]
async fn test_head_turn_takes_priority_over_small_face() {
    init_tracing();

    let (mut pipeline, bus) = create_test_pipeline(
        ScriptedSource::live(3),
        ScriptedDetector::always(vec![face(100.0, 0.01, 121.5)]),
    );

    assert_eq!(
        pipeline.tick(Instant::now()).await,
        FrameOutcome::Alerted(AlertKind::HeadTurn)
    );
    assert_eq!(bus.alert_kinds().await, vec![AlertKind::HeadTurn]);
}

#[tokio::test]
async fn test_small_face_alert() {
    init_tracing();

    let (mut pipeline, bus) = create_test_pipeline(
        ScriptedSource::live(3),
        ScriptedDetector::always(vec![face(310.0, 0.01, 121.5)]),
    );

    assert_eq!(
        pipeline.tick(Instant::now()).await,
        FrameOutcome::Alerted(AlertKind::FaceTooSmall)
    );
    let Outbound::Alert(alert) = &bus.events().await[0] else {
        panic!("expected alert");
    };
    assert_eq!(alert.message, "User might be too far from the camera");
}

#[tokio::test]
async fn test_cooldowns_are_per_kind() {
    init_tracing();

    let detector = ScriptedDetector::always(vec![])
        .then(Ok(vec![]))
        .then(Ok(vec![frontal_face(), frontal_face()]))
        .then(Ok(vec![]));
    let (mut pipeline, bus) = create_test_pipeline(ScriptedSource::live(4), detector);
    let t0 = Instant::now();

    assert_eq!(pipeline.tick(t0).await, FrameOutcome::Alerted(AlertKind::NoFace));
    assert_eq!(
        pipeline.tick(t0 + Duration::from_millis(40)).await,
        FrameOutcome::Alerted(AlertKind::MultipleFaces)
    );
    assert_eq!(
        pipeline.tick(t0 + Duration::from_millis(80)).await,
        FrameOutcome::Suppressed(AlertKind::NoFace)
    );
    assert_eq!(
        bus.alert_kinds().await,
        vec![AlertKind::NoFace, AlertKind::MultipleFaces]
    );
}

#[tokio::test]
async fn test_pipelines_keep_separate_alert_state() {
    init_tracing();

    let (mut first, first_bus) =
        create_test_pipeline(ScriptedSource::live(2), ScriptedDetector::always(vec![]));
    let (mut second, second_bus) =
        create_test_pipeline(ScriptedSource::live(2), ScriptedDetector::always(vec![]));
    let now = Instant::now();

    assert_eq!(first.tick(now).await, FrameOutcome::Alerted(AlertKind::NoFace));
    assert_eq!(second.tick(now).await, FrameOutcome::Alerted(AlertKind::NoFace));
    assert_eq!(first_bus.alert_kinds().await.len(), 1);
    assert_eq!(second_bus.alert_kinds().await.len(), 1);
}

#[tokio::test]
async fn test_bus_failure_does_not_stop_sampling() {
    init_tracing();

    let (mut pipeline, bus) =
        create_test_pipeline(ScriptedSource::live(3), ScriptedDetector::always(vec![]));
    bus.reject_all();
    let t0 = Instant::now();

    assert_eq!(pipeline.tick(t0).await, FrameOutcome::Undelivered(AlertKind::NoFace));
    assert_eq!(
        pipeline.tick(t0 + Duration::from_millis(33)).await,
        FrameOutcome::Suppressed(AlertKind::NoFace)
    );
}
