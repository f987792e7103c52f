mod common;

use std::time::Duration;

use tokio::time::sleep;

use common::{person, FakeCamera, Harness, ScriptedCapability, Step};
use webcam_sentinel::domain::{detection::Detection, stream::UiEvent};

fn boxes(event: &UiEvent) -> usize {
    match event {
        UiEvent::Detections { overlay, .. } => overlay.rect_count(),
        _ => 0,
    }
}

#[tokio::test(start_paused = true)]
async fn person_in_frame_draws_and_alerts_every_cycle() {
    let capability = ScriptedCapability::always(vec![person(0.9, [0.0, 0.0, 50.0, 50.0])]);
    let mut h = Harness::new(Some(capability.clone()), FakeCamera::live());

    assert!(h.service.toggle());

    sleep(Duration::from_millis(510)).await;
    assert_eq!(h.webhook.count(), 1);
    let drawn = h.drain_detections();
    assert_eq!(drawn.len(), 1);
    assert_eq!(boxes(&drawn[0]), 1);

    // Mismo frame en el siguiente ciclo: segunda alerta, sin enfriamiento
    sleep(Duration::from_millis(500)).await;
    assert_eq!(h.webhook.count(), 2);
    assert_eq!(capability.calls(), 2);

    let sent = h.webhook.sent.lock().unwrap();
    assert_ne!(sent[0].content, sent[1].content);
    assert_eq!(sent[0].embeds[0].title, "Person Detected");
    assert!(sent[0].content.starts_with("blob:http://localhost:8090/"));
}

#[tokio::test(start_paused = true)]
async fn alert_snapshot_is_kept_for_the_dashboard() {
    let capability = ScriptedCapability::always(vec![person(0.8, [1.0, 2.0, 3.0, 4.0])]);
    let h = Harness::new(Some(capability), FakeCamera::live());

    h.service.toggle();
    sleep(Duration::from_millis(510)).await;

    let url = h.webhook.sent.lock().unwrap()[0].content.clone();
    let id = url.rsplit('/').next().unwrap();
    let blob = h.blobs.get(id).expect("snapshot registered");
    assert_eq!(blob.mime, "image/jpeg");
    assert_eq!(blob.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn weak_or_other_detections_never_alert() {
    let capability = ScriptedCapability::new(
        vec![Step::ok(vec![person(0.69, [0.0, 0.0, 1.0, 1.0])])],
        Step::ok(vec![Detection::new("dog", 0.99, [0.0, 0.0, 10.0, 10.0])]),
    );
    let mut h = Harness::new(Some(capability), FakeCamera::live());

    h.service.toggle();
    sleep(Duration::from_millis(1010)).await;

    assert_eq!(h.webhook.count(), 0);
    let drawn = h.drain_detections();
    assert_eq!(drawn.len(), 2);
    assert_eq!(boxes(&drawn[0]), 0);
    assert_eq!(boxes(&drawn[1]), 1);
    assert_eq!(h.service.snapshot().objects, vec!["dog (99%)"]);
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_does_not_stop_the_loop() {
    let capability = ScriptedCapability::new(
        vec![Step::fail("backend exploded")],
        Step::ok(vec![person(0.95, [0.0, 0.0, 5.0, 5.0])]),
    );
    let h = Harness::new(Some(capability.clone()), FakeCamera::live());

    h.service.toggle();
    sleep(Duration::from_millis(1010)).await;

    assert_eq!(capability.calls(), 2);
    assert_eq!(h.webhook.count(), 1);
    assert!(h.service.timer_running());
}

#[tokio::test(start_paused = true)]
async fn cycles_without_model_or_frame_are_silent() {
    let mut no_model = Harness::new(None, FakeCamera::live());
    no_model.service.toggle();

    let capability = ScriptedCapability::always(vec![person(0.9, [0.0, 0.0, 1.0, 1.0])]);
    let mut no_frame = Harness::new(Some(capability.clone()), FakeCamera::dark());
    no_frame.service.toggle();

    sleep(Duration::from_millis(2010)).await;

    assert!(no_model.service.timer_running());
    assert!(no_model.drain_detections().is_empty());
    assert_eq!(no_model.webhook.count(), 0);

    assert_eq!(capability.calls(), 0);
    assert!(no_frame.drain_detections().is_empty());
}

#[tokio::test(start_paused = true)]
async fn repeated_toggles_leave_a_single_timer() {
    let capability = ScriptedCapability::always(Vec::new());
    let h = Harness::new(Some(capability.clone()), FakeCamera::live());

    for _ in 0..2 {
        assert!(h.service.toggle());
        assert!(h.service.timer_running());
        assert!(!h.service.toggle());
        assert!(!h.service.timer_running());
    }
    sleep(Duration::from_secs(3)).await;
    assert_eq!(capability.calls(), 0);

    h.service.toggle();
    sleep(Duration::from_millis(1510)).await;
    assert_eq!(capability.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn stopping_does_not_cancel_an_in_flight_cycle() {
    let capability = ScriptedCapability::new(
        vec![Step::ok(vec![person(0.9, [0.0, 0.0, 1.0, 1.0])]).after(Duration::from_millis(700))],
        Step::ok(Vec::new()),
    );
    let h = Harness::new(Some(capability.clone()), FakeCamera::live());

    h.service.toggle();
    sleep(Duration::from_millis(600)).await;
    assert!(!h.service.toggle());

    sleep(Duration::from_millis(700)).await;
    assert_eq!(capability.calls(), 1);
    assert_eq!(h.webhook.count(), 1);
    assert!(!h.service.is_detecting());
}

#[tokio::test(start_paused = true)]
async fn slow_stale_result_is_discarded() {
    let capability = ScriptedCapability::new(
        vec![
            Step::ok(vec![person(0.9, [0.0, 0.0, 1.0, 1.0])]).after(Duration::from_millis(800)),
            Step::ok(vec![Detection::new("cup", 0.8, [0.0, 0.0, 1.0, 1.0])]).after(Duration::from_millis(10)),
        ],
        Step::ok(Vec::new()),
    );
    let mut h = Harness::new(Some(capability), FakeCamera::live());

    h.service.toggle();
    sleep(Duration::from_millis(1100)).await;
    h.service.toggle();
    sleep(Duration::from_millis(500)).await;

    // El ciclo 1 termina después del 2 y no debe pisarlo
    assert_eq!(h.webhook.count(), 0);
    assert_eq!(h.service.snapshot().objects, vec!["cup (80%)"]);
    let seqs: Vec<u64> = h
        .drain_detections()
        .iter()
        .filter_map(|e| match e {
            UiEvent::Detections { seq, .. } => Some(*seq),
            _ => None,
        })
        .collect();
    assert_eq!(seqs, vec![2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_keep_timer_and_state_in_step() {
    let capability = ScriptedCapability::always(Vec::new());
    let h = Harness::new(Some(capability), FakeCamera::live());

    for _ in 0..500 {
        let a = tokio::spawn({
            let service = h.service.clone();
            async move { service.toggle() }
        });
        let b = tokio::spawn({
            let service = h.service.clone();
            async move { service.toggle() }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Dos toggles seguidos siempre vuelven al estado de partida
        assert_ne!(a, b);
        assert_eq!(h.service.is_detecting(), h.service.timer_running());
        assert!(!h.service.is_detecting());
    }
}
