mod common;

use std::time::Duration;

use common::FakeSurface;
use jimeng_batch::infrastructure::ElementQuery;
use jimeng_batch::services::{ElementProbe, ProbeOutcome};
use tokio::time::Instant;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn missing_element_times_out_within_one_interval() {
    let surface = FakeSurface::new();
    let probe = ElementProbe::new(&surface, CancellationToken::new(), INTERVAL);

    let timeout = Duration::from_millis(1000);
    let start = Instant::now();
    let outcome = probe
        .await_element(&ElementQuery::css("textarea.lv-textarea"), timeout)
        .await;

    assert_eq!(outcome, ProbeOutcome::TimedOut);
    assert!(start.elapsed() >= timeout);
    assert!(start.elapsed() <= timeout + INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn element_appearing_later_is_found() {
    let surface = FakeSurface::new();
    let field = surface.add(&["textarea.lv-textarea"]);
    surface.appear_after(field, Duration::from_millis(450));
    let probe = ElementProbe::new(&surface, CancellationToken::new(), INTERVAL);

    let outcome = probe
        .await_element(&ElementQuery::css("textarea.lv-textarea"), Duration::from_secs(5))
        .await;
    assert_eq!(outcome.element(), Some(field));
}

#[tokio::test(start_paused = true)]
async fn hidden_elements_are_not_visible_matches() {
    let surface = FakeSurface::new();
    let hidden = surface.add(&["button"]);
    surface.hide(hidden);
    let shown = surface.add(&["button"]);
    let probe = ElementProbe::new(&surface, CancellationToken::new(), INTERVAL);

    let outcome = probe
        .await_element(&ElementQuery::css("button"), Duration::from_secs(1))
        .await;
    assert_eq!(outcome, ProbeOutcome::Found(shown));
}

#[tokio::test(start_paused = true)]
async fn stop_is_observed_promptly() {
    let surface = FakeSurface::new();
    let stop = CancellationToken::new();
    let probe = ElementProbe::new(&surface, stop.clone(), INTERVAL);

    let canceller = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let outcome = probe
        .await_element(&ElementQuery::css("#never"), Duration::from_secs(30))
        .await;

    assert!(outcome.is_stopped());
    assert!(start.elapsed() < Duration::from_millis(250) + INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn condition_timeout_is_an_error_and_stop_is_false() {
    let surface = FakeSurface::new();
    let stop = CancellationToken::new();
    let probe = ElementProbe::new(&surface, stop.clone(), INTERVAL);

    let result = probe
        .await_condition("永不满足", || async { false }, Duration::from_millis(300), INTERVAL)
        .await;
    assert!(result.is_err());

    let satisfied = probe
        .await_condition("立即满足", || async { true }, Duration::from_millis(300), INTERVAL)
        .await;
    assert!(assert_ok!(satisfied));

    stop.cancel();
    let stopped = probe
        .await_condition("永不满足", || async { false }, Duration::from_secs(5), INTERVAL)
        .await;
    assert!(!assert_ok!(stopped));
}

#[tokio::test(start_paused = true)]
async fn file_input_prefers_image_accept_on_nearest_ancestor() {
    let surface = FakeSurface::new();
    let wrapper = surface.add(&["div.wrapper"]);
    let zone = surface.add_child(wrapper, &["div.reference-upload-eclumn"]);
    let generic = surface.add_child(wrapper, &["input[type=file]"]);
    surface.set_accept(generic, "");
    let images = surface.add_child(wrapper, &["input[type=file]"]);
    surface.set_accept(images, "image/*");
    let far_away = surface.add(&["input[type=file]"]);
    surface.set_accept(far_away, "image/png");

    let probe = ElementProbe::new(&surface, CancellationToken::new(), INTERVAL);
    assert_eq!(probe.locate_file_input(zone).await, Some(images));
}
