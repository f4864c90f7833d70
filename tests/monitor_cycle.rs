// tests/monitor_cycle.rs
//
// Poll cycle and start/stop behaviour of the monitor, driven through
// scripted fakes (no network).

mod common;

use std::time::Duration;

use common::{monitor_with, wb_feedback, wb_question, FakeSource, Gate, RecordingSender};
use marketplace_notifier::monitor::{CycleReport, MAX_CHECK_INTERVAL};
use marketplace_notifier::notify::format::{detail_message, summary_message};
use marketplace_notifier::{StartOutcome, StopOutcome};

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn two_questions_send_summary_then_details() {
    let q1 = wb_question("q1", "Есть другой цвет?");
    let q2 = wb_question("q2", "Когда поставка?");
    let source = FakeSource::new(Some(vec![q1.clone(), q2.clone()]), Some(vec![]));
    let sender = RecordingSender::new();
    let monitor = monitor_with(source.clone(), sender.clone(), &["chat"], HOUR);

    let report = monitor.run_cycle().await;
    assert_eq!(
        report,
        CycleReport {
            questions: 2,
            feedbacks: 0,
            checked: true,
            failed_notifications: 0
        }
    );
    assert_eq!(source.calls(), (1, 1));

    assert_eq!(
        sender.texts(),
        vec![
            summary_message(2, 0),
            detail_message(&q1),
            detail_message(&q2),
        ]
    );

    let status = monitor.status().await;
    assert!(!status.running);
    assert!(status.last_check_at.is_some());
    assert_eq!(status.last_discovery_at, status.last_check_at);
}

#[tokio::test]
async fn questions_before_feedbacks_in_detail_order() {
    let q = wb_question("q1", "Вопрос");
    let f = wb_feedback("f1", 4);
    let source = FakeSource::new(Some(vec![q.clone()]), Some(vec![f.clone()]));
    let sender = RecordingSender::new();
    let monitor = monitor_with(source, sender.clone(), &["chat"], HOUR);

    monitor.run_cycle().await;
    assert_eq!(
        sender.texts(),
        vec![summary_message(1, 1), detail_message(&q), detail_message(&f)]
    );
}

#[tokio::test]
async fn nothing_new_sends_nothing_but_records_check() {
    let sender = RecordingSender::new();
    let monitor = monitor_with(FakeSource::empty(), sender.clone(), &["chat"], HOUR);

    let report = monitor.run_cycle().await;
    assert!(report.checked);
    assert!(sender.texts().is_empty());

    let status = monitor.status().await;
    assert!(status.last_check_at.is_some());
    assert!(status.last_discovery_at.is_none());
}

#[tokio::test]
async fn failed_fetch_leaves_last_check_untouched() {
    let source = FakeSource::new(None, Some(vec![]));
    let sender = RecordingSender::new();
    let monitor = monitor_with(source.clone(), sender.clone(), &["chat"], HOUR);

    let report = monitor.run_cycle().await;
    assert!(!report.checked);
    // feedbacks are still fetched after the questions call failed
    assert_eq!(source.calls(), (1, 1));
    assert!(sender.texts().is_empty());

    let status = monitor.status().await;
    assert!(status.last_check_at.is_none());
    assert!(status.last_discovery_at.is_none());
}

#[tokio::test]
async fn partial_failure_still_notifies_what_was_found() {
    let f = wb_feedback("f1", 2);
    let source = FakeSource::new(None, Some(vec![f.clone()]));
    let sender = RecordingSender::new();
    let monitor = monitor_with(source, sender.clone(), &["chat"], HOUR);

    let report = monitor.run_cycle().await;
    assert!(!report.checked);
    assert_eq!(report.feedbacks, 1);
    assert_eq!(sender.texts(), vec![summary_message(0, 1), detail_message(&f)]);

    let status = monitor.status().await;
    assert!(status.last_check_at.is_none());
    assert_eq!(status.last_discovery_at, status.last_check_at);
}

#[tokio::test]
async fn notification_failures_do_not_abort_the_cycle() {
    let source = FakeSource::new(
        Some(vec![wb_question("q1", "a"), wb_question("q2", "b")]),
        Some(vec![]),
    );
    let sender = RecordingSender::new();
    sender.fail_chat("only");
    let monitor = monitor_with(source, sender.clone(), &["only"], HOUR);

    let report = monitor.run_cycle().await;
    assert_eq!(report.failed_notifications, 3);
    assert_eq!(sender.texts().len(), 3);
    assert!(monitor.status().await.last_check_at.is_some());
}

#[tokio::test]
async fn every_chat_gets_every_message() {
    let source = FakeSource::new(Some(vec![wb_question("q1", "a")]), Some(vec![]));
    let sender = RecordingSender::new();
    sender.fail_chat("b");
    let monitor = monitor_with(source, sender.clone(), &["a", "b", "c"], HOUR);

    let report = monitor.run_cycle().await;
    assert_eq!(report.failed_notifications, 0);

    let chats: Vec<String> = sender.sent.lock().iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(chats, vec!["a", "b", "c", "a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_are_idempotent() {
    let monitor = monitor_with(FakeSource::empty(), RecordingSender::new(), &["chat"], HOUR);

    assert_eq!(monitor.stop().await, StopOutcome::NotRunning);
    assert_eq!(monitor.start().await, StartOutcome::Started);
    assert_eq!(monitor.start().await, StartOutcome::AlreadyRunning);
    assert!(monitor.is_running().await);

    assert_eq!(monitor.stop().await, StopOutcome::Stopped);
    assert_eq!(monitor.stop().await, StopOutcome::NotRunning);
    assert!(!monitor.status().await.running);

    // restart after stop is allowed
    assert_eq!(monitor.start().await, StartOutcome::Started);
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn loop_polls_every_interval_until_stopped() {
    let source = FakeSource::empty();
    let monitor = monitor_with(
        source.clone(),
        RecordingSender::new(),
        &["chat"],
        Duration::from_secs(10),
    );

    monitor.start().await;

    // first cycle runs one interval after start, not immediately
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.calls(), (0, 0));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(source.calls(), (2, 2));

    monitor.stop().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), (2, 2));
}

#[tokio::test(start_paused = true)]
async fn restart_runs_a_single_loop() {
    let source = FakeSource::empty();
    let monitor = monitor_with(
        source.clone(),
        RecordingSender::new(),
        &["chat"],
        Duration::from_secs(10),
    );

    monitor.start().await;
    monitor.stop().await;
    monitor.start().await;

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(source.calls(), (1, 1));
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn huge_interval_is_clamped_and_loop_survives() {
    let source = FakeSource::empty();
    let monitor = monitor_with(
        source.clone(),
        RecordingSender::new(),
        &["chat"],
        Duration::from_secs(u64::MAX),
    );

    monitor.start().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), (0, 0));
    assert!(monitor.is_running().await);

    tokio::time::sleep(MAX_CHECK_INTERVAL).await;
    assert_eq!(source.calls(), (1, 1));
    assert_eq!(monitor.stop().await, StopOutcome::Stopped);
}

#[tokio::test(start_paused = true)]
async fn cycle_in_flight_completes_after_stop() {
    let q = wb_question("q1", "Вопрос");
    let source = FakeSource::new(Some(vec![q.clone()]), Some(vec![]));
    let gate = Gate::new();
    source.gate_questions(gate.clone());
    let sender = RecordingSender::new();
    let monitor = monitor_with(
        source.clone(),
        sender.clone(),
        &["chat"],
        Duration::from_secs(10),
    );

    monitor.start().await;
    gate.entered.notified().await;

    // stop returns while the cycle is parked inside the questions fetch
    assert_eq!(monitor.stop().await, StopOutcome::Stopped);
    assert!(sender.texts().is_empty());

    gate.release.notify_one();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(source.calls(), (1, 1));
    assert_eq!(sender.texts(), vec![summary_message(1, 0), detail_message(&q)]);
    let status = monitor.status().await;
    assert!(!status.running);
    assert!(status.last_check_at.is_some());

    // no further cycle after the in-flight one
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), (1, 1));
}
