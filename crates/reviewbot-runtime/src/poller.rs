//! The long-polling loop.

use std::sync::Arc;
use std::time::Duration;

use reviewbot_core::{format_attempt, Alert, PollOutcome, ReviewAttempt};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::config::PollerConfig;
use crate::sink::{AlertSink, ChatSink};
use crate::source::ReviewSource;
use crate::state::PollState;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Outcome label (`timeout`, `found`, `transient_error`, `unexpected`).
    pub outcome: &'static str,
    /// Notifications delivered.
    pub dispatched: usize,
    /// Notifications that could not be delivered.
    pub failed: usize,
    /// Delay to wait before the next request, if the cycle failed.
    pub sleep: Option<Duration>,
}

/// Polls the review service and relays new reviews to the chat.
pub struct ReviewPoller {
    source: Arc<dyn ReviewSource>,
    chat: Arc<dyn ChatSink>,
    alerts: Arc<dyn AlertSink>,
    config: PollerConfig,
    state: PollState,
}

impl ReviewPoller {
    /// Creates a poller with no cursor and the initial retry delay.
    pub fn new(
        source: Arc<dyn ReviewSource>,
        chat: Arc<dyn ChatSink>,
        alerts: Arc<dyn AlertSink>,
        config: PollerConfig,
    ) -> Self {
        let state = PollState::new(config.backoff.initial);
        Self {
            source,
            chat,
            alerts,
            config,
            state,
        }
    }

    /// Current cursor and retry delay.
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Run the polling loop until the shutdown signal is set.
    ///
    /// A dropped sender counts as shutdown. The signal interrupts an
    /// in-flight request and a retry sleep, but never a batch that is
    /// already being delivered.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Review poller started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let source = Arc::clone(&self.source);
            let cursor = self.state.cursor();
            trace!(cursor = ?cursor, "Polling for new reviews");

            let outcome = tokio::select! {
                biased;
                outcome = source.fetch(cursor) => outcome,
                _ = shutdown_requested(&mut shutdown) => {
                    debug!("Shutdown requested during request");
                    break;
                }
            };

            let report = self.handle_outcome(outcome).await;

            if let Some(delay) = report.sleep {
                debug!(delay = ?delay, "Waiting before retry");
                tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut shutdown) => {
                        debug!("Shutdown requested during retry delay");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        info!(cursor = ?self.state.cursor(), "Review poller stopped");
    }

    /// Run one full cycle: request, classify, deliver, update state.
    pub async fn poll_once(&mut self) -> CycleReport {
        let outcome = self.source.fetch(self.state.cursor()).await;
        self.handle_outcome(outcome).await
    }

    /// Apply an outcome to the poller state and deliver what it carries.
    ///
    /// Does not sleep; the returned report says how long to wait.
    pub async fn handle_outcome(&mut self, outcome: PollOutcome) -> CycleReport {
        let kind = outcome.kind();

        match outcome {
            PollOutcome::Timeout { next_cursor } => {
                match next_cursor {
                    Some(cursor) => {
                        if self.state.advance(cursor) {
                            debug!(cursor = %cursor, "No new reviews, cursor moved");
                        }
                    }
                    None => debug!("Poll window elapsed without a response"),
                }
                self.state.record_success(&self.config.backoff);
                CycleReport {
                    outcome: kind,
                    dispatched: 0,
                    failed: 0,
                    sleep: None,
                }
            }
            PollOutcome::Found {
                next_cursor,
                attempts,
            } => {
                self.state.advance(next_cursor);
                info!(count = attempts.len(), cursor = %next_cursor, "New reviews found");

                let (dispatched, failed) = self.dispatch(&attempts).await;
                let sleep = if failed == 0 {
                    self.state.record_success(&self.config.backoff);
                    None
                } else {
                    Some(self.state.record_failure(&self.config.backoff))
                };

                CycleReport {
                    outcome: kind,
                    dispatched,
                    failed,
                    sleep,
                }
            }
            PollOutcome::TransientError(detail) => {
                let delay = self.state.record_failure(&self.config.backoff);
                warn!(
                    error = %detail,
                    failures = self.state.consecutive_failures(),
                    retry_in_secs = delay.as_secs_f64(),
                    "Review service unreachable"
                );
                CycleReport {
                    outcome: kind,
                    dispatched: 0,
                    failed: 0,
                    sleep: Some(delay),
                }
            }
            PollOutcome::Unexpected(detail) => {
                let delay = self.state.record_failure(&self.config.backoff);
                error!(
                    error = %detail,
                    failures = self.state.consecutive_failures(),
                    retry_in_secs = delay.as_secs_f64(),
                    "Unexpected failure while polling"
                );
                self.alerts
                    .alert(Alert::error("Unexpected failure while polling the review service").with_detail(detail))
                    .await;
                CycleReport {
                    outcome: kind,
                    dispatched: 0,
                    failed: 0,
                    sleep: Some(delay),
                }
            }
        }
    }

    /// Deliver one message per attempt, in order. Returns (delivered, failed).
    async fn dispatch(&self, attempts: &[ReviewAttempt]) -> (usize, usize) {
        let mut delivered = 0;
        let mut failed = 0;

        for attempt in attempts {
            let message = format_attempt(attempt);
            match self.chat.send_html(&message).await {
                Ok(()) => {
                    delivered += 1;
                    info!(
                        lesson = %attempt.lesson_title,
                        negative = attempt.is_negative,
                        "Review notification sent"
                    );
                }
                Err(e) => {
                    failed += 1;
                    error!(lesson = %attempt.lesson_title, error = %e, "Failed to send review notification");
                    self.alerts
                        .alert(
                            Alert::error(format!(
                                "Failed to deliver review notification for \"{}\"",
                                attempt.lesson_title
                            ))
                            .with_detail(e.to_string()),
                        )
                        .await;
                }
            }
        }

        (delivered, failed)
    }
}

/// Resolves once shutdown is requested or the sender is dropped.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, RuntimeError};
    use async_trait::async_trait;
    use reviewbot_core::{Severity, Timestamp, APPROVED_VERDICT, NEGATIVE_VERDICT};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Everything the collaborators observed, in order.
    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Request(Option<Timestamp>),
        Message(String),
        Alert(Severity, String),
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    /// Replays scripted outcomes; signals shutdown once the script runs out.
    struct ScriptedSource {
        script: Mutex<VecDeque<PollOutcome>>,
        log: Log,
        requested_at: Mutex<Vec<Instant>>,
        shutdown: Option<watch::Sender<bool>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<PollOutcome>, log: Log, shutdown: Option<watch::Sender<bool>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                log,
                requested_at: Mutex::new(Vec::new()),
                shutdown,
            }
        }

        /// Whole seconds between consecutive requests.
        fn gaps(&self) -> Vec<u64> {
            let times = self.requested_at.lock().unwrap();
            times.windows(2).map(|w| (w[1] - w[0]).as_secs()).collect()
        }
    }

    #[async_trait]
    impl ReviewSource for ScriptedSource {
        async fn fetch(&self, cursor: Option<Timestamp>) -> PollOutcome {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(outcome) => {
                    self.requested_at.lock().unwrap().push(Instant::now());
                    self.log.lock().unwrap().push(Event::Request(cursor));
                    outcome
                }
                None => {
                    if let Some(tx) = &self.shutdown {
                        let _ = tx.send(true);
                    }
                    std::future::pending().await
                }
            }
        }
    }

    /// Records sent messages; sends whose 0-based index is in `fail_on` fail.
    struct RecordingChat {
        log: Log,
        fail_on: Vec<usize>,
        sends: AtomicUsize,
    }

    impl RecordingChat {
        fn new(log: Log, fail_on: &[usize]) -> Self {
            Self {
                log,
                fail_on: fail_on.to_vec(),
                sends: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatSink for RecordingChat {
        async fn send_html(&self, text: &str) -> Result<()> {
            let index = self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&index) {
                return Err(RuntimeError::Delivery("Forbidden: bot was blocked by the user".into()));
            }
            self.log.lock().unwrap().push(Event::Message(text.to_string()));
            Ok(())
        }
    }

    struct RecordingAlerts {
        log: Log,
    }

    #[async_trait]
    impl AlertSink for RecordingAlerts {
        async fn alert(&self, alert: Alert) {
            self.log
                .lock()
                .unwrap()
                .push(Event::Alert(alert.severity, alert.message));
        }
    }

    struct Harness {
        log: Log,
        source: Arc<ScriptedSource>,
        poller: ReviewPoller,
        shutdown_rx: watch::Receiver<bool>,
    }

    fn harness(script: Vec<PollOutcome>, config: PollerConfig, failing_sends: &[usize]) -> Harness {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let source = Arc::new(ScriptedSource::new(script, Arc::clone(&log), Some(shutdown_tx)));
        let chat = Arc::new(RecordingChat::new(Arc::clone(&log), failing_sends));
        let alerts = Arc::new(RecordingAlerts { log: Arc::clone(&log) });
        let poller = ReviewPoller::new(source.clone(), chat, alerts, config);

        Harness {
            log,
            source,
            poller,
            shutdown_rx,
        }
    }

    fn timeout(ts: f64) -> PollOutcome {
        PollOutcome::Timeout {
            next_cursor: Some(Timestamp(ts)),
        }
    }

    fn found(ts: f64, attempts: Vec<ReviewAttempt>) -> PollOutcome {
        PollOutcome::Found {
            next_cursor: Timestamp(ts),
            attempts,
        }
    }

    fn attempt_a() -> ReviewAttempt {
        ReviewAttempt::new("Lesson A", "https://dvmn.org/lessons/a/", true)
    }

    fn attempt_b() -> ReviewAttempt {
        ReviewAttempt::new("Lesson B", "https://dvmn.org/lessons/b/", false)
    }

    fn events(log: &Log) -> Vec<Event> {
        log.lock().unwrap().clone()
    }

    fn count_alerts(log: &Log) -> usize {
        events(log)
            .iter()
            .filter(|e| matches!(e, Event::Alert(..)))
            .count()
    }

    fn count_messages(log: &Log) -> usize {
        events(log)
            .iter()
            .filter(|e| matches!(e, Event::Message(_)))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_sequence_and_dispatch_order() {
        let mut h = harness(
            vec![
                timeout(5.0),
                found(9.0, vec![attempt_a(), attempt_b()]),
                timeout(12.0),
            ],
            PollerConfig::default(),
            &[],
        );

        h.poller.run(h.shutdown_rx.clone()).await;

        let log = events(&h.log);
        assert_eq!(log.len(), 5);
        assert_eq!(log[0], Event::Request(None));
        assert_eq!(log[1], Event::Request(Some(Timestamp(5.0))));
        match (&log[2], &log[3]) {
            (Event::Message(first), Event::Message(second)) => {
                assert!(first.contains("Lesson A"));
                assert!(first.contains(NEGATIVE_VERDICT));
                assert!(second.contains("Lesson B"));
                assert!(second.contains(APPROVED_VERDICT));
            }
            other => panic!("expected two messages, got {:?}", other),
        }
        assert_eq!(log[4], Event::Request(Some(Timestamp(9.0))));
        assert_eq!(h.poller.state().cursor(), Some(Timestamp(12.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_then_resets() {
        let mut h = harness(
            vec![
                PollOutcome::TransientError("connection refused".into()),
                PollOutcome::TransientError("connection refused".into()),
                timeout(3.0),
            ],
            PollerConfig::default(),
            &[],
        );

        h.poller.run(h.shutdown_rx.clone()).await;

        assert_eq!(h.source.gaps(), vec![1, 11]);
        assert_eq!(h.poller.state().backoff_delay(), Duration::from_secs(1));
        assert_eq!(h.poller.state().consecutive_failures(), 0);
        assert_eq!(count_alerts(&h.log), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_timeout_retries_immediately_with_same_cursor() {
        let mut h = harness(
            vec![
                timeout(5.0),
                PollOutcome::Timeout { next_cursor: None },
                timeout(6.0),
            ],
            PollerConfig::default(),
            &[],
        );

        h.poller.run(h.shutdown_rx.clone()).await;

        assert_eq!(
            events(&h.log),
            vec![
                Event::Request(None),
                Event::Request(Some(Timestamp(5.0))),
                Event::Request(Some(Timestamp(5.0))),
            ]
        );
        assert_eq!(h.source.gaps(), vec![0, 0]);
        assert_eq!(count_messages(&h.log), 0);
        assert_eq!(count_alerts(&h.log), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_error_alerts_once_and_backs_off() {
        let mut h = harness(
            vec![
                PollOutcome::Unexpected("malformed response: expected value at line 1 column 1".into()),
                timeout(1.0),
            ],
            PollerConfig::default(),
            &[],
        );

        h.poller.run(h.shutdown_rx.clone()).await;

        assert_eq!(count_alerts(&h.log), 1);
        assert_eq!(h.source.gaps(), vec![1]);

        let log = events(&h.log);
        assert!(matches!(&log[1], Event::Alert(Severity::Error, _)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_and_transient_share_backoff() {
        let mut h = harness(
            vec![
                PollOutcome::TransientError("connection reset".into()),
                PollOutcome::Unexpected("bad json".into()),
                PollOutcome::TransientError("connection reset".into()),
                timeout(1.0),
            ],
            PollerConfig::default(),
            &[],
        );

        h.poller.run(h.shutdown_rx.clone()).await;

        assert_eq!(h.source.gaps(), vec![1, 11, 21]);
        assert_eq!(count_alerts(&h.log), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_delay_caps_growth() {
        let mut h = harness(
            vec![
                PollOutcome::TransientError("down".into()),
                PollOutcome::TransientError("down".into()),
                PollOutcome::TransientError("down".into()),
                timeout(1.0),
            ],
            PollerConfig::new().with_max_delay(Duration::from_secs(15)),
            &[],
        );

        h.poller.run(h.shutdown_rx.clone()).await;

        assert_eq!(h.source.gaps(), vec![1, 11, 15]);
    }

    #[tokio::test]
    async fn test_replayed_found_is_dispatched_twice() {
        let mut h = harness(vec![], PollerConfig::default(), &[]);

        let first = h.poller.handle_outcome(found(9.0, vec![attempt_a()])).await;
        let second = h.poller.handle_outcome(found(9.0, vec![attempt_a()])).await;

        assert_eq!(first.dispatched, 1);
        assert_eq!(second.dispatched, 1);
        assert_eq!(count_messages(&h.log), 2);
        assert_eq!(h.poller.state().cursor(), Some(Timestamp(9.0)));
    }

    #[tokio::test]
    async fn test_older_cursor_from_server_is_ignored() {
        let mut h = harness(vec![], PollerConfig::default(), &[]);

        h.poller.handle_outcome(timeout(10.0)).await;
        h.poller.handle_outcome(timeout(7.0)).await;

        assert_eq!(h.poller.state().cursor(), Some(Timestamp(10.0)));
    }

    #[tokio::test]
    async fn test_failed_delivery_alerts_and_backs_off() {
        let mut h = harness(vec![], PollerConfig::default(), &[0, 1]);

        let report = h
            .poller
            .handle_outcome(found(20.0, vec![attempt_a(), attempt_b()]))
            .await;

        assert_eq!(report.dispatched, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(report.sleep, Some(Duration::from_secs(1)));
        assert_eq!(count_alerts(&h.log), 2);
        // Best effort: the batch is not requested again.
        assert_eq!(h.poller.state().cursor(), Some(Timestamp(20.0)));
    }

    #[tokio::test]
    async fn test_partial_delivery_failure_keeps_order() {
        let attempt_c = ReviewAttempt::new("Lesson C", "https://dvmn.org/lessons/c/", false);
        let mut h = harness(vec![], PollerConfig::default(), &[1]);

        let report = h
            .poller
            .handle_outcome(found(30.0, vec![attempt_a(), attempt_b(), attempt_c]))
            .await;

        assert_eq!(report.dispatched, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.sleep, Some(Duration::from_secs(1)));

        let log = events(&h.log);
        assert_eq!(log.len(), 3);
        assert!(matches!(&log[0], Event::Message(text) if text.contains("Lesson A")));
        match &log[1] {
            Event::Alert(Severity::Error, message) => assert!(message.contains("Lesson B")),
            other => panic!("expected delivery alert, got {:?}", other),
        }
        assert!(matches!(&log[2], Event::Message(text) if text.contains("Lesson C")));
        assert_eq!(count_alerts(&h.log), 1);
        assert_eq!(h.poller.state().cursor(), Some(Timestamp(30.0)));
        assert_eq!(h.poller.state().consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_poll_once_uses_current_cursor() {
        let mut h = harness(vec![timeout(4.0), timeout(8.0)], PollerConfig::default(), &[]);

        let report = h.poller.poll_once().await;
        assert_eq!(report.outcome, "timeout");
        assert_eq!(report.sleep, None);
        h.poller.poll_once().await;

        assert_eq!(
            events(&h.log),
            vec![Event::Request(None), Event::Request(Some(Timestamp(4.0)))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_retry_delay() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let source = Arc::new(ScriptedSource::new(
            vec![PollOutcome::TransientError("down".into())],
            Arc::clone(&log),
            None,
        ));
        let chat = Arc::new(RecordingChat::new(Arc::clone(&log), &[]));
        let alerts = Arc::new(RecordingAlerts { log: Arc::clone(&log) });
        let config = PollerConfig::new().with_initial_delay(Duration::from_secs(1000));
        let mut poller = ReviewPoller::new(source, chat, alerts, config);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let started = Instant::now();
        let handle = tokio::spawn(async move {
            poller.run(shutdown_rx).await;
            poller
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown_tx.send(true).unwrap();

        let poller = handle.await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1000));
        assert_eq!(poller.state().consecutive_failures(), 1);
        assert_eq!(events(&log), vec![Event::Request(None)]);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_issues_no_request() {
        let mut h = harness(vec![timeout(1.0)], PollerConfig::default(), &[]);
        let (shutdown_tx, shutdown_rx) = watch::channel(true);

        h.poller.run(shutdown_rx).await;

        drop(shutdown_tx);
        assert!(events(&h.log).is_empty());
    }
}
