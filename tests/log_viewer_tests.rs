/// Log viewer polling tests: immediate first fetch, periodic refresh,
/// wholesale replacement and teardown.
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use common::{MockBackend, client_for};
use elt_console::flows::logs::{LogViewer, PollOutcome};
use elt_console::flows::{FlowError, MISSING_TOKEN_MESSAGE};

const FAST: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(5);

/// Backend whose n-th `/logs` response holds the single line `line n`.
fn counting_backend() -> MockBackend {
    let calls = AtomicUsize::new(0);
    MockBackend::start(move |_| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        (200, format!(r#"{{"logs":["line {n}\n"]}}"#))
    })
}

#[test]
fn activation_requires_token() {
    let backend = counting_backend();
    let (api, session, _) = client_for(&backend);

    let err = LogViewer::new(api, session, FAST)
        .activate(|_| {})
        .unwrap_err();

    assert!(matches!(err, FlowError::MissingToken));
    assert_eq!(err.to_string(), MISSING_TOKEN_MESSAGE);
    std::thread::sleep(FAST * 3);
    assert_eq!(backend.request_count(), 0);
}

#[test]
fn polls_immediately_then_on_interval() {
    let backend = counting_backend();
    let (api, session, _) = client_for(&backend);
    session.set_session("abc", "admin").unwrap();

    let (tx, rx) = mpsc::channel();
    let poller = LogViewer::new(api, session, FAST)
        .activate(move |outcome| {
            if let PollOutcome::Updated(collection) = outcome {
                let _ = tx.send(collection.lines.clone());
            }
        })
        .unwrap();

    let first = rx.recv_timeout(WAIT).unwrap();
    let second = rx.recv_timeout(WAIT).unwrap();
    let third = rx.recv_timeout(WAIT).unwrap();
    poller.stop();

    assert_eq!(first, vec!["line 1\n"]);
    assert_eq!(second, vec!["line 2\n"]);
    assert_eq!(third, vec!["line 3\n"]);

    let requests = backend.requests();
    assert!(requests.iter().all(|r| r.path == "/logs"));
    assert!(
        requests
            .iter()
            .all(|r| r.authorization.as_deref() == Some("Bearer abc"))
    );
}

#[test]
fn latest_is_replaced_wholesale() {
    let backend = counting_backend();
    let (api, session, _) = client_for(&backend);
    session.set_session("abc", "admin").unwrap();

    let (tx, rx) = mpsc::channel();
    let poller = LogViewer::new(api, session, FAST)
        .activate(move |_| {
            let _ = tx.send(());
        })
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    rx.recv_timeout(WAIT).unwrap();
    let latest = poller.latest();
    poller.stop();

    assert_eq!(latest.len(), 1);
    assert!(latest.lines[0].starts_with("line "));
    assert_ne!(latest.lines[0], "line 1\n");
}

#[test]
fn no_requests_after_stop() {
    let backend = counting_backend();
    let (api, session, _) = client_for(&backend);
    session.set_session("abc", "admin").unwrap();

    let (tx, rx) = mpsc::channel();
    let poller = LogViewer::new(api, session, FAST)
        .activate(move |_| {
            let _ = tx.send(());
        })
        .unwrap();
    rx.recv_timeout(WAIT).unwrap();

    poller.stop();
    let after_stop = backend.request_count();
    std::thread::sleep(FAST * 4);

    assert_eq!(backend.request_count(), after_stop);
}

#[test]
fn dropping_the_poller_stops_polling() {
    let backend = counting_backend();
    let (api, session, _) = client_for(&backend);
    session.set_session("abc", "admin").unwrap();

    let (tx, rx) = mpsc::channel();
    {
        let poller = LogViewer::new(api, session, FAST)
            .activate(move |_| {
                let _ = tx.send(());
            })
            .unwrap();
        rx.recv_timeout(WAIT).unwrap();
        assert!(poller.poll_count() >= 1);
    }
    let after_drop = backend.request_count();
    std::thread::sleep(FAST * 4);

    assert_eq!(backend.request_count(), after_drop);
}

#[test]
fn failed_poll_keeps_last_collection() {
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = {
        let calls = Arc::clone(&calls);
        MockBackend::start(move |_| match calls.fetch_add(1, Ordering::SeqCst) {
            0 => (200, r#"{"logs":["ok\n"]}"#.to_string()),
            _ => (500, r#"{"error":"log file missing"}"#.to_string()),
        })
    };
    let (api, session, _) = client_for(&backend);
    session.set_session("abc", "admin").unwrap();

    let (tx, rx) = mpsc::channel();
    let poller = LogViewer::new(api, session, FAST)
        .activate(move |outcome| {
            let failed = matches!(outcome, PollOutcome::Failed(_));
            let _ = tx.send(failed);
        })
        .unwrap();

    assert!(!rx.recv_timeout(WAIT).unwrap());
    assert!(rx.recv_timeout(WAIT).unwrap());
    let latest = poller.latest();
    poller.stop();

    assert_eq!(latest.lines, vec!["ok\n"]);
    assert!(calls.load(Ordering::SeqCst) >= 2);
}

#[test]
fn stop_does_not_wait_for_a_hung_fetch() {
    let backend = MockBackend::start(|_| {
        std::thread::sleep(Duration::from_secs(2));
        (200, r#"{"logs":["late\n"]}"#.to_string())
    });
    let (api, session, _) = client_for(&backend);
    session.set_session("abc", "admin").unwrap();

    let (tx, rx) = mpsc::channel();
    let poller = LogViewer::new(api, session, FAST)
        .activate(move |_| {
            let _ = tx.send(());
        })
        .unwrap();
    std::thread::sleep(Duration::from_millis(200));

    let started = Instant::now();
    poller.stop();
    assert!(started.elapsed() < Duration::from_secs(1));

    // The late response is discarded and nothing else is fetched.
    assert!(rx.recv_timeout(WAIT).is_err());
    assert_eq!(backend.request_count(), 1);
}
