use std::sync::atomic::Ordering;
use std::time::Duration;

use gotify_client::stream::Frame;

use super::testing::*;
use super::*;

#[tokio::test]
async fn test_start_connects_to_stream_url() {
    let harness = Harness::new();
    let (_frames, _) = harness.transport.accept();

    let id = harness.engine.start(&credentials()).await.unwrap();

    assert_eq!(harness.engine.state(), ConnectionState::Live);
    assert_eq!(harness.engine.session_id(), Some(id));
    assert_eq!(
        harness.transport.urls.lock().unwrap().as_slice(),
        &["wss://push.example.com/stream?token=T0KEN".to_string()]
    );
    harness.flush().await;
    assert_eq!(harness.recorder.states(), vec![true]);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_feed_is_reverse_arrival_order() {
    let harness = Harness::new();
    let (frames, _) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    for id in 1..=3 {
        frames.send(Ok(Frame::text(message_json(id, 1)))).unwrap();
    }
    let snapshot = harness.wait_for_count(3).await;

    assert_eq!(snapshot.ids(), vec![3, 2, 1]);
    assert_eq!(snapshot.summary, "3 notifications");
    let messages: Vec<Seen> = harness
        .recorder
        .seen()
        .into_iter()
        .filter(|seen| matches!(seen, Seen::Message(_)))
        .collect();
    assert_eq!(
        messages,
        vec![Seen::Message(1), Seen::Message(2), Seen::Message(3)]
    );

    harness.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_keeps_session_alive() {
    let harness = Harness::new();
    let (frames, _) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    frames.send(Ok(Frame::text(message_json(1, 1)))).unwrap();
    frames.send(Ok(Frame::text("{not json"))).unwrap();
    frames.send(Ok(Frame::text(vec![0xff, 0xfe]))).unwrap();
    frames.send(Ok(Frame::text(message_json(2, 1)))).unwrap();
    let snapshot = harness.wait_for_count(2).await;

    assert_eq!(snapshot.ids(), vec![2, 1]);
    assert_eq!(harness.engine.state(), ConnectionState::Live);
    assert_eq!(
        harness.recorder.errors(),
        vec![ErrorKind::Decode, ErrorKind::Decode]
    );
    assert_eq!(harness.recorder.states(), vec![true]);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_fragmented_message_is_reassembled() {
    let harness = Harness::new();
    let (frames, _) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    let json = message_json(7, 1).into_bytes();
    let (head, tail) = json.split_at(10);
    frames
        .send(Ok(Frame::Text {
            payload: head.to_vec(),
            fin: false,
        }))
        .unwrap();
    frames
        .send(Ok(Frame::Continuation {
            payload: tail.to_vec(),
            fin: true,
        }))
        .unwrap();
    frames
        .send(Ok(Frame::Binary {
            payload: vec![1, 2, 3],
            fin: true,
        }))
        .unwrap();
    let snapshot = harness.wait_for_count(1).await;

    assert_eq!(snapshot.ids(), vec![7]);
    assert!(harness.recorder.errors().is_empty());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_transport_error_reports_connection_lost_once() {
    let harness = Harness::new();
    let (frames, closes) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    frames
        .send(Err(GotifyError::Stream("connection reset".into())))
        .unwrap();
    harness.wait_for_state(ConnectionState::Idle).await;
    harness.flush().await;

    assert_eq!(
        harness.recorder.seen(),
        vec![
            Seen::State(true),
            Seen::Error(ErrorKind::ConnectionLost),
            Seen::State(false),
        ]
    );
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(harness.engine.session_id(), None);

    // Stopping afterwards must not report the loss again.
    harness.engine.stop().await;
    harness.flush().await;
    assert_eq!(harness.recorder.states(), vec![true, false]);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_server_close_ends_without_error() {
    let harness = Harness::new();
    let (frames, _) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    frames.send(Ok(Frame::Close)).unwrap();
    harness.wait_for_state(ConnectionState::Idle).await;
    harness.flush().await;

    assert_eq!(harness.recorder.states(), vec![true, false]);
    assert!(harness.recorder.errors().is_empty());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_restart_tears_down_exactly_one_session() {
    let harness = Harness::new();
    let (_first_frames, first_closes) = harness.transport.accept();
    let (second_frames, second_closes) = harness.transport.accept();

    let first = harness.engine.start(&credentials()).await.unwrap();
    let second = harness.engine.start(&credentials()).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(harness.engine.session_id(), Some(second));
    assert_eq!(first_closes.load(Ordering::SeqCst), 1);
    assert_eq!(second_closes.load(Ordering::SeqCst), 0);
    assert_eq!(harness.transport.connects(), 2);

    second_frames.send(Ok(Frame::text(message_json(1, 1)))).unwrap();
    harness.wait_for_count(1).await;
    assert_eq!(harness.recorder.states(), vec![true, false, true]);
    assert!(harness.recorder.errors().is_empty());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_stop_cancels_read_without_connection_lost() {
    let harness = Harness::new();
    let (_frames, closes) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    harness.engine.stop().await;
    harness.flush().await;

    assert_eq!(harness.engine.state(), ConnectionState::Stopped);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(harness.recorder.states(), vec![true, false]);
    assert!(harness.recorder.errors().is_empty());
    assert!(harness.engine.credentials().is_none());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_handshake_rejection_is_returned() {
    let harness = Harness::new();
    harness.transport.push(Script::Reject(401));

    let err = harness.engine.start(&credentials()).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::HandshakeFailed {
            source: GotifyError::HandshakeRejected { status: 401 },
            ..
        }
    ));
    assert!(!err.is_retryable());
    assert_eq!(harness.engine.state(), ConnectionState::Idle);
    harness.flush().await;
    assert!(harness.recorder.seen().is_empty());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_invalid_scheme_is_config_error() {
    let harness = Harness::new();
    let creds = Credentials::new("ftp://push.example.com", "T0KEN").unwrap();

    let err = harness.engine.start(&creds).await.unwrap_err();

    assert!(matches!(err, EngineError::ConfigInvalid(_)));
    assert_eq!(harness.transport.connects(), 0);
    assert_eq!(harness.engine.state(), ConnectionState::Idle);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_stop_interrupts_handshake() {
    let harness = Harness::new();
    harness.transport.push(Script::Hang);

    let engine = harness.engine.clone();
    let pending = tokio::spawn(async move { engine.start(&credentials()).await });
    harness.wait_for_state(ConnectionState::Connecting).await;

    harness.engine.stop().await;
    let result = pending.await.unwrap();

    assert!(matches!(result, Err(EngineError::Cancelled)));
    assert_eq!(harness.engine.state(), ConnectionState::Stopped);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_stop_is_idempotent_and_final() {
    let harness = Harness::new();
    harness.engine.stop().await;
    harness.engine.stop().await;

    assert_eq!(harness.engine.state(), ConnectionState::Stopped);
    assert!(matches!(
        harness.engine.start(&credentials()).await,
        Err(EngineError::Stopped)
    ));
    assert_eq!(harness.transport.connects(), 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_messages_are_enriched_with_application_names() {
    let harness = Harness::with_source(MockSource::with([Some(vec![app(1, "Backups")])]));
    let (frames, _) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();

    frames.send(Ok(Frame::text(message_json(1, 1)))).unwrap();
    frames.send(Ok(Frame::text(message_json(2, 42)))).unwrap();
    let snapshot = harness.wait_for_count(2).await;

    assert_eq!(snapshot.items[0].application_label(), "App #42");
    assert_eq!(snapshot.items[1].application_label(), "Backups");
    assert_eq!(harness.engine.application_names().get(1), Some("Backups"));

    harness.engine.stop().await;
    assert!(harness.engine.application_names().is_empty());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_metadata_failure_does_not_block_start() {
    let harness = Harness::with_source(HangingSource);
    let (frames, _) = harness.transport.accept();

    harness.engine.start(&credentials()).await.unwrap();
    frames.send(Ok(Frame::text(message_json(1, 3)))).unwrap();
    let snapshot = harness.wait_for_count(1).await;

    assert_eq!(snapshot.items[0].application_label(), "App #3");

    harness.shutdown().await;
}

#[tokio::test]
async fn test_resolver_keeps_previous_mapping_on_failure() {
    let resolver = MetadataResolver::new(
        MockSource::with([Some(vec![app(1, "Backups"), app(2, "CI")]), None]),
        Duration::from_secs(1),
    );

    let first = resolver.refresh(&credentials()).await;
    assert_eq!(first.get(2), Some("CI"));

    let second = resolver.refresh(&credentials()).await;
    assert_eq!(second.len(), 2);
    assert_eq!(resolver.snapshot().get(1), Some("Backups"));

    resolver.clear();
    assert!(resolver.snapshot().is_empty());
}

#[tokio::test]
async fn test_resolver_times_out() {
    let resolver = MetadataResolver::new(HangingSource, Duration::from_millis(20));
    let names = resolver.refresh(&credentials()).await;
    assert!(names.is_empty());
}

#[test]
fn test_retryable_errors() {
    let err = EngineError::HandshakeFailed {
        url: "wss://push.example.com/stream".into(),
        source: GotifyError::Timeout,
    };
    assert!(err.is_retryable());
    assert!(!EngineError::Stopped.is_retryable());
    assert!(!EngineError::ConfigInvalid("bad".into()).is_retryable());
}

#[tokio::test]
async fn test_start_supersedes_pending_handshake() {
    let harness = Harness::new();
    harness.transport.push(Script::Hang);
    let (_frames, _) = harness.transport.accept();

    let engine = harness.engine.clone();
    let first = tokio::spawn(async move { engine.start(&credentials()).await });
    harness.wait_for_state(ConnectionState::Connecting).await;

    let second = tokio::time::timeout(
        Duration::from_secs(2),
        harness.engine.start(&credentials()),
    )
    .await
    .expect("second start waited on the pending handshake");

    let second = second.unwrap();
    assert!(matches!(first.await.unwrap(), Err(EngineError::Cancelled)));
    assert_eq!(harness.engine.state(), ConnectionState::Live);
    assert_eq!(harness.engine.session_id(), Some(second));
    assert_eq!(harness.transport.connects(), 2);
    harness.flush().await;
    assert_eq!(harness.recorder.states(), vec![true]);

    harness.shutdown().await;
}

#[tokio::test]
async fn test_credentials_recorded_only_once_live() {
    let harness = Harness::new();
    harness.transport.push(Script::Reject(401));
    harness.engine.start(&credentials()).await.unwrap_err();
    assert!(harness.engine.credentials().is_none());

    harness.transport.push(Script::Hang);
    let engine = harness.engine.clone();
    let pending = tokio::spawn(async move { engine.start(&credentials()).await });
    harness.wait_for_state(ConnectionState::Connecting).await;
    assert!(harness.engine.credentials().is_none());

    let (_frames, _) = harness.transport.accept();
    harness.engine.start(&credentials()).await.unwrap();
    assert!(pending.await.unwrap().is_err());
    assert_eq!(harness.engine.credentials(), Some(credentials()));

    harness.shutdown().await;
}
