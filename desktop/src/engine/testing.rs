//! Scripted transport, application source and observer shared by the
//! engine and reconnect tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gotify_client::api::models::Application;
use gotify_client::stream::Frame;
use message_feed::FeedItem;
use tokio::sync::mpsc;
use url::Url;

use super::*;
use crate::consumer::{ConsumerContext, ConsumerThread, FeedSnapshot};
use crate::events::EngineObserver;
use crate::notification::{NotificationSettings, SilentNotifier};

// -- Scripted transport --

pub(crate) type FrameSender = mpsc::UnboundedSender<Result<Frame, GotifyError>>;

pub(crate) enum Script {
    Accept(MockSession),
    Reject(u16),
    Hang,
}

#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    pub(crate) urls: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    /// Queue an accepted handshake. Returns the frame feed and the number of
    /// times the session was closed.
    pub(crate) fn accept(&self) -> (FrameSender, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));
        let session = MockSession {
            frames: rx,
            closes: closes.clone(),
        };
        self.scripts.lock().unwrap().push_back(Script::Accept(session));
        (tx, closes)
    }

    pub(crate) fn push(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub(crate) fn connects(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

impl StreamTransport for MockTransport {
    type Session = MockSession;

    async fn connect(&self, url: &Url) -> Result<MockSession, GotifyError> {
        self.urls.lock().unwrap().push(url.to_string());
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Accept(session)) => Ok(session),
            Some(Script::Reject(status)) => Err(GotifyError::HandshakeRejected { status }),
            Some(Script::Hang) | None => std::future::pending().await,
        }
    }
}

pub(crate) struct MockSession {
    frames: mpsc::UnboundedReceiver<Result<Frame, GotifyError>>,
    closes: Arc<AtomicUsize>,
}

impl StreamSession for MockSession {
    async fn read_frame(&mut self) -> Result<Frame, GotifyError> {
        match self.frames.recv().await {
            Some(result) => result,
            // Sender dropped: behave like a quiet connection.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// -- Scripted application source --

#[derive(Default)]
pub(crate) struct MockSource {
    responses: Mutex<VecDeque<Option<Vec<Application>>>>,
}

impl MockSource {
    pub(crate) fn with(responses: impl IntoIterator<Item = Option<Vec<Application>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }
}

impl ApplicationSource for MockSource {
    async fn fetch_applications(
        &self,
        _credentials: &Credentials,
    ) -> Result<Vec<Application>, GotifyError> {
        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(Some(apps)) => Ok(apps),
            _ => Err(GotifyError::ApiError {
                status: 500,
                message: "unavailable".into(),
            }),
        }
    }
}

pub(crate) struct HangingSource;

impl ApplicationSource for HangingSource {
    async fn fetch_applications(
        &self,
        _credentials: &Credentials,
    ) -> Result<Vec<Application>, GotifyError> {
        std::future::pending().await
    }
}

pub(crate) fn app(id: i64, name: &str) -> Application {
    Application {
        id,
        name: name.into(),
        token: String::new(),
        description: String::new(),
    }
}

// -- Recording observer --

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Seen {
    Message(i64),
    State(bool),
    Error(ErrorKind),
}

#[derive(Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<Seen>>>);

impl Recorder {
    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn states(&self) -> Vec<bool> {
        self.seen()
            .into_iter()
            .filter_map(|seen| match seen {
                Seen::State(live) => Some(live),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<ErrorKind> {
        self.seen()
            .into_iter()
            .filter_map(|seen| match seen {
                Seen::Error(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }
}

impl EngineObserver for Recorder {
    fn on_message(&mut self, item: &FeedItem) {
        self.0.lock().unwrap().push(Seen::Message(item.id()));
    }

    fn on_connection_state_changed(&mut self, is_live: bool) {
        self.0.lock().unwrap().push(Seen::State(is_live));
    }

    fn on_error(&mut self, kind: ErrorKind, _detail: &str) {
        self.0.lock().unwrap().push(Seen::Error(kind));
    }
}

// -- Harness --

pub(crate) struct Harness<A> {
    pub(crate) engine: StreamEngine<MockTransport, A>,
    pub(crate) transport: MockTransport,
    pub(crate) recorder: Recorder,
    thread: Option<ConsumerThread>,
}

impl Harness<MockSource> {
    pub(crate) fn new() -> Self {
        Self::with_source(MockSource::default())
    }
}

impl<A: ApplicationSource> Harness<A> {
    pub(crate) fn with_source(source: A) -> Self {
        let recorder = Recorder::default();
        let mut context =
            ConsumerContext::new(Box::new(SilentNotifier), NotificationSettings::default());
        context.add_observer(Box::new(recorder.clone()));
        let (consumer, thread) = context.spawn().unwrap();

        let transport = MockTransport::default();
        let resolver = MetadataResolver::new(source, Duration::from_millis(200));
        let engine = StreamEngine::new(transport.clone(), resolver, consumer);
        Self {
            engine,
            transport,
            recorder,
            thread: Some(thread),
        }
    }

    /// Wait until the consumer has applied everything posted so far.
    pub(crate) async fn flush(&self) -> FeedSnapshot {
        self.engine.consumer().snapshot().await.unwrap()
    }

    pub(crate) async fn wait_for_count(&self, count: usize) -> FeedSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = self.flush().await;
                if snapshot.count() >= count {
                    return snapshot;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("feed did not reach the expected count")
    }

    pub(crate) async fn wait_for_state(&self, wanted: ConnectionState) {
        let mut rx = self.engine.subscribe_state();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|state| *state == wanted))
            .await
            .expect("engine did not reach the expected state")
            .unwrap();
    }

    /// Wait until the transport has seen `count` handshakes.
    pub(crate) async fn wait_for_connects(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.transport.connects() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("transport did not see the expected handshakes");
    }

    pub(crate) async fn shutdown(mut self) {
        self.engine.stop().await;
        self.engine.consumer().shutdown();
        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .unwrap();
        }
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("https://push.example.com", "T0KEN").unwrap()
}

pub(crate) fn message_json(id: i64, app_id: i64) -> String {
    format!(
        r#"{{"id":{id},"appid":{app_id},"message":"body {id}","title":"title {id}","priority":5,"date":"2024-06-15T12:00:00Z"}}"#
    )
}
