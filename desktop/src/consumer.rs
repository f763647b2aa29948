//! The consumer context: a single thread that owns the feed.
//!
//! Everything the engine wants consumers to see is posted here as a
//! [`ConsumerCommand`] and applied in queue order, so feed mutations,
//! observer callbacks and notification side effects are linearized without
//! locking the feed.

use std::thread;

use chrono::Utc;
use message_feed::{Feed, FeedItem};
use tokio::sync::{mpsc, oneshot};

use crate::events::{EngineObserver, ErrorKind};
use crate::notification::{NotificationSettings, Notifier, notify_new_item};

const THREAD_NAME: &str = "gotify-consumer";

pub enum ConsumerCommand {
    Ingest(FeedItem),
    ConnectionState(bool),
    Error { kind: ErrorKind, detail: String },
    RefreshAges,
    Clear,
    SetNotifications(NotificationSettings),
    Snapshot(oneshot::Sender<FeedSnapshot>),
    Shutdown,
}

/// Read-only copy of the consumer state.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    /// Newest first.
    pub items: Vec<FeedItem>,
    pub is_live: bool,
    pub summary: String,
    pub notifications: NotificationSettings,
}

impl FeedSnapshot {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(FeedItem::id).collect()
    }
}

/// State owned by the consumer thread.
pub struct ConsumerContext {
    feed: Feed,
    observers: Vec<Box<dyn EngineObserver>>,
    notifier: Box<dyn Notifier>,
    settings: NotificationSettings,
    is_live: bool,
}

impl ConsumerContext {
    pub fn new(notifier: Box<dyn Notifier>, settings: NotificationSettings) -> Self {
        Self {
            feed: Feed::new(),
            observers: Vec::new(),
            notifier,
            settings,
            is_live: false,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    /// Access the feed before the context is spawned, e.g. to subscribe.
    pub fn feed_mut(&mut self) -> &mut Feed {
        &mut self.feed
    }

    /// Move the context onto its own thread.
    pub fn spawn(self) -> std::io::Result<(ConsumerHandle, ConsumerThread)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || self.run(rx))?;
        tracing::info!("Consumer context started");
        Ok((ConsumerHandle { tx }, ConsumerThread { handle }))
    }

    fn run(mut self, mut rx: mpsc::UnboundedReceiver<ConsumerCommand>) {
        while let Some(command) = rx.blocking_recv() {
            if !self.handle(command) {
                break;
            }
        }
        tracing::info!(remaining = self.feed.count(), "Consumer context stopped");
    }

    /// Apply one command. Returns false when the loop should stop.
    fn handle(&mut self, command: ConsumerCommand) -> bool {
        match command {
            ConsumerCommand::Ingest(item) => self.ingest(item),
            ConsumerCommand::ConnectionState(is_live) => {
                if self.is_live != is_live {
                    self.is_live = is_live;
                    for observer in &mut self.observers {
                        observer.on_connection_state_changed(is_live);
                    }
                }
            }
            ConsumerCommand::Error { kind, detail } => {
                for observer in &mut self.observers {
                    observer.on_error(kind, &detail);
                }
            }
            ConsumerCommand::RefreshAges => {
                let changed = self.feed.refresh_ages(Utc::now());
                tracing::trace!(changed, "Relative ages refreshed");
            }
            ConsumerCommand::Clear => self.feed.clear(),
            ConsumerCommand::SetNotifications(settings) => {
                tracing::info!(
                    sound = settings.sound_enabled,
                    toast = settings.toast_enabled,
                    "Notification settings updated"
                );
                self.settings = settings;
            }
            ConsumerCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            ConsumerCommand::Shutdown => return false,
        }
        true
    }

    fn ingest(&mut self, item: FeedItem) {
        self.feed.insert_at_head(item);
        let Some(item) = self.feed.get(0) else {
            return;
        };
        for observer in &mut self.observers {
            observer.on_message(item);
        }
        notify_new_item(self.notifier.as_mut(), self.settings, item);
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.feed.iter().cloned().collect(),
            is_live: self.is_live,
            summary: self.feed.summary(),
            notifications: self.settings,
        }
    }
}

/// Posts commands to the consumer context. Cheap to clone.
///
/// Posting never blocks; once the context has stopped, commands are dropped.
#[derive(Clone)]
pub struct ConsumerHandle {
    tx: mpsc::UnboundedSender<ConsumerCommand>,
}

impl ConsumerHandle {
    fn post(&self, command: ConsumerCommand) {
        if self.tx.send(command).is_err() {
            tracing::debug!("Consumer context is gone, dropping command");
        }
    }

    pub fn ingest(&self, item: FeedItem) {
        self.post(ConsumerCommand::Ingest(item));
    }

    pub fn connection_state(&self, is_live: bool) {
        self.post(ConsumerCommand::ConnectionState(is_live));
    }

    pub fn report_error(&self, kind: ErrorKind, detail: impl Into<String>) {
        self.post(ConsumerCommand::Error {
            kind,
            detail: detail.into(),
        });
    }

    pub fn refresh_ages(&self) {
        self.post(ConsumerCommand::RefreshAges);
    }

    pub fn clear(&self) {
        self.post(ConsumerCommand::Clear);
    }

    pub fn set_notifications(&self, settings: NotificationSettings) {
        self.post(ConsumerCommand::SetNotifications(settings));
    }

    /// Copy of the feed after every previously posted command was applied.
    pub async fn snapshot(&self) -> Option<FeedSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.post(ConsumerCommand::Snapshot(reply_tx));
        reply_rx.await.ok()
    }

    pub fn shutdown(&self) {
        self.post(ConsumerCommand::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Join handle of the consumer thread.
pub struct ConsumerThread {
    handle: thread::JoinHandle<()>,
}

impl ConsumerThread {
    /// Wait for the thread to finish. Call after [`ConsumerHandle::shutdown`].
    pub fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("Consumer thread panicked");
        }
    }
}
