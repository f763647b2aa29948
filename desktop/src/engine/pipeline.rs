//! Per-session read loop: frames in, feed items out.

use std::sync::Arc;

use chrono::Utc;
use gotify_client::stream::{AssembledMessage, Frame, MessageAssembler, MessageKind, StreamSession};
use message_feed::{FeedItem, Message};
use tokio_util::sync::CancellationToken;

use super::SessionId;
use super::resolver::ApplicationNames;
use crate::consumer::ConsumerHandle;
use crate::events::ErrorKind;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionOutcome {
    /// Close frame or end of stream.
    Closed,
    Cancelled,
    /// Transport failure, with its cause.
    Lost(String),
}

pub(crate) struct IngestPipeline<S> {
    session: S,
    session_id: SessionId,
    names: Arc<ApplicationNames>,
    consumer: ConsumerHandle,
    assembler: MessageAssembler,
}

impl<S: StreamSession> IngestPipeline<S> {
    pub(crate) fn new(
        session: S,
        session_id: SessionId,
        names: Arc<ApplicationNames>,
        consumer: ConsumerHandle,
    ) -> Self {
        Self {
            session,
            session_id,
            names,
            consumer,
            assembler: MessageAssembler::default(),
        }
    }

    /// Read until the stream closes, fails, or `cancel` fires. The session is
    /// closed before returning.
    pub(crate) async fn run(mut self, cancel: CancellationToken) -> SessionOutcome {
        tracing::debug!(session = %self.session_id, "Ingest pipeline started");

        let outcome = loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break SessionOutcome::Cancelled,
                result = self.session.read_frame() => result,
            };

            match result {
                Ok(Frame::Close) => break SessionOutcome::Closed,
                Ok(frame) => self.handle_frame(frame),
                Err(_) if cancel.is_cancelled() => break SessionOutcome::Cancelled,
                Err(e) => break SessionOutcome::Lost(e.to_string()),
            }
        };

        self.session.close().await;
        tracing::debug!(session = %self.session_id, ?outcome, "Ingest pipeline finished");
        outcome
    }

    fn handle_frame(&mut self, frame: Frame) {
        let decoded = match self.assembler.push(frame) {
            Ok(Some(AssembledMessage {
                kind: MessageKind::Text,
                payload,
            })) => Message::from_json(payload),
            Ok(Some(AssembledMessage {
                kind: MessageKind::Binary,
                payload,
            })) => {
                tracing::debug!(bytes = payload.len(), "Ignoring binary message");
                return;
            }
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(session = %self.session_id, "Dropping frame: {e}");
                self.consumer.report_error(ErrorKind::Decode, e.to_string());
                return;
            }
        };

        match decoded {
            Ok(message) => {
                let application_name = self.names.get(message.app_id).map(str::to_string);
                tracing::debug!(
                    id = message.id,
                    app_id = message.app_id,
                    priority = message.priority,
                    "Message received"
                );
                self.consumer
                    .ingest(FeedItem::new(message, application_name, Utc::now()));
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, "Failed to decode message: {e}");
                self.consumer.report_error(ErrorKind::Decode, e.to_string());
            }
        }
    }
}
