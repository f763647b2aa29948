use super::{Frame, MAX_MESSAGE_SIZE, RECEIVE_BUFFER_SIZE};
use crate::GotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Binary,
}

/// A complete logical message, borrowed from the assembler's buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct AssembledMessage<'a> {
    pub kind: MessageKind,
    pub payload: &'a [u8],
}

/// Accumulates fragments into complete messages using one reusable buffer.
///
/// The buffer is cleared lazily on the next push, so the slice handed out
/// for a completed message stays valid until then.
pub struct MessageAssembler {
    buffer: Vec<u8>,
    kind: Option<MessageKind>,
    max_size: usize,
    overflowed: bool,
    complete: bool,
}

impl Default for MessageAssembler {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_SIZE)
    }
}

impl MessageAssembler {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(RECEIVE_BUFFER_SIZE.min(max_size)),
            kind: None,
            max_size,
            overflowed: false,
            complete: false,
        }
    }

    /// Feed one frame. Returns the message once its final fragment arrives.
    ///
    /// `Frame::Close` discards any partial message.
    pub fn push(&mut self, frame: Frame) -> Result<Option<AssembledMessage<'_>>, GotifyError> {
        if self.complete {
            self.reset();
        }

        let (kind, payload, fin) = match frame {
            Frame::Text { payload, fin } => (Some(MessageKind::Text), payload, fin),
            Frame::Binary { payload, fin } => (Some(MessageKind::Binary), payload, fin),
            Frame::Continuation { payload, fin } => (None, payload, fin),
            Frame::Close => {
                self.reset();
                return Ok(None);
            }
        };

        match (kind, self.kind) {
            (Some(new_kind), Some(_)) => {
                tracing::warn!(
                    discarded_bytes = self.buffer.len(),
                    "New message started before previous one completed"
                );
                self.reset();
                self.kind = Some(new_kind);
            }
            (Some(new_kind), None) => self.kind = Some(new_kind),
            (None, Some(_)) => {}
            (None, None) => {
                return Err(GotifyError::Stream(
                    "continuation frame without a message in progress".into(),
                ));
            }
        }

        if !self.overflowed {
            if self.buffer.len() + payload.len() > self.max_size {
                self.overflowed = true;
                self.buffer.clear();
            } else {
                self.buffer.extend_from_slice(&payload);
            }
        }

        if !fin {
            return Ok(None);
        }

        if self.overflowed {
            self.reset();
            return Err(GotifyError::Stream(format!(
                "message exceeds {} bytes",
                self.max_size
            )));
        }

        self.complete = true;
        Ok(self.kind.map(|kind| AssembledMessage {
            kind,
            payload: &self.buffer,
        }))
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.kind = None;
        self.overflowed = false;
        self.complete = false;
    }
}
