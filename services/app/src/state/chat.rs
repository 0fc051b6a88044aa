//! services/app/src/state/chat.rs
//!
//! Per-document chat transcript with optimistic sends.
//!
//! The user's message is appended the moment it is sent and never rolled
//! back; the AI reply (or a synthetic failure reply) is appended when the
//! request completes. Replies append in request-issue order: a completion
//! whose predecessor is still in flight is buffered until the earlier one
//! lands, so the transcript never reorders under variable latency.

use std::collections::BTreeMap;

use doclens_core::domain::{ChatMessage, ChatReply, ExportFormat, MessageRole};
use doclens_core::ports::PortResult;

/// Shown when a document has no history yet, or when loading it failed —
/// history load failure is non-fatal.
pub const WELCOME_MESSAGE: &str =
    "Hi, I'm your AI assistant. What would you like to know about this document?";

/// Appended in place of a reply when a send fails.
pub const SEND_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while processing your message. Please try again.";

pub struct ChatSession {
    document_id: i64,
    pub messages: Vec<ChatMessage>,
    pub history_loading: bool,
    next_seq: u64,
    next_expected: u64,
    /// Replies that completed before an earlier send did.
    deferred: BTreeMap<u64, ChatMessage>,
}

impl ChatSession {
    pub fn new(document_id: i64) -> Self {
        Self {
            document_id,
            messages: Vec::new(),
            history_loading: true,
            next_seq: 0,
            next_expected: 0,
            deferred: BTreeMap::new(),
        }
    }

    pub fn document_id(&self) -> i64 {
        self.document_id
    }

    /// Applies the history fetch; an empty or failed result seeds the
    /// synthetic welcome message instead of a blank or broken view.
    pub fn apply_history(&mut self, result: PortResult<Vec<ChatMessage>>) {
        self.history_loading = false;
        self.messages = match result {
            Ok(history) if !history.is_empty() => history,
            _ => vec![ChatMessage::ai(WELCOME_MESSAGE)],
        };
    }

    /// Appends the user message immediately and allocates the sequence
    /// number its completion must carry.
    pub fn begin_send(&mut self, text: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.messages.push(ChatMessage::user(text));
        seq
    }

    /// Applies a completed send. The user message stays regardless of the
    /// outcome; failures get a synthetic AI reply in the same slot.
    pub fn finish_send(&mut self, seq: u64, result: PortResult<ChatReply>) {
        let reply = match result {
            Ok(reply) => ChatMessage {
                role: MessageRole::Ai,
                content: reply.response,
                sources: reply.sources,
            },
            Err(_) => ChatMessage::ai(SEND_FAILURE_MESSAGE),
        };
        self.deferred.insert(seq, reply);

        while let Some(message) = self.deferred.remove(&self.next_expected) {
            self.messages.push(message);
            self.next_expected += 1;
        }
    }

    /// True while any send awaits its reply; drives the typing indicator
    /// and disables the input.
    pub fn waiting(&self) -> bool {
        self.next_expected < self.next_seq
    }
}

/// File name a transcript export is saved under.
pub fn export_file_name(document_id: i64, format: ExportFormat) -> String {
    format!("chat-document-{document_id}.{}", format.extension())
}
