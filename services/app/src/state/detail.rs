//! services/app/src/state/detail.rs
//!
//! Single-document detail state plus the processing-status polling loop.
//!
//! While the displayed document is `processing` it is re-fetched on a fixed
//! interval until the status leaves `processing`. The loop holds a
//! `CancellationToken` so leaving the view tears it down deterministically,
//! and every completion carries the view generation so stale responses are
//! discarded instead of mutating a gone view.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use doclens_core::domain::{Document, DocumentStatus};
use doclens_core::ports::{BackendService, PortError};

/// Polling gives up after this many fetches (~5 minutes at the default 3 s
/// interval); the document keeps its last observed status and the view
/// stays usable.
pub const POLL_LIMIT: u32 = 100;

#[derive(Debug)]
pub enum PollOutcome {
    Updated(Document),
    Failed(PortError),
    GaveUp,
}

/// One message from the polling task back to the view.
#[derive(Debug)]
pub struct PollUpdate {
    pub document_id: i64,
    pub generation: u64,
    pub outcome: PollOutcome,
}

pub struct DetailState {
    pub document: Option<Document>,
    pub loading: bool,
    generation: u64,
    poll: Option<CancellationToken>,
}

impl DetailState {
    pub fn new() -> Self {
        Self {
            document: None,
            loading: false,
            generation: 0,
            poll: None,
        }
    }

    /// Starts a fresh visit to the detail view; returns the generation tag
    /// completions must echo.
    pub fn enter(&mut self) -> u64 {
        self.stop_polling();
        self.document = None;
        self.loading = true;
        self.generation += 1;
        self.generation
    }

    /// Tears the view down, cancelling any running poll.
    pub fn leave(&mut self) {
        self.stop_polling();
        self.document = None;
        self.loading = false;
        self.generation += 1;
    }

    pub fn stop_polling(&mut self) {
        if let Some(token) = self.poll.take() {
            token.cancel();
        }
    }

    /// Registers the cancellation token of a newly spawned poll task,
    /// cancelling any predecessor first.
    pub fn attach_poll(&mut self, token: CancellationToken) {
        self.stop_polling();
        self.poll = Some(token);
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Applies a fetched document. Returns false when the completion is
    /// stale (older generation) or would regress an already-terminal status
    /// via an out-of-order poll response.
    pub fn apply_fetch(&mut self, generation: u64, document: Document) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        if let Some(current) = &self.document {
            if current.id == document.id
                && current.status.is_terminal()
                && !document.status.is_terminal()
            {
                return false;
            }
        }
        self.document = Some(document);
        true
    }

    /// Whether the currently displayed status calls for polling.
    pub fn needs_polling(&self) -> bool {
        matches!(
            self.document.as_ref().map(|doc| doc.status),
            Some(DocumentStatus::Processing)
        ) && self.poll.is_none()
    }
}

impl Default for DetailState {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-fetches `document_id` every `interval` until the status leaves
/// `processing`, the token is cancelled, or [`POLL_LIMIT`] is reached.
///
/// Fetch failures are reported and polling continues; the backend may
/// recover on the next tick.
pub fn spawn_status_poll(
    backend: Arc<dyn BackendService>,
    document_id: i64,
    generation: u64,
    interval: Duration,
    cancel: CancellationToken,
    emit: impl Fn(PollUpdate) + Send + 'static,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; the first
        // fetch should happen one full interval after entry.
        ticker.tick().await;

        let mut polls = 0u32;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            if polls >= POLL_LIMIT {
                emit(PollUpdate {
                    document_id,
                    generation,
                    outcome: PollOutcome::GaveUp,
                });
                return;
            }
            polls += 1;

            match backend.get_document(document_id).await {
                Ok(document) => {
                    let finished = document.status != DocumentStatus::Processing;
                    emit(PollUpdate {
                        document_id,
                        generation,
                        outcome: PollOutcome::Updated(document),
                    });
                    if finished {
                        return;
                    }
                }
                Err(error) => {
                    emit(PollUpdate {
                        document_id,
                        generation,
                        outcome: PollOutcome::Failed(error),
                    });
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::StubBackend;
    use chrono::Utc;
    use std::sync::atomic::Ordering;
    use tokio::sync::mpsc;

    fn doc(id: i64, status: DocumentStatus) -> Document {
        Document {
            id,
            title: "doc".to_string(),
            filename: "doc.pdf".to_string(),
            status,
            created_at: Utc::now(),
            page_count: Some(3),
            author: None,
            summary_short: None,
        }
    }

    #[tokio::test]
    async fn polling_stops_after_observing_a_terminal_status() {
        let backend = Arc::new(StubBackend::default());
        backend.queue_get_document(Ok(doc(1, DocumentStatus::Processing)));
        backend.queue_get_document(Ok(doc(1, DocumentStatus::Completed)));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_status_poll(
            backend.clone(),
            1,
            1,
            Duration::from_millis(5),
            CancellationToken::new(),
            move |update| {
                let _ = tx.send(update);
            },
        );
        handle.await.unwrap();

        // Exactly two fetches: one observing processing, one completed.
        assert_eq!(backend.get_document_calls.load(Ordering::SeqCst), 2);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            first.outcome,
            PollOutcome::Updated(ref d) if d.status == DocumentStatus::Processing
        ));
        assert!(matches!(
            second.outcome,
            PollOutcome::Updated(ref d) if d.status == DocumentStatus::Completed
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_prevents_any_further_fetch() {
        let backend = Arc::new(StubBackend::default());
        let token = CancellationToken::new();
        token.cancel();

        let handle = spawn_status_poll(
            backend.clone(),
            1,
            1,
            Duration::from_millis(5),
            token,
            |_update| {},
        );
        handle.await.unwrap();

        assert_eq!(backend.get_document_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn polling_gives_up_at_the_limit() {
        let backend = Arc::new(StubBackend::default());
        for _ in 0..POLL_LIMIT {
            backend.queue_get_document(Ok(doc(1, DocumentStatus::Processing)));
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_status_poll(
            backend.clone(),
            1,
            1,
            Duration::from_millis(1),
            CancellationToken::new(),
            move |update| {
                let _ = tx.send(update);
            },
        );
        handle.await.unwrap();

        assert_eq!(
            backend.get_document_calls.load(Ordering::SeqCst),
            POLL_LIMIT
        );
        let mut last = None;
        while let Some(update) = rx.recv().await {
            last = Some(update);
        }
        assert!(matches!(last.unwrap().outcome, PollOutcome::GaveUp));
    }

    #[test]
    fn stale_and_regressive_fetches_are_discarded() {
        let mut detail = DetailState::new();
        let old_generation = detail.enter();
        let generation = detail.enter();

        assert!(!detail.apply_fetch(old_generation, doc(1, DocumentStatus::Processing)));
        assert!(detail.document.is_none());

        assert!(detail.apply_fetch(generation, doc(1, DocumentStatus::Completed)));
        // An out-of-order poll response must not regress the terminal status.
        assert!(!detail.apply_fetch(generation, doc(1, DocumentStatus::Processing)));
        assert_eq!(
            detail.document.as_ref().map(|d| d.status),
            Some(DocumentStatus::Completed)
        );
    }

    #[test]
    fn leaving_the_view_cancels_the_poll() {
        let mut detail = DetailState::new();
        detail.enter();
        let token = CancellationToken::new();
        detail.attach_poll(token.clone());
        assert!(detail.is_polling());

        detail.leave();
        assert!(token.is_cancelled());
        assert!(!detail.is_polling());
    }
}
