//! services/app/src/tui/events.rs
//!
//! Events flowing through the application event loop. Completion events
//! carry enough identity (document id, sequence number, view generation)
//! for the reducer to discard results that arrive after their view is gone.

use std::path::PathBuf;

use doclens_core::domain::{
    ChatMessage, ChatReply, Document, GlossaryTerm, QuizQuestion, UserStats,
};
use doclens_core::ports::PortResult;

use crate::state::detail::PollUpdate;

#[derive(Debug)]
pub enum AppEvent {
    /// Raw terminal input (keyboard/resize).
    Input(crossterm::event::Event),
    /// Startup resolution of a persisted token finished (either way).
    SessionReady,
    /// A login attempt completed; the session store already holds the
    /// outcome and emitted its toasts.
    LoginFinished { ok: bool },
    RegisterFinished { ok: bool },
    LibraryLoaded {
        generation: u64,
        result: PortResult<Vec<Document>>,
    },
    FavoritesLoaded {
        generation: u64,
        result: PortResult<Vec<Document>>,
    },
    UploadFinished {
        result: PortResult<Document>,
    },
    DocumentDeleted {
        document_id: i64,
        result: PortResult<()>,
    },
    /// Initial (non-poll) fetch of the detail view.
    DetailFetched {
        generation: u64,
        result: PortResult<Document>,
    },
    /// A message from the status polling task.
    Poll(PollUpdate),
    HistoryLoaded {
        document_id: i64,
        result: PortResult<Vec<ChatMessage>>,
    },
    ChatCompleted {
        document_id: i64,
        seq: u64,
        result: PortResult<ChatReply>,
    },
    ExportFinished {
        document_id: i64,
        result: PortResult<PathBuf>,
    },
    GlossaryReady {
        document_id: i64,
        result: PortResult<Vec<GlossaryTerm>>,
    },
    QuizReady {
        document_id: i64,
        result: PortResult<Vec<QuizQuestion>>,
    },
    StatsLoaded {
        result: PortResult<UserStats>,
    },
    Quit,
}

/// The page currently composed by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Library,
    Favorites,
    Document(i64),
    Settings,
}

impl Route {
    /// Whether the route requires an authenticated session.
    pub fn is_protected(self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Register => "Create account",
            Route::Dashboard => "Dashboard",
            Route::Library => "Library",
            Route::Favorites => "Favorites",
            Route::Document(_) => "Document",
            Route::Settings => "Settings",
        }
    }
}

/// Outcome of handing an input event to the focused view.
#[derive(Debug)]
pub enum ViewResult {
    /// The view did not use the event; global keys may.
    Ignored,
    /// The view consumed the event.
    Consumed,
    /// The view requests navigation.
    Goto(Route),
    /// The view requests ending the session.
    Logout,
}
