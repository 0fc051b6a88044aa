//! crates/doclens_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! stores and views to be independent of the concrete HTTP and storage
//! implementations.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    ChatMessage, ChatReply, Document, DocumentQuery, ExportFormat, GlossaryTerm, QuizQuestion,
    User, UserStats,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., HTTP transport, filesystem).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The bearer token was missing, expired, or rejected.
    #[error("Unauthorized")]
    Unauthorized,
    /// The backend rejected the request and supplied a detail message
    /// suitable for showing to the user.
    #[error("{0}")]
    Api(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

impl PortError {
    /// The server-provided detail message, when one exists.
    pub fn detail(&self) -> Option<&str> {
        match self {
            PortError::Api(detail) => Some(detail),
            _ => None,
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The full REST surface of the document-intelligence backend.
///
/// All operations except `login`/`register` require the bearer token to be
/// installed via [`BackendService::set_bearer_token`] first.
#[async_trait]
pub trait BackendService: Send + Sync {
    // --- Authentication ---

    /// Installs (or clears) the token attached as the default Authorization
    /// header on every subsequent request. Synchronous: callers rely on the
    /// header being in place before any dependent request is dispatched.
    fn set_bearer_token(&self, token: Option<&str>);

    /// Exchanges credentials for a bearer token (form-encoded request).
    async fn login(&self, email: &str, password: &str) -> PortResult<String>;

    /// Creates a new account. Does not sign in.
    async fn register(&self, email: &str, password: &str) -> PortResult<()>;

    /// Resolves the account behind the installed token.
    async fn current_user(&self) -> PortResult<User>;

    // --- Documents ---

    async fn list_documents(&self, query: &DocumentQuery) -> PortResult<Vec<Document>>;

    async fn upload_document(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> PortResult<Document>;

    async fn get_document(&self, document_id: i64) -> PortResult<Document>;

    async fn delete_document(&self, document_id: i64) -> PortResult<()>;

    // --- Chat ---

    async fn chat_history(&self, document_id: i64) -> PortResult<Vec<ChatMessage>>;

    async fn send_chat(&self, document_id: i64, message: &str) -> PortResult<ChatReply>;

    /// The formatted transcript as a binary payload; saved client-side with
    /// an extension matching the requested format.
    async fn export_chat(&self, document_id: i64, format: ExportFormat) -> PortResult<Bytes>;

    // --- Generation ---

    async fn generate_glossary(&self, document_id: i64) -> PortResult<Vec<GlossaryTerm>>;

    async fn generate_quiz(&self, document_id: i64) -> PortResult<Vec<QuizQuestion>>;

    // --- Account ---

    async fn user_stats(&self) -> PortResult<UserStats>;
}

/// Durable per-profile key/value storage.
///
/// Reads and writes are synchronous and last-write-wins; there is no
/// concurrent writer within a single client instance. This backs the
/// persisted token, the favorites set, and the settings draft.
pub trait ProfileStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}

/// Storage key for the persisted bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the favorites set (JSON-encoded array of ids).
pub const FAVORITES_KEY: &str = "favorites";
/// Storage key for the local settings draft.
pub const SETTINGS_KEY: &str = "userSettings";
