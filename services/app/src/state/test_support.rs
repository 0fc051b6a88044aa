//! services/app/src/state/test_support.rs
//!
//! Deterministic in-memory fakes for the core ports, shared by the store
//! unit tests. Responses are queued per endpoint; an endpoint with an empty
//! queue fails the call, which keeps tests honest about the requests they
//! expect.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use doclens_core::domain::{
    ChatMessage, ChatReply, Document, DocumentQuery, ExportFormat, GlossaryTerm, QuizQuestion,
    User, UserStats,
};
use doclens_core::ports::{BackendService, PortError, PortResult, ProfileStorage};

use super::lock;

#[derive(Default)]
pub struct StubBackend {
    login_results: Mutex<VecDeque<PortResult<String>>>,
    register_results: Mutex<VecDeque<PortResult<()>>>,
    current_user_results: Mutex<VecDeque<PortResult<User>>>,
    get_document_results: Mutex<VecDeque<PortResult<Document>>>,
    tokens: Mutex<Vec<Option<String>>>,
    pub get_document_calls: AtomicU32,
}

impl StubBackend {
    pub fn queue_login(&self, result: PortResult<String>) {
        lock(&self.login_results).push_back(result);
    }

    pub fn queue_register(&self, result: PortResult<()>) {
        lock(&self.register_results).push_back(result);
    }

    pub fn queue_current_user(&self, result: PortResult<User>) {
        lock(&self.current_user_results).push_back(result);
    }

    pub fn queue_get_document(&self, result: PortResult<Document>) {
        lock(&self.get_document_results).push_back(result);
    }

    /// The most recent value passed to `set_bearer_token`, flattened.
    pub fn last_token(&self) -> Option<String> {
        lock(&self.tokens).last().cloned().flatten()
    }

    fn next<T>(queue: &Mutex<VecDeque<PortResult<T>>>, endpoint: &str) -> PortResult<T> {
        lock(queue)
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected(format!("unexpected call: {endpoint}"))))
    }

    fn unexpected<T>(endpoint: &str) -> PortResult<T> {
        Err(PortError::Unexpected(format!("unexpected call: {endpoint}")))
    }
}

#[async_trait]
impl BackendService for StubBackend {
    fn set_bearer_token(&self, token: Option<&str>) {
        lock(&self.tokens).push(token.map(str::to_string));
    }

    async fn login(&self, _email: &str, _password: &str) -> PortResult<String> {
        Self::next(&self.login_results, "login")
    }

    async fn register(&self, _email: &str, _password: &str) -> PortResult<()> {
        Self::next(&self.register_results, "register")
    }

    async fn current_user(&self) -> PortResult<User> {
        Self::next(&self.current_user_results, "current_user")
    }

    async fn list_documents(&self, _query: &DocumentQuery) -> PortResult<Vec<Document>> {
        Self::unexpected("list_documents")
    }

    async fn upload_document(
        &self,
        _filename: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> PortResult<Document> {
        Self::unexpected("upload_document")
    }

    async fn get_document(&self, _document_id: i64) -> PortResult<Document> {
        self.get_document_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.get_document_results, "get_document")
    }

    async fn delete_document(&self, _document_id: i64) -> PortResult<()> {
        Self::unexpected("delete_document")
    }

    async fn chat_history(&self, _document_id: i64) -> PortResult<Vec<ChatMessage>> {
        Self::unexpected("chat_history")
    }

    async fn send_chat(&self, _document_id: i64, _message: &str) -> PortResult<ChatReply> {
        Self::unexpected("send_chat")
    }

    async fn export_chat(&self, _document_id: i64, _format: ExportFormat) -> PortResult<Bytes> {
        Self::unexpected("export_chat")
    }

    async fn generate_glossary(&self, _document_id: i64) -> PortResult<Vec<GlossaryTerm>> {
        Self::unexpected("generate_glossary")
    }

    async fn generate_quiz(&self, _document_id: i64) -> PortResult<Vec<QuizQuestion>> {
        Self::unexpected("generate_quiz")
    }

    async fn user_stats(&self) -> PortResult<UserStats> {
        Self::unexpected("user_stats")
    }
}

/// `ProfileStorage` kept entirely in memory.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn dump(&self) -> BTreeMap<String, String> {
        lock(&self.entries).clone()
    }
}

impl ProfileStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}
