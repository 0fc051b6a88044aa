//! services/app/src/adapters/http.rs
//!
//! This module contains the adapter for the document-intelligence REST
//! backend. It implements the `BackendService` port from the `core` crate on
//! top of a shared `reqwest` client.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use doclens_core::domain::{
    ChatMessage, ChatReply, Document, DocumentQuery, ExportFormat, GlossaryTerm, QuizQuestion,
    User, UserStats,
};
use doclens_core::ports::{BackendService, PortError, PortResult};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    is_superuser: bool,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Error body shape used by the backend for rejected requests.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `BackendService` against the REST API.
///
/// The bearer token lives behind a lock so that installing it is a
/// synchronous operation: once `set_bearer_token` returns, every request
/// built afterwards carries the header.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the installed bearer token, when present.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let guard = match self.token.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Maps a non-success response to a `PortError`, preferring the
    /// server-provided `detail` message when the body carries one.
    async fn check(response: Response) -> PortResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);

        Err(if status == StatusCode::NOT_FOUND {
            PortError::NotFound(detail.unwrap_or_else(|| "resource not found".to_string()))
        } else if let Some(detail) = detail {
            PortError::Api(detail)
        } else if status == StatusCode::UNAUTHORIZED {
            PortError::Unauthorized
        } else {
            PortError::Unexpected(format!("HTTP {status}"))
        })
    }
}

fn transport(error: reqwest::Error) -> PortError {
    PortError::Unexpected(format!("request failed: {error}"))
}

fn decode(error: reqwest::Error) -> PortError {
    PortError::Unexpected(format!("invalid response body: {error}"))
}

//=========================================================================================
// `BackendService` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendService for HttpBackend {
    fn set_bearer_token(&self, token: Option<&str>) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token.map(str::to_string);
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<String> {
        // Credentials go out form-encoded, not as JSON.
        let params = [("username", email), ("password", password)];
        let response = self
            .client
            .post(self.url("/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(transport)?;

        let token: TokenResponse = Self::check(response).await?.json().await.map_err(decode)?;
        Ok(token.access_token)
    }

    async fn register(&self, email: &str, password: &str) -> PortResult<()> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&RegisterRequest {
                email,
                password,
                is_superuser: false,
            })
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        Ok(())
    }

    async fn current_user(&self) -> PortResult<User> {
        let response = self
            .authorize(self.client.get(self.url("/auth/me")))
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn list_documents(&self, query: &DocumentQuery) -> PortResult<Vec<Document>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(status) = query.status.as_param() {
            params.push(("status", status.to_string()));
        }
        params.push(("sort_by", query.sort_by.as_param().to_string()));
        params.push(("order", query.order.as_param().to_string()));

        let response = self
            .authorize(self.client.get(self.url("/documents")).query(&params))
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn upload_document(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> PortResult<Document> {
        let part = multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| PortError::Unexpected(format!("invalid content type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(self.url("/documents/upload")).multipart(form))
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn get_document(&self, document_id: i64) -> PortResult<Document> {
        let response = self
            .authorize(self.client.get(self.url(&format!("/documents/{document_id}"))))
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn delete_document(&self, document_id: i64) -> PortResult<()> {
        let response = self
            .authorize(
                self.client
                    .delete(self.url(&format!("/documents/{document_id}"))),
            )
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        Ok(())
    }

    async fn chat_history(&self, document_id: i64) -> PortResult<Vec<ChatMessage>> {
        let response = self
            .authorize(
                self.client
                    .get(self.url(&format!("/documents/{document_id}/history"))),
            )
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn send_chat(&self, document_id: i64, message: &str) -> PortResult<ChatReply> {
        let response = self
            .authorize(
                self.client
                    .post(self.url(&format!("/documents/{document_id}/chat")))
                    .json(&ChatRequest { message }),
            )
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn export_chat(&self, document_id: i64, format: ExportFormat) -> PortResult<Bytes> {
        let response = self
            .authorize(
                self.client
                    .get(self.url(&format!("/documents/{document_id}/export-chat")))
                    .query(&[("format", format.wire_value())]),
            )
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.bytes().await.map_err(decode)
    }

    async fn generate_glossary(&self, document_id: i64) -> PortResult<Vec<GlossaryTerm>> {
        let response = self
            .authorize(
                self.client
                    .post(self.url(&format!("/documents/{document_id}/glossary"))),
            )
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn generate_quiz(&self, document_id: i64) -> PortResult<Vec<QuizQuestion>> {
        let response = self
            .authorize(
                self.client
                    .post(self.url(&format!("/documents/{document_id}/quiz"))),
            )
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }

    async fn user_stats(&self) -> PortResult<UserStats> {
        let response = self
            .authorize(self.client.get(self.url("/users/stats")))
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?.json().await.map_err(decode)
    }
}
