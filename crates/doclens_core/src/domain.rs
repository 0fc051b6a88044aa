//! crates/doclens_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs mirror the backend's wire representation but carry no
//! knowledge of HTTP, storage, or rendering.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated account, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

/// Processing state of an uploaded document.
///
/// Transitions only move forward (uploaded → processing → completed, or to
/// error). The client reflects backend truth; it never drives a transition
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Completed,
    Error,
}

impl DocumentStatus {
    /// Terminal statuses end the detail-view polling loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Error => "error",
        }
    }
}

/// A document tracked through the backend's ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary_short: Option<String>,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Ai,
}

/// A page citation attached to an AI answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub page: u32,
}

/// One entry in a document's chat transcript. The transcript is
/// append-only; render order is exactly sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Ai,
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// The backend's answer to a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// A generated multiple-choice question. `correct_answer` indexes into
/// `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

/// A term/definition pair generated for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
}

/// Per-day upload count inside the stats activity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: String,
    pub count: u32,
}

/// Account-level statistics shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_documents: u32,
    pub processed_documents: u32,
    pub total_pages: u32,
    pub storage_used_mb: f64,
    #[serde(default)]
    pub activity_history: Vec<ActivityDay>,
}

/// Chat transcript export formats; the wire value doubles as the file
/// extension of the saved download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Txt,
    Md,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Txt, ExportFormat::Md];

    pub fn wire_value(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
        }
    }

    pub fn extension(self) -> &'static str {
        self.wire_value()
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Txt => "Plain text",
            ExportFormat::Md => "Markdown",
        }
    }
}

/// Status facet of a document listing. `All` sends no status parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DocumentStatus),
}

impl StatusFilter {
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.label()),
        }
    }
}

/// Sort key for the document listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Title,
}

impl SortKey {
    pub fn as_param(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// A document listing request. Translated verbatim into query parameters;
/// when any facet is set the server's filtered result is authoritative and
/// the client performs no additional filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

/// Maps an upload's file extension to its declared content type.
///
/// Returns `None` for anything outside the accepted set (PDF, DOCX, plain
/// text, EPUB); in that case the upload is rejected before any request is
/// issued.
pub fn upload_content_type(filename: &str) -> Option<&'static str> {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext)?;
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "txt" => Some("text/plain"),
        "epub" => Some("application/epub+zip"),
        _ => None,
    }
}

/// Case-insensitive substring match of `needle` against document titles.
///
/// Used by views that hold a full, unfiltered list (the favorites page) and
/// filter locally; the library view instead delegates filtering to the
/// server via [`DocumentQuery`].
pub fn filter_by_title<'a>(documents: &'a [Document], needle: &str) -> Vec<&'a Document> {
    let needle = needle.to_lowercase();
    documents
        .iter()
        .filter(|doc| doc.title.to_lowercase().contains(&needle))
        .collect()
}

/// Number of answers matching each question's declared correct index.
/// Unanswered questions count as incorrect.
pub fn quiz_score(questions: &[QuizQuestion], answers: &BTreeMap<usize, usize>) -> usize {
    questions
        .iter()
        .enumerate()
        .filter(|(index, question)| answers.get(index) == Some(&question.correct_answer))
        .count()
}

/// Score as a rounded percentage of the question count.
pub fn score_percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}
