pub mod domain;
pub mod ports;

pub use domain::{
    ChatMessage, ChatReply, Document, DocumentQuery, DocumentStatus, ExportFormat, GlossaryTerm,
    MessageRole, QuizQuestion, SortKey, SortOrder, SourceRef, StatusFilter, User, UserStats,
};
pub use ports::{BackendService, PortError, PortResult, ProfileStorage};
