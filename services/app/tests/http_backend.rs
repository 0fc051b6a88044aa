//! Wire-shape tests for the REST adapter: request encoding, header
//! attachment, query-parameter translation, and error-body mapping, all
//! against a local mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use app_lib::adapters::http::HttpBackend;
use doclens_core::domain::{
    DocumentQuery, DocumentStatus, ExportFormat, SortKey, SortOrder, StatusFilter,
};
use doclens_core::ports::{BackendService, PortError};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(format!("{}/api/v1", server.uri()), Duration::from_secs(5))
        .expect("client builds")
}

fn document_json(id: i64, title: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "filename": format!("{title}.pdf"),
        "status": status,
        "created_at": "2026-08-01T12:00:00Z",
        "page_count": 12,
        "summary_short": "short summary"
    })
}

#[tokio::test]
async fn login_sends_form_encoded_credentials_and_returns_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=a%40b.c"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = backend(&server).login("a@b.c", "secret").await.unwrap();
    assert_eq!(token, "tok-123");
}

#[tokio::test]
async fn login_failure_surfaces_the_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let error = backend(&server).login("a@b.c", "nope").await.unwrap_err();
    match error {
        PortError::Api(detail) => assert_eq!(detail, "Invalid credentials"),
        other => panic!("expected Api detail, got {other:?}"),
    }
}

#[tokio::test]
async fn installed_bearer_token_is_attached_to_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 7, "email": "a@b.c"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server);
    backend.set_bearer_token(Some("tok-123"));
    let user = backend.current_user().await.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.email, "a@b.c");
}

#[tokio::test]
async fn unauthenticated_me_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let error = backend(&server).current_user().await.unwrap_err();
    assert!(matches!(error, PortError::Unauthorized));
}

#[tokio::test]
async fn register_posts_the_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .and(body_string_contains("\"is_superuser\":false"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "email": "a@b.c"})))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server).register("a@b.c", "secret1").await.unwrap();
}

#[tokio::test]
async fn list_documents_translates_the_query_to_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents"))
        .and(query_param("search", "report"))
        .and(query_param("status", "completed"))
        .and(query_param("sort_by", "title"))
        .and(query_param("order", "asc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([document_json(1, "Report A", "completed")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = DocumentQuery {
        search: Some("report".to_string()),
        status: StatusFilter::Only(DocumentStatus::Completed),
        sort_by: SortKey::Title,
        order: SortOrder::Asc,
    };
    let documents = backend(&server).list_documents(&query).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "Report A");
    assert_eq!(documents[0].status, DocumentStatus::Completed);
    assert_eq!(documents[0].page_count, Some(12));
}

#[tokio::test]
async fn default_query_sends_no_search_or_status_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents"))
        .and(query_param("sort_by", "created_at"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let documents = backend(&server)
        .list_documents(&DocumentQuery::default())
        .await
        .unwrap();
    assert!(documents.is_empty());

    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("search="));
    assert!(!query.contains("status="));
}

#[tokio::test]
async fn missing_document_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Document not found"})),
        )
        .mount(&server)
        .await;

    let error = backend(&server).get_document(42).await.unwrap_err();
    assert!(matches!(error, PortError::NotFound(_)));
}

#[tokio::test]
async fn delete_document_accepts_an_empty_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/documents/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server).delete_document(9).await.unwrap();
}

#[tokio::test]
async fn send_chat_posts_the_message_and_parses_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/documents/3/chat"))
        .and(body_string_contains("\"message\":\"What is the summary?\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "It is about birds.",
            "sources": [{"page": 4}, {"page": 9}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server)
        .send_chat(3, "What is the summary?")
        .await
        .unwrap();
    assert_eq!(reply.response, "It is about birds.");
    assert_eq!(reply.sources.len(), 2);
    assert_eq!(reply.sources[1].page, 9);
}

#[tokio::test]
async fn chat_history_parses_roles_and_defaults_missing_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/3/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"role": "user", "content": "hi"},
            {"role": "ai", "content": "hello", "sources": [{"page": 1}]}
        ])))
        .mount(&server)
        .await;

    let history = backend(&server).chat_history(3).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].sources.is_empty());
    assert_eq!(history[1].sources[0].page, 1);
}

#[tokio::test]
async fn export_chat_requests_the_format_and_returns_the_binary_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/3/export-chat"))
        .and(query_param("format", "md"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"# Chat\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let payload = backend(&server)
        .export_chat(3, ExportFormat::Md)
        .await
        .unwrap();
    assert_eq!(payload.as_ref(), b"# Chat\n");
}

#[tokio::test]
async fn glossary_and_quiz_parse_their_sequences() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/documents/3/glossary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"term": "RAG", "definition": "retrieval augmented generation"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/documents/3/quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "question": "What is RAG?",
                "options": ["a bird", "a technique", "a file"],
                "correct_answer": 1,
                "explanation": "It augments generation with retrieval."
            }
        ])))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let terms = backend.generate_glossary(3).await.unwrap();
    assert_eq!(terms[0].term, "RAG");

    let questions = backend.generate_quiz(3).await.unwrap();
    assert_eq!(questions[0].correct_answer, 1);
    assert_eq!(questions[0].options.len(), 3);
}

#[tokio::test]
async fn user_stats_parses_the_activity_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_documents": 12,
            "processed_documents": 8,
            "total_pages": 340,
            "storage_used_mb": 16.6,
            "activity_history": [
                {"date": "2026-08-01", "count": 2},
                {"date": "2026-08-02", "count": 0}
            ]
        })))
        .mount(&server)
        .await;

    let stats = backend(&server).user_stats().await.unwrap();
    assert_eq!(stats.total_documents, 12);
    assert_eq!(stats.activity_history.len(), 2);
    assert_eq!(stats.activity_history[0].count, 2);
}
