use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use agentdesk_knowledge::{DocumentationAgent, QueryResponse, StatsPayload};
use agentdesk_types::StatusResponse;
use agentdesk_workflows::{render_review_html, CodeReviewAgent};

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub docs: Arc<DocumentationAgent>,
    pub reviewer: Arc<CodeReviewAgent>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // API routes
        .route("/api/query", post(query))
        .route("/api/stats", get(stats))
        .route("/api/review", post(review))
        // HTML pages
        .route("/ui/chat", get(serve_chat))
        .route("/ui/review", get(serve_review))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    code: String,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Knowledge Base API is running" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// POST /api/query - Answer a question from the documentation
async fn query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<StatusResponse<QueryResponse>>, AppError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("Question must not be empty".into()));
    }

    let answer = state.docs.query(question).await.into_result().map_err(AppError::Internal)?;
    Ok(Json(StatusResponse::Success(answer)))
}

/// GET /api/stats - Document counts
async fn stats(State(state): State<AppState>) -> Result<Json<StatusResponse<StatsPayload>>, AppError> {
    let stats = state.docs.get_stats().await.into_result().map_err(AppError::Internal)?;
    Ok(Json(StatusResponse::Success(stats)))
}

/// POST /api/review - Review pasted code, returning the raw and rendered review
async fn review(
    State(state): State<AppState>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if payload.code.trim().is_empty() {
        return Err(AppError::BadRequest("Please enter some code to review".into()));
    }

    let review = state.reviewer.review_code(&payload.code).await?;
    Ok(Json(serde_json::json!({
        "review": review,
        "html": render_review_html(&review),
    })))
}

async fn serve_chat() -> Html<&'static str> {
    Html(include_str!("../../web/chat.html"))
}

async fn serve_review() -> Html<&'static str> {
    Html(include_str!("../../web/review.html"))
}

/// Error handling
#[derive(Debug)]
enum AppError {
    Anyhow(anyhow::Error),
    BadRequest(String),
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Anyhow(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() {
            log::error!("request failed: {}", message);
        }

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_knowledge::{SearchType, StoreBackend};
    use agentdesk_llm_api::testing::ScriptedLlmClient;
    use agentdesk_llm_api::HashingEmbedder;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn router(docs_llm: ScriptedLlmClient, review_llm: ScriptedLlmClient, dir: &std::path::Path) -> Router {
        let docs = DocumentationAgent::new(
            &StoreBackend::memory(),
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(docs_llm),
            dir,
            "knowledge_base",
            SearchType::Hybrid,
        )
        .await
        .unwrap();
        create_router(AppState {
            docs: Arc::new(docs),
            reviewer: Arc::new(CodeReviewAgent::new(Arc::new(review_llm))),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(ScriptedLlmClient::new(), ScriptedLlmClient::new(), dir.path()).await;

        let (status, body) = send(app.clone(), get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"message": "Knowledge Base API is running"}));

        let (_, body) = send(app, get_request("/health")).await;
        assert_eq!(body, serde_json::json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_query_returns_success_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let docs_llm = ScriptedLlmClient::with_replies(["I cannot find specific information about this in the documentation"]);
        let app = router(docs_llm, ScriptedLlmClient::new(), dir.path()).await;

        let (status, body) = send(app, post_json("/api/query", serde_json::json!({"question": "What is the leave policy?"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(
            body["response"],
            "I cannot find specific information about this in the documentation"
        );
        assert_eq!(body["metadata"]["has_sources"], false);
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let docs_llm = ScriptedLlmClient::new();
        let app = router(docs_llm, ScriptedLlmClient::new(), dir.path()).await;

        let (status, body) = send(app, post_json("/api/query", serde_json::json!({"question": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Question must not be empty", "status": 400}));
    }

    #[tokio::test]
    async fn test_failed_query_maps_to_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let docs_llm = ScriptedLlmClient::new();
        docs_llm.push_error("model unavailable");
        let app = router(docs_llm, ScriptedLlmClient::new(), dir.path()).await;

        let (status, body) = send(app, post_json("/api/query", serde_json::json!({"question": "Anything?"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], 500);
        assert!(body["error"].as_str().unwrap().starts_with("Failed to process documentation query"));
    }

    #[tokio::test]
    async fn test_stats_on_empty_knowledge_base() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(ScriptedLlmClient::new(), ScriptedLlmClient::new(), dir.path()).await;

        let (status, body) = send(app, get_request("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "status": "success",
                "stats": {"total_documents": 0, "pdf_documents": 0, "text_documents": 0}
            })
        );
    }

    #[tokio::test]
    async fn test_review_returns_rendered_html() {
        let dir = tempfile::tempdir().unwrap();
        let review_llm = ScriptedLlmClient::with_replies(["### Critical Issues\n1. SQL built with string formatting"]);
        let app = router(ScriptedLlmClient::new(), review_llm, dir.path()).await;

        let (status, body) = send(
            app,
            post_json("/api/review", serde_json::json!({"code": "query = f\"SELECT * FROM users WHERE id = {id}\""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["review"], "### Critical Issues\n1. SQL built with string formatting");
        assert!(body["html"].as_str().unwrap().contains("Critical Issues"));
    }

    #[tokio::test]
    async fn test_pages_are_served() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(ScriptedLlmClient::new(), ScriptedLlmClient::new(), dir.path()).await;

        for uri in ["/ui/chat", "/ui/review"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(String::from_utf8_lossy(&bytes).contains("<html"));
        }
    }
}
