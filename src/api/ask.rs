//! Ask endpoint handlers

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, AskRequest, AskResponse};
use crate::domain::{FinalResponse, RequestContext, TraceLog};

/// POST /ask
pub async fn ask(
    State(state): State<AppState>,
    RequireApiKey: RequireApiKey,
    Json(request): Json<AskRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();

    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let Some(query) = request.query() else {
        // Contract: a missing query is answered, not failed
        return Ok(Json(json!({"error": "user_query is required"})).into_response());
    };

    let ctx = request.context()?;
    info!(%request_id, mode = ?ctx.mode, "processing ask request");

    let mut trace = TraceLog::with_seed(request.steps.clone());
    let result = run_pipeline(&state, query, &ctx, &mut trace).await?;

    info!(%request_id, steps = trace.len(), "ask request complete");

    Ok(Json(AskResponse { result }).into_response())
}

/// POST /ask/stream
///
/// Same computation as `/ask`, alternate transport: trace steps are streamed
/// line by line as they happen, terminated by a `result:` (or `error:`) line.
pub async fn ask_stream(
    State(state): State<AppState>,
    RequireApiKey: RequireApiKey,
    Json(request): Json<AskRequest>,
) -> Result<Response, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let Some(query) = request.query() else {
        return Ok(Json(json!({"error": "user_query is required"})).into_response());
    };

    let ctx = request.context()?;
    let query = query.to_string();
    let steps = request.steps.clone();

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let mut trace = TraceLog::with_seed(steps).with_sink(tx.clone());

        match run_pipeline(&state, &query, &ctx, &mut trace).await {
            Ok(result) => {
                let rendered = match &result {
                    FinalResponse::Markdown(text) => json!(text).to_string(),
                    FinalResponse::Card(card) => {
                        serde_json::to_string(card).unwrap_or_default()
                    }
                };
                let _ = tx.send(format!("result: {}", rendered));
            }
            Err(e) => {
                error!(error = %e, "streamed ask request failed");
                let _ = tx.send(format!("error: {}", e.body.detail));
            }
        }
    });

    let body = Body::from_stream(
        UnboundedReceiverStream::new(rx)
            .map(|line| Ok::<Bytes, std::convert::Infallible>(Bytes::from(format!("{}\n", line)))),
    );

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .map_err(|e| ApiError::internal(e))
}

async fn run_pipeline(
    state: &AppState,
    query: &str,
    ctx: &RequestContext,
    trace: &mut TraceLog,
) -> Result<FinalResponse, ApiError> {
    tokio::time::timeout(state.request_timeout, state.pipeline.ask(query, ctx, trace))
        .await
        .map_err(|_| ApiError::internal("request deadline exceeded"))?
        .map_err(ApiError::from)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::domain::answer::mock::{valid_card, MockResponseFormatter};
    use crate::domain::crag::{MockAnswerGenerator, MockQueryDecomposer, MockRelevanceGrader};
    use crate::domain::retrieval::mock::MockRetriever;
    use crate::domain::search::mock::MockWebSearchProvider;
    use crate::domain::Document;
    use crate::infrastructure::pipeline::{AskPipeline, CragCycle, CycleConfig};

    pub(crate) fn test_state() -> AppState {
        let retriever: Arc<MockRetriever> = Arc::new(
            MockRetriever::new().with_results(vec![Document::retrieved("passage", 0.9)]),
        );

        let cycle = CragCycle::new(
            retriever.clone(),
            Arc::new(MockRelevanceGrader::all_relevant()),
            Arc::new(MockWebSearchProvider::new()),
            Arc::new(MockAnswerGenerator::new()),
            CycleConfig::default(),
        );

        let pipeline = AskPipeline::new(
            Arc::new(MockQueryDecomposer::no_decomposition()),
            cycle,
            Arc::new(MockAnswerGenerator::new()),
            Arc::new(MockResponseFormatter::new(valid_card())),
        );

        AppState::new(
            Arc::new(pipeline),
            retriever,
            "test-secret",
            Duration::from_secs(5),
        )
    }

    fn ask_request(json: serde_json::Value) -> AskRequest {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_missing_user_query_returns_error_body() {
        let state = test_state();
        let response = ask(
            State(state),
            RequireApiKey,
            Json(ask_request(json!({}))),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": "user_query is required"}));
    }

    #[tokio::test]
    async fn test_markdown_result_is_raw_string() {
        let state = test_state();
        let response = ask(
            State(state),
            RequireApiKey,
            Json(ask_request(json!({"user_query": "q", "type": 2}))),
        )
        .await
        .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["result"], json!("consolidated answer"));
    }

    #[tokio::test]
    async fn test_card_result_is_json_object() {
        let state = test_state();
        let response = ask(
            State(state),
            RequireApiKey,
            Json(ask_request(json!({"user_query": "q", "type": 1}))),
        )
        .await
        .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["result"]["rating"], 62);
        assert!(body["result"]["citations"].is_array());
    }

    #[tokio::test]
    async fn test_invalid_latitude_is_bad_request() {
        let state = test_state();
        let result = ask(
            State(state),
            RequireApiKey,
            Json(ask_request(json!({"user_query": "q", "latitude": 400.0}))),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_type_is_bad_request() {
        let state = test_state();
        let result = ask(
            State(state),
            RequireApiKey,
            Json(ask_request(json!({"user_query": "q", "type": 5}))),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stream_emits_steps_then_result() {
        let state = test_state();
        let response = ask_stream(
            State(state),
            RequireApiKey,
            Json(ask_request(json!({"user_query": "q", "type": 2}))),
        )
        .await
        .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.first(), Some(&"transform_query"));
        assert!(lines.contains(&"retrieve_documents"));
        assert_eq!(lines.last(), Some(&"result: \"consolidated answer\""));
    }
}
