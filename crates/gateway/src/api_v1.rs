//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST   /v1/chat`           — Run one turn, get the response envelope
//! - `POST   /v1/classify`       — Intent ranking only
//! - `POST   /v1/context/debug`  — Classification, bundle and prompt, no model call
//! - `GET    /v1/intents`        — Registered intents
//! - `DELETE /v1/cache`          — Drop every cached context bundle

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;
use serde_json::json;
use steward_core::envelope::{Outcome, ResponseEnvelope};
use steward_core::request::ChatRequest;
use steward_pipeline::{Classification, Inspection, IntentInfo};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::SharedState;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/classify", post(classify_handler))
        .route("/context/debug", post(context_debug_handler))
        .route("/intents", get(list_intents_handler))
        .route("/cache", axum::routing::delete(clear_cache_handler))
        .with_state(state)
}

// ── Response types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct IntentListResponse {
    intents: Vec<IntentInfo>,
    total: usize,
}

#[derive(Serialize)]
struct CacheClearResponse {
    cleared: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn validate(request: &ChatRequest) -> Result<(), ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request("userId is required"));
    }
    if request.business_id.trim().is_empty() {
        return Err(bad_request("businessId is required"));
    }
    if request.message.trim().is_empty() {
        return Err(bad_request("message is required"));
    }
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    validate(&request)?;
    info!(user_id = %request.user_id, business_id = %request.business_id, "v1/chat request");

    // Axum drops this future when the client disconnects; the guard then
    // cancels the in-flight model call.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let asked_at = Utc::now();
    let envelope = state
        .pipeline
        .handle_with_cancel(request.clone(), cancel)
        .await;

    if envelope.meta.outcome == Outcome::Answered {
        record_turn(&state, &request, &envelope, asked_at).await;
    }

    Ok(Json(envelope))
}

/// Append the user and assistant turns to the history collection.
/// Failures are logged; the caller already has its answer.
async fn record_turn(
    state: &SharedState,
    request: &ChatRequest,
    envelope: &ResponseEnvelope,
    asked_at: DateTime<Utc>,
) {
    let answered_at = Utc::now().max(asked_at + TimeDelta::milliseconds(1));
    let turns = [
        ("user", request.message.trim(), asked_at),
        ("assistant", envelope.response_text.as_str(), answered_at),
    ];

    let store = state.pipeline.store();
    for (role, content, at) in turns {
        let record = json!({
            "userId": request.user_id,
            "businessId": request.business_id,
            "threadId": request.hints.thread_id,
            "role": role,
            "content": content,
            "createdAt": at.to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        if let Err(e) = store.insert(&state.history_collection, record).await {
            warn!(error = %e, role, "Failed to record conversation turn");
            return;
        }
    }
}

async fn classify_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Classification>, ApiError> {
    validate(&request)?;
    Ok(Json(state.pipeline.classify(&request)))
}

async fn context_debug_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Inspection>, ApiError> {
    validate(&request)?;
    Ok(Json(state.pipeline.inspect(request).await))
}

async fn list_intents_handler(State(state): State<SharedState>) -> Json<IntentListResponse> {
    let intents = state.pipeline.registry().describe();
    Json(IntentListResponse {
        total: intents.len(),
        intents,
    })
}

async fn clear_cache_handler(State(state): State<SharedState>) -> Json<CacheClearResponse> {
    let cleared = state.pipeline.cache().clear().await;
    info!(cleared, "Context cache cleared");
    Json(CacheClearResponse { cleared })
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use crate::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use steward_core::store::{DataStore, StoreQuery};
    use tower::ServiceExt;

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_envelope_and_records_turns() {
        let (state, provider, store) = test_state("Two invoices are late.").await;
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/v1/chat",
                json!({
                    "userId": "u2",
                    "businessId": "b1",
                    "message": "what's outstanding on receivables over 45 days",
                    "route": "/finance/overview"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = body_json(response).await;
        assert_eq!(envelope["responseText"], "Two invoices are late.");
        assert_eq!(envelope["meta"]["outcome"], "answered");
        assert_eq!(*provider.calls.lock().unwrap(), 1);

        let turns = store
            .find(&StoreQuery::new("messages").eq("userId", "u2").sort_asc("createdAt"))
            .await
            .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0]["role"], "user");
        assert_eq!(turns[1]["role"], "assistant");
        assert_eq!(turns[1]["content"], "Two invoices are late.");
    }

    #[tokio::test]
    async fn chat_rejects_missing_tenant() {
        let (state, provider, _) = test_state("unused").await;
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/v1/chat",
                json!({ "userId": "u1", "businessId": " ", "message": "hi" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "businessId is required");
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn classify_ranks_without_calling_model() {
        let (state, provider, _) = test_state("unused").await;
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/v1/classify",
                json!({
                    "userId": "u1",
                    "businessId": "b1",
                    "message": "when are my irs filings due"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["resolved"], "tax_deadlines");
        assert!(json["ambiguity"].is_null());
        assert!(!json["candidates"].as_array().unwrap().is_empty());
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn context_debug_shows_bundle_and_prompt() {
        let (state, provider, _) = test_state("unused").await;
        let app = build_router(state);

        let response = app
            .oneshot(post_json(
                "/v1/context/debug",
                json!({
                    "userId": "u1",
                    "businessId": "b1",
                    "message": "what's outstanding on receivables over 45 days",
                    "route": "/finance/overview"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["classification"]["resolved"], "ar_aging");
        assert_eq!(json["bundle"]["thresholdDays"], 45);
        assert!(json["prompt"]["persona"].as_str().unwrap().len() > 20);
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn intents_lists_registry() {
        let (state, _, _) = test_state("unused").await;
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/intents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let keys: Vec<&str> = json["intents"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|i| i["key"].as_str())
            .collect();
        assert!(keys.contains(&"ar_aging"));
        assert!(keys.contains(&"general"));
        assert_eq!(json["total"].as_u64().unwrap() as usize, keys.len());
    }

    #[tokio::test]
    async fn cache_clear_reports_dropped_entries() {
        let (state, _, _) = test_state("Fine.").await;
        let app = build_router(state.clone());

        state
            .pipeline
            .inspect(steward_core::request::ChatRequest::new(
                "u1",
                "b1",
                "when are my irs filings due",
            ))
            .await;
        assert_eq!(state.pipeline.cache().len().await, 1);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/cache")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["cleared"], 1);
        assert!(state.pipeline.cache().is_empty().await);
    }
}
