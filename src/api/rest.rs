use axum::{
    Router,
    body::Bytes,
    extract::{Json, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use crate::alerts::{AlertScheduler, SchedulerPhase};
use crate::api::auth::webhook_secret_middleware;
use crate::cache::SharedRateCache;
use crate::commands::CommandEvent;
use crate::observability::metrics;
use crate::telegram::Update;
use crate::types::RankedEntry;

pub struct ApiState {
    pub cache: Arc<SharedRateCache>,
    /// Absent when scheduled alerts are disabled.
    pub scheduler: Option<Arc<AlertScheduler>>,
    pub commands: mpsc::Sender<CommandEvent>,
    pub webhook_secret: Option<String>,
}

pub fn create_router(state: Arc<ApiState>, request_timeout: Duration) -> Router {
    let webhook = Router::new()
        .route("/webhook", post(webhook))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), webhook_secret_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/metrics", get(metrics_endpoint))
        .merge(webhook)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Funding rate bot is running"
}

async fn health_check() -> &'static str {
    "OK"
}

/// Decodes an update and hands it to the command worker without waiting for the reply.
async fn webhook(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("Malformed webhook body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    let update_id = update.update_id;
    let Some(command) = update.into_command() else {
        tracing::debug!("Ignoring update {}", update_id);
        return StatusCode::OK;
    };

    match state.commands.try_send(command) {
        Ok(()) => StatusCode::OK,
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Command queue full, rejecting update {}", update_id);
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!("Command worker is gone, rejecting update {}", update_id);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(serde::Serialize)]
struct StatusResponse {
    fetched_at: Option<DateTime<Utc>>,
    entries: Vec<RankedEntry>,
    scheduler: Option<SchedulerPhase>,
}

async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let snapshot = state.cache.get();
    Json(StatusResponse {
        fetched_at: snapshot.fetched_at,
        entries: snapshot.result.clone(),
        scheduler: state.scheduler.as_ref().map(|s| s.phase()),
    })
}

async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use crate::types::{ChatId, RateRecord};
    use crate::funding::{rank, RankMode};

    fn state(capacity: usize, secret: Option<&str>) -> (Arc<ApiState>, mpsc::Receiver<CommandEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Arc::new(ApiState {
            cache: Arc::new(SharedRateCache::new()),
            scheduler: None,
            commands: tx,
            webhook_secret: secret.map(str::to_string),
        });
        (state, rx)
    }

    fn router(state: &Arc<ApiState>) -> Router {
        create_router(Arc::clone(state), Duration::from_secs(30))
    }

    fn webhook_request(body: &str, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/webhook").header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            builder = builder.header(crate::telegram::SECRET_TOKEN_HEADER, secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    const FUNDING_UPDATE: &str =
        r#"{"update_id":1,"message":{"message_id":2,"chat":{"id":42},"text":"/funding"}}"#;

    #[tokio::test]
    async fn health_and_root() {
        let (state, _rx) = state(1, None);
        let response = router(&state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");

        let response = router(&state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_enqueues_commands() {
        let (state, mut rx) = state(4, None);
        let response = router(&state).oneshot(webhook_request(FUNDING_UPDATE, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(rx.try_recv().unwrap(), CommandEvent::Funding { chat_id: ChatId::new("42") });
    }

    #[tokio::test]
    async fn webhook_rejects_malformed_bodies() {
        let (state, mut rx) = state(4, None);
        let response = router(&state).oneshot(webhook_request("{not json", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn webhook_acknowledges_ignored_updates() {
        let (state, mut rx) = state(4, None);
        let body = r#"{"update_id":3,"message":{"message_id":2,"chat":{"id":42},"text":"hi"}}"#;
        let response = router(&state).oneshot(webhook_request(body, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn webhook_sheds_load_when_queue_is_full() {
        let (state, _rx) = state(1, None);
        let first = router(&state).oneshot(webhook_request(FUNDING_UPDATE, None)).await.unwrap();
        let second = router(&state).oneshot(webhook_request(FUNDING_UPDATE, None)).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn webhook_checks_the_secret_token() {
        let (state, mut rx) = state(4, Some("s3cret"));

        let missing = router(&state).oneshot(webhook_request(FUNDING_UPDATE, None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = router(&state).oneshot(webhook_request(FUNDING_UPDATE, Some("nope"))).await.unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());

        let ok = router(&state).oneshot(webhook_request(FUNDING_UPDATE, Some("s3cret"))).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn status_reports_the_current_snapshot() {
        let (state, _rx) = state(1, None);
        let records = vec![RateRecord::new("BTC", 0.001), RateRecord::new("ETH", -0.03)];
        state.cache.set(rank(&records, RankMode::Absolute, 3));

        let response = router(&state)
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["entries"][0]["symbol"], "ETH");
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
        assert!(json["fetched_at"].is_string());
        assert!(json["scheduler"].is_null());
    }
}
