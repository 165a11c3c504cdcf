//! The HTTP trigger surface
//!
//! Two routes: a liveness probe and the sweep trigger. The trigger is the
//! external scheduler's entry point; it authenticates with a static bearer
//! token and returns the sweep summary so the caller can alert on error
//! counts.

use crate::config::ServerConfig;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use obliq_escalation::{EscalationEngine, EscalationError};
use serde::Serialize;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// The engine every trigger path drives
    pub engine: Arc<EscalationEngine>,
    /// Expected bearer token; `None` rejects every sweep request
    pub sweep_token: Option<String>,
}

/// Body of a sweep trigger response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SweepBody {
    /// The sweep ran; per-record failures are counted, not fatal
    Completed {
        success: bool,
        processed: usize,
        escalated: usize,
        expired: usize,
        errors: usize,
        duration_ms: u64,
    },
    /// The sweep could not run at all
    Failed { error: String },
}

/// Build the route table over the shared state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/escalations/sweep", post(trigger_sweep))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `POST /v1/escalations/sweep`
///
/// Fails closed when no token is configured. A store-wide outage is the
/// only way the sweep itself errors; anything narrower shows up in the
/// summary's `errors` count with a `200`.
pub(crate) async fn trigger_sweep(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<SweepBody>) {
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(SweepBody::Failed {
                error: "missing or invalid bearer token".to_string(),
            }),
        );
    }

    match state.engine.sweep(Utc::now()).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(SweepBody::Completed {
                success: summary.errors == 0,
                processed: summary.processed,
                escalated: summary.escalated,
                expired: summary.expired,
                errors: summary.errors,
                duration_ms: summary.duration_ms,
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "sweep invocation failed");
            let status = match err {
                EscalationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            (
                status,
                Json(SweepBody::Failed {
                    error: err.to_string(),
                }),
            )
        }
    }
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.sweep_token.as_deref() else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == expected)
}

/// Spawn the in-process ticker that drives the same sweep path
///
/// Deployments with an external scheduler leave this disabled and POST
/// to the trigger endpoint instead.
pub fn spawn_ticker(engine: Arc<EscalationEngine>, config: &ServerConfig) {
    let interval = config.ticker_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match engine.sweep(Utc::now()).await {
                Ok(summary) if summary.errors > 0 => {
                    tracing::warn!(errors = summary.errors, "ticker sweep had record failures");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "ticker sweep failed");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use obliq_test_utils::{recording_dispatcher, RecordingChannel, TenantFixture};

    async fn state_with_token(token: Option<&str>) -> (TenantFixture, AppState) {
        let fixture = TenantFixture::seeded().await;
        let dispatcher = recording_dispatcher(
            fixture.store.clone(),
            RecordingChannel::new(),
            RecordingChannel::new(),
        );
        let engine = Arc::new(EscalationEngine::new(
            fixture.store.clone(),
            fixture.store.clone(),
            fixture.store.clone(),
            fixture.store.clone(),
            fixture.store.clone(),
            dispatcher,
        ));
        let state = AppState {
            engine,
            sweep_token: token.map(str::to_string),
        };
        (fixture, state)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn router_accepts_the_handler_futures() {
        // axum requires every handler future to be Send; building the
        // router is the check
        let (_fixture, state) = state_with_token(Some("s3cret")).await;
        let _app = router(state);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (_fixture, state) = state_with_token(Some("s3cret")).await;
        let (status, _) = trigger_sweep(State(state), HeaderMap::new()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let (_fixture, state) = state_with_token(Some("s3cret")).await;
        let (status, _) = trigger_sweep(State(state), bearer("guess")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unconfigured_token_fails_closed() {
        let (_fixture, state) = state_with_token(None).await;
        let (status, _) = trigger_sweep(State(state), bearer("anything")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_runs_the_sweep() {
        let (fixture, state) = state_with_token(Some("s3cret")).await;
        let now = Utc::now();
        let item = fixture.item(now).await;
        fixture
            .overdue_record(item.id, 1, fixture.supervisor, now)
            .await;

        let (status, Json(body)) = trigger_sweep(State(state), bearer("s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        match body {
            SweepBody::Completed {
                success,
                processed,
                escalated,
                ..
            } => {
                assert!(success);
                assert_eq!(processed, 1);
                assert_eq!(escalated, 1);
            }
            SweepBody::Failed { error } => panic!("sweep failed: {error}"),
        }
    }

    #[tokio::test]
    async fn store_outage_is_a_server_error() {
        let (fixture, state) = state_with_token(Some("s3cret")).await;
        fixture.store.set_unavailable(true);

        let (status, Json(body)) = trigger_sweep(State(state), bearer("s3cret")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(body, SweepBody::Failed { .. }));
    }
}
