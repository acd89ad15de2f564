//! GitHub webhook endpoint.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::any;
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::signature;

/// Header name for the GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for the GitHub signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";

pub const DEPLOYMENT_STARTED: &str = "Deployment started";
pub const EVENT_IGNORED: &str = "Event type does not trigger deployment";

pub fn router() -> Router<AppState> {
    // Any method is routed here so non-POST requests get the handler's 405.
    Router::new().route("/", any(github_webhook))
}

/// The parts of a push or release payload the dispatcher reads.
#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    repository: Option<PayloadRepository>,
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayloadRepository {
    name: Option<String>,
}

/// Handle a GitHub webhook delivery.
///
/// Checks run in order: method, signature presence, repository lookup,
/// signature against that repository's secret, in-flight deployment, trigger
/// policy. A matching event starts a deployment in the background and the
/// response does not wait for it.
async fn github_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    if method != Method::POST {
        info!(%method, "Method not allowed");
        return Err(ApiError::MethodNotAllowed);
    }

    let signature = header(&headers, HEADER_SIGNATURE).ok_or_else(|| {
        info!("Missing signature");
        ApiError::MissingSignature
    })?;

    // A body that is not a JSON event names no repository.
    let payload: EventPayload = serde_json::from_slice(&body).unwrap_or_default();
    let repo = payload
        .repository
        .and_then(|r| r.name)
        .and_then(|name| state.repositories.get(&name))
        .ok_or_else(|| {
            info!("Repository not configured");
            ApiError::UnknownRepository
        })?;

    if repo.has_placeholder_secret() || !signature::verify(&repo.webhook_secret, &body, signature)
    {
        warn!(repo = %repo.name, "Invalid signature");
        return Err(ApiError::InvalidSignature);
    }

    if state.deployer.is_deploying(&repo.name) {
        info!(repo = %repo.name, "Deployment already in progress");
        return Err(ApiError::AlreadyDeploying);
    }

    let event = header(&headers, HEADER_EVENT).unwrap_or("unknown");
    if !repo.trigger_on.accepts(event, payload.action.as_deref()) {
        info!(
            repo = %repo.name,
            event = %event,
            trigger = %repo.trigger_on,
            "Ignoring event"
        );
        return Ok((StatusCode::OK, EVENT_IGNORED));
    }

    info!(repo = %repo.name, event = %event, "Received webhook, starting deployment");
    // Detached: the task reports its own outcome through logs.
    drop(state.deployer.try_spawn(&repo.name)?);

    Ok((StatusCode::OK, DEPLOYMENT_STARTED))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
