use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use home_api::{handle_action, ContractPolicy, HomeContext};
use shared::{
    domain::{RolePolicy, UserId},
    error::{ApiError, ErrorCode},
    protocol::{InboundAction, SlashCommandResponse},
};
use slack_integration::{
    signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER},
    SignatureVerifier, SlackClient,
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{decode_command, decode_event, decode_interaction, reply_to_command, EventDisposition};
use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 1024 * 1024;

type Rejection = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    if settings.slack_signing_secret.is_empty() {
        warn!("SLACK_SIGNING_SECRET is not set; every platform request will be rejected");
    }
    if settings.slack_bot_token.is_empty() {
        warn!("SLACK_BOT_TOKEN is not set; directory lookups and publishes will fail");
    }

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let slack = Arc::new(SlackClient::with_base_url(
        settings.slack_api_base_url.as_str(),
        settings.slack_bot_token.as_str(),
    ));
    let roles = settings
        .admin_override_user_id
        .map(|id| RolePolicy::with_admin_override(UserId::new(id)))
        .unwrap_or_default();
    let contract_policy = ContractPolicy::from_strict(settings.strict_contracts);
    let home = HomeContext {
        records: Arc::new(storage.clone()),
        directory: slack.clone(),
        publisher: slack,
        roles,
        contract_policy,
    };

    let state = AppState {
        home,
        verifier: SignatureVerifier::new(settings.slack_signing_secret),
        storage,
        ack_deadline: Duration::from_millis(settings.ack_deadline_ms),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, ?contract_policy, "liftbot listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/slack/events", post(slack_events))
        .route("/slack/interactions", post(slack_interactions))
        .route("/slack/commands", post(slack_commands))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, Rejection> {
    state.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Unavailable, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn slack_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Rejection> {
    verify_signature(&state, &headers, &body)?;

    match decode_event(&body).map_err(bad_request)? {
        EventDisposition::Challenge(challenge) => {
            info!("answering url verification challenge");
            Ok(Json(serde_json::json!({ "challenge": challenge })).into_response())
        }
        EventDisposition::Dispatch(action) => {
            dispatch(&state, action).await;
            Ok(StatusCode::OK.into_response())
        }
        EventDisposition::Ignore => Ok(StatusCode::OK.into_response()),
    }
}

async fn slack_interactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, Rejection> {
    verify_signature(&state, &headers, &body)?;

    match decode_interaction(&body).map_err(bad_request)? {
        Some(action) => dispatch(&state, action).await,
        None => debug!("interaction carried no known action; acknowledging"),
    }
    Ok(StatusCode::OK)
}

async fn slack_commands(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SlashCommandResponse>, Rejection> {
    verify_signature(&state, &headers, &body)?;

    let command = decode_command(&body).map_err(bad_request)?;
    info!(user = %command.user_id, command = %command.command, "slash command");
    Ok(Json(reply_to_command(&command)))
}

/// Runs the handler on its own task and waits at most the ack deadline. A
/// handler that overruns keeps going after the request is acknowledged.
async fn dispatch(state: &AppState, action: InboundAction) {
    let actor = action.actor.clone();
    let trigger = action.trigger;
    let home = state.home.clone();
    let task = tokio::spawn(async move { handle_action(&home, action).await });

    match tokio::time::timeout(state.ack_deadline, task).await {
        Ok(Ok(outcome)) => debug!(%actor, ?trigger, ?outcome, "action handled before ack"),
        Ok(Err(join_error)) => {
            error!(%actor, ?trigger, error = %join_error, "action handler aborted")
        }
        Err(_) => warn!(
            %actor,
            ?trigger,
            deadline_ms = state.ack_deadline.as_millis() as u64,
            "action still running at ack deadline; acknowledging now"
        ),
    }
}

fn verify_signature(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), Rejection> {
    state
        .verifier
        .verify(
            header_str(headers, TIMESTAMP_HEADER),
            header_str(headers, SIGNATURE_HEADER),
            body,
        )
        .map_err(|e| {
            warn!(error = %e, "rejected platform request");
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::unauthorized(e.to_string())),
            )
        })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn bad_request(error: ApiError) -> Rejection {
    warn!(message = %error.message, "rejected malformed platform request");
    (StatusCode::BAD_REQUEST, Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
