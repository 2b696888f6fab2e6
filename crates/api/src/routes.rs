use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use core_sim::{BotState, ControlError};
use oracle::AgentError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{state::AppState, ws};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/strategy/deploy", post(deploy_strategy))
        .route("/v1/strategy/stop", post(stop_strategy))
        .route("/v1/capital/inject", post(inject_capital))
        .route("/v1/research/tso", post(research_signal))
        .route("/v1/state", get(bot_state))
        .route("/v1/dashboard", get(ws::dashboard_socket))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub initial_funding: f64,
    pub additional_capital: f64,
    // Accepted for dashboard compatibility; the simulation does not read it.
    #[serde(default)]
    pub configuration: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CapitalInjectRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub ticker: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CommandResponse {
    pub status: &'static str,
    pub message: String,
}

impl CommandResponse {
    fn new(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::new("error", message)
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InjectResponse {
    #[serde(rename_all = "camelCase")]
    Success { status: &'static str, new_total: f64 },
    Failed(CommandResponse),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResearchResponse {
    Summary { ticker: String, summary: String },
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub bot: BotState,
    pub subscribers: usize,
}

/// Malformed bodies keep axum's status (400/415/422) but answer in JSON.
type Rejected<T> = (StatusCode, Json<T>);

fn rejected_command(rejection: JsonRejection) -> Rejected<CommandResponse> {
    warn!(status = %rejection.status(), reason = %rejection.body_text(), "rejected command body");
    (
        rejection.status(),
        Json(CommandResponse::error(rejection.body_text())),
    )
}

async fn deploy_strategy(
    State(state): State<AppState>,
    request: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, Rejected<CommandResponse>> {
    let Json(request) = request.map_err(rejected_command)?;
    let response = match state
        .control()
        .deploy(request.initial_funding, request.additional_capital)
        .await
    {
        Ok(()) => CommandResponse::new("deployed", "AethelBot is now active."),
        Err(ControlError::AlreadyDeployed) => CommandResponse::error("Bot is already deployed."),
        Err(err) => CommandResponse::error(err.to_string()),
    };
    Ok(Json(response))
}

async fn stop_strategy(State(state): State<AppState>) -> Json<CommandResponse> {
    let response = match state.control().stop().await {
        Ok(()) => CommandResponse::new("stopped", "AethelBot has been halted."),
        Err(ControlError::NotDeployed) => CommandResponse::error("Bot is not running."),
        Err(err) => CommandResponse::error(err.to_string()),
    };
    Json(response)
}

async fn inject_capital(
    State(state): State<AppState>,
    request: Result<Json<CapitalInjectRequest>, JsonRejection>,
) -> Result<Json<InjectResponse>, Rejected<CommandResponse>> {
    let Json(request) = request.map_err(rejected_command)?;
    let response = match state.control().inject_capital(request.amount).await {
        Ok(new_total) => InjectResponse::Success {
            status: "success",
            new_total,
        },
        Err(ControlError::NotDeployed) => InjectResponse::Failed(CommandResponse::error(
            "Bot must be deployed to inject capital.",
        )),
        Err(err) => InjectResponse::Failed(CommandResponse::error(err.to_string())),
    };
    Ok(Json(response))
}

async fn research_signal(
    State(state): State<AppState>,
    request: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchResponse>, Rejected<ResearchResponse>> {
    let Json(request) = request.map_err(|rejection| {
        warn!(status = %rejection.status(), reason = %rejection.body_text(), "rejected research body");
        (
            rejection.status(),
            Json(ResearchResponse::Failed {
                error: rejection.body_text(),
            }),
        )
    })?;
    let response = match state.signals().analyze(&request.ticker).await {
        Ok(summary) => ResearchResponse::Summary {
            ticker: request.ticker,
            summary,
        },
        Err(AgentError::Unavailable) => ResearchResponse::Failed {
            error: "Agent not initialized. Check GOOGLE_API_KEY.".to_owned(),
        },
        Err(AgentError::InvocationFailed(reason)) => ResearchResponse::Failed {
            error: format!("Agent failed to process request: {reason}"),
        },
    };
    Ok(Json(response))
}

async fn bot_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse {
        bot: state.control().state().await,
        subscribers: state.broadcaster().subscriber_count(),
    })
}
