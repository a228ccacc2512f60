// ABOUTME: HTTP request handlers for component generation, validation, repair, and compose
// ABOUTME: Single-step endpoints call one collaborator; compose runs the full loop

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use adapt_core::{
    GenerateComponentRequest, GenerateComponentResponse, RepairAttempt, RepairComponentRequest,
    RepairComponentResponse, ValidateComponentRequest, ValidationResult,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Outcome of a full orchestrated run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeResponse {
    /// `succeeded`, `failed`, or `superseded`
    pub status: String,
    pub epoch: u64,
    pub attempts: Vec<RepairAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "adapt-api"
    }))
}

/// Generate a component module from a prompt
pub async fn generate_component(
    State(state): State<AppState>,
    Json(request): Json<GenerateComponentRequest>,
) -> ApiResult<Json<GenerateComponentResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Missing prompt"));
    }
    info!("Generating component");

    let response = state.orchestrator.generator().generate(&request).await?;
    Ok(Json(response))
}

pub async fn validate_component(
    State(state): State<AppState>,
    Json(request): Json<ValidateComponentRequest>,
) -> ApiResult<Json<ValidationResult>> {
    if request.code.trim().is_empty() {
        return Err(ApiError::bad_request("Missing code"));
    }
    info!(bytes = request.code.len(), "Validating component");

    let result = state.orchestrator.validator().validate(&request.code).await?;
    Ok(Json(result))
}

/// Repair a module given validator issues and/or a runtime error
pub async fn debug_component(
    State(state): State<AppState>,
    Json(request): Json<RepairComponentRequest>,
) -> ApiResult<Json<RepairComponentResponse>> {
    if request.code.trim().is_empty() {
        return Err(ApiError::bad_request("Missing code"));
    }
    info!(
        issues = request.issues.len(),
        has_runtime_error = request.runtime_error.is_some(),
        "Repairing component"
    );

    let code = state.orchestrator.repairer().repair(&request).await?;
    Ok(Json(RepairComponentResponse { code }))
}

/// Run the whole generate, validate, render, repair loop against the server session.
///
/// A newer compose request supersedes one still in flight; the older caller
/// gets `status: "superseded"` and nothing it produced is kept.
pub async fn compose(
    State(state): State<AppState>,
    Json(request): Json<GenerateComponentRequest>,
) -> ApiResult<Json<ComposeResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Missing prompt"));
    }

    let report = state.orchestrator.run(&state.session, request).await;
    let status = report
        .status()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "superseded".to_string());
    info!(epoch = report.epoch, status = %status, "Compose finished");

    Ok(Json(ComposeResponse {
        status,
        epoch: report.epoch,
        code: report.code().map(String::from),
        last_error: report.error().map(|e| e.to_string()),
        attempts: report.attempts,
    }))
}
