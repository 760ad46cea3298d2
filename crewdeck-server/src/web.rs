//! JSON HTTP API.
//!
//! The request/response boundary of the service: five operation endpoints
//! plus read-only project/catalog queries. Every response body carries a
//! `success` boolean with either result data or `error`/`details`; per-item
//! failures inside a batch are itemized next to the successes rather than
//! failing the whole request.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crewdeck_slack::{ChannelQuery, Directory, SlackClient};

use crate::db::ProjectStore;
use crate::members;
use crate::project::ProjectRecord;
use crate::provision::{ChannelProvision, ChannelSpec, provision_channel};
use crate::reconcile::reconcile_all;
use crate::templates::default_channels;

/// Shared state behind every handler.
pub struct AppState {
    pub store: tokio::sync::Mutex<ProjectStore>,
    pub slack: SlackClient,
}

/// Build the axum router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/test-token", post(test_token))
        .route("/api/v1/setup", post(setup))
        .route("/api/v1/add-users", post(add_users))
        .route("/api/v1/manage-channels", post(manage_channels))
        .route("/api/v1/sync-projects", post(sync_projects))
        .route("/api/v1/projects", get(list_projects))
        .route("/api/v1/projects/{id}", delete(delete_project))
        .route("/api/v1/channel-templates", get(channel_templates))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Error responses ────────────────────────────────────────────────────

/// A failed request: status code plus `{ success: false, error, details? }`.
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    fn internal(error: impl Into<String>, details: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.into(),
            details: Some(details.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": false, "error": self.error });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<serde_json::Value>, ApiError>;

// ── Request bodies ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestTokenRequest {
    #[serde(default)]
    slack_token: Option<String>,
}

#[derive(Deserialize, Serialize, Clone)]
struct TeamMember {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetupRequest {
    #[serde(default)]
    workspace_name: String,
    #[serde(default)]
    slack_token: String,
    #[serde(default)]
    channels: Vec<ChannelSpec>,
    #[serde(default)]
    team_members: Vec<TeamMember>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddUsersRequest {
    #[serde(default)]
    slack_token: Option<String>,
    #[serde(default)]
    emails: Option<Vec<String>>,
    #[serde(default)]
    channels: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewChannel {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_private: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManageChannelsRequest {
    #[serde(default)]
    slack_token: String,
    action: String,
    #[serde(default)]
    channel: Option<NewChannel>,
    #[serde(default)]
    channel_name: Option<String>,
    /// When set, the stored project record is kept in step with the
    /// remote change.
    #[serde(default)]
    project_id: Option<String>,
}

// ── Handlers ───────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> ApiResult {
    let store = state.store.lock().await;
    let projects = store
        .count_projects()
        .map_err(|e| ApiError::internal("Database error", e))?;
    Ok(Json(json!({ "status": "ok", "projects": projects })))
}

async fn test_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestTokenRequest>,
) -> ApiResult {
    let token = req.slack_token.unwrap_or_default();
    if token.is_empty() {
        return Err(ApiError::bad_request("No token provided"));
    }

    match state.slack.auth_test(&token).await {
        Ok(auth) => Ok(Json(json!({
            "success": true,
            "team": auth.team.as_deref().unwrap_or("Unknown Team"),
            "user": auth.user.as_deref().unwrap_or("Unknown User"),
            "team_id": auth.team_id,
            "user_id": auth.user_id,
        }))),
        Err(_) => Err(ApiError::unauthorized(
            "Invalid token or insufficient permissions",
        )),
    }
}

async fn setup(State(state): State<Arc<AppState>>, Json(req): Json<SetupRequest>) -> ApiResult {
    if req.workspace_name.is_empty() || req.slack_token.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    let token = &req.slack_token;

    if state.slack.auth_test(token).await.is_err() {
        return Err(ApiError::unauthorized("Invalid Slack token"));
    }

    let requested: Vec<&ChannelSpec> =
        req.channels.iter().filter(|c| !c.name.is_empty()).collect();
    let emails: Vec<String> = req
        .team_members
        .iter()
        .map(|m| m.email.clone())
        .filter(|e| !e.is_empty())
        .collect();

    // Channels first, sequentially. Failures are itemized, never fatal.
    let mut created: Vec<ChannelProvision> = Vec::new();
    let mut failed: Vec<serde_json::Value> = Vec::new();
    for spec in &requested {
        let result = provision_channel(&state.slack, token, spec).await;
        match &result.outcome {
            crate::provision::ChannelOutcome::Failed { error } => {
                failed.push(json!({ "name": result.name, "error": error }));
            }
            _ => created.push(result),
        }
    }
    let usable: Vec<String> = created.iter().map(|c| c.name.clone()).collect();

    // Then membership, against the channels that actually exist.
    let mut sent: Vec<serde_json::Value> = Vec::new();
    let mut not_invited: Vec<serde_json::Value> = Vec::new();
    if !emails.is_empty() && !usable.is_empty() {
        let report = members::add_users(&state.slack, token, &emails, &usable)
            .await
            .map_err(|e| ApiError::internal("Failed to setup workspace", e))?;
        for outcome in &report.outcomes {
            if outcome.succeeded() {
                sent.push(json!({
                    "email": outcome.email,
                    "note": format!("Added to {} channels", outcome.invited.len()),
                }));
            } else if outcome.resolved {
                not_invited.push(json!({
                    "email": outcome.email,
                    "error": "Could not be added to any channel",
                }));
            } else {
                not_invited.push(json!({
                    "email": outcome.email,
                    "error": "User not found in workspace - invite them first",
                }));
            }
        }
    }

    // Persist the project: same name or token updates the existing record
    // in place, and provisioning is the one path that re-activates it.
    let record = ProjectRecord::new(
        &req.workspace_name,
        token.clone(),
        usable,
        emails.len() as u32,
    );
    let stored = {
        let store = state.store.lock().await;
        store
            .upsert_project(&record)
            .map_err(|e| ApiError::internal("Failed to save project", e))?
    };
    tracing::info!(project = %stored.name, channels = stored.channel_count, "workspace provisioned");

    let message = if not_invited.is_empty() {
        "Workspace configured successfully!"
    } else {
        "Channels created. Some users were not found - make sure they have joined the workspace first."
    };
    Ok(Json(json!({
        "success": true,
        "workspaceName": req.workspace_name,
        "project": stored,
        "results": {
            "channels": { "created": created, "failed": failed },
            "invitations": { "sent": sent, "failed": not_invited },
        },
        "message": message,
    })))
}

async fn add_users(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddUsersRequest>,
) -> ApiResult {
    let (Some(token), Some(emails), Some(channels)) = (req.slack_token, req.emails, req.channels)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if token.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    if state.slack.auth_test(&token).await.is_err() {
        return Err(ApiError::unauthorized("Invalid Slack token"));
    }

    let report = members::add_users(&state.slack, &token, &emails, &channels)
        .await
        .map_err(|e| ApiError::internal("Failed to add users", e))?;

    let message = if report.failed.is_empty() {
        format!(
            "Successfully added {} users to channels",
            report.success.len()
        )
    } else {
        format!(
            "Added {} users. Failed: {}",
            report.success.len(),
            report.failed.join(", ")
        )
    };
    Ok(Json(json!({
        "success": true,
        "results": report,
        "message": message,
    })))
}

async fn manage_channels(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ManageChannelsRequest>,
) -> ApiResult {
    if req.slack_token.is_empty() {
        return Err(ApiError::bad_request("No token provided"));
    }
    let token = &req.slack_token;

    if state.slack.auth_test(token).await.is_err() {
        return Err(ApiError::unauthorized("Invalid Slack token"));
    }

    match req.action.as_str() {
        "create" => {
            let Some(new_channel) = req.channel else {
                return Err(ApiError::bad_request("Missing channel"));
            };
            let channel = match state
                .slack
                .create_channel(token, &new_channel.name, new_channel.is_private)
                .await
            {
                Ok(channel) => channel,
                Err(e) if e.is_name_taken() => {
                    return Err(ApiError::bad_request("Channel already exists"));
                }
                Err(e) => return Err(ApiError::internal("Failed to manage channel", e)),
            };

            if let Some(purpose) = new_channel.description.as_deref().filter(|s| !s.is_empty())
                && let Err(e) = state.slack.set_purpose(token, &channel.id, purpose).await
            {
                tracing::warn!(channel = %channel.name, error = %e, "setting purpose failed");
            }

            if let Some(project_id) = &req.project_id {
                record_channel_added(&state, project_id, &channel.name).await?;
            }
            Ok(Json(json!({ "success": true, "channel": channel })))
        }
        "archive" => {
            let Some(name) = req.channel_name.filter(|n| !n.is_empty()) else {
                return Err(ApiError::bad_request("Missing channelName"));
            };
            let live = state
                .slack
                .list_channels(token, &ChannelQuery::default())
                .await
                .map_err(|e| ApiError::internal("Failed to manage channel", e))?;
            let Some(target) = live.iter().find(|c| c.name == name) else {
                return Err(ApiError::not_found("Channel not found"));
            };

            match state.slack.archive_channel(token, &target.id).await {
                Ok(()) => {}
                Err(e) if e.is_already_archived() => {
                    return Err(ApiError::bad_request("Channel is already archived"));
                }
                Err(e) => return Err(ApiError::internal("Failed to manage channel", e)),
            }

            if let Some(project_id) = &req.project_id {
                record_channel_removed(&state, project_id, &name).await?;
            }
            Ok(Json(json!({ "success": true, "message": "Channel archived" })))
        }
        _ => Err(ApiError::bad_request("Invalid action")),
    }
}

async fn sync_projects(State(state): State<Arc<AppState>>) -> ApiResult {
    // Read once, reconcile without holding the store, write back wholesale:
    // last-writer-wins over anything changed mid-flight.
    let projects = {
        let store = state.store.lock().await;
        store
            .load_projects()
            .map_err(|e| ApiError::internal("Failed to sync projects", e))?
    };

    let (synced, summary) = reconcile_all(&state.slack, projects).await;

    {
        let mut store = state.store.lock().await;
        store
            .replace_projects(&synced)
            .map_err(|e| ApiError::internal("Failed to sync projects", e))?;
        store
            .set_last_sync(Utc::now())
            .map_err(|e| ApiError::internal("Failed to sync projects", e))?;
    }

    Ok(Json(json!({
        "success": true,
        "projects": synced,
        "summary": summary,
    })))
}

async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult {
    let store = state.store.lock().await;
    let projects = store
        .load_projects()
        .map_err(|e| ApiError::internal("Failed to load projects", e))?;
    let last_synced = store
        .get_last_sync()
        .map_err(|e| ApiError::internal("Failed to load projects", e))?;
    Ok(Json(json!({
        "success": true,
        "projects": projects,
        "lastSynced": last_synced,
    })))
}

async fn delete_project(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let store = state.store.lock().await;
    let deleted = store
        .delete_project(&id)
        .map_err(|e| ApiError::internal("Failed to delete project", e))?;
    if !deleted {
        return Err(ApiError::not_found("Project not found"));
    }
    tracing::info!(project_id = %id, "project deleted");
    Ok(Json(json!({ "success": true })))
}

async fn channel_templates() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "channels": default_channels() }))
}

// Keep the stored record in step with a per-channel management action. A
// missing project id is a 404; store trouble is a 500. The remote change
// has already happened either way.
async fn record_channel_added(
    state: &AppState,
    project_id: &str,
    channel_name: &str,
) -> Result<(), ApiError> {
    let store = state.store.lock().await;
    let Some(mut project) = store
        .get_project(project_id)
        .map_err(|e| ApiError::internal("Database error", e))?
    else {
        return Err(ApiError::not_found("Project not found"));
    };
    if !project.channels.iter().any(|c| c == channel_name) {
        project.channels.push(channel_name.to_string());
    }
    project.channel_count = project.channels.len() as u32;
    project.status = crate::project::ProjectStatus::Active;
    store
        .update_project(&project)
        .map_err(|e| ApiError::internal("Database error", e))?;
    Ok(())
}

async fn record_channel_removed(
    state: &AppState,
    project_id: &str,
    channel_name: &str,
) -> Result<(), ApiError> {
    let store = state.store.lock().await;
    let Some(mut project) = store
        .get_project(project_id)
        .map_err(|e| ApiError::internal("Database error", e))?
    else {
        return Err(ApiError::not_found("Project not found"));
    };
    project.channels.retain(|c| c != channel_name);
    project.channel_count = project.channels.len() as u32;
    store
        .update_project(&project)
        .map_err(|e| ApiError::internal("Database error", e))?;
    Ok(())
}
