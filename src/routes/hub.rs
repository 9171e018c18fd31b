//! Workspace hub routes.
//!
//! Each handler translates one request into a single `Store::update` (or a
//! broadcaster call) and reports the outcome. Structural no-ops on unknown
//! ids surface as `404`; refusals that would leave no active project or
//! workspace surface as `409`.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::catalog::{Tool, ToolCategory, is_valid_tool_id};
use crate::error::error_body;
use crate::services::broadcast::BroadcastRejected;
use crate::services::drop::{self, DropOutcome};
use crate::services::settings::{API_KEY_KEY, USER_NAME_KEY};
use crate::services::workspace::{self, DeployTarget, NEW_PROJECT_NAME, Selection, StateError};
use crate::state::{AppState, DEFAULT_USER_NAME, HubState, View};

// =============================================================================
// SNAPSHOT + CATALOG
// =============================================================================

/// `GET /api/state` — current snapshot of the whole tree.
pub async fn get_state(State(state): State<AppState>) -> Json<HubState> {
    Json(state.store.snapshot().as_ref().clone())
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// `GET /api/catalog?q=&category=` — search the tool catalog.
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<&'static Tool>>, StatusCode> {
    let category = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => Some(ToolCategory::parse(raw).ok_or(StatusCode::BAD_REQUEST)?),
        None => None,
    };
    let term = query.q.unwrap_or_default();
    Ok(Json(state.catalog.search(&term, category)))
}

// =============================================================================
// PROJECTS + WORKSPACES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProjectBody {
    pub name: Option<String>,
    pub objective: Option<String>,
}

/// `POST /api/projects` — create a project with one workspace and open it.
pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectBody>,
) -> (StatusCode, Json<Selection>) {
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| NEW_PROJECT_NAME.to_string());
    let objective = body.objective.unwrap_or_default();
    let selection = state
        .store
        .update(|s| workspace::create_project(s, &name, &objective));
    info!(project_id = %selection.project_id, "hub: project created");
    (StatusCode::CREATED, Json(selection))
}

/// `DELETE /api/projects/:id` — remove a project (never the last one).
pub async fn delete_project(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if state.store.update(|s| workspace::remove_project(s, &id)) {
        return Ok(Json(json!({ "ok": true })));
    }
    if state.store.read(|s| s.project(&id).is_some()) {
        Err(StatusCode::CONFLICT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// `POST /api/projects/:id/select` — open a project at its first workspace.
pub async fn select_project(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if state.store.update(|s| workspace::select_project(s, &id)) {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// `POST /api/projects/:project_id/workspaces/:workspace_id/select`
pub async fn select_workspace(
    State(state): State<AppState>,
    Path((project_id, workspace_id)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    if state
        .store
        .update(|s| workspace::select_workspace(s, &project_id, &workspace_id))
    {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// `DELETE /api/projects/:project_id/workspaces/:workspace_id` — never the project's last workspace.
pub async fn delete_workspace(
    State(state): State<AppState>,
    Path((project_id, workspace_id)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    if state
        .store
        .update(|s| workspace::remove_workspace(s, &project_id, &workspace_id))
    {
        return Ok(Json(json!({ "ok": true })));
    }
    let exists = state.store.read(|s| {
        s.project(&project_id)
            .and_then(|p| p.workspace(&workspace_id))
            .is_some()
    });
    Err(if exists { StatusCode::CONFLICT } else { StatusCode::NOT_FOUND })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployBody {
    pub tool_id: String,
    pub target: DeployTarget,
}

/// `POST /api/deploy` — place a catalog tool into a new or existing workspace.
pub async fn deploy(
    State(state): State<AppState>,
    Json(body): Json<DeployBody>,
) -> Result<Json<Selection>, (StatusCode, Json<Value>)> {
    let tool_id = body.tool_id.trim();
    if !is_valid_tool_id(tool_id) {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid toolId" }))));
    }
    let selection = state
        .store
        .update(|s| workspace::deploy_tool(s, tool_id, body.target))
        .map_err(|e| (state_error_to_status(&e), Json(error_body(&e))))?;
    info!(%tool_id, workspace_id = %selection.workspace_id, "hub: tool deployed");
    Ok(Json(selection))
}

pub(crate) fn state_error_to_status(err: &StateError) -> StatusCode {
    match err {
        StateError::ProjectNotFound(_) | StateError::WorkspaceNotFound(_) => StatusCode::NOT_FOUND,
    }
}

// =============================================================================
// WIDGETS
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWidgetBody {
    pub tool_id: String,
    pub index: Option<usize>,
}

/// `POST /api/widgets` — add a widget to the active workspace.
pub async fn add_widget(
    State(state): State<AppState>,
    Json(body): Json<AddWidgetBody>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let tool_id = body.tool_id.trim();
    if !is_valid_tool_id(tool_id) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let instance_id = state
        .store
        .update(|s| workspace::add_widget(s, tool_id, body.index))
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok((StatusCode::CREATED, Json(json!({ "instanceId": instance_id }))))
}

/// `DELETE /api/widgets/:id`
pub async fn delete_widget(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if state.store.update(|s| workspace::remove_widget(s, &id)) {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskBody {
    pub task: String,
}

/// `PATCH /api/widgets/:id/task` — relabel a widget's context task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTaskBody>,
) -> Result<Json<Value>, StatusCode> {
    if state.store.update(|s| workspace::update_task(s, &id, &body.task)) {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
pub struct PostMessageBody {
    pub text: String,
}

/// `POST /api/widgets/:id/messages` — chat with one widget. The user message
/// is appended right away; the reply lands later through the state feed.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PostMessageBody>,
) -> Response {
    match state.broadcaster.send_one(&id, &body.text) {
        Ok(send) => (StatusCode::ACCEPTED, Json(json!({ "sendId": send.id, "instanceId": id }))).into_response(),
        Err(e) => {
            warn!(instance_id = %id, error = %e, "hub: message rejected");
            (broadcast_rejected_to_status(e), Json(error_body(&e))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderBody {
    pub from: usize,
    pub to: usize,
}

/// `POST /api/widgets/reorder` — move one widget. Out-of-range indices are a no-op.
pub async fn reorder_widgets(State(state): State<AppState>, Json(body): Json<ReorderBody>) -> Json<Value> {
    let changed = state
        .store
        .update(|s| workspace::reorder_widget(s, body.from, body.to));
    Json(json!({ "ok": true, "changed": changed }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropBody {
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
    pub target_index: Option<usize>,
}

/// `POST /api/drop` — apply a drag-and-drop payload to the active workspace.
pub async fn drop_payload(State(state): State<AppState>, Json(body): Json<DropBody>) -> Json<DropOutcome> {
    let action = drop::interpret(&body.payload, body.target_index);
    Json(state.store.update(|s| drop::apply(s, action)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewBody {
    pub view: Option<View>,
    pub catalog_open: Option<bool>,
}

/// `POST /api/view` — switch screens and/or toggle the catalog overlay.
pub async fn set_view(State(state): State<AppState>, Json(body): Json<ViewBody>) -> Json<Value> {
    let changed = state.store.update(|s| {
        let view_changed = body.view.is_some_and(|v| workspace::navigate(s, v));
        let catalog_changed = body
            .catalog_open
            .is_some_and(|open| workspace::set_catalog_open(s, open));
        view_changed || catalog_changed
    });
    Json(json!({ "ok": true, "changed": changed }))
}

// =============================================================================
// BROADCAST
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct BroadcastBody {
    pub text: String,
}

/// `POST /api/broadcast` — fan a message out to every widget of the active
/// workspace. Replies stream in through `/api/ws`.
pub async fn start_broadcast(State(state): State<AppState>, Json(body): Json<BroadcastBody>) -> Response {
    match state.broadcaster.start(&body.text) {
        Ok(broadcast) => (
            StatusCode::ACCEPTED,
            Json(json!({ "broadcastId": broadcast.id, "widgets": broadcast.widgets })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "hub: broadcast rejected");
            (broadcast_rejected_to_status(e), Json(error_body(&e))).into_response()
        }
    }
}

/// `POST /api/broadcast/cancel`
pub async fn cancel_broadcast(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "cancelled": state.broadcaster.cancel() }))
}

pub(crate) fn broadcast_rejected_to_status(err: BroadcastRejected) -> StatusCode {
    match err {
        BroadcastRejected::EmptyText => StatusCode::BAD_REQUEST,
        BroadcastRejected::AlreadySending | BroadcastRejected::WidgetBusy => StatusCode::CONFLICT,
        BroadcastRejected::NoWidgets => StatusCode::UNPROCESSABLE_ENTITY,
        BroadcastRejected::WidgetNotFound => StatusCode::NOT_FOUND,
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Settings as exposed to clients. The credential itself is never echoed.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub user_name: String,
    pub has_api_key: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
    /// Absent leaves the value unchanged; blank resets it.
    pub user_name: Option<String>,
    pub gemini_api_key: Option<String>,
}

fn settings_view(state: &AppState) -> SettingsView {
    SettingsView {
        user_name: state.store.read(|s| s.user.name.clone()),
        has_api_key: state.api_key.get().is_some(),
    }
}

/// `GET /api/settings`
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    Json(settings_view(&state))
}

/// `PUT /api/settings` — persist the display name and/or credential.
pub async fn put_settings(
    State(state): State<AppState>,
    Json(body): Json<SettingsBody>,
) -> Result<Json<SettingsView>, (StatusCode, Json<Value>)> {
    let persist_error = |e: crate::services::settings::SettingsError| {
        warn!(error = %e, "hub: settings write failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(&e)))
    };

    let mut changes = Vec::with_capacity(2);
    if let Some(name) = body.user_name.as_deref() {
        changes.push((USER_NAME_KEY, Some(name)));
    }
    if let Some(key) = body.gemini_api_key.as_deref() {
        changes.push((API_KEY_KEY, Some(key)));
    }
    state
        .settings
        .set_many(&changes)
        .await
        .map_err(persist_error)?;

    if let Some(name) = body.user_name {
        let name = name.trim();
        let name = if name.is_empty() { DEFAULT_USER_NAME } else { name };
        state.store.update(|s| {
            if s.user.name == name {
                return false;
            }
            s.user.name = name.to_string();
            true
        });
    }
    if let Some(key) = body.gemini_api_key {
        state.api_key.set(Some(key));
        info!("hub: api key updated");
    }

    Ok(Json(settings_view(&state)))
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
