//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API and the snapshot websocket under a single
//! Axum router. The presentation layer is served elsewhere and talks to these
//! endpoints only.

pub mod hub;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/state", get(hub::get_state))
        .route("/api/catalog", get(hub::search_catalog))
        .route("/api/projects", post(hub::create_project))
        .route("/api/projects/{id}", delete(hub::delete_project))
        .route("/api/projects/{id}/select", post(hub::select_project))
        .route("/api/projects/{project_id}/workspaces/{workspace_id}", delete(hub::delete_workspace))
        .route("/api/projects/{project_id}/workspaces/{workspace_id}/select", post(hub::select_workspace))
        .route("/api/deploy", post(hub::deploy))
        .route("/api/widgets", post(hub::add_widget))
        .route("/api/widgets/reorder", post(hub::reorder_widgets))
        .route("/api/widgets/{id}", delete(hub::delete_widget))
        .route("/api/widgets/{id}/task", patch(hub::update_task))
        .route("/api/widgets/{id}/messages", post(hub::post_message))
        .route("/api/drop", post(hub::drop_payload))
        .route("/api/view", post(hub::set_view))
        .route("/api/broadcast", post(hub::start_broadcast))
        .route("/api/broadcast/cancel", post(hub::cancel_broadcast))
        .route("/api/settings", get(hub::get_settings).put(hub::put_settings))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
