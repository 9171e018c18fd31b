use super::*;
use std::time::Duration;

use crate::state::test_helpers;

fn app() -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let state = test_helpers::test_app_state(dir.path());
    (dir, state)
}

async fn wait_for_reply(state: &AppState, instance_id: &str) {
    let mut rx = state.store.subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.find_widget(instance_id).is_some_and(|w| !w.is_processing)),
    )
    .await
    .unwrap()
    .unwrap();
}

async fn wait_until_idle(state: &AppState) {
    let mut rx = state.store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| !s.is_sending))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn get_state_returns_seeded_tree() {
    let (_dir, state) = app();
    let Json(snapshot) = get_state(State(state)).await;
    assert_eq!(snapshot.current_project_id, "proj-1");
    assert_eq!(snapshot.current_workspace_id, "ws-1");
    assert_eq!(snapshot.projects.len(), 2);
}

#[tokio::test]
async fn catalog_search_filters_by_term_and_category() {
    let (_dir, state) = app();
    let query = CatalogQuery { q: Some("gemini".into()), category: None };
    let Json(tools) = search_catalog(State(state.clone()), Query(query)).await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].id, "IA-0004");

    let query = CatalogQuery { q: None, category: Some("text".into()) };
    let Json(tools) = search_catalog(State(state), Query(query)).await.unwrap();
    assert!(!tools.is_empty());
    assert!(tools.iter().all(|t| t.category == ToolCategory::Text));
}

#[tokio::test]
async fn catalog_rejects_unknown_category() {
    let (_dir, state) = app();
    let query = CatalogQuery { q: None, category: Some("culinaria".into()) };
    let result = search_catalog(State(state), Query(query)).await;
    assert_eq!(result.err(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn create_project_activates_it() {
    let (_dir, state) = app();
    let body = CreateProjectBody { name: Some("Lançamento".into()), objective: Some("Planejar".into()) };
    let (status, Json(selection)) = create_project(State(state.clone()), Json(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.current_project_id, selection.project_id);
    assert_eq!(snapshot.projects[0].name, "Lançamento");
    assert_eq!(snapshot.current_view, View::Workspace);
}

#[tokio::test]
async fn create_project_defaults_blank_name() {
    let (_dir, state) = app();
    let body = CreateProjectBody { name: Some("  ".into()), objective: None };
    create_project(State(state.clone()), Json(body)).await;
    assert_eq!(state.store.snapshot().projects[0].name, NEW_PROJECT_NAME);
}

#[tokio::test]
async fn delete_project_statuses() {
    let (_dir, state) = app();
    assert_eq!(
        delete_project(State(state.clone()), Path("nope".into())).await.err(),
        Some(StatusCode::NOT_FOUND)
    );
    assert!(delete_project(State(state.clone()), Path("proj-2".into())).await.is_ok());
    assert_eq!(
        delete_project(State(state.clone()), Path("proj-1".into())).await.err(),
        Some(StatusCode::CONFLICT)
    );
    assert_eq!(state.store.snapshot().projects.len(), 1);
}

#[tokio::test]
async fn select_routes_move_the_selection() {
    let (_dir, state) = app();
    assert!(select_project(State(state.clone()), Path("proj-2".into())).await.is_ok());
    assert_eq!(state.store.snapshot().current_workspace_id, "ws-3");

    let path = Path(("proj-1".to_string(), "ws-2".to_string()));
    assert!(select_workspace(State(state.clone()), path).await.is_ok());
    assert_eq!(state.store.snapshot().current_workspace_id, "ws-2");

    let path = Path(("proj-1".to_string(), "ws-3".to_string()));
    assert_eq!(select_workspace(State(state), path).await.err(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn delete_workspace_refuses_last_one() {
    let (_dir, state) = app();
    let path = Path(("proj-2".to_string(), "ws-3".to_string()));
    assert_eq!(delete_workspace(State(state.clone()), path).await.err(), Some(StatusCode::CONFLICT));

    let path = Path(("proj-1".to_string(), "ws-1".to_string()));
    assert!(delete_workspace(State(state.clone()), path).await.is_ok());
    assert_eq!(state.store.snapshot().current_workspace_id, "ws-2");

    let path = Path(("proj-1".to_string(), "ws-9".to_string()));
    assert_eq!(delete_workspace(State(state), path).await.err(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn deploy_to_new_project() {
    let (_dir, state) = app();
    let body = DeployBody {
        tool_id: "IA-0004".into(),
        target: DeployTarget::NewProject { project_name: None, workspace_name: None },
    };
    let Json(selection) = deploy(State(state.clone()), Json(body)).await.unwrap();

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.projects.len(), 3);
    assert_eq!(snapshot.current_project_id, selection.project_id);
    assert_eq!(snapshot.active_widgets().len(), 1);
    assert_eq!(snapshot.active_widgets()[0].tool_id, "IA-0004");
}

#[tokio::test]
async fn deploy_to_missing_project_is_not_found() {
    let (_dir, state) = app();
    let before = state.store.snapshot();
    let body = DeployBody {
        tool_id: "IA-0004".into(),
        target: DeployTarget::Existing { project_id: "nope".into(), workspace_id: "ws-1".into() },
    };
    let (status, Json(err)) = deploy(State(state.clone()), Json(body)).await.unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "E_PROJECT_NOT_FOUND");
    assert_eq!(*state.store.snapshot(), *before);
}

#[tokio::test]
async fn deploy_body_parses_tagged_target() {
    let body: DeployBody = serde_json::from_value(json!({
        "toolId": "IA-0001",
        "target": { "kind": "existing", "projectId": "proj-1", "workspaceId": "ws-1" }
    }))
    .unwrap();
    assert_eq!(
        body.target,
        DeployTarget::Existing { project_id: "proj-1".into(), workspace_id: "ws-1".into() }
    );
}

#[tokio::test]
async fn widget_lifecycle_through_routes() {
    let (_dir, state) = app();
    let body = AddWidgetBody { tool_id: "IA-0020".into(), index: Some(0) };
    let (status, Json(created)) = add_widget(State(state.clone()), Json(body)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let id = created["instanceId"].as_str().unwrap().to_string();
    assert_eq!(state.store.snapshot().active_widgets()[0].instance_id, id);

    let body = UpdateTaskBody { task: "Revisar".into() };
    assert!(update_task(State(state.clone()), Path(id.clone()), Json(body)).await.is_ok());

    let body = PostMessageBody { text: "oi".into() };
    let response = post_message(State(state.clone()), Path(id.clone()), Json(body)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    wait_for_reply(&state, &id).await;

    let snapshot = state.store.snapshot();
    let widget = snapshot.find_widget(&id).unwrap();
    assert_eq!(widget.context_task.as_deref(), Some("Revisar"));
    assert_eq!(widget.messages.len(), 2);
    assert_eq!(widget.messages[0].text, "oi");
    assert_eq!(widget.messages[1].text, "[Simulação] Resposta de Cursor...");

    assert!(delete_widget(State(state.clone()), Path(id.clone())).await.is_ok());
    assert_eq!(
        delete_widget(State(state), Path(id)).await.err(),
        Some(StatusCode::NOT_FOUND)
    );
}

#[tokio::test]
async fn post_message_rejects_blank_text() {
    let (_dir, state) = app();
    let body = PostMessageBody { text: " ".into() };
    let response = post_message(State(state), Path("w-1".into()), Json(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_message_to_unknown_widget_is_not_found() {
    let (_dir, state) = app();
    let body = PostMessageBody { text: "oi".into() };
    let response = post_message(State(state.clone()), Path("w-404".into()), Json(body)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!state.broadcaster.cancel());
}

#[tokio::test]
async fn reorder_reports_change() {
    let (_dir, state) = app();
    let Json(out) = reorder_widgets(State(state.clone()), Json(ReorderBody { from: 0, to: 1 })).await;
    assert_eq!(out["changed"], true);
    let ids: Vec<String> = state
        .store
        .read(|s| s.active_widgets().iter().map(|w| w.instance_id.clone()).collect());
    assert_eq!(ids, vec!["w-2", "w-1"]);

    let Json(out) = reorder_widgets(State(state), Json(ReorderBody { from: 0, to: 9 })).await;
    assert_eq!(out["changed"], false);
}

#[tokio::test]
async fn drop_tool_payload_adds_widget() {
    let (_dir, state) = app();
    let body: DropBody = serde_json::from_value(json!({
        "payload": { "application/x-databot-tool": "IA-0004" }
    }))
    .unwrap();
    let Json(outcome) = drop_payload(State(state.clone()), Json(body)).await;
    assert!(matches!(outcome, DropOutcome::Added { .. }));
    assert_eq!(state.store.snapshot().active_widgets().len(), 3);
}

#[tokio::test]
async fn drop_without_payload_is_ignored() {
    let (_dir, state) = app();
    let body: DropBody = serde_json::from_value(json!({})).unwrap();
    let Json(outcome) = drop_payload(State(state), Json(body)).await;
    assert_eq!(outcome, DropOutcome::Ignored);
}

#[tokio::test]
async fn set_view_navigates_and_toggles_catalog() {
    let (_dir, state) = app();
    let body = ViewBody { view: Some(View::Dashboard), catalog_open: Some(true) };
    let Json(out) = set_view(State(state.clone()), Json(body)).await;
    assert_eq!(out["changed"], true);

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.current_view, View::Dashboard);
    assert!(snapshot.is_catalog_open);
}

#[tokio::test]
async fn broadcast_is_accepted_and_replies_land() {
    let (_dir, state) = app();
    let response = start_broadcast(State(state.clone()), Json(BroadcastBody { text: "hello".into() })).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    wait_until_idle(&state).await;
    for widget in state.store.snapshot().active_widgets() {
        assert_eq!(widget.messages.len(), 2);
        assert!(!widget.is_processing);
    }
}

#[tokio::test]
async fn broadcast_rejections_map_to_statuses() {
    let (_dir, state) = app();
    let response = start_broadcast(State(state.clone()), Json(BroadcastBody { text: "".into() })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(broadcast_rejected_to_status(BroadcastRejected::AlreadySending), StatusCode::CONFLICT);
    assert_eq!(broadcast_rejected_to_status(BroadcastRejected::NoWidgets), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(broadcast_rejected_to_status(BroadcastRejected::WidgetNotFound), StatusCode::NOT_FOUND);
    assert_eq!(broadcast_rejected_to_status(BroadcastRejected::WidgetBusy), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_without_broadcast() {
    let (_dir, state) = app();
    let Json(out) = cancel_broadcast(State(state)).await;
    assert_eq!(out["cancelled"], false);
}

#[tokio::test]
async fn settings_round_trip() {
    let (dir, state) = app();
    let Json(view) = get_settings(State(state.clone())).await;
    assert_eq!(view, SettingsView { user_name: DEFAULT_USER_NAME.into(), has_api_key: false });

    let body = SettingsBody { user_name: Some("Ana".into()), gemini_api_key: Some("key-1".into()) };
    let Json(view) = put_settings(State(state.clone()), Json(body)).await.unwrap();
    assert_eq!(view, SettingsView { user_name: "Ana".into(), has_api_key: true });
    assert_eq!(state.store.snapshot().user.name, "Ana");
    assert_eq!(state.api_key.get().as_deref(), Some("key-1"));

    let raw = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
    assert!(raw.contains("key-1"));

    let body = SettingsBody { user_name: Some(String::new()), gemini_api_key: None };
    let Json(view) = put_settings(State(state.clone()), Json(body)).await.unwrap();
    assert_eq!(view.user_name, DEFAULT_USER_NAME);
    assert!(view.has_api_key);
}

#[tokio::test]
async fn failed_settings_write_applies_neither_value() {
    let (dir, state) = app();
    std::fs::create_dir(dir.path().join("settings.json")).unwrap();

    let body = SettingsBody { user_name: Some("Ana".into()), gemini_api_key: Some("key-1".into()) };
    let (status, Json(err)) = put_settings(State(state.clone()), Json(body)).await.unwrap_err();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err["code"], "E_SETTINGS_IO");

    assert_eq!(state.store.snapshot().user.name, DEFAULT_USER_NAME);
    assert_eq!(state.api_key.get(), None);
    assert_eq!(state.settings.user_name().await, None);
    assert_eq!(state.settings.api_key().await, None);
}

#[test]
fn state_error_maps_to_not_found() {
    let err = StateError::WorkspaceNotFound("ws-9".into());
    assert_eq!(state_error_to_status(&err), StatusCode::NOT_FOUND);
}
