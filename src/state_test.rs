use super::*;

#[test]
fn seeded_state_selects_first_project_and_workspace() {
    let state = HubState::seeded();
    assert_eq!(state.current_project_id, "proj-1");
    assert_eq!(state.current_workspace_id, "ws-1");
    assert_eq!(state.current_view, View::Landing);
    assert!(state.selection_is_valid());
    assert!(!state.is_sending);
}

#[test]
fn seeded_active_widgets_are_chatgpt_and_claude() {
    let state = HubState::seeded();
    let tools: Vec<_> = state.active_widgets().iter().map(|w| w.tool_id.as_str()).collect();
    assert_eq!(tools, vec!["IA-0001", "IA-0003"]);
}

#[test]
fn seeded_ids_are_unique() {
    let state = HubState::seeded();
    let mut ids = std::collections::HashSet::new();
    for project in &state.projects {
        assert!(ids.insert(project.id.clone()));
        for workspace in &project.workspaces {
            assert!(ids.insert(workspace.id.clone()));
            for widget in &workspace.widgets {
                assert!(ids.insert(widget.instance_id.clone()));
            }
        }
    }
}

#[test]
fn new_id_is_prefixed_and_unique() {
    let a = new_id("w");
    let b = new_id("w");
    assert!(a.starts_with("w-"));
    assert_ne!(a, b);
}

#[test]
fn find_widget_searches_whole_tree() {
    let state = HubState::seeded();
    assert_eq!(state.find_widget("w-5").map(|w| w.tool_id.as_str()), Some("IA-0004"));
    assert!(state.find_widget("w-404").is_none());
}

#[test]
fn empty_state_has_no_active_workspace() {
    let state = HubState::new(Vec::new());
    assert!(state.current_workspace().is_none());
    assert!(state.active_widgets().is_empty());
    assert!(!state.selection_is_valid());
}

#[test]
fn message_constructors_set_role_and_time() {
    let msg = Message::user("oi");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.text, "oi");
    assert!(msg.timestamp > 0);
    assert_eq!(Message::model("x").role, Role::Model);
}

#[test]
fn snapshot_serializes_camel_case() {
    let json = serde_json::to_value(HubState::seeded()).unwrap();
    assert_eq!(json["currentProjectId"], "proj-1");
    assert_eq!(json["currentView"], "landing");
    assert_eq!(json["projects"][0]["workspaces"][0]["widgets"][0]["instanceId"], "w-1");
    assert_eq!(json["projects"][0]["workspaces"][0]["widgets"][0]["isProcessing"], false);
}

#[test]
fn ghost_widget_is_structurally_valid() {
    let mut state = test_helpers::single_workspace(&["IA-9999"]);
    let widget = state.current_workspace_mut().unwrap().widgets.first().cloned().unwrap();
    assert_eq!(widget.tool_id, "IA-9999");
    assert!(crate::catalog::Catalog::builtin().find(&widget.tool_id).is_none());
    let json = serde_json::to_string(&state).unwrap();
    let restored: HubState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);
}
