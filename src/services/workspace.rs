//! Workspace service — pure mutators over the workspace tree.
//!
//! DESIGN
//! ======
//! Each function takes `&mut HubState` and is meant to run inside
//! `Store::update`, so it always sees the latest tree. Operations that
//! reference a missing widget are silent no-ops (`false` / `None`): a reply
//! may legitimately arrive after the user closed its widget. Only
//! `deploy_tool` fails loudly, because a missing destination there is a
//! caller contract violation.
//!
//! SELECTION
//! =========
//! Any mutation that removes or re-targets the active project or workspace
//! re-points `current_project_id` / `current_workspace_id` in the same call.

use tracing::debug;

use crate::services::store::Changed;
use crate::state::{HubState, Message, Project, View, Widget, Workspace};

pub const DEFAULT_WORKSPACE_NAME: &str = "Main Workspace";
pub const NEW_PROJECT_NAME: &str = "Novo Projeto";
pub const INITIAL_WORKSPACE_NAME: &str = "Workspace Inicial";
pub const NEW_WORKSPACE_NAME: &str = "Novo Workspace";
pub const DEPLOYED_OBJECTIVE: &str = "Novo Workspace";

const TASK_FIRST_TOOL: &str = "Início";
const TASK_DEPLOYED_TOOL: &str = "Nova Ferramenta";
const TASK_ADDED_WIDGET: &str = "Nova Tarefa";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),
}

impl crate::error::ErrorCode for StateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) => "E_PROJECT_NOT_FOUND",
            Self::WorkspaceNotFound(_) => "E_WORKSPACE_NOT_FOUND",
        }
    }
}

/// Where a deployed tool lands.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeployTarget {
    /// Fresh project with one workspace.
    #[serde(rename_all = "camelCase")]
    NewProject { project_name: Option<String>, workspace_name: Option<String> },
    /// Fresh workspace appended to an existing project.
    #[serde(rename_all = "camelCase")]
    NewWorkspace { project_id: String, workspace_name: Option<String> },
    /// Existing workspace of an existing project.
    #[serde(rename_all = "camelCase")]
    Existing { project_id: String, workspace_id: String },
}

/// Ids of the project and workspace a mutation activated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub project_id: String,
    pub workspace_id: String,
}

impl Changed for Selection {
    fn changed(&self) -> bool {
        true
    }
}

fn non_blank(raw: Option<String>, default: &str) -> String {
    raw.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn activate(state: &mut HubState, project_id: String, workspace_id: String) -> Selection {
    state.current_project_id.clone_from(&project_id);
    state.current_workspace_id.clone_from(&workspace_id);
    state.current_view = View::Workspace;
    Selection { project_id, workspace_id }
}

// =============================================================================
// PROJECTS
// =============================================================================

/// Insert a project with one default workspace at the front and activate it.
pub fn create_project(state: &mut HubState, name: &str, objective: &str) -> Selection {
    let workspace = Workspace::new(DEFAULT_WORKSPACE_NAME, Some(objective));
    let project = Project::new(name, vec![workspace]);
    let selection = (project.id.clone(), project.workspaces[0].id.clone());
    state.projects.insert(0, project);
    debug!(project_id = %selection.0, "workspace: project created");
    activate(state, selection.0, selection.1)
}

/// Deploy `tool_id` into a new project, a new workspace, or an existing workspace.
///
/// # Errors
///
/// Returns `ProjectNotFound` / `WorkspaceNotFound` when the target references
/// ids that do not exist. The state is left untouched in that case.
pub fn deploy_tool(state: &mut HubState, tool_id: &str, target: DeployTarget) -> Result<Selection, StateError> {
    match target {
        DeployTarget::NewProject { project_name, workspace_name } => {
            let mut workspace = Workspace::new(
                non_blank(workspace_name, INITIAL_WORKSPACE_NAME),
                Some(DEPLOYED_OBJECTIVE),
            );
            workspace.widgets.push(Widget::new(tool_id, Some(TASK_FIRST_TOOL)));
            let project = Project::new(non_blank(project_name, NEW_PROJECT_NAME), vec![workspace]);
            let (project_id, workspace_id) = (project.id.clone(), project.workspaces[0].id.clone());
            state.projects.insert(0, project);
            Ok(activate(state, project_id, workspace_id))
        }
        DeployTarget::NewWorkspace { project_id, workspace_name } => {
            let project = state
                .project_mut(&project_id)
                .ok_or_else(|| StateError::ProjectNotFound(project_id.clone()))?;
            let mut workspace =
                Workspace::new(non_blank(workspace_name, NEW_WORKSPACE_NAME), Some(DEPLOYED_OBJECTIVE));
            workspace.widgets.push(Widget::new(tool_id, Some(TASK_FIRST_TOOL)));
            let workspace_id = workspace.id.clone();
            project.workspaces.push(workspace);
            Ok(activate(state, project_id, workspace_id))
        }
        DeployTarget::Existing { project_id, workspace_id } => {
            let project = state
                .project_mut(&project_id)
                .ok_or_else(|| StateError::ProjectNotFound(project_id.clone()))?;
            let workspace = project
                .workspace_mut(&workspace_id)
                .ok_or_else(|| StateError::WorkspaceNotFound(workspace_id.clone()))?;
            workspace.widgets.push(Widget::new(tool_id, Some(TASK_DEPLOYED_TOOL)));
            Ok(activate(state, project_id, workspace_id))
        }
    }
}

/// Activate a project and its first workspace. No-op if the project is unknown.
pub fn select_project(state: &mut HubState, project_id: &str) -> bool {
    let Some(project) = state.project(project_id) else {
        return false;
    };
    let workspace_id = project
        .workspaces
        .first()
        .map(|w| w.id.clone())
        .unwrap_or_default();
    activate(state, project_id.to_string(), workspace_id);
    true
}

/// Activate one workspace. No-op unless it exists inside `project_id`.
pub fn select_workspace(state: &mut HubState, project_id: &str, workspace_id: &str) -> bool {
    if state
        .project(project_id)
        .and_then(|p| p.workspace(workspace_id))
        .is_none()
    {
        return false;
    }
    state.current_project_id = project_id.to_string();
    state.current_workspace_id = workspace_id.to_string();
    true
}

/// Remove a project. The last remaining project cannot be removed.
/// Falls back to the first remaining project when the active one goes away.
pub fn remove_project(state: &mut HubState, project_id: &str) -> bool {
    if state.projects.len() <= 1 {
        return false;
    }
    let before = state.projects.len();
    state.projects.retain(|p| p.id != project_id);
    if state.projects.len() == before {
        return false;
    }
    if !state.selection_is_valid() {
        state.reset_selection();
    }
    true
}

/// Remove a workspace. A project's last workspace cannot be removed.
/// Falls back to the first remaining workspace of the same project when the
/// active one goes away.
pub fn remove_workspace(state: &mut HubState, project_id: &str, workspace_id: &str) -> bool {
    let Some(project) = state.project_mut(project_id) else {
        return false;
    };
    if project.workspaces.len() <= 1 {
        return false;
    }
    let before = project.workspaces.len();
    project.workspaces.retain(|w| w.id != workspace_id);
    if project.workspaces.len() == before {
        return false;
    }
    let fallback = project.workspaces[0].id.clone();
    if state.current_project_id == project_id && !state.selection_is_valid() {
        state.current_workspace_id = fallback;
    }
    true
}

// =============================================================================
// WIDGETS (ACTIVE WORKSPACE)
// =============================================================================

/// Insert a widget into the active workspace at `index` (clamped) or at the end.
/// Returns the new `instance_id`, or `None` if no workspace is active.
pub fn add_widget(state: &mut HubState, tool_id: &str, index: Option<usize>) -> Option<String> {
    let workspace = state.current_workspace_mut()?;
    let widget = Widget::new(tool_id, Some(TASK_ADDED_WIDGET));
    let instance_id = widget.instance_id.clone();
    let at = index.map_or(workspace.widgets.len(), |i| i.min(workspace.widgets.len()));
    workspace.widgets.insert(at, widget);
    Some(instance_id)
}

/// Remove a widget from the active workspace. No-op if absent.
pub fn remove_widget(state: &mut HubState, instance_id: &str) -> bool {
    let Some(workspace) = state.current_workspace_mut() else {
        return false;
    };
    let Some(index) = workspace.widget_index(instance_id) else {
        return false;
    };
    workspace.widgets.remove(index);
    true
}

/// Move one widget within the active workspace, preserving the order of the rest.
pub fn reorder_widget(state: &mut HubState, from: usize, to: usize) -> bool {
    if from == to {
        return false;
    }
    let Some(workspace) = state.current_workspace_mut() else {
        return false;
    };
    let len = workspace.widgets.len();
    if from >= len || to >= len {
        return false;
    }
    let moved = workspace.widgets.remove(from);
    workspace.widgets.insert(to, moved);
    true
}

/// Set the context task label of a widget in the active workspace.
pub fn update_task(state: &mut HubState, instance_id: &str, label: &str) -> bool {
    let Some(widget) = state
        .current_workspace_mut()
        .and_then(|w| w.widgets.iter_mut().find(|w| w.instance_id == instance_id))
    else {
        return false;
    };
    widget.context_task = Some(label.to_string());
    true
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Append a message to a widget anywhere in the tree. No-op if the widget is gone.
pub fn append_message(state: &mut HubState, instance_id: &str, message: Message) -> bool {
    let Some(widget) = state.find_widget_mut(instance_id) else {
        return false;
    };
    widget.messages.push(message);
    true
}

/// Merge a reply: clear the processing flag and append the message.
pub fn finish_processing(state: &mut HubState, instance_id: &str, reply: Message) -> bool {
    let Some(widget) = state.find_widget_mut(instance_id) else {
        debug!(%instance_id, "workspace: reply target gone");
        return false;
    };
    widget.is_processing = false;
    widget.messages.push(reply);
    true
}

// =============================================================================
// NAVIGATION
// =============================================================================

pub fn navigate(state: &mut HubState, view: View) -> bool {
    if state.current_view == view {
        return false;
    }
    state.current_view = view;
    true
}

pub fn set_catalog_open(state: &mut HubState, open: bool) -> bool {
    if state.is_catalog_open == open {
        return false;
    }
    state.is_catalog_open = open;
    true
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
