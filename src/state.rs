//! Shared application state.
//!
//! DESIGN
//! ======
//! `HubState` is the single root of the workspace tree:
//! Projects → Workspaces → Widgets → Messages. It is a plain value; all
//! mutation goes through the `Store`, which applies one transformation at a
//! time against the latest state and publishes the result to observers.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! bundles the store with the catalog, broadcaster and settings.
//!
//! INVARIANTS
//! ==========
//! - `current_project_id` names a project in `projects` and
//!   `current_workspace_id` names a workspace inside it.
//! - `instance_id`, workspace ids and project ids are never reused.
//! - A widget's `tool_id` is a lookup key; an unknown id is a ghost widget,
//!   never a broken state.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::llm::ApiKey;
use crate::services::broadcast::Broadcaster;
use crate::services::settings::SettingsStore;
use crate::services::store::Store;

pub const DEFAULT_USER_NAME: &str = "Usuário Demo";
pub const DEFAULT_USER_AVATAR: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=Felix";

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Generate a collision-free id with a readable type prefix (`w-…`, `ws-…`).
#[must_use]
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

// =============================================================================
// MESSAGE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

/// One chat bubble inside a widget. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: i64,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self { id: new_id("msg"), role, text: text.into(), timestamp: now_ms() }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }
}

// =============================================================================
// TREE
// =============================================================================

/// A live instance of a catalog tool inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub instance_id: String,
    pub tool_id: String,
    pub messages: Vec<Message>,
    pub is_processing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_task: Option<String>,
}

impl Widget {
    #[must_use]
    pub fn new(tool_id: impl Into<String>, context_task: Option<&str>) -> Self {
        Self {
            instance_id: new_id("w"),
            tool_id: tool_id.into(),
            messages: Vec::new(),
            is_processing: false,
            context_task: context_task.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    pub widgets: Vec<Widget>,
}

impl Workspace {
    #[must_use]
    pub fn new(name: impl Into<String>, objective: Option<&str>) -> Self {
        Self { id: new_id("ws"), name: name.into(), objective: objective.map(str::to_owned), widgets: Vec::new() }
    }

    #[must_use]
    pub fn widget_index(&self, instance_id: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.instance_id == instance_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub workspaces: Vec<Workspace>,
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>, workspaces: Vec<Workspace>) -> Self {
        Self { id: new_id("proj"), name: name.into(), workspaces }
    }

    #[must_use]
    pub fn workspace(&self, workspace_id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == workspace_id)
    }

    pub fn workspace_mut(&mut self, workspace_id: &str) -> Option<&mut Workspace> {
        self.workspaces.iter_mut().find(|w| w.id == workspace_id)
    }
}

// =============================================================================
// ROOT
// =============================================================================

/// Top-level screens. Navigation is a state field, not URL routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Landing,
    Dashboard,
    Onboarding,
    Workspace,
    Pricing,
    Settings,
    About,
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub avatar: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self { name: DEFAULT_USER_NAME.into(), avatar: DEFAULT_USER_AVATAR.into() }
    }
}

/// The whole workspace tree plus the active selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubState {
    pub projects: Vec<Project>,
    pub current_project_id: String,
    pub current_workspace_id: String,
    pub current_view: View,
    pub is_catalog_open: bool,
    /// `true` while a broadcast is in flight. At most one at a time.
    pub is_sending: bool,
    pub user: UserProfile,
}

impl Default for HubState {
    fn default() -> Self {
        Self::seeded()
    }
}

impl HubState {
    /// Build a state over `projects`, selecting the first project and its first workspace.
    #[must_use]
    pub fn new(projects: Vec<Project>) -> Self {
        let (current_project_id, current_workspace_id) = first_selection(&projects).unwrap_or_default();
        Self {
            projects,
            current_project_id,
            current_workspace_id,
            current_view: View::default(),
            is_catalog_open: false,
            is_sending: false,
            user: UserProfile::default(),
        }
    }

    /// The demo projects a fresh hub starts with.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(seed_projects())
    }

    #[must_use]
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    #[must_use]
    pub fn current_project(&self) -> Option<&Project> {
        self.project(&self.current_project_id)
    }

    #[must_use]
    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.current_project()?.workspace(&self.current_workspace_id)
    }

    pub fn current_workspace_mut(&mut self) -> Option<&mut Workspace> {
        let workspace_id = self.current_workspace_id.clone();
        let project_id = self.current_project_id.clone();
        self.project_mut(&project_id)?.workspace_mut(&workspace_id)
    }

    /// Widgets of the active workspace, empty when nothing is active.
    #[must_use]
    pub fn active_widgets(&self) -> &[Widget] {
        self.current_workspace().map_or(&[], |w| w.widgets.as_slice())
    }

    /// Locate a widget anywhere in the tree.
    #[must_use]
    pub fn find_widget(&self, instance_id: &str) -> Option<&Widget> {
        self.projects
            .iter()
            .flat_map(|p| &p.workspaces)
            .flat_map(|w| &w.widgets)
            .find(|w| w.instance_id == instance_id)
    }

    pub fn find_widget_mut(&mut self, instance_id: &str) -> Option<&mut Widget> {
        self.projects
            .iter_mut()
            .flat_map(|p| &mut p.workspaces)
            .flat_map(|w| &mut w.widgets)
            .find(|w| w.instance_id == instance_id)
    }

    /// `true` when both active ids resolve.
    #[must_use]
    pub fn selection_is_valid(&self) -> bool {
        self.current_workspace().is_some()
    }

    /// Point the selection at the first project and its first workspace.
    pub fn reset_selection(&mut self) {
        let (project_id, workspace_id) = first_selection(&self.projects).unwrap_or_default();
        self.current_project_id = project_id;
        self.current_workspace_id = workspace_id;
    }
}

fn first_selection(projects: &[Project]) -> Option<(String, String)> {
    let project = projects.first()?;
    let workspace_id = project
        .workspaces
        .first()
        .map(|w| w.id.clone())
        .unwrap_or_default();
    Some((project.id.clone(), workspace_id))
}

fn seed_widget(instance_id: &str, tool_id: &str, task: &str) -> Widget {
    Widget {
        instance_id: instance_id.into(),
        tool_id: tool_id.into(),
        messages: Vec::new(),
        is_processing: false,
        context_task: Some(task.into()),
    }
}

fn seed_projects() -> Vec<Project> {
    vec![
        Project {
            id: "proj-1".into(),
            name: "Campanha Marketing Q3".into(),
            workspaces: vec![
                Workspace {
                    id: "ws-1".into(),
                    name: "Ideação & Copy".into(),
                    objective: Some("Criar textos persuasivos para redes sociais".into()),
                    widgets: vec![
                        seed_widget("w-1", "IA-0001", "Copy Instagram"),
                        seed_widget("w-2", "IA-0003", "Revisão de Tom"),
                    ],
                },
                Workspace {
                    id: "ws-2".into(),
                    name: "Design Assets".into(),
                    objective: Some("Gerar imagens para campanha".into()),
                    widgets: vec![seed_widget("w-3", "IA-0009", "Backgrounds")],
                },
            ],
        },
        Project {
            id: "proj-2".into(),
            name: "Desenvolvimento App".into(),
            workspaces: vec![Workspace {
                id: "ws-3".into(),
                name: "Frontend Code".into(),
                objective: Some("Refatorar componentes React".into()),
                widgets: vec![
                    seed_widget("w-4", "IA-0020", "Refatoração"),
                    seed_widget("w-5", "IA-0004", "Docs"),
                ],
            }],
        },
    ]
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub catalog: Catalog,
    pub broadcaster: Arc<Broadcaster>,
    pub settings: Arc<SettingsStore>,
    /// Credential read by the native provider on every call.
    pub api_key: ApiKey,
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use std::time::Duration;

    use crate::llm::ResponseProvider;
    use crate::llm::simulated::SimulatedResponder;
    use crate::services::broadcast::BroadcastConfig;

    /// Provider that echoes the prompt back, prefixed.
    pub struct EchoProvider;

    #[async_trait::async_trait]
    impl ResponseProvider for EchoProvider {
        async fn respond(&self, prompt: &str) -> String {
            format!("echo: {prompt}")
        }
    }

    /// Broadcast config with near-instant simulated replies.
    #[must_use]
    pub fn fast_broadcast_config() -> BroadcastConfig {
        BroadcastConfig {
            timeout: Duration::from_secs(5),
            simulated: SimulatedResponder::new(1, 5),
            direct_delay: Duration::from_millis(5),
        }
    }

    /// Build a `Broadcaster` over `store` with the given native provider.
    #[must_use]
    pub fn broadcaster(store: &Store, native: Arc<dyn ResponseProvider>) -> Arc<Broadcaster> {
        Arc::new(Broadcaster::new(store.clone(), Catalog::builtin(), native, fast_broadcast_config()))
    }

    /// Create a test `AppState` over the seeded tree with an echoing native provider.
    #[must_use]
    pub fn test_app_state(settings_dir: &std::path::Path) -> AppState {
        let store = Store::new(HubState::seeded());
        let settings = SettingsStore::open(settings_dir.join("settings.json")).expect("open settings");
        AppState {
            broadcaster: broadcaster(&store, Arc::new(EchoProvider)),
            store,
            catalog: Catalog::builtin(),
            settings: Arc::new(settings),
            api_key: ApiKey::default(),
        }
    }

    /// A single project "P1" / workspace "W1" holding one widget per tool id.
    #[must_use]
    pub fn single_workspace(tool_ids: &[&str]) -> HubState {
        let mut workspace = Workspace::new("W1", Some("Testar"));
        workspace.widgets = tool_ids
            .iter()
            .map(|id| Widget::new(*id, Some("Tarefa")))
            .collect();
        HubState::new(vec![Project::new("P1", vec![workspace])])
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
