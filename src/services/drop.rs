//! Drag-and-drop payloads.
//!
//! A drop carries a small map of data keyed by media type. Dragging a tool
//! from the dock sets `application/x-databot-tool` to the tool id; dragging a
//! widget card sets `text/plain` to its index in the workspace. The tool key
//! wins when both are present and holds an `IA-dddd` id. Anything else is
//! ignored.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::is_valid_tool_id;
use crate::services::store::Changed;
use crate::services::workspace;
use crate::state::HubState;

pub const TOOL_MIME: &str = "application/x-databot-tool";
pub const INDEX_MIME: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Add a widget for `tool_id`, at `index` or at the end.
    AddTool { tool_id: String, index: Option<usize> },
    /// Move the widget at `from` to `to`.
    Reorder { from: usize, to: usize },
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum DropOutcome {
    #[serde(rename_all = "camelCase")]
    Added { instance_id: String },
    Reordered,
    Ignored,
}

impl Changed for DropOutcome {
    fn changed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Decide what a drop means. `target_index` is the card the payload landed
/// on, `None` for the open workspace area.
#[must_use]
pub fn interpret(payload: &BTreeMap<String, String>, target_index: Option<usize>) -> DropAction {
    if let Some(tool_id) = payload.get(TOOL_MIME).map(|s| s.trim()).filter(|s| is_valid_tool_id(s)) {
        return DropAction::AddTool { tool_id: tool_id.to_string(), index: target_index };
    }

    let from = payload.get(INDEX_MIME).and_then(|raw| raw.trim().parse::<usize>().ok());
    match (from, target_index) {
        (Some(from), Some(to)) => DropAction::Reorder { from, to },
        _ => DropAction::Ignore,
    }
}

/// Apply an interpreted drop to the active workspace.
pub fn apply(state: &mut HubState, action: DropAction) -> DropOutcome {
    match action {
        DropAction::AddTool { tool_id, index } => workspace::add_widget(state, &tool_id, index)
            .map_or(DropOutcome::Ignored, |instance_id| DropOutcome::Added { instance_id }),
        DropAction::Reorder { from, to } => {
            if workspace::reorder_widget(state, from, to) {
                DropOutcome::Reordered
            } else {
                DropOutcome::Ignored
            }
        }
        DropAction::Ignore => DropOutcome::Ignored,
    }
}

#[cfg(test)]
#[path = "drop_test.rs"]
mod tests;
