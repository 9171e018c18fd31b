//! Broadcast service — one prompt fanned out to every widget of a workspace,
//! or sent straight to a single widget.
//!
//! DESIGN
//! ======
//! `start` commits the whole dispatch step in one `Store::update`: it checks
//! the preconditions, sets `is_sending`, appends the user message to every
//! active widget and marks them processing. Only then are the per-widget
//! tasks spawned, so a widget's user message always precedes its reply.
//! `send_one` does the same for one widget and leaves `is_sending` alone.
//!
//! Each task captures the widget's `instance_id` plus the strings it needs
//! to build a prompt, never the widget itself. When it finishes it merges
//! its reply with `finish_processing`, which looks the widget up in the
//! latest tree. Replies land in any order and never clobber each other.
//!
//! CANCELLATION
//! ============
//! A send subscribes to the cancel generation before its dispatch commits.
//! `cancel` bumps the generation, which stops every send subscribed so far.
//!
//! LIFECYCLE
//! =========
//! 1. `start` / `send_one` → atomic dispatch, tasks spawned on a `JoinSet`
//! 2. Each task → provider or simulated reply, bounded by the timeout
//!    and the cancel signal → merge
//! 3. All tasks joined → `is_sending = false` (broadcast only) → `BroadcastReport`
//!
//! A timed-out, cancelled or panicked widget still receives a reply message,
//! so every widget ends a send with exactly one user message and one reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::llm::simulated::{DEFAULT_DIRECT_REPLY_DELAY_MS, SimulatedResponder, direct_reply};
use crate::llm::{FAILURE_REPLY, ResponseProvider};
use crate::services::store::Store;
use crate::services::workspace;
use crate::state::{HubState, Message, new_id};

pub const DEFAULT_BROADCAST_TIMEOUT_SECS: u64 = 60;
pub const TIMEOUT_REPLY: &str = "Tempo limite excedido ao aguardar a resposta da ferramenta.";
pub const CANCELLED_REPLY: &str = "Envio cancelado pelo usuário.";

const PROMPT_FALLBACK: &str = "Geral";

// =============================================================================
// TYPES
// =============================================================================

/// Why a send was not started. None of these change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastRejected {
    #[error("message text is empty")]
    EmptyText,
    #[error("a broadcast is already in flight")]
    AlreadySending,
    #[error("active workspace has no widgets")]
    NoWidgets,
    #[error("widget not found")]
    WidgetNotFound,
    #[error("widget is still waiting for a reply")]
    WidgetBusy,
}

impl crate::error::ErrorCode for BroadcastRejected {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyText => "E_EMPTY_TEXT",
            Self::AlreadySending => "E_ALREADY_SENDING",
            Self::NoWidgets => "E_NO_WIDGETS",
            Self::WidgetNotFound => "E_WIDGET_NOT_FOUND",
            Self::WidgetBusy => "E_WIDGET_BUSY",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::AlreadySending | Self::WidgetBusy)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    /// Upper bound for a single widget's reply.
    pub timeout: Duration,
    pub simulated: SimulatedResponder,
    /// Fixed wait before a simulated reply to a single-widget send.
    pub direct_delay: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_BROADCAST_TIMEOUT_SECS),
            simulated: SimulatedResponder::default(),
            direct_delay: Duration::from_millis(DEFAULT_DIRECT_REPLY_DELAY_MS),
        }
    }
}

/// Tally of how each widget's resolution ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub delivered: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    /// Reply tasks that panicked; their widgets got the failure reply.
    pub failed: usize,
    /// Widgets removed before their reply arrived.
    pub missing: usize,
}

impl BroadcastReport {
    fn record(&mut self, resolution: Resolution, merged: bool) {
        let slot = match (resolution, merged) {
            (_, false) => &mut self.missing,
            (Resolution::Delivered, true) => &mut self.delivered,
            (Resolution::TimedOut, true) => &mut self.timed_out,
            (Resolution::Cancelled, true) => &mut self.cancelled,
            (Resolution::Failed, true) => &mut self.failed,
        };
        *slot += 1;
    }
}

/// Handle to an in-flight send.
pub struct Broadcast {
    pub id: String,
    pub widgets: usize,
    task: JoinHandle<BroadcastReport>,
}

impl Broadcast {
    /// Wait for every widget to resolve.
    pub async fn join(self) -> BroadcastReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                warn!(broadcast_id = %self.id, error = %e, "broadcast: driver task failed");
                BroadcastReport::default()
            }
        }
    }
}

/// Fan-out to the workspace, or a message typed into one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Broadcast,
    Direct,
}

/// What one widget needs to resolve its reply.
#[derive(Debug, Clone)]
struct Target {
    instance_id: String,
    tool_id: String,
    context_task: Option<String>,
}

#[derive(Debug, Clone)]
struct Dispatch {
    id: String,
    mode: Mode,
    text: String,
    objective: Option<String>,
    targets: Vec<Target>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Delivered,
    TimedOut,
    Cancelled,
    Failed,
}

// =============================================================================
// BROADCASTER
// =============================================================================

pub struct Broadcaster {
    store: Store,
    catalog: Catalog,
    native: Arc<dyn ResponseProvider>,
    config: BroadcastConfig,
    /// Cancel generation; bumping it stops every send subscribed before the bump.
    cancel_tx: watch::Sender<u64>,
    /// Sends registered and not yet finished.
    active: Mutex<usize>,
}

impl Broadcaster {
    #[must_use]
    pub fn new(store: Store, catalog: Catalog, native: Arc<dyn ResponseProvider>, config: BroadcastConfig) -> Self {
        let (cancel_tx, _) = watch::channel(0);
        Self { store, catalog, native, config, cancel_tx, active: Mutex::new(0) }
    }

    /// Dispatch `text` to every widget of the active workspace.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `BroadcastRejected` when the text is blank, another broadcast
    /// is in flight, or the active workspace has no widgets.
    pub fn start(self: &Arc<Self>, text: &str) -> Result<Broadcast, BroadcastRejected> {
        self.launch(|state| begin(state, text))
    }

    /// Append `text` to one widget and resolve that widget's reply. Native
    /// tools get the raw text as prompt; other tools answer after a fixed delay.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `BroadcastRejected` when the text is blank, the widget does not
    /// exist, or it is still waiting for a reply.
    pub fn send_one(self: &Arc<Self>, instance_id: &str, text: &str) -> Result<Broadcast, BroadcastRejected> {
        self.launch(|state| begin_direct(state, instance_id, text))
    }

    /// Start a broadcast and wait for it to finish.
    ///
    /// # Errors
    ///
    /// See [`Broadcaster::start`].
    #[cfg(test)]
    pub async fn send(self: &Arc<Self>, text: &str) -> Result<BroadcastReport, BroadcastRejected> {
        Ok(self.start(text)?.join().await)
    }

    /// Signal every in-flight send to stop waiting. Returns `false` if none is running.
    pub fn cancel(&self) -> bool {
        let active = self.lock_active();
        if *active == 0 {
            return false;
        }
        self.cancel_tx.send_modify(|generation| *generation += 1);
        info!(sends = *active, "broadcast: cancel requested");
        true
    }

    fn launch(
        self: &Arc<Self>,
        dispatch: impl FnOnce(&mut HubState) -> Result<Dispatch, BroadcastRejected>,
    ) -> Result<Broadcast, BroadcastRejected> {
        let cancel = self.register();
        let dispatch = match self.store.update(dispatch) {
            Ok(dispatch) => dispatch,
            Err(e) => {
                self.release();
                return Err(e);
            }
        };

        info!(broadcast_id = %dispatch.id, mode = ?dispatch.mode, widgets = dispatch.targets.len(), "broadcast: dispatched");

        let id = dispatch.id.clone();
        let widgets = dispatch.targets.len();
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.drive(dispatch, cancel).await });
        Ok(Broadcast { id, widgets, task })
    }

    /// Count a send as active and subscribe it to the cancel generation.
    fn register(&self) -> watch::Receiver<u64> {
        let mut active = self.lock_active();
        *active += 1;
        self.cancel_tx.subscribe()
    }

    fn release(&self) {
        let mut active = self.lock_active();
        *active = active.saturating_sub(1);
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, usize> {
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn drive(self: Arc<Self>, dispatch: Dispatch, cancel: watch::Receiver<u64>) -> BroadcastReport {
        let Dispatch { id, mode, text, objective, targets } = dispatch;

        let mut tasks = JoinSet::new();
        let mut owners = HashMap::with_capacity(targets.len());
        for target in targets {
            let instance_id = target.instance_id.clone();
            let this = Arc::clone(&self);
            let cancel = cancel.clone();
            let text = text.clone();
            let objective = objective.clone();
            let handle =
                tasks.spawn(async move { this.resolve(mode, target, objective.as_deref(), &text, cancel).await });
            owners.insert(handle.id(), instance_id);
        }

        let mut report = BroadcastReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (resolution, merged) = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => {
                    let Some(instance_id) = owners.get(&e.id()) else {
                        continue;
                    };
                    warn!(broadcast_id = %id, %instance_id, error = %e, "broadcast: widget task failed");
                    let merged = self
                        .store
                        .update(|state| workspace::finish_processing(state, instance_id, Message::model(FAILURE_REPLY)));
                    (Resolution::Failed, merged)
                }
            };
            report.record(resolution, merged);
        }

        if mode == Mode::Broadcast {
            self.store.update(|state| {
                state.is_sending = false;
                true
            });
        }
        self.release();

        info!(
            broadcast_id = %id,
            delivered = report.delivered,
            timed_out = report.timed_out,
            cancelled = report.cancelled,
            failed = report.failed,
            missing = report.missing,
            "broadcast: complete"
        );
        report
    }

    /// Resolve one widget's reply and merge it. Returns how it ended and
    /// whether the widget still existed at merge time.
    async fn resolve(
        &self,
        mode: Mode,
        target: Target,
        objective: Option<&str>,
        text: &str,
        mut cancel: watch::Receiver<u64>,
    ) -> (Resolution, bool) {
        let reply = async {
            let tool = self.catalog.find(&target.tool_id);
            let label = tool.map_or(target.tool_id.as_str(), |t| t.name);
            match (mode, tool) {
                (Mode::Broadcast, Some(tool)) if tool.is_native_integration => {
                    let prompt = build_prompt(objective, target.context_task.as_deref(), text);
                    self.native.respond(&prompt).await
                }
                (Mode::Direct, Some(tool)) if tool.is_native_integration => self.native.respond(text).await,
                (Mode::Broadcast, _) => self.config.simulated.reply(label).await,
                (Mode::Direct, _) => {
                    tokio::time::sleep(self.config.direct_delay).await;
                    direct_reply(label)
                }
            }
        };

        let (resolution, reply_text) = tokio::select! {
            biased;
            () = wait_cancelled(&mut cancel) => (Resolution::Cancelled, CANCELLED_REPLY.to_string()),
            result = tokio::time::timeout(self.config.timeout, reply) => match result {
                Ok(text) => (Resolution::Delivered, text),
                Err(_) => {
                    warn!(instance_id = %target.instance_id, tool_id = %target.tool_id, "broadcast: reply timed out");
                    (Resolution::TimedOut, TIMEOUT_REPLY.to_string())
                }
            },
        };

        let merged = self
            .store
            .update(|state| workspace::finish_processing(state, &target.instance_id, Message::model(reply_text)));
        (resolution, merged)
    }
}

/// Completes once the cancel generation moves. Never completes if the sender is dropped first.
async fn wait_cancelled(cancel: &mut watch::Receiver<u64>) {
    if cancel.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// DISPATCH STEP
// =============================================================================

/// The atomic dispatch step: validate, stamp the user message into every
/// active widget, flag them processing, and capture what the tasks need.
fn begin(state: &mut HubState, text: &str) -> Result<Dispatch, BroadcastRejected> {
    if text.trim().is_empty() {
        return Err(BroadcastRejected::EmptyText);
    }
    if state.is_sending {
        return Err(BroadcastRejected::AlreadySending);
    }
    let Some(workspace) = state.current_workspace_mut() else {
        return Err(BroadcastRejected::NoWidgets);
    };
    if workspace.widgets.is_empty() {
        return Err(BroadcastRejected::NoWidgets);
    }

    let user_msg = Message::user(text);
    let objective = workspace.objective.clone();
    let mut targets = Vec::with_capacity(workspace.widgets.len());
    for widget in &mut workspace.widgets {
        widget.messages.push(Message { id: format!("{}-{}", user_msg.id, widget.instance_id), ..user_msg.clone() });
        widget.is_processing = true;
        targets.push(Target {
            instance_id: widget.instance_id.clone(),
            tool_id: widget.tool_id.clone(),
            context_task: widget.context_task.clone(),
        });
    }
    state.is_sending = true;

    Ok(Dispatch { id: new_id("bc"), mode: Mode::Broadcast, text: text.to_string(), objective, targets })
}

/// Single-widget dispatch: append the user message and flag the widget
/// processing, wherever it lives in the tree.
fn begin_direct(state: &mut HubState, instance_id: &str, text: &str) -> Result<Dispatch, BroadcastRejected> {
    if text.trim().is_empty() {
        return Err(BroadcastRejected::EmptyText);
    }
    let Some(widget) = state.find_widget(instance_id) else {
        return Err(BroadcastRejected::WidgetNotFound);
    };
    if widget.is_processing {
        return Err(BroadcastRejected::WidgetBusy);
    }
    let target = Target {
        instance_id: widget.instance_id.clone(),
        tool_id: widget.tool_id.clone(),
        context_task: widget.context_task.clone(),
    };

    workspace::append_message(state, instance_id, Message::user(text));
    if let Some(widget) = state.find_widget_mut(instance_id) {
        widget.is_processing = true;
    }

    Ok(Dispatch { id: new_id("dm"), mode: Mode::Direct, text: text.to_string(), objective: None, targets: vec![target] })
}

/// Prompt sent to the native provider: workspace objective, widget task, user text.
pub(crate) fn build_prompt(objective: Option<&str>, task: Option<&str>, text: &str) -> String {
    let objective = objective.filter(|o| !o.trim().is_empty()).unwrap_or(PROMPT_FALLBACK);
    let task = task.filter(|t| !t.trim().is_empty()).unwrap_or(PROMPT_FALLBACK);
    format!("Objetivo: {objective}. Tarefa: {task}. Msg: {text}")
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
