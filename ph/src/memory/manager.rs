//! MemoryManager - actor that owns the BlockStore
//!
//! Processes commands via channels for exclusive access to plan memory.

use std::path::Path;

use memorystore::{BlockRead, BlockStore, Scope};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{PlanDocument, PlanError, PlanStatus};

use super::messages::{MemoryCommand, MemoryError, MemoryResponse};
use super::{NO_CONTEXT_PLACEHOLDER, NO_PLAN_PLACEHOLDER, NOTES_LABEL, SESSION_PLAN_LABEL};

/// Handle to send commands to the MemoryManager
#[derive(Clone)]
pub struct MemoryManager {
    tx: mpsc::Sender<MemoryCommand>,
    global_label: String,
}

impl MemoryManager {
    /// Open the block store in `store_dir` and spawn the actor
    pub fn open(store_dir: impl AsRef<Path>, busy_timeout_ms: u64, global_label: &str) -> eyre::Result<Self> {
        debug!(store_dir = %store_dir.as_ref().display(), "open: called");
        let store = BlockStore::open_with_timeout(store_dir, busy_timeout_ms)?;
        Ok(Self::spawn(store, global_label))
    }

    /// Spawn the actor over an in-memory store
    pub fn in_memory(global_label: &str) -> eyre::Result<Self> {
        let store = BlockStore::open_in_memory()?;
        Ok(Self::spawn(store, global_label))
    }

    /// Spawn the actor task over an already-open store
    pub fn spawn(store: BlockStore, global_label: &str) -> Self {
        let (tx, rx) = mpsc::channel(256);
        let actor = MemoryActor {
            store,
            global_label: global_label.to_string(),
        };

        tokio::spawn(actor_loop(actor, rx));

        info!(%global_label, "MemoryManager spawned");
        Self {
            tx,
            global_label: global_label.to_string(),
        }
    }

    /// Label of the shared plan block
    pub fn global_label(&self) -> &str {
        &self.global_label
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<MemoryResponse<T>>) -> MemoryCommand) -> MemoryResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| MemoryError::ChannelError)?;
        reply_rx.await.map_err(|_| MemoryError::ChannelError)?
    }

    /// Create the blocks a session reads and writes
    pub async fn ensure_session(&self, session_id: &str) -> MemoryResponse<()> {
        debug!(%session_id, "ensure_session: called");
        self.request(|reply| MemoryCommand::EnsureSession {
            session_id: session_id.to_string(),
            reply,
        })
        .await
    }

    /// Session working copy, else the global copy, else None
    pub async fn read_plan(&self, session_id: &str) -> MemoryResponse<Option<PlanDocument>> {
        debug!(%session_id, "read_plan: called");
        self.request(|reply| MemoryCommand::ReadPlan {
            session_id: session_id.to_string(),
            reply,
        })
        .await
    }

    /// Plan stored in the global tier under `label`
    pub async fn read_global(&self, label: &str) -> MemoryResponse<Option<PlanDocument>> {
        debug!(%label, "read_global: called");
        self.request(|reply| MemoryCommand::ReadGlobal {
            label: label.to_string(),
            reply,
        })
        .await
    }

    /// Persist a plan to the session and global tiers
    pub async fn save_plan(&self, session_id: &str, document: PlanDocument) -> MemoryResponse<PlanDocument> {
        debug!(%session_id, status = %document.status, "save_plan: called");
        self.request(|reply| MemoryCommand::SavePlan {
            session_id: session_id.to_string(),
            document,
            reply,
        })
        .await
    }

    /// Force the global plan to `ready`
    pub async fn approve(&self, label: &str) -> MemoryResponse<PlanDocument> {
        debug!(%label, "approve: called");
        self.request(|reply| MemoryCommand::Approve {
            label: label.to_string(),
            reply,
        })
        .await
    }

    /// Advance the global plan's status
    pub async fn set_status(&self, label: &str, status: PlanStatus) -> MemoryResponse<PlanDocument> {
        debug!(%label, %status, "set_status: called");
        self.request(|reply| MemoryCommand::SetStatus {
            label: label.to_string(),
            status,
            reply,
        })
        .await
    }

    /// Append a reasoning note, returning every note for the session
    pub async fn append_note(&self, session_id: &str, note: &str) -> MemoryResponse<Vec<String>> {
        debug!(%session_id, "append_note: called");
        self.request(|reply| MemoryCommand::AppendNote {
            session_id: session_id.to_string(),
            note: note.to_string(),
            reply,
        })
        .await
    }

    pub async fn read_notes(&self, session_id: &str) -> MemoryResponse<Vec<String>> {
        debug!(%session_id, "read_notes: called");
        self.request(|reply| MemoryCommand::ReadNotes {
            session_id: session_id.to_string(),
            reply,
        })
        .await
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> Result<(), MemoryError> {
        debug!("shutdown: called");
        self.tx
            .send(MemoryCommand::Shutdown)
            .await
            .map_err(|_| MemoryError::ChannelError)
    }
}

/// Stored shape of the session notes block
#[derive(Debug, Default, Serialize, Deserialize)]
struct ReasoningNotes {
    reasoning_notes: Vec<String>,
}

/// State owned by the actor task
struct MemoryActor {
    store: BlockStore,
    global_label: String,
}

impl MemoryActor {
    fn ensure_session(&mut self, session_id: &str) -> MemoryResponse<()> {
        let scope = Scope::session(session_id);
        self.store.get_or_create(SESSION_PLAN_LABEL, &scope, NO_PLAN_PLACEHOLDER)?;
        self.store.get_or_create(NOTES_LABEL, &scope, NO_CONTEXT_PLACEHOLDER)?;
        self.store
            .get_or_create(&self.global_label, &Scope::Global, NO_PLAN_PLACEHOLDER)?;
        Ok(())
    }

    fn stored_plan(&self, label: &str, scope: &Scope) -> MemoryResponse<Option<PlanDocument>> {
        decode_plan(label, scope, &self.store.read(label, scope)?)
    }

    fn read_plan(&self, session_id: &str) -> MemoryResponse<Option<PlanDocument>> {
        if let Some(plan) = self.stored_plan(SESSION_PLAN_LABEL, &Scope::session(session_id))? {
            return Ok(Some(plan));
        }
        self.stored_plan(&self.global_label, &Scope::Global)
    }

    /// Both copies are checked and written inside one store transaction, so a
    /// writer in another process cannot slip a status change in between.
    fn save_plan(&mut self, session_id: &str, document: PlanDocument) -> MemoryResponse<PlanDocument> {
        let scope = Scope::session(session_id);
        let keys = [(SESSION_PLAN_LABEL, &scope), (self.global_label.as_str(), &Scope::Global)];
        let value = encode_plan(&document)?;

        self.store.update_all::<MemoryError, _>(&keys, |current| {
            // Both copies must accept the new status before either is touched
            for ((label, scope), read) in keys.iter().zip(current) {
                let stored = decode_plan(label, scope, read)?;
                PlanStatus::check_transition(stored.map(|p| p.status), document.status)?;
            }
            Ok(vec![value.clone(), value.clone()])
        })?;

        info!(%session_id, project = %document.project_name, status = %document.status, "Plan saved");
        Ok(document)
    }

    /// Rewrite the global plan's status
    ///
    /// With `force` the forward-only rule is skipped (host approval pulls a
    /// plan back to `ready`); a deployed plan is never touched.
    fn update_global(&mut self, label: &str, status: PlanStatus, force: bool) -> MemoryResponse<PlanDocument> {
        let mut updated = None;

        self.store.update_all::<MemoryError, _>(&[(label, &Scope::Global)], |current| {
            let stored =
                decode_plan(label, &Scope::Global, &current[0])?.ok_or_else(|| MemoryError::NoDocument(label.to_string()))?;

            if force && stored.status.is_terminal() {
                return Err(PlanError::IllegalTransition {
                    from: stored.status,
                    to: status,
                }
                .into());
            }
            if !force {
                PlanStatus::check_transition(Some(stored.status), status)?;
            }
            let next = stored.with_status(status);
            if status == PlanStatus::Ready {
                next.check_ready()?;
            }

            let value = encode_plan(&next)?;
            updated = Some(next);
            Ok(vec![value])
        })?;

        let updated = updated.ok_or_else(|| MemoryError::NoDocument(label.to_string()))?;
        info!(%label, %status, "Global plan status updated");
        Ok(updated)
    }

    fn read_notes(&self, session_id: &str) -> MemoryResponse<Vec<String>> {
        decode_notes(&self.store.read(NOTES_LABEL, &Scope::session(session_id))?)
    }

    /// Identical notes are kept once
    fn append_note(&mut self, session_id: &str, note: String) -> MemoryResponse<Vec<String>> {
        let scope = Scope::session(session_id);
        let mut notes = Vec::new();

        self.store.update_all::<MemoryError, _>(&[(NOTES_LABEL, &scope)], |current| {
            notes = decode_notes(&current[0])?;
            if notes.contains(&note) {
                debug!(%session_id, "append_note: duplicate note skipped");
            } else {
                notes.push(note);
            }
            let value = serde_json::to_string_pretty(&ReasoningNotes {
                reasoning_notes: notes.clone(),
            })
            .map_err(|e| MemoryError::Store(format!("failed to serialize notes: {}", e)))?;
            Ok(vec![value])
        })?;

        debug!(%session_id, count = notes.len(), "append_note: saved");
        Ok(notes)
    }
}

fn decode_plan(label: &str, scope: &Scope, read: &BlockRead) -> MemoryResponse<Option<PlanDocument>> {
    match read {
        BlockRead::Value(value) => PlanDocument::from_json_str(value)
            .map(Some)
            .map_err(|e| MemoryError::Corrupt(format!("plan '{}' in {} is unreadable: {}", label, scope, e))),
        BlockRead::Missing | BlockRead::Placeholder => Ok(None),
    }
}

fn encode_plan(document: &PlanDocument) -> MemoryResponse<String> {
    document
        .to_json_pretty()
        .map_err(|e| MemoryError::Store(format!("failed to serialize plan: {}", e)))
}

fn decode_notes(read: &BlockRead) -> MemoryResponse<Vec<String>> {
    match read {
        BlockRead::Value(value) => serde_json::from_str::<ReasoningNotes>(value)
            .map(|notes| notes.reasoning_notes)
            .map_err(|e| MemoryError::Corrupt(format!("reasoning notes are unreadable: {}", e))),
        BlockRead::Missing | BlockRead::Placeholder => Ok(Vec::new()),
    }
}

/// The actor loop - processes commands sequentially
async fn actor_loop(mut actor: MemoryActor, mut rx: mpsc::Receiver<MemoryCommand>) {
    debug!("MemoryManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            MemoryCommand::EnsureSession { session_id, reply } => {
                debug!(%session_id, "actor_loop: EnsureSession command");
                let _ = reply.send(actor.ensure_session(&session_id));
            }

            MemoryCommand::ReadPlan { session_id, reply } => {
                debug!(%session_id, "actor_loop: ReadPlan command");
                let _ = reply.send(actor.read_plan(&session_id));
            }

            MemoryCommand::ReadGlobal { label, reply } => {
                debug!(%label, "actor_loop: ReadGlobal command");
                let _ = reply.send(actor.stored_plan(&label, &Scope::Global));
            }

            MemoryCommand::SavePlan {
                session_id,
                document,
                reply,
            } => {
                debug!(%session_id, "actor_loop: SavePlan command");
                let result = actor.save_plan(&session_id, document);
                if let Err(e) = &result {
                    warn!(%session_id, error = %e, "actor_loop: SavePlan rejected");
                }
                let _ = reply.send(result);
            }

            MemoryCommand::Approve { label, reply } => {
                debug!(%label, "actor_loop: Approve command");
                let _ = reply.send(actor.update_global(&label, PlanStatus::Ready, true));
            }

            MemoryCommand::SetStatus { label, status, reply } => {
                debug!(%label, %status, "actor_loop: SetStatus command");
                let _ = reply.send(actor.update_global(&label, status, false));
            }

            MemoryCommand::AppendNote {
                session_id,
                note,
                reply,
            } => {
                debug!(%session_id, "actor_loop: AppendNote command");
                let _ = reply.send(actor.append_note(&session_id, note));
            }

            MemoryCommand::ReadNotes { session_id, reply } => {
                debug!(%session_id, "actor_loop: ReadNotes command");
                let _ = reply.send(actor.read_notes(&session_id));
            }

            MemoryCommand::Shutdown => {
                info!("MemoryManager shutting down");
                break;
            }
        }
    }

    debug!("MemoryManager actor stopped");
}
