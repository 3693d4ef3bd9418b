use std::{collections::HashSet, sync::Arc};

use anyhow::{anyhow, Context, Result};
use shared::{
    domain::{DragItem, DropTarget, FolderId, FormId},
    protocol::{
        CreateFolderRequest, CreateFormRequest, FolderRecord, FormRecord, UpdateFolderRequest,
        UpdateFormRequest,
    },
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod aggregate;
pub mod projection;
pub mod relocation;
pub mod remote;
pub mod store;

pub use projection::{DashboardProjection, DashboardQuery, DashboardSummary, ProjectedFolder};
pub use relocation::{DragPhase, RelocationOutcome};
pub use remote::{HttpRemoteAuthority, MissingRemoteAuthority, RemoteAuthority};
pub use store::{ItemStore, StoreError};

/// Notifications the interaction layer renders as toasts or log lines.
/// Dropped receivers are fine; emission never blocks the core.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    StoreReloaded {
        form_count: usize,
        folder_count: usize,
    },
    FormsLoadFailed {
        message: String,
    },
    FoldersLoadFailed {
        message: String,
    },
    FormCreated {
        form: FormRecord,
    },
    FormUpdated {
        form: FormRecord,
    },
    FormDeleted {
        form_id: FormId,
    },
    FolderCreated {
        folder: FolderRecord,
    },
    FolderUpdated {
        folder: FolderRecord,
    },
    FolderDeleted {
        folder_id: FolderId,
        unassigned_forms: usize,
    },
    FormRelocated {
        form_id: FormId,
        from: Option<FolderId>,
        to: Option<FolderId>,
    },
    RelocationRolledBack {
        form_id: FormId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// What a session-start load actually managed to fetch. Forms and folders
/// are independently available; the worst case is an empty store, never a
/// crashed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub forms: LoadOutcome,
    pub folders: LoadOutcome,
}

impl LoadReport {
    pub fn failure(&self) -> Option<LoadFailure> {
        match (&self.forms, &self.folders) {
            (LoadOutcome::Failed(forms), LoadOutcome::Failed(folders)) => {
                Some(LoadFailure::Total {
                    forms: forms.clone(),
                    folders: folders.clone(),
                })
            }
            (LoadOutcome::Failed(message), _) => Some(LoadFailure::Forms(message.clone())),
            (_, LoadOutcome::Failed(message)) => Some(LoadFailure::Folders(message.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFailure {
    #[error("forms could not be loaded: {0}")]
    Forms(String),
    #[error("folders could not be loaded: {0}")]
    Folders(String),
    #[error("nothing could be loaded; forms: {forms}; folders: {folders}")]
    Total { forms: String, folders: String },
}

struct DashboardState {
    store: ItemStore,
    drag: DragPhase,
    /// Forms whose relocation is still awaiting the remote authority. A
    /// second drop of the same form while its commit is in flight is
    /// ignored; different forms commit independently.
    inflight_relocations: HashSet<FormId>,
}

/// Client-side engine for the form dashboard: local cache of the remote
/// authority's state, drag-and-drop relocation with optimistic apply and
/// rollback, and pure projections for the rendering layer.
pub struct DashboardClient {
    remote: Arc<dyn RemoteAuthority>,
    inner: Mutex<DashboardState>,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardClient {
    pub fn new(remote: Arc<dyn RemoteAuthority>) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            remote,
            inner: Mutex::new(DashboardState {
                store: ItemStore::new(),
                drag: DragPhase::Idle,
                inflight_relocations: HashSet::new(),
            }),
            events,
        })
    }

    /// A client with no backend; useful for tests and offline inspection.
    pub fn detached() -> Arc<Self> {
        Self::new(Arc::new(MissingRemoteAuthority))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Fetches both collections concurrently and replaces the store with
    /// whatever succeeded. A failed half falls back to empty and surfaces
    /// as an event; the session keeps running either way.
    pub async fn load(&self) -> LoadReport {
        let (forms_result, folders_result) =
            futures::join!(self.remote.list_forms(), self.remote.list_folders());

        let (forms, forms_outcome) = match forms_result {
            Ok(forms) => {
                let outcome = LoadOutcome::Loaded(forms.len());
                (forms, outcome)
            }
            Err(err) => {
                warn!("failed to load forms: {err:#}");
                let message = err.to_string();
                let _ = self.events.send(DashboardEvent::FormsLoadFailed {
                    message: message.clone(),
                });
                (Vec::new(), LoadOutcome::Failed(message))
            }
        };
        let (folders, folders_outcome) = match folders_result {
            Ok(folders) => {
                let outcome = LoadOutcome::Loaded(folders.len());
                (folders, outcome)
            }
            Err(err) => {
                warn!("failed to load folders: {err:#}");
                let message = err.to_string();
                let _ = self.events.send(DashboardEvent::FoldersLoadFailed {
                    message: message.clone(),
                });
                (Vec::new(), LoadOutcome::Failed(message))
            }
        };

        let both_loaded = forms_outcome.is_loaded() && folders_outcome.is_loaded();
        let forms_loaded = forms_outcome.is_loaded();
        {
            let mut guard = self.inner.lock().await;
            guard.store.load(forms, folders);
            guard.drag = DragPhase::Idle;
            guard.inflight_relocations.clear();
            if both_loaded {
                let detached = guard.store.retain_valid_folder_refs();
                if detached > 0 {
                    warn!(detached, "detached forms referencing folders the authority no longer has");
                }
            }
            // Counts are only recomputed when the forms collection is
            // actually known; a failed forms fetch must not zero the
            // server-reported folder counts.
            if forms_loaded {
                aggregate::recompute_all(&mut guard.store);
            }
            info!(
                forms = guard.store.form_count(),
                folders = guard.store.folder_count(),
                "store reloaded"
            );
            let _ = self.events.send(DashboardEvent::StoreReloaded {
                form_count: guard.store.form_count(),
                folder_count: guard.store.folder_count(),
            });
        }

        LoadReport {
            forms: forms_outcome,
            folders: folders_outcome,
        }
    }

    pub async fn create_folder(&self, request: CreateFolderRequest) -> Result<FolderRecord> {
        let folder = self
            .remote
            .create_folder(request)
            .await
            .context("failed to create folder")?;
        {
            let mut guard = self.inner.lock().await;
            guard.store.upsert_folder(folder.clone());
        }
        info!(folder_id = %folder.folder_id, "folder created");
        let _ = self.events.send(DashboardEvent::FolderCreated {
            folder: folder.clone(),
        });
        Ok(folder)
    }

    pub async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: UpdateFolderRequest,
    ) -> Result<FolderRecord> {
        let folder = self
            .remote
            .update_folder(folder_id, request)
            .await
            .with_context(|| format!("failed to update folder {folder_id}"))?;
        {
            let mut guard = self.inner.lock().await;
            guard.store.upsert_folder(folder.clone());
            // The authority may report a drifted count; ours is derived.
            aggregate::recompute(&mut guard.store, std::slice::from_ref(folder_id));
        }
        info!(folder_id = %folder.folder_id, "folder updated");
        let _ = self.events.send(DashboardEvent::FolderUpdated {
            folder: folder.clone(),
        });
        Ok(folder)
    }

    /// Deletes a folder and atomically unassigns whatever it contained, in
    /// one locked transaction: there is no observable state in which a form
    /// references the deleted folder. Returns how many forms were
    /// unassigned.
    pub async fn delete_folder(&self, folder_id: &FolderId) -> Result<usize> {
        self.remote
            .delete_folder(folder_id)
            .await
            .with_context(|| format!("failed to delete folder {folder_id}"))?;
        let unassigned = {
            let mut guard = self.inner.lock().await;
            let contained = guard.store.forms_referencing(folder_id);
            for form_id in &contained {
                if let Err(err) = guard.store.reassign_form_folder(form_id, None) {
                    warn!(form_id = %form_id, "orphan unassign skipped: {err}");
                }
            }
            guard.store.remove_folder(folder_id);
            contained.len()
        };
        info!(folder_id = %folder_id, unassigned, "folder deleted");
        let _ = self.events.send(DashboardEvent::FolderDeleted {
            folder_id: folder_id.clone(),
            unassigned_forms: unassigned,
        });
        Ok(unassigned)
    }

    pub async fn create_form(&self, request: CreateFormRequest) -> Result<FormRecord> {
        let form = self
            .remote
            .create_form(request)
            .await
            .context("failed to create form")?;
        {
            let mut guard = self.inner.lock().await;
            guard.store.upsert_form(form.clone());
            if let Some(folder_id) = form.folder_id.clone() {
                aggregate::recompute(&mut guard.store, &[folder_id]);
            }
        }
        info!(form_id = %form.form_id, "form created");
        let _ = self
            .events
            .send(DashboardEvent::FormCreated { form: form.clone() });
        Ok(form)
    }

    /// General field update, including status transitions and folder
    /// reassignment through the patch payload. Local state changes only
    /// after the authority accepts.
    pub async fn update_form(
        &self,
        form_id: &FormId,
        request: UpdateFormRequest,
    ) -> Result<FormRecord> {
        let form = self
            .remote
            .update_form(form_id, request)
            .await
            .with_context(|| format!("failed to update form {form_id}"))?;
        {
            let mut guard = self.inner.lock().await;
            let mut affected: Vec<FolderId> = guard
                .store
                .form(form_id)
                .and_then(|prior| prior.folder_id.clone())
                .into_iter()
                .collect();
            if let Some(folder_id) = form.folder_id.clone() {
                if !affected.contains(&folder_id) {
                    affected.push(folder_id);
                }
            }
            guard.store.upsert_form(form.clone());
            aggregate::recompute(&mut guard.store, &affected);
        }
        info!(form_id = %form.form_id, "form updated");
        let _ = self
            .events
            .send(DashboardEvent::FormUpdated { form: form.clone() });
        Ok(form)
    }

    pub async fn delete_form(&self, form_id: &FormId) -> Result<()> {
        self.remote
            .delete_form(form_id)
            .await
            .with_context(|| format!("failed to delete form {form_id}"))?;
        {
            let mut guard = self.inner.lock().await;
            let removed = guard.store.remove_form(form_id);
            if let Some(folder_id) = removed.and_then(|form| form.folder_id) {
                aggregate::recompute(&mut guard.store, &[folder_id]);
            }
        }
        info!(form_id = %form_id, "form deleted");
        let _ = self.events.send(DashboardEvent::FormDeleted {
            form_id: form_id.clone(),
        });
        Ok(())
    }

    /// Decodes the drag token once and enters Dragging. A new gesture
    /// supersedes any stale one.
    pub async fn begin_drag(&self, token: &str) -> Result<DragItem> {
        let item =
            DragItem::from_token(token).ok_or_else(|| anyhow!("unrecognized drag token: {token}"))?;
        let mut guard = self.inner.lock().await;
        debug!(token, "drag started");
        guard.drag = DragPhase::Dragging(item.clone());
        Ok(item)
    }

    /// A drag that ends nowhere: back to Idle, no side effects.
    pub async fn cancel_drag(&self) {
        let mut guard = self.inner.lock().await;
        guard.drag = DragPhase::Idle;
    }

    /// Finishes the active drag over `target_token` (`None` means released
    /// outside every target). Applies the optimistic move, confirms it with
    /// the remote authority, and rolls back if the authority declines.
    /// Undefined transitions are silent no-ops.
    pub async fn complete_drag(&self, target_token: Option<&str>) -> RelocationOutcome {
        let target = target_token.and_then(DropTarget::from_token);

        let (form_id, from, to, snapshot) = {
            let mut guard = self.inner.lock().await;
            let item = match std::mem::take(&mut guard.drag) {
                DragPhase::Idle => return RelocationOutcome::Ignored,
                DragPhase::Dragging(item) => item,
            };
            let (form_id, from, to) =
                match relocation::resolve_drop(&guard.store, &item, target.as_ref()) {
                    relocation::RelocationPlan::NoOp => return RelocationOutcome::Ignored,
                    relocation::RelocationPlan::Move { form_id, from, to } => (form_id, from, to),
                };
            if !guard.inflight_relocations.insert(form_id.clone()) {
                debug!(form_id = %form_id, "relocation still committing; overlapping drop ignored");
                return RelocationOutcome::Ignored;
            }
            let snapshot = match relocation::apply_optimistic(
                &mut guard.store,
                &form_id,
                from.as_ref(),
                to.as_ref(),
            ) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    guard.inflight_relocations.remove(&form_id);
                    warn!(form_id = %form_id, "optimistic move refused: {err}");
                    return RelocationOutcome::Ignored;
                }
            };
            (form_id, from, to, snapshot)
        };

        // The lock is not held across the remote call; the dashboard stays
        // interactive while the commit is in flight.
        let result = match &to {
            Some(folder_id) => {
                self.remote
                    .move_forms_to_folder(folder_id, std::slice::from_ref(&form_id))
                    .await
            }
            None => self
                .remote
                .update_form(&form_id, UpdateFormRequest::clear_folder())
                .await
                .map(|_| ()),
        };

        let mut guard = self.inner.lock().await;
        guard.inflight_relocations.remove(&form_id);
        match result {
            Ok(()) => {
                info!(
                    form_id = %form_id,
                    to = to.as_ref().map(|f| f.as_str()).unwrap_or("standalone"),
                    "relocation settled"
                );
                let _ = self.events.send(DashboardEvent::FormRelocated {
                    form_id: form_id.clone(),
                    from: from.clone(),
                    to: to.clone(),
                });
                RelocationOutcome::Settled { form_id, from, to }
            }
            Err(err) => {
                warn!(form_id = %form_id, "relocation rejected by remote authority: {err:#}");
                relocation::roll_back(&mut guard.store, &snapshot);
                let message = err.to_string();
                let _ = self.events.send(DashboardEvent::RelocationRolledBack {
                    form_id: form_id.clone(),
                    message: message.clone(),
                });
                RelocationOutcome::RolledBack { form_id, message }
            }
        }
    }

    pub async fn project(&self, query: &DashboardQuery) -> DashboardProjection {
        let guard = self.inner.lock().await;
        projection::project(&guard.store, query)
    }

    pub async fn forms_in_folder(
        &self,
        query: &DashboardQuery,
        folder_id: &FolderId,
    ) -> Vec<FormRecord> {
        let guard = self.inner.lock().await;
        projection::forms_in_folder(&guard.store, query, folder_id)
    }

    pub async fn summary(&self) -> DashboardSummary {
        let guard = self.inner.lock().await;
        projection::summary(&guard.store)
    }

    /// External share address for a published form.
    pub async fn share_address(&self, form_id: &FormId, origin: &str) -> Option<String> {
        let guard = self.inner.lock().await;
        guard.store.form(form_id)?.share_address(origin)
    }

    /// Cloned view of the store, for drivers and assertions.
    pub async fn snapshot(&self) -> ItemStore {
        let guard = self.inner.lock().await;
        guard.store.clone()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
