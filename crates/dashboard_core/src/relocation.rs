use shared::domain::{DragItem, DropTarget, FolderId, FormId};
use tracing::{debug, warn};

use crate::{aggregate, store::ItemStore};

/// Current drag gesture. There is one pointer, so at most one gesture is
/// active at a time; commits of already-dropped forms overlap freely and
/// are tracked per form by the client's in-flight set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(DragItem),
}

/// Resolved effect of a drop, computed against the store before anything
/// is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RelocationPlan {
    NoOp,
    Move {
        form_id: FormId,
        from: Option<FolderId>,
        to: Option<FolderId>,
    },
}

/// What the pre-drop state looked like, captured so a rejected commit can
/// be undone.
#[derive(Debug, Clone)]
pub(crate) struct RelocationSnapshot {
    pub form_id: FormId,
    pub prior_folder: Option<FolderId>,
    /// Folders whose cached counts the optimistic step touched.
    pub affected: Vec<FolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// The drop resolved to no defined transition; nothing changed.
    Ignored,
    /// The remote authority confirmed the move; local state was already
    /// correct from the optimistic step.
    Settled {
        form_id: FormId,
        from: Option<FolderId>,
        to: Option<FolderId>,
    },
    /// The remote authority rejected the move and the optimistic step was
    /// reverted.
    RolledBack { form_id: FormId, message: String },
}

/// Decides what a release over `target` means for the dragged item. Pure
/// function of (store, drag, target); undefined transitions resolve to
/// `NoOp` rather than errors.
pub(crate) fn resolve_drop(
    store: &ItemStore,
    item: &DragItem,
    target: Option<&DropTarget>,
) -> RelocationPlan {
    let form_id = match item {
        DragItem::Form(form_id) => form_id,
        DragItem::Folder(folder_id) => {
            debug!(folder_id = %folder_id, "folders cannot be dropped into folders; ignoring");
            return RelocationPlan::NoOp;
        }
    };
    let Some(target) = target else {
        return RelocationPlan::NoOp;
    };
    let Some(form) = store.form(form_id) else {
        warn!(form_id = %form_id, "dragged form is not in the store; ignoring drop");
        return RelocationPlan::NoOp;
    };

    let to = match target {
        DropTarget::Folder(folder_id) => {
            if store.folder(folder_id).is_none() {
                warn!(folder_id = %folder_id, "drop target folder is not in the store; ignoring drop");
                return RelocationPlan::NoOp;
            }
            Some(folder_id.clone())
        }
        DropTarget::Unassigned => None,
    };

    // Released on its current location: nothing moved.
    if form.folder_id == to {
        return RelocationPlan::NoOp;
    }

    RelocationPlan::Move {
        form_id: form_id.clone(),
        from: form.folder_id.clone(),
        to,
    }
}

/// Applies the move locally before the remote authority has confirmed it,
/// adjusting both affected folders' cached counts, and returns the
/// snapshot needed to undo it.
pub(crate) fn apply_optimistic(
    store: &mut ItemStore,
    form_id: &FormId,
    from: Option<&FolderId>,
    to: Option<&FolderId>,
) -> Result<RelocationSnapshot, crate::store::StoreError> {
    let prior_folder = store.reassign_form_folder(form_id, to.cloned())?;
    let mut affected = Vec::new();
    if let Some(source) = from {
        aggregate::shift(store, source, -1);
        affected.push(source.clone());
    }
    if let Some(dest) = to {
        aggregate::shift(store, dest, 1);
        affected.push(dest.clone());
    }
    Ok(RelocationSnapshot {
        form_id: form_id.clone(),
        prior_folder,
        affected,
    })
}

/// Restores the pre-drop state after a rejected commit. The prior folder
/// reference is put back (or cleared, if that folder was deleted while the
/// commit was in flight) and the affected counts are recomputed from store
/// contents so interleaved relocations of other forms are not clobbered.
pub(crate) fn roll_back(store: &mut ItemStore, snapshot: &RelocationSnapshot) {
    let prior = snapshot
        .prior_folder
        .clone()
        .filter(|folder_id| store.folder(folder_id).is_some());
    if let Err(err) = store.reassign_form_folder(&snapshot.form_id, prior) {
        warn!(form_id = %snapshot.form_id, "rollback target vanished mid-flight: {err}");
    }
    aggregate::recompute(store, &snapshot.affected);
}

#[cfg(test)]
#[path = "tests/relocation_tests.rs"]
mod tests;
