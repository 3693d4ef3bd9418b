use std::collections::HashMap;

use shared::domain::FolderId;

use crate::store::ItemStore;

/// Recomputes every folder's cached item count from store contents.
pub fn recompute_all(store: &mut ItemStore) {
    let all: Vec<FolderId> = store.folders().map(|f| f.folder_id.clone()).collect();
    recompute(store, &all);
}

/// Recomputes the cached item count of the given folders: count = number of
/// forms whose folder reference equals the folder's identifier, at the
/// moment of computation. Unknown folder ids are skipped.
pub fn recompute(store: &mut ItemStore, folder_ids: &[FolderId]) {
    if folder_ids.is_empty() {
        return;
    }
    let mut tally: HashMap<&FolderId, u32> = HashMap::new();
    for form in store.forms() {
        if let Some(folder_id) = &form.folder_id {
            *tally.entry(folder_id).or_default() += 1;
        }
    }
    let counts: Vec<(FolderId, u32)> = folder_ids
        .iter()
        .map(|folder_id| (folder_id.clone(), tally.get(folder_id).copied().unwrap_or(0)))
        .collect();
    for (folder_id, count) in counts {
        if let Some(folder) = store.folder_mut(&folder_id) {
            folder.form_count = count;
        }
    }
}

/// Incremental count adjustment used on the relocation hot path. Clamped at
/// zero, matching the dashboard's never-negative display semantics.
pub(crate) fn shift(store: &mut ItemStore, folder_id: &FolderId, delta: i32) {
    if let Some(folder) = store.folder_mut(folder_id) {
        folder.form_count = if delta >= 0 {
            folder.form_count.saturating_add(delta as u32)
        } else {
            folder.form_count.saturating_sub(delta.unsigned_abs())
        };
    }
}

#[cfg(test)]
#[path = "tests/aggregate_tests.rs"]
mod tests;
