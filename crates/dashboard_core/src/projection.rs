use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared::{
    domain::{FolderId, FormStatus, StatusFilter},
    protocol::{FolderRecord, FormRecord},
};

use crate::store::ItemStore;

/// Transient view state supplied by the interaction layer. Passed in
/// explicitly so projections stay pure functions of (store, query).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub search_text: String,
    pub status_filter: StatusFilter,
    pub open_folders: HashSet<FolderId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedFolder {
    pub folder: FolderRecord,
    pub is_open: bool,
    /// The folder's contents under the active search and status filter;
    /// what the header count and the expanded body show.
    pub forms: Vec<FormRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardProjection {
    pub unassigned_forms: Vec<FormRecord>,
    pub folders: Vec<ProjectedFolder>,
    pub summary: DashboardSummary,
}

/// Global dashboard statistics, computed over the unfiltered store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_forms: usize,
    pub total_responses: u64,
    pub total_views: u64,
    pub published_forms: usize,
}

/// Derives the rendered view from the store and the query. Stateless and
/// idempotent: identical inputs yield identical output, and nothing is
/// mutated.
pub fn project(store: &ItemStore, query: &DashboardQuery) -> DashboardProjection {
    let mut unassigned_forms: Vec<FormRecord> = store
        .forms()
        .filter(|form| form.folder_id.is_none() && form_matches(form, query))
        .cloned()
        .collect();
    sort_forms(&mut unassigned_forms);

    let mut folders: Vec<ProjectedFolder> = store
        .folders()
        .filter(|folder| folder_matches(folder, &query.search_text))
        .map(|folder| ProjectedFolder {
            folder: folder.clone(),
            is_open: query.open_folders.contains(&folder.folder_id),
            forms: forms_in_folder(store, query, &folder.folder_id),
        })
        .collect();
    folders.sort_by(|a, b| {
        b.folder
            .created_at
            .cmp(&a.folder.created_at)
            .then_with(|| a.folder.folder_id.0.cmp(&b.folder.folder_id.0))
    });

    DashboardProjection {
        unassigned_forms,
        folders,
        summary: summary(store),
    }
}

/// The forms shown inside one folder, under the same search/status
/// predicate as the unassigned area.
pub fn forms_in_folder(
    store: &ItemStore,
    query: &DashboardQuery,
    folder_id: &FolderId,
) -> Vec<FormRecord> {
    let mut forms: Vec<FormRecord> = store
        .forms()
        .filter(|form| form.folder_id.as_ref() == Some(folder_id) && form_matches(form, query))
        .cloned()
        .collect();
    sort_forms(&mut forms);
    forms
}

pub fn summary(store: &ItemStore) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total_forms: store.form_count(),
        ..DashboardSummary::default()
    };
    for form in store.forms() {
        summary.total_responses += form.responses;
        summary.total_views += form.views;
        if form.status == FormStatus::Published {
            summary.published_forms += 1;
        }
    }
    summary
}

fn form_matches(form: &FormRecord, query: &DashboardQuery) -> bool {
    query.status_filter.matches(form.status)
        && matches_search(&query.search_text, &form.title, &form.description)
}

/// Folders match on their own name/description only; form status never
/// hides a folder.
fn folder_matches(folder: &FolderRecord, search_text: &str) -> bool {
    matches_search(search_text, &folder.name, &folder.description)
}

fn matches_search(search_text: &str, title: &str, description: &str) -> bool {
    if search_text.is_empty() {
        return true;
    }
    let needle = search_text.to_lowercase();
    title.to_lowercase().contains(&needle) || description.to_lowercase().contains(&needle)
}

/// Newest first, id as tie-break, so repeated projections of an unchanged
/// store are identical.
fn sort_forms(forms: &mut [FormRecord]) {
    forms.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.form_id.0.cmp(&b.form_id.0))
    });
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
