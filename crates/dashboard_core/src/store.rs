use std::collections::HashMap;

use shared::{
    domain::{FolderId, FormId, FormStatus},
    protocol::{FolderRecord, FormRecord},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown form {0}")]
    UnknownForm(FormId),
    #[error("unknown folder {0}")]
    UnknownFolder(FolderId),
}

/// In-memory model of everything the dashboard knows about. Pure data:
/// no I/O happens here, and every mutation is synchronous.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    forms: HashMap<FormId, FormRecord>,
    folders: HashMap<FolderId, FolderRecord>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the full contents of both collections. Forms and folders are
    /// independently available resources; a caller that failed to fetch one
    /// half passes an empty collection for it and the other half still
    /// renders.
    pub fn load(&mut self, forms: Vec<FormRecord>, folders: Vec<FolderRecord>) {
        self.folders = folders
            .into_iter()
            .map(|folder| (folder.folder_id.clone(), folder))
            .collect();
        self.forms = forms
            .into_iter()
            .map(|form| (form.form_id.clone(), normalize_share_token(form)))
            .collect();
    }

    pub fn upsert_form(&mut self, form: FormRecord) {
        let form = normalize_share_token(form);
        self.forms.insert(form.form_id.clone(), form);
    }

    pub fn upsert_folder(&mut self, folder: FolderRecord) {
        self.folders.insert(folder.folder_id.clone(), folder);
    }

    pub fn remove_form(&mut self, form_id: &FormId) -> Option<FormRecord> {
        self.forms.remove(form_id)
    }

    /// Removes a folder without touching the forms that reference it.
    /// Cascading (unassigning contained forms) is the caller's transaction.
    pub fn remove_folder(&mut self, folder_id: &FolderId) -> Option<FolderRecord> {
        self.folders.remove(folder_id)
    }

    /// The single mutation point for all folder moves. Validates that the
    /// target folder exists so a committed move can never leave a dangling
    /// reference. Returns the prior reference for snapshotting.
    pub fn reassign_form_folder(
        &mut self,
        form_id: &FormId,
        folder_id: Option<FolderId>,
    ) -> Result<Option<FolderId>, StoreError> {
        if let Some(target) = &folder_id {
            if !self.folders.contains_key(target) {
                return Err(StoreError::UnknownFolder(target.clone()));
            }
        }
        let form = self
            .forms
            .get_mut(form_id)
            .ok_or_else(|| StoreError::UnknownForm(form_id.clone()))?;
        Ok(std::mem::replace(&mut form.folder_id, folder_id))
    }

    /// Clears folder references that do not resolve to a loaded folder.
    /// Returns how many forms were detached. Only meaningful when both
    /// collections are known to be complete.
    pub fn retain_valid_folder_refs(&mut self) -> usize {
        let mut detached = 0;
        for form in self.forms.values_mut() {
            let dangling = form
                .folder_id
                .as_ref()
                .is_some_and(|folder_id| !self.folders.contains_key(folder_id));
            if dangling {
                form.folder_id = None;
                detached += 1;
            }
        }
        detached
    }

    pub fn form(&self, form_id: &FormId) -> Option<&FormRecord> {
        self.forms.get(form_id)
    }

    pub fn folder(&self, folder_id: &FolderId) -> Option<&FolderRecord> {
        self.folders.get(folder_id)
    }

    pub(crate) fn folder_mut(&mut self, folder_id: &FolderId) -> Option<&mut FolderRecord> {
        self.folders.get_mut(folder_id)
    }

    pub fn forms(&self) -> impl Iterator<Item = &FormRecord> {
        self.forms.values()
    }

    pub fn folders(&self) -> impl Iterator<Item = &FolderRecord> {
        self.folders.values()
    }

    pub fn form_count(&self) -> usize {
        self.forms.len()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn forms_referencing(&self, folder_id: &FolderId) -> Vec<FormId> {
        self.forms
            .values()
            .filter(|form| form.folder_id.as_ref() == Some(folder_id))
            .map(|form| form.form_id.clone())
            .collect()
    }
}

/// A share token exists iff the form is published. The remote authority
/// owns the token; dropping it on non-published records is the one
/// enforcement point the client has.
fn normalize_share_token(mut form: FormRecord) -> FormRecord {
    if form.status != FormStatus::Published {
        form.share_token = None;
    }
    form
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
