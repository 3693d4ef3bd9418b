use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FolderId, FormId, FormStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    #[serde(rename = "id")]
    pub form_id: FormId,
    pub title: String,
    pub description: String,
    pub responses: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub status: FormStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

impl FormRecord {
    /// External share address, available only for published forms that the
    /// remote authority issued a token for.
    pub fn share_address(&self, origin: &str) -> Option<String> {
        if self.status != FormStatus::Published {
            return None;
        }
        let token = self.share_token.as_deref()?;
        Some(format!("{}/form/{token}", origin.trim_end_matches('/')))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(rename = "id")]
    pub folder_id: FolderId,
    pub name: String,
    pub description: String,
    pub color: String,
    pub form_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub description: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFolderRequest {
    pub name: String,
    pub description: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    pub description: String,
    pub status: FormStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

/// Patch-style form update. `folder_id` is tri-state: absent leaves the
/// reference alone, `Some(None)` serializes as an explicit null and clears
/// it, `Some(Some(id))` reassigns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFormRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FormStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Option<FolderId>>,
}

impl UpdateFormRequest {
    pub fn clear_folder() -> Self {
        Self {
            folder_id: Some(None),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFormsRequest {
    pub form_ids: Vec<FormId>,
}
