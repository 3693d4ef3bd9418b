use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{FolderId, FormId},
    error::{ApiError, ApiException},
    protocol::{
        CreateFolderRequest, CreateFormRequest, FolderRecord, FormRecord, MoveFormsRequest,
        UpdateFolderRequest, UpdateFormRequest,
    },
};

/// Boundary contract to the system of record for forms and folders. Every
/// call may fail; failures propagate as results the caller interprets and
/// never crash the core.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    async fn list_forms(&self) -> Result<Vec<FormRecord>>;
    async fn list_folders(&self) -> Result<Vec<FolderRecord>>;
    async fn create_form(&self, request: CreateFormRequest) -> Result<FormRecord>;
    async fn update_form(&self, form_id: &FormId, request: UpdateFormRequest)
        -> Result<FormRecord>;
    async fn delete_form(&self, form_id: &FormId) -> Result<()>;
    async fn create_folder(&self, request: CreateFolderRequest) -> Result<FolderRecord>;
    async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: UpdateFolderRequest,
    ) -> Result<FolderRecord>;
    async fn delete_folder(&self, folder_id: &FolderId) -> Result<()>;
    async fn move_forms_to_folder(&self, folder_id: &FolderId, form_ids: &[FormId]) -> Result<()>;
}

/// Stub for running the core without a backend; every call fails with a
/// descriptive error.
pub struct MissingRemoteAuthority;

#[async_trait]
impl RemoteAuthority for MissingRemoteAuthority {
    async fn list_forms(&self) -> Result<Vec<FormRecord>> {
        Err(anyhow!("remote authority is unavailable"))
    }

    async fn list_folders(&self) -> Result<Vec<FolderRecord>> {
        Err(anyhow!("remote authority is unavailable"))
    }

    async fn create_form(&self, _request: CreateFormRequest) -> Result<FormRecord> {
        Err(anyhow!("remote authority is unavailable"))
    }

    async fn update_form(
        &self,
        form_id: &FormId,
        _request: UpdateFormRequest,
    ) -> Result<FormRecord> {
        Err(anyhow!("remote authority is unavailable for form {form_id}"))
    }

    async fn delete_form(&self, form_id: &FormId) -> Result<()> {
        Err(anyhow!("remote authority is unavailable for form {form_id}"))
    }

    async fn create_folder(&self, _request: CreateFolderRequest) -> Result<FolderRecord> {
        Err(anyhow!("remote authority is unavailable"))
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        _request: UpdateFolderRequest,
    ) -> Result<FolderRecord> {
        Err(anyhow!(
            "remote authority is unavailable for folder {folder_id}"
        ))
    }

    async fn delete_folder(&self, folder_id: &FolderId) -> Result<()> {
        Err(anyhow!(
            "remote authority is unavailable for folder {folder_id}"
        ))
    }

    async fn move_forms_to_folder(&self, folder_id: &FolderId, _form_ids: &[FormId]) -> Result<()> {
        Err(anyhow!(
            "remote authority is unavailable for folder {folder_id}"
        ))
    }
}

/// HTTP adapter against the dashboard service.
pub struct HttpRemoteAuthority {
    http: Client,
    base_url: String,
}

impl HttpRemoteAuthority {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

/// Rejections carry the service's error body when it has one; a bare
/// status code otherwise.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ApiError>().await {
        Ok(api_error) => Err(ApiException::new(api_error.code, api_error.message).into()),
        Err(_) => Err(anyhow!("request failed with status {status}")),
    }
}

#[async_trait]
impl RemoteAuthority for HttpRemoteAuthority {
    async fn list_forms(&self) -> Result<Vec<FormRecord>> {
        let response = self
            .http
            .get(format!("{}/forms", self.base_url))
            .send()
            .await?;
        let forms = check_status(response).await?.json().await?;
        Ok(forms)
    }

    async fn list_folders(&self) -> Result<Vec<FolderRecord>> {
        let response = self
            .http
            .get(format!("{}/folders", self.base_url))
            .send()
            .await?;
        let folders = check_status(response).await?.json().await?;
        Ok(folders)
    }

    async fn create_form(&self, request: CreateFormRequest) -> Result<FormRecord> {
        let response = self
            .http
            .post(format!("{}/forms", self.base_url))
            .json(&request)
            .send()
            .await?;
        let form = check_status(response).await?.json().await?;
        Ok(form)
    }

    async fn update_form(
        &self,
        form_id: &FormId,
        request: UpdateFormRequest,
    ) -> Result<FormRecord> {
        let response = self
            .http
            .put(format!("{}/forms/{form_id}", self.base_url))
            .json(&request)
            .send()
            .await?;
        let form = check_status(response).await?.json().await?;
        Ok(form)
    }

    async fn delete_form(&self, form_id: &FormId) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/forms/{form_id}", self.base_url))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn create_folder(&self, request: CreateFolderRequest) -> Result<FolderRecord> {
        let response = self
            .http
            .post(format!("{}/folders", self.base_url))
            .json(&request)
            .send()
            .await?;
        let folder = check_status(response).await?.json().await?;
        Ok(folder)
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: UpdateFolderRequest,
    ) -> Result<FolderRecord> {
        let response = self
            .http
            .put(format!("{}/folders/{folder_id}", self.base_url))
            .json(&request)
            .send()
            .await?;
        let folder = check_status(response).await?.json().await?;
        Ok(folder)
    }

    async fn delete_folder(&self, folder_id: &FolderId) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/folders/{folder_id}", self.base_url))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn move_forms_to_folder(&self, folder_id: &FolderId, form_ids: &[FormId]) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/folders/{folder_id}/move-forms", self.base_url))
            .json(&MoveFormsRequest {
                form_ids: form_ids.to_vec(),
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
