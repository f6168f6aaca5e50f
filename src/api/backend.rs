//! The seam between the view models and the chat backend.
//!
//! Components only ever talk to [`ChatBackend`]; [`HttpBackend`] is the
//! production implementation over the backend's JSON endpoints.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    AddChatToFolderRequest, BackendError, FeedbackRequest, Folder, FolderId, FolderNameRequest,
    FolderOrder, FoldersResponse, Notification, ReorderFoldersRequest, User,
};
use crate::core::config::Settings;
use crate::utils::url::construct_api_url;

#[async_trait]
/// Backend operations consumed by the folder panel, the account menu, and the
/// answer feedback controls.
pub trait ChatBackend: Send + Sync {
    async fn list_folders(&self) -> Result<Vec<Folder>, BackendError>;

    async fn create_folder(&self, name: &str) -> Result<FolderId, BackendError>;

    async fn rename_folder(&self, folder_id: FolderId, name: &str) -> Result<(), BackendError>;

    async fn delete_folder(&self, folder_id: FolderId) -> Result<(), BackendError>;

    async fn add_chat_to_folder(
        &self,
        folder_id: FolderId,
        chat_session_id: &str,
    ) -> Result<(), BackendError>;

    async fn update_display_priorities(&self, order: &FolderOrder) -> Result<(), BackendError>;

    async fn list_notifications(&self) -> Result<Vec<Notification>, BackendError>;

    async fn dismiss_notification(&self, notification_id: i64) -> Result<(), BackendError>;

    /// Returns `None` when the backend reports no authenticated user.
    async fn current_user(&self) -> Result<Option<User>, BackendError>;

    async fn submit_feedback(&self, feedback: &FeedbackRequest) -> Result<(), BackendError>;

    async fn logout(&self) -> Result<(), BackendError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.backend_url.clone(), settings.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = construct_api_url(&self.base_url, endpoint);
        let request = self.client.request(method, url);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "backend response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn list_folders(&self) -> Result<Vec<Folder>, BackendError> {
        let response: FoldersResponse = self
            .send_json(self.request(Method::GET, "api/folder"))
            .await?;
        Ok(response.folders)
    }

    async fn create_folder(&self, name: &str) -> Result<FolderId, BackendError> {
        let request = self
            .request(Method::POST, "api/folder")
            .json(&FolderNameRequest { folder_name: name });
        self.send_json(request).await
    }

    async fn rename_folder(&self, folder_id: FolderId, name: &str) -> Result<(), BackendError> {
        let request = self
            .request(Method::PATCH, &format!("api/folder/{folder_id}"))
            .json(&FolderNameRequest { folder_name: name });
        self.send(request).await.map(drop)
    }

    async fn delete_folder(&self, folder_id: FolderId) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("api/folder/{folder_id}"));
        self.send(request).await.map(drop)
    }

    async fn add_chat_to_folder(
        &self,
        folder_id: FolderId,
        chat_session_id: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .request(
                Method::POST,
                &format!("api/folder/{folder_id}/add-chat-session"),
            )
            .json(&AddChatToFolderRequest { chat_session_id });
        self.send(request).await.map(drop)
    }

    async fn update_display_priorities(&self, order: &FolderOrder) -> Result<(), BackendError> {
        let request = self
            .request(Method::PUT, "api/folder/reorder")
            .json(&ReorderFoldersRequest {
                display_priority_map: order,
            });
        self.send(request).await.map(drop)
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, BackendError> {
        self.send_json(self.request(Method::GET, "api/notifications"))
            .await
    }

    async fn dismiss_notification(&self, notification_id: i64) -> Result<(), BackendError> {
        let request = self.request(
            Method::POST,
            &format!("api/notifications/{notification_id}/dismiss"),
        );
        self.send(request).await.map(drop)
    }

    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        match self.send_json(self.request(Method::GET, "api/me")).await {
            Ok(user) => Ok(Some(user)),
            Err(err)
                if matches!(
                    err.status().and_then(|s| StatusCode::from_u16(s).ok()),
                    Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn submit_feedback(&self, feedback: &FeedbackRequest) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "api/chat/create-chat-message-feedback")
            .json(feedback);
        self.send(request).await.map(drop)
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.send(self.request(Method::POST, "api/auth/logout"))
            .await
            .map(drop)
    }
}
