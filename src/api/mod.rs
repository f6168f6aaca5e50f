use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod backend;
pub mod error;

pub use backend::{ChatBackend, HttpBackend};
pub use error::BackendError;

pub type FolderId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub time_created: String,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub folder_id: FolderId,
    pub folder_name: String,
    #[serde(default)]
    pub display_priority: Option<i64>,
    #[serde(default)]
    pub chat_sessions: Vec<ChatSession>,
}

#[derive(Deserialize)]
pub struct FoldersResponse {
    pub folders: Vec<Folder>,
}

#[derive(Serialize)]
pub struct FolderNameRequest<'a> {
    pub folder_name: &'a str,
}

#[derive(Serialize)]
pub struct AddChatToFolderRequest<'a> {
    pub chat_session_id: &'a str,
}

/// Folder id to display priority (0-based rank), as persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderOrder(pub BTreeMap<FolderId, usize>);

impl FolderOrder {
    /// Ranks folders by their position in `order`.
    pub fn from_order<'a>(order: impl IntoIterator<Item = &'a Folder>) -> Self {
        Self(
            order
                .into_iter()
                .enumerate()
                .map(|(rank, folder)| (folder.folder_id, rank))
                .collect(),
        )
    }

    pub fn priority(&self, folder_id: FolderId) -> Option<usize> {
        self.0.get(&folder_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Serialize)]
pub struct ReorderFoldersRequest<'a> {
    pub display_priority_map: &'a FolderOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub notif_type: String,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub first_shown: Option<String>,
    #[serde(default)]
    pub last_shown: Option<String>,
    #[serde(default)]
    pub additional_data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Basic,
    Admin,
    Curator,
    GlobalCurator,
    Limited,
    SlackUser,
    ExtPermUser,
    #[serde(other)]
    Other,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        self == UserRole::Admin
    }

    pub fn is_curator(self) -> bool {
        matches!(self, UserRole::Curator | UserRole::GlobalCurator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub role: UserRole,
}

/// Extra menu links configured by the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub link: String,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub svg_logo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Like,
    Dislike,
}

impl FeedbackType {
    pub fn is_positive(self) -> bool {
        self == FeedbackType::Like
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRequest {
    pub chat_message_id: i64,
    pub is_positive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predefined_feedback: Option<String>,
}

impl FeedbackRequest {
    pub fn new(chat_message_id: i64, feedback: FeedbackType) -> Self {
        Self {
            chat_message_id,
            is_positive: feedback.is_positive(),
            feedback_text: None,
            predefined_feedback: None,
        }
    }

    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.feedback_text = text.filter(|t| !t.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub document_id: String,
    pub semantic_identifier: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub blurb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestionDetail {
    pub level: u32,
    pub level_question_num: u32,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallMetadata {
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: Value,
}
