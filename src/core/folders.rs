//! Sidebar folders: CRUD against the backend plus drag-to-reorder with an
//! optimistic local mirror.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, error};

use crate::api::{BackendError, ChatBackend, ChatSession, Folder, FolderId, FolderOrder};
use crate::core::popup::Popup;

pub const DELETE_FOLDER_CONFIRMATION: &str =
    "Are you sure you want to delete this folder? This action cannot be undone.";

pub const EMPTY_HISTORY_HINT: &str = "Try sending a message! Your chat history will appear here.";

/// Moves the element at `from` to `to`, shifting everything in between.
/// Out-of-range indices leave the slice unchanged.
pub fn array_move<T>(items: &mut [T], from: usize, to: usize) {
    if from >= items.len() || to >= items.len() {
        return;
    }
    if from < to {
        items[from..=to].rotate_left(1);
    } else {
        items[to..=from].rotate_right(1);
    }
}

/// End of a drag gesture. Ids are folder ids as strings; `over` is `None`
/// when the folder was dropped outside the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub active: String,
    pub over: Option<String>,
}

impl DragEnd {
    pub fn new(active: impl Into<String>, over: Option<impl Into<String>>) -> Self {
        Self {
            active: active.into(),
            over: over.map(Into::into),
        }
    }
}

fn position_of(folders: &[Folder], id: &str) -> Option<usize> {
    folders
        .iter()
        .position(|folder| folder.folder_id.to_string() == id)
}

/// Applies a drag to `folders` (in display order). Returns the new order and
/// its priority map, or `None` when the drag changes nothing.
pub fn reorder(folders: &[Folder], event: &DragEnd) -> Option<(Vec<Folder>, FolderOrder)> {
    let over = event.over.as_deref()?;
    if over == event.active {
        return None;
    }
    let from = position_of(folders, &event.active)?;
    let to = position_of(folders, over)?;

    let mut reordered = folders.to_vec();
    array_move(&mut reordered, from, to);
    let order = FolderOrder::from_order(&reordered);
    Some((reordered, order))
}

/// Folders sorted by display priority; missing priorities sort as 0 and ties
/// keep their order.
pub fn sort_by_priority(folders: &mut [Folder]) {
    folders.sort_by_key(|folder| folder.display_priority.unwrap_or(0));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateRange {
    Today,
    Previous7Days,
    Previous30Days,
    Over30Days,
}

impl DateRange {
    pub fn label(self) -> &'static str {
        match self {
            DateRange::Today => "Today",
            DateRange::Previous7Days => "Previous 7 Days",
            DateRange::Previous30Days => "Previous 30 Days",
            DateRange::Over30Days => "Over 30 days",
        }
    }

    pub fn classify(created: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let age_days = (now - created).num_seconds() as f64 / 86_400.0;
        if age_days < 1.0 {
            DateRange::Today
        } else if age_days <= 7.0 {
            DateRange::Previous7Days
        } else if age_days <= 30.0 {
            DateRange::Previous30Days
        } else {
            DateRange::Over30Days
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGroup<'a> {
    pub range: DateRange,
    pub sessions: Vec<&'a ChatSession>,
}

/// Accepts RFC 3339 as well as the backend's naive timestamps, which are UTC.
pub fn parse_session_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|naive| naive.and_utc()))
        .ok()
}

/// Buckets sessions by age. Empty buckets are omitted; sessions with an
/// unreadable timestamp count as old.
pub fn group_sessions_by_date_range<'a>(
    sessions: impl IntoIterator<Item = &'a ChatSession>,
    now: DateTime<Utc>,
) -> Vec<SessionGroup<'a>> {
    let mut groups: Vec<SessionGroup<'a>> = [
        DateRange::Today,
        DateRange::Previous7Days,
        DateRange::Previous30Days,
        DateRange::Over30Days,
    ]
    .into_iter()
    .map(|range| SessionGroup {
        range,
        sessions: Vec::new(),
    })
    .collect();

    for session in sessions {
        let range = parse_session_time(&session.time_created)
            .map_or(DateRange::Over30Days, |created| DateRange::classify(created, now));
        groups[range as usize].sessions.push(session);
    }

    groups.retain(|group| !group.sessions.is_empty());
    groups
}

/// Folder list state for the sidebar.
pub struct FolderPanel<B> {
    backend: B,
    folders: Vec<Folder>,
    chat_sessions: Vec<ChatSession>,
}

impl<B: ChatBackend> FolderPanel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            folders: Vec::new(),
            chat_sessions: Vec::new(),
        }
    }

    pub fn with_folders(backend: B, mut folders: Vec<Folder>) -> Self {
        sort_by_priority(&mut folders);
        Self {
            backend,
            folders,
            chat_sessions: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Folders in display order.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, folder_id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.folder_id == folder_id)
    }

    pub fn set_chat_sessions(&mut self, sessions: Vec<ChatSession>) {
        self.chat_sessions = sessions;
    }

    pub fn chat_sessions(&self) -> &[ChatSession] {
        &self.chat_sessions
    }

    pub fn is_history_empty(&self) -> bool {
        self.chat_sessions.is_empty()
    }

    /// Sessions that are not filed under any folder.
    pub fn chats_not_in_folders(&self) -> Vec<&ChatSession> {
        self.chat_sessions
            .iter()
            .filter(|chat| {
                !self
                    .folders
                    .iter()
                    .any(|folder| folder.chat_sessions.iter().any(|s| s.id == chat.id))
            })
            .collect()
    }

    pub fn grouped_sessions(&self, now: DateTime<Utc>) -> Vec<SessionGroup<'_>> {
        group_sessions_by_date_range(self.chats_not_in_folders(), now)
    }

    /// Replaces the local mirror with the backend's folders. The mirror is
    /// left alone on failure.
    pub async fn refresh_folders(&mut self) -> Result<(), BackendError> {
        match self.backend.list_folders().await {
            Ok(mut folders) => {
                sort_by_priority(&mut folders);
                debug!(count = folders.len(), "Refreshed folders");
                self.folders = folders;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Failed to refresh folders");
                Err(err)
            }
        }
    }

    /// Creates a folder with the name as typed. Blank names are ignored.
    pub async fn create_folder(&mut self, name: &str) -> Option<Popup> {
        if name.trim().is_empty() {
            return None;
        }

        let created = async {
            let folder_id = self.backend.create_folder(name).await?;
            self.refresh_folders().await?;
            Ok::<_, BackendError>(folder_id)
        }
        .await;

        Some(match created {
            Ok(folder_id) => {
                debug!(folder_id, "Created folder");
                Popup::success("Folder created successfully")
            }
            Err(err) => {
                error!(error = %err, "Failed to create folder");
                Popup::error(err.to_string())
            }
        })
    }

    pub async fn rename_folder(&mut self, folder_id: FolderId, name: &str) -> Popup {
        match self.backend.rename_folder(folder_id, name).await {
            Ok(()) => {
                let _ = self.refresh_folders().await;
                Popup::success("Folder updated successfully")
            }
            Err(err) => {
                error!(folder_id, error = %err, "Failed to update folder");
                Popup::error(format!("Failed to update folder: {err}"))
            }
        }
    }

    /// Deletes a folder once `confirm` accepts [`DELETE_FOLDER_CONFIRMATION`].
    /// Declining does nothing and returns `None`.
    pub async fn delete_folder(
        &mut self,
        folder_id: FolderId,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Option<Popup> {
        if !confirm(DELETE_FOLDER_CONFIRMATION) {
            return None;
        }

        Some(match self.backend.delete_folder(folder_id).await {
            Ok(()) => {
                self.folders.retain(|folder| folder.folder_id != folder_id);
                let _ = self.refresh_folders().await;
                Popup::success("Folder deleted successfully")
            }
            Err(err) => {
                error!(folder_id, error = %err, "Failed to delete folder");
                Popup::error(format!("Failed to delete folder: {err}"))
            }
        })
    }

    /// Files a chat under a folder. Folders are refreshed whatever the
    /// outcome.
    pub async fn add_chat_to_folder(&mut self, folder_id: FolderId, chat_session_id: &str) -> Popup {
        let popup = match self.backend.add_chat_to_folder(folder_id, chat_session_id).await {
            Ok(()) => Popup::success("Chat added to folder successfully"),
            Err(err) => {
                error!(folder_id, chat_session_id, error = %err, "Failed to add chat to folder");
                Popup::error(format!("Failed to add chat to folder: {err}"))
            }
        };
        let _ = self.refresh_folders().await;
        popup
    }

    /// Applies a drag immediately, then persists the new priorities. If the
    /// backend rejects them the previous order is restored and an error
    /// popup is returned.
    pub async fn handle_drag_end(&mut self, event: &DragEnd) -> Option<Popup> {
        let (mut reordered, order) = reorder(&self.folders, event)?;
        for folder in &mut reordered {
            folder.display_priority = order.priority(folder.folder_id).map(|rank| rank as i64);
        }
        let previous = std::mem::replace(&mut self.folders, reordered);

        match self.backend.update_display_priorities(&order).await {
            Ok(()) => {
                debug!(folders = order.len(), "Saved folder order");
                None
            }
            Err(err) => {
                error!(error = %err, "Failed to save folder order");
                self.folders = previous;
                Some(Popup::error(format!("Failed to reorder folders: {err}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FeedbackRequest, Notification, User};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    fn folder(id: FolderId, priority: Option<i64>) -> Folder {
        Folder {
            folder_id: id,
            folder_name: format!("F{id}"),
            display_priority: priority,
            chat_sessions: Vec::new(),
        }
    }

    fn session(id: &str, time_created: &str) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            name: format!("Chat {id}"),
            time_created: time_created.to_string(),
            folder_id: None,
        }
    }

    fn failure(message: &str) -> BackendError {
        BackendError::Status {
            status: 500,
            message: message.to_string(),
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        folders: Mutex<Vec<Folder>>,
        saved_orders: Mutex<Vec<FolderOrder>>,
        fail_with: Option<&'static str>,
    }

    impl FakeBackend {
        fn with_folders(folders: Vec<Folder>) -> Self {
            Self {
                folders: Mutex::new(folders),
                ..Self::default()
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                fail_with: Some(message),
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), BackendError> {
            self.fail_with.map_or(Ok(()), |message| Err(failure(message)))
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn list_folders(&self) -> Result<Vec<Folder>, BackendError> {
            Ok(self.folders.lock().unwrap().clone())
        }

        async fn create_folder(&self, name: &str) -> Result<FolderId, BackendError> {
            self.check()?;
            let mut folders = self.folders.lock().unwrap();
            let id = folders.len() as FolderId + 1;
            folders.push(Folder {
                folder_name: name.to_string(),
                ..folder(id, None)
            });
            Ok(id)
        }

        async fn rename_folder(&self, folder_id: FolderId, name: &str) -> Result<(), BackendError> {
            self.check()?;
            for folder in self.folders.lock().unwrap().iter_mut() {
                if folder.folder_id == folder_id {
                    folder.folder_name = name.to_string();
                }
            }
            Ok(())
        }

        async fn delete_folder(&self, folder_id: FolderId) -> Result<(), BackendError> {
            self.check()?;
            self.folders
                .lock()
                .unwrap()
                .retain(|folder| folder.folder_id != folder_id);
            Ok(())
        }

        async fn add_chat_to_folder(
            &self,
            folder_id: FolderId,
            chat_session_id: &str,
        ) -> Result<(), BackendError> {
            self.check()?;
            for folder in self.folders.lock().unwrap().iter_mut() {
                if folder.folder_id == folder_id {
                    folder.chat_sessions.push(session(chat_session_id, "2024-01-01T00:00:00"));
                }
            }
            Ok(())
        }

        async fn update_display_priorities(&self, order: &FolderOrder) -> Result<(), BackendError> {
            self.check()?;
            self.saved_orders.lock().unwrap().push(order.clone());
            Ok(())
        }

        async fn list_notifications(&self) -> Result<Vec<Notification>, BackendError> {
            Ok(Vec::new())
        }

        async fn dismiss_notification(&self, _notification_id: i64) -> Result<(), BackendError> {
            Ok(())
        }

        async fn current_user(&self) -> Result<Option<User>, BackendError> {
            Ok(None)
        }

        async fn submit_feedback(&self, _feedback: &FeedbackRequest) -> Result<(), BackendError> {
            Ok(())
        }

        async fn logout(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn array_move_shifts_neighbours() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        array_move(&mut items, 2, 0);
        assert_eq!(items, vec!['c', 'a', 'b', 'd']);
        array_move(&mut items, 0, 3);
        assert_eq!(items, vec!['a', 'b', 'd', 'c']);
        array_move(&mut items, 1, 9);
        assert_eq!(items, vec!['a', 'b', 'd', 'c']);
    }

    #[test]
    fn moving_third_folder_to_front_ranks_all_four() {
        let folders: Vec<Folder> = (0..4).map(|id| folder(id, Some(id))).collect();
        let (reordered, order) = reorder(&folders, &DragEnd::new("2", Some("0"))).unwrap();

        let ids: Vec<FolderId> = reordered.iter().map(|f| f.folder_id).collect();
        assert_eq!(ids, vec![2, 0, 1, 3]);
        assert_eq!(
            order,
            FolderOrder([(2, 0), (0, 1), (1, 2), (3, 3)].into_iter().collect())
        );
    }

    #[test]
    fn drags_without_effect_are_ignored() {
        let folders: Vec<Folder> = (0..3).map(|id| folder(id, None)).collect();
        assert!(reorder(&folders, &DragEnd::new("1", None::<String>)).is_none());
        assert!(reorder(&folders, &DragEnd::new("1", Some("1"))).is_none());
        assert!(reorder(&folders, &DragEnd::new("1", Some("42"))).is_none());
    }

    #[test]
    fn missing_priorities_sort_as_zero_and_stay_stable() {
        let mut folders = vec![folder(1, Some(2)), folder(2, None), folder(3, Some(0)), folder(4, Some(1))];
        sort_by_priority(&mut folders);
        let ids: Vec<FolderId> = folders.iter().map(|f| f.folder_id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn sessions_group_by_age_and_skip_empty_ranges() {
        let now = DateTime::parse_from_rfc3339("2024-06-30T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let sessions = vec![
            session("a", "2024-06-30T08:00:00Z"),
            session("b", "2024-06-25T12:00:00"),
            session("c", "2024-01-01T00:00:00.123456"),
            session("d", "not a date"),
        ];

        let groups = group_sessions_by_date_range(&sessions, now);
        let summary: Vec<(&str, Vec<&str>)> = groups
            .iter()
            .map(|g| (g.range.label(), g.sessions.iter().map(|s| s.id.as_str()).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Today", vec!["a"]),
                ("Previous 7 Days", vec!["b"]),
                ("Over 30 days", vec!["c", "d"]),
            ]
        );
    }

    #[test]
    fn boundaries_are_inclusive_for_seven_and_thirty_days() {
        let now = Utc::now();
        assert_eq!(DateRange::classify(now - Duration::days(7), now), DateRange::Previous7Days);
        assert_eq!(DateRange::classify(now - Duration::days(30), now), DateRange::Previous30Days);
        assert_eq!(DateRange::classify(now + Duration::hours(1), now), DateRange::Today);
    }

    #[test]
    fn chats_already_in_folders_are_not_listed_again() {
        let mut filed = folder(1, None);
        filed.chat_sessions.push(session("in-folder", "2024-01-01T00:00:00"));
        let mut panel = FolderPanel::with_folders(FakeBackend::default(), vec![filed]);
        panel.set_chat_sessions(vec![
            session("in-folder", "2024-01-01T00:00:00"),
            session("loose", "2024-01-01T00:00:00"),
        ]);

        let loose: Vec<&str> = panel.chats_not_in_folders().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(loose, vec!["loose"]);
    }

    #[tokio::test]
    async fn drag_end_is_optimistic_and_persisted() {
        let folders: Vec<Folder> = (0..4).map(|id| folder(id, Some(id))).collect();
        let mut panel = FolderPanel::with_folders(FakeBackend::default(), folders);

        assert_eq!(panel.handle_drag_end(&DragEnd::new("2", Some("0"))).await, None);
        let ids: Vec<FolderId> = panel.folders().iter().map(|f| f.folder_id).collect();
        assert_eq!(ids, vec![2, 0, 1, 3]);
        assert_eq!(panel.folders()[0].display_priority, Some(0));
        assert_eq!(panel.backend().saved_orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_reorder_is_rolled_back() {
        let folders: Vec<Folder> = (0..3).map(|id| folder(id, Some(id))).collect();
        let mut panel = FolderPanel::with_folders(FakeBackend::failing("locked"), folders.clone());

        let popup = panel.handle_drag_end(&DragEnd::new("0", Some("2"))).await.unwrap();
        assert!(popup.is_error());
        assert_eq!(popup.message, "Failed to reorder folders: locked");
        assert_eq!(panel.folders(), folders.as_slice());
    }

    #[tokio::test]
    async fn create_folder_reports_and_refreshes() {
        let mut panel = FolderPanel::new(FakeBackend::default());
        assert_eq!(panel.create_folder("   ").await, None);

        let popup = panel.create_folder("Research").await.unwrap();
        assert_eq!(popup, Popup::success("Folder created successfully"));
        assert_eq!(panel.folders()[0].folder_name, "Research");

        let mut failing = FolderPanel::new(FakeBackend::failing("Folder name already exists"));
        let popup = failing.create_folder("Research").await.unwrap();
        assert_eq!(popup, Popup::error("Folder name already exists"));
    }

    #[tokio::test]
    async fn rename_and_add_chat_messages() {
        let mut panel = FolderPanel::new(FakeBackend::with_folders(vec![folder(1, None)]));
        panel.refresh_folders().await.unwrap();

        let popup = panel.rename_folder(1, "Renamed").await;
        assert_eq!(popup, Popup::success("Folder updated successfully"));
        assert_eq!(panel.folders()[0].folder_name, "Renamed");

        let popup = panel.add_chat_to_folder(1, "chat-9").await;
        assert_eq!(popup, Popup::success("Chat added to folder successfully"));
        assert_eq!(panel.folders()[0].chat_sessions[0].id, "chat-9");

        let mut failing = FolderPanel::new(FakeBackend::failing("not found"));
        assert_eq!(
            failing.rename_folder(1, "x").await,
            Popup::error("Failed to update folder: not found")
        );
        assert_eq!(
            failing.add_chat_to_folder(1, "chat-9").await,
            Popup::error("Failed to add chat to folder: not found")
        );
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let mut panel = FolderPanel::new(FakeBackend::with_folders(vec![folder(1, None)]));
        panel.refresh_folders().await.unwrap();

        let mut asked = String::new();
        let declined = panel
            .delete_folder(1, |question| {
                asked = question.to_string();
                false
            })
            .await;
        assert_eq!(declined, None);
        assert_eq!(asked, DELETE_FOLDER_CONFIRMATION);
        assert_eq!(panel.folders().len(), 1);

        let popup = panel.delete_folder(1, |_| true).await;
        assert_eq!(popup, Some(Popup::success("Folder deleted successfully")));
        assert!(panel.folders().is_empty());

        let mut failing = FolderPanel::new(FakeBackend::failing("forbidden"));
        assert_eq!(
            failing.delete_folder(1, |_| true).await,
            Some(Popup::error("Failed to delete folder: forbidden"))
        );
    }
}
