/// A transient notice shown after a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub message: String,
    pub kind: PopupKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    Success,
    Error,
}

impl Popup {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PopupKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PopupKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == PopupKind::Error
    }
}
