use std::fmt;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the handlers
/// can decide between a specific user message, a generic one, or a log line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("platform error: {0}")]
    Platform(PlatformError),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn platform_kind(&self) -> Option<PlatformErrorKind> {
        match self {
            Error::Platform(p) => Some(p.kind),
            _ => None,
        }
    }

    pub fn is_target_admin(&self) -> bool {
        self.platform_kind() == Some(PlatformErrorKind::TargetIsAdmin)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failed Bot API call, with its description already classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build from a Bot API error description.
    pub fn from_description(description: impl Into<String>) -> Self {
        let message = description.into();
        Self {
            kind: PlatformErrorKind::classify(&message),
            message,
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl From<PlatformError> for Error {
    fn from(e: PlatformError) -> Self {
        Error::Platform(e)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// The target member is an administrator or the owner of the chat.
    TargetIsAdmin,
    /// The bot itself lacks the right needed for the call.
    NotEnoughRights,
    /// The message to act on no longer exists.
    MessageNotFound,
    Timeout,
    Network,
    Other,
}

impl PlatformErrorKind {
    /// Classify a Bot API error description.
    ///
    /// Telegram only exposes these conditions through the description text
    /// of a `400 Bad Request`. Known cases:
    ///
    /// - `not enough rights to ...`, `CHAT_ADMIN_REQUIRED`,
    ///   `have no rights to ...` → `NotEnoughRights` (checked first)
    /// - `user is an administrator of the chat`, `can't remove chat owner`,
    ///   `can't restrict chat owner`, or any other text mentioning
    ///   "administrator" / "chat owner" → `TargetIsAdmin`
    /// - `message to delete not found`, `message to pin not found`,
    ///   `message to unpin not found`, `message can't be deleted` → `MessageNotFound`
    /// - anything else → `Other`
    pub fn classify(description: &str) -> Self {
        let d = description.to_lowercase();
        if d.contains("not enough rights")
            || d.contains("chat_admin_required")
            || d.contains("have no rights")
        {
            return Self::NotEnoughRights;
        }
        if d.contains("administrator") || d.contains("chat owner") {
            return Self::TargetIsAdmin;
        }
        if d.contains("message to delete not found")
            || d.contains("message to pin not found")
            || d.contains("message to unpin not found")
            || d.contains("message can't be deleted")
        {
            return Self::MessageNotFound;
        }
        Self::Other
    }
}
