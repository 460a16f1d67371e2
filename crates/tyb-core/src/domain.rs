use chrono::{DateTime, Utc};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Who the bot is (filled from `getMe` at startup).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: UserId,
    pub username: String,
}

/// A Telegram user as seen in an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub full_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_bot: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: Option<String>,
    pub kind: ChatKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioKind {
    Music,
    Voice,
    /// A document that carries audio (`audio/mpeg`); no duration metadata.
    Document,
}

/// An audio-bearing attachment (music file, voice note, or mp3 document).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioAttachment {
    pub kind: AudioKind,
    pub file_id: String,
    /// Seconds, when the platform reports it.
    pub duration: Option<u32>,
    pub file_name: Option<String>,
    pub title: Option<String>,
    pub performer: Option<String>,
}

impl AudioAttachment {
    /// Display title: audio title, else performer, else the file stem.
    pub fn display_title(&self) -> String {
        if let Some(t) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return t.to_string();
        }
        if let Some(p) = self.performer.as_deref().filter(|p| !p.trim().is_empty()) {
            return p.to_string();
        }
        let name = self.local_file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name,
        }
    }

    /// File name to store the attachment under locally.
    pub fn local_file_name(&self) -> String {
        if let Some(n) = self.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return n.to_string();
        }
        let ext = match self.kind {
            AudioKind::Voice => "ogg",
            AudioKind::Music | AudioKind::Document => "mp3",
        };
        format!("audio_{}.{ext}", self.file_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Audio(AudioAttachment),
    NewMembers(Vec<Actor>),
    MemberLeft(Actor),
    Other,
}

/// The message a command was sent in reply to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepliedMessage {
    pub message_id: MessageId,
    pub from: Option<Actor>,
    pub audio: Option<AudioAttachment>,
}

/// Inbound message, already stripped of Telegram-specific types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat: ChatInfo,
    pub message_id: MessageId,
    pub date: DateTime<Utc>,
    pub from: Option<Actor>,
    pub content: Content,
    pub reply_to: Option<RepliedMessage>,
}

impl IncomingMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Membership status of a user in a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    pub fn is_privileged(self) -> bool {
        matches!(self, MemberStatus::Owner | MemberStatus::Administrator)
    }
}

/// One entry of `getChatAdministrators`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatAdmin {
    pub user: Actor,
    pub status: MemberStatus,
}

/// The send rights a restriction leaves a member with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberPermissions {
    pub send_messages: bool,
    pub send_media: bool,
    pub send_polls: bool,
    pub send_other: bool,
    pub add_web_page_previews: bool,
    pub change_info: bool,
    pub invite_users: bool,
    pub pin_messages: bool,
}

impl MemberPermissions {
    /// Everything off.
    pub fn muted() -> Self {
        Self::default()
    }

    /// Regular chatting rights; chat management stays off.
    pub fn unmuted() -> Self {
        Self {
            send_messages: true,
            send_media: true,
            send_polls: false,
            send_other: true,
            add_web_page_previews: true,
            change_info: false,
            invite_users: false,
            pin_messages: false,
        }
    }
}

/// Change of the bot's own membership in a chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipChange {
    pub chat: ChatInfo,
    pub by: Option<Actor>,
    pub old_status: MemberStatus,
    pub new_status: MemberStatus,
}
