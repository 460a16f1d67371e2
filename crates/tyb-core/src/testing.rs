//! In-memory fakes for the platform and tool ports (tests only).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{
        Actor, ChatAdmin, ChatId, ChatInfo, ChatKind, Content, IncomingMessage, MemberPermissions,
        MemberStatus, MessageId, MessageRef, RepliedMessage, UserId,
    },
    errors::{Error, PlatformError, PlatformErrorKind},
    platform::{ChatAction, ChatPlatform, Upload},
    ports::{AudioTool, ChatModel, FetchedVideo, VideoFetcher},
    Result,
};

pub const GROUP: ChatId = ChatId(-1001);
pub const OTHER_GROUP: ChatId = ChatId(-2002);
pub const BOT: UserId = UserId(999);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    MemberStatus(ChatId, UserId),
    Administrators(ChatId),
    Ban(ChatId, UserId),
    Unban(ChatId, UserId),
    Restrict {
        chat_id: ChatId,
        user_id: UserId,
        permissions: MemberPermissions,
        until: Option<DateTime<Utc>>,
    },
    Delete(MessageRef),
    Pin(MessageRef),
    Unpin(ChatId, Option<MessageId>),
    UnpinAll(ChatId),
    Send {
        chat_id: ChatId,
        html: String,
    },
    Reply {
        to: MessageRef,
        html: String,
    },
    ChatAction(ChatId, ChatAction),
    Document {
        chat_id: ChatId,
        file_name: Option<String>,
        caption: Option<String>,
        size: u64,
    },
    Voice {
        chat_id: ChatId,
        caption: Option<String>,
        size: u64,
    },
    Download {
        file_id: String,
        dst: PathBuf,
    },
}

impl Call {
    /// Calls that change chat state (membership, messages, pins).
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Ban(..)
                | Call::Unban(..)
                | Call::Restrict { .. }
                | Call::Delete(_)
                | Call::Pin(_)
                | Call::Unpin(..)
                | Call::UnpinAll(_)
        )
    }
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    statuses: HashMap<UserId, MemberStatus>,
    admins: Vec<ChatAdmin>,
    fail_lookups: bool,
    mutation_error: Option<String>,
    delete_error: Option<String>,
    upload_error: Option<PlatformError>,
    download_error: bool,
    next_message_id: i32,
}

#[derive(Default)]
pub struct FakePlatform {
    inner: Mutex<Inner>,
}

impl FakePlatform {
    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut g = self.inner.lock().unwrap();
        f(&mut g)
    }

    pub fn set_status(&self, user_id: UserId, status: MemberStatus) {
        self.with(|i| i.statuses.insert(user_id, status));
    }

    pub fn set_admins(&self, admins: Vec<ChatAdmin>) {
        self.with(|i| i.admins = admins);
    }

    pub fn fail_member_lookups(&self) {
        self.with(|i| i.fail_lookups = true);
    }

    /// Member and message mutations fail with this Bot API description.
    pub fn fail_mutations_with(&self, description: &str) {
        self.with(|i| i.mutation_error = Some(description.to_string()));
    }

    pub fn fail_deletes_with(&self, description: &str) {
        self.with(|i| i.delete_error = Some(description.to_string()));
    }

    pub fn fail_uploads(&self, kind: PlatformErrorKind) {
        self.with(|i| i.upload_error = Some(PlatformError::new(kind, "upload failed")));
    }

    pub fn fail_downloads(&self) {
        self.with(|i| i.download_error = true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|i| i.calls.clone())
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Text of every reply and plain send, in order.
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Reply { html, .. } | Call::Send { html, .. } => Some(html),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    fn record(&self, call: Call) {
        self.with(|i| i.calls.push(call));
    }

    fn next_ref(&self, chat_id: ChatId) -> MessageRef {
        self.with(|i| {
            i.next_message_id += 1;
            MessageRef {
                chat_id,
                message_id: MessageId(1000 + i.next_message_id),
            }
        })
    }

    fn mutation_result(&self) -> Result<()> {
        match self.with(|i| i.mutation_error.clone()) {
            Some(d) => Err(PlatformError::from_description(d).into()),
            None => Ok(()),
        }
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus> {
        self.record(Call::MemberStatus(chat_id, user_id));
        if self.with(|i| i.fail_lookups) {
            return Err(PlatformError::new(PlatformErrorKind::Network, "lookup failed").into());
        }
        Ok(self
            .with(|i| i.statuses.get(&user_id).copied())
            .unwrap_or(MemberStatus::Member))
    }

    async fn administrators(&self, chat_id: ChatId) -> Result<Vec<ChatAdmin>> {
        self.record(Call::Administrators(chat_id));
        if self.with(|i| i.fail_lookups) {
            return Err(PlatformError::new(PlatformErrorKind::Network, "lookup failed").into());
        }
        Ok(self.with(|i| i.admins.clone()))
    }

    async fn ban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        self.record(Call::Ban(chat_id, user_id));
        self.mutation_result()
    }

    async fn unban_member(&self, chat_id: ChatId, user_id: UserId) -> Result<()> {
        self.record(Call::Unban(chat_id, user_id));
        self.mutation_result()
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        permissions: MemberPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.record(Call::Restrict {
            chat_id,
            user_id,
            permissions,
            until,
        });
        self.mutation_result()
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.record(Call::Delete(msg));
        if let Some(d) = self.with(|i| i.delete_error.clone()) {
            return Err(PlatformError::from_description(d).into());
        }
        self.mutation_result()
    }

    async fn pin_message(&self, msg: MessageRef) -> Result<()> {
        self.record(Call::Pin(msg));
        self.mutation_result()
    }

    async fn unpin_message(&self, chat_id: ChatId, message_id: Option<MessageId>) -> Result<()> {
        self.record(Call::Unpin(chat_id, message_id));
        self.mutation_result()
    }

    async fn unpin_all(&self, chat_id: ChatId) -> Result<()> {
        self.record(Call::UnpinAll(chat_id));
        self.mutation_result()
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.record(Call::Send {
            chat_id,
            html: html.to_string(),
        });
        Ok(self.next_ref(chat_id))
    }

    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef> {
        self.record(Call::Reply {
            to,
            html: html.to_string(),
        });
        Ok(self.next_ref(to.chat_id))
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        self.record(Call::ChatAction(chat_id, action));
        Ok(())
    }

    async fn send_document(&self, chat_id: ChatId, upload: Upload<'_>) -> Result<MessageRef> {
        self.record(Call::Document {
            chat_id,
            file_name: upload.file_name.map(str::to_string),
            caption: upload.caption.map(str::to_string),
            size: file_size(upload.path),
        });
        if let Some(e) = self.with(|i| i.upload_error.clone()) {
            return Err(e.into());
        }
        Ok(self.next_ref(chat_id))
    }

    async fn send_voice(&self, chat_id: ChatId, upload: Upload<'_>) -> Result<MessageRef> {
        self.record(Call::Voice {
            chat_id,
            caption: upload.caption.map(str::to_string),
            size: file_size(upload.path),
        });
        if let Some(e) = self.with(|i| i.upload_error.clone()) {
            return Err(e.into());
        }
        Ok(self.next_ref(chat_id))
    }

    async fn download_file(&self, file_id: &str, dst: &Path) -> Result<()> {
        self.record(Call::Download {
            file_id: file_id.to_string(),
            dst: dst.to_path_buf(),
        });
        // Leave a partial file behind either way, like an interrupted transfer.
        std::fs::write(dst, b"ID3 fake audio")?;
        if self.with(|i| i.download_error) {
            return Err(PlatformError::new(PlatformErrorKind::Network, "connection reset").into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub enum FetchBehavior {
    /// Write a (sparse) file of `size` bytes.
    Succeed { title: String, size: u64 },
    /// Write a partial file, then fail.
    FailAfterPartial,
}

pub struct FakeFetcher {
    behavior: FetchBehavior,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(behavior: FetchBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(size: u64) -> Self {
        Self::new(FetchBehavior::Succeed {
            title: "Never Gonna Give You Up".to_string(),
            size,
        })
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<FetchedVideo> {
        self.calls.lock().unwrap().push(url.to_string());
        match &self.behavior {
            FetchBehavior::Succeed { title, size } => {
                let path = dest_dir.join("video.mp4");
                let f = std::fs::File::create(&path)?;
                f.set_len(*size)?;
                Ok(FetchedVideo {
                    path,
                    title: title.clone(),
                })
            }
            FetchBehavior::FailAfterPartial => {
                std::fs::write(dest_dir.join("video.mp4.part"), b"partial")?;
                Err(Error::Tool("yt-dlp exited with status 1".to_string()))
            }
        }
    }
}

#[derive(Default)]
pub struct FakeAudioTool {
    pub probed_duration: u32,
    pub fail_trim: bool,
    pub trims: Mutex<Vec<(u32, u32)>>,
    pub probes: Mutex<usize>,
}

impl FakeAudioTool {
    pub fn trims(&self) -> Vec<(u32, u32)> {
        self.trims.lock().unwrap().clone()
    }

    pub fn probes(&self) -> usize {
        *self.probes.lock().unwrap()
    }
}

#[async_trait]
impl AudioTool for FakeAudioTool {
    async fn probe_duration(&self, _src: &Path) -> Result<u32> {
        *self.probes.lock().unwrap() += 1;
        Ok(self.probed_duration)
    }

    async fn trim(&self, _src: &Path, start_secs: u32, length_secs: u32, dst: &Path) -> Result<()> {
        self.trims.lock().unwrap().push((start_secs, length_secs));
        if self.fail_trim {
            return Err(Error::Tool("ffmpeg failed".to_string()));
        }
        std::fs::write(dst, b"OggS fake clip")?;
        Ok(())
    }
}

pub struct FakeChatModel(pub Option<String>);

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn reply(&self, prompt: &str) -> Result<String> {
        match &self.0 {
            Some(answer) => Ok(format!("{answer}: {prompt}")),
            None => Err(Error::External("model unavailable".to_string())),
        }
    }
}

pub fn actor(id: i64, name: &str) -> Actor {
    Actor {
        id: UserId(id),
        full_name: name.to_string(),
        username: None,
        language_code: None,
        is_bot: false,
    }
}

pub fn message(chat_id: ChatId, from: &Actor, content: Content) -> IncomingMessage {
    IncomingMessage {
        chat: ChatInfo {
            id: chat_id,
            title: Some("Typology".to_string()),
            kind: ChatKind::Supergroup,
        },
        message_id: MessageId(10),
        date: Utc::now(),
        from: Some(from.clone()),
        content,
        reply_to: None,
    }
}

pub fn text(chat_id: ChatId, from: &Actor, text: &str) -> IncomingMessage {
    message(chat_id, from, Content::Text(text.to_string()))
}

/// `text` sent as a reply to a message of `target`.
pub fn reply(chat_id: ChatId, from: &Actor, text: &str, target: &Actor) -> IncomingMessage {
    let mut msg = self::text(chat_id, from, text);
    msg.reply_to = Some(RepliedMessage {
        message_id: MessageId(5),
        from: Some(target.clone()),
        audio: None,
    });
    msg
}

/// Number of regular files anywhere below `dir`.
pub fn count_files(dir: &Path) -> usize {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return 0;
    };
    rd.flatten()
        .map(|e| {
            let p = e.path();
            if p.is_dir() {
                count_files(&p)
            } else {
                1
            }
        })
        .sum()
}
