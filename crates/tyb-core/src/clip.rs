//! Demo clips: a ≤30 s voice excerpt of an audio attachment. Each user keeps
//! at most one demo in the chat; a new one replaces the previous.

use std::{path::PathBuf, sync::Arc, time::Duration};

use moka::{future::Cache, policy::EvictionPolicy};

use crate::{
    cooldown::InFlight,
    domain::{Actor, AudioAttachment, IncomingMessage, MessageRef, UserId},
    platform::{ChatAction, ChatPlatform, Upload},
    ports::AudioTool,
    scratch::ScratchDir,
    texts,
};

pub const MAX_CLIP_SECS: u32 = 30;

const DEMO_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Length of the excerpt starting at `start`; callers guarantee `start < duration`.
pub fn clip_length(duration: u32, start: u32) -> u32 {
    duration.saturating_sub(start).min(MAX_CLIP_SECS)
}

fn parse_start(arg: &str) -> Option<u32> {
    arg.split_whitespace().next()?.parse().ok()
}

pub struct ClipExtractor {
    platform: Arc<dyn ChatPlatform>,
    audio: Arc<dyn AudioTool>,
    download_dir: PathBuf,
    /// Last delivered demo per user.
    demos: Cache<UserId, MessageRef>,
    in_flight: InFlight,
}

impl ClipExtractor {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        audio: Arc<dyn AudioTool>,
        download_dir: PathBuf,
        capacity: u64,
        in_flight: InFlight,
    ) -> Self {
        Self {
            platform,
            audio,
            download_dir,
            demos: Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .time_to_live(DEMO_TTL)
                .build(),
            in_flight,
        }
    }

    /// `/from <start_seconds>` sent as a reply to an audio message.
    pub async fn from_command(&self, msg: &IncomingMessage, arg: &str) {
        let Some(audio) = msg.reply_to.as_ref().and_then(|r| r.audio.as_ref()) else {
            self.reply(msg, texts::DEMO_REPLY_REQUIRED).await;
            return;
        };
        let Some(start) = parse_start(arg) else {
            self.reply(msg, texts::DEMO_BAD_START).await;
            return;
        };
        self.extract(msg, audio, start).await;
    }

    /// An audio attachment posted directly: demo from the beginning.
    pub async fn from_attachment(&self, msg: &IncomingMessage, audio: &AudioAttachment) {
        self.extract(msg, audio, 0).await;
    }

    async fn extract(&self, msg: &IncomingMessage, audio: &AudioAttachment, start: u32) {
        let Some(user) = msg.from.as_ref() else {
            return;
        };

        if let Some(duration) = audio.duration {
            if start >= duration {
                self.reply(msg, &texts::demo_start_too_late(duration)).await;
                return;
            }
        }

        let Some(_slot) = self.in_flight.try_acquire(user.id) else {
            self.reply(msg, texts::BUSY).await;
            return;
        };

        if let Err(text) = self.make_demo(msg, user, audio, start).await {
            self.reply(msg, &text).await;
        }
    }

    /// Download, trim and deliver; `Err` carries the reply text. The scratch
    /// dir (source and clip) is gone when this returns.
    async fn make_demo(
        &self,
        msg: &IncomingMessage,
        user: &Actor,
        audio: &AudioAttachment,
        start: u32,
    ) -> Result<(), String> {
        let failed = || texts::DEMO_FAILED.to_string();

        let scratch = ScratchDir::create(&self.download_dir, "clip")
            .await
            .map_err(|e| {
                tracing::error!("failed to create scratch dir: {e}");
                failed()
            })?;

        let src = scratch.file(&audio.local_file_name());
        self.platform
            .download_file(&audio.file_id, &src)
            .await
            .map_err(|e| {
                tracing::error!(file_id = %audio.file_id, "audio download failed: {e}");
                failed()
            })?;

        let duration = match audio.duration {
            Some(d) => d,
            None => self.audio.probe_duration(&src).await.map_err(|e| {
                tracing::error!(file_id = %audio.file_id, "probing duration failed: {e}");
                failed()
            })?,
        };
        if start >= duration {
            return Err(texts::demo_start_too_late(duration));
        }

        let status = match self
            .platform
            .reply_html(msg.message_ref(), texts::DEMO_CREATING)
            .await
        {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("failed to send status message: {e}");
                None
            }
        };

        let length = clip_length(duration, start);
        let dst = scratch.file("demo.ogg");
        let result = match self.audio.trim(&src, start, length, &dst).await {
            Ok(()) => self.deliver(msg, user, audio, &dst, start).await,
            Err(e) => {
                tracing::error!(file_id = %audio.file_id, start, length, "trimming failed: {e}");
                Err(failed())
            }
        };

        if let Some(status) = status {
            if let Err(e) = self.platform.delete_message(status).await {
                tracing::warn!("failed to delete status message: {e}");
            }
        }
        result
    }

    async fn deliver(
        &self,
        msg: &IncomingMessage,
        user: &Actor,
        audio: &AudioAttachment,
        clip: &std::path::Path,
        start: u32,
    ) -> Result<(), String> {
        let chat_id = msg.chat.id;

        if let Some(previous) = self.demos.remove(&user.id).await {
            if let Err(e) = self.platform.delete_message(previous).await {
                tracing::warn!(
                    user_id = user.id.0,
                    message_id = previous.message_id.0,
                    "failed to delete previous demo: {e}"
                );
            }
        }

        if let Err(e) = self.platform.send_chat_action(chat_id, ChatAction::UploadVoice).await {
            tracing::debug!("chat action failed: {e}");
        }

        let caption = texts::demo_caption(&audio.display_title(), start);
        let sent = self
            .platform
            .send_voice(
                chat_id,
                Upload {
                    path: clip,
                    file_name: None,
                    caption: Some(&caption),
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(chat_id = chat_id.0, "sending demo failed: {e}");
                texts::DEMO_FAILED.to_string()
            })?;

        self.demos.insert(user.id, sent).await;
        tracing::info!(chat_id = chat_id.0, user_id = user.id.0, start, "demo sent");
        Ok(())
    }

    async fn reply(&self, msg: &IncomingMessage, html: &str) {
        if let Err(e) = self.platform.reply_html(msg.message_ref(), html).await {
            tracing::warn!(chat_id = msg.chat.id.0, "failed to send reply: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{AudioKind, Content, MessageId, RepliedMessage},
        errors::PlatformErrorKind,
        testing::{actor, count_files, message, text, Call, FakeAudioTool, FakePlatform, GROUP},
    };

    struct Harness {
        platform: Arc<FakePlatform>,
        tool: Arc<FakeAudioTool>,
        slots: InFlight,
        clips: ClipExtractor,
        root: tempfile::TempDir,
    }

    fn harness(tool: FakeAudioTool) -> Harness {
        let root = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());
        let tool = Arc::new(tool);
        let slots = InFlight::default();
        let clips = ClipExtractor::new(
            platform.clone(),
            tool.clone(),
            root.path().to_path_buf(),
            100,
            slots.clone(),
        );
        Harness {
            platform,
            tool,
            slots,
            clips,
            root,
        }
    }

    fn song(duration: Option<u32>) -> AudioAttachment {
        AudioAttachment {
            kind: if duration.is_some() {
                AudioKind::Music
            } else {
                AudioKind::Document
            },
            file_id: "AQADfile".to_string(),
            duration,
            file_name: Some("ocean.mp3".to_string()),
            title: Some("Ocean Eyes".to_string()),
            performer: None,
        }
    }

    fn from_reply(command: &str, audio: AudioAttachment) -> IncomingMessage {
        let user = actor(7, "Listener");
        let mut msg = text(GROUP, &user, command);
        msg.reply_to = Some(RepliedMessage {
            message_id: MessageId(5),
            from: Some(user),
            audio: Some(audio),
        });
        msg
    }

    fn voices(platform: &FakePlatform) -> Vec<Option<String>> {
        platform
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Voice { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    fn downloads(platform: &FakePlatform) -> usize {
        platform
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Download { .. }))
            .count()
    }

    #[test]
    fn clip_length_is_capped() {
        assert_eq!(clip_length(120, 75), 30);
        assert_eq!(clip_length(120, 110), 10);
        assert_eq!(clip_length(30, 0), 30);
        assert_eq!(clip_length(5, 0), 5);
    }

    #[tokio::test]
    async fn start_past_known_duration_does_no_io() {
        let h = harness(FakeAudioTool::default());
        for start in ["20", "25"] {
            h.clips
                .from_command(&from_reply(&format!("/from {start}"), song(Some(20))), start)
                .await;
            assert_eq!(h.platform.last_text(), Some(texts::demo_start_too_late(20)));
        }

        assert_eq!(downloads(&h.platform), 0);
        assert!(h.tool.trims().is_empty());
        assert_eq!(h.tool.probes(), 0);
        assert_eq!(std::fs::read_dir(h.root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn long_remainder_is_cut_to_thirty_seconds() {
        let h = harness(FakeAudioTool::default());
        h.clips.from_command(&from_reply("/from 15", song(Some(60))), "15").await;

        assert_eq!(h.tool.trims(), vec![(15, 30)]);
        let captions = voices(&h.platform);
        assert_eq!(captions.len(), 1);
        let caption = captions[0].as_deref().unwrap();
        assert!(caption.contains("Ocean Eyes"));
        assert!(caption.contains("(from 15s)"));
        assert!(h
            .platform
            .calls()
            .contains(&Call::ChatAction(GROUP, ChatAction::UploadVoice)));
        assert_eq!(count_files(h.root.path()), 0);
    }

    #[tokio::test]
    async fn short_remainder_is_kept_whole() {
        let h = harness(FakeAudioTool::default());
        h.clips.from_command(&from_reply("/from 50", song(Some(60))), "50").await;
        assert_eq!(h.tool.trims(), vec![(50, 10)]);
    }

    #[tokio::test]
    async fn unknown_duration_is_probed() {
        let h = harness(FakeAudioTool {
            probed_duration: 100,
            ..Default::default()
        });
        let user = actor(7, "Listener");
        let msg = message(GROUP, &user, Content::Audio(song(None)));
        h.clips.from_attachment(&msg, &song(None)).await;

        assert_eq!(h.tool.probes(), 1);
        assert_eq!(h.tool.trims(), vec![(0, 30)]);
        assert_eq!(voices(&h.platform).len(), 1);
        assert_eq!(count_files(h.root.path()), 0);
    }

    #[tokio::test]
    async fn probed_duration_is_checked_too() {
        let h = harness(FakeAudioTool {
            probed_duration: 12,
            ..Default::default()
        });
        h.clips.from_command(&from_reply("/from 40", song(None)), "40").await;

        assert!(h.tool.trims().is_empty());
        assert_eq!(h.platform.last_text(), Some(texts::demo_start_too_late(12)));
        assert_eq!(count_files(h.root.path()), 0);
    }

    #[tokio::test]
    async fn new_demo_replaces_the_previous_one() {
        let h = harness(FakeAudioTool::default());
        h.clips.from_command(&from_reply("/from 0", song(Some(60))), "0").await;
        h.clips.from_command(&from_reply("/from 10", song(Some(60))), "10").await;

        // Ids in send order: status 1001, demo 1002, status 1003, demo 1004.
        let deleted = h
            .platform
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(r) => Some(r.message_id.0),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(deleted, vec![1001, 1002, 1003]);
        assert_eq!(voices(&h.platform).len(), 2);
    }

    #[tokio::test]
    async fn failed_trim_cleans_up_and_keeps_previous_demo() {
        let h = harness(FakeAudioTool {
            fail_trim: true,
            ..Default::default()
        });
        h.clips.from_command(&from_reply("/from 5", song(Some(60))), "5").await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::DEMO_FAILED));
        assert!(voices(&h.platform).is_empty());
        assert_eq!(count_files(h.root.path()), 0);
        assert_eq!(std::fs::read_dir(h.root.path()).unwrap().count(), 0);
        // Only the status message is deleted.
        assert_eq!(
            h.platform
                .calls()
                .iter()
                .filter(|c| matches!(c, Call::Delete(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn failed_download_cleans_up() {
        let h = harness(FakeAudioTool::default());
        h.platform.fail_downloads();
        h.clips.from_command(&from_reply("/from 5", song(Some(60))), "5").await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::DEMO_FAILED));
        assert!(h.tool.trims().is_empty());
        assert_eq!(count_files(h.root.path()), 0);
    }

    #[tokio::test]
    async fn failed_upload_cleans_up() {
        let h = harness(FakeAudioTool::default());
        h.platform.fail_uploads(PlatformErrorKind::Timeout);
        h.clips.from_command(&from_reply("/from 5", song(Some(60))), "5").await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::DEMO_FAILED));
        assert_eq!(count_files(h.root.path()), 0);
    }

    #[tokio::test]
    async fn validation_messages() {
        let h = harness(FakeAudioTool::default());
        let user = actor(7, "Listener");

        h.clips.from_command(&text(GROUP, &user, "/from 5"), "5").await;
        assert_eq!(h.platform.last_text().as_deref(), Some(texts::DEMO_REPLY_REQUIRED));

        for bad in ["", "abc", "-5", "1.5"] {
            h.clips.from_command(&from_reply("/from", song(Some(60))), bad).await;
            assert_eq!(h.platform.last_text().as_deref(), Some(texts::DEMO_BAD_START), "{bad:?}");
        }
        assert_eq!(downloads(&h.platform), 0);
    }

    #[tokio::test]
    async fn concurrent_request_from_same_user_is_rejected() {
        let h = harness(FakeAudioTool::default());
        let _running = h.slots.try_acquire(actor(7, "Listener").id).unwrap();
        h.clips.from_command(&from_reply("/from 5", song(Some(60))), "5").await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::BUSY));
        assert_eq!(downloads(&h.platform), 0);
    }
}
