//! Video link → fetch → upload, gated by a per-user cooldown.

use std::{path::PathBuf, sync::Arc};

use crate::{
    cooldown::{remaining_secs, Cooldown, CooldownState, InFlight},
    domain::{IncomingMessage, MessageRef},
    errors::PlatformErrorKind,
    formatting::truncate_chars,
    links::VideoLink,
    platform::{ChatAction, ChatPlatform, Upload},
    ports::VideoFetcher,
    scratch::{sanitize_filename, ScratchDir},
    texts,
};

/// Bot API upload limit for documents.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

const MAX_TITLE_CHARS: usize = 200;

pub struct FetchRelay {
    platform: Arc<dyn ChatPlatform>,
    fetcher: Arc<dyn VideoFetcher>,
    download_dir: PathBuf,
    bot_username: String,
    cooldown: Cooldown,
    in_flight: InFlight,
}

impl FetchRelay {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        fetcher: Arc<dyn VideoFetcher>,
        download_dir: PathBuf,
        bot_username: String,
        cooldown: Cooldown,
        in_flight: InFlight,
    ) -> Self {
        Self {
            platform,
            fetcher,
            download_dir,
            bot_username,
            cooldown,
            in_flight,
        }
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    pub async fn handle(&self, msg: &IncomingMessage, link: &VideoLink) {
        let Some(user) = msg.from.as_ref() else {
            return;
        };

        let Some(_slot) = self.in_flight.try_acquire(user.id) else {
            self.reply(msg, texts::BUSY).await;
            return;
        };

        if let CooldownState::Wait(wait) = self.cooldown.check(user.id).await {
            self.reply(msg, &texts::wait_seconds(remaining_secs(wait))).await;
            return;
        }

        tracing::info!(
            chat_id = msg.chat.id.0,
            user_id = user.id.0,
            video_id = %link.video_id,
            "fetching video"
        );

        let status = match self
            .platform
            .reply_html(msg.message_ref(), texts::VIDEO_DOWNLOADING)
            .await
        {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("failed to send status message: {e}");
                None
            }
        };

        let outcome = self.fetch_and_send(msg, link).await;

        if let Some(status) = status {
            self.delete_status(status).await;
        }

        match outcome {
            Ok(()) => self.cooldown.record(user.id).await,
            Err(text) => self.reply(msg, text).await,
        }
    }

    /// Fetch into a fresh scratch dir and upload; `Err` carries the reply text.
    /// The scratch dir is gone when this returns.
    async fn fetch_and_send(
        &self,
        msg: &IncomingMessage,
        link: &VideoLink,
    ) -> Result<(), &'static str> {
        let scratch = ScratchDir::create(&self.download_dir, "fetch")
            .await
            .map_err(|e| {
                tracing::error!("failed to create scratch dir: {e}");
                texts::VIDEO_FAILED
            })?;

        let video = self
            .fetcher
            .fetch(&link.url, scratch.path())
            .await
            .map_err(|e| {
                tracing::error!(url = %link.url, "video fetch failed: {e}");
                texts::VIDEO_FAILED
            })?;

        let size = tokio::fs::metadata(&video.path)
            .await
            .map(|m| m.len())
            .map_err(|e| {
                tracing::error!(path = %video.path.display(), "fetched file unreadable: {e}");
                texts::VIDEO_FAILED
            })?;
        if size > MAX_UPLOAD_BYTES {
            tracing::info!(url = %link.url, size, "video too large to upload");
            return Err(texts::VIDEO_TOO_LARGE);
        }

        let chat_id = msg.chat.id;
        if let Err(e) = self
            .platform
            .send_chat_action(chat_id, ChatAction::UploadDocument)
            .await
        {
            tracing::debug!("chat action failed: {e}");
        }

        let title = truncate_chars(&video.title, MAX_TITLE_CHARS);
        let ext = video
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let file_name = format!("{}.{ext}", sanitize_filename(&title));
        let caption = texts::video_caption(&title, &link.url, &self.bot_username);

        self.platform
            .send_document(
                chat_id,
                Upload {
                    path: &video.path,
                    file_name: Some(&file_name),
                    caption: Some(&caption),
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(url = %link.url, size, "video upload failed: {e}");
                if e.platform_kind() == Some(PlatformErrorKind::Timeout) {
                    texts::VIDEO_SEND_FAILED
                } else {
                    texts::VIDEO_FAILED
                }
            })?;

        tracing::info!(url = %link.url, size, "video sent");
        Ok(())
    }

    async fn delete_status(&self, status: MessageRef) {
        if let Err(e) = self.platform.delete_message(status).await {
            tracing::warn!(
                chat_id = status.chat_id.0,
                message_id = status.message_id.0,
                "failed to delete status message: {e}"
            );
        }
    }

    async fn reply(&self, msg: &IncomingMessage, html: &str) {
        if let Err(e) = self.platform.reply_html(msg.message_ref(), html).await {
            tracing::warn!(chat_id = msg.chat.id.0, "failed to send reply: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::{
        cooldown::FETCH_COOLDOWN,
        domain::UserId,
        links::find_video_link,
        testing::{actor, count_files, text, Call, FakeFetcher, FakePlatform, FetchBehavior, GROUP},
    };

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    struct Harness {
        platform: Arc<FakePlatform>,
        fetcher: Arc<FakeFetcher>,
        slots: InFlight,
        relay: FetchRelay,
        root: tempfile::TempDir,
    }

    fn harness(fetcher: FakeFetcher) -> Harness {
        let root = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());
        let fetcher = Arc::new(fetcher);
        let slots = InFlight::default();
        let relay = FetchRelay::new(
            platform.clone(),
            fetcher.clone(),
            root.path().to_path_buf(),
            "typology_bot".to_string(),
            Cooldown::new(FETCH_COOLDOWN, 100),
            slots.clone(),
        );
        Harness {
            platform,
            fetcher,
            slots,
            relay,
            root,
        }
    }

    fn request() -> (IncomingMessage, VideoLink) {
        let msg = text(GROUP, &actor(7, "Viewer"), &format!("look {URL}"));
        let link = find_video_link(msg.text().unwrap()).unwrap();
        (msg, link)
    }

    fn documents(platform: &FakePlatform) -> Vec<Call> {
        platform
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Document { .. }))
            .collect()
    }

    fn status_deleted(platform: &FakePlatform) -> bool {
        platform.calls().iter().any(|c| matches!(c, Call::Delete(_)))
    }

    #[tokio::test]
    async fn successful_fetch_uploads_and_cleans_up() {
        let h = harness(FakeFetcher::succeeding(1024));
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;

        assert_eq!(h.fetcher.urls(), vec![URL.to_string()]);
        let docs = documents(&h.platform);
        assert_eq!(docs.len(), 1);
        let Call::Document {
            file_name, caption, size, ..
        } = &docs[0]
        else {
            unreachable!()
        };
        assert_eq!(file_name.as_deref(), Some("Never Gonna Give You Up.mp4"));
        let caption = caption.as_deref().unwrap();
        assert!(caption.contains("Never Gonna Give You Up"));
        assert!(caption.contains(URL));
        assert!(caption.contains("@typology_bot"));
        assert_eq!(*size, 1024);

        assert!(h
            .platform
            .calls()
            .contains(&Call::ChatAction(GROUP, ChatAction::UploadDocument)));
        assert!(status_deleted(&h.platform));
        assert_eq!(count_files(h.root.path()), 0);
        assert_eq!(std::fs::read_dir(h.root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn second_request_inside_window_waits() {
        let h = harness(FakeFetcher::succeeding(10));
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;
        h.relay.handle(&msg, &link).await;

        assert_eq!(h.fetcher.urls().len(), 1);
        assert_eq!(h.platform.last_text(), Some(texts::wait_seconds(60)));
    }

    #[tokio::test]
    async fn request_one_window_later_is_accepted() {
        let h = harness(FakeFetcher::succeeding(10));
        let (msg, link) = request();
        let Some(earlier) = Instant::now().checked_sub(FETCH_COOLDOWN) else {
            return;
        };
        h.relay.cooldown().record_at(UserId(7), earlier).await;

        h.relay.handle(&msg, &link).await;
        assert_eq!(h.fetcher.urls().len(), 1);
    }

    #[tokio::test]
    async fn wait_reports_remaining_seconds() {
        let h = harness(FakeFetcher::succeeding(10));
        let (msg, link) = request();
        let Some(earlier) = Instant::now().checked_sub(Duration::from_secs(20)) else {
            return;
        };
        h.relay.cooldown().record_at(UserId(7), earlier).await;

        h.relay.handle(&msg, &link).await;
        assert!(h.fetcher.urls().is_empty());
        assert_eq!(h.platform.last_text(), Some(texts::wait_seconds(40)));
    }

    #[tokio::test]
    async fn oversized_video_is_not_uploaded() {
        let h = harness(FakeFetcher::succeeding(MAX_UPLOAD_BYTES + 1));
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;

        assert!(documents(&h.platform).is_empty());
        assert_eq!(h.platform.last_text().as_deref(), Some(texts::VIDEO_TOO_LARGE));
        assert!(status_deleted(&h.platform));
        assert_eq!(count_files(h.root.path()), 0);
        assert_eq!(h.relay.cooldown().check(UserId(7)).await, CooldownState::Ready);
    }

    #[tokio::test]
    async fn failed_fetch_removes_partial_files() {
        let h = harness(FakeFetcher::new(FetchBehavior::FailAfterPartial));
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::VIDEO_FAILED));
        assert!(status_deleted(&h.platform));
        assert_eq!(count_files(h.root.path()), 0);
        assert_eq!(h.relay.cooldown().check(UserId(7)).await, CooldownState::Ready);
    }

    #[tokio::test]
    async fn upload_timeout_gets_sending_failed() {
        let h = harness(FakeFetcher::succeeding(10));
        h.platform.fail_uploads(PlatformErrorKind::Timeout);
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::VIDEO_SEND_FAILED));
        assert_eq!(count_files(h.root.path()), 0);
        assert_eq!(h.relay.cooldown().check(UserId(7)).await, CooldownState::Ready);
    }

    #[tokio::test]
    async fn other_upload_errors_get_generic_failure() {
        let h = harness(FakeFetcher::succeeding(10));
        h.platform.fail_uploads(PlatformErrorKind::Other);
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;

        assert_eq!(h.platform.last_text().as_deref(), Some(texts::VIDEO_FAILED));
    }

    #[tokio::test]
    async fn status_delete_failure_is_not_fatal() {
        let h = harness(FakeFetcher::succeeding(10));
        h.platform.fail_deletes_with("Bad Request: message to delete not found");
        let (msg, link) = request();
        h.relay.handle(&msg, &link).await;

        assert_eq!(documents(&h.platform).len(), 1);
        assert!(matches!(
            h.relay.cooldown().check(UserId(7)).await,
            CooldownState::Wait(_)
        ));
    }

    #[tokio::test]
    async fn concurrent_request_from_same_user_is_rejected() {
        let h = harness(FakeFetcher::succeeding(10));
        let (msg, link) = request();
        let _running = h.slots.try_acquire(UserId(7)).unwrap();

        h.relay.handle(&msg, &link).await;
        assert!(h.fetcher.urls().is_empty());
        assert_eq!(h.platform.last_text().as_deref(), Some(texts::BUSY));
    }
}
