//! Video link recognition.

use std::sync::OnceLock;

use regex::Regex;

/// A YouTube link found in a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoLink {
    pub video_id: String,
    /// The link as written, with `https://` added when the scheme was missing.
    pub url: String,
}

fn youtube_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^\s&#]*&)*v=|embed/|v/|shorts/)|youtu\.be/|youtube-nocookie\.com/(?:embed/|v/))([a-z0-9_-]{11})",
        )
        .expect("valid regex")
    })
}

/// Find the first YouTube link anywhere in `text`.
pub fn find_video_link(text: &str) -> Option<VideoLink> {
    for caps in youtube_re().captures_iter(text) {
        let whole = caps.get(0)?;
        // The id is exactly 11 characters; a longer token is not a video id.
        let next = text[whole.end()..].chars().next();
        if next.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            continue;
        }

        let video_id = caps.get(2)?.as_str().to_string();
        let url = if caps.get(1).is_some() {
            whole.as_str().to_string()
        } else {
            format!("https://{}", whole.as_str())
        };
        return Some(VideoLink { video_id, url });
    }
    None
}
