//! Telegram HTML helpers.

use crate::domain::{Actor, UserId};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Link mention showing the user's full name.
pub fn mention(actor: &Actor) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        actor.id.0,
        escape_html(&actor.full_name)
    )
}

/// Mention that notifies the user without rendering any visible text.
pub fn silent_mention(user_id: UserId) -> String {
    format!("<a href=\"tg://user?id={}\">\u{200b}</a>", user_id.0)
}

/// Keep at most `max` characters, appending `...` when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!("{}...", s.chars().take(max).collect::<String>())
}
