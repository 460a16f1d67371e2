use crate::moderation::ModerationCommand;

/// A recognized slash command with its argument text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Info,
    ChatInfo,
    Chat(String),
    /// `/from <start_seconds>`; the raw argument is validated by the clip extractor.
    From(String),
    Moderation(ModerationCommand),
}

/// Split `/cmd@botname arg1 ...` into (`cmd`, `bot`, `args`).
fn split_command(text: &str) -> Option<(String, Option<&str>, &str)> {
    let text = text.trim();
    let body = text.strip_prefix('/')?;
    let mut parts = body.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    let (cmd, bot) = match first.split_once('@') {
        Some((cmd, bot)) => (cmd, Some(bot)),
        None => (first, None),
    };
    if cmd.is_empty() {
        return None;
    }
    Some((cmd.to_lowercase(), bot, rest))
}

/// Parse a message text as a command for this bot.
///
/// `None` for plain text, commands addressed to another bot, and unknown
/// commands.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let (cmd, bot, args) = split_command(text)?;
    if let Some(bot) = bot {
        if !bot.eq_ignore_ascii_case(bot_username) {
            return None;
        }
    }

    let command = match cmd.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "info" => Command::Info,
        "chatinfo" => Command::ChatInfo,
        "chat" => Command::Chat(args.to_string()),
        "from" => Command::From(args.to_string()),
        "ban" => Command::Moderation(ModerationCommand::Ban {
            reason: args.to_string(),
        }),
        "unban" => Command::Moderation(ModerationCommand::Unban),
        "mute" => Command::Moderation(ModerationCommand::Mute {
            duration: (!args.is_empty()).then(|| args.to_string()),
        }),
        "unmute" => Command::Moderation(ModerationCommand::Unmute),
        "del" => Command::Moderation(ModerationCommand::Delete),
        "pin" => Command::Moderation(ModerationCommand::Pin),
        "unpin" => Command::Moderation(ModerationCommand::Unpin),
        "unpin_all" => Command::Moderation(ModerationCommand::UnpinAll),
        "report" => Command::Moderation(ModerationCommand::Report),
        "admins" => Command::Moderation(ModerationCommand::Admins),
        _ => return None,
    };
    Some(command)
}
