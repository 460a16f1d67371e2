use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration, read from the environment (plus an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    /// Groups where privileged commands run. Includes the test group.
    pub allowed_chat_ids: Vec<i64>,

    // Media
    pub download_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub fetch_socket_timeout: Duration,
    pub fetch_deadline: Duration,
    pub upload_timeout: Duration,

    // Per-user tables
    pub state_capacity: u64,

    // /chat
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        fs::create_dir_all(&cfg.download_dir)?;
        Ok(cfg)
    }

    /// Build from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        // ALLOWED_CHAT_IDS plus the individual group variables.
        let test_group_id = get("TEST_GROUP_ID").and_then(|s| parse_i64(&s));
        let mut allowed_chat_ids = parse_csv_i64(get("ALLOWED_CHAT_IDS"));
        for key in ["GROUP_ID", "GROUP_ID2"] {
            if let Some(id) = get(key).and_then(|s| parse_i64(&s)) {
                allowed_chat_ids.push(id);
            }
        }
        allowed_chat_ids.extend(test_group_id);
        allowed_chat_ids.sort_unstable();
        allowed_chat_ids.dedup();

        if allowed_chat_ids.is_empty() {
            return Err(Error::Config(
                "ALLOWED_CHAT_IDS (or GROUP_ID / GROUP_ID2 / TEST_GROUP_ID) is required"
                    .to_string(),
            ));
        }

        let download_dir = get("DOWNLOAD_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("downloads"));

        let path_var = get("PATH");
        let tool = |key: &str, binary: &str| {
            get(key)
                .and_then(non_empty)
                .map(PathBuf::from)
                .or_else(|| which_in_path(path_var.as_deref(), binary))
                .unwrap_or_else(|| PathBuf::from(binary))
        };
        let ytdlp_path = tool("YTDLP_PATH", "yt-dlp");
        let ffmpeg_path = tool("FFMPEG_PATH", "ffmpeg");
        let ffprobe_path = tool("FFPROBE_PATH", "ffprobe");

        let secs = |key: &str, default: u64| {
            Duration::from_secs(get(key).and_then(|s| parse_u64(&s)).unwrap_or(default))
        };
        let fetch_socket_timeout = secs("FETCH_SOCKET_TIMEOUT_SECS", 60);
        let fetch_deadline = secs("FETCH_DEADLINE_SECS", 600);
        let upload_timeout = secs("UPLOAD_TIMEOUT_SECS", 300);

        let state_capacity = get("STATE_CAPACITY")
            .and_then(|s| parse_u64(&s))
            .unwrap_or(10_000)
            .max(1);

        let openai_api_key = get("OPENAI_API_KEY").and_then(non_empty);
        let openai_model = get("OPENAI_MODEL")
            .and_then(non_empty)
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let openai_base_url = get("OPENAI_BASE_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            telegram_bot_token,
            allowed_chat_ids,
            download_dir,
            ytdlp_path,
            ffmpeg_path,
            ffprobe_path,
            fetch_socket_timeout,
            fetch_deadline,
            upload_timeout,
            state_capacity,
            openai_api_key,
            openai_model,
            openai_base_url,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_i64(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

fn parse_u64(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(parse_i64)
        .collect()
}

fn which_in_path(path: Option<&str>, binary: &str) -> Option<PathBuf> {
    let path = path?;
    for dir in env::split_paths(path) {
        let candidate = dir.join(binary);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
