use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;

use tyb_core::{
    ports::{FetchedVideo, VideoFetcher},
    Error, Result,
};

use crate::run_tool;

/// Fields of `yt-dlp -j` output we use.
#[derive(Debug, Deserialize)]
struct YtDlpOutput {
    title: Option<String>,
    id: Option<String>,
    #[serde(rename = "_filename")]
    filename: Option<String>,
}

pub struct YtDlpFetcher {
    program: PathBuf,
    socket_timeout: Duration,
    deadline: Duration,
}

impl YtDlpFetcher {
    pub fn new(program: PathBuf, socket_timeout: Duration, deadline: Duration) -> Self {
        Self {
            program,
            socket_timeout,
            deadline,
        }
    }

    /// Best single-file format, no playlists or retries; metadata as JSON on stdout.
    fn args(&self, url: &str, dest_dir: &Path) -> Vec<OsString> {
        let template = dest_dir.join("video.%(ext)s");
        vec![
            "-f".into(),
            "best".into(),
            "--no-playlist".into(),
            "--no-warnings".into(),
            "--no-progress".into(),
            "-j".into(),
            "--no-simulate".into(),
            "--retries".into(),
            "0".into(),
            "--fragment-retries".into(),
            "0".into(),
            "--extractor-retries".into(),
            "0".into(),
            "--socket-timeout".into(),
            self.socket_timeout.as_secs().max(1).to_string().into(),
            "-o".into(),
            template.into_os_string(),
            "--".into(),
            url.into(),
        ]
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<FetchedVideo> {
        let args = self.args(url, dest_dir);
        let output = run_tool("yt-dlp", &self.program, &args, self.deadline).await?;
        let info = parse_output(&output.stdout)?;

        let path = resolve_download(info.filename.as_deref(), dest_dir)
            .await?
            .ok_or_else(|| Error::Tool(format!("yt-dlp produced no file for {url}")))?;
        let title = info
            .title
            .filter(|t| !t.trim().is_empty())
            .or(info.id)
            .unwrap_or_else(|| "video".to_string());

        tracing::debug!(url, path = %path.display(), "yt-dlp finished");
        Ok(FetchedVideo { path, title })
    }
}

/// The metadata object is the last JSON line on stdout.
fn parse_output(stdout: &[u8]) -> Result<YtDlpOutput> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| Error::Tool("yt-dlp printed no metadata".to_string()))?;
    Ok(serde_json::from_str(line)?)
}

/// The reported file name if it exists, else the first finished file in the
/// directory (the extension can change after post-processing).
async fn resolve_download(reported: Option<&str>, dest_dir: &Path) -> Result<Option<PathBuf>> {
    if let Some(p) = reported.map(PathBuf::from) {
        if tokio::fs::try_exists(&p).await.unwrap_or(false) {
            return Ok(Some(p));
        }
    }

    let mut entries = tokio::fs::read_dir(dest_dir).await?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let partial = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "part" | "ytdl" | "temp"));
        if !partial && entry.file_type().await?.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}
