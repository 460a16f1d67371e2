//! Ports for the external tools (downloader, audio processing, chat model).

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;

/// A video fetched to local storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedVideo {
    pub path: PathBuf,
    pub title: String,
}

#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Download `url` into `dest_dir`. Partial files may be left in
    /// `dest_dir` on failure; the caller owns the directory.
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<FetchedVideo>;
}

#[async_trait]
pub trait AudioTool: Send + Sync {
    /// Total duration in whole seconds.
    async fn probe_duration(&self, src: &Path) -> Result<u32>;

    /// Write `length_secs` seconds of `src`, starting at `start_secs`, to
    /// `dst` as a voice-note (OGG/Opus) file.
    async fn trim(&self, src: &Path, start_secs: u32, length_secs: u32, dst: &Path) -> Result<()>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn reply(&self, prompt: &str) -> Result<String>;
}
