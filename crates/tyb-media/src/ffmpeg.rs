use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;

use tyb_core::{ports::AudioTool, Error, Result};

use crate::run_tool;

/// Demo clips are short; anything slower than this is stuck.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

pub struct FfmpegAudioTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    deadline: Duration,
}

impl FfmpegAudioTool {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            deadline: DEFAULT_DEADLINE,
        }
    }

    fn probe_args(src: &Path) -> Vec<OsString> {
        vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            src.into(),
        ]
    }

    /// Seek on the input, cut `length` seconds, encode as Opus (voice note).
    fn trim_args(src: &Path, start: u32, length: u32, dst: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-ss".into(),
            start.to_string().into(),
            "-t".into(),
            length.to_string().into(),
            "-i".into(),
            src.into(),
            "-vn".into(),
            "-c:a".into(),
            "libopus".into(),
            "-b:a".into(),
            "64k".into(),
            dst.into(),
        ]
    }
}

/// Whole seconds from ffprobe's `format=duration` output (rounded down).
fn parse_duration(stdout: &[u8]) -> Result<u32> {
    let text = String::from_utf8_lossy(stdout);
    let value = text.trim();
    let secs: f64 = value
        .parse()
        .map_err(|_| Error::Tool(format!("ffprobe returned no duration: {value:?}")))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(Error::Tool(format!("ffprobe returned invalid duration {secs}")));
    }
    Ok(secs.floor().min(u32::MAX as f64) as u32)
}

#[async_trait]
impl AudioTool for FfmpegAudioTool {
    async fn probe_duration(&self, src: &Path) -> Result<u32> {
        let args = Self::probe_args(src);
        let output = run_tool("ffprobe", &self.ffprobe, &args, self.deadline).await?;
        parse_duration(&output.stdout)
    }

    async fn trim(&self, src: &Path, start_secs: u32, length_secs: u32, dst: &Path) -> Result<()> {
        let args = Self::trim_args(src, start_secs, length_secs, dst);
        run_tool("ffmpeg", &self.ffmpeg, &args, self.deadline).await?;
        if !tokio::fs::try_exists(dst).await.unwrap_or(false) {
            return Err(Error::Tool("ffmpeg produced no output file".to_string()));
        }
        Ok(())
    }
}
