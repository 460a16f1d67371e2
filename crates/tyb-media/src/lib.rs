//! Child-process adapters for the media tools: `yt-dlp` for video fetches,
//! `ffmpeg`/`ffprobe` for demo clips.

use std::{ffi::OsString, path::Path, process::Output, process::Stdio, time::Duration};

use tokio::process::Command;

use tyb_core::{Error, Result};

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::FfmpegAudioTool;
pub use ytdlp::YtDlpFetcher;

const STDERR_TAIL_CHARS: usize = 2000;

/// Run `program` to completion, killing it once `deadline` passes.
async fn run_tool(
    name: &str,
    program: &Path,
    args: &[OsString],
    deadline: Duration,
) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(tool = name, program = %program.display(), "spawning");
    let output = match tokio::time::timeout(deadline, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(Error::Tool(format!(
                "failed to start {name} ({}): {e}",
                program.display()
            )))
        }
        Err(_) => {
            return Err(Error::Tool(format!(
                "{name} timed out after {}s",
                deadline.as_secs()
            )))
        }
    };

    if !output.status.success() {
        return Err(Error::Tool(format!(
            "{name} exited with {}: {}",
            output.status,
            stderr_tail(&output.stderr)
        )));
    }
    Ok(output)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_TAIL_CHARS).collect()
}
