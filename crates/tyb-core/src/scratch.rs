//! Per-request scratch directories under the download directory.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::Result;

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// A directory owned by one request. Removed with its contents on drop, so
/// every exit path (success, error, early return, panic unwind) cleans up
/// partial downloads too.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub async fn create(root: &Path, label: &str) -> Result<Self> {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = root.join(format!("{label}_{ts}_{n}"));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a file inside the directory; the name is sanitized.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(sanitize_filename(name))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        // Blocking, but the directory holds at most one download and its
        // partial files.
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove scratch dir: {e}");
            }
        }
    }
}

/// Keep letters, digits, spaces, `.`, `_` and `-`; never produce a path separator.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() || matches!(ch, '.' | '_' | '-' | ' ') {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    let out = out.trim().trim_start_matches('.').to_string();
    if out.is_empty() {
        "file".to_string()
    } else {
        out
    }
}
