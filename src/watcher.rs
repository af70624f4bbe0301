//! Debounced change notifications for a diagram source file.
//!
//! Editors save in bursts (truncate, write, rename), so a change is only
//! reported after the file has been quiet for the debounce interval.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;
use tracing::{trace, warn};

/// Watches one file and yields once per settled edit.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: UnboundedReceiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
}

impl SourceWatcher {
    /// Start watching `path`.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the directory
    /// containing `path` cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Backends report canonical paths.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Wait for the next settled change to the file.
    ///
    /// Returns `false` once the underlying watcher has shut down.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                None => return false,
                Some(Ok(event)) if self.is_relevant(&event) => break,
                Some(Ok(event)) => {
                    trace!(kind = ?event.kind, paths = ?event.paths, "ignoring unrelated event");
                }
                Some(Err(err)) => warn!(%err, "file watch error"),
            }
        }

        let mut deadline = Instant::now() + self.debounce;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => return true,
                event = self.rx.recv() => match event {
                    None => return true,
                    Some(Ok(event)) if self.is_relevant(&event) => {
                        deadline = Instant::now() + self.debounce;
                    }
                    Some(_) => {}
                },
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
