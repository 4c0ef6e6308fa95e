//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors
//! that save by writing a temp file and renaming it would otherwise
//! detach the watch after the first save.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::SiteConfig;

/// Reloads the site config whenever its file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<SiteConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiver that reloaded configs arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<SiteConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned handle must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let target = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &target) => reload(&target, &update_tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<SiteConfig>) {
    tracing::info!(path = ?path, "Config file changed, reloading");
    match load_config(path) {
        Ok(config) => {
            if tx.send(config).is_err() {
                tracing::debug!("Config receiver dropped");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Config reload failed, keeping current configuration");
        }
    }
}

/// Whether `event` creates or modifies the file at `path`.
fn touches(event: &Event, path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}
