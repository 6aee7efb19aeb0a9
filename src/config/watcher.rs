//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Watches the parent directory so rename-replace saves and symlink swaps
//!   keep reloading
//! - Events are filtered to the config file name, or to a change of the
//!   file's resolved target
//! - An invalid file is logged and skipped; the running config stays

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RelayConfig;

/// Pushes a validated [`RelayConfig`] every time the file on disk changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RelayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RelayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut reloader = Reloader {
            target: std::fs::canonicalize(&self.path).ok(),
            path: self.path.clone(),
            file_name,
            tx: self.update_tx,
            closed: false,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => reloader.handle(&event),
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

struct Reloader {
    path: PathBuf,
    file_name: OsString,
    target: Option<PathBuf>,
    tx: mpsc::UnboundedSender<RelayConfig>,
    closed: bool,
}

impl Reloader {
    fn handle(&mut self, event: &Event) {
        if self.closed || !(event.kind.is_modify() || event.kind.is_create()) {
            return;
        }

        let named = event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(self.file_name.as_os_str()));
        let target = std::fs::canonicalize(&self.path).ok();
        let retargeted = target.is_some() && target != self.target;
        if !named && !retargeted {
            return;
        }
        self.target = target;

        tracing::info!(path = ?self.path, "Config file change detected, reloading");
        match load_config(&self.path) {
            Ok(config) => {
                if self.tx.send(config).is_err() {
                    tracing::warn!("Config receiver dropped, ignoring further changes");
                    self.closed = true;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            }
        }
    }
}
