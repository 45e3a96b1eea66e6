use notify::event::EventKind;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};
use thiserror::Error;

#[derive(Clone, Debug)]
pub enum WatchSignal {
    Changed,
    Error(String),
}

/// Change notifications for the direct children of one directory.
#[derive(Debug)]
pub struct DirWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
    rx: Receiver<WatchSignal>,
}

impl DirWatcher {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn try_recv(&self) -> Option<WatchSignal> {
        self.rx.try_recv().ok()
    }

    /// Collapses everything queued so far into a single signal.
    pub fn drain(&self) -> Option<WatchSignal> {
        let mut latest = None;
        while let Some(signal) = self.try_recv() {
            if matches!(latest, Some(WatchSignal::Error(_))) {
                continue;
            }
            latest = Some(signal);
        }
        latest
    }
}

#[derive(Debug, Error)]
pub enum WatchDirError {
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn watch_dir(path: &Path) -> Result<DirWatcher, WatchDirError> {
    let (tx, rx) = channel::<WatchSignal>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                if should_trigger_refresh(&event) {
                    let _ = tx.send(WatchSignal::Changed);
                }
            }
            Err(error) => {
                let _ = tx.send(WatchSignal::Error(error.to_string()));
            }
        },
        Config::default(),
    )?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;

    Ok(DirWatcher {
        _watcher: watcher,
        dir: path.to_path_buf(),
        rx,
    })
}

fn should_trigger_refresh(event: &notify::Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
}
