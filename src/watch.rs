// Filesystem event source for `themesync watch`.
//
// Wraps a recursive notify watcher and turns its notifications into
// `FileEvent`s: writes become buffered events, removals become
// null-content events. Hidden files and directories are ignored.
//
// A `FileIndex` of the files known under the root lets a directory that
// is moved or removed as a whole expand into one event per file.

use crossbeam_channel::{bounded, Receiver};
use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::deploy::collect_files;
use crate::event::{relative_display, FileEvent};

/// Capacity of the notification queue
const QUEUE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Written,
    Removed,
}

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    index: FileIndex,
    receiver: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    pub fn new(root: impl AsRef<Path>) -> notify::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let (tx, rx) = bounded::<notify::Result<Event>>(QUEUE_SIZE);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(FileWatcher {
            _watcher: watcher,
            index: FileIndex::scan(root),
            receiver: rx,
        })
    }

    /// Blocking iterator over file events, in notification order.
    pub fn events(&mut self) -> impl Iterator<Item = FileEvent> + '_ {
        let index = &mut self.index;
        self.receiver
            .iter()
            .filter_map(|res| match res {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Watch error: {}", e);
                    None
                }
            })
            .flat_map(move |event| index.to_events(&event))
    }
}

/// Files known to exist under a root
#[derive(Debug, Clone)]
pub struct FileIndex {
    root: PathBuf,
    files: BTreeSet<PathBuf>,
}

impl FileIndex {
    /// Index every non-hidden file currently below `root`.
    pub fn scan(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let files = collect_files(&root).into_iter().collect();
        FileIndex { root, files }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Convert one notification into file events for the paths it names.
    pub fn to_events(&mut self, event: &Event) -> Vec<FileEvent> {
        // A rename with both ends reported: old path removed, new one written
        if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
            if let [from, to] = event.paths.as_slice() {
                let mut events = self.removed(from);
                events.extend(self.written(to));
                return events;
            }
        }

        match classify(&event.kind) {
            Some(Change::Removed) => event.paths.iter().flat_map(|p| self.removed(p)).collect(),
            Some(Change::Written) => event.paths.iter().flat_map(|p| self.written(p)).collect(),
            None => Vec::new(),
        }
    }

    /// Deletions for `path`: the file itself, or every known file below
    /// it when it was a directory.
    fn removed(&mut self, path: &Path) -> Vec<FileEvent> {
        if self.files.remove(path) {
            return to_event(&self.root, path, Change::Removed).into_iter().collect();
        }

        let below: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|f| f.starts_with(path))
            .cloned()
            .collect();
        if below.is_empty() {
            // Never seen: created and removed between scans, or an empty dir
            debug!("removal of unknown path {}", path.display());
            return to_event(&self.root, path, Change::Removed).into_iter().collect();
        }

        below
            .into_iter()
            .filter_map(|file| {
                self.files.remove(&file);
                to_event(&self.root, &file, Change::Removed)
            })
            .collect()
    }

    /// Uploads for `path`: the file itself, or every file below it when
    /// a directory was moved into the tree.
    fn written(&mut self, path: &Path) -> Vec<FileEvent> {
        let files = if path.is_dir() {
            collect_files(path)
        } else {
            vec![path.to_path_buf()]
        };

        files
            .into_iter()
            .filter_map(|file| {
                let event = to_event(&self.root, &file, Change::Written)?;
                self.files.insert(file);
                Some(event)
            })
            .collect()
    }
}

/// What a notification means for the files it names
pub fn classify(kind: &EventKind) -> Option<Change> {
    match kind {
        EventKind::Create(_) => Some(Change::Written),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(Change::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(Change::Written),
        EventKind::Remove(RemoveKind::Folder) => None,
        EventKind::Remove(_) => Some(Change::Removed),
        _ => None,
    }
}

/// File event for `path`, or `None` when it should be ignored.
pub fn to_event(root: &Path, path: &Path, change: Change) -> Option<FileEvent> {
    let relative = relative_display(root, path);
    if is_hidden(&relative) {
        return None;
    }

    match change {
        Change::Removed => Some(FileEvent::deleted(path, relative)),
        Change::Written if !path.is_file() => None,
        Change::Written => match std::fs::read(path) {
            Ok(bytes) => Some(FileEvent::buffered(path, relative, bytes)),
            Err(e) => {
                debug!("skipping {}: {}", path.display(), e);
                None
            }
        },
    }
}

/// Whether any component of `relative` starts with a dot
pub fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}
