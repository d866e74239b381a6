// One-shot full deploy
//
// Walks a theme directory and feeds every regular, non-hidden file
// through the engine as a buffered event, in sorted path order.

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::api::ThemeApi;
use crate::engine::{Engine, Scope, SyncSummary};
use crate::error::EngineError;
use crate::event::FileEvent;
use crate::report::Reporter;

/// Files a deploy of `root` would upload
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    files
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Upload every file below `root` through `engine`.
///
/// Files that cannot be read are reported and counted as failures. An
/// engine in pass-through mode would upload nothing and is refused.
pub fn deploy<A: ThemeApi, R: Reporter>(
    engine: &Engine<A, R>,
    root: &Path,
    progress: &ProgressBar,
) -> Result<SyncSummary, EngineError> {
    if engine.scope() == &Scope::PassThrough {
        engine
            .reporter()
            .warn("No theme id configured: set a theme id or --legacy to deploy");
        return Err(EngineError::NothingToDeploy);
    }

    let files = collect_files(root);
    progress.set_length(files.len() as u64);

    let mut unreadable = 0;
    let events = files.into_iter().filter_map(|path| match FileEvent::read(root, &path) {
        Ok(event) => Some(event),
        Err(e) => {
            engine
                .reporter()
                .error(&format!("Error reading {}: {}", path.display(), e));
            unreadable += 1;
            progress.inc(1);
            None
        }
    });

    let mut summary = engine.run(events, |event| {
        progress.set_message(event.relative.display().to_string());
        progress.inc(1);
    });
    summary.failed += unreadable;
    progress.finish_and_clear();
    Ok(summary)
}
