// Human-readable status lines
//
// Everything the user is meant to read (connections, per-file results,
// theme warnings) goes through a `Reporter`. Diagnostics go through
// `tracing` instead.

use crossterm::style::Stylize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Reporter {
    fn report(&self, level: Level, line: &str);

    fn info(&self, line: &str) {
        self.report(Level::Info, line);
    }

    fn success(&self, line: &str) {
        self.report(Level::Success, line);
    }

    fn warn(&self, line: &str) {
        self.report(Level::Warning, line);
    }

    fn error(&self, line: &str) {
        self.report(Level::Error, line);
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, level: Level, line: &str) {
        (**self).report(level, line);
    }
}

/// Colored lines on the terminal. Errors go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub quiet: bool,
}

impl Reporter for ConsoleReporter {
    fn report(&self, level: Level, line: &str) {
        match level {
            Level::Info if self.quiet => {}
            Level::Info => println!("{}", line.cyan()),
            Level::Success if self.quiet => {}
            Level::Success => println!("{}", line.green()),
            Level::Warning => println!("{}", line.yellow().bold()),
            Level::Error => eprintln!("{}", line.red()),
        }
    }
}

/// Keeps every line in memory, for tests and summaries.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Lines recorded at `level`
    pub fn at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: Level, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, line.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_filters_by_level() {
        let reporter = MemoryReporter::new();
        reporter.info("Uploading assets/site.css");
        reporter.error("Error uploading assets/site.css");
        reporter.success("Uploaded assets/site.css");

        assert_eq!(reporter.lines().len(), 3);
        assert_eq!(reporter.at(Level::Error), vec!["Error uploading assets/site.css"]);
        assert!(reporter.at(Level::Warning).is_empty());
    }

    #[test]
    fn test_reporter_by_reference() {
        let reporter = MemoryReporter::new();
        let by_ref: &dyn Reporter = &reporter;
        (&by_ref).warn("careful");
        assert_eq!(reporter.at(Level::Warning), vec!["careful"]);
    }
}
