// Reconciliation engine
//
// Turns file change events into remote asset writes, one event at a
// time and in arrival order. Each event is forwarded downstream only
// after its remote call finished, so a pipeline can act on the remote
// state (e.g. reload a browser) as soon as it sees the event.
//
// Creation validates the configuration, resolves the base path and
// binds the remote theme before the first event is admitted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use crate::api::{ApiClient, ApiHolder, Theme, ThemeApi};
use crate::config::{Config, Settings};
use crate::error::EngineError;
use crate::event::{Contents, FileEvent};
use crate::key::BasePath;
use crate::ops::{self, OpContext, Outcome};
use crate::report::Reporter;
use crate::theme::{self, ThemePicker};

/// Where the engine writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// No theme configured: events are forwarded without remote calls
    PassThrough,
    /// No theme configured, writes go to the legacy unscoped store
    Legacy,
    Theme(Theme),
}

/// Result of processing one event
#[derive(Debug)]
pub struct Processed {
    /// The original event, unchanged
    pub event: FileEvent,
    /// `None` in pass-through mode
    pub outcome: Option<Outcome>,
}

/// Counters over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub uploaded: usize,
    pub deleted: usize,
    pub failed: usize,
    pub forwarded: usize,
    pub rejected: usize,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: Option<&Outcome>) {
        match outcome {
            Some(Outcome::Uploaded { .. }) => self.uploaded += 1,
            Some(Outcome::Deleted { .. }) => self.deleted += 1,
            Some(Outcome::Failed { .. }) => self.failed += 1,
            None => {}
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.rejected == 0
    }
}

pub struct Engine<A: ThemeApi, R: Reporter> {
    api: Arc<A>,
    reporter: R,
    host: String,
    base: BasePath,
    scope: Scope,
}

impl<R: Reporter> Engine<ApiClient, R> {
    /// Validate `config`, obtain the session client from `holder` and
    /// create the engine.
    pub fn connect(
        config: &Config,
        holder: &ApiHolder,
        reporter: R,
        picker: &dyn ThemePicker,
    ) -> Result<Self, EngineError> {
        let settings = config.validate()?;
        let api = holder.get_api(&settings.credentials)?;
        Self::with_settings(settings, api, reporter, picker)
    }
}

impl<A: ThemeApi, R: Reporter> Engine<A, R> {
    /// Create an engine over an existing client. Configuration errors
    /// are returned before `api` is used.
    pub fn create(
        config: &Config,
        api: Arc<A>,
        reporter: R,
        picker: &dyn ThemePicker,
    ) -> Result<Self, EngineError> {
        let settings = config.validate()?;
        Self::with_settings(settings, api, reporter, picker)
    }

    pub fn with_settings(
        settings: Settings,
        api: Arc<A>,
        reporter: R,
        picker: &dyn ThemePicker,
    ) -> Result<Self, EngineError> {
        let explicit = settings.options.base_path.as_deref();
        let base = BasePath::resolve(explicit).map_err(|source| EngineError::BasePath {
            path: PathBuf::from(explicit.unwrap_or(".")),
            source,
        })?;
        let host = settings.credentials.host;

        let scope = match theme::resolve(&*api, settings.theme, &host, picker, &reporter)? {
            Some(theme) => Scope::Theme(theme),
            None if settings.options.legacy_assets => {
                reporter.info(&format!("Connected to {} (legacy asset store)", host));
                Scope::Legacy
            }
            None => {
                debug!("no theme id configured, forwarding events untouched");
                Scope::PassThrough
            }
        };
        debug!(base = %base.as_path().display(), ?scope, "engine ready");

        Ok(Engine {
            api,
            reporter,
            host,
            base,
            scope,
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn base_path(&self) -> &Path {
        self.base.as_path()
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Theme id sent with remote calls; `None` for the legacy store
    pub fn theme_id(&self) -> Option<u64> {
        match &self.scope {
            Scope::Theme(theme) => Some(theme.id),
            Scope::Legacy | Scope::PassThrough => None,
        }
    }

    /// Process one event and hand it back for forwarding.
    ///
    /// Streamed contents are rejected and the event is dropped.
    pub fn process(&self, event: FileEvent) -> Result<Processed, EngineError> {
        let ctx = OpContext {
            host: &self.host,
            base: &self.base,
            theme_id: self.theme_id(),
            reporter: &self.reporter,
        };
        let outcome = match &event.contents {
            Contents::Stream(_) => {
                return Err(EngineError::StreamingNotSupported {
                    path: event.path.clone(),
                })
            }
            _ if self.scope == Scope::PassThrough => None,
            Contents::Buffer(bytes) => Some(ops::upload(&*self.api, &event.path, bytes, &ctx)),
            Contents::Null => Some(ops::destroy(&*self.api, &event.path, &ctx)),
        };

        Ok(Processed { event, outcome })
    }

    /// Process `events` in order, calling `forward` with each event once
    /// its remote call has completed.
    pub fn run<I, F>(&self, events: I, mut forward: F) -> SyncSummary
    where
        I: IntoIterator<Item = FileEvent>,
        F: FnMut(FileEvent),
    {
        let mut summary = SyncSummary::default();
        for event in events {
            match self.process(event) {
                Ok(processed) => {
                    summary.record(processed.outcome.as_ref());
                    summary.forwarded += 1;
                    forward(processed.event);
                }
                Err(e) => {
                    error!("{}", e);
                    self.reporter.error(&e.to_string());
                    summary.rejected += 1;
                }
            }
        }
        summary
    }
}
