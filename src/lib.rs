// Library root
// -----------
// Keeps a storefront theme directory in sync with the shop's theme
// asset API. The binary (`main.rs`) wires these modules into the
// `watch`, `deploy` and `themes` commands.
//
// Module responsibilities:
// - `api`: blocking HTTP client for the theme and asset endpoints, and
//   the holder that builds it once per session.
// - `key` / `payload`: asset keys from local paths, request bodies from
//   file contents.
// - `theme`: binds the engine to a remote theme at startup.
// - `ops` / `engine`: per-file upload and delete, and the event loop
//   that sequences them.
// - `watch` / `deploy`: event sources (filesystem watcher, full walk).
// - `config`, `error`, `report`, `ui`: settings, error types, status
//   lines and terminal interaction.
pub mod api;
pub mod config;
pub mod deploy;
pub mod engine;
pub mod error;
pub mod event;
pub mod key;
pub mod ops;
pub mod payload;
pub mod report;
pub mod theme;
pub mod ui;
pub mod watch;

pub use api::{ApiClient, ApiHolder, Credentials, Theme, ThemeApi};
pub use config::{Config, ThemeTarget};
pub use engine::{Engine, Scope, SyncSummary};
pub use error::{ConfigError, EngineError, ThemeError};
pub use event::{Contents, FileEvent};
