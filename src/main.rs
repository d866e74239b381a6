// Entrypoint for the CLI application.
// - Keeps `main` small: load the configuration, build the engine and
//   hand it to the selected command.
// - Returns `anyhow::Result`; only configuration and theme binding
//   failures stop the process, per-file errors are reported and skipped.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use themesync::api::ApiHolder;
use themesync::config::Config;
use themesync::engine::Engine;
use themesync::report::{ConsoleReporter, Reporter};
use themesync::theme::{NoPicker, ThemePicker};
use themesync::ui::{deploy_progress, theme_labels, DialoguerPicker};
use themesync::watch::FileWatcher;
use themesync::ThemeApi;

#[derive(Parser)]
#[command(name = "themesync")]
#[command(about = "Sync a storefront theme directory with the shop's theme assets")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "THEMESYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Overrides {
    /// Private app API key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Private app password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Shop host, e.g. example.myshopify.com
    #[arg(long, global = true)]
    host: Option<String>,

    /// Numeric theme id, or `ttyl` to choose interactively
    #[arg(long, global = true)]
    theme_id: Option<String>,

    /// Root directory asset keys are computed from
    #[arg(long, global = true)]
    base_path: Option<String>,

    /// Without a theme id, write to the legacy asset store
    #[arg(long, global = true)]
    legacy: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory and sync every change
    Watch {
        /// Directory to watch (defaults to the base path)
        dir: Option<PathBuf>,
    },
    /// Upload every file of a directory once
    Deploy {
        /// Directory to deploy (defaults to the base path)
        dir: Option<PathBuf>,
    },
    /// List the shop's themes
    Themes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let config = file_config.merge(Config {
        api_key: cli.overrides.api_key,
        password: cli.overrides.password,
        host: cli.overrides.host,
        theme_id: cli.overrides.theme_id,
        base_path: cli.overrides.base_path,
        legacy_assets: cli.overrides.legacy,
    });

    let reporter = ConsoleReporter { quiet: cli.quiet };
    let holder = ApiHolder::new();

    match cli.command {
        Commands::Themes => list_themes(&config, &holder, &reporter),
        Commands::Watch { dir } => {
            let engine = Engine::connect(&config, &holder, reporter, picker())?;
            let root = dir.unwrap_or_else(|| engine.base_path().to_path_buf());
            let mut watcher = FileWatcher::new(&root)
                .with_context(|| format!("Failed to watch {}", root.display()))?;
            engine.reporter().info(&format!("Watching {}", root.display()));

            engine.run(watcher.events(), |event| {
                tracing::debug!("synced {}", event.relative.display());
            });
            Ok(())
        }
        Commands::Deploy { dir } => {
            let engine = Engine::connect(&config, &holder, reporter, picker())?;
            let root = dir.unwrap_or_else(|| engine.base_path().to_path_buf());
            let summary = themesync::deploy::deploy(&engine, &root, &deploy_progress(0))?;

            engine.reporter().info(&format!(
                "Deploy finished: {} uploaded, {} failed",
                summary.uploaded, summary.failed
            ));
            if !summary.is_clean() {
                anyhow::bail!("{} file(s) failed to deploy", summary.failed + summary.rejected);
            }
            Ok(())
        }
    }
}

/// Interactive selection only when attached to a terminal
fn picker() -> &'static dyn ThemePicker {
    use std::io::IsTerminal;
    if std::io::stdin().is_terminal() {
        &DialoguerPicker
    } else {
        &NoPicker
    }
}

fn list_themes(config: &Config, holder: &ApiHolder, reporter: &ConsoleReporter) -> Result<()> {
    let settings = config.validate()?;
    let api = holder.get_api(&settings.credentials)?;
    let list = api.list_themes().context("Failed to list themes")?;
    let themes = list.themes.unwrap_or_default();
    if themes.is_empty() {
        reporter.warn("No themes found");
    }
    for label in theme_labels(&themes) {
        println!("{}", label);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "themesync=debug" } else { "themesync=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
