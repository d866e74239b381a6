// Binding the engine to a remote theme
//
// Runs once, before any file event is admitted. A failed theme listing
// and an unknown theme id both abort engine creation.

use tracing::debug;

use crate::api::{Theme, ThemeApi};
use crate::config::ThemeTarget;
use crate::error::ThemeError;
use crate::report::Reporter;

/// Theme names that deserve a second look before writing to them
const GUARDED_NAMES: &[&str] = &["production", "staging"];

/// Interactive choice of one theme out of the shop's list.
pub trait ThemePicker {
    fn pick(&self, themes: &[Theme]) -> Result<Theme, ThemeError>;
}

/// Picker for non-interactive runs: always refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPicker;

impl ThemePicker for NoPicker {
    fn pick(&self, _themes: &[Theme]) -> Result<Theme, ThemeError> {
        Err(ThemeError::Selection(
            "interactive theme selection is not available".to_string(),
        ))
    }
}

/// Resolve `target` against the shop's theme list.
///
/// Returns `None` for [`ThemeTarget::Unscoped`] without contacting the
/// shop.
pub fn resolve<A: ThemeApi + ?Sized>(
    api: &A,
    target: ThemeTarget,
    host: &str,
    picker: &dyn ThemePicker,
    reporter: &dyn Reporter,
) -> Result<Option<Theme>, ThemeError> {
    if target == ThemeTarget::Unscoped {
        return Ok(None);
    }

    let themes = list_themes(api, reporter)?;
    debug!("{} themes available on {}", themes.len(), host);

    let theme = match target {
        ThemeTarget::Id(id) => {
            let theme = themes.into_iter().find(|t| t.id == id).ok_or_else(|| {
                reporter.error(&format!("Invalid theme id {} for {}", id, host));
                ThemeError::NotFound(id)
            })?;
            reporter.success(&format!(
                "Connected to {} with theme {} ({})",
                host, theme.id, theme.name
            ));
            theme
        }
        ThemeTarget::Interactive => {
            let theme = picker.pick(&themes)?;
            reporter.success(&format!(
                "Selected theme {} ({}) on {}",
                theme.id, theme.name, host
            ));
            theme
        }
        ThemeTarget::Unscoped => return Ok(None),
    };

    if is_guarded(&theme) {
        reporter.warn(&format!(
            "Warning: syncing to theme '{}', which looks like a production or staging theme",
            theme.name
        ));
    }
    Ok(Some(theme))
}

fn list_themes<A: ThemeApi + ?Sized>(
    api: &A,
    reporter: &dyn Reporter,
) -> Result<Vec<Theme>, ThemeError> {
    let list = api.list_themes().map_err(|e| {
        reporter.error(&format!("Could not list themes: {}", e));
        ThemeError::ListFailed(e)
    })?;
    list.themes.ok_or_else(|| {
        reporter.error("Theme list response did not contain any themes");
        ThemeError::MissingThemes
    })
}

/// Whether the theme name mentions production or staging
pub fn is_guarded(theme: &Theme) -> bool {
    let name = theme.name.to_lowercase();
    GUARDED_NAMES.iter().any(|g| name.contains(g))
}
