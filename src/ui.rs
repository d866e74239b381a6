// UI layer: the interactive theme prompt (dialoguer) and the progress
// display of a full deploy (indicatif). Kept apart from the engine so
// the engine can run headless in a build pipeline.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::Theme;
use crate::error::ThemeError;
use crate::theme::ThemePicker;

/// Keyboard-driven theme selection on the terminal.
///
/// Items are rendered as `<id> - <name> (<role>)`; the selected index
/// maps straight back to the `Theme`, the label is never parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerPicker;

impl ThemePicker for DialoguerPicker {
    fn pick(&self, themes: &[Theme]) -> Result<Theme, ThemeError> {
        if themes.is_empty() {
            return Err(ThemeError::Selection("the shop has no themes".to_string()));
        }
        let items = theme_labels(themes);
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a theme")
            .items(&items)
            .default(default_index(themes))
            .interact()
            .map_err(|e| ThemeError::Selection(e.to_string()))?;
        themes
            .get(selection)
            .cloned()
            .ok_or_else(|| ThemeError::Selection(format!("no theme at index {}", selection)))
    }
}

pub fn theme_labels(themes: &[Theme]) -> Vec<String> {
    themes.iter().map(Theme::to_string).collect()
}

/// Preselect the published theme when there is one
fn default_index(themes: &[Theme]) -> usize {
    themes
        .iter()
        .position(|t| t.role.as_deref() == Some("main"))
        .unwrap_or(0)
}

/// Progress bar for a deploy of `total` files.
pub fn deploy_progress(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn themes() -> Vec<Theme> {
        vec![
            Theme {
                id: 1,
                name: "Debut".to_string(),
                role: Some("unpublished".to_string()),
            },
            Theme {
                id: 2,
                name: "Dawn".to_string(),
                role: Some("main".to_string()),
            },
            Theme {
                id: 3,
                name: "Draft".to_string(),
                role: None,
            },
        ]
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            theme_labels(&themes()),
            vec!["1 - Debut (unpublished)", "2 - Dawn (main)", "3 - Draft"]
        );
    }

    #[test]
    fn test_default_index_prefers_main() {
        assert_eq!(default_index(&themes()), 1);
        assert_eq!(default_index(&themes()[2..]), 0);
    }

    #[test]
    fn test_picker_rejects_empty_list() {
        assert!(matches!(
            DialoguerPicker.pick(&[]),
            Err(ThemeError::Selection(_))
        ));
    }
}
