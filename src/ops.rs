// Single-file remote operations
//
// `upload` and `destroy` each issue one remote call and always return
// an `Outcome`. Remote failures end the operation for that file only.

use std::path::Path;
use tracing::{debug, warn};

use crate::api::{ApiError, ThemeApi};
use crate::event::relative_display;
use crate::key::{make_asset_key, BasePath};
use crate::payload;
use crate::report::Reporter;

/// Everything an operation needs besides the file itself
pub struct OpContext<'a> {
    pub host: &'a str,
    pub base: &'a BasePath,
    /// `None` targets the legacy unscoped asset store
    pub theme_id: Option<u64>,
    pub reporter: &'a dyn Reporter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Uploaded { key: String },
    Deleted { key: String },
    Failed { path: String, error: String },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// Create or update the asset for `filepath` with `contents`.
pub fn upload<A: ThemeApi + ?Sized>(
    api: &A,
    filepath: &Path,
    contents: &[u8],
    ctx: &OpContext<'_>,
) -> Outcome {
    let shown = relative_display(ctx.base.as_path(), filepath).display().to_string();
    let key = match make_asset_key(filepath, ctx.base) {
        Ok(key) => key,
        Err(e) => return fail(ctx, "uploading", shown, e.to_string()),
    };
    let body = payload::encode(key.clone(), contents);

    ctx.reporter
        .info(&format!("Uploading {} to {}", shown, ctx.host));
    debug!(key = %key, theme_id = ?ctx.theme_id, binary = body.attachment().is_some(), "update asset");

    match api.update_asset(ctx.theme_id, &body) {
        Ok(_) => {
            ctx.reporter.success(&format!("Uploaded {}", shown));
            Outcome::Uploaded { key }
        }
        Err(e) => fail(ctx, "uploading", shown, describe(&e)),
    }
}

/// Remove the asset for `filepath`.
pub fn destroy<A: ThemeApi + ?Sized>(api: &A, filepath: &Path, ctx: &OpContext<'_>) -> Outcome {
    let shown = relative_display(ctx.base.as_path(), filepath).display().to_string();
    let key = match make_asset_key(filepath, ctx.base) {
        Ok(key) => key,
        Err(e) => return fail(ctx, "removing", shown, e.to_string()),
    };

    ctx.reporter
        .info(&format!("Removing {} from {}", shown, ctx.host));
    debug!(key = %key, theme_id = ?ctx.theme_id, "delete asset");

    match api.delete_asset(ctx.theme_id, &key) {
        Ok(_) => {
            ctx.reporter.success(&format!("Removed {}", shown));
            Outcome::Deleted { key }
        }
        Err(e) => fail(ctx, "removing", shown, describe(&e)),
    }
}

/// One line for a remote error: the validation messages when there are
/// some, the error type otherwise.
pub fn describe(error: &ApiError) -> String {
    match error.asset_messages() {
        Some(messages) => messages.join(", "),
        None => format!("API response error ({})", error.kind),
    }
}

fn fail(ctx: &OpContext<'_>, action: &str, shown: String, error: String) -> Outcome {
    warn!("{} {} failed: {}", action, shown, error);
    ctx.reporter
        .error(&format!("Error {} {}: {}", action, shown, error));
    Outcome::Failed {
        path: shown,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ThemeList, GENERIC_ERROR};
    use crate::payload::AssetPayload;
    use crate::report::{Level, MemoryReporter};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        updates: RefCell<Vec<(Option<u64>, AssetPayload)>>,
        deletes: RefCell<Vec<(Option<u64>, String)>>,
        fail_with: Option<ApiError>,
    }

    impl ThemeApi for Recorder {
        fn list_themes(&self) -> Result<ThemeList, ApiError> {
            Ok(ThemeList::default())
        }

        fn update_asset(&self, theme_id: Option<u64>, payload: &AssetPayload) -> Result<serde_json::Value, ApiError> {
            self.updates.borrow_mut().push((theme_id, payload.clone()));
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(serde_json::json!({})),
            }
        }

        fn delete_asset(&self, theme_id: Option<u64>, key: &str) -> Result<serde_json::Value, ApiError> {
            self.deletes.borrow_mut().push((theme_id, key.to_string()));
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(serde_json::json!({})),
            }
        }
    }

    fn ctx<'a>(base: &'a BasePath, theme_id: Option<u64>, reporter: &'a MemoryReporter) -> OpContext<'a> {
        OpContext {
            host: "example.myshopify.com",
            base,
            theme_id,
            reporter,
        }
    }

    #[test]
    fn test_upload_scoped_to_theme() {
        let api = Recorder::default();
        let base = BasePath::from_absolute("/proj");
        let reporter = MemoryReporter::new();

        let outcome = upload(&api, Path::new("/proj/assets/site.css"), b"a{}", &ctx(&base, Some(7), &reporter));

        assert_eq!(outcome, Outcome::Uploaded { key: "assets/site.css".to_string() });
        let updates = api.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, Some(7));
        assert_eq!(updates[0].1.value(), Some("a{}"));
        assert_eq!(reporter.at(Level::Info), vec!["Uploading assets/site.css to example.myshopify.com"]);
        assert_eq!(reporter.at(Level::Success), vec!["Uploaded assets/site.css"]);
    }

    #[test]
    fn test_upload_legacy_store() {
        let api = Recorder::default();
        let base = BasePath::from_absolute("/proj");
        let reporter = MemoryReporter::new();

        upload(&api, Path::new("/proj/assets/logo.png"), b"\x89PNG\r\n\x1a\n", &ctx(&base, None, &reporter));

        let updates = api.updates.borrow();
        assert_eq!(updates[0].0, None);
        assert!(updates[0].1.attachment().is_some());
    }

    #[test]
    fn test_upload_invalid_request_joins_details() {
        let api = Recorder {
            fail_with: Some(ApiError::invalid(vec!["is invalid".to_string(), "is empty".to_string()])),
            ..Recorder::default()
        };
        let base = BasePath::from_absolute("/proj");
        let reporter = MemoryReporter::new();

        let outcome = upload(&api, Path::new("/proj/templates/index.liquid"), b"{{", &ctx(&base, Some(1), &reporter));

        assert!(outcome.is_failure());
        let errors = reporter.at(Level::Error);
        assert_eq!(errors, vec!["Error uploading templates/index.liquid: is invalid, is empty"]);
    }

    #[test]
    fn test_generic_error_reports_type() {
        let api = Recorder {
            fail_with: Some(ApiError::new(GENERIC_ERROR, "500 - boom")),
            ..Recorder::default()
        };
        let base = BasePath::from_absolute("/proj");
        let reporter = MemoryReporter::new();

        let outcome = destroy(&api, Path::new("/proj/snippets/foo.liquid"), &ctx(&base, Some(1), &reporter));

        assert_eq!(
            outcome,
            Outcome::Failed {
                path: "snippets/foo.liquid".to_string(),
                error: "API response error (ShopifyError)".to_string(),
            }
        );
        assert_eq!(api.deletes.borrow().len(), 1);
    }

    #[test]
    fn test_destroy_uses_encoded_key() {
        let api = Recorder::default();
        let base = BasePath::from_absolute("/proj");
        let reporter = MemoryReporter::new();

        let outcome = destroy(&api, Path::new("/proj/assets/old file.js"), &ctx(&base, Some(3), &reporter));

        assert_eq!(outcome, Outcome::Deleted { key: "assets/old%20file.js".to_string() });
        assert_eq!(*api.deletes.borrow(), vec![(Some(3), "assets/old%20file.js".to_string())]);
        assert_eq!(reporter.at(Level::Success), vec!["Removed assets/old file.js"]);
    }
}
