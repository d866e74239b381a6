// Asset request payloads
//
// Text files travel as a UTF-8 `value`, everything else as a base64
// `attachment`. The choice is made on the bytes, never the extension.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Request body of an asset create/update: `{"asset": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPayload {
    pub asset: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub key: String,
    #[serde(flatten)]
    pub body: AssetBody,
}

/// Exactly one of `value` or `attachment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetBody {
    Value(String),
    Attachment(String),
}

impl AssetPayload {
    pub fn key(&self) -> &str {
        &self.asset.key
    }

    pub fn value(&self) -> Option<&str> {
        match &self.asset.body {
            AssetBody::Value(v) => Some(v),
            AssetBody::Attachment(_) => None,
        }
    }

    pub fn attachment(&self) -> Option<&str> {
        match &self.asset.body {
            AssetBody::Attachment(a) => Some(a),
            AssetBody::Value(_) => None,
        }
    }
}

/// Build the payload for `key` from raw file contents.
pub fn encode(key: impl Into<String>, contents: &[u8]) -> AssetPayload {
    let body = match text_of(contents) {
        Some(text) => AssetBody::Value(text.to_string()),
        None => AssetBody::Attachment(STANDARD.encode(contents)),
    };
    AssetPayload {
        asset: Asset {
            key: key.into(),
            body,
        },
    }
}

/// Heuristic binary detection over the file contents.
pub fn is_binary(contents: &[u8]) -> bool {
    text_of(contents).is_none()
}

/// UTF-8 text of `contents`, or `None` when they must travel as an
/// attachment.
fn text_of(contents: &[u8]) -> Option<&str> {
    if content_inspector::inspect(contents).is_binary() {
        return None;
    }
    // UTF-16 and other non-UTF-8 text still goes as an attachment
    std::str::from_utf8(contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_sets_value_only() {
        let payload = encode("assets/site.css", b"body { color: red; }\n");
        assert_eq!(payload.key(), "assets/site.css");
        assert_eq!(payload.value(), Some("body { color: red; }\n"));
        assert!(payload.attachment().is_none());
    }

    #[test]
    fn test_null_byte_sets_attachment_only() {
        let bytes = b"GIF\x00\x01\x02binary";
        let payload = encode("assets/blob.bin", bytes);
        assert!(payload.value().is_none());
        assert_eq!(payload.attachment(), Some(STANDARD.encode(bytes).as_str()));
    }

    #[test]
    fn test_png_header_is_binary() {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(b"\x00\x00\x00\x0dIHDR");
        assert!(is_binary(&bytes));
    }

    #[test]
    fn test_utf16_text_goes_as_attachment() {
        // BOM + "hi" in UTF-16LE: text to the inspector, not UTF-8
        let bytes = b"\xff\xfeh\x00i\x00";
        let payload = encode("locales/en.json", bytes);
        assert!(payload.value().is_none());
        assert!(payload.attachment().is_some());
    }

    #[test]
    fn test_invalid_utf8_is_binary() {
        assert!(is_binary(&[0xc3, 0x28, 0x41, 0x42]));
    }

    #[test]
    fn test_unicode_text_is_not_binary() {
        assert!(!is_binary("{{ 'café' | t }} – ünïcode".as_bytes()));
        assert!(!is_binary(b""));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(encode("layout/theme.liquid", b"<html>")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"asset": {"key": "layout/theme.liquid", "value": "<html>"}})
        );

        let json = serde_json::to_value(encode("assets/a.bin", &[0, 1, 2])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"asset": {"key": "assets/a.bin", "attachment": "AAEC"}})
        );
    }
}
