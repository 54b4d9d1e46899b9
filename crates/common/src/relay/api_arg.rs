use serde::Serialize;

use super::config::{ShareSettings, StorageConfig, WriteMode};

/// Upload argument carried in the `Dropbox-API-Arg` header
#[derive(Debug, Serialize)]
pub(crate) struct CommitInfo<'a> {
    pub autorename: bool,
    pub mode: WriteMode,
    pub mute: bool,
    pub path: &'a str,
    pub strict_conflict: bool,
}

impl<'a> CommitInfo<'a> {
    pub fn new(storage: &StorageConfig, path: &'a str) -> Self {
        Self {
            autorename: storage.autorename,
            mode: storage.mode,
            mute: storage.mute,
            path,
            strict_conflict: storage.strict_conflict,
        }
    }
}

/// JSON body for the create-shared-link call
#[derive(Debug, Serialize)]
pub(crate) struct SharePayload<'a> {
    pub path: &'a str,
    pub settings: &'a ShareSettings,
}

/// Serialize `value` as JSON that is safe to place in an HTTP header.
///
/// Header values must be visible ASCII, so every code point outside
///  that range (and DEL) is written as a `\uXXXX` escape, using a
///  surrogate pair above the BMP. JSON parsers read the result back
///  to the original string.
pub fn header_safe_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() && c != '\u{7f}' {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_info_wire_format() {
        let storage = StorageConfig::default();
        let path = storage.remote_path("photo.png");
        let arg = header_safe_json(&CommitInfo::new(&storage, &path)).unwrap();
        assert_eq!(
            arg,
            r#"{"autorename":false,"mode":"add","mute":false,"path":"/file-upload/photo.png","strict_conflict":false}"#
        );
    }

    #[test]
    fn test_header_safe_json_escapes_non_ascii() {
        let arg = header_safe_json(&serde_json::json!({ "path": "/file-upload/café.png" })).unwrap();
        assert!(arg.is_ascii());
        assert!(arg.contains(r"caf\u00e9.png"));

        let back: serde_json::Value = serde_json::from_str(&arg).unwrap();
        assert_eq!(back["path"], "/file-upload/café.png");
    }

    #[test]
    fn test_header_safe_json_uses_surrogate_pairs() {
        let arg = header_safe_json(&"📷").unwrap();
        assert_eq!(arg, r#""\ud83d\udcf7""#);
        assert!(http_header_value_ok(&arg));
    }

    #[test]
    fn test_share_payload_wire_format() {
        let settings = ShareSettings::default();
        let payload = SharePayload {
            path: "/file-upload/photo.png",
            settings: &settings,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["path"], "/file-upload/photo.png");
        assert_eq!(json["settings"]["access"], "viewer");
        assert_eq!(json["settings"]["allow_download"], true);
    }

    fn http_header_value_ok(value: &str) -> bool {
        reqwest::header::HeaderValue::from_str(value).is_ok()
    }
}
