/// Reduce a client-supplied filename to its final path component.
///
/// Browsers may send a full local path, with either separator.
///  Returns `None` when nothing usable is left.
pub fn sanitize(raw: &str) -> Option<String> {
    let name = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(raw).trim();

    if name.is_empty() || name == "." || name == ".." || name.chars().any(char::is_control) {
        return None;
    }

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize("photo.png").as_deref(), Some("photo.png"));
        assert_eq!(sanitize("  photo.png ").as_deref(), Some("photo.png"));
        assert_eq!(sanitize("été.jpg").as_deref(), Some("été.jpg"));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize("../../etc/photo.png").as_deref(), Some("photo.png"));
        assert_eq!(
            sanitize(r"C:\Users\me\Pictures\photo.png").as_deref(),
            Some("photo.png")
        );
    }

    #[test]
    fn test_sanitize_rejects_empty_names() {
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize("dir/"), None);
        assert_eq!(sanitize(".."), None);
        assert_eq!(sanitize("a/."), None);
        assert_eq!(sanitize("bad\nname.png"), None);
    }
}
