use mime_guess::mime::{self, Mime};

/// Bytes of a file inspected when guessing its type
pub const SNIFF_LEN: usize = 512;

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
];

/// Guess a content type from the leading bytes of a file.
///
/// Only the first [`SNIFF_LEN`] bytes are considered. Returns `None`
///  when no known signature matches.
pub fn sniff(data: &[u8]) -> Option<Mime> {
    let prefix = &data[..data.len().min(SNIFF_LEN)];

    // RIFF container with a WEBP form type
    if prefix.len() >= 14 && &prefix[..4] == b"RIFF" && &prefix[8..14] == b"WEBPVP" {
        return "image/webp".parse().ok();
    }

    SIGNATURES
        .iter()
        .find(|(signature, _)| prefix.starts_with(signature))
        .and_then(|(_, content_type)| content_type.parse().ok())
}

/// Only JPEG and PNG images may be relayed
pub fn is_allowed(content_type: &Mime) -> bool {
    *content_type == mime::IMAGE_JPEG || *content_type == mime::IMAGE_PNG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_allowed_images() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(sniff(png), Some(mime::IMAGE_PNG));

        let jpeg = b"\xff\xd8\xff\xe0\0\x10JFIF\0";
        assert_eq!(sniff(jpeg), Some(mime::IMAGE_JPEG));

        assert!(is_allowed(&sniff(png).unwrap()));
        assert!(is_allowed(&sniff(jpeg).unwrap()));
    }

    #[test]
    fn test_sniff_disallowed_types() {
        let pdf = sniff(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(pdf, mime::APPLICATION_PDF);
        assert!(!is_allowed(&pdf));

        let gif = sniff(b"GIF89a\x01\0\x01\0").unwrap();
        assert_eq!(gif, mime::IMAGE_GIF);
        assert!(!is_allowed(&gif));

        let webp = sniff(b"RIFF\x24\0\0\0WEBPVP8 ").unwrap();
        assert_eq!(webp.essence_str(), "image/webp");
        assert!(!is_allowed(&webp));
    }

    #[test]
    fn test_sniff_unknown_and_short() {
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"\xff\xd8"), None);
        assert_eq!(sniff(b"hello world"), None);
    }

    #[test]
    fn test_sniff_ignores_bytes_past_prefix() {
        let mut data = vec![0u8; SNIFF_LEN];
        data.extend_from_slice(b"\x89PNG\r\n\x1a\n");
        assert_eq!(sniff(&data), None);
    }
}
