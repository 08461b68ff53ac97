use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating asset keys written below a local asset root
    /// One or more URL-safe base64 segments separated by `/`, optional lowercase extension
    /// - Valid: "abc_DEF-123", "portrait/abc123", "abc123.png"
    /// - Invalid: "../etc/passwd", "/abs", "a//b", "a/", "a.PNG", "a b"
    pub static ref ASSET_KEY_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9_-]+(?:/[A-Za-z0-9_-]+)*(?:\.[a-z0-9]+)?$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_regex_valid() {
        assert!(ASSET_KEY_REGEX.is_match("abc_DEF-123"));
        assert!(ASSET_KEY_REGEX.is_match("portrait/abc123"));
        assert!(ASSET_KEY_REGEX.is_match("abc123.png"));
        assert!(ASSET_KEY_REGEX.is_match("other/x-y_z.mp4"));
    }

    #[test]
    fn test_asset_key_regex_invalid() {
        assert!(!ASSET_KEY_REGEX.is_match("../etc/passwd")); // traversal
        assert!(!ASSET_KEY_REGEX.is_match("/abs")); // absolute
        assert!(!ASSET_KEY_REGEX.is_match("a//b")); // empty segment
        assert!(!ASSET_KEY_REGEX.is_match("a/")); // trailing slash
        assert!(!ASSET_KEY_REGEX.is_match("a.PNG")); // uppercase extension
        assert!(!ASSET_KEY_REGEX.is_match("a b")); // space
        assert!(!ASSET_KEY_REGEX.is_match("")); // empty
    }
}
