//! Asset key generation.
//!
//! Keys are 32 bytes from the operating system's CSPRNG encoded as URL-safe
//! base64 without padding, so they can be used verbatim as object keys and
//! URL path segments.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::TryRngCore;
use thiserror::Error;

use crate::modules::media::AspectClass;

/// Number of random bytes in an asset key
pub const ASSET_KEY_BYTES: usize = 32;

#[derive(Debug, Error)]
#[error("Failed to read from the system random source: {0}")]
pub struct KeyError(String);

/// Generate a new random asset key (43 characters, alphabet `A-Z a-z 0-9 - _`)
pub fn generate_asset_key() -> Result<String, KeyError> {
    let mut bytes = [0u8; ASSET_KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| KeyError(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Key for a published video: `<aspect folder>/<random>`
pub fn video_asset_key(aspect: AspectClass) -> Result<String, KeyError> {
    Ok(format!("{}/{}", aspect.folder(), generate_asset_key()?))
}

/// Key for a published thumbnail: `<random>.<extension>`
pub fn thumbnail_asset_key(extension: &str) -> Result<String, KeyError> {
    Ok(format!("{}.{}", generate_asset_key()?, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = (0..10_000)
            .map(|_| generate_asset_key().unwrap())
            .collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_keys_are_url_safe_without_padding() {
        for _ in 0..1_000 {
            let key = generate_asset_key().unwrap();
            // 32 bytes -> ceil(32 * 4 / 3) characters without padding
            assert_eq!(key.len(), 43);
            assert!(key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_video_key_is_prefixed_by_aspect_folder() {
        let key = video_asset_key(AspectClass::Portrait).unwrap();
        let (folder, random) = key.split_once('/').unwrap();
        assert_eq!(folder, "portrait");
        assert_eq!(random.len(), 43);

        assert!(video_asset_key(AspectClass::Landscape)
            .unwrap()
            .starts_with("landscape/"));
        assert!(video_asset_key(AspectClass::Other)
            .unwrap()
            .starts_with("other/"));
    }

    #[test]
    fn test_thumbnail_key_keeps_extension() {
        let key = thumbnail_asset_key("png").unwrap();
        assert!(key.ends_with(".png"));
        assert!(!key.contains('/'));
    }
}
