//! Shared key generation for published artifacts.

use reelstream_core::Resolution;
use uuid::Uuid;

pub const THUMBNAIL_CONTENT_TYPE: &str = "image/png";
pub const RENDITION_CONTENT_TYPE: &str = "video/mp4";

/// `thumbnails/{asset_id}.png`
pub fn thumbnail_key(asset_id: Uuid) -> String {
    format!("thumbnails/{}.png", asset_id)
}

/// `videos/{asset_id}/{tag}.mp4`
pub fn rendition_key(asset_id: Uuid, resolution: Resolution) -> String {
    format!("videos/{}/{}.mp4", asset_id, resolution.tag())
}

/// Rejects keys that could escape a storage root.
pub fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("Storage key is empty");
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err("Storage key must be a relative forward-slash path");
    }
    if key.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return Err("Storage key contains invalid segments");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_keys() {
        let id = Uuid::parse_str("6f1c2b1e-2d0a-4c39-9a57-3b7a5f1f9b11").unwrap();
        assert_eq!(
            thumbnail_key(id),
            "thumbnails/6f1c2b1e-2d0a-4c39-9a57-3b7a5f1f9b11.png"
        );
        assert_eq!(
            rendition_key(id, Resolution::P360),
            "videos/6f1c2b1e-2d0a-4c39-9a57-3b7a5f1f9b11/360.mp4"
        );
        assert!(validate_key(&rendition_key(id, Resolution::P1080)).is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("videos/../../x").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("videos//x").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("videos\\x").is_err());
    }
}
