//! Recipe image storage.
//!
//! Images arrive inline as base64 data URLs (`data:image/png;base64,...`).
//! The only transformation performed here is the base64-to-binary decode at
//! the boundary: the decoded bytes are written under the configured media
//! root and the stored value is the relative path, served back via the
//! static `/media` route.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use uuid::Uuid;

use crate::errors::Error;

/// Decode a `data:image/...;base64,...` URL and write it under `media_root`.
///
/// Returns the path relative to the media root.
pub async fn store_base64_image(data_url: &str, media_root: &Path) -> Result<String, Error> {
    let (format, payload) = parse_data_url(data_url)?;

    let bytes = general_purpose::STANDARD.decode(payload).map_err(|e| Error::Validation {
        field: "image".to_string(),
        message: format!("invalid base64 image data: {e}"),
    })?;

    let relative = format!("recipes/{}.{}", Uuid::new_v4(), format);
    let target = media_root.join(&relative);

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| Error::Internal {
            operation: format!("create media directory: {e}"),
        })?;
    }
    tokio::fs::write(&target, bytes).await.map_err(|e| Error::Internal {
        operation: format!("write image file: {e}"),
    })?;

    Ok(relative)
}

/// Split a data URL into its image format and base64 payload
fn parse_data_url(data_url: &str) -> Result<(&str, &str), Error> {
    let invalid = || Error::Validation {
        field: "image".to_string(),
        message: "image must be a data:image/...;base64,... URL".to_string(),
    };

    let rest = data_url.strip_prefix("data:image/").ok_or_else(invalid)?;
    let (format, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;

    // The format becomes the file extension; keep it to something sane
    if format.is_empty() || format.len() > 8 || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    Ok((format, payload))
}
