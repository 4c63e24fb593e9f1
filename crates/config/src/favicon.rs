//! Status favicon resolution
//!
//! A favicon may be configured three ways:
//! - a ready `data:image/png;base64,...` URI
//! - raw base64 of a PNG
//! - a path to a `.png` file, relative to the config file
//!
//! All three resolve to the data URI sent in status responses.

use crate::error::{ConfigError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fs;
use std::path::Path;

pub const FAVICON_PREFIX: &str = "data:image/png;base64,";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Resolve a configured favicon to a data URI
///
/// Returns an empty string when no favicon is configured.
pub fn resolve_favicon(value: &str, base_dir: &Path) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }

    if let Some(encoded) = value.strip_prefix(FAVICON_PREFIX) {
        decode_png(encoded)?;
        return Ok(value.to_string());
    }

    if value.to_ascii_lowercase().ends_with(".png") {
        let path = base_dir.join(value);
        let bytes = fs::read(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        if !bytes.starts_with(&PNG_SIGNATURE) {
            return Err(ConfigError::Favicon(format!("{:?} is not a PNG file", path)));
        }
        return Ok(format!("{}{}", FAVICON_PREFIX, BASE64.encode(bytes)));
    }

    decode_png(value)?;
    Ok(format!("{}{}", FAVICON_PREFIX, value))
}

fn decode_png(encoded: &str) -> Result<Vec<u8>> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| ConfigError::Favicon(format!("base64 decode failed: {}", e)))?;
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(ConfigError::Favicon("decoded data is not a PNG image".to_string()));
    }
    Ok(bytes)
}
