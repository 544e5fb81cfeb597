//! File extension sniffing for downloaded media.
//!
//! The CDN serves a handful of raster formats; anything unrecognized keeps
//! whatever extension the URL carried, or falls back to `jpg`.

/// Detect a file extension from magic bytes.
pub(crate) fn detect_extension(data: &[u8]) -> Option<&'static str> {
    if data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some("png");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF8") {
        return Some("gif");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    None
}

/// Pick the extension for a downloaded payload: magic bytes first, then the
/// URL path, then `jpg`.
pub(crate) fn extension_for(data: &[u8], url: &str) -> String {
    if let Some(ext) = detect_extension(data) {
        return ext.to_string();
    }
    url_extension(url).unwrap_or_else(|| "jpg".to_string())
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 4 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
