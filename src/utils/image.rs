//! Data-URI helpers for scanned images.

use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

const DATA_URI_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = "base64,";

/// Image MIME type for a file name, judged by extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime)
}

pub fn is_image(path: &Path) -> bool {
    mime_for_path(path).is_some()
}

pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

pub fn is_valid_image_data_uri(value: &str) -> bool {
    value.starts_with(DATA_URI_PREFIX) && value.contains(BASE64_MARKER)
}
