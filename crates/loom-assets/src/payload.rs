//! Payload inspection: format sniffing, `data:` URIs and fingerprints.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Image formats accepted as assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Svg,
}

impl AssetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AssetFormat::Png => "png",
            AssetFormat::Jpeg => "jpg",
            AssetFormat::Gif => "gif",
            AssetFormat::Webp => "webp",
            AssetFormat::Svg => "svg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(AssetFormat::Png),
            "jpg" | "jpeg" => Some(AssetFormat::Jpeg),
            "gif" => Some(AssetFormat::Gif),
            "webp" => Some(AssetFormat::Webp),
            "svg" => Some(AssetFormat::Svg),
            _ => None,
        }
    }

    fn raster(&self) -> Option<image::ImageFormat> {
        match self {
            AssetFormat::Png => Some(image::ImageFormat::Png),
            AssetFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            AssetFormat::Gif => Some(image::ImageFormat::Gif),
            AssetFormat::Webp => Some(image::ImageFormat::WebP),
            AssetFormat::Svg => None,
        }
    }
}

/// SHA-256 of an asset's bytes, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// Accept a full 64-character lowercase hex digest.
    pub fn parse(hex: &str) -> Option<Self> {
        let valid = hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Fingerprint(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first 16 hex digits, used in file names.
    pub fn short(&self) -> &str {
        &self.0[..16]
    }

    /// Stable output file name for an asset with this fingerprint.
    pub fn file_name(&self, format: AssetFormat) -> String {
        format!("{}.{}", self.short(), format.extension())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a payload was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,

    #[error("unrecognised image format")]
    UnknownFormat,

    #[error("unsupported image format {0}")]
    Unsupported(String),

    #[error("corrupt {format} payload: {reason}")]
    Corrupt { format: &'static str, reason: String },

    #[error("malformed data URI: {0}")]
    DataUri(String),
}

/// Identify a payload and make sure it decodes.
pub fn sniff(bytes: &[u8]) -> Result<AssetFormat, PayloadError> {
    if bytes.is_empty() {
        return Err(PayloadError::Empty);
    }
    if looks_like_svg(bytes) {
        return Ok(AssetFormat::Svg);
    }

    let guessed = image::guess_format(bytes).map_err(|_| PayloadError::UnknownFormat)?;
    let format = match guessed {
        image::ImageFormat::Png => AssetFormat::Png,
        image::ImageFormat::Jpeg => AssetFormat::Jpeg,
        image::ImageFormat::Gif => AssetFormat::Gif,
        image::ImageFormat::WebP => AssetFormat::Webp,
        other => return Err(PayloadError::Unsupported(format!("{other:?}"))),
    };

    if let Some(raster) = format.raster() {
        image::load_from_memory_with_format(bytes, raster).map_err(|e| PayloadError::Corrupt {
            format: format.extension(),
            reason: e.to_string(),
        })?;
    }

    Ok(format)
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Whether a reference is an inline `data:` URI.
pub fn is_data_uri(reference: &str) -> bool {
    reference.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Decode a `data:` URI payload. Base64 and plain (unescaped) payloads are
/// supported.
pub fn decode_data_uri(reference: &str) -> Result<Vec<u8>, PayloadError> {
    if !is_data_uri(reference) {
        return Err(PayloadError::DataUri("missing data: scheme".to_string()));
    }
    let (header, data) = reference[5..]
        .split_once(',')
        .ok_or_else(|| PayloadError::DataUri("missing ',' separator".to_string()))?;

    if header.split(';').any(|param| param.eq_ignore_ascii_case("base64")) {
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        return STANDARD
            .decode(compact)
            .map_err(|e| PayloadError::DataUri(e.to_string()));
    }

    if data.contains('%') {
        return Err(PayloadError::DataUri("percent-encoded payloads are not supported".to_string()));
    }
    Ok(data.as_bytes().to_vec())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([shade, shade, shade, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff(&png(2, 2, 10)).unwrap(), AssetFormat::Png);
    }

    #[test]
    fn test_sniff_truncated_png_is_corrupt() {
        let bytes = png(8, 8, 10);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(sniff(truncated), Err(PayloadError::Corrupt { format: "png", .. })));
    }

    #[test]
    fn test_sniff_svg() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"/>"#;
        assert_eq!(sniff(svg).unwrap(), AssetFormat::Svg);
        assert_eq!(sniff(b"  <svg></svg>").unwrap(), AssetFormat::Svg);
    }

    #[test]
    fn test_sniff_rejects_garbage() {
        assert_eq!(sniff(b"hello world"), Err(PayloadError::UnknownFormat));
        assert_eq!(sniff(b""), Err(PayloadError::Empty));
    }

    #[test]
    fn test_data_uri() {
        let bytes = png(1, 1, 0);
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
        assert!(is_data_uri(&uri));
        assert_eq!(decode_data_uri(&uri).unwrap(), bytes);

        assert_eq!(decode_data_uri("data:image/svg+xml,<svg/>").unwrap(), b"<svg/>");
        assert!(decode_data_uri("data:image/svg+xml,%3Csvg%2F%3E").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn test_fingerprint() {
        let fp = Fingerprint::of(b"abc");
        assert_eq!(fp.as_str(), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(fp.file_name(AssetFormat::Png), "ba7816bf8f01cfea.png");
        assert_eq!(Fingerprint::parse(fp.as_str()), Some(fp));
        assert_eq!(Fingerprint::parse("abc"), None);
    }
}
