use image::{GenericImageView, ImageReader};

use crate::config::UploadConfig;
use crate::error::{Result, RoloError};

/// Raster formats accepted for card uploads, as detected from the content
/// signature (magic bytes). Claimed content types and file extensions are
/// never trusted over the signature.
const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/tiff",
    "image/bmp",
    "image/gif",
];

/// Result of validating an uploaded image.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedImage {
    /// Detected MIME type (from magic bytes).
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// `width / height`, rounded to two decimal places.
    pub aspect_ratio: f32,
    pub size_bytes: u64,
}

/// Validate upload bytes against configured limits.
///
/// Checks, in order: non-empty and within `max_file_size`; content signature
/// is a supported raster type; the data actually decodes; dimensions within
/// `min..=max`; aspect ratio (either orientation) within `max_aspect_ratio`.
pub fn validate(bytes: &[u8], config: &UploadConfig) -> Result<ValidatedImage> {
    if bytes.is_empty() {
        return Err(RoloError::Validation("Uploaded file is empty".to_string()));
    }

    if bytes.len() as u64 > config.max_file_size {
        return Err(RoloError::Validation(format!(
            "File too large: {} bytes (max {} bytes)",
            bytes.len(),
            config.max_file_size
        )));
    }

    let kind = infer::get(bytes).ok_or_else(|| {
        RoloError::Validation("Unrecognized file content: not a supported image".to_string())
    })?;

    let mime_type = kind.mime_type();
    if !ACCEPTED_MIME_TYPES.contains(&mime_type) {
        return Err(RoloError::Validation(format!(
            "Unsupported file type: {mime_type}"
        )));
    }

    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RoloError::Validation(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|e| RoloError::Validation(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();

    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(RoloError::Validation(format!(
            "Image too small: {}x{}, minimum {}x{}",
            width, height, config.min_image_dimension, config.min_image_dimension
        )));
    }

    if width > config.max_image_dimension || height > config.max_image_dimension {
        return Err(RoloError::Validation(format!(
            "Image too large: {}x{}, maximum {}x{}",
            width, height, config.max_image_dimension, config.max_image_dimension
        )));
    }

    let aspect_ratio = round2(width as f32 / height as f32);
    let longest_over_shortest = round2(width.max(height) as f32 / width.min(height) as f32);
    if longest_over_shortest > config.max_aspect_ratio {
        return Err(RoloError::Validation(format!(
            "Aspect ratio {longest_over_shortest} exceeds maximum {}",
            config.max_aspect_ratio
        )));
    }

    Ok(ValidatedImage {
        mime_type: mime_type.to_string(),
        width,
        height,
        aspect_ratio,
        size_bytes: bytes.len() as u64,
    })
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    fn test_config() -> UploadConfig {
        UploadConfig {
            max_file_size: 10 * 1024 * 1024,
            max_image_dimension: 4000,
            min_image_dimension: 100,
            max_aspect_ratio: 4.0,
        }
    }

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut output = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
            .unwrap();
        output
    }

    fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut output = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Jpeg)
            .unwrap();
        output
    }

    #[test]
    fn accepts_valid_png() {
        let bytes = encode_png(600, 350);
        let validated = validate(&bytes, &test_config()).unwrap();

        assert_eq!(validated.mime_type, "image/png");
        assert_eq!(validated.width, 600);
        assert_eq!(validated.height, 350);
        assert_eq!(validated.size_bytes, bytes.len() as u64);
    }

    #[test]
    fn accepts_valid_jpeg() {
        let bytes = encode_jpeg(600, 350);
        let validated = validate(&bytes, &test_config()).unwrap();
        assert_eq!(validated.mime_type, "image/jpeg");
    }

    #[test]
    fn aspect_ratio_rounds_to_two_decimals() {
        // 600/350 = 1.714285... -> 1.71
        let bytes = encode_png(600, 350);
        let validated = validate(&bytes, &test_config()).unwrap();
        assert_eq!(validated.aspect_ratio, 1.71);

        // 350/600 = 0.58333... -> 0.58
        let bytes = encode_png(350, 600);
        let validated = validate(&bytes, &test_config()).unwrap();
        assert_eq!(validated.aspect_ratio, 0.58);
    }

    #[test]
    fn rejects_empty_input() {
        let err = validate(&[], &test_config()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_oversized_file() {
        let config = UploadConfig {
            max_file_size: 64,
            ..test_config()
        };
        let bytes = encode_png(200, 200);
        let err = validate(&bytes, &config).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn rejects_non_image_content() {
        let err = validate(b"definitely not an image payload", &test_config()).unwrap_err();
        assert!(matches!(err, RoloError::Validation(_)));
    }

    #[test]
    fn rejects_unsupported_signature() {
        // %PDF-1.4 magic bytes: a recognized type, but not a raster image.
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend_from_slice(&[0u8; 64]);
        let err = validate(&pdf, &test_config()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn rejects_below_min_dimension() {
        let bytes = encode_png(50, 300);
        let err = validate(&bytes, &test_config()).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn rejects_above_max_dimension() {
        let config = UploadConfig {
            max_image_dimension: 500,
            ..test_config()
        };
        let bytes = encode_png(600, 300);
        let err = validate(&bytes, &config).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn accepts_dimensions_exactly_at_limits() {
        let config = UploadConfig {
            max_image_dimension: 500,
            min_image_dimension: 100,
            ..test_config()
        };
        assert!(validate(&encode_png(100, 100), &config).is_ok());
        assert!(validate(&encode_png(500, 500), &config).is_ok());
    }

    #[test]
    fn rejects_extreme_aspect_ratio() {
        let bytes = encode_png(2000, 200);
        let err = validate(&bytes, &test_config()).unwrap_err();
        assert!(err.to_string().contains("Aspect ratio"));
    }

    #[test]
    fn accepts_extreme_aspect_ratio_in_either_orientation_when_allowed() {
        let config = UploadConfig {
            max_aspect_ratio: 12.0,
            ..test_config()
        };
        assert!(validate(&encode_png(2000, 200), &config).is_ok());
        assert!(validate(&encode_png(200, 2000), &config).is_ok());
    }
}
