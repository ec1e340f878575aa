use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoloError};
use crate::ocr::preprocessing::{prepare_for_ocr, resize_if_needed};

/// Purpose-specific derivative of an uploaded card image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Grayscale, contrast-stretched input for the OCR engine.
    Ocr,
    /// Small preview for list views.
    Thumbnail,
    /// Display-sized derivative for the web UI.
    Web,
    /// Archival copy retained in the object store.
    Storage,
}

impl VariantKind {
    pub const ALL: [VariantKind; 4] = [
        VariantKind::Ocr,
        VariantKind::Thumbnail,
        VariantKind::Web,
        VariantKind::Storage,
    ];

    pub fn max_dimension(&self) -> u32 {
        match self {
            Self::Ocr => 2048,
            Self::Thumbnail => 320,
            Self::Web => 1280,
            Self::Storage => 2400,
        }
    }

    fn jpeg_quality(&self) -> Option<u8> {
        match self {
            Self::Ocr => None,
            Self::Thumbnail => Some(80),
            Self::Web => Some(85),
            Self::Storage => Some(92),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Ocr => "image/png",
            _ => "image/jpeg",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Ocr => "png",
            _ => "jpg",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ocr => write!(f, "ocr"),
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Web => write!(f, "web"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// An encoded derivative ready for upload.
#[derive(Debug, Clone)]
pub struct Variant {
    pub kind: VariantKind,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Generate all derivatives for an uploaded image.
///
/// A failing derivative is logged and skipped; the call errors only when the
/// source image cannot be decoded or no derivative could be produced at all.
pub fn generate(bytes: &[u8]) -> Result<Vec<Variant>> {
    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RoloError::Processing(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|e| RoloError::Processing(format!("Failed to decode image: {e}")))?;

    let mut variants = Vec::with_capacity(VariantKind::ALL.len());
    for kind in VariantKind::ALL {
        match generate_one(&img, kind) {
            Ok(variant) => variants.push(variant),
            Err(e) => {
                tracing::warn!(variant = %kind, error = %e, "Skipping failed image variant");
            }
        }
    }

    if variants.is_empty() {
        return Err(RoloError::Processing(
            "All image variants failed to generate".to_string(),
        ));
    }

    Ok(variants)
}

fn generate_one(img: &DynamicImage, kind: VariantKind) -> Result<Variant> {
    let derived = match kind {
        VariantKind::Ocr => prepare_for_ocr(img.clone(), kind.max_dimension()),
        _ => resize_if_needed(img.clone(), kind.max_dimension()),
    };

    let (width, height) = derived.dimensions();
    let mut output = Vec::new();

    match kind.jpeg_quality() {
        Some(quality) => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(derived.to_rgb8());
            let mut cursor = std::io::Cursor::new(&mut output);
            let encoder = JpegEncoder::new_with_quality(
                &mut cursor,
                quality,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| RoloError::Processing(format!("Failed to encode JPEG: {e}")))?;
        }
        None => {
            derived
                .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
                .map_err(|e| RoloError::Processing(format!("Failed to encode PNG: {e}")))?;
        }
    }

    Ok(Variant {
        kind,
        bytes: output,
        content_type: kind.content_type(),
        width,
        height,
    })
}
