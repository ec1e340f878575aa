use crate::config::OcrConfig;
use crate::error::{Result, RoloError};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

/// Preprocess image bytes for OCR
///
/// Applies the following transformations:
/// 1. Validates image dimensions (min/max checks)
/// 2. Resizes large images while maintaining aspect ratio
/// 3. Converts to grayscale
/// 4. Removes alpha channel (RGBA to RGB conversion)
/// 5. Applies histogram-stretch contrast enhancement
///
/// # Arguments
/// * `bytes` - Raw image bytes (PNG, JPEG, etc.)
/// * `config` - OCR configuration containing dimension limits
///
/// # Returns
/// Processed image bytes as PNG, ready for the OCR engine
pub fn preprocess_image(bytes: &[u8], config: &OcrConfig) -> Result<Vec<u8>> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes));
    let reader = reader
        .with_guessed_format()
        .map_err(|e| RoloError::Processing(format!("Failed to read image: {e}")))?;

    let img = reader
        .decode()
        .map_err(|e| RoloError::Processing(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(RoloError::Processing(format!(
            "Image too small: {}x{}, minimum {}x{}",
            width, height, config.min_image_dimension, config.min_image_dimension
        )));
    }

    let img = prepare_for_ocr(img, config.max_image_dimension);

    let mut output = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| RoloError::Processing(format!("Failed to encode image: {e}")))?;

    Ok(output)
}

/// Apply the OCR-oriented transform chain to an already-decoded image.
///
/// Shared with the variant generator so the stored `ocr` derivative matches
/// the bytes the engine actually receives.
pub(crate) fn prepare_for_ocr(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let img = resize_if_needed(img, max_dim);
    let img = img.grayscale();
    let img = remove_alpha(img);
    enhance_contrast(img)
}

/// Resize image if it exceeds maximum dimension while maintaining aspect ratio
///
/// Uses Lanczos3 filter for high-quality downscaling
pub(crate) fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();

    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = if width > height {
        max_dim as f32 / width as f32
    } else {
        max_dim as f32 / height as f32
    };

    let new_width = (width as f32 * ratio) as u32;
    let new_height = (height as f32 * ratio) as u32;

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Remove alpha channel from RGBA images, converting to RGB
///
/// Grayscale images with alpha are converted to grayscale without alpha
fn remove_alpha(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgba8(rgba) => {
            DynamicImage::ImageRgb8(image::RgbImage::from_fn(
                rgba.width(),
                rgba.height(),
                |x, y| {
                    let pixel = rgba.get_pixel(x, y);
                    image::Rgb([pixel[0], pixel[1], pixel[2]])
                },
            ))
        }
        DynamicImage::ImageLumaA8(luma_a) => {
            DynamicImage::ImageLuma8(image::GrayImage::from_fn(
                luma_a.width(),
                luma_a.height(),
                |x, y| {
                    let pixel = luma_a.get_pixel(x, y);
                    image::Luma([pixel[0]])
                },
            ))
        }
        // Already has no alpha channel
        _ => img,
    }
}

/// Apply histogram-stretch contrast enhancement on grayscale input
fn enhance_contrast(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(gray) => {
            DynamicImage::ImageLuma8(enhance_grayscale_contrast(gray))
        }
        DynamicImage::ImageRgb8(rgb) => {
            // OCR engines work better on grayscale input
            let gray = DynamicImage::ImageRgb8(rgb).to_luma8();
            DynamicImage::ImageLuma8(enhance_grayscale_contrast(gray))
        }
        _ => img,
    }
}

/// Maps the darkest pixel to 0 and the lightest to 255, scaling all
/// intermediate values linearly
fn enhance_grayscale_contrast(gray: image::GrayImage) -> image::GrayImage {
    let mut min_val = 255u8;
    let mut max_val = 0u8;

    for pixel in gray.pixels() {
        let val = pixel[0];
        if val < min_val {
            min_val = val;
        }
        if val > max_val {
            max_val = val;
        }
    }

    // Flat image (all one color): nothing to stretch
    if max_val <= min_val {
        return gray;
    }

    let range = (max_val - min_val) as f32;
    image::GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y);
        let normalized = (pixel[0] - min_val) as f32 / range;
        let enhanced = (normalized * 255.0) as u8;
        image::Luma([enhanced])
    })
}
