//! OCR (Optical Character Recognition) Module
//!
//! Extracts line-level text with confidence scores from card images. It
//! supports both local OCR engines (Tesseract) and cloud vision APIs.
//!
//! # Architecture
//!
//! The OCR module follows a provider pattern:
//! - `OcrProvider` selects a backend from `OCR_MODEL`
//! - local backend runs Tesseract via leptess
//! - API backends call hosted vision models over HTTP
//!
//! # Usage
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr)?;
//! let output = ocr.ocr(image_bytes).await?;
//! for line in &output.lines {
//!     println!("{} ({:.2})", line.text, line.confidence);
//! }
//! ```

mod api;
pub(crate) mod preprocessing;
mod provider;

pub use preprocessing::preprocess_image;
pub use provider::{OcrLine, OcrOutput, OcrProvider};
