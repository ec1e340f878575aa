//! Image validation and derivative generation for card uploads.

pub mod validator;
pub mod variants;

pub use validator::{validate, ValidatedImage};
pub use variants::{generate, Variant, VariantKind};
