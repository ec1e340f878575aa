//! Object storage for original card images and their derivatives.

mod api;
mod provider;

pub use provider::{StorageProvider, StoredObject};
