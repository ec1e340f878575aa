mod scan;

pub use scan::{ScanPipeline, StoredUpload, StoredVariant};
