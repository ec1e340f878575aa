//! Heuristic OCR post-processing: lines in, structured contact fields out.

mod fields;

pub use fields::{extract_fields, filter_lines, raw_text, ContactFields};
