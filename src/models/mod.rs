mod card;
mod common;
mod company;
mod ocr_job;

pub use card::{Card, CardSummary, CreateCardRequest, ListCardsRequest};
pub use common::{CardSource, EnrichmentStatus, OcrJobStatus, Pagination};
pub use company::{Company, CompanyEnrichment};
pub use ocr_job::OcrJob;
