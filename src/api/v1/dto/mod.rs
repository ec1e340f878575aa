pub mod cards;
pub mod common;
pub mod enrichment;
pub mod scan;
pub mod upload;

pub use cards::{
    CardResponse, CardSummaryResponse, CreateCardRequest, ListCardsQuery, ListCardsResponse,
    SearchCardsRequest, UpdateCardRequest,
};
pub use common::{PaginationResponse, V1CardSource, V1EnrichmentStatus, V1JobStatus};
pub use enrichment::{
    CompanyDetailResponse, CompanyResponse, EnrichCompanyRequest, EnrichCompanyResponse,
    EnrichmentAttemptResponse, ListCompaniesQuery, ListCompaniesResponse,
};
pub use scan::{OcrJobResponse, ScanResponse};
pub use upload::{UploadFailureResponse, UploadResponse, UploadedImageResponse, VariantResponse};
