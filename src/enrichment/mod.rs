//! Company-data enrichment via third-party research models.
//!
//! The provider pattern mirrors the OCR module: a configured backend or an
//! `Unavailable` placeholder, selected from `ENRICHMENT_MODEL`. The service
//! layer adds company dedup, freshness-window caching, last-write-wins
//! merging, and per-attempt tracking rows.

mod api;
mod provider;
mod service;

pub use api::EnrichmentApiClient;
pub use provider::{CompanyProfile, EnrichmentBackend, EnrichmentProvider};
pub use service::{
    domain_from_email, normalize_domain, EnrichRequest, EnrichmentOutcome, EnrichmentService,
};
