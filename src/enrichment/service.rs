use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use nanoid::nanoid;

use crate::db::DatabaseBackend;
use crate::error::{Result, RoloError};
use crate::models::{Company, CompanyEnrichment, EnrichmentStatus};

use super::provider::{CompanyProfile, EnrichmentProvider};

/// Parameters for one enrichment request.
#[derive(Debug, Clone, Default)]
pub struct EnrichRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub force_refresh: bool,
}

/// Result of an enrichment request, cached or fresh.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub company: Company,
    pub enrichment: Option<CompanyEnrichment>,
    /// `false` when the freshness window answered from cache without an
    /// external call.
    pub refreshed: bool,
}

/// Best-effort fixed-window counter for external research calls.
/// Single-instance, in-memory, not linearizable.
#[derive(Debug, Default)]
struct RateWindow {
    window_start_min: i64,
    count: u32,
}

pub struct EnrichmentService {
    db: Arc<dyn DatabaseBackend>,
    provider: EnrichmentProvider,
    freshness: Duration,
    rate_limit_per_minute: u32,
    rate_window: Arc<Mutex<RateWindow>>,
}

impl EnrichmentService {
    pub fn new(db: Arc<dyn DatabaseBackend>, provider: EnrichmentProvider) -> Self {
        let (freshness_days, rate_limit_per_minute) = provider
            .config()
            .map(|c| (c.freshness_days, c.rate_limit_per_minute))
            .unwrap_or((30, 10));

        Self {
            db,
            provider,
            freshness: Duration::days(freshness_days),
            rate_limit_per_minute,
            rate_window: Arc::new(Mutex::new(RateWindow::default())),
        }
    }

    pub fn provider(&self) -> &EnrichmentProvider {
        &self.provider
    }

    /// Enrich a company by domain or name.
    ///
    /// Within the freshness window (and without `force_refresh`) the cached
    /// company and its latest enrichment row are returned and no external
    /// call is made. Otherwise the research provider is called, the result
    /// is merged last-write-wins into the company, and a new enrichment row
    /// records the attempt (completed or failed).
    pub async fn enrich(&self, request: &EnrichRequest) -> Result<EnrichmentOutcome> {
        let domain = request.domain.as_deref().and_then(normalize_domain);
        let name = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

        if domain.is_none() && name.is_none() {
            return Err(RoloError::Validation(
                "Either a company name or a domain is required".to_string(),
            ));
        }

        let mut company = self.resolve_company(name, domain.as_deref()).await?;

        let fresh = company
            .enriched_at
            .is_some_and(|at| Utc::now() - at < self.freshness);

        if fresh && !request.force_refresh {
            let enrichment = self.db.get_latest_enrichment(&company.id).await?;
            tracing::debug!(
                company_id = %company.id,
                "Returning cached enrichment within freshness window"
            );
            return Ok(EnrichmentOutcome {
                company,
                enrichment,
                refreshed: false,
            });
        }

        if !self.provider.is_available() {
            return Err(RoloError::EnrichmentUnavailable(
                "No enrichment provider configured".to_string(),
            ));
        }

        self.check_rate_limit()?;

        let research_name = name.unwrap_or(company.name.as_str());
        match self
            .provider
            .research(research_name, company.domain.as_deref().or(domain.as_deref()))
            .await
        {
            Ok(profile) => {
                merge_profile(&mut company, &profile);
                company.enriched_at = Some(Utc::now());
                company.updated_at = Utc::now();
                self.db.update_company(&company).await?;

                let mut enrichment = CompanyEnrichment::new(
                    nanoid!(),
                    company.id.clone(),
                    self.provider.provider_label(),
                );
                enrichment.status = EnrichmentStatus::Completed;
                enrichment.payload = serde_json::to_value(&profile).ok();
                enrichment.confidence = profile.confidence;
                enrichment.fetched_at = Some(Utc::now());
                self.db.create_enrichment(&enrichment).await?;

                Ok(EnrichmentOutcome {
                    company,
                    enrichment: Some(enrichment),
                    refreshed: true,
                })
            }
            Err(e) => {
                // Failures are tracked, not retried inline.
                let mut enrichment = CompanyEnrichment::new(
                    nanoid!(),
                    company.id.clone(),
                    self.provider.provider_label(),
                );
                enrichment.status = EnrichmentStatus::Failed;
                enrichment.error_message = Some(e.to_string());
                if let Err(persist_err) = self.db.create_enrichment(&enrichment).await {
                    tracing::error!(
                        company_id = %company.id,
                        error = %persist_err,
                        "Failed to record enrichment failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Find the target company by domain first, then case-insensitive name;
    /// create a shell record when neither matches.
    async fn resolve_company(
        &self,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<Company> {
        if let Some(domain) = domain {
            if let Some(company) = self.db.get_company_by_domain(domain).await? {
                return Ok(company);
            }
        }

        if let Some(name) = name {
            if let Some(company) = self.db.get_company_by_name(name).await? {
                return Ok(company);
            }
        }

        let display_name = match (name, domain) {
            (Some(name), _) => name.to_string(),
            (None, Some(domain)) => domain.to_string(),
            (None, None) => {
                return Err(RoloError::Validation(
                    "Either a company name or a domain is required".to_string(),
                ));
            }
        };

        let mut company = Company::new(nanoid!(), display_name);
        company.domain = domain.map(String::from);
        self.db.create_company(&company).await?;
        Ok(company)
    }

    fn check_rate_limit(&self) -> Result<()> {
        let now_min = Utc::now().timestamp() / 60;
        let mut window = self
            .rate_window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if window.window_start_min != now_min {
            window.window_start_min = now_min;
            window.count = 0;
        }

        if window.count >= self.rate_limit_per_minute {
            let retry_after = 60 - (Utc::now().timestamp() % 60) as u64;
            return Err(RoloError::ApiRateLimit {
                retry_after: Some(retry_after),
            });
        }

        window.count += 1;
        Ok(())
    }
}

/// Last-write-wins merge: every non-empty fetched field overwrites.
fn merge_profile(company: &mut Company, profile: &CompanyProfile) {
    if let Some(name) = non_empty(&profile.name) {
        company.name = name;
    }
    if let Some(domain) = profile.domain.as_deref().and_then(normalize_domain) {
        company.domain = Some(domain);
    }
    if let Some(website) = non_empty(&profile.website) {
        company.website = Some(website);
    }
    if let Some(industry) = non_empty(&profile.industry) {
        company.industry = Some(industry);
    }
    if let Some(description) = non_empty(&profile.description) {
        company.description = Some(description);
    }
    if let Some(size) = non_empty(&profile.size) {
        company.size = Some(size);
    }
    if let Some(location) = non_empty(&profile.location) {
        company.location = Some(location);
    }
    if profile.confidence.is_some() {
        company.confidence = profile.confidence;
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Normalize a domain for dedup: lowercase, scheme/`www.` stripped, no path.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(&trimmed);

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.contains('.') && !host.contains('@') && !host.contains(' ') {
        Some(host.to_string())
    } else {
        None
    }
}

/// Extract the domain portion of an email address.
pub fn domain_from_email(email: &str) -> Option<String> {
    email.split_once('@').and_then(|(_, d)| normalize_domain(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_domain_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_domain("https://www.TechCorp.com/about"),
            Some("techcorp.com".to_string())
        );
        assert_eq!(
            normalize_domain("www.techcorp.com"),
            Some("techcorp.com".to_string())
        );
        assert_eq!(
            normalize_domain("techcorp.com"),
            Some("techcorp.com".to_string())
        );
    }

    #[test]
    fn normalize_domain_rejects_non_domains() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("not a domain"), None);
        assert_eq!(normalize_domain("jane@techcorp.com"), None);
        assert_eq!(normalize_domain("localhost"), None);
    }

    #[test]
    fn domain_from_email_extracts_host() {
        assert_eq!(
            domain_from_email("jane@techcorp.com"),
            Some("techcorp.com".to_string())
        );
        assert_eq!(domain_from_email("no-at-sign"), None);
    }

    #[test]
    fn merge_profile_overwrites_non_empty_fields_only() {
        let mut company = Company::new("co_1".to_string(), "Old Name".to_string());
        company.industry = Some("Retail".to_string());
        company.location = Some("Berlin".to_string());

        let profile = CompanyProfile {
            name: Some("Tech Corp".to_string()),
            domain: Some("techcorp.com".to_string()),
            website: Some("https://techcorp.com".to_string()),
            industry: Some("Software".to_string()),
            description: None,
            size: Some("".to_string()),
            location: None,
            confidence: Some(0.85),
        };

        merge_profile(&mut company, &profile);

        assert_eq!(company.name, "Tech Corp");
        assert_eq!(company.domain.as_deref(), Some("techcorp.com"));
        assert_eq!(company.industry.as_deref(), Some("Software"));
        // Empty/None fetched values must not clobber existing data.
        assert_eq!(company.location.as_deref(), Some("Berlin"));
        assert!(company.size.is_none());
        assert_eq!(company.confidence, Some(0.85));
    }
}
