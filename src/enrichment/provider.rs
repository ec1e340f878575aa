use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{parse_enrichment_provider_model, EnrichmentConfig};
use crate::error::{Result, RoloError};

use super::api::EnrichmentApiClient;

/// Company profile returned by the research model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

const SYSTEM_PROMPT: &str = "You are a company research assistant. Given a company \
name and optionally its domain, return what is reliably known about the company as \
strict JSON with exactly these keys: name, domain, website, industry, description, \
size, location, confidence. Use null for unknown fields. `size` is an employee-count \
band such as \"11-50\". `confidence` is a number between 0 and 1 reflecting how \
certain the profile is. Return only the JSON object, no prose.";

/// Provider for third-party company research.
///
/// Absent configuration degrades to `Unavailable`; enrichment endpoints then
/// answer with the unavailable error instead of failing at startup.
#[derive(Clone)]
pub struct EnrichmentProvider {
    backend: EnrichmentBackend,
    config: Option<Arc<EnrichmentConfig>>,
}

impl EnrichmentProvider {
    pub fn new(config: Option<&EnrichmentConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No enrichment configuration provided");
        };

        let (provider, _model) = parse_enrichment_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => EnrichmentBackend::OpenAI,
            "openrouter" => EnrichmentBackend::OpenRouter,
            "ollama" => EnrichmentBackend::Ollama,
            "lmstudio" => EnrichmentBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    EnrichmentBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    EnrichmentBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        Self {
            backend,
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: EnrichmentBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, EnrichmentBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &EnrichmentBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&EnrichmentConfig> {
        self.config.as_deref()
    }

    pub fn provider_label(&self) -> String {
        self.config
            .as_ref()
            .map(|c| c.model.clone())
            .unwrap_or_else(|| "unavailable".to_string())
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            EnrichmentBackend::Unavailable { reason } => reason.clone(),
            _ => "Enrichment is available".to_string(),
        }
    }

    /// Research a company by name and optional domain.
    pub async fn research(&self, name: &str, domain: Option<&str>) -> Result<CompanyProfile> {
        if !self.is_available() {
            return Err(RoloError::EnrichmentUnavailable(self.unavailable_reason()));
        }

        let config = self.config().ok_or_else(|| {
            RoloError::EnrichmentUnavailable("No config available".to_string())
        })?;

        let prompt = match domain {
            Some(domain) => format!("Company: {name}\nDomain: {domain}"),
            None => format!("Company: {name}"),
        };

        let client = EnrichmentApiClient::new(config)?;
        let value = client.complete_json(&prompt, SYSTEM_PROMPT).await?;

        let profile: CompanyProfile = serde_json::from_value(value)
            .map_err(|e| RoloError::Enrichment(format!("Malformed company profile: {e}")))?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(model: &str) -> EnrichmentConfig {
        EnrichmentConfig {
            model: model.to_string(),
            api_key: Some("test-key".to_string()),
            base_url: None,
            timeout_secs: 30,
            max_retries: 3,
            freshness_days: 30,
            rate_limit_per_minute: 10,
        }
    }

    #[test]
    fn openai_provider_detection() {
        let config = test_config("openai/gpt-4o-mini");
        let provider = EnrichmentProvider::new(Some(&config));
        assert!(matches!(provider.backend(), EnrichmentBackend::OpenAI));
        assert!(provider.is_available());
    }

    #[test]
    fn openrouter_provider_detection() {
        let config = test_config("openrouter/openai/gpt-4o");
        let provider = EnrichmentProvider::new(Some(&config));
        assert!(matches!(provider.backend(), EnrichmentBackend::OpenRouter));
    }

    #[test]
    fn unavailable_without_config() {
        let provider = EnrichmentProvider::new(None);
        assert!(!provider.is_available());
        assert!(matches!(
            provider.backend(),
            EnrichmentBackend::Unavailable { .. }
        ));
    }

    #[test]
    fn unknown_provider_without_base_url_is_unavailable() {
        let mut config = test_config("somevendor/research-1");
        config.base_url = None;
        let provider = EnrichmentProvider::new(Some(&config));
        assert!(!provider.is_available());
    }

    #[test]
    fn unknown_provider_with_base_url_is_openai_compatible() {
        let mut config = test_config("somevendor/research-1");
        config.base_url = Some("https://llm.internal/v1".to_string());
        let provider = EnrichmentProvider::new(Some(&config));
        assert!(matches!(
            provider.backend(),
            EnrichmentBackend::OpenAICompatible { .. }
        ));
    }

    #[tokio::test]
    async fn research_on_unavailable_provider_errors() {
        let provider = EnrichmentProvider::new(None);
        let result = provider.research("Acme", None).await;
        assert!(matches!(result, Err(RoloError::EnrichmentUnavailable(_))));
    }

    #[test]
    fn company_profile_deserializes_with_nulls() {
        let json = r#"{
            "name": "Tech Corp",
            "domain": "techcorp.com",
            "website": null,
            "industry": "Software",
            "description": null,
            "size": "51-200",
            "location": null,
            "confidence": 0.8
        }"#;
        let profile: CompanyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Tech Corp"));
        assert_eq!(profile.size.as_deref(), Some("51-200"));
        assert!(profile.website.is_none());
        assert_eq!(profile.confidence, Some(0.8));
    }
}
