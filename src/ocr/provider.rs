use std::sync::Arc;
use std::time::Duration;

use leptess::LepTess;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{Result, RoloError};

use super::api::{MistralOcrClient, OpenAiVisionClient, DEFAULT_API_LINE_CONFIDENCE};

/// A detected line of text with its confidence, normalized to 0-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

/// Line-level OCR output for one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrOutput {
    pub lines: Vec<OcrLine>,
}

impl OcrOutput {
    /// All line text joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Split raw engine text into non-empty trimmed lines, each carrying the
    /// given confidence.
    pub fn from_text(text: &str, confidence: f32) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| OcrLine {
                text: l.to_string(),
                confidence,
            })
            .collect();
        Self { lines }
    }
}

#[derive(Clone)]
enum OcrApiClient {
    Mistral(MistralOcrClient),
    OpenAi(OpenAiVisionClient),
}

impl OcrApiClient {
    async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        match self {
            OcrApiClient::Mistral(c) => c.ocr(image_bytes).await,
            OcrApiClient::OpenAi(c) => c.ocr(image_bytes).await,
        }
    }
}

enum OcrBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Api { client: OcrApiClient },
    Unavailable { reason: String },
}

pub struct OcrProvider {
    backend: OcrBackend,
    config: OcrConfig,
}

fn create_tesseract(languages: &str) -> std::result::Result<LepTess, String> {
    LepTess::new(None, languages).map_err(|e| e.to_string())
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let model_lower = config.model.to_lowercase();
        let provider_prefix = model_lower.split('/').next().unwrap_or("local");

        let backend = match provider_prefix {
            "mistral" => match MistralOcrClient::new(config) {
                Ok(client) => {
                    info!("Mistral OCR API backend initialized");
                    OcrBackend::Api {
                        client: OcrApiClient::Mistral(client),
                    }
                }
                Err(e) => {
                    let reason = format!("Mistral OCR backend unavailable: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            "openai" => match OpenAiVisionClient::new(config) {
                Ok(client) => {
                    info!("OpenAI Vision OCR API backend initialized");
                    OcrBackend::Api {
                        client: OcrApiClient::OpenAi(client),
                    }
                }
                Err(e) => {
                    let reason = format!("OpenAI Vision OCR backend unavailable: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            _ => match create_tesseract(&config.languages) {
                Ok(lt) => {
                    info!(languages = %config.languages, "Tesseract OCR initialized");
                    OcrBackend::Local {
                        tesseract: Arc::new(Mutex::new(lt)),
                    }
                }
                Err(e) => {
                    let reason = format!("Tesseract not available: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
        };

        Ok(Self {
            backend,
            config: config.clone(),
        })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn ocr(&self, image_bytes: &[u8]) -> Result<OcrOutput> {
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        let result = tokio::time::timeout(timeout_duration, self.ocr_internal(image_bytes)).await;

        match result {
            Ok(inner_result) => inner_result,
            Err(_) => Err(RoloError::Ocr(format!(
                "OCR operation timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn ocr_internal(&self, image_bytes: &[u8]) -> Result<OcrOutput> {
        match &self.backend {
            OcrBackend::Local { tesseract } => {
                let bytes = image_bytes.to_vec();
                let tesseract = Arc::clone(tesseract);

                // leptess reports a mean confidence for the whole page, not
                // per line; every local line inherits the normalized mean.
                let (text, mean_conf) = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&bytes)
                        .map_err(|e| RoloError::Ocr(format!("Failed to set image: {e}")))?;
                    let text = lt
                        .get_utf8_text()
                        .map_err(|e| RoloError::Ocr(format!("Failed to extract text: {e}")))?;
                    let conf = lt.mean_text_conf();
                    Ok::<_, RoloError>((text, conf))
                })
                .await
                .map_err(|e| RoloError::Ocr(format!("OCR task panicked: {e}")))??;

                let confidence = (mean_conf.clamp(0, 100) as f32) / 100.0;
                Ok(OcrOutput::from_text(&text, confidence))
            }
            OcrBackend::Api { client } => {
                let text = client.ocr(image_bytes).await?;
                Ok(OcrOutput::from_text(&text, DEFAULT_API_LINE_CONFIDENCE))
            }
            OcrBackend::Unavailable { reason } => Err(RoloError::OcrUnavailable(reason.clone())),
        }
    }
}

impl Clone for OcrProvider {
    fn clone(&self) -> Self {
        match &self.backend {
            OcrBackend::Local { tesseract } => Self {
                backend: OcrBackend::Local {
                    tesseract: Arc::clone(tesseract),
                },
                config: self.config.clone(),
            },
            OcrBackend::Api { client } => Self {
                backend: OcrBackend::Api {
                    client: client.clone(),
                },
                config: self.config.clone(),
            },
            OcrBackend::Unavailable { reason } => Self {
                backend: OcrBackend::Unavailable {
                    reason: reason.clone(),
                },
                config: self.config.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(model: &str, api_key: Option<&str>) -> OcrConfig {
        OcrConfig {
            model: model.to_string(),
            api_key: api_key.map(String::from),
            base_url: None,
            languages: "eng".to_string(),
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
            confidence_threshold: 0.7,
        }
    }

    #[test]
    fn test_ocr_provider_graceful_degradation() {
        let config = make_config("local/tesseract", None);
        let result = OcrProvider::new(&config);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ocr_unavailable_returns_error() {
        let provider = OcrProvider {
            backend: OcrBackend::Unavailable {
                reason: "Test unavailable".to_string(),
            },
            config: make_config("local/tesseract", None),
        };

        let result = provider.ocr(&[]).await;
        assert!(matches!(result, Err(RoloError::OcrUnavailable(_))));
    }

    #[test]
    fn test_mistral_model_without_api_key_falls_back_to_unavailable() {
        let config = make_config("mistral/pixtral-12b-2409", None);
        let provider = OcrProvider::new(&config).unwrap();
        assert!(!provider.is_available());
    }

    #[test]
    fn test_openai_model_without_api_key_falls_back_to_unavailable() {
        let config = make_config("openai/gpt-4o", None);
        let provider = OcrProvider::new(&config).unwrap();
        assert!(!provider.is_available());
    }

    #[test]
    fn test_api_backed_ocr_provider_clone() {
        let config = make_config("mistral/pixtral-12b-2409", None);
        let provider = OcrProvider::new(&config).unwrap();
        let cloned = provider.clone();
        assert_eq!(provider.is_available(), cloned.is_available());
    }

    #[test]
    fn test_output_from_text_skips_blank_lines() {
        let output = OcrOutput::from_text("John Smith\n\n  \nTech Corp Inc\n", 0.8);
        assert_eq!(output.lines.len(), 2);
        assert_eq!(output.lines[0].text, "John Smith");
        assert_eq!(output.lines[1].text, "Tech Corp Inc");
        assert_eq!(output.lines[0].confidence, 0.8);
    }

    #[test]
    fn test_output_text_joins_lines() {
        let output = OcrOutput::from_text("a\nb", 1.0);
        assert_eq!(output.text(), "a\nb");
    }
}
