use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OcrConfig;
use crate::error::{Result, RoloError};

/// Confidence assigned to API-returned lines when the vendor response does
/// not carry per-line scores.
pub(super) const DEFAULT_API_LINE_CONFIDENCE: f32 = 0.9;

#[derive(Clone, Debug)]
pub struct MistralOcrClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Clone, Debug)]
pub struct OpenAiVisionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

const OCR_PROMPT: &str = "Extract all text from this business card image. \
Return one detected line of text per output line, preserving the reading order. \
Do not add explanations, labels, or formatting.";

fn build_request(model: &str, image_bytes: &[u8]) -> ChatRequest {
    let base64_image = STANDARD.encode(image_bytes);
    let data_url = format!("data:image/png;base64,{base64_image}");

    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: OCR_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ],
        }],
        max_tokens: 4096,
    }
}

async fn send_with_retries(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<String> {
    let mut retries = 0;
    let max_retries = 3;

    loop {
        let response = client
            .post(format!("{base_url}/chat/completions"))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await;

        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    let chat_response: ChatResponse = resp
                        .json()
                        .await
                        .map_err(|e| RoloError::Ocr(format!("Failed to parse response: {e}")))?;

                    return chat_response
                        .choices
                        .first()
                        .map(|c| c.message.content.clone())
                        .ok_or_else(|| RoloError::Ocr("No response from API".to_string()));
                } else if resp.status().as_u16() == 429 || resp.status().is_server_error() {
                    retries += 1;
                    if retries >= max_retries {
                        return Err(RoloError::Ocr(format!(
                            "API request failed after {} retries: {}",
                            max_retries,
                            resp.status()
                        )));
                    }
                    let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                    tokio::time::sleep(delay).await;
                    continue;
                } else {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(RoloError::Ocr(format!(
                        "API request failed: {status} - {body}"
                    )));
                }
            }
            Err(e) => {
                retries += 1;
                if retries >= max_retries {
                    return Err(RoloError::Ocr(format!(
                        "API request failed after {max_retries} retries: {e}"
                    )));
                }
                let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                tokio::time::sleep(delay).await;
            }
        }
    }
}

impl MistralOcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RoloError::Ocr("API key required for Mistral OCR".to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.mistral.ai/v1".to_string());

        let model = config
            .model
            .split_once('/')
            .map(|(_, m)| m.to_string())
            .unwrap_or_else(|| "pixtral-12b-2409".to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RoloError::Ocr(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    pub async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        let request = build_request(&self.model, image_bytes);
        send_with_retries(&self.client, &self.base_url, &self.api_key, &request).await
    }
}

impl OpenAiVisionClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RoloError::Ocr("API key required for OpenAI Vision OCR".to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let model = config
            .model
            .split_once('/')
            .map(|(_, m)| m.to_string())
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RoloError::Ocr(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    pub async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        let request = build_request(&self.model, image_bytes);
        send_with_retries(&self.client, &self.base_url, &self.api_key, &request).await
    }
}
