use reqwest::Client;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::{Result, RoloError};

/// Client for S3-compatible object store gateways that accept token auth
/// (`PUT/GET {base}/{bucket}/{key}` with a Bearer key).
#[derive(Clone, Debug)]
pub struct ObjectStoreClient {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl ObjectStoreClient {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            RoloError::Storage("STORAGE_BASE_URL required for the s3 backend".to_string())
        })?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            RoloError::Storage("STORAGE_API_KEY required for the s3 backend".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RoloError::Storage(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            api_key,
        })
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }

    pub async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let mut retries = 0;
        let max_retries = 3;

        loop {
            let response = self
                .client
                .put(self.object_url(key))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", content_type)
                .body(bytes.to_vec())
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) if resp.status().as_u16() == 429 || resp.status().is_server_error() => {
                    retries += 1;
                    if retries >= max_retries {
                        return Err(RoloError::Storage(format!(
                            "Upload failed after {} retries: {}",
                            max_retries,
                            resp.status()
                        )));
                    }
                    let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                    tokio::time::sleep(delay).await;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(RoloError::Storage(format!(
                        "Upload failed: {status} - {body}"
                    )));
                }
                Err(e) => {
                    retries += 1;
                    if retries >= max_retries {
                        return Err(RoloError::Storage(format!(
                            "Upload failed after {max_retries} retries: {e}"
                        )));
                    }
                    let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.object_url(key))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RoloError::Storage(format!(
                "Fetch failed for '{key}': {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(base_url: Option<&str>, api_key: Option<&str>) -> StorageConfig {
        StorageConfig {
            backend: "s3".to_string(),
            bucket: "cards".to_string(),
            region: None,
            base_url: base_url.map(String::from),
            api_key: api_key.map(String::from),
            cdn_domain: None,
            local_root: "data/uploads".to_string(),
        }
    }

    #[test]
    fn requires_base_url_and_key() {
        assert!(ObjectStoreClient::new(&make_config(None, Some("k"))).is_err());
        assert!(ObjectStoreClient::new(&make_config(Some("https://s.example.com"), None)).is_err());
    }

    #[test]
    fn object_url_joins_bucket_and_key() {
        let client =
            ObjectStoreClient::new(&make_config(Some("https://s.example.com/"), Some("k")))
                .unwrap();
        assert_eq!(
            client.object_url("cards/abc/thumbnail.jpg"),
            "https://s.example.com/cards/cards/abc/thumbnail.jpg"
        );
    }
}
