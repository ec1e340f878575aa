use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::error::{Result, RoloError};

use super::api::ObjectStoreClient;

/// A stored object and the public URL it is reachable at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

enum StorageBackend {
    Local { root: PathBuf },
    Api { client: ObjectStoreClient },
    Unavailable { reason: String },
}

/// Object storage for card images and their derivatives.
///
/// `local` writes blobs under a configured directory (self-hosted default);
/// `s3` targets an S3-compatible HTTP gateway. Either way, public URLs prefer
/// the CDN domain when one is configured.
pub struct StorageProvider {
    backend: StorageBackend,
    config: StorageConfig,
}

impl StorageProvider {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let backend = match config.backend.to_lowercase().as_str() {
            "s3" => match ObjectStoreClient::new(config) {
                Ok(client) => {
                    info!(bucket = %config.bucket, "S3-compatible storage backend initialized");
                    StorageBackend::Api { client }
                }
                Err(e) => {
                    let reason = format!("S3 storage backend unavailable: {e}");
                    warn!("{}", reason);
                    StorageBackend::Unavailable { reason }
                }
            },
            "local" => {
                let root = PathBuf::from(&config.local_root);
                info!(root = %root.display(), "Local storage backend initialized");
                StorageBackend::Local { root }
            }
            other => {
                let reason = format!("Unknown storage backend '{other}'");
                warn!("{}", reason);
                StorageBackend::Unavailable { reason }
            }
        };

        Ok(Self {
            backend,
            config: config.clone(),
        })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, StorageBackend::Unavailable { .. })
    }

    pub fn backend_name(&self) -> &str {
        match &self.backend {
            StorageBackend::Local { .. } => "local",
            StorageBackend::Api { .. } => "s3",
            StorageBackend::Unavailable { .. } => "unavailable",
        }
    }

    /// Public URL for a stored key. The CDN domain wins over the backend's
    /// own base URL when configured.
    pub fn public_url(&self, key: &str) -> String {
        if let Some(ref cdn) = self.config.cdn_domain {
            return format!("https://{}/{}", cdn.trim_end_matches('/'), key);
        }

        match &self.backend {
            StorageBackend::Api { client } => client.object_url(key),
            StorageBackend::Local { .. } => match &self.config.base_url {
                Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
                None => format!("/files/{key}"),
            },
            StorageBackend::Unavailable { .. } => format!("/files/{key}"),
        }
    }

    pub async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject> {
        match &self.backend {
            StorageBackend::Local { root } => {
                let path = root.join(key);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, bytes).await?;
                Ok(StoredObject {
                    key: key.to_string(),
                    url: self.public_url(key),
                })
            }
            StorageBackend::Api { client } => {
                client.put(key, bytes, content_type).await?;
                Ok(StoredObject {
                    key: key.to_string(),
                    url: self.public_url(key),
                })
            }
            StorageBackend::Unavailable { reason } => {
                Err(RoloError::StorageUnavailable(reason.clone()))
            }
        }
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        match &self.backend {
            StorageBackend::Local { root } => {
                let path = root.join(key);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(bytes),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                        RoloError::NotFound(format!("Stored object '{key}' not found")),
                    ),
                    Err(e) => Err(e.into()),
                }
            }
            StorageBackend::Api { client } => client.get(key).await,
            StorageBackend::Unavailable { reason } => {
                Err(RoloError::StorageUnavailable(reason.clone()))
            }
        }
    }
}

impl Clone for StorageProvider {
    fn clone(&self) -> Self {
        let backend = match &self.backend {
            StorageBackend::Local { root } => StorageBackend::Local { root: root.clone() },
            StorageBackend::Api { client } => StorageBackend::Api {
                client: client.clone(),
            },
            StorageBackend::Unavailable { reason } => StorageBackend::Unavailable {
                reason: reason.clone(),
            },
        };
        Self {
            backend,
            config: self.config.clone(),
        }
    }
}
