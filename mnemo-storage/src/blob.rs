//! Content-addressed blob store
//!
//! S3-compatible backend when `BLOB_ENDPOINT_URL` is configured, local
//! filesystem fallback otherwise (dev/test). Presigned download URLs are an
//! S3-only capability; callers fall back to inline base64 transfer when
//! `presign` returns `None`.

use std::path::PathBuf;
use std::time::Duration;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{info, warn};

use mnemo_core::config::Settings;
use mnemo_core::error::{MemoryError, Result};

/// Fallback directory when no S3 endpoint is configured
const LOCAL_BLOB_DIR: &str = "/tmp/mnemo-blobs";

enum Backend {
    S3(Box<aws_sdk_s3::Client>),
    Local(PathBuf),
}

/// S3-compatible blob store with local filesystem fallback
pub struct BlobStore {
    backend: Backend,
    bucket: String,
}

impl BlobStore {
    /// Build the store from settings
    ///
    /// # Errors
    ///
    /// Returns `Blob` if the local fallback directory cannot be created
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.blob_endpoint_url.is_empty() {
            return Self::local(PathBuf::from(LOCAL_BLOB_DIR)).await;
        }

        let credentials = Credentials::new(
            settings.blob_access_key.clone(),
            settings.blob_secret_key.clone(),
            None,
            None,
            "mnemo-settings",
        );
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.blob_region.clone()))
            .endpoint_url(&settings.blob_endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(config);

        info!(
            endpoint = %settings.blob_endpoint_url,
            bucket = %settings.blob_bucket,
            "blob store: s3"
        );
        Ok(Self {
            backend: Backend::S3(Box::new(client)),
            bucket: settings.blob_bucket.clone(),
        })
    }

    /// Local filesystem store rooted at `dir` (dev/test)
    ///
    /// # Errors
    ///
    /// Returns `Blob` if the directory cannot be created
    pub async fn local(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MemoryError::Blob(format!("failed to create blob dir: {e}")))?;
        info!(dir = %dir.display(), "blob store: local filesystem");
        Ok(Self {
            backend: Backend::Local(dir),
            bucket: String::new(),
        })
    }

    /// Upload bytes, returning the key
    ///
    /// # Errors
    ///
    /// Returns `Blob` if the upload fails
    pub async fn put(&self, blob_key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        let len = data.len();
        match &self.backend {
            Backend::S3(client) => {
                client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(blob_key)
                    .body(ByteStream::from(data))
                    .content_type(content_type)
                    .send()
                    .await
                    .map_err(|e| MemoryError::Blob(format!("upload failed: {e}")))?;
            }
            Backend::Local(dir) => {
                let dest = dir.join(blob_key);
                if let Some(parent) = dest.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| MemoryError::Blob(format!("mkdir failed: {e}")))?;
                }
                tokio::fs::write(&dest, data)
                    .await
                    .map_err(|e| MemoryError::Blob(format!("write failed: {e}")))?;
            }
        }

        info!(blob_key, bytes = len, "blob uploaded");
        Ok(blob_key.to_string())
    }

    /// Download bytes by key; `None` when absent or unreadable
    pub async fn get(&self, blob_key: &str) -> Option<Vec<u8>> {
        match &self.backend {
            Backend::S3(client) => {
                let response = client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(blob_key)
                    .send()
                    .await;
                match response {
                    Ok(output) => match output.body.collect().await {
                        Ok(data) => Some(data.into_bytes().to_vec()),
                        Err(e) => {
                            warn!(blob_key, error = %e, "failed to read blob body");
                            None
                        }
                    },
                    Err(e) => {
                        warn!(blob_key, error = %e, "failed to download blob");
                        None
                    }
                }
            }
            Backend::Local(dir) => tokio::fs::read(dir.join(blob_key)).await.ok(),
        }
    }

    /// Presigned download URL; `None` for backends without presign support
    pub async fn presign(&self, blob_key: &str, expires_in: Duration) -> Option<String> {
        let Backend::S3(client) = &self.backend else {
            return None;
        };

        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| warn!(error = %e, "invalid presign config"))
            .ok()?;

        match client
            .get_object()
            .bucket(&self.bucket)
            .key(blob_key)
            .presigned(presign_config)
            .await
        {
            Ok(request) => Some(request.uri().to_string()),
            Err(e) => {
                warn!(blob_key, error = %e, "failed to presign blob url");
                None
            }
        }
    }

    /// Key layout: `{tenant}/{memory}/{sanitized_filename}`
    #[must_use]
    pub fn blob_key(tenant_id: &str, memory_id: &str, filename: &str) -> String {
        let safe = filename.replace(['/', '\\'], "_");
        format!("{tenant_id}/{memory_id}/{safe}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_key_sanitizes_path_separators() {
        assert_eq!(
            BlobStore::blob_key("t1", "mem_abc", "logs/deploy.log"),
            "t1/mem_abc/logs_deploy.log"
        );
        assert_eq!(
            BlobStore::blob_key("t1", "mem_abc", "win\\path.txt"),
            "t1/mem_abc/win_path.txt"
        );
    }

    #[tokio::test]
    async fn local_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::local(dir.path().to_path_buf()).await.unwrap();

        let key = BlobStore::blob_key("t1", "mem_x", "deploy.log");
        store
            .put(&key, b"This is a test log.".to_vec(), "text/plain")
            .await
            .unwrap();

        let data = store.get(&key).await.unwrap();
        assert_eq!(data, b"This is a test log.");
        assert!(store
            .presign(&key, Duration::from_secs(60))
            .await
            .is_none());
        assert!(store.get("t1/mem_x/missing.bin").await.is_none());
    }
}
