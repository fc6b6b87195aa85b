//! Cold-storage abstraction for archived report data.
//!
//! Cold storage is append-only from the pipeline's perspective: an upload
//! either returns a durable archive identifier or fails. Nothing in this
//! module deletes cold objects.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// A durably stored archive object.
#[derive(Debug, Clone)]
pub struct ArchiveObject {
    /// Archive identifier (storage key). Recorded on the archived runs.
    pub archive_id: String,
    /// Payload size in bytes.
    pub size: u64,
    /// MD5 hash of the payload.
    pub md5: String,
}

/// Cold-storage backend trait.
///
/// `upload` must be atomic from the caller's perspective: a returned
/// [`ArchiveObject`] means the payload is durably stored.
#[async_trait::async_trait]
pub trait ColdStorage: Send + Sync {
    /// Upload an archive payload under the given key.
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<ArchiveObject>;

    /// Check if an archive object exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem cold-storage backend.
pub struct LocalArchiveStore {
    base_path: PathBuf,
}

impl LocalArchiveStore {
    /// Create a new local archive store.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

#[async_trait::async_trait]
impl ColdStorage for LocalArchiveStore {
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<ArchiveObject> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::ColdStorage(format!("Failed to create directory: {e}")))?;
        }

        // Write to a temp file then rename, so a partially written archive
        // is never visible under the final key.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| AppError::ColdStorage(format!("Failed to write archive: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::ColdStorage(format!("Failed to finalize archive: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(ArchiveObject {
            archive_id: key.to_string(),
            size: data.len() as u64,
            md5,
        })
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.base_path.join(key);
        Ok(path.exists())
    }
}

/// S3-compatible cold-storage backend.
#[cfg(feature = "s3")]
pub struct S3ArchiveStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3ArchiveStore {
    /// Create a new S3 archive store.
    pub fn new(
        endpoint: &str,
        bucket: String,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        prefix: Option<String>,
    ) -> Self {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "beacon");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(endpoint)
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket,
            prefix,
        }
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl ColdStorage for S3ArchiveStore {
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<ArchiveObject> {
        use aws_sdk_s3::primitives::ByteStream;

        let full_key = self.full_key(key);
        let md5 = format!("{:x}", md5::compute(data));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .body(ByteStream::from(data.to_vec()))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::ColdStorage(format!("S3 upload failed: {e}")))?;

        Ok(ArchiveObject {
            archive_id: full_key,
            size: data.len() as u64,
            md5,
        })
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.full_key(key);

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("404") {
                    Ok(false)
                } else {
                    Err(AppError::ColdStorage(format!("S3 head_object failed: {e}")))
                }
            }
        }
    }
}

/// Generate a unique archive key for a company's overflow payload.
#[must_use]
pub fn generate_archive_key(company_id: &str) -> String {
    use chrono::Utc;

    let now = Utc::now();
    let date_path = now.format("%Y/%m/%d").to_string();
    let timestamp = now.timestamp_millis();

    format!(
        "{}/{}/{}_{}.json",
        date_path,
        company_id,
        timestamp,
        uuid::Uuid::new_v4()
    )
}
