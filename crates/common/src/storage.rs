//! Object storage abstraction for image uploads.
//!
//! Supports both local filesystem and S3-compatible object storage. Images
//! are first uploaded under the [`TEMP_PREFIX`] before the owning entity
//! exists, then promoted to a permanent `articles/{id}/...` (or similar) key
//! once it does; `copy` exists for that promotion step.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Key prefix for provisional uploads awaiting promotion.
pub const TEMP_PREFIX: &str = "temporary";

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the file.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile>;

    /// Copy an object to a new key. Source is left in place.
    async fn copy(&self, src_key: &str, dest_key: &str) -> AppResult<()>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::ExternalService(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn copy(&self, src_key: &str, dest_key: &str) -> AppResult<()> {
        let src = self.base_path.join(src_key);
        let dest = self.base_path.join(dest_key);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::ExternalService(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::copy(&src, &dest)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to copy file: {e}")))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::ExternalService(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.base_path.join(key);
        Ok(path.exists())
    }
}

/// S3-compatible object storage backend.
#[cfg(feature = "s3")]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Storage {
    /// Create a new S3 storage backend.
    pub fn new(
        endpoint: &str,
        bucket: String,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        public_url: Option<String>,
    ) -> Self {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "hunsuking");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(endpoint)
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = aws_sdk_s3::Client::from_conf(config);

        Self {
            client,
            bucket,
            public_url,
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
        use aws_sdk_s3::primitives::ByteStream;

        let md5 = format!("{:x}", md5::compute(data));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("S3 upload failed: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn copy(&self, src_key: &str, dest_key: &str) -> AppResult<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{}", self.bucket, src_key))
            .key(dest_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("S3 copy failed: {e}")))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("S3 delete failed: {e}")))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("404") {
                    Ok(false)
                } else {
                    Err(AppError::ExternalService(format!(
                        "S3 head_object failed: {e}"
                    )))
                }
            }
        }
    }
}

/// Generate a provisional storage key under the temporary prefix.
#[must_use]
pub fn generate_temp_key(user_id: &str, original_name: &str) -> String {
    use chrono::Utc;

    let timestamp = Utc::now().timestamp_millis();
    let extension = extract_extension(original_name);

    format!(
        "{TEMP_PREFIX}/{user_id}/{timestamp}_{}.{extension}",
        uuid::Uuid::new_v4()
    )
}

/// Rewrite a temporary key into its permanent home under `{entity}/{id}/`.
///
/// Returns `None` if the key is not under the temporary prefix.
#[must_use]
pub fn permanent_key(temp_key: &str, entity: &str, entity_id: &str) -> Option<String> {
    let rest = temp_key.strip_prefix(TEMP_PREFIX)?.strip_prefix('/')?;
    // Drop the uploader segment; permanent keys are grouped by entity id.
    let file_name = rest.rsplit('/').next()?;
    Some(format!("{entity}/{entity_id}/{file_name}"))
}

fn extract_extension(original_name: &str) -> &str {
    original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && !ext.is_empty())
        .unwrap_or("bin")
}
