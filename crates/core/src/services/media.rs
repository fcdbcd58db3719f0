//! Media service.
//!
//! Uploads land under the `temporary/` prefix before the owning entity
//! exists. Once the entity is created, its content is promoted: each temp
//! object is copied to its permanent key, the URLs in the content are
//! rewritten, and the temp objects are removed. A copy failure rolls back
//! the already-copied destination objects so no orphans are left behind.

use std::sync::Arc;

use hunsuking_common::{AppError, AppResult, StorageBackend, storage, storage::UploadedFile};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches temp-object keys embedded in content as URLs.
#[allow(clippy::unwrap_used)]
static TEMP_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"temporary/[A-Za-z0-9_][A-Za-z0-9_./-]*").unwrap()
});

/// Media service for object-storage operations.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Generate a temp upload key for a user's file.
    #[must_use]
    pub fn temp_key(&self, user_id: &str, file_name: &str) -> String {
        storage::generate_temp_key(user_id, file_name)
    }

    /// Upload raw bytes to a temp key.
    pub async fn upload_temp(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        self.storage.upload(key, data, content_type).await
    }

    /// Promote the temp images referenced by `content` to their permanent
    /// location under the owning entity and return the rewritten content.
    ///
    /// Copies first, then rewrites, then deletes the temp objects. When a
    /// copy fails the destinations copied so far are deleted again and
    /// `ExternalService` is returned; the content is left pointing at the
    /// still-present temp objects.
    pub async fn promote_temp_images(
        &self,
        content: &str,
        entity: &str,
        entity_id: &str,
    ) -> AppResult<String> {
        let mut moves: Vec<(String, String)> = Vec::new();
        for m in TEMP_KEY_RE.find_iter(content) {
            let temp_key = m.as_str();
            let Some(dest_key) = storage::permanent_key(temp_key, entity, entity_id) else {
                continue;
            };
            if !moves.iter().any(|(t, _)| t == temp_key) {
                moves.push((temp_key.to_string(), dest_key));
            }
        }

        if moves.is_empty() {
            return Ok(content.to_string());
        }

        let mut copied: Vec<&str> = Vec::new();
        for (temp_key, dest_key) in &moves {
            if let Err(e) = self.storage.copy(temp_key, dest_key).await {
                // Compensate: remove the destinations already copied.
                for dest in copied {
                    if let Err(cleanup_err) = self.storage.delete(dest).await {
                        tracing::warn!(key = %dest, error = %cleanup_err, "Failed to clean up promoted object");
                    }
                }
                return Err(AppError::ExternalService(format!(
                    "Failed to promote image {temp_key}: {e}"
                )));
            }
            copied.push(dest_key);
        }

        let mut rewritten = content.to_string();
        for (temp_key, dest_key) in &moves {
            rewritten = rewritten.replace(temp_key.as_str(), dest_key);
        }

        // Temp cleanup is best effort; a leftover temp object is harmless.
        for (temp_key, _) in &moves {
            if let Err(e) = self.storage.delete(temp_key).await {
                tracing::warn!(key = %temp_key, error = %e, "Failed to delete temp object");
            }
        }

        Ok(rewritten)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStorage {
        objects: Mutex<HashSet<String>>,
        fail_copy_to: Option<String>,
    }

    #[async_trait]
    impl StorageBackend for FakeStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            self.objects.lock().unwrap().insert(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
            if self.fail_copy_to.as_deref() == Some(to) {
                return Err(AppError::ExternalService("copy failed".to_string()));
            }
            let mut objects = self.objects.lock().unwrap();
            if !objects.contains(from) {
                return Err(AppError::NotFound(format!("missing: {from}")));
            }
            objects.insert(to.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("http://files.test/{key}")
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.objects.lock().unwrap().contains(key))
        }
    }

    #[tokio::test]
    async fn test_promote_rewrites_and_cleans_up() {
        let storage = Arc::new(FakeStorage::default());
        storage
            .upload("temporary/u1/1_x.png", b"", "image/png")
            .await
            .unwrap();

        let service = MediaService::new(storage.clone());
        let content = "look: http://files.test/temporary/u1/1_x.png done";

        let rewritten = service
            .promote_temp_images(content, "articles", "a1")
            .await
            .unwrap();

        assert_eq!(rewritten, "look: http://files.test/articles/a1/1_x.png done");
        assert!(storage.exists("articles/a1/1_x.png").await.unwrap());
        assert!(!storage.exists("temporary/u1/1_x.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_promote_copy_failure_compensates() {
        let storage = Arc::new(FakeStorage {
            fail_copy_to: Some("articles/a1/2_y.png".to_string()),
            ..Default::default()
        });
        storage
            .upload("temporary/u1/1_x.png", b"", "image/png")
            .await
            .unwrap();
        storage
            .upload("temporary/u1/2_y.png", b"", "image/png")
            .await
            .unwrap();

        let service = MediaService::new(storage.clone());
        let content = "a temporary/u1/1_x.png b temporary/u1/2_y.png";

        let result = service.promote_temp_images(content, "articles", "a1").await;

        assert!(matches!(result, Err(AppError::ExternalService(_))));
        // The first copy was rolled back; temp objects are untouched.
        assert!(!storage.exists("articles/a1/1_x.png").await.unwrap());
        assert!(storage.exists("temporary/u1/1_x.png").await.unwrap());
        assert!(storage.exists("temporary/u1/2_y.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_promote_without_temp_images_is_noop() {
        let storage = Arc::new(FakeStorage::default());
        let service = MediaService::new(storage);

        let rewritten = service
            .promote_temp_images("no images here", "articles", "a1")
            .await
            .unwrap();

        assert_eq!(rewritten, "no images here");
    }
}
