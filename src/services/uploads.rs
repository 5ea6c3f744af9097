use axum::body::Bytes;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// A file received in the `file` field of a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Writes recipe photos to a directory on local disk
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    dir: PathBuf,
    max_bytes: u64,
}

impl PhotoStorage {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.file_upload_path, config.max_file_upload)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Checks presence, type and size, in that order
    pub fn validate<'a>(&self, file: Option<&'a UploadedFile>) -> AppResult<&'a UploadedFile> {
        let file = file.ok_or_else(|| AppError::Upload("Please upload a file".to_string()))?;

        if !file.content_type.starts_with("image") {
            return Err(AppError::Upload("Please upload an image file".to_string()));
        }

        if file.size() > self.max_bytes {
            return Err(self.too_large());
        }

        Ok(file)
    }

    pub fn too_large(&self) -> AppError {
        AppError::Upload(format!("Please upload an image less than {}", self.max_bytes))
    }

    /// `photo_<recipe id>` plus the extension of the uploaded file name, if any
    pub fn file_name_for(recipe_id: Uuid, original: &str) -> String {
        match Path::new(original).extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("photo_{}.{}", recipe_id, ext),
            None => format!("photo_{}", recipe_id),
        }
    }

    /// Writes the photo and returns the stored file name
    pub async fn save(&self, recipe_id: Uuid, file: &UploadedFile) -> AppResult<String> {
        let name = Self::file_name_for(recipe_id, &file.file_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(AppError::UploadStorage)?;
        tokio::fs::write(self.dir.join(&name), &file.bytes)
            .await
            .map_err(AppError::UploadStorage)?;

        tracing::info!(recipe_id = %recipe_id, file = %name, bytes = file.size(), "Stored recipe photo");
        Ok(name)
    }

    /// Best-effort removal of a stored photo
    pub async fn remove(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            tracing::warn!(file = %name, error = %e, "Failed to remove recipe photo");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: "dinner.jpg".to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn test_missing_file() {
        let storage = PhotoStorage::new("/tmp", 10);
        match storage.validate(None) {
            Err(AppError::Upload(msg)) => assert_eq!(msg, "Please upload a file"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_image_is_rejected() {
        let storage = PhotoStorage::new("/tmp", 10);
        let upload = file("application/pdf", 1);
        match storage.validate(Some(&upload)) {
            Err(AppError::Upload(msg)) => assert_eq!(msg, "Please upload an image file"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let storage = PhotoStorage::new("/tmp", 10);
        assert!(storage.validate(Some(&file("image/png", 10))).is_ok());
        assert!(matches!(
            storage.validate(Some(&file("image/png", 11))),
            Err(AppError::Upload(_))
        ));
    }

    #[test]
    fn test_file_name_keeps_extension() {
        let id = Uuid::new_v4();
        assert_eq!(
            PhotoStorage::file_name_for(id, "my dinner.jpeg"),
            format!("photo_{}.jpeg", id)
        );
        assert_eq!(PhotoStorage::file_name_for(id, "blob"), format!("photo_{}", id));
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = std::env::temp_dir().join(format!("recipe-box-test-{}", Uuid::new_v4()));
        let storage = PhotoStorage::new(&dir, 1024);
        let id = Uuid::new_v4();

        let name = storage.save(id, &file("image/jpeg", 16)).await.unwrap();

        let written = tokio::fs::read(dir.join(&name)).await.unwrap();
        assert_eq!(written.len(), 16);

        storage.remove(&name).await;
        assert!(!dir.join(&name).exists());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
