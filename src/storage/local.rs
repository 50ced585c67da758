// src/storage/local.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    storage::{BlobStore, ImageUpload, IMAGE_URL_PREFIX},
};

/// Guarda as imagens em um diretório local, servido em `/images`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    // Só aceita um nome de arquivo simples sob o prefixo; nada de subdiretórios.
    fn resolve(&self, image_ref: &str) -> Option<PathBuf> {
        let file_name = image_ref.strip_prefix(IMAGE_URL_PREFIX)?;
        let is_plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);
        is_plain.then(|| self.root.join(file_name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, upload: &ImageUpload) -> Result<String, AppError> {
        let extension = upload
            .extension()
            .ok_or_else(|| AppError::InvalidImage("Unsupported image type".into()))?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::write(self.root.join(&file_name), &upload.bytes).await?;
        tracing::debug!(
            file = %file_name,
            original = ?upload.file_name,
            bytes = upload.bytes.len(),
            "image stored"
        );

        Ok(format!("{IMAGE_URL_PREFIX}{file_name}"))
    }

    async fn delete(&self, image_ref: &str) -> Result<(), AppError> {
        let path = self.resolve(image_ref).ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!("invalid image reference: {image_ref}"))
        })?;
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}
