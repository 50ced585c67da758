// src/storage.rs
//
// Armazenamento das imagens dos produtos (blobs). O registro guarda apenas
// a referência relativa `/images/<arquivo>`, servida estaticamente.

use async_trait::async_trait;
use axum::body::Bytes;

use crate::common::error::AppError;

pub mod local;
pub use local::LocalBlobStore;

#[cfg(test)]
pub mod memory;

/// Ponto de montagem público das imagens.
pub const IMAGE_URL_PREFIX: &str = "/images/";

const ACCEPTED_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Arquivo de imagem recebido no multipart.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Extensão usada no nome gerado; `None` se o tipo não é aceito.
    pub fn extension(&self) -> Option<&'static str> {
        ACCEPTED_TYPES
            .iter()
            .find(|(mime, _)| self.content_type.eq_ignore_ascii_case(mime))
            .map(|(_, ext)| *ext)
    }

    pub fn validate(&self, max_bytes: usize) -> Result<(), AppError> {
        if self.extension().is_none() {
            return Err(AppError::InvalidImage(
                "Only image files (jpeg, png, gif, webp) are allowed".into(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(AppError::InvalidImage("Image file is empty".into()));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::InvalidImage(format!(
                "Image exceeds the maximum size of {max_bytes} bytes"
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Grava o arquivo e devolve a referência pública (`/images/...`).
    async fn store(&self, upload: &ImageUpload) -> Result<String, AppError>;

    async fn delete(&self, image_ref: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, bytes: &'static [u8]) -> ImageUpload {
        ImageUpload {
            file_name: Some("photo".into()),
            content_type: content_type.into(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn accepts_known_image_types() {
        assert_eq!(upload("image/png", b"x").extension(), Some("png"));
        assert_eq!(upload("IMAGE/JPEG", b"x").extension(), Some("jpg"));
        assert!(upload("image/webp", b"x").validate(10).is_ok());
    }

    #[test]
    fn rejects_non_images_and_oversized_files() {
        assert!(matches!(
            upload("application/pdf", b"x").validate(10),
            Err(AppError::InvalidImage(_))
        ));
        assert!(matches!(
            upload("image/png", b"0123456789ab").validate(10),
            Err(AppError::InvalidImage(_))
        ));
        assert!(matches!(
            upload("image/png", b"").validate(10),
            Err(AppError::InvalidImage(_))
        ));
    }
}
