// src/services/image_lifecycle.rs
//
// Ciclo de vida das imagens em relação ao registro do produto. A remoção de
// um blob antigo só é disparada depois que a escrita do registro foi aplicada,
// roda em uma task separada e nunca falha a requisição: em caso de erro o
// arquivo fica órfão e apenas registramos no log.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    common::error::AppError,
    storage::{BlobStore, ImageUpload},
};

#[derive(Clone)]
pub struct ImageLifecycle {
    blobs: Arc<dyn BlobStore>,
}

impl ImageLifecycle {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub async fn store(&self, upload: &ImageUpload) -> Result<String, AppError> {
        self.blobs.store(upload).await
    }

    /// Após um update salvo: remove a imagem anterior se ela foi substituída.
    pub fn reconcile(&self, previous: Option<&str>, current: Option<&str>) -> Option<JoinHandle<()>> {
        match (previous, current) {
            (Some(previous), Some(current)) if previous != current => {
                Some(self.schedule_delete(previous.to_string()))
            }
            _ => None,
        }
    }

    /// Após remover o registro (ou quando a escrita que usaria o blob falhou).
    pub fn release(&self, image: Option<&str>) -> Option<JoinHandle<()>> {
        image.map(|image_ref| self.schedule_delete(image_ref.to_string()))
    }

    fn schedule_delete(&self, image_ref: String) -> JoinHandle<()> {
        let blobs = self.blobs.clone();
        tokio::spawn(async move {
            match blobs.delete(&image_ref).await {
                Ok(()) => tracing::info!(image = %image_ref, "image removed"),
                Err(e) => tracing::warn!(
                    image = %image_ref,
                    error = %e,
                    "failed to remove image, leaving it orphaned"
                ),
            }
        })
    }
}
