// src/storage/memory.rs
//
// Blob store em memória para testes; pode ser configurado para falhar.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    storage::{BlobStore, ImageUpload, IMAGE_URL_PREFIX},
};

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, usize>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, image_ref: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(image_ref)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    /// Referências cuja remoção foi tentada, com ou sem sucesso.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, upload: &ImageUpload) -> Result<String, AppError> {
        let image_ref = format!(
            "{IMAGE_URL_PREFIX}{}.{}",
            Uuid::new_v4(),
            upload.extension().unwrap_or("bin")
        );
        self.blobs
            .lock()
            .unwrap()
            .insert(image_ref.clone(), upload.bytes.len());
        Ok(image_ref)
    }

    async fn delete(&self, image_ref: &str) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(image_ref.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::StorageError(std::io::Error::other("disk unavailable")));
        }
        self.blobs.lock().unwrap().remove(image_ref);
        Ok(())
    }
}
