//! # Design Store
//!
//! Boundary to persistent storage: read a design by id, persist an exported
//! artifact and read it back. [`MemoryStore`] keeps everything in process
//! and is what the server uses by default.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::Document;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

/// Handle to a persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub meta: ArtifactRef,
    pub bytes: Arc<Vec<u8>>,
}

#[async_trait]
pub trait DesignStore: Send + Sync {
    async fn load_document(&self, id: &str) -> Result<Document, StoreError>;

    async fn save_artifact(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ArtifactRef, StoreError>;

    async fn load_artifact(&self, id: &str) -> Result<StoredArtifact, StoreError>;

    /// Drop artifacts created before `cutoff`. Returns how many were removed.
    async fn evict_artifacts_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<String, Document>>>,
    artifacts: Arc<RwLock<HashMap<String, StoredArtifact>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document under `id`.
    pub async fn put_document(&self, id: impl Into<String>, mut document: Document) {
        let id = id.into();
        document.id = Some(id.clone());
        self.documents.write().await.insert(id, document);
    }

    pub async fn artifact_count(&self) -> usize {
        self.artifacts.read().await.len()
    }
}

#[async_trait]
impl DesignStore for MemoryStore {
    async fn load_document(&self, id: &str) -> Result<Document, StoreError> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))
    }

    async fn save_artifact(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ArtifactRef, StoreError> {
        let meta = ArtifactRef {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
            created_at: Utc::now(),
        };
        self.artifacts.write().await.insert(
            meta.id.clone(),
            StoredArtifact {
                meta: meta.clone(),
                bytes: Arc::new(bytes),
            },
        );
        Ok(meta)
    }

    async fn load_artifact(&self, id: &str) -> Result<StoredArtifact, StoreError> {
        self.artifacts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ArtifactNotFound(id.to_string()))
    }

    async fn evict_artifacts_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut artifacts = self.artifacts.write().await;
        let before = artifacts.len();
        artifacts.retain(|_, a| a.meta.created_at >= cutoff);
        Ok(before - artifacts.len())
    }
}
