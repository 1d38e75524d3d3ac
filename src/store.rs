//! # Filesystem Store Module
//!
//! ## Purpose
//! Filesystem-backed implementations of the collaborator seams, used by the
//! binary and by end-to-end tests: a JSON document store reading one file per
//! record collection, an index client writing per-collection JSONL indices,
//! and a writer producing per-study data-package files.
//!
//! ## Input/Output Specification
//! - **Input**: `<data_dir>/<collection>.json` files holding JSON arrays
//! - **Output**: `<index_dir>/<index_name>.jsonl` index files and
//!   `<package_dir>/<study>.json` data-package envelopes
//! - **Update mode**: the index client appends in update mode and truncates
//!   in replace mode

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::entity::{EntityKind, REINDEX_ORDER};
use crate::errors::{IndexingError, Result};
use crate::repository::{
    ArtifactWriter, EntityRepository, RepositoryRegistry, SearchIndexClient, StudyRepository,
};
use crate::status::OperationStatus;
use crate::utils::sanitize_filename;
use crate::Document;

/// Document store reading each record collection from a JSON array file.
#[derive(Clone)]
pub struct JsonCollectionStore {
    data_dir: PathBuf,
}

impl JsonCollectionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The repository for one record kind.
    pub fn repository(&self, kind: EntityKind) -> Arc<dyn EntityRepository> {
        Arc::new(CollectionRepository {
            path: self
                .data_dir
                .join(format!("{}.json", kind.collection_name())),
            kind,
        })
    }

    /// A registry with every kind backed by this store.
    pub fn registry(&self) -> RepositoryRegistry {
        let mut registry = RepositoryRegistry::new();
        for kind in REINDEX_ORDER {
            registry.register(kind, self.repository(kind));
        }
        registry
    }
}

struct CollectionRepository {
    path: PathBuf,
    kind: EntityKind,
}

impl CollectionRepository {
    async fn load(&self) -> Result<Vec<Document>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            IndexingError::Repository {
                collection: self.kind.collection_name().to_string(),
                details: format!("failed to read {:?}: {}", self.path, e),
            }
        })?;

        let value: Document = serde_json::from_str(&raw).map_err(|e| {
            IndexingError::Repository {
                collection: self.kind.collection_name().to_string(),
                details: format!("failed to parse {:?}: {}", self.path, e),
            }
        })?;

        match value {
            Document::Array(documents) => Ok(documents),
            _ => Err(IndexingError::Repository {
                collection: self.kind.collection_name().to_string(),
                details: format!("{:?} does not contain a JSON array", self.path),
            }),
        }
    }
}

#[async_trait]
impl EntityRepository for CollectionRepository {
    async fn indexing_documents(&self) -> Result<Vec<Document>> {
        self.load().await
    }
}

#[async_trait]
impl StudyRepository for JsonCollectionStore {
    async fn all_studies(&self) -> Result<Vec<Document>> {
        let repository = CollectionRepository {
            path: self
                .data_dir
                .join(format!("{}.json", EntityKind::Studies.collection_name())),
            kind: EntityKind::Studies,
        };
        repository.load().await
    }
}

/// Index client persisting each index as a JSONL file.
pub struct DiskIndexClient {
    index_dir: PathBuf,
}

impl DiskIndexClient {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
        }
    }
}

#[async_trait]
impl SearchIndexClient for DiskIndexClient {
    async fn index(
        &self,
        index_name: &str,
        documents: &[Document],
        update_existing: bool,
    ) -> Result<OperationStatus> {
        tokio::fs::create_dir_all(&self.index_dir).await?;
        let path = self.index_dir.join(format!("{}.jsonl", index_name));

        let mut lines = String::new();
        for document in documents {
            lines.push_str(&serde_json::to_string(document)?);
            lines.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(update_existing)
            .write(true)
            .truncate(!update_existing)
            .open(&path)
            .await
            .map_err(|e| IndexingError::IndexSubmission {
                index: index_name.to_string(),
                details: format!("failed to open {:?}: {}", path, e),
            })?;

        file.write_all(lines.as_bytes())
            .await
            .map_err(|e| IndexingError::IndexSubmission {
                index: index_name.to_string(),
                details: format!("failed to write {:?}: {}", path, e),
            })?;
        file.flush().await?;

        tracing::debug!(
            "Indexed {} documents into {:?} (update: {})",
            documents.len(),
            path,
            update_existing
        );

        Ok(OperationStatus::Succeeded)
    }
}

/// Writes one Frictionless-style data-package file per study.
pub struct PackageWriter {
    package_dir: PathBuf,
}

impl PackageWriter {
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
        }
    }
}

#[async_trait]
impl ArtifactWriter for PackageWriter {
    async fn write_study_package(&self, study: &Document) -> Result<()> {
        let name = study
            .get("name")
            .and_then(|value| value.as_str())
            .or_else(|| study.get("_id").and_then(|value| value.as_str()))
            .ok_or_else(|| IndexingError::ArtifactWrite {
                study: "<unnamed>".to_string(),
                details: "study has neither 'name' nor '_id'".to_string(),
            })?
            .to_string();

        let envelope = json!({
            "profile": "data-package",
            "name": name,
            "created": Utc::now().to_rfc3339(),
            "resources": [study],
        });

        tokio::fs::create_dir_all(&self.package_dir).await?;
        let path = self
            .package_dir
            .join(format!("{}.json", sanitize_filename(&name)));
        let content =
            serde_json::to_vec_pretty(&envelope).map_err(|e| IndexingError::ArtifactWrite {
                study: name.clone(),
                details: format!("serialization failed: {}", e),
            })?;

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| IndexingError::ArtifactWrite {
                study: name,
                details: format!("failed to write {:?}: {}", path, e),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seed_collection(dir: &std::path::Path, kind: EntityKind, documents: Document) {
        let path = dir.join(format!("{}.json", kind.collection_name()));
        tokio::fs::write(path, serde_json::to_vec(&documents).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_collection_repository_reads_array() {
        let tmp = tempfile::tempdir().unwrap();
        seed_collection(
            tmp.path(),
            EntityKind::Trials,
            json!([{"name": "t1"}, {"name": "t2"}]),
        )
        .await;

        let store = JsonCollectionStore::new(tmp.path());
        let documents = store
            .repository(EntityKind::Trials)
            .indexing_documents()
            .await
            .unwrap();
        assert_eq!(documents.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_collection_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonCollectionStore::new(tmp.path());
        let result = store
            .repository(EntityKind::Locations)
            .indexing_documents()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_array_collection_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        seed_collection(tmp.path(), EntityKind::Trials, json!({"name": "t1"})).await;

        let store = JsonCollectionStore::new(tmp.path());
        assert!(store
            .repository(EntityKind::Trials)
            .indexing_documents()
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_index_client_replace_then_update() {
        let tmp = tempfile::tempdir().unwrap();
        let client = DiskIndexClient::new(tmp.path());
        let documents = vec![json!({"name": "a"}), json!({"name": "b"})];

        client.index("index_trials", &documents, false).await.unwrap();
        client.index("index_trials", &documents[..1], true).await.unwrap();

        let content = tokio::fs::read_to_string(tmp.path().join("index_trials.jsonl"))
            .await
            .unwrap();
        assert_eq!(content.lines().count(), 3);

        // Replace mode truncates what update mode appended.
        client.index("index_trials", &documents[..1], false).await.unwrap();
        let content = tokio::fs::read_to_string(tmp.path().join("index_trials.jsonl"))
            .await
            .unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_package_writer_produces_envelope() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = PackageWriter::new(tmp.path());

        writer
            .write_study_package(&json!({"name": "winter wheat", "year": 2024}))
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(tmp.path().join("winter_wheat.json"))
            .await
            .unwrap();
        let envelope: Document = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["profile"], "data-package");
        assert_eq!(envelope["resources"][0]["year"], 2024);
    }

    #[tokio::test]
    async fn test_package_writer_rejects_nameless_study() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = PackageWriter::new(tmp.path());
        assert!(writer
            .write_study_package(&json!({"year": 2024}))
            .await
            .is_err());
    }
}
