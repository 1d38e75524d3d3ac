//! # Collaborator Seams Module
//!
//! ## Purpose
//! Trait seams for the external collaborators of the indexing core: the
//! per-collection document store, the full-text index client, and the
//! per-study package writer. The batch components only ever talk to these
//! traits; concrete implementations live in [`crate::store`] or outside the
//! crate entirely.
//!
//! ## Input/Output Specification
//! - **Input**: record collections as JSON documents
//! - **Output**: index submission statuses, written study packages
//! - **Dispatch**: a closed lookup table from [`EntityKind`] to its
//!   repository, rather than open-ended dynamic registration

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::EntityKind;
use crate::errors::Result;
use crate::status::OperationStatus;
use crate::Document;

/// Read access to one record collection of the document store.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// The documents to push into the search index for this collection.
    async fn indexing_documents(&self) -> Result<Vec<Document>>;
}

/// The full-text search index client.
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Submit `documents` to the index named `index_name`.
    ///
    /// With `update_existing` set, entries already in the index are updated
    /// in place; otherwise the index is wiped and replaced.
    async fn index(
        &self,
        index_name: &str,
        documents: &[Document],
        update_existing: bool,
    ) -> Result<OperationStatus>;
}

/// Read access to the full set of studies for package generation.
#[async_trait]
pub trait StudyRepository: Send + Sync {
    /// Every study currently in the document store.
    async fn all_studies(&self) -> Result<Vec<Document>>;
}

/// Writer for one study's derived data package.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Serialize and persist the package for a single study.
    async fn write_study_package(&self, study: &Document) -> Result<()>;
}

/// Lookup table from record kind to its repository.
#[derive(Default, Clone)]
pub struct RepositoryRegistry {
    repositories: HashMap<EntityKind, Arc<dyn EntityRepository>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the repository backing one record kind, replacing any
    /// previous registration for that kind.
    pub fn register(&mut self, kind: EntityKind, repository: Arc<dyn EntityRepository>) {
        self.repositories.insert(kind, repository);
    }

    /// The repository for `kind`, if one is registered.
    pub fn get(&self, kind: EntityKind) -> Option<Arc<dyn EntityRepository>> {
        self.repositories.get(&kind).cloned()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyRepository;

    #[async_trait]
    impl EntityRepository for EmptyRepository {
        async fn indexing_documents(&self) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = RepositoryRegistry::new();
        assert!(registry.is_empty());
        registry.register(EntityKind::Studies, Arc::new(EmptyRepository));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(EntityKind::Studies).is_some());
        assert!(registry.get(EntityKind::Trials).is_none());
    }
}
