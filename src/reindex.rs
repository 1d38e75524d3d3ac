//! # Reindex Coordinator Module
//!
//! ## Purpose
//! Rebuilds the full-text search index from the independent record
//! collections. Each selected collection is fetched from its repository and
//! submitted to the index client under that kind's fixed index name; the
//! per-collection outcomes are aggregated into one reportable status.
//!
//! ## Input/Output Specification
//! - **Input**: a [`ReindexRequest`] selecting collections and the initial
//!   update mode
//! - **Output**: a [`ReindexReport`] with per-kind outcomes, counts, and the
//!   aggregate status
//! - **Central property**: continue-on-error. One collection's failure never
//!   aborts the processing of the collections after it; the batch only ever
//!   stops when every selected collection has been attempted.
//!
//! ## Update-mode override
//! After the first collection of a multi-kind pass has been processed, the
//! update flag is forced on for every later collection regardless of the
//! caller's original value. A full replace partway through a pass would wipe
//! the entries written moments earlier in the same pass; callers wanting a
//! from-scratch rebuild clear the index before requesting the pass. The
//! override is a named, tested policy on the coordinator rather than an
//! implicit side effect.

use serde::Serialize;
use std::sync::Arc;

use crate::entity::{EntityKind, ReindexRequest};
use crate::repository::{RepositoryRegistry, SearchIndexClient};
use crate::status::{OperationStatus, StatusTally};

/// Outcome of one collection within a reindex pass.
#[derive(Debug, Clone, Serialize)]
pub struct KindOutcome {
    pub kind: EntityKind,
    pub status: OperationStatus,
}

/// Result of a finished reindex pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReindexReport {
    /// Per-collection outcomes in processing order.
    pub outcomes: Vec<KindOutcome>,
    /// Number of collections processed.
    pub attempted: usize,
    /// Number of collections whose outcome contributed to the batch.
    pub succeeded: usize,
    /// Aggregate status over the whole pass.
    pub status: OperationStatus,
    /// One message per failed collection.
    pub errors: Vec<String>,
}

/// Orchestrates reindexing across the record collections.
pub struct ReindexCoordinator {
    registry: RepositoryRegistry,
    index: Arc<dyn SearchIndexClient>,
    update_after_first: bool,
}

impl ReindexCoordinator {
    pub fn new(registry: RepositoryRegistry, index: Arc<dyn SearchIndexClient>) -> Self {
        Self {
            registry,
            index,
            update_after_first: true,
        }
    }

    /// Control the update-mode override for multi-kind passes.
    ///
    /// On by default; turning it off makes every collection honour the
    /// caller's update flag, which lets a replace pass wipe entries written
    /// earlier in the same pass.
    pub fn with_update_after_first(mut self, enabled: bool) -> Self {
        self.update_after_first = enabled;
        self
    }

    /// Reindex a single collection.
    ///
    /// Failures are reported as a status, never as an error: a missing
    /// repository, a fetch failure, an empty collection, and a rejected index
    /// submission all yield [`OperationStatus::Failed`] so that callers in a
    /// multi-kind pass keep going.
    pub async fn reindex_kind(
        &self,
        kind: EntityKind,
        update_existing: bool,
    ) -> OperationStatus {
        let Some(repository) = self.registry.get(kind) else {
            tracing::error!("No repository registered for {}", kind);
            return OperationStatus::Failed;
        };

        let documents = match repository.indexing_documents().await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!("Failed to fetch {} for indexing: {}", kind, e);
                return OperationStatus::Failed;
            }
        };

        if documents.is_empty() {
            tracing::warn!("No indexable documents available for {}", kind);
            return OperationStatus::Failed;
        }

        tracing::debug!(
            "Submitting {} documents to '{}' (update: {})",
            documents.len(),
            kind.index_name(),
            update_existing
        );

        match self
            .index
            .index(kind.index_name(), &documents, update_existing)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Index submission failed for {}: {}", kind, e);
                OperationStatus::Failed
            }
        }
    }

    /// Reindex the selected collections in the fixed priority order.
    pub async fn reindex_selected(&self, request: &ReindexRequest) -> ReindexReport {
        let kinds = request.requested_kinds();
        let mut update_existing = request.update_existing;
        let mut tally = StatusTally::default();
        let mut outcomes = Vec::with_capacity(kinds.len());
        let mut errors = Vec::new();

        for kind in kinds {
            let status = self.reindex_kind(kind, update_existing).await;
            tally.record(status);

            if !status.contributes() {
                errors.push(format!("reindexing {} failed", kind));
            }
            outcomes.push(KindOutcome { kind, status });

            if self.update_after_first {
                update_existing = true;
            }
        }

        let status = tally.aggregate();
        tracing::info!(
            "Reindex pass finished: {} of {} collections succeeded ({})",
            tally.succeeded(),
            tally.attempted(),
            status
        );

        ReindexReport {
            outcomes,
            attempted: tally.attempted(),
            succeeded: tally.succeeded(),
            status,
            errors,
        }
    }

    /// Reindex every collection.
    pub async fn reindex_all(&self, update_existing: bool) -> ReindexReport {
        self.reindex_selected(&ReindexRequest::everything(update_existing))
            .await
    }
}
