//! # Field Trial Indexing Service
//!
//! ## Overview
//! This library implements the reindexing orchestrator and derived-artifact
//! cache manager for a field-trial record-management service. It rebuilds a
//! full-text search index from several independent record collections with
//! partial-failure tolerance, and manages a file-system-backed cache of
//! generated per-study data packages.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `entity`: the closed set of indexable record kinds and reindex requests
//! - `reindex`: per-kind reindexing and multi-kind status aggregation
//! - `cache`: cache-file enumeration and selective or wildcard eviction
//! - `artifacts`: batch regeneration of per-study data packages
//! - `service`: top-level dispatch of a combined maintenance request
//! - `repository`: collaborator seams (document store, index client, writer)
//! - `store`: filesystem-backed implementations of the collaborator seams
//! - `config`: configuration management and settings
//! - `errors`: centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: a maintenance request (reindex flags, cache list/clear,
//!   package generation) plus record collections from the document store
//! - **Output**: per-section reports with a five-valued operation status
//!   (`Idle`, `FailedToStart`, `Failed`, `PartiallySucceeded`, `Succeeded`)
//! - **Guarantee**: one item's failure never aborts the rest of a batch
//!
//! ## Usage
//! ```rust,no_run
//! use field_trial_indexing::{Config, IndexingService, ServiceRequest, ReindexRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let service = IndexingService::from_config(&config);
//!     let request = ServiceRequest {
//!         reindex: ReindexRequest::everything(true),
//!         ..ServiceRequest::default()
//!     };
//!     let report = service.run(&request).await;
//!     println!("reindex finished: {:?}", report.reindex);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod artifacts;
pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod reindex;
pub mod repository;
pub mod service;
pub mod status;
pub mod store;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use artifacts::{ArtifactBatchGenerator, ArtifactBatchReport};
pub use cache::{CacheClearReport, CacheClearSpec, CacheEntry, CacheListReport, CacheManager};
pub use config::Config;
pub use entity::{EntityKind, ReindexRequest};
pub use errors::{IndexingError, Result};
pub use reindex::{ReindexCoordinator, ReindexReport};
pub use service::{IndexingService, ServiceRequest, ServiceReport};
pub use status::OperationStatus;

/// A single indexable record, as handed to the search index client.
///
/// Records cross the collaborator seams as plain JSON; the per-collection
/// document schemas belong to the document store, not to this crate.
pub type Document = serde_json::Value;
