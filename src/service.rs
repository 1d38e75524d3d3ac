//! # Service Dispatch Module
//!
//! ## Purpose
//! Top-level entry point that dispatches one combined maintenance request to
//! the reindex coordinator, the cache manager, and the artifact generator.
//! Each section runs independently and reports its own status; a failure in
//! one never suppresses the others.
//!
//! ## Input/Output Specification
//! - **Input**: a [`ServiceRequest`] with reindex flags, cache list/clear
//!   selectors, and a package-generation flag
//! - **Output**: a [`ServiceReport`] carrying one optional report per
//!   requested section, a batch id, and wall-clock timing

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::artifacts::{ArtifactBatchGenerator, ArtifactBatchReport};
use crate::cache::{CacheClearReport, CacheClearSpec, CacheListReport, CacheManager};
use crate::config::Config;
use crate::entity::ReindexRequest;
use crate::reindex::{ReindexCoordinator, ReindexReport};
use crate::store::{DiskIndexClient, JsonCollectionStore, PackageWriter};
use crate::utils::Timer;

/// One combined maintenance request.
#[derive(Debug, Clone, Default)]
pub struct ServiceRequest {
    /// Which collections to reindex, if any.
    pub reindex: ReindexRequest,
    /// List the study cache.
    pub list_cache: bool,
    /// List entries with full paths rather than logical names.
    pub list_full_paths: bool,
    /// Clear the study cache: `*` or a whitespace-separated name list.
    pub clear_cache: Option<String>,
    /// Regenerate every study's data package.
    pub generate_packages: bool,
}

impl ServiceRequest {
    /// Whether the request asks for any work at all.
    pub fn is_empty(&self) -> bool {
        !self.reindex.any_requested()
            && !self.list_cache
            && self.clear_cache.is_none()
            && !self.generate_packages
    }
}

/// Per-section results of one service run.
#[derive(Debug, Serialize)]
pub struct ServiceReport {
    /// Identifier of this run, for correlating log output.
    pub id: Uuid,
    pub started: DateTime<Utc>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reindex: Option<ReindexReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_list: Option<CacheListReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_clear: Option<CacheClearReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<ArtifactBatchReport>,
}

/// Dispatches maintenance requests to the three batch components.
pub struct IndexingService {
    coordinator: ReindexCoordinator,
    cache: CacheManager,
    artifacts: ArtifactBatchGenerator,
}

impl IndexingService {
    pub fn new(
        coordinator: ReindexCoordinator,
        cache: CacheManager,
        artifacts: ArtifactBatchGenerator,
    ) -> Self {
        Self {
            coordinator,
            cache,
            artifacts,
        }
    }

    /// Build a service wired to the filesystem-backed store described by the
    /// configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = JsonCollectionStore::new(&config.store.data_dir);
        let index = Arc::new(DiskIndexClient::new(&config.index.index_dir));
        let coordinator = ReindexCoordinator::new(store.registry(), index);

        let cache = CacheManager::new(config.cache.study_cache_dir.clone());

        let package_dir = config.packages.package_dir.clone();
        let writer = Arc::new(PackageWriter::new(
            package_dir.clone().unwrap_or_default(),
        ));
        let artifacts = ArtifactBatchGenerator::new(package_dir, Arc::new(store), writer);

        Self::new(coordinator, cache, artifacts)
    }

    /// Run every section the request asks for, sequentially and
    /// independently.
    pub async fn run(&self, request: &ServiceRequest) -> ServiceReport {
        let id = Uuid::new_v4();
        let started = Utc::now();
        let timer = Timer::new(format!("service run {}", id));

        let mut report = ServiceReport {
            id,
            started,
            elapsed_ms: 0,
            reindex: None,
            cache_list: None,
            cache_clear: None,
            packages: None,
        };

        if request.reindex.any_requested() {
            tracing::info!("[{}] Running reindex pass", id);
            report.reindex = Some(self.coordinator.reindex_selected(&request.reindex).await);
        }

        if request.list_cache {
            tracing::info!("[{}] Listing study cache", id);
            report.cache_list = Some(self.cache.list(request.list_full_paths).await);
        }

        if let Some(raw) = &request.clear_cache {
            tracing::info!("[{}] Clearing study cache: '{}'", id, raw);
            let spec = CacheClearSpec::parse(raw);
            report.cache_clear = Some(self.cache.clear(&spec).await);
        }

        if request.generate_packages {
            tracing::info!("[{}] Regenerating study packages", id);
            report.packages = Some(self.artifacts.regenerate_all().await);
        }

        report.elapsed_ms = timer.stop();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, IndexConfig, PackageConfig, StoreConfig};
    use crate::entity::EntityKind;
    use crate::status::OperationStatus;
    use serde_json::json;
    use std::path::Path;

    async fn seed_collection(dir: &Path, kind: EntityKind, documents: serde_json::Value) {
        let path = dir.join(format!("{}.json", kind.collection_name()));
        tokio::fs::write(path, serde_json::to_vec(&documents).unwrap())
            .await
            .unwrap();
    }

    fn config_for(root: &Path, with_cache: bool, with_packages: bool) -> Config {
        Config {
            store: StoreConfig {
                data_dir: root.join("collections"),
            },
            index: IndexConfig {
                index_dir: root.join("index"),
            },
            cache: CacheConfig {
                study_cache_dir: with_cache.then(|| root.join("cache")),
            },
            packages: PackageConfig {
                package_dir: with_packages.then(|| root.join("packages")),
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_sections_run_independently() {
        let tmp = tempfile::tempdir().unwrap();
        let collections = tmp.path().join("collections");
        let cache_dir = tmp.path().join("cache");
        tokio::fs::create_dir_all(&collections).await.unwrap();
        tokio::fs::create_dir_all(&cache_dir).await.unwrap();

        // Only studies exist; every other collection will fail to reindex.
        seed_collection(
            &collections,
            EntityKind::Studies,
            json!([{"name": "winter wheat"}]),
        )
        .await;
        tokio::fs::write(cache_dir.join("alpha.json"), b"{}")
            .await
            .unwrap();

        let service = IndexingService::from_config(&config_for(tmp.path(), true, true));
        let request = ServiceRequest {
            reindex: ReindexRequest::everything(true),
            list_cache: true,
            clear_cache: Some("alpha".to_string()),
            generate_packages: true,
            ..ServiceRequest::default()
        };

        let report = service.run(&request).await;

        // The failing reindex collections must not stop the cache and
        // package sections from running.
        let reindex = report.reindex.unwrap();
        assert_eq!(reindex.attempted, 6);
        assert_eq!(reindex.succeeded, 1);
        assert_eq!(reindex.status, OperationStatus::PartiallySucceeded);

        assert_eq!(report.cache_list.unwrap().entries.len(), 1);

        let clear = report.cache_clear.unwrap();
        assert_eq!(clear.removed, 1);
        assert_eq!(clear.status, OperationStatus::Succeeded);

        let packages = report.packages.unwrap();
        assert_eq!(packages.attempted, 1);
        assert_eq!(packages.status, OperationStatus::Succeeded);
        assert!(tmp
            .path()
            .join("packages")
            .join("winter_wheat.json")
            .exists());
    }

    #[tokio::test]
    async fn test_unconfigured_sections_report_idle() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("collections"))
            .await
            .unwrap();

        let service = IndexingService::from_config(&config_for(tmp.path(), false, false));
        let request = ServiceRequest {
            list_cache: true,
            clear_cache: Some("*".to_string()),
            generate_packages: true,
            ..ServiceRequest::default()
        };

        let report = service.run(&request).await;
        assert_eq!(report.cache_list.unwrap().status, OperationStatus::Idle);
        assert_eq!(report.cache_clear.unwrap().status, OperationStatus::Idle);
        assert_eq!(report.packages.unwrap().status, OperationStatus::Idle);
        assert!(report.reindex.is_none());
    }

    #[tokio::test]
    async fn test_empty_request_runs_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let service = IndexingService::from_config(&config_for(tmp.path(), false, false));
        let request = ServiceRequest::default();
        assert!(request.is_empty());

        let report = service.run(&request).await;
        assert!(report.reindex.is_none());
        assert!(report.cache_list.is_none());
        assert!(report.cache_clear.is_none());
        assert!(report.packages.is_none());
    }

    #[tokio::test]
    async fn test_full_reindex_writes_every_index() {
        let tmp = tempfile::tempdir().unwrap();
        let collections = tmp.path().join("collections");
        tokio::fs::create_dir_all(&collections).await.unwrap();

        for kind in crate::entity::REINDEX_ORDER {
            seed_collection(&collections, kind, json!([{"name": kind.label()}])).await;
        }

        let service = IndexingService::from_config(&config_for(tmp.path(), false, false));
        let request = ServiceRequest {
            reindex: ReindexRequest::everything(false),
            ..ServiceRequest::default()
        };

        let report = service.run(&request).await;
        let reindex = report.reindex.unwrap();
        assert_eq!(reindex.status, OperationStatus::Succeeded);

        for kind in crate::entity::REINDEX_ORDER {
            let path = tmp
                .path()
                .join("index")
                .join(format!("{}.jsonl", kind.index_name()));
            assert!(path.exists(), "missing index file {:?}", path);
        }
    }
}
