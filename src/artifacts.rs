//! # Artifact Batch Generator Module
//!
//! ## Purpose
//! Regenerates the derived data package for every study in one batch. Each
//! study is fetched from the study repository and handed to the package
//! writer; per-study failures are counted without halting the batch.
//!
//! ## Input/Output Specification
//! - **Input**: the full study set at the moment the batch starts
//! - **Output**: an [`ArtifactBatchReport`] with `(attempted, succeeded)`
//!   counts and the aggregate status
//! - **Idle case**: with no package directory configured the batch reports
//!   `Idle` and performs no work
//!
//! Studies added to the store while the batch runs are not guaranteed to be
//! included; the batch operates on the snapshot it loaded.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::repository::{ArtifactWriter, StudyRepository};
use crate::status::OperationStatus;
use crate::Document;

/// Result of a finished package-generation batch.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactBatchReport {
    /// Number of studies in the snapshot the batch worked through.
    pub attempted: usize,
    /// Number of studies whose package was written.
    pub succeeded: usize,
    pub status: OperationStatus,
    /// One message per study that failed.
    pub errors: Vec<String>,
}

/// Regenerates every study's derived data package.
pub struct ArtifactBatchGenerator {
    package_dir: Option<PathBuf>,
    studies: Arc<dyn StudyRepository>,
    writer: Arc<dyn ArtifactWriter>,
}

impl ArtifactBatchGenerator {
    pub fn new(
        package_dir: Option<PathBuf>,
        studies: Arc<dyn StudyRepository>,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Self {
        Self {
            package_dir,
            studies,
            writer,
        }
    }

    /// Regenerate the package for every study.
    ///
    /// A study whose write fails is counted as a failure and the batch moves
    /// on to the next one; only a failure to load the study set at all fails
    /// the whole batch up front.
    pub async fn regenerate_all(&self) -> ArtifactBatchReport {
        if self.package_dir.is_none() {
            tracing::info!("No package path has been set, skipping package generation");
            return ArtifactBatchReport {
                attempted: 0,
                succeeded: 0,
                status: OperationStatus::Idle,
                errors: Vec::new(),
            };
        }

        let studies = match self.studies.all_studies().await {
            Ok(studies) => studies,
            Err(e) => {
                tracing::error!("Failed to load studies for package generation: {}", e);
                return ArtifactBatchReport {
                    attempted: 0,
                    succeeded: 0,
                    status: OperationStatus::Failed,
                    errors: vec![format!("failed to load studies: {}", e)],
                };
            }
        };

        let attempted = studies.len();
        let mut succeeded = 0;
        let mut errors = Vec::new();

        for study in &studies {
            let name = study_name(study);
            match self.writer.write_study_package(study).await {
                Ok(()) => {
                    tracing::debug!("Wrote package for study '{}'", name);
                    succeeded += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to write package for study '{}': {}", name, e);
                    errors.push(format!("study '{}': {}", name, e));
                }
            }
        }

        // A store with zero studies is a finished, successful batch; there
        // was simply nothing to regenerate.
        let status = if attempted == 0 {
            OperationStatus::Succeeded
        } else {
            OperationStatus::from_counts(attempted, succeeded)
        };

        tracing::info!(
            "Package generation finished: {} of {} studies written ({})",
            succeeded,
            attempted,
            status
        );

        ArtifactBatchReport {
            attempted,
            succeeded,
            status,
            errors,
        }
    }
}

/// Best-effort display name for a study record.
fn study_name(study: &Document) -> String {
    study
        .get("name")
        .and_then(|value| value.as_str())
        .or_else(|| study.get("_id").and_then(|value| value.as_str()))
        .unwrap_or("<unnamed>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{IndexingError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedStudies {
        studies: Vec<Document>,
    }

    #[async_trait]
    impl StudyRepository for FixedStudies {
        async fn all_studies(&self) -> Result<Vec<Document>> {
            Ok(self.studies.clone())
        }
    }

    struct BrokenStudies;

    #[async_trait]
    impl StudyRepository for BrokenStudies {
        async fn all_studies(&self) -> Result<Vec<Document>> {
            Err(IndexingError::Repository {
                collection: "studies".to_string(),
                details: "store unavailable".to_string(),
            })
        }
    }

    /// Writer that fails for the studies named in `reject` and records every
    /// attempt.
    struct SelectiveWriter {
        reject: Vec<String>,
        written: Mutex<Vec<String>>,
    }

    impl SelectiveWriter {
        fn accepting_all() -> Self {
            Self {
                reject: Vec::new(),
                written: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(names: &[&str]) -> Self {
            Self {
                reject: names.iter().map(|name| name.to_string()).collect(),
                written: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ArtifactWriter for SelectiveWriter {
        async fn write_study_package(&self, study: &Document) -> Result<()> {
            let name = study_name(study);
            if self.reject.contains(&name) {
                return Err(IndexingError::ArtifactWrite {
                    study: name,
                    details: "disk full".to_string(),
                });
            }
            self.written.lock().unwrap().push(name);
            Ok(())
        }
    }

    fn studies(names: &[&str]) -> Vec<Document> {
        names.iter().map(|name| json!({ "name": name })).collect()
    }

    #[tokio::test]
    async fn test_all_packages_written() {
        let generator = ArtifactBatchGenerator::new(
            Some(PathBuf::from("/tmp/packages")),
            Arc::new(FixedStudies {
                studies: studies(&["winter wheat", "spring barley"]),
            }),
            Arc::new(SelectiveWriter::accepting_all()),
        );

        let report = generator.regenerate_all().await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.status, OperationStatus::Succeeded);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failed_study_does_not_halt_batch() {
        let writer = Arc::new(SelectiveWriter::rejecting(&["spring barley"]));
        let generator = ArtifactBatchGenerator::new(
            Some(PathBuf::from("/tmp/packages")),
            Arc::new(FixedStudies {
                studies: studies(&["winter wheat", "spring barley", "oats"]),
            }),
            writer.clone(),
        );

        let report = generator.regenerate_all().await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.status, OperationStatus::PartiallySucceeded);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("spring barley"));
        // The study after the failing one was still attempted.
        assert_eq!(
            writer.written.lock().unwrap().clone(),
            vec!["winter wheat".to_string(), "oats".to_string()]
        );
    }

    #[tokio::test]
    async fn test_every_study_failing_is_failed() {
        let generator = ArtifactBatchGenerator::new(
            Some(PathBuf::from("/tmp/packages")),
            Arc::new(FixedStudies {
                studies: studies(&["winter wheat"]),
            }),
            Arc::new(SelectiveWriter::rejecting(&["winter wheat"])),
        );

        let report = generator.regenerate_all().await;
        assert_eq!(report.status, OperationStatus::Failed);
    }

    #[tokio::test]
    async fn test_unconfigured_package_dir_is_idle() {
        let generator = ArtifactBatchGenerator::new(
            None,
            Arc::new(FixedStudies {
                studies: studies(&["winter wheat"]),
            }),
            Arc::new(SelectiveWriter::accepting_all()),
        );

        let report = generator.regenerate_all().await;
        assert_eq!(report.status, OperationStatus::Idle);
        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn test_study_load_failure_fails_batch() {
        let generator = ArtifactBatchGenerator::new(
            Some(PathBuf::from("/tmp/packages")),
            Arc::new(BrokenStudies),
            Arc::new(SelectiveWriter::accepting_all()),
        );

        let report = generator.regenerate_all().await;
        assert_eq!(report.status, OperationStatus::Failed);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_study_set_succeeds() {
        let generator = ArtifactBatchGenerator::new(
            Some(PathBuf::from("/tmp/packages")),
            Arc::new(FixedStudies {
                studies: Vec::new(),
            }),
            Arc::new(SelectiveWriter::accepting_all()),
        );

        let report = generator.regenerate_all().await;
        assert_eq!(report.status, OperationStatus::Succeeded);
        assert_eq!(report.attempted, 0);
    }
}
