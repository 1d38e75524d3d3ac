//! # Entity Kind Module
//!
//! ## Purpose
//! The closed set of indexable record kinds managed by the service, the
//! per-kind search index names, and the reindex request passed to the
//! coordinator.
//!
//! ## Input/Output Specification
//! - **Input**: per-kind selection flags from callers (CLI, job framework)
//! - **Output**: the ordered list of kinds a reindex pass must process
//! - **Ordering**: a fixed priority order is used for every multi-kind pass,
//!   since downstream consumers expect trials and studies (which reference
//!   each other) to land in the index first

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::IndexingError;

/// The record kinds that can be pushed into the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Trials,
    Studies,
    Locations,
    MeasuredVariables,
    Programmes,
    Treatments,
}

/// The order in which a multi-kind reindex pass processes collections.
///
/// Studies and trials come first so that the index is self-consistent for the
/// records that reference each other; the remaining kinds are independent.
pub const REINDEX_ORDER: [EntityKind; 6] = [
    EntityKind::Studies,
    EntityKind::Trials,
    EntityKind::Locations,
    EntityKind::MeasuredVariables,
    EntityKind::Programmes,
    EntityKind::Treatments,
];

impl EntityKind {
    /// Name of the search index this kind is written to.
    pub fn index_name(&self) -> &'static str {
        match self {
            EntityKind::Trials => "index_trials",
            EntityKind::Studies => "index_studies",
            EntityKind::Locations => "index_locations",
            EntityKind::MeasuredVariables => "index_measured_variables",
            EntityKind::Programmes => "index_programmes",
            EntityKind::Treatments => "index_treatments",
        }
    }

    /// Name of the backing document-store collection.
    pub fn collection_name(&self) -> &'static str {
        match self {
            EntityKind::Trials => "trials",
            EntityKind::Studies => "studies",
            EntityKind::Locations => "locations",
            EntityKind::MeasuredVariables => "measured_variables",
            EntityKind::Programmes => "programmes",
            EntityKind::Treatments => "treatments",
        }
    }

    /// Human-readable label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Trials => "field trials",
            EntityKind::Studies => "studies",
            EntityKind::Locations => "locations",
            EntityKind::MeasuredVariables => "measured variables",
            EntityKind::Programmes => "programmes",
            EntityKind::Treatments => "treatments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = IndexingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trials" | "field-trials" => Ok(EntityKind::Trials),
            "studies" => Ok(EntityKind::Studies),
            "locations" => Ok(EntityKind::Locations),
            "measured-variables" | "measured_variables" => Ok(EntityKind::MeasuredVariables),
            "programmes" | "programs" => Ok(EntityKind::Programmes),
            "treatments" => Ok(EntityKind::Treatments),
            other => Err(IndexingError::ValidationFailed {
                field: "entity kind".to_string(),
                reason: format!("unknown kind '{}'", other),
            }),
        }
    }
}

/// A caller's selection of collections to reindex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReindexRequest {
    /// Reindex every kind, ignoring the per-kind flags.
    #[serde(default)]
    pub all: bool,
    /// Update existing index entries rather than wiping and replacing them.
    /// Only honoured for the first collection of a multi-kind pass; see
    /// [`crate::reindex::ReindexCoordinator`] for the override policy.
    #[serde(default)]
    pub update_existing: bool,
    #[serde(default)]
    pub trials: bool,
    #[serde(default)]
    pub studies: bool,
    #[serde(default)]
    pub locations: bool,
    #[serde(default)]
    pub measured_variables: bool,
    #[serde(default)]
    pub programmes: bool,
    #[serde(default)]
    pub treatments: bool,
}

impl ReindexRequest {
    /// A request for every kind.
    pub fn everything(update_existing: bool) -> Self {
        Self {
            all: true,
            update_existing,
            ..Self::default()
        }
    }

    /// A request for a single kind.
    pub fn for_kind(kind: EntityKind, update_existing: bool) -> Self {
        let mut request = Self {
            update_existing,
            ..Self::default()
        };
        request.set_requested(kind, true);
        request
    }

    /// Turn the flag for one kind on or off.
    pub fn set_requested(&mut self, kind: EntityKind, requested: bool) {
        match kind {
            EntityKind::Trials => self.trials = requested,
            EntityKind::Studies => self.studies = requested,
            EntityKind::Locations => self.locations = requested,
            EntityKind::MeasuredVariables => self.measured_variables = requested,
            EntityKind::Programmes => self.programmes = requested,
            EntityKind::Treatments => self.treatments = requested,
        }
    }

    /// Whether this kind is selected, taking the `all` flag into account.
    pub fn is_requested(&self, kind: EntityKind) -> bool {
        if self.all {
            return true;
        }
        match kind {
            EntityKind::Trials => self.trials,
            EntityKind::Studies => self.studies,
            EntityKind::Locations => self.locations,
            EntityKind::MeasuredVariables => self.measured_variables,
            EntityKind::Programmes => self.programmes,
            EntityKind::Treatments => self.treatments,
        }
    }

    /// Whether the request selects anything at all.
    pub fn any_requested(&self) -> bool {
        REINDEX_ORDER.iter().any(|kind| self.is_requested(*kind))
    }

    /// The selected kinds in the fixed processing order.
    pub fn requested_kinds(&self) -> Vec<EntityKind> {
        REINDEX_ORDER
            .iter()
            .copied()
            .filter(|kind| self.is_requested(*kind))
            .collect()
    }
}
