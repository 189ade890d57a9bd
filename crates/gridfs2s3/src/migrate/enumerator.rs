//! Source enumeration
//!
//! Turns one listing of the source store into the ordered, deduplicated set
//! of work items. Objects without a usable name are rejected before
//! deduplication; of several objects sharing a name, the first in sorted
//! listing order is kept.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::config::MigrationSettings;
use crate::error::Result;
use crate::source::SourceStore;
use crate::types::{ObjectDescriptor, WorkItem};

/// Decides which names are eligible for migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePolicy {
    rejected_markers: Vec<String>,
}

/// Why an object was excluded before transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyName,
    Marker(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyName => write!(f, "has no filename"),
            RejectReason::Marker(marker) => write!(f, "name contains {:?}", marker),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub id: String,
    pub name: String,
    pub reason: RejectReason,
}

impl NamePolicy {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected_markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn from_settings(settings: &MigrationSettings) -> Self {
        Self::new(settings.rejected_markers.iter().cloned())
    }

    pub fn check(&self, name: &str) -> std::result::Result<(), RejectReason> {
        if name.trim().is_empty() {
            return Err(RejectReason::EmptyName);
        }

        match self.rejected_markers.iter().find(|m| name.contains(m.as_str())) {
            Some(marker) => Err(RejectReason::Marker(marker.clone())),
            None => Ok(()),
        }
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::from_settings(&MigrationSettings::default())
    }
}

/// Result of planning one listing
#[derive(Debug, Clone, Default)]
pub struct EnumerationPlan {
    /// Objects in the listing, before any filtering
    pub found: usize,
    /// Eligible items in processing order, numbered `1..=items.len()`
    pub items: Vec<WorkItem>,
    pub rejected: Vec<Rejection>,
    /// Valid objects dropped because an earlier one had the same name
    pub duplicates: usize,
}

impl EnumerationPlan {
    pub fn eligible(&self) -> usize {
        self.items.len()
    }
}

/// Sort, filter and deduplicate a listing, then number the survivors.
///
/// The sort is stable, so among equal names the one listed first wins.
pub fn plan(mut listing: Vec<ObjectDescriptor>, policy: &NamePolicy) -> EnumerationPlan {
    let found = listing.len();
    listing.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen: HashSet<String> = HashSet::with_capacity(found);
    let mut eligible = Vec::with_capacity(found);
    let mut rejected = Vec::new();
    let mut duplicates = 0;

    for object in listing {
        if let Err(reason) = policy.check(&object.name) {
            rejected.push(Rejection {
                id: object.id,
                name: object.name,
                reason,
            });
            continue;
        }

        if !seen.insert(object.name.clone()) {
            debug!(id = %object.id, name = %object.name, "Skipping duplicate name");
            duplicates += 1;
            continue;
        }

        eligible.push(object);
    }

    let total = eligible.len();
    let items = eligible
        .into_iter()
        .enumerate()
        .map(|(i, object)| WorkItem::new(object, i + 1, total))
        .collect();

    EnumerationPlan {
        found,
        items,
        rejected,
        duplicates,
    }
}

/// Lists a source store once and plans the run
pub struct Enumerator<'a, S> {
    source: &'a S,
    policy: NamePolicy,
}

impl<'a, S: SourceStore> Enumerator<'a, S> {
    pub fn new(source: &'a S, policy: NamePolicy) -> Self {
        Self { source, policy }
    }

    /// A listing failure is returned as is; nothing is planned from a
    /// partial listing.
    pub async fn enumerate(&self) -> Result<EnumerationPlan> {
        let listing = self.source.list_objects().await?;
        let plan = plan(listing, &self.policy);

        for rejection in &plan.rejected {
            warn!(
                id = %rejection.id,
                name = %rejection.name,
                "Rejected object: {}",
                rejection.reason
            );
        }

        info!(
            found = plan.found,
            eligible = plan.eligible(),
            rejected = plan.rejected.len(),
            duplicates = plan.duplicates,
            "Enumerated source objects"
        );

        Ok(plan)
    }
}
