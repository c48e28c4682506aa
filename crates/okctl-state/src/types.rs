//! Storage-shaped types for the okctl state store.
//!
//! Every row is an [`Envelope`] around a kind's storage type. The storage
//! types use snake_case field names and a flattened identity so the file
//! format stays independent of the camelCase wire format.

use chrono::{DateTime, Utc};
use okctl_core::Id;
use serde::{Deserialize, Serialize};

// ── Envelope ───────────────────────────────────────────────────────

/// Bookkeeping carried by every stored row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    /// Set on first save and never regenerated.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-deleted rows stay on disk but are invisible to live reads.
    pub deleted: bool,
}

impl Metadata {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    /// Metadata for a re-save: creation time kept, update time refreshed,
    /// a soft-deleted row revived.
    pub fn touched(self, now: DateTime<Utc>) -> Self {
        Self {
            created_at: self.created_at,
            updated_at: now,
            deleted: false,
        }
    }
}

/// A stored row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<S> {
    pub key: String,
    pub metadata: Metadata,
    pub data: S,
}

// ── Identity ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredId {
    pub region: String,
    pub account_id: String,
    pub environment: String,
    pub repository: String,
    pub cluster_name: String,
}

impl From<&Id> for StoredId {
    fn from(id: &Id) -> Self {
        Self {
            region: id.region.clone(),
            account_id: id.account_id.clone(),
            environment: id.environment.clone(),
            repository: id.repository.clone(),
            cluster_name: id.cluster_name.clone(),
        }
    }
}

impl From<StoredId> for Id {
    fn from(s: StoredId) -> Self {
        Id {
            region: s.region,
            account_id: s.account_id,
            environment: s.environment,
            repository: s.repository,
            cluster_name: s.cluster_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn touched_keeps_created_at_and_revives() {
        let t0 = Utc::now();
        let mut meta = Metadata::new(t0);
        meta.deleted = true;
        let later = t0 + Duration::seconds(30);
        let touched = meta.touched(later);
        assert_eq!(touched.created_at, t0);
        assert_eq!(touched.updated_at, later);
        assert!(!touched.deleted);
    }

    #[test]
    fn stored_id_uses_snake_case() {
        let id = Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging");
        let json = serde_json::to_value(StoredId::from(&id)).unwrap();
        assert_eq!(json["account_id"], "123456789012");
        assert_eq!(Id::from(serde_json::from_value::<StoredId>(json).unwrap()), id);
    }
}
