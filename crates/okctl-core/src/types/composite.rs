//! Presence report for composites.
//!
//! Composites own no row of their own. Their status is assembled from the
//! children they are made of, looked up by deterministic keys.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildStatus {
    pub kind: String,
    pub key: String,
    pub present: bool,
}

impl ChildStatus {
    pub fn new(kind: &str, key: impl Into<String>, present: bool) -> Self {
        Self {
            kind: kind.to_string(),
            key: key.into(),
            present,
        }
    }
}

/// A composite is complete only when every required child is present.
/// Partial bundles are a valid state and are reported as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeStatus {
    pub name: String,
    pub complete: bool,
    pub children: Vec<ChildStatus>,
}

impl CompositeStatus {
    pub fn new(name: impl Into<String>, children: Vec<ChildStatus>) -> Self {
        let complete = !children.is_empty() && children.iter().all(|c| c.present);
        Self {
            name: name.into(),
            complete,
            children,
        }
    }

    /// Children that still need to be created.
    pub fn missing(&self) -> impl Iterator<Item = &ChildStatus> {
        self.children.iter().filter(|c| !c.present)
    }
}
