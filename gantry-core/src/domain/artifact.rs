//! Artifact domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque content handle produced by one action and read by later ones
///
/// Handles are fresh per run. Consumers only ever read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub id: Uuid,
    pub name: String,
    /// Name of the producing action
    pub producer: String,
    /// Where the executor placed the content (path, URI, ...)
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ArtifactHandle {
    pub fn new(name: impl Into<String>, producer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            producer: producer.into(),
            location: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
