use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participation area containing proposals and news.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: i64,
    pub name: String,
    /// Unique slug used in every space-scoped URL.
    pub url: String,
    pub description: Option<String>,
    /// Creation time, used to pick the most recent spaces.
    pub date: DateTime<Utc>,
}

/// Input for creating a new space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpaceInput {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    /// Defaults to now when not given.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}
