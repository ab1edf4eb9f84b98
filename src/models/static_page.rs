use serde::{Deserialize, Serialize};

/// An informational page, optionally linked from the site footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPage {
    pub id: i64,
    pub name: String,
    pub uri: String,
    pub content: String,
    pub show_footer: bool,
    pub order: i64,
}

/// Input for creating a new static page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaticPageInput {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub show_footer: bool,
    #[serde(default)]
    pub order: i64,
}
