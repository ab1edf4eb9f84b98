use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A news article.
///
/// Posts with `pub_index` set are listed on the site index and in the news
/// list. A post created from inside a space keeps a reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub space_id: Option<i64>,
    pub title: String,
    pub message: String,
    /// Username of the writer.
    pub author: String,
    pub pub_index: bool,
    pub pub_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

/// The user-editable fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(default, deserialize_with = "crate::forms::checkbox")]
    pub pub_index: bool,
}

impl From<&Post> for PostForm {
    fn from(p: &Post) -> Self {
        Self {
            title: p.title.clone(),
            message: p.message.clone(),
            pub_index: p.pub_index,
        }
    }
}

/// Input for persisting a new post.
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub space_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub author: String,
    pub pub_index: bool,
    pub pub_date: DateTime<Utc>,
}

/// Input for updating an existing post.
#[derive(Debug, Clone)]
pub struct UpdatePostInput {
    pub title: String,
    pub message: String,
    pub pub_index: bool,
}
