//! Site landing page and RSS feed.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::render::{Notices, Page};
use crate::auth::CurrentUser;
use crate::config::SiteSettings;
use crate::db::Database;
use crate::error::AppError;
use crate::feed::{self, FEED_ITEMS};
use crate::models::{Post, Space, StaticPage};

pub const WELCOME_MESSAGE: &str = "Hi! It seems that it's your first time here. \
     Maybe you want to register or login if you have an account.";

const RECENT_SPACES: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPage {
    pub publication: Vec<Post>,
    pub spaces: Vec<Space>,
    pub recent_spaces: Vec<Space>,
    /// Footer pages.
    pub page: Vec<StaticPage>,
    pub version: String,
    pub status: String,
    pub debug_mode: bool,
}

pub async fn index(
    State(db): State<Database>,
    State(settings): State<Arc<SiteSettings>>,
    current: CurrentUser,
    notices: Notices,
) -> Result<Json<Page<IndexPage>>, AppError> {
    let context = IndexPage {
        publication: db.get_published_posts(None, 0)?,
        spaces: db.get_all_spaces()?,
        recent_spaces: db.get_recent_spaces(RECENT_SPACES)?,
        page: db.get_footer_pages()?,
        version: settings.version.clone(),
        status: settings.status.clone(),
        debug_mode: settings.debug,
    };

    if current.is_anonymous() {
        notices.info(WELCOME_MESSAGE);
    }

    Ok(notices.render(context))
}

/// The ten most recent posts as RSS.
pub async fn rss_feed(
    State(db): State<Database>,
    State(settings): State<Arc<SiteSettings>>,
) -> Result<Response, AppError> {
    let posts = db.get_recent_posts(FEED_ITEMS)?;
    let body = feed::render_index_entries(&settings.site_url, &posts);

    Ok((
        [(CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        body,
    )
        .into_response())
}
