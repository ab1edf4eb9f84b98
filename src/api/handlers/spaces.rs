use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::space_or_404;
use crate::api::render::{Notices, Page};
use crate::db::Database;
use crate::error::AppError;
use crate::models::{Post, Space};

/// Landing page of a space: where proposal submissions redirect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacePage {
    pub space: Space,
    pub proposal_count: u64,
    pub news: Vec<Post>,
}

pub async fn view_space(
    State(db): State<Database>,
    notices: Notices,
    Path(space): Path<String>,
) -> Result<Json<Page<SpacePage>>, AppError> {
    let space = space_or_404(&db, &space)?;

    Ok(notices.render(SpacePage {
        proposal_count: db.count_proposals(space.id)?,
        news: db.get_space_posts(space.id)?,
        space,
    }))
}
