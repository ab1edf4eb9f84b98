pub mod news;
pub mod proposals;
pub mod site;
pub mod spaces;

use axum::{response::IntoResponse, Json};

use crate::db::Database;
use crate::error::AppError;
use crate::models::Space;

pub use news::{NewsList, PostDetail, NEWS_PER_PAGE};
pub use proposals::{ProposalDetail, ProposalList, PROPOSALS_PER_PAGE};
pub use site::{IndexPage, WELCOME_MESSAGE};
pub use spaces::SpacePage;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Resolve a space by its URL slug.
fn space_or_404(db: &Database, url: &str) -> Result<Space, AppError> {
    db.get_space_by_url(url)?
        .ok_or_else(|| AppError::not_found("Space"))
}
