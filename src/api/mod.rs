mod handlers;
pub mod middleware;
pub mod pagination;
pub mod render;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::SiteSettings;
use crate::db::Database;
use crate::messages::FlashStore;

pub use handlers::{
    IndexPage, NewsList, PostDetail, ProposalDetail, ProposalList, SpacePage, NEWS_PER_PAGE,
    PROPOSALS_PER_PAGE, WELCOME_MESSAGE,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<SiteSettings>,
    pub flash: FlashStore,
}

impl AppState {
    pub fn new(db: Database, settings: SiteSettings) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
            flash: FlashStore::new(),
        }
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<SiteSettings> {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

impl FromRef<AppState> for FlashStore {
    fn from_ref(state: &AppState) -> Self {
        state.flash.clone()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Site
        .route("/", get(handlers::site::index))
        .route("/rss", get(handlers::site::rss_feed))
        // Site news
        .route("/news", get(handlers::news::list_news))
        .route(
            "/news/add",
            get(handlers::news::add_news_form).post(handlers::news::add_news),
        )
        .route("/news/{post_id}", get(handlers::news::view_post))
        .route(
            "/news/{post_id}/edit",
            get(handlers::news::edit_post_form).post(handlers::news::edit_post),
        )
        .route(
            "/news/{post_id}/delete",
            get(handlers::news::delete_post_confirm).post(handlers::news::delete_post),
        )
        // Spaces
        .route("/spaces/{space}", get(handlers::spaces::view_space))
        // Proposals
        .route(
            "/spaces/{space}/proposal",
            get(handlers::proposals::list_proposals),
        )
        .route(
            "/spaces/{space}/proposal/add",
            get(handlers::proposals::add_proposal_form).post(handlers::proposals::add_proposal),
        )
        .route(
            "/spaces/{space}/proposal/{prop_id}",
            get(handlers::proposals::view_proposal),
        )
        .route(
            "/spaces/{space}/proposal/{prop_id}/edit",
            get(handlers::proposals::edit_proposal_form).post(handlers::proposals::edit_proposal),
        )
        .route(
            "/spaces/{space}/proposal/{prop_id}/delete",
            get(handlers::proposals::delete_proposal_confirm)
                .post(handlers::proposals::delete_proposal),
        )
        // Space news
        .route(
            "/spaces/{space}/news/add",
            get(handlers::news::add_space_post_form).post(handlers::news::add_space_post),
        )
        .route(
            "/spaces/{space}/news/{post_id}",
            get(handlers::news::view_space_post),
        )
        .route(
            "/spaces/{space}/news/{post_id}/edit",
            get(handlers::news::edit_space_post_form).post(handlers::news::edit_space_post),
        )
        .route(
            "/spaces/{space}/news/{post_id}/delete",
            get(handlers::news::delete_space_post_confirm)
                .post(handlers::news::delete_space_post),
        )
        // Health
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(middleware::session))
                .layer(from_fn_with_state(state.clone(), middleware::authenticate)),
        )
        .with_state(state)
}
