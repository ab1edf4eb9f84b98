//! News views. The site-wide section (`/news/...`) and each space's section
//! (`/spaces/{space}/news/...`) are thin entry points over the same flows,
//! which in turn delegate to [`NewsService`].

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::space_or_404;
use crate::api::pagination::{PageQuery, Paginated, Paginator};
use crate::api::render::{redirect, FormContext, Notices, Page};
use crate::auth::{CurrentUser, Gate};
use crate::db::Database;
use crate::error::AppError;
use crate::forms::{self, FormBody, Submit};
use crate::models::{Permission, Post, PostForm, Space};
use crate::services::news::{NewsScope, NewsService};

pub const NEWS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsList {
    pub news: Paginated<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub news: Post,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Space>,
}

fn space_of(scope: NewsScope<'_>) -> Option<Space> {
    match scope {
        NewsScope::Site => None,
        NewsScope::Space(space) => Some(space.clone()),
    }
}

// ============================================================
// Shared flows
// ============================================================

fn add_form(current: &CurrentUser, notices: &Notices, scope: NewsScope<'_>) -> Result<Response, AppError> {
    Gate::permission(Permission::AddPost).check(current)?;
    let context = FormContext::new(PostForm::default()).in_space(space_of(scope));
    Ok(notices.render(context).into_response())
}

fn add(
    service: &NewsService<'_>,
    current: &CurrentUser,
    notices: &Notices,
    body: FormBody<PostForm>,
) -> Result<Response, AppError> {
    let user = Gate::permission(Permission::AddPost).check(current)?;
    let form = forms::take(body)?;

    match service.create(user, form.clone())? {
        Submit::Saved(_) => {
            notices.success("Post added successfully.");
            Ok(redirect(service.scope().home()))
        }
        Submit::Invalid(errors) => {
            let context = FormContext::new(form)
                .in_space(space_of(service.scope()))
                .with_errors(errors);
            Ok(notices.render_invalid(context))
        }
    }
}

fn view(service: &NewsService<'_>, notices: &Notices, id: i64) -> Result<Json<Page<PostDetail>>, AppError> {
    let news = service.find(id)?;
    Ok(notices.render(PostDetail {
        news,
        space: space_of(service.scope()),
    }))
}

fn edit_form(
    service: &NewsService<'_>,
    current: &CurrentUser,
    notices: &Notices,
    id: i64,
) -> Result<Response, AppError> {
    Gate::permission(Permission::EditPost).check(current)?;
    let post = service.find(id)?;

    let context = FormContext::new(PostForm::from(&post))
        .in_space(space_of(service.scope()))
        .editing(post.id);
    Ok(notices.render(context).into_response())
}

fn edit(
    service: &NewsService<'_>,
    current: &CurrentUser,
    notices: &Notices,
    id: i64,
    body: FormBody<PostForm>,
) -> Result<Response, AppError> {
    Gate::permission(Permission::EditPost).check(current)?;
    let form = forms::take(body)?;

    match service.update(id, form.clone())? {
        Submit::Saved(_) => {
            notices.success("Post edited successfully.");
            Ok(redirect(service.scope().home()))
        }
        Submit::Invalid(errors) => {
            let context = FormContext::new(form)
                .in_space(space_of(service.scope()))
                .editing(id)
                .with_errors(errors);
            Ok(notices.render_invalid(context))
        }
    }
}

fn delete_confirm(
    service: &NewsService<'_>,
    current: &CurrentUser,
    notices: &Notices,
    id: i64,
) -> Result<Response, AppError> {
    Gate::permission(Permission::DeletePost).check(current)?;
    Ok(view(service, notices, id)?.into_response())
}

fn delete(
    service: &NewsService<'_>,
    current: &CurrentUser,
    notices: &Notices,
    id: i64,
) -> Result<Response, AppError> {
    Gate::permission(Permission::DeletePost).check(current)?;
    service.delete(id)?;
    notices.success("Post deleted successfully.");
    Ok(redirect(service.scope().home()))
}

// ============================================================
// Site entry points
// ============================================================

/// Posts flagged for the index, newest first.
pub async fn list_news(
    State(db): State<Database>,
    notices: Notices,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<NewsList>>, AppError> {
    let paginator = Paginator::new(db.count_published_posts()?, NEWS_PER_PAGE);
    let window = paginator.window(query.page.as_deref())?;
    let items = db.get_published_posts(Some(window.limit), window.offset)?;

    Ok(notices.render(NewsList {
        news: Paginated::new(paginator, window, items),
    }))
}

pub async fn add_news_form(current: CurrentUser, notices: Notices) -> Result<Response, AppError> {
    add_form(&current, &notices, NewsScope::Site)
}

pub async fn add_news(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    body: FormBody<PostForm>,
) -> Result<Response, AppError> {
    add(&NewsService::new(&db, NewsScope::Site), &current, &notices, body)
}

pub async fn view_post(
    State(db): State<Database>,
    notices: Notices,
    Path(post_id): Path<i64>,
) -> Result<Json<Page<PostDetail>>, AppError> {
    view(&NewsService::new(&db, NewsScope::Site), &notices, post_id)
}

pub async fn edit_post_form(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    edit_form(&NewsService::new(&db, NewsScope::Site), &current, &notices, post_id)
}

pub async fn edit_post(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(post_id): Path<i64>,
    body: FormBody<PostForm>,
) -> Result<Response, AppError> {
    edit(&NewsService::new(&db, NewsScope::Site), &current, &notices, post_id, body)
}

pub async fn delete_post_confirm(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    delete_confirm(&NewsService::new(&db, NewsScope::Site), &current, &notices, post_id)
}

pub async fn delete_post(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    delete(&NewsService::new(&db, NewsScope::Site), &current, &notices, post_id)
}

// ============================================================
// Space entry points
// ============================================================

pub async fn add_space_post_form(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(space): Path<String>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    add_form(&current, &notices, NewsScope::Space(&space))
}

pub async fn add_space_post(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(space): Path<String>,
    body: FormBody<PostForm>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    add(&NewsService::new(&db, NewsScope::Space(&space)), &current, &notices, body)
}

pub async fn view_space_post(
    State(db): State<Database>,
    notices: Notices,
    Path((space, post_id)): Path<(String, i64)>,
) -> Result<Json<Page<PostDetail>>, AppError> {
    let space = space_or_404(&db, &space)?;
    view(&NewsService::new(&db, NewsScope::Space(&space)), &notices, post_id)
}

pub async fn edit_space_post_form(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, post_id)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    edit_form(&NewsService::new(&db, NewsScope::Space(&space)), &current, &notices, post_id)
}

pub async fn edit_space_post(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, post_id)): Path<(String, i64)>,
    body: FormBody<PostForm>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    edit(&NewsService::new(&db, NewsScope::Space(&space)), &current, &notices, post_id, body)
}

pub async fn delete_space_post_confirm(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, post_id)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    delete_confirm(&NewsService::new(&db, NewsScope::Space(&space)), &current, &notices, post_id)
}

pub async fn delete_space_post(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, post_id)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    delete(&NewsService::new(&db, NewsScope::Space(&space)), &current, &notices, post_id)
}
