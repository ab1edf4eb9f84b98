//! Proposal views, all scoped to a space.

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
use crate::forms::{self, FormBody};
use crate::models::{CreateProposalInput, Permission, Proposal, ProposalForm, Space};

pub const PROPOSALS_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalList {
    pub space: Space,
    pub proposals: Paginated<Proposal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDetail {
    pub space: Space,
    pub proposal: Proposal,
}

fn proposal_or_404(db: &Database, space: &Space, id: i64) -> Result<Proposal, AppError> {
    db.get_proposal(space.id, id)?
        .ok_or_else(|| AppError::not_found("Proposal"))
}

// ============================================================
// Create
// ============================================================

pub async fn add_proposal_form(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(space): Path<String>,
) -> Result<Response, AppError> {
    Gate::permission(Permission::AddProposal).check(&current)?;
    let space = space_or_404(&db, &space)?;

    let context = FormContext::new(ProposalForm::default()).in_space(Some(space));
    Ok(notices.render(context).into_response())
}

/// The space, author and vote count always come from the server, whatever
/// the client submitted. The body is only read once the user and space
/// have been checked.
pub async fn add_proposal(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path(space): Path<String>,
    body: FormBody<ProposalForm>,
) -> Result<Response, AppError> {
    let user = Gate::permission(Permission::AddProposal).check(&current)?;
    let space = space_or_404(&db, &space)?;
    let form = forms::take(body)?;

    if let Err(errors) = forms::check(&form) {
        let context = FormContext::new(form)
            .in_space(Some(space))
            .with_errors(errors);
        return Ok(notices.render_invalid(context));
    }

    let proposal = db.create_proposal(CreateProposalInput {
        space_id: space.id,
        author: user.username.clone(),
        form,
    })?;
    tracing::info!(
        "Proposal {} added to space {} by {}",
        proposal.id,
        space.url,
        proposal.author
    );

    Ok(redirect(format!("/spaces/{}", space.url)))
}

// ============================================================
// Read
// ============================================================

pub async fn list_proposals(
    State(db): State<Database>,
    notices: Notices,
    Path(space): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ProposalList>>, AppError> {
    let space = space_or_404(&db, &space)?;

    let paginator = Paginator::new(db.count_proposals(space.id)?, PROPOSALS_PER_PAGE);
    let window = paginator.window(query.page.as_deref())?;
    let items = db.get_proposals(space.id, Some(window.limit), window.offset)?;

    Ok(notices.render(ProposalList {
        space,
        proposals: Paginated::new(paginator, window, items),
    }))
}

pub async fn view_proposal(
    State(db): State<Database>,
    notices: Notices,
    Path((space, prop_id)): Path<(String, i64)>,
) -> Result<Json<Page<ProposalDetail>>, AppError> {
    let space = space_or_404(&db, &space)?;
    let proposal = proposal_or_404(&db, &space, prop_id)?;

    Ok(notices.render(ProposalDetail { space, proposal }))
}

// ============================================================
// Update
// ============================================================

/// Editors and the proposal's own author may edit it.
fn edit_gate(proposal: &Proposal) -> Gate<'_> {
    Gate::permission(Permission::EditProposal).or_owner(&proposal.author)
}

pub async fn edit_proposal_form(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, prop_id)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    let proposal = proposal_or_404(&db, &space, prop_id)?;
    edit_gate(&proposal).check(&current)?;

    let context = FormContext::new(ProposalForm::from(&proposal))
        .in_space(Some(space))
        .editing(proposal.id);
    Ok(notices.render(context).into_response())
}

pub async fn edit_proposal(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, prop_id)): Path<(String, i64)>,
    body: FormBody<ProposalForm>,
) -> Result<Response, AppError> {
    let space = space_or_404(&db, &space)?;
    let proposal = proposal_or_404(&db, &space, prop_id)?;
    let user = edit_gate(&proposal).check(&current)?;
    let form = forms::take(body)?;

    if let Err(errors) = forms::check(&form) {
        let context = FormContext::new(form)
            .in_space(Some(space))
            .editing(proposal.id)
            .with_errors(errors);
        return Ok(notices.render_invalid(context));
    }

    db.update_proposal(space.id, proposal.id, &form)?
        .ok_or_else(|| AppError::not_found("Proposal"))?;
    tracing::info!("Proposal {} edited by {}", proposal.id, user.username);

    Ok(redirect(format!(
        "/spaces/{}/proposal/{}",
        space.url, proposal.id
    )))
}

// ============================================================
// Delete
// ============================================================

pub async fn delete_proposal_confirm(
    State(db): State<Database>,
    current: CurrentUser,
    notices: Notices,
    Path((space, prop_id)): Path<(String, i64)>,
) -> Result<Json<Page<ProposalDetail>>, AppError> {
    Gate::permission(Permission::DeleteProposal).check(&current)?;
    let space = space_or_404(&db, &space)?;
    let proposal = proposal_or_404(&db, &space, prop_id)?;

    Ok(notices.render(ProposalDetail { space, proposal }))
}

pub async fn delete_proposal(
    State(db): State<Database>,
    current: CurrentUser,
    Path((space, prop_id)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    let user = Gate::permission(Permission::DeleteProposal).check(&current)?;
    let space = space_or_404(&db, &space)?;
    let proposal = proposal_or_404(&db, &space, prop_id)?;

    if !db.delete_proposal(proposal.id)? {
        return Err(AppError::not_found("Proposal"));
    }
    tracing::info!(
        "Proposal {} deleted from space {} by {}",
        proposal.id,
        space.url,
        user.username
    );

    Ok(redirect("/"))
}
