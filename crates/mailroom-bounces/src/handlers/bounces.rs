//! Bounce listing and deletion handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use mailroom_core::{problemdetails::Problem, Pagination};

use super::problems::{to_problem, Action};
use super::types::{AckResponse, AppState, BouncesResponse, ListBouncesQuery};
use crate::errors::BounceError;
use crate::query::{BounceQuery, SortField, SortOrder};
use crate::selection::{self, BounceSelection};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bounces", get(list_bounces).delete(delete_bounces))
        .route("/bounces/{id}", get(get_bounce).delete(delete_bounce))
        .route("/campaigns/{campaign_id}/bounces", get(list_campaign_bounces))
}

fn build_query(
    state: &AppState,
    params: ListBouncesQuery,
    id: Option<i64>,
    campaign_id: Option<i32>,
) -> BounceQuery {
    BounceQuery {
        id,
        campaign_id,
        source: params.source.filter(|s| !s.is_empty()),
        sort: SortField::parse(params.order_by.as_deref()),
        order: SortOrder::parse(params.order.as_deref()),
        pagination: Pagination::from_params(
            params.page.as_deref(),
            params.per_page.as_deref(),
            state.bounce_service.pagination(),
        ),
    }
}

async fn respond(state: &AppState, query: BounceQuery) -> Result<impl IntoResponse, Problem> {
    let listing = state
        .bounce_service
        .list(&query)
        .await
        .map_err(|e| to_problem(e, &state.i18n, Action::Fetching))?;

    Ok(Json(BouncesResponse { data: listing }))
}

/// List bounces
#[utoipa::path(
    tag = "Bounces",
    get,
    path = "/bounces",
    params(ListBouncesQuery),
    responses(
        (status = 200, description = "Page of bounces", body = BouncesResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_bounces(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListBouncesQuery>,
) -> Result<impl IntoResponse, Problem> {
    let query = build_query(&state, params, None, None);
    respond(&state, query).await
}

/// Get a single bounce
///
/// An id that is not a positive integer selects nothing, and the request
/// is answered like `GET /bounces`.
#[utoipa::path(
    tag = "Bounces",
    get,
    path = "/bounces/{id}",
    params(
        ("id" = i64, Path, description = "Bounce ID"),
        ListBouncesQuery
    ),
    responses(
        (status = 200, description = "The bounce, or an empty result when it does not exist", body = BouncesResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_bounce(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ListBouncesQuery>,
) -> Result<impl IntoResponse, Problem> {
    let id = selection::parse_id(&id).ok();
    let query = build_query(&state, params, id, None);
    respond(&state, query).await
}

/// List bounces for a campaign
#[utoipa::path(
    tag = "Bounces",
    get,
    path = "/campaigns/{campaign_id}/bounces",
    params(
        ("campaign_id" = i32, Path, description = "Campaign ID"),
        ListBouncesQuery
    ),
    responses(
        (status = 200, description = "Page of the campaign's bounces", body = BouncesResponse),
        (status = 400, description = "Invalid campaign ID"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_campaign_bounces(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
    Query(params): Query<ListBouncesQuery>,
) -> Result<impl IntoResponse, Problem> {
    let campaign_id = selection::parse_id(&campaign_id)
        .and_then(|id| i32::try_from(id).map_err(|_| BounceError::InvalidId(campaign_id.clone())))
        .map_err(|e| to_problem(e, &state.i18n, Action::Fetching))?;

    let query = build_query(&state, params, None, Some(campaign_id));
    respond(&state, query).await
}

async fn delete(
    state: &AppState,
    target: Result<BounceSelection, BounceError>,
) -> Result<impl IntoResponse, Problem> {
    let target = target.map_err(|e| to_problem(e, &state.i18n, Action::Deleting))?;

    state
        .bounce_service
        .delete(target)
        .await
        .map_err(|e| to_problem(e, &state.i18n, Action::Deleting))?;

    Ok(Json(AckResponse::ok()))
}

/// Delete bounces by repeated `id` parameters, or all of them with `all=true`
#[utoipa::path(
    tag = "Bounces",
    delete,
    path = "/bounces",
    params(
        ("id" = Option<Vec<i64>>, Query, description = "Bounce IDs to delete (repeatable)"),
        ("all" = Option<bool>, Query, description = "Delete every bounce")
    ),
    responses(
        (status = 200, description = "Bounces deleted", body = AckResponse),
        (status = 400, description = "Missing or invalid IDs"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_bounces(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, Problem> {
    let ids: Vec<String> = params
        .iter()
        .filter(|(key, _)| key == "id")
        .map(|(_, value)| value.clone())
        .collect();
    let all = params
        .iter()
        .find(|(key, _)| key == "all")
        .map(|(_, value)| value.as_str());

    delete(&state, selection::resolve(None, &ids, all)).await
}

/// Delete a single bounce
#[utoipa::path(
    tag = "Bounces",
    delete,
    path = "/bounces/{id}",
    params(("id" = i64, Path, description = "Bounce ID")),
    responses(
        (status = 200, description = "Bounce deleted", body = AckResponse),
        (status = 400, description = "Invalid ID"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_bounce(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    delete(&state, selection::resolve(Some(&id), &[], None)).await
}
