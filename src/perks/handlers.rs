use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{validation_messages, ApiError},
    extract::AppJson,
    state::AppState,
};

use super::dto::{CreatePerkRequest, DeleteResponse, PerkResponse, TitleQuery, UpdatePerkRequest};
use super::repo;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/perks", get(list_perks))
        .route("/perks/search", get(search_perks))
        .route("/perks/:id", get(get_perk))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/perks", post(create_perk))
        .route(
            "/perks/:id",
            put(update_perk).patch(update_perk).delete(delete_perk),
        )
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("invalid id format".into()))
}

#[instrument(skip(state))]
pub async fn list_perks(State(state): State<AppState>) -> Result<Json<Vec<PerkResponse>>, ApiError> {
    let perks = repo::list(&state.db).await?;
    Ok(Json(perks.into_iter().map(PerkResponse::from).collect()))
}

/// Exact-match title filter; the store is not queried unless a non-empty
/// title is supplied.
#[instrument(skip(state))]
pub async fn search_perks(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<PerkResponse>>, ApiError> {
    let title = match query.title.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => {
            warn!("search without title");
            return Err(ApiError::BadRequest("missing title query parameter".into()));
        }
    };
    let perks = repo::find_by_title(&state.db, title).await?;
    Ok(Json(perks.into_iter().map(PerkResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_perk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PerkResponse>, ApiError> {
    let id = parse_id(&id)?;
    let perk = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("perk not found".into()))?;
    Ok(Json(perk.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_perk(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePerkRequest>,
) -> Result<(StatusCode, Json<PerkResponse>), ApiError> {
    if let Err(errors) = payload.validate() {
        warn!("create perk validation failed");
        return Err(ApiError::Validation(validation_messages(&errors)));
    }

    let perk = repo::insert(
        &state.db,
        &payload.title,
        &payload.description,
        payload.category,
        payload.discount_percent,
        &payload.merchant,
    )
    .await
    .map_err(|e| {
        if repo::is_unique_violation(&e) {
            warn!(title = %payload.title, merchant = %payload.merchant, "duplicate perk");
            ApiError::Conflict("duplicate perk for this merchant".into())
        } else {
            e.into()
        }
    })?;

    info!(perk_id = %perk.id, "perk created");
    Ok((StatusCode::CREATED, Json(perk.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_perk(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdatePerkRequest>,
) -> Result<Json<PerkResponse>, ApiError> {
    let id = parse_id(&id)?;

    if payload.is_empty() {
        return Err(ApiError::BadRequest("no update fields provided".into()));
    }
    if let Err(errors) = payload.validate() {
        warn!(perk_id = %id, "update perk validation failed");
        return Err(ApiError::Validation(validation_messages(&errors)));
    }

    let mut perk = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("perk not found".into()))?;

    payload.merge_into(&mut perk);
    let perk = repo::save(&state.db, &perk).await.map_err(|e| {
        if repo::is_unique_violation(&e) {
            ApiError::Conflict("duplicate perk for this merchant".into())
        } else {
            e.into()
        }
    })?;

    info!(perk_id = %perk.id, "perk updated");
    Ok(Json(perk.into()))
}

#[instrument(skip(state))]
pub async fn delete_perk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    match repo::delete(&state.db, id).await? {
        Some(deleted) => {
            info!(perk_id = %deleted, "perk deleted");
            Ok(Json(DeleteResponse { ok: true }))
        }
        None => Err(ApiError::NotFound("perk not found".into())),
    }
}
