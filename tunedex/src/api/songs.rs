//! Catalog query endpoints
//!
//! All endpoints answer with a JSON array of records; no match is `[]`, not 404.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::models::Record;
use crate::AppState;

/// GET /songs
pub async fn list_songs(State(state): State<AppState>) -> ApiResult<Json<Vec<Record>>> {
    let records = state.catalog.find_all().await?;
    Ok(Json(records))
}

/// GET /songs/:id
pub async fn songs_by_identity(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> ApiResult<Json<Vec<Record>>> {
    let record = state.catalog.find_by_identity(&identity).await?;
    Ok(Json(record.into_iter().collect()))
}

/// GET /songs/:attribute/:value
///
/// 400 when the attribute name does not resolve to a catalog field.
pub async fn songs_by_attribute(
    State(state): State<AppState>,
    Path((attribute, value)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Record>>> {
    let field = state.resolver.resolve(&attribute)?;
    let records = state.catalog.find_by_field(field, &value).await?;
    Ok(Json(records))
}

/// Build catalog query routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/songs", get(list_songs))
        .route("/songs/:id", get(songs_by_identity))
        .route("/songs/:attribute/:value", get(songs_by_attribute))
}
