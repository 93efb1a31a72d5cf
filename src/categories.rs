//! Post categories, plus the default set seeded at boot.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::error::StorageError;
use crate::state::AppState;
use crate::storage::models::Category;
use crate::storage::Storage;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

/// Seed the default categories on an empty store.
pub async fn seed_default_categories(store: &dyn Storage) -> Result<(), StorageError> {
    if !store.categories().await?.is_empty() {
        return Ok(());
    }

    let defaults = [
        ("Anime & Manga", "anime", "Discussions sur les animes et mangas"),
        ("Développement Web", "tech", "Projets et discussions web"),
        ("Intelligence Artificielle", "tech", "IA et Machine Learning"),
        ("Cybersécurité", "tech", "Sécurité informatique"),
    ];
    for (name, kind, description) in defaults {
        store
            .create_category(name.into(), kind.into(), Some(description.into()))
            .await?;
    }
    tracing::info!("default categories seeded");
    Ok(())
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<Category>>, StatusCode> {
    let categories = state.store.categories().await.map_err(|e| e.status())?;
    Ok(Json(categories))
}

/// POST /api/categories — Admin only. `type` is "anime" or "tech".
pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), StatusCode> {
    let user = state
        .store
        .user(current.id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin {
        return Err(StatusCode::FORBIDDEN);
    }
    if body.kind != "anime" && body.kind != "tech" {
        return Err(StatusCode::BAD_REQUEST);
    }

    let category = state
        .store
        .create_category(body.name, body.kind, body.description)
        .await
        .map_err(|e| e.status())?;
    Ok((StatusCode::CREATED, Json(category)))
}
