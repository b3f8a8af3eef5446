use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post, put},
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::CollectionItem;
use crate::routes::collections::validate_cover_image;
use crate::AppState;

#[derive(Deserialize)]
pub struct ItemPayload {
    name: String,
    number: Option<i64>,
    image: Option<String>,
}

fn validate_item_payload(payload: &ItemPayload) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    if payload.name.trim().is_empty() {
        errors.insert("name".to_string(), "Name is required".to_string());
    }

    if payload.name.len() > 500 {
        errors.insert("name".to_string(), "Name must be under 500 characters".to_string());
    }

    validate_cover_image(payload.image.as_deref(), &mut errors);

    errors
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections/{id}/items", post(create_item))
        .route("/collections/{id}/items/{item_id}", put(update_item))
        .route("/collections/{id}/items/{item_id}", delete(delete_item))
}

async fn owns_collection(db: &SqlitePool, id: &str, owner_id: &str) -> Result<bool, sqlx::Error> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM collections WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_one(db)
            .await?;
    Ok(count.0 > 0)
}

// Item edits count as edits to the collection, so its updated_at moves too
async fn touch_collection(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE collections SET updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !owns_collection(&state.db, &id, &user.id).await? {
        return Err(AppError::NotFound);
    }

    let errors = validate_item_payload(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let position: (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM collection_items WHERE collection_id = ?",
    )
    .bind(&id)
    .fetch_one(&state.db)
    .await?;

    let item = CollectionItem::new(
        id.clone(),
        payload.name,
        payload.number,
        payload.image.filter(|s| !s.is_empty()),
        position.0,
    );

    sqlx::query(
        "INSERT INTO collection_items (id, collection_id, name, number, image, position) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.collection_id)
    .bind(&item.name)
    .bind(item.number)
    .bind(&item.image)
    .bind(item.position)
    .execute(&state.db)
    .await?;

    touch_collection(&state.db, &id).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !owns_collection(&state.db, &id, &user.id).await? {
        return Err(AppError::NotFound);
    }

    let item: Option<CollectionItem> =
        sqlx::query_as("SELECT * FROM collection_items WHERE id = ? AND collection_id = ?")
            .bind(&item_id)
            .bind(&id)
            .fetch_optional(&state.db)
            .await?;

    let Some(mut item) = item else {
        return Err(AppError::NotFound);
    };

    let errors = validate_item_payload(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    item.name = payload.name;
    item.number = payload.number;
    item.image = payload.image.filter(|s| !s.is_empty());

    sqlx::query("UPDATE collection_items SET name = ?, number = ?, image = ? WHERE id = ?")
        .bind(&item.name)
        .bind(item.number)
        .bind(&item.image)
        .bind(&item.id)
        .execute(&state.db)
        .await?;

    touch_collection(&state.db, &id).await?;

    Ok(Json(item))
}

async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    if !owns_collection(&state.db, &id, &user.id).await? {
        return Err(AppError::NotFound);
    }

    let result = sqlx::query("DELETE FROM collection_items WHERE id = ? AND collection_id = ?")
        .bind(&item_id)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    touch_collection(&state.db, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
