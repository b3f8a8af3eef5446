use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use url::Url;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Collection, CollectionItem, RecommendedCollection, RecommendedItem};
use crate::sync::{self, CloneState, TemplateState};
use crate::AppState;

/// Collection with item count for the list query's LEFT JOIN
#[derive(FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionWithCount {
    // Collection fields
    id: String,
    owner_id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    cover_image: Option<String>,
    cover_image_aspect_ratio: Option<String>,
    tags: String,
    source_id: Option<String>,
    last_synced_at: Option<String>,
    created_at: String,
    updated_at: String,
    // Extra field
    item_count: i64,
}

#[derive(Serialize)]
struct CollectionDetail {
    #[serde(flatten)]
    collection: Collection,
    items: Vec<CollectionItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncFlags {
    has_update: bool,
    is_customized: bool,
}

/// Snapshot of the source's current display metadata for the "here's what's
/// new" UI.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceSummary {
    name: String,
    description: Option<String>,
    category: Option<String>,
    cover_image: Option<String>,
    cover_image_aspect_ratio: Option<String>,
    tags: String,
    updated_at: String,
}

impl SourceSummary {
    fn of(source: &RecommendedCollection) -> Self {
        Self {
            name: source.name.clone(),
            description: source.description.clone(),
            category: source.category.clone(),
            cover_image: source.cover_image.clone(),
            cover_image_aspect_ratio: source.cover_image_aspect_ratio.clone(),
            tags: source.tags.clone(),
            updated_at: source.updated_at.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckUpdatesResponse {
    has_update: bool,
    is_customized: bool,
    recommended_collection: SourceSummary,
    last_synced_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPayload {
    name: String,
    description: Option<String>,
    category: Option<String>,
    cover_image: Option<String>,
    cover_image_aspect_ratio: Option<String>,
    tags: Option<String>,
}

pub(crate) fn validate_cover_image(cover_image: Option<&str>, errors: &mut HashMap<String, String>) {
    if let Some(cover) = cover_image {
        if !cover.is_empty() {
            let valid = Url::parse(cover)
                .map(|u| u.scheme() == "http" || u.scheme() == "https")
                .unwrap_or(false);
            if !valid {
                errors.insert(
                    "coverImage".to_string(),
                    "Cover image must be a valid http(s) URL".to_string(),
                );
            }
        }
    }
}

fn validate_collection_payload(payload: &CollectionPayload) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    if payload.name.trim().is_empty() {
        errors.insert("name".to_string(), "Name is required".to_string());
    }

    if payload.name.len() > 200 {
        errors.insert("name".to_string(), "Name must be under 200 characters".to_string());
    }

    validate_cover_image(payload.cover_image.as_deref(), &mut errors);

    errors
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_collections))
        .route("/collections", post(create_collection))
        .route("/collections/{id}", get(show_collection))
        .route("/collections/{id}", put(update_collection))
        .route("/collections/{id}", delete(delete_collection))
        .route("/collections/{id}/check-updates", get(check_updates))
        .route("/collections/{id}/sync", post(sync_collection))
}

async fn find_owned(
    db: &SqlitePool,
    id: &str,
    owner_id: &str,
) -> Result<Option<Collection>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM collections WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await
}

async fn fetch_items(db: &SqlitePool, collection_id: &str) -> Result<Vec<CollectionItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM collection_items WHERE collection_id = ? ORDER BY position")
        .bind(collection_id)
        .fetch_all(db)
        .await
}

async fn list_collections(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let collections: Vec<CollectionWithCount> = sqlx::query_as(
        r#"
        SELECT c.*, COUNT(i.id) as item_count
        FROM collections c
        LEFT JOIN collection_items i ON i.collection_id = c.id
        WHERE c.owner_id = ?
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(collections))
}

async fn create_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CollectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_collection_payload(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let mut collection = Collection::new(user.id, payload.name);
    collection.description = payload.description.filter(|s| !s.is_empty());
    collection.category = payload.category.filter(|s| !s.is_empty());
    collection.cover_image = payload.cover_image.filter(|s| !s.is_empty());
    collection.cover_image_aspect_ratio = payload.cover_image_aspect_ratio.filter(|s| !s.is_empty());
    collection.tags = payload.tags.unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO collections
            (id, owner_id, name, description, category, cover_image, cover_image_aspect_ratio,
             tags, source_id, last_synced_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&collection.id)
    .bind(&collection.owner_id)
    .bind(&collection.name)
    .bind(&collection.description)
    .bind(&collection.category)
    .bind(&collection.cover_image)
    .bind(&collection.cover_image_aspect_ratio)
    .bind(&collection.tags)
    .bind(&collection.source_id)
    .bind(&collection.last_synced_at)
    .bind(&collection.created_at)
    .bind(&collection.updated_at)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(collection)))
}

async fn show_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(collection) = find_owned(&state.db, &id, &user.id).await? else {
        return Err(AppError::NotFound);
    };

    let items = fetch_items(&state.db, &collection.id).await?;

    Ok(Json(CollectionDetail { collection, items }))
}

async fn update_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CollectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let Some(mut collection) = find_owned(&state.db, &id, &user.id).await? else {
        return Err(AppError::NotFound);
    };

    let errors = validate_collection_payload(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    collection.name = payload.name;
    collection.description = payload.description.filter(|s| !s.is_empty());
    collection.category = payload.category.filter(|s| !s.is_empty());
    collection.cover_image = payload.cover_image.filter(|s| !s.is_empty());
    collection.cover_image_aspect_ratio = payload.cover_image_aspect_ratio.filter(|s| !s.is_empty());
    collection.tags = payload.tags.unwrap_or_default();
    collection.updated_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE collections
        SET name = ?, description = ?, category = ?, cover_image = ?,
            cover_image_aspect_ratio = ?, tags = ?, updated_at = ?
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(&collection.name)
    .bind(&collection.description)
    .bind(&collection.category)
    .bind(&collection.cover_image)
    .bind(&collection.cover_image_aspect_ratio)
    .bind(&collection.tags)
    .bind(&collection.updated_at)
    .bind(&collection.id)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    Ok(Json(collection))
}

async fn delete_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM collections WHERE id = ? AND owner_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Does the linked source have changes this collection hasn't taken in, and
/// has the owner customized the collection since cloning it? The comparison
/// itself lives in [`crate::sync`]; this handler only fetches the records,
/// builds the typed states, and serializes the answer.
async fn check_updates(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(collection) = find_owned(&state.db, &id, &user.id).await? else {
        return Err(AppError::NotFound);
    };

    // Independent collection: nothing to compare against
    let Some(source_id) = collection.source_id.as_deref() else {
        return Ok(Json(SyncFlags { has_update: false, is_customized: false }).into_response());
    };

    let source: Option<RecommendedCollection> =
        sqlx::query_as("SELECT * FROM recommended_collections WHERE id = ?")
            .bind(source_id)
            .fetch_optional(&state.db)
            .await?;

    // The source was deleted out from under the clone; same answer
    let Some(source) = source else {
        return Ok(Json(SyncFlags { has_update: false, is_customized: false }).into_response());
    };

    let items = fetch_items(&state.db, &collection.id).await?;
    let source_items: Vec<RecommendedItem> =
        sqlx::query_as("SELECT * FROM recommended_items WHERE recommended_id = ? ORDER BY position")
            .bind(&source.id)
            .fetch_all(&state.db)
            .await?;

    let clone_state = CloneState::from_records(&collection, &items)?;
    let template_state = TemplateState::from_records(&source, &source_items)?;

    let body = CheckUpdatesResponse {
        has_update: sync::has_source_update(&clone_state, &template_state),
        is_customized: sync::is_customized(&clone_state, &template_state),
        recommended_collection: SourceSummary::of(&source),
        last_synced_at: collection.last_synced_at.clone(),
    };

    Ok(Json(body).into_response())
}

/// Re-apply the source's current state onto the collection: metadata and
/// items are overwritten wholesale and `last_synced_at` advances to now.
/// The client is expected to have consulted check-updates first.
async fn sync_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(collection) = find_owned(&state.db, &id, &user.id).await? else {
        return Err(AppError::NotFound);
    };

    let Some(source_id) = collection.source_id.as_deref() else {
        return Err(AppError::NotFound);
    };

    let source: Option<RecommendedCollection> =
        sqlx::query_as("SELECT * FROM recommended_collections WHERE id = ?")
            .bind(source_id)
            .fetch_optional(&state.db)
            .await?;

    let Some(source) = source else {
        return Err(AppError::NotFound);
    };

    let source_items: Vec<RecommendedItem> =
        sqlx::query_as("SELECT * FROM recommended_items WHERE recommended_id = ? ORDER BY position")
            .bind(&source.id)
            .fetch_all(&state.db)
            .await?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        UPDATE collections
        SET name = ?, description = ?, category = ?, cover_image = ?,
            cover_image_aspect_ratio = ?, tags = ?, last_synced_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&source.name)
    .bind(&source.description)
    .bind(&source.category)
    .bind(&source.cover_image)
    .bind(&source.cover_image_aspect_ratio)
    .bind(&source.tags)
    .bind(&now)
    .bind(&now)
    .bind(&collection.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM collection_items WHERE collection_id = ?")
        .bind(&collection.id)
        .execute(&mut *tx)
        .await?;

    for source_item in &source_items {
        let item = CollectionItem::copy_of(source_item, collection.id.clone());
        sqlx::query(
            "INSERT INTO collection_items (id, collection_id, name, number, image, position) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.collection_id)
        .bind(&item.name)
        .bind(item.number)
        .bind(&item.image)
        .bind(item.position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let Some(collection) = find_owned(&state.db, &id, &user.id).await? else {
        return Err(AppError::NotFound);
    };
    let items = fetch_items(&state.db, &collection.id).await?;

    Ok(Json(CollectionDetail { collection, items }))
}
