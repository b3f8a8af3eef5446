use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::FromRow;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Collection, CollectionItem, RecommendedCollection, RecommendedItem, RecommendedVote};
use crate::AppState;

/// Recommended collection with vote count for the list query's LEFT JOIN
#[derive(FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendedWithVotes {
    // RecommendedCollection fields
    id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    cover_image: Option<String>,
    cover_image_aspect_ratio: Option<String>,
    tags: String,
    created_at: String,
    updated_at: String,
    // Extra field
    vote_count: i64,
}

#[derive(Serialize)]
struct RecommendedDetail {
    #[serde(flatten)]
    collection: RecommendedCollection,
    items: Vec<RecommendedItem>,
}

#[derive(Serialize)]
struct VoteCount {
    votes: i64,
}

#[derive(Serialize)]
struct CollectionDetail {
    #[serde(flatten)]
    collection: Collection,
    items: Vec<CollectionItem>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommended", get(list_recommended))
        .route("/recommended/{id}", get(show_recommended))
        .route("/recommended/{id}/clone", post(clone_recommended))
        .route("/recommended/{id}/vote", post(vote_recommended))
}

async fn find_recommended(
    db: &sqlx::SqlitePool,
    id: &str,
) -> Result<Option<RecommendedCollection>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM recommended_collections WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn fetch_recommended_items(
    db: &sqlx::SqlitePool,
    recommended_id: &str,
) -> Result<Vec<RecommendedItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM recommended_items WHERE recommended_id = ? ORDER BY position")
        .bind(recommended_id)
        .fetch_all(db)
        .await
}

async fn list_recommended(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let collections: Vec<RecommendedWithVotes> = sqlx::query_as(
        r#"
        SELECT r.*, COUNT(v.user_id) as vote_count
        FROM recommended_collections r
        LEFT JOIN recommended_votes v ON v.recommended_id = r.id
        GROUP BY r.id
        ORDER BY vote_count DESC, r.name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(collections))
}

async fn show_recommended(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(collection) = find_recommended(&state.db, &id).await? else {
        return Err(AppError::NotFound);
    };

    let items = fetch_recommended_items(&state.db, &collection.id).await?;

    Ok(Json(RecommendedDetail { collection, items }))
}

/// Copy the recommended collection into a new collection owned by the
/// requesting user. The copy keeps a source link but starts never-synced;
/// item rows get fresh ids.
async fn clone_recommended(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(source) = find_recommended(&state.db, &id).await? else {
        return Err(AppError::NotFound);
    };

    let source_items = fetch_recommended_items(&state.db, &source.id).await?;

    let collection = Collection::clone_of(&source, user.id);
    let items: Vec<CollectionItem> = source_items
        .iter()
        .map(|i| CollectionItem::copy_of(i, collection.id.clone()))
        .collect();

    let mut tx = state.db.begin().await?;

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
    .execute(&mut *tx)
    .await?;

    for item in &items {
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

    Ok((StatusCode::CREATED, Json(CollectionDetail { collection, items })))
}

async fn vote_recommended(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if find_recommended(&state.db, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let vote = RecommendedVote::new(id.clone(), user.id);
    sqlx::query(
        "INSERT OR IGNORE INTO recommended_votes (recommended_id, user_id, voted_at) VALUES (?, ?, ?)",
    )
    .bind(&vote.recommended_id)
    .bind(&vote.user_id)
    .bind(&vote.voted_at)
    .execute(&state.db)
    .await?;

    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recommended_votes WHERE recommended_id = ?")
            .bind(&id)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(VoteCount { votes: count.0 }))
}
