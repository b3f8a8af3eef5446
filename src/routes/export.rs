use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Collection, CollectionItem};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportItem {
    name: String,
    number: Option<i64>,
    image: Option<String>,
    position: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportCollection {
    id: String,
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
    items: Vec<ExportItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData {
    exported_at: String,
    collections: Vec<ExportCollection>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(export_data))
}

async fn export_data(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let collections: Vec<Collection> =
        sqlx::query_as("SELECT * FROM collections WHERE owner_id = ? ORDER BY created_at")
            .bind(&user.id)
            .fetch_all(&state.db)
            .await?;

    let mut export_collections = Vec::new();

    for collection in collections {
        let items: Vec<CollectionItem> = sqlx::query_as(
            "SELECT * FROM collection_items WHERE collection_id = ? ORDER BY position",
        )
        .bind(&collection.id)
        .fetch_all(&state.db)
        .await?;

        export_collections.push(ExportCollection {
            id: collection.id,
            name: collection.name,
            description: collection.description,
            category: collection.category,
            cover_image: collection.cover_image,
            cover_image_aspect_ratio: collection.cover_image_aspect_ratio,
            tags: collection.tags,
            source_id: collection.source_id,
            last_synced_at: collection.last_synced_at,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
            items: items
                .into_iter()
                .map(|i| ExportItem {
                    name: i.name,
                    number: i.number,
                    image: i.image,
                    position: i.position,
                })
                .collect(),
        });
    }

    let export = ExportData {
        exported_at: chrono::Utc::now().to_rfc3339(),
        collections: export_collections,
    };

    let filename = format!("longbox-export-{}.json", chrono::Local::now().format("%Y-%m-%d"));
    let content_disposition = format!("attachment; filename=\"{}\"", filename);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition).unwrap(),
    );

    Ok((headers, Json(export)))
}
