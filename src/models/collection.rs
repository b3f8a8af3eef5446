use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::recommended::{RecommendedCollection, RecommendedItem};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub cover_image_aspect_ratio: Option<String>,
    pub tags: String,
    pub source_id: Option<String>,
    pub last_synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Collection {
    pub fn new(owner_id: String, name: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name,
            description: None,
            category: None,
            cover_image: None,
            cover_image_aspect_ratio: None,
            tags: String::new(),
            source_id: None,
            last_synced_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Copy a recommended collection's metadata into a new collection owned
    /// by `owner_id`. The clone starts out linked but never synced.
    pub fn clone_of(source: &RecommendedCollection, owner_id: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name: source.name.clone(),
            description: source.description.clone(),
            category: source.category.clone(),
            cover_image: source.cover_image.clone(),
            cover_image_aspect_ratio: source.cover_image_aspect_ratio.clone(),
            tags: source.tags.clone(),
            source_id: Some(source.id.clone()),
            last_synced_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: String,
    pub collection_id: String,
    pub name: String,
    pub number: Option<i64>,
    pub image: Option<String>,
    pub position: i64,
}

impl CollectionItem {
    pub fn new(
        collection_id: String,
        name: String,
        number: Option<i64>,
        image: Option<String>,
        position: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection_id,
            name,
            number,
            image,
            position,
        }
    }

    /// Copy of a template item, re-homed under `collection_id` with a fresh id.
    pub fn copy_of(item: &RecommendedItem, collection_id: String) -> Self {
        Self::new(
            collection_id,
            item.name.clone(),
            item.number,
            item.image.clone(),
            item.position,
        )
    }
}
