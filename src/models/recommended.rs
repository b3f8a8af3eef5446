use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedCollection {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub cover_image_aspect_ratio: Option<String>,
    pub tags: String,
    pub created_at: String,
    pub updated_at: String,
}

impl RecommendedCollection {
    pub fn new(name: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            category: None,
            cover_image: None,
            cover_image_aspect_ratio: None,
            tags: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub id: String,
    pub recommended_id: String,
    pub name: String,
    pub number: Option<i64>,
    pub image: Option<String>,
    pub position: i64,
}

impl RecommendedItem {
    pub fn new(
        recommended_id: String,
        name: String,
        number: Option<i64>,
        image: Option<String>,
        position: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recommended_id,
            name,
            number,
            image,
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedVote {
    pub recommended_id: String,
    pub user_id: String,
    pub voted_at: String,
}

impl RecommendedVote {
    pub fn new(recommended_id: String, user_id: String) -> Self {
        Self {
            recommended_id,
            user_id,
            voted_at: Utc::now().to_rfc3339(),
        }
    }
}
