use serde::Deserialize;
use sqlx::SqlitePool;
use std::fs;
use uuid::Uuid;

use crate::models::{RecommendedCollection, RecommendedItem};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedItem {
    name: String,
    number: Option<i64>,
    image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedTemplate {
    name: String,
    description: Option<String>,
    category: Option<String>,
    cover_image: Option<String>,
    cover_image_aspect_ratio: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    items: Vec<SeedItem>,
}

/// Upsert recommended collections from a JSON seed file, matching on name.
/// Existing templates get their metadata and item set replaced and their
/// updated_at advanced, which is what flags linked clones for updates.
pub async fn seed_recommended(
    pool: &SqlitePool,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let templates: Vec<SeedTemplate> = serde_json::from_str(&content)?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut created = 0;
    let mut updated = 0;
    let mut tx = pool.begin().await?;

    for template in templates {
        let tags = template.tags.join(", ");

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM recommended_collections WHERE name = ?")
                .bind(&template.name)
                .fetch_optional(&mut *tx)
                .await?;

        let id = match existing {
            Some((id,)) => {
                sqlx::query(
                    r#"
                    UPDATE recommended_collections
                    SET description = ?, category = ?, cover_image = ?,
                        cover_image_aspect_ratio = ?, tags = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&template.description)
                .bind(&template.category)
                .bind(&template.cover_image)
                .bind(&template.cover_image_aspect_ratio)
                .bind(&tags)
                .bind(&now)
                .bind(&id)
                .execute(&mut *tx)
                .await?;

                sqlx::query("DELETE FROM recommended_items WHERE recommended_id = ?")
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;

                updated += 1;
                id
            }
            None => {
                let mut collection = RecommendedCollection::new(template.name.clone());
                collection.description = template.description.clone();
                collection.category = template.category.clone();
                collection.cover_image = template.cover_image.clone();
                collection.cover_image_aspect_ratio = template.cover_image_aspect_ratio.clone();
                collection.tags = tags.clone();

                sqlx::query(
                    r#"
                    INSERT INTO recommended_collections
                        (id, name, description, category, cover_image, cover_image_aspect_ratio,
                         tags, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&collection.id)
                .bind(&collection.name)
                .bind(&collection.description)
                .bind(&collection.category)
                .bind(&collection.cover_image)
                .bind(&collection.cover_image_aspect_ratio)
                .bind(&collection.tags)
                .bind(&collection.created_at)
                .bind(&collection.updated_at)
                .execute(&mut *tx)
                .await?;

                created += 1;
                collection.id
            }
        };

        for (position, seed_item) in template.items.iter().enumerate() {
            let item = RecommendedItem::new(
                id.clone(),
                seed_item.name.clone(),
                seed_item.number,
                seed_item.image.clone(),
                position as i64,
            );
            sqlx::query(
                "INSERT INTO recommended_items (id, recommended_id, name, number, image, position) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&item.id)
            .bind(&item.recommended_id)
            .bind(&item.name)
            .bind(item.number)
            .bind(&item.image)
            .bind(item.position)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    println!("Seeded recommended collections: {} created, {} updated", created, updated);
    Ok(())
}

pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = Uuid::new_v4().to_string();
    let invite_code = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, name, email, invite_code, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .bind(&invite_code)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    println!("Created user:");
    println!("  ID: {}", id);
    println!("  Name: {}", name);
    println!("  Invite Code: {}", invite_code);

    Ok(())
}
