//! Divergence checks between a cloned collection and its recommended source.
//!
//! Both functions are pure comparisons over records the caller has already
//! fetched. `has_source_update` answers "has the source moved since this
//! clone last took it in", `is_customized` answers "has the owner edited the
//! clone away from the source's current state". The route layer combines the
//! two so the client can offer a sync action without clobbering user edits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{Collection, CollectionItem, RecommendedCollection, RecommendedItem};

/// The fields of a recommended collection that participate in the checks,
/// with timestamps already parsed. Built once at the route boundary.
#[derive(Debug, Clone)]
pub struct TemplateState {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub cover_image_aspect_ratio: Option<String>,
    pub tags: String,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<ItemState>,
}

/// The comparable fields of a user's clone.
#[derive(Debug, Clone)]
pub struct CloneState {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub cover_image_aspect_ratio: Option<String>,
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub items: Vec<ItemState>,
}

/// One item, reduced to the fields that matter for comparison. Row ids are
/// useless across the template/clone boundary; identity is `(number, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    pub number: Option<i64>,
    pub name: String,
    pub image: Option<String>,
}

impl TemplateState {
    pub fn from_records(
        source: &RecommendedCollection,
        items: &[RecommendedItem],
    ) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            name: source.name.clone(),
            description: source.description.clone(),
            category: source.category.clone(),
            cover_image: source.cover_image.clone(),
            cover_image_aspect_ratio: source.cover_image_aspect_ratio.clone(),
            tags: source.tags.clone(),
            updated_at: source.updated_at.parse()?,
            items: items
                .iter()
                .map(|i| ItemState {
                    number: i.number,
                    name: i.name.clone(),
                    image: i.image.clone(),
                })
                .collect(),
        })
    }
}

impl CloneState {
    pub fn from_records(
        collection: &Collection,
        items: &[CollectionItem],
    ) -> Result<Self, chrono::ParseError> {
        let last_synced_at = match &collection.last_synced_at {
            Some(ts) => Some(ts.parse()?),
            None => None,
        };
        Ok(Self {
            name: collection.name.clone(),
            description: collection.description.clone(),
            category: collection.category.clone(),
            cover_image: collection.cover_image.clone(),
            cover_image_aspect_ratio: collection.cover_image_aspect_ratio.clone(),
            tags: collection.tags.clone(),
            created_at: collection.created_at.parse()?,
            last_synced_at,
            items: items
                .iter()
                .map(|i| ItemState {
                    number: i.number,
                    name: i.name.clone(),
                    image: i.image.clone(),
                })
                .collect(),
        })
    }
}

/// Whether the source has changed since the clone last incorporated it.
///
/// A never-synced clone measures against its creation time, since cloning
/// snapshots the source. Strictly greater-than: an `updated_at` equal to the
/// baseline is not an update.
pub fn has_source_update(clone: &CloneState, template: &TemplateState) -> bool {
    let baseline = clone.last_synced_at.unwrap_or(clone.created_at);
    template.updated_at > baseline
}

/// Whether the clone has been edited away from the source's current state.
///
/// Checks run cheapest-first and short-circuit on the first mismatch:
/// metadata fields, then item-set size, then each template item against its
/// counterpart. Items the user added beyond the template only show up in the
/// size check; the per-item loop covers changed and removed ones.
pub fn is_customized(clone: &CloneState, template: &TemplateState) -> bool {
    if clone.name != template.name
        || clone.description != template.description
        || clone.category != template.category
        || clone.cover_image != template.cover_image
        || clone.cover_image_aspect_ratio != template.cover_image_aspect_ratio
        // tags compare as the stored serialization, not as a parsed set
        || clone.tags != template.tags
    {
        return true;
    }

    let theirs = identity_map(&template.items);
    let ours = identity_map(&clone.items);

    if theirs.len() != ours.len() {
        return true;
    }

    for (key, template_item) in &theirs {
        let Some(item) = ours.get(key) else {
            return true;
        };
        // duplicate keys collapse when the map is built, so the name is
        // rechecked directly instead of trusting key equality alone
        if item.name != template_item.name {
            return true;
        }
        if item.image != template_item.image {
            return true;
        }
    }

    false
}

fn identity_map(items: &[ItemState]) -> HashMap<(Option<i64>, &str), &ItemState> {
    items
        .iter()
        .map(|item| ((item.number, item.name.as_str()), item))
        .collect()
}
