use super::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const DEFAULT_CATEGORY: &str = "General";

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub author_id: Uuid,
    #[serde(default)]
    pub likes: BTreeSet<Uuid>,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        category: Option<String>,
        tags: Vec<String>,
        image: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            category: category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags,
            image: image.filter(|i| !i.is_empty()),
            author_id,
            likes: BTreeSet::new(),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Tags as submitted by clients: either "a, b, c" or ["a", "b", "c"]
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    Csv(String),
    List(Vec<String>),
}

impl TagsInput {
    /// Trimmed, non-empty tags in submission order
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
            TagsInput::List(list) => list,
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
