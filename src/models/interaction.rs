use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// Explicit feedback on an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Like,
    Dislike,
}

impl Rating {
    /// Signed value applied to popularity and category-preference scores
    pub fn value(self) -> i64 {
        match self {
            Rating::Like => 1,
            Rating::Dislike => -1,
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Like),
            -1 => Ok(Rating::Dislike),
            other => Err(other),
        }
    }
}

/// A rating event joined with the rated image's catalog fields
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PreferenceRecord {
    pub user_id: String,
    pub image_id: String,
    pub rating: i64,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub description: String,
}

/// A view event joined with the viewed image's catalog fields
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ViewRecord {
    pub session_id: String,
    pub user_id: String,
    pub image_id: String,
    pub view_time: f64,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub description: String,
}

/// Accumulated per-category affinity for one user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryScore {
    pub category: Category,
    pub preference_score: f64,
}

/// Aggregated view of a user's interaction history
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceInsights {
    pub total_interactions: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub favorite_category: Option<Category>,
    pub least_favorite_category: Option<Category>,
    pub most_viewed_category: Option<Category>,
}
