use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The seven catalog categories an image can belong to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Category {
    Toilet,
    StandingShower,
    Bathtub,
    Mirror,
    Vanity,
    FloorTiles,
    Color,
}

/// Error returned when a category name does not match the enumeration
#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl Category {
    /// All categories, in catalog order
    pub const ALL: [Category; 7] = [
        Category::Toilet,
        Category::StandingShower,
        Category::Bathtub,
        Category::Mirror,
        Category::Vanity,
        Category::FloorTiles,
        Category::Color,
    ];

    /// The snake_case name used in the database and over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Toilet => "toilet",
            Category::StandingShower => "standing_shower",
            Category::Bathtub => "bathtub",
            Category::Mirror => "mirror",
            Category::Vanity => "vanity",
            Category::FloorTiles => "floor_tiles",
            Category::Color => "color",
        }
    }

    /// Human-readable label ("floor tiles" rather than "floor_tiles")
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A catalog image as persisted and returned to clients
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Image {
    /// Unique identifier (prefixed with its source category during ingestion)
    pub id: String,
    /// Source URL of the image
    pub url: String,
    /// Free-text description, possibly empty
    pub description: String,
    /// Where the image was collected from
    pub source: String,
    pub category: Category,
    /// Signed feedback score; every rating and qualifying view moves it
    pub popularity: f64,
    pub date_added: DateTime<Utc>,
}
