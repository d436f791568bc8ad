use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;

use crate::models::Category;

/// A seed image before it reaches the store
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub id: String,
    pub url: String,
    pub description: String,
    pub source: String,
}

/// Seed images grouped by their assigned category
pub type CategorizedImages = BTreeMap<Category, Vec<RawImage>>;

/// Pinterest text exports and the category each file feeds
pub const TEXT_EXPORT_CATEGORIES: [(&str, Category); 5] = [
    ("bathroom_mirror.txt", Category::Mirror),
    ("bathroom_vanity.txt", Category::Vanity),
    ("floortiles.txt", Category::FloorTiles),
    ("wall tiles.txt", Category::FloorTiles),
    ("bathroom_color.txt", Category::Color),
];

/// One row of a scraped listing CSV
#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "Image_ID")]
    image_id: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Source")]
    source: Option<String>,
}

impl ListingRow {
    fn into_raw(self, prefix: &str) -> RawImage {
        RawImage {
            id: format!("{prefix}_{}", self.image_id),
            url: self.url,
            description: self.description.unwrap_or_default(),
            source: self.source.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Parses the bathroom/shower listing CSV and routes rows to fixture
/// categories by description keyword. Rows matching no keyword are dropped.
pub fn parse_shower_listing<R: Read>(reader: R) -> anyhow::Result<CategorizedImages> {
    let mut catalog = CategorizedImages::new();
    let mut csv_reader = csv::Reader::from_reader(reader);

    for result in csv_reader.deserialize() {
        let row: ListingRow = result?;
        let lowered = row.description.as_deref().unwrap_or_default().to_lowercase();

        let assignment = if lowered.contains("shower") {
            Some((Category::StandingShower, "shower"))
        } else if lowered.contains("bath") || lowered.contains("tub") {
            Some((Category::Bathtub, "bath"))
        } else if lowered.contains("mirror") {
            Some((Category::Mirror, "mirror"))
        } else if lowered.contains("vanity") {
            Some((Category::Vanity, "vanity"))
        } else if lowered.contains("toilet") {
            Some((Category::Toilet, "toilet"))
        } else {
            None
        };

        if let Some((category, prefix)) = assignment {
            catalog.entry(category).or_default().push(row.into_raw(prefix));
        }
    }

    Ok(catalog)
}

/// Parses the floor-tile listing CSV; only tile/floor rows qualify
pub fn parse_floor_listing<R: Read>(reader: R) -> anyhow::Result<CategorizedImages> {
    let mut catalog = CategorizedImages::new();
    let mut csv_reader = csv::Reader::from_reader(reader);

    for result in csv_reader.deserialize() {
        let row: ListingRow = result?;
        let lowered = row.description.as_deref().unwrap_or_default().to_lowercase();

        if lowered.contains("tile") || lowered.contains("floor") {
            catalog
                .entry(Category::FloorTiles)
                .or_default()
                .push(row.into_raw("floor"));
        }
    }

    Ok(catalog)
}

/// Pulls every URL-shaped token out of a Pinterest text export
pub fn extract_urls(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(str::split_whitespace)
        .filter(|token| is_valid_url(token))
        .map(str::to_string)
        .collect()
}

fn is_valid_url(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => parsed.has_host(),
        Err(_) => false,
    }
}

/// Turns a text export's URLs into seed images for `category`.
///
/// `starting_index` continues the category's id sequence so multiple exports
/// feeding one category do not collide.
pub fn parse_text_export(category: Category, text: &str, starting_index: usize) -> Vec<RawImage> {
    extract_urls(text)
        .into_iter()
        .enumerate()
        .map(|(i, url)| RawImage {
            id: format!("{}_{}", category.as_str(), starting_index + i),
            url,
            description: format!("{} image", category.label()),
            source: "Pinterest".to_string(),
        })
        .collect()
}

/// Folds `from` into `into`, preserving insertion order per category
pub fn merge(into: &mut CategorizedImages, from: CategorizedImages) {
    for (category, images) in from {
        into.entry(category).or_default().extend(images);
    }
}
