use std::collections::BTreeMap;

use crate::models::Category;

use super::catalog::{CategorizedImages, RawImage};

/// Keyword tables driving relevance filtering.
///
/// Injectable so callers can tighten or swap vocabularies without touching
/// the filter itself; `Default` carries the curated production tables.
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    /// Per-category words that mark an image as on-topic (matched against
    /// description and URL)
    pub relevance: BTreeMap<Category, Vec<String>>,
    /// Words that mark an image as off-topic regardless of category
    /// (matched against description only)
    pub irrelevance: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let mut relevance = BTreeMap::new();
        relevance.insert(
            Category::Toilet,
            to_owned(&[
                "toilet", "commode", "wc", "bathroom fixture", "lavatory", "water closet",
                "flush", "bidet",
            ]),
        );
        relevance.insert(
            Category::StandingShower,
            to_owned(&[
                "shower", "shower door", "shower head", "shower stall", "shower glass",
                "shower tile", "walk in shower", "shower enclosure", "rainfall shower",
            ]),
        );
        relevance.insert(
            Category::Bathtub,
            to_owned(&[
                "bathtub", "bath", "tub", "soaking", "freestanding", "clawfoot", "jacuzzi",
                "whirlpool", "spa bath",
            ]),
        );
        relevance.insert(
            Category::Mirror,
            to_owned(&[
                "mirror", "bathroom mirror", "vanity mirror", "wall mirror", "framed mirror",
                "medicine cabinet",
            ]),
        );
        relevance.insert(
            Category::Vanity,
            to_owned(&[
                "vanity", "sink", "cabinet", "countertop", "bathroom cabinet", "washbasin",
                "basin", "bathroom furniture",
            ]),
        );
        relevance.insert(
            Category::FloorTiles,
            to_owned(&[
                "tile", "floor", "ceramic", "porcelain", "marble", "pattern", "mosaic",
                "travertine", "slate", "limestone", "flooring",
            ]),
        );
        relevance.insert(
            Category::Color,
            to_owned(&[
                "color", "paint", "palette", "scheme", "tone", "hue", "bathroom color",
                "wall color", "accent", "decor",
            ]),
        );

        let irrelevance = to_owned(&[
            "person", "people", "woman", "man", "child", "sofa", "couch", "living room",
            "kitchen", "bedroom", "office", "outdoor", "garden", "food", "car", "vehicle",
            "dog", "cat", "pet", "animal", "clothing", "fashion", "restaurant", "cafe",
            "store", "shop", "concert", "party", "beach", "mountain", "forest",
        ]);

        Self {
            relevance,
            irrelevance,
        }
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Drops images whose description and URL match none of their category's
/// relevance keywords, or whose description trips an irrelevance keyword.
pub fn filter_irrelevant(catalog: CategorizedImages, config: &KeywordConfig) -> CategorizedImages {
    let mut filtered = CategorizedImages::new();

    for (category, images) in catalog {
        let before = images.len();
        let kept: Vec<RawImage> = images
            .into_iter()
            .filter(|image| is_relevant(category, image, config))
            .collect();

        tracing::info!(
            category = %category,
            before,
            after = kept.len(),
            removed = before - kept.len(),
            "Relevance filter applied"
        );

        filtered.insert(category, kept);
    }

    filtered
}

fn is_relevant(category: Category, image: &RawImage, config: &KeywordConfig) -> bool {
    let description = image.description.to_lowercase();
    let url = image.url.to_lowercase();

    let Some(keywords) = config.relevance.get(&category) else {
        return false;
    };

    let mut relevant = keywords
        .iter()
        .any(|keyword| description.contains(keyword.as_str()) || url.contains(keyword.as_str()));

    if config
        .irrelevance
        .iter()
        .any(|keyword| description.contains(keyword.as_str()))
    {
        relevant = false;
    }

    // Tile boards are especially prone to staged-room shots.
    if category == Category::FloorTiles
        && ["sofa", "person", "people"]
            .iter()
            .any(|keyword| description.contains(keyword))
    {
        relevant = false;
    }

    relevant
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, url: &str, description: &str) -> RawImage {
        RawImage {
            id: id.to_string(),
            url: url.to_string(),
            description: description.to_string(),
            source: "Test".to_string(),
        }
    }

    fn catalog_of(category: Category, images: Vec<RawImage>) -> CategorizedImages {
        let mut catalog = CategorizedImages::new();
        catalog.insert(category, images);
        catalog
    }

    #[test]
    fn test_keeps_on_topic_images() {
        let catalog = catalog_of(
            Category::Toilet,
            vec![image("t1", "https://x/1.jpg", "Modern wall-hung toilet")],
        );
        let filtered = filter_irrelevant(catalog, &KeywordConfig::default());
        assert_eq!(filtered[&Category::Toilet].len(), 1);
    }

    #[test]
    fn test_drops_images_with_no_relevance_match() {
        let catalog = catalog_of(
            Category::Toilet,
            vec![image("t1", "https://x/1.jpg", "Abstract sculpture")],
        );
        let filtered = filter_irrelevant(catalog, &KeywordConfig::default());
        assert!(filtered[&Category::Toilet].is_empty());
    }

    #[test]
    fn test_relevance_match_in_url_is_enough() {
        let catalog = catalog_of(
            Category::Mirror,
            vec![image("m1", "https://x/bathroom-mirror-34.jpg", "")],
        );
        let filtered = filter_irrelevant(catalog, &KeywordConfig::default());
        assert_eq!(filtered[&Category::Mirror].len(), 1);
    }

    #[test]
    fn test_irrelevance_keyword_overrides_relevance() {
        let catalog = catalog_of(
            Category::Bathtub,
            vec![image("b1", "https://x/1.jpg", "Woman relaxing in bathtub")],
        );
        let filtered = filter_irrelevant(catalog, &KeywordConfig::default());
        assert!(filtered[&Category::Bathtub].is_empty());
    }

    #[test]
    fn test_floor_tiles_reject_staged_rooms() {
        let catalog = catalog_of(
            Category::FloorTiles,
            vec![image("f1", "https://x/1.jpg", "marble floor beside a sofa")],
        );
        let filtered = filter_irrelevant(catalog, &KeywordConfig::default());
        assert!(filtered[&Category::FloorTiles].is_empty());
    }

    #[test]
    fn test_custom_config_is_honored() {
        let mut config = KeywordConfig::default();
        config
            .relevance
            .insert(Category::Color, vec!["terracotta".to_string()]);

        let catalog = catalog_of(
            Category::Color,
            vec![
                image("c1", "https://x/1.jpg", "terracotta accent wall"),
                image("c2", "https://x/2.jpg", "pastel palette"),
            ],
        );
        let filtered = filter_irrelevant(catalog, &config);
        assert_eq!(filtered[&Category::Color].len(), 1);
        assert_eq!(filtered[&Category::Color][0].id, "c1");
    }
}
