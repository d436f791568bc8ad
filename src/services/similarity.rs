use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::{error::AppResult, models::Category};

/// Base score shared by any two images in the same category
pub const SAME_CATEGORY_BASE: f64 = 0.5;
/// Weight of the description word-overlap component
pub const DESCRIPTION_WEIGHT: f64 = 0.3;
/// Pairs scoring at or below this are not stored
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.1;

/// Splits a description into its set of lowercased alphanumeric tokens
pub fn description_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect()
}

/// Ratio of shared words to the larger of the two word sets
///
/// Zero when either description has no words at all, so empty descriptions
/// fall back to the plain category score.
pub fn word_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = a.intersection(b).count();
    common as f64 / a.len().max(b.len()) as f64
}

/// Directed similarity score for two same-category images
pub fn pair_score(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    SAME_CATEGORY_BASE + DESCRIPTION_WEIGHT * word_overlap(a, b)
}

#[derive(Debug, sqlx::FromRow)]
struct ImageText {
    id: String,
    description: String,
}

/// Refined bulk similarity pass over the ingested catalog.
///
/// Samples up to `images_per_category` images per category and scores each
/// against a window of up to `peers_per_image` same-category peers. Both caps
/// exist to keep the pass far away from a full pairwise comparison; scores at
/// or below [`SIGNIFICANCE_THRESHOLD`] are skipped. Returns the number of
/// directed edges stored.
pub async fn compute_refined_similarities(
    pool: &SqlitePool,
    images_per_category: u32,
    peers_per_image: u32,
) -> AppResult<u64> {
    let mut stored = 0u64;

    for category in Category::ALL {
        let rows: Vec<ImageText> = sqlx::query_as(
            r#"
            SELECT id, description FROM images
            WHERE category = ?
            ORDER BY RANDOM()
            LIMIT ?
            "#,
        )
        .bind(category)
        .bind(images_per_category as i64)
        .fetch_all(pool)
        .await?;

        let words: Vec<HashSet<String>> = rows
            .iter()
            .map(|row| description_words(&row.description))
            .collect();

        let mut tx = pool.begin().await?;

        for (i, row) in rows.iter().enumerate() {
            let peers = rows
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .take(peers_per_image as usize);

            for (j, peer) in peers {
                let score = pair_score(&words[i], &words[j]);
                if score > SIGNIFICANCE_THRESHOLD {
                    sqlx::query(
                        r#"
                        INSERT OR REPLACE INTO image_similarities
                            (image_id1, image_id2, similarity_score)
                        VALUES (?, ?, ?)
                        "#,
                    )
                    .bind(&row.id)
                    .bind(&peer.id)
                    .bind(score)
                    .execute(&mut *tx)
                    .await?;
                    stored += 1;
                }
            }
        }

        tx.commit().await?;

        tracing::debug!(
            category = %category,
            sampled = rows.len(),
            "Refined similarity pass completed for category"
        );
    }

    Ok(stored)
}
