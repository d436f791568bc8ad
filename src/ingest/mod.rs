//! One-time catalog population: seed-file parsing, relevance filtering,
//! schema creation and the initial similarity passes.
//!
//! Everything here runs before the serving core touches the store; the core
//! only ever mutates what this module created.

pub mod catalog;
pub mod filter;
pub mod schema;

use std::path::Path;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::services::similarity;

use self::catalog::CategorizedImages;

/// Score seeded between nearby same-category images at initial population
const COARSE_NEIGHBOR_SCORE: f64 = 0.8;
/// Images per category considered by the coarse pass
const COARSE_IMAGES_PER_CATEGORY: usize = 100;
/// How many following neighbors each image is linked to in the coarse pass
const COARSE_NEIGHBOR_WINDOW: usize = 10;

/// What a bootstrap run touched
#[derive(Debug, Clone, Copy)]
pub struct BootstrapSummary {
    pub images: usize,
    pub coarse_edges: usize,
    pub refined_edges: u64,
}

/// Full ingestion pipeline: parse seed files, filter, create schema, insert
/// the catalog and compute initial similarities.
///
/// Idempotent: images and edges are written with insert-or-replace, so
/// re-running against an existing store refreshes it in place (and resets
/// popularity, as a fresh catalog drop should).
pub async fn bootstrap(
    pool: &SqlitePool,
    seed_dir: &Path,
    similarity_sample_per_category: u32,
    similarity_peers_per_image: u32,
) -> anyhow::Result<BootstrapSummary> {
    let raw = load_seed_dir(seed_dir)?;
    let filtered = filter::filter_irrelevant(raw, &filter::KeywordConfig::default());

    schema::create_schema(pool).await?;

    let images = insert_images(pool, &filtered).await?;
    let coarse_edges = seed_coarse_similarities(pool, &filtered).await?;
    let refined_edges = similarity::compute_refined_similarities(
        pool,
        similarity_sample_per_category,
        similarity_peers_per_image,
    )
    .await?;

    let summary = BootstrapSummary {
        images,
        coarse_edges,
        refined_edges,
    };

    tracing::info!(
        images = summary.images,
        coarse_edges = summary.coarse_edges,
        refined_edges = summary.refined_edges,
        "Catalog bootstrap complete"
    );

    Ok(summary)
}

/// Reads whichever seed files are present in `dir`.
///
/// Listing CSVs and text exports are all optional; a missing file is logged
/// and skipped so partial seed drops still ingest.
pub fn load_seed_dir(dir: &Path) -> anyhow::Result<CategorizedImages> {
    let mut images = CategorizedImages::new();

    let shower = dir.join("bathroom_shower_images.csv");
    if shower.exists() {
        let file = std::fs::File::open(&shower)?;
        catalog::merge(&mut images, catalog::parse_shower_listing(file)?);
    } else {
        tracing::warn!(path = %shower.display(), "Seed listing not found, skipped");
    }

    let floor = dir.join("floor_tile_images.csv");
    if floor.exists() {
        let file = std::fs::File::open(&floor)?;
        catalog::merge(&mut images, catalog::parse_floor_listing(file)?);
    } else {
        tracing::warn!(path = %floor.display(), "Seed listing not found, skipped");
    }

    for (name, category) in catalog::TEXT_EXPORT_CATEGORIES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        let starting_index = images.get(&category).map_or(0, Vec::len);
        let parsed = catalog::parse_text_export(category, &text, starting_index);
        images.entry(category).or_default().extend(parsed);
    }

    Ok(images)
}

async fn insert_images(pool: &SqlitePool, images: &CategorizedImages) -> anyhow::Result<usize> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for (category, group) in images {
        for image in group {
            // Upsert rather than INSERT OR REPLACE: a REPLACE would delete
            // rows that similarity edges and interaction logs reference.
            sqlx::query(
                r#"
                INSERT INTO images
                    (id, url, description, source, category, popularity, date_added)
                VALUES (?, ?, ?, ?, ?, 0, ?)
                ON CONFLICT(id) DO UPDATE SET
                    url = excluded.url,
                    description = excluded.description,
                    source = excluded.source,
                    category = excluded.category,
                    popularity = 0,
                    date_added = excluded.date_added
                "#,
            )
            .bind(&image.id)
            .bind(&image.url)
            .bind(&image.description)
            .bind(&image.source)
            .bind(*category)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            count += 1;
        }
    }

    tx.commit().await?;
    Ok(count)
}

/// Links each image to a short window of same-category neighbors in both
/// directions. Cheap first cut; the refined pass replaces scores where
/// descriptions say more.
async fn seed_coarse_similarities(
    pool: &SqlitePool,
    images: &CategorizedImages,
) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for group in images.values() {
        let limited = &group[..group.len().min(COARSE_IMAGES_PER_CATEGORY)];

        for i in 0..limited.len() {
            let window_end = (i + 1 + COARSE_NEIGHBOR_WINDOW).min(limited.len());
            for j in (i + 1)..window_end {
                for (from, to) in [
                    (&limited[i].id, &limited[j].id),
                    (&limited[j].id, &limited[i].id),
                ] {
                    sqlx::query(
                        r#"
                        INSERT OR REPLACE INTO image_similarities
                            (image_id1, image_id2, similarity_score)
                        VALUES (?, ?, ?)
                        "#,
                    )
                    .bind(from)
                    .bind(to)
                    .bind(COARSE_NEIGHBOR_SCORE)
                    .execute(&mut *tx)
                    .await?;
                    count += 1;
                }
            }
        }
    }

    tx.commit().await?;
    Ok(count)
}
