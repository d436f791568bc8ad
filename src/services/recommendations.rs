use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{Category, CategoryScore, Image},
};

/// Read path over the catalog: popularity, similarity and preference-weighted
/// rankings.
///
/// Constructed once at startup and shared through application state; all
/// per-request state lives in the queries themselves.
#[derive(Clone)]
pub struct RecommendationEngine {
    pool: SqlitePool,
}

impl RecommendationEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetches a single image record
    pub async fn get_image(&self, image_id: &str) -> AppResult<Option<Image>> {
        let image = sqlx::query_as::<_, Image>("SELECT * FROM images WHERE id = ?")
            .bind(image_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(image)
    }

    /// Most popular images across the whole catalog, ties broken randomly
    pub async fn initial(&self, limit: i64) -> AppResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT * FROM images
            ORDER BY popularity DESC, RANDOM()
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// Most popular images within one category
    pub async fn by_category(&self, category: Category, limit: i64) -> AppResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT * FROM images
            WHERE category = ?
            ORDER BY popularity DESC, RANDOM()
            LIMIT ?
            "#,
        )
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// Images with an outgoing similarity edge from `image_id`, strongest
    /// first. An image with no outgoing edges yields an empty list.
    pub async fn similar_to(&self, image_id: &str, limit: i64) -> AppResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT i.*
            FROM images i
            JOIN image_similarities s ON i.id = s.image_id2
            WHERE s.image_id1 = ?
            ORDER BY s.similarity_score DESC, i.popularity DESC
            LIMIT ?
            "#,
        )
        .bind(image_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// Preference-weighted ranking for one user.
    ///
    /// Falls back to [`initial`](Self::initial) for users with no category
    /// preferences. An all-zero preference vector splits the limit evenly
    /// instead of proportionally. Otherwise each category gets a quota
    /// proportional to its share of the summed scores (at least one slot),
    /// walked in descending score order; the allocation is greedy, so a
    /// backfill of globally popular never-rated images covers any shortfall
    /// and a final truncation covers overshoot.
    pub async fn personalized(&self, user_id: &str, limit: i64) -> AppResult<Vec<Image>> {
        let prefs: Vec<CategoryScore> = sqlx::query_as(
            r#"
            SELECT category, preference_score
            FROM category_preferences
            WHERE user_id = ?
            ORDER BY preference_score DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if prefs.is_empty() {
            return self.initial(limit).await;
        }

        let total: f64 = prefs.iter().map(|p| p.preference_score).sum();
        let mut recommendations = Vec::new();

        if total == 0.0 {
            let per_category = (limit / prefs.len() as i64).max(1);
            for pref in &prefs {
                let slice = self
                    .category_slice(user_id, pref.category, per_category)
                    .await?;
                recommendations.extend(slice);
            }
            recommendations.truncate(limit.max(0) as usize);
            return Ok(recommendations);
        }

        for pref in &prefs {
            let quota = ((limit as f64 * (pref.preference_score / total)) as i64).max(1);
            let slice = self.category_slice(user_id, pref.category, quota).await?;
            recommendations.extend(slice);
        }

        if (recommendations.len() as i64) < limit {
            let shortfall = limit - recommendations.len() as i64;
            let filler = self.unrated_popular(user_id, shortfall).await?;
            recommendations.extend(filler);
        }

        recommendations.truncate(limit.max(0) as usize);
        Ok(recommendations)
    }

    /// Popular images in one category the user has not rated negatively
    async fn category_slice(
        &self,
        user_id: &str,
        category: Category,
        limit: i64,
    ) -> AppResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT i.*
            FROM images i
            LEFT JOIN user_preferences p ON i.id = p.image_id AND p.user_id = ?
            WHERE i.category = ? AND (p.rating IS NULL OR p.rating > 0)
            ORDER BY i.popularity DESC, RANDOM()
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// Popular images the user has never rated at all, for backfill
    async fn unrated_popular(&self, user_id: &str, limit: i64) -> AppResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT i.*
            FROM images i
            LEFT JOIN user_preferences p ON i.id = p.image_id AND p.user_id = ?
            WHERE p.image_id IS NULL
            ORDER BY i.popularity DESC, RANDOM()
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn setup_pool() -> SqlitePool {
        let pool = crate::db::create_memory_pool().await.unwrap();
        crate::ingest::schema::create_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_image(pool: &SqlitePool, id: &str, category: Category, popularity: f64) {
        sqlx::query(
            r#"
            INSERT INTO images (id, url, description, source, category, popularity, date_added)
            VALUES (?, ?, '', 'Test', ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(format!("https://example.com/{id}.jpg"))
        .bind(category)
        .bind(popularity)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_rating(pool: &SqlitePool, user_id: &str, image_id: &str, rating: i64) {
        sqlx::query(
            "INSERT INTO user_preferences (user_id, image_id, rating, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(image_id)
        .bind(rating)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_category_pref(pool: &SqlitePool, user_id: &str, category: Category, score: f64) {
        sqlx::query(
            r#"
            INSERT INTO category_preferences (user_id, category, preference_score, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(score)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_edge(pool: &SqlitePool, from: &str, to: &str, score: f64) {
        sqlx::query(
            "INSERT INTO image_similarities (image_id1, image_id2, similarity_score) VALUES (?, ?, ?)",
        )
        .bind(from)
        .bind(to)
        .bind(score)
        .execute(pool)
        .await
        .unwrap();
    }

    fn ids(images: &[Image]) -> Vec<&str> {
        images.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_initial_orders_by_popularity() {
        let pool = setup_pool().await;
        insert_image(&pool, "img2", Category::Toilet, 1.0).await;
        insert_image(&pool, "img1", Category::Toilet, 3.0).await;
        let engine = RecommendationEngine::new(pool);

        let images = engine.initial(2).await.unwrap();
        assert_eq!(ids(&images), vec!["img1", "img2"]);
    }

    #[tokio::test]
    async fn test_initial_empty_store() {
        let pool = setup_pool().await;
        let engine = RecommendationEngine::new(pool);
        assert!(engine.initial(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_by_category_filters() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet, 5.0).await;
        insert_image(&pool, "m1", Category::Mirror, 9.0).await;
        let engine = RecommendationEngine::new(pool);

        let images = engine.by_category(Category::Toilet, 10).await.unwrap();
        assert_eq!(ids(&images), vec!["t1"]);
    }

    #[tokio::test]
    async fn test_similar_to_orders_by_score_then_popularity() {
        let pool = setup_pool().await;
        insert_image(&pool, "a", Category::Bathtub, 0.0).await;
        insert_image(&pool, "b", Category::Bathtub, 1.0).await;
        insert_image(&pool, "c", Category::Bathtub, 9.0).await;
        insert_image(&pool, "d", Category::Bathtub, 5.0).await;
        insert_edge(&pool, "a", "b", 0.9).await;
        insert_edge(&pool, "a", "c", 0.6).await;
        insert_edge(&pool, "a", "d", 0.6).await;
        let engine = RecommendationEngine::new(pool);

        let images = engine.similar_to("a", 10).await.unwrap();
        // b wins on score; c beats d on popularity at equal score.
        assert_eq!(ids(&images), vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_similar_to_without_edges() {
        let pool = setup_pool().await;
        insert_image(&pool, "a", Category::Bathtub, 0.0).await;
        let engine = RecommendationEngine::new(pool);
        assert!(engine.similar_to("a", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_personalized_without_history_matches_initial() {
        let pool = setup_pool().await;
        insert_image(&pool, "low", Category::Toilet, 1.0).await;
        insert_image(&pool, "high", Category::Mirror, 7.0).await;
        insert_image(&pool, "mid", Category::Color, 4.0).await;
        let engine = RecommendationEngine::new(pool);

        let personalized = engine.personalized("nobody", 3).await.unwrap();
        assert_eq!(ids(&personalized), vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_personalized_zero_vector_covers_categories() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet, 4.0).await;
        insert_image(&pool, "t2", Category::Toilet, 3.0).await;
        insert_image(&pool, "m1", Category::Mirror, 2.0).await;
        insert_category_pref(&pool, "u1", Category::Toilet, 0.0).await;
        insert_category_pref(&pool, "u1", Category::Mirror, 0.0).await;
        let engine = RecommendationEngine::new(pool);

        let images = engine.personalized("u1", 4).await.unwrap();
        let picked = ids(&images);
        assert!(picked.contains(&"m1"));
        assert!(picked.contains(&"t1"));
    }

    #[tokio::test]
    async fn test_personalized_excludes_disliked_images() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet, 9.0).await;
        insert_image(&pool, "t2", Category::Toilet, 1.0).await;
        insert_category_pref(&pool, "u1", Category::Toilet, 2.0).await;
        insert_rating(&pool, "u1", "t1", -1).await;
        let engine = RecommendationEngine::new(pool);

        let images = engine.personalized("u1", 2).await.unwrap();
        assert!(!ids(&images).contains(&"t1"));
        assert!(ids(&images).contains(&"t2"));
    }

    #[tokio::test]
    async fn test_personalized_proportional_allocation() {
        let pool = setup_pool().await;
        for i in 0..4 {
            insert_image(&pool, &format!("t{i}"), Category::Toilet, 4.0 - i as f64).await;
        }
        for i in 0..4 {
            insert_image(&pool, &format!("m{i}"), Category::Mirror, 4.0 - i as f64).await;
        }
        insert_category_pref(&pool, "u1", Category::Toilet, 3.0).await;
        insert_category_pref(&pool, "u1", Category::Mirror, 1.0).await;
        let engine = RecommendationEngine::new(pool);

        let images = engine.personalized("u1", 4).await.unwrap();
        assert_eq!(images.len(), 4);
        let toilets = images.iter().filter(|i| i.category == Category::Toilet).count();
        let mirrors = images.iter().filter(|i| i.category == Category::Mirror).count();
        assert_eq!(toilets, 3);
        assert_eq!(mirrors, 1);
    }

    #[tokio::test]
    async fn test_personalized_backfills_from_unrated_popular() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet, 5.0).await;
        insert_image(&pool, "c1", Category::Color, 8.0).await;
        insert_image(&pool, "c2", Category::Color, 7.0).await;
        insert_image(&pool, "c3", Category::Color, 6.0).await;
        insert_category_pref(&pool, "u1", Category::Toilet, 1.0).await;
        insert_rating(&pool, "u1", "t1", 1).await;
        let engine = RecommendationEngine::new(pool);

        // The toilet quota only finds one image; colors fill the rest.
        let images = engine.personalized("u1", 4).await.unwrap();
        assert_eq!(images.len(), 4);
        assert_eq!(images[0].id, "t1");
        let colors = images.iter().filter(|i| i.category == Category::Color).count();
        assert_eq!(colors, 3);
    }

    #[tokio::test]
    async fn test_get_image() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet, 0.0).await;
        let engine = RecommendationEngine::new(pool);

        assert!(engine.get_image("t1").await.unwrap().is_some());
        assert!(engine.get_image("missing").await.unwrap().is_none());
    }
}
