use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{Category, CategoryScore, PreferenceInsights, PreferenceRecord, ViewRecord},
};

/// Default cap on returned view-history rows
pub const DEFAULT_VIEW_HISTORY_LIMIT: i64 = 50;

/// Read-only projections over one user's interaction history.
///
/// Every query tolerates an absent user: counts come back zero and category
/// fields come back `None`, never an error.
#[derive(Clone)]
pub struct PreferenceTracker {
    pool: SqlitePool,
}

impl PreferenceTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All rating events for a user, most recent first
    pub async fn rating_history(&self, user_id: &str) -> AppResult<Vec<PreferenceRecord>> {
        let records = sqlx::query_as::<_, PreferenceRecord>(
            r#"
            SELECT p.user_id, p.image_id, p.rating, p.timestamp, i.category, i.description
            FROM user_preferences p
            JOIN images i ON p.image_id = i.id
            WHERE p.user_id = ?
            ORDER BY p.timestamp DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Category preferences for a user, strongest first
    pub async fn category_ranking(&self, user_id: &str) -> AppResult<Vec<CategoryScore>> {
        let scores = sqlx::query_as::<_, CategoryScore>(
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
        Ok(scores)
    }

    /// Recent view events for a user, most recent first, bounded
    pub async fn view_history(&self, user_id: &str, limit: i64) -> AppResult<Vec<ViewRecord>> {
        let records = sqlx::query_as::<_, ViewRecord>(
            r#"
            SELECT s.session_id, s.user_id, s.image_id, s.view_time, s.timestamp,
                   i.category, i.description
            FROM user_sessions s
            JOIN images i ON s.image_id = i.id
            WHERE s.user_id = ?
            ORDER BY s.timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Aggregated summary of a user's interactions
    pub async fn insights(&self, user_id: &str) -> AppResult<PreferenceInsights> {
        let total_interactions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_preferences WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let likes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_preferences WHERE user_id = ? AND rating > 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let dislikes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_preferences WHERE user_id = ? AND rating < 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let favorite_category: Option<Category> = sqlx::query_scalar(
            r#"
            SELECT category FROM category_preferences
            WHERE user_id = ?
            ORDER BY preference_score DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let least_favorite_category: Option<Category> = sqlx::query_scalar(
            r#"
            SELECT category FROM category_preferences
            WHERE user_id = ?
            ORDER BY preference_score ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let most_viewed_category: Option<Category> = sqlx::query_scalar(
            r#"
            SELECT i.category
            FROM user_sessions s
            JOIN images i ON s.image_id = i.id
            WHERE s.user_id = ?
            GROUP BY i.category
            ORDER BY COUNT(*) DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(PreferenceInsights {
            total_interactions,
            likes,
            dislikes,
            favorite_category,
            least_favorite_category,
            most_viewed_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    async fn setup_pool() -> SqlitePool {
        let pool = crate::db::create_memory_pool().await.unwrap();
        crate::ingest::schema::create_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_image(pool: &SqlitePool, id: &str, category: Category) {
        sqlx::query(
            r#"
            INSERT INTO images (id, url, description, source, category, popularity, date_added)
            VALUES (?, ?, 'fixture', 'Test', ?, 0, ?)
            "#,
        )
        .bind(id)
        .bind(format!("https://example.com/{id}.jpg"))
        .bind(category)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_rating_at(
        pool: &SqlitePool,
        user_id: &str,
        image_id: &str,
        rating: i64,
        minutes_ago: i64,
    ) {
        sqlx::query(
            "INSERT INTO user_preferences (user_id, image_id, rating, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(image_id)
        .bind(rating)
        .bind(Utc::now() - Duration::minutes(minutes_ago))
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_view_at(
        pool: &SqlitePool,
        user_id: &str,
        image_id: &str,
        minutes_ago: i64,
    ) {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (session_id, user_id, image_id, view_time, timestamp)
            VALUES (?, ?, ?, 4.0, ?)
            "#,
        )
        .bind(format!("s-{image_id}-{minutes_ago}"))
        .bind(user_id)
        .bind(image_id)
        .bind(Utc::now() - Duration::minutes(minutes_ago))
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

    #[tokio::test]
    async fn test_insights_for_unknown_user() {
        let pool = setup_pool().await;
        let tracker = PreferenceTracker::new(pool);

        let insights = tracker.insights("nobody").await.unwrap();
        assert_eq!(insights.total_interactions, 0);
        assert_eq!(insights.likes, 0);
        assert_eq!(insights.dislikes, 0);
        assert!(insights.favorite_category.is_none());
        assert!(insights.least_favorite_category.is_none());
        assert!(insights.most_viewed_category.is_none());
    }

    #[tokio::test]
    async fn test_rating_history_most_recent_first() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet).await;
        insert_image(&pool, "m1", Category::Mirror).await;
        insert_rating_at(&pool, "u1", "t1", 1, 10).await;
        insert_rating_at(&pool, "u1", "m1", -1, 1).await;
        let tracker = PreferenceTracker::new(pool);

        let history = tracker.rating_history("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].image_id, "m1");
        assert_eq!(history[0].category, Category::Mirror);
        assert_eq!(history[1].image_id, "t1");
    }

    #[tokio::test]
    async fn test_view_history_is_bounded() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet).await;
        for minutes in 1..=5 {
            insert_view_at(&pool, "u1", "t1", minutes).await;
        }
        let tracker = PreferenceTracker::new(pool);

        let history = tracker.view_history("u1", 3).await.unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_insights_aggregation() {
        let pool = setup_pool().await;
        insert_image(&pool, "t1", Category::Toilet).await;
        insert_image(&pool, "t2", Category::Toilet).await;
        insert_image(&pool, "m1", Category::Mirror).await;
        insert_rating_at(&pool, "u1", "t1", 1, 3).await;
        insert_rating_at(&pool, "u1", "t2", 1, 2).await;
        insert_rating_at(&pool, "u1", "m1", -1, 1).await;
        insert_category_pref(&pool, "u1", Category::Toilet, 2.0).await;
        insert_category_pref(&pool, "u1", Category::Mirror, -1.0).await;
        insert_view_at(&pool, "u1", "t1", 5).await;
        insert_view_at(&pool, "u1", "t2", 4).await;
        insert_view_at(&pool, "u1", "m1", 3).await;
        let tracker = PreferenceTracker::new(pool);

        let insights = tracker.insights("u1").await.unwrap();
        assert_eq!(insights.total_interactions, 3);
        assert_eq!(insights.likes, 2);
        assert_eq!(insights.dislikes, 1);
        assert_eq!(insights.favorite_category, Some(Category::Toilet));
        assert_eq!(insights.least_favorite_category, Some(Category::Mirror));
        assert_eq!(insights.most_viewed_category, Some(Category::Toilet));
    }

    #[tokio::test]
    async fn test_category_ranking_order() {
        let pool = setup_pool().await;
        insert_category_pref(&pool, "u1", Category::Color, 0.4).await;
        insert_category_pref(&pool, "u1", Category::Bathtub, 3.2).await;
        let tracker = PreferenceTracker::new(pool);

        let ranking = tracker.category_ranking("u1").await.unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].category, Category::Bathtub);
        assert_eq!(ranking[1].category, Category::Color);
    }
}
