use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{Category, Rating},
};

/// View times longer than this count as implicit positive feedback
const VIEW_TIME_THRESHOLD_SECS: f64 = 5.0;
/// Popularity bonus for a qualifying view
const VIEW_POPULARITY_BONUS: f64 = 0.5;
/// Category-preference bonus for a qualifying view
const VIEW_CATEGORY_BONUS: f64 = 0.2;
/// Added to both directions of an edge between two liked images
const SIMILARITY_REINFORCEMENT: f64 = 0.1;

/// Applies explicit and implicit feedback to the catalog's scores.
///
/// Each operation runs its statements in one transaction, but no isolation is
/// imposed across concurrent requests; interleaved writers drift scores rather
/// than corrupt them.
#[derive(Clone)]
pub struct ScoringEngine {
    pool: SqlitePool,
}

impl ScoringEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a like/dislike for an image.
    ///
    /// Returns `Ok(false)` when the image does not exist. The event row is
    /// replace-on-conflict: one row per `(user, image)`, refreshed on every
    /// call. Score side effects are applied only when the rating is new or
    /// changed; a changed rating applies its full delta additively, without
    /// reconciling the value it replaced.
    pub async fn record_rating(
        &self,
        user_id: &str,
        image_id: &str,
        rating: Rating,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let category: Option<Category> = sqlx::query_scalar("SELECT category FROM images WHERE id = ?")
            .bind(image_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(category) = category else {
            tracing::debug!(image_id = %image_id, "Rating for unknown image rejected");
            return Ok(false);
        };

        let previous: Option<i64> = sqlx::query_scalar(
            "SELECT rating FROM user_preferences WHERE user_id = ? AND image_id = ?",
        )
        .bind(user_id)
        .bind(image_id)
        .fetch_optional(&mut *tx)
        .await?;

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO user_preferences (user_id, image_id, rating, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(image_id)
        .bind(rating.value())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // A repeat of the same rating only refreshes the event row.
        if previous != Some(rating.value()) {
            sqlx::query("UPDATE images SET popularity = popularity + ? WHERE id = ?")
                .bind(rating.value())
                .bind(image_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO category_preferences (user_id, category, preference_score, timestamp)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id, category)
                DO UPDATE SET
                    preference_score = preference_score + excluded.preference_score,
                    timestamp = excluded.timestamp
                "#,
            )
            .bind(user_id)
            .bind(category)
            .bind(rating.value() as f64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            image_id = %image_id,
            rating = rating.value(),
            "Rating recorded"
        );

        Ok(true)
    }

    /// Records how long an image was on screen.
    ///
    /// The view event is replace-on-conflict per `(session, user, image)`.
    /// Views longer than the threshold also nudge the image's popularity and
    /// the user's category preference; every qualifying call applies the
    /// bonus again, replayed or not.
    pub async fn record_view_time(
        &self,
        session_id: &str,
        user_id: &str,
        image_id: &str,
        seconds: f64,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let category: Option<Category> = sqlx::query_scalar("SELECT category FROM images WHERE id = ?")
            .bind(image_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(category) = category else {
            tracing::debug!(image_id = %image_id, "View time for unknown image rejected");
            return Ok(false);
        };

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO user_sessions
                (session_id, user_id, image_id, view_time, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(image_id)
        .bind(seconds)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if seconds > VIEW_TIME_THRESHOLD_SECS {
            sqlx::query("UPDATE images SET popularity = popularity + ? WHERE id = ?")
                .bind(VIEW_POPULARITY_BONUS)
                .bind(image_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO category_preferences (user_id, category, preference_score, timestamp)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id, category)
                DO UPDATE SET
                    preference_score = preference_score + excluded.preference_score,
                    timestamp = excluded.timestamp
                "#,
            )
            .bind(user_id)
            .bind(category)
            .bind(VIEW_CATEGORY_BONUS)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Strengthens similarity edges between every pair of images the user has
    /// liked.
    ///
    /// Refinement only: the updates target existing directed edges and never
    /// create new ones. Returns the count of attempted directional updates,
    /// `2 * C(n, 2)` for `n` liked images, whether or not the rows existed.
    pub async fn reinforce_similarity(&self, user_id: &str) -> AppResult<u64> {
        let liked: Vec<String> = sqlx::query_scalar(
            "SELECT image_id FROM user_preferences WHERE user_id = ? AND rating > 0",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if liked.len() < 2 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut attempted = 0u64;

        for (i, first) in liked.iter().enumerate() {
            for second in &liked[i + 1..] {
                for (from, to) in [(first, second), (second, first)] {
                    sqlx::query(
                        r#"
                        UPDATE image_similarities
                        SET similarity_score = similarity_score + ?
                        WHERE image_id1 = ? AND image_id2 = ?
                        "#,
                    )
                    .bind(SIMILARITY_REINFORCEMENT)
                    .bind(from)
                    .bind(to)
                    .execute(&mut *tx)
                    .await?;
                    attempted += 1;
                }
            }
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            liked = liked.len(),
            updates = attempted,
            "Similarity reinforcement applied"
        );

        Ok(attempted)
    }
}
