use sqlx::SqlitePool;

/// Creates the five relations the scoring and recommendation core operates on.
///
/// Idempotent; the core itself never issues DDL (it assumes this ran before it
/// was constructed).
pub async fn create_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS images (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT 'Unknown',
            category TEXT NOT NULL,
            popularity REAL NOT NULL DEFAULT 0,
            date_added TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id TEXT NOT NULL,
            image_id TEXT NOT NULL,
            rating INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            PRIMARY KEY (user_id, image_id),
            FOREIGN KEY (image_id) REFERENCES images(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS image_similarities (
            image_id1 TEXT NOT NULL,
            image_id2 TEXT NOT NULL,
            similarity_score REAL NOT NULL,
            PRIMARY KEY (image_id1, image_id2),
            FOREIGN KEY (image_id1) REFERENCES images(id),
            FOREIGN KEY (image_id2) REFERENCES images(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            session_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            image_id TEXT NOT NULL,
            view_time REAL NOT NULL,
            timestamp TEXT NOT NULL,
            PRIMARY KEY (session_id, user_id, image_id),
            FOREIGN KEY (image_id) REFERENCES images(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_preferences (
            user_id TEXT NOT NULL,
            category TEXT NOT NULL,
            preference_score REAL NOT NULL DEFAULT 0,
            timestamp TEXT NOT NULL,
            PRIMARY KEY (user_id, category)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_images_category_popularity
        ON images(category, popularity)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
