use crate::analytics::{
    AnalyticsRecord, DeviceType, InteractionType, LanguageCode, DAILY_VIEWS_RETENTION,
    SESSION_TTL_HOURS,
};
use crate::models::Profile;
use crate::storage::rows::{AnalyticsRow, ProfileRow};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                expires_at BIGINT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS view_sessions (
                session_id TEXT NOT NULL,
                profile_id TEXT NOT NULL,
                device_type TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                expires_at BIGINT NOT NULL,
                PRIMARY KEY (session_id, profile_id)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_view_sessions_expires_at ON view_sessions(expires_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profile_analytics (
                profile_id TEXT PRIMARY KEY,
                total_views BIGINT NOT NULL DEFAULT 0,
                unique_views BIGINT NOT NULL DEFAULT 0,
                mobile_views BIGINT NOT NULL DEFAULT 0,
                desktop_views BIGINT NOT NULL DEFAULT 0,
                tablet_views BIGINT NOT NULL DEFAULT 0,
                first_viewed_at BIGINT,
                last_viewed_at BIGINT,
                map_clicks BIGINT NOT NULL DEFAULT 0,
                rsvp_clicks BIGINT NOT NULL DEFAULT 0,
                music_plays BIGINT NOT NULL DEFAULT 0,
                music_pauses BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_daily (
                profile_id TEXT NOT NULL,
                day TEXT NOT NULL,
                count BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (profile_id, day)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_hourly (
                profile_id TEXT NOT NULL,
                hour BIGINT NOT NULL,
                count BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (profile_id, hour)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_languages (
                profile_id TEXT NOT NULL,
                language TEXT NOT NULL,
                count BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (profile_id, language)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn put_profile(&self, profile: &Profile) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (id, slug, is_active, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                slug = EXCLUDED.slug,
                is_active = EXCLUDED.is_active,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.slug)
        .bind(profile.is_active)
        .bind(profile.expires_at.map(|t| t.timestamp_millis()))
        .execute(self.pool.as_ref())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StorageError::Conflict),
            Err(e) => Err(StorageError::Other(e.into())),
        }
    }

    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, slug, is_active, expires_at FROM profiles WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, slug, is_active, expires_at FROM profiles WHERE id = $1",
        )
        .bind(profile_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn register_session(
        &self,
        session_id: &str,
        profile_id: &str,
        device_type: DeviceType,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let created_at = now.timestamp_millis();
        let expires_at = (now + Duration::hours(SESSION_TTL_HOURS)).timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO view_sessions (session_id, profile_id, device_type, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id, profile_id) DO UPDATE SET
                device_type = EXCLUDED.device_type,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            WHERE view_sessions.expires_at <= EXCLUDED.created_at
            "#,
        )
        .bind(session_id)
        .bind(profile_id)
        .bind(device_type.as_str())
        .bind(created_at)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_view(
        &self,
        profile_id: &str,
        device_type: DeviceType,
        is_unique: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now_ms = now.timestamp_millis();
        let day = now.date_naive().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO profile_analytics (profile_id) VALUES ($1) ON CONFLICT (profile_id) DO NOTHING",
        )
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

        let update = format!(
            r#"
            UPDATE profile_analytics SET
                total_views = total_views + 1,
                unique_views = unique_views + $1,
                {device} = {device} + 1,
                first_viewed_at = CASE
                    WHEN $2 AND first_viewed_at IS NULL THEN $3
                    ELSE first_viewed_at
                END,
                last_viewed_at = $3
            WHERE profile_id = $4
            "#,
            device = device_type.column()
        );
        sqlx::query(&update)
            .bind(i64::from(is_unique))
            .bind(is_unique)
            .bind(now_ms)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO analytics_hourly (profile_id, hour, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (profile_id, hour) DO UPDATE SET count = analytics_hourly.count + 1
            "#,
        )
        .bind(profile_id)
        .bind(now.hour() as i64)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analytics_daily (profile_id, day, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (profile_id, day) DO UPDATE SET count = analytics_daily.count + 1
            "#,
        )
        .bind(profile_id)
        .bind(&day)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM analytics_daily
            WHERE profile_id = $1
              AND day NOT IN (
                SELECT day FROM analytics_daily
                WHERE profile_id = $1
                ORDER BY day DESC
                LIMIT $2
              )
            "#,
        )
        .bind(profile_id)
        .bind(DAILY_VIEWS_RETENTION as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_interaction(
        &self,
        profile_id: &str,
        interaction: InteractionType,
    ) -> Result<bool> {
        let update = format!(
            "UPDATE profile_analytics SET {col} = {col} + 1 WHERE profile_id = $1",
            col = interaction.column()
        );
        let result = sqlx::query(&update)
            .bind(profile_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_language(&self, profile_id: &str, language: LanguageCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO analytics_languages (profile_id, language, count)
            SELECT $1, $2, 1
            WHERE EXISTS (SELECT 1 FROM profile_analytics WHERE profile_id = $1)
            ON CONFLICT (profile_id, language) DO UPDATE SET count = analytics_languages.count + 1
            "#,
        )
        .bind(profile_id)
        .bind(language.as_str())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_analytics(&self, profile_id: &str) -> Result<Option<AnalyticsRecord>> {
        // One transaction so the counters and child tables come from the
        // same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let Some(row) = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            SELECT profile_id, total_views, unique_views, mobile_views, desktop_views,
                   tablet_views, first_viewed_at, last_viewed_at,
                   map_clicks, rsvp_clicks, music_plays, music_pauses
            FROM profile_analytics
            WHERE profile_id = $1
            "#,
        )
        .bind(profile_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let daily = sqlx::query_as::<_, (String, i64)>(
            "SELECT day, count FROM analytics_daily WHERE profile_id = $1 ORDER BY day ASC",
        )
        .bind(profile_id)
        .fetch_all(&mut *tx)
        .await?;

        let hourly = sqlx::query_as::<_, (i64, i64)>(
            "SELECT hour, count FROM analytics_hourly WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_all(&mut *tx)
        .await?;

        let languages = sqlx::query_as::<_, (String, i64)>(
            "SELECT language, count FROM analytics_languages WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(row.into_record(daily, hourly, languages)?))
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM view_sessions WHERE expires_at <= $1")
            .bind(now.timestamp_millis())
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
