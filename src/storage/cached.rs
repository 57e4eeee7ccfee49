use crate::analytics::{AnalyticsRecord, DeviceType, InteractionType, LanguageCode};
use crate::models::Profile;
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Storage wrapper that caches slug lookups.
///
/// Every public tracking request resolves its slug first, so the read cache
/// keeps the hot path off the database. Analytics writes go straight through.
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Slug to profile (negative lookups included)
    slug_cache: Cache<String, Option<Profile>>,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn Storage>, max_entries: u64, ttl_secs: u64) -> Self {
        let slug_cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, slug_cache }
    }
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn put_profile(&self, profile: &Profile) -> StorageResult<()> {
        let previous = self.inner.get_profile(&profile.id).await?;
        self.inner.put_profile(profile).await?;

        if let Some(previous) = previous {
            self.slug_cache.invalidate(&previous.slug).await;
        }
        self.slug_cache
            .insert(profile.slug.clone(), Some(profile.clone()))
            .await;

        Ok(())
    }

    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>> {
        if let Some(cached) = self.slug_cache.get(slug).await {
            return Ok(cached);
        }

        let result = self.inner.get_profile_by_slug(slug).await?;
        self.slug_cache
            .insert(slug.to_string(), result.clone())
            .await;

        Ok(result)
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        self.inner.get_profile(profile_id).await
    }

    async fn register_session(
        &self,
        session_id: &str,
        profile_id: &str,
        device_type: DeviceType,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.inner
            .register_session(session_id, profile_id, device_type, now)
            .await
    }

    async fn record_view(
        &self,
        profile_id: &str,
        device_type: DeviceType,
        is_unique: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.inner
            .record_view(profile_id, device_type, is_unique, now)
            .await
    }

    async fn record_interaction(
        &self,
        profile_id: &str,
        interaction: InteractionType,
    ) -> Result<bool> {
        self.inner.record_interaction(profile_id, interaction).await
    }

    async fn record_language(&self, profile_id: &str, language: LanguageCode) -> Result<bool> {
        self.inner.record_language(profile_id, language).await
    }

    async fn get_analytics(&self, profile_id: &str) -> Result<Option<AnalyticsRecord>> {
        self.inner.get_analytics(profile_id).await
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.inner.purge_expired_sessions(now).await
    }
}
