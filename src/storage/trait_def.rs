use crate::analytics::{AnalyticsRecord, DeviceType, InteractionType, LanguageCode};
use crate::models::Profile;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slug already belongs to another profile")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Create or replace a profile; fails with `Conflict` if the slug is
    /// taken by a different profile id
    async fn put_profile(&self, profile: &Profile) -> StorageResult<()>;

    /// Look up a profile by its public link slug
    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>>;

    /// Look up a profile by id
    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;

    /// Open a dedup window for `(session_id, profile_id)` unless an active
    /// one exists. Returns true when this call opened the window.
    ///
    /// Must be a single insert-if-absent step: of two concurrent calls with
    /// the same key, exactly one returns true.
    async fn register_session(
        &self,
        session_id: &str,
        profile_id: &str,
        device_type: DeviceType,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Apply one view to the profile's aggregate, creating it if needed
    async fn record_view(
        &self,
        profile_id: &str,
        device_type: DeviceType,
        is_unique: bool,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Bump an interaction counter. Returns false (and writes nothing)
    /// when the profile has no aggregate yet.
    async fn record_interaction(
        &self,
        profile_id: &str,
        interaction: InteractionType,
    ) -> Result<bool>;

    /// Bump a language counter. Returns false (and writes nothing) when
    /// the profile has no aggregate yet.
    async fn record_language(&self, profile_id: &str, language: LanguageCode) -> Result<bool>;

    /// Snapshot of the profile's aggregate, if any event was recorded
    async fn get_analytics(&self, profile_id: &str) -> Result<Option<AnalyticsRecord>>;

    /// Delete sessions whose window closed at or before `now`
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>;
}
