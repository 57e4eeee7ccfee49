use crate::analytics::{AnalyticsRecord, DeviceType, InteractionType, LanguageCode, ViewSession};
use crate::models::Profile;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Process-local storage backed by `DashMap`s.
///
/// Every mutation goes through a map entry, which holds the shard's write
/// lock, so read-modify-write on one profile or one session key is atomic.
#[derive(Default)]
pub struct MemoryStorage {
    /// Profiles keyed by id
    profiles: DashMap<String, Profile>,
    /// Slug to profile id
    slugs: DashMap<String, String>,
    /// Dedup windows keyed by (session_id, profile_id)
    sessions: DashMap<(String, String), ViewSession>,
    /// Aggregates keyed by profile id
    records: DashMap<String, AnalyticsRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, including expired ones not yet purged
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn put_profile(&self, profile: &Profile) -> StorageResult<()> {
        match self.slugs.entry(profile.slug.clone()) {
            Entry::Occupied(entry) if entry.get() != &profile.id => {
                return Err(StorageError::Conflict);
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(entry) => {
                entry.insert(profile.id.clone());
            }
        }

        if let Some(previous) = self.profiles.insert(profile.id.clone(), profile.clone()) {
            if previous.slug != profile.slug {
                self.slugs.remove(&previous.slug);
            }
        }

        Ok(())
    }

    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>> {
        let Some(id) = self.slugs.get(slug).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        Ok(self.profiles.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        Ok(self
            .profiles
            .get(profile_id)
            .map(|entry| entry.value().clone()))
    }

    async fn register_session(
        &self,
        session_id: &str,
        profile_id: &str,
        device_type: DeviceType,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let key = (session_id.to_string(), profile_id.to_string());
        let opened = match self.sessions.entry(key) {
            Entry::Occupied(entry) if entry.get().is_active(now) => false,
            Entry::Occupied(mut entry) => {
                entry.insert(ViewSession::open(session_id, profile_id, device_type, now));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(ViewSession::open(session_id, profile_id, device_type, now));
                true
            }
        };
        Ok(opened)
    }

    async fn record_view(
        &self,
        profile_id: &str,
        device_type: DeviceType,
        is_unique: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.records
            .entry(profile_id.to_string())
            .or_insert_with(|| AnalyticsRecord::empty(profile_id))
            .apply_view(device_type, is_unique, now);
        Ok(())
    }

    async fn record_interaction(
        &self,
        profile_id: &str,
        interaction: InteractionType,
    ) -> Result<bool> {
        Ok(match self.records.get_mut(profile_id) {
            Some(mut record) => {
                record.apply_interaction(interaction);
                true
            }
            None => false,
        })
    }

    async fn record_language(&self, profile_id: &str, language: LanguageCode) -> Result<bool> {
        Ok(match self.records.get_mut(profile_id) {
            Some(mut record) => {
                record.apply_language(language);
                true
            }
            None => false,
        })
    }

    async fn get_analytics(&self, profile_id: &str) -> Result<Option<AnalyticsRecord>> {
        Ok(self
            .records
            .get(profile_id)
            .map(|entry| entry.value().clone()))
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut purged = 0u64;
        self.sessions.retain(|_, session| {
            let keep = session.is_active(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }
}
