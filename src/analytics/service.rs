//! Ingestion and query surface of the analytics engine
//!
//! Tracking calls are best-effort telemetry: a storage failure is logged
//! and swallowed so it can never fail or slow down an invitation page load.
//! Admin queries do propagate errors.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analytics::models::{AnalyticsRecord, DeviceType, InteractionType, LanguageCode};
use crate::analytics::summary::{summarize, DateRange, Summary};
use crate::models::{Profile, ProfileStatus};
use crate::storage::Storage;

pub struct AnalyticsService {
    storage: Arc<dyn Storage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Resolve a public invitation slug
    pub async fn resolve_slug(&self, slug: &str, now: DateTime<Utc>) -> Result<ProfileStatus> {
        let profile = self.storage.get_profile_by_slug(slug).await?;
        Ok(ProfileStatus::from_lookup(profile, now))
    }

    /// Look up a profile for the admin surface
    pub async fn find_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        self.storage.get_profile(profile_id).await
    }

    /// Record a page view.
    ///
    /// Without a session token the view still counts toward totals but can
    /// never be unique. If the dedup step fails the view is recorded as a
    /// repeat rather than risk double-counting a visitor.
    pub async fn track_view(
        &self,
        profile_id: &str,
        session_id: Option<&str>,
        device_type: DeviceType,
        now: DateTime<Utc>,
    ) {
        let is_unique = match session_id {
            Some(session_id) => match self
                .storage
                .register_session(session_id, profile_id, device_type, now)
                .await
            {
                Ok(opened) => opened,
                Err(err) => {
                    warn!(profile_id, error = %err, "session dedup failed, counting view as repeat");
                    false
                }
            },
            None => false,
        };

        match self
            .storage
            .record_view(profile_id, device_type, is_unique, now)
            .await
        {
            Ok(()) => debug!(
                profile_id,
                device = device_type.as_str(),
                is_unique,
                "view recorded"
            ),
            Err(err) => warn!(profile_id, error = %err, "failed to record view"),
        }
    }

    pub async fn track_interaction(
        &self,
        profile_id: &str,
        interaction: InteractionType,
        now: DateTime<Utc>,
    ) {
        match self.storage.record_interaction(profile_id, interaction).await {
            Ok(true) => debug!(
                profile_id,
                interaction = interaction.as_str(),
                at = %now,
                "interaction recorded"
            ),
            Ok(false) => debug!(
                profile_id,
                interaction = interaction.as_str(),
                at = %now,
                "no analytics yet, interaction ignored"
            ),
            Err(err) => warn!(profile_id, error = %err, "failed to record interaction"),
        }
    }

    pub async fn track_language(
        &self,
        profile_id: &str,
        language: LanguageCode,
        now: DateTime<Utc>,
    ) {
        match self.storage.record_language(profile_id, language).await {
            Ok(true) => debug!(profile_id, %language, at = %now, "language view recorded"),
            Ok(false) => debug!(
                profile_id,
                %language,
                at = %now,
                "no analytics yet, language view ignored"
            ),
            Err(err) => warn!(profile_id, error = %err, "failed to record language view"),
        }
    }

    /// Full aggregate; an all-zero record if nothing was tracked yet
    pub async fn get_analytics(&self, profile_id: &str) -> Result<AnalyticsRecord> {
        Ok(self
            .storage
            .get_analytics(profile_id)
            .await?
            .unwrap_or_else(|| AnalyticsRecord::empty(profile_id)))
    }

    pub async fn get_summary(
        &self,
        profile_id: &str,
        date_range: DateRange,
        now: DateTime<Utc>,
    ) -> Result<Summary> {
        let record = self.storage.get_analytics(profile_id).await?;
        Ok(summarize(record.as_ref(), date_range, now))
    }
}
