//! Row shapes shared by the SQL backends

use crate::analytics::{AnalyticsRecord, DailyViews};
use crate::models::Profile;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct ProfileRow {
    pub id: String,
    pub slug: String,
    pub is_active: bool,
    pub expires_at: Option<i64>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            slug: row.slug,
            is_active: row.is_active,
            expires_at: row.expires_at.and_then(DateTime::from_timestamp_millis),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AnalyticsRow {
    pub profile_id: String,
    pub total_views: i64,
    pub unique_views: i64,
    pub mobile_views: i64,
    pub desktop_views: i64,
    pub tablet_views: i64,
    pub first_viewed_at: Option<i64>,
    pub last_viewed_at: Option<i64>,
    pub map_clicks: i64,
    pub rsvp_clicks: i64,
    pub music_plays: i64,
    pub music_pauses: i64,
}

fn millis(value: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|ms| DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp {ms} out of range")))
        .transpose()
}

impl AnalyticsRow {
    /// Assemble a full record from the counter row and its child tables
    pub fn into_record(
        self,
        daily: Vec<(String, i64)>,
        hourly: Vec<(i64, i64)>,
        languages: Vec<(String, i64)>,
    ) -> Result<AnalyticsRecord> {
        let mut record = AnalyticsRecord::empty(&self.profile_id);
        record.total_views = self.total_views as u64;
        record.unique_views = self.unique_views as u64;
        record.mobile_views = self.mobile_views as u64;
        record.desktop_views = self.desktop_views as u64;
        record.tablet_views = self.tablet_views as u64;
        record.first_viewed_at = millis(self.first_viewed_at)?;
        record.last_viewed_at = millis(self.last_viewed_at)?;
        record.map_clicks = self.map_clicks as u64;
        record.rsvp_clicks = self.rsvp_clicks as u64;
        record.music_plays = self.music_plays as u64;
        record.music_pauses = self.music_pauses as u64;

        record.daily_views = daily
            .into_iter()
            .map(|(day, count)| {
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .with_context(|| format!("invalid rollup date '{day}'"))?;
                Ok(DailyViews {
                    date,
                    count: count as u64,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        record.daily_views.sort_by_key(|d| d.date);

        record.hourly_distribution = hourly
            .into_iter()
            .map(|(hour, count)| (hour as u8, count as u64))
            .collect();

        record.language_views = languages
            .into_iter()
            .map(|(language, count)| (language, count as u64))
            .collect();

        Ok(record)
    }
}
