//! Data models for invitation analytics

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of distinct dates kept in the daily rollup
pub const DAILY_VIEWS_RETENTION: usize = 30;

/// How long a session token counts as the same visitor
pub const SESSION_TTL_HOURS: i64 = 24;

/// Client class reported by the invitation page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
            DeviceType::Tablet => "tablet",
        }
    }

    /// Counter column holding views for this device class
    pub(crate) fn column(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile_views",
            DeviceType::Desktop => "desktop_views",
            DeviceType::Tablet => "tablet_views",
        }
    }
}

/// Guest interactions tracked on an invitation page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    MapClick,
    RsvpClick,
    MusicPlay,
    MusicPause,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::MapClick => "map_click",
            InteractionType::RsvpClick => "rsvp_click",
            InteractionType::MusicPlay => "music_play",
            InteractionType::MusicPause => "music_pause",
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            InteractionType::MapClick => "map_clicks",
            InteractionType::RsvpClick => "rsvp_clicks",
            InteractionType::MusicPlay => "music_plays",
            InteractionType::MusicPause => "music_pauses",
        }
    }
}

/// Languages an invitation can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    English,
    Telugu,
    Hindi,
    Tamil,
    Kannada,
    Malayalam,
}

impl LanguageCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "english",
            LanguageCode::Telugu => "telugu",
            LanguageCode::Hindi => "hindi",
            LanguageCode::Tamil => "tamil",
            LanguageCode::Kannada => "kannada",
            LanguageCode::Malayalam => "malayalam",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplication window for one visitor on one invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSession {
    pub session_id: String,
    pub profile_id: String,
    pub device_type: DeviceType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ViewSession {
    pub fn open(
        session_id: &str,
        profile_id: &str,
        device_type: DeviceType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            profile_id: profile_id.to_string(),
            device_type,
            created_at: now,
            expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// View count for a single UTC calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub count: u64,
}

/// Per-profile analytics aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub profile_id: String,
    pub total_views: u64,
    pub unique_views: u64,
    pub mobile_views: u64,
    pub desktop_views: u64,
    pub tablet_views: u64,
    pub first_viewed_at: Option<DateTime<Utc>>,
    pub last_viewed_at: Option<DateTime<Utc>>,

    /// Sorted by date ascending, at most [`DAILY_VIEWS_RETENTION`] entries
    pub daily_views: Vec<DailyViews>,

    /// Hour of day (UTC) to lifetime view count
    pub hourly_distribution: BTreeMap<u8, u64>,

    pub language_views: BTreeMap<String, u64>,
    pub map_clicks: u64,
    pub rsvp_clicks: u64,
    pub music_plays: u64,
    pub music_pauses: u64,
}

impl AnalyticsRecord {
    /// All-zero record, also what admins see for a never-viewed profile
    pub fn empty(profile_id: &str) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            total_views: 0,
            unique_views: 0,
            mobile_views: 0,
            desktop_views: 0,
            tablet_views: 0,
            first_viewed_at: None,
            last_viewed_at: None,
            daily_views: Vec::new(),
            hourly_distribution: BTreeMap::new(),
            language_views: BTreeMap::new(),
            map_clicks: 0,
            rsvp_clicks: 0,
            music_plays: 0,
            music_pauses: 0,
        }
    }

    /// Apply one page view to every counter and rollup.
    ///
    /// Callers must hold exclusive access to the record for the duration
    /// of the call.
    pub fn apply_view(&mut self, device_type: DeviceType, is_unique: bool, now: DateTime<Utc>) {
        self.total_views += 1;

        if is_unique {
            self.unique_views += 1;
            if self.first_viewed_at.is_none() {
                self.first_viewed_at = Some(now);
            }
        }
        self.last_viewed_at = Some(now);

        match device_type {
            DeviceType::Mobile => self.mobile_views += 1,
            DeviceType::Desktop => self.desktop_views += 1,
            DeviceType::Tablet => self.tablet_views += 1,
        }

        *self.hourly_distribution.entry(now.hour() as u8).or_insert(0) += 1;

        self.bump_daily(now.date_naive());
    }

    fn bump_daily(&mut self, date: NaiveDate) {
        match self.daily_views.binary_search_by(|d| d.date.cmp(&date)) {
            Ok(idx) => self.daily_views[idx].count += 1,
            Err(idx) => self.daily_views.insert(idx, DailyViews { date, count: 1 }),
        }

        if self.daily_views.len() > DAILY_VIEWS_RETENTION {
            let overflow = self.daily_views.len() - DAILY_VIEWS_RETENTION;
            self.daily_views.drain(..overflow);
        }
    }

    pub fn apply_interaction(&mut self, interaction: InteractionType) {
        match interaction {
            InteractionType::MapClick => self.map_clicks += 1,
            InteractionType::RsvpClick => self.rsvp_clicks += 1,
            InteractionType::MusicPlay => self.music_plays += 1,
            InteractionType::MusicPause => self.music_pauses += 1,
        }
    }

    pub fn apply_language(&mut self, language: LanguageCode) {
        *self
            .language_views
            .entry(language.as_str().to_string())
            .or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 15, 0).unwrap()
    }

    #[test]
    fn test_repeat_session_counts_total_not_unique() {
        let mut record = AnalyticsRecord::empty("p1");
        let now = at(2024, 3, 1, 10);

        record.apply_view(DeviceType::Mobile, true, now);
        record.apply_view(DeviceType::Mobile, false, now + Duration::minutes(5));

        assert_eq!(record.total_views, 2);
        assert_eq!(record.unique_views, 1);
        assert_eq!(record.mobile_views, 2);
        assert_eq!(record.first_viewed_at, Some(now));
        assert_eq!(record.last_viewed_at, Some(now + Duration::minutes(5)));
    }

    #[test]
    fn test_first_viewed_at_waits_for_unique_view() {
        let mut record = AnalyticsRecord::empty("p1");
        let now = at(2024, 3, 1, 10);

        record.apply_view(DeviceType::Desktop, false, now);
        assert!(record.first_viewed_at.is_none());
        assert_eq!(record.last_viewed_at, Some(now));

        let later = now + Duration::hours(1);
        record.apply_view(DeviceType::Desktop, true, later);
        record.apply_view(DeviceType::Desktop, true, later + Duration::hours(1));
        assert_eq!(record.first_viewed_at, Some(later));
    }

    #[test]
    fn test_device_counters_sum_to_total() {
        let mut record = AnalyticsRecord::empty("p1");
        let now = at(2024, 3, 1, 10);
        let devices = [DeviceType::Mobile, DeviceType::Desktop, DeviceType::Tablet];

        for i in 0..17 {
            record.apply_view(devices[i % 3], i % 2 == 0, now);
        }

        assert_eq!(
            record.mobile_views + record.desktop_views + record.tablet_views,
            record.total_views
        );
        assert_eq!(record.total_views, 17);
    }

    #[test]
    fn test_daily_views_keep_thirty_most_recent_dates() {
        let mut record = AnalyticsRecord::empty("p1");
        let start = at(2024, 1, 1, 8);

        for day in 0..40 {
            record.apply_view(DeviceType::Mobile, true, start + Duration::days(day));
        }

        assert_eq!(record.daily_views.len(), DAILY_VIEWS_RETENTION);
        assert_eq!(
            record.daily_views.first().unwrap().date,
            (start + Duration::days(10)).date_naive()
        );
        assert_eq!(
            record.daily_views.last().unwrap().date,
            (start + Duration::days(39)).date_naive()
        );
        // Totals are lifetime even though the rollup was truncated
        assert_eq!(record.total_views, 40);
    }

    #[test]
    fn test_daily_views_same_date_accumulates() {
        let mut record = AnalyticsRecord::empty("p1");
        let now = at(2024, 5, 2, 1);

        record.apply_view(DeviceType::Tablet, true, now);
        record.apply_view(DeviceType::Tablet, true, now + Duration::hours(20));

        assert_eq!(
            record.daily_views,
            vec![DailyViews {
                date: now.date_naive(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_out_of_order_dates_stay_sorted() {
        let mut record = AnalyticsRecord::empty("p1");
        let now = at(2024, 5, 10, 12);

        record.apply_view(DeviceType::Mobile, true, now);
        record.apply_view(DeviceType::Mobile, true, now - Duration::days(3));

        let dates: Vec<NaiveDate> = record.daily_views.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![(now - Duration::days(3)).date_naive(), now.date_naive()]
        );
    }

    #[test]
    fn test_hourly_distribution_is_lifetime() {
        let mut record = AnalyticsRecord::empty("p1");

        record.apply_view(DeviceType::Mobile, true, at(2024, 1, 1, 20));
        record.apply_view(DeviceType::Mobile, true, at(2024, 2, 1, 20));
        record.apply_view(DeviceType::Mobile, true, at(2024, 2, 1, 0));

        assert_eq!(record.hourly_distribution.get(&20), Some(&2));
        assert_eq!(record.hourly_distribution.get(&0), Some(&1));
        assert_eq!(record.hourly_distribution.values().sum::<u64>(), 3);
        assert!(record.hourly_distribution.keys().all(|h| *h < 24));
    }

    #[test]
    fn test_interactions_and_languages() {
        let mut record = AnalyticsRecord::empty("p1");

        record.apply_interaction(InteractionType::MapClick);
        record.apply_interaction(InteractionType::MapClick);
        record.apply_interaction(InteractionType::RsvpClick);
        record.apply_language(LanguageCode::Telugu);

        assert_eq!(record.map_clicks, 2);
        assert_eq!(record.rsvp_clicks, 1);
        assert_eq!(record.music_plays, 0);
        assert_eq!(record.music_pauses, 0);
        assert_eq!(record.language_views.get("telugu"), Some(&1));
    }

    #[test]
    fn test_session_window() {
        let now = at(2024, 3, 1, 10);
        let session = ViewSession::open("s1", "p1", DeviceType::Mobile, now);

        assert!(session.is_active(now + Duration::hours(23)));
        assert!(!session.is_active(now + Duration::hours(24)));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&InteractionType::RsvpClick).unwrap(),
            "\"rsvp_click\""
        );
        assert_eq!(
            serde_json::from_str::<LanguageCode>("\"malayalam\"").unwrap(),
            LanguageCode::Malayalam
        );
        assert!(serde_json::from_str::<DeviceType>("\"watch\"").is_err());
    }
}
