//! Admin-facing summary derived from an [`AnalyticsRecord`]

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::models::AnalyticsRecord;

/// Period the summary's view total is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    fn days(&self) -> Option<i64> {
        match self {
            DateRange::Last7Days => Some(7),
            DateRange::Last30Days => Some(30),
            DateRange::All => None,
        }
    }
}

impl std::str::FromStr for DateRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(DateRange::Last7Days),
            "30d" => Ok(DateRange::Last30Days),
            "all" => Ok(DateRange::All),
            other => Err(anyhow::anyhow!(
                "unknown date range '{other}', expected one of: 7d, 30d, all"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBreakdown {
    pub mobile: u64,
    pub desktop: u64,
    pub tablet: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub date_range: DateRange,

    /// Views inside `date_range`
    pub total_views: u64,

    /// All-time, independent of `date_range`
    pub unique_visitors: u64,

    pub most_viewed_language: Option<String>,
    pub peak_hour: Option<u8>,

    /// All-time, independent of `date_range`
    pub device_breakdown: DeviceBreakdown,
}

impl Summary {
    pub fn empty(date_range: DateRange) -> Self {
        Self {
            date_range,
            total_views: 0,
            unique_visitors: 0,
            most_viewed_language: None,
            peak_hour: None,
            device_breakdown: DeviceBreakdown::default(),
        }
    }
}

/// Build the admin summary for a profile.
///
/// A missing record yields the all-zero summary. Only `total_views` honours
/// the date range; unique visitors and the device breakdown are lifetime
/// figures.
pub fn summarize(
    record: Option<&AnalyticsRecord>,
    date_range: DateRange,
    now: DateTime<Utc>,
) -> Summary {
    let Some(record) = record else {
        return Summary::empty(date_range);
    };

    let total_views = match date_range.days() {
        None => record.total_views,
        Some(days) => {
            let cutoff = (now - Duration::days(days)).date_naive();
            record
                .daily_views
                .iter()
                .filter(|d| d.date >= cutoff)
                .map(|d| d.count)
                .sum()
        }
    };

    Summary {
        date_range,
        total_views,
        unique_visitors: record.unique_views,
        most_viewed_language: first_max(record.language_views.iter()).cloned(),
        peak_hour: first_max(record.hourly_distribution.iter()).copied(),
        device_breakdown: DeviceBreakdown {
            mobile: record.mobile_views,
            desktop: record.desktop_views,
            tablet: record.tablet_views,
        },
    }
}

/// Key with the highest count; ties keep the first key seen.
fn first_max<'a, K: 'a>(entries: impl Iterator<Item = (&'a K, &'a u64)>) -> Option<&'a K> {
    entries
        .fold(None, |best: Option<(&K, u64)>, (key, count)| match best {
            Some((_, top)) if *count <= top => best,
            _ => Some((key, *count)),
        })
        .map(|(key, _)| key)
}
