//! Invitation view and interaction analytics
//!
//! Every public invitation link is instrumented: page views are
//! deduplicated per visitor session over a rolling 24 hour window and
//! folded into a per-profile aggregate (device breakdown, 30 day daily
//! rollup, lifetime hourly histogram, language and interaction counters).
//! Admins read the aggregate directly or as a date-range summary.

pub mod models;
pub mod service;
pub mod summary;
pub mod sweeper;

pub use models::{
    AnalyticsRecord, DailyViews, DeviceType, InteractionType, LanguageCode, ViewSession,
    DAILY_VIEWS_RETENTION, SESSION_TTL_HOURS,
};
pub use service::AnalyticsService;
pub use summary::{summarize, DateRange, DeviceBreakdown, Summary};
pub use sweeper::{sweep_once, SessionSweeper};
