use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The slice of an invitation profile the analytics engine needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub slug: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of resolving a public invitation link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    Live(Profile),
    /// Deactivated or past its link expiry
    Gone,
    NotFound,
}

impl Profile {
    pub fn new(id: &str, slug: &str) -> Self {
        Self {
            id: id.to_string(),
            slug: slug.to_string(),
            is_active: true,
            expires_at: None,
        }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

impl ProfileStatus {
    pub fn from_lookup(profile: Option<Profile>, now: DateTime<Utc>) -> Self {
        match profile {
            Some(profile) if profile.is_live_at(now) => ProfileStatus::Live(profile),
            Some(_) => ProfileStatus::Gone,
            None => ProfileStatus::NotFound,
        }
    }
}
