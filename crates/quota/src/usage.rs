//! The per-(session, date) usage row persisted by the ledger.

use crate::limits::ServiceType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day's counts for one session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionDailyUsage {
    pub session_id: String,
    pub date: NaiveDate,
    pub image_count: u32,
    pub video_count: u32,
    pub avatar_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionDailyUsage {
    pub fn new(session_id: String, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            date,
            image_count: 0,
            video_count: 0,
            avatar_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn count(&self, service: ServiceType) -> u32 {
        match service {
            ServiceType::Image => self.image_count,
            ServiceType::Video => self.video_count,
            ServiceType::Avatar => self.avatar_count,
        }
    }

    pub fn increment(&mut self, service: ServiceType) {
        match service {
            ServiceType::Image => self.image_count += 1,
            ServiceType::Video => self.video_count += 1,
            ServiceType::Avatar => self.avatar_count += 1,
        }
        self.updated_at = Utc::now();
    }

    /// The persistence key: `"{session}_{YYYY-MM-DD}"`, per spec §6.
    pub fn key(session_id: &str, date: NaiveDate) -> String {
        format!("{session_id}_{}", date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_matches_spec() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        assert_eq!(
            SessionDailyUsage::key("session_abc", date),
            "session_abc_2026-07-29"
        );
    }

    #[test]
    fn increment_bumps_only_the_targeted_service() {
        let mut usage = SessionDailyUsage::new(
            "session_abc".into(),
            NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
        );
        usage.increment(ServiceType::Image);
        assert_eq!(usage.image_count, 1);
        assert_eq!(usage.video_count, 0);
        assert_eq!(usage.avatar_count, 0);
    }
}
