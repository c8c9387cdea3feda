//! Read-only aggregate views over the ledger's rows.

use crate::ledger::QuotaLedger;
use crate::usage::SessionDailyUsage;
use chrono::NaiveDate;
use serde::Serialize;

/// Aggregate counts for a single day across all sessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: Option<NaiveDate>,
    pub session_count: usize,
    pub image_total: u64,
    pub video_total: u64,
    pub avatar_total: u64,
}

impl DailyAggregate {
    pub fn image_average(&self) -> f64 {
        average(self.image_total, self.session_count)
    }

    pub fn video_average(&self) -> f64 {
        average(self.video_total, self.session_count)
    }

    pub fn avatar_average(&self) -> f64 {
        average(self.avatar_total, self.session_count)
    }

    fn from_rows(rows: &[SessionDailyUsage]) -> Self {
        let mut agg = DailyAggregate {
            date: rows.first().map(|r| r.date),
            ..Default::default()
        };
        for row in rows {
            agg.session_count += 1;
            agg.image_total += row.image_count as u64;
            agg.video_total += row.video_count as u64;
            agg.avatar_total += row.avatar_count as u64;
        }
        agg
    }
}

fn average(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

impl QuotaLedger {
    /// Aggregate across all sessions for exactly one date.
    pub async fn daily_aggregate(&self, date: NaiveDate) -> DailyAggregate {
        let rows: Vec<_> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|r| r.date == date)
            .collect();
        let mut agg = DailyAggregate::from_rows(&rows);
        agg.date = Some(date);
        agg
    }

    /// One aggregate per date in `[start, end]` (inclusive), in order.
    pub async fn range_aggregate(&self, start: NaiveDate, end: NaiveDate) -> Vec<DailyAggregate> {
        let rows = self.snapshot().await;
        let mut out = Vec::new();
        let mut day = start;
        while day <= end {
            let day_rows: Vec<_> = rows.iter().filter(|r| r.date == day).cloned().collect();
            let mut agg = DailyAggregate::from_rows(&day_rows);
            agg.date = Some(day);
            out.push(agg);
            day += chrono::Duration::days(1);
        }
        out
    }

    /// A single session's rows over the last `days` days, oldest first.
    pub async fn history(&self, session_id: &str, days: i64) -> Vec<SessionDailyUsage> {
        let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(days);
        let mut rows: Vec<_> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|r| r.session_id == session_id && r.date >= cutoff)
            .collect();
        rows.sort_by_key(|r| r.date);
        rows
    }
}
