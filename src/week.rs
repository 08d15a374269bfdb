use chrono::{Duration, NaiveDate};

use crate::error::AnalysisError;
use crate::models::{ScoredRecord, WeekRange};

/// Parse a caller-supplied week-start anchor. Checked before any fetch
/// so a malformed date never reaches the database.
pub fn parse_week_start(value: &str) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AnalysisError::InvalidWeekStart(value.to_string()))
}

/// The two 7-day windows around an anchor: previous ends the day
/// before the anchor, current starts on it. Inclusive bounds,
/// disjoint, 14 days together.
pub fn week_windows(week_start: NaiveDate) -> (WeekRange, WeekRange) {
    let previous = WeekRange {
        start: week_start - Duration::days(7),
        end: week_start - Duration::days(1),
    };
    let current = WeekRange {
        start: week_start,
        end: week_start + Duration::days(6),
    };
    (previous, current)
}

/// Partition scored records into the two buckets. Records without a
/// date, or dated outside both windows, are dropped silently; the
/// fetch is expected to supply exactly the fortnight but the bucketer
/// does not rely on it.
pub fn split_weeks(
    records: Vec<ScoredRecord>,
    previous: WeekRange,
    current: WeekRange,
) -> (Vec<ScoredRecord>, Vec<ScoredRecord>) {
    let mut prev_bucket = Vec::new();
    let mut curr_bucket = Vec::new();
    for record in records {
        let Some(date) = record.date() else { continue };
        if previous.contains(date) {
            prev_bucket.push(record);
        } else if current.contains(date) {
            curr_bucket.push(record);
        }
    }
    (prev_bucket, curr_bucket)
}
