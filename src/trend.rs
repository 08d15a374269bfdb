use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::AnalysisConfig;
use crate::extract::{meal_texture_amounts, score_record};
use crate::models::{
    BucketSummary, Category, CategoryScore, DailyRecord, MealAmountTrend, MealType,
    MealTypeChange, NoteDigest, QuantTrend, ScoredRecord, ToiletBreakdown, ToiletCountTrend,
    ToiletTrend, TrendHeader, TrendLabel, TrendReport, WeeklyStatus, WeeklyTotalsRow,
};
use crate::notes;
use crate::payload;
use crate::score::score_note;
use crate::week::{split_weeks, week_windows};

/// Average note score for one category over one bucket. Only records
/// that carry a note for the category contribute; a bucket with none
/// has no average at all.
fn bucket_average(config: &AnalysisConfig, records: &[ScoredRecord], category: Category) -> Option<f64> {
    let scores: Vec<i64> = records
        .iter()
        .filter_map(|record| record.record.note(category))
        .filter(|note| !note.trim().is_empty())
        .map(|note| score_note(config, Some(note)))
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(round1(scores.iter().sum::<i64>() as f64 / scores.len() as f64))
}

/// Week-over-week quality trend per care category. Categories with no
/// notes in either bucket are omitted entirely rather than emitted as
/// zeroed placeholders.
pub fn category_trends(
    config: &AnalysisConfig,
    prev_bucket: &[ScoredRecord],
    curr_bucket: &[ScoredRecord],
) -> Vec<CategoryScore> {
    let mut scores = Vec::new();
    for category in Category::ALL {
        let prev = bucket_average(config, prev_bucket, category);
        let curr = bucket_average(config, curr_bucket, category);
        let (diff, trend) = match (prev, curr) {
            (None, None) => continue,
            (Some(prev), Some(curr)) => {
                let diff = round1(curr - prev);
                let trend = if diff > 1.0 {
                    TrendLabel::Rising
                } else if diff < -1.0 {
                    TrendLabel::Falling
                } else {
                    TrendLabel::Unchanged
                };
                (Some(diff), trend)
            }
            (None, Some(_)) => (None, TrendLabel::NewData),
            (Some(_), None) => (None, TrendLabel::NoData),
        };
        scores.push(CategoryScore {
            category,
            label: category.label(),
            prev,
            curr,
            diff,
            trend,
        });
    }
    scores
}

/// Mean intake score for a bucket; an empty bucket reads as 0.0.
fn meal_score_mean(records: &[ScoredRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records.iter().map(|record| record.meal_amount_score).sum();
    round2(sum / records.len() as f64)
}

/// Mean voiding count for a bucket. Unknown counts are excluded from
/// the mean, not treated as zero; a bucket with no known counts reads
/// as 0.0 by convention.
fn toilet_count_mean(records: &[ScoredRecord]) -> f64 {
    let counts: Vec<f64> = records.iter().filter_map(|record| record.toilet_count).collect();
    if counts.is_empty() {
        return 0.0;
    }
    counts.iter().sum::<f64>() / counts.len() as f64
}

fn meal_score_trend(prev: f64, curr: f64) -> QuantTrend {
    let diff = curr - prev;
    if diff > 0.2 {
        QuantTrend::Increasing
    } else if diff < -0.2 {
        QuantTrend::Decreasing
    } else {
        QuantTrend::Steady
    }
}

fn toilet_count_trend(prev: f64, curr: f64) -> ToiletTrend {
    if curr > prev + 1.0 {
        ToiletTrend::IncreasingFlag
    } else if curr + 1.0 < prev {
        ToiletTrend::Decreasing
    } else {
        ToiletTrend::Steady
    }
}

/// Most frequent meal type in a bucket; ties go to the type seen
/// first in record order.
fn modal_meal_type(records: &[ScoredRecord]) -> Option<MealType> {
    let mut counts: Vec<(MealType, usize)> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|(t, _)| *t == record.meal_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.meal_type, 1)),
        }
    }
    let mut best: Option<(MealType, usize)> = None;
    for (meal_type, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((meal_type, count)),
        }
    }
    best.map(|(meal_type, _)| meal_type)
}

fn sum_textures(config: &AnalysisConfig, records: &[ScoredRecord]) -> BTreeMap<MealType, f64> {
    let mut totals: BTreeMap<MealType, f64> = config
        .table_textures
        .iter()
        .map(|rule| (rule.category, 0.0))
        .collect();
    for record in records {
        for slot in record.record.meal_slots() {
            for (meal_type, amount) in meal_texture_amounts(config, slot) {
                *totals.entry(meal_type).or_insert(0.0) += amount;
            }
        }
    }
    totals
}

fn sum_toilet(records: &[ScoredRecord]) -> ToiletBreakdown {
    let mut total = ToiletBreakdown::default();
    for record in records {
        total.accumulate(&record.toilet_detail);
    }
    total
}

fn totals_row(
    label: &'static str,
    textures: &BTreeMap<MealType, f64>,
    toilet: ToiletBreakdown,
) -> WeeklyTotalsRow {
    let texture = |meal_type: MealType| textures.get(&meal_type).copied().unwrap_or(0.0);
    WeeklyTotalsRow {
        label,
        regular: texture(MealType::Regular),
        porridge: texture(MealType::Porridge),
        minced: texture(MealType::Minced),
        urine: toilet.urine,
        stool: toilet.stool,
        diaper: toilet.diaper,
    }
}

/// Reduce the two buckets into the full quantitative report: header
/// metric trends, merged excerpts, totals table, per-category
/// excerpts, and the human-readable bucket summaries.
pub fn build_trend_report(
    config: &AnalysisConfig,
    prev_bucket: &[ScoredRecord],
    curr_bucket: &[ScoredRecord],
) -> TrendReport {
    let prev_meal = meal_score_mean(prev_bucket);
    let curr_meal = meal_score_mean(curr_bucket);
    let prev_toilet = toilet_count_mean(prev_bucket);
    let curr_toilet = toilet_count_mean(curr_bucket);

    let prev_type = modal_meal_type(prev_bucket)
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| "-".to_string());
    let curr_type = modal_meal_type(curr_bucket)
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| "-".to_string());
    let changed = prev_type != curr_type;
    let change = if changed {
        format!("{prev_type} → {curr_type}")
    } else {
        prev_type.clone()
    };

    let header = TrendHeader {
        meal_amount: MealAmountTrend {
            label: "식사량",
            prev: round2(prev_meal * 100.0),
            curr: round2(curr_meal * 100.0),
            trend: meal_score_trend(prev_meal, curr_meal),
        },
        toilet: ToiletCountTrend {
            label: "배설",
            prev: prev_toilet,
            curr: curr_toilet,
            trend: toilet_count_trend(prev_toilet, curr_toilet),
        },
        meal_type: MealTypeChange {
            label: "식사 형태",
            prev: prev_type,
            curr: curr_type,
            change,
            changed,
        },
    };

    TrendReport {
        header,
        notes: NoteDigest {
            previous: notes::merge_notes(prev_bucket),
            current: notes::merge_notes_highlighted(config, curr_bucket),
        },
        weekly_table: [
            totals_row("저번주", &sum_textures(config, prev_bucket), sum_toilet(prev_bucket)),
            totals_row("이번주", &sum_textures(config, curr_bucket), sum_toilet(curr_bucket)),
        ],
        category_notes: notes::category_notes(curr_bucket),
        meal_detail: BucketSummary {
            previous: notes::meal_detail_summary(prev_bucket),
            current: notes::meal_detail_summary(curr_bucket),
        },
        toilet_detail: BucketSummary {
            previous: notes::toilet_summary(prev_bucket),
            current: notes::toilet_summary(curr_bucket),
        },
    }
}

/// The whole engine as one pure transform: score, bucket, aggregate,
/// assemble. Runs over an already-fetched record set and keeps no
/// state between calls.
pub fn analyze(
    config: &AnalysisConfig,
    records: Vec<DailyRecord>,
    week_start: NaiveDate,
) -> WeeklyStatus {
    let (previous_range, current_range) = week_windows(week_start);
    let record_count = records.len();

    let scored: Vec<ScoredRecord> = records
        .into_iter()
        .map(|record| score_record(config, record))
        .collect();
    let (prev_bucket, curr_bucket) = split_weeks(scored, previous_range, current_range);

    if prev_bucket.is_empty() && curr_bucket.is_empty() {
        return WeeklyStatus {
            previous_range,
            current_range,
            record_count,
            scores: Vec::new(),
            trend: None,
            digest: None,
        };
    }

    WeeklyStatus {
        previous_range,
        current_range,
        record_count,
        scores: category_trends(config, &prev_bucket, &curr_bucket),
        trend: Some(build_trend_report(config, &prev_bucket, &curr_bucket)),
        digest: Some(payload::category_digest(&prev_bucket, &curr_bucket)),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, d)
    }

    fn physical(d: u32, note: &str) -> DailyRecord {
        DailyRecord {
            date: day(d),
            physical_note: Some(note.to_string()),
            ..DailyRecord::default()
        }
    }

    fn scored(records: Vec<DailyRecord>) -> Vec<ScoredRecord> {
        let config = cfg();
        records.into_iter().map(|r| score_record(&config, r)).collect()
    }

    #[test]
    fn rising_trend_across_buckets() {
        let config = cfg();
        // Neutral notes score 50; 안정+호전+개선+활발+양호+유지 = 80.
        let prev = scored((1..=7).map(|d| physical(d, "특이사항 없음")).collect());
        let curr = scored(
            (8..=14).map(|d| physical(d, "안정, 호전, 개선, 활발, 양호, 유지")).collect(),
        );
        let trends = category_trends(&config, &prev, &curr);
        assert_eq!(trends.len(), 1);
        let physical_trend = &trends[0];
        assert_eq!(physical_trend.prev, Some(50.0));
        assert_eq!(physical_trend.curr, Some(80.0));
        assert_eq!(physical_trend.diff, Some(30.0));
        assert_eq!(physical_trend.trend, TrendLabel::Rising);
    }

    #[test]
    fn small_moves_are_unchanged() {
        let config = cfg();
        let prev = scored(vec![physical(1, "특이사항 없음")]);
        let curr = scored(vec![physical(8, "특이사항 기록")]);
        let trends = category_trends(&config, &prev, &curr);
        assert_eq!(trends[0].diff, Some(0.0));
        assert_eq!(trends[0].trend, TrendLabel::Unchanged);
    }

    #[test]
    fn new_data_when_only_current_week_has_notes() {
        let config = cfg();
        let prev = scored(vec![DailyRecord { date: day(1), ..DailyRecord::default() }]);
        // 안정 + 유지 = 60.
        let curr = scored(vec![physical(8, "안정적으로 유지")]);
        let trends = category_trends(&config, &prev, &curr);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].prev, None);
        assert_eq!(trends[0].curr, Some(60.0));
        assert_eq!(trends[0].diff, None);
        assert_eq!(trends[0].trend, TrendLabel::NewData);
    }

    #[test]
    fn no_data_when_current_week_went_silent() {
        let config = cfg();
        let prev = scored(vec![physical(1, "안정")]);
        let curr = scored(vec![DailyRecord { date: day(8), ..DailyRecord::default() }]);
        let trends = category_trends(&config, &prev, &curr);
        assert_eq!(trends[0].trend, TrendLabel::NoData);
        assert_eq!(trends[0].curr, None);
    }

    #[test]
    fn categories_with_no_notes_anywhere_are_omitted() {
        let config = cfg();
        let prev = scored(vec![physical(1, "안정")]);
        let curr = scored(vec![physical(8, "안정")]);
        let trends = category_trends(&config, &prev, &curr);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].category, Category::Physical);
    }

    #[test]
    fn meal_score_trend_thresholds() {
        assert_eq!(meal_score_trend(0.5, 0.8), QuantTrend::Increasing);
        assert_eq!(meal_score_trend(0.8, 0.5), QuantTrend::Decreasing);
        assert_eq!(meal_score_trend(0.7, 0.8), QuantTrend::Steady);
    }

    #[test]
    fn toilet_trend_flags_jumps() {
        assert_eq!(toilet_count_trend(2.0, 4.0), ToiletTrend::IncreasingFlag);
        assert_eq!(toilet_count_trend(4.0, 2.0), ToiletTrend::Decreasing);
        assert_eq!(toilet_count_trend(3.0, 3.5), ToiletTrend::Steady);
    }

    #[test]
    fn toilet_mean_excludes_unknown_counts() {
        let mut records = scored(vec![
            DailyRecord { date: day(1), ..DailyRecord::default() },
            DailyRecord { date: day(2), ..DailyRecord::default() },
        ]);
        records[0].toilet_count = Some(4.0);
        records[1].toilet_count = None;
        assert_eq!(toilet_count_mean(&records), 4.0);

        records[0].toilet_count = None;
        assert_eq!(toilet_count_mean(&records), 0.0);
    }

    #[test]
    fn modal_type_ties_break_by_first_seen() {
        let mut records = scored(vec![
            DailyRecord { date: day(1), ..DailyRecord::default() },
            DailyRecord { date: day(2), ..DailyRecord::default() },
        ]);
        records[0].meal_type = MealType::Porridge;
        records[1].meal_type = MealType::Regular;
        assert_eq!(modal_meal_type(&records), Some(MealType::Porridge));
        assert_eq!(modal_meal_type(&[]), None);
    }

    #[test]
    fn totals_table_buckets_textures_and_toilet() {
        let config = cfg();
        let prev = scored(vec![DailyRecord {
            date: day(1),
            meal_breakfast: Some("일반식 전량".to_string()),
            meal_lunch: Some("일반식 1/2이하".to_string()),
            toilet_care: Some("소변2회 대변1회".to_string()),
            ..DailyRecord::default()
        }]);
        let curr = scored(vec![DailyRecord {
            date: day(8),
            meal_breakfast: Some("죽식 전량".to_string()),
            toilet_care: Some("기저귀 교환 2회".to_string()),
            ..DailyRecord::default()
        }]);
        let report = build_trend_report(&config, &prev, &curr);

        let [prev_row, curr_row] = &report.weekly_table;
        assert_eq!(prev_row.label, "저번주");
        assert_eq!(prev_row.regular, 1.25);
        assert_eq!(prev_row.urine, 2.0);
        assert_eq!(prev_row.stool, 1.0);
        assert_eq!(curr_row.label, "이번주");
        assert_eq!(curr_row.porridge, 1.0);
        assert_eq!(curr_row.diaper, 2.0);
    }

    #[test]
    fn header_reports_meal_type_transition() {
        let config = cfg();
        let mut prev = scored(vec![DailyRecord { date: day(1), ..DailyRecord::default() }]);
        prev[0].meal_type = MealType::Regular;
        let mut curr = scored(vec![DailyRecord { date: day(8), ..DailyRecord::default() }]);
        curr[0].meal_type = MealType::Porridge;

        let report = build_trend_report(&config, &prev, &curr);
        assert!(report.header.meal_type.changed);
        assert_eq!(report.header.meal_type.change, "일반식 → 죽식");

        curr[0].meal_type = MealType::Regular;
        let report = build_trend_report(&config, &prev, &curr);
        assert!(!report.header.meal_type.changed);
        assert_eq!(report.header.meal_type.change, "일반식");
    }

    #[test]
    fn analyze_empty_records_yields_insufficient_data() {
        let config = cfg();
        let week_start = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let status = analyze(&config, Vec::new(), week_start);
        assert_eq!(status.record_count, 0);
        assert!(status.scores.is_empty());
        assert!(status.trend.is_none());
        assert!(status.digest.is_none());
        assert_eq!(status.previous_range.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(status.current_range.end, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    }

    #[test]
    fn analyze_is_idempotent() {
        let config = cfg();
        let week_start = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let records: Vec<DailyRecord> = (1..=14)
            .map(|d| DailyRecord {
                date: day(d),
                physical_note: Some(if d < 8 { "안정" } else { "호전 개선" }.to_string()),
                meal_breakfast: Some("죽식 전량".to_string()),
                toilet_care: Some("소변2회".to_string()),
                ..DailyRecord::default()
            })
            .collect();

        let first = analyze(&config, records.clone(), week_start);
        let second = analyze(&config, records, week_start);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn analyze_fills_every_section() {
        let config = cfg();
        let week_start = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let records: Vec<DailyRecord> = (1..=14)
            .map(|d| DailyRecord {
                date: day(d),
                physical_note: Some("보행 안정".to_string()),
                nursing_note: Some("혈압 정상".to_string()),
                meal_breakfast: Some("일반식 전량".to_string()),
                toilet_care: Some("소변3회 대변1회".to_string()),
                ..DailyRecord::default()
            })
            .collect();

        let status = analyze(&config, records, week_start);
        assert_eq!(status.record_count, 14);
        assert_eq!(status.scores.len(), 2);
        let report = status.trend.expect("trend present");
        assert_eq!(report.notes.previous.len(), 7);
        assert_eq!(report.notes.current.len(), 7);
        assert_eq!(report.header.toilet.prev, 4.0);
        assert_eq!(report.header.meal_type.change, "일반식");
        assert_eq!(report.category_notes.len(), 4);
        assert_ne!(report.meal_detail.current, "-");
        assert!(status.digest.is_some());
    }
}
