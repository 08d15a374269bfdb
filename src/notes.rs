use crate::config::AnalysisConfig;
use crate::models::{Category, CategoryNotes, ScoredRecord, ToiletBreakdown};

/// Merge one day's category notes into a single dated excerpt line.
/// Days with no notes at all produce nothing.
fn merged_line(record: &ScoredRecord) -> Option<String> {
    let date = record.date()?;
    let mut parts = Vec::new();
    for category in Category::ALL {
        if let Some(note) = record.record.note(category) {
            if !note.trim().is_empty() {
                parts.push(format!("{}: {}", category.short_label(), note));
            }
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("[{}] {}", date.format("%m-%d"), parts.join(" / ")))
}

pub fn merge_notes(records: &[ScoredRecord]) -> Vec<String> {
    records.iter().filter_map(merged_line).collect()
}

/// Same merge, with alert keywords wrapped in the configured highlight
/// markers. Used for current-week excerpts only.
pub fn merge_notes_highlighted(config: &AnalysisConfig, records: &[ScoredRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(merged_line)
        .map(|line| highlight_alerts(config, &line))
        .collect()
}

pub fn highlight_alerts(config: &AnalysisConfig, line: &str) -> String {
    let mut highlighted = line.to_string();
    for keyword in &config.highlight_keywords {
        if highlighted.contains(keyword.as_str()) {
            let marked = format!("{}{}{}", config.highlight_open, keyword, config.highlight_close);
            highlighted = highlighted.replace(keyword.as_str(), &marked);
        }
    }
    highlighted
}

/// Current-week raw excerpts grouped by category, for grounding the
/// narrative writer. Every category appears, possibly with no entries.
pub fn category_notes(records: &[ScoredRecord]) -> Vec<CategoryNotes> {
    Category::ALL
        .iter()
        .map(|&category| {
            let entries = records
                .iter()
                .filter_map(|record| {
                    let date = record.date()?;
                    let note = record.record.note(category)?;
                    if note.trim().is_empty() {
                        return None;
                    }
                    Some(format!("[{}] {}", date.format("%m-%d"), note))
                })
                .collect();
            CategoryNotes { category, label: category.label(), entries }
        })
        .collect()
}

/// Per-slot meal summaries for a bucket, in date order, "-" when the
/// bucket holds nothing usable.
pub fn meal_detail_summary(records: &[ScoredRecord]) -> String {
    let mut ordered: Vec<&ScoredRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.date());
    let details: Vec<&str> = ordered
        .iter()
        .map(|record| record.meal_detail.as_str())
        .filter(|detail| !detail.is_empty())
        .collect();
    if details.is_empty() {
        "-".to_string()
    } else {
        details.join(" / ")
    }
}

/// Bucket-wide toilet totals rendered the way care sheets write them,
/// "-" when nothing was recognized all week.
pub fn toilet_summary(records: &[ScoredRecord]) -> String {
    let mut total = ToiletBreakdown::default();
    for record in records {
        total.accumulate(&record.toilet_detail);
    }
    if total.is_empty() {
        return "-".to_string();
    }
    format!(
        "대변{}회/소변{}회 (기저귀교환{}회)",
        total.stool as i64, total.urine as i64, total.diaper as i64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::score_record;
    use crate::models::DailyRecord;
    use chrono::NaiveDate;

    fn cfg() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn record(day: u32, physical: Option<&str>, nursing: Option<&str>) -> ScoredRecord {
        score_record(
            &cfg(),
            DailyRecord {
                date: NaiveDate::from_ymd_opt(2024, 3, day),
                physical_note: physical.map(str::to_string),
                nursing_note: nursing.map(str::to_string),
                ..DailyRecord::default()
            },
        )
    }

    #[test]
    fn merged_lines_skip_empty_days_and_categories() {
        let records = vec![
            record(8, Some("보행 안정"), Some("혈압 정상")),
            record(9, None, None),
            record(10, Some("산책 참여"), None),
        ];
        let notes = merge_notes(&records);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], "[03-08] 신체: 보행 안정 / 간호: 혈압 정상");
        assert_eq!(notes[1], "[03-10] 신체: 산책 참여");
    }

    #[test]
    fn highlighting_wraps_alert_keywords_only() {
        let config = cfg();
        let records = vec![record(8, Some("무릎 통증 호소"), None)];
        let notes = merge_notes_highlighted(&config, &records);
        assert_eq!(notes[0], "[03-08] 신체: 무릎 **통증** 호소");

        assert_eq!(highlight_alerts(&config, "특이사항 없음"), "특이사항 없음");
    }

    #[test]
    fn category_notes_group_current_week_excerpts() {
        let records = vec![
            record(8, Some("보행 안정"), None),
            record(9, Some("산책 참여"), Some("혈압 정상")),
        ];
        let grouped = category_notes(&records);
        assert_eq!(grouped.len(), 4);
        assert_eq!(grouped[0].label, "신체활동");
        assert_eq!(grouped[0].entries, vec!["[03-08] 보행 안정", "[03-09] 산책 참여"]);
        assert_eq!(grouped[2].entries, vec!["[03-09] 혈압 정상"]);
        assert!(grouped[1].entries.is_empty());
    }

    #[test]
    fn meal_summary_joins_in_date_order() {
        let mut late = record(10, None, None);
        late.meal_detail = "죽식 (전량)".to_string();
        let mut early = record(8, None, None);
        early.meal_detail = "일반식 (전량)".to_string();
        let summary = meal_detail_summary(&[late, early]);
        assert_eq!(summary, "일반식 (전량) / 죽식 (전량)");

        assert_eq!(meal_detail_summary(&[record(9, None, None)]), "-");
    }

    #[test]
    fn toilet_summary_formats_totals() {
        let mut a = record(8, None, None);
        a.toilet_detail = ToiletBreakdown { stool: 1.0, urine: 2.0, diaper: 0.0 };
        let mut b = record(9, None, None);
        b.toilet_detail = ToiletBreakdown { stool: 2.0, urine: 1.0, diaper: 1.0 };
        assert_eq!(toilet_summary(&[a, b]), "대변3회/소변3회 (기저귀교환1회)");

        assert_eq!(toilet_summary(&[record(10, None, None)]), "-");
    }
}
