use std::fmt::Write;

use crate::models::WeeklyStatus;

fn fmt_avg(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

fn fmt_total(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Render one analysis run as a markdown report.
pub fn build_report(resident: &str, status: &WeeklyStatus) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Care Trend Report");
    let _ = writeln!(
        output,
        "{} — previous {} / current {}",
        resident, status.previous_range, status.current_range
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Category Trends");

    if status.scores.is_empty() {
        let _ = writeln!(output, "No scored notes in this window.");
    } else {
        for score in &status.scores {
            let diff = match score.diff {
                Some(d) => format!("{d:+.1}"),
                None => "-".to_string(),
            };
            let _ = writeln!(
                output,
                "- {}: {} → {} (diff {}, {})",
                score.label,
                fmt_avg(score.prev),
                fmt_avg(score.curr),
                diff,
                score.trend
            );
        }
    }

    let Some(trend) = &status.trend else {
        let _ = writeln!(output);
        let _ = writeln!(output, "Insufficient data: no records fell inside the fortnight.");
        return output;
    };

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Metrics");
    let meal = &trend.header.meal_amount;
    let _ = writeln!(
        output,
        "- {}: {} → {} ({})",
        meal.label,
        fmt_total(meal.prev),
        fmt_total(meal.curr),
        meal.trend
    );
    let toilet = &trend.header.toilet;
    let _ = writeln!(
        output,
        "- {}: {:.1}회 → {:.1}회 ({})",
        toilet.label, toilet.prev, toilet.curr, toilet.trend
    );
    let _ = writeln!(output, "- {}: {}", trend.header.meal_type.label, trend.header.meal_type.change);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Totals");
    let _ = writeln!(output, "| 주간 | 일반식 | 죽식 | 다진식 | 소변 | 대변 | 기저귀교환 |");
    let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- | --- |");
    for row in &trend.weekly_table {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {}회 | {}회 | {}회 |",
            row.label,
            fmt_total(row.regular),
            fmt_total(row.porridge),
            fmt_total(row.minced),
            fmt_total(row.urine),
            fmt_total(row.stool),
            fmt_total(row.diaper)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Meal / Toilet Detail");
    let _ = writeln!(output, "- 식사 (저번주): {}", trend.meal_detail.previous);
    let _ = writeln!(output, "- 식사 (이번주): {}", trend.meal_detail.current);
    let _ = writeln!(output, "- 배설 (저번주): {}", trend.toilet_detail.previous);
    let _ = writeln!(output, "- 배설 (이번주): {}", trend.toilet_detail.current);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Previous Week Notes");
    if trend.notes.previous.is_empty() {
        let _ = writeln!(output, "No notes recorded.");
    } else {
        for line in &trend.notes.previous {
            let _ = writeln!(output, "- {line}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Current Week Notes");
    if trend.notes.current.is_empty() {
        let _ = writeln!(output, "No notes recorded.");
    } else {
        for line in &trend.notes.current {
            let _ = writeln!(output, "- {line}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Current Week by Category");
    for group in &trend.category_notes {
        if group.entries.is_empty() {
            continue;
        }
        let _ = writeln!(output, "### {}", group.label);
        for entry in &group.entries {
            let _ = writeln!(output, "- {entry}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::models::DailyRecord;
    use crate::trend::analyze;
    use chrono::NaiveDate;

    fn sample_status(records: Vec<DailyRecord>) -> WeeklyStatus {
        analyze(
            &AnalysisConfig::default(),
            records,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        )
    }

    #[test]
    fn empty_window_renders_insufficient_data() {
        let report = build_report("김영희", &sample_status(Vec::new()));
        assert!(report.contains("# Weekly Care Trend Report"));
        assert!(report.contains("No scored notes in this window."));
        assert!(report.contains("Insufficient data"));
    }

    #[test]
    fn full_report_has_every_section() {
        let records: Vec<DailyRecord> = (1..=14)
            .map(|d| DailyRecord {
                date: NaiveDate::from_ymd_opt(2024, 3, d),
                physical_note: Some("보행 안정".to_string()),
                meal_breakfast: Some("일반식 전량".to_string()),
                toilet_care: Some("소변2회".to_string()),
                ..DailyRecord::default()
            })
            .collect();
        let report = build_report("김영희", &sample_status(records));
        assert!(report.contains("## Category Trends"));
        assert!(report.contains("신체활동"));
        assert!(report.contains("## Weekly Metrics"));
        assert!(report.contains("| 저번주 |"));
        assert!(report.contains("| 이번주 |"));
        assert!(report.contains("## Current Week Notes"));
        assert!(report.contains("### 신체활동"));
    }

    #[test]
    fn totals_format_drops_trailing_zeroes() {
        assert_eq!(fmt_total(3.0), "3");
        assert_eq!(fmt_total(0.5), "0.5");
        assert_eq!(fmt_total(0.0), "0");
    }
}
