use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::AnalysisConfig;
use crate::models::{DailyRecord, MealType, ScoredRecord, ToiletBreakdown};

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*회").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static STOOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(대변|배변)\s*(\d+)\s*회").unwrap());
static URINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(소변|배뇨)\s*(\d+)\s*회").unwrap());
static DIAPER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(기저귀|교환)\s*(\d+)\s*회").unwrap());

/// First texture category whose keyword appears in the text, in the
/// configured priority order. `None` for an empty field, `Unconfirmed`
/// for non-empty text with no recognizable texture.
pub fn detect_meal_type(config: &AnalysisConfig, text: Option<&str>) -> Option<MealType> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    for rule in &config.meal_types {
        if rule.keywords.iter().any(|k| text.contains(k.as_str())) {
            return Some(rule.category);
        }
    }
    Some(MealType::Unconfirmed)
}

/// Intake fraction for one meal slot, first matching rule wins. Text
/// that matches nothing falls back to the configured optimistic
/// default; empty text does too.
pub fn score_meal_amount(config: &AnalysisConfig, text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return config.default_meal_score;
    };
    for rule in &config.meal_amount_rules {
        if rule.keywords.iter().any(|k| text.contains(k.as_str())) {
            return rule.score;
        }
    }
    config.default_meal_score
}

/// Display label matching the amount rule that would have fired.
pub fn meal_amount_label<'a>(config: &'a AnalysisConfig, text: Option<&str>) -> &'a str {
    let Some(text) = text else {
        return &config.unknown_amount_label;
    };
    for rule in &config.meal_amount_rules {
        if rule.keywords.iter().any(|k| text.contains(k.as_str())) {
            return &rule.label;
        }
    }
    &config.unknown_amount_label
}

/// Total voiding/diaper events found in free text: the sum of every
/// "N회" match, or the first bare digit run when no counted match
/// exists. `None` means unknown, not zero.
///
/// The bare-digit fallback can latch onto an unrelated number (a time
/// of day, say); undercounting or a stray match is accepted over
/// failing the whole record.
pub fn extract_toilet_count(text: Option<&str>) -> Option<f64> {
    let text = text?;
    let mut total = 0.0;
    let mut matched = false;
    for capture in COUNT_RE.captures_iter(text) {
        if let Ok(n) = capture[1].parse::<f64>() {
            total += n;
            matched = true;
        }
    }
    if matched {
        return Some(total);
    }
    DIGITS_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Per-subtype event counts. A single text may feed several subtypes;
/// unmatched text yields all zeros since the breakdown only decorates
/// the total.
pub fn parse_toilet_breakdown(text: Option<&str>) -> ToiletBreakdown {
    let mut detail = ToiletBreakdown::default();
    let Some(text) = text else {
        return detail;
    };
    for capture in STOOL_RE.captures_iter(text) {
        if let Ok(n) = capture[2].parse::<f64>() {
            detail.stool += n;
        }
    }
    for capture in URINE_RE.captures_iter(text) {
        if let Ok(n) = capture[2].parse::<f64>() {
            detail.urine += n;
        }
    }
    for capture in DIAPER_RE.captures_iter(text) {
        if let Ok(n) = capture[2].parse::<f64>() {
            detail.diaper += n;
        }
    }
    detail
}

/// Portion totals per table texture category for one meal field. The
/// field splits on "/" and "," into segments; each segment contributes
/// its portion weight to every texture whose keyword it mentions.
pub fn meal_texture_amounts(
    config: &AnalysisConfig,
    text: Option<&str>,
) -> BTreeMap<MealType, f64> {
    let mut totals: BTreeMap<MealType, f64> = config
        .table_textures
        .iter()
        .map(|rule| (rule.category, 0.0))
        .collect();
    let Some(text) = text else {
        return totals;
    };
    // Guard "1/2" qualifiers so the segment split on "/" keeps them whole.
    let guarded = text.replace("1/2", "1\u{2044}2");
    for segment in guarded.split(['/', ',']) {
        let segment = segment.replace('\u{2044}', "/");
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let mut ratio = config.default_portion_weight;
        for (keyword, weight) in &config.portion_weights {
            if segment.contains(keyword.as_str()) {
                ratio = *weight;
                break;
            }
        }
        for rule in &config.table_textures {
            if rule.keywords.iter().any(|k| segment.contains(k.as_str())) {
                if let Some(total) = totals.get_mut(&rule.category) {
                    *total += ratio;
                }
            }
        }
    }
    totals
}

/// Run every extractor over one record.
pub fn score_record(config: &AnalysisConfig, record: DailyRecord) -> ScoredRecord {
    let slots = record.meal_slots();

    let meal_type = slots
        .iter()
        .filter_map(|slot| detect_meal_type(config, *slot))
        .find(|t| *t != MealType::Unconfirmed)
        .unwrap_or(MealType::Unconfirmed);

    let slot_scores: Vec<f64> = slots
        .iter()
        .filter(|slot| slot.is_some())
        .map(|slot| score_meal_amount(config, *slot))
        .collect();
    let meal_amount_score = if slot_scores.is_empty() {
        0.0
    } else {
        round2(slot_scores.iter().sum::<f64>() / slot_scores.len() as f64)
    };

    let mut details = Vec::new();
    for slot in slots {
        let Some(text) = slot else { continue };
        if text.trim().is_empty() {
            continue;
        }
        let texture = detect_meal_type(config, Some(text)).unwrap_or(MealType::Unconfirmed);
        details.push(format!("{} ({})", texture, meal_amount_label(config, Some(text))));
    }

    let toilet_count = extract_toilet_count(record.toilet_care.as_deref());
    let toilet_detail = parse_toilet_breakdown(record.toilet_care.as_deref());

    ScoredRecord {
        meal_type,
        meal_amount_score,
        meal_detail: details.join(" / "),
        toilet_count,
        toilet_detail,
        record,
    }
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

    #[test]
    fn meal_type_priority_and_sentinels() {
        let config = cfg();
        assert_eq!(detect_meal_type(&config, Some("죽식 전량")), Some(MealType::Porridge));
        assert_eq!(detect_meal_type(&config, Some("다짐식 절반")), Some(MealType::Minced));
        // Priority order, not longest match.
        assert_eq!(
            detect_meal_type(&config, Some("일반식에서 죽식으로 변경")),
            Some(MealType::Regular)
        );
        assert_eq!(detect_meal_type(&config, Some("맛있게 드심")), Some(MealType::Unconfirmed));
        assert_eq!(detect_meal_type(&config, Some("")), None);
        assert_eq!(detect_meal_type(&config, None), None);
    }

    #[test]
    fn meal_amount_rules_fire_in_order() {
        let config = cfg();
        assert_eq!(score_meal_amount(&config, Some("전량 섭취")), 1.0);
        assert_eq!(score_meal_amount(&config, Some("절반 정도 드심")), 0.5);
        assert_eq!(score_meal_amount(&config, Some("식사 거부")), 0.0);
        // Ambiguous phrasing gets the optimistic default.
        assert_eq!(score_meal_amount(&config, Some("식사하심")), 0.75);
        assert_eq!(score_meal_amount(&config, Some("")), 0.75);
        assert_eq!(score_meal_amount(&config, None), 0.75);
    }

    #[test]
    fn meal_amount_stays_in_unit_interval() {
        let config = cfg();
        for text in ["전량", "절반", "거부", "기타", ""] {
            let score = score_meal_amount(&config, Some(text));
            assert!((0.0..=1.0).contains(&score), "{text} scored {score}");
        }
    }

    #[test]
    fn amount_labels_track_the_same_rules() {
        let config = cfg();
        assert_eq!(meal_amount_label(&config, Some("전량 섭취")), "전량");
        assert_eq!(meal_amount_label(&config, Some("1/2 이하")), "1/2이하");
        assert_eq!(meal_amount_label(&config, Some("못 드심")), "거부");
        assert_eq!(meal_amount_label(&config, Some("식사하심")), "정보없음");
        assert_eq!(meal_amount_label(&config, None), "정보없음");
    }

    #[test]
    fn toilet_count_sums_counted_matches() {
        assert_eq!(extract_toilet_count(Some("소변2회, 대변1회")), Some(3.0));
        assert_eq!(extract_toilet_count(Some("배뇨 4회")), Some(4.0));
        assert_eq!(extract_toilet_count(Some("")), None);
        assert_eq!(extract_toilet_count(None), None);
        assert_eq!(extract_toilet_count(Some("특이사항 없음")), None);
    }

    #[test]
    fn toilet_count_bare_digit_fallback_is_a_known_heuristic() {
        // No "회" match, so the first digit run wins even when it is
        // plausibly a time of day. Kept for compatibility.
        assert_eq!(extract_toilet_count(Some("오후 3시경 배뇨")), Some(3.0));
    }

    #[test]
    fn breakdown_sums_per_subtype() {
        let detail = parse_toilet_breakdown(Some("대변3회"));
        assert_eq!(detail.stool, 3.0);
        assert_eq!(detail.urine, 0.0);
        assert_eq!(detail.diaper, 0.0);

        let detail = parse_toilet_breakdown(Some("소변3회 대변1회 기저귀2회 교환1회"));
        assert_eq!(detail.urine, 3.0);
        assert_eq!(detail.stool, 1.0);
        assert_eq!(detail.diaper, 3.0);
    }

    #[test]
    fn breakdown_defaults_to_zeros() {
        assert!(parse_toilet_breakdown(None).is_empty());
        assert!(parse_toilet_breakdown(Some("양호")).is_empty());
        let detail = parse_toilet_breakdown(Some("대변3회"));
        assert!(detail.stool >= 0.0 && detail.urine >= 0.0 && detail.diaper >= 0.0);
    }

    #[test]
    fn texture_amounts_weight_each_segment() {
        let config = cfg();
        let totals = meal_texture_amounts(&config, Some("일반식 전량 / 죽식 1/2이하"));
        assert_eq!(totals[&MealType::Regular], 1.0);
        assert_eq!(totals[&MealType::Porridge], 0.25);
        assert_eq!(totals[&MealType::Minced], 0.0);

        // Texture keyword with no qualifier gets the default weight.
        let totals = meal_texture_amounts(&config, Some("다진식"));
        assert_eq!(totals[&MealType::Minced], 0.5);

        let totals = meal_texture_amounts(&config, None);
        assert!(totals.values().all(|v| *v == 0.0));
    }

    #[test]
    fn score_record_derives_all_fields() {
        let config = cfg();
        let record = DailyRecord {
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 8),
            meal_breakfast: Some("죽식 전량".to_string()),
            meal_lunch: Some("죽식 절반".to_string()),
            meal_dinner: None,
            toilet_care: Some("소변2회, 대변1회".to_string()),
            ..DailyRecord::default()
        };
        let scored = score_record(&config, record);
        assert_eq!(scored.meal_type, MealType::Porridge);
        assert_eq!(scored.meal_amount_score, 0.75);
        assert_eq!(scored.meal_detail, "죽식 (전량) / 죽식 (1/2이하)");
        assert_eq!(scored.toilet_count, Some(3.0));
        assert_eq!(scored.toilet_detail.urine, 2.0);
        assert_eq!(scored.toilet_detail.stool, 1.0);
    }

    #[test]
    fn score_record_with_no_meals_is_unconfirmed() {
        let scored = score_record(&cfg(), DailyRecord::default());
        assert_eq!(scored.meal_type, MealType::Unconfirmed);
        assert_eq!(scored.meal_amount_score, 0.0);
        assert_eq!(scored.meal_detail, "");
        assert_eq!(scored.toilet_count, None);
    }
}
