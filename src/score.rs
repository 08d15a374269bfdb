use crate::config::AnalysisConfig;

/// Score granted when a note is missing; an absent note is not
/// evidence of poor care.
pub const NEUTRAL_SCORE: i64 = 50;

/// Heuristic quality score for a care note, clamped to [0, 100].
///
/// Whitespace is stripped before matching so "통 증" and "통증" score
/// alike. Each configured keyword moves the score once no matter how
/// often it occurs in the text.
pub fn score_note(config: &AnalysisConfig, text: Option<&str>) -> i64 {
    let Some(text) = text else {
        return NEUTRAL_SCORE;
    };
    if text.trim().is_empty() {
        return NEUTRAL_SCORE;
    }
    let normalized: String = text.split_whitespace().collect();

    let mut score = NEUTRAL_SCORE;
    for keyword in &config.positive_keywords {
        if normalized.contains(keyword.as_str()) {
            score += 5;
        }
    }
    for keyword in &config.negative_keywords {
        if normalized.contains(keyword.as_str()) {
            score -= 5;
        }
    }
    score.clamp(0, 100)
}

/// Quality grade assigned to an averaged note score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Average,
    NeedsImprovement,
    NotEvaluated,
}

impl Grade {
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Excellent => "우수",
            Grade::Average => "평균",
            Grade::NeedsImprovement => "개선",
            Grade::NotEvaluated => "평가없음",
        }
    }
}

/// Map an average score onto a grade using the configured cutoffs.
pub fn grade_for_score(config: &AnalysisConfig, average: Option<f64>) -> Grade {
    let Some(average) = average else {
        return Grade::NotEvaluated;
    };
    if average >= config.excellent_threshold as f64 {
        Grade::Excellent
    } else if average >= config.average_threshold as f64 {
        Grade::Average
    } else {
        Grade::NeedsImprovement
    }
}
