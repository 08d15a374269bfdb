use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::MealType;

/// One ordered meal-amount rule: first rule whose keyword matches wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealAmountRule {
    pub keywords: Vec<String>,
    pub score: f64,
    pub label: String,
}

/// Keywords that map a free-text segment onto a meal texture category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealTypeRule {
    pub category: MealType,
    pub keywords: Vec<String>,
}

/// All vocabularies and thresholds the scorers and extractors use.
/// Injected everywhere instead of living as module globals so tests can
/// substitute fixtures without process-wide effects. `Default` carries
/// the production Korean vocabularies; a JSON file can override any
/// field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    /// Alert keywords wrapped in highlight markers in current-week notes.
    pub highlight_keywords: Vec<String>,
    /// Detection vocabulary, in priority order.
    pub meal_types: Vec<MealTypeRule>,
    /// Texture categories tracked by the weekly totals table.
    pub table_textures: Vec<MealTypeRule>,
    pub meal_amount_rules: Vec<MealAmountRule>,
    /// Assumed intake when phrasing is ambiguous or the field is empty.
    pub default_meal_score: f64,
    pub unknown_amount_label: String,
    /// Ordered portion-qualifier weights for the totals table.
    pub portion_weights: Vec<(String, f64)>,
    /// Weight when a texture keyword appears with no quantity qualifier.
    pub default_portion_weight: f64,
    /// Grade cutoffs for averaged note scores. The upstream system ran
    /// two divergent excellent cutoffs (70 and 90); configurable until
    /// the product owner settles it.
    pub excellent_threshold: i64,
    pub average_threshold: i64,
    pub highlight_open: String,
    pub highlight_close: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        AnalysisConfig {
            positive_keywords: words(&["개선", "안정", "호전", "유지", "활발", "양호", "미흡하지않음"]),
            negative_keywords: words(&["악화", "저하", "불안", "통증", "문제", "감소", "주의", "거부"]),
            highlight_keywords: words(&["통증", "거부", "증가", "감소", "악화", "호전", "불안", "주의", "사고"]),
            meal_types: vec![
                MealTypeRule { category: MealType::Regular, keywords: words(&["일반식"]) },
                MealTypeRule { category: MealType::Porridge, keywords: words(&["죽식"]) },
                MealTypeRule { category: MealType::Minced, keywords: words(&["다진식", "다짐식"]) },
                MealTypeRule { category: MealType::TubeFed, keywords: words(&["경관식"]) },
                MealTypeRule { category: MealType::Soft, keywords: words(&["연식"]) },
                MealTypeRule { category: MealType::Special, keywords: words(&["특식"]) },
            ],
            table_textures: vec![
                MealTypeRule { category: MealType::Regular, keywords: words(&["일반식"]) },
                MealTypeRule { category: MealType::Porridge, keywords: words(&["죽식"]) },
                MealTypeRule { category: MealType::Minced, keywords: words(&["다진식", "다짐식"]) },
            ],
            meal_amount_rules: vec![
                MealAmountRule {
                    keywords: words(&["전량", "정량", "완", "모두", "잘"]),
                    score: 1.0,
                    label: "전량".to_string(),
                },
                MealAmountRule {
                    keywords: words(&["절반", "1/2", "반", "50%", "이하"]),
                    score: 0.5,
                    label: "1/2이하".to_string(),
                },
                MealAmountRule {
                    keywords: words(&["거부", "못", "불가", "0%"]),
                    score: 0.0,
                    label: "거부".to_string(),
                },
            ],
            default_meal_score: 0.75,
            unknown_amount_label: "정보없음".to_string(),
            portion_weights: vec![
                ("1/2이상".to_string(), 0.75),
                ("1/2 이상".to_string(), 0.75),
                ("1/2이하".to_string(), 0.25),
                ("1/2 이하".to_string(), 0.25),
                ("정량".to_string(), 1.0),
                ("전량".to_string(), 1.0),
                ("완식".to_string(), 1.0),
            ],
            default_portion_weight: 0.5,
            excellent_threshold: 70,
            average_threshold: 40,
            highlight_open: "**".to_string(),
            highlight_close: "**".to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<AnalysisConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabularies_are_populated() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.positive_keywords.contains(&"호전".to_string()));
        assert!(cfg.negative_keywords.contains(&"악화".to_string()));
        assert_eq!(cfg.meal_types[0].category, MealType::Regular);
        assert_eq!(cfg.meal_amount_rules.len(), 3);
        assert_eq!(cfg.excellent_threshold, 70);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"excellent_threshold": 90}"#).expect("valid override");
        assert_eq!(cfg.excellent_threshold, 90);
        assert_eq!(cfg.default_meal_score, 0.75);
        assert!(!cfg.highlight_keywords.is_empty());
    }
}
