use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of care records for a resident. At most one exists per
/// (resident, date); the schema enforces it. A missing or unparseable
/// date is kept as `None` and dropped later by the bucketer.
#[derive(Debug, Clone, Default)]
pub struct DailyRecord {
    pub date: Option<NaiveDate>,
    pub physical_note: Option<String>,
    pub cognitive_note: Option<String>,
    pub nursing_note: Option<String>,
    pub functional_note: Option<String>,
    pub meal_breakfast: Option<String>,
    pub meal_lunch: Option<String>,
    pub meal_dinner: Option<String>,
    pub toilet_care: Option<String>,
    pub bath_time: Option<String>,
    pub bp_temp: Option<String>,
    pub prog_therapy: Option<String>,
}

impl DailyRecord {
    pub fn note(&self, category: Category) -> Option<&str> {
        let note = match category {
            Category::Physical => &self.physical_note,
            Category::Cognitive => &self.cognitive_note,
            Category::Nursing => &self.nursing_note,
            Category::Functional => &self.functional_note,
        };
        note.as_deref()
    }

    /// Breakfast, lunch, dinner in slot order.
    pub fn meal_slots(&self) -> [Option<&str>; 3] {
        [
            self.meal_breakfast.as_deref(),
            self.meal_lunch.as_deref(),
            self.meal_dinner.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Physical,
    Cognitive,
    Nursing,
    Functional,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Physical,
        Category::Cognitive,
        Category::Nursing,
        Category::Functional,
    ];

    /// Full display name used in score tables.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Physical => "신체활동",
            Category::Cognitive => "인지관리",
            Category::Nursing => "간호관리",
            Category::Functional => "기능회복",
        }
    }

    /// Short prefix used in merged note lines.
    pub fn short_label(&self) -> &'static str {
        match self {
            Category::Physical => "신체",
            Category::Cognitive => "인지",
            Category::Nursing => "간호",
            Category::Functional => "기능",
        }
    }
}

/// Meal texture classification, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Regular,
    Porridge,
    Minced,
    TubeFed,
    Soft,
    Special,
    Unconfirmed,
}

impl MealType {
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Regular => "일반식",
            MealType::Porridge => "죽식",
            MealType::Minced => "다진식",
            MealType::TubeFed => "경관식",
            MealType::Soft => "연식",
            MealType::Special => "특식",
            MealType::Unconfirmed => "미확인",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Toilet event counts broken down by subtype. Zeros mean "nothing
/// recognized", not "unknown"; the breakdown only decorates the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ToiletBreakdown {
    pub stool: f64,
    pub urine: f64,
    pub diaper: f64,
}

impl ToiletBreakdown {
    pub fn accumulate(&mut self, other: &ToiletBreakdown) {
        self.stool += other.stool;
        self.urine += other.urine;
        self.diaper += other.diaper;
    }

    pub fn is_empty(&self) -> bool {
        self.stool == 0.0 && self.urine == 0.0 && self.diaper == 0.0
    }
}

/// A `DailyRecord` plus everything the extractors derived from it.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: DailyRecord,
    pub meal_type: MealType,
    pub meal_amount_score: f64,
    pub meal_detail: String,
    pub toilet_count: Option<f64>,
    pub toilet_detail: ToiletBreakdown,
}

impl ScoredRecord {
    pub fn date(&self) -> Option<NaiveDate> {
        self.record.date
    }
}

/// Inclusive date window, seven days per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendLabel {
    Rising,
    Falling,
    Unchanged,
    NewData,
    NoData,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TrendLabel::Rising => "상승 ⬆️",
            TrendLabel::Falling => "하락 ⬇️",
            TrendLabel::Unchanged => "변화 없음",
            TrendLabel::NewData => "신규 데이터",
            TrendLabel::NoData => "데이터 없음",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub label: &'static str,
    pub prev: Option<f64>,
    pub curr: Option<f64>,
    pub diff: Option<f64>,
    pub trend: TrendLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantTrend {
    Increasing,
    Decreasing,
    Steady,
}

impl fmt::Display for QuantTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            QuantTrend::Increasing => "증가 📈",
            QuantTrend::Decreasing => "감소 📉",
            QuantTrend::Steady => "유지 -",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToiletTrend {
    /// Flagged for review: a jump in voiding frequency warrants a
    /// nursing follow-up.
    #[serde(rename = "increasing (flag)")]
    IncreasingFlag,
    #[serde(rename = "decreasing")]
    Decreasing,
    #[serde(rename = "steady")]
    Steady,
}

impl fmt::Display for ToiletTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ToiletTrend::IncreasingFlag => "증가 ⚠️",
            ToiletTrend::Decreasing => "감소",
            ToiletTrend::Steady => "유지",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealAmountTrend {
    pub label: &'static str,
    /// Bucket means scaled to 0-100 for display.
    pub prev: f64,
    pub curr: f64,
    pub trend: QuantTrend,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToiletCountTrend {
    pub label: &'static str,
    pub prev: f64,
    pub curr: f64,
    pub trend: ToiletTrend,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealTypeChange {
    pub label: &'static str,
    pub prev: String,
    pub curr: String,
    /// "A → B" when the modal type moved, otherwise the unchanged value.
    pub change: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendHeader {
    pub meal_amount: MealAmountTrend,
    pub toilet: ToiletCountTrend,
    pub meal_type: MealTypeChange,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteDigest {
    pub previous: Vec<String>,
    /// Current-week lines carry highlight markers around alert keywords.
    pub current: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyTotalsRow {
    pub label: &'static str,
    pub regular: f64,
    pub porridge: f64,
    pub minced: f64,
    pub urine: f64,
    pub stool: f64,
    pub diaper: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryNotes {
    pub category: Category,
    pub label: &'static str,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketSummary {
    pub previous: String,
    pub current: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub header: TrendHeader,
    pub notes: NoteDigest,
    pub weekly_table: [WeeklyTotalsRow; 2],
    pub category_notes: Vec<CategoryNotes>,
    pub meal_detail: BucketSummary,
    pub toilet_detail: BucketSummary,
}

/// Previous/current note text per category, pre-joined for the
/// narrative-writer prompt.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDigest {
    pub category: Category,
    pub label: &'static str,
    pub previous: String,
    pub current: String,
}

/// Final output of one analysis run. `trend` and `digest` are absent
/// when the fortnight had no usable records so callers can render an
/// "insufficient data" state instead of a zeroed report.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyStatus {
    pub previous_range: WeekRange,
    pub current_range: WeekRange,
    pub record_count: usize,
    pub scores: Vec<CategoryScore>,
    pub trend: Option<TrendReport>,
    pub digest: Option<Vec<CategoryDigest>>,
}
