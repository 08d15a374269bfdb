use crate::models::{Category, CategoryDigest, ScoredRecord, TrendLabel, WeeklyStatus};
use crate::notes;

/// System prompt for the external weekly-report writer. The writer is
/// told to produce three OER sentences (observation, evidence,
/// response) in Korean care-record style, with no numerals.
pub const WEEKLY_WRITER_SYSTEM_PROMPT: &str = r#"<system_instruction>
    <role>
        당신은 장기요양기관 전문 사회복지사이며, 제공된 데이터를 근거로 주간 상태변화 기록을 작성하는 전문가입니다.
    </role>

    <output_constraints>
        <constraint>전체 분량: 100~200자 이내</constraint>
        <constraint>종결 어미: 반드시 명사형 기록체(~했음, ~하심, ~함) 사용</constraint>
        <constraint>문장 스타일: 라벨(예: "신체 상태는") 사용 금지, 서술형으로 자연스럽게 연결</constraint>
        <constraint>수치 표현 금지: 숫자(0-9) 및 단위(%, 회, 분 등) 절대 사용 금지</constraint>
        <constraint>금지 단어: 수급자 이름, 출석, 출석일, 평균, 출석당</constraint>
    </output_constraints>

    <content_logic>
        <structure_oer>
            각 문장은 반드시 [O(관찰: 변화/유지) + E(증거: 발화/행동) + R(개입/결과)] 요소를 모두 포함해야 함.
        </structure_oer>
        <sentence_assignment>
            1. 첫 번째 문장: 신체(식사/배설/통증/위생 중 핵심 1개)
            2. 두 번째 문장: 인지·심리(기분/참여/기억 중 핵심 1개)
            3. 세 번째 문장: 행동·안전(낙상/거부/배회/활동 선호 중 핵심 1개)
        </sentence_assignment>
        <rule>추상적 표현(상태 양호 등)을 지양하고 특이사항 기반의 구체적 증거를 우선함.</rule>
    </content_logic>
</system_instruction>"#;

/// Previous/current note text per category, pre-joined for the writer
/// prompt. Every category appears; empty buckets yield empty strings
/// that the formatter later renders as "없음".
pub fn category_digest(
    prev_bucket: &[ScoredRecord],
    curr_bucket: &[ScoredRecord],
) -> Vec<CategoryDigest> {
    let prev_notes = notes::category_notes(prev_bucket);
    let curr_notes = notes::category_notes(curr_bucket);
    Category::ALL
        .iter()
        .enumerate()
        .map(|(i, &category)| CategoryDigest {
            category,
            label: category.label(),
            previous: prev_notes[i].entries.join(" / "),
            current: curr_notes[i].entries.join(" / "),
        })
        .collect()
}

fn trend_line(status: &WeeklyStatus, category: Category) -> String {
    match status.scores.iter().find(|score| score.category == category) {
        Some(score) => {
            let fmt = |value: Option<f64>| match value {
                Some(v) => format!("{v:.1}"),
                None => "-".to_string(),
            };
            format!("이전 {} → 현재 {} ({})", fmt(score.prev), fmt(score.curr), score.trend)
        }
        None => TrendLabel::NoData.to_string(),
    }
}

fn digest_text(status: &WeeklyStatus, category: Category, current: bool) -> String {
    let text = status
        .digest
        .as_ref()
        .and_then(|digest| digest.iter().find(|entry| entry.category == category))
        .map(|entry| if current { entry.current.trim() } else { entry.previous.trim() })
        .unwrap_or("");
    if text.is_empty() {
        "없음".to_string()
    } else {
        text.to_string()
    }
}

/// The single formatting function feeding the narrative writer: the
/// analysis payload flattened into the prompt template. Pure assembly,
/// no new computation.
pub fn format_writer_input(
    resident: &str,
    status: &WeeklyStatus,
    previous_report: Option<&str>,
) -> String {
    let previous_report = match previous_report.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => "없음",
    };
    format!(
        r#"<weekly_report_context>
    <subject_info>
        <name>{name}</name>
        <period>{start} ~ {end}</period>
    </subject_info>

    <trends_summary>
        <physical>{physical_trend}</physical>
        <cognitive>{cognitive_trend}</cognitive>
        <nursing>{nursing_trend}</nursing>
        <functional>{functional_trend}</functional>
    </trends_summary>

    <raw_materials>
        <priority_1_physical>
            <prev_notes>{physical_prev}</prev_notes>
            <curr_notes>{physical_curr}</curr_notes>
        </priority_1_physical>

        <priority_2_cognitive>
            <prev_notes>{cognitive_prev}</prev_notes>
            <curr_notes>{cognitive_curr}</curr_notes>
        </priority_2_cognitive>

        <priority_3_reference>
            <previous_weekly_report>{previous_report}</previous_weekly_report>
        </priority_3_reference>

        <priority_4_nursing>
            <prev_notes>{nursing_prev}</prev_notes>
            <curr_notes>{nursing_curr}</curr_notes>
        </priority_4_nursing>

        <priority_5_functional>
            <prev_notes>{functional_prev}</prev_notes>
            <curr_notes>{functional_curr}</curr_notes>
        </priority_5_functional>
    </raw_materials>

    <final_instruction>
        1. raw_materials의 Priority 1, 2를 최우선 근거로 삼아 정확히 3문장을 작성할 것.
        2. 모든 문장은 system_instruction에 정의된 OER 흐름과 제약사항을 엄격히 준수할 것.
        3. 결과물은 순수 텍스트로만 출력할 것.
    </final_instruction>
</weekly_report_context>"#,
        name = resident,
        start = status.current_range.start,
        end = status.current_range.end,
        physical_trend = trend_line(status, Category::Physical),
        cognitive_trend = trend_line(status, Category::Cognitive),
        nursing_trend = trend_line(status, Category::Nursing),
        functional_trend = trend_line(status, Category::Functional),
        physical_prev = digest_text(status, Category::Physical, false),
        physical_curr = digest_text(status, Category::Physical, true),
        cognitive_prev = digest_text(status, Category::Cognitive, false),
        cognitive_curr = digest_text(status, Category::Cognitive, true),
        nursing_prev = digest_text(status, Category::Nursing, false),
        nursing_curr = digest_text(status, Category::Nursing, true),
        functional_prev = digest_text(status, Category::Functional, false),
        functional_curr = digest_text(status, Category::Functional, true),
        previous_report = previous_report,
    )
}

/// Boundary to the external AI writer. Implementations own their own
/// timeout, retry, and backoff policy; the engine hands over the
/// formatted payload once and takes the text or the error as-is.
pub trait NarrativeWriter {
    fn draft(&self, system_prompt: &str, input: &str) -> anyhow::Result<String>;
}
