use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{DailyRecord, WeekRange};
use crate::week::week_windows;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_resident(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO carehome.residents (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

async fn upsert_record(pool: &PgPool, resident_id: Uuid, record: &DailyRecord) -> anyhow::Result<bool> {
    let Some(date) = record.date else {
        return Ok(false);
    };
    let result = sqlx::query(
        r#"
        INSERT INTO carehome.daily_records
        (id, resident_id, record_date, physical_note, cognitive_note, nursing_note,
         functional_note, meal_breakfast, meal_lunch, meal_dinner, toilet_care,
         bath_time, bp_temp, prog_therapy)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (resident_id, record_date) DO UPDATE SET
            physical_note = EXCLUDED.physical_note,
            cognitive_note = EXCLUDED.cognitive_note,
            nursing_note = EXCLUDED.nursing_note,
            functional_note = EXCLUDED.functional_note,
            meal_breakfast = EXCLUDED.meal_breakfast,
            meal_lunch = EXCLUDED.meal_lunch,
            meal_dinner = EXCLUDED.meal_dinner,
            toilet_care = EXCLUDED.toilet_care,
            bath_time = EXCLUDED.bath_time,
            bp_temp = EXCLUDED.bp_temp,
            prog_therapy = EXCLUDED.prog_therapy
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resident_id)
    .bind(date)
    .bind(&record.physical_note)
    .bind(&record.cognitive_note)
    .bind(&record.nursing_note)
    .bind(&record.functional_note)
    .bind(&record.meal_breakfast)
    .bind(&record.meal_lunch)
    .bind(&record.meal_dinner)
    .bind(&record.toilet_care)
    .bind(&record.bath_time)
    .bind(&record.bp_temp)
    .bind(&record.prog_therapy)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert a realistic sample fortnight for one resident: a weaker
/// previous week and an improving current week around 2024-03-08.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let resident_id = upsert_resident(pool, "김영희").await?;
    let anchor = NaiveDate::from_ymd_opt(2024, 3, 1).context("invalid seed anchor")?;

    let prev_week = [
        ("보행 시 흔들림 있어 부축함", "낮 시간 졸음 잦음", "혈압 140/85 측정", "관절 운동 거부"),
        ("식사 중 통증 호소", "간단한 질문에 느리게 반응", "미열 있어 관찰함", "보행 훈련 10분 진행"),
        ("오후 내내 침상 안정", "이름 혼동하는 모습", "욕창 부위 드레싱", "재활 프로그램 불참"),
        ("복도 보행 중 주저앉으려 함", "프로그램 참여 거부", "혈압 정상 범위", "상지 운동 절반만 수행"),
        ("무릎 통증으로 휠체어 이동", "대화 시 단답형 응답", "수면 불안 호소", "치료사 방문 연기"),
        ("부축 하에 화장실 이동", "저녁 무렵 불안 증세", "투약 후 안정", "관절 가동 범위 축소"),
        ("침대에서 일어나기 어려워함", "가족 사진 알아봄", "체온 정상", "서서 버티기 1분"),
    ];
    let curr_week = [
        ("보행기 이용해 복도 왕복", "퀴즈 활동에 참여함", "혈압 안정 유지", "보행 훈련 20분으로 연장"),
        ("식사 자세 양호", "노래 교실에서 활발히 참여", "욕창 부위 호전", "상지 운동 전체 수행"),
        ("산책 프로그램 참여", "날짜 질문에 정확히 답함", "야간 수면 양호", "계단 오르기 시도"),
        ("스스로 휠체어에서 일어남", "동료와 대화 활발", "투약 순응 양호", "균형 잡기 개선"),
        ("마당 산책 동행", "회상 활동에 적극적", "혈압 130/80 안정", "보행 속도 향상"),
        ("식당까지 자력 보행", "웃는 모습 자주 보임", "특이사항 없음", "재활 의지 표현함"),
        ("보행 안정적, 부축 불필요", "프로그램 먼저 요청함", "체온 혈압 모두 정상", "치료사 면담 후 계획 조정"),
    ];
    let meals_prev = ("죽식 1/2이하", "죽식 절반", "죽식 거부");
    let meals_curr = ("일반식 전량", "일반식 정량", "일반식 1/2이상");
    let toilet_prev = "소변3회, 대변1회 (기저귀 교환2회)";
    let toilet_curr = "소변4회, 대변1회";

    for (offset, notes) in prev_week.iter().chain(curr_week.iter()).enumerate() {
        let is_current = offset >= 7;
        let (meal_b, meal_l, meal_d) = if is_current { meals_curr } else { meals_prev };
        let record = DailyRecord {
            date: Some(anchor + Duration::days(offset as i64)),
            physical_note: Some(notes.0.to_string()),
            cognitive_note: Some(notes.1.to_string()),
            nursing_note: Some(notes.2.to_string()),
            functional_note: Some(notes.3.to_string()),
            meal_breakfast: Some(meal_b.to_string()),
            meal_lunch: Some(meal_l.to_string()),
            meal_dinner: Some(meal_d.to_string()),
            toilet_care: Some(if is_current { toilet_curr } else { toilet_prev }.to_string()),
            bath_time: Some("오후 2시".to_string()),
            bp_temp: Some("혈압 정상 / 36.5도".to_string()),
            prog_therapy: Some(if is_current { "재활 치료 진행" } else { "재활 치료 일부 진행" }.to_string()),
        };
        upsert_record(pool, resident_id, &record).await?;
    }

    Ok(())
}

/// Fetch the fortnight around the anchor for one resident, sorted by
/// date, along with both week windows.
pub async fn fetch_two_week_records(
    pool: &PgPool,
    resident: &str,
    week_start: NaiveDate,
) -> anyhow::Result<(Vec<DailyRecord>, WeekRange, WeekRange)> {
    let (previous, current) = week_windows(week_start);

    let rows = sqlx::query(
        r#"
        SELECT dr.record_date, dr.physical_note, dr.cognitive_note, dr.nursing_note,
               dr.functional_note, dr.meal_breakfast, dr.meal_lunch, dr.meal_dinner,
               dr.toilet_care, dr.bath_time, dr.bp_temp, dr.prog_therapy
        FROM carehome.daily_records dr
        JOIN carehome.residents re ON re.id = dr.resident_id
        WHERE re.name = $1 AND dr.record_date BETWEEN $2 AND $3
        ORDER BY dr.record_date
        "#,
    )
    .bind(resident)
    .bind(previous.start)
    .bind(current.end)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(DailyRecord {
            date: row.get("record_date"),
            physical_note: row.get("physical_note"),
            cognitive_note: row.get("cognitive_note"),
            nursing_note: row.get("nursing_note"),
            functional_note: row.get("functional_note"),
            meal_breakfast: row.get("meal_breakfast"),
            meal_lunch: row.get("meal_lunch"),
            meal_dinner: row.get("meal_dinner"),
            toilet_care: row.get("toilet_care"),
            bath_time: row.get("bath_time"),
            bp_temp: row.get("bp_temp"),
            prog_therapy: row.get("prog_therapy"),
        });
    }
    debug!(resident, count = records.len(), "fetched fortnight records");

    Ok((records, previous, current))
}

/// Import daily records from CSV. Rows with an unparseable date are
/// skipped with a warning rather than failing the whole import.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        resident: String,
        date: String,
        physical_note: Option<String>,
        cognitive_note: Option<String>,
        nursing_note: Option<String>,
        functional_note: Option<String>,
        meal_breakfast: Option<String>,
        meal_lunch: Option<String>,
        meal_dinner: Option<String>,
        toilet_care: Option<String>,
        bath_time: Option<String>,
        bp_temp: Option<String>,
        prog_therapy: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let date = match NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                warn!(resident = %row.resident, date = %row.date, "skipping row with bad date");
                continue;
            }
        };

        let resident_id = upsert_resident(pool, row.resident.trim()).await?;
        let record = DailyRecord {
            date: Some(date),
            physical_note: row.physical_note,
            cognitive_note: row.cognitive_note,
            nursing_note: row.nursing_note,
            functional_note: row.functional_note,
            meal_breakfast: row.meal_breakfast,
            meal_lunch: row.meal_lunch,
            meal_dinner: row.meal_dinner,
            toilet_care: row.toilet_care,
            bath_time: row.bath_time,
            bp_temp: row.bp_temp,
            prog_therapy: row.prog_therapy,
        };
        if upsert_record(pool, resident_id, &record).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}
