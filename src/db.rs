use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    AnswerRecord, AssessmentSummary, RiskAssessment, RiskLevel, SignalEvent, SignalKind,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn upsert_user(pool: &PgPool, username: &str, email: Option<&str>) -> anyhow::Result<Uuid> {
    let row = sqlx::query(
        r#"
        INSERT INTO burnout_tracker.users (id, username, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO UPDATE
        SET email = COALESCE(EXCLUDED.email, users.email)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

pub async fn find_user(pool: &PgPool, username: &str) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM burnout_tracker.users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get("id")))
}

pub async fn record_answer(
    pool: &PgPool,
    user_id: Uuid,
    question_id: &str,
    answer_value: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO burnout_tracker.answers
        (id, user_id, date, question_id, answer_value, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(now.date_naive())
    .bind(question_id)
    .bind(answer_value)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn record_signal(
    pool: &PgPool,
    user_id: Uuid,
    kind: SignalKind,
    value: f64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO burnout_tracker.signals
        (id, user_id, signal_type, value, recorded_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(kind.as_str())
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn insert_assessment(pool: &PgPool, assessment: &RiskAssessment) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO burnout_tracker.assessments
        (id, user_id, date, risk_level, risk_score, insights, computed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(assessment.user_id)
    .bind(assessment.date)
    .bind(assessment.risk_level.as_str())
    .bind(assessment.risk_score)
    .bind(serde_json::to_value(&assessment.insights)?)
    .bind(assessment.computed_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_answers(
    pool: &PgPool,
    since: DateTime<Utc>,
    username: Option<&str>,
) -> anyhow::Result<Vec<AnswerRecord>> {
    let mut query = String::from(
        "SELECT a.user_id, a.date, a.question_id, a.answer_value, a.recorded_at \
         FROM burnout_tracker.answers a \
         JOIN burnout_tracker.users u ON u.id = a.user_id \
         WHERE a.recorded_at >= $1",
    );
    if username.is_some() {
        query.push_str(" AND u.username = $2");
    }

    let mut rows = sqlx::query(&query).bind(since);
    if let Some(value) = username {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut answers = Vec::new();

    for row in records {
        answers.push(AnswerRecord {
            user_id: row.get("user_id"),
            date: row.get("date"),
            question_id: row.get("question_id"),
            answer_value: row.get("answer_value"),
            recorded_at: row.get("recorded_at"),
        });
    }

    Ok(answers)
}

pub async fn fetch_signals(
    pool: &PgPool,
    since: DateTime<Utc>,
    username: Option<&str>,
) -> anyhow::Result<Vec<SignalEvent>> {
    let mut query = String::from(
        "SELECT s.user_id, s.signal_type, s.value, s.recorded_at \
         FROM burnout_tracker.signals s \
         JOIN burnout_tracker.users u ON u.id = s.user_id \
         WHERE s.recorded_at >= $1",
    );
    if username.is_some() {
        query.push_str(" AND u.username = $2");
    }

    let mut rows = sqlx::query(&query).bind(since);
    if let Some(value) = username {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut signals = Vec::new();

    for row in records {
        let raw: String = row.get("signal_type");
        let Some(kind) = SignalKind::parse(&raw) else {
            warn!(signal_type = %raw, "skipping stored signal with unknown type");
            continue;
        };
        signals.push(SignalEvent {
            user_id: row.get("user_id"),
            kind,
            value: row.get("value"),
            recorded_at: row.get("recorded_at"),
        });
    }

    Ok(signals)
}

/// Most recent stored assessment per user.
pub async fn fetch_latest_assessments(
    pool: &PgPool,
    username: Option<&str>,
) -> anyhow::Result<Vec<AssessmentSummary>> {
    let mut query = String::from(
        "SELECT DISTINCT ON (a.user_id) \
         u.username, a.date, a.risk_level, a.risk_score, a.insights, a.computed_at \
         FROM burnout_tracker.assessments a \
         JOIN burnout_tracker.users u ON u.id = a.user_id",
    );
    if username.is_some() {
        query.push_str(" WHERE u.username = $1");
    }
    query.push_str(" ORDER BY a.user_id, a.computed_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = username {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut summaries = Vec::new();

    for row in records {
        let raw_level: String = row.get("risk_level");
        let Some(risk_level) = RiskLevel::parse(&raw_level) else {
            warn!(risk_level = %raw_level, "skipping stored assessment with unknown level");
            continue;
        };
        let insights: Vec<String> = serde_json::from_value(row.get("insights"))
            .context("insights column is not a JSON array of strings")?;
        summaries.push(AssessmentSummary {
            username: row.get("username"),
            date: row.get("date"),
            risk_level,
            risk_score: row.get("risk_score"),
            insights,
            computed_at: row.get("computed_at"),
        });
    }

    Ok(summaries)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("7b7c3a51-41f8-4be6-9f41-2f2c9a0c6d18")?,
            "maya",
            "maya@example.com",
        ),
        (
            Uuid::parse_str("c1f9d2e4-8e02-43d0-9f0a-5b1f6f6f2a9c")?,
            "tomas",
            "tomas@example.com",
        ),
        (
            Uuid::parse_str("2a6a6a15-5a6b-4b52-8d84-9c6f0b2f7e31")?,
            "lena",
            "lena@example.com",
        ),
    ];

    for (id, username, email) in users {
        sqlx::query(
            r#"
            INSERT INTO burnout_tracker.users (id, username, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE
            SET email = EXCLUDED.email
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    let answers = vec![
        ("seed-a01", "maya", "s2", 4, 1i64),
        ("seed-a02", "maya", "f1", 2, 2),
        ("seed-a03", "tomas", "m2", 4, 1),
        ("seed-a04", "lena", "e1", 3, 3),
    ];

    for (source_key, username, question_id, answer_value, days_ago) in answers {
        let user_id: Uuid =
            sqlx::query("SELECT id FROM burnout_tracker.users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?
                .get("id");
        let recorded_at = now - Duration::days(days_ago);

        sqlx::query(
            r#"
            INSERT INTO burnout_tracker.answers
            (id, user_id, date, question_id, answer_value, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(recorded_at.date_naive())
        .bind(question_id)
        .bind(answer_value)
        .bind(recorded_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let signals = vec![
        ("seed-s01", "maya", SignalKind::LateNightUsage, 1.0, 1i64),
        ("seed-s02", "maya", SignalKind::LateNightUsage, 1.0, 2),
        ("seed-s03", "tomas", SignalKind::ResponseDelay, 14.2, 1),
        ("seed-s04", "lena", SignalKind::AppOpen, 1.0, 0),
    ];

    for (source_key, username, kind, value, days_ago) in signals {
        let user_id: Uuid =
            sqlx::query("SELECT id FROM burnout_tracker.users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO burnout_tracker.signals
            (id, user_id, signal_type, value, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(value)
        .bind(now - Duration::days(days_ago))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_answers_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        username: String,
        date: chrono::NaiveDate,
        question_id: String,
        answer_value: i32,
        recorded_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        if !(1..=5).contains(&row.answer_value) {
            warn!(
                username = %row.username,
                value = row.answer_value,
                "skipping imported answer with out-of-range value"
            );
            continue;
        }
        if crate::rotation::find_question(&row.question_id).is_none() {
            warn!(
                username = %row.username,
                question_id = %row.question_id,
                "skipping imported answer for unknown question"
            );
            continue;
        }

        let user_id = upsert_user(pool, &row.username, None).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO burnout_tracker.answers
            (id, user_id, date, question_id, answer_value, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(row.date)
        .bind(&row.question_id)
        .bind(row.answer_value)
        .bind(row.recorded_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_signals_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        username: String,
        signal_type: String,
        value: f64,
        recorded_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        let Some(kind) = SignalKind::parse(&row.signal_type) else {
            warn!(
                username = %row.username,
                signal_type = %row.signal_type,
                "skipping imported signal with unknown type"
            );
            continue;
        };

        let user_id = upsert_user(pool, &row.username, None).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO burnout_tracker.signals
            (id, user_id, signal_type, value, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(row.value)
        .bind(row.recorded_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
