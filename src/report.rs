use std::collections::HashMap;
use std::fmt::Write;

use chrono::{Duration, NaiveDate, Utc};
use tracing::warn;

use crate::models::{
    AnswerRecord, AssessmentSummary, CategorySummary, KindSummary, QuestionCategory, SignalEvent,
    SignalKind,
};
use crate::rotation;

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

pub fn summarize_answers(answers: &[AnswerRecord]) -> Vec<CategorySummary> {
    let mut map: HashMap<QuestionCategory, (usize, i64)> = HashMap::new();

    for answer in answers {
        let Some(question) = rotation::find_question(&answer.question_id) else {
            warn!(question_id = %answer.question_id, "skipping answer for unknown question");
            continue;
        };
        let entry = map.entry(question.category).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += i64::from(answer.answer_value);
    }

    let mut summaries: Vec<CategorySummary> = map
        .into_iter()
        .map(|(category, (count, total))| CategorySummary {
            category,
            count,
            avg_value: if count == 0 {
                0.0
            } else {
                total as f64 / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn summarize_signals(signals: &[SignalEvent]) -> Vec<KindSummary> {
    let mut map: HashMap<SignalKind, (usize, f64)> = HashMap::new();

    for signal in signals {
        let entry = map.entry(signal.kind).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += signal.value;
    }

    let mut summaries: Vec<KindSummary> = map
        .into_iter()
        .map(|(kind, (count, total))| KindSummary {
            kind,
            count,
            avg_value: if count == 0 { 0.0 } else { total / count as f64 },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(
    scope: Option<&str>,
    since_days: i64,
    cutoff: NaiveDate,
    answers: &[AnswerRecord],
    signals: &[SignalEvent],
    assessments: &[AssessmentSummary],
) -> String {
    let answer_mix = summarize_answers(answers);
    let signal_mix = summarize_signals(signals);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all users");

    let _ = writeln!(output, "# Burnout Early-Warning Report");
    let _ = writeln!(
        output,
        "Generated for {} over the last {} days (records since {})",
        scope_label, since_days, cutoff
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Check-In Mix");

    if answer_mix.is_empty() {
        let _ = writeln!(output, "No answers recorded for this window.");
    } else {
        for summary in answer_mix.iter() {
            let _ = writeln!(
                output,
                "- {}: {} answers (avg value {:.1})",
                summary.category.as_str(),
                summary.count,
                summary.avg_value
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Signal Mix");

    if signal_mix.is_empty() {
        let _ = writeln!(output, "No signals recorded for this window.");
    } else {
        for summary in signal_mix.iter() {
            let _ = writeln!(
                output,
                "- {}: {} events (avg value {:.1})",
                summary.kind.as_str(),
                summary.count,
                summary.avg_value
            );
        }
    }

    let mut ranked = assessments.to_vec();
    ranked.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Risk Assessments");

    if ranked.is_empty() {
        let _ = writeln!(output, "No assessments computed for this window.");
    } else {
        for assessment in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} score {:.1} ({}) on {}: {}",
                assessment.username,
                assessment.risk_score,
                assessment.risk_level.as_str(),
                assessment.date,
                assessment.insights.join(" ")
            );
        }
    }

    output
}
