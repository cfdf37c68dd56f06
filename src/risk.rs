use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::models::{AnswerRecord, Polarity, RiskAssessment, RiskLevel, SignalEvent, SignalKind};
use crate::rotation;

/// Trailing lookback in calendar days, ending at the assessment date.
pub const WINDOW_DAYS: i64 = 7;

const BEHAVIOR_PENALTY_CAP: f64 = 5.0;
const SLOW_RESPONSE_SECS: f64 = 10.0;
const NO_DATA_INSIGHT: &str = "Not enough data yet. Keep using the app!";

pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn window_start(today: NaiveDate) -> DateTime<Utc> {
    day_start(today - Duration::days(WINDOW_DAYS - 1))
}

/// Aggregate one user's recent answers and signals into a risk assessment.
///
/// Pure over its inputs apart from stamping `computed_at`; persisting the
/// result is the caller's job. Records outside the 7-day window ending at
/// `today` are ignored (compared by timestamp, not by the `date` field), so
/// callers may pass pre-filtered or raw history interchangeably. Malformed
/// answers are skipped, never fatal.
pub fn assess(
    user_id: Uuid,
    today: NaiveDate,
    answers: &[AnswerRecord],
    signals: &[SignalEvent],
) -> RiskAssessment {
    let start = window_start(today);
    let end = day_start(today + Duration::days(1));

    let answers: Vec<&AnswerRecord> = answers
        .iter()
        .filter(|record| record.recorded_at >= start && record.recorded_at < end)
        .collect();
    let signals: Vec<&SignalEvent> = signals
        .iter()
        .filter(|event| event.recorded_at >= start && event.recorded_at < end)
        .collect();

    if answers.is_empty() && signals.is_empty() {
        return RiskAssessment {
            user_id,
            date: today,
            risk_level: RiskLevel::Low,
            risk_score: 0.0,
            insights: vec![NO_DATA_INSIGHT.to_string()],
            computed_at: Utc::now(),
        };
    }

    let avg_input_risk = average_input_risk(&answers);
    let behavior_penalty = behavior_penalty(&signals);

    // avg_input_risk of 0 means no usable self-reports, not minimum risk
    let base = if avg_input_risk == 0.0 {
        0.0
    } else {
        ((avg_input_risk - 1.0) / 4.0) * 100.0
    };
    let risk_score = (base + behavior_penalty * 10.0).clamp(0.0, 100.0);

    let (risk_level, lead) = if risk_score > 75.0 {
        (RiskLevel::High, "High mental fatigue detected.")
    } else if risk_score > 40.0 {
        (RiskLevel::Medium, "Early signs of stress detected.")
    } else {
        (RiskLevel::Low, "Your mental energy seems stable.")
    };

    let mut insights = vec![lead.to_string()];
    if behavior_penalty > 2.0 {
        insights.push("Late night activity is impacting your score.".to_string());
    }

    RiskAssessment {
        user_id,
        date: today,
        risk_level,
        risk_score,
        insights,
        computed_at: Utc::now(),
    }
}

// Folds every answer onto a single direction: 1 = low risk, 5 = high risk
// regardless of question polarity. Returns 0 when no answer qualifies.
fn average_input_risk(answers: &[&AnswerRecord]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;

    for answer in answers {
        if !(1..=5).contains(&answer.answer_value) {
            warn!(
                question_id = %answer.question_id,
                value = answer.answer_value,
                "skipping answer with out-of-range value"
            );
            continue;
        }
        let Some(question) = rotation::find_question(&answer.question_id) else {
            warn!(question_id = %answer.question_id, "skipping answer for unknown question");
            continue;
        };

        let contribution = match question.polarity {
            Polarity::Negative => f64::from(answer.answer_value),
            Polarity::Positive => f64::from(6 - answer.answer_value),
        };
        sum += contribution;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

// Late-night usage counts once per event; a response delay counts only past
// the slow threshold. Other kinds carry no weight in this version.
fn behavior_penalty(signals: &[&SignalEvent]) -> f64 {
    let mut score: f64 = 0.0;
    for signal in signals {
        match signal.kind {
            SignalKind::LateNightUsage => score += 1.0,
            SignalKind::ResponseDelay if signal.value > SLOW_RESPONSE_SECS => score += 0.5,
            _ => {}
        }
    }
    score.min(BEHAVIOR_PENALTY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn noon(date: NaiveDate) -> DateTime<Utc> {
        day_start(date) + Duration::hours(12)
    }

    fn answer(question_id: &str, value: i32, days_ago: i64) -> AnswerRecord {
        let date = today() - Duration::days(days_ago);
        AnswerRecord {
            user_id: Uuid::nil(),
            date,
            question_id: question_id.to_string(),
            answer_value: value,
            recorded_at: noon(date),
        }
    }

    fn signal(kind: SignalKind, value: f64, days_ago: i64) -> SignalEvent {
        SignalEvent {
            user_id: Uuid::nil(),
            kind,
            value,
            recorded_at: noon(today() - Duration::days(days_ago)),
        }
    }

    #[test]
    fn empty_inputs_return_the_low_floor() {
        let result = assess(Uuid::nil(), today(), &[], &[]);
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.insights, vec![NO_DATA_INSIGHT.to_string()]);
    }

    #[test]
    fn worst_positive_answer_maxes_the_score() {
        // s1 is positive-polarity, so a value of 1 contributes 6 - 1 = 5
        let answers = vec![answer("s1", 1, 0)];
        let result = assess(Uuid::nil(), today(), &answers, &[]);
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.insights[0], "High mental fatigue detected.");
    }

    #[test]
    fn best_negative_answer_floors_the_score() {
        let answers = vec![answer("s2", 1, 0)];
        let result = assess(Uuid::nil(), today(), &answers, &[]);
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.insights[0], "Your mental energy seems stable.");
    }

    #[test]
    fn late_night_signals_alone_score_thirty() {
        let signals = vec![
            signal(SignalKind::LateNightUsage, 1.0, 0),
            signal(SignalKind::LateNightUsage, 1.0, 1),
            signal(SignalKind::LateNightUsage, 1.0, 2),
        ];
        let result = assess(Uuid::nil(), today(), &[], &signals);
        assert!((result.risk_score - 30.0).abs() < 0.001);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result
            .insights
            .contains(&"Late night activity is impacting your score.".to_string()));
    }

    #[test]
    fn behavior_penalty_is_capped_at_five() {
        let signals: Vec<SignalEvent> = (0..9)
            .map(|i| signal(SignalKind::LateNightUsage, 1.0, i % 7))
            .collect();
        let result = assess(Uuid::nil(), today(), &[], &signals);
        assert!((result.risk_score - 50.0).abs() < 0.001);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn slow_responses_only_count_past_the_threshold() {
        let signals = vec![
            signal(SignalKind::ResponseDelay, 10.0, 0),
            signal(SignalKind::ResponseDelay, 4.2, 1),
        ];
        let result = assess(Uuid::nil(), today(), &[], &signals);
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn neutral_signal_kinds_carry_no_weight() {
        let signals = vec![
            signal(SignalKind::AppOpen, 1.0, 0),
            signal(SignalKind::MissedCheckin, 1.0, 1),
        ];
        let result = assess(Uuid::nil(), today(), &[], &signals);
        assert_eq!(result.risk_score, 0.0);
    }

    #[test]
    fn window_keeps_day_six_and_drops_day_seven() {
        let inside = vec![answer("s2", 5, 6)];
        let result = assess(Uuid::nil(), today(), &inside, &[]);
        assert_eq!(result.risk_score, 100.0);

        let outside = vec![answer("s2", 5, 7)];
        let result = assess(Uuid::nil(), today(), &outside, &[]);
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.insights, vec![NO_DATA_INSIGHT.to_string()]);
    }

    #[test]
    fn future_records_are_ignored() {
        let answers = vec![answer("s2", 5, -1)];
        let result = assess(Uuid::nil(), today(), &answers, &[]);
        assert_eq!(result.insights, vec![NO_DATA_INSIGHT.to_string()]);
    }

    #[test]
    fn malformed_answers_are_skipped_not_fatal() {
        let answers = vec![
            answer("s1", 9, 0),
            answer("zz", 3, 0),
            answer("s2", 3, 0),
        ];
        let result = assess(Uuid::nil(), today(), &answers, &[]);
        // only the valid s2 answer counts: avg 3 -> base 50
        assert!((result.risk_score - 50.0).abs() < 0.001);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.insights[0], "Early signs of stress detected.");
    }

    #[test]
    fn only_malformed_answers_fall_back_to_no_self_report_signal() {
        let answers = vec![answer("zz", 3, 0)];
        let signals = vec![signal(SignalKind::LateNightUsage, 1.0, 0)];
        let result = assess(Uuid::nil(), today(), &answers, &signals);
        // base stays 0, penalty 1 -> 10 points
        assert!((result.risk_score - 10.0).abs() < 0.001);
    }

    #[test]
    fn score_forty_is_still_low() {
        let signals: Vec<SignalEvent> = (0..4)
            .map(|i| signal(SignalKind::LateNightUsage, 1.0, i))
            .collect();
        let result = assess(Uuid::nil(), today(), &[], &signals);
        assert!((result.risk_score - 40.0).abs() < 0.001);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn score_seventy_five_is_still_medium() {
        let answers = vec![answer("s2", 3, 0)];
        let signals: Vec<SignalEvent> = (0..5)
            .map(|i| signal(SignalKind::ResponseDelay, 15.0, i))
            .collect();
        let result = assess(Uuid::nil(), today(), &answers, &signals);
        assert!((result.risk_score - 75.0).abs() < 0.001);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        // the penalty crossed 2, so the behavior insight rides along
        assert_eq!(result.insights.len(), 2);
    }

    #[test]
    fn score_never_exceeds_one_hundred() {
        let answers = vec![answer("s2", 5, 0), answer("m1", 5, 1)];
        let signals: Vec<SignalEvent> = (0..6)
            .map(|i| signal(SignalKind::LateNightUsage, 1.0, i))
            .collect();
        let result = assess(Uuid::nil(), today(), &answers, &signals);
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn raising_a_negative_answer_never_lowers_the_score() {
        let low = assess(Uuid::nil(), today(), &[answer("f2", 2, 0)], &[]);
        let high = assess(Uuid::nil(), today(), &[answer("f2", 5, 0)], &[]);
        assert!(high.risk_score >= low.risk_score);
    }

    #[test]
    fn lowering_a_positive_answer_never_lowers_the_score() {
        let low = assess(Uuid::nil(), today(), &[answer("f1", 4, 0)], &[]);
        let high = assess(Uuid::nil(), today(), &[answer("f1", 1, 0)], &[]);
        assert!(high.risk_score >= low.risk_score);
    }

    #[test]
    fn assessment_carries_user_and_date() {
        let user = Uuid::new_v4();
        let result = assess(user, today(), &[answer("s2", 2, 0)], &[]);
        assert_eq!(result.user_id, user);
        assert_eq!(result.date, today());
    }
}
