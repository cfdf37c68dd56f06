use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionCategory {
    Sleep,
    Focus,
    Mood,
    Energy,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 4] = [
        QuestionCategory::Sleep,
        QuestionCategory::Focus,
        QuestionCategory::Mood,
        QuestionCategory::Energy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Sleep => "Sleep",
            QuestionCategory::Focus => "Focus",
            QuestionCategory::Mood => "Mood",
            QuestionCategory::Energy => "Energy",
        }
    }
}

/// Whether a high answer value indicates high risk (`Negative`) or low risk
/// (`Positive`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Negative,
    Positive,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
    pub category: QuestionCategory,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    AppOpen,
    ResponseDelay,
    LateNightUsage,
    MissedCheckin,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::AppOpen => "app_open",
            SignalKind::ResponseDelay => "response_delay",
            SignalKind::LateNightUsage => "late_night_usage",
            SignalKind::MissedCheckin => "missed_checkin",
        }
    }

    pub fn parse(value: &str) -> Option<SignalKind> {
        match value {
            "app_open" => Some(SignalKind::AppOpen),
            "response_delay" => Some(SignalKind::ResponseDelay),
            "late_night_usage" => Some(SignalKind::LateNightUsage),
            "missed_checkin" => Some(SignalKind::MissedCheckin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub question_id: String,
    pub answer_value: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SignalEvent {
    pub user_id: Uuid,
    pub kind: SignalKind,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<RiskLevel> {
        match value {
            "Low" => Some(RiskLevel::Low),
            "Medium" => Some(RiskLevel::Medium),
            "High" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub insights: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AssessmentSummary {
    pub username: String,
    pub date: NaiveDate,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub insights: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: QuestionCategory,
    pub count: usize,
    pub avg_value: f64,
}

#[derive(Debug, Clone)]
pub struct KindSummary {
    pub kind: SignalKind,
    pub count: usize,
    pub avg_value: f64,
}
