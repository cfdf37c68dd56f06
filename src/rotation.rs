use chrono::{Datelike, NaiveDate};

use crate::models::{Polarity, Question, QuestionCategory};

/// The fixed check-in question pool: two questions per category, one of each
/// polarity. Defined once at compile time and never mutated.
pub static POOL: [Question; 8] = [
    Question {
        id: "s1",
        text: "How refreshed did you feel after waking up?",
        category: QuestionCategory::Sleep,
        polarity: Polarity::Positive,
    },
    Question {
        id: "s2",
        text: "Did you find it hard to get out of bed today?",
        category: QuestionCategory::Sleep,
        polarity: Polarity::Negative,
    },
    Question {
        id: "f1",
        text: "How easy was it to focus on one task today?",
        category: QuestionCategory::Focus,
        polarity: Polarity::Positive,
    },
    Question {
        id: "f2",
        text: "Did you find yourself switching tasks often?",
        category: QuestionCategory::Focus,
        polarity: Polarity::Negative,
    },
    Question {
        id: "m1",
        text: "Did you feel mentally tired before noon today?",
        category: QuestionCategory::Mood,
        polarity: Polarity::Negative,
    },
    Question {
        id: "m2",
        text: "How easy was it to smile at a joke today?",
        category: QuestionCategory::Mood,
        polarity: Polarity::Positive,
    },
    Question {
        id: "e1",
        text: "Did screens feel exhausting today?",
        category: QuestionCategory::Energy,
        polarity: Polarity::Negative,
    },
    Question {
        id: "e2",
        text: "Do you feel like doing a hobby this evening?",
        category: QuestionCategory::Energy,
        polarity: Polarity::Positive,
    },
];

/// Pick the two check-in questions for a calendar date.
///
/// Deterministic in the date alone: every user sees the same pair on the same
/// day, and consecutive days walk the pool so all eight questions appear over
/// any eight-day stretch. The second index is offset by half the pool to land
/// in a different category.
pub fn select_questions(today: NaiveDate) -> (&'static Question, &'static Question) {
    let len = POOL.len() as i64;
    let ordinal = i64::from(today.num_days_from_ce());

    let idx1 = ordinal.rem_euclid(len) as usize;
    let mut idx2 = (ordinal + len / 2).rem_euclid(len) as usize;
    if idx2 == idx1 {
        // unreachable while the pool size stays even, but a resized pool must
        // still yield two distinct questions
        idx2 = (idx1 + 1) % POOL.len();
    }

    (&POOL[idx1], &POOL[idx2])
}

pub fn find_question(id: &str) -> Option<&'static Question> {
    POOL.iter().find(|question| question.id == id)
}

/// Pool shape check, run once at process start so a degenerate configuration
/// fails fast instead of at request time.
pub fn verify_pool() -> anyhow::Result<()> {
    let mut seen = std::collections::HashSet::new();
    for question in &POOL {
        anyhow::ensure!(
            seen.insert(question.id),
            "duplicate question id in pool: {}",
            question.id
        );
    }
    anyhow::ensure!(
        POOL.len() % 2 == 0,
        "question pool must hold an even number of questions, found {}",
        POOL.len()
    );

    for category in QuestionCategory::ALL {
        let total = POOL.iter().filter(|q| q.category == category).count();
        anyhow::ensure!(
            total == 2,
            "expected 2 {} questions in the pool, found {total}",
            category.as_str()
        );
        let negative = POOL
            .iter()
            .filter(|q| q.category == category && q.polarity == Polarity::Negative)
            .count();
        anyhow::ensure!(
            negative == 1,
            "expected one negative-polarity {} question, found {negative}",
            category.as_str()
        );
    }

    Ok(())
}
