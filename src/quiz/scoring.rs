// src/quiz/scoring.rs

use crate::models::{
    answer::{AnswerDetail, AnswerReview},
    session::{QuizSession, ResultSummary, SessionDetailResponse, SessionStatus, SessionSummary},
};

const OPTION_LABELS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];
const PROMPT_PREVIEW_CHARS: usize = 120;

/// Share of correct answers as a whole percentage. An empty session scores 0.
pub fn score_percentage(correct: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let ratio = correct.clamp(0, total) as f64 / total as f64;
    (ratio * 100.0).round() as u32
}

/// Formats an option as `"<letter> - <text>"`, or `None` for a negative index.
pub fn option_label(options: &[String], index: i64) -> Option<String> {
    let index = usize::try_from(index).ok()?;
    let letter = OPTION_LABELS.get(index).copied().unwrap_or("?");
    let text = options.get(index).map(String::as_str).unwrap_or("Not recorded");
    Some(format!("{} - {}", letter, text))
}

/// Shortens long prompts for table display.
pub fn preview_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_PREVIEW_CHARS {
        return prompt.to_string();
    }
    let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS - 3).collect();
    format!("{}...", head)
}

pub fn summarize(summary: SessionSummary) -> ResultSummary {
    ResultSummary {
        id: summary.id,
        category: summary.category,
        started_at: summary.started_at,
        completed_at: summary.completed_at,
        status: SessionStatus::of(summary.completed_at),
        total: summary.answered,
        correct: summary.correct,
        percentage: score_percentage(summary.correct, summary.answered),
    }
}

pub fn review(session: QuizSession, details: Vec<AnswerDetail>) -> SessionDetailResponse {
    let total = details.len() as i64;
    let correct = details.iter().filter(|d| d.is_correct).count() as i64;

    let answers = details
        .into_iter()
        .enumerate()
        .map(|(i, d)| AnswerReview {
            id: d.id,
            question_number: i + 1,
            chosen_label: option_label(&d.options, d.chosen_index)
                .unwrap_or_else(|| "Not answered".to_string()),
            correct_label: option_label(&d.options, d.correct_index)
                .unwrap_or_else(|| "Not available".to_string()),
            prompt: preview_prompt(&d.prompt),
            category: d.category,
            chosen_index: d.chosen_index,
            correct_index: d.correct_index,
            is_correct: d.is_correct,
            answered_at: d.answered_at,
        })
        .collect();

    SessionDetailResponse {
        id: session.id,
        category: session.category,
        started_at: session.started_at,
        completed_at: session.completed_at,
        status: SessionStatus::of(session.completed_at),
        total,
        correct,
        percentage: score_percentage(correct, total),
        answers,
    }
}
