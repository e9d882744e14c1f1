// src/quiz/validation.rs

use serde::Serialize;

/// Classification of a submitted option index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Always `false` when `is_valid` is `false`.
    pub is_correct: bool,
}

/// Decides whether `chosen_index` addresses one of `options_count` options
/// and, if so, whether it is the correct one.
///
/// Never fails: any combination of integers is classified.
/// The upper bound is exclusive, and an empty option list makes every
/// choice invalid.
pub fn validate_answer(correct_index: i64, chosen_index: i64, options_count: i64) -> ValidationResult {
    let is_valid = chosen_index >= 0 && options_count > 0 && chosen_index < options_count;

    if !is_valid {
        return ValidationResult {
            is_valid: false,
            is_correct: false,
        };
    }

    ValidationResult {
        is_valid: true,
        is_correct: chosen_index == correct_index,
    }
}
