// src/quiz/mod.rs

//! Quiz core: answer validation, session progression and result scoring.

pub mod error;
pub mod progression;
pub mod scoring;
pub mod validation;

pub use error::QuizError;
pub use progression::{SubmitAnswer, submit_answer};
pub use validation::{ValidationResult, validate_answer};
