// src/models/mod.rs

pub mod answer;
pub mod profile;
pub mod question;
pub mod session;
