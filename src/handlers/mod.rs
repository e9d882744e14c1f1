// src/handlers/mod.rs

pub mod auth;
pub mod questions;
pub mod quiz;
pub mod results;
