// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    mail::Mailer,
    store::{AuthStore, QuizStore},
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_store: Arc<dyn QuizStore>,
    pub auth_store: Arc<dyn AuthStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn QuizStore> {
    fn from_ref(state: &AppState) -> Self {
        state.quiz_store.clone()
    }
}

impl FromRef<AppState> for Arc<dyn AuthStore> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
