// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use studyflow::{
    create_router,
    config::Config,
    mail::OutboxMailer,
    models::question::Question,
    state::AppState,
    store::{InMemoryStore, QuizStore},
};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub store: InMemoryStore,
    pub mailer: OutboxMailer,
    pub client: reqwest::Client,
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        app_base_url: url::Url::parse("http://localhost:3000").unwrap(),
        magic_link_ttl: 900,
        question_fetch_timeout_ms: 5_000,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

/// Spawn the app on a random port backed by an in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = InMemoryStore::new();
    spawn_with(store.clone(), Arc::new(store), test_config()).await
}

/// Spawn the app with a custom quiz store in front of `store`
/// (e.g. one that stalls). Auth always goes straight to `store`.
pub async fn spawn_with(
    store: InMemoryStore,
    quiz_store: Arc<dyn QuizStore>,
    config: Config,
) -> TestApp {
    let mailer = OutboxMailer::new();

    let state = AppState {
        quiz_store,
        auth_store: Arc::new(store.clone()),
        mailer: Arc::new(mailer.clone()),
        config,
    };

    let app = create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        mailer,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn seed_question(&self, category: &str, correct_index: i64) -> Question {
        let question = Question {
            id: Uuid::new_v4(),
            category: category.to_string(),
            prompt: format!("Question about {}", category),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index,
            is_active: true,
        };
        self.store.insert_question(question.clone()).unwrap();
        question
    }

    /// Request a magic link and return the token the mailer received.
    pub async fn request_link(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/magic-link"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 202);

        let mail = self
            .mailer
            .last_for(&email.to_lowercase())
            .expect("No magic link sent");
        mail.link
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .expect("Link has no token")
    }

    /// Full magic-link sign-in; returns the bearer token.
    pub async fn sign_in(&self, email: &str) -> String {
        let token = self.request_link(email).await;

        let body: serde_json::Value = self
            .client
            .post(self.url("/api/auth/verify"))
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .expect("Verify failed")
            .json()
            .await
            .expect("Failed to parse verify json");

        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn get_items(&self, path: &str) -> Vec<serde_json::Value> {
        let body: serde_json::Value = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse json");
        body["items"].as_array().expect("No items").clone()
    }

    pub fn unique_email() -> String {
        format!("u_{}@example.com", &Uuid::new_v4().to_string()[..8])
    }
}
