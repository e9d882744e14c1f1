// src/utils/token.rs

//! Magic-link token format: `<token id>.<secret>`.
//!
//! The ID locates the pending row; only an Argon2 hash of the secret is stored.

use uuid::Uuid;

pub struct MagicToken {
    pub id: Uuid,
    pub secret: String,
}

impl MagicToken {
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4(),
            secret: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Split a client-supplied token. Returns `None` for anything that is
    /// not `<uuid>.<non-empty secret>`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (id, secret) = raw.trim().split_once('.')?;
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::parse_str(id).ok()?,
            secret: secret.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.id, self.secret)
    }
}
