use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Session error: {0}")]
    Session(String),
}

/// Establishes and ends the caller's authenticated session
#[async_trait]
pub trait SessionLogin: Send + Sync {
    async fn login(&self, user_id: &str) -> Result<(), SessionError>;

    async fn logout(&self) -> Result<(), SessionError>;
}
