//! Private-key entry capability.
//!
//! The workflow suspends on a `KeyPrompt` when the credential carries no private
//! key. Returning `None` (or an empty answer) cancels the submission.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Interactive source of a private key.
#[async_trait]
pub trait KeyPrompt: Send + Sync {
    /// Ask the user for the private key belonging to `public_key`.
    async fn request_private_key(&self, public_key: &str) -> Option<String>;
}

/// Always answers with the same value; `None` behaves like a user cancelling.
#[derive(Debug, Clone, Default)]
pub struct CannedPrompt {
    answer: Option<String>,
}

impl CannedPrompt {
    pub fn answering(private_key: impl Into<String>) -> Self {
        Self {
            answer: Some(private_key.into()),
        }
    }

    pub fn declining() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl KeyPrompt for CannedPrompt {
    async fn request_private_key(&self, _public_key: &str) -> Option<String> {
        self.answer.clone()
    }
}

/// Reads the key from standard input. EOF or a blank line cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

#[async_trait]
impl KeyPrompt for StdinPrompt {
    async fn request_private_key(&self, public_key: &str) -> Option<String> {
        let mut stderr = tokio::io::stderr();
        let question = format!(
            "Enter private key for {} (blank to cancel): ",
            crate::ride::types::mask_key(public_key)
        );
        stderr.write_all(question.as_bytes()).await.ok()?;
        stderr.flush().await.ok()?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .ok()?;
        if read == 0 {
            return None;
        }
        let key = line.trim();
        (!key.is_empty()).then(|| key.to_string())
    }
}
