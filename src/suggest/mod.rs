//! Reference-code suggestions from extracted page text
//!
//! This is advisory only. [`TextSuggestionAdapter::suggest`] never fails:
//! any client error is logged and reported as "no suggestion" (an empty
//! string), so it can never block stamping.
//!
//! The client is passed in by the host rather than created globally, which
//! also lets tests substitute their own [`SuggestionClient`].

pub mod gemini;
pub mod prompt;

use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, warn};
use crate::config::StampConfig;
use crate::error::Result;
use self::prompt::{reference_code_prompt, truncate_chars};

pub use gemini::{GeminiClient, GeminiConfig};

/// A text-completion backend
#[async_trait]
pub trait SuggestionClient: Send + Sync {
    /// Send `prompt` and return the model's raw text answer
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Turns page text into a suggested reference code
#[derive(Clone)]
pub struct TextSuggestionAdapter {
    client: Arc<dyn SuggestionClient>,
    char_limit: usize,
    min_chars: usize,
}

impl TextSuggestionAdapter {
    /// Create an adapter using the limits from `config`
    pub fn new(client: Arc<dyn SuggestionClient>, config: &StampConfig) -> Self {
        Self {
            client,
            char_limit: config.suggestion_char_limit,
            min_chars: config.suggestion_min_chars,
        }
    }

    /// Suggest a reference code for `page_text`, or return "" if there is none.
    ///
    /// Only the first `suggestion_char_limit` characters are sent. Text
    /// shorter than `suggestion_min_chars` is not sent at all.
    pub async fn suggest(&self, page_text: &str) -> String {
        if page_text.chars().count() < self.min_chars {
            debug!("Page text too short for a suggestion");
            return String::new();
        }

        let prompt = reference_code_prompt(truncate_chars(page_text, self.char_limit));

        match self.client.complete(&prompt).await {
            Ok(answer) => {
                let suggestion = answer.trim().to_string();
                debug!("Suggestion: {:?}", suggestion);
                suggestion
            }
            Err(e) => {
                warn!("Suggestion request failed: {}", e);
                String::new()
            }
        }
    }
}
