use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::PipelineError;

const SYSTEM_PROMPT: &str =
    "You are an AI assistant that turns source content into a viral LinkedIn post.";

const DETAILED_PROMPT: &str = "\
Summarize the key points of the provided content clearly and concisely.
After the summary, create a compelling LinkedIn post that highlights the main insights and \
encourages engagement, using a professional tone suitable for a business audience. Make sure \
the post is relatable, informative, and has a call to action to foster discussion.

## Notes
- Keep the tone professional yet engaging.
- The post should have a good hook for attracting readers.
- The summary should not exceed 5 sentences.
- The LinkedIn post should be concise but comprehensive enough to provoke interest and discussion.
- End the post with a short line of relevant hashtags.";

// Keep prompts inside provider context limits, respecting UTF-8 boundaries.
const MAX_CONTENT_LEN: usize = 12_000;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

/// Raw output of one generation call, before hashtag splitting.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub model: String,
    pub duration_ms: u64,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Sends normalized text to the generation provider, falling back to a
/// second model before giving up. Stateless from the caller's side.
pub struct Generator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    fallback_model: String,
    semaphore: Arc<Semaphore>,
}

impl Generator {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        // Keep concurrent generation requests low to avoid rate limits
        let semaphore = Arc::new(Semaphore::new(2));

        Ok(Self {
            client,
            api_key: config.generation_api_key.clone(),
            base_url: config.generation_base_url.clone(),
            model: config.generation_model.clone(),
            fallback_model: config.generation_fallback_model.clone(),
            semaphore,
        })
    }

    pub async fn generate(&self, content: &str) -> Result<Generation, PipelineError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| PipelineError::GenerationFailed(e.to_string()))?;

        match self.try_generate(content, &self.model).await {
            Ok(generation) => Ok(generation),
            Err(primary_err) => {
                eprintln!(
                    "⚠ Generation with {} failed ({}); falling back to {}",
                    self.model, primary_err, self.fallback_model
                );
                self.try_generate(content, &self.fallback_model)
                    .await
                    .map_err(|fallback_err| {
                        PipelineError::GenerationFailed(format!(
                            "{}: {}; {}: {}",
                            self.model, primary_err, self.fallback_model, fallback_err
                        ))
                    })
            }
        }
    }

    async fn try_generate(&self, content: &str, model: &str) -> Result<Generation> {
        let truncated = truncate_utf8(content, MAX_CONTENT_LEN);

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!("{}\n\nContent:\n{}", DETAILED_PROMPT, truncated),
                },
            ],
            temperature: 0.7,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to generation provider")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("generation provider returned {}: {}", status, error_text);
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse generation provider response")?;

        let text = first_message(&parsed)
            .context("generation response contained no message content")?;

        let (prompt_tokens, completion_tokens) = parsed
            .usage
            .as_ref()
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((None, None));

        Ok(Generation {
            text,
            model: model.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            prompt_tokens,
            completion_tokens,
        })
    }
}

/// First non-empty message in the response, the only thing we accept
/// as a valid generation.
fn first_message(response: &ChatResponse) -> Option<String> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn truncate_utf8(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut end = max;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_rejects_empty_and_missing_content() {
        let empty: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert_eq!(first_message(&empty), None);

        let missing: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert_eq!(first_message(&missing), None);

        let none: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_message(&none), None);
    }

    #[test]
    fn first_message_returns_trimmed_content_with_usage() {
        let response: ChatResponse = serde_json::from_str(
            r#"{
                "choices": [{"message": {"content": "  A strong post.  "}}],
                "usage": {"prompt_tokens": 120, "completion_tokens": 80}
            }"#,
        )
        .unwrap();

        assert_eq!(first_message(&response).as_deref(), Some("A strong post."));
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, Some(120));
        assert_eq!(usage.completion_tokens, Some(80));
    }

    #[test]
    fn truncation_respects_utf8_boundaries() {
        let content = "é".repeat(10_000); // 20k bytes
        let cut = truncate_utf8(&content, MAX_CONTENT_LEN);
        assert!(cut.len() <= MAX_CONTENT_LEN);
        assert!(cut.chars().all(|c| c == 'é'));

        let short = "short";
        assert_eq!(truncate_utf8(short, MAX_CONTENT_LEN), short);
    }
}
