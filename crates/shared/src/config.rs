use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 45;

#[derive(Debug, Clone)]
pub struct Config {
    pub generation_api_key: String,
    pub generation_base_url: String,
    pub generation_model: String,
    pub generation_fallback_model: String,
    /// Key for the managed scraping provider; without it the
    /// scrape-service strategy fails and the chain moves on.
    pub scrape_api_key: Option<String>,
    /// Key for the speech-recognition provider. Defaults to the
    /// generation key (same account on OpenAI-compatible providers).
    pub speech_api_key: String,
    pub attempt_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let generation_api_key = env::var("GENERATION_API_KEY").context(
            "GENERATION_API_KEY not found.\n\n\
            To fix this, create ~/.config/generate-post/.env with:\n  \
            GENERATION_API_KEY=your_key_here\n\n\
            Optionally add SCRAPINGBEE_API_KEY and SPEECH_API_KEY for the\n\
            scrape-service and audio-transcribe strategies.",
        )?;

        let generation_base_url = env::var("GENERATION_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let generation_model =
            env::var("GENERATION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let generation_fallback_model =
            env::var("GENERATION_FALLBACK_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let scrape_api_key = env::var("SCRAPINGBEE_API_KEY").ok();
        let speech_api_key =
            env::var("SPEECH_API_KEY").unwrap_or_else(|_| generation_api_key.clone());

        let attempt_timeout_secs = match env::var("ATTEMPT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("ATTEMPT_TIMEOUT_SECS is not a number: {}", raw))?,
            Err(_) => DEFAULT_ATTEMPT_TIMEOUT_SECS,
        };

        Ok(Self {
            generation_api_key,
            generation_base_url,
            generation_model,
            generation_fallback_model,
            scrape_api_key,
            speech_api_key,
            attempt_timeout_secs,
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/generate-post/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("generate-post").join(".env");
            if config_path.exists() {
                if dotenvy::from_path(&config_path).is_ok() {
                    return;
                }
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                if dotenvy::from_path(&home_path).is_ok() {
                    return;
                }
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}
