use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;
use crate::error::FailureReason;
use crate::models::StrategyId;
use crate::scratch::ScratchFactory;
use crate::strategy::Strategy;

/// Fallback of last resort for videos: download the audio track with
/// yt-dlp into a scoped temp file, then send it to the
/// speech-recognition provider.
pub struct AudioTranscribe {
    client: Client,
    api_key: String,
    base_url: String,
    ytdlp_path: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl AudioTranscribe {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.speech_api_key.clone(),
            base_url: config.generation_base_url.clone(),
            ytdlp_path: find_ytdlp(),
        })
    }

    async fn download_audio(&self, url: &str, dest: &Path) -> Result<(), FailureReason> {
        let output = Command::new(&self.ytdlp_path)
            .args([
                "-x",
                "--audio-format",
                "mp3",
                "--no-playlist",
                "--no-warnings",
                "--quiet",
                "-o",
            ])
            .arg(dest)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out attempt drops this future; the child must die
            // with it, or it would finish the download into a path whose
            // scoped guard is already gone.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                FailureReason::DownloadFailed(format!("failed to start {}: {}", self.ytdlp_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FailureReason::DownloadFailed(truncate(stderr.trim(), 300)));
        }

        let len = tokio::fs::metadata(dest)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if len == 0 {
            return Err(FailureReason::DownloadFailed(
                "downloader wrote no audio data".to_string(),
            ));
        }

        Ok(())
    }

    async fn transcribe_file(&self, path: &Path) -> Result<String, FailureReason> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FailureReason::ResourceError(format!("{}: {}", path.display(), e)))?;

        let part = Part::bytes(bytes)
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;
        let form = Form::new().part("file", part).text("model", "whisper-1");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(FailureReason::ServiceError(format!(
                "speech provider returned {}: {}",
                status,
                truncate(&body, 300)
            )));
        }

        let parsed = response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        if parsed.text.trim().is_empty() {
            return Err(FailureReason::ServiceError(
                "speech provider returned an empty transcript".to_string(),
            ));
        }

        Ok(parsed.text)
    }
}

#[async_trait]
impl Strategy for AudioTranscribe {
    fn id(&self) -> StrategyId {
        StrategyId::AudioTranscribe
    }

    async fn run(&self, url: &str, scratch: &ScratchFactory) -> Result<String, FailureReason> {
        let mut audio = scratch.acquire("mp3")?;

        let result = match self.download_audio(url, audio.path()).await {
            Ok(()) => self.transcribe_file(audio.path()).await,
            Err(e) => Err(e),
        };

        // The Drop impl would catch this too, but release explicitly so
        // the file is gone before control returns to the orchestrator.
        audio.release();

        result
    }
}

/// Find the yt-dlp binary in the usual install locations.
fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return path.to_string();
        }
    }

    // Fall back to PATH lookup at spawn time
    "yt-dlp".to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
