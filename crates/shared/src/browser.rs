use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FailureReason;
use crate::models::StrategyId;
use crate::scratch::ScratchFactory;
use crate::strategy::Strategy;

const STEALTH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Let client-rendered pages finish their post-load fetches.
const SETTLE_DELAY_MS: u64 = 1500;

/// Two render configurations: a plain `article` query, and a stealth
/// variant with a real-browser user agent and broader selectors for
/// sites that block obvious automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderVariant {
    Plain,
    Stealth,
}

/// Headless-browser extraction, the most expensive article strategy:
/// spawns a Chromium process per attempt and tears it down on every
/// exit path.
pub struct BrowserRender {
    variant: RenderVariant,
}

impl BrowserRender {
    pub fn plain() -> Self {
        Self {
            variant: RenderVariant::Plain,
        }
    }

    pub fn stealth() -> Self {
        Self {
            variant: RenderVariant::Stealth,
        }
    }

    fn container_query(&self) -> &'static str {
        match self.variant {
            RenderVariant::Plain => "article",
            RenderVariant::Stealth => "article, div.post-content, section.blog-body, main",
        }
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<String, FailureReason> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|_| FailureReason::RenderTimeout)?;

        tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;

        let script = format!(
            "(() => {{ const el = document.querySelector({:?}); return el ? el.innerText : ''; }})()",
            self.container_query()
        );

        let text: String = page
            .evaluate(script)
            .await
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?
            .into_value()
            .map_err(|e| FailureReason::ServiceError(e.to_string()))?;

        let _ = page.close().await;

        if text.trim().is_empty() {
            return Err(FailureReason::NoContentFound);
        }

        Ok(text)
    }
}

#[async_trait]
impl Strategy for BrowserRender {
    fn id(&self) -> StrategyId {
        match self.variant {
            RenderVariant::Plain => StrategyId::BrowserRenderA,
            RenderVariant::Stealth => StrategyId::BrowserRenderB,
        }
    }

    async fn run(&self, url: &str, _scratch: &ScratchFactory) -> Result<String, FailureReason> {
        let chrome_path = find_chromium().ok_or_else(|| {
            FailureReason::ServiceError(
                "Chromium not found; set CHROMIUM_PATH or install google-chrome".to_string(),
            )
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");

        if self.variant == RenderVariant::Stealth {
            builder = builder.arg(format!("--user-agent={}", STEALTH_USER_AGENT));
        }

        let config = builder
            .build()
            .map_err(|e| FailureReason::ServiceError(format!("browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FailureReason::ServiceError(format!("browser launch: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let outcome = self.render(&browser, url).await;

        // Teardown happens whether the render succeeded or not.
        let _ = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();

        outcome
    }
}

/// Find the Chromium binary: env override first, then common installs.
fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/opt/homebrew/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    ];
    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}
