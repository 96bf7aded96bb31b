//! Browser session lifecycle built on Playwright.
//!
//! A session owns the driver handle, browser, context, and page for the whole
//! request. The step runner and interpreter borrow it; only the orchestrator
//! closes it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use playwright::api::{Browser, BrowserContext, Cookie, DocumentLoadState, Page, ScreenshotType};
use playwright::Playwright;
use tracing::{info, warn};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::{BrowserEngine, OtpSeed, StorageKind};

/// A launched browser with its context and page.
pub struct BrowserSession {
    #[allow(dead_code)]
    playwright: Playwright,
    browser: Browser,
    #[allow(dead_code)]
    context: BrowserContext,
    page: Page,
    network_idle_wait: bool,
}

impl BrowserSession {
    /// Launch a browser by engine name and open a fresh context and page.
    pub async fn launch(
        engine: BrowserEngine,
        headless: bool,
        network_idle_wait: bool,
    ) -> AppResult<Self> {
        let playwright = Playwright::initialize()
            .await
            .map_err(|e| AppError::Driver(format!("Failed to initialize Playwright: {e:?}")))?;
        playwright
            .prepare()
            .map_err(|e| AppError::Driver(format!("Failed to prepare browser binaries: {e:?}")))?;

        let browser_type = match engine {
            BrowserEngine::Chromium => playwright.chromium(),
            BrowserEngine::Firefox => playwright.firefox(),
            BrowserEngine::Webkit => playwright.webkit(),
        };

        let browser = browser_type
            .launcher()
            .headless(headless)
            .launch()
            .await
            .map_err(|e| {
                AppError::Driver(format!("Failed to launch {}: {e:?}", engine.as_str()))
            })?;

        let context = browser
            .context_builder()
            .build()
            .await
            .map_err(AppError::browser)?;
        let page = context.new_page().await.map_err(AppError::browser)?;

        info!(engine = engine.as_str(), headless, "Browser session started");

        Ok(BrowserSession {
            playwright,
            browser,
            context,
            page,
            network_idle_wait,
        })
    }

    /// The page owned by this session.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Whether the per-action network-idle hook is enabled.
    pub fn network_idle_wait(&self) -> bool {
        self.network_idle_wait
    }

    /// Navigate the page and wait for the network to go idle.
    pub async fn goto(&self, url: &str) -> AppResult<()> {
        self.page
            .goto_builder(url)
            .wait_until(DocumentLoadState::NetworkIdle)
            .goto()
            .await
            .map_err(|e| AppError::Browser(format!("Navigation to {url} failed: {e:?}")))?;
        Ok(())
    }

    /// Capture a viewport PNG screenshot as a base64 data URL.
    pub async fn screenshot_data_url(&self) -> AppResult<String> {
        let bytes = self
            .page
            .screenshot_builder()
            .r#type(ScreenshotType::Png)
            .screenshot()
            .await
            .map_err(AppError::browser)?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
    }

    /// Seed auth state onto the active page before any test case runs.
    pub async fn seed_storage(&self, seed: &OtpSeed) -> AppResult<()> {
        let entries = seed.entries()?;
        if entries.is_empty() {
            return Ok(());
        }

        match seed.storage_type {
            StorageKind::LocalStorage => {
                for (key, value) in &entries {
                    let _: () = self
                        .page
                        .evaluate(
                            "([key, value]) => localStorage.setItem(key, value)",
                            (key.clone(), value.clone()),
                        )
                        .await
                        .map_err(AppError::browser)?;
                }
            }
            StorageKind::SessionStorage => {
                for (key, value) in &entries {
                    let _: () = self
                        .page
                        .evaluate(
                            "([key, value]) => sessionStorage.setItem(key, value)",
                            (key.clone(), value.clone()),
                        )
                        .await
                        .map_err(AppError::browser)?;
                }
            }
            StorageKind::Cookies => {
                let current = self.page.url().map_err(AppError::browser)?;
                let domain = Url::parse(&current)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .ok_or_else(|| {
                        AppError::Browser(
                            "Cannot derive cookie domain: page has no navigated URL".to_string(),
                        )
                    })?;

                let cookies: Vec<Cookie> = entries
                    .iter()
                    .map(|(name, value)| {
                        Cookie::with_domain_path(name.as_str(), value.as_str(), domain.as_str(), "/")
                    })
                    .collect();
                self.context
                    .add_cookies(&cookies)
                    .await
                    .map_err(AppError::browser)?;
            }
        }

        info!(
            count = entries.len(),
            storage = ?seed.storage_type,
            "Seeded auth state"
        );
        Ok(())
    }

    /// Close the browser. Called exactly once by the orchestrator.
    pub async fn close(self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {e:?}");
        }
    }
}
