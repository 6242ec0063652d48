use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// A4 in inches, as the print surface expects.
const PAPER_WIDTH_IN: f64 = 8.27;
const PAPER_HEIGHT_IN: f64 = 11.69;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch rendering engine: {0}")]
    Launch(String),
    #[error("rendering engine error: {0}")]
    Engine(String),
    #[error("renderer produced an empty document for {0:?}")]
    EmptyOutput(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over a markup-to-PDF backend.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render_pdf(&self, html: &str, out: &Path) -> Result<(), RenderError>;
}

// ── Chromium backend ──────────────────────────────────────────────────────────

/// Drives a headless Chromium over CDP. The page gets a fixed settle
/// interval before capture so inline scripts (the chart) finish drawing.
pub struct ChromiumRenderer {
    executable: PathBuf,
    settle: Duration,
}

impl ChromiumRenderer {
    pub fn new(executable: impl Into<PathBuf>, settle: Duration) -> Self {
        Self { executable: executable.into(), settle }
    }

    /// Platform-default browser location. Inability to resolve one is an
    /// environment misconfiguration, not a per-job condition.
    pub fn default_executable() -> Result<PathBuf, RenderError> {
        let candidate = match std::env::consts::OS {
            "windows" => r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            "macos" => "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            _ => "/usr/bin/google-chrome",
        };
        let path = PathBuf::from(candidate);
        if path.exists() {
            Ok(path)
        } else {
            Err(RenderError::Launch(format!(
                "no browser executable at {}",
                path.display()
            )))
        }
    }
}

#[async_trait]
impl RenderEngine for ChromiumRenderer {
    async fn render_pdf(&self, html: &str, out: &Path) -> Result<(), RenderError> {
        let config = BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .no_sandbox()
            .build()
            .map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| RenderError::Engine(e.to_string()))?;
            page.set_content(html)
                .await
                .map_err(|e| RenderError::Engine(e.to_string()))?;

            // Let dynamic content settle before capture.
            tokio::time::sleep(self.settle).await;

            let params = PrintToPdfParams {
                landscape: Some(true),
                print_background: Some(true),
                paper_width: Some(PAPER_WIDTH_IN),
                paper_height: Some(PAPER_HEIGHT_IN),
                ..Default::default()
            };
            let bytes = page
                .pdf(params)
                .await
                .map_err(|e| RenderError::Engine(e.to_string()))?;
            if bytes.is_empty() {
                return Err(RenderError::EmptyOutput(out.to_path_buf()));
            }
            tokio::fs::write(out, &bytes).await?;
            Ok(())
        }
        .await;

        let _ = browser.close().await;
        let _ = driver.await;
        result
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Writes preset bytes instead of driving a browser — lets the pipeline and
/// queue be exercised without a Chromium install.
pub struct MockRenderEngine {
    pub bytes: Vec<u8>,
}

impl MockRenderEngine {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }
}

#[async_trait]
impl RenderEngine for MockRenderEngine {
    async fn render_pdf(&self, _html: &str, out: &Path) -> Result<(), RenderError> {
        tokio::fs::write(out, &self.bytes).await?;
        Ok(())
    }
}
