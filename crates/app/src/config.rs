use serde::Deserialize;
use std::path::{Path, PathBuf};

use summa_import::NameRule;

/// Runtime configuration, loaded from a TOML file. Every field has a
/// default so a missing file still yields a runnable (if empty-allowlist)
/// service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub queue: QueueSection,
    pub report: ReportSection,
    pub submitters: SubmitterSection,
    pub canonical: CanonicalSection,
    pub dirs: DirSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueSection {
    /// Seconds between drain polls.
    pub poll_interval_secs: u64,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self { poll_interval_secs: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Minimum share of the total a counterparty needs to chart on its own.
    pub share_threshold: f64,
    /// Settle delay before the browser captures a section, in seconds.
    pub settle_secs: u64,
    /// Browser binary override; the platform default is probed otherwise.
    pub chromium_executable: Option<PathBuf>,
    /// Fixed title-page asset prepended to every report.
    pub title_page: PathBuf,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            share_threshold: 0.01,
            settle_secs: 4,
            chromium_executable: None,
            title_page: PathBuf::from("assets/title-page.pdf"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitterSection {
    /// Submitter ids permitted to enqueue uploads.
    pub allowed: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CanonicalSection {
    /// Counterparty-name find/replace rules, applied in order.
    pub rules: Vec<NameRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirSection {
    /// Watched front door: files dropped here are submitted.
    pub intake: PathBuf,
    /// Working copies of accepted uploads, removed after processing.
    pub downloads: PathBuf,
    /// Section and final PDFs.
    pub reports: PathBuf,
    /// Delivered artifacts.
    pub outbox: PathBuf,
}

impl Default for DirSection {
    fn default() -> Self {
        Self {
            intake: PathBuf::from("intake"),
            downloads: PathBuf::from("downloads"),
            reports: PathBuf::from("reports"),
            outbox: PathBuf::from("outbox"),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the file if present, falls back to defaults otherwise.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(config = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}
