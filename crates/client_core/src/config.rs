use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::paywall::{PaywallPolicy, DEFAULT_FREE_PREVIEW_PAGES};

pub const DEFAULT_SETTINGS_FILE: &str = "orinotes.toml";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Validated, always without a trailing slash.
    pub api_base_url: String,
    pub free_preview_pages: u32,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            free_preview_pages: DEFAULT_FREE_PREVIEW_PAGES,
            request_timeout_secs: 30,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn paywall_policy(&self) -> PaywallPolicy {
        PaywallPolicy {
            free_preview_pages: self.free_preview_pages,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    free_preview_pages: Option<u32>,
    request_timeout_secs: Option<u64>,
    max_upload_bytes: Option<u64>,
}

/// Defaults, then `path` when it exists, then `APP__*` environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    }

    apply_env(&mut settings, std::env::vars())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = parse_base_url(&v)?;
    }
    if let Some(v) = file_cfg.free_preview_pages {
        settings.free_preview_pages = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.max_upload_bytes {
        settings.max_upload_bytes = v;
    }
    Ok(())
}

fn apply_env<I>(settings: &mut Settings, vars: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        match key.as_str() {
            "APP__API_BASE_URL" => {
                settings.api_base_url = parse_base_url(&value)?;
            }
            "APP__FREE_PREVIEW_PAGES" => match value.parse::<u32>() {
                Ok(parsed) => settings.free_preview_pages = parsed,
                Err(_) => warn!(%key, %value, "config: ignoring non-numeric override"),
            },
            "APP__REQUEST_TIMEOUT_SECS" => match value.parse::<u64>() {
                Ok(parsed) => settings.request_timeout_secs = parsed,
                Err(_) => warn!(%key, %value, "config: ignoring non-numeric override"),
            },
            "APP__MAX_UPLOAD_BYTES" => match value.parse::<u64>() {
                Ok(parsed) => settings.max_upload_bytes = parsed,
                Err(_) => warn!(%key, %value, "config: ignoring non-numeric override"),
            },
            _ => {}
        }
    }
    Ok(())
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("api base url must be http(s), got '{}'", url.scheme());
    }
    if url.cannot_be_a_base() || url.query().is_some() {
        anyhow::bail!("api base url must be a plain http(s) prefix, got '{raw}'");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
