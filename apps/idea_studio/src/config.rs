use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{ControllerSettings, TransportOptions};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    /// Defaults to the origin of `api_url`.
    pub asset_url: Option<String>,
    /// Defaults to `viewer.html` under the asset base.
    pub viewer_url: Option<String>,
    pub download_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub status_dismiss_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".into(),
            asset_url: None,
            viewer_url: None,
            download_dir: PathBuf::from("downloads"),
            request_timeout_secs: 360,
            health_timeout_secs: 5,
            status_dismiss_secs: 5,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    asset_url: Option<String>,
    viewer_url: Option<String>,
    download_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    health_timeout_secs: Option<u64>,
    status_dismiss_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub api_base: Url,
    pub controller: ControllerSettings,
    pub transport: TransportOptions,
    pub download_dir: PathBuf,
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` (if any), then environment variables.
pub fn load_settings_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => settings.apply_file(file_cfg),
            Err(error) => warn!(
                path = %path.display(),
                %error,
                "ignoring settings file that could not be parsed"
            ),
        },
        Err(error) => debug!(path = %path.display(), %error, "no settings file loaded"),
    }

    if let Some(v) = env("IDEA_STUDIO_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("IDEA_STUDIO_ASSET_URL") {
        settings.asset_url = Some(v);
    }
    if let Some(v) = env("APP__ASSET_URL") {
        settings.asset_url = Some(v);
    }

    if let Some(v) = env("IDEA_STUDIO_VIEWER_URL") {
        settings.viewer_url = Some(v);
    }
    if let Some(v) = env("APP__VIEWER_URL") {
        settings.viewer_url = Some(v);
    }

    if let Some(v) = env("APP__DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = env("APP__HEALTH_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.health_timeout_secs = parsed;
        }
    }
    if let Some(v) = env("APP__STATUS_DISMISS_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.status_dismiss_secs = parsed;
        }
    }

    settings
}

impl Settings {
    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.api_url {
            self.api_url = v;
        }
        if let Some(v) = file_cfg.asset_url {
            self.asset_url = Some(v);
        }
        if let Some(v) = file_cfg.viewer_url {
            self.viewer_url = Some(v);
        }
        if let Some(v) = file_cfg.download_dir {
            self.download_dir = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.health_timeout_secs {
            self.health_timeout_secs = v;
        }
        if let Some(v) = file_cfg.status_dismiss_secs {
            self.status_dismiss_secs = v;
        }
    }

    pub fn resolve(&self) -> anyhow::Result<ResolvedSettings> {
        let api_base = parse_http_url(&self.api_url)
            .with_context(|| format!("invalid api url '{}'", self.api_url))?;

        let asset_base = match &self.asset_url {
            Some(raw) => {
                parse_http_url(raw).with_context(|| format!("invalid asset url '{raw}'"))?
            }
            None => Url::parse(&api_base.origin().ascii_serialization())
                .with_context(|| format!("api url '{api_base}' has no usable origin"))?,
        };

        let viewer_url = match &self.viewer_url {
            Some(raw) => {
                parse_http_url(raw).with_context(|| format!("invalid viewer url '{raw}'"))?
            }
            None => asset_base
                .join("viewer.html")
                .context("failed to derive viewer url from asset url")?,
        };

        if self.request_timeout_secs == 0 || self.health_timeout_secs == 0 {
            bail!("request and health timeouts must be at least one second");
        }

        let mut controller = ControllerSettings::new(asset_base, viewer_url);
        controller.status_dismiss_after = Duration::from_secs(self.status_dismiss_secs);

        Ok(ResolvedSettings {
            api_base,
            controller,
            transport: TransportOptions {
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                health_timeout: Duration::from_secs(self.health_timeout_secs),
            },
            download_dir: self.download_dir.clone(),
        })
    }
}

fn parse_http_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme '{}'", url.scheme());
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
