//! Client configuration
//!
//! Read from the environment (and an optional `.env` file):
//!
//! | variable | default |
//! |---|---|
//! | `WLAN_PORTAL_ENDPOINT` | `http://localhost:4000/` |
//! | `WLAN_PORTAL_TOKEN_FILE` | `$HOME/.config/wlan-portal/storage.json` |
//! | `WLAN_PORTAL_TOKEN_KEY` | [`AUTH_TOKEN`] |
//! | `WLAN_PORTAL_TIMEOUT_SECS` | `30` |
//! | `WLAN_PORTAL_METRICS_WINDOW_MINUTES` | `60` |
//! | `WLAN_PORTAL_METRICS_ROLLING` | `false` |

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::token::AUTH_TOKEN;
use crate::ClientError;

const MAX_METRICS_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// When the metrics window is anchored to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsAnchor {
    /// Computed once when a screen is created and reused for every refetch
    Snapshot,
    /// Recomputed for each request
    Rolling,
}

/// Time span covered by service-metric queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsWindow {
    pub span: TimeDelta,
    pub anchor: MetricsAnchor,
}

impl MetricsWindow {
    pub fn last_hour() -> Self {
        Self {
            span: TimeDelta::hours(1),
            anchor: MetricsAnchor::Snapshot,
        }
    }

    /// `(from, to)` ending at `now`
    pub fn range_ending(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.span, now)
    }
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self::last_hour()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token_file: PathBuf,
    pub token_key: String,
    pub request_timeout: Duration,
    pub metrics_window: MetricsWindow,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000/".to_string(),
            token_file: default_token_file(std::env::var("HOME").ok()),
            token_key: AUTH_TOKEN.to_string(),
            request_timeout: Duration::from_secs(30),
            metrics_window: MetricsWindow::default(),
        }
    }
}

fn default_token_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home)
            .join(".config")
            .join("wlan-portal")
            .join("storage.json"),
        _ => PathBuf::from(".wlan-portal").join("storage.json"),
    }
}

impl ClientConfig {
    /// Load from the process environment, reading `.env` first when present
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ClientConfig {
            token_file: default_token_file(lookup("HOME")),
            ..ClientConfig::default()
        };

        let endpoint = lookup("WLAN_PORTAL_ENDPOINT").unwrap_or(defaults.endpoint);
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "WLAN_PORTAL_ENDPOINT must be an http(s) URL, got {endpoint:?}"
            )));
        }

        let request_timeout = match lookup("WLAN_PORTAL_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number(&raw, "WLAN_PORTAL_TIMEOUT_SECS")?),
            None => defaults.request_timeout,
        };

        let span = match lookup("WLAN_PORTAL_METRICS_WINDOW_MINUTES") {
            Some(raw) => {
                let minutes: i64 = parse_number(&raw, "WLAN_PORTAL_METRICS_WINDOW_MINUTES")?;
                if !(1..=MAX_METRICS_WINDOW_MINUTES).contains(&minutes) {
                    return Err(ClientError::Config(format!(
                        "WLAN_PORTAL_METRICS_WINDOW_MINUTES must be between 1 and {MAX_METRICS_WINDOW_MINUTES}"
                    )));
                }
                TimeDelta::minutes(minutes)
            }
            None => defaults.metrics_window.span,
        };

        let anchor = match lookup("WLAN_PORTAL_METRICS_ROLLING").as_deref() {
            None | Some("") | Some("0") | Some("false") => MetricsAnchor::Snapshot,
            Some("1") | Some("true") => MetricsAnchor::Rolling,
            Some(other) => {
                return Err(ClientError::Config(format!(
                    "WLAN_PORTAL_METRICS_ROLLING must be true or false, got {other:?}"
                )))
            }
        };

        Ok(Self {
            endpoint,
            token_file: lookup("WLAN_PORTAL_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_file),
            token_key: lookup("WLAN_PORTAL_TOKEN_KEY").unwrap_or(defaults.token_key),
            request_timeout,
            metrics_window: MetricsWindow { span, anchor },
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> crate::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::Config(format!("{name} must be a number, got {raw:?}")))
}
