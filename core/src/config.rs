// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mirrorcal_gcal::{AuthMethod, GcalConfig};
use serde::de;

use crate::MirrorError;
use crate::bus::DEFAULT_CAPACITY;

/// The name of the application.
pub const APP_NAME: &str = "mirrorcal";

/// Environment variable read for the access token when none is configured.
pub const DEFAULT_TOKEN_ENV: &str = "MIRRORCAL_TOKEN";

/// File name of the local database inside the state directory.
pub const DB_FILE: &str = "mirror.db";

/// Configuration of the mirror.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Account the mirrored data belongs to.
    pub account: String,

    /// Directory for storing the local database, in memory when unset after normalization.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Interval between passes in watch mode.
    #[serde(default)]
    pub refresh_interval: RefreshInterval,

    /// Number of notices buffered for each bus subscriber.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API.
    #[serde(default)]
    pub base_url: Option<String>,

    /// OAuth access token, prefer `token_env` over writing it to the file.
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable holding the access token.
    #[serde(default)]
    pub token_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User agent sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_bus_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Config {
    /// A configuration with defaults and an in-memory store.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            state_dir: None,
            refresh_interval: RefreshInterval::default(),
            bus_capacity: DEFAULT_CAPACITY,
            api: ApiConfig::default(),
        }
    }

    /// Normalize the configuration.
    pub fn normalize(&mut self) -> Result<(), MirrorError> {
        if self.account.trim().is_empty() {
            return Err(MirrorError::Config("account must not be empty".into()));
        }

        // Normalize state directory
        match &self.state_dir {
            Some(a) => {
                self.state_dir = Some(expand_path(a).map_err(|e| {
                    MirrorError::Config(format!("Failed to expand state directory path: {e}"))
                })?)
            }

            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!(err = %e, "failed to get state directory"),
            },
        };

        Ok(())
    }

    /// Path of the local database, `None` for an in-memory store.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.state_dir.as_ref().map(|dir| dir.join(DB_FILE))
    }

    /// Builds the remote client configuration, resolving the access token.
    pub fn gcal_config(&self) -> GcalConfig {
        let mut config = GcalConfig::default();
        if let Some(base_url) = &self.api.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(timeout) = self.api.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(user_agent) = &self.api.user_agent {
            config.user_agent = user_agent.clone();
        }

        let env = self.api.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        let token = self
            .api
            .token
            .clone()
            .or_else(|| std::env::var(env).ok())
            .filter(|token| !token.is_empty());
        config.auth = match token {
            Some(token) => AuthMethod::Bearer { token },
            None => {
                tracing::warn!(env, "no access token configured, requests are unauthenticated");
                AuthMethod::None
            }
        };
        config
    }
}

/// Interval between refreshes, written as "HH:MM", "1d", "24h", "5m" or "300s".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshInterval(pub Duration);

impl Default for RefreshInterval {
    fn default() -> Self {
        RefreshInterval(Duration::from_secs(5 * 60))
    }
}

impl<'de> serde::Deserialize<'de> for RefreshInterval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct IntervalVisitor;

        impl de::Visitor<'_> for IntervalVisitor {
            type Value = RefreshInterval;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter
                    .write_str(r#"a duration string like "HH:MM", "1d", "24h", "60m", or "1800s""#)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                parse_duration(value)
                    .map(RefreshInterval)
                    .map_err(|e| de::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(IntervalVisitor)
    }
}

/// Handle tilde (~) and environment variables in the path
pub fn expand_path(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    // Handle state directories
    if cfg!(unix) {
        for prefix in ["$XDG_STATE_HOME/", "${XDG_STATE_HOME}/"] {
            if let Some(stripped) = path.strip_prefix(prefix) {
                return Ok(get_state_dir()?.join(stripped));
            }
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Box<dyn Error>> {
    dirs::home_dir().ok_or("User-specific home directory not found".into())
}

/// User configuration directory, `$XDG_CONFIG_HOME` on unix.
pub fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.ok_or("User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir.ok_or("User-specific state directory not found".into())
}

/// Parse a duration string in the format "HH:MM" / "1d" / "24h" / "60m" / "1800s".
fn parse_duration(s: &str) -> Result<Duration, Box<dyn Error>> {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    // timers add the interval to `Instant::now()`, which panics on overflow
    const MAX: u64 = 366 * 24 * HOUR;

    let scaled = |n: &str, unit: u64| -> Result<Option<u64>, Box<dyn Error>> {
        Ok(n.trim().parse::<u64>()?.checked_mul(unit))
    };
    let secs = if let Some((h, m)) = s.split_once(':') {
        let hours = scaled(h, HOUR)?;
        let minutes = scaled(m, MINUTE)?;
        hours.zip(minutes).and_then(|(h, m)| h.checked_add(m))
    } else if let Some(rest) = s.strip_suffix("d") {
        scaled(rest, 24 * HOUR)?
    } else if let Some(rest) = s.strip_suffix("h") {
        scaled(rest, HOUR)?
    } else if let Some(rest) = s.strip_suffix("m") {
        scaled(rest, MINUTE)?
    } else if let Some(rest) = s.strip_suffix("s") {
        scaled(rest, 1)?
    } else {
        return Err(format!("Invalid duration format: {s}").into());
    };
    let secs = secs
        .filter(|secs| *secs <= MAX)
        .ok_or_else(|| format!("Duration out of range: {s}"))?;

    if secs == 0 {
        return Err("Duration must be positive".into());
    }
    Ok(Duration::from_secs(secs))
}
