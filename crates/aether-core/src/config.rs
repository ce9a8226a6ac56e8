//! Runtime configuration
//!
//! All tunables in one place. Every field has a default; the environment
//! overrides individual values. Invalid values are a startup error.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AetherConfig {
    /// Display name used in prompts, notifications, and generated manifests.
    pub name: String,
    /// Root under which state, artifacts, and logs live.
    pub workspace_root: PathBuf,
    pub llm: LlmSettings,
    pub notifier: NotifierSettings,
    pub schedule: ScheduleSettings,
    pub queue: QueueSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat-completions endpoint. Without one every call falls back.
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    /// Webhook URL. Without one the notifier is a no-op.
    pub webhook: Option<String>,
    pub min_interval_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub cognition_interval_secs: u64,
    pub execution_interval_secs: u64,
}

/// Backpressure thresholds for the cognition tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub high_water: usize,
    pub low_water: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// `host:port`, resolved when the listener binds. `None` disables the
    /// dashboard.
    pub bind: Option<String>,
}

// ============================================================
// Defaults
// ============================================================

pub const DEFAULT_WORKSPACE: &str = "./aether_workspace";
pub const DEFAULT_DASHBOARD_BIND: &str = "127.0.0.1:5000";

impl Default for AetherConfig {
    fn default() -> Self {
        Self {
            name: "Aether".into(),
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE),
            llm: LlmSettings::default(),
            notifier: NotifierSettings::default(),
            schedule: ScheduleSettings::default(),
            queue: QueueSettings::default(),
            dashboard: DashboardSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".into(),
            timeout_secs: 30,
            max_tokens: 256,
        }
    }
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            webhook: None,
            min_interval_secs: 3,
            timeout_secs: 10,
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            cognition_interval_secs: 7,
            execution_interval_secs: 5,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            high_water: 100,
            low_water: 50,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_DASHBOARD_BIND.to_string()),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl AetherConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let set = |key: &str| get(key).filter(|v| !v.is_empty());

        let mut config = Self::default();

        if let Some(name) = set("AETHER_NAME") {
            config.name = name;
        }
        if let Some(root) = set("WORKSPACE_ROOT") {
            config.workspace_root = PathBuf::from(root);
        }

        config.llm.endpoint = set("LLM_ENDPOINT")
            .map(|u| validate_url("LLM_ENDPOINT", u))
            .transpose()?;
        config.llm.api_key = set("LLM_API_KEY");
        if let Some(model) = set("LLM_MODEL") {
            config.llm.model = model;
        }
        config.llm.timeout_secs = parse_or(&set, "LLM_TIMEOUT_SECONDS", config.llm.timeout_secs)?;
        config.llm.max_tokens = parse_or(&set, "LLM_MAX_TOKENS", config.llm.max_tokens)?;

        config.notifier.webhook = set("NOTIFIER_WEBHOOK")
            .map(|u| validate_url("NOTIFIER_WEBHOOK", u))
            .transpose()?;
        config.notifier.min_interval_secs =
            parse_or(&set, "NOTIFIER_MIN_INTERVAL_SECONDS", config.notifier.min_interval_secs)?;
        config.notifier.timeout_secs =
            parse_or(&set, "NOTIFIER_TIMEOUT_SECONDS", config.notifier.timeout_secs)?;

        config.schedule.cognition_interval_secs =
            parse_or(&set, "COGNITION_INTERVAL_SECONDS", config.schedule.cognition_interval_secs)?;
        config.schedule.execution_interval_secs =
            parse_or(&set, "EXECUTION_INTERVAL_SECONDS", config.schedule.execution_interval_secs)?;

        config.queue.high_water = parse_or(&set, "QUEUE_HIGH_WATER", config.queue.high_water)?;
        config.queue.low_water = parse_or(&set, "QUEUE_LOW_WATER", config.queue.low_water)?;

        if let Some(bind) = get("DASHBOARD_BIND") {
            config.dashboard.bind = parse_bind(&bind)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.cognition_interval_secs == 0 {
            return Err(Error::config("COGNITION_INTERVAL_SECONDS must be positive"));
        }
        if self.schedule.execution_interval_secs == 0 {
            return Err(Error::config("EXECUTION_INTERVAL_SECONDS must be positive"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("LLM_TIMEOUT_SECONDS must be positive"));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(Error::config("NOTIFIER_TIMEOUT_SECONDS must be positive"));
        }
        if self.queue.high_water == 0 {
            return Err(Error::config("QUEUE_HIGH_WATER must be positive"));
        }
        if self.queue.low_water >= self.queue.high_water {
            return Err(Error::config(format!(
                "QUEUE_LOW_WATER ({}) must be below QUEUE_HIGH_WATER ({})",
                self.queue.low_water, self.queue.high_water
            )));
        }
        if self.workspace_root.as_os_str().is_empty() {
            return Err(Error::config("WORKSPACE_ROOT must not be empty"));
        }
        Ok(())
    }

    pub fn state_dir(&self) -> PathBuf {
        state_dir(&self.workspace_root)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        artifacts_dir(&self.workspace_root)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.workspace_root.join("logs")
    }

    pub fn cognition_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.cognition_interval_secs)
    }

    pub fn execution_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.execution_interval_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn notifier_interval(&self) -> Duration {
        Duration::from_secs(self.notifier.min_interval_secs)
    }

    pub fn notifier_timeout(&self) -> Duration {
        Duration::from_secs(self.notifier.timeout_secs)
    }
}

pub fn state_dir(workspace_root: &Path) -> PathBuf {
    workspace_root.join("state")
}

pub fn artifacts_dir(workspace_root: &Path) -> PathBuf {
    workspace_root.join("artifacts")
}

fn parse_or<T, F>(set: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match set(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| Error::config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn validate_url(key: &str, url: String) -> Result<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(Error::config(format!("{}={:?}: expected an http(s) URL", key, url))),
    }
}

/// Accepts `host:port` where host may be a name, an IPv4 address or a
/// bracketed IPv6 address. Name resolution happens at bind time.
fn parse_bind(raw: &str) -> Result<Option<String>> {
    if matches!(raw.to_ascii_lowercase().as_str(), "" | "off" | "none" | "disabled") {
        return Ok(None);
    }
    let invalid = |why: &str| Error::config(format!("DASHBOARD_BIND={:?}: {}", raw, why));

    let (host, port) = raw.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    let bare = host.strip_prefix('[').and_then(|h| h.strip_suffix(']'));
    if bare.is_none() && host.contains(':') {
        return Err(invalid("IPv6 hosts must be bracketed"));
    }
    if bare.is_some_and(|h| h.is_empty()) || host.chars().any(char::is_whitespace) {
        return Err(invalid("invalid host"));
    }
    port.parse::<u16>().map_err(|e| invalid(&format!("invalid port: {}", e)))?;
    Ok(Some(raw.to_string()))
}
