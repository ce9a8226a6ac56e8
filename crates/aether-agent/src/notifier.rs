//! Notifier gateway - best-effort webhook announcements
//!
//! `notify` never fails its caller. Successful sends are rate limited to one
//! per interval; calls inside the window return `RateLimited` without
//! touching the network.

use aether_core::config::NotifierSettings;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    RateLimited,
    Failed,
    /// No webhook configured.
    Disabled,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> NotifyOutcome;
}

pub struct WebhookNotifier {
    client: Client,
    webhook: Option<String>,
    username: String,
    min_interval: Duration,
    timeout: Duration,
    last_sent: Mutex<Option<Instant>>,
}

impl WebhookNotifier {
    pub fn new(webhook: Option<String>) -> Self {
        Self::from_settings(
            &NotifierSettings {
                webhook,
                ..NotifierSettings::default()
            },
            "Aether",
        )
    }

    pub fn from_settings(settings: &NotifierSettings, username: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook: settings.webhook.clone(),
            username: username.into(),
            min_interval: Duration::from_secs(settings.min_interval_secs),
            timeout: Duration::from_secs(settings.timeout_secs),
            last_sent: Mutex::new(None),
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    fn within_window(&self) -> bool {
        match *self.last_sent.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(at) => at.elapsed() < self.min_interval,
            None => false,
        }
    }

    fn record_send(&self) {
        *self.last_sent.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str) -> NotifyOutcome {
        let Some(url) = &self.webhook else {
            return NotifyOutcome::Disabled;
        };
        if self.within_window() {
            debug!("notifier_failed: rate limited, dropping {:?}", title);
            return NotifyOutcome::RateLimited;
        }

        let payload = json!({
            "username": self.username,
            "embeds": [{
                "title": title,
                "description": body,
                "timestamp": Utc::now().to_rfc3339(),
            }],
        });

        let send = self.client.post(url).json(&payload).send();
        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(resp)) if resp.status().is_success() => {
                self.record_send();
                NotifyOutcome::Sent
            }
            Ok(Ok(resp)) => {
                debug!("notifier_failed: webhook returned {}", resp.status());
                NotifyOutcome::Failed
            }
            Ok(Err(e)) => {
                debug!("notifier_failed: {}", e);
                NotifyOutcome::Failed
            }
            Err(_) => {
                debug!("notifier_failed: timed out after {:?}", self.timeout);
                NotifyOutcome::Failed
            }
        }
    }
}
