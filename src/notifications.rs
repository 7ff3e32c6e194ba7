//! Transient toast notifications.
//!
//! Every notification auto-dismisses after the configured lifetime; the
//! runtime drives expiry with periodic ticks.

use std::time::{Duration, Instant};

pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(u64);

impl NotificationId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for NotificationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

impl Severity {
    /// Bootstrap alert class suffix.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "check-circle",
            Severity::Info => "info-circle",
            Severity::Warning => "exclamation-triangle",
            Severity::Danger => "exclamation-circle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub severity: Severity,
    pub message: String,
    pub created_at: Instant,
}

#[derive(Debug)]
pub struct Manager {
    /// Oldest first, matching append order in the alert container.
    visible: Vec<Notification>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(DEFAULT_LIFETIME)
    }
}

impl Manager {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            visible: Vec::new(),
            next_id: 1,
            lifetime,
        }
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) -> NotificationId {
        self.push_at(severity, message, Instant::now())
    }

    pub fn push_at(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        now: Instant,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;

        let message = message.into();
        tracing::debug!("[{}] {}", severity.as_str(), message);

        self.visible.push(Notification {
            id,
            severity,
            message,
            created_at: now,
        });
        id
    }

    /// Returns false when the notification was already gone.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.visible.len();
        self.visible.retain(|n| n.id != id);
        self.visible.len() != before
    }

    /// Drops every notification older than the lifetime.
    pub fn expire(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.visible
            .retain(|n| now.saturating_duration_since(n.created_at) < lifetime);
    }

    pub fn visible(&self) -> &[Notification] {
        &self.visible
    }

    /// Notifications pushed after `id`, used by the shell to print only new ones.
    pub fn since(&self, id: Option<NotificationId>) -> impl Iterator<Item = &Notification> {
        self.visible
            .iter()
            .filter(move |n| id.map_or(true, |last| n.id > last))
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<&Notification> {
        self.visible.last()
    }
}
