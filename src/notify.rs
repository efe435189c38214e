//! Notification center.
//!
//! Holds at most one pending notification; a new post replaces the
//! current one. Expiry is lazy: the entry stays until a tick observes
//! its deadline has passed, which is fine because the evaluator only
//! samples `has_active` once per tick anyway.

use log::info;

use crate::app::ports::NotifyPort;

/// Notification text cap, matching the server message cap.
pub const MAX_NOTIFY_LEN: usize = 127;

#[derive(Debug, Clone)]
pub struct Notification {
    pub text: heapless::String<MAX_NOTIFY_LEN>,
    /// Urgent notifications are rendered in the alert color.
    pub urgent: bool,
    expires_at_ms: u64,
}

#[derive(Debug, Default)]
pub struct NotifyCenter {
    current: Option<Notification>,
    enabled: bool,
}

impl NotifyCenter {
    pub fn new(enabled: bool) -> Self {
        Self {
            current: None,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.current = None;
        }
    }

    /// Post a notification, replacing any pending one. Text is truncated
    /// at [`MAX_NOTIFY_LEN`]. Ignored while the center is disabled.
    pub fn post(&mut self, text: &str, duration_sec: u32, urgent: bool, now_ms: u64) {
        if !self.enabled {
            return;
        }
        let mut bounded: heapless::String<MAX_NOTIFY_LEN> = heapless::String::new();
        for c in text.chars() {
            if bounded.push(c).is_err() {
                break;
            }
        }
        info!("Notification ({}s{}): {bounded}", duration_sec, if urgent { ", urgent" } else { "" });
        self.current = Some(Notification {
            text: bounded,
            urgent,
            expires_at_ms: now_ms + u64::from(duration_sec) * 1000,
        });
    }

    /// Drop the pending notification if its deadline has passed.
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(n) = &self.current {
            if now_ms >= n.expires_at_ms {
                self.current = None;
            }
        }
    }

    pub fn active(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

impl NotifyPort for NotifyCenter {
    fn has_active(&self) -> bool {
        self.current.is_some()
    }
}
