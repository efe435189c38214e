//! Out-of-range alert coordination.
//!
//! Pure time-driven policy: given the current reading and config, decide
//! each tick whether the buzzer should fire. Snoozing sets an absolute
//! deadline; a later snooze overwrites it rather than extending it.

use log::info;

use crate::config::AppConfig;
use crate::glucose::ingest::Reading;

/// Minimum spacing between beeps while an alert condition holds.
pub const BEEP_INTERVAL_MS: u64 = 10_000;

/// What the buzzer should do, as decided by [`AlertCoordinator::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepRequest {
    pub count: u8,
    pub freq_hz: u16,
    pub duration_ms: u16,
}

/// The single alert chirp. Deliberately short — this is a reminder, not
/// a siren.
const ALERT_BEEP: BeepRequest = BeepRequest {
    count: 1,
    freq_hz: 2000,
    duration_ms: 200,
};

#[derive(Debug, Default)]
pub struct AlertCoordinator {
    /// Monotonic ms of the last emitted beep; `None` = never beeped.
    last_beep_ms: Option<u64>,
    /// Absolute monotonic deadline until which alerts stay silent.
    snooze_until_ms: Option<u64>,
}

impl AlertCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the alert condition for this tick. Returns a beep request
    /// when the reading is valid, out of the configured band, not snoozed,
    /// and at least [`BEEP_INTERVAL_MS`] has passed since the last beep.
    pub fn tick(&mut self, reading: &Reading, cfg: &AppConfig, now_ms: u64) -> Option<BeepRequest> {
        if !cfg.alert_enabled || !reading.valid {
            return None;
        }
        let out_of_range =
            reading.glucose_mg_dl < cfg.alert_low || reading.glucose_mg_dl > cfg.alert_high;
        if !out_of_range {
            return None;
        }
        if let Some(until) = self.snooze_until_ms {
            if now_ms < until {
                return None;
            }
            self.snooze_until_ms = None;
        }
        if let Some(last) = self.last_beep_ms {
            if now_ms.saturating_sub(last) < BEEP_INTERVAL_MS {
                return None;
            }
        }
        self.last_beep_ms = Some(now_ms);
        Some(ALERT_BEEP)
    }

    /// Silence alerts for `minutes` from now. Overwrites any existing
    /// snooze deadline.
    pub fn snooze(&mut self, now_ms: u64, minutes: u32) {
        let until = now_ms + u64::from(minutes) * 60_000;
        self.snooze_until_ms = Some(until);
        info!("Alerts snoozed for {minutes} min");
    }

    pub fn is_snoozed(&self, now_ms: u64) -> bool {
        self.snooze_until_ms.is_some_and(|until| now_ms < until)
    }
}
