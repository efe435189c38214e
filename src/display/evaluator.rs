//! Display-state arbitration.
//!
//! One pure function decides what the matrix shows each tick, from a
//! snapshot of every input. Rules are checked strictly in order and the
//! first match wins, so the mapping from inputs to output is total and
//! deterministic — the same snapshot always yields the same state.
//!
//! Priority, highest first:
//!
//! 1. Boot screen for the first 2 s of uptime
//! 2. No wifi connection, with credentials provisioned (a link that
//!    *should* be up but is not)
//! 3. Neither wifi credentials nor a data source configured (factory
//!    fresh — the user has setup to do)
//! 4. Active notification
//! 5. No data (source configured, past the boot grace, and either no
//!    reading has ever arrived or 10+ consecutive failures)
//! 6. Stale warning (reading older than the configured timeout, or 5+
//!    consecutive failures)
//! 7. Locally forced state
//! 8. Server-forced state
//! 9. Server message
//! 10. The user's selected default mode

use crate::display::kinds::DisplayStateKind;
use crate::glucose::ingest::IngestionSignals;

/// Uptime window during which the boot screen holds the display.
pub const BOOT_SCREEN_MS: u64 = 2_000;
/// Uptime below which the no-data screen is suppressed, so a slow first
/// poll does not flash an error at power-on.
pub const NODATA_GRACE_MS: u64 = 5_000;
/// Consecutive failures that warrant the stale-warning overlay.
pub const FAILURE_STALE_COUNT: u32 = 5;
/// Consecutive failures that escalate to the no-data screen.
pub const FAILURE_NODATA_COUNT: u32 = 10;

/// Snapshot of everything the arbiter looks at. Built fresh each tick;
/// holds no references so tests can construct it literally.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext {
    /// Monotonic milliseconds since power-on.
    pub uptime_ms: u64,
    pub wifi_connected: bool,
    /// WiFi credentials have been provisioned. Separates "configured
    /// but down" (NoWifi) from "never set up" (NoConfig).
    pub wifi_credentials_configured: bool,
    /// A glucose backend is configured (URL or Dexcom credentials).
    pub source_configured: bool,
    /// An unexpired notification is pending.
    pub notification_active: bool,
    pub signals: IngestionSignals,
    /// Reading age, in ms, at which the stale warning engages.
    pub stale_timeout_ms: u64,
    /// Operator override from the local control surface.
    pub local_forced: Option<DisplayStateKind>,
    /// The mode the user has cycled to.
    pub default_mode: DisplayStateKind,
}

/// Decide the display state for one tick.
pub fn evaluate(ctx: &EvaluationContext) -> DisplayStateKind {
    if ctx.uptime_ms < BOOT_SCREEN_MS {
        return DisplayStateKind::Boot;
    }
    if !ctx.wifi_connected && ctx.wifi_credentials_configured {
        return DisplayStateKind::NoWifi;
    }
    if !ctx.source_configured && !ctx.wifi_credentials_configured {
        return DisplayStateKind::NoConfig;
    }
    if ctx.notification_active {
        return DisplayStateKind::Notify;
    }

    let s = &ctx.signals;
    let data_lost = s.failure_count >= FAILURE_NODATA_COUNT || !s.ever_received;
    if data_lost && ctx.source_configured && ctx.uptime_ms > NODATA_GRACE_MS {
        return DisplayStateKind::NoData;
    }

    let aged_out = s.age_ms.is_some_and(|age| age >= ctx.stale_timeout_ms);
    if aged_out || s.failure_count >= FAILURE_STALE_COUNT {
        return DisplayStateKind::StaleWarning;
    }

    if let Some(forced) = ctx.local_forced {
        return forced;
    }
    if let Some(forced) = s.force_mode {
        return forced;
    }
    if s.has_message {
        return DisplayStateKind::Message;
    }

    ctx.default_mode
}
