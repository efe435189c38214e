//! Commands from the local control surface (buttons, admin API).

use crate::config::AppConfig;
use crate::display::kinds::DisplayStateKind;
use crate::notify::MAX_NOTIFY_LEN;

#[derive(Debug, Clone)]
pub enum Command {
    /// Cycle the default mode forward.
    NextMode,
    /// Cycle the default mode backward.
    PrevMode,
    /// Silence out-of-range alerts for the configured snooze duration.
    SnoozeAlerts,
    /// Pin the display to one state until cleared. Outranks server
    /// overrides; still loses to error screens.
    ForceState(DisplayStateKind),
    /// Release a [`Command::ForceState`] pin.
    ClearForce,
    /// Poll the glucose backend immediately, ignoring the interval gate.
    ForceFetch,
    /// Show a notification.
    Notify {
        text: heapless::String<MAX_NOTIFY_LEN>,
        duration_sec: u32,
        urgent: bool,
    },
    /// Drop the pending notification before it expires.
    DismissNotification,
    /// Replace the live configuration (validated before applying).
    UpdateConfig(Box<AppConfig>),
    /// Flush pending configuration changes to storage now.
    SaveConfig,
}
