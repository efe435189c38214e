//! Domain events, emitted through the [`EventSink`](super::ports::EventSink)
//! port as the service works.

use crate::display::kinds::DisplayStateKind;
use crate::error::PollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The service finished construction and entered its loop.
    Started,
    /// The resolved display state changed between ticks.
    StateChanged {
        from: DisplayStateKind,
        to: DisplayStateKind,
    },
    /// A poll produced a valid reading.
    ReadingReceived { glucose_mg_dl: i32, delta: i32 },
    /// A poll attempt failed; `failures` is the consecutive count.
    PollFailed { error: PollError, failures: u32 },
    /// The alert coordinator fired the buzzer.
    AlertBeep { glucose_mg_dl: i32 },
    /// Alerts were snoozed.
    Snoozed { minutes: u32 },
    /// Configuration was written to persistent storage.
    ConfigSaved,
}
