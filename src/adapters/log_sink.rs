//! Serial console event sink.
//!
//! The service emits an [`AppEvent`] for every externally interesting
//! transition; this sink renders each one as a tagged log line on the
//! UART / USB-CDC console. Swapping in an MQTT or web-push sink later
//! is a matter of implementing the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct SerialEventLog;

impl SerialEventLog {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SerialEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for SerialEventLog {
    fn emit(&mut self, event: &AppEvent) {
        match *event {
            AppEvent::Started => {
                info!("START | service loop entered");
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::ReadingReceived { glucose_mg_dl, delta } => {
                info!("READ  | {glucose_mg_dl} mg/dL ({delta:+})");
            }
            AppEvent::PollFailed { error, failures } => {
                warn!("POLL  | failed: {error} (consecutive: {failures})");
            }
            AppEvent::AlertBeep { glucose_mg_dl } => {
                warn!("ALERT | beep at {glucose_mg_dl} mg/dL");
            }
            AppEvent::Snoozed { minutes } => {
                info!("ALERT | snoozed {minutes} min");
            }
            AppEvent::ConfigSaved => {
                info!("CONF  | saved to NVS");
            }
        }
    }
}
