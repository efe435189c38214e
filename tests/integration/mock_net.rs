//! Mock network and hardware adapters for integration tests.
//!
//! Every fake shares its state with the test body through `Rc` handles,
//! so tests can script responses and assert on full call histories
//! without touching sockets or GPIO.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glucomatrix::app::events::AppEvent;
use glucomatrix::app::ports::{
    BeepPort, ConfigError, ConfigPort, ConnectivityPort, EventSink, HttpPort, HttpResponse,
    RenderData, RenderPort, MAX_BODY_LEN,
};
use glucomatrix::config::AppConfig;
use glucomatrix::display::kinds::DisplayStateKind;
use glucomatrix::error::HttpTransportError;

pub fn response(status: u16, body: &str) -> HttpResponse {
    let mut b: heapless::String<MAX_BODY_LEN> = heapless::String::new();
    b.push_str(body).unwrap();
    HttpResponse { status, body: b }
}

/// Scripted HTTP transport. Responses are consumed in order; an empty
/// script reports the host as unreachable.
#[derive(Clone, Default)]
pub struct FakeHttp {
    pub script: Rc<RefCell<VecDeque<Result<HttpResponse, HttpTransportError>>>>,
    /// URLs of every request made, GETs and POSTs alike.
    pub requests: Rc<RefCell<Vec<String>>>,
}

impl FakeHttp {
    pub fn push_ok(&self, status: u16, body: &str) {
        self.script.borrow_mut().push_back(Ok(response(status, body)));
    }

    pub fn push_err(&self, err: HttpTransportError) {
        self.script.borrow_mut().push_back(Err(err));
    }
}

impl HttpPort for FakeHttp {
    fn get(&mut self, url: &str, _bearer: Option<&str>) -> Result<HttpResponse, HttpTransportError> {
        self.requests.borrow_mut().push(url.to_string());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(HttpTransportError::Connect))
    }

    fn post(&mut self, url: &str, _body: &str) -> Result<HttpResponse, HttpTransportError> {
        self.requests.borrow_mut().push(url.to_string());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(HttpTransportError::Connect))
    }
}

/// Connectivity oracle whose answer the test flips at will.
#[derive(Clone)]
pub struct FakeWifi {
    pub connected: Rc<RefCell<bool>>,
}

impl FakeWifi {
    pub fn up() -> Self {
        Self { connected: Rc::new(RefCell::new(true)) }
    }
}

impl ConnectivityPort for FakeWifi {
    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }
}

/// Records every rendered state.
#[derive(Clone, Default)]
pub struct RecordingRender {
    pub states: Rc<RefCell<Vec<DisplayStateKind>>>,
}

impl RecordingRender {
    pub fn last(&self) -> Option<DisplayStateKind> {
        self.states.borrow().last().copied()
    }
}

impl RenderPort for RecordingRender {
    fn render(&mut self, state: DisplayStateKind, _data: &RenderData<'_>) {
        self.states.borrow_mut().push(state);
    }
}

/// Records every beep request.
#[derive(Clone, Default)]
pub struct RecordingBeep {
    pub beeps: Rc<RefCell<Vec<(u8, u16, u16)>>>,
}

impl BeepPort for RecordingBeep {
    fn beep(&mut self, count: u8, freq_hz: u16, duration_ms: u16) {
        self.beeps.borrow_mut().push((count, freq_hz, duration_ms));
    }
}

/// Collects every emitted event.
#[derive(Clone, Default)]
pub struct VecSink {
    pub events: Rc<RefCell<Vec<AppEvent>>>,
}

impl EventSink for VecSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.borrow_mut().push(*event);
    }
}

/// In-memory config store.
#[derive(Clone, Default)]
pub struct MemConfigStore {
    pub saved: Rc<RefCell<Option<AppConfig>>>,
}

impl ConfigPort for MemConfigStore {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }
}
