//! The application service: one `tick` call per scheduler pass wires
//! ingestion, alerting, mode cycling, and display arbitration together.
//!
//! The service owns all domain state and the driven-port adapters; the
//! main loop owns the cadence. Nothing here blocks except the HTTP
//! transport during a poll, which the ports contract bounds with a
//! per-request timeout.

use log::{info, warn};

use crate::app::commands::Command;
use crate::app::events::AppEvent;
use crate::app::ports::{
    BeepPort, ConfigError, ConfigPort, ConnectivityPort, EventSink, HttpPort, NotifyPort,
    RenderData, RenderPort,
};
use crate::config::AppConfig;
use crate::display::cycle::ModeCycler;
use crate::display::evaluator::{self, EvaluationContext};
use crate::display::kinds::DisplayStateKind;
use crate::error::PollError;
use crate::glucose::alert::AlertCoordinator;
use crate::glucose::ingest::GlucoseIngestionService;
use crate::notify::NotifyCenter;

/// Dirty config is flushed to storage after this much quiet time, so a
/// burst of admin edits coalesces into one flash write.
pub const AUTO_SAVE_DELAY_MS: u64 = 5_000;

/// Point-in-time health snapshot for the admin/diagnostics surface.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub state: DisplayStateKind,
    pub wifi_connected: bool,
    pub failure_count: u32,
    pub last_http_status: u16,
    pub last_error: heapless::String<{ crate::glucose::ingest::MAX_ERROR_LEN }>,
    /// Milliseconds since the last valid reading; `None` = never.
    pub reading_age_ms: Option<u64>,
}

pub struct AppService<H, W, R, B, E, P>
where
    H: HttpPort,
    W: ConnectivityPort,
    R: RenderPort,
    B: BeepPort,
    E: EventSink,
    P: ConfigPort,
{
    http: H,
    wifi: W,
    render: R,
    beep: B,
    events: E,
    config_store: P,

    cfg: AppConfig,
    ingest: GlucoseIngestionService,
    alerts: AlertCoordinator,
    cycler: ModeCycler,
    notify: NotifyCenter,

    local_forced: Option<DisplayStateKind>,
    last_state: Option<DisplayStateKind>,
    /// Monotonic ms of the first unsaved config change; `None` = clean.
    dirty_since_ms: Option<u64>,
}

impl<H, W, R, B, E, P> AppService<H, W, R, B, E, P>
where
    H: HttpPort,
    W: ConnectivityPort,
    R: RenderPort,
    B: BeepPort,
    E: EventSink,
    P: ConfigPort,
{
    pub fn new(cfg: AppConfig, http: H, wifi: W, render: R, beep: B, mut events: E, config_store: P) -> Self {
        events.emit(&AppEvent::Started);
        let notify = NotifyCenter::new(cfg.notify_enabled);
        Self {
            http,
            wifi,
            render,
            beep,
            events,
            config_store,
            cfg,
            ingest: GlucoseIngestionService::new(),
            alerts: AlertCoordinator::new(),
            cycler: ModeCycler::new(),
            notify,
            local_forced: None,
            last_state: None,
            dirty_since_ms: None,
        }
    }

    /// One scheduler pass: poll if due, advance the cycle, arbitrate the
    /// display state, render, and run the alert policy.
    pub fn tick(&mut self, now_ms: u64) {
        self.notify.tick(now_ms);
        self.wifi.poll();

        let connected = self.wifi.is_connected();
        if connected && self.cfg.has_data_source() {
            if let Some(outcome) = self.ingest.poll(&mut self.http, &self.cfg, now_ms) {
                self.note_poll_outcome(outcome);
            }
        }

        let _ = self.cycler.tick(&self.cfg, now_ms);

        let ctx = EvaluationContext {
            uptime_ms: now_ms,
            wifi_connected: connected,
            wifi_credentials_configured: self.cfg.has_wifi_credentials(),
            source_configured: self.cfg.has_data_source(),
            notification_active: self.notify.has_active(),
            signals: self.ingest.signals(now_ms),
            stale_timeout_ms: self.cfg.stale_timeout_ms(),
            local_forced: self.local_forced,
            default_mode: self.cycler.current(),
        };
        let state = evaluator::evaluate(&ctx);

        if self.last_state != Some(state) {
            if let Some(from) = self.last_state {
                self.events.emit(&AppEvent::StateChanged { from, to: state });
                info!("Display: {} -> {}", from.name(), state.name());
            }
            self.last_state = Some(state);
        }

        let reading = self.ingest.reading();
        let message = match self.notify.active() {
            Some(n) => n.text.as_str(),
            None => reading.message.as_str(),
        };
        let data = RenderData {
            reading,
            message,
            delta: self.ingest.delta(),
            age_ms: self.ingest.time_since_last_reading(now_ms),
        };
        self.render.render(state, &data);

        if let Some(req) = self.alerts.tick(self.ingest.reading(), &self.cfg, now_ms) {
            self.beep.beep(req.count, req.freq_hz, req.duration_ms);
            self.events.emit(&AppEvent::AlertBeep {
                glucose_mg_dl: self.ingest.reading().glucose_mg_dl,
            });
        }
        self.beep.update(now_ms);

        self.auto_save_if_needed(now_ms);
    }

    /// Apply a control-surface command. Only `UpdateConfig` can fail.
    pub fn handle(&mut self, cmd: Command, now_ms: u64) -> Result<(), ConfigError> {
        match cmd {
            Command::NextMode => {
                self.cycler.next(&self.cfg, now_ms);
            }
            Command::PrevMode => {
                self.cycler.prev(&self.cfg, now_ms);
            }
            Command::SnoozeAlerts => {
                let minutes = self.cfg.alert_snooze_min;
                self.alerts.snooze(now_ms, minutes);
                self.events.emit(&AppEvent::Snoozed { minutes });
            }
            Command::ForceState(kind) => {
                self.local_forced = Some(kind);
            }
            Command::ClearForce => {
                self.local_forced = None;
            }
            Command::ForceFetch => {
                if self.cfg.has_data_source() {
                    let outcome = self.ingest.force_poll(&mut self.http, &self.cfg, now_ms);
                    self.note_poll_outcome(outcome);
                }
            }
            Command::Notify { text, duration_sec, urgent } => {
                let duration = if duration_sec == 0 {
                    self.cfg.notify_default_duration_sec
                } else {
                    duration_sec
                };
                self.notify.post(&text, duration, urgent, now_ms);
            }
            Command::DismissNotification => {
                self.notify.dismiss();
            }
            Command::UpdateConfig(new_cfg) => {
                new_cfg.validate().map_err(ConfigError::ValidationFailed)?;
                self.cfg = *new_cfg;
                self.notify.set_enabled(self.cfg.notify_enabled);
                if self.dirty_since_ms.is_none() {
                    self.dirty_since_ms = Some(now_ms);
                }
            }
            Command::SaveConfig => {
                self.save_config()?;
            }
        }
        Ok(())
    }

    /// Feed from whatever produces system metrics: flips the sysmon
    /// screen in and out of the mode rotation.
    pub fn set_sysmon_has_data(&mut self, has_data: bool) {
        self.cycler.set_sysmon_has_data(has_data);
    }

    /// Flush dirty config once the coalescing window has passed.
    fn auto_save_if_needed(&mut self, now_ms: u64) {
        if let Some(since) = self.dirty_since_ms {
            if now_ms.saturating_sub(since) >= AUTO_SAVE_DELAY_MS {
                if let Err(e) = self.save_config() {
                    // Stay dirty; retried next window.
                    warn!("Config auto-save failed: {e}");
                }
            }
        }
    }

    /// Write any pending config now (shutdown path).
    pub fn force_save_if_dirty(&mut self) {
        if self.dirty_since_ms.is_some() {
            if let Err(e) = self.save_config() {
                warn!("Config save on shutdown failed: {e}");
            }
        }
    }

    fn save_config(&mut self) -> Result<(), ConfigError> {
        self.config_store.save(&self.cfg)?;
        self.dirty_since_ms = None;
        self.events.emit(&AppEvent::ConfigSaved);
        Ok(())
    }

    fn note_poll_outcome(&mut self, outcome: Result<i32, PollError>) {
        match outcome {
            Ok(glucose) => self.events.emit(&AppEvent::ReadingReceived {
                glucose_mg_dl: glucose,
                delta: self.ingest.delta(),
            }),
            Err(error) => self.events.emit(&AppEvent::PollFailed {
                error,
                failures: self.ingest.failure_count(),
            }),
        }
    }

    // ── Introspection ─────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn current_state(&self) -> Option<DisplayStateKind> {
        self.last_state
    }

    pub fn diagnostics(&self, now_ms: u64) -> Diagnostics {
        Diagnostics {
            state: self.last_state.unwrap_or(DisplayStateKind::Boot),
            wifi_connected: self.wifi.is_connected(),
            failure_count: self.ingest.failure_count(),
            last_http_status: self.ingest.poll_state().last_http_status,
            last_error: self.ingest.poll_state().last_error.clone(),
            reading_age_ms: self.ingest.time_since_last_reading(now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{HttpResponse, MAX_BODY_LEN};
    use crate::error::HttpTransportError;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    // ── Test doubles sharing state with the test body ─────────

    #[derive(Clone, Default)]
    struct FakeHttp {
        script: Rc<RefCell<VecDeque<Result<HttpResponse, HttpTransportError>>>>,
    }

    impl FakeHttp {
        fn push_ok(&self, status: u16, body: &str) {
            let mut b: heapless::String<MAX_BODY_LEN> = heapless::String::new();
            b.push_str(body).unwrap();
            self.script
                .borrow_mut()
                .push_back(Ok(HttpResponse { status, body: b }));
        }
    }

    impl HttpPort for FakeHttp {
        fn get(&mut self, _url: &str, _bearer: Option<&str>) -> Result<HttpResponse, HttpTransportError> {
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(HttpTransportError::Connect))
        }

        fn post(&mut self, url: &str, body: &str) -> Result<HttpResponse, HttpTransportError> {
            let _ = (url, body);
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(HttpTransportError::Connect))
        }
    }

    #[derive(Clone)]
    struct FakeWifi {
        connected: Rc<RefCell<bool>>,
    }

    impl ConnectivityPort for FakeWifi {
        fn is_connected(&self) -> bool {
            *self.connected.borrow()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingRender {
        states: Rc<RefCell<Vec<DisplayStateKind>>>,
    }

    impl RenderPort for RecordingRender {
        fn render(&mut self, state: DisplayStateKind, _data: &RenderData<'_>) {
            self.states.borrow_mut().push(state);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingBeep {
        beeps: Rc<RefCell<Vec<(u8, u16, u16)>>>,
    }

    impl BeepPort for RecordingBeep {
        fn beep(&mut self, count: u8, freq_hz: u16, duration_ms: u16) {
            self.beeps.borrow_mut().push((count, freq_hz, duration_ms));
        }
    }

    #[derive(Clone, Default)]
    struct VecSink {
        events: Rc<RefCell<Vec<AppEvent>>>,
    }

    impl EventSink for VecSink {
        fn emit(&mut self, event: &AppEvent) {
            self.events.borrow_mut().push(*event);
        }
    }

    #[derive(Clone, Default)]
    struct MemConfigStore {
        saved: Rc<RefCell<Option<AppConfig>>>,
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

    struct Harness {
        svc: AppService<FakeHttp, FakeWifi, RecordingRender, RecordingBeep, VecSink, MemConfigStore>,
        http: FakeHttp,
        connected: Rc<RefCell<bool>>,
        states: Rc<RefCell<Vec<DisplayStateKind>>>,
        beeps: Rc<RefCell<Vec<(u8, u16, u16)>>>,
        events: Rc<RefCell<Vec<AppEvent>>>,
        saved: Rc<RefCell<Option<AppConfig>>>,
    }

    fn harness(cfg: AppConfig) -> Harness {
        let http = FakeHttp::default();
        let connected = Rc::new(RefCell::new(true));
        let render = RecordingRender::default();
        let beep = RecordingBeep::default();
        let sink = VecSink::default();
        let store = MemConfigStore::default();

        let states = render.states.clone();
        let beeps = beep.beeps.clone();
        let events = sink.events.clone();
        let saved = store.saved.clone();
        let svc = AppService::new(
            cfg,
            http.clone(),
            FakeWifi { connected: connected.clone() },
            render,
            beep,
            sink,
            store,
        );
        Harness { svc, http, connected, states, beeps, events, saved }
    }

    fn generic_cfg() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.wifi_ssid.push_str("HomeNet").unwrap();
        cfg.wifi_password.push_str("password1").unwrap();
        cfg.server_url.push_str("https://cgm.example/latest").unwrap();
        cfg.auto_cycle_enabled = false;
        cfg
    }

    #[test]
    fn cold_boot_renders_boot_then_glucose() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130,"trend":"Flat"}"#);
        h.svc.tick(100);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Boot));

        h.svc.tick(6_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Glucose));
        assert!(h.events.borrow().contains(&AppEvent::ReadingReceived {
            glucose_mg_dl: 130,
            delta: 0
        }));
    }

    #[test]
    fn state_changes_are_announced_once() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130}"#);
        h.svc.tick(100);
        h.svc.tick(6_000);
        h.svc.tick(7_000); // steady state, no new transition

        let events = h.events.borrow();
        let transitions: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, AppEvent::StateChanged { .. }))
            .collect();
        assert_eq!(transitions.len(), 1);
        assert_eq!(
            transitions[0],
            &AppEvent::StateChanged {
                from: DisplayStateKind::Boot,
                to: DisplayStateKind::Glucose
            }
        );
    }

    #[test]
    fn wifi_loss_flips_to_no_wifi_without_polling() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130}"#);
        h.svc.tick(100);
        h.svc.tick(6_000);

        *h.connected.borrow_mut() = false;
        // No response scripted: a poll attempt here would count a failure.
        h.svc.tick(70_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::NoWifi));
        assert!(!h.events.borrow().iter().any(|e| matches!(e, AppEvent::PollFailed { .. })));
    }

    #[test]
    fn unconfigured_source_shows_no_config() {
        let mut cfg = AppConfig::default();
        cfg.auto_cycle_enabled = false;
        let mut h = harness(cfg);
        h.svc.tick(6_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::NoConfig));
    }

    #[test]
    fn out_of_range_reading_beeps_through_the_beep_port() {
        let mut cfg = generic_cfg();
        cfg.alert_enabled = true;
        let mut h = harness(cfg);
        h.http.push_ok(200, r#"{"glucose":55}"#);
        h.svc.tick(6_000);
        assert_eq!(h.beeps.borrow().as_slice(), &[(1, 2000, 200)]);
        assert!(h.events.borrow().contains(&AppEvent::AlertBeep { glucose_mg_dl: 55 }));
    }

    #[test]
    fn snooze_command_silences_the_buzzer() {
        let mut cfg = generic_cfg();
        cfg.alert_enabled = true;
        let mut h = harness(cfg);
        h.http.push_ok(200, r#"{"glucose":55}"#);
        h.svc.tick(6_000);
        assert_eq!(h.beeps.borrow().len(), 1);

        h.svc.handle(Command::SnoozeAlerts, 7_000).unwrap();
        h.svc.tick(30_000);
        h.svc.tick(60_000);
        assert_eq!(h.beeps.borrow().len(), 1);
        assert!(h.events.borrow().contains(&AppEvent::Snoozed { minutes: 15 }));
    }

    #[test]
    fn force_state_pins_and_clears() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130}"#);
        h.svc.tick(6_000);

        h.svc.handle(Command::ForceState(DisplayStateKind::Time), 7_000).unwrap();
        h.svc.tick(8_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Time));

        h.svc.handle(Command::ClearForce, 9_000).unwrap();
        h.svc.tick(10_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Glucose));
    }

    #[test]
    fn notification_preempts_glucose_until_expiry() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130}"#);
        h.svc.tick(6_000);

        let mut text = heapless::String::new();
        text.push_str("dinner").unwrap();
        h.svc
            .handle(Command::Notify { text, duration_sec: 30, urgent: false }, 7_000)
            .unwrap();
        h.svc.tick(8_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Notify));

        h.svc.tick(37_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Glucose));
    }

    #[test]
    fn force_fetch_bypasses_the_interval_gate() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130}"#);
        h.svc.tick(6_000);

        h.http.push_ok(200, r#"{"glucose":140}"#);
        // Only seconds after the last poll, far inside the 60 s interval.
        h.svc.handle(Command::ForceFetch, 9_000).unwrap();
        assert!(h.events.borrow().contains(&AppEvent::ReadingReceived {
            glucose_mg_dl: 140,
            delta: 10
        }));
    }

    #[test]
    fn config_update_validates_then_auto_saves() {
        let mut h = harness(generic_cfg());

        let mut bad = generic_cfg();
        bad.thresh_low = 500;
        assert!(h.svc.handle(Command::UpdateConfig(Box::new(bad)), 1_000).is_err());

        let mut good = generic_cfg();
        good.stale_timeout_min = 45;
        h.svc.handle(Command::UpdateConfig(Box::new(good)), 1_000).unwrap();
        assert!(h.saved.borrow().is_none());

        // Save coalesces: nothing before the quiet window elapses.
        h.svc.tick(3_000);
        assert!(h.saved.borrow().is_none());
        h.svc.tick(6_000);
        assert_eq!(h.saved.borrow().as_ref().unwrap().stale_timeout_min, 45);
        assert!(h.events.borrow().contains(&AppEvent::ConfigSaved));
    }

    #[test]
    fn explicit_save_command_flushes_immediately() {
        let mut h = harness(generic_cfg());
        let mut cfg = generic_cfg();
        cfg.alert_snooze_min = 30;
        h.svc.handle(Command::UpdateConfig(Box::new(cfg)), 1_000).unwrap();
        h.svc.handle(Command::SaveConfig, 1_100).unwrap();
        assert_eq!(h.saved.borrow().as_ref().unwrap().alert_snooze_min, 30);
    }

    #[test]
    fn mode_commands_walk_the_cycle() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(200, r#"{"glucose":130}"#);
        h.svc.tick(6_000);

        h.svc.handle(Command::NextMode, 7_000).unwrap();
        h.svc.tick(8_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Time));

        h.svc.handle(Command::PrevMode, 9_000).unwrap();
        h.svc.tick(10_000);
        assert_eq!(h.states.borrow().last(), Some(&DisplayStateKind::Glucose));
    }

    #[test]
    fn diagnostics_reflect_failure_state() {
        let mut h = harness(generic_cfg());
        h.http.push_ok(503, "maintenance");
        h.svc.tick(6_000);
        let diag = h.svc.diagnostics(10_000);
        assert_eq!(diag.failure_count, 1);
        assert_eq!(diag.last_http_status, 503);
        assert!(diag.wifi_connected);
        assert_eq!(diag.reading_age_ms, None);
    }
}
