//! Full service lifecycle against mock adapters: boot to steady state,
//! alerting and snooze, server overrides, and config persistence.

use glucomatrix::app::commands::Command;
use glucomatrix::app::events::AppEvent;
use glucomatrix::app::service::AppService;
use glucomatrix::config::AppConfig;
use glucomatrix::display::kinds::DisplayStateKind;

use crate::mock_net::{FakeHttp, FakeWifi, MemConfigStore, RecordingBeep, RecordingRender, VecSink};

type TestService =
    AppService<FakeHttp, FakeWifi, RecordingRender, RecordingBeep, VecSink, MemConfigStore>;

struct World {
    svc: TestService,
    http: FakeHttp,
    wifi: FakeWifi,
    render: RecordingRender,
    beep: RecordingBeep,
    sink: VecSink,
    store: MemConfigStore,
}

fn world(cfg: AppConfig) -> World {
    let http = FakeHttp::default();
    let wifi = FakeWifi::up();
    let render = RecordingRender::default();
    let beep = RecordingBeep::default();
    let sink = VecSink::default();
    let store = MemConfigStore::default();
    let svc = AppService::new(
        cfg,
        http.clone(),
        wifi.clone(),
        render.clone(),
        beep.clone(),
        sink.clone(),
        store.clone(),
    );
    World { svc, http, wifi, render, beep, sink, store }
}

fn cfg_with_source() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.wifi_ssid.push_str("HomeNet").unwrap();
    cfg.wifi_password.push_str("password1").unwrap();
    cfg.server_url.push_str("https://cgm.example/latest").unwrap();
    cfg.auto_cycle_enabled = false;
    cfg
}

#[test]
fn boot_to_steady_glucose() {
    let mut w = world(cfg_with_source());
    w.http.push_ok(200, r#"{"glucose":118,"trend":"Flat"}"#);

    w.svc.tick(100); // boot screen, first poll fires
    w.svc.tick(1_000);
    w.svc.tick(6_000);

    let states = w.render.states.borrow();
    assert_eq!(states.first(), Some(&DisplayStateKind::Boot));
    assert_eq!(states.last(), Some(&DisplayStateKind::Glucose));
    assert!(w
        .sink
        .events
        .borrow()
        .contains(&AppEvent::ReadingReceived { glucose_mg_dl: 118, delta: 0 }));
}

#[test]
fn wifi_outage_and_recovery() {
    let mut w = world(cfg_with_source());
    w.http.push_ok(200, r#"{"glucose":118}"#);
    w.svc.tick(100);
    w.svc.tick(6_000);
    assert_eq!(w.render.last(), Some(DisplayStateKind::Glucose));

    *w.wifi.connected.borrow_mut() = false;
    w.svc.tick(10_000);
    assert_eq!(w.render.last(), Some(DisplayStateKind::NoWifi));

    *w.wifi.connected.borrow_mut() = true;
    w.svc.tick(11_000);
    assert_eq!(w.render.last(), Some(DisplayStateKind::Glucose));
}

#[test]
fn sustained_outage_walks_stale_then_no_data() {
    let mut w = world(cfg_with_source());
    w.http.push_ok(200, r#"{"glucose":118}"#);
    w.svc.tick(100);

    // Twelve failed polls, one per minute; the script stays empty so
    // every attempt reports the host unreachable.
    let mut last = DisplayStateKind::Glucose;
    for i in 1..=12u64 {
        w.svc.tick(i * 60_000);
        last = w.render.last().unwrap();
    }
    assert_eq!(last, DisplayStateKind::NoData);
    assert!(w
        .render
        .states
        .borrow()
        .contains(&DisplayStateKind::StaleWarning));
}

#[test]
fn server_force_mode_flips_the_screen() {
    let mut w = world(cfg_with_source());
    w.http.push_ok(200, r#"{"glucose":118,"force_mode":2}"#);
    w.svc.tick(100);
    w.svc.tick(6_000);
    assert_eq!(w.render.last(), Some(DisplayStateKind::Time));

    // Next reading withdraws the override.
    w.http.push_ok(200, r#"{"glucose":121}"#);
    w.svc.tick(61_000);
    assert_eq!(w.render.last(), Some(DisplayStateKind::Glucose));
}

#[test]
fn low_glucose_beeps_until_snoozed() {
    let mut cfg = cfg_with_source();
    cfg.alert_enabled = true;
    let mut w = world(cfg);
    w.http.push_ok(200, r#"{"glucose":52}"#);
    w.svc.tick(6_000);
    assert_eq!(w.beep.beeps.borrow().as_slice(), &[(1, 2000, 200)]);

    // Beeps repeat on the 10 s interval while the condition holds.
    w.svc.tick(12_000);
    w.svc.tick(16_000);
    assert_eq!(w.beep.beeps.borrow().len(), 2);

    w.svc.handle(Command::SnoozeAlerts, 17_000).unwrap();
    w.svc.tick(30_000);
    w.svc.tick(50_000);
    assert_eq!(w.beep.beeps.borrow().len(), 2);
}

#[test]
fn config_round_trips_through_the_store() {
    let mut w = world(cfg_with_source());
    let mut cfg = cfg_with_source();
    cfg.stale_timeout_min = 45;
    cfg.alert_enabled = true;
    w.svc.handle(Command::UpdateConfig(Box::new(cfg)), 1_000).unwrap();
    w.svc.handle(Command::SaveConfig, 1_100).unwrap();

    let stored = w.store.saved.borrow().clone().unwrap();
    assert_eq!(stored.stale_timeout_min, 45);
    assert!(stored.alert_enabled);
    assert_eq!(w.svc.config().stale_timeout_min, 45);
}

#[test]
fn diagnostics_surface_matches_poll_state() {
    let mut w = world(cfg_with_source());
    w.http.push_ok(404, "not here");
    w.svc.tick(6_000);
    let diag = w.svc.diagnostics(7_000);
    assert_eq!(diag.failure_count, 1);
    assert_eq!(diag.last_http_status, 404);
    assert_eq!(diag.state, DisplayStateKind::NoData);
    assert_eq!(diag.reading_age_ms, None);
}
