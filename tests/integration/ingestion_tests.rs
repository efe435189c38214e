//! End-to-end ingestion flows against a scripted HTTP transport: both
//! backends, session reuse across polls, and failure accounting over a
//! realistic timeline.

use glucomatrix::config::{AppConfig, DataSource};
use glucomatrix::error::{AuthError, HttpTransportError, PollError};
use glucomatrix::glucose::ingest::GlucoseIngestionService;
use glucomatrix::glucose::trend::TrendKind;

use crate::mock_net::FakeHttp;

fn generic_cfg() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.server_url.push_str("https://cgm.example/latest").unwrap();
    cfg.auth_token.push_str("tok_abc123").unwrap();
    cfg
}

fn dexcom_cfg() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.data_source = DataSource::DexcomShare;
    cfg.dexcom_username.push_str("user@example.com").unwrap();
    cfg.dexcom_password.push_str("hunter22").unwrap();
    cfg
}

#[test]
fn generic_backend_full_day_of_polls() {
    let mut svc = GlucoseIngestionService::new();
    let mut http = FakeHttp::default();
    let cfg = generic_cfg();

    // Six readings a minute apart, drifting upward.
    let values = [110, 114, 119, 125, 128, 130];
    for (i, v) in values.iter().enumerate() {
        http.push_ok(200, &format!(r#"{{"glucose":{v},"trend":"FortyFiveUp"}}"#));
        let now = i as u64 * 60_000;
        assert_eq!(svc.poll(&mut http, &cfg, now), Some(Ok(*v)));
    }

    assert_eq!(svc.reading().glucose_mg_dl, 130);
    assert_eq!(svc.reading().trend, TrendKind::Rising);
    assert_eq!(svc.delta(), 2); // 130 - 128
    assert_eq!(svc.history_len(), 6);

    let history = svc.read_history(48);
    assert_eq!(history.first().unwrap().glucose, 110);
    assert_eq!(history.last().unwrap().glucose, 130);
    assert_eq!(history[1].delta, 4);
}

#[test]
fn generic_backend_sends_bearer_to_configured_url() {
    let mut svc = GlucoseIngestionService::new();
    let http = FakeHttp::default();
    http.push_ok(200, r#"{"glucose":100}"#);
    let mut transport = http.clone();
    svc.force_poll(&mut transport, &generic_cfg(), 0).unwrap();
    assert_eq!(
        http.requests.borrow().as_slice(),
        &["https://cgm.example/latest".to_string()]
    );
}

#[test]
fn dexcom_login_once_then_reads_until_expiry() {
    let mut svc = GlucoseIngestionService::new();
    let http = FakeHttp::default();
    let cfg = dexcom_cfg();

    // First poll: account auth, session login, then the read.
    http.push_ok(200, "\"account-guid-1234\"");
    http.push_ok(200, "\"session-guid-5678\"");
    http.push_ok(200, r#"[{"Value":140,"Trend":4,"WT":"Date(1700000000000)"}]"#);
    let mut transport = http.clone();
    assert_eq!(svc.force_poll(&mut transport, &cfg, 0), Ok(140));

    {
        let requests = http.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].contains("AuthenticatePublisherAccount"));
        assert!(requests[1].contains("LoginPublisherAccountById"));
        assert!(requests[2].contains("ReadPublisherLatestGlucoseValues"));
        assert!(requests[2].contains("sessionId=session-guid-5678"));
        assert!(requests[2].contains("minutes=10&maxCount=1"));
    }

    // Second poll inside the session TTL: read only, no handshake.
    http.push_ok(200, r#"[{"Value":145,"Trend":4,"WT":"Date(1700000300000)"}]"#);
    assert_eq!(svc.force_poll(&mut transport, &cfg, 300_000), Ok(145));
    assert_eq!(http.requests.borrow().len(), 4);
    assert_eq!(svc.delta(), 5);

    // Past the one-hour TTL the handshake runs again.
    http.push_ok(200, "\"account-guid-1234\"");
    http.push_ok(200, "\"session-guid-9999\"");
    http.push_ok(200, r#"[{"Value":150,"Trend":4,"WT":"Date(1700003700000)"}]"#);
    assert_eq!(svc.force_poll(&mut transport, &cfg, 3_700_000), Ok(150));
    assert!(http
        .requests
        .borrow()
        .last()
        .unwrap()
        .contains("sessionId=session-guid-9999"));
}

#[test]
fn dexcom_share_not_enabled_is_terminal_per_poll() {
    let mut svc = GlucoseIngestionService::new();
    let http = FakeHttp::default();
    http.push_ok(200, "\"account-guid-1234\"");
    http.push_ok(200, "\"00000000-0000-0000-0000-000000000000\"");
    let mut transport = http.clone();
    assert_eq!(
        svc.force_poll(&mut transport, &dexcom_cfg(), 0),
        Err(PollError::Auth(AuthError::ShareNotEnabled))
    );
    // No read request was attempted after the null-GUID login.
    assert_eq!(http.requests.borrow().len(), 2);
    assert!(!svc.ever_received());
}

#[test]
fn mixed_failures_accumulate_then_one_success_clears() {
    let mut svc = GlucoseIngestionService::new();
    let http = FakeHttp::default();
    let cfg = generic_cfg();
    let mut transport = http.clone();

    http.push_err(HttpTransportError::Connect);
    http.push_ok(500, "oops");
    http.push_ok(200, "garbage");
    http.push_ok(200, r#"{"glucose":-5}"#);
    for i in 0..4u64 {
        assert!(svc.force_poll(&mut transport, &cfg, i * 60_000).is_err());
    }
    assert_eq!(svc.failure_count(), 4);
    assert!(!svc.ever_received());

    http.push_ok(200, r#"{"glucose":122}"#);
    assert_eq!(svc.force_poll(&mut transport, &cfg, 300_000), Ok(122));
    assert_eq!(svc.failure_count(), 0);
    assert!(svc.ever_received());
    assert_eq!(svc.time_since_last_reading(360_000), Some(60_000));
}

#[test]
fn signals_expose_freshness_for_the_evaluator() {
    let mut svc = GlucoseIngestionService::new();
    let http = FakeHttp::default();
    http.push_ok(200, r#"{"glucose":122,"message":"hi","force_mode":3}"#);
    let mut transport = http.clone();
    svc.force_poll(&mut transport, &generic_cfg(), 10_000).unwrap();

    let sig = svc.signals(70_000);
    assert!(sig.ever_received);
    assert!(sig.reading_valid);
    assert_eq!(sig.age_ms, Some(60_000));
    assert_eq!(sig.failure_count, 0);
    assert!(sig.has_message);
    assert_eq!(
        sig.force_mode,
        Some(glucomatrix::display::kinds::DisplayStateKind::Weather)
    );
}
