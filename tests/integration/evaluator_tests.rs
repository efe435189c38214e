//! Display arbitration over realistic timelines: a device booting into
//! steady state, and a backend outage degrading the screen step by step.

use glucomatrix::display::evaluator::{evaluate, EvaluationContext};
use glucomatrix::display::kinds::DisplayStateKind;
use glucomatrix::glucose::ingest::IngestionSignals;

fn ctx_at(uptime_ms: u64) -> EvaluationContext {
    EvaluationContext {
        uptime_ms,
        wifi_connected: true,
        wifi_credentials_configured: true,
        source_configured: true,
        notification_active: false,
        signals: IngestionSignals {
            failure_count: 0,
            ever_received: true,
            age_ms: Some(30_000),
            reading_valid: true,
            force_mode: None,
            has_message: false,
        },
        stale_timeout_ms: 1_200_000,
        local_forced: None,
        default_mode: DisplayStateKind::Glucose,
    }
}

#[test]
fn power_on_sequence_boot_wifi_data() {
    // t=0: boot screen regardless of anything else.
    let mut ctx = ctx_at(500);
    ctx.wifi_connected = false;
    ctx.signals.ever_received = false;
    ctx.signals.age_ms = None;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Boot);

    // t=3s: boot screen done, WiFi still associating.
    ctx.uptime_ms = 3_000;
    assert_eq!(evaluate(&ctx), DisplayStateKind::NoWifi);

    // t=4s: link up, first poll not landed yet — grace hides the gap.
    ctx.wifi_connected = true;
    ctx.uptime_ms = 4_000;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Glucose);

    // t=8s: still nothing — now it is an honest no-data condition.
    ctx.uptime_ms = 8_000;
    assert_eq!(evaluate(&ctx), DisplayStateKind::NoData);

    // First reading lands.
    ctx.signals.ever_received = true;
    ctx.signals.age_ms = Some(1_000);
    assert_eq!(evaluate(&ctx), DisplayStateKind::Glucose);
}

#[test]
fn backend_outage_degrades_stepwise() {
    // Healthy, then the backend goes dark while polls keep failing once
    // a minute. The reading ages in lockstep with the failure count.
    let mut ctx = ctx_at(3_600_000);

    for failures in 0u32..=12 {
        ctx.signals.failure_count = failures;
        ctx.signals.age_ms = Some(u64::from(failures) * 60_000);
        let state = evaluate(&ctx);
        let expected = if failures >= 10 {
            DisplayStateKind::NoData
        } else if failures >= 5 {
            DisplayStateKind::StaleWarning
        } else {
            DisplayStateKind::Glucose
        };
        assert_eq!(state, expected, "at {failures} consecutive failures");
    }
}

#[test]
fn stale_by_age_alone_without_failures() {
    // Backend answers but keeps returning the same old reading — e.g. a
    // sensor warm-up gap. No failures accrue, yet the age passes the
    // configured 20 min timeout.
    let mut ctx = ctx_at(7_200_000);
    ctx.signals.age_ms = Some(1_500_000);
    assert_eq!(evaluate(&ctx), DisplayStateKind::StaleWarning);
}

#[test]
fn override_ladder_resolves_in_order() {
    let mut ctx = ctx_at(60_000);
    ctx.notification_active = true;
    ctx.local_forced = Some(DisplayStateKind::Countdown);
    ctx.signals.force_mode = Some(DisplayStateKind::Weather);
    ctx.signals.has_message = true;

    assert_eq!(evaluate(&ctx), DisplayStateKind::Notify);
    ctx.notification_active = false;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Countdown);
    ctx.local_forced = None;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Weather);
    ctx.signals.force_mode = None;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Message);
    ctx.signals.has_message = false;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Glucose);
}

#[test]
fn factory_fresh_device_prompts_for_setup() {
    // Out of the box: no wifi credentials, no backend, link down. The
    // screen must ask for setup, not complain about a network that was
    // never configured.
    let mut ctx = ctx_at(60_000);
    ctx.wifi_connected = false;
    ctx.wifi_credentials_configured = false;
    ctx.source_configured = false;
    ctx.signals.ever_received = false;
    ctx.signals.age_ms = None;
    assert_eq!(evaluate(&ctx), DisplayStateKind::NoConfig);

    // Provisioning wifi flips the same situation into a link problem.
    ctx.wifi_credentials_configured = true;
    assert_eq!(evaluate(&ctx), DisplayStateKind::NoWifi);

    // Link up but still no backend: no setup prompt (wifi is usable),
    // no NoData either — there is no source to be missing data from.
    ctx.wifi_connected = true;
    assert_eq!(evaluate(&ctx), DisplayStateKind::Glucose);
}
