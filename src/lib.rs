//! GlucoMatrix firmware library.
//!
//! The domain core (ingestion, display arbitration, alerts, config) is
//! plain portable Rust so the host test suites can drive it directly;
//! anything that touches ESP-IDF sits behind
//! `#[cfg(target_os = "espidf")]` inside the adapter and driver
//! modules.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod glucose;
pub mod notify;

pub mod pins;

pub mod adapters;
pub mod drivers;
