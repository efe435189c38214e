//! Glucose ingestion core — trend mapping, history, Dexcom session
//! lifecycle, dual-backend polling, and alert coordination.
//!
//! Everything here is pure logic over the [`HttpPort`](crate::app::ports::HttpPort)
//! boundary; no module in this tree touches a socket directly.

pub mod alert;
pub mod history;
pub mod ingest;
pub mod session;
pub mod trend;
