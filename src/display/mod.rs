//! Display-state decision logic.
//!
//! Decides *which* logical screen is active each tick and what color
//! class a glucose value belongs to. Pixel rendering lives behind the
//! [`RenderPort`](crate::app::ports::RenderPort) adapter boundary.

pub mod cycle;
pub mod evaluator;
pub mod kinds;
