//! Application layer: the service loop, its ports, and the command and
//! event vocabulary of the control surface.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
