//! Board drivers for the Ulanzi TC001: LED matrix, buzzer, watchdog.

pub mod buzzer;
pub mod matrix;
pub mod watchdog;
