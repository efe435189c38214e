//! Ulanzi TC001 GPIO pin map (ESP32-WROOM-32D).
//!
//! Single source of truth for the board wiring; drivers take these
//! instead of hard-coding numbers.

/// WS2812B RGB LED matrix data line (8x32 = 256 LEDs).
pub const PIN_MATRIX_DATA: u8 = 32;

pub const MATRIX_WIDTH: usize = 32;
pub const MATRIX_HEIGHT: usize = 8;
pub const MATRIX_NUM_LEDS: usize = MATRIX_WIDTH * MATRIX_HEIGHT;

// Buttons (active LOW with internal pull-up)
pub const PIN_BUTTON_LEFT: u8 = 26;
pub const PIN_BUTTON_MIDDLE: u8 = 27;
pub const PIN_BUTTON_RIGHT: u8 = 14;

pub const PIN_BUZZER: u8 = 15;

/// Light-dependent resistor (analog input), drives auto-brightness.
pub const PIN_LDR: u8 = 35;

/// Battery voltage divider (analog input).
pub const PIN_BATTERY: u8 = 34;

// I2C (DS1307 RTC)
pub const PIN_I2C_SDA: u8 = 21;
pub const PIN_I2C_SCL: u8 = 22;
