//! Canonical glucose trend classification.
//!
//! The two backends disagree about how a trend is spelled: the generic
//! backend sends string tokens ("Flat", "SingleUp", ...), Dexcom Share
//! sends either those tokens or the numeric codes 1–7. The raw shape is
//! decoded once at the JSON boundary into [`TrendRaw`] and then mapped
//! here; everything downstream sees only [`TrendKind`].

use serde::Deserialize;

/// The six canonical trend categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendKind {
    RisingFast,
    Rising,
    Flat,
    Falling,
    FallingFast,
    #[default]
    Unknown,
}

impl TrendKind {
    /// Short display name, as drawn next to the glucose number.
    pub fn name(self) -> &'static str {
        match self {
            Self::RisingFast => "RISING_FAST",
            Self::Rising => "RISING",
            Self::Flat => "FLAT",
            Self::Falling => "FALLING",
            Self::FallingFast => "FALLING_FAST",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Trend as it appears on the wire, before mapping.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TrendRaw {
    /// Dexcom numeric code (1 = DoubleUp ... 7 = DoubleDown).
    Code(i64),
    /// String token, case-insensitive.
    Text(String),
}

/// Map any raw trend representation to its canonical kind.
///
/// Total function: unrecognized tokens and out-of-range codes map to
/// [`TrendKind::Unknown`].
pub fn map(raw: &TrendRaw) -> TrendKind {
    match raw {
        TrendRaw::Code(code) => map_code(*code),
        TrendRaw::Text(token) => map_token(token),
    }
}

/// Dexcom numeric trend codes, 1–7 in falling order of ascent.
pub fn map_code(code: i64) -> TrendKind {
    match code {
        1 => TrendKind::RisingFast,  // DoubleUp
        2 | 3 => TrendKind::Rising,  // SingleUp, FortyFiveUp
        4 => TrendKind::Flat,
        5 | 6 => TrendKind::Falling, // FortyFiveDown, SingleDown
        7 => TrendKind::FallingFast, // DoubleDown
        _ => TrendKind::Unknown,
    }
}

/// String tokens: Dexcom names plus the long-form aliases the generic
/// backend uses.
pub fn map_token(token: &str) -> TrendKind {
    if token.eq_ignore_ascii_case("DoubleUp") || token.eq_ignore_ascii_case("RisingFast") {
        TrendKind::RisingFast
    } else if token.eq_ignore_ascii_case("SingleUp")
        || token.eq_ignore_ascii_case("FortyFiveUp")
        || token.eq_ignore_ascii_case("Rising")
    {
        TrendKind::Rising
    } else if token.eq_ignore_ascii_case("Flat") {
        TrendKind::Flat
    } else if token.eq_ignore_ascii_case("SingleDown")
        || token.eq_ignore_ascii_case("FortyFiveDown")
        || token.eq_ignore_ascii_case("Falling")
    {
        TrendKind::Falling
    } else if token.eq_ignore_ascii_case("DoubleDown") || token.eq_ignore_ascii_case("FallingFast")
    {
        TrendKind::FallingFast
    } else {
        TrendKind::Unknown
    }
}
