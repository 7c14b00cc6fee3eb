//! Sensor snapshot access and value normalization.
//!
//! The host platform hands the card a fresh snapshot every cycle. The card
//! never mutates it; it only reads through the [`SensorStore`] trait.
//!
//! # Normalization Rules
//!
//! | Reading | [`resolve_value`] | [`resolve_optional`] |
//! |---------|-------------------|----------------------|
//! | No id configured | `0` | `None` |
//! | Sensor absent | `0` | `None` |
//! | `unavailable` / `unknown` | `0` | `None` |
//! | Not a number | `NaN` | `None` |
//! | Unit `kW` / `kWh` (any case) | value x 1000 | value x 1000 |
//!
//! Arithmetic call sites pass results through [`finite_or_zero`] so that a
//! single bad sensor never poisons an aggregate.

use std::collections::HashMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

// =============================================================================
// Display Text
// =============================================================================

/// Maximum characters in one piece of display text.
pub const TEXT_CAPACITY: usize = 64;

/// Fixed-capacity display string used throughout the view state.
pub type Text = heapless::String<TEXT_CAPACITY>;

/// Copy `s` into a [`Text`], truncating at a character boundary when it does
/// not fit.
pub fn text(s: &str) -> Text {
    let mut out = Text::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// =============================================================================
// Readings
// =============================================================================

/// One sensor reading as published by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Raw state, e.g. `"1520.5"`, `"unavailable"`.
    pub state: String,
    #[serde(default, alias = "unit_of_measurement")]
    pub unit: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl SensorReading {
    pub fn new(state: impl Into<String>) -> Self { Self { state: state.into(), unit: None, friendly_name: None } }

    #[must_use]
    pub fn with_unit(
        mut self,
        unit: impl Into<String>,
    ) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn with_friendly_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// `false` for the host's `unavailable` / `unknown` markers.
    pub fn is_available(&self) -> bool {
        let state = self.state.trim();
        !(state.eq_ignore_ascii_case("unavailable") || state.eq_ignore_ascii_case("unknown"))
    }

    /// Whether the unit is kilowatt based and needs scaling to watts.
    pub fn is_kilo_unit(&self) -> bool {
        self.unit
            .as_deref()
            .map(str::trim)
            .is_some_and(|u| u.eq_ignore_ascii_case("kw") || u.eq_ignore_ascii_case("kwh"))
    }
}

/// Read-only access to the host's sensor states.
pub trait SensorStore {
    fn get(
        &self,
        id: &str,
    ) -> Option<&SensorReading>;
}

/// `HashMap` backed store. Used by tests, the simulator, and hosts that
/// deliver their states as JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorSnapshot {
    readings: HashMap<String, SensorReading>,
}

impl SensorSnapshot {
    pub fn new() -> Self { Self::default() }

    /// Insert or replace a reading.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        reading: SensorReading,
    ) {
        self.readings.insert(id.into(), reading);
    }

    /// Shorthand for a reading with a state and unit.
    pub fn set(
        &mut self,
        id: impl Into<String>,
        state: impl Into<String>,
        unit: &str,
    ) {
        self.insert(id, SensorReading::new(state).with_unit(unit));
    }

    pub fn remove(
        &mut self,
        id: &str,
    ) -> Option<SensorReading> {
        self.readings.remove(id)
    }

    pub fn len(&self) -> usize { self.readings.len() }

    pub fn is_empty(&self) -> bool { self.readings.is_empty() }
}

impl SensorStore for SensorSnapshot {
    fn get(
        &self,
        id: &str,
    ) -> Option<&SensorReading> {
        self.readings.get(id)
    }
}

impl<K: Into<String>> FromIterator<(K, SensorReading)> for SensorSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, SensorReading)>>(iter: I) -> Self {
        Self { readings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Whether a sensor id option holds anything.
#[inline]
pub fn is_configured(id: &str) -> bool { !id.trim().is_empty() }

/// Replace `NaN` and infinities with 0.
#[inline]
pub fn finite_or_zero(value: f64) -> f64 { if value.is_finite() { value } else { 0.0 } }

/// Numeric value of a sensor in base units (W, Wh, %).
///
/// Returns 0 for blank ids, absent sensors, and `unavailable`/`unknown`
/// states. Returns `NaN` when the state does not parse.
pub fn resolve_value(
    id: &str,
    store: &dyn SensorStore,
) -> f64 {
    let Some(reading) = available_reading(id, store) else {
        return 0.0;
    };
    match reading.state.trim().parse::<f64>() {
        Ok(value) if reading.is_kilo_unit() => value * 1000.0,
        Ok(value) => value,
        Err(_) => f64::NAN,
    }
}

/// Like [`resolve_value`] but `None` for anything that is not a usable number.
pub fn resolve_optional(
    id: &str,
    store: &dyn SensorStore,
) -> Option<f64> {
    let reading = available_reading(id, store)?;
    let value = reading.state.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if reading.is_kilo_unit() { value * 1000.0 } else { value })
}

/// Display name for a sensor: its friendly name, else the raw id, else
/// `"Unknown"` when no id is configured.
pub fn resolve_friendly_name(
    id: &str,
    store: &dyn SensorStore,
) -> Text {
    let id = id.trim();
    if id.is_empty() {
        return text("Unknown");
    }
    store
        .get(id)
        .and_then(|r| r.friendly_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| text(id), text)
}

/// Format a power value for display: `"1.52 kW"` or `"1520 W"`.
pub fn format_power(
    watts: f64,
    use_kilowatt: bool,
) -> Text {
    let watts = finite_or_zero(watts);
    let mut out = Text::new();
    if use_kilowatt {
        let _ = write!(out, "{:.2} kW", watts / 1000.0);
    } else {
        let _ = write!(out, "{} W", watts.round() as i64);
    }
    out
}

fn available_reading<'a>(
    id: &str,
    store: &'a dyn SensorStore,
) -> Option<&'a SensorReading> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    store.get(id).filter(|r| r.is_available())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SensorSnapshot {
        let mut s = SensorSnapshot::new();
        s.set("sensor.pv_w", "1520.4", "W");
        s.set("sensor.pv_kw", "5", "kW");
        s.set("sensor.pv_upper", "2", "KW");
        s.set("sensor.pv_mixed", "1.5", "Kw");
        s.set("sensor.daily", "12.3", "kWh");
        s.set("sensor.dead", "unavailable", "W");
        s.set("sensor.unknown", "unknown", "W");
        s.set("sensor.garbage", "abc", "W");
        s.insert("sensor.named", SensorReading::new("10").with_friendly_name("Garage Battery"));
        s
    }

    // =========================================================================
    // Value Resolution Tests
    // =========================================================================

    #[test]
    fn test_missing_and_unavailable_resolve_to_zero() {
        let s = snapshot();
        assert_eq!(resolve_value("", &s), 0.0, "blank id");
        assert_eq!(resolve_value("   ", &s), 0.0, "whitespace id");
        assert_eq!(resolve_value("sensor.absent", &s), 0.0, "absent sensor");
        assert_eq!(resolve_value("sensor.dead", &s), 0.0, "unavailable");
        assert_eq!(resolve_value("sensor.unknown", &s), 0.0, "unknown");
    }

    #[test]
    fn test_kilowatt_units_scale() {
        let s = snapshot();
        assert_eq!(resolve_value("sensor.pv_kw", &s), 5000.0);
        assert_eq!(resolve_value("sensor.pv_upper", &s), 2000.0, "KW scales");
        assert_eq!(resolve_value("sensor.pv_mixed", &s), 1500.0, "Kw scales");
        assert_eq!(resolve_value("sensor.daily", &s), 12300.0, "kWh scales");
        assert_eq!(resolve_value("sensor.pv_w", &s), 1520.4, "W is left alone");
    }

    #[test]
    fn test_unparseable_is_nan() {
        let s = snapshot();
        assert!(resolve_value("sensor.garbage", &s).is_nan());
        assert_eq!(finite_or_zero(resolve_value("sensor.garbage", &s)), 0.0);
    }

    #[test]
    fn test_resolve_optional() {
        let s = snapshot();
        assert_eq!(resolve_optional("sensor.pv_kw", &s), Some(5000.0));
        assert_eq!(resolve_optional("sensor.dead", &s), None);
        assert_eq!(resolve_optional("sensor.garbage", &s), None);
        assert_eq!(resolve_optional("", &s), None);
    }

    #[test]
    fn test_friendly_name_fallbacks() {
        let s = snapshot();
        assert_eq!(resolve_friendly_name("sensor.named", &s).as_str(), "Garage Battery");
        assert_eq!(resolve_friendly_name("sensor.pv_w", &s).as_str(), "sensor.pv_w", "raw id fallback");
        assert_eq!(resolve_friendly_name("", &s).as_str(), "Unknown");
    }

    // =========================================================================
    // Formatting Tests
    // =========================================================================

    #[test]
    fn test_format_power() {
        assert_eq!(format_power(1520.4, false).as_str(), "1520 W");
        assert_eq!(format_power(1520.4, true).as_str(), "1.52 kW");
        assert_eq!(format_power(0.0, true).as_str(), "0.00 kW");
        assert_eq!(format_power(-200.0, false).as_str(), "-200 W");
        assert_eq!(format_power(f64::NAN, false).as_str(), "0 W", "NaN formats as zero");
        assert_eq!(format_power(-0.3, false).as_str(), "0 W", "no negative zero");
    }

    #[test]
    fn test_text_truncates() {
        let long = "x".repeat(TEXT_CAPACITY + 10);
        assert_eq!(text(&long).len(), TEXT_CAPACITY);
        assert_eq!(text("short").as_str(), "short");
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{ "sensor.a": { "state": "3", "unit_of_measurement": "kW" } }"#;
        let s: SensorSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(resolve_value("sensor.a", &s), 3000.0);
    }
}
