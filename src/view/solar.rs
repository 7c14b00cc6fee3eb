//! Solar readout and daily yield.
//!
//! Each array's power comes from its total sensor when one is configured,
//! otherwise from the sum of its string sensors. The readout picks one of four
//! layouts:
//!
//! 1. Both arrays producing: total, array 1, array 2.
//! 2. Per-string display enabled: total, then one line per configured string.
//! 3. Exactly two strings configured: one line per string.
//! 4. Otherwise: a single total line.
//!
//! The chosen lines are centered as a block on [`SOLAR_ANCHOR`]; the remaining
//! slots are hidden.

use std::fmt::Write;

use embedded_graphics::prelude::Point;
use heapless::Vec;

use super::{TextFragment, labeled_power, numbered};
use crate::colors::Color;
use crate::config::layout::{SOLAR_ANCHOR, SOLAR_SLOT_COUNT, stacked_line_y};
use crate::config::{Config, PV_STRINGS_PER_ARRAY};
use crate::locale::{Label, label};
use crate::sensors::{SensorStore, Text, finite_or_zero, resolve_value, text};
use crate::thresholds::ACTIVITY_FLOOR_W;

/// Resolved PV production.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolarReadings {
    pub array1_w: f64,
    /// `None` when array 2 has no sensors.
    pub array2_w: Option<f64>,
    /// Configured array 1 strings as `(string number, watts)`.
    pub strings: Vec<(usize, f64), PV_STRINGS_PER_ARRAY>,
}

impl SolarReadings {
    pub fn total_w(&self) -> f64 { self.array1_w + self.array2_w.unwrap_or(0.0) }
}

pub fn read(
    config: &Config,
    store: &dyn SensorStore,
) -> SolarReadings {
    let sensors = &config.sensors;

    let mut strings = Vec::new();
    for (i, id) in sensors.pv_strings.iter().enumerate() {
        if !id.is_empty() {
            // Capacity equals the number of string options.
            strings.push((i + 1, finite_or_zero(resolve_value(id, store)))).ok();
        }
    }

    let array1_w = if sensors.pv_total.is_empty() {
        strings.iter().map(|(_, watts)| watts).sum::<f64>()
    } else {
        finite_or_zero(resolve_value(&sensors.pv_total, store))
    };

    let array2_w = sensors.has_array2().then(|| {
        if sensors.pv_total_secondary.is_empty() {
            sensors
                .pv_array2_strings
                .iter()
                .filter(|id| !id.is_empty())
                .map(|id| finite_or_zero(resolve_value(id, store)))
                .sum::<f64>()
        } else {
            finite_or_zero(resolve_value(&sensors.pv_total_secondary, store))
        }
    });

    SolarReadings { array1_w, array2_w, strings }
}

/// Readout lines, one fragment per slot.
pub fn lines(
    config: &Config,
    readings: &SolarReadings,
) -> [TextFragment; SOLAR_SLOT_COUNT] {
    let kw = config.uses_kilowatt();
    let color = config.palette.pv_text;
    let total_label = label(config.language, Label::PvTotal);

    let mut content: Vec<(Text, Color), SOLAR_SLOT_COUNT> = Vec::new();
    let mut push = |line: Text, color: Color| {
        content.push((line, color)).ok();
    };

    let both_producing =
        readings.array1_w > ACTIVITY_FLOOR_W && readings.array2_w.is_some_and(|watts| watts > ACTIVITY_FLOOR_W);

    if both_producing {
        let array = label(config.language, Label::Array);
        let array2_name = config.pv_array2_name.as_deref().map_or_else(|| numbered(array, 2), text);
        push(labeled_power(total_label, readings.total_w(), kw), color);
        push(labeled_power(&numbered(array, 1), readings.array1_w, kw), color);
        push(labeled_power(&array2_name, readings.array2_w.unwrap_or(0.0), kw), config.palette.pv_secondary);
    } else if config.show_pv_strings && !readings.strings.is_empty() {
        push(labeled_power(total_label, readings.total_w(), kw), color);
        for &(n, watts) in &readings.strings {
            push(labeled_power(&string_label(n), watts, kw), color);
        }
    } else if readings.strings.len() == 2 {
        for &(n, watts) in &readings.strings {
            push(labeled_power(&string_label(n), watts, kw), color);
        }
    } else {
        push(labeled_power(total_label, readings.total_w(), kw), color);
    }

    let count = content.len();
    let font = config.fonts.pv;
    std::array::from_fn(|slot| match content.get(slot) {
        Some((line, line_color)) => TextFragment::new(
            line.clone(),
            Point::new(SOLAR_ANCHOR.x, stacked_line_y(SOLAR_ANCHOR.y, slot, count)),
            font,
            *line_color,
        ),
        None => TextFragment::hidden(SOLAR_ANCHOR, font, color),
    })
}

/// `"S{n}"`.
fn string_label(n: usize) -> Text {
    let mut out = Text::new();
    let _ = write!(out, "S{n}");
    out
}

/// Daily yield in kWh from up to two daily sensors.
pub fn daily_kwh(
    config: &Config,
    store: &dyn SensorStore,
) -> f64 {
    let sensors = &config.sensors;
    let wh = finite_or_zero(resolve_value(&sensors.daily, store))
        + finite_or_zero(resolve_value(&sensors.daily_array2, store));
    wh / 1000.0
}

/// `"12.3 kWh"`.
pub fn format_daily(kwh: f64) -> Text {
    let mut out = Text::new();
    let _ = write!(out, "{:.1} kWh", finite_or_zero(kwh));
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sensors::SensorSnapshot;

    fn setup(
        options: serde_json::Value,
        states: &[(&str, &str)],
    ) -> (Config, SensorSnapshot) {
        let config = Config::from_value(options).unwrap();
        let mut s = SensorSnapshot::new();
        for (id, state) in states {
            s.set(*id, *state, "W");
        }
        (config, s)
    }

    fn visible_texts(lines: &[TextFragment]) -> std::vec::Vec<&str> {
        lines.iter().filter(|l| l.visible).map(|l| l.text.as_str()).collect()
    }

    // =========================================================================
    // Aggregation Tests
    // =========================================================================

    #[test]
    fn test_total_sensor_wins_over_strings() {
        let (c, s) = setup(
            json!({ "sensor_pv_total": "sensor.total", "sensor_pv1": "sensor.s1" }),
            &[("sensor.total", "2000"), ("sensor.s1", "500")],
        );
        assert_eq!(read(&c, &s).array1_w, 2000.0);
    }

    #[test]
    fn test_strings_are_summed() {
        let (c, s) = setup(
            json!({ "sensor_pv1": "sensor.s1", "sensor_pv3": "sensor.s3" }),
            &[("sensor.s1", "500"), ("sensor.s3", "abc")],
        );
        let r = read(&c, &s);
        assert_eq!(r.array1_w, 500.0, "unparseable string counts as 0");
        assert_eq!(r.strings.as_slice(), &[(1, 500.0), (3, 0.0)]);
        assert_eq!(r.array2_w, None);
    }

    #[test]
    fn test_array2_total() {
        let (c, s) = setup(
            json!({ "sensor_pv1": "sensor.s1", "sensor_pv_array2_1": "sensor.a", "sensor_pv_array2_2": "sensor.b" }),
            &[("sensor.s1", "100"), ("sensor.a", "40"), ("sensor.b", "60")],
        );
        let r = read(&c, &s);
        assert_eq!(r.array2_w, Some(100.0));
        assert_eq!(r.total_w(), 200.0);
    }

    // =========================================================================
    // Line Layout Tests
    // =========================================================================

    #[test]
    fn test_both_arrays_three_lines() {
        let (c, s) = setup(
            json!({ "sensor_pv_total": "sensor.a1", "sensor_pv_total_secondary": "sensor.a2", "pv_array2_name": "Garage" }),
            &[("sensor.a1", "1000"), ("sensor.a2", "500")],
        );
        let lines = lines(&c, &read(&c, &s));
        assert_eq!(visible_texts(&lines), ["PV TOT: 1500 W", "Array 1: 1000 W", "Garage: 500 W"]);
        assert_eq!(lines[2].fill, c.palette.pv_secondary);
    }

    #[test]
    fn test_array2_idle_falls_back_to_total() {
        let (c, s) = setup(
            json!({ "sensor_pv_total": "sensor.a1", "sensor_pv_total_secondary": "sensor.a2" }),
            &[("sensor.a1", "1000"), ("sensor.a2", "5")],
        );
        assert_eq!(visible_texts(&lines(&c, &read(&c, &s))), ["PV TOT: 1005 W"]);
    }

    #[test]
    fn test_per_string_lines() {
        let (c, s) = setup(
            json!({
                "show_pv_strings": true,
                "sensor_pv1": "sensor.s1",
                "sensor_pv2": "sensor.s2",
                "sensor_pv3": "sensor.s3",
            }),
            &[("sensor.s1", "100"), ("sensor.s2", "200"), ("sensor.s3", "300")],
        );
        let lines = lines(&c, &read(&c, &s));
        assert_eq!(visible_texts(&lines), ["PV TOT: 600 W", "S1: 100 W", "S2: 200 W", "S3: 300 W"]);
        assert_eq!(lines.iter().filter(|l| !l.visible).count(), SOLAR_SLOT_COUNT - 4);
    }

    #[test]
    fn test_all_strings_fill_every_slot() {
        let (c, s) = setup(
            json!({
                "show_pv_strings": true,
                "sensor_pv1": "sensor.s1",
                "sensor_pv2": "sensor.s2",
                "sensor_pv3": "sensor.s3",
                "sensor_pv4": "sensor.s4",
                "sensor_pv5": "sensor.s5",
                "sensor_pv6": "sensor.s6",
            }),
            &[
                ("sensor.s1", "10"),
                ("sensor.s2", "20"),
                ("sensor.s3", "30"),
                ("sensor.s4", "40"),
                ("sensor.s5", "50"),
                ("sensor.s6", "60"),
            ],
        );
        let r = read(&c, &s);
        assert_eq!(r.strings.len(), PV_STRINGS_PER_ARRAY, "every string fits");
        let lines = lines(&c, &r);
        assert!(lines.iter().all(|l| l.visible), "total plus six strings use all slots");
        assert_eq!(lines[0].text.as_str(), "PV TOT: 210 W");
        assert_eq!(lines[SOLAR_SLOT_COUNT - 1].text.as_str(), "S6: 60 W");
    }

    #[test]
    fn test_two_strings_without_opt_in() {
        let (c, s) = setup(
            json!({ "sensor_pv1": "sensor.s1", "sensor_pv2": "sensor.s2" }),
            &[("sensor.s1", "100"), ("sensor.s2", "200")],
        );
        assert_eq!(visible_texts(&lines(&c, &read(&c, &s))), ["S1: 100 W", "S2: 200 W"]);
    }

    #[test]
    fn test_lines_centered_on_anchor() {
        let (c, s) = setup(
            json!({ "sensor_pv1": "sensor.s1", "sensor_pv2": "sensor.s2" }),
            &[("sensor.s1", "100"), ("sensor.s2", "200")],
        );
        let pair = lines(&c, &read(&c, &s));
        let first = pair[0].position.y;
        let second = pair[1].position.y;
        assert_eq!(first + second, 2 * SOLAR_ANCHOR.y, "block is centered");
        assert!(second > first);

        let (c, s) = setup(json!({}), &[]);
        let single = lines(&c, &read(&c, &s));
        assert_eq!(single[0].position, SOLAR_ANCHOR, "single line sits on the anchor");
    }

    // =========================================================================
    // Daily Yield Tests
    // =========================================================================

    #[test]
    fn test_daily_yield_sums_sensors() {
        let c = Config::from_value(json!({ "sensor_daily": "sensor.d1", "sensor_daily_array2": "sensor.d2" })).unwrap();
        let mut s = SensorSnapshot::new();
        s.set("sensor.d1", "12.25", "kWh");
        s.set("sensor.d2", "800", "Wh");
        let kwh = daily_kwh(&c, &s);
        assert!((kwh - 13.05).abs() < 1e-9);
        assert_eq!(format_daily(kwh).as_str(), "13.1 kWh");
    }
}
