//! House load readout.
//!
//! With a second inverter load configured the readout shows three lines
//! (house total, inverter 1, inverter 2); otherwise a single power value.

use embedded_graphics::prelude::Point;

use super::{TextFragment, labeled_power, numbered};
use crate::config::Config;
use crate::config::layout::{LOAD_ANCHOR, LOAD_SLOT_COUNT, stacked_line_y};
use crate::locale::{Label, label};
use crate::sensors::{SensorStore, finite_or_zero, format_power, resolve_value};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoadReadings {
    pub inverter1_w: f64,
    /// `None` without a secondary load sensor.
    pub inverter2_w: Option<f64>,
}

impl LoadReadings {
    pub fn total_w(&self) -> f64 { self.inverter1_w + self.inverter2_w.unwrap_or(0.0) }
}

pub fn read(
    config: &Config,
    store: &dyn SensorStore,
) -> LoadReadings {
    let sensors = &config.sensors;
    LoadReadings {
        inverter1_w: finite_or_zero(resolve_value(&sensors.home_load, store)),
        inverter2_w: (!sensors.home_load_secondary.is_empty())
            .then(|| finite_or_zero(resolve_value(&sensors.home_load_secondary, store))),
    }
}

pub fn lines(
    config: &Config,
    readings: &LoadReadings,
) -> [TextFragment; LOAD_SLOT_COUNT] {
    let kw = config.uses_kilowatt();
    let font = config.fonts.load;
    let total = readings.total_w();
    let color = config.load_bands.resolve(total, config.palette.load_text);

    let at = |slot: usize, count: usize| Point::new(LOAD_ANCHOR.x, stacked_line_y(LOAD_ANCHOR.y, slot, count));

    match readings.inverter2_w {
        Some(inverter2_w) => {
            let inverter = label(config.language, Label::Inverter);
            [
                TextFragment::new(labeled_power(label(config.language, Label::House), total, kw), at(0, 3), font, color),
                TextFragment::new(labeled_power(&numbered(inverter, 1), readings.inverter1_w, kw), at(1, 3), font, color),
                TextFragment::new(labeled_power(&numbered(inverter, 2), inverter2_w, kw), at(2, 3), font, color),
            ]
        }
        None => [
            TextFragment::new(format_power(readings.inverter1_w, kw), at(0, 1), font, color),
            TextFragment::hidden(LOAD_ANCHOR, font, color),
            TextFragment::hidden(LOAD_ANCHOR, font, color),
        ],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::colors;
    use crate::sensors::SensorSnapshot;

    #[test]
    fn test_single_line() {
        let config = Config::from_value(json!({ "sensor_home_load": "sensor.load" })).unwrap();
        let mut s = SensorSnapshot::new();
        s.set("sensor.load", "1.25", "kW");
        let lines = lines(&config, &read(&config, &s));
        assert_eq!(lines[0].text.as_str(), "1250 W");
        assert_eq!(lines[0].position, LOAD_ANCHOR);
        assert!(!lines[1].visible && !lines[2].visible);
    }

    #[test]
    fn test_secondary_load_three_lines() {
        let config = Config::from_value(json!({
            "sensor_home_load": "sensor.l1",
            "sensor_home_load_secondary": "sensor.l2",
            "display_unit": "kW",
        }))
        .unwrap();
        let mut s = SensorSnapshot::new();
        s.set("sensor.l1", "1000", "W");
        s.set("sensor.l2", "500", "W");
        let lines = lines(&config, &read(&config, &s));
        assert_eq!(lines[0].text.as_str(), "HOUSE: 1.50 kW");
        assert_eq!(lines[1].text.as_str(), "INV 1: 1.00 kW");
        assert_eq!(lines[2].text.as_str(), "INV 2: 0.50 kW");
        assert!(lines.iter().all(|l| l.visible));
    }

    #[test]
    fn test_text_color_follows_thresholds() {
        let config = Config::from_value(json!({
            "sensor_home_load": "sensor.load",
            "load_threshold_critical": 3000,
        }))
        .unwrap();
        let mut s = SensorSnapshot::new();
        s.set("sensor.load", "3200", "W");
        let lines = lines(&config, &read(&config, &s));
        assert_eq!(lines[0].fill, colors::CRITICAL);
    }
}
