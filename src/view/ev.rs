//! Electric vehicle readouts.
//!
//! EV 1 is shown when its toggle is on. EV 2 additionally needs at least one
//! configured sensor. While EV 2 is shown, the text uses the dual preset
//! anchors; otherwise the single preset.

use super::{EvFragments, TextFragment, format_soc, numbered};
use crate::config::Config;
use crate::config::layout::{EV_DUAL, EV_SINGLE};
use crate::locale::{Label, label};
use crate::sensors::{SensorStore, Text, finite_or_zero, format_power, resolve_optional, resolve_value, text};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CarReading {
    pub visible: bool,
    pub power_w: f64,
    pub soc: Option<f64>,
    pub name: Text,
}

impl CarReading {
    /// Power for flow derivation; `None` while hidden.
    pub fn power_w(&self) -> Option<f64> { self.visible.then_some(self.power_w) }
}

pub fn read(
    config: &Config,
    store: &dyn SensorStore,
) -> [CarReading; 2] {
    let sensors = &config.sensors;
    std::array::from_fn(|i| {
        let car = &config.cars[i];
        let visible = if i == 0 { car.show } else { car.show && sensors.has_car_sensor(1) };
        CarReading {
            visible,
            power_w: finite_or_zero(resolve_value(&sensors.car_power[i], store)),
            soc: resolve_optional(&sensors.car_soc[i], store),
            name: car.label.as_deref().map_or_else(|| numbered(label(config.language, Label::Car), i + 1), text),
        }
    })
}

pub fn fragments(
    config: &Config,
    cars: &[CarReading; 2],
) -> [EvFragments; 2] {
    let dual = cars[1].visible;
    let kw = config.uses_kilowatt();
    let color = config.palette.car_text;

    std::array::from_fn(|i| {
        let car = &cars[i];
        let fonts = config.fonts.cars[i];
        let anchors = if dual { EV_DUAL[i] } else { EV_SINGLE };
        EvFragments {
            name: TextFragment::new(car.name.clone(), anchors.name, fonts.name, color).shown(car.visible),
            power: TextFragment::new(format_power(car.power_w, kw), anchors.power, fonts.power, color)
                .shown(car.visible),
            soc: TextFragment::new(car.soc.map_or_else(Text::new, format_soc), anchors.soc, fonts.soc, color)
                .shown(car.visible && car.soc.is_some()),
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sensors::SensorSnapshot;

    fn snapshot() -> SensorSnapshot {
        let mut s = SensorSnapshot::new();
        s.set("sensor.car1", "7.4", "kW");
        s.set("sensor.car1_soc", "55", "%");
        s.set("sensor.car2", "3000", "W");
        s
    }

    #[test]
    fn test_single_car_uses_single_preset() {
        let config = Config::from_value(json!({
            "show_car1": true,
            "sensor_car_power": "sensor.car1",
            "sensor_car_soc": "sensor.car1_soc",
        }))
        .unwrap();
        let cars = read(&config, &snapshot());
        let frags = fragments(&config, &cars);
        assert!(frags[0].name.visible);
        assert_eq!(frags[0].name.text.as_str(), "EV 1");
        assert_eq!(frags[0].name.position, EV_SINGLE.name);
        assert_eq!(frags[0].power.text.as_str(), "7400 W");
        assert_eq!(frags[0].soc.text.as_str(), "55%");
        assert!(!frags[1].name.visible);
    }

    #[test]
    fn test_car2_needs_a_sensor() {
        let config = Config::from_value(json!({ "show_car1": true, "show_car2": true })).unwrap();
        let cars = read(&config, &snapshot());
        assert!(cars[0].visible);
        assert!(!cars[1].visible, "toggle alone is not enough for EV 2");
        assert_eq!(cars[1].power_w(), None);
    }

    #[test]
    fn test_dual_preset_and_labels() {
        let config = Config::from_value(json!({
            "show_car1": true,
            "show_car2": true,
            "sensor_car_power": "sensor.car1",
            "sensor_car2_power": "sensor.car2",
            "car2_label": "Van",
        }))
        .unwrap();
        let cars = read(&config, &snapshot());
        let frags = fragments(&config, &cars);
        assert_eq!(frags[0].name.position, EV_DUAL[0].name);
        assert_eq!(frags[1].name.position, EV_DUAL[1].name);
        assert_eq!(frags[1].name.text.as_str(), "Van");
        assert!(!frags[1].soc.visible, "no SOC sensor for EV 2");
    }

    #[test]
    fn test_car2_alone_uses_dual_preset() {
        let config = Config::from_value(json!({
            "show_car1": false,
            "show_car2": true,
            "sensor_car2_power": "sensor.car2",
        }))
        .unwrap();
        let cars = read(&config, &snapshot());
        let frags = fragments(&config, &cars);
        assert!(!frags[0].name.visible);
        assert!(frags[1].name.visible);
        assert_eq!(frags[1].name.position, EV_DUAL[1].name, "EV 2 shown selects the dual preset");
        assert_eq!(frags[1].power.position, EV_DUAL[1].power);
        assert_eq!(frags[1].power.text.as_str(), "3000 W");
    }
}
