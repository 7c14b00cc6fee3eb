//! Font size ranges.
//!
//! Every text field has its own permitted range and default. Values outside
//! the range are clamped; missing or non-numeric values use the default.

use serde::Serialize;

use super::raw::RawFonts;

/// Permitted font size range for one text field, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl FontRange {
    pub const fn new(
        min: u32,
        max: u32,
        default: u32,
    ) -> Self {
        Self { min, max, default }
    }

    /// Clamp a configured value into the range.
    pub fn clamp(
        &self,
        value: Option<f64>,
    ) -> u32 {
        match value {
            Some(v) if v.is_finite() => (v.round().max(0.0) as u32).clamp(self.min, self.max),
            _ => self.default,
        }
    }
}

pub const HEADER: FontRange = FontRange::new(12, 32, 16);
pub const DAILY_LABEL: FontRange = FontRange::new(8, 24, 12);
pub const DAILY_VALUE: FontRange = FontRange::new(12, 32, 20);
pub const PV: FontRange = FontRange::new(12, 28, 16);
pub const BATTERY_SOC: FontRange = FontRange::new(12, 32, 20);
pub const BATTERY_POWER: FontRange = FontRange::new(10, 28, 14);
pub const LOAD: FontRange = FontRange::new(10, 28, 15);
pub const HEAT_PUMP: FontRange = FontRange::new(10, 28, 16);
pub const GRID: FontRange = FontRange::new(10, 28, 15);
pub const CAR_POWER: FontRange = FontRange::new(10, 28, 15);
pub const CAR_SOC: FontRange = FontRange::new(8, 24, 12);
pub const CAR_NAME: FontRange = FontRange::new(10, 28, 15);

/// Option name to range, in the order the options appear in the editor.
pub const FONT_RANGES: [(&str, FontRange); 15] = [
    ("header_font_size", HEADER),
    ("daily_label_font_size", DAILY_LABEL),
    ("daily_value_font_size", DAILY_VALUE),
    ("pv_font_size", PV),
    ("battery_soc_font_size", BATTERY_SOC),
    ("battery_power_font_size", BATTERY_POWER),
    ("load_font_size", LOAD),
    ("heat_pump_font_size", HEAT_PUMP),
    ("grid_font_size", GRID),
    ("car_power_font_size", CAR_POWER),
    ("car_soc_font_size", CAR_SOC),
    ("car_name_font_size", CAR_NAME),
    ("car2_power_font_size", CAR_POWER),
    ("car2_soc_font_size", CAR_SOC),
    ("car2_name_font_size", CAR_NAME),
];

const _: () = {
    let mut i = 0;
    while i < FONT_RANGES.len() {
        let range = FONT_RANGES[i].1;
        assert!(range.min <= range.default);
        assert!(range.default <= range.max);
        i += 1;
    }
};

/// EV text sizes. One set per vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CarFontSizes {
    pub power: u32,
    pub soc: u32,
    pub name: u32,
}

/// Resolved font sizes for every text field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FontSizes {
    pub header: u32,
    pub daily_label: u32,
    pub daily_value: u32,
    pub pv: u32,
    pub battery_soc: u32,
    pub battery_power: u32,
    pub load: u32,
    pub heat_pump: u32,
    pub grid: u32,
    pub cars: [CarFontSizes; 2],
}

impl FontSizes {
    pub(crate) fn from_raw(raw: &RawFonts) -> Self {
        Self {
            header: HEADER.clamp(raw.header_font_size.0),
            daily_label: DAILY_LABEL.clamp(raw.daily_label_font_size.0),
            daily_value: DAILY_VALUE.clamp(raw.daily_value_font_size.0),
            pv: PV.clamp(raw.pv_font_size.0),
            battery_soc: BATTERY_SOC.clamp(raw.battery_soc_font_size.0),
            battery_power: BATTERY_POWER.clamp(raw.battery_power_font_size.0),
            load: LOAD.clamp(raw.load_font_size.0),
            heat_pump: HEAT_PUMP.clamp(raw.heat_pump_font_size.0),
            grid: GRID.clamp(raw.grid_font_size.0),
            cars: [
                CarFontSizes {
                    power: CAR_POWER.clamp(raw.car_power_font_size.0),
                    soc: CAR_SOC.clamp(raw.car_soc_font_size.0),
                    name: CAR_NAME.clamp(raw.car_name_font_size.0),
                },
                CarFontSizes {
                    power: CAR_POWER.clamp(raw.car2_power_font_size.0),
                    soc: CAR_SOC.clamp(raw.car2_soc_font_size.0),
                    name: CAR_NAME.clamp(raw.car2_name_font_size.0),
                },
            ],
        }
    }
}

impl Default for FontSizes {
    fn default() -> Self { Self::from_raw(&RawFonts::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_range() {
        assert_eq!(HEADER.clamp(Some(40.0)), 32, "above max clamps to max");
        assert_eq!(HEADER.clamp(Some(4.0)), 12, "below min clamps to min");
        assert_eq!(HEADER.clamp(Some(20.4)), 20, "in range rounds");
        assert_eq!(HEADER.clamp(Some(-5.0)), 12);
    }

    #[test]
    fn test_clamp_missing_uses_default() {
        assert_eq!(HEADER.clamp(None), 16);
        assert_eq!(HEADER.clamp(Some(f64::NAN)), 16);
        assert_eq!(CAR_SOC.clamp(None), 12);
    }

    #[test]
    fn test_defaults_match_table() {
        let sizes = FontSizes::default();
        assert_eq!(sizes.header, HEADER.default);
        assert_eq!(sizes.battery_power, 14);
        assert_eq!(sizes.cars[1].name, CAR_NAME.default);
    }

    #[test]
    fn test_option_names_are_unique() {
        for (i, (name, _)) in FONT_RANGES.iter().enumerate() {
            assert!(
                FONT_RANGES.iter().skip(i + 1).all(|(other, _)| other != name),
                "duplicate font option {name}"
            );
        }
    }
}
