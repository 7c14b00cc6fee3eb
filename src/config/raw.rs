//! Raw option map as delivered by the host.
//!
//! Configuration editors are loose about types: numbers arrive as strings,
//! toggles as `"true"`, `1` or `"on"`, and cleared fields as `null` or `""`.
//! The wrappers here accept all of those and never fail. Anything they cannot
//! interpret becomes `None`, and [`super::Config::from_raw`] substitutes the
//! documented default.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// Lenient Values
// =============================================================================

/// Text option. Numbers and booleans are stringified; blank strings are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LooseText(pub Option<String>);

/// Numeric option. Numeric strings are parsed; non-finite values are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LooseNumber(pub Option<f64>);

/// Boolean option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LooseFlag(pub Option<bool>);

impl LooseText {
    pub fn new(s: &str) -> Self { Self(Some(s.to_owned())) }

    /// Trimmed value, empty when unset.
    pub fn trimmed(&self) -> &str { self.0.as_deref().map_or("", str::trim) }

    /// Trimmed value or `default` when unset or blank.
    pub fn or<'a>(
        &'a self,
        default: &'a str,
    ) -> &'a str {
        match self.trimmed() {
            "" => default,
            s => s,
        }
    }
}

impl LooseFlag {
    #[inline]
    pub fn or(
        self,
        default: bool,
    ) -> bool {
        self.0.unwrap_or(default)
    }
}

impl<'de> Deserialize<'de> for LooseText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match Value::deserialize(deserializer)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        };
        Ok(Self(text))
    }
}

impl<'de> Deserialize<'de> for LooseNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(Self(number.filter(|v| v.is_finite())))
    }
}

impl<'de> Deserialize<'de> for LooseFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flag = match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(true),
                "false" | "0" | "off" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        };
        Ok(Self(flag))
    }
}

// =============================================================================
// Option Map
// =============================================================================

/// Font size options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFonts {
    pub header_font_size: LooseNumber,
    pub daily_label_font_size: LooseNumber,
    pub daily_value_font_size: LooseNumber,
    pub pv_font_size: LooseNumber,
    pub battery_soc_font_size: LooseNumber,
    pub battery_power_font_size: LooseNumber,
    pub load_font_size: LooseNumber,
    pub heat_pump_font_size: LooseNumber,
    pub grid_font_size: LooseNumber,
    pub car_power_font_size: LooseNumber,
    pub car_soc_font_size: LooseNumber,
    pub car_name_font_size: LooseNumber,
    pub car2_power_font_size: LooseNumber,
    pub car2_soc_font_size: LooseNumber,
    pub car2_name_font_size: LooseNumber,
}

/// The flat option map. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    // Sensors: solar
    pub sensor_pv_total: LooseText,
    pub sensor_pv1: LooseText,
    pub sensor_pv2: LooseText,
    pub sensor_pv3: LooseText,
    pub sensor_pv4: LooseText,
    pub sensor_pv5: LooseText,
    pub sensor_pv6: LooseText,
    pub sensor_pv_total_secondary: LooseText,
    pub sensor_pv_array2_1: LooseText,
    pub sensor_pv_array2_2: LooseText,
    pub sensor_pv_array2_3: LooseText,
    pub sensor_pv_array2_4: LooseText,
    pub sensor_pv_array2_5: LooseText,
    pub sensor_pv_array2_6: LooseText,
    pub sensor_daily: LooseText,
    pub sensor_daily_array2: LooseText,

    // Sensors: battery
    pub sensor_bat1_soc: LooseText,
    pub sensor_bat1_power: LooseText,
    pub sensor_bat2_soc: LooseText,
    pub sensor_bat2_power: LooseText,
    pub sensor_bat3_soc: LooseText,
    pub sensor_bat3_power: LooseText,
    pub sensor_bat4_soc: LooseText,
    pub sensor_bat4_power: LooseText,

    // Sensors: load, grid, EV, heat pump
    pub sensor_home_load: LooseText,
    pub sensor_home_load_secondary: LooseText,
    pub sensor_grid_power: LooseText,
    pub sensor_grid_import: LooseText,
    pub sensor_grid_export: LooseText,
    pub sensor_car_power: LooseText,
    pub sensor_car_soc: LooseText,
    pub sensor_car2_power: LooseText,
    pub sensor_car2_soc: LooseText,
    pub sensor_heat_pump_consumption: LooseText,

    // Toggles
    pub show_car1: LooseFlag,
    pub show_car2: LooseFlag,
    pub show_pv_strings: LooseFlag,
    pub invert_grid: LooseFlag,
    pub invert_battery: LooseFlag,
    pub display_unit: LooseText,

    // Text
    pub card_title: LooseText,
    pub language: LooseText,
    pub car1_label: LooseText,
    pub car2_label: LooseText,
    pub pv_array2_name: LooseText,
    pub background_image: LooseText,
    pub background_image_heat_pump: LooseText,

    // Colors
    pub pv_primary_color: LooseText,
    pub pv_secondary_color: LooseText,
    pub pv_text_color: LooseText,
    pub battery_charge_color: LooseText,
    pub battery_discharge_color: LooseText,
    pub battery_text_color: LooseText,
    pub load_flow_color: LooseText,
    pub load_text_color: LooseText,
    pub grid_import_color: LooseText,
    pub grid_export_color: LooseText,
    pub grid_text_color: LooseText,
    pub car_flow_color: LooseText,
    pub car2_flow_color: LooseText,
    pub car_text_color: LooseText,
    pub heat_pump_flow_color: LooseText,
    pub heat_pump_text_color: LooseText,
    pub daily_text_color: LooseText,
    pub header_text_color: LooseText,

    // Thresholds
    pub load_threshold_warning: LooseNumber,
    pub load_warning_color: LooseText,
    pub load_threshold_critical: LooseNumber,
    pub load_critical_color: LooseText,
    pub grid_threshold_warning: LooseNumber,
    pub grid_warning_color: LooseText,
    pub grid_threshold_critical: LooseNumber,
    pub grid_critical_color: LooseText,
    pub grid_activity_threshold: LooseNumber,

    #[serde(flatten)]
    pub fonts: RawFonts,

    // Animation and scheduling
    pub animation_style: LooseText,
    pub animation_speed_factor: LooseNumber,
    pub update_interval: LooseNumber,
}
