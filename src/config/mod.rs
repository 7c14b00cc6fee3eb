//! Card configuration.
//!
//! The host delivers a flat option map ([`RawConfig`]). It is validated once,
//! here, into a typed [`Config`]: sensor ids are trimmed, colors parsed,
//! thresholds converted to watts, fonts and intervals clamped. Every value that
//! cannot be interpreted falls back to its default, so the only way to fail is
//! a payload that is not a JSON object at all.
//!
//! # Defaults
//!
//! | Option | Default | Range |
//! |--------|---------|-------|
//! | `display_unit` | `W` | `W` / `kW` |
//! | `language` | `en` | see [`Language`] |
//! | `animation_style` | `dashes` | see [`AnimationStyle`] |
//! | `animation_speed_factor` | 1 | [-3, 3] |
//! | `grid_activity_threshold` | 100 W | [0, 100000] |
//! | `update_interval` | 30 s | [0, 60] s |
//! | font sizes | per field | see [`fonts`] |

pub mod fonts;
pub mod layout;
mod raw;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub use self::fonts::FontSizes;
pub use self::raw::{LooseFlag, LooseNumber, LooseText, RawConfig, RawFonts};
use crate::animations::AnimationStyle;
use crate::colors::{self, Color};
use crate::error::ConfigError;
use crate::locale::Language;
use crate::thresholds::{
    DEFAULT_GRID_ACTIVITY_THRESHOLD_W,
    MAX_GRID_ACTIVITY_THRESHOLD_W,
    Threshold,
    ThresholdBands,
    threshold_to_watts,
};

// =============================================================================
// Limits
// =============================================================================

/// Default throttle between rebuilds.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);

/// Longest accepted throttle, in seconds.
pub const MAX_UPDATE_INTERVAL_SECS: f64 = 60.0;

pub const DEFAULT_SPEED_FACTOR: f64 = 1.0;

/// Speed factor magnitude limit. Negative factors reverse every flow.
pub const MAX_SPEED_FACTOR: f64 = 3.0;

/// Number of PV string sensors per array.
pub const PV_STRINGS_PER_ARRAY: usize = 6;

/// Number of battery slots.
pub const BATTERY_SLOTS: usize = 4;

// =============================================================================
// Typed Sections
// =============================================================================

/// Unit used for power readouts and threshold options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum DisplayUnit {
    #[default]
    #[serde(rename = "W")]
    Watts,
    #[serde(rename = "kW")]
    Kilowatts,
}

impl DisplayUnit {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("kw") { Self::Kilowatts } else { Self::Watts }
    }

    #[inline]
    pub const fn is_kilowatt(self) -> bool { matches!(self, Self::Kilowatts) }
}

/// Sensor ids, trimmed. An empty string means "not configured".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SensorBindings {
    pub pv_total: String,
    pub pv_strings: [String; PV_STRINGS_PER_ARRAY],
    pub pv_total_secondary: String,
    pub pv_array2_strings: [String; PV_STRINGS_PER_ARRAY],
    pub daily: String,
    pub daily_array2: String,
    pub battery_soc: [String; BATTERY_SLOTS],
    pub battery_power: [String; BATTERY_SLOTS],
    pub home_load: String,
    pub home_load_secondary: String,
    pub grid_power: String,
    pub grid_import: String,
    pub grid_export: String,
    pub car_power: [String; 2],
    pub car_soc: [String; 2],
    pub heat_pump: String,
}

impl SensorBindings {
    /// Whether array 2 has any sensor at all.
    pub fn has_array2(&self) -> bool {
        !self.pv_total_secondary.is_empty() || self.pv_array2_strings.iter().any(|s| !s.is_empty())
    }

    pub fn has_heat_pump(&self) -> bool { !self.heat_pump.is_empty() }

    /// Whether vehicle `index` (0 or 1) has a power or SOC sensor.
    pub fn has_car_sensor(
        &self,
        index: usize,
    ) -> bool {
        !self.car_power[index].is_empty() || !self.car_soc[index].is_empty()
    }
}

/// Resolved colors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Palette {
    pub pv_primary: Color,
    pub pv_secondary: Color,
    pub pv_text: Color,
    pub battery_charge: Color,
    pub battery_discharge: Color,
    pub battery_text: Color,
    pub load_flow: Color,
    pub load_text: Color,
    pub grid_import: Color,
    pub grid_export: Color,
    pub grid_text: Color,
    pub car_flow: [Color; 2],
    pub car_text: Color,
    pub heat_pump_flow: Color,
    pub heat_pump_text: Color,
    pub daily_text: Color,
    pub header_text: Color,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GridConfig {
    pub invert: bool,
    /// Net magnitudes below this are forced to zero.
    pub activity_threshold_w: f64,
    pub bands: ThresholdBands,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CarConfig {
    pub show: bool,
    /// Custom label; `None` uses the localized default.
    pub label: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimationConfig {
    pub style: AnimationStyle,
    /// In `[-3, 3]`. The sign reverses every flow, the magnitude scales speed.
    pub speed_factor: f64,
}

/// Fully validated configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Config {
    pub sensors: SensorBindings,
    pub display_unit: DisplayUnit,
    pub language: Language,
    /// `None` hides the title.
    pub title: Option<String>,
    pub show_pv_strings: bool,
    pub pv_array2_name: Option<String>,
    pub invert_battery: bool,
    pub grid: GridConfig,
    pub load_bands: ThresholdBands,
    pub cars: [CarConfig; 2],
    pub palette: Palette,
    pub fonts: FontSizes,
    pub animation: AnimationConfig,
    pub update_interval: Duration,
    pub background: String,
    pub background_heat_pump: String,
}

impl Default for Config {
    fn default() -> Self { Self::from_raw(&RawConfig::default()) }
}

impl Config {
    /// Parse a JSON payload. The payload must be an object; its values are
    /// validated leniently.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json).map_err(ConfigError::Syntax)?;
        Self::from_value(value)
    }

    /// Validate an already parsed payload.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let found = match &value {
            Value::Object(_) => None,
            Value::Null => Some("null"),
            Value::Bool(_) => Some("a boolean"),
            Value::Number(_) => Some("a number"),
            Value::String(_) => Some("a string"),
            Value::Array(_) => Some("an array"),
        };
        if let Some(found) = found {
            return Err(ConfigError::NotAnObject { found });
        }
        let raw = RawConfig::deserialize(value).map_err(ConfigError::Decode)?;
        Ok(Self::from_raw(&raw))
    }

    /// Validate a raw option map. Never fails.
    pub fn from_raw(raw: &RawConfig) -> Self {
        let display_unit = DisplayUnit::parse(raw.display_unit.trimmed());
        let kw = display_unit.is_kilowatt();

        let config = Self {
            sensors: sensor_bindings(raw),
            display_unit,
            language: Language::parse(raw.language.trimmed()),
            title: non_empty(&raw.card_title),
            show_pv_strings: raw.show_pv_strings.or(false),
            pv_array2_name: non_empty(&raw.pv_array2_name),
            invert_battery: raw.invert_battery.or(false),
            grid: GridConfig {
                invert: raw.invert_grid.or(false),
                activity_threshold_w: raw
                    .grid_activity_threshold
                    .0
                    .map_or(DEFAULT_GRID_ACTIVITY_THRESHOLD_W, |t| t.clamp(0.0, MAX_GRID_ACTIVITY_THRESHOLD_W)),
                bands: bands(
                    raw.grid_threshold_warning,
                    &raw.grid_warning_color,
                    raw.grid_threshold_critical,
                    &raw.grid_critical_color,
                    kw,
                ),
            },
            load_bands: bands(
                raw.load_threshold_warning,
                &raw.load_warning_color,
                raw.load_threshold_critical,
                &raw.load_critical_color,
                kw,
            ),
            cars: [
                CarConfig { show: raw.show_car1.or(false), label: non_empty(&raw.car1_label) },
                CarConfig { show: raw.show_car2.or(false), label: non_empty(&raw.car2_label) },
            ],
            palette: palette(raw),
            fonts: FontSizes::from_raw(&raw.fonts),
            animation: AnimationConfig {
                style: AnimationStyle::parse(raw.animation_style.trimmed()),
                speed_factor: raw
                    .animation_speed_factor
                    .0
                    .map_or(DEFAULT_SPEED_FACTOR, |s| s.clamp(-MAX_SPEED_FACTOR, MAX_SPEED_FACTOR)),
            },
            update_interval: raw.update_interval.0.map_or(DEFAULT_UPDATE_INTERVAL, |secs| {
                Duration::from_secs_f64(secs.clamp(0.0, MAX_UPDATE_INTERVAL_SECS))
            }),
            background: raw.background_image.or(layout::BACKGROUND).to_owned(),
            background_heat_pump: raw.background_image_heat_pump.or(layout::BACKGROUND_HEAT_PUMP).to_owned(),
        };

        debug!(
            unit = ?config.display_unit,
            style = ?config.animation.style,
            speed = config.animation.speed_factor,
            "configuration validated"
        );
        config
    }

    #[inline]
    pub const fn uses_kilowatt(&self) -> bool { self.display_unit.is_kilowatt() }
}

fn non_empty(text: &LooseText) -> Option<String> {
    match text.trimmed() {
        "" => None,
        s => Some(s.to_owned()),
    }
}

fn color_or(
    text: &LooseText,
    default: Color,
) -> Color {
    Color::parse(text.trimmed()).unwrap_or(default)
}

fn bands(
    warning: LooseNumber,
    warning_color: &LooseText,
    critical: LooseNumber,
    critical_color: &LooseText,
    kilowatt_display: bool,
) -> ThresholdBands {
    let level = |value: LooseNumber, color: &LooseText, default: Color| {
        let watts = threshold_to_watts(value.0?, kilowatt_display)?;
        Some(Threshold { watts, color: color_or(color, default) })
    };
    ThresholdBands::new(
        level(warning, warning_color, colors::WARNING),
        level(critical, critical_color, colors::CRITICAL),
    )
}

fn sensor_bindings(raw: &RawConfig) -> SensorBindings {
    let id = |t: &LooseText| t.trimmed().to_owned();
    SensorBindings {
        pv_total: id(&raw.sensor_pv_total),
        pv_strings: [
            id(&raw.sensor_pv1),
            id(&raw.sensor_pv2),
            id(&raw.sensor_pv3),
            id(&raw.sensor_pv4),
            id(&raw.sensor_pv5),
            id(&raw.sensor_pv6),
        ],
        pv_total_secondary: id(&raw.sensor_pv_total_secondary),
        pv_array2_strings: [
            id(&raw.sensor_pv_array2_1),
            id(&raw.sensor_pv_array2_2),
            id(&raw.sensor_pv_array2_3),
            id(&raw.sensor_pv_array2_4),
            id(&raw.sensor_pv_array2_5),
            id(&raw.sensor_pv_array2_6),
        ],
        daily: id(&raw.sensor_daily),
        daily_array2: id(&raw.sensor_daily_array2),
        battery_soc: [
            id(&raw.sensor_bat1_soc),
            id(&raw.sensor_bat2_soc),
            id(&raw.sensor_bat3_soc),
            id(&raw.sensor_bat4_soc),
        ],
        battery_power: [
            id(&raw.sensor_bat1_power),
            id(&raw.sensor_bat2_power),
            id(&raw.sensor_bat3_power),
            id(&raw.sensor_bat4_power),
        ],
        home_load: id(&raw.sensor_home_load),
        home_load_secondary: id(&raw.sensor_home_load_secondary),
        grid_power: id(&raw.sensor_grid_power),
        grid_import: id(&raw.sensor_grid_import),
        grid_export: id(&raw.sensor_grid_export),
        car_power: [id(&raw.sensor_car_power), id(&raw.sensor_car2_power)],
        car_soc: [id(&raw.sensor_car_soc), id(&raw.sensor_car2_soc)],
        heat_pump: id(&raw.sensor_heat_pump_consumption),
    }
}

fn palette(raw: &RawConfig) -> Palette {
    let car_flow = color_or(&raw.car_flow_color, colors::CAR_FLOW);
    Palette {
        pv_primary: color_or(&raw.pv_primary_color, colors::PV_PRIMARY),
        pv_secondary: color_or(&raw.pv_secondary_color, colors::PV_SECONDARY),
        pv_text: color_or(&raw.pv_text_color, colors::WHITE),
        battery_charge: color_or(&raw.battery_charge_color, colors::BATTERY_CHARGE),
        battery_discharge: color_or(&raw.battery_discharge_color, colors::BATTERY_DISCHARGE),
        battery_text: color_or(&raw.battery_text_color, colors::WHITE),
        load_flow: color_or(&raw.load_flow_color, colors::LOAD_FLOW),
        load_text: color_or(&raw.load_text_color, colors::WHITE),
        grid_import: color_or(&raw.grid_import_color, colors::GRID_IMPORT),
        grid_export: color_or(&raw.grid_export_color, colors::GRID_EXPORT),
        grid_text: color_or(&raw.grid_text_color, colors::WHITE),
        car_flow: [car_flow, color_or(&raw.car2_flow_color, colors::CAR_FLOW)],
        car_text: color_or(&raw.car_text_color, colors::WHITE),
        heat_pump_flow: color_or(&raw.heat_pump_flow_color, colors::HEAT_PUMP),
        heat_pump_text: color_or(&raw.heat_pump_text_color, colors::HEAT_PUMP),
        daily_text: color_or(&raw.daily_text_color, colors::WHITE),
        header_text: color_or(&raw.header_text_color, colors::HEADER_TEXT),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(value: Value) -> Config { Config::from_value(value).unwrap() }

    // =========================================================================
    // Boundary Tests
    // =========================================================================

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(Config::from_json("[1, 2]"), Err(ConfigError::NotAnObject { found: "an array" })));
        assert!(matches!(Config::from_json("null"), Err(ConfigError::NotAnObject { .. })));
        assert!(matches!(Config::from_json("{ broken"), Err(ConfigError::Syntax(_))));
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    // =========================================================================
    // Default Tests
    // =========================================================================

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.display_unit, DisplayUnit::Watts);
        assert_eq!(c.language, Language::En);
        assert_eq!(c.animation.style, AnimationStyle::Dashes);
        assert_eq!(c.animation.speed_factor, 1.0);
        assert_eq!(c.grid.activity_threshold_w, 100.0);
        assert_eq!(c.update_interval, Duration::from_secs(30));
        assert_eq!(c.palette.pv_primary, colors::PV_PRIMARY);
        assert_eq!(c.title, None);
        assert_eq!(c.background, layout::BACKGROUND);
        assert!(!c.cars[0].show && !c.cars[1].show);
    }

    // =========================================================================
    // Clamping Tests
    // =========================================================================

    #[test]
    fn test_speed_factor_clamped() {
        assert_eq!(config(json!({ "animation_speed_factor": 9 })).animation.speed_factor, 3.0);
        assert_eq!(config(json!({ "animation_speed_factor": "-7" })).animation.speed_factor, -3.0);
        assert_eq!(config(json!({ "animation_speed_factor": "fast" })).animation.speed_factor, 1.0);
        assert_eq!(config(json!({ "animation_speed_factor": 0 })).animation.speed_factor, 0.0);
    }

    #[test]
    fn test_update_interval_clamped() {
        assert_eq!(config(json!({ "update_interval": 120 })).update_interval, Duration::from_secs(60));
        assert_eq!(config(json!({ "update_interval": -5 })).update_interval, Duration::ZERO);
        assert_eq!(config(json!({ "update_interval": "2.5" })).update_interval, Duration::from_millis(2500));
    }

    #[test]
    fn test_activity_threshold_clamped() {
        assert_eq!(config(json!({ "grid_activity_threshold": 0 })).grid.activity_threshold_w, 0.0);
        assert_eq!(config(json!({ "grid_activity_threshold": -10 })).grid.activity_threshold_w, 0.0);
        assert_eq!(config(json!({ "grid_activity_threshold": 1e9 })).grid.activity_threshold_w, 100_000.0);
    }

    // =========================================================================
    // Conversion Tests
    // =========================================================================

    #[test]
    fn test_thresholds_converted_for_kilowatt_display() {
        let c = config(json!({
            "display_unit": "kW",
            "load_threshold_warning": 2,
            "load_threshold_critical": "4.5",
            "grid_threshold_warning": 1,
        }));
        assert_eq!(c.load_bands.warning.map(|t| t.watts), Some(2000.0));
        assert_eq!(c.load_bands.critical.map(|t| t.watts), Some(4500.0));
        assert_eq!(c.grid.bands.warning.map(|t| t.watts), Some(1000.0));
        assert_eq!(c.grid.bands.critical, None, "unset threshold stays disabled");
    }

    #[test]
    fn test_thresholds_kept_in_watt_display() {
        let c = config(json!({ "load_threshold_warning": 2000, "load_warning_color": "#123456" }));
        let warning = c.load_bands.warning.unwrap();
        assert_eq!(warning.watts, 2000.0);
        assert_eq!(warning.color, Color::rgb(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let c = config(json!({ "grid_import_color": "definitely not", "grid_export_color": "#abc" }));
        assert_eq!(c.palette.grid_import, colors::GRID_IMPORT);
        assert_eq!(c.palette.grid_export, Color::rgb(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_sensor_ids_trimmed() {
        let c = config(json!({ "sensor_pv1": "  sensor.pv1 ", "sensor_heat_pump_consumption": " " }));
        assert_eq!(c.sensors.pv_strings[0], "sensor.pv1");
        assert!(!c.sensors.has_heat_pump(), "whitespace id is not configured");
    }

    #[test]
    fn test_style_and_language() {
        let c = config(json!({ "animation_style": "ARROWS", "language": "it" }));
        assert_eq!(c.animation.style, AnimationStyle::Arrows);
        assert_eq!(c.language, Language::It);
    }

    #[test]
    fn test_font_sizes_clamped() {
        let c = config(json!({ "header_font_size": 100, "car2_soc_font_size": "3" }));
        assert_eq!(c.fonts.header, 32);
        assert_eq!(c.fonts.cars[1].soc, 8);
    }
}
