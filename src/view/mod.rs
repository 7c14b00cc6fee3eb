//! View state: the fully resolved description of what the card shows.
//!
//! [`build_view_state`] is a pure function of the configuration and a sensor
//! snapshot. It performs no scene access, keeps no state between calls, and
//! two calls with equal inputs produce equal outputs. Everything the renderer
//! and the animator need is in the returned [`ViewState`]: text, colors, font
//! sizes, positions, visibility, the flow table and the path geometry.
//!
//! # Sections
//!
//! | Module | Fragments |
//! |--------|-----------|
//! | [`solar`] | PV readout lines, daily yield |
//! | [`battery`] | SOC, power, liquid level |
//! | [`load`] | house load lines |
//! | [`grid`] | net power and import/export caption |
//! | [`ev`] | per-vehicle name, power, SOC |

pub mod battery;
pub mod ev;
pub mod grid;
pub mod load;
pub mod solar;

use std::fmt::Write;

use embedded_graphics::prelude::Point;
use serde::{Serialize, Serializer};

use crate::animations::{AnimationStyle, FlowFrame};
use crate::colors::Color;
use crate::config::Config;
use crate::config::layout::{self, LOAD_SLOT_COUNT, SOLAR_SLOT_COUNT};
use crate::flows::{FLOW_COUNT, FlowInputs, FlowKey, FlowTable, GridReading, derive_flows, resolve_grid};
use crate::locale::{Label, label};
use crate::sensors::{SensorStore, Text, finite_or_zero, format_power, resolve_value, text};

// =============================================================================
// Fragments
// =============================================================================

fn serialize_point<S: Serializer>(
    point: &Point,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    [point.x, point.y].serialize(serializer)
}

/// One piece of text on the diagram.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextFragment {
    pub text: Text,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    pub font_size: u32,
    pub fill: Color,
    pub visible: bool,
}

impl TextFragment {
    pub fn new(
        text: Text,
        position: Point,
        font_size: u32,
        fill: Color,
    ) -> Self {
        Self { text, position, font_size, fill, visible: true }
    }

    /// Same fragment with visibility set.
    #[must_use]
    pub fn shown(
        mut self,
        visible: bool,
    ) -> Self {
        self.visible = visible;
        self
    }

    /// Empty, invisible placeholder for an unused slot.
    pub fn hidden(
        position: Point,
        font_size: u32,
        fill: Color,
    ) -> Self {
        Self { text: Text::new(), position, font_size, fill, visible: false }
    }
}

/// Battery liquid rectangle, filled from the bottom.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LiquidFragment {
    pub y: i32,
    pub height: u32,
    pub fill: Color,
    pub visible: bool,
}

/// Text fragments for one vehicle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvFragments {
    pub name: TextFragment,
    pub power: TextFragment,
    pub soc: TextFragment,
}

/// Animation settings carried through to the animator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimationSettings {
    pub style: AnimationStyle,
    pub speed_factor: f64,
}

/// Headline numbers, for hosts that want them without parsing text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct EnergySummary {
    pub pv_total_w: f64,
    pub battery_soc: Option<f64>,
    pub battery_w: f64,
    pub load_w: f64,
    pub grid: GridReading,
    pub heat_pump_w: f64,
    pub daily_kwh: f64,
}

/// Fully resolved view state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewState {
    pub background: String,
    pub title: TextFragment,
    pub daily_label: TextFragment,
    pub daily_value: TextFragment,
    pub solar_lines: [TextFragment; SOLAR_SLOT_COUNT],
    pub battery_soc: TextFragment,
    pub battery_power: TextFragment,
    pub battery_liquid: LiquidFragment,
    pub load_lines: [TextFragment; LOAD_SLOT_COUNT],
    pub grid_power: TextFragment,
    pub grid_caption: TextFragment,
    pub heat_pump: TextFragment,
    pub ev: [EvFragments; 2],
    pub flows: FlowTable,
    /// Whether each flow's path is part of the diagram at all.
    pub flow_visible: [bool; FLOW_COUNT],
    pub paths: [&'static str; FLOW_COUNT],
    pub animation: AnimationSettings,
    pub summary: EnergySummary,
}

impl ViewState {
    /// Animator input for this cycle.
    pub fn flow_frame(&self) -> FlowFrame {
        FlowFrame { flows: self.flows, visible: self.flow_visible, paths: self.paths, settings: self.animation }
    }

    #[inline]
    pub fn is_flow_visible(
        &self,
        key: FlowKey,
    ) -> bool {
        self.flow_visible[key.index()]
    }
}

/// `"{label}: {power}"`.
pub(crate) fn labeled_power(
    label: &str,
    watts: f64,
    use_kilowatt: bool,
) -> Text {
    let mut out = Text::new();
    let _ = write!(out, "{label}: {}", format_power(watts, use_kilowatt));
    out
}

/// `"{label} {n}"`, e.g. `"EV 2"`.
pub(crate) fn numbered(
    label: &str,
    n: usize,
) -> Text {
    let mut out = Text::new();
    let _ = write!(out, "{label} {n}");
    out
}

/// `"{soc}%"` rounded to a whole percent.
pub(crate) fn format_soc(soc: f64) -> Text {
    let mut out = Text::new();
    let _ = write!(out, "{:.0}%", soc.clamp(0.0, 100.0));
    out
}

// =============================================================================
// Builder
// =============================================================================

/// Build the complete view state for one cycle.
pub fn build_view_state(
    config: &Config,
    store: &dyn SensorStore,
) -> ViewState {
    let palette = &config.palette;
    let fonts = &config.fonts;
    let kw = config.uses_kilowatt();

    let solar = solar::read(config, store);
    let battery = battery::read(config, store);
    let load = load::read(config, store);
    let grid = resolve_grid(config, store);
    let cars = ev::read(config, store);

    let heat_pump_visible = config.sensors.has_heat_pump();
    let heat_pump_w = if heat_pump_visible { finite_or_zero(resolve_value(&config.sensors.heat_pump, store)) } else { 0.0 };

    let inputs = FlowInputs {
        pv_array1_w: solar.array1_w,
        pv_array2_w: solar.array2_w,
        battery_w: battery.power_w,
        load_w: load.inverter1_w,
        secondary_load_w: load.inverter2_w,
        grid,
        cars_w: [cars[0].power_w(), cars[1].power_w()],
        heat_pump_w: heat_pump_visible.then_some(heat_pump_w),
    };
    let flows = derive_flows(config, &inputs);

    let mut flow_visible = [true; FLOW_COUNT];
    flow_visible[FlowKey::Solar2.index()] = solar.array2_w.is_some();
    flow_visible[FlowKey::Battery.index()] = battery.configured;
    flow_visible[FlowKey::HouseToInverter.index()] = load.inverter2_w.is_some();
    flow_visible[FlowKey::Ev1.index()] = cars[0].visible;
    flow_visible[FlowKey::Ev2.index()] = cars[1].visible;
    flow_visible[FlowKey::HeatPump.index()] = heat_pump_visible;

    let daily_kwh = solar::daily_kwh(config, store);

    ViewState {
        background: if heat_pump_visible { config.background_heat_pump.clone() } else { config.background.clone() },
        title: TextFragment::new(
            text(config.title.as_deref().unwrap_or_default()),
            layout::TITLE_POS,
            fonts.header,
            palette.header_text,
        )
        .shown(config.title.is_some()),
        daily_label: TextFragment::new(
            text(label(config.language, Label::DailyYield)),
            layout::DAILY_LABEL_POS,
            fonts.daily_label,
            palette.daily_text,
        ),
        daily_value: TextFragment::new(
            solar::format_daily(daily_kwh),
            layout::DAILY_VALUE_POS,
            fonts.daily_value,
            palette.daily_text,
        ),
        solar_lines: solar::lines(config, &solar),
        battery_soc: battery::soc_fragment(config, &battery),
        battery_power: battery::power_fragment(config, &battery),
        battery_liquid: battery::liquid(&battery),
        load_lines: load::lines(config, &load),
        grid_power: grid::power_fragment(config, &grid),
        grid_caption: grid::caption_fragment(config, &grid),
        heat_pump: TextFragment::new(
            format_power(heat_pump_w, kw),
            layout::HEAT_PUMP_POS,
            fonts.heat_pump,
            palette.heat_pump_text,
        )
        .shown(heat_pump_visible),
        ev: ev::fragments(config, &cars),
        flows,
        flow_visible,
        paths: FlowKey::ALL.map(FlowKey::path),
        animation: AnimationSettings { style: config.animation.style, speed_factor: config.animation.speed_factor },
        summary: EnergySummary {
            pv_total_w: solar.total_w(),
            battery_soc: battery.soc,
            battery_w: battery.power_w,
            load_w: load.total_w(),
            grid,
            heat_pump_w,
            daily_kwh,
        },
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sensors::SensorSnapshot;

    fn config(value: serde_json::Value) -> Config { Config::from_value(value).unwrap() }

    #[test]
    fn test_build_is_idempotent() {
        let c = config(json!({
            "sensor_pv1": "sensor.pv1",
            "sensor_home_load": "sensor.load",
            "sensor_grid_power": "sensor.grid",
            "card_title": "Home",
        }));
        let mut s = SensorSnapshot::new();
        s.set("sensor.pv1", "1500", "W");
        s.set("sensor.load", "700", "W");
        s.set("sensor.grid", "-300", "W");

        assert_eq!(build_view_state(&c, &s), build_view_state(&c, &s));
    }

    #[test]
    fn test_daily_yield_without_sensors() {
        let view = build_view_state(&Config::default(), &SensorSnapshot::new());
        assert_eq!(view.daily_value.text.as_str(), "0.0 kWh");
        assert_eq!(view.daily_label.text.as_str(), "DAILY YIELD");
    }

    #[test]
    fn test_title_hidden_when_blank() {
        let view = build_view_state(&Config::default(), &SensorSnapshot::new());
        assert!(!view.title.visible);

        let view = build_view_state(&config(json!({ "card_title": "Solar" })), &SensorSnapshot::new());
        assert!(view.title.visible);
        assert_eq!(view.title.text.as_str(), "Solar");
    }

    #[test]
    fn test_heat_pump_switches_background() {
        let plain = build_view_state(&Config::default(), &SensorSnapshot::new());
        assert_eq!(plain.background, layout::BACKGROUND);
        assert!(!plain.heat_pump.visible);
        assert!(!plain.is_flow_visible(FlowKey::HeatPump));

        let mut s = SensorSnapshot::new();
        s.set("sensor.hp", "1.2", "kW");
        let view = build_view_state(&config(json!({ "sensor_heat_pump_consumption": "sensor.hp" })), &s);
        assert_eq!(view.background, layout::BACKGROUND_HEAT_PUMP);
        assert!(view.heat_pump.visible);
        assert_eq!(view.heat_pump.text.as_str(), "1200 W");
        assert!(view.flows[FlowKey::HeatPump].active);
    }

    #[test]
    fn test_paths_follow_flow_keys() {
        let view = build_view_state(&Config::default(), &SensorSnapshot::new());
        for key in FlowKey::ALL {
            assert_eq!(view.paths[key.index()], key.path());
        }
    }

    #[test]
    fn test_view_serializes() {
        let view = build_view_state(&Config::default(), &SensorSnapshot::new());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["daily_value"]["text"], "0.0 kWh");
        assert_eq!(json["title"]["position"], json!([400, 30]));
        assert_eq!(json["animation"]["style"], "dashes");
        assert_eq!(json["flows"]["grid-to-inverter"]["direction_sign"], -1);
    }
}
