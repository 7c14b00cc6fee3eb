//! Flow derivation: which energy paths are active, in which color, in which
//! direction.
//!
//! The set of flows is closed. Each [`FlowKey`] owns exactly one static path
//! in [`crate::config::layout::FLOW_PATHS`], one animation entry, and one
//! [`FlowState`] per cycle.
//!
//! # Topology
//!
//! | Flow | Magnitude | Active when | Color |
//! |------|-----------|-------------|-------|
//! | `solar-1` | array 1 total | > floor | PV primary |
//! | `solar-2` | array 2 total | array 2 configured, > floor | PV secondary |
//! | `battery` | battery power | > floor | charge / discharge |
//! | `load` | inverter 1 load | > floor | load thresholds |
//! | `grid-to-inverter` | net grid | activity threshold | grid thresholds |
//! | `grid-to-house` | net grid | importing, house load > floor | grid thresholds |
//! | `house-to-inverter` | inverter 2 load | configured, > floor | load thresholds |
//! | `ev-1` / `ev-2` | EV power | visible, > floor | EV flow color |
//! | `heat-pump` | heat pump power | visible, > floor | heat pump color |
//!
//! "Floor" is [`ACTIVITY_FLOOR_W`](crate::thresholds::ACTIVITY_FLOOR_W).
//!
//! # Direction
//!
//! Paths are drawn from source to sink for the common case, so most flows run
//! [`Direction::Forward`]. The battery path runs inverter to battery: charging
//! (positive power) is forward. The grid path runs inverter to grid, so
//! importing runs it in reverse.

use std::fmt;
use std::ops::Index;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::colors::{Color, WHITE};
use crate::config::{Config, layout};
use crate::sensors::{SensorStore, finite_or_zero, resolve_value};
use crate::thresholds::{apply_activity_threshold, is_flow_active};

// =============================================================================
// Flow Keys
// =============================================================================

/// Number of flows in the diagram.
pub const FLOW_COUNT: usize = 10;

/// Named energy path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FlowKey {
    #[serde(rename = "solar-1")]
    Solar1,
    #[serde(rename = "solar-2")]
    Solar2,
    #[serde(rename = "battery")]
    Battery,
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "grid-to-inverter")]
    GridToInverter,
    #[serde(rename = "grid-to-house")]
    GridToHouse,
    #[serde(rename = "house-to-inverter")]
    HouseToInverter,
    #[serde(rename = "ev-1")]
    Ev1,
    #[serde(rename = "ev-2")]
    Ev2,
    #[serde(rename = "heat-pump")]
    HeatPump,
}

impl FlowKey {
    pub const ALL: [Self; FLOW_COUNT] = [
        Self::Solar1,
        Self::Solar2,
        Self::Battery,
        Self::Load,
        Self::GridToInverter,
        Self::GridToHouse,
        Self::HouseToInverter,
        Self::Ev1,
        Self::Ev2,
        Self::HeatPump,
    ];

    /// Position in [`Self::ALL`] and in every per-flow array.
    #[inline]
    pub const fn index(self) -> usize { self as usize }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Solar1 => "solar-1",
            Self::Solar2 => "solar-2",
            Self::Battery => "battery",
            Self::Load => "load",
            Self::GridToInverter => "grid-to-inverter",
            Self::GridToHouse => "grid-to-house",
            Self::HouseToInverter => "house-to-inverter",
            Self::Ev1 => "ev-1",
            Self::Ev2 => "ev-2",
            Self::HeatPump => "heat-pump",
        }
    }

    /// Static path data for this flow.
    #[inline]
    pub const fn path(self) -> &'static str { layout::FLOW_PATHS[self.index()] }

    pub fn from_name(name: &str) -> Option<Self> { Self::ALL.into_iter().find(|k| k.name() == name) }
}

impl fmt::Display for FlowKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Flow State
// =============================================================================

/// Travel direction along a flow's path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// `+1.0` or `-1.0`.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }

    /// Forward for zero and positive values.
    #[inline]
    pub fn from_sign(value: f64) -> Self { if value < 0.0 { Self::Reverse } else { Self::Forward } }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.sign() as i8)
    }
}

/// Derived state of one flow for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FlowState {
    pub active: bool,
    pub color: Color,
    #[serde(rename = "direction_sign")]
    pub direction: Direction,
}

impl FlowState {
    pub const INACTIVE: Self = Self { active: false, color: WHITE, direction: Direction::Forward };

    #[inline]
    pub const fn new(
        active: bool,
        color: Color,
        direction: Direction,
    ) -> Self {
        Self { active, color, direction }
    }
}

impl Default for FlowState {
    fn default() -> Self { Self::INACTIVE }
}

/// One [`FlowState`] per [`FlowKey`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowTable([FlowState; FLOW_COUNT]);

impl FlowTable {
    pub const fn new() -> Self { Self([FlowState::INACTIVE; FLOW_COUNT]) }

    #[inline]
    pub fn get(
        &self,
        key: FlowKey,
    ) -> &FlowState {
        &self.0[key.index()]
    }

    #[inline]
    pub fn set(
        &mut self,
        key: FlowKey,
        state: FlowState,
    ) {
        self.0[key.index()] = state;
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlowKey, &FlowState)> { FlowKey::ALL.into_iter().zip(self.0.iter()) }

    pub fn active_count(&self) -> usize { self.0.iter().filter(|s| s.active).count() }
}

impl Default for FlowTable {
    fn default() -> Self { Self::new() }
}

impl Index<FlowKey> for FlowTable {
    type Output = FlowState;

    fn index(
        &self,
        key: FlowKey,
    ) -> &FlowState {
        self.get(key)
    }
}

impl Serialize for FlowTable {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FLOW_COUNT))?;
        for (key, state) in self.iter() {
            map.serialize_entry(key.name(), state)?;
        }
        map.end()
    }
}

// =============================================================================
// Grid
// =============================================================================

/// Which way power crosses the meter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridDirection {
    /// Buying from the grid. Also used when the net is exactly zero.
    #[default]
    Import,
    Export,
}

impl GridDirection {
    /// `+1.0` for import, `-1.0` for export.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Import => 1.0,
            Self::Export => -1.0,
        }
    }
}

/// Net grid reading after the activity threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GridReading {
    /// Positive = import, negative = export. Zero below the activity threshold.
    pub net_w: f64,
    pub direction: GridDirection,
}

impl GridReading {
    #[inline]
    pub fn is_active(&self) -> bool { self.net_w != 0.0 }

    #[inline]
    pub fn is_importing(&self) -> bool { self.is_active() && self.direction == GridDirection::Import }
}

/// Resolve the net grid reading.
///
/// With a net sensor configured its value is used (negated when
/// `invert_grid` is set). Otherwise the net is `import - export`, each side
/// treated as 0 when blank. The activity threshold is applied before the
/// direction is decided, and a zero net counts as import.
pub fn resolve_grid(
    config: &Config,
    store: &dyn SensorStore,
) -> GridReading {
    let sensors = &config.sensors;
    let raw_net = if sensors.grid_power.is_empty() {
        let import = finite_or_zero(resolve_value(&sensors.grid_import, store));
        let export = finite_or_zero(resolve_value(&sensors.grid_export, store));
        import - export
    } else {
        let net = finite_or_zero(resolve_value(&sensors.grid_power, store));
        if config.grid.invert { -net } else { net }
    };

    let net_w = apply_activity_threshold(raw_net, config.grid.activity_threshold_w);
    let direction = if net_w < 0.0 { GridDirection::Export } else { GridDirection::Import };
    GridReading { net_w, direction }
}

// =============================================================================
// Derivation
// =============================================================================

/// Aggregated magnitudes the flows are derived from, all in watts.
///
/// `None` marks a feature that is not configured or hidden; such flows are
/// always inactive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowInputs {
    pub pv_array1_w: f64,
    pub pv_array2_w: Option<f64>,
    /// Positive = charging.
    pub battery_w: f64,
    /// Inverter 1 house load.
    pub load_w: f64,
    /// Inverter 2 house load.
    pub secondary_load_w: Option<f64>,
    pub grid: GridReading,
    pub cars_w: [Option<f64>; 2],
    pub heat_pump_w: Option<f64>,
}

/// Derive the full flow table.
pub fn derive_flows(
    config: &Config,
    inputs: &FlowInputs,
) -> FlowTable {
    let palette = &config.palette;
    let mut table = FlowTable::new();

    table.set(FlowKey::Solar1, FlowState::new(is_flow_active(inputs.pv_array1_w), palette.pv_primary, Direction::Forward));
    table.set(FlowKey::Solar2, gated(inputs.pv_array2_w, palette.pv_secondary));

    let battery_w = if config.invert_battery { -inputs.battery_w } else { inputs.battery_w };
    let battery_color = if battery_w > 0.0 { palette.battery_charge } else { palette.battery_discharge };
    table.set(
        FlowKey::Battery,
        FlowState::new(is_flow_active(battery_w), battery_color, Direction::from_sign(battery_w)),
    );

    table.set(
        FlowKey::Load,
        FlowState::new(
            is_flow_active(inputs.load_w),
            config.load_bands.resolve(inputs.load_w, palette.load_flow),
            Direction::Forward,
        ),
    );
    if let Some(secondary) = inputs.secondary_load_w {
        table.set(
            FlowKey::HouseToInverter,
            FlowState::new(
                is_flow_active(secondary),
                config.load_bands.resolve(secondary, palette.load_flow),
                Direction::Forward,
            ),
        );
    }

    let grid = inputs.grid;
    let grid_base = match grid.direction {
        GridDirection::Import => palette.grid_import,
        GridDirection::Export => palette.grid_export,
    };
    let grid_color = config.grid.bands.resolve(grid.net_w, grid_base);
    table.set(
        FlowKey::GridToInverter,
        FlowState::new(grid.is_active(), grid_color, Direction::from_sign(-grid.direction.sign())),
    );
    table.set(
        FlowKey::GridToHouse,
        FlowState::new(grid.is_importing() && is_flow_active(inputs.load_w), grid_color, Direction::Forward),
    );

    table.set(FlowKey::Ev1, gated(inputs.cars_w[0], palette.car_flow[0]));
    table.set(FlowKey::Ev2, gated(inputs.cars_w[1], palette.car_flow[1]));
    table.set(FlowKey::HeatPump, gated(inputs.heat_pump_w, palette.heat_pump_flow));

    table
}

/// Flow for an optional feature with a fixed color.
fn gated(
    watts: Option<f64>,
    color: Color,
) -> FlowState {
    let active = watts.is_some_and(is_flow_active);
    FlowState::new(active, color, Direction::Forward)
}

// =============================================================================
// Tests
// =============================================================================
