//! Diagram layout constants.
//!
//! All coordinates are in the 800×450 design space of the background art.
//! The scene scales the whole canvas, so nothing here depends on the host's
//! actual widget size.
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │ DAILY        TITLE                            │
//!   │    SOLAR ──┐                     LOAD         │
//!   │            ▼                      ▲           │
//!   │          INVERTER ─────────────── GRID        │
//!   │    BATTERY   │   EV 1 / EV 2    HEAT PUMP     │
//!   └──────────────────────────────────────────────┘
//! ```

use embedded_graphics::prelude::Point;

use crate::flows::FLOW_COUNT;

// =============================================================================
// Canvas
// =============================================================================

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 450;

/// Background art without a heat pump.
pub const BACKGROUND: &str = "background.png";

/// Background art with the heat pump drawn in.
pub const BACKGROUND_HEAT_PUMP: &str = "background_heat_pump.png";

// =============================================================================
// Text Anchors
// =============================================================================

pub const TITLE_POS: Point = Point::new(400, 30);
pub const DAILY_LABEL_POS: Point = Point::new(70, 50);
pub const DAILY_VALUE_POS: Point = Point::new(70, 76);

/// Vertical distance between stacked readout lines.
pub const LINE_SPACING: i32 = 18;

/// Center of the solar readout block. Lines are stacked around this Y.
pub const SOLAR_ANCHOR: Point = Point::new(210, 80);

/// Solar readout capacity: total, plus up to six strings.
pub const SOLAR_SLOT_COUNT: usize = 7;

pub const BATTERY_SOC_POS: Point = Point::new(250, 320);
pub const BATTERY_POWER_POS: Point = Point::new(250, 344);

/// Center of the load readout block.
pub const LOAD_ANCHOR: Point = Point::new(560, 150);

/// Load readout capacity: house total, inverter 1, inverter 2.
pub const LOAD_SLOT_COUNT: usize = 3;

pub const GRID_POWER_POS: Point = Point::new(680, 320);
pub const GRID_CAPTION_POS: Point = Point::new(680, 342);

pub const HEAT_PUMP_POS: Point = Point::new(500, 395);

// =============================================================================
// Battery Liquid
// =============================================================================

/// Rectangle the battery liquid fills from the bottom up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl LiquidRect {
    /// Bottom edge Y.
    #[inline]
    pub const fn bottom(&self) -> i32 { self.y + self.height as i32 }
}

pub const BATTERY_LIQUID: LiquidRect = LiquidRect { x: 180, y: 290, width: 40, height: 80 };

// =============================================================================
// EV Presets
// =============================================================================

/// Text anchors for one vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvAnchors {
    pub name: Point,
    pub power: Point,
    pub soc: Point,
}

/// Anchors when only one vehicle is shown.
pub const EV_SINGLE: EvAnchors =
    EvAnchors { name: Point::new(350, 398), power: Point::new(350, 418), soc: Point::new(350, 436) };

/// Anchors for vehicle 1 and vehicle 2 while vehicle 2 is shown.
pub const EV_DUAL: [EvAnchors; 2] = [
    EvAnchors { name: Point::new(300, 398), power: Point::new(300, 418), soc: Point::new(300, 436) },
    EvAnchors { name: Point::new(410, 398), power: Point::new(410, 418), soc: Point::new(410, 436) },
];

// =============================================================================
// Flow Paths
// =============================================================================

/// Static path data per flow, in [`crate::flows::FlowKey::ALL`] order.
pub const FLOW_PATHS: [&str; FLOW_COUNT] = [
    "M 170 120 L 170 180 L 330 180 L 330 215",
    "M 250 120 L 250 165 L 345 165 L 345 215",
    "M 330 260 L 200 260 L 200 280",
    "M 380 240 L 470 240 L 470 210",
    "M 380 250 L 620 250 L 620 300",
    "M 640 300 L 640 200 L 560 200",
    "M 470 170 C 430 140 400 150 370 210",
    "M 350 260 L 350 380",
    "M 370 260 Q 390 320 400 380",
    "M 500 240 L 500 370",
];

/// Y position of slot `index` when `count` lines are centered around `anchor_y`.
#[inline]
pub const fn stacked_line_y(
    anchor_y: i32,
    index: usize,
    count: usize,
) -> i32 {
    if count == 0 {
        return anchor_y;
    }
    let offset = (2 * index as i32 - (count as i32 - 1)) * LINE_SPACING;
    anchor_y + offset / 2
}
