//! Rasterizes a [`RecordingScene`] onto the simulator display.
//!
//! Paths are drawn first so that text and markers stay on top.

use core::fmt::Write;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, Triangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_graphics_simulator::SimulatorDisplay;
use energy_flow_card::colors::{self, Color};
use energy_flow_card::config::layout::{BATTERY_LIQUID, CANVAS_HEIGHT};
use energy_flow_card::geometry::Polyline;
use energy_flow_card::scene::{ElementKind, Node, RecordingScene};
use heapless::String;
use profont::{PROFONT_9_POINT, PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use crate::popup::Popup;

const BACKGROUND: Rgb888 = Rgb888::BLACK;
const OUTLINE: Rgb888 = Rgb888::new(0x40, 0x40, 0x40);
const STATUS_COLOR: Rgb888 = Rgb888::new(0x80, 0x80, 0x80);
const POPUP_COLOR: Rgb888 = Rgb888::YELLOW;

const PATH_WIDTH: u32 = 2;
const GLOW_WIDTH: u32 = 6;
/// Glow is drawn dimmer than the path it surrounds.
const GLOW_STRENGTH: f32 = 0.35;
/// Sampling step along dashed paths, in pixels.
const DASH_STEP: f32 = 1.0;
const ARROW_SIZE: f32 = 7.0;

const STATUS_POS: Point = Point::new(4, CANVAS_HEIGHT as i32 - 6);
const POPUP_POS: Point = Point::new(400, 60);

pub fn draw_scene(
    display: &mut SimulatorDisplay<Rgb888>,
    scene: &RecordingScene,
) {
    display.clear(BACKGROUND).ok();

    for node in scene.live().filter(|n| n.visible && n.kind == ElementKind::Path) {
        draw_path(display, node);
    }
    for node in scene.live().filter(|n| n.visible) {
        match node.kind {
            ElementKind::Image => draw_backdrop(display),
            ElementKind::Rect => draw_liquid(display, node),
            ElementKind::Text => draw_text(display, node),
            ElementKind::Marker => draw_marker(display, node),
            ElementKind::Path => {}
        }
    }
}

/// One line of simulator state at the bottom edge.
pub fn draw_status(
    display: &mut SimulatorDisplay<Rgb888>,
    line: &str,
) {
    let style = MonoTextStyle::new(&PROFONT_9_POINT, STATUS_COLOR);
    Text::with_baseline(line, STATUS_POS, style, Baseline::Bottom).draw(display).ok();
}

pub fn draw_popup(
    display: &mut SimulatorDisplay<Rgb888>,
    popup: &Popup,
) {
    let mut msg: String<32> = String::new();
    let _ = match popup {
        Popup::Style(style, _) => write!(msg, "STYLE: {}", style.name().to_uppercase()),
        Popup::Speed(factor, _) => write!(msg, "SPEED: {factor:+.1}"),
        Popup::SecondCar(shown, _) => write!(msg, "EV 2: {}", if *shown { "ON" } else { "OFF" }),
    };
    let style = MonoTextStyle::new(&PROFONT_18_POINT, POPUP_COLOR);
    Text::with_text_style(&msg, POPUP_POS, style, centered()).draw(display).ok();
}

// =============================================================================
// Elements
// =============================================================================

fn draw_backdrop(display: &mut SimulatorDisplay<Rgb888>) {
    Rectangle::new(
        Point::new(BATTERY_LIQUID.x - 2, BATTERY_LIQUID.y - 2),
        Size::new(BATTERY_LIQUID.width + 4, BATTERY_LIQUID.height + 4),
    )
    .into_styled(PrimitiveStyle::with_stroke(OUTLINE, 1))
    .draw(display)
    .ok();
}

fn draw_liquid(
    display: &mut SimulatorDisplay<Rgb888>,
    node: &Node,
) {
    let (Some((y, height)), Some(fill)) = (node.rect, node.fill) else {
        return;
    };
    Rectangle::new(Point::new(BATTERY_LIQUID.x, y), Size::new(BATTERY_LIQUID.width, height))
        .into_styled(PrimitiveStyle::with_fill(shade(fill, node.opacity)))
        .draw(display)
        .ok();
}

fn draw_text(
    display: &mut SimulatorDisplay<Rgb888>,
    node: &Node,
) {
    if node.text.is_empty() {
        return;
    }
    let color = shade(node.fill.unwrap_or(colors::WHITE), node.opacity);
    let style = MonoTextStyle::new(font_for(node.font_size), color);
    Text::with_text_style(node.text.as_str(), node.position, style, centered()).draw(display).ok();
}

fn draw_path(
    display: &mut SimulatorDisplay<Rgb888>,
    node: &Node,
) {
    let Ok(polyline) = Polyline::parse(node.geometry) else {
        return;
    };
    let points = polyline.points();

    if let Some((glow, _, opacity)) = node.glow
        && opacity > 0.0
    {
        let color = shade(glow, opacity * GLOW_STRENGTH * node.opacity);
        stroke_polyline(display, points, color, GLOW_WIDTH, None, 0.0);
    }

    let color = shade(node.stroke.unwrap_or(colors::WHITE), node.opacity);
    stroke_polyline(display, points, color, PATH_WIDTH, node.dash_pattern, node.dash_offset);
}

fn draw_marker(
    display: &mut SimulatorDisplay<Rgb888>,
    node: &Node,
) {
    let Some(t) = node.transform else {
        return;
    };
    let (sin, cos) = t.rotation.to_radians().sin_cos();
    let corner = |dx: f32, dy: f32| {
        Point::new((t.x + dx * cos - dy * sin).round() as i32, (t.y + dx * sin + dy * cos).round() as i32)
    };
    let back = -ARROW_SIZE * 0.6;
    let color = shade(node.fill.unwrap_or(colors::WHITE), node.opacity);
    Triangle::new(corner(ARROW_SIZE, 0.0), corner(back, ARROW_SIZE * 0.6), corner(back, -ARROW_SIZE * 0.6))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(display)
        .ok();
}

// =============================================================================
// Helpers
// =============================================================================

/// Stroke a polyline, solid or with a `[dash, gap]` pattern shifted by
/// `offset` pixels.
fn stroke_polyline(
    display: &mut SimulatorDisplay<Rgb888>,
    points: &[(f32, f32)],
    color: Rgb888,
    width: u32,
    pattern: Option<[f32; 2]>,
    offset: f32,
) {
    let style = PrimitiveStyle::with_stroke(color, width);
    let to_point = |(x, y): (f32, f32)| Point::new(x.round() as i32, y.round() as i32);

    let Some([dash, gap]) = pattern.filter(|[dash, gap]| dash + gap > 0.0) else {
        for pair in points.windows(2) {
            Line::new(to_point(pair[0]), to_point(pair[1])).into_styled(style).draw(display).ok();
        }
        return;
    };

    let period = dash + gap;
    let mut travelled = 0.0f32;
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let length = (x1 - x0).hypot(y1 - y0);
        if length <= 0.0 {
            continue;
        }
        let mut s = 0.0f32;
        while s < length {
            let step = DASH_STEP.min(length - s);
            if (travelled + s + offset).rem_euclid(period) < dash {
                let (a, b) = (s / length, (s + step) / length);
                let start = (x0 + (x1 - x0) * a, y0 + (y1 - y0) * a);
                let end = (x0 + (x1 - x0) * b, y0 + (y1 - y0) * b);
                Line::new(to_point(start), to_point(end)).into_styled(style).draw(display).ok();
            }
            s += step;
        }
        travelled += length;
    }
}

/// Premultiply a palette color against the black background.
fn shade(
    color: Color,
    opacity: f32,
) -> Rgb888 {
    let rgb = color.to_rgb888();
    let a = (color.alpha() * opacity).clamp(0.0, 1.0);
    let scale = |c: u8| (f32::from(c) * a).round() as u8;
    Rgb888::new(scale(rgb.r()), scale(rgb.g()), scale(rgb.b()))
}

fn font_for(size: u32) -> &'static MonoFont<'static> {
    match size {
        0..=10 => &PROFONT_9_POINT,
        11..=14 => &PROFONT_12_POINT,
        15..=17 => &PROFONT_14_POINT,
        18..=22 => &PROFONT_18_POINT,
        _ => &PROFONT_24_POINT,
    }
}

fn centered() -> embedded_graphics::text::TextStyle {
    TextStyleBuilder::new().alignment(Alignment::Center).baseline(Baseline::Middle).build()
}
