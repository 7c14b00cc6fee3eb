//! Colors for the energy flow diagram.
//!
//! Every color that reaches the scene goes through [`Color`]. A color either
//! renders as `#rrggbb` (opaque) or as `rgba(r, g, b, a)` (translucent), so the
//! scene never receives an unvalidated string.
//!
//! # Parsing
//!
//! [`Color::parse`] accepts the forms a configuration editor produces:
//!
//! | Input | Example |
//! |-------|---------|
//! | Short hex | `#0af` |
//! | Hex | `#00aaff` |
//! | Hex with alpha | `#00aaff80` |
//! | Functional | `rgb(0, 170, 255)` / `rgba(0, 170, 255, 0.5)` |
//! | Named | `white`, `orange`, ... |
//!
//! Anything else yields `None` and the configuration layer falls back to the
//! documented default for that option.
//!
//! Colors are stored as [`Rgb888`] so the simulator can draw them without a
//! conversion step.

use std::fmt;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde::{Serialize, Serializer};

use crate::thresholds::{SOC_CRITICAL, SOC_WARNING};

// =============================================================================
// Color Type
// =============================================================================

/// Validated scene color with optional alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    rgb: Rgb888,
    /// Alpha in `[0, 1]`. `None` means fully opaque.
    alpha: Option<f32>,
}

impl Color {
    /// Opaque color from 8-bit channels.
    #[inline]
    pub const fn rgb(
        r: u8,
        g: u8,
        b: u8,
    ) -> Self {
        Self { rgb: Rgb888::new(r, g, b), alpha: None }
    }

    /// Same color with the given alpha. Values are clamped to `[0, 1]`;
    /// `1.0` collapses back to an opaque color.
    #[must_use]
    pub fn with_alpha(
        self,
        alpha: f32,
    ) -> Self {
        let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
        Self { rgb: self.rgb, alpha: if alpha >= 1.0 { None } else { Some(alpha) } }
    }

    #[inline]
    pub const fn to_rgb888(self) -> Rgb888 { self.rgb }

    /// Alpha in `[0, 1]` (1.0 when opaque).
    #[inline]
    pub fn alpha(self) -> f32 { self.alpha.unwrap_or(1.0) }

    #[inline]
    pub fn is_opaque(self) -> bool { self.alpha.is_none() }

    /// Parse a user supplied color string. Returns `None` for anything that
    /// is not one of the accepted forms.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = trimmed.to_ascii_lowercase();
        if let Some(args) = lower.strip_prefix("rgba(").and_then(|rest| rest.strip_suffix(')')) {
            return parse_functional(args, true);
        }
        if let Some(args) = lower.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
            return parse_functional(args, false);
        }

        named(&lower)
    }
}

impl fmt::Display for Color {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.alpha {
            None => write!(f, "#{:02x}{:02x}{:02x}", self.rgb.r(), self.rgb.g(), self.rgb.b()),
            Some(alpha) => {
                // Two decimals keep the string stable across repeated renders.
                let alpha = (alpha * 100.0).round() / 100.0;
                write!(f, "rgba({}, {}, {}, {alpha})", self.rgb.r(), self.rgb.g(), self.rgb.b())
            }
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            let r = digits.next()??;
            let g = digits.next()??;
            let b = digits.next()??;
            Some(Color::rgb(r, g, b))
        }
        6 => Some(Color::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        8 => {
            let color = Color::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?);
            let alpha = f32::from(channel(&hex[6..8])?) / 255.0;
            Some(color.with_alpha(alpha))
        }
        _ => None,
    }
}

fn parse_functional(
    args: &str,
    expect_alpha: bool,
) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if expect_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }

    let channel = |s: &str| -> Option<u8> {
        let value = s.parse::<f32>().ok()?;
        if !value.is_finite() || !(0.0..=255.0).contains(&value) {
            return None;
        }
        Some(value.round() as u8)
    };

    let color = Color::rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
    if expect_alpha {
        let alpha = parts[3].parse::<f32>().ok().filter(|a| a.is_finite())?;
        Some(color.with_alpha(alpha))
    } else {
        Some(color)
    }
}

fn named(name: &str) -> Option<Color> {
    let color = match name {
        "black" => BLACK,
        "white" => WHITE,
        "red" => Color::rgb(0xff, 0x00, 0x00),
        "green" => Color::rgb(0x00, 0x80, 0x00),
        "lime" => Color::rgb(0x00, 0xff, 0x00),
        "blue" => Color::rgb(0x00, 0x00, 0xff),
        "cyan" | "aqua" => Color::rgb(0x00, 0xff, 0xff),
        "yellow" => Color::rgb(0xff, 0xff, 0x00),
        "orange" => Color::rgb(0xff, 0xa5, 0x00),
        "gray" | "grey" => Color::rgb(0x80, 0x80, 0x80),
        "transparent" => BLACK.with_alpha(0.0),
        _ => return None,
    };
    Some(color)
}

// =============================================================================
// Standard Colors
// =============================================================================

pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

// =============================================================================
// Default Palette
// =============================================================================

/// Primary PV array flow.
pub const PV_PRIMARY: Color = Color::rgb(0x00, 0x80, 0xff);

/// Secondary PV array flow.
pub const PV_SECONDARY: Color = Color::rgb(0x80, 0xff, 0xff);

pub const BATTERY_CHARGE: Color = Color::rgb(0x00, 0xff, 0xff);
pub const BATTERY_DISCHARGE: Color = WHITE;

pub const LOAD_FLOW: Color = Color::rgb(0x00, 0x80, 0xff);

/// Grid import (buying from the grid).
pub const GRID_IMPORT: Color = Color::rgb(0xff, 0x33, 0x33);

/// Grid export (selling to the grid).
pub const GRID_EXPORT: Color = Color::rgb(0x00, 0xff, 0x00);

pub const CAR_FLOW: Color = Color::rgb(0x00, 0xff, 0xff);

pub const HEAT_PUMP: Color = Color::rgb(0xff, 0xa5, 0x00);

/// Header and title text.
pub const HEADER_TEXT: Color = Color::rgb(0x00, 0xff, 0xff);

/// Default warning color for load and grid thresholds.
pub const WARNING: Color = Color::rgb(0xff, 0x80, 0x00);

/// Default critical color for load and grid thresholds.
pub const CRITICAL: Color = Color::rgb(0xff, 0x00, 0x00);

// =============================================================================
// Battery Liquid
// =============================================================================

/// Liquid fill for a healthy state of charge.
pub const SOC_HIGH: Color = Color::rgb(0x00, 0xff, 0xff);

/// Liquid fill between the critical and warning bands.
pub const SOC_MEDIUM: Color = Color::rgb(0xff, 0xff, 0x00);

/// Liquid fill below the critical band.
pub const SOC_LOW: Color = Color::rgb(0xff, 0x00, 0x00);

/// Battery liquid color for a state of charge in percent.
///
/// | SOC | Color |
/// |-----|-------|
/// | < 20 | [`SOC_LOW`] |
/// | 20-50 | [`SOC_MEDIUM`] |
/// | >= 50 | [`SOC_HIGH`] |
#[inline]
pub fn soc_color(soc: f64) -> Color {
    if soc < SOC_CRITICAL {
        SOC_LOW
    } else if soc < SOC_WARNING {
        SOC_MEDIUM
    } else {
        SOC_HIGH
    }
}

// =============================================================================
// Tests
// =============================================================================
