//! Threshold handling for flow activity and indicator colors.
//!
//! Two kinds of thresholds exist:
//!
//! - **Color thresholds** (load and grid): an indicator switches to its warning
//!   color at or above the warning threshold, and to its critical color at or
//!   above the critical threshold. They are configured in the display unit and
//!   converted to watts once by [`threshold_to_watts`].
//! - **Activity thresholds**: magnitudes below them count as "no flow". Every
//!   flow uses the fixed [`ACTIVITY_FLOOR_W`]; the grid additionally applies a
//!   configurable threshold via [`apply_activity_threshold`].
//!
//! # Compile-Time Validation
//!
//! Band constants carry `const` assertions so an inconsistent edit fails the
//! build instead of producing odd colors.

use serde::Serialize;

use crate::colors::Color;

// =============================================================================
// Activity Thresholds
// =============================================================================

/// Magnitude in watts a flow must exceed to count as active.
pub const ACTIVITY_FLOOR_W: f64 = 10.0;

/// Default grid activity threshold in watts.
pub const DEFAULT_GRID_ACTIVITY_THRESHOLD_W: f64 = 100.0;

/// Upper bound accepted for the grid activity threshold.
pub const MAX_GRID_ACTIVITY_THRESHOLD_W: f64 = 100_000.0;

const _: () = assert!(ACTIVITY_FLOOR_W < DEFAULT_GRID_ACTIVITY_THRESHOLD_W);
const _: () = assert!(DEFAULT_GRID_ACTIVITY_THRESHOLD_W < MAX_GRID_ACTIVITY_THRESHOLD_W);

// =============================================================================
// Battery State of Charge Bands
// =============================================================================

/// Below this SOC (percent) the battery liquid turns red.
pub const SOC_CRITICAL: f64 = 20.0;

/// Below this SOC (percent) the battery liquid turns yellow.
pub const SOC_WARNING: f64 = 50.0;

const _: () = assert!(SOC_CRITICAL < SOC_WARNING);
const _: () = assert!(SOC_WARNING < 100.0);

// =============================================================================
// Color Thresholds
// =============================================================================

/// One threshold level: trigger magnitude in watts plus the color to use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Threshold {
    pub watts: f64,
    pub color: Color,
}

/// Severity reached by a magnitude against a set of [`ThresholdBands`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Normal,
    Warning,
    Critical,
}

/// Optional warning and critical levels for one indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ThresholdBands {
    pub warning: Option<Threshold>,
    pub critical: Option<Threshold>,
}

impl ThresholdBands {
    #[inline]
    pub const fn new(
        warning: Option<Threshold>,
        critical: Option<Threshold>,
    ) -> Self {
        Self { warning, critical }
    }

    /// Severity level for a magnitude in watts. The sign is ignored.
    pub fn level(
        &self,
        watts: f64,
    ) -> Level {
        let magnitude = watts.abs();
        if self.critical.is_some_and(|t| magnitude >= t.watts) {
            Level::Critical
        } else if self.warning.is_some_and(|t| magnitude >= t.watts) {
            Level::Warning
        } else {
            Level::Normal
        }
    }

    /// Effective color: critical if reached, else warning if reached, else `base`.
    pub fn resolve(
        &self,
        watts: f64,
        base: Color,
    ) -> Color {
        match self.level(watts) {
            Level::Critical => self.critical.map_or(base, |t| t.color),
            Level::Warning => self.warning.map_or(base, |t| t.color),
            Level::Normal => base,
        }
    }
}

/// Convert a threshold configured in the display unit to watts.
///
/// Returns `None` for non-finite or negative values so that a broken option
/// simply disables that level.
pub fn threshold_to_watts(
    value: f64,
    kilowatt_display: bool,
) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(if kilowatt_display { value * 1000.0 } else { value })
}

// =============================================================================
// Activity Checks
// =============================================================================

/// Force a net grid reading to zero when it is below the activity threshold.
///
/// A threshold of 0 keeps every nonzero reading. Otherwise readings whose
/// magnitude is strictly below the threshold become 0.
#[inline]
pub fn apply_activity_threshold(
    net_w: f64,
    threshold_w: f64,
) -> f64 {
    if !net_w.is_finite() {
        return 0.0;
    }
    if threshold_w > 0.0 && net_w.abs() < threshold_w { 0.0 } else { net_w }
}

/// Whether a magnitude exceeds the fixed activity floor.
#[inline]
pub fn is_flow_active(watts: f64) -> bool { watts.is_finite() && watts.abs() > ACTIVITY_FLOOR_W }

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{CRITICAL, LOAD_FLOW, WARNING};

    fn bands(
        warning: f64,
        critical: f64,
    ) -> ThresholdBands {
        ThresholdBands::new(
            Some(Threshold { watts: warning, color: WARNING }),
            Some(Threshold { watts: critical, color: CRITICAL }),
        )
    }

    // =========================================================================
    // Color Threshold Tests
    // =========================================================================

    #[test]
    fn test_resolve_below_warning_uses_base() {
        assert_eq!(bands(1000.0, 3000.0).resolve(999.0, LOAD_FLOW), LOAD_FLOW);
    }

    #[test]
    fn test_resolve_boundaries_are_inclusive() {
        let b = bands(1000.0, 3000.0);
        assert_eq!(b.resolve(1000.0, LOAD_FLOW), WARNING, "warning at exactly the threshold");
        assert_eq!(b.resolve(3000.0, LOAD_FLOW), CRITICAL, "critical at exactly the threshold");
        assert_eq!(b.resolve(-3500.0, LOAD_FLOW), CRITICAL, "sign is ignored");
    }

    #[test]
    fn test_resolve_missing_levels() {
        let only_critical = ThresholdBands::new(None, Some(Threshold { watts: 500.0, color: CRITICAL }));
        assert_eq!(only_critical.resolve(400.0, LOAD_FLOW), LOAD_FLOW);
        assert_eq!(only_critical.resolve(600.0, LOAD_FLOW), CRITICAL);
        assert_eq!(ThresholdBands::default().level(1.0e9), Level::Normal);
    }

    #[test]
    fn test_threshold_to_watts() {
        assert_eq!(threshold_to_watts(2.5, true), Some(2500.0));
        assert_eq!(threshold_to_watts(2.5, false), Some(2.5));
        assert_eq!(threshold_to_watts(f64::NAN, false), None);
        assert_eq!(threshold_to_watts(-1.0, false), None);
    }

    // =========================================================================
    // Activity Tests
    // =========================================================================

    #[test]
    fn test_activity_threshold_zero_keeps_everything() {
        assert_eq!(apply_activity_threshold(1.0, 0.0), 1.0);
        assert_eq!(apply_activity_threshold(-0.5, 0.0), -0.5);
    }

    #[test]
    fn test_activity_threshold_boundary() {
        assert_eq!(apply_activity_threshold(99.0, 100.0), 0.0, "99 W is below a 100 W threshold");
        assert_eq!(apply_activity_threshold(100.0, 100.0), 100.0, "100 W meets a 100 W threshold");
        assert_eq!(apply_activity_threshold(-150.0, 100.0), -150.0);
    }

    #[test]
    fn test_activity_threshold_non_finite() {
        assert_eq!(apply_activity_threshold(f64::NAN, 0.0), 0.0);
        assert_eq!(apply_activity_threshold(f64::INFINITY, 100.0), 0.0);
    }

    #[test]
    fn test_is_flow_active_uses_floor() {
        assert!(!is_flow_active(ACTIVITY_FLOOR_W), "floor itself is inactive");
        assert!(is_flow_active(ACTIVITY_FLOOR_W + 0.1));
        assert!(is_flow_active(-50.0));
        assert!(!is_flow_active(f64::NAN));
    }
}
