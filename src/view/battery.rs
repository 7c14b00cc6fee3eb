//! Battery readout and liquid level.
//!
//! Up to four batteries. The displayed SOC is the mean over batteries whose
//! SOC is available and the displayed power is their sum. A battery whose SOC
//! sensor is configured but unavailable is left out of both, so a dead sensor
//! never drags the mean toward zero. A battery with only a power sensor
//! contributes power.

use super::{LiquidFragment, TextFragment, format_soc};
use crate::colors::soc_color;
use crate::config::layout::{BATTERY_LIQUID, BATTERY_POWER_POS, BATTERY_SOC_POS};
use crate::config::{BATTERY_SLOTS, Config};
use crate::sensors::{SensorStore, finite_or_zero, format_power, resolve_optional, resolve_value, text};

/// Aggregated battery readings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatteryReadings {
    /// Mean SOC in percent; `None` when no SOC is available.
    pub soc: Option<f64>,
    /// Summed power; positive = charging.
    pub power_w: f64,
    /// Whether any battery slot has a sensor.
    pub configured: bool,
}

pub fn read(
    config: &Config,
    store: &dyn SensorStore,
) -> BatteryReadings {
    let sensors = &config.sensors;
    let mut soc_sum = 0.0;
    let mut soc_count = 0_u32;
    let mut power_w = 0.0;
    let mut configured = false;

    for slot in 0..BATTERY_SLOTS {
        let soc_id = &sensors.battery_soc[slot];
        let power_id = &sensors.battery_power[slot];
        if soc_id.is_empty() && power_id.is_empty() {
            continue;
        }
        configured = true;

        if !soc_id.is_empty() {
            let Some(soc) = resolve_optional(soc_id, store) else {
                continue;
            };
            soc_sum += soc;
            soc_count += 1;
        }
        power_w += finite_or_zero(resolve_value(power_id, store));
    }

    BatteryReadings { soc: (soc_count > 0).then(|| soc_sum / f64::from(soc_count)), power_w, configured }
}

pub fn soc_fragment(
    config: &Config,
    readings: &BatteryReadings,
) -> TextFragment {
    let soc_text = readings.soc.map_or_else(|| text("--%"), format_soc);
    TextFragment::new(soc_text, BATTERY_SOC_POS, config.fonts.battery_soc, config.palette.battery_text)
        .shown(readings.configured)
}

/// Power magnitude; the flow direction shows charge or discharge.
pub fn power_fragment(
    config: &Config,
    readings: &BatteryReadings,
) -> TextFragment {
    TextFragment::new(
        format_power(readings.power_w.abs(), config.uses_kilowatt()),
        BATTERY_POWER_POS,
        config.fonts.battery_power,
        config.palette.battery_text,
    )
    .shown(readings.configured)
}

/// Liquid rectangle filled to the SOC.
pub fn liquid(readings: &BatteryReadings) -> LiquidFragment {
    let Some(soc) = readings.soc.filter(|_| readings.configured) else {
        return LiquidFragment { y: BATTERY_LIQUID.bottom(), height: 0, fill: soc_color(0.0), visible: false };
    };
    let soc = soc.clamp(0.0, 100.0);
    let height = (f64::from(BATTERY_LIQUID.height) * soc / 100.0).round() as u32;
    LiquidFragment { y: BATTERY_LIQUID.bottom() - height as i32, height, fill: soc_color(soc), visible: true }
}
