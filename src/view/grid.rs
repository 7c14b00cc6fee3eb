//! Grid readout: net power and an import/export caption.

use super::TextFragment;
use crate::config::Config;
use crate::config::layout::{GRID_CAPTION_POS, GRID_POWER_POS};
use crate::flows::{GridDirection, GridReading};
use crate::locale::{Label, label};
use crate::sensors::{format_power, text};

/// Whether any grid sensor is configured.
pub fn is_configured(config: &Config) -> bool {
    let sensors = &config.sensors;
    !(sensors.grid_power.is_empty() && sensors.grid_import.is_empty() && sensors.grid_export.is_empty())
}

/// Net power magnitude, colored by the grid thresholds.
pub fn power_fragment(
    config: &Config,
    reading: &GridReading,
) -> TextFragment {
    let color = config.grid.bands.resolve(reading.net_w, config.palette.grid_text);
    TextFragment::new(format_power(reading.net_w.abs(), config.uses_kilowatt()), GRID_POWER_POS, config.fonts.grid, color)
        .shown(is_configured(config))
}

/// `IMPORT` / `EXPORT`, hidden while the grid is idle.
pub fn caption_fragment(
    config: &Config,
    reading: &GridReading,
) -> TextFragment {
    let (caption, color) = match reading.direction {
        GridDirection::Import => (Label::GridImport, config.palette.grid_import),
        GridDirection::Export => (Label::GridExport, config.palette.grid_export),
    };
    TextFragment::new(text(label(config.language, caption)), GRID_CAPTION_POS, config.fonts.grid, color)
        .shown(is_configured(config) && reading.is_active())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::colors;

    fn config() -> Config { Config::from_value(json!({ "sensor_grid_power": "sensor.grid" })).unwrap() }

    #[test]
    fn test_export_caption() {
        let reading = GridReading { net_w: -200.0, direction: GridDirection::Export };
        let caption = caption_fragment(&config(), &reading);
        assert_eq!(caption.text.as_str(), "EXPORT");
        assert_eq!(caption.fill, colors::GRID_EXPORT);
        assert!(caption.visible);
        assert_eq!(power_fragment(&config(), &reading).text.as_str(), "200 W");
    }

    #[test]
    fn test_idle_grid_hides_caption() {
        let caption = caption_fragment(&config(), &GridReading::default());
        assert!(!caption.visible);
        assert_eq!(caption.text.as_str(), "IMPORT", "zero net counts as import");
    }

    #[test]
    fn test_unconfigured_grid_hidden() {
        let reading = GridReading::default();
        assert!(!power_fragment(&Config::default(), &reading).visible);
        assert!(!is_configured(&Config::default()));
    }
}
