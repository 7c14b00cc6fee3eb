//! Energy flow card simulator for desktop.
//!
//! Feeds a synthetic household day into a [`FlowCard`] backed by a
//! [`RecordingScene`] and rasterizes the scene with the
//! embedded-graphics-simulator crate.
//!
//! Keys:
//! - `A` cycles the animation style
//! - `S` flips the sign of the speed factor
//! - `E` shows or hides the second vehicle
//!
//! Set `FLOW_CARD_NO_TWEENS` to start without a tween engine, which shows the
//! degraded card: correct values and colors, no motion.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod draw;
mod feed;
mod popup;
mod timing;

use std::rc::Rc;
use std::thread;
use std::time::Instant;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use energy_flow_card::config::layout::{CANVAS_HEIGHT, CANVAS_WIDTH};
use energy_flow_card::tween::UnavailableSource;
use energy_flow_card::{Config, EngineLoader, FlowCard, FrameTweens, RecordingScene, UpdateOutcome};
use tracing::{error, info, warn};

use crate::draw::{draw_popup, draw_scene, draw_status};
use crate::feed::DayCycle;
use crate::popup::Popup;
use crate::timing::{ENGINE_TIMEOUT, FRAME_TIME, SIM_HOURS_PER_SECOND};

const NO_TWEENS_VAR: &str = "FLOW_CARD_NO_TWEENS";

const CARD_CONFIG: &str = r#"{
    "card_title": "HOME ENERGY",
    "sensor_pv1": "sensor.pv_string_1",
    "sensor_pv2": "sensor.pv_string_2",
    "sensor_pv_array2_1": "sensor.pv_garage",
    "pv_array2_name": "GARAGE",
    "sensor_daily": "sensor.pv_daily",
    "sensor_bat1_soc": "sensor.battery_soc",
    "sensor_bat1_power": "sensor.battery_power",
    "sensor_home_load": "sensor.home_load",
    "sensor_grid_power": "sensor.grid_power",
    "grid_activity_threshold": 50,
    "load_threshold_warning": 3000,
    "load_threshold_critical": 6000,
    "show_car1": true,
    "car1_label": "EV",
    "sensor_car_power": "sensor.car_power",
    "sensor_car_soc": "sensor.car_soc",
    "show_car2": false,
    "car2_label": "EBIKE",
    "sensor_car2_power": "sensor.car2_power",
    "sensor_car2_soc": "sensor.car2_soc",
    "sensor_heat_pump_consumption": "sensor.heat_pump",
    "animation_style": "dashes",
    "update_interval": 1
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match Config::from_json(CARD_CONFIG) {
        Ok(config) => config,
        Err(err) => {
            error!("built-in configuration rejected: {err}");
            return;
        }
    };

    let engine = Rc::new(FrameTweens::new());
    let loader = if std::env::var_os(NO_TWEENS_VAR).is_some() {
        warn!("{NO_TWEENS_VAR} set, starting without a tween engine");
        EngineLoader::new(vec![Box::new(UnavailableSource::new("bundled", "disabled by environment"))])
    } else {
        EngineLoader::bundled(Rc::clone(&engine))
    };

    let mut card = FlowCard::new(RecordingScene::new(), Rc::new(loader));
    card.set_config(config.clone());
    card.attach();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("cannot start runtime: {err}");
            return;
        }
    };
    let animated = runtime.block_on(async {
        tokio::time::timeout(ENGINE_TIMEOUT, card.acquire_engine()).await.unwrap_or(false)
    });
    info!(animated, "tween engine resolved");

    let mut display: SimulatorDisplay<Rgb888> = SimulatorDisplay::new(Size::new(CANVAS_WIDTH, CANVAS_HEIGHT));
    let output_settings = OutputSettingsBuilder::new().scale(1).build();
    let mut window = Window::new("Energy Flow Card Sim", &output_settings);

    let mut day = DayCycle::new(6.0);
    let mut active_popup: Option<Popup> = None;
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        let dt = frame_start.duration_since(last_frame);
        last_frame = frame_start;

        for ev in window.events() {
            match ev {
                SimulatorEvent::Quit => {
                    card.detach();
                    info!(stats = ?card.stats(), "simulator closed");
                    return;
                }
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if repeat {
                        continue;
                    }
                    let popup = match keycode {
                        Keycode::A => {
                            config.animation.style = config.animation.style.next();
                            Popup::Style(config.animation.style, frame_start)
                        }
                        Keycode::S => {
                            config.animation.speed_factor = -config.animation.speed_factor;
                            Popup::Speed(config.animation.speed_factor, frame_start)
                        }
                        Keycode::E => {
                            config.cars[1].show = !config.cars[1].show;
                            Popup::SecondCar(config.cars[1].show, frame_start)
                        }
                        _ => continue,
                    };
                    card.set_config(config.clone());
                    active_popup = Some(popup);
                }
                _ => {}
            }
        }

        if let Some(ref popup) = active_popup
            && popup.is_expired()
        {
            active_popup = None;
        }

        day.advance(dt.as_secs_f32() * SIM_HOURS_PER_SECOND);
        let snapshot = day.snapshot();
        match card.update(Some(&snapshot), frame_start) {
            Ok(UpdateOutcome::Rendered(report)) if report.full => info!(patches = report.patches, "full render"),
            Ok(_) => {}
            Err(err) => warn!("update failed: {err}"),
        }

        engine.advance(dt.as_secs_f32());
        card.on_frame(dt);

        draw_scene(&mut display, card.scene());
        let stats = card.stats();
        let status = format!(
            "{:05.2}h  {}  speed {:+.1}  motion {}  writes {:.0}%  {}",
            day.hour(),
            config.animation.style,
            config.animation.speed_factor,
            if card.has_engine() { "on" } else { "off" },
            stats.write_ratio_percent(),
            card.diagnostics().last().unwrap_or(""),
        );
        draw_status(&mut display, &status);
        if let Some(ref popup) = active_popup {
            draw_popup(&mut display, popup);
        }
        window.update(&display);

        let elapsed = frame_start.elapsed();
        if let Some(remaining) = FRAME_TIME.checked_sub(elapsed) {
            thread::sleep(remaining);
        }
    }
}
