// Crate-level lints: allow the numeric casts of pixel and phase math
#![allow(clippy::cast_possible_truncation)] // f64->f32 for scene attributes, f32->i32 for pixels
#![allow(clippy::cast_precision_loss)] // usize->f32 for marker spacing
#![allow(clippy::cast_possible_wrap)] // u32->i32 for liquid height within the canvas
#![allow(clippy::cast_sign_loss)] // rounded, clamped SOC heights
#![allow(clippy::module_name_repetitions)] // FlowCard, FlowKey, FlowState read better than Card, Key, State

//! Energy flow card core.
//!
//! Renders a single-line diagram of a household energy system (solar,
//! battery, grid, house load, electric vehicles, heat pump) and keeps it in
//! sync with a stream of sensor readings.
//!
//! # Pipeline
//!
//! ```text
//! SensorStore + Config
//!        │
//!        ▼
//! sensors ─▶ thresholds/colors ─▶ flows ─▶ view::build_view_state
//!                                                │ ViewState
//!                         ┌──────────────────────┴──────────────┐
//!                         ▼                                     ▼
//!                render::diff ─▶ Patch ─▶ Scene      animations::FlowAnimator
//!                                                       │ tick(dt), tween engine
//!                                                       ▼
//!                                                     Scene
//! ```
//!
//! # Modules
//!
//! - [`sensors`]: reading and normalizing sensor values
//! - [`thresholds`], [`colors`]: warning bands, activity thresholds, palette
//! - [`flows`]: which energy paths are active, in which color and direction
//! - [`view`]: the pure view-state builder
//! - [`scene`], [`render`]: scene contract and diff/patch rendering
//! - [`animations`], [`geometry`], [`tween`]: flow motion and glow
//! - [`scheduler`]: update throttling
//! - [`card`]: the orchestrator a host drives
//! - [`config`]: typed configuration and layout constants
//! - [`diagnostics`]: render statistics and recent warnings

pub mod animations;
pub mod card;
pub mod colors;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flows;
pub mod geometry;
pub mod locale;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod sensors;
pub mod thresholds;
pub mod tween;
pub mod view;

pub use crate::animations::{AnimationStyle, FlowAnimator};
pub use crate::card::{FlowCard, UpdateOutcome};
pub use crate::config::Config;
pub use crate::error::{ConfigError, EngineLoadError, FlowCardError, GeometryError};
pub use crate::flows::{FlowKey, FlowState, FlowTable};
pub use crate::scene::{Attribute, ElementKey, RecordingScene, Scene};
pub use crate::sensors::{SensorReading, SensorSnapshot, SensorStore};
pub use crate::tween::{EngineAcquisition, EngineLoader, FrameTweens};
pub use crate::view::{ViewState, build_view_state};
