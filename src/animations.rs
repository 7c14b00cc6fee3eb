//! Flow animations: motion along paths and glow pulsing.
//!
//! Every flow owns one persistent [`AnimationEntry`] that survives across
//! rebuilds. The view state only tells the animator *what* each flow looks like
//! this cycle ([`FlowFrame`]); the animator decides *how* it moves between
//! cycles, so a sensor update never restarts a running animation.
//!
//! # Lifecycle
//!
//! ```text
//!   absent ──first sync──▶ idle ◀──inactive── active
//!     ▲                      │ ──active──▶      │
//!     └──style change / teardown────────────────┘
//! ```
//!
//! An entry is created idle with phase 0 the first time its flow is synced.
//! Each cycle it is switched between idle and active. When the animation style
//! changes, entries of the old style are retired (motion attributes reset) and
//! recreated in the new style, again with phase 0.
//!
//! # Motion
//!
//! Each tick advances the phase:
//!
//! ```text
//! phase += dt * loop_rate * direction
//! ```
//!
//! `direction` is ramped by the tween engine between -1, 0 and +1, so
//! reversals slow down and turn around instead of jumping. The phase is
//! wrapped into `[-1, 1]`, which is one full cycle of every style.
//!
//! | Style | Output | Cycle |
//! |-------|--------|-------|
//! | dashes | path dash offset | 24 px (`12 12`) |
//! | dots | path dash offset | 16 px (`2 14`) |
//! | arrows | three markers on the path | path length |
//!
//! # Degraded Mode
//!
//! Without a tween engine the direction snaps to its target and the glow sits
//! at a static level. Values, colors and visibility are unaffected.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::colors::{self, Color};
use crate::flows::{FLOW_COUNT, FlowKey, FlowState, FlowTable};
use crate::geometry::{PathGeometry, Polyline};
use crate::scene::{ArrowTransform, Attribute, ElementKey};
use crate::tween::{Ease, Repeat, SharedEngine, TweenHandle, TweenProps, TweenTarget, target};
use crate::view::AnimationSettings;

// =============================================================================
// Constants
// =============================================================================

/// Phase units per second at speed factor 1.
pub const BASE_LOOP_RATE: f32 = 0.8;

/// Path length, in pixels, at which arrows move at the base rate.
pub const REFERENCE_CYCLE_LENGTH: f32 = 120.0;

/// Arrow rate multiplier when the path length cannot be measured.
pub const UNMEASURED_ARROW_RATE: f32 = 0.25;

/// Markers per flow in arrow style.
pub const ARROW_COUNT: usize = 3;

/// Glow opacity of an idle flow.
pub const GLOW_REST: f32 = 0.25;

/// Glow opacity peak of an active flow.
pub const GLOW_ACTIVE: f32 = 1.0;

/// Seconds per glow pass.
pub const GLOW_PERIOD_SECS: f32 = 1.0;

/// Drop-shadow blur radius in pixels.
pub const GLOW_BLUR: f32 = 6.0;

/// Seconds for the direction to ramp to a new target.
pub const DIRECTION_RAMP_SECS: f32 = 0.4;

/// Largest phase magnitude before wrapping.
pub const PHASE_WRAP_LIMIT: f32 = 1.0;

/// Path opacity of an idle flow.
pub const INACTIVE_PATH_OPACITY: f32 = 0.3;

const _: () = assert!(GLOW_REST < GLOW_ACTIVE);
const _: () = assert!(ARROW_COUNT > 0 && ARROW_COUNT <= u8::MAX as usize);

// =============================================================================
// Style
// =============================================================================

/// How motion along a path is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    #[default]
    Dashes,
    Dots,
    Arrows,
}

impl AnimationStyle {
    pub const ALL: [Self; 3] = [Self::Dashes, Self::Dots, Self::Arrows];

    /// Case-insensitive; anything unknown is [`Self::Dashes`].
    pub fn parse(s: &str) -> Self {
        Self::ALL.into_iter().find(|style| s.trim().eq_ignore_ascii_case(style.name())).unwrap_or_default()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Dashes => "dashes",
            Self::Dots => "dots",
            Self::Arrows => "arrows",
        }
    }

    /// Pixels travelled per unit of phase.
    pub const fn cycle_length(self) -> f32 {
        match self {
            Self::Dashes => 24.0,
            Self::Dots => 16.0,
            Self::Arrows => REFERENCE_CYCLE_LENGTH,
        }
    }

    /// Stroke dash pattern; `None` for a solid line.
    pub const fn dash_pattern(self) -> Option<[f32; 2]> {
        match self {
            Self::Dashes => Some([12.0, 12.0]),
            Self::Dots => Some([2.0, 14.0]),
            Self::Arrows => None,
        }
    }

    /// Next style in [`Self::ALL`], wrapping.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Dashes => Self::Dots,
            Self::Dots => Self::Arrows,
            Self::Arrows => Self::Dashes,
        }
    }
}

impl fmt::Display for AnimationStyle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Per-cycle animator input, copied out of the view state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowFrame {
    pub flows: FlowTable,
    pub visible: [bool; FLOW_COUNT],
    pub paths: [&'static str; FLOW_COUNT],
    pub settings: AnimationSettings,
}

/// Receives attribute writes from the animator.
pub trait AnimationSink {
    fn write(
        &mut self,
        element: ElementKey,
        attribute: Attribute,
    );
}

// =============================================================================
// Animation Entry
// =============================================================================

/// Persistent animation record of one flow.
pub struct AnimationEntry {
    key: FlowKey,
    mode: AnimationStyle,
    active: bool,
    suppressed: bool,
    phase: f32,
    /// Ramped travel direction in `[-1, 1]`.
    direction: TweenTarget,
    /// Ramped glow opacity.
    glow: TweenTarget,
    target_direction: f32,
    color: Color,
    path: &'static str,
    geometry: Option<Polyline>,
    path_length: Option<f32>,
    loop_rate: f32,
    last_glow: Option<(Color, f32)>,
    direction_tween: Option<Box<dyn TweenHandle>>,
    glow_tween: Option<Box<dyn TweenHandle>>,
}

impl AnimationEntry {
    fn new(
        key: FlowKey,
        mode: AnimationStyle,
        path: &'static str,
    ) -> Self {
        let mut entry = Self {
            key,
            mode,
            active: false,
            suppressed: false,
            phase: 0.0,
            direction: target(0.0),
            glow: target(GLOW_REST),
            target_direction: 0.0,
            color: colors::WHITE,
            path,
            geometry: None,
            path_length: None,
            loop_rate: 0.0,
            last_glow: None,
            direction_tween: None,
            glow_tween: None,
        };
        entry.set_geometry(path);
        entry
    }

    fn set_geometry(
        &mut self,
        path: &'static str,
    ) {
        self.path = path;
        self.geometry = match Polyline::parse(path) {
            Ok(polyline) => Some(polyline),
            Err(err) => {
                debug!(flow = %self.key, "path geometry unavailable: {err}");
                None
            }
        };
        self.path_length = self.geometry.as_ref().and_then(|g| g.total_length()).filter(|len| *len > 0.0);
    }

    pub const fn key(&self) -> FlowKey { self.key }

    pub const fn mode(&self) -> AnimationStyle { self.mode }

    pub const fn is_active(&self) -> bool { self.active }

    pub const fn is_suppressed(&self) -> bool { self.suppressed }

    /// Always finite.
    pub const fn phase(&self) -> f32 { self.phase }

    /// Current, possibly mid-ramp, direction.
    pub fn direction(&self) -> f32 { self.direction.get() }

    /// Direction the ramp is heading to: the effective sign while active, 0
    /// while idle.
    pub const fn target_direction(&self) -> f32 { self.target_direction }

    pub fn glow(&self) -> f32 { self.glow.get() }

    pub const fn color(&self) -> Color { self.color }

    pub const fn loop_rate(&self) -> f32 { self.loop_rate }

    pub const fn path_length(&self) -> Option<f32> { self.path_length }

    fn kill_tweens(&mut self) {
        for tween in [self.direction_tween.take(), self.glow_tween.take()].into_iter().flatten() {
            tween.kill();
        }
    }

    /// Start the direction ramp and the glow tween for the current state.
    fn start_tweens(
        &mut self,
        engine: Option<&SharedEngine>,
    ) {
        self.kill_tweens();
        let Some(engine) = engine else {
            self.direction.set(self.target_direction);
            self.glow.set(if self.active { GLOW_ACTIVE } else { GLOW_REST });
            return;
        };

        self.direction_tween = Some(engine.to(
            self.direction.clone(),
            TweenProps::to(self.target_direction).duration(DIRECTION_RAMP_SECS).ease(Ease::SineInOut),
        ));
        let glow = if self.active {
            self.glow.set(GLOW_REST);
            TweenProps::to(GLOW_ACTIVE).repeat(Repeat::Infinite).yoyo(true)
        } else {
            TweenProps::to(GLOW_REST)
        };
        self.glow_tween = Some(engine.to(self.glow.clone(), glow.duration(GLOW_PERIOD_SECS).ease(Ease::SineInOut)));

        if self.suppressed {
            self.for_each_tween(|tween| tween.pause());
        }
    }

    fn for_each_tween(
        &self,
        mut f: impl FnMut(&dyn TweenHandle),
    ) {
        for tween in [&self.direction_tween, &self.glow_tween].into_iter().flatten() {
            f(tween.as_ref());
        }
    }

    /// Apply this cycle's flow state.
    fn update(
        &mut self,
        state: &FlowState,
        settings: AnimationSettings,
        engine: Option<&SharedEngine>,
    ) {
        let speed = settings.speed_factor as f32;
        let effective = (state.direction.sign() as f32) * speed.signum();
        let target_direction = if state.active { effective } else { 0.0 };

        self.color = state.color;
        self.loop_rate = BASE_LOOP_RATE * speed.abs();
        if self.mode == AnimationStyle::Arrows {
            self.loop_rate *= self.path_length.map_or(UNMEASURED_ARROW_RATE, |len| REFERENCE_CYCLE_LENGTH / len);
        }

        let activity_changed = state.active != self.active;
        if activity_changed || target_direction != self.target_direction {
            self.active = state.active;
            self.target_direction = target_direction;
            if activity_changed {
                debug!(flow = %self.key, active = self.active, "flow animation switched");
            }
            self.start_tweens(engine);
        }
    }

    fn set_suppressed(
        &mut self,
        suppressed: bool,
    ) {
        if self.suppressed == suppressed {
            return;
        }
        self.suppressed = suppressed;
        if suppressed {
            self.for_each_tween(|tween| tween.pause());
        } else {
            self.for_each_tween(|tween| tween.play());
        }
    }

    fn advance(
        &mut self,
        dt: f32,
    ) {
        self.phase += dt * self.loop_rate * self.direction.get();
        if !self.phase.is_finite() {
            self.phase = 0.0;
        } else if self.phase.abs() > PHASE_WRAP_LIMIT {
            self.phase %= PHASE_WRAP_LIMIT;
        }
    }

    fn write_motion(
        &self,
        sink: &mut dyn AnimationSink,
    ) {
        if self.mode != AnimationStyle::Arrows {
            sink.write(ElementKey::FlowPath(self.key), Attribute::DashOffset(-self.phase * self.mode.cycle_length()));
            return;
        }

        let (Some(geometry), Some(length)) = (&self.geometry, self.path_length) else {
            return;
        };
        let flip = if self.direction.get() < 0.0 { 180.0 } else { 0.0 };
        for i in 0..ARROW_COUNT {
            let fraction = (self.phase + i as f32 / ARROW_COUNT as f32).rem_euclid(1.0);
            let Some(point) = geometry.point_at_length(fraction * length) else {
                continue;
            };
            sink.write(
                ElementKey::FlowArrow(self.key, i as u8),
                Attribute::Transform(Some(ArrowTransform {
                    x: point.x,
                    y: point.y,
                    rotation: point.angle_degrees + flip,
                })),
            );
        }
    }

    fn write_glow(
        &mut self,
        sink: &mut dyn AnimationSink,
    ) {
        let glow = (self.color, self.glow.get());
        if self.last_glow == Some(glow) {
            return;
        }
        self.last_glow = Some(glow);
        sink.write(
            ElementKey::FlowPath(self.key),
            Attribute::Glow { color: glow.0, blur: GLOW_BLUR, opacity: glow.1 },
        );
    }

    /// Reset every attribute this entry has written.
    fn retire(
        &mut self,
        sink: &mut dyn AnimationSink,
    ) {
        self.kill_tweens();
        let path = ElementKey::FlowPath(self.key);
        sink.write(path, Attribute::Glow { color: self.color, blur: 0.0, opacity: 0.0 });
        match self.mode {
            AnimationStyle::Arrows => {
                for i in 0..ARROW_COUNT as u8 {
                    sink.write(ElementKey::FlowArrow(self.key, i), Attribute::Transform(None));
                }
            }
            AnimationStyle::Dashes | AnimationStyle::Dots => sink.write(path, Attribute::DashOffset(0.0)),
        }
        debug!(flow = %self.key, mode = %self.mode, "animation entry retired");
    }
}

impl fmt::Debug for AnimationEntry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("AnimationEntry")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .field("active", &self.active)
            .field("suppressed", &self.suppressed)
            .field("phase", &self.phase)
            .field("direction", &self.direction.get())
            .field("glow", &self.glow.get())
            .field("loop_rate", &self.loop_rate)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Animator
// =============================================================================

/// Arena of animation entries, one slot per [`FlowKey`].
#[derive(Default)]
pub struct FlowAnimator {
    entries: [Option<AnimationEntry>; FLOW_COUNT],
    engine: Option<SharedEngine>,
}

impl FlowAnimator {
    pub fn new() -> Self { Self::default() }

    pub fn entry(
        &self,
        key: FlowKey,
    ) -> Option<&AnimationEntry> {
        self.entries[key.index()].as_ref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &AnimationEntry> { self.entries.iter().flatten() }

    pub fn has_engine(&self) -> bool { self.engine.is_some() }

    /// Bring every entry in line with this cycle's flows.
    pub fn sync(
        &mut self,
        frame: &FlowFrame,
        sink: &mut dyn AnimationSink,
    ) {
        let style = frame.settings.style;
        for key in FlowKey::ALL {
            let slot = &mut self.entries[key.index()];
            if let Some(entry) = slot.as_mut()
                && entry.mode != style
            {
                entry.retire(sink);
                *slot = None;
            }

            let entry = slot.get_or_insert_with(|| {
                debug!(flow = %key, mode = %style, "animation entry created");
                AnimationEntry::new(key, style, frame.paths[key.index()])
            });
            if entry.path != frame.paths[key.index()] {
                entry.set_geometry(frame.paths[key.index()]);
            }
            entry.set_suppressed(!frame.visible[key.index()]);
            entry.update(&frame.flows[key], frame.settings, self.engine.as_ref());
            if !entry.suppressed {
                entry.write_glow(sink);
            }
        }
    }

    /// Show or hide one flow's animation.
    pub fn on_visibility(
        &mut self,
        key: FlowKey,
        visible: bool,
    ) {
        if let Some(entry) = self.entries[key.index()].as_mut() {
            entry.set_suppressed(!visible);
        }
    }

    /// Advance every running entry by `dt` seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        sink: &mut dyn AnimationSink,
    ) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        for entry in self.entries.iter_mut().flatten() {
            if entry.suppressed {
                continue;
            }
            entry.write_glow(sink);
            if !entry.active || entry.loop_rate == 0.0 {
                continue;
            }
            entry.advance(dt);
            entry.write_motion(sink);
        }
    }

    /// Install the tween engine and restart every entry's tweens on it.
    pub fn set_engine(
        &mut self,
        engine: SharedEngine,
        sink: &mut dyn AnimationSink,
    ) {
        self.engine = Some(engine);
        for entry in self.entries.iter_mut().flatten() {
            entry.start_tweens(self.engine.as_ref());
            if !entry.suppressed {
                entry.write_glow(sink);
            }
        }
    }

    /// Retire every entry and fade out the markers. The animator can be
    /// synced again afterwards.
    pub fn teardown(
        &mut self,
        sink: &mut dyn AnimationSink,
    ) {
        for slot in &mut self.entries {
            if let Some(mut entry) = slot.take() {
                entry.retire(sink);
                for i in 0..ARROW_COUNT as u8 {
                    sink.write(ElementKey::FlowArrow(entry.key, i), Attribute::Opacity(0.0));
                }
            }
        }
    }
}

impl fmt::Debug for FlowAnimator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FlowAnimator")
            .field("entries", &self.entries().count())
            .field("engine", &self.engine.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::flows::Direction;
    use crate::tween::FrameTweens;

    #[derive(Default)]
    struct Writes(Vec<(ElementKey, Attribute)>);

    impl AnimationSink for Writes {
        fn write(
            &mut self,
            element: ElementKey,
            attribute: Attribute,
        ) {
            self.0.push((element, attribute));
        }
    }

    impl Writes {
        fn named(
            &self,
            name: &str,
        ) -> usize {
            self.0.iter().filter(|(_, a)| a.name() == name).count()
        }
    }

    fn frame(
        style: AnimationStyle,
        speed_factor: f64,
    ) -> FlowFrame {
        let mut flows = FlowTable::new();
        flows.set(FlowKey::Solar1, FlowState::new(true, colors::PV_PRIMARY, Direction::Forward));
        flows.set(FlowKey::GridToInverter, FlowState::new(true, colors::GRID_EXPORT, Direction::Forward));
        flows.set(FlowKey::Battery, FlowState::new(true, colors::WHITE, Direction::Reverse));
        FlowFrame {
            flows,
            visible: [true; FLOW_COUNT],
            paths: FlowKey::ALL.map(FlowKey::path),
            settings: AnimationSettings { style, speed_factor },
        }
    }

    fn animator_with_engine() -> (FlowAnimator, Rc<FrameTweens>) {
        let engine = Rc::new(FrameTweens::new());
        let mut animator = FlowAnimator::new();
        animator.set_engine(engine.clone(), &mut Writes::default());
        (animator, engine)
    }

    // =========================================================================
    // Style Tests
    // =========================================================================

    #[test]
    fn test_style_parse() {
        assert_eq!(AnimationStyle::parse("ARROWS"), AnimationStyle::Arrows);
        assert_eq!(AnimationStyle::parse(" dots "), AnimationStyle::Dots);
        assert_eq!(AnimationStyle::parse("sparkles"), AnimationStyle::Dashes, "unknown falls back");
        assert_eq!(AnimationStyle::parse(""), AnimationStyle::Dashes);
    }

    #[test]
    fn test_style_cycle() {
        let mut style = AnimationStyle::Dashes;
        for _ in 0..AnimationStyle::ALL.len() {
            style = style.next();
        }
        assert_eq!(style, AnimationStyle::Dashes);
    }

    #[test]
    fn test_dash_cycle_matches_pattern() {
        for style in [AnimationStyle::Dashes, AnimationStyle::Dots] {
            let [dash, gap] = style.dash_pattern().unwrap();
            assert_eq!(dash + gap, style.cycle_length(), "{style} offset must wrap seamlessly");
        }
        assert_eq!(AnimationStyle::Arrows.dash_pattern(), None);
    }

    // =========================================================================
    // Lifecycle Tests
    // =========================================================================

    #[test]
    fn test_entries_created_idle_with_zero_phase() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());

        assert_eq!(animator.entries().count(), FLOW_COUNT);
        let load = animator.entry(FlowKey::Load).unwrap();
        assert!(!load.is_active());
        assert_eq!(load.phase(), 0.0);
        assert!(animator.entry(FlowKey::Solar1).unwrap().is_active());
    }

    #[test]
    fn test_style_change_recreates_entries() {
        let (mut animator, engine) = animator_with_engine();
        let mut writes = Writes::default();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut writes);
        for _ in 0..10 {
            engine.advance(0.016);
            animator.tick(0.016, &mut writes);
        }
        assert_ne!(animator.entry(FlowKey::Solar1).unwrap().phase(), 0.0);

        let mut writes = Writes::default();
        animator.sync(&frame(AnimationStyle::Arrows, 1.0), &mut writes);
        for entry in animator.entries() {
            assert_eq!(entry.mode(), AnimationStyle::Arrows);
            assert_eq!(entry.phase(), 0.0, "{} restarts at phase 0", entry.key());
        }
        assert_eq!(writes.named("stroke-dashoffset"), FLOW_COUNT, "every dash entry is reset");
    }

    #[test]
    fn test_negative_speed_negates_direction() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, -1.0), &mut Writes::default());

        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().target_direction(), -1.0);
        assert_eq!(animator.entry(FlowKey::Battery).unwrap().target_direction(), 1.0);
        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().color(), colors::PV_PRIMARY, "color unchanged");
        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().glow(), GLOW_ACTIVE, "degraded glow is static");
    }

    #[test]
    fn test_deactivation_ramps_direction_to_zero() {
        let (mut animator, engine) = animator_with_engine();
        let mut f = frame(AnimationStyle::Dashes, 1.0);
        animator.sync(&f, &mut Writes::default());
        engine.advance(1.0);
        assert!((animator.entry(FlowKey::Solar1).unwrap().direction() - 1.0).abs() < 1e-6);

        f.flows.set(FlowKey::Solar1, FlowState::INACTIVE);
        animator.sync(&f, &mut Writes::default());
        let entry = animator.entry(FlowKey::Solar1).unwrap();
        assert!(!entry.is_active());
        assert_eq!(entry.target_direction(), 0.0);

        engine.advance(DIRECTION_RAMP_SECS / 2.0);
        let mid = animator.entry(FlowKey::Solar1).unwrap().direction();
        assert!(mid > 0.0 && mid < 1.0, "ramp is gradual, got {mid}");
        engine.advance(DIRECTION_RAMP_SECS);
        assert!(animator.entry(FlowKey::Solar1).unwrap().direction().abs() < 1e-6);
    }

    #[test]
    fn test_teardown_resets_attributes() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Arrows, 1.0), &mut Writes::default());

        let mut writes = Writes::default();
        animator.teardown(&mut writes);
        assert_eq!(animator.entries().count(), 0);
        assert_eq!(writes.named("transform"), FLOW_COUNT * ARROW_COUNT);
        assert!(
            writes.0.iter().all(|(_, a)| !matches!(a, Attribute::Opacity(o) if *o != 0.0)),
            "teardown only writes zero opacity"
        );
    }

    // =========================================================================
    // Tick Tests
    // =========================================================================

    #[test]
    fn test_phase_stays_bounded() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());
        let mut writes = Writes::default();
        for _ in 0..10_000 {
            animator.tick(0.016, &mut writes);
            writes.0.clear();
        }
        for entry in animator.entries() {
            assert!(entry.phase().is_finite());
            assert!(entry.phase().abs() <= PHASE_WRAP_LIMIT, "{} phase {}", entry.key(), entry.phase());
        }
    }

    #[test]
    fn test_tick_ignores_bad_dt() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());
        let mut writes = Writes::default();
        animator.tick(0.0, &mut writes);
        animator.tick(-0.5, &mut writes);
        animator.tick(f32::INFINITY, &mut writes);
        assert!(writes.0.is_empty());
        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().phase(), 0.0);
    }

    #[test]
    fn test_zero_speed_does_not_move() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 0.0), &mut Writes::default());
        animator.tick(0.5, &mut Writes::default());
        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().loop_rate(), 0.0);
        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().phase(), 0.0);
    }

    #[test]
    fn test_dash_offset_follows_phase() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());
        let mut writes = Writes::default();
        animator.tick(0.5, &mut writes);

        let phase = animator.entry(FlowKey::Solar1).unwrap().phase();
        assert!((phase - 0.4).abs() < 1e-6, "0.5 s at base rate 0.8");
        assert!(writes.0.contains(&(
            ElementKey::FlowPath(FlowKey::Solar1),
            Attribute::DashOffset(-phase * AnimationStyle::Dashes.cycle_length())
        )));
        assert!(
            !writes.0.iter().any(|(k, _)| *k == ElementKey::FlowPath(FlowKey::Load)),
            "idle flows are not touched"
        );
    }

    #[test]
    fn test_reverse_flow_runs_backwards() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());
        animator.tick(0.25, &mut Writes::default());
        assert!(animator.entry(FlowKey::Battery).unwrap().phase() < 0.0);
        assert!(animator.entry(FlowKey::Solar1).unwrap().phase() > 0.0);
    }

    #[test]
    fn test_arrows_flip_when_reversed() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Arrows, 1.0), &mut Writes::default());
        let mut writes = Writes::default();
        animator.tick(0.1, &mut writes);

        let transform = |key: FlowKey| {
            writes.0.iter().find_map(|(k, a)| match (k, a) {
                (ElementKey::FlowArrow(flow, 0), Attribute::Transform(Some(t))) if *flow == key => Some(*t),
                _ => None,
            })
        };
        let forward = transform(FlowKey::Solar1).unwrap();
        let reverse = transform(FlowKey::Battery).unwrap();
        assert!(forward.x.is_finite() && forward.y.is_finite());
        assert_eq!(writes.named("transform"), 3 * ARROW_COUNT, "three active flows");

        let geometry = Polyline::parse(FlowKey::Battery.path()).unwrap();
        let len = geometry.total_length().unwrap();
        let phase = animator.entry(FlowKey::Battery).unwrap().phase();
        let point = geometry.point_at_length(phase.rem_euclid(1.0) * len).unwrap();
        assert!((reverse.rotation - (point.angle_degrees + 180.0)).abs() < 1e-3);
    }

    #[test]
    fn test_arrow_rate_scales_with_path_length() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Arrows, 2.0), &mut Writes::default());
        let entry = animator.entry(FlowKey::Solar1).unwrap();
        let len = entry.path_length().unwrap();
        let expected = BASE_LOOP_RATE * 2.0 * REFERENCE_CYCLE_LENGTH / len;
        assert!((entry.loop_rate() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_unmeasurable_path_keeps_entry_without_markers() {
        let mut animator = FlowAnimator::new();
        for path in ["X 1 2", "M 40 40"] {
            let mut f = frame(AnimationStyle::Arrows, 2.0);
            f.paths[FlowKey::Solar1.index()] = path;
            animator.sync(&f, &mut Writes::default());

            let entry = animator.entry(FlowKey::Solar1).unwrap();
            assert_eq!(entry.path_length(), None, "{path} has no measurable length");
            let expected = BASE_LOOP_RATE * 2.0 * UNMEASURED_ARROW_RATE;
            assert!((entry.loop_rate() - expected).abs() < 1e-6, "{path} falls back to the reduced rate");

            let mut writes = Writes::default();
            animator.tick(0.1, &mut writes);
            assert!(
                !writes.0.iter().any(|(key, _)| matches!(key, ElementKey::FlowArrow(FlowKey::Solar1, _))),
                "{path} writes no marker transforms"
            );
            assert!(writes.named("transform") > 0, "flows with geometry still move their markers");

            let entry = animator.entry(FlowKey::Solar1).unwrap();
            assert!(entry.is_active(), "entry survives missing geometry");
            assert_eq!(entry.glow(), GLOW_ACTIVE, "glow stays lit");
            assert!(entry.phase() != 0.0, "phase keeps advancing");
        }
    }

    #[test]
    fn test_suppressed_entry_is_skipped() {
        let mut animator = FlowAnimator::new();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());
        animator.on_visibility(FlowKey::Solar1, false);
        assert!(animator.entry(FlowKey::Solar1).unwrap().is_suppressed());
        animator.tick(0.5, &mut Writes::default());
        assert_eq!(animator.entry(FlowKey::Solar1).unwrap().phase(), 0.0);

        animator.on_visibility(FlowKey::Solar1, true);
        animator.tick(0.5, &mut Writes::default());
        assert!(animator.entry(FlowKey::Solar1).unwrap().phase() > 0.0);
    }

    #[test]
    fn test_glow_written_only_on_change() {
        let mut animator = FlowAnimator::new();
        let mut writes = Writes::default();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut writes);
        assert_eq!(writes.named("filter"), FLOW_COUNT);

        let mut writes = Writes::default();
        animator.tick(0.016, &mut writes);
        assert_eq!(writes.named("filter"), 0, "static glow is not rewritten");
    }

    #[test]
    fn test_glow_pulses_with_engine() {
        let (mut animator, engine) = animator_with_engine();
        animator.sync(&frame(AnimationStyle::Dashes, 1.0), &mut Writes::default());
        let mut seen = Vec::new();
        for _ in 0..200 {
            engine.advance(0.016);
            animator.tick(0.016, &mut Writes::default());
            seen.push(animator.entry(FlowKey::Solar1).unwrap().glow());
        }
        assert!(seen.iter().all(|g| (GLOW_REST..=GLOW_ACTIVE).contains(g)));
        let max = seen.iter().copied().fold(f32::MIN, f32::max);
        let late_min = seen[100..].iter().copied().fold(f32::MAX, f32::min);
        assert!(max > 0.9 && late_min < 0.5, "glow oscillates");
    }
}
