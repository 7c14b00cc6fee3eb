//! Tweening engine contract and engine acquisition.
//!
//! The flow animations only need a small slice of a tweening library: animate
//! an `f32` toward a value over time, with easing, repeats and yoyo, and be able
//! to kill, pause, resume or rescale that tween later. [`TweenEngine`] and
//! [`TweenHandle`] are that slice.
//!
//! # Acquisition
//!
//! The engine is an external collaborator and may not be available. It is
//! acquired once through an [`EngineLoader`], which walks an ordered list of
//! [`EngineSource`]s and memoizes the outcome in a `tokio::sync::OnceCell`.
//! Until the outcome is [`EngineAcquisition::Ready`], the card runs degraded:
//! correct values and colors, static glow, no motion.
//!
//! # Bundled Engine
//!
//! [`FrameTweens`] is a deterministic engine advanced explicitly by the host's
//! frame loop. The simulator and the tests use it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::EngineLoadError;

// =============================================================================
// Engine Contract
// =============================================================================

/// Value animated by a tween. Shared between the owner and the engine.
pub type TweenTarget = Rc<Cell<f32>>;

/// Creates a new tween target holding `value`.
pub fn target(value: f32) -> TweenTarget { Rc::new(Cell::new(value)) }

/// Easing curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    #[default]
    Linear,
    SineInOut,
}

impl Ease {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(
        self,
        t: f32,
    ) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }
}

/// How often a tween runs after its first pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    Once,
    Times(u32),
    Infinite,
}

/// Tween parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenProps {
    pub to: f32,
    /// Seconds per pass.
    pub duration: f32,
    pub ease: Ease,
    pub repeat: Repeat,
    /// Alternate direction on every repeat.
    pub yoyo: bool,
}

impl TweenProps {
    pub const fn to(value: f32) -> Self {
        Self { to: value, duration: 0.0, ease: Ease::Linear, repeat: Repeat::Once, yoyo: false }
    }

    #[must_use]
    pub const fn duration(
        mut self,
        seconds: f32,
    ) -> Self {
        self.duration = seconds;
        self
    }

    #[must_use]
    pub const fn ease(
        mut self,
        ease: Ease,
    ) -> Self {
        self.ease = ease;
        self
    }

    #[must_use]
    pub const fn repeat(
        mut self,
        repeat: Repeat,
    ) -> Self {
        self.repeat = repeat;
        self
    }

    #[must_use]
    pub const fn yoyo(
        mut self,
        yoyo: bool,
    ) -> Self {
        self.yoyo = yoyo;
        self
    }
}

/// Control handle for a running tween.
pub trait TweenHandle {
    /// Stop permanently. The target keeps its current value.
    fn kill(&self);
    fn pause(&self);
    fn play(&self);
    /// Playback speed multiplier; negative values are treated as 0.
    fn set_time_scale(
        &self,
        scale: f32,
    );
    /// `false` once finished or killed.
    fn is_active(&self) -> bool;
}

/// A tweening engine.
///
/// There is no frame ticker to register with: the host drives every frame,
/// advancing its engine and then calling [`crate::FlowCard::on_frame`].
pub trait TweenEngine {
    /// Animate `target` from its current value toward `props.to`.
    fn to(
        &self,
        target: TweenTarget,
        props: TweenProps,
    ) -> Box<dyn TweenHandle>;
}

pub type SharedEngine = Rc<dyn TweenEngine>;

// =============================================================================
// Bundled Frame-Driven Engine
// =============================================================================

struct TweenSlot {
    target: TweenTarget,
    from: f32,
    to: f32,
    duration: f32,
    ease: Ease,
    yoyo: bool,
    /// Passes left after the current one; `None` repeats forever.
    remaining: Cell<Option<u32>>,
    elapsed: Cell<f32>,
    reversed: Cell<bool>,
    paused: Cell<bool>,
    done: Cell<bool>,
    time_scale: Cell<f32>,
}

impl TweenSlot {
    fn value_at(
        &self,
        progress: f32,
    ) -> f32 {
        let progress = if self.reversed.get() { 1.0 - progress } else { progress };
        self.from + (self.to - self.from) * self.ease.apply(progress)
    }

    fn finish(&self) {
        self.target.set(self.value_at(1.0));
        self.done.set(true);
    }

    fn advance(
        &self,
        dt: f32,
    ) {
        if self.done.get() || self.paused.get() {
            return;
        }
        if self.duration <= 0.0 {
            self.finish();
            return;
        }

        let mut elapsed = self.elapsed.get() + dt * self.time_scale.get();
        while elapsed >= self.duration {
            match self.remaining.get() {
                Some(0) => {
                    self.finish();
                    return;
                }
                Some(n) => self.remaining.set(Some(n - 1)),
                None => {}
            }
            elapsed -= self.duration;
            if self.yoyo {
                self.reversed.set(!self.reversed.get());
            }
        }
        self.elapsed.set(elapsed);
        self.target.set(self.value_at(elapsed / self.duration));
    }
}

struct FrameTweenHandle(Rc<TweenSlot>);

impl TweenHandle for FrameTweenHandle {
    fn kill(&self) { self.0.done.set(true); }

    fn pause(&self) { self.0.paused.set(true); }

    fn play(&self) { self.0.paused.set(false); }

    fn set_time_scale(
        &self,
        scale: f32,
    ) {
        self.0.time_scale.set(if scale.is_finite() { scale.max(0.0) } else { 0.0 });
    }

    fn is_active(&self) -> bool { !self.0.done.get() }
}

/// Tween engine advanced by explicit [`FrameTweens::advance`] calls.
#[derive(Default)]
pub struct FrameTweens {
    slots: RefCell<Vec<Rc<TweenSlot>>>,
}

impl FrameTweens {
    pub fn new() -> Self { Self::default() }

    /// Advance every running tween by `dt` seconds and drop finished ones.
    /// Non-positive or non-finite `dt` does nothing.
    pub fn advance(
        &self,
        dt: f32,
    ) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        // Snapshot so a tween created by a target observer cannot alias the borrow.
        let slots: Vec<Rc<TweenSlot>> = self.slots.borrow().clone();
        for slot in &slots {
            slot.advance(dt);
        }
        self.slots.borrow_mut().retain(|slot| !slot.done.get());
    }

    /// Tweens not yet finished or killed.
    pub fn active_count(&self) -> usize { self.slots.borrow().iter().filter(|s| !s.done.get()).count() }
}

impl TweenEngine for FrameTweens {
    fn to(
        &self,
        target: TweenTarget,
        props: TweenProps,
    ) -> Box<dyn TweenHandle> {
        let remaining = match props.repeat {
            Repeat::Once => Some(0),
            Repeat::Times(n) => Some(n),
            Repeat::Infinite => None,
        };
        let slot = Rc::new(TweenSlot {
            from: target.get(),
            target,
            to: props.to,
            duration: if props.duration.is_finite() { props.duration } else { 0.0 },
            ease: props.ease,
            yoyo: props.yoyo,
            remaining: Cell::new(remaining),
            elapsed: Cell::new(0.0),
            reversed: Cell::new(false),
            paused: Cell::new(false),
            done: Cell::new(false),
            time_scale: Cell::new(1.0),
        });
        self.slots.borrow_mut().push(Rc::clone(&slot));
        Box::new(FrameTweenHandle(slot))
    }
}

impl fmt::Debug for FrameTweens {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FrameTweens").field("active", &self.active_count()).finish()
    }
}

// =============================================================================
// Engine Sources
// =============================================================================

/// Future returned by [`EngineSource::load`].
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<SharedEngine, EngineLoadError>> + 'a>>;

/// One place the engine may be obtained from.
pub trait EngineSource {
    fn name(&self) -> &str;

    fn load(&self) -> LoadFuture<'_>;
}

/// Source that always yields a shared [`FrameTweens`].
pub struct FrameTweensSource {
    engine: Rc<FrameTweens>,
}

impl FrameTweensSource {
    pub fn new(engine: Rc<FrameTweens>) -> Self { Self { engine } }
}

impl EngineSource for FrameTweensSource {
    fn name(&self) -> &str { "bundled" }

    fn load(&self) -> LoadFuture<'_> {
        let engine: SharedEngine = self.engine.clone();
        Box::pin(async move { Ok(engine) })
    }
}

/// Source that always fails. Stands in for a source disabled by the host.
pub struct UnavailableSource {
    name: String,
    reason: String,
}

impl UnavailableSource {
    pub fn new(
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), reason: reason.into() }
    }
}

impl EngineSource for UnavailableSource {
    fn name(&self) -> &str { &self.name }

    fn load(&self) -> LoadFuture<'_> {
        let err = EngineLoadError::Unavailable { source_name: self.name.clone(), reason: self.reason.clone() };
        Box::pin(async move { Err(err) })
    }
}

// =============================================================================
// Acquisition
// =============================================================================

/// Outcome of walking the engine sources.
pub enum EngineAcquisition {
    Ready { engine: SharedEngine, source: String },
    Degraded { attempts: Vec<EngineLoadError> },
}

impl fmt::Debug for EngineAcquisition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Ready { source, .. } => f.debug_struct("Ready").field("source", source).finish_non_exhaustive(),
            Self::Degraded { attempts } => f.debug_struct("Degraded").field("attempts", attempts).finish(),
        }
    }
}

/// Memoized, idempotent engine acquisition.
pub struct EngineLoader {
    sources: Vec<Box<dyn EngineSource>>,
    outcome: OnceCell<EngineAcquisition>,
}

impl EngineLoader {
    pub fn new(sources: Vec<Box<dyn EngineSource>>) -> Self { Self { sources, outcome: OnceCell::new() } }

    /// Loader with no sources. Resolves to degraded.
    pub fn none() -> Self { Self::new(Vec::new()) }

    /// Loader that yields the given bundled engine.
    pub fn bundled(engine: Rc<FrameTweens>) -> Self { Self::new(vec![Box::new(FrameTweensSource::new(engine))]) }

    /// Walk the sources once. Later and concurrent calls share the first
    /// outcome.
    pub async fn acquire(&self) -> &EngineAcquisition { self.outcome.get_or_init(|| self.walk_sources()).await }

    async fn walk_sources(&self) -> EngineAcquisition {
        let mut attempts = Vec::new();
        for source in &self.sources {
            match source.load().await {
                Ok(engine) => {
                    info!(source = source.name(), "tween engine acquired");
                    return EngineAcquisition::Ready { engine, source: source.name().to_owned() };
                }
                Err(err) => {
                    warn!("tween engine source failed: {err}");
                    attempts.push(err);
                }
            }
        }
        warn!(attempts = attempts.len(), "no tween engine available, animations run without motion");
        EngineAcquisition::Degraded { attempts }
    }

    /// Outcome, if acquisition has finished.
    pub fn outcome(&self) -> Option<&EngineAcquisition> { self.outcome.get() }

    /// Capability check: the engine, once acquired.
    pub fn engine(&self) -> Option<SharedEngine> {
        match self.outcome.get() {
            Some(EngineAcquisition::Ready { engine, .. }) => Some(Rc::clone(engine)),
            _ => None,
        }
    }
}

impl fmt::Debug for EngineLoader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EngineLoader")
            .field("sources", &self.sources.len())
            .field("outcome", &self.outcome.get())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
