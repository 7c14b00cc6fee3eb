//! The card: the single entry point a host drives.
//!
//! ```text
//! set_config ──▶ attach ──▶ update ─┬─▶ build_view_state ──▶ render (diff/patch)
//!                                   │                        └─▶ animator.sync
//!                                   └─▶ (throttled) skipped
//! frame loop ──▶ on_frame(dt) ──▶ animator.tick
//! detach ──▶ animator.teardown ──▶ release scene
//! ```
//!
//! Everything runs on the host's thread. The only asynchronous step is
//! [`FlowCard::acquire_engine`]; until it resolves, or when it resolves
//! degraded, updates still render correct values and colors.

use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::animations::FlowAnimator;
use crate::config::Config;
use crate::diagnostics::{DiagnosticsLog, RenderStats};
use crate::error::{ConfigError, FlowCardError};
use crate::render::{RenderReport, SceneRenderer};
use crate::scene::Scene;
use crate::scheduler::UpdateScheduler;
use crate::sensors::SensorStore;
use crate::tween::{EngineAcquisition, EngineLoader};
use crate::view::{ViewState, build_view_state};

/// What an [`FlowCard::update`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Throttled; nothing changed.
    Skipped,
    Rendered(RenderReport),
}

pub struct FlowCard<S: Scene> {
    config: Option<Config>,
    scheduler: UpdateScheduler,
    renderer: SceneRenderer<S>,
    animator: FlowAnimator,
    loader: Rc<EngineLoader>,
    /// The loader outcome has been consumed.
    engine_resolved: bool,
    diagnostics: DiagnosticsLog,
    stats: RenderStats,
}

impl<S: Scene> FlowCard<S> {
    pub fn new(
        scene: S,
        loader: Rc<EngineLoader>,
    ) -> Self {
        Self {
            config: None,
            scheduler: UpdateScheduler::default(),
            renderer: SceneRenderer::new(scene),
            animator: FlowAnimator::new(),
            loader,
            engine_resolved: false,
            diagnostics: DiagnosticsLog::new(),
            stats: RenderStats::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the configuration. The next update re-derives everything.
    pub fn set_config(
        &mut self,
        config: Config,
    ) {
        info!(
            style = %config.animation.style,
            interval_s = config.update_interval.as_secs_f32(),
            "configuration replaced"
        );
        self.scheduler.set_interval(config.update_interval);
        self.scheduler.request_full_render();
        self.config = Some(config);
    }

    pub fn set_config_json(
        &mut self,
        json: &str,
    ) -> Result<(), ConfigError> {
        self.set_config(Config::from_json(json)?);
        Ok(())
    }

    pub fn clear_config(&mut self) { self.config = None; }

    pub fn config(&self) -> Option<&Config> { self.config.as_ref() }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Build the scene. Idempotent while attached.
    pub fn attach(&mut self) {
        if self.renderer.attach() {
            self.scheduler.request_full_render();
        }
        self.poll_engine();
    }

    /// Stop every animation and release the scene.
    pub fn detach(&mut self) {
        self.animator.teardown(&mut self.renderer);
        self.renderer.detach();
        self.scheduler.reset();
    }

    pub fn is_attached(&self) -> bool { self.renderer.is_attached() }

    /// Rebuild and patch the scene unless throttled.
    pub fn update(
        &mut self,
        store: Option<&dyn SensorStore>,
        now: Instant,
    ) -> Result<UpdateOutcome, FlowCardError> {
        if self.config.is_none() {
            return Err(FlowCardError::MissingConfig);
        }
        if !self.renderer.is_attached() {
            return Err(FlowCardError::NotAttached);
        }
        let store = store.ok_or(FlowCardError::MissingSensorStore)?;

        self.poll_engine();
        if !self.scheduler.should_render(now) {
            self.stats.record_skip();
            return Ok(UpdateOutcome::Skipped);
        }

        let config = self.config.as_ref().ok_or(FlowCardError::MissingConfig)?;
        let view = build_view_state(config, store);
        let frame = view.flow_frame();
        let report = self.renderer.render(view)?;
        self.animator.sync(&frame, &mut self.renderer);

        self.scheduler.mark_rendered(now);
        self.stats.record_render(&report);
        Ok(UpdateOutcome::Rendered(report))
    }

    /// Advance the animations by one frame. Returns `false` without an engine
    /// or while detached.
    pub fn on_frame(
        &mut self,
        dt: Duration,
    ) -> bool {
        self.poll_engine();
        if !self.animator.has_engine() || !self.renderer.is_attached() {
            return false;
        }
        self.animator.tick(dt.as_secs_f32(), &mut self.renderer);
        self.stats.record_frame();
        true
    }

    // =========================================================================
    // Engine
    // =========================================================================

    /// Wait for the engine loader and apply its outcome. Returns whether an
    /// engine is now in use.
    pub async fn acquire_engine(&mut self) -> bool {
        let loader = Rc::clone(&self.loader);
        loader.acquire().await;
        self.poll_engine();
        self.animator.has_engine()
    }

    pub fn has_engine(&self) -> bool { self.animator.has_engine() }

    /// Consume the loader outcome once it exists.
    fn poll_engine(&mut self) {
        if self.engine_resolved {
            return;
        }
        match self.loader.outcome() {
            None => {}
            Some(EngineAcquisition::Ready { engine, .. }) => {
                self.animator.set_engine(Rc::clone(engine), &mut self.renderer);
                self.engine_resolved = true;
            }
            Some(EngineAcquisition::Degraded { attempts }) => {
                for err in attempts {
                    self.diagnostics.push(&err.to_string());
                }
                self.diagnostics.push("no tween engine, animations run without motion");
                self.engine_resolved = true;
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// View state of the last render.
    pub fn view(&self) -> Option<&ViewState> { self.renderer.previous() }

    pub fn animator(&self) -> &FlowAnimator { &self.animator }

    pub fn diagnostics(&self) -> &DiagnosticsLog { &self.diagnostics }

    pub fn stats(&self) -> &RenderStats { &self.stats }

    pub fn scene(&self) -> &S { self.renderer.scene() }

    pub fn scene_mut(&mut self) -> &mut S { self.renderer.scene_mut() }
}
