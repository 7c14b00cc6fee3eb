//! Scene cache and diff/patch rendering.
//!
//! The scene is built once per attachment. After that, each cycle compares the
//! new [`ViewState`] field by field against the previous one and writes only the
//! attributes that changed. With no previous view state every field is written.
//!
//! Rendering is two steps:
//! 1. [`diff`] produces an explicit list of [`Patch`]es. It is pure.
//! 2. [`SceneRenderer::render`] applies them through the element handle table.
//!
//! # Dirty Tracking
//!
//! | Element | Attributes |
//! |---------|------------|
//! | text | text, fill, font size, position, visibility |
//! | flow path | stroke, opacity, visibility, dash pattern, geometry |
//! | arrow marker | fill, visibility |
//! | battery liquid | rect, fill, visibility |
//! | background | image |

use std::collections::HashMap;

use tracing::debug;

use crate::animations::{ARROW_COUNT, AnimationSink, AnimationStyle, INACTIVE_PATH_OPACITY};
use crate::error::FlowCardError;
use crate::flows::FlowKey;
use crate::scene::{Attribute, ElementKey, Scene};
use crate::view::{LiquidFragment, TextFragment, ViewState};

// =============================================================================
// Patches
// =============================================================================

/// One attribute write.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    pub element: ElementKey,
    pub attribute: Attribute,
}

/// Result of a [`diff`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub written: usize,
    /// Fields compared equal to the previous view state and skipped.
    pub unchanged: usize,
}

struct Differ<'a> {
    out: &'a mut Vec<Patch>,
    unchanged: usize,
}

impl Differ<'_> {
    fn field<T: PartialEq>(
        &mut self,
        element: ElementKey,
        prev: Option<&T>,
        next: &T,
        attribute: impl FnOnce(&T) -> Attribute,
    ) {
        if prev == Some(next) {
            self.unchanged += 1;
        } else {
            self.out.push(Patch { element, attribute: attribute(next) });
        }
    }

    fn text(
        &mut self,
        element: ElementKey,
        prev: Option<&TextFragment>,
        next: &TextFragment,
    ) {
        self.field(element, prev.map(|p| &p.text), &next.text, |t| Attribute::Text(t.clone()));
        self.field(element, prev.map(|p| &p.fill), &next.fill, |c| Attribute::Fill(*c));
        self.field(element, prev.map(|p| &p.font_size), &next.font_size, |s| Attribute::FontSize(*s));
        self.field(element, prev.map(|p| &p.position), &next.position, |p| Attribute::Position(*p));
        self.field(element, prev.map(|p| &p.visible), &next.visible, |v| Attribute::Visible(*v));
    }

    fn liquid(
        &mut self,
        prev: Option<&LiquidFragment>,
        next: &LiquidFragment,
    ) {
        let element = ElementKey::BatteryLiquid;
        self.field(element, prev.map(|p| (p.y, p.height)).as_ref(), &(next.y, next.height), |&(y, height)| {
            Attribute::Rect { y, height }
        });
        self.field(element, prev.map(|p| &p.fill), &next.fill, |c| Attribute::Fill(*c));
        self.field(element, prev.map(|p| &p.visible), &next.visible, |v| Attribute::Visible(*v));
    }

    fn flow(
        &mut self,
        key: FlowKey,
        prev: Option<&ViewState>,
        next: &ViewState,
    ) {
        let i = key.index();
        let path = ElementKey::FlowPath(key);
        let prev_state = prev.map(|p| p.flows[key]);
        let state = next.flows[key];
        let visible = next.flow_visible[i];
        let style = next.animation.style;

        let opacity = |active: bool| if active { 1.0 } else { INACTIVE_PATH_OPACITY };
        let arrows_shown = |view: &ViewState| {
            view.animation.style == AnimationStyle::Arrows && view.flow_visible[i] && view.flows[key].active
        };

        self.field(path, prev.map(|p| &p.paths[i]), &next.paths[i], |d| Attribute::Geometry(*d));
        self.field(path, prev_state.as_ref().map(|s| &s.color), &state.color, |c| Attribute::Stroke(*c));
        self.field(path, prev_state.map(|s| opacity(s.active)).as_ref(), &opacity(state.active), |o| {
            Attribute::Opacity(*o)
        });
        self.field(path, prev.map(|p| &p.flow_visible[i]), &visible, |v| Attribute::Visible(*v));
        self.field(path, prev.map(|p| p.animation.style.dash_pattern()).as_ref(), &style.dash_pattern(), |d| {
            Attribute::DashPattern(*d)
        });

        let prev_shown = prev.map(arrows_shown);
        let shown = arrows_shown(next);
        for n in 0..ARROW_COUNT as u8 {
            let arrow = ElementKey::FlowArrow(key, n);
            self.field(arrow, prev_state.as_ref().map(|s| &s.color), &state.color, |c| Attribute::Fill(*c));
            self.field(arrow, prev_shown.as_ref(), &shown, |v| Attribute::Visible(*v));
        }
    }
}

/// Append the patches that turn `prev` into `next`. With no `prev`, every
/// field is written.
pub fn diff(
    prev: Option<&ViewState>,
    next: &ViewState,
    out: &mut Vec<Patch>,
) -> DiffStats {
    let start = out.len();
    let mut d = Differ { out: &mut *out, unchanged: 0 };

    d.field(ElementKey::Background, prev.map(|p| &p.background), &next.background, |b| Attribute::Href(b.clone()));
    for key in FlowKey::ALL {
        d.flow(key, prev, next);
    }
    d.liquid(prev.map(|p| &p.battery_liquid), &next.battery_liquid);

    d.text(ElementKey::Title, prev.map(|p| &p.title), &next.title);
    d.text(ElementKey::DailyLabel, prev.map(|p| &p.daily_label), &next.daily_label);
    d.text(ElementKey::DailyValue, prev.map(|p| &p.daily_value), &next.daily_value);
    for (i, line) in next.solar_lines.iter().enumerate() {
        d.text(ElementKey::SolarLine(i as u8), prev.map(|p| &p.solar_lines[i]), line);
    }
    d.text(ElementKey::BatterySoc, prev.map(|p| &p.battery_soc), &next.battery_soc);
    d.text(ElementKey::BatteryPower, prev.map(|p| &p.battery_power), &next.battery_power);
    for (i, line) in next.load_lines.iter().enumerate() {
        d.text(ElementKey::LoadLine(i as u8), prev.map(|p| &p.load_lines[i]), line);
    }
    d.text(ElementKey::GridPower, prev.map(|p| &p.grid_power), &next.grid_power);
    d.text(ElementKey::GridCaption, prev.map(|p| &p.grid_caption), &next.grid_caption);
    d.text(ElementKey::HeatPump, prev.map(|p| &p.heat_pump), &next.heat_pump);
    for (i, car) in next.ev.iter().enumerate() {
        let prev_car = prev.map(|p| &p.ev[i]);
        let car_index = i as u8;
        d.text(ElementKey::EvName(car_index), prev_car.map(|c| &c.name), &car.name);
        d.text(ElementKey::EvPower(car_index), prev_car.map(|c| &c.power), &car.power);
        d.text(ElementKey::EvSoc(car_index), prev_car.map(|c| &c.soc), &car.soc);
    }

    let unchanged = d.unchanged;
    DiffStats { written: out.len() - start, unchanged }
}

// =============================================================================
// Scene Renderer
// =============================================================================

/// Outcome of one [`SceneRenderer::render`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub patches: usize,
    pub unchanged: usize,
    /// No previous view state existed; every field was written.
    pub full: bool,
}

/// Owns the scene, the element handle table and the previous view state.
pub struct SceneRenderer<S: Scene> {
    scene: S,
    handles: HashMap<ElementKey, S::Handle>,
    previous: Option<ViewState>,
    patches: Vec<Patch>,
}

impl<S: Scene> SceneRenderer<S> {
    pub fn new(scene: S) -> Self { Self { scene, handles: HashMap::new(), previous: None, patches: Vec::new() } }

    /// Build the static scene. Returns `false` if it already exists.
    pub fn attach(&mut self) -> bool {
        if self.is_attached() {
            return false;
        }
        for key in ElementKey::static_set() {
            let handle = self.scene.create(key, key.kind());
            self.handles.insert(key, handle);
        }
        debug!(elements = self.handles.len(), "scene constructed");
        true
    }

    #[inline]
    pub fn is_attached(&self) -> bool { !self.handles.is_empty() }

    /// Patch the scene to show `view`, then keep `view` as the previous state.
    pub fn render(
        &mut self,
        view: ViewState,
    ) -> Result<RenderReport, FlowCardError> {
        if !self.is_attached() {
            return Err(FlowCardError::NotAttached);
        }

        let mut patches = std::mem::take(&mut self.patches);
        patches.clear();
        let stats = diff(self.previous.as_ref(), &view, &mut patches);
        for patch in &patches {
            self.apply(patch.element, &patch.attribute);
        }
        self.patches = patches;

        let full = self.previous.is_none();
        self.previous = Some(view);
        Ok(RenderReport { patches: stats.written, unchanged: stats.unchanged, full })
    }

    fn apply(
        &mut self,
        element: ElementKey,
        attribute: &Attribute,
    ) -> bool {
        match self.handles.get(&element) {
            Some(&handle) => {
                self.scene.write(handle, attribute);
                true
            }
            None => false,
        }
    }

    /// Write one attribute outside a render. Dropped while detached.
    pub fn write(
        &mut self,
        element: ElementKey,
        attribute: &Attribute,
    ) -> bool {
        self.apply(element, attribute)
    }

    /// Release every element and forget the previous view state.
    pub fn detach(&mut self) -> usize {
        let released = self.handles.len();
        for (_, handle) in self.handles.drain() {
            self.scene.release(handle);
        }
        self.previous = None;
        if released > 0 {
            debug!(elements = released, "scene released");
        }
        released
    }

    /// View state of the last render.
    pub fn previous(&self) -> Option<&ViewState> { self.previous.as_ref() }

    pub fn scene(&self) -> &S { &self.scene }

    pub fn scene_mut(&mut self) -> &mut S { &mut self.scene }
}

impl<S: Scene> AnimationSink for SceneRenderer<S> {
    fn write(
        &mut self,
        element: ElementKey,
        attribute: Attribute,
    ) {
        self.apply(element, &attribute);
    }
}

// =============================================================================
// Tests
// =============================================================================
