//! Rendering substrate contract.
//!
//! The card never draws. It creates elements once per attachment, then writes
//! attributes to them through a [`Scene`]. Elements are addressed by a
//! semantic [`ElementKey`]; the scene hands back an opaque handle.
//!
//! [`RecordingScene`] is a retained, in-memory implementation. It keeps the
//! latest value of every attribute per element and logs each write, which is
//! what the tests assert against and what the simulator draws from.

use std::fmt;

use embedded_graphics::prelude::Point;

use crate::animations::ARROW_COUNT;
use crate::colors::Color;
use crate::config::layout::{LOAD_SLOT_COUNT, SOLAR_SLOT_COUNT};
use crate::flows::FlowKey;
use crate::sensors::Text;

// =============================================================================
// Element Keys
// =============================================================================

/// Semantic address of one scene element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    Background,
    Title,
    DailyLabel,
    DailyValue,
    SolarLine(u8),
    BatteryLiquid,
    BatterySoc,
    BatteryPower,
    LoadLine(u8),
    GridPower,
    GridCaption,
    HeatPump,
    EvName(u8),
    EvPower(u8),
    EvSoc(u8),
    FlowPath(FlowKey),
    FlowArrow(FlowKey, u8),
}

/// What kind of primitive an element is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Image,
    Text,
    Rect,
    Path,
    Marker,
}

impl ElementKey {
    pub const fn kind(self) -> ElementKind {
        match self {
            Self::Background => ElementKind::Image,
            Self::BatteryLiquid => ElementKind::Rect,
            Self::FlowPath(_) => ElementKind::Path,
            Self::FlowArrow(..) => ElementKind::Marker,
            _ => ElementKind::Text,
        }
    }

    /// Flow this element belongs to, if any.
    pub const fn flow(self) -> Option<FlowKey> {
        match self {
            Self::FlowPath(key) | Self::FlowArrow(key, _) => Some(key),
            _ => None,
        }
    }

    /// Every element of the static scene, in creation (paint) order.
    pub fn static_set() -> Vec<Self> {
        let mut keys = vec![Self::Background];
        for key in FlowKey::ALL {
            keys.push(Self::FlowPath(key));
        }
        for key in FlowKey::ALL {
            keys.extend((0..ARROW_COUNT as u8).map(|i| Self::FlowArrow(key, i)));
        }
        keys.push(Self::BatteryLiquid);
        keys.extend([Self::Title, Self::DailyLabel, Self::DailyValue]);
        keys.extend((0..SOLAR_SLOT_COUNT as u8).map(Self::SolarLine));
        keys.extend([Self::BatterySoc, Self::BatteryPower]);
        keys.extend((0..LOAD_SLOT_COUNT as u8).map(Self::LoadLine));
        keys.extend([Self::GridPower, Self::GridCaption, Self::HeatPump]);
        for car in 0..2 {
            keys.extend([Self::EvName(car), Self::EvPower(car), Self::EvSoc(car)]);
        }
        keys
    }
}

impl fmt::Display for ElementKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::SolarLine(i) => write!(f, "solar-line-{i}"),
            Self::LoadLine(i) => write!(f, "load-line-{i}"),
            Self::EvName(i) => write!(f, "ev-{}-name", i + 1),
            Self::EvPower(i) => write!(f, "ev-{}-power", i + 1),
            Self::EvSoc(i) => write!(f, "ev-{}-soc", i + 1),
            Self::FlowPath(key) => write!(f, "flow-{key}"),
            Self::FlowArrow(key, i) => write!(f, "arrow-{key}-{i}"),
            other => write!(f, "{other:?}"),
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Placement of one arrow marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowTransform {
    pub x: f32,
    pub y: f32,
    /// Degrees, clockwise from +X.
    pub rotation: f32,
}

/// One attribute write.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Text(Text),
    Fill(Color),
    Stroke(Color),
    FontSize(u32),
    Position(Point),
    Visible(bool),
    Opacity(f32),
    /// `None` clears the transform.
    Transform(Option<ArrowTransform>),
    DashOffset(f32),
    /// `[dash, gap]`; `None` draws a solid line.
    DashPattern(Option<[f32; 2]>),
    Glow { color: Color, blur: f32, opacity: f32 },
    Href(String),
    Rect { y: i32, height: u32 },
    Geometry(&'static str),
}

impl Attribute {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Fill(_) => "fill",
            Self::Stroke(_) => "stroke",
            Self::FontSize(_) => "font-size",
            Self::Position(_) => "position",
            Self::Visible(_) => "visible",
            Self::Opacity(_) => "opacity",
            Self::Transform(_) => "transform",
            Self::DashOffset(_) => "stroke-dashoffset",
            Self::DashPattern(_) => "stroke-dasharray",
            Self::Glow { .. } => "filter",
            Self::Href(_) => "href",
            Self::Rect { .. } => "rect",
            Self::Geometry(_) => "d",
        }
    }
}

// =============================================================================
// Scene Trait
// =============================================================================

/// A persistent visual scene.
pub trait Scene {
    type Handle: Copy + fmt::Debug;

    /// Create an element. Called once per element per attachment.
    fn create(
        &mut self,
        key: ElementKey,
        kind: ElementKind,
    ) -> Self::Handle;

    fn write(
        &mut self,
        handle: Self::Handle,
        attribute: &Attribute,
    );

    fn release(
        &mut self,
        handle: Self::Handle,
    );
}

// =============================================================================
// Recording Scene
// =============================================================================

/// Retained state of one element in a [`RecordingScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub key: ElementKey,
    pub kind: ElementKind,
    pub text: Text,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub font_size: u32,
    pub position: Point,
    pub visible: bool,
    pub opacity: f32,
    pub transform: Option<ArrowTransform>,
    pub dash_offset: f32,
    pub dash_pattern: Option<[f32; 2]>,
    pub glow: Option<(Color, f32, f32)>,
    pub href: String,
    pub rect: Option<(i32, u32)>,
    pub geometry: &'static str,
}

impl Node {
    fn new(
        key: ElementKey,
        kind: ElementKind,
    ) -> Self {
        Self {
            key,
            kind,
            text: Text::new(),
            fill: None,
            stroke: None,
            font_size: 0,
            position: Point::zero(),
            visible: true,
            opacity: 1.0,
            transform: None,
            dash_offset: 0.0,
            dash_pattern: None,
            glow: None,
            href: String::new(),
            rect: None,
            geometry: "",
        }
    }

    fn apply(
        &mut self,
        attribute: &Attribute,
    ) {
        match attribute {
            Attribute::Text(text) => self.text = text.clone(),
            Attribute::Fill(color) => self.fill = Some(*color),
            Attribute::Stroke(color) => self.stroke = Some(*color),
            Attribute::FontSize(size) => self.font_size = *size,
            Attribute::Position(point) => self.position = *point,
            Attribute::Visible(visible) => self.visible = *visible,
            Attribute::Opacity(opacity) => self.opacity = *opacity,
            Attribute::Transform(transform) => self.transform = *transform,
            Attribute::DashOffset(offset) => self.dash_offset = *offset,
            Attribute::DashPattern(pattern) => self.dash_pattern = *pattern,
            Attribute::Glow { color, blur, opacity } => self.glow = Some((*color, *blur, *opacity)),
            Attribute::Href(href) => self.href.clone_from(href),
            Attribute::Rect { y, height } => self.rect = Some((*y, *height)),
            Attribute::Geometry(d) => self.geometry = *d,
        }
    }
}

/// Handle into a [`RecordingScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// In-memory scene that keeps every element and logs every write.
#[derive(Clone, Debug, Default)]
pub struct RecordingScene {
    nodes: Vec<Option<Node>>,
    writes: Vec<(ElementKey, Attribute)>,
    created: usize,
    released: usize,
}

impl RecordingScene {
    pub fn new() -> Self { Self::default() }

    /// Live element by key.
    pub fn node(
        &self,
        key: ElementKey,
    ) -> Option<&Node> {
        self.live().find(|n| n.key == key)
    }

    /// Live elements in creation order.
    pub fn live(&self) -> impl Iterator<Item = &Node> { self.nodes.iter().flatten() }

    pub fn live_count(&self) -> usize { self.live().count() }

    pub fn created_count(&self) -> usize { self.created }

    pub fn released_count(&self) -> usize { self.released }

    /// Writes since the last [`Self::clear_writes`].
    pub fn writes(&self) -> &[(ElementKey, Attribute)] { &self.writes }

    pub fn clear_writes(&mut self) { self.writes.clear(); }

    /// Writes of a given attribute name, e.g. `"text"`.
    pub fn writes_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a (ElementKey, Attribute)> + 'a {
        self.writes.iter().filter(move |(_, attribute)| attribute.name() == name)
    }
}

impl Scene for RecordingScene {
    type Handle = NodeId;

    fn create(
        &mut self,
        key: ElementKey,
        kind: ElementKind,
    ) -> NodeId {
        self.nodes.push(Some(Node::new(key, kind)));
        self.created += 1;
        NodeId(self.nodes.len() - 1)
    }

    fn write(
        &mut self,
        handle: NodeId,
        attribute: &Attribute,
    ) {
        if let Some(Some(node)) = self.nodes.get_mut(handle.0) {
            node.apply(attribute);
            self.writes.push((node.key, attribute.clone()));
        }
    }

    fn release(
        &mut self,
        handle: NodeId,
    ) {
        if let Some(slot) = self.nodes.get_mut(handle.0)
            && slot.take().is_some()
        {
            self.released += 1;
        }
    }
}
