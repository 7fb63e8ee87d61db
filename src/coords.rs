//! Conversions between the two canvas coordinate systems.
//!
//! System P ([`PixelSystem`]) is the pixel canvas: origin top-left, y down.
//! System U ([`UnitSystem`]) is centered with y up and a fixed number of
//! units across the long edge. Layout geometry is stored once in normalized
//! canvas space (see [`NormRect`]) and only turned into concrete coordinates
//! here, at the adapter boundary.

use crate::catalog::{CatalogEntry, NormRect};
use crate::config::CanvasConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Slack for containment tests, so a point clamped onto an edge still counts
/// as inside after a round trip through normalized space.
const EDGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemKind {
    Pixel,
    Unit,
}

impl SystemKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "pixel" | "px" | "p" | "d3" => Some(Self::Pixel),
            "unit" | "units" | "u" | "manim" => Some(Self::Unit),
            _ => None,
        }
    }
}

pub trait CoordinateSystem: Copy + Default + PartialEq + fmt::Debug {
    const KIND: SystemKind;
    /// Whether y grows upwards.
    const Y_UP: bool;

    fn from_normalized(canvas: &CanvasConfig, nx: f64, ny: f64) -> (f64, f64);
    fn to_normalized(canvas: &CanvasConfig, x: f64, y: f64) -> (f64, f64);
    /// Length of one canvas pixel in this system.
    fn pixel_scale(canvas: &CanvasConfig) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitSystem;

impl CoordinateSystem for PixelSystem {
    const KIND: SystemKind = SystemKind::Pixel;
    const Y_UP: bool = false;

    fn from_normalized(canvas: &CanvasConfig, nx: f64, ny: f64) -> (f64, f64) {
        (nx * canvas.width, ny * canvas.height)
    }

    fn to_normalized(canvas: &CanvasConfig, x: f64, y: f64) -> (f64, f64) {
        (x / canvas.width, y / canvas.height)
    }

    fn pixel_scale(_canvas: &CanvasConfig) -> f64 {
        1.0
    }
}

impl CoordinateSystem for UnitSystem {
    const KIND: SystemKind = SystemKind::Unit;
    const Y_UP: bool = true;

    fn from_normalized(canvas: &CanvasConfig, nx: f64, ny: f64) -> (f64, f64) {
        (
            (nx - 0.5) * canvas.frame_width,
            (0.5 - ny) * canvas.frame_height(),
        )
    }

    fn to_normalized(canvas: &CanvasConfig, x: f64, y: f64) -> (f64, f64) {
        (
            x / canvas.frame_width + 0.5,
            0.5 - y / canvas.frame_height(),
        )
    }

    fn pixel_scale(canvas: &CanvasConfig) -> f64 {
        canvas.units_per_pixel()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Point<S: CoordinateSystem> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    system: PhantomData<S>,
}

pub type PixelPoint = Point<PixelSystem>;
pub type UnitPoint = Point<UnitSystem>;

impl<S: CoordinateSystem> Point<S> {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            system: PhantomData,
        }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Usable region of a pane in one coordinate system.
///
/// In a y-up system `top` is numerically greater than `bottom`; `width` and
/// `height` are positive in both systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SafeBounds<S: CoordinateSystem> {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    #[serde(skip)]
    system: PhantomData<S>,
}

impl<S: CoordinateSystem> SafeBounds<S> {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            system: PhantomData,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).abs()
    }

    pub fn min_y(&self) -> f64 {
        self.top.min(self.bottom)
    }

    pub fn max_y(&self) -> f64 {
        self.top.max(self.bottom)
    }

    pub fn center(&self) -> Point<S> {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn contains(&self, point: &Point<S>) -> bool {
        self.contains_disc(point, 0.0)
    }

    /// True when a disc of `radius` around `point` lies entirely inside.
    pub fn contains_disc(&self, point: &Point<S>, radius: f64) -> bool {
        point.x - radius >= self.left - EDGE_EPSILON
            && point.x + radius <= self.right + EDGE_EPSILON
            && point.y - radius >= self.min_y() - EDGE_EPSILON
            && point.y + radius <= self.max_y() + EDGE_EPSILON
    }

    /// Moves each coordinate independently so the disc fits. A disc larger
    /// than the region is centered on that axis.
    pub fn clamp_disc(&self, point: &Point<S>, radius: f64) -> Point<S> {
        Point::new(
            clamp_axis(point.x, self.left + radius, self.right - radius),
            clamp_axis(point.y, self.min_y() + radius, self.max_y() - radius),
        )
    }
}

fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi {
        return (lo + hi) / 2.0;
    }
    value.clamp(lo, hi)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    canvas: CanvasConfig,
}

impl CoordinateMapper {
    pub fn new(canvas: &CanvasConfig) -> Self {
        Self { canvas: *canvas }
    }

    pub fn for_entry(entry: &CatalogEntry) -> Self {
        Self::new(&entry.canvas)
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    pub fn convert<A: CoordinateSystem, B: CoordinateSystem>(&self, point: Point<A>) -> Point<B> {
        let (nx, ny) = A::to_normalized(&self.canvas, point.x, point.y);
        let (x, y) = B::from_normalized(&self.canvas, nx, ny);
        Point::new(x, y)
    }

    pub fn to_unit(&self, point: PixelPoint) -> UnitPoint {
        self.convert(point)
    }

    pub fn to_pixel(&self, point: UnitPoint) -> PixelPoint {
        self.convert(point)
    }

    pub fn convert_length<A: CoordinateSystem, B: CoordinateSystem>(&self, length: f64) -> f64 {
        length / A::pixel_scale(&self.canvas) * B::pixel_scale(&self.canvas)
    }

    pub fn length_to_unit(&self, pixels: f64) -> f64 {
        self.convert_length::<PixelSystem, UnitSystem>(pixels)
    }

    pub fn length_to_pixel(&self, units: f64) -> f64 {
        self.convert_length::<UnitSystem, PixelSystem>(units)
    }

    pub fn convert_bounds<A: CoordinateSystem, B: CoordinateSystem>(
        &self,
        bounds: SafeBounds<A>,
    ) -> SafeBounds<B> {
        let top_left: Point<B> = self.convert(Point::<A>::new(bounds.left, bounds.top));
        let bottom_right: Point<B> = self.convert(Point::<A>::new(bounds.right, bounds.bottom));
        SafeBounds::new(top_left.x, bottom_right.x, top_left.y, bottom_right.y)
    }

    pub fn rect_to_unit(&self, bounds: SafeBounds<PixelSystem>) -> SafeBounds<UnitSystem> {
        self.convert_bounds(bounds)
    }

    pub fn rect_to_pixel(&self, bounds: SafeBounds<UnitSystem>) -> SafeBounds<PixelSystem> {
        self.convert_bounds(bounds)
    }

    pub fn from_norm_rect<S: CoordinateSystem>(&self, rect: NormRect) -> SafeBounds<S> {
        let (left, top) = S::from_normalized(&self.canvas, rect.left, rect.top);
        let (right, bottom) = S::from_normalized(&self.canvas, rect.right, rect.bottom);
        SafeBounds::new(left, right, top, bottom)
    }

    /// Safe bounds of the mode's visualization pane.
    pub fn bounds_for<S: CoordinateSystem>(&self, entry: &CatalogEntry) -> SafeBounds<S> {
        self.from_norm_rect(entry.safe_area())
    }

    pub fn pane_bounds<S: CoordinateSystem>(
        &self,
        entry: &CatalogEntry,
        pane: usize,
    ) -> Option<SafeBounds<S>> {
        entry.panes.get(pane).map(|rect| self.from_norm_rect(*rect))
    }

    /// Point at fractional offsets inside the visualization pane; `fy` is
    /// measured from the top edge in both systems.
    pub fn safe_position<S: CoordinateSystem>(
        &self,
        entry: &CatalogEntry,
        fx: f64,
        fy: f64,
    ) -> Point<S> {
        let area = entry.safe_area();
        let nx = area.left + area.width() * fx.clamp(0.0, 1.0);
        let ny = area.top + area.height() * fy.clamp(0.0, 1.0);
        let (x, y) = S::from_normalized(&self.canvas, nx, ny);
        Point::new(x, y)
    }
}
