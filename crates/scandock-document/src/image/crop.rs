// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop geometry — mapping between view space (where the user drags the crop
// box over a letterboxed preview) and image space (raster pixels).
//
// Everything here is synchronous and pure. The only raster operation is the
// final extraction in `crop_to_image`.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Snap tolerance for pixel coordinates that land a rounding error away from
/// an integer (e.g. `299.99997` from a float scale factor).
const PIXEL_SNAP_EPSILON: f64 = 1e-3;

/// A point in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Width and height of a view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle, edges in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from the `[left, top, right, bottom]` layout used in config.
    pub fn from_array(edges: [f32; 4]) -> Self {
        Self::new(edges[0], edges[1], edges[2], edges[3])
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Overlap of two rectangles, `None` when they do not share any area.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let out = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!out.is_empty()).then_some(out)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(self.left, self.top),
            Corner::TopRight => Point::new(self.right, self.top),
            Corner::BottomLeft => Point::new(self.left, self.bottom),
            Corner::BottomRight => Point::new(self.right, self.bottom),
        }
    }
}

/// Crop box corner handles, in hit-test priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

/// The part of a `view` that an `image_w` x `image_h` raster covers when
/// scaled to fit and centred.
///
/// Degenerate inputs (zero-sized image or view) yield an empty rect.
pub fn compute_display_rect(image_w: u32, image_h: u32, view: Size) -> Rect {
    if image_w == 0 || image_h == 0 || !(view.width > 0.0 && view.height > 0.0) {
        return Rect::default();
    }

    let image_ratio = image_w as f32 / image_h as f32;
    let view_ratio = view.width / view.height;

    if image_ratio > view_ratio {
        let displayed_height = view.width / image_ratio;
        let top = (view.height - displayed_height) / 2.0;
        Rect::new(0.0, top, view.width, top + displayed_height)
    } else {
        let displayed_width = view.height * image_ratio;
        let left = (view.width - displayed_width) / 2.0;
        Rect::new(left, 0.0, left + displayed_width, view.height)
    }
}

/// First corner of `rect` strictly closer than `threshold` to `point`.
pub fn hit_test_corner(point: Point, rect: &Rect, threshold: f32) -> Option<Corner> {
    Corner::ALL
        .into_iter()
        .find(|&corner| point.distance(rect.corner(corner)) < threshold)
}

/// Apply one drag step. A grabbed corner moves its two edges; otherwise the
/// whole box pans. The result is always clamped.
pub fn drag_update(
    rect: &Rect,
    active: Option<Corner>,
    delta: Point,
    bounds: Size,
    min_size: f32,
) -> Rect {
    let moved = match active {
        Some(Corner::TopLeft) => Rect::new(
            rect.left + delta.x,
            rect.top + delta.y,
            rect.right,
            rect.bottom,
        ),
        Some(Corner::TopRight) => Rect::new(
            rect.left,
            rect.top + delta.y,
            rect.right + delta.x,
            rect.bottom,
        ),
        Some(Corner::BottomLeft) => Rect::new(
            rect.left + delta.x,
            rect.top,
            rect.right,
            rect.bottom + delta.y,
        ),
        Some(Corner::BottomRight) => Rect::new(
            rect.left,
            rect.top,
            rect.right + delta.x,
            rect.bottom + delta.y,
        ),
        None => rect.translate(delta.x, delta.y),
    };
    clamp_rect(&moved, bounds, min_size)
}

/// Force `rect` inside `[0, bounds]` with both sides at least `min_size`.
///
/// A view smaller than `min_size` on an axis caps the minimum at the view
/// size, so the result still fits. Non-finite edges are treated as 0.
pub fn clamp_rect(rect: &Rect, bounds: Size, min_size: f32) -> Rect {
    let bounds_w = finite_or_zero(bounds.width).max(0.0);
    let bounds_h = finite_or_zero(bounds.height).max(0.0);
    let min_size = finite_or_zero(min_size).max(0.0);
    let min_w = min_size.min(bounds_w);
    let min_h = min_size.min(bounds_h);

    let left = coerce(finite_or_zero(rect.left), 0.0, bounds_w - min_w);
    let top = coerce(finite_or_zero(rect.top), 0.0, bounds_h - min_h);
    let right = coerce(finite_or_zero(rect.right), left + min_w, bounds_w);
    let bottom = coerce(finite_or_zero(rect.bottom), top + min_h, bounds_h);

    Rect::new(left, top, right, bottom)
}

/// Extract the part of `raster` under `crop` (view space), given where the
/// raster is drawn (`display`).
///
/// Returns a 0x0 raster when the crop misses the image or the display rect is
/// degenerate; callers reject that before committing.
pub fn crop_to_image(raster: &RgbaImage, crop: &Rect, display: &Rect) -> RgbaImage {
    let (raster_w, raster_h) = raster.dimensions();
    match crop_region(raster_w, raster_h, crop, display) {
        Some((x, y, w, h)) => image::imageops::crop_imm(raster, x, y, w, h).to_image(),
        None => RgbaImage::new(0, 0),
    }
}

/// Pixel box `(x, y, width, height)` that `crop` selects from a
/// `raster_w` x `raster_h` raster shown at `display`. `None` when the
/// selection covers no pixels.
pub fn crop_region(raster_w: u32, raster_h: u32, crop: &Rect, display: &Rect) -> Option<(u32, u32, u32, u32)> {
    if display.is_empty() || raster_w == 0 || raster_h == 0 {
        return None;
    }
    let visible = crop.intersect(display)?;

    let scale_x = raster_w as f64 / display.width() as f64;
    let scale_y = raster_h as f64 / display.height() as f64;

    let x = to_pixel((visible.left - display.left) as f64 * scale_x).min(raster_w);
    let y = to_pixel((visible.top - display.top) as f64 * scale_y).min(raster_h);
    let w = to_pixel(visible.width() as f64 * scale_x).min(raster_w - x);
    let h = to_pixel(visible.height() as f64 * scale_y).min(raster_h - y);

    debug!(x, y, w, h, "Crop mapped to image space");

    (w > 0 && h > 0).then_some((x, y, w, h))
}

/// Interactive crop state for one crop screen: the box, the grabbed corner,
/// and the view it lives in.
#[derive(Debug, Clone)]
pub struct CropSession {
    rect: Rect,
    active: Option<Corner>,
    bounds: Size,
    min_size: f32,
    threshold: f32,
}

impl CropSession {
    pub fn new(initial: Rect, bounds: Size, min_size: f32, threshold: f32) -> Self {
        Self {
            rect: clamp_rect(&initial, bounds, min_size),
            active: None,
            bounds,
            min_size,
            threshold,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn active_corner(&self) -> Option<Corner> {
        self.active
    }

    /// Start a gesture at `point`; grabs a corner if one is in reach.
    pub fn begin_drag(&mut self, point: Point) -> Option<Corner> {
        self.active = hit_test_corner(point, &self.rect, self.threshold);
        self.active
    }

    pub fn drag(&mut self, delta: Point) -> Rect {
        self.rect = drag_update(&self.rect, self.active, delta, self.bounds, self.min_size);
        self.rect
    }

    pub fn end_drag(&mut self) {
        self.active = None;
    }

    /// Cut the current box out of `raster`, assuming it is displayed
    /// letterboxed in this session's view.
    pub fn crop(&self, raster: &RgbaImage) -> RgbaImage {
        let display = compute_display_rect(raster.width(), raster.height(), self.bounds);
        crop_to_image(raster, &self.rect, &display)
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// `value` limited to `[lo, hi]`; `lo` wins if the range is inverted.
fn coerce(value: f32, lo: f32, hi: f32) -> f32 {
    value.min(hi).max(lo)
}

/// Truncate toward zero, snapping values that sit within float noise of the
/// next integer.
fn to_pixel(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    let snapped = if (value - rounded).abs() < PIXEL_SNAP_EPSILON {
        rounded
    } else {
        value.trunc()
    };
    snapped.min(u32::MAX as f64) as u32
}
