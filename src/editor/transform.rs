//! Display/source coordinate mapping for the currently shown page.

use crate::geometry::{Point, Rect};

/// Mapping between display space and source space for the shown image.
///
/// Scales are source-pixels-per-display-pixel, independent per axis.
/// Recomputed whenever the displayed image changes or the viewport
/// resizes; regions are stored in source space, so replacing the
/// transform never rewrites them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    scale_x: f32,
    scale_y: f32,
    /// Display-space position of the image's top-left corner.
    origin: Point,
    image_w: f32,
    image_h: f32,
}

impl ViewTransform {
    /// Arbitrary transform, primarily for hosts that manage their own zoom.
    pub fn new(image_w: u32, image_h: u32, scale_x: f32, scale_y: f32, origin: Point) -> Self {
        Self {
            scale_x,
            scale_y,
            origin,
            image_w: image_w as f32,
            image_h: image_h as f32,
        }
    }

    /// Fit the image into the viewport preserving aspect ratio, centered.
    ///
    /// The image is never upscaled beyond native resolution: the display
    /// scale is `min(viewport_w/image_w, viewport_h/image_h, 1.0)`.
    pub fn fit(image_w: u32, image_h: u32, viewport_w: f32, viewport_h: f32) -> Self {
        let iw = image_w as f32;
        let ih = image_h as f32;
        if iw <= 0.0 || ih <= 0.0 || viewport_w <= 0.0 || viewport_h <= 0.0 {
            return Self::new(image_w, image_h, 1.0, 1.0, Point::default());
        }

        let display_scale = (viewport_w / iw).min(viewport_h / ih).min(1.0);
        let shown_w = iw * display_scale;
        let shown_h = ih * display_scale;
        let origin = Point::new(
            ((viewport_w - shown_w) / 2.0).max(0.0),
            ((viewport_h - shown_h) / 2.0).max(0.0),
        );

        Self {
            scale_x: 1.0 / display_scale,
            scale_y: 1.0 / display_scale,
            origin,
            image_w: iw,
            image_h: ih,
        }
    }

    /// Convert a display-space point into source space, clamped to the
    /// image bounds.
    pub fn to_source(&self, p: Point) -> Point {
        Point::new(
            ((p.x - self.origin.x) * self.scale_x).clamp(0.0, self.image_w),
            ((p.y - self.origin.y) * self.scale_y).clamp(0.0, self.image_h),
        )
    }

    /// Convert a source-space point into display space.
    pub fn to_display(&self, p: Point) -> Point {
        Point::new(
            self.origin.x + p.x / self.scale_x,
            self.origin.y + p.y / self.scale_y,
        )
    }

    /// Display-space rectangle for a source-space rectangle.
    pub fn to_display_rect(&self, r: &Rect) -> Rect {
        Rect::from_corners(
            self.to_display(Point::new(r.x1, r.y1)),
            self.to_display(Point::new(r.x2, r.y2)),
        )
    }

    /// Convert a display-space delta into a source-space delta (no clamping).
    pub fn delta_to_source(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx * self.scale_x, dy * self.scale_y)
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn origin(&self) -> Point {
        self.origin
    }
}
