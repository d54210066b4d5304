//! Interactive region editing over a displayed page.
//!
//! Maintains the ordered set of user-drawn rectangles anchored to the
//! currently displayed page. Pointer input arrives in display coordinates
//! and is converted through the current [`ViewTransform`]; regions are
//! stored in source-image coordinates only, so a viewport resize re-renders
//! them without rewriting them.
//!
//! All operations are total: out-of-range pointer coordinates are clamped,
//! undersized commits and stale handles are silent no-ops. Drag gestures
//! run through an explicit state machine rather than fields shared between
//! event callbacks.

mod region;
mod transform;

pub use region::{Region, RegionId, RegionView};
pub use transform::ViewTransform;

use crate::document::Page;
use crate::geometry::{Corner, Point, Rect};

/// Minimum committed region size, in display pixels.
pub const MIN_REGION_PX: f32 = 5.0;

/// Default cap on the number of regions per page.
pub const DEFAULT_MAX_REGIONS: usize = 32;

/// Drag gesture in progress. Each state carries only the data it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Idle,
    /// Rubber-banding a new rectangle; both points in display space.
    Drawing { anchor: Point, cursor: Point },
    /// Translating an existing region; `last` is the previous pointer
    /// position in display space.
    Moving { target: RegionId, last: Point },
    /// Resizing by corner; `fixed` is the diagonally opposite corner in
    /// source space.
    Resizing { target: RegionId, fixed: Point },
}

/// Interactive editor for rectangular OCR regions over one page.
pub struct RegionEditor {
    image_w: u32,
    image_h: u32,
    viewport_w: f32,
    viewport_h: f32,
    transform: ViewTransform,
    regions: Vec<Region>,
    next_id: u64,
    drag: Drag,
    max_regions: usize,
}

impl RegionEditor {
    /// Create an editor with the given viewport size and no page loaded.
    /// Pointer operations before the first [`load`](Self::load) are no-ops.
    pub fn new(viewport_w: f32, viewport_h: f32) -> Self {
        Self {
            image_w: 0,
            image_h: 0,
            viewport_w,
            viewport_h,
            transform: ViewTransform::fit(0, 0, viewport_w, viewport_h),
            regions: Vec::new(),
            next_id: 0,
            drag: Drag::Idle,
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }

    /// Set the region cap.
    pub fn with_max_regions(mut self, max_regions: usize) -> Self {
        self.max_regions = max_regions;
        self
    }

    /// Replace the displayed page. Recomputes the transform and discards
    /// every existing region and any drag in progress; callers needing the
    /// regions must read them out first.
    pub fn load(&mut self, page: &Page) {
        self.image_w = page.width();
        self.image_h = page.height();
        self.regions.clear();
        self.drag = Drag::Idle;
        self.refit();
    }

    /// Resize the viewport. Regions are untouched; only the transform is
    /// recomputed.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport_w = width;
        self.viewport_h = height;
        self.refit();
    }

    fn refit(&mut self) {
        self.transform =
            ViewTransform::fit(self.image_w, self.image_h, self.viewport_w, self.viewport_h);
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn has_image(&self) -> bool {
        self.image_w > 0 && self.image_h > 0
    }

    fn index_of(&self, id: RegionId) -> Option<usize> {
        self.regions.iter().position(|r| r.id == id)
    }

    /// Topmost region containing the display-space point, if any.
    pub fn region_at(&self, p: Point) -> Option<RegionId> {
        let src = self.transform.to_source(p);
        self.regions
            .iter()
            .rev()
            .find(|r| r.rect.contains(src))
            .map(|r| r.id)
    }

    /// Start rubber-banding a new rectangle. A draw already in progress is
    /// replaced.
    pub fn begin_draw(&mut self, p: Point) {
        if !self.has_image() {
            return;
        }
        self.drag = Drag::Drawing { anchor: p, cursor: p };
    }

    /// Update the rubber band's second corner.
    pub fn update_draw(&mut self, p: Point) {
        if let Drag::Drawing { anchor, .. } = self.drag {
            self.drag = Drag::Drawing { anchor, cursor: p };
        }
    }

    /// Commit the rubber band if it meets the minimum display size; always
    /// clears the in-progress state. Returns the new region's id on commit.
    pub fn end_draw(&mut self, p: Point) -> Option<RegionId> {
        let Drag::Drawing { anchor, .. } = self.drag else {
            return None;
        };
        self.drag = Drag::Idle;

        let display = Rect::from_corners(anchor, p);
        if display.width() < MIN_REGION_PX || display.height() < MIN_REGION_PX {
            let display_width = display.width();
            let display_height = display.height();
            tracing::debug!(
                width = display_width,
                height = display_height,
                "region below minimum size, not committed"
            );
            return None;
        }
        if self.regions.len() >= self.max_regions {
            tracing::debug!(cap = self.max_regions, "region cap reached, not committed");
            return None;
        }

        let rect = Rect::from_corners(
            self.transform.to_source(anchor),
            self.transform.to_source(p),
        );
        // A drag entirely inside the letterbox margin collapses to a line
        // on the image border once clamped.
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }

        self.next_id += 1;
        let id = RegionId(self.next_id);
        self.regions.push(Region { id, rect });
        Some(id)
    }

    /// Display-space rectangle of the in-progress rubber band, for the
    /// host's renderer.
    pub fn draw_preview(&self) -> Option<Rect> {
        match self.drag {
            Drag::Drawing { anchor, cursor } => Some(Rect::from_corners(anchor, cursor)),
            _ => None,
        }
    }

    /// Start translating an existing region. A stale id leaves the editor
    /// idle.
    pub fn begin_move(&mut self, id: RegionId, p: Point) {
        if self.index_of(id).is_some() {
            self.drag = Drag::Moving { target: id, last: p };
        }
    }

    /// Translate the dragged region by the pointer delta since the last
    /// update, keeping it fully inside the image. If the region was deleted
    /// mid-drag the gesture silently ends.
    pub fn update_move(&mut self, p: Point) {
        let Drag::Moving { target, last } = self.drag else {
            return;
        };
        let Some(index) = self.index_of(target) else {
            self.drag = Drag::Idle;
            return;
        };

        let (dx, dy) = self.transform.delta_to_source(p.x - last.x, p.y - last.y);
        let rect = self.regions[index].rect;
        let max_x = (self.image_w as f32 - rect.width()).max(0.0);
        let max_y = (self.image_h as f32 - rect.height()).max(0.0);
        let nx = (rect.x1 + dx).clamp(0.0, max_x);
        let ny = (rect.y1 + dy).clamp(0.0, max_y);
        self.regions[index].rect = rect.translated(nx - rect.x1, ny - rect.y1);
        self.drag = Drag::Moving { target, last: p };
    }

    pub fn end_move(&mut self) {
        if matches!(self.drag, Drag::Moving { .. }) {
            self.drag = Drag::Idle;
        }
    }

    /// Start resizing a region by one of its corners; the opposite corner
    /// stays fixed for the whole gesture. A stale id leaves the editor idle.
    pub fn begin_resize(&mut self, id: RegionId, corner: Corner) {
        if let Some(index) = self.index_of(id) {
            let fixed = self.regions[index].rect.corner(corner.opposite());
            self.drag = Drag::Resizing { target: id, fixed };
        }
    }

    /// Move the dragged corner to the pointer position. The rectangle is
    /// re-normalized, so dragging a corner past its opposite flips it
    /// instead of going negative; an update that would shrink either
    /// display-space dimension below the minimum keeps the prior rect.
    pub fn update_resize(&mut self, p: Point) {
        let Drag::Resizing { target, fixed } = self.drag else {
            return;
        };
        let Some(index) = self.index_of(target) else {
            self.drag = Drag::Idle;
            return;
        };

        let candidate = Rect::from_corners(fixed, self.transform.to_source(p));
        let display = self.transform.to_display_rect(&candidate);
        if display.width() < MIN_REGION_PX || display.height() < MIN_REGION_PX {
            return;
        }
        self.regions[index].rect = candidate;
    }

    pub fn end_resize(&mut self) {
        if matches!(self.drag, Drag::Resizing { .. }) {
            self.drag = Drag::Idle;
        }
    }

    /// Remove a region. Unknown or already-deleted ids are no-ops. Labels
    /// of the remaining regions stay contiguous in their original order.
    pub fn delete(&mut self, id: RegionId) {
        self.regions.retain(|r| r.id != id);
    }

    /// Drop all regions.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Render-ready views: display-space rectangles with 1-based labels.
    pub fn display_regions(&self) -> Vec<RegionView> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, r)| RegionView {
                id: r.id,
                label: i + 1,
                rect: self.transform.to_display_rect(&r.rect),
            })
            .collect()
    }

    /// Ordered regions mapped into the coordinate space of a
    /// `target_width x target_height` image (normally the full-resolution
    /// source, which may differ from the displayed image if the caller
    /// rescaled it separately). Each rectangle is clamped so its near
    /// corner stays a pixel inside the far edge, keeping crops in range.
    pub fn scaled_regions(&self, target_width: u32, target_height: u32) -> Vec<Rect> {
        if !self.has_image() || target_width == 0 || target_height == 0 {
            return Vec::new();
        }
        let sx = target_width as f32 / self.image_w as f32;
        let sy = target_height as f32 / self.image_h as f32;
        self.regions
            .iter()
            .map(|r| {
                r.rect
                    .scaled(sx, sy)
                    .clamp_for_crop(target_width as f32, target_height as f32)
            })
            .collect()
    }
}
