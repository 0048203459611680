// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface hit conversion, link hit-testing, and drag-to-scroll state.
//!
//! The host's raycaster reduces pointer input to [`PointerHit`]s: a paper
//! and a UV coordinate on its surface, ordered by distance. UV `v` runs
//! bottom-up, so converting to full-raster pixels flips it:
//!
//! ```text
//! x = u * viewport_width
//! y = (1 - v) * viewport_height + scroll_offset
//! ```

use alloc::string::String;

use kurbo::{Point, Size};

use crate::layout::LinkRegion;
use crate::paper::PaperId;

/// Identifies one pointer (mouse, touch point, pen).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// One raycast hit against a paper surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerHit {
    /// Paper that was hit.
    pub paper: PaperId,
    /// Surface coordinate, `v` bottom-up, both in `[0, 1]`.
    pub uv: Point,
    /// Ray distance; hit lists are sorted by this, nearest first.
    pub distance: f64,
}

/// What a pointer press did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    /// A link was pressed; the host should open it.
    OpenLink(String),
    /// A drag-to-scroll started on the current paper.
    DragStarted(PaperId),
    /// Navigation toward a paper started.
    Navigated(PaperId),
    /// Nothing interactive was hit.
    Ignored,
}

/// Converts a surface UV to full-raster pixels.
#[must_use]
pub fn uv_to_raster(uv: Point, viewport: Size, scroll_offset: f64) -> Point {
    Point::new(
        uv.x * viewport.width,
        (1.0 - uv.y) * viewport.height + scroll_offset,
    )
}

/// Returns the first link whose padded bounds contain `point`.
///
/// Regions may overlap; source order breaks ties.
#[must_use]
pub fn hit_link(links: &[LinkRegion], point: Point, padding: f64) -> Option<&LinkRegion> {
    links
        .iter()
        .find(|link| link.rect.inflate(padding, padding).contains(point))
}

/// An active drag-to-scroll gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragState {
    /// Pointer that owns the drag.
    pub pointer: PointerId,
    /// Paper being scrolled.
    pub paper: PaperId,
    /// Pointer Y at drag start, in viewport pixels.
    pub start_y: f64,
    /// Scroll offset at drag start.
    pub start_offset: f64,
}

impl DragState {
    /// Scroll offset for the pointer now at `current_y`.
    #[must_use]
    pub fn offset_for(&self, current_y: f64, max_scroll: f64) -> f64 {
        (self.start_offset + (current_y - self.start_y)).clamp(0.0, max_scroll.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn region(url: &str, rect: Rect) -> LinkRegion {
        LinkRegion {
            url: url.into(),
            rect,
        }
    }

    #[test]
    fn padding_extends_the_hit_box() {
        let links = [region("https://a", Rect::new(100.0, 200.0, 150.0, 220.0))];
        let hit = hit_link(&links, Point::new(95.0, 195.0), 10.0);
        assert_eq!(hit.map(|l| l.url.as_str()), Some("https://a"));
        assert!(hit_link(&links, Point::new(80.0, 80.0), 10.0).is_none());
        assert!(hit_link(&links, Point::new(95.0, 195.0), 0.0).is_none());
    }

    #[test]
    fn first_overlapping_region_wins() {
        let links = [
            region("first", Rect::new(0.0, 0.0, 50.0, 20.0)),
            region("second", Rect::new(40.0, 0.0, 90.0, 20.0)),
        ];
        let hit = hit_link(&links, Point::new(45.0, 10.0), 0.0).unwrap();
        assert_eq!(hit.url, "first");
    }

    #[test]
    fn uv_flips_v_and_adds_offset() {
        let viewport = Size::new(800.0, 1000.0);
        assert_eq!(uv_to_raster(Point::new(0.5, 1.0), viewport, 0.0), Point::new(400.0, 0.0));
        assert_eq!(
            uv_to_raster(Point::new(0.25, 0.0), viewport, 300.0),
            Point::new(200.0, 1300.0)
        );
    }

    #[test]
    fn drag_offset_is_clamped() {
        let drag = DragState {
            pointer: PointerId(1),
            paper: PaperId(0),
            start_y: 100.0,
            start_offset: 50.0,
        };
        assert_eq!(drag.offset_for(130.0, 400.0), 80.0);
        assert_eq!(drag.offset_for(-500.0, 400.0), 0.0);
        assert_eq!(drag.offset_for(900.0, 400.0), 400.0);
        assert_eq!(drag.offset_for(900.0, 0.0), 0.0);
    }
}
