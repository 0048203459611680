// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dual-buffer scrolling over a full-document raster.
//!
//! A [`ScrollableRaster`] owns the *full* raster (the entire document) and a
//! fixed-size *viewport* raster holding the visible slice. The scroll offset
//! is authoritative and updated synchronously on every input; the viewport
//! copy is deferred until [`flush`](ScrollableRaster::flush), which the frame
//! loop calls once per frame. Any number of deltas between two flushes
//! coalesce into one redraw.

use kurbo::Rect;

use crate::raster::{Color, Raster, floor_px};

/// Viewport size and scroll indicator parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollConfig {
    /// Viewport raster width in pixels.
    pub viewport_width: u32,
    /// Viewport raster height in pixels.
    pub viewport_height: u32,
    /// Whether to draw a scroll thumb over the content.
    pub indicator: bool,
    /// Thumb width in pixels.
    pub indicator_width: f64,
    /// Gap between the thumb and the right edge.
    pub indicator_inset: f64,
    /// Smallest thumb height in pixels.
    pub min_thumb: f64,
    /// Padding added around link regions when hit-testing.
    pub link_padding: f64,
}

impl ScrollConfig {
    /// A letter-proportioned 800 px viewport with an indicator.
    #[must_use]
    pub const fn letter() -> Self {
        Self {
            viewport_width: 800,
            viewport_height: 1035,
            indicator: true,
            indicator_width: 6.0,
            indicator_inset: 4.0,
            min_thumb: 24.0,
            link_padding: 10.0,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::letter()
    }
}

/// Result of [`ScrollableRaster::on_content_reflow`], forwarded to the
/// overlay layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentReflow {
    /// New full-document height in pixels.
    pub height: u32,
    /// Scroll offset after clamping.
    pub offset: f64,
    /// Whether the offset had to move down to stay in range.
    pub clamped: bool,
}

/// Full and viewport rasters plus the scroll state that links them.
///
/// `0 <= offset <= max_scroll` holds after every public call, where
/// `max_scroll = max(0, full_height - viewport_height)`.
#[derive(Debug)]
pub struct ScrollableRaster {
    full: Raster,
    viewport: Raster,
    config: ScrollConfig,
    offset: f64,
    max_scroll: f64,
    redraw_pending: bool,
    texture_dirty: bool,
    redraws: u64,
}

impl ScrollableRaster {
    /// Wraps `full` and draws the initial viewport at offset 0.
    #[must_use]
    pub fn new(full: Raster, config: ScrollConfig) -> Self {
        let mut this = Self {
            viewport: Raster::new(config.viewport_width, config.viewport_height, Color::WHITE),
            max_scroll: max_scroll_for(&full, &config),
            full,
            config,
            offset: 0.0,
            redraw_pending: false,
            texture_dirty: false,
            redraws: 0,
        };
        this.redraw();
        this
    }

    /// Current scroll offset in full-raster pixels.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Largest valid scroll offset.
    #[inline]
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        self.max_scroll
    }

    /// Whether the document is taller than the viewport.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.max_scroll > 0.0
    }

    /// The full-document raster.
    #[must_use]
    pub fn full(&self) -> &Raster {
        &self.full
    }

    /// The visible slice, as of the last redraw.
    #[must_use]
    pub fn viewport(&self) -> &Raster {
        &self.viewport
    }

    /// Viewport and indicator configuration.
    #[must_use]
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Number of viewport redraws performed so far.
    #[must_use]
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Whether a redraw is waiting for the next [`flush`](Self::flush).
    #[must_use]
    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    /// Sets the scroll offset, clamped to `[0, max_scroll]`.
    ///
    /// Returns whether the offset changed. A change schedules one redraw;
    /// non-finite input is ignored.
    pub fn set_scroll_offset(&mut self, offset: f64) -> bool {
        if !offset.is_finite() {
            return false;
        }
        let clamped = offset.clamp(0.0, self.max_scroll);
        if clamped == self.offset {
            return false;
        }
        self.offset = clamped;
        self.redraw_pending = true;
        true
    }

    /// Moves the offset by `delta`; see [`set_scroll_offset`](Self::set_scroll_offset).
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.set_scroll_offset(self.offset + delta)
    }

    /// Performs the pending redraw, if any. Returns whether one happened.
    pub fn flush(&mut self) -> bool {
        if !self.redraw_pending {
            return false;
        }
        self.redraw();
        true
    }

    /// Replaces the full raster after a re-layout.
    ///
    /// Recomputes `max_scroll`, clamps the offset down if the document
    /// shrank, and redraws the viewport immediately.
    pub fn on_content_reflow(&mut self, full: Raster) -> ContentReflow {
        self.full = full;
        self.max_scroll = max_scroll_for(&self.full, &self.config);
        let clamped = self.offset > self.max_scroll;
        if clamped {
            self.offset = self.max_scroll;
        }
        self.redraw();
        ContentReflow {
            height: self.full.height(),
            offset: self.offset,
            clamped,
        }
    }

    /// Returns and clears the texture-dirty flag set by each redraw.
    pub fn take_texture_dirty(&mut self) -> bool {
        core::mem::take(&mut self.texture_dirty)
    }

    /// Where the thumb is drawn in viewport pixels, if it is drawn at all.
    #[must_use]
    pub fn thumb_rect(&self) -> Option<Rect> {
        if !self.config.indicator || !self.is_scrollable() {
            return None;
        }
        let vh = f64::from(self.viewport.height());
        let fh = f64::from(self.full.height());
        let h = (vh * vh / fh).max(self.config.min_thumb).min(vh);
        let y = (vh - h) * self.offset / self.max_scroll;
        let x1 = f64::from(self.viewport.width()) - self.config.indicator_inset;
        Some(Rect::new(x1 - self.config.indicator_width, y, x1, y + h))
    }

    fn redraw(&mut self) {
        #[expect(clippy::cast_possible_truncation, reason = "offset fits the raster height")]
        let src_y = floor_px(self.offset).max(0) as u32;
        self.full
            .copy_rows_into(src_y, &mut self.viewport, Color::WHITE);
        if let Some(thumb) = self.thumb_rect() {
            self.viewport.fill_rect(thumb, Color::THUMB);
        }
        self.redraw_pending = false;
        self.texture_dirty = true;
        self.redraws += 1;
    }
}

fn max_scroll_for(full: &Raster, config: &ScrollConfig) -> f64 {
    (f64::from(full.height()) - f64::from(config.viewport_height)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ScrollConfig {
        ScrollConfig {
            viewport_width: 10,
            viewport_height: 10,
            indicator_width: 2.0,
            indicator_inset: 0.0,
            min_thumb: 2.0,
            ..ScrollConfig::letter()
        }
    }

    /// A 10 px wide document with one INK row every 10 px.
    fn striped(height: u32) -> Raster {
        let mut r = Raster::new(10, height, Color::WHITE);
        for y in (0..height).step_by(10) {
            r.fill_rect(Rect::new(0.0, f64::from(y), 10.0, f64::from(y) + 1.0), Color::INK);
        }
        r
    }

    #[test]
    fn offset_stays_in_range_for_any_deltas() {
        let mut s = ScrollableRaster::new(striped(35), small());
        assert_eq!(s.max_scroll(), 25.0);
        for delta in [5.0, -100.0, 1e9, 3.5, -2.0, f64::NAN, f64::INFINITY, 40.0] {
            s.scroll_by(delta);
            assert!(
                (0.0..=s.max_scroll()).contains(&s.offset()),
                "offset {} out of range after {delta}",
                s.offset()
            );
        }
        assert_eq!(s.offset(), 25.0);
    }

    #[test]
    fn short_documents_do_not_scroll() {
        let mut s = ScrollableRaster::new(striped(8), small());
        assert!(!s.is_scrollable());
        assert!(!s.scroll_by(4.0));
        assert_eq!(s.offset(), 0.0);
        assert!(s.thumb_rect().is_none());
    }

    #[test]
    fn deltas_coalesce_into_one_redraw() {
        let mut s = ScrollableRaster::new(striped(100), small());
        assert!(s.take_texture_dirty(), "initial draw");
        let base = s.redraw_count();
        assert!(s.scroll_by(3.0));
        assert!(s.scroll_by(4.0));
        assert!(s.scroll_by(3.0));
        assert_eq!(s.offset(), 10.0, "offset is updated synchronously");
        assert_eq!(s.redraw_count(), base, "no redraw before the frame");
        assert!(s.flush());
        assert!(!s.flush(), "nothing left to draw");
        assert_eq!(s.redraw_count(), base + 1);
        assert!(s.take_texture_dirty());
        assert!(!s.take_texture_dirty());
        assert_eq!(s.viewport().pixel(0, 0), Some(Color::INK), "row 10 is a stripe");
    }

    #[test]
    fn reflow_clamps_offset_down() {
        let mut s = ScrollableRaster::new(striped(100), small());
        s.set_scroll_offset(80.0);
        s.flush();
        let reflow = s.on_content_reflow(striped(40));
        assert_eq!(
            reflow,
            ContentReflow {
                height: 40,
                offset: 30.0,
                clamped: true
            }
        );
        assert_eq!(s.offset(), 30.0);
        assert!(!s.redraw_pending());
    }

    #[test]
    fn reflow_growth_keeps_offset() {
        let mut s = ScrollableRaster::new(striped(50), small());
        s.set_scroll_offset(20.0);
        let reflow = s.on_content_reflow(striped(500));
        assert_eq!(reflow.offset, 20.0);
        assert!(!reflow.clamped);
        assert_eq!(s.max_scroll(), 490.0);
    }

    #[test]
    fn thumb_is_redrawn_over_fresh_content() {
        let mut s = ScrollableRaster::new(Raster::new(10, 40, Color::WHITE), small());
        let top = s.thumb_rect().unwrap();
        assert_eq!(top.y0, 0.0);
        let thumb_px = s.viewport().pixel(top.x0 as u32, 0).unwrap();
        assert_ne!(thumb_px, Color::WHITE);

        s.set_scroll_offset(s.max_scroll());
        s.flush();
        let bottom = s.thumb_rect().unwrap();
        assert_eq!(bottom.y1, 10.0);
        // Old thumb position shows plain content again.
        assert_eq!(s.viewport().pixel(top.x0 as u32, 0), Some(Color::WHITE));
        assert_eq!(s.viewport().pixel(top.x0 as u32, 9), Some(thumb_px));
    }
}
