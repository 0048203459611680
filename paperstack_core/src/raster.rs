// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RGBA8 pixel buffers.
//!
//! A [`Raster`] is the unit of texture content: the layout engine paints the
//! full document into one, the scrollable viewport copies slices into
//! another, and the scene collaborator uploads it as-is. Rows are stored
//! top-to-bottom, four bytes per pixel, non-premultiplied.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// An 8-bit-per-channel RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// Opaque white, the paper background.
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    /// Near-black body text.
    pub const INK: Self = Self([28, 28, 32, 255]);
    /// Link text.
    pub const LINK: Self = Self([30, 90, 200, 255]);
    /// Rule lines and placeholder frames.
    pub const RULE: Self = Self([200, 200, 205, 255]);
    /// Image placeholder fill.
    pub const PLACEHOLDER: Self = Self([232, 232, 236, 255]);
    /// Error text on failed-load placeholders.
    pub const ERROR: Self = Self([180, 40, 40, 255]);
    /// Scroll indicator thumb.
    pub const THUMB: Self = Self([0, 0, 0, 96]);

    /// Source-over blend of `self` onto `dst`.
    #[must_use]
    pub fn over(self, dst: Self) -> Self {
        let [sr, sg, sb, sa] = self.0;
        if sa == 255 {
            return self;
        }
        let a = u32::from(sa);
        let inv = 255 - a;
        let mix = |s: u8, d: u8| -> u8 {
            let v = (u32::from(s) * a + u32::from(d) * inv + 127) / 255;
            #[expect(clippy::cast_possible_truncation, reason = "value is at most 255")]
            let v = v as u8;
            v
        };
        let [dr, dg, db, da] = dst.0;
        Self([mix(sr, dr), mix(sg, dg), mix(sb, db), da.max(sa)])
    }
}

/// Rounds a coordinate down to a whole pixel.
#[expect(
    clippy::cast_possible_truncation,
    reason = "raster coordinates are far inside i64 range"
)]
pub(crate) fn floor_px(v: f64) -> i64 {
    v.floor() as i64
}

/// Rounds a coordinate up to a whole pixel.
#[expect(
    clippy::cast_possible_truncation,
    reason = "raster coordinates are far inside i64 range"
)]
pub(crate) fn ceil_px(v: f64) -> i64 {
    v.ceil() as i64
}

/// A row-major RGBA8 pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl core::fmt::Debug for Raster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Raster {
    /// Creates a raster filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        let len = width as usize * height as usize;
        let mut pixels = vec![0_u8; len * 4];
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&fill.0);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wraps an existing RGBA8 buffer.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, row-major.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the raster.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut c = [0_u8; 4];
        c.copy_from_slice(&self.pixels[i..i + 4]);
        Some(Color(c))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Clamps a rectangle to whole pixels inside the raster.
    ///
    /// Returns `(x0, y0, x1, y1)` with `x0 <= x1` and `y0 <= y1`.
    fn clip(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let x0 = floor_px(rect.x0).clamp(0, w);
        let y0 = floor_px(rect.y0).clamp(0, h);
        let x1 = ceil_px(rect.x1).clamp(x0, w);
        let y1 = ceil_px(rect.y1).clamp(y0, h);
        #[expect(clippy::cast_possible_truncation, reason = "clamped to u32 dimensions")]
        let out = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);
        out
    }

    /// Fills `rect` with `color`, blending when it is translucent.
    ///
    /// The rectangle is clipped to the raster; pixels outside are ignored.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x0, y0, x1, y1) = self.clip(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                let i = self.offset(x, y);
                let dst = Color([
                    self.pixels[i],
                    self.pixels[i + 1],
                    self.pixels[i + 2],
                    self.pixels[i + 3],
                ]);
                self.pixels[i..i + 4].copy_from_slice(&color.over(dst).0);
            }
        }
    }

    /// Copies `dst.height()` rows from `self` starting at row `src_y` into
    /// `dst`. Rows past the end of `self` are cleared to `fill`.
    ///
    /// Widths may differ; the copied span is the narrower of the two and the
    /// rest of each destination row is cleared to `fill`.
    pub fn copy_rows_into(&self, src_y: u32, dst: &mut Self, fill: Color) {
        let span = self.width.min(dst.width) as usize * 4;
        let dst_stride = dst.width as usize * 4;
        for row in 0..dst.height {
            let d = row as usize * dst_stride;
            let dst_row = &mut dst.pixels[d..d + dst_stride];
            let sy = src_y.saturating_add(row);
            if sy < self.height {
                let s = sy as usize * self.width as usize * 4;
                dst_row[..span].copy_from_slice(&self.pixels[s..s + span]);
                for px in dst_row[span..].chunks_exact_mut(4) {
                    px.copy_from_slice(&fill.0);
                }
            } else {
                for px in dst_row.chunks_exact_mut(4) {
                    px.copy_from_slice(&fill.0);
                }
            }
        }
    }

    /// Draws `src` scaled (nearest neighbour) into `rect`.
    pub fn draw_scaled(&mut self, src: &Self, rect: Rect) {
        if src.width == 0 || src.height == 0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        let (x0, y0, x1, y1) = self.clip(rect);
        let sx_scale = f64::from(src.width) / rect.width();
        let sy_scale = f64::from(src.height) / rect.height();
        for y in y0..y1 {
            let sy = floor_px((f64::from(y) + 0.5 - rect.y0) * sy_scale)
                .clamp(0, i64::from(src.height) - 1);
            for x in x0..x1 {
                let sx = floor_px((f64::from(x) + 0.5 - rect.x0) * sx_scale)
                    .clamp(0, i64::from(src.width) - 1);
                #[expect(clippy::cast_possible_truncation, reason = "clamped to source bounds")]
                let s = src.offset(sx as u32, sy as u32);
                let color = Color([
                    src.pixels[s],
                    src.pixels[s + 1],
                    src.pixels[s + 2],
                    src.pixels[s + 3],
                ]);
                let d = self.offset(x, y);
                let dst = Color([
                    self.pixels[d],
                    self.pixels[d + 1],
                    self.pixels[d + 2],
                    self.pixels[d + 3],
                ]);
                self.pixels[d..d + 4].copy_from_slice(&color.over(dst).0);
            }
        }
    }

    /// Strokes a one-pixel frame just inside `rect`.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.fill_rect(Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + 1.0), color);
        self.fill_rect(Rect::new(rect.x0, rect.y1 - 1.0, rect.x1, rect.y1), color);
        self.fill_rect(Rect::new(rect.x0, rect.y0, rect.x0 + 1.0, rect.y1), color);
        self.fill_rect(Rect::new(rect.x1 - 1.0, rect.y0, rect.x1, rect.y1), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_is_clipped() {
        let mut r = Raster::new(4, 4, Color::WHITE);
        r.fill_rect(Rect::new(-10.0, 2.0, 2.0, 40.0), Color::INK);
        assert_eq!(r.pixel(0, 3), Some(Color::INK));
        assert_eq!(r.pixel(1, 2), Some(Color::INK));
        assert_eq!(r.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(r.pixel(0, 1), Some(Color::WHITE));
        assert_eq!(r.pixel(4, 0), None);
    }

    #[test]
    fn copy_rows_pads_past_end() {
        let mut src = Raster::new(2, 3, Color::WHITE);
        src.fill_rect(Rect::new(0.0, 2.0, 2.0, 3.0), Color::INK);
        let mut dst = Raster::new(2, 2, Color::RULE);
        src.copy_rows_into(2, &mut dst, Color::WHITE);
        assert_eq!(dst.pixel(0, 0), Some(Color::INK), "row 2 of source");
        assert_eq!(dst.pixel(1, 1), Some(Color::WHITE), "padding past the end");
    }

    #[test]
    fn translucent_fill_blends() {
        let mut r = Raster::new(1, 1, Color::WHITE);
        r.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::THUMB);
        let c = r.pixel(0, 0).unwrap();
        assert!(c.0[0] < 255 && c.0[0] > 100, "blended: {c:?}");
        assert_eq!(c.0[3], 255);
    }

    #[test]
    fn draw_scaled_stretches_source() {
        let src = Raster::new(1, 1, Color::LINK);
        let mut dst = Raster::new(4, 4, Color::WHITE);
        dst.draw_scaled(&src, Rect::new(1.0, 1.0, 3.0, 3.0));
        assert_eq!(dst.pixel(1, 1), Some(Color::LINK));
        assert_eq!(dst.pixel(2, 2), Some(Color::LINK));
        assert_eq!(dst.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(dst.pixel(3, 3), Some(Color::WHITE));
    }

    #[test]
    fn from_rgba_checks_length() {
        assert!(Raster::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Raster::from_rgba(2, 2, vec![0; 15]).is_none());
    }
}
