// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement and drawing seam.

use kurbo::{Point, Rect};

use crate::raster::{Color, Raster};

/// Font parameters for one run of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in raster pixels.
    pub size: f64,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
}

impl TextStyle {
    /// Regular-weight upright text at `size`.
    #[must_use]
    pub const fn regular(size: f64) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
        }
    }
}

/// Measures and draws text runs.
///
/// The layout engine wraps lines with [`measure`](Self::measure) and the
/// renderer paints with [`draw`](Self::draw); both must agree for the same
/// `style`, otherwise wrapped lines will not fit the widths they were
/// measured against.
pub trait TextBackend {
    /// Returns the advance width of `text` in raster pixels.
    fn measure(&self, text: &str, style: &TextStyle) -> f64;

    /// Draws `text` with its baseline starting at `origin`.
    fn draw(&self, raster: &mut Raster, text: &str, origin: Point, style: &TextStyle, color: Color);
}

/// A deterministic glyph-box backend.
///
/// Every character advances by a fixed fraction of the font size (wider when
/// bold) and non-whitespace characters are painted as solid boxes between
/// the x-height and the baseline. Used for headless rendering and tests,
/// where real glyph outlines would only add noise.
#[derive(Clone, Copy, Debug)]
pub struct BlockGlyphs {
    /// Advance per character as a fraction of the font size.
    pub advance: f64,
    /// Extra advance fraction applied to bold text.
    pub bold_extra: f64,
}

impl Default for BlockGlyphs {
    fn default() -> Self {
        Self {
            advance: 0.5,
            bold_extra: 0.06,
        }
    }
}

impl BlockGlyphs {
    fn glyph_advance(&self, style: &TextStyle) -> f64 {
        let extra = if style.bold { self.bold_extra } else { 0.0 };
        style.size * (self.advance + extra)
    }
}

impl TextBackend for BlockGlyphs {
    fn measure(&self, text: &str, style: &TextStyle) -> f64 {
        text.chars().count() as f64 * self.glyph_advance(style)
    }

    fn draw(
        &self,
        raster: &mut Raster,
        text: &str,
        origin: Point,
        style: &TextStyle,
        color: Color,
    ) {
        let adv = self.glyph_advance(style);
        let top = origin.y - style.size * 0.62;
        let slant = if style.italic { adv * 0.15 } else { 0.0 };
        let mut x = origin.x;
        for ch in text.chars() {
            if !ch.is_whitespace() {
                raster.fill_rect(
                    Rect::new(x + adv * 0.12 + slant, top, x + adv * 0.88 + slant, origin.y),
                    color,
                );
            }
            x += adv;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_counts_characters() {
        let g = BlockGlyphs::default();
        let style = TextStyle::regular(10.0);
        assert_eq!(g.measure("abcd", &style), 20.0);
        assert_eq!(g.measure("", &style), 0.0);
    }

    #[test]
    fn bold_is_wider() {
        let g = BlockGlyphs::default();
        let regular = TextStyle::regular(10.0);
        let bold = TextStyle {
            bold: true,
            ..regular
        };
        assert!(g.measure("word", &bold) > g.measure("word", &regular));
    }

    #[test]
    fn draw_skips_whitespace() {
        let g = BlockGlyphs::default();
        let mut r = Raster::new(40, 20, Color::WHITE);
        g.draw(&mut r, "a b", Point::new(0.0, 15.0), &TextStyle::regular(10.0), Color::INK);
        assert_eq!(r.pixel(2, 14), Some(Color::INK), "first glyph");
        assert_eq!(r.pixel(7, 14), Some(Color::WHITE), "space");
        assert_eq!(r.pixel(12, 14), Some(Color::INK), "third glyph");
    }
}
