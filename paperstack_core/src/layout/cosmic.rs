// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shaped, anti-aliased text through `cosmic-text`.

use alloc::string::String;
use core::cell::RefCell;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight};
use kurbo::{Point, Rect};

use super::text::{TextBackend, TextStyle};
use crate::raster::{Color, Raster};

/// A [`TextBackend`] that shapes with `cosmic-text` and rasterizes glyphs
/// with `swash`.
///
/// [`measure`](TextBackend::measure) and [`draw`](TextBackend::draw) shape
/// through the same [`FontSystem`] and family, so wrapped lines paint at the
/// widths they were measured at.
pub struct CosmicText {
    shaper: RefCell<Shaper>,
    family: Option<String>,
}

struct Shaper {
    fonts: FontSystem,
    glyphs: SwashCache,
}

impl core::fmt::Debug for CosmicText {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CosmicText")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl Default for CosmicText {
    fn default() -> Self {
        Self::new()
    }
}

impl CosmicText {
    /// Loads the system fonts and draws with the default sans-serif family.
    #[must_use]
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    /// Uses an already populated font system, e.g. one with embedded fonts.
    #[must_use]
    pub fn with_font_system(fonts: FontSystem) -> Self {
        Self {
            shaper: RefCell::new(Shaper {
                fonts,
                glyphs: SwashCache::new(),
            }),
            family: None,
        }
    }

    /// Draws with the named family instead of sans-serif.
    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Whether any font face was found.
    ///
    /// Without one, every run measures zero and nothing is painted.
    #[must_use]
    pub fn has_fonts(&self) -> bool {
        !self.shaper.borrow().fonts.db().is_empty()
    }

    fn attrs(&self, style: &TextStyle) -> Attrs<'_> {
        let family = self
            .family
            .as_deref()
            .map_or(Family::SansSerif, Family::Name);
        let mut attrs = Attrs::new().family(family);
        if style.bold {
            attrs = attrs.weight(Weight::BOLD);
        }
        if style.italic {
            attrs = attrs.style(Style::Italic);
        }
        attrs
    }
}

/// Lays `text` out as a single unbounded line.
#[expect(
    clippy::cast_possible_truncation,
    reason = "font sizes are small and f32 is what cosmic-text takes"
)]
fn shape(fonts: &mut FontSystem, text: &str, size: f64, attrs: &Attrs<'_>) -> Buffer {
    let size = size as f32;
    let mut buffer = Buffer::new(fonts, Metrics::new(size, size));
    buffer.set_size(fonts, None, None);
    buffer.set_text(fonts, text, attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(fonts, false);
    buffer
}

impl TextBackend for CosmicText {
    fn measure(&self, text: &str, style: &TextStyle) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        let mut shaper = self.shaper.borrow_mut();
        let buffer = shape(&mut shaper.fonts, text, style.size, &self.attrs(style));
        buffer
            .layout_runs()
            .map(|run| f64::from(run.line_w))
            .fold(0.0, f64::max)
    }

    fn draw(
        &self,
        raster: &mut Raster,
        text: &str,
        origin: Point,
        style: &TextStyle,
        color: Color,
    ) {
        if text.trim().is_empty() {
            return;
        }
        let mut shaper = self.shaper.borrow_mut();
        let Shaper { fonts, glyphs } = &mut *shaper;
        let buffer = shape(fonts, text, style.size, &self.attrs(style));
        // Glyph coordinates are relative to the top of the first line.
        let baseline = buffer
            .layout_runs()
            .next()
            .map_or(0.0, |run| f64::from(run.line_y));
        let (dx, dy) = (origin.x, origin.y - baseline);
        let [r, g, b, a] = color.0;
        let ink = cosmic_text::Color::rgba(r, g, b, a);
        buffer.draw(fonts, glyphs, ink, |x, y, w, h, c| {
            if c.a() == 0 {
                return;
            }
            let x0 = dx + f64::from(x);
            let y0 = dy + f64::from(y);
            raster.fill_rect(
                Rect::new(x0, y0, x0 + f64::from(w), y0 + f64::from(h)),
                Color([c.r(), c.g(), c.b(), c.a()]),
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_measures_zero() {
        let text = CosmicText::new();
        assert_eq!(text.measure("", &TextStyle::regular(16.0)), 0.0);
    }

    #[test]
    fn painted_ink_stays_within_the_measured_width() {
        let text = CosmicText::new();
        if !text.has_fonts() {
            // Font-less build machines have nothing to shape with.
            return;
        }
        let style = TextStyle::regular(24.0);
        let short = text.measure("Hi", &style);
        let long = text.measure("Hi there, paper", &style);
        assert!(short > 0.0, "shaped width {short}");
        assert!(long > short, "{long} vs {short}");

        let mut raster = Raster::new(400, 48, Color::WHITE);
        text.draw(&mut raster, "Hi there, paper", Point::new(10.0, 32.0), &style, Color::INK);
        let mut right = None;
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                if raster.pixel(x, y) != Some(Color::WHITE) {
                    right = right.max(Some(x));
                }
            }
        }
        let right = right.expect("glyphs were painted");
        assert!(
            f64::from(right) <= 10.0 + long + 2.0,
            "ink at {right} past measured width {long}"
        );
    }
}
