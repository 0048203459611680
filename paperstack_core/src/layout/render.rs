// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paints a [`LayoutResult`] into a full-document raster.

use kurbo::{Point, Rect};

use super::text::{TextBackend, TextStyle};
use super::{LayoutConfig, LayoutResult};
use crate::raster::{Color, Raster, ceil_px};

/// Renders the full document.
///
/// `decoded[n]` holds the pixels of the image with ordinal `n` once it has
/// loaded; images without pixels are drawn as a framed placeholder carrying
/// their alt text. The raster is `config.document_width` wide and tall enough
/// for `layout.total_height`.
#[must_use]
pub fn render<T: TextBackend + ?Sized>(
    layout: &LayoutResult,
    config: &LayoutConfig,
    decoded: &[Option<&Raster>],
    text: &T,
) -> Raster {
    let mut raster = Raster::new(
        px_extent(config.document_width),
        px_extent(layout.total_height),
        Color::WHITE,
    );

    for &y in &layout.rules {
        raster.fill_rect(
            Rect::new(
                config.margin,
                y - 0.5,
                config.document_width - config.margin,
                y + 0.5,
            ),
            Color::RULE,
        );
    }

    for image in &layout.images {
        match decoded.get(image.ordinal).copied().flatten() {
            Some(pixels) => raster.draw_scaled(pixels, image.rect),
            None => {
                raster.fill_rect(image.rect, Color::PLACEHOLDER);
                raster.stroke_rect(image.rect, Color::RULE);
                let style = TextStyle::regular(14.0);
                text.draw(
                    &mut raster,
                    &image.alt,
                    Point::new(image.rect.x0 + 12.0, image.rect.y0 + 24.0),
                    &style,
                    Color::RULE,
                );
            }
        }
    }

    for seg in &layout.segments {
        let color = if seg.is_link() { Color::LINK } else { Color::INK };
        text.draw(
            &mut raster,
            &seg.text,
            Point::new(seg.x, seg.y),
            &seg.style,
            color,
        );
        if seg.is_link() {
            raster.fill_rect(
                Rect::new(seg.x, seg.y + 2.0, seg.x + seg.width, seg.y + 3.0),
                Color::LINK,
            );
        }
    }

    raster
}

fn px_extent(v: f64) -> u32 {
    let px = ceil_px(v).clamp(1, i64::from(u32::MAX));
    #[expect(clippy::cast_possible_truncation, reason = "clamped to u32 range")]
    let px = px as u32;
    px
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BlockGlyphs, layout};
    use kurbo::Size;

    #[test]
    fn raster_matches_document_extent() {
        let config = LayoutConfig::standard().with_width(200.0);
        let out = layout("hello", &config, &[], &BlockGlyphs::default());
        let r = render(&out, &config, &[], &BlockGlyphs::default());
        assert_eq!(r.width(), 200);
        assert_eq!(i64::from(r.height()), ceil_px(out.total_height));
    }

    #[test]
    fn links_are_coloured_and_underlined() {
        let config = LayoutConfig::standard().with_width(400.0);
        let glyphs = BlockGlyphs::default();
        let out = layout("[go](https://x)", &config, &[], &glyphs);
        let r = render(&out, &config, &[], &glyphs);
        let seg = &out.segments[0];
        // Inside the first glyph box, just above the baseline.
        let (x, y) = (seg.x as u32 + 2, seg.y as u32 - 1);
        assert_eq!(r.pixel(x, y), Some(Color::LINK));
        // Underline sits two pixels below the baseline.
        assert_eq!(r.pixel(x, seg.y as u32 + 2), Some(Color::LINK));
    }

    #[test]
    fn decoded_images_replace_placeholders() {
        let config = LayoutConfig::standard().with_width(200.0);
        let glyphs = BlockGlyphs::default();
        let out = layout("![a](a.png)", &config, &[Some(Size::new(20.0, 20.0))], &glyphs);
        let rect = out.images[0].rect;
        let inside = (rect.x0 as u32 + 10, rect.y0 as u32 + 10);

        let pending = render(&out, &config, &[], &glyphs);
        assert_eq!(pending.pixel(inside.0, inside.1), Some(Color::PLACEHOLDER));

        let pixels = Raster::new(2, 2, Color::ERROR);
        let loaded = render(&out, &config, &[Some(&pixels)], &glyphs);
        assert_eq!(loaded.pixel(inside.0, inside.1), Some(Color::ERROR));
    }

    #[test]
    fn rules_span_the_content_width() {
        let config = LayoutConfig::standard().with_width(200.0);
        let out = layout("___", &config, &[], &BlockGlyphs::default());
        let r = render(&out, &config, &[], &BlockGlyphs::default());
        let y = out.rules[0] as u32;
        assert_eq!(r.pixel(40, y), Some(Color::RULE));
        assert_eq!(r.pixel(159, y), Some(Color::RULE));
        assert_eq!(r.pixel(20, y), Some(Color::WHITE));
    }
}
