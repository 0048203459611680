// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document layout for fixed-width, unbounded-height rasters.
//!
//! [`layout`] is a pure function of the source text, a [`LayoutConfig`], the
//! image metrics known so far, and a [`TextBackend`]. It scans the source
//! line by line:
//!
//! - blank lines advance by [`LayoutConfig::blank_gap`];
//! - a line of three or more identical `-`, `*`, or `_` records a rule;
//! - a line that is exactly `![alt](url)` places an image, sized from the
//!   metrics entry with the same *ordinal* (n-th image line in the source),
//!   or from [`LayoutConfig::estimated_aspect`] while that entry is unknown;
//! - anything else is a heading (`#` to `####`), a bullet (`- `, `* `, `+ `)
//!   or a paragraph, classified by [`BlockKind`], parsed for inline
//!   emphasis and links, and greedily wrapped into positioned [`Segment`]s.
//!
//! When an image's real size arrives, callers re-run [`layout`] from scratch:
//! every position below that image may move, so a [`LayoutResult`] is
//! replaced, never patched. Everything above the first changed image comes
//! out identical because the scan is sequential and deterministic.
//!
//! Content that cannot fit (a single word wider than the usable width)
//! overflows the raster; that is accepted, not reported.

#[cfg(feature = "cosmic_text")]
mod cosmic;
mod inline;
mod render;
mod text;
mod wrap;

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Rect, Size};

pub use inline::{InlineRun, parse_inline};
pub use render::render;
pub use text::{BlockGlyphs, TextBackend, TextStyle};

#[cfg(feature = "cosmic_text")]
pub use cosmic::CosmicText;

use wrap::{LineFrame, wrap_runs};

/// Geometry and spacing constants for one document width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Width of the full raster in pixels.
    pub document_width: f64,
    /// Margin on all four sides.
    pub margin: f64,
    /// Vertical advance for a blank source line.
    pub blank_gap: f64,
    /// Vertical advance for a rule line; the rule sits in the middle.
    pub rule_gap: f64,
    /// Gap below each image.
    pub image_gap: f64,
    /// Width / height ratio assumed for images whose size is unknown.
    pub estimated_aspect: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Link hit band above the baseline.
    pub link_band_above: f64,
    /// Link hit band below the baseline.
    pub link_band_below: f64,
}

impl LayoutConfig {
    /// Letter-ish proportions at 800 px wide.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            document_width: 800.0,
            margin: 40.0,
            blank_gap: 12.0,
            rule_gap: 24.0,
            image_gap: 16.0,
            estimated_aspect: 16.0 / 9.0,
            line_height: 1.4,
            link_band_above: 16.0,
            link_band_below: 6.0,
        }
    }

    /// Same spacing at a different document width.
    #[must_use]
    pub const fn with_width(self, document_width: f64) -> Self {
        Self {
            document_width,
            ..self
        }
    }

    /// Width available to content between the side margins.
    #[must_use]
    pub fn usable_width(&self) -> f64 {
        (self.document_width - 2.0 * self.margin).max(0.0)
    }

    /// Display size of an image and whether it is an estimate.
    ///
    /// Known sizes are scaled down (never up) to the usable width. Missing or
    /// degenerate sizes fall back to the full usable width at
    /// [`estimated_aspect`](Self::estimated_aspect).
    #[must_use]
    pub fn image_size(&self, natural: Option<Size>) -> (Size, bool) {
        let usable = self.usable_width();
        match natural {
            Some(n) if n.width > 0.0 && n.height > 0.0 => {
                let w = n.width.min(usable);
                (Size::new(w, n.height * w / n.width), false)
            }
            _ => (Size::new(usable, usable / self.estimated_aspect), true),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Block classes and their fixed typography.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Heading level 1–4.
    Heading(u8),
    /// Bulleted list item.
    Bullet,
    /// Body paragraph.
    Paragraph,
}

/// Typography for one [`BlockKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockStyle {
    /// Font size in pixels.
    pub size: f64,
    /// Bold weight for the whole block.
    pub bold: bool,
    /// Extra left indent.
    pub indent: f64,
    /// Vertical space after the block.
    pub spacing_after: f64,
}

const HEADINGS: [BlockStyle; 4] = [
    BlockStyle {
        size: 30.0,
        bold: true,
        indent: 0.0,
        spacing_after: 14.0,
    },
    BlockStyle {
        size: 24.0,
        bold: true,
        indent: 0.0,
        spacing_after: 12.0,
    },
    BlockStyle {
        size: 20.0,
        bold: true,
        indent: 0.0,
        spacing_after: 10.0,
    },
    BlockStyle {
        size: 17.0,
        bold: true,
        indent: 0.0,
        spacing_after: 8.0,
    },
];

impl BlockKind {
    /// Returns the fixed typography for this block class.
    #[must_use]
    pub const fn style(self) -> BlockStyle {
        match self {
            Self::Heading(level) => {
                let i = if level == 0 {
                    0
                } else if level > 4 {
                    3
                } else {
                    level as usize - 1
                };
                HEADINGS[i]
            }
            Self::Bullet => BlockStyle {
                size: 16.0,
                bold: false,
                indent: 24.0,
                spacing_after: 6.0,
            },
            Self::Paragraph => BlockStyle {
                size: 16.0,
                bold: false,
                indent: 0.0,
                spacing_after: 10.0,
            },
        }
    }
}

/// One positioned word.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// The word.
    pub text: String,
    /// Left edge in full-raster pixels.
    pub x: f64,
    /// Baseline in full-raster pixels.
    pub y: f64,
    /// Measured advance width.
    pub width: f64,
    /// Font used to measure and draw the word.
    pub style: TextStyle,
    /// Link target, for words inside a link.
    pub link: Option<String>,
}

impl Segment {
    /// Whether this word belongs to a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }
}

/// One placed image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePlacement {
    /// Position of this image among the source's image lines.
    pub ordinal: usize,
    /// Image locator from the source.
    pub url: String,
    /// Alt text from the source.
    pub alt: String,
    /// Placed bounds in full-raster pixels.
    pub rect: Rect,
    /// Whether the height comes from the aspect estimate.
    pub estimated: bool,
}

/// A clickable link area in full-raster pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkRegion {
    /// Link target.
    pub url: String,
    /// Bounds: the words' horizontal extent and a fixed band around the
    /// baseline.
    pub rect: Rect,
}

/// Output of one layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
    /// Positioned words, in reading order.
    pub segments: Vec<Segment>,
    /// Placed images, in source order.
    pub images: Vec<ImagePlacement>,
    /// Y coordinates of horizontal rules.
    pub rules: Vec<f64>,
    /// Link regions, in reading order.
    pub links: Vec<LinkRegion>,
    /// Total document height including the bottom margin.
    pub total_height: f64,
}

/// An image reference found in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// Position among the source's image lines.
    pub ordinal: usize,
    /// Image locator.
    pub url: String,
    /// Alt text.
    pub alt: String,
}

enum SourceLine<'a> {
    Blank,
    Rule,
    Image { alt: &'a str, url: &'a str },
    Text { kind: BlockKind, body: &'a str },
}

fn classify(raw: &str) -> SourceLine<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return SourceLine::Blank;
    }
    if is_rule(line) {
        return SourceLine::Rule;
    }
    if let Some((alt, url)) = split_image(line) {
        return SourceLine::Image { alt, url };
    }
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=4).contains(&hashes) {
        if let Some(body) = line[hashes..].strip_prefix(' ') {
            #[expect(clippy::cast_possible_truncation, reason = "at most 4")]
            let level = hashes as u8;
            return SourceLine::Text {
                kind: BlockKind::Heading(level),
                body: body.trim_start(),
            };
        }
    }
    for marker in ["- ", "* ", "+ "] {
        if let Some(body) = line.strip_prefix(marker) {
            return SourceLine::Text {
                kind: BlockKind::Bullet,
                body: body.trim_start(),
            };
        }
    }
    SourceLine::Text {
        kind: BlockKind::Paragraph,
        body: line,
    }
}

fn is_rule(line: &str) -> bool {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && line.len() >= 3 && chars.all(|c| c == first)
}

fn split_image(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix("![")?;
    let close = body.find("](")?;
    let url = body[close + 2..].strip_suffix(')')?;
    if url.is_empty() || url.contains(')') {
        return None;
    }
    Some((&body[..close], url))
}

/// Lists the image references of `source` in ordinal order.
#[must_use]
pub fn image_refs(source: &str) -> Vec<ImageRef> {
    source
        .lines()
        .filter_map(|raw| match classify(raw) {
            SourceLine::Image { alt, url } => Some((alt, url)),
            _ => None,
        })
        .enumerate()
        .map(|(ordinal, (alt, url))| ImageRef {
            ordinal,
            url: String::from(url),
            alt: String::from(alt),
        })
        .collect()
}

/// Lays out `source` at `config.document_width`.
///
/// `metrics[n]` is the natural size of the n-th image line, or `None` while
/// it is unknown (or permanently unknown after a failed or timed-out load).
#[must_use]
pub fn layout<T: TextBackend + ?Sized>(
    source: &str,
    config: &LayoutConfig,
    metrics: &[Option<Size>],
    text: &T,
) -> LayoutResult {
    let mut out = LayoutResult::default();
    let mut y = config.margin;
    let mut ordinal = 0;

    for raw in source.lines() {
        match classify(raw) {
            SourceLine::Blank => y += config.blank_gap,
            SourceLine::Rule => {
                out.rules.push(y + config.rule_gap / 2.0);
                y += config.rule_gap;
            }
            SourceLine::Image { alt, url } => {
                let natural = metrics.get(ordinal).copied().flatten();
                let (size, estimated) = config.image_size(natural);
                out.images.push(ImagePlacement {
                    ordinal,
                    url: String::from(url),
                    alt: String::from(alt),
                    rect: Rect::from_origin_size((config.margin, y), size),
                    estimated,
                });
                ordinal += 1;
                y += size.height + config.image_gap;
            }
            SourceLine::Text { kind, body } => {
                let block = kind.style();
                let base = TextStyle {
                    size: block.size,
                    bold: block.bold,
                    italic: false,
                };
                let frame = LineFrame {
                    left: config.margin + block.indent,
                    usable: (config.usable_width() - block.indent).max(0.0),
                    line_height: block.size * config.line_height,
                    ascent: block.size,
                    band_above: config.link_band_above,
                    band_below: config.link_band_below,
                };
                if kind == BlockKind::Bullet {
                    let marker = "\u{2022}";
                    out.segments.push(Segment {
                        text: String::from(marker),
                        x: config.margin + block.indent * 0.4,
                        y: y + frame.ascent,
                        width: text.measure(marker, &base),
                        style: base,
                        link: None,
                    });
                }
                let runs = parse_inline(body);
                y = wrap_runs(&runs, base, &frame, y, text, &mut out);
                y += block.spacing_after;
            }
        }
    }

    out.total_height = y + config.margin;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn run(source: &str, metrics: &[Option<Size>]) -> LayoutResult {
        layout(
            source,
            &LayoutConfig::standard(),
            metrics,
            &BlockGlyphs::default(),
        )
    }

    #[test]
    fn classifies_blocks() {
        let out = run("# Title\n\n## Sub\n- item\nplain text", &[]);
        let sizes: Vec<f64> = out.segments.iter().map(|s| s.style.size).collect();
        // Title, Sub, bullet marker, item, plain, text.
        assert_eq!(sizes, [30.0, 24.0, 16.0, 16.0, 16.0, 16.0]);
        assert!(out.segments[0].style.bold);
        assert_eq!(out.segments[2].text, "\u{2022}");
        assert_eq!(out.segments[3].x, 40.0 + 24.0, "bullet text is indented");
    }

    #[test]
    fn rules_and_blank_gaps() {
        let out = run("\n---\n***\n", &[]);
        // margin 40, blank 12, rules at 52+12 and 76+12.
        assert_eq!(out.rules, [64.0, 88.0]);
        assert_eq!(out.total_height, 40.0 + 12.0 + 24.0 + 24.0 + 40.0);
    }

    #[test]
    fn short_separators_are_text() {
        let out = run("--", &[]);
        assert!(out.rules.is_empty());
        assert_eq!(out.segments.len(), 1);
    }

    #[test]
    fn images_use_estimate_until_metrics_arrive() {
        let src = "![a](one.png)\n![b](two.png)";
        let estimated = run(src, &[]);
        assert_eq!(estimated.images.len(), 2);
        assert!(estimated.images.iter().all(|i| i.estimated));
        assert_eq!(estimated.images[0].rect.height(), 720.0 / (16.0 / 9.0));

        let known = run(src, &[None, Some(Size::new(200.0, 100.0))]);
        assert!(known.images[0].estimated);
        assert!(!known.images[1].estimated);
        assert_eq!(known.images[1].rect.size(), Size::new(200.0, 100.0));
    }

    #[test]
    fn wide_images_scale_to_usable_width() {
        let out = run("![w](wide.png)", &[Some(Size::new(1440.0, 720.0))]);
        assert_eq!(out.images[0].rect.size(), Size::new(720.0, 360.0));
    }

    #[test]
    fn zero_sized_metrics_keep_estimate() {
        let out = run("![z](zero.png)", &[Some(Size::ZERO)]);
        assert!(out.images[0].estimated);
    }

    #[test]
    fn duplicate_image_refs_match_by_ordinal() {
        let src = "![x](same.png)\ntext\n![x](same.png)";
        let out = run(src, &[Some(Size::new(100.0, 10.0)), Some(Size::new(100.0, 50.0))]);
        assert_eq!(out.images[0].rect.height(), 10.0);
        assert_eq!(out.images[1].rect.height(), 50.0);
        let refs = image_refs(src);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].ordinal, 1);
    }

    #[test]
    fn reflow_keeps_prefix_above_image() {
        let src = "# Head\nintro [link](https://a) words\n![i](i.png)\nafter image\n---";
        let before = run(src, &[]);
        let after = run(src, &[Some(Size::new(300.0, 30.0))]);
        let image_top = before.images[0].rect.y0;
        for (a, b) in before.segments.iter().zip(&after.segments) {
            if a.y < image_top {
                assert_eq!(a, b, "content above the image must not move");
            }
        }
        assert_eq!(before.links, after.links, "link is above the image");
        assert!(after.total_height < before.total_height);
        assert!(after.rules[0] < before.rules[0], "rule below moved up");
    }

    #[test]
    fn wrapped_words_stay_inside_right_margin() {
        let config = LayoutConfig::standard().with_width(300.0);
        let words = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
        let src = vec![words; 3].join(" ");
        let out = layout(&src, &config, &[], &BlockGlyphs::default());
        let right = config.document_width - config.margin;
        assert!(out.segments.len() > 4);
        for s in &out.segments {
            assert!(s.x + s.width <= right, "{:?} overflows {right}", s);
        }
    }

    #[test]
    fn empty_source_is_just_margins() {
        let out = run("", &[]);
        assert!(out.segments.is_empty());
        assert_eq!(out.total_height, 80.0);
    }
}
