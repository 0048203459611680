// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loaded paper surfaces.
//!
//! A [`DocumentSurface`] is the per-paper resource created on first load: a
//! [`ScrollableRaster`] plus, for markdown papers, the source, the current
//! [`LayoutResult`], and one [`ImageSlot`] per image line. Static pages
//! (first-page renders, title and error pages) carry no layout.
//!
//! Image metrics arrive asynchronously. Every resolved size re-runs the full
//! layout and hands the new full raster to
//! [`ScrollableRaster::on_content_reflow`]. Images that miss their deadline
//! keep the estimated height for good; anything delivered for them later is
//! dropped.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;

use crate::layout::{
    ImageRef, LayoutConfig, LayoutResult, LinkRegion, TextBackend, image_refs, layout, render,
};
use crate::loader::{AssetError, DecodedImage};
use crate::raster::Raster;
use crate::scroll::{ContentReflow, ScrollConfig, ScrollableRaster};
use crate::time::{Duration, HostTime};

/// Load state of one image line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageSlot {
    /// Waiting for metrics until `deadline`.
    Pending {
        /// When the estimate becomes permanent.
        deadline: HostTime,
    },
    /// Real size known.
    Resolved(Size),
    /// Timed out, failed, or decoded without dimensions.
    Estimated,
}

/// How a resolved image changed the document.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    /// The slot was not pending (unknown ordinal, already settled, or timed
    /// out); nothing changed.
    Ignored,
    /// The image failed or had no size; its estimate is now permanent.
    Settled,
    /// The image resolved and the document was laid out again.
    Reflowed(ContentReflow),
}

#[derive(Debug)]
struct Markdown {
    source: String,
    config: LayoutConfig,
    refs: Vec<ImageRef>,
    slots: Vec<ImageSlot>,
    pixels: Vec<Option<Raster>>,
    layout: LayoutResult,
}

impl Markdown {
    fn metrics(&self) -> Vec<Option<Size>> {
        self.slots
            .iter()
            .map(|s| match s {
                ImageSlot::Resolved(size) => Some(*size),
                _ => None,
            })
            .collect()
    }

    fn render(&self, text: &dyn TextBackend) -> Raster {
        let decoded: Vec<Option<&Raster>> = self.pixels.iter().map(Option::as_ref).collect();
        render(&self.layout, &self.config, &decoded, text)
    }
}

/// Raster, scroll state, and (for markdown) layout of one loaded paper.
#[derive(Debug)]
pub struct DocumentSurface {
    markdown: Option<Markdown>,
    scroll: ScrollableRaster,
    relayouts: u32,
}

impl DocumentSurface {
    /// Lays out and renders a markdown document.
    ///
    /// Every image line starts [`Pending`](ImageSlot::Pending) with a deadline
    /// of `now + image_timeout`.
    #[must_use]
    pub fn markdown(
        source: String,
        layout_config: LayoutConfig,
        scroll_config: ScrollConfig,
        now: HostTime,
        image_timeout: Duration,
        text: &dyn TextBackend,
    ) -> Self {
        let refs = image_refs(&source);
        let deadline = now + image_timeout;
        let slots = refs
            .iter()
            .map(|_| ImageSlot::Pending { deadline })
            .collect();
        let pixels = refs.iter().map(|_| None).collect();
        let result = layout(&source, &layout_config, &[], text);
        let md = Markdown {
            source,
            config: layout_config,
            refs,
            slots,
            pixels,
            layout: result,
        };
        let full = md.render(text);
        Self {
            markdown: Some(md),
            scroll: ScrollableRaster::new(full, scroll_config),
            relayouts: 0,
        }
    }

    /// Wraps a finished page (first-page render, title, or error page).
    #[must_use]
    pub fn static_page(page: Raster, scroll_config: ScrollConfig) -> Self {
        Self {
            markdown: None,
            scroll: ScrollableRaster::new(page, scroll_config),
            relayouts: 0,
        }
    }

    /// Scroll state and rasters.
    #[must_use]
    pub fn scroll(&self) -> &ScrollableRaster {
        &self.scroll
    }

    /// Mutable scroll state.
    #[must_use]
    pub fn scroll_mut(&mut self) -> &mut ScrollableRaster {
        &mut self.scroll
    }

    /// Current layout, for markdown papers.
    #[must_use]
    pub fn layout(&self) -> Option<&LayoutResult> {
        self.markdown.as_ref().map(|m| &m.layout)
    }

    /// Markdown source, for markdown papers.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.markdown.as_ref().map(|m| m.source.as_str())
    }

    /// Link regions of the current layout.
    #[must_use]
    pub fn links(&self) -> &[LinkRegion] {
        self.markdown.as_ref().map_or(&[], |m| &m.layout.links)
    }

    /// Image references in ordinal order.
    #[must_use]
    pub fn images(&self) -> &[ImageRef] {
        self.markdown.as_ref().map_or(&[], |m| &m.refs)
    }

    /// Load state of the image with `ordinal`.
    #[must_use]
    pub fn image_slot(&self, ordinal: usize) -> Option<ImageSlot> {
        self.markdown.as_ref()?.slots.get(ordinal).copied()
    }

    /// Decoded pixels of the image with `ordinal`, once resolved.
    #[must_use]
    pub fn image_pixels(&self, ordinal: usize) -> Option<&Raster> {
        self.markdown.as_ref()?.pixels.get(ordinal)?.as_ref()
    }

    /// Number of images still waiting for metrics.
    #[must_use]
    pub fn pending_images(&self) -> usize {
        self.markdown.as_ref().map_or(0, |m| {
            m.slots
                .iter()
                .filter(|s| matches!(s, ImageSlot::Pending { .. }))
                .count()
        })
    }

    /// Number of re-layouts since load.
    #[must_use]
    pub fn relayout_count(&self) -> u32 {
        self.relayouts
    }

    /// Delivers the result of an image request.
    ///
    /// Only pending slots accept results. A decoded image with a real size
    /// resolves the slot and re-runs layout; failures and zero-sized images
    /// keep the estimate.
    pub fn resolve_image(
        &mut self,
        ordinal: usize,
        result: Result<DecodedImage, AssetError>,
        text: &dyn TextBackend,
    ) -> ImageOutcome {
        let Some(md) = self.markdown.as_mut() else {
            return ImageOutcome::Ignored;
        };
        let Some(slot) = md.slots.get_mut(ordinal) else {
            return ImageOutcome::Ignored;
        };
        if !matches!(slot, ImageSlot::Pending { .. }) {
            return ImageOutcome::Ignored;
        }
        match result {
            Ok(image) if !image.is_empty() => {
                let raster = image.into_raster();
                *slot = ImageSlot::Resolved(Size::new(
                    f64::from(raster.width()),
                    f64::from(raster.height()),
                ));
                md.pixels[ordinal] = Some(raster);
                ImageOutcome::Reflowed(self.relayout(text))
            }
            _ => {
                *slot = ImageSlot::Estimated;
                ImageOutcome::Settled
            }
        }
    }

    /// Settles every pending image whose deadline is at or before `now`.
    ///
    /// Returns the ordinals that timed out. The estimate was already in
    /// effect, so no re-layout is needed.
    pub fn expire(&mut self, now: HostTime) -> Vec<usize> {
        let Some(md) = self.markdown.as_mut() else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        for (ordinal, slot) in md.slots.iter_mut().enumerate() {
            if let ImageSlot::Pending { deadline } = *slot {
                if deadline <= now {
                    *slot = ImageSlot::Estimated;
                    expired.push(ordinal);
                }
            }
        }
        expired
    }

    fn relayout(&mut self, text: &dyn TextBackend) -> ContentReflow {
        let full = match self.markdown.as_mut() {
            Some(md) => {
                let metrics = md.metrics();
                md.layout = layout(&md.source, &md.config, &metrics, text);
                md.render(text)
            }
            None => self.scroll.full().clone(),
        };
        self.relayouts += 1;
        self.scroll.on_content_reflow(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BlockGlyphs;
    use crate::raster::Color;
    use alloc::vec;

    const SOURCE: &str = "# Doc\nintro\n![a](a.png)\n[tail link](https://t)\n![b](b.png)";

    fn surface() -> DocumentSurface {
        DocumentSurface::markdown(
            String::from(SOURCE),
            LayoutConfig::standard().with_width(200.0),
            ScrollConfig {
                viewport_width: 200,
                viewport_height: 100,
                ..ScrollConfig::letter()
            },
            HostTime(0),
            Duration::from_millis(500),
            &BlockGlyphs::default(),
        )
    }

    fn image(w: u32, h: u32) -> DecodedImage {
        DecodedImage::from_raster(Raster::new(w, h, Color::LINK))
    }

    #[test]
    fn starts_with_pending_estimates() {
        let s = surface();
        assert_eq!(s.images().len(), 2);
        assert_eq!(s.pending_images(), 2);
        assert!(s.layout().unwrap().images.iter().all(|i| i.estimated));
        assert!(s.scroll().is_scrollable());
    }

    #[test]
    fn resolving_reflows_everything_below() {
        let mut s = surface();
        let link_before = s.links()[0].rect;
        let outcome = s.resolve_image(0, Ok(image(40, 10)), &BlockGlyphs::default());
        let ImageOutcome::Reflowed(reflow) = outcome else {
            panic!("expected reflow, got {outcome:?}");
        };
        assert_eq!(s.relayout_count(), 1);
        assert_eq!(reflow.height, s.scroll().full().height());
        assert!(s.links()[0].rect.y0 < link_before.y0, "link moved up");
        assert_eq!(s.image_slot(0), Some(ImageSlot::Resolved(Size::new(40.0, 10.0))));
        assert!(s.image_pixels(0).is_some());
    }

    #[test]
    fn failures_keep_the_estimate() {
        let mut s = surface();
        let err = AssetError::Decode {
            locator: "b.png".into(),
        };
        assert_eq!(
            s.resolve_image(1, Err(err), &BlockGlyphs::default()),
            ImageOutcome::Settled
        );
        assert_eq!(s.image_slot(1), Some(ImageSlot::Estimated));
        assert_eq!(
            s.resolve_image(0, Ok(image(0, 0)), &BlockGlyphs::default()),
            ImageOutcome::Settled
        );
        assert_eq!(s.relayout_count(), 0);
    }

    #[test]
    fn late_results_are_dropped_after_timeout() {
        let mut s = surface();
        assert!(s.expire(HostTime::from_millis(499)).is_empty());
        assert_eq!(s.expire(HostTime::from_millis(500)), vec![0, 1]);
        assert_eq!(s.pending_images(), 0);
        assert_eq!(
            s.resolve_image(0, Ok(image(40, 10)), &BlockGlyphs::default()),
            ImageOutcome::Ignored
        );
        assert!(s.layout().unwrap().images[0].estimated);
    }

    #[test]
    fn reflow_clamps_scroll_when_document_shrinks() {
        let mut s = surface();
        let max = s.scroll().max_scroll();
        s.scroll_mut().set_scroll_offset(max);
        let ImageOutcome::Reflowed(reflow) =
            s.resolve_image(0, Ok(image(20, 5)), &BlockGlyphs::default())
        else {
            panic!("expected reflow");
        };
        assert!(reflow.clamped);
        assert_eq!(reflow.offset, s.scroll().max_scroll());
    }

    #[test]
    fn static_pages_have_no_layout() {
        let mut s =
            DocumentSurface::static_page(Raster::new(10, 10, Color::WHITE), ScrollConfig::letter());
        assert!(s.layout().is_none());
        assert!(s.links().is_empty());
        assert_eq!(
            s.resolve_image(0, Ok(image(1, 1)), &BlockGlyphs::default()),
            ImageOutcome::Ignored
        );
    }
}
