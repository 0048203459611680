// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Projection of document layout into the interactive overlay layer.
//!
//! The overlay mirrors each paper's rasterized content with selectable text,
//! links, and images positioned over the surface's on-screen footprint. To
//! keep the two layers from drifting, overlay content is never built by
//! hand: [`project`] derives an [`OverlayContent`] tree from the same
//! [`LayoutResult`] that was rendered into the raster.
//!
//! The viewer queues [`OverlayUpdate`]s synchronously with every scroll and
//! reflow; the host drains them into its [`OverlaySync`] implementation
//! once per frame.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::layout::{LayoutConfig, LayoutResult, TextStyle};
use crate::paper::PaperId;

/// One node of the overlay tree, in full-raster pixel space.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayNode {
    /// A positioned word.
    Text {
        /// The word.
        text: String,
        /// Left edge.
        x: f64,
        /// Baseline.
        y: f64,
        /// Measured width.
        width: f64,
        /// Font.
        style: TextStyle,
        /// Link target, if any.
        link: Option<String>,
    },
    /// An image box.
    Image {
        /// Image locator.
        url: String,
        /// Alt text.
        alt: String,
        /// Placed bounds.
        rect: Rect,
    },
    /// A horizontal rule.
    Rule {
        /// Left end.
        x0: f64,
        /// Right end.
        x1: f64,
        /// Vertical position.
        y: f64,
    },
    /// A page with no text structure (first-page renders, title pages).
    Page {
        /// Page bounds.
        rect: Rect,
    },
}

/// Overlay tree for one paper.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayContent {
    /// Document width.
    pub width: f64,
    /// Document height.
    pub height: f64,
    /// Nodes in paint order.
    pub nodes: Vec<OverlayNode>,
}

/// Builds the overlay tree for a laid-out document.
#[must_use]
pub fn project(layout: &LayoutResult, config: &LayoutConfig) -> OverlayContent {
    let mut nodes = Vec::with_capacity(
        layout.rules.len() + layout.images.len() + layout.segments.len(),
    );
    nodes.extend(layout.rules.iter().map(|&y| OverlayNode::Rule {
        x0: config.margin,
        x1: config.document_width - config.margin,
        y,
    }));
    nodes.extend(layout.images.iter().map(|i| OverlayNode::Image {
        url: i.url.clone(),
        alt: i.alt.clone(),
        rect: i.rect,
    }));
    nodes.extend(layout.segments.iter().map(|s| OverlayNode::Text {
        text: s.text.clone(),
        x: s.x,
        y: s.y,
        width: s.width,
        style: s.style,
        link: s.link.clone(),
    }));
    OverlayContent {
        width: config.document_width,
        height: layout.total_height,
        nodes,
    }
}

/// Builds the overlay tree for a page without layout.
#[must_use]
pub fn project_page(size: Size) -> OverlayContent {
    OverlayContent {
        width: size.width,
        height: size.height,
        nodes: alloc::vec![OverlayNode::Page {
            rect: size.to_rect(),
        }],
    }
}

/// Host-side interactive overlay layer.
pub trait OverlaySync {
    /// Creates or replaces the overlay for `paper`.
    fn register_overlay(
        &mut self,
        paper: PaperId,
        content: &OverlayContent,
        viewport: Size,
        content_height: f64,
    );

    /// Moves the overlay's visible window.
    fn set_scroll_offset(&mut self, paper: PaperId, offset: f64);

    /// Resizes the overlay's scrollable extent.
    fn update_content_height(&mut self, paper: PaperId, height: f64);
}

/// An overlay layer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOverlay;

impl OverlaySync for NoOverlay {
    fn register_overlay(&mut self, _: PaperId, _: &OverlayContent, _: Size, _: f64) {}
    fn set_scroll_offset(&mut self, _: PaperId, _: f64) {}
    fn update_content_height(&mut self, _: PaperId, _: f64) {}
}

/// A queued overlay change.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayUpdate {
    /// See [`OverlaySync::register_overlay`].
    Register {
        /// Paper.
        paper: PaperId,
        /// Projected content.
        content: OverlayContent,
        /// Viewport size in pixels.
        viewport: Size,
        /// Document height in pixels.
        content_height: f64,
    },
    /// See [`OverlaySync::set_scroll_offset`].
    ScrollOffset {
        /// Paper.
        paper: PaperId,
        /// New offset.
        offset: f64,
    },
    /// See [`OverlaySync::update_content_height`].
    ContentHeight {
        /// Paper.
        paper: PaperId,
        /// New height.
        height: f64,
    },
}

impl OverlayUpdate {
    /// Forwards this update to `sink`.
    pub fn apply(&self, sink: &mut dyn OverlaySync) {
        match self {
            Self::Register {
                paper,
                content,
                viewport,
                content_height,
            } => sink.register_overlay(*paper, content, *viewport, *content_height),
            Self::ScrollOffset { paper, offset } => sink.set_scroll_offset(*paper, *offset),
            Self::ContentHeight { paper, height } => sink.update_content_height(*paper, *height),
        }
    }
}

/// Ordered overlay updates waiting for the next sync.
///
/// Back-to-back offset updates for the same paper collapse into the latest
/// one; everything else is kept in order.
#[derive(Clone, Debug, Default)]
pub struct OverlayQueue {
    updates: Vec<OverlayUpdate>,
}

impl OverlayQueue {
    /// Appends an update.
    pub fn push(&mut self, update: OverlayUpdate) {
        if let (
            Some(OverlayUpdate::ScrollOffset { paper: last, offset }),
            OverlayUpdate::ScrollOffset {
                paper,
                offset: next,
            },
        ) = (self.updates.last_mut(), &update)
        {
            if *last == *paper {
                *offset = *next;
                return;
            }
        }
        self.updates.push(update);
    }

    /// Number of queued updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Applies and clears every queued update. Returns how many ran.
    pub fn drain_into(&mut self, sink: &mut dyn OverlaySync) -> usize {
        let n = self.updates.len();
        for update in self.updates.drain(..) {
            update.apply(sink);
        }
        n
    }
}
