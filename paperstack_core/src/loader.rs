// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asset-loading seam and placeholder pages.
//!
//! Fetching and decoding are owned by the host. [`AssetLoader`] is the
//! synchronous half (text and first-page renders arrive before a paper is
//! shown); images are *requested* through it and delivered later with
//! [`PaperViewer::resolve_image`](crate::viewer::PaperViewer::resolve_image).
//!
//! Load failures never propagate past the viewer: they are reported to the
//! trace sink and replaced by an [`error_page`].

use alloc::format;
use alloc::string::String;

use crate::layout::{LayoutConfig, TextBackend, layout, render};
use crate::paper::PaperId;
use crate::raster::Raster;

/// Why an asset could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// The transport failed.
    #[error("network error loading {locator}: {reason}")]
    Network {
        /// What was requested.
        locator: String,
        /// Transport-level description.
        reason: String,
    },
    /// The bytes arrived but could not be decoded.
    #[error("could not decode {locator}")]
    Decode {
        /// What was requested.
        locator: String,
    },
    /// Nothing exists at the locator.
    #[error("no asset at {locator}")]
    Missing {
        /// What was requested.
        locator: String,
    },
}

/// Coarse classification of an [`AssetError`], for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetErrorKind {
    /// See [`AssetError::Network`].
    Network,
    /// See [`AssetError::Decode`].
    Decode,
    /// See [`AssetError::Missing`].
    Missing,
}

impl AssetError {
    /// Returns the coarse error class.
    #[must_use]
    pub fn kind(&self) -> AssetErrorKind {
        match self {
            Self::Network { .. } => AssetErrorKind::Network,
            Self::Decode { .. } => AssetErrorKind::Decode,
            Self::Missing { .. } => AssetErrorKind::Missing,
        }
    }

    /// Returns the locator that failed.
    #[must_use]
    pub fn locator(&self) -> &str {
        match self {
            Self::Network { locator, .. }
            | Self::Decode { locator }
            | Self::Missing { locator } => locator,
        }
    }
}

/// A decoded image.
///
/// A zero-sized image is valid: it means the decoder gave up without
/// dimensions, and layout keeps the estimate for that image permanently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    raster: Raster,
}

impl DecodedImage {
    /// Wraps RGBA8 pixels, checking the buffer length.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Decode`] when `rgba.len() != width * height * 4`.
    pub fn from_rgba(
        locator: &str,
        width: u32,
        height: u32,
        rgba: alloc::vec::Vec<u8>,
    ) -> Result<Self, AssetError> {
        Raster::from_rgba(width, height, rgba)
            .map(|raster| Self { raster })
            .ok_or_else(|| AssetError::Decode {
                locator: String::from(locator),
            })
    }

    /// Wraps an already decoded raster.
    #[must_use]
    pub fn from_raster(raster: Raster) -> Self {
        Self { raster }
    }

    /// Whether the decoder produced no dimensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raster.width() == 0 || self.raster.height() == 0
    }

    /// The pixels.
    #[must_use]
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Consumes `self`, returning the pixels.
    #[must_use]
    pub fn into_raster(self) -> Raster {
        self.raster
    }
}

/// Host-provided asset access.
pub trait AssetLoader {
    /// Fetches a text document.
    ///
    /// # Errors
    ///
    /// Any transport or lookup failure.
    fn fetch_text(&mut self, locator: &str) -> Result<String, AssetError>;

    /// Renders the first page of a non-markdown document.
    ///
    /// # Errors
    ///
    /// Any transport, lookup, or decode failure.
    fn render_document_first_page(&mut self, locator: &str) -> Result<Raster, AssetError>;

    /// Starts decoding an image for `paper`.
    ///
    /// The result is delivered later through
    /// [`PaperViewer::resolve_image`](crate::viewer::PaperViewer::resolve_image)
    /// with the same `paper` and `ordinal`. Results that arrive after the
    /// image's timeout are ignored.
    fn request_image(&mut self, paper: PaperId, ordinal: usize, url: &str);
}

/// A loader with no assets; every request fails with [`AssetError::Missing`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetLoader for NoAssets {
    fn fetch_text(&mut self, locator: &str) -> Result<String, AssetError> {
        Err(AssetError::Missing {
            locator: String::from(locator),
        })
    }

    fn render_document_first_page(&mut self, locator: &str) -> Result<Raster, AssetError> {
        Err(AssetError::Missing {
            locator: String::from(locator),
        })
    }

    fn request_image(&mut self, _paper: PaperId, _ordinal: usize, _url: &str) {}
}

/// Renders the page shown when a paper failed to load.
#[must_use]
pub fn error_page(
    config: &LayoutConfig,
    display_name: &str,
    error: &AssetError,
    text: &dyn TextBackend,
) -> Raster {
    let source = format!("## {display_name}\n\n**Could not load this paper.**\n\n{error}");
    let out = layout(&source, config, &[], text);
    render(&out, config, &[], text)
}

/// Renders the title page used for `placeholder` papers.
#[must_use]
pub fn title_page(config: &LayoutConfig, display_name: &str, text: &dyn TextBackend) -> Raster {
    let source = format!("# {display_name}");
    let out = layout(&source, config, &[], text);
    render(&out, config, &[], text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BlockGlyphs;
    use crate::raster::Color;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn error_messages_name_the_locator() {
        let e = AssetError::Network {
            locator: "https://x/a.md".into(),
            reason: "reset".into(),
        };
        assert_eq!(e.to_string(), "network error loading https://x/a.md: reset");
        assert_eq!(e.kind(), AssetErrorKind::Network);
        assert_eq!(e.locator(), "https://x/a.md");
    }

    #[test]
    fn decoded_image_checks_length() {
        assert!(DecodedImage::from_rgba("i", 2, 1, vec![0; 8]).is_ok());
        let err = DecodedImage::from_rgba("i", 2, 1, vec![0; 7]).unwrap_err();
        assert_eq!(err.kind(), AssetErrorKind::Decode);
        assert!(DecodedImage::from_rgba("i", 0, 0, vec![]).unwrap().is_empty());
    }

    #[test]
    fn error_page_draws_error_text() {
        let config = LayoutConfig::standard().with_width(400.0);
        let e = AssetError::Missing {
            locator: "gone.md".into(),
        };
        let page = error_page(&config, "Notes", &e, &BlockGlyphs::default());
        assert_eq!(page.width(), 400);
        let inked = page.as_bytes().chunks_exact(4).any(|px| px == Color::INK.0);
        assert!(inked, "error page has text");
    }

    #[test]
    fn title_page_is_one_heading() {
        let config = LayoutConfig::standard().with_width(400.0);
        let page = title_page(&config, "Cover", &BlockGlyphs::default());
        // 40 margin + 42 line + 14 spacing + 40 margin.
        assert_eq!(page.height(), 136);
    }
}
