// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paper identities and the registry of loaded surfaces.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::document::DocumentSurface;

/// A paper handle.
///
/// Ids are dense registration indices, so registration order is also the
/// fixed right-stack order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaperId(pub u32);

impl PaperId {
    /// Returns the registration index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaperId({})", self.0)
    }
}

/// How a paper's content is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A document rendered to a raster by the host (first page only).
    Pdf,
    /// Markdown-like text laid out by this crate.
    Markdown,
    /// A title page generated from the display name.
    Placeholder,
}

/// Registry entry for one paper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaperMeta {
    /// Handle.
    pub id: PaperId,
    /// Stable lookup key, unique within the registry.
    pub key: String,
    /// Name shown in chrome and on title pages.
    pub display_name: String,
    /// Content kind.
    pub source_kind: SourceKind,
    /// Where the content comes from; meaning depends on `source_kind`.
    pub source_locator: String,
}

/// The catalog of papers and their surfaces.
///
/// Metadata is registered up front; surfaces are attached lazily on first
/// load and live as long as the registry.
#[derive(Debug, Default)]
pub struct PaperRegistry {
    papers: Vec<PaperMeta>,
    surfaces: Vec<Option<DocumentSurface>>,
}

impl PaperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a paper at the bottom of the deck and returns its id.
    ///
    /// A duplicate `key` returns the existing id unchanged.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        display_name: impl Into<String>,
        source_kind: SourceKind,
        source_locator: impl Into<String>,
    ) -> PaperId {
        let key = key.into();
        if let Some(id) = self.resolve(&key) {
            return id;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "paper counts are far below u32::MAX"
        )]
        let id = PaperId(self.papers.len() as u32);
        self.papers.push(PaperMeta {
            id,
            key,
            display_name: display_name.into(),
            source_kind,
            source_locator: source_locator.into(),
        });
        self.surfaces.push(None);
        id
    }

    /// Number of registered papers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.papers.len()
    }

    /// Whether no papers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// All papers in registration order.
    #[must_use]
    pub fn papers(&self) -> &[PaperMeta] {
        &self.papers
    }

    /// Whether `id` names a registered paper.
    #[must_use]
    pub fn contains(&self, id: PaperId) -> bool {
        id.index() < self.papers.len()
    }

    /// Metadata for `id`.
    #[must_use]
    pub fn get(&self, id: PaperId) -> Option<&PaperMeta> {
        self.papers.get(id.index())
    }

    /// Looks a paper up by key.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<PaperId> {
        self.papers.iter().find(|p| p.key == key).map(|p| p.id)
    }

    /// Whether `id` has a surface.
    #[must_use]
    pub fn is_loaded(&self, id: PaperId) -> bool {
        self.surface(id).is_some()
    }

    /// The loaded surface for `id`.
    #[must_use]
    pub fn surface(&self, id: PaperId) -> Option<&DocumentSurface> {
        self.surfaces.get(id.index())?.as_ref()
    }

    /// The loaded surface for `id`, mutably.
    #[must_use]
    pub fn surface_mut(&mut self, id: PaperId) -> Option<&mut DocumentSurface> {
        self.surfaces.get_mut(id.index())?.as_mut()
    }

    /// Attaches (or replaces) the surface for `id`.
    ///
    /// Returns `false` for unknown ids.
    pub fn set_surface(&mut self, id: PaperId, surface: DocumentSurface) -> bool {
        match self.surfaces.get_mut(id.index()) {
            Some(slot) => {
                *slot = Some(surface);
                true
            }
            None => false,
        }
    }

    /// Iterates over loaded surfaces with their ids.
    pub fn surfaces_mut(&mut self) -> impl Iterator<Item = (PaperId, &mut DocumentSurface)> {
        self.papers
            .iter()
            .zip(self.surfaces.iter_mut())
            .filter_map(|(p, s)| s.as_mut().map(|s| (p.id, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Color, Raster};
    use crate::scroll::ScrollConfig;

    fn registry() -> PaperRegistry {
        let mut r = PaperRegistry::new();
        r.register("intro", "Intro", SourceKind::Markdown, "intro.md");
        r.register("paper", "Paper", SourceKind::Pdf, "paper.pdf");
        r.register("cover", "Cover", SourceKind::Placeholder, "");
        r
    }

    #[test]
    fn ids_follow_registration_order() {
        let r = registry();
        let ids: Vec<_> = r.papers().iter().map(|p| p.id).collect();
        assert_eq!(ids, [PaperId(0), PaperId(1), PaperId(2)]);
        assert_eq!(r.resolve("paper"), Some(PaperId(1)));
        assert_eq!(r.resolve("nope"), None);
        assert!(!r.contains(PaperId(3)));
    }

    #[test]
    fn duplicate_keys_are_not_registered_twice() {
        let mut r = registry();
        let id = r.register("intro", "Other", SourceKind::Pdf, "x");
        assert_eq!(id, PaperId(0));
        assert_eq!(r.len(), 3);
        assert_eq!(r.get(id).unwrap().display_name, "Intro");
    }

    #[test]
    fn surfaces_attach_lazily() {
        let mut r = registry();
        assert!(!r.is_loaded(PaperId(1)));
        let page =
            DocumentSurface::static_page(Raster::new(4, 4, Color::WHITE), ScrollConfig::letter());
        assert!(r.set_surface(PaperId(1), page));
        assert!(r.is_loaded(PaperId(1)));
        assert_eq!(r.surfaces_mut().count(), 1);
        let page =
            DocumentSurface::static_page(Raster::new(4, 4, Color::WHITE), ScrollConfig::letter());
        assert!(!r.set_surface(PaperId(9), page));
    }
}
