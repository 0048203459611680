// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays scene state for paper surfaces, and the scene seam.
//!
//! The viewer writes poses, visibility, render priorities and texture
//! invalidations into a [`SurfaceStore`]. Each setter marks a
//! [`dirty`](crate::dirty) channel; [`SurfaceStore::evaluate`] drains all
//! channels into a [`SurfaceChanges`] record, and
//! [`SurfaceChanges::apply`] forwards exactly those changes to the host's
//! [`SceneSurfaces`] implementation.
//!
//! ```rust,ignore
//! fn on_frame(now: HostTime) {
//!     viewer.tick(now);                 // tweens write poses into the store
//!     viewer.present(&mut scene);       // evaluate + apply to the 3D scene
//!     viewer.sync_overlays(&mut overlay);
//! }
//! ```

use alloc::vec;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::dirty;
use crate::paper::PaperId;
use crate::raster::Raster;
use crate::transform::{PaperPose, Transform3d};

/// Applies surface changes to the host's 3D scene.
pub trait SceneSurfaces {
    /// Places the paper's surface relative to the anchor object.
    fn position_surface(&mut self, paper: PaperId, transform: Transform3d);

    /// Shows or hides the paper's surface.
    fn set_surface_visible(&mut self, paper: PaperId, visible: bool);

    /// Sets the draw order; higher draws over lower at equal depth.
    fn set_surface_render_priority(&mut self, paper: PaperId, order: i32);

    /// Uploads the paper's visible raster as its texture.
    fn update_surface_texture(&mut self, paper: PaperId, raster: &Raster);
}

/// Papers whose scene state changed since the previous evaluate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceChanges {
    /// Pose changed.
    pub transforms: Vec<PaperId>,
    /// Visibility changed.
    pub visibility: Vec<PaperId>,
    /// Render priority changed.
    pub priorities: Vec<PaperId>,
    /// Texture must be re-uploaded.
    pub textures: Vec<PaperId>,
}

impl SurfaceChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.visibility.clear();
        self.priorities.clear();
        self.textures.clear();
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.visibility.is_empty()
            && self.priorities.is_empty()
            && self.textures.is_empty()
    }

    /// Forwards these changes to `scene`, reading values from `store`.
    ///
    /// `texture` supplies the raster to upload for a paper; papers without
    /// one are skipped.
    pub fn apply<'a>(
        &self,
        store: &SurfaceStore,
        scene: &mut dyn SceneSurfaces,
        texture: impl Fn(PaperId) -> Option<&'a Raster>,
    ) {
        for &paper in &self.transforms {
            if let Some(pose) = store.pose(paper) {
                scene.position_surface(paper, pose.to_transform());
            }
        }
        for &paper in &self.visibility {
            scene.set_surface_visible(paper, store.is_visible(paper));
        }
        for &paper in &self.priorities {
            if let Some(order) = store.priority(paper) {
                scene.set_surface_render_priority(paper, order);
            }
        }
        for &paper in &self.textures {
            if let Some(raster) = texture(paper) {
                scene.update_surface_texture(paper, raster);
            }
        }
    }
}

/// Scene-facing state of every paper surface.
#[derive(Debug)]
pub struct SurfaceStore {
    pose: Vec<PaperPose>,
    visible: Vec<bool>,
    priority: Vec<i32>,
    dirty: DirtyTracker<u32>,
}

impl SurfaceStore {
    /// Creates a store for `count` papers, all visible at the default pose.
    ///
    /// Every channel starts dirty so the first evaluate presents everything.
    #[must_use]
    pub fn new(count: usize) -> Self {
        let mut store = Self {
            pose: vec![PaperPose::default(); count],
            visible: vec![true; count],
            priority: vec![0; count],
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        };
        for idx in 0..store.len_u32() {
            store.dirty.mark(idx, dirty::TRANSFORM);
            store.dirty.mark(idx, dirty::VISIBILITY);
            store.dirty.mark(idx, dirty::PRIORITY);
        }
        store
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "paper counts are far below u32::MAX"
    )]
    fn len_u32(&self) -> u32 {
        self.pose.len() as u32
    }

    /// Number of surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pose.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pose.is_empty()
    }

    /// Current pose of `paper`.
    #[must_use]
    pub fn pose(&self, paper: PaperId) -> Option<PaperPose> {
        self.pose.get(paper.index()).copied()
    }

    /// Whether `paper` is shown. Unknown papers are not.
    #[must_use]
    pub fn is_visible(&self, paper: PaperId) -> bool {
        self.visible.get(paper.index()).copied().unwrap_or(false)
    }

    /// Render priority of `paper`.
    #[must_use]
    pub fn priority(&self, paper: PaperId) -> Option<i32> {
        self.priority.get(paper.index()).copied()
    }

    /// Sets the pose of `paper`, marking TRANSFORM when it changed.
    pub fn set_pose(&mut self, paper: PaperId, pose: PaperPose) {
        if let Some(slot) = self.pose.get_mut(paper.index()) {
            if *slot != pose {
                *slot = pose;
                self.dirty.mark(paper.0, dirty::TRANSFORM);
            }
        }
    }

    /// Shows or hides `paper`, marking VISIBILITY when it changed.
    pub fn set_visible(&mut self, paper: PaperId, visible: bool) {
        if let Some(slot) = self.visible.get_mut(paper.index()) {
            if *slot != visible {
                *slot = visible;
                self.dirty.mark(paper.0, dirty::VISIBILITY);
            }
        }
    }

    /// Sets the render priority of `paper`, marking PRIORITY when it changed.
    pub fn set_priority(&mut self, paper: PaperId, order: i32) {
        if let Some(slot) = self.priority.get_mut(paper.index()) {
            if *slot != order {
                *slot = order;
                self.dirty.mark(paper.0, dirty::PRIORITY);
            }
        }
    }

    /// Marks the texture of `paper` for re-upload.
    pub fn mark_texture(&mut self, paper: PaperId) {
        if paper.index() < self.pose.len() {
            self.dirty.mark(paper.0, dirty::TEXTURE);
        }
    }

    /// Drains every dirty channel.
    pub fn evaluate(&mut self) -> SurfaceChanges {
        let mut changes = SurfaceChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SurfaceChanges) {
        changes.clear();
        for (channel, out) in [
            (dirty::TRANSFORM, &mut changes.transforms),
            (dirty::VISIBILITY, &mut changes.visibility),
            (dirty::PRIORITY, &mut changes.priorities),
            (dirty::TEXTURE, &mut changes.textures),
        ] {
            out.extend(
                self.dirty
                    .drain(channel)
                    .deterministic()
                    .run()
                    .map(PaperId),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Color;

    #[derive(Default)]
    struct Log {
        positioned: Vec<PaperId>,
        visible: Vec<(PaperId, bool)>,
        priority: Vec<(PaperId, i32)>,
        textures: Vec<PaperId>,
    }

    impl SceneSurfaces for Log {
        fn position_surface(&mut self, paper: PaperId, _: Transform3d) {
            self.positioned.push(paper);
        }
        fn set_surface_visible(&mut self, paper: PaperId, visible: bool) {
            self.visible.push((paper, visible));
        }
        fn set_surface_render_priority(&mut self, paper: PaperId, order: i32) {
            self.priority.push((paper, order));
        }
        fn update_surface_texture(&mut self, paper: PaperId, _: &Raster) {
            self.textures.push(paper);
        }
    }

    #[test]
    fn first_evaluate_presents_everything() {
        let mut store = SurfaceStore::new(3);
        let changes = store.evaluate();
        assert_eq!(changes.transforms, [PaperId(0), PaperId(1), PaperId(2)]);
        assert_eq!(changes.visibility.len(), 3);
        assert!(changes.textures.is_empty());
        assert!(store.evaluate().is_empty(), "channels were drained");
    }

    #[test]
    fn setters_mark_only_real_changes() {
        let mut store = SurfaceStore::new(2);
        store.evaluate();
        store.set_pose(PaperId(1), PaperPose::default());
        store.set_visible(PaperId(0), true);
        assert!(store.evaluate().is_empty(), "values did not change");

        store.set_pose(PaperId(1), PaperPose::new([0.0, 1.0, 0.0], 0.0));
        store.set_priority(PaperId(0), 5);
        store.mark_texture(PaperId(1));
        store.set_visible(PaperId(9), false);
        let changes = store.evaluate();
        assert_eq!(changes.transforms, [PaperId(1)]);
        assert_eq!(changes.priorities, [PaperId(0)]);
        assert_eq!(changes.textures, [PaperId(1)]);
        assert!(changes.visibility.is_empty());
    }

    #[test]
    fn apply_forwards_current_values() {
        let mut store = SurfaceStore::new(2);
        store.evaluate();
        store.set_visible(PaperId(1), false);
        store.set_priority(PaperId(1), 7);
        store.mark_texture(PaperId(0));
        store.mark_texture(PaperId(1));
        let changes = store.evaluate();

        let raster = Raster::new(1, 1, Color::WHITE);
        let mut log = Log::default();
        changes.apply(&store, &mut log, |p| (p == PaperId(0)).then_some(&raster));
        assert_eq!(log.visible, [(PaperId(1), false)]);
        assert_eq!(log.priority, [(PaperId(1), 7)]);
        assert_eq!(log.textures, [PaperId(0)], "paper 1 has no texture yet");
        assert!(log.positioned.is_empty());
    }
}
