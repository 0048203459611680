// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for paper surfaces.
//!
//! Each paper's scene surface has independent categories of change, tracked
//! with [`understory_dirty`]. All channels are local-only: papers are siblings
//! on the anchor object, so nothing propagates between them.
//!
//! - [`TRANSFORM`]: the paper's pose changed (tween frame, snap).
//! - [`VISIBILITY`]: the paper was hidden or shown.
//! - [`PRIORITY`]: the render priority changed (cascade boost/restore).
//! - [`TEXTURE`]: the paper's visible raster changed and must be re-uploaded.
//!
//! [`SurfaceStore::evaluate`](crate::scene::SurfaceStore::evaluate) drains all
//! channels into a [`SurfaceChanges`](crate::scene::SurfaceChanges) record.

use understory_dirty::Channel;

/// Pose changed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Visibility flag changed.
pub const VISIBILITY: Channel = Channel::new(1);

/// Render priority changed.
pub const PRIORITY: Channel = Channel::new(2);

/// Visible raster changed.
pub const TEXTURE: Channel = Channel::new(3);
