// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document rasterization, scrolling, and stack transitions for 3D paper
//! viewers.
//!
//! `paperstack_core` drives a stack of document-like surfaces resting on a
//! shared anchor in a host's 3D scene. Each surface is textured from a
//! raster rendered here, so it can be mapped onto any rotated plane. The
//! crate is `no_std` compatible (with `alloc`); the scene graph, raycasting,
//! asset fetching and the interactive overlay layer belong to the host and
//! are reached through traits.
//!
//! # Architecture
//!
//! ```text
//!   source ──► layout() ──► LayoutResult ──► render() ──► full Raster
//!                               │                            │
//!                               ▼                            ▼
//!                          project() ──► OverlayQueue   ScrollableRaster
//!                                             │              │ viewport
//!                                             ▼              ▼
//!                                        OverlaySync    SurfaceStore ◄── Animator ◄── StackModel
//!                                                            │
//!                                             evaluate() ──► SurfaceChanges ──► SceneSurfaces
//! ```
//!
//! **[`layout`]**: line-based markdown subset, inline emphasis and links,
//! greedy word wrap, image placements that re-flow as real sizes arrive.
//!
//! **[`raster`]** and **[`scroll`]**: RGBA pixel buffers and the full/viewport
//! pair with a clamped scroll offset and coalesced redraws.
//!
//! **[`document`]** and **[`loader`]**: the per-paper surface created on first
//! load, image slots with deadlines, and the host asset seam.
//!
//! **[`stack`]**, **[`tween`]** and **[`animator`]**: the left/right stack model
//! with its busy lock, multi-stage pose tweens, and per-paper tween ownership.
//!
//! **[`scene`]** and **[`dirty`]**: struct-of-arrays surface state with
//! multi-channel dirty tracking via `understory_dirty`.
//!
//! **[`overlay`]** and **[`hit`]**: the overlay projection and pointer routing
//! helpers.
//!
//! **[`viewer`]**: [`PaperViewer`](viewer::PaperViewer), which owns all of the
//! above and exposes the navigation, scrolling and frame API.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with a
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `cosmic_text` (disabled by default, implies `std`): Adds
//!   [`CosmicText`](layout::CosmicText), a [`TextBackend`](layout::TextBackend)
//!   that shapes and rasterizes real glyphs from system fonts.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animator;
pub mod dirty;
pub mod document;
pub mod hit;
pub mod layout;
pub mod loader;
pub mod overlay;
pub mod paper;
pub mod raster;
pub mod scene;
pub mod scroll;
pub mod stack;
pub mod time;
pub mod trace;
pub mod transform;
pub mod tween;
pub mod viewer;
