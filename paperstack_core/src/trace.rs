// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the viewer.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`PaperViewer`](crate::viewer::PaperViewer) calls as navigation, tweens,
//! loading and scrolling happen. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Failures that the viewer recovers from silently (unknown paper ids, asset
//! load errors) are reported here and nowhere else.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::animator::{TweenEnd, TweenToken};
use crate::loader::AssetErrorKind;
use crate::paper::PaperId;
use crate::time::HostTime;
use crate::tween::TweenKind;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which navigation entry point was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavigationKind {
    /// `next_paper`.
    Next,
    /// `previous_paper`.
    Previous,
    /// `go_to_paper`.
    GoTo,
    /// `close_stack` (reset cascade).
    Close,
    /// `open_stack`.
    Open,
}

/// What a navigation call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavigationOutcome {
    /// The model changed and animation started.
    Started,
    /// Ignored because a gated transition was in flight.
    Busy,
    /// Ignored at the first or last paper, or already at the target.
    AtBoundary,
    /// Ignored because the stack is closed (or already in the requested
    /// open/closed state).
    Closed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per [`tick`](crate::viewer::PaperViewer::tick).
#[derive(Clone, Copy, Debug)]
pub struct FrameTickEvent {
    /// Monotonic tick counter.
    pub frame_index: u64,
    /// Host time of the tick.
    pub now: HostTime,
    /// Tweens active after this tick.
    pub active_tweens: u32,
    /// Navigation jobs still running after this tick.
    pub active_jobs: u32,
}

/// Emitted for every navigation call, accepted or not.
#[derive(Clone, Copy, Debug)]
pub struct NavigationEvent {
    /// Host time of the call.
    pub at: HostTime,
    /// Entry point.
    pub kind: NavigationKind,
    /// Current paper before the call.
    pub from: Option<PaperId>,
    /// Requested or resulting paper.
    pub to: Option<PaperId>,
    /// Result.
    pub outcome: NavigationOutcome,
}

/// Emitted when a tween is started.
#[derive(Clone, Copy, Debug)]
pub struct TweenBeginEvent {
    /// Host time of the call that started it.
    pub at: HostTime,
    /// Animated paper.
    pub paper: PaperId,
    /// Token of the new tween.
    pub token: TweenToken,
    /// Path shape.
    pub kind: TweenKind,
    /// When motion starts (later than `at` for staggered steps).
    pub begin: HostTime,
    /// When motion ends.
    pub end: HostTime,
}

/// Emitted when a tween finishes or is cancelled.
#[derive(Clone, Copy, Debug)]
pub struct TweenEndEvent {
    /// Host time.
    pub at: HostTime,
    /// Animated paper.
    pub paper: PaperId,
    /// Token of the tween.
    pub token: TweenToken,
    /// How it ended.
    pub end: TweenEnd,
}

/// Emitted when an operation names a paper the registry does not know.
#[derive(Clone, Copy, Debug)]
pub struct LookupMissEvent {
    /// Host time.
    pub at: HostTime,
    /// The unknown id.
    pub paper: PaperId,
    /// Operation that was ignored.
    pub operation: &'static str,
}

/// Emitted when an asset fails to load and a placeholder is used instead.
#[derive(Clone, Copy, Debug)]
pub struct AssetFailureEvent<'a> {
    /// Host time.
    pub at: HostTime,
    /// Paper the asset belongs to.
    pub paper: PaperId,
    /// Error class.
    pub kind: AssetErrorKind,
    /// Locator that failed.
    pub locator: &'a str,
}

/// Emitted after a document was laid out again.
#[derive(Clone, Copy, Debug)]
pub struct ContentReflowEvent {
    /// Host time.
    pub at: HostTime,
    /// Paper.
    pub paper: PaperId,
    /// New full-raster height.
    pub height: u32,
    /// Scroll offset after clamping.
    pub offset: f64,
    /// Whether the offset was clamped down.
    pub clamped: bool,
}

/// Emitted when a viewport slice is redrawn.
#[derive(Clone, Copy, Debug)]
pub struct ViewportRedrawEvent {
    /// Host time.
    pub at: HostTime,
    /// Paper.
    pub paper: PaperId,
    /// Offset the slice was taken at.
    pub offset: f64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the viewer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once per tick.
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        _ = e;
    }

    /// Called for every navigation call.
    fn on_navigation(&mut self, e: &NavigationEvent) {
        _ = e;
    }

    /// Called when a tween starts.
    fn on_tween_begin(&mut self, e: &TweenBeginEvent) {
        _ = e;
    }

    /// Called when a tween ends.
    fn on_tween_end(&mut self, e: &TweenEndEvent) {
        _ = e;
    }

    /// Called when an unknown paper id is ignored.
    fn on_lookup_miss(&mut self, e: &LookupMissEvent) {
        _ = e;
    }

    /// Called when an asset fails to load.
    fn on_asset_failure(&mut self, e: &AssetFailureEvent<'_>) {
        _ = e;
    }

    /// Called after a re-layout.
    fn on_content_reflow(&mut self, e: &ContentReflowEvent) {
        _ = e;
    }

    /// Called after a viewport redraw.
    fn on_viewport_redraw(&mut self, e: &ViewportRedrawEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method that forwards one event type.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident, $hook:ident, $event:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`FrameTickEvent`].
        frame_tick, on_frame_tick, FrameTickEvent
    );
    forward!(
        /// Emits a [`NavigationEvent`].
        navigation, on_navigation, NavigationEvent
    );
    forward!(
        /// Emits a [`TweenBeginEvent`].
        tween_begin, on_tween_begin, TweenBeginEvent
    );
    forward!(
        /// Emits a [`TweenEndEvent`].
        tween_end, on_tween_end, TweenEndEvent
    );
    forward!(
        /// Emits a [`LookupMissEvent`].
        lookup_miss, on_lookup_miss, LookupMissEvent
    );
    forward!(
        /// Emits an [`AssetFailureEvent`].
        asset_failure, on_asset_failure, AssetFailureEvent<'_>
    );
    forward!(
        /// Emits a [`ContentReflowEvent`].
        content_reflow, on_content_reflow, ContentReflowEvent
    );
    forward!(
        /// Emits a [`ViewportRedrawEvent`].
        viewport_redraw, on_viewport_redraw, ViewportRedrawEvent
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
