// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paper viewer facade.
//!
//! [`PaperViewer`] owns every per-instance piece of state: the registry, the
//! stack model, the animator, the scene-facing surface store, and the queue
//! of overlay updates. The host drives it with one call sequence per frame:
//!
//! ```rust,ignore
//! viewer.tick(now);
//! viewer.present(&mut scene);
//! viewer.sync_overlays(&mut overlay);
//! ```
//!
//! Navigation calls change the stack model synchronously and start tweens
//! that the next ticks play out. Multi-step navigation (jumps and the reset
//! cascade) runs as a job; [`PaperViewer::job_settled`] reports when every
//! tween the job started has finished or been superseded.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Point, Size};

use crate::animator::{Animator, TweenEnd, TweenToken};
use crate::document::{DocumentSurface, ImageOutcome};
use crate::hit::{DragState, PointerHit, PointerId, PointerOutcome, hit_link, uv_to_raster};
use crate::layout::{ImageRef, LayoutConfig, TextBackend};
use crate::loader::{AssetError, AssetLoader, DecodedImage, error_page, title_page};
use crate::overlay::{OverlayQueue, OverlaySync, OverlayUpdate, project, project_page};
use crate::paper::{PaperId, PaperMeta, PaperRegistry, SourceKind};
use crate::scene::{SceneSurfaces, SurfaceChanges, SurfaceStore};
use crate::scroll::ScrollConfig;
use crate::stack::{Advance, Gate, Retreat, StackGeometry, StackModel};
use crate::time::{Duration, HostTime};
use crate::trace::{
    AssetFailureEvent, ContentReflowEvent, FrameTickEvent, LookupMissEvent, NavigationEvent,
    NavigationKind, NavigationOutcome, NoopSink, TraceSink, Tracer, TweenBeginEvent,
    TweenEndEvent, ViewportRedrawEvent,
};
use crate::transform::PaperPose;
use crate::tween::{MotionConfig, Tween};

/// Everything a [`PaperViewer`] is configured with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Document layout.
    pub layout: LayoutConfig,
    /// Viewport and scroll indicator.
    pub scroll: ScrollConfig,
    /// Stack slots.
    pub geometry: StackGeometry,
    /// Next, previous and jumps.
    pub direct: MotionConfig,
    /// Reset cascade.
    pub cascade: MotionConfig,
    /// Largest resting tilt, in degrees.
    pub max_tilt_degrees: f64,
    /// Progress of the last cascade step after which middle papers hide.
    pub hide_fraction: f64,
    /// How long an image may take before its estimate becomes permanent.
    pub image_timeout: Duration,
    /// Seed for resting tilts.
    pub seed: u64,
}

impl ViewerConfig {
    /// Defaults for a desk-sized stack of letter-format papers.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            layout: LayoutConfig::standard(),
            scroll: ScrollConfig::letter(),
            geometry: StackGeometry::desk(),
            direct: MotionConfig::direct(),
            cascade: MotionConfig::cascade(),
            max_tilt_degrees: 2.0,
            hide_fraction: 0.8,
            image_timeout: Duration::from_millis(4000),
            seed: 0x5eed,
        }
    }

    /// Largest resting tilt, in radians.
    #[must_use]
    pub fn max_tilt_radians(&self) -> f64 {
        self.max_tilt_degrees.to_radians()
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Identifies a navigation job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

/// Identifies a current-paper listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug)]
struct Cascade {
    /// Paper, its tween, and when that tween starts moving.
    steps: Vec<(PaperId, TweenToken, HostTime)>,
    boosted: Vec<PaperId>,
    hide_pending: bool,
}

#[derive(Debug)]
struct Job {
    id: JobId,
    tokens: Vec<TweenToken>,
    holds_lock: bool,
    cascade: Option<Cascade>,
}

type Listener = Box<dyn FnMut(PaperId)>;

/// A stack of papers on a shared anchor, paged through one at a time.
pub struct PaperViewer<S: TraceSink = NoopSink> {
    config: ViewerConfig,
    registry: PaperRegistry,
    stack: StackModel,
    animator: Animator,
    store: SurfaceStore,
    changes: SurfaceChanges,
    overlays: OverlayQueue,
    jobs: Vec<Job>,
    listeners: Vec<(ListenerId, Listener)>,
    drag: Option<DragState>,
    text: Box<dyn TextBackend>,
    sink: S,
    closed: bool,
    now: HostTime,
    frame_index: u64,
    next_job: u64,
    next_listener: u64,
}

impl<S: TraceSink> core::fmt::Debug for PaperViewer<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaperViewer")
            .field("papers", &self.registry.len())
            .field("current", &self.stack.current())
            .field("busy", &self.stack.is_busy())
            .field("closed", &self.closed)
            .field("active_tweens", &self.animator.active_count())
            .field("jobs", &self.jobs.len())
            .field("listeners", &self.listeners.len())
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl PaperViewer<NoopSink> {
    /// Creates a viewer that discards trace events.
    #[must_use]
    pub fn new(registry: PaperRegistry, config: ViewerConfig, text: Box<dyn TextBackend>) -> Self {
        Self::with_sink(registry, config, text, NoopSink)
    }
}

impl<S: TraceSink> PaperViewer<S> {
    /// Creates a viewer that reports to `sink`.
    ///
    /// Papers rest on the right stack in registration order. No paper is
    /// current until the first [`load_paper`](Self::load_paper).
    #[must_use]
    pub fn with_sink(
        registry: PaperRegistry,
        config: ViewerConfig,
        text: Box<dyn TextBackend>,
        sink: S,
    ) -> Self {
        let count = registry.len();
        let stack = StackModel::new(
            count,
            config.geometry,
            config.max_tilt_radians(),
            config.seed,
        );
        let mut store = SurfaceStore::new(count);
        for meta in registry.papers() {
            if let Some(pose) = stack.rest_pose(meta.id) {
                store.set_pose(meta.id, pose);
            }
            store.set_priority(meta.id, stack.render_priority(meta.id));
        }
        Self {
            config,
            registry,
            stack,
            animator: Animator::new(),
            store,
            changes: SurfaceChanges::default(),
            overlays: OverlayQueue::default(),
            jobs: Vec::new(),
            listeners: Vec::new(),
            drag: None,
            text,
            sink,
            closed: false,
            now: HostTime(0),
            frame_index: 0,
            next_job: 0,
            next_listener: 0,
        }
    }

    // -- accessors --------------------------------------------------------

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Every registered paper, in deck order.
    #[must_use]
    pub fn papers(&self) -> &[PaperMeta] {
        self.registry.papers()
    }

    /// The current paper, if the stack has been activated.
    #[must_use]
    pub fn current_paper_id(&self) -> Option<PaperId> {
        self.stack.current()
    }

    /// The registry, including loaded surfaces.
    #[must_use]
    pub fn registry(&self) -> &PaperRegistry {
        &self.registry
    }

    /// The loaded surface of `paper`.
    #[must_use]
    pub fn surface(&self, paper: PaperId) -> Option<&DocumentSurface> {
        self.registry.surface(paper)
    }

    /// The stack model.
    #[must_use]
    pub fn stack(&self) -> &StackModel {
        &self.stack
    }

    /// The animator.
    #[must_use]
    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Scene-facing state of every surface.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceStore {
        &self.store
    }

    /// Whether the stack is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The drag-to-scroll gesture in progress.
    #[must_use]
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Host time of the last tick.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The trace sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the viewer and returns its trace sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    // -- listeners --------------------------------------------------------

    /// Calls `listener` with the new current paper every time it changes.
    pub fn on_current_paper_change(&mut self, listener: Box<dyn FnMut(PaperId)>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, paper: PaperId) {
        for (_, listener) in &mut self.listeners {
            listener(paper);
        }
    }

    // -- loading ----------------------------------------------------------

    /// Loads the content of `paper` and attaches its surface.
    ///
    /// Markdown is laid out immediately with estimated image heights; each
    /// image is requested from `loader` and delivered later through
    /// [`resolve_image`](Self::resolve_image). Load failures are traced and
    /// replaced by an error page. The first successful call activates the
    /// stack.
    ///
    /// Returns `false` for unknown or already loaded papers.
    pub fn load_paper(&mut self, paper: PaperId, loader: &mut dyn AssetLoader) -> bool {
        let Some(meta) = self.registry.get(paper) else {
            self.lookup_miss(paper, "load_paper");
            return false;
        };
        if self.registry.is_loaded(paper) {
            return false;
        }
        let kind = meta.source_kind;
        let locator = meta.source_locator.clone();
        let name = meta.display_name.clone();
        let config = self.config;
        let text = &*self.text;

        let (surface, failure) = match kind {
            SourceKind::Markdown => match loader.fetch_text(&locator) {
                Ok(source) => (
                    DocumentSurface::markdown(
                        source,
                        config.layout,
                        config.scroll,
                        self.now,
                        config.image_timeout,
                        text,
                    ),
                    None,
                ),
                Err(e) => (
                    DocumentSurface::static_page(
                        error_page(&config.layout, &name, &e, text),
                        config.scroll,
                    ),
                    Some(e),
                ),
            },
            SourceKind::Pdf => match loader.render_document_first_page(&locator) {
                Ok(page) => (DocumentSurface::static_page(page, config.scroll), None),
                Err(e) => (
                    DocumentSurface::static_page(
                        error_page(&config.layout, &name, &e, text),
                        config.scroll,
                    ),
                    Some(e),
                ),
            },
            SourceKind::Placeholder => (
                DocumentSurface::static_page(
                    title_page(&config.layout, &name, text),
                    config.scroll,
                ),
                None,
            ),
        };
        if let Some(e) = &failure {
            self.asset_failure(paper, e);
        }

        let requests: Vec<ImageRef> = surface.images().to_vec();
        self.overlays
            .push(registration(paper, &surface, &config.layout));
        self.registry.set_surface(paper, surface);
        self.store.mark_texture(paper);
        for image in &requests {
            loader.request_image(paper, image.ordinal, &image.url);
        }

        if let Some(current) = self.stack.activate() {
            let motion = self.config.direct;
            self.flatten(current, self.now, &motion);
            self.notify(current);
        }
        true
    }

    /// Loads every paper that has no surface yet.
    pub fn load_all(&mut self, loader: &mut dyn AssetLoader) -> usize {
        let ids: Vec<PaperId> = self.registry.papers().iter().map(|m| m.id).collect();
        ids.into_iter()
            .filter(|&id| self.load_paper(id, loader))
            .count()
    }

    /// Delivers the result of an image request made during
    /// [`load_paper`](Self::load_paper).
    ///
    /// A decoded image re-runs the document layout; the overlay is
    /// re-registered and told the new height and offset. Failures are
    /// traced and keep the estimate. Returns whether the document changed.
    pub fn resolve_image(
        &mut self,
        paper: PaperId,
        ordinal: usize,
        result: Result<DecodedImage, AssetError>,
    ) -> bool {
        if !self.registry.contains(paper) {
            self.lookup_miss(paper, "resolve_image");
            return false;
        }
        if let Err(e) = &result {
            self.asset_failure(paper, e);
        }
        let text = &*self.text;
        let Some(surface) = self.registry.surface_mut(paper) else {
            return false;
        };
        let ImageOutcome::Reflowed(reflow) = surface.resolve_image(ordinal, result, text) else {
            return false;
        };
        let register = registration(paper, surface, &self.config.layout);
        self.overlays.push(register);
        self.overlays.push(OverlayUpdate::ContentHeight {
            paper,
            height: f64::from(reflow.height),
        });
        self.overlays.push(OverlayUpdate::ScrollOffset {
            paper,
            offset: reflow.offset,
        });
        self.store.mark_texture(paper);
        let at = self.now;
        self.tracer().content_reflow(&ContentReflowEvent {
            at,
            paper,
            height: reflow.height,
            offset: reflow.offset,
            clamped: reflow.clamped,
        });
        true
    }

    // -- navigation -------------------------------------------------------

    /// Moves the current paper onto the left stack and shows the next one.
    ///
    /// No-op at the last paper, while a transition is in flight, or while
    /// the stack is closed. Returns whether navigation started.
    pub fn next_paper(&mut self) -> bool {
        self.jump(NavigationKind::Next, 1, true).is_some()
    }

    /// Brings the most recently viewed paper back from the left stack.
    ///
    /// No-op at the first paper, while a transition is in flight, or while
    /// the stack is closed. Returns whether navigation started.
    pub fn previous_paper(&mut self) -> bool {
        self.jump(NavigationKind::Previous, 1, false).is_some()
    }

    /// Pages forward or back until `paper` is current.
    ///
    /// Intermediate steps start one stagger apart. The returned job settles
    /// once every step has landed. Unknown ids are traced and ignored.
    pub fn go_to_paper(&mut self, paper: PaperId) -> Option<JobId> {
        if !self.registry.contains(paper) {
            self.lookup_miss(paper, "go_to_paper");
            return None;
        }
        let Some(current) = self.stack.current() else {
            self.navigation(NavigationKind::GoTo, None, Some(paper), NavigationOutcome::AtBoundary);
            return None;
        };
        let (steps, forward) = if paper.index() >= current.index() {
            (paper.index() - current.index(), true)
        } else {
            (current.index() - paper.index(), false)
        };
        self.jump(NavigationKind::GoTo, steps, forward)
    }

    /// Whether `job` has finished. Unknown ids count as finished.
    #[must_use]
    pub fn job_settled(&self, job: JobId) -> bool {
        !self.jobs.iter().any(|j| j.id == job)
    }

    /// Number of unfinished jobs.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.jobs.len()
    }

    fn jump(&mut self, kind: NavigationKind, steps: usize, forward: bool) -> Option<JobId> {
        let from = self.stack.current();
        let outcome = if self.closed {
            Some(NavigationOutcome::Closed)
        } else if self.stack.is_busy() {
            Some(NavigationOutcome::Busy)
        } else if steps == 0 || from.is_none() {
            Some(NavigationOutcome::AtBoundary)
        } else {
            None
        };
        if let Some(outcome) = outcome {
            self.navigation(kind, from, from, outcome);
            return None;
        }

        let motion = self.config.direct;
        let mut tokens = Vec::new();
        for step in 0..steps {
            let gate = if step == 0 { Gate::Normal } else { Gate::Bypass };
            let begin = self.now + motion.stagger.saturating_mul(step as u64);
            let last = step + 1 == steps;
            if forward {
                let Some(a) = self.stack.advance(gate) else {
                    break;
                };
                self.start_advance(a, begin, last, &motion, &mut tokens);
            } else {
                let Some(r) = self.stack.retreat(gate) else {
                    break;
                };
                self.start_retreat(r, begin, step == 0, last, &motion, &mut tokens);
            }
        }
        if tokens.is_empty() {
            self.navigation(kind, from, from, NavigationOutcome::AtBoundary);
            return None;
        }

        let to = self.stack.current();
        self.navigation(kind, from, to, NavigationOutcome::Started);
        let id = self.push_job(tokens, true, None);
        if let Some(to) = to {
            self.notify(to);
        }
        Some(id)
    }

    fn start_advance(
        &mut self,
        a: Advance,
        begin: HostTime,
        flatten_incoming: bool,
        motion: &MotionConfig,
        tokens: &mut Vec<TweenToken>,
    ) {
        let from = self.pose_of(a.outgoing);
        tokens.push(self.start_tween(
            a.outgoing,
            Tween::advance(from, a.outgoing_target, begin, motion),
        ));
        self.store
            .set_priority(a.outgoing, self.stack.render_priority(a.outgoing));
        if flatten_incoming {
            tokens.push(self.flatten(a.incoming, begin, motion));
        }
    }

    fn start_retreat(
        &mut self,
        r: Retreat,
        begin: HostTime,
        first: bool,
        last: bool,
        motion: &MotionConfig,
        tokens: &mut Vec<TweenToken>,
    ) {
        // Papers passed over on the way back land tilted; only the final one
        // is flat.
        let target = if last {
            r.returning_target
        } else {
            let yaw = self.stack.resting_rotation(r.returning).unwrap_or(0.0);
            r.returning_target.with_yaw(yaw)
        };
        let from = self.pose_of(r.returning);
        tokens.push(self.start_tween(r.returning, Tween::retreat(from, target, begin, motion)));
        self.store
            .set_priority(r.returning, self.stack.render_priority(r.returning));
        if first {
            tokens.push(self.settle(r.previous, r.previous_yaw, begin, motion));
        }
    }

    fn flatten(&mut self, paper: PaperId, begin: HostTime, motion: &MotionConfig) -> TweenToken {
        self.settle(paper, 0.0, begin, motion)
    }

    /// Tweens `paper` to its resting slot, ending at `yaw`.
    ///
    /// A paper already in its slot only rotates. One caught between stacks
    /// (its own tween was just superseded) travels the rest of the way.
    fn settle(
        &mut self,
        paper: PaperId,
        yaw: f64,
        begin: HostTime,
        motion: &MotionConfig,
    ) -> TweenToken {
        let from = self.pose_of(paper);
        let slot = self
            .stack
            .rest_pose(paper)
            .map_or(from.position, |rest| rest.position);
        let tween = if from.position == slot {
            Tween::rotation(from, yaw, begin, motion)
        } else {
            Tween::retreat(from, PaperPose::new(slot, yaw), begin, motion)
        };
        self.start_tween(paper, tween)
    }

    // -- open / close -----------------------------------------------------

    /// Returns every left-stack paper to the right stack in a staggered
    /// cascade, most recently viewed first.
    ///
    /// Supersedes any navigation in flight. Each paper draws above its
    /// neighbours while it moves. Once the last one is most of the way down,
    /// every paper except the first and the last is hidden until
    /// [`open_stack`](Self::open_stack).
    pub fn close_stack(&mut self) -> Option<JobId> {
        let from = self.stack.current();
        if self.closed {
            self.navigation(NavigationKind::Close, from, from, NavigationOutcome::Closed);
            return None;
        }
        for job in core::mem::take(&mut self.jobs) {
            self.finish_job(job);
        }
        self.closed = true;
        self.drag = None;

        let motion = self.config.cascade;
        let reset = self.stack.reset();
        let mut tokens = Vec::with_capacity(reset.steps.len() + 1);
        let mut steps = Vec::with_capacity(reset.steps.len());
        for (i, step) in reset.steps.iter().enumerate() {
            let begin = self.now + motion.stagger.saturating_mul(i as u64);
            let from = self.pose_of(step.paper);
            let token =
                self.start_tween(step.paper, Tween::retreat(from, step.target, begin, &motion));
            tokens.push(token);
            steps.push((step.paper, token, begin));
        }
        if let Some((paper, yaw)) = reset.previous {
            tokens.push(self.settle(paper, yaw, self.now, &motion));
        }

        let to = self.stack.current();
        self.navigation(NavigationKind::Close, from, to, NavigationOutcome::Started);
        let id = self.push_job(
            tokens,
            false,
            Some(Cascade {
                steps,
                boosted: Vec::new(),
                hide_pending: true,
            }),
        );
        if to != from {
            if let Some(to) = to {
                self.notify(to);
            }
        }
        Some(id)
    }

    /// Shows every paper again and flattens the current one.
    ///
    /// Returns `false` if the stack was not closed.
    pub fn open_stack(&mut self) -> bool {
        let current = self.stack.current();
        if !self.closed {
            self.navigation(NavigationKind::Open, current, current, NavigationOutcome::Closed);
            return false;
        }
        self.closed = false;
        for job in &mut self.jobs {
            if let Some(c) = &mut job.cascade {
                c.hide_pending = false;
            }
        }
        for meta in self.registry.papers() {
            self.store.set_visible(meta.id, true);
        }
        if let Some(paper) = current {
            let motion = self.config.direct;
            self.flatten(paper, self.now, &motion);
        }
        self.navigation(NavigationKind::Open, current, current, NavigationOutcome::Started);
        true
    }

    fn hide_middle(&mut self) {
        let count = self.registry.len();
        for meta in self.registry.papers() {
            let index = meta.id.index();
            if index != 0 && index + 1 != count {
                self.store.set_visible(meta.id, false);
            }
        }
    }

    fn boost_priority(&self) -> i32 {
        i32::try_from(self.stack.len())
            .unwrap_or(i32::MAX)
            .saturating_add(1)
    }

    // -- scrolling --------------------------------------------------------

    /// Scrolls `paper` by `delta` pixels.
    ///
    /// Returns whether the paper consumed the input, which is the case
    /// whenever it is loaded and taller than its viewport, even at either
    /// end of its range.
    pub fn scroll_paper(&mut self, paper: PaperId, delta: f64) -> bool {
        if !self.registry.contains(paper) {
            self.lookup_miss(paper, "scroll_paper");
            return false;
        }
        let Some(surface) = self.registry.surface_mut(paper) else {
            return false;
        };
        let scroll = surface.scroll_mut();
        if !scroll.is_scrollable() {
            return false;
        }
        if scroll.scroll_by(delta) {
            let offset = scroll.offset();
            self.overlays
                .push(OverlayUpdate::ScrollOffset { paper, offset });
        }
        true
    }

    /// Whether `paper` is loaded and taller than its viewport.
    #[must_use]
    pub fn is_paper_scrollable(&self, paper: PaperId) -> bool {
        self.registry
            .surface(paper)
            .is_some_and(|s| s.scroll().is_scrollable())
    }

    fn set_offset(&mut self, paper: PaperId, offset: f64) -> bool {
        let Some(surface) = self.registry.surface_mut(paper) else {
            return false;
        };
        let scroll = surface.scroll_mut();
        if !scroll.set_scroll_offset(offset) {
            return false;
        }
        let offset = scroll.offset();
        self.overlays
            .push(OverlayUpdate::ScrollOffset { paper, offset });
        true
    }

    // -- pointer routing --------------------------------------------------

    /// Routes a pointer press over `hits`, nearest first.
    ///
    /// On the current paper a link opens and anything else starts a
    /// drag-to-scroll (when the paper scrolls and no drag is active). Any
    /// other paper is navigated to.
    pub fn pointer_down(&mut self, pointer: PointerId, hits: &[PointerHit]) -> PointerOutcome {
        let Some(hit) = hits.first() else {
            return PointerOutcome::Ignored;
        };
        let paper = hit.paper;
        if !self.registry.contains(paper) {
            self.lookup_miss(paper, "pointer_down");
            return PointerOutcome::Ignored;
        }
        if self.closed {
            return PointerOutcome::Ignored;
        }
        if self.stack.current() != Some(paper) {
            return match self.go_to_paper(paper) {
                Some(_) => PointerOutcome::Navigated(paper),
                None => PointerOutcome::Ignored,
            };
        }

        let Some(surface) = self.registry.surface(paper) else {
            return PointerOutcome::Ignored;
        };
        let scroll = surface.scroll();
        let viewport = viewport_size(surface);
        let point = uv_to_raster(hit.uv, viewport, scroll.offset());
        if let Some(link) = hit_link(surface.links(), point, scroll.config().link_padding) {
            return PointerOutcome::OpenLink(link.url.clone());
        }
        if self.drag.is_some() || !scroll.is_scrollable() {
            return PointerOutcome::Ignored;
        }
        self.drag = Some(DragState {
            pointer,
            paper,
            start_y: viewport_y(hit.uv, viewport),
            start_offset: scroll.offset(),
        });
        PointerOutcome::DragStarted(paper)
    }

    /// Continues a drag with the pointer now at surface coordinate `uv`.
    ///
    /// Returns whether the scroll offset changed.
    pub fn pointer_move(&mut self, pointer: PointerId, uv: Point) -> bool {
        let Some(drag) = self.drag.filter(|d| d.pointer == pointer) else {
            return false;
        };
        let Some(surface) = self.registry.surface(drag.paper) else {
            return false;
        };
        let offset = drag.offset_for(
            viewport_y(uv, viewport_size(surface)),
            surface.scroll().max_scroll(),
        );
        self.set_offset(drag.paper, offset)
    }

    /// Ends the drag owned by `pointer`. Returns whether one was active.
    pub fn pointer_up(&mut self, pointer: PointerId) -> bool {
        if self.drag.is_some_and(|d| d.pointer == pointer) {
            self.drag = None;
            true
        } else {
            false
        }
    }

    /// Routes a wheel delta to the nearest paper in `hits`.
    pub fn wheel(&mut self, hits: &[PointerHit], delta: f64) -> bool {
        hits.first()
            .is_some_and(|hit| self.scroll_paper(hit.paper, delta))
    }

    // -- frame ------------------------------------------------------------

    /// Advances time to `now`.
    ///
    /// Settles timed-out images, samples every tween into the surface
    /// store, finishes settled jobs (releasing the navigation lock), runs
    /// the cascade's priority boost and hide step, and performs at most one
    /// pending viewport redraw per paper.
    pub fn tick(&mut self, now: HostTime) {
        self.now = now;
        self.frame_index += 1;

        for (_, surface) in self.registry.surfaces_mut() {
            surface.expire(now);
        }

        let frame = self.animator.tick(now);
        for &(paper, pose) in &frame.poses {
            self.store.set_pose(paper, pose);
        }
        for &(paper, token) in &frame.finished {
            self.tracer().tween_end(&TweenEndEvent {
                at: now,
                paper,
                token,
                end: TweenEnd::Finished,
            });
        }

        let mut jobs = core::mem::take(&mut self.jobs);
        jobs.retain_mut(|job| {
            if let Some(cascade) = &mut job.cascade {
                self.drive_cascade(cascade, now);
            }
            let done = job.tokens.iter().all(|&t| self.animator.is_settled(t));
            if done {
                self.release_job(job);
            }
            !done
        });
        self.jobs = jobs;

        for (paper, surface) in self.registry.surfaces_mut() {
            let scroll = surface.scroll_mut();
            scroll.flush();
            if scroll.take_texture_dirty() {
                self.store.mark_texture(paper);
                Tracer::new(&mut self.sink).viewport_redraw(&ViewportRedrawEvent {
                    at: now,
                    paper,
                    offset: scroll.offset(),
                });
            }
        }

        let event = FrameTickEvent {
            frame_index: self.frame_index,
            now,
            active_tweens: count_u32(self.animator.active_count()),
            active_jobs: count_u32(self.jobs.len()),
        };
        self.tracer().frame_tick(&event);
    }

    /// Sends every changed surface property to `scene`.
    ///
    /// Returns whether anything was sent.
    pub fn present(&mut self, scene: &mut dyn SceneSurfaces) -> bool {
        self.store.evaluate_into(&mut self.changes);
        let registry = &self.registry;
        self.changes.apply(&self.store, scene, |paper| {
            registry.surface(paper).map(|s| s.scroll().viewport())
        });
        !self.changes.is_empty()
    }

    /// Sends queued overlay updates to `overlay`. Returns how many ran.
    pub fn sync_overlays(&mut self, overlay: &mut dyn OverlaySync) -> usize {
        self.overlays.drain_into(overlay)
    }

    fn drive_cascade(&mut self, cascade: &mut Cascade, now: HostTime) {
        let boost = self.boost_priority();
        for &(paper, token, begin) in &cascade.steps {
            let settled = self.animator.is_settled(token);
            let boosted = cascade.boosted.iter().position(|&p| p == paper);
            match (settled, boosted) {
                (false, None) if now >= begin => {
                    self.store.set_priority(paper, boost);
                    cascade.boosted.push(paper);
                }
                (true, Some(i)) => {
                    cascade.boosted.swap_remove(i);
                    self.store
                        .set_priority(paper, self.stack.render_priority(paper));
                }
                _ => {}
            }
        }
        if cascade.hide_pending {
            let ready = cascade.steps.last().is_none_or(|&(_, token, _)| {
                self.animator
                    .progress(token, now)
                    .is_none_or(|p| p >= self.config.hide_fraction)
            });
            if ready {
                cascade.hide_pending = false;
                self.hide_middle();
            }
        }
    }

    fn release_job(&mut self, job: &mut Job) {
        if job.holds_lock {
            self.stack.release();
        }
        if let Some(cascade) = &mut job.cascade {
            for paper in cascade.boosted.drain(..) {
                self.store
                    .set_priority(paper, self.stack.render_priority(paper));
            }
        }
    }

    fn finish_job(&mut self, mut job: Job) {
        self.release_job(&mut job);
    }

    fn push_job(
        &mut self,
        tokens: Vec<TweenToken>,
        holds_lock: bool,
        cascade: Option<Cascade>,
    ) -> JobId {
        let id = JobId(self.next_job);
        self.next_job += 1;
        self.jobs.push(Job {
            id,
            tokens,
            holds_lock,
            cascade,
        });
        id
    }

    // -- helpers ----------------------------------------------------------

    fn pose_of(&self, paper: PaperId) -> PaperPose {
        self.store.pose(paper).unwrap_or_default()
    }

    fn start_tween(&mut self, paper: PaperId, tween: Tween) -> TweenToken {
        let (token, cancelled) = self.animator.start(paper, tween);
        let at = self.now;
        let mut tracer = Tracer::new(&mut self.sink);
        if let Some(old) = cancelled {
            tracer.tween_end(&TweenEndEvent {
                at,
                paper,
                token: old,
                end: TweenEnd::Cancelled,
            });
        }
        tracer.tween_begin(&TweenBeginEvent {
            at,
            paper,
            token,
            kind: tween.kind(),
            begin: tween.begin(),
            end: tween.end(),
        });
        token
    }

    fn tracer(&mut self) -> Tracer<'_> {
        Tracer::new(&mut self.sink)
    }

    fn navigation(
        &mut self,
        kind: NavigationKind,
        from: Option<PaperId>,
        to: Option<PaperId>,
        outcome: NavigationOutcome,
    ) {
        let at = self.now;
        self.tracer().navigation(&NavigationEvent {
            at,
            kind,
            from,
            to,
            outcome,
        });
    }

    fn lookup_miss(&mut self, paper: PaperId, operation: &'static str) {
        let at = self.now;
        self.tracer().lookup_miss(&LookupMissEvent {
            at,
            paper,
            operation,
        });
    }

    fn asset_failure(&mut self, paper: PaperId, error: &AssetError) {
        let at = self.now;
        self.tracer().asset_failure(&AssetFailureEvent {
            at,
            paper,
            kind: error.kind(),
            locator: error.locator(),
        });
    }
}

fn registration(paper: PaperId, surface: &DocumentSurface, layout: &LayoutConfig) -> OverlayUpdate {
    let full = surface.scroll().full();
    let height = f64::from(full.height());
    let content = match surface.layout() {
        Some(result) => project(result, layout),
        None => project_page(Size::new(f64::from(full.width()), height)),
    };
    OverlayUpdate::Register {
        paper,
        content,
        viewport: viewport_size(surface),
        content_height: height,
    }
}

fn viewport_size(surface: &DocumentSurface) -> Size {
    let viewport = surface.scroll().viewport();
    Size::new(f64::from(viewport.width()), f64::from(viewport.height()))
}

/// Pointer Y in viewport pixels, top-down.
fn viewport_y(uv: Point, viewport: Size) -> f64 {
    (1.0 - uv.y) * viewport.height
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BlockGlyphs;
    use crate::loader::NoAssets;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    fn viewer(n: usize) -> PaperViewer {
        let mut registry = PaperRegistry::new();
        for i in 0..n {
            registry.register(
                alloc::format!("p{i}"),
                alloc::format!("Paper {i}"),
                SourceKind::Placeholder,
                "",
            );
        }
        let mut v = PaperViewer::new(
            registry,
            ViewerConfig::standard(),
            Box::new(BlockGlyphs::default()),
        );
        v.load_all(&mut NoAssets);
        v
    }

    #[test]
    fn first_load_activates_and_notifies() {
        let mut registry = PaperRegistry::new();
        let id = registry.register("a", "A", SourceKind::Placeholder, "");
        let mut v = PaperViewer::new(
            registry,
            ViewerConfig::standard(),
            Box::new(BlockGlyphs::default()),
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        v.on_current_paper_change(Box::new(move |p| log.borrow_mut().push(p)));
        assert_eq!(v.current_paper_id(), None);
        assert!(v.load_paper(id, &mut NoAssets));
        assert!(!v.load_paper(id, &mut NoAssets), "already loaded");
        assert_eq!(v.current_paper_id(), Some(id));
        assert_eq!(*seen.borrow(), [id]);
    }

    #[test]
    fn busy_lock_releases_when_tweens_settle() {
        let mut v = viewer(3);
        assert!(v.next_paper());
        assert!(!v.next_paper(), "second call while busy is a no-op");
        assert_eq!(v.current_paper_id(), Some(PaperId(1)));
        v.tick(ms(100));
        assert!(v.stack().is_busy());
        v.tick(ms(650));
        assert!(!v.stack().is_busy());
        assert!(v.next_paper());
        assert_eq!(v.current_paper_id(), Some(PaperId(2)));
    }

    #[test]
    fn go_to_paper_staggers_and_settles() {
        let mut v = viewer(4);
        let job = v.go_to_paper(PaperId(3)).unwrap();
        assert_eq!(v.current_paper_id(), Some(PaperId(3)));
        assert_eq!(v.stack().left(), [PaperId(0), PaperId(1), PaperId(2)]);
        let last = v.animator().tween(PaperId(2)).unwrap();
        assert_eq!(last.begin(), ms(360), "two staggers after the first step");
        v.tick(ms(700));
        assert!(!v.job_settled(job));
        v.tick(ms(1010));
        assert!(v.job_settled(job));
        assert!(!v.stack().is_busy());

        let back = v.go_to_paper(PaperId(0)).unwrap();
        v.tick(ms(3000));
        assert!(v.job_settled(back));
        assert_eq!(v.current_paper_id(), Some(PaperId(0)));
        assert_eq!(v.surfaces().pose(PaperId(0)).unwrap().yaw, 0.0);
        let tilt = v.config().max_tilt_radians();
        for i in 1..4 {
            let yaw = v.surfaces().pose(PaperId(i)).unwrap().yaw;
            assert!(yaw.abs() <= tilt, "paper {i} tilt {yaw}");
        }
    }

    #[test]
    fn unknown_paper_is_ignored() {
        let mut v = viewer(2);
        assert_eq!(v.go_to_paper(PaperId(7)), None);
        assert!(!v.scroll_paper(PaperId(7), 10.0));
        assert_eq!(v.current_paper_id(), Some(PaperId(0)));
    }

    #[test]
    fn close_hides_middle_papers_and_open_restores() {
        let mut v = viewer(4);
        v.go_to_paper(PaperId(3)).unwrap();
        v.tick(ms(2000));
        let job = v.close_stack().unwrap();
        assert!(v.is_closed());
        assert_eq!(v.current_paper_id(), Some(PaperId(0)));
        assert!(!v.next_paper(), "closed stacks do not navigate");

        v.tick(ms(2001));
        assert_eq!(v.surfaces().priority(PaperId(2)), Some(5), "first step is boosted");
        assert!(v.surfaces().is_visible(PaperId(1)));

        // Last step begins at 2000 + 2 * 150 and lasts 400.
        v.tick(ms(2300 + 330));
        assert!(!v.surfaces().is_visible(PaperId(1)));
        assert!(!v.surfaces().is_visible(PaperId(2)));
        assert!(v.surfaces().is_visible(PaperId(0)));
        assert!(v.surfaces().is_visible(PaperId(3)));

        v.tick(ms(3000));
        assert!(v.job_settled(job));
        assert_eq!(v.surfaces().priority(PaperId(2)), Some(v.stack().render_priority(PaperId(2))));

        assert!(v.open_stack());
        assert!(!v.open_stack());
        assert!(v.surfaces().is_visible(PaperId(1)));
        assert!(v.next_paper());
    }

    #[test]
    fn pointer_on_other_papers_navigates() {
        let mut v = viewer(3);
        let hit = |paper| PointerHit {
            paper,
            uv: Point::new(0.5, 0.5),
            distance: 1.0,
        };
        assert_eq!(
            v.pointer_down(PointerId(1), &[hit(PaperId(2)), hit(PaperId(0))]),
            PointerOutcome::Navigated(PaperId(2))
        );
        v.tick(ms(2000));
        assert_eq!(
            v.pointer_down(PointerId(1), &[hit(PaperId(0))]),
            PointerOutcome::Navigated(PaperId(0)),
            "left-stack papers navigate back"
        );
        assert_eq!(v.pointer_down(PointerId(1), &[]), PointerOutcome::Ignored);
    }

    #[test]
    fn markdown_load_failure_uses_error_page() {
        let mut registry = PaperRegistry::new();
        let id = registry.register("doc", "Doc", SourceKind::Markdown, "doc.md");
        let mut v = PaperViewer::new(
            registry,
            ViewerConfig::standard(),
            Box::new(BlockGlyphs::default()),
        );
        assert!(v.load_paper(id, &mut NoAssets));
        let surface = v.surface(id).unwrap();
        assert!(surface.layout().is_none(), "error pages carry no layout");
        assert!(surface.scroll().full().height() > 0);
    }
}
