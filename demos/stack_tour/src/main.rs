// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless frame loop that pages through a small paper stack.
//!
//! Loads four papers from an in-memory asset store, rendering text with
//! system fonts when available, then drives the viewer
//! through next/previous, a jump, a late image, wheel and drag scrolling,
//! and a close/open cycle. Events go to both a
//! [`PrettyPrintSink`](paperstack_debug::pretty::PrettyPrintSink) (stdout) and
//! a [`RecorderSink`](paperstack_debug::recorder::RecorderSink); the recording
//! is exported as a Chrome trace at the end.
//!
//! Usage: `stack_tour [trace.json]`

use std::collections::HashMap;
use std::fs::File;
use std::fmt::Write as _;
use std::io::{self, BufWriter, Write};

use kurbo::{Point, Rect, Size};

use paperstack_core::hit::{PointerHit, PointerId};
use paperstack_core::layout::{BlockGlyphs, CosmicText, TextBackend};
use paperstack_core::loader::{AssetError, AssetLoader, DecodedImage};
use paperstack_core::overlay::{OverlayContent, OverlaySync};
use paperstack_core::paper::{PaperId, PaperRegistry, SourceKind};
use paperstack_core::raster::{Color, Raster};
use paperstack_core::scene::SceneSurfaces;
use paperstack_core::time::{HostTime, Timebase};
use paperstack_core::trace::{
    AssetFailureEvent, ContentReflowEvent, FrameTickEvent, LookupMissEvent, NavigationEvent,
    TraceSink, TweenBeginEvent, TweenEndEvent, ViewportRedrawEvent,
};
use paperstack_core::transform::Transform3d;
use paperstack_core::viewer::{PaperViewer, ViewerConfig};

use paperstack_debug::pretty::PrettyPrintSink;
use paperstack_debug::recorder::RecorderSink;

/// ≈60 Hz.
const FRAME_MS: u64 = 16;
const DEFAULT_TRACE: &str = "stack_tour_trace.json";

// -- sinks ----------------------------------------------------------------

/// Forwards every event to both sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        self.0.on_frame_tick(e);
        self.1.on_frame_tick(e);
    }

    fn on_navigation(&mut self, e: &NavigationEvent) {
        self.0.on_navigation(e);
        self.1.on_navigation(e);
    }

    fn on_tween_begin(&mut self, e: &TweenBeginEvent) {
        self.0.on_tween_begin(e);
        self.1.on_tween_begin(e);
    }

    fn on_tween_end(&mut self, e: &TweenEndEvent) {
        self.0.on_tween_end(e);
        self.1.on_tween_end(e);
    }

    fn on_lookup_miss(&mut self, e: &LookupMissEvent) {
        self.0.on_lookup_miss(e);
        self.1.on_lookup_miss(e);
    }

    fn on_asset_failure(&mut self, e: &AssetFailureEvent<'_>) {
        self.0.on_asset_failure(e);
        self.1.on_asset_failure(e);
    }

    fn on_content_reflow(&mut self, e: &ContentReflowEvent) {
        self.0.on_content_reflow(e);
        self.1.on_content_reflow(e);
    }

    fn on_viewport_redraw(&mut self, e: &ViewportRedrawEvent) {
        self.0.on_viewport_redraw(e);
        self.1.on_viewport_redraw(e);
    }
}

// -- host stand-ins -------------------------------------------------------

/// Serves text and page renders from memory and queues image requests.
#[derive(Default)]
struct MemoryAssets {
    texts: HashMap<String, String>,
    images: HashMap<String, (u32, u32)>,
    requested: Vec<(PaperId, usize, String)>,
}

impl AssetLoader for MemoryAssets {
    fn fetch_text(&mut self, locator: &str) -> Result<String, AssetError> {
        self.texts
            .get(locator)
            .cloned()
            .ok_or_else(|| AssetError::Missing {
                locator: locator.to_owned(),
            })
    }

    fn render_document_first_page(&mut self, locator: &str) -> Result<Raster, AssetError> {
        if !locator.ends_with(".pdf") {
            return Err(AssetError::Decode {
                locator: locator.to_owned(),
            });
        }
        let mut page = Raster::new(800, 1035, Color::WHITE);
        page.fill_rect(Rect::new(60.0, 60.0, 740.0, 120.0), Color::INK);
        for row in 0..20 {
            let y = 160.0 + f64::from(row) * 40.0;
            page.fill_rect(Rect::new(60.0, y, 700.0, y + 12.0), Color::RULE);
        }
        Ok(page)
    }

    fn request_image(&mut self, paper: PaperId, ordinal: usize, url: &str) {
        self.requested.push((paper, ordinal, url.to_owned()));
    }
}

impl MemoryAssets {
    fn decode(&self, url: &str) -> Result<DecodedImage, AssetError> {
        let &(w, h) = self.images.get(url).ok_or_else(|| AssetError::Network {
            locator: url.to_owned(),
            reason: "not in the store".to_owned(),
        })?;
        let mut raster = Raster::new(w, h, Color::PLACEHOLDER);
        raster.stroke_rect(
            Rect::new(0.0, 0.0, f64::from(w), f64::from(h)),
            Color::INK,
        );
        Ok(DecodedImage::from_raster(raster))
    }
}

/// Counts what would be sent to a real scene graph.
#[derive(Debug, Default)]
struct CountingScene {
    transforms: usize,
    visibility: usize,
    priorities: usize,
    textures: usize,
}

impl SceneSurfaces for CountingScene {
    fn position_surface(&mut self, _paper: PaperId, _transform: Transform3d) {
        self.transforms += 1;
    }

    fn set_surface_visible(&mut self, _paper: PaperId, _visible: bool) {
        self.visibility += 1;
    }

    fn set_surface_render_priority(&mut self, _paper: PaperId, _order: i32) {
        self.priorities += 1;
    }

    fn update_surface_texture(&mut self, _paper: PaperId, _raster: &Raster) {
        self.textures += 1;
    }
}

/// Prints overlay traffic.
struct PrintOverlay;

impl OverlaySync for PrintOverlay {
    fn register_overlay(
        &mut self,
        paper: PaperId,
        content: &OverlayContent,
        viewport: Size,
        content_height: f64,
    ) {
        println!(
            "[overlay] register paper={} nodes={} viewport={}x{} height={content_height}",
            paper.0,
            content.nodes.len(),
            viewport.width,
            viewport.height,
        );
    }

    fn set_scroll_offset(&mut self, paper: PaperId, offset: f64) {
        println!("[overlay] paper={} offset={offset:.1}", paper.0);
    }

    fn update_content_height(&mut self, paper: PaperId, height: f64) {
        println!("[overlay] paper={} height={height}", paper.0);
    }
}

// -- script ---------------------------------------------------------------

struct Tour {
    viewer: PaperViewer<Tee<PrettyPrintSink, RecorderSink>>,
    scene: CountingScene,
    overlay: PrintOverlay,
    now: u64,
}

impl Tour {
    /// Runs frames for `ms` milliseconds.
    fn run(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.now += FRAME_MS;
            self.viewer.tick(HostTime::from_millis(self.now));
            self.viewer.present(&mut self.scene);
            self.viewer.sync_overlays(&mut self.overlay);
        }
    }
}

/// A raycast hit at the horizontal centre of `paper`.
fn hit(paper: PaperId, v: f64) -> PointerHit {
    PointerHit {
        paper,
        uv: Point::new(0.5, v),
        distance: 1.0,
    }
}

fn notes_source() -> String {
    let mut source = String::from(
        "# Field notes\n\n\
         See the [project page](https://example.com/paperstack) for **context**.\n\n\
         ![sketch](mem://sketch.png)\n\n---\n",
    );
    for i in 1..=30 {
        let _ = write!(
            source,
            "\n## Entry {i}\n\n\
             - observed *something* worth writing down\n\
             - followed up on entry {}\n",
            i - 1
        );
    }
    source
}

/// System fonts when there are any, glyph boxes otherwise.
fn text_backend() -> Box<dyn TextBackend> {
    let fonts = CosmicText::new();
    if fonts.has_fonts() {
        Box::new(fonts)
    } else {
        println!("no system fonts found; drawing glyph boxes");
        Box::new(BlockGlyphs::default())
    }
}

fn main() -> io::Result<()> {
    let trace_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TRACE.to_owned());
    let timebase = Timebase::NANOS;

    let mut assets = MemoryAssets::default();
    assets.texts.insert("mem://notes.md".to_owned(), notes_source());
    assets.images.insert("mem://sketch.png".to_owned(), (320, 200));

    let mut registry = PaperRegistry::new();
    let cover = registry.register("cover", "Paperstack", SourceKind::Placeholder, "");
    let notes = registry.register("notes", "Field notes", SourceKind::Markdown, "mem://notes.md");
    let report = registry.register("report", "Report", SourceKind::Pdf, "mem://report.pdf");
    let broken = registry.register("broken", "Broken", SourceKind::Markdown, "mem://missing.md");

    let sink = Tee(
        PrettyPrintSink::with_writer(Box::new(io::stdout()) as Box<dyn Write>, timebase),
        RecorderSink::new(),
    );
    let mut viewer =
        PaperViewer::with_sink(registry, ViewerConfig::standard(), text_backend(), sink);
    viewer.on_current_paper_change(Box::new(|paper| {
        println!("[listener] current paper is now {}", paper.0);
    }));
    let loaded = viewer.load_all(&mut assets);
    println!("loaded {loaded} papers");

    let mut tour = Tour {
        viewer,
        scene: CountingScene::default(),
        overlay: PrintOverlay,
        now: 0,
    };
    tour.run(100);

    // Page forward; the second press lands while the first is in flight.
    tour.viewer.next_paper();
    tour.viewer.next_paper();
    tour.run(200);

    // The image for the notes arrives late and shrinks the document.
    for (paper, ordinal, url) in std::mem::take(&mut assets.requested) {
        let result = assets.decode(&url);
        tour.viewer.resolve_image(paper, ordinal, result);
    }
    tour.run(600);

    // Wheel, then drag the notes upward by a quarter viewport.
    tour.viewer.wheel(&[hit(notes, 0.5)], 400.0);
    let press = hit(notes, 0.25);
    let outcome = tour.viewer.pointer_down(PointerId(1), &[press]);
    println!("pointer down: {outcome:?}");
    tour.viewer.pointer_move(PointerId(1), Point::new(0.5, 0.5));
    tour.viewer.pointer_up(PointerId(1));
    tour.run(50);

    // Jump to the end, then click the cover on the left stack.
    tour.viewer.go_to_paper(broken);
    tour.run(1200);
    let outcome = tour.viewer.pointer_down(PointerId(2), &[hit(cover, 0.5)]);
    println!("pointer down: {outcome:?}");
    tour.run(1200);
    tour.viewer.go_to_paper(report);
    tour.run(1200);

    // Close and reopen.
    tour.viewer.close_stack();
    tour.run(1200);
    tour.viewer.open_stack();
    tour.run(700);

    println!(
        "scene: {} transforms, {} visibility, {} priorities, {} textures",
        tour.scene.transforms, tour.scene.visibility, tour.scene.priorities, tour.scene.textures,
    );

    // -- export Chrome trace ----------------------------------------------
    let Tee(_, recorder) = tour.viewer.into_sink();
    let file = File::create(&trace_path)?;
    let mut writer = BufWriter::new(file);
    paperstack_debug::chrome::export(recorder.as_bytes(), timebase, &mut writer)?;
    println!("Wrote {trace_path}");
    Ok(())
}
