// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to milliseconds using a [`Timebase`].

use std::io::Write;

use paperstack_core::animator::TweenEnd;
use paperstack_core::loader::AssetErrorKind;
use paperstack_core::time::{HostTime, Timebase};
use paperstack_core::trace::{
    AssetFailureEvent, ContentReflowEvent, FrameTickEvent, LookupMissEvent, NavigationEvent,
    NavigationKind, NavigationOutcome, TraceSink, TweenBeginEvent, TweenEndEvent,
    ViewportRedrawEvent,
};
use paperstack_core::tween::TweenKind;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    /// Print every `frame_tick` instead of only those with activity.
    verbose_ticks: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("verbose_ticks", &self.verbose_ticks)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            verbose_ticks: false,
        }
    }

    /// Also prints idle ticks.
    #[must_use]
    pub fn verbose_ticks(mut self, verbose: bool) -> Self {
        self.verbose_ticks = verbose;
        self
    }

    /// Returns the destination.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1_000_000.0
    }
}

pub(crate) fn navigation_name(kind: NavigationKind) -> &'static str {
    match kind {
        NavigationKind::Next => "next",
        NavigationKind::Previous => "previous",
        NavigationKind::GoTo => "goto",
        NavigationKind::Close => "close",
        NavigationKind::Open => "open",
    }
}

pub(crate) fn outcome_name(outcome: NavigationOutcome) -> &'static str {
    match outcome {
        NavigationOutcome::Started => "started",
        NavigationOutcome::Busy => "busy",
        NavigationOutcome::AtBoundary => "boundary",
        NavigationOutcome::Closed => "closed",
    }
}

pub(crate) fn tween_name(kind: TweenKind) -> &'static str {
    match kind {
        TweenKind::Advance => "advance",
        TweenKind::Retreat => "retreat",
        TweenKind::Rotation => "rotation",
    }
}

pub(crate) fn error_name(kind: AssetErrorKind) -> &'static str {
    match kind {
        AssetErrorKind::Network => "network",
        AssetErrorKind::Decode => "decode",
        AssetErrorKind::Missing => "missing",
    }
}

fn paper(id: Option<paperstack_core::paper::PaperId>) -> String {
    id.map_or_else(|| String::from("-"), |p| p.0.to_string())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        if !self.verbose_ticks && e.active_tweens == 0 && e.active_jobs == 0 {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[tick] frame={} now={:.1}ms tweens={} jobs={}",
            e.frame_index,
            self.ms(e.now),
            e.active_tweens,
            e.active_jobs,
        );
    }

    fn on_navigation(&mut self, e: &NavigationEvent) {
        let _ = writeln!(
            self.writer,
            "[nav] {} {} -> {} {} at {:.1}ms",
            navigation_name(e.kind),
            paper(e.from),
            paper(e.to),
            outcome_name(e.outcome),
            self.ms(e.at),
        );
    }

    fn on_tween_begin(&mut self, e: &TweenBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[tween:begin] paper={} token={} {} {:.1}ms..{:.1}ms",
            e.paper.0,
            e.token.0,
            tween_name(e.kind),
            self.ms(e.begin),
            self.ms(e.end),
        );
    }

    fn on_tween_end(&mut self, e: &TweenEndEvent) {
        let how = match e.end {
            TweenEnd::Finished => "finished",
            TweenEnd::Cancelled => "cancelled",
        };
        let _ = writeln!(
            self.writer,
            "[tween:end] paper={} token={} {how} at {:.1}ms",
            e.paper.0,
            e.token.0,
            self.ms(e.at),
        );
    }

    fn on_lookup_miss(&mut self, e: &LookupMissEvent) {
        let _ = writeln!(
            self.writer,
            "[miss] {} ignored unknown paper {}",
            e.operation, e.paper.0,
        );
    }

    fn on_asset_failure(&mut self, e: &AssetFailureEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[asset] paper={} {} error loading {}",
            e.paper.0,
            error_name(e.kind),
            e.locator,
        );
    }

    fn on_content_reflow(&mut self, e: &ContentReflowEvent) {
        let clamped = if e.clamped { " clamped" } else { "" };
        let _ = writeln!(
            self.writer,
            "[reflow] paper={} height={}px offset={:.1}{clamped}",
            e.paper.0, e.height, e.offset,
        );
    }

    fn on_viewport_redraw(&mut self, e: &ViewportRedrawEvent) {
        let _ = writeln!(
            self.writer,
            "[redraw] paper={} offset={:.1} at {:.1}ms",
            e.paper.0,
            e.offset,
            self.ms(e.at),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperstack_core::paper::PaperId;

    #[test]
    fn pretty_print_navigation() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_navigation(&NavigationEvent {
            at: HostTime::from_millis(16),
            kind: NavigationKind::Next,
            from: Some(PaperId(0)),
            to: Some(PaperId(1)),
            outcome: NavigationOutcome::Started,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[nav] next 0 -> 1 started"), "got: {output}");
        assert!(output.contains("16.0ms"), "got: {output}");
    }

    #[test]
    fn idle_ticks_are_quiet_unless_verbose() {
        let tick = FrameTickEvent {
            frame_index: 3,
            now: HostTime(0),
            active_tweens: 0,
            active_jobs: 0,
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        quiet.on_frame_tick(&tick);
        assert!(quiet.into_writer().is_empty(), "idle tick printed");

        let mut loud =
            PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS).verbose_ticks(true);
        loud.on_frame_tick(&tick);
        let output = String::from_utf8(loud.into_writer()).unwrap();
        assert!(output.contains("frame=3"), "got: {output}");
    }
}
