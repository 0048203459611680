// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, one tag byte followed by the event's
//! fields. [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! Floats are stored as their IEEE-754 bits. Asset locators are stored as a
//! `u32` length followed by UTF-8 bytes.

use paperstack_core::animator::{TweenEnd, TweenToken};
use paperstack_core::loader::AssetErrorKind;
use paperstack_core::paper::PaperId;
use paperstack_core::time::HostTime;
use paperstack_core::trace::{
    AssetFailureEvent, ContentReflowEvent, FrameTickEvent, LookupMissEvent, NavigationEvent,
    NavigationKind, NavigationOutcome, TraceSink, TweenBeginEvent, TweenEndEvent,
    ViewportRedrawEvent,
};
use paperstack_core::tween::TweenKind;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_TICK: u8 = 1;
const TAG_NAVIGATION: u8 = 2;
const TAG_TWEEN_BEGIN: u8 = 3;
const TAG_TWEEN_END: u8 = 4;
const TAG_LOOKUP_MISS: u8 = 5;
const TAG_ASSET_FAILURE: u8 = 6;
const TAG_CONTENT_REFLOW: u8 = 7;
const TAG_VIEWPORT_REDRAW: u8 = 8;

/// Operation names a lookup miss can carry. Unlisted names record as `"?"`.
const OPERATIONS: [&str; 5] = [
    "load_paper",
    "resolve_image",
    "go_to_paper",
    "scroll_paper",
    "pointer_down",
];

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.ticks());
    }

    fn write_option_paper(&mut self, v: Option<PaperId>) {
        match v {
            Some(p) => {
                self.write_u8(1);
                self.write_u32(p.0);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        self.write_u8(TAG_FRAME_TICK);
        self.write_u64(e.frame_index);
        self.write_time(e.now);
        self.write_u32(e.active_tweens);
        self.write_u32(e.active_jobs);
    }

    fn on_navigation(&mut self, e: &NavigationEvent) {
        self.write_u8(TAG_NAVIGATION);
        self.write_time(e.at);
        self.write_u8(match e.kind {
            NavigationKind::Next => 0,
            NavigationKind::Previous => 1,
            NavigationKind::GoTo => 2,
            NavigationKind::Close => 3,
            NavigationKind::Open => 4,
        });
        self.write_option_paper(e.from);
        self.write_option_paper(e.to);
        self.write_u8(match e.outcome {
            NavigationOutcome::Started => 0,
            NavigationOutcome::Busy => 1,
            NavigationOutcome::AtBoundary => 2,
            NavigationOutcome::Closed => 3,
        });
    }

    fn on_tween_begin(&mut self, e: &TweenBeginEvent) {
        self.write_u8(TAG_TWEEN_BEGIN);
        self.write_time(e.at);
        self.write_u32(e.paper.0);
        self.write_u64(e.token.0);
        self.write_u8(match e.kind {
            TweenKind::Advance => 0,
            TweenKind::Retreat => 1,
            TweenKind::Rotation => 2,
        });
        self.write_time(e.begin);
        self.write_time(e.end);
    }

    fn on_tween_end(&mut self, e: &TweenEndEvent) {
        self.write_u8(TAG_TWEEN_END);
        self.write_time(e.at);
        self.write_u32(e.paper.0);
        self.write_u64(e.token.0);
        self.write_u8(match e.end {
            TweenEnd::Finished => 0,
            TweenEnd::Cancelled => 1,
        });
    }

    fn on_lookup_miss(&mut self, e: &LookupMissEvent) {
        self.write_u8(TAG_LOOKUP_MISS);
        self.write_time(e.at);
        self.write_u32(e.paper.0);
        let op = OPERATIONS
            .iter()
            .position(|&o| o == e.operation)
            .and_then(|i| u8::try_from(i).ok())
            .unwrap_or(u8::MAX);
        self.write_u8(op);
    }

    fn on_asset_failure(&mut self, e: &AssetFailureEvent<'_>) {
        self.write_u8(TAG_ASSET_FAILURE);
        self.write_time(e.at);
        self.write_u32(e.paper.0);
        self.write_u8(match e.kind {
            AssetErrorKind::Network => 0,
            AssetErrorKind::Decode => 1,
            AssetErrorKind::Missing => 2,
        });
        self.write_str(e.locator);
    }

    fn on_content_reflow(&mut self, e: &ContentReflowEvent) {
        self.write_u8(TAG_CONTENT_REFLOW);
        self.write_time(e.at);
        self.write_u32(e.paper.0);
        self.write_u32(e.height);
        self.write_f64(e.offset);
        self.write_u8(u8::from(e.clamped));
    }

    fn on_viewport_redraw(&mut self, e: &ViewportRedrawEvent) {
        self.write_u8(TAG_VIEWPORT_REDRAW);
        self.write_time(e.at);
        self.write_u32(e.paper.0);
        self.write_f64(e.offset);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameTickEvent`].
    FrameTick(FrameTickEvent),
    /// A [`NavigationEvent`].
    Navigation(NavigationEvent),
    /// A [`TweenBeginEvent`].
    TweenBegin(TweenBeginEvent),
    /// A [`TweenEndEvent`].
    TweenEnd(TweenEndEvent),
    /// A [`LookupMissEvent`].
    LookupMiss(LookupMissEvent),
    /// An [`AssetFailureEvent`] with an owned locator.
    AssetFailure {
        /// Host time.
        at: HostTime,
        /// Paper.
        paper: PaperId,
        /// Error class.
        kind: AssetErrorKind,
        /// Locator that failed.
        locator: String,
    },
    /// A [`ContentReflowEvent`].
    ContentReflow(ContentReflowEvent),
    /// A [`ViewportRedrawEvent`].
    ViewportRedraw(ViewportRedrawEvent),
}

impl RecordedEvent {
    /// Host time the event happened at.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::FrameTick(e) => e.now,
            Self::Navigation(e) => e.at,
            Self::TweenBegin(e) => e.at,
            Self::TweenEnd(e) => e.at,
            Self::LookupMiss(e) => e.at,
            Self::AssetFailure { at, .. } => *at,
            Self::ContentReflow(e) => e.at,
            Self::ViewportRedraw(e) => e.at,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_paper(&mut self) -> Option<PaperId> {
        self.read_u32().map(PaperId)
    }

    fn read_option_paper(&mut self) -> Option<Option<PaperId>> {
        let present = self.read_u8()?;
        let id = self.read_u32()?;
        Some((present != 0).then_some(PaperId(id)))
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    fn decode_frame_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameTick(FrameTickEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            active_tweens: self.read_u32()?,
            active_jobs: self.read_u32()?,
        }))
    }

    fn decode_navigation(&mut self) -> Option<RecordedEvent> {
        let at = self.read_time()?;
        let kind = match self.read_u8()? {
            0 => NavigationKind::Next,
            1 => NavigationKind::Previous,
            2 => NavigationKind::GoTo,
            3 => NavigationKind::Close,
            _ => NavigationKind::Open,
        };
        let from = self.read_option_paper()?;
        let to = self.read_option_paper()?;
        let outcome = match self.read_u8()? {
            0 => NavigationOutcome::Started,
            1 => NavigationOutcome::Busy,
            2 => NavigationOutcome::AtBoundary,
            _ => NavigationOutcome::Closed,
        };
        Some(RecordedEvent::Navigation(NavigationEvent {
            at,
            kind,
            from,
            to,
            outcome,
        }))
    }

    fn decode_tween_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TweenBegin(TweenBeginEvent {
            at: self.read_time()?,
            paper: self.read_paper()?,
            token: TweenToken(self.read_u64()?),
            kind: match self.read_u8()? {
                0 => TweenKind::Advance,
                1 => TweenKind::Retreat,
                _ => TweenKind::Rotation,
            },
            begin: self.read_time()?,
            end: self.read_time()?,
        }))
    }

    fn decode_tween_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TweenEnd(TweenEndEvent {
            at: self.read_time()?,
            paper: self.read_paper()?,
            token: TweenToken(self.read_u64()?),
            end: if self.read_u8()? == 0 {
                TweenEnd::Finished
            } else {
                TweenEnd::Cancelled
            },
        }))
    }

    fn decode_lookup_miss(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LookupMiss(LookupMissEvent {
            at: self.read_time()?,
            paper: self.read_paper()?,
            operation: OPERATIONS
                .get(usize::from(self.read_u8()?))
                .copied()
                .unwrap_or("?"),
        }))
    }

    fn decode_asset_failure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AssetFailure {
            at: self.read_time()?,
            paper: self.read_paper()?,
            kind: match self.read_u8()? {
                0 => AssetErrorKind::Network,
                1 => AssetErrorKind::Decode,
                _ => AssetErrorKind::Missing,
            },
            locator: self.read_string()?,
        })
    }

    fn decode_content_reflow(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ContentReflow(ContentReflowEvent {
            at: self.read_time()?,
            paper: self.read_paper()?,
            height: self.read_u32()?,
            offset: self.read_f64()?,
            clamped: self.read_u8()? != 0,
        }))
    }

    fn decode_viewport_redraw(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ViewportRedraw(ViewportRedrawEvent {
            at: self.read_time()?,
            paper: self.read_paper()?,
            offset: self.read_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_TICK => self.decode_frame_tick(),
            TAG_NAVIGATION => self.decode_navigation(),
            TAG_TWEEN_BEGIN => self.decode_tween_begin(),
            TAG_TWEEN_END => self.decode_tween_end(),
            TAG_LOOKUP_MISS => self.decode_lookup_miss(),
            TAG_ASSET_FAILURE => self.decode_asset_failure(),
            TAG_CONTENT_REFLOW => self.decode_content_reflow(),
            TAG_VIEWPORT_REDRAW => self.decode_viewport_redraw(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_session(rec: &mut RecorderSink) {
        rec.on_navigation(&NavigationEvent {
            at: HostTime(10),
            kind: NavigationKind::GoTo,
            from: None,
            to: Some(PaperId(2)),
            outcome: NavigationOutcome::Started,
        });
        rec.on_tween_begin(&TweenBeginEvent {
            at: HostTime(10),
            paper: PaperId(1),
            token: TweenToken(4),
            kind: TweenKind::Retreat,
            begin: HostTime(190),
            end: HostTime(840),
        });
        rec.on_asset_failure(&AssetFailureEvent {
            at: HostTime(20),
            paper: PaperId(1),
            kind: AssetErrorKind::Decode,
            locator: "figures/plot.png",
        });
        rec.on_content_reflow(&ContentReflowEvent {
            at: HostTime(30),
            paper: PaperId(0),
            height: 2048,
            offset: 1013.5,
            clamped: true,
        });
        rec.on_lookup_miss(&LookupMissEvent {
            at: HostTime(40),
            paper: PaperId(99),
            operation: "go_to_paper",
        });
    }

    #[test]
    fn recorded_session_decodes_in_order() {
        let mut rec = RecorderSink::new();
        record_session(&mut rec);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);

        match &events[0] {
            RecordedEvent::Navigation(e) => {
                assert_eq!(e.from, None);
                assert_eq!(e.to, Some(PaperId(2)));
                assert_eq!(e.kind, NavigationKind::GoTo);
            }
            other => panic!("expected Navigation, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::TweenBegin(e) => {
                assert_eq!(e.kind, TweenKind::Retreat);
                assert_eq!((e.begin, e.end), (HostTime(190), HostTime(840)));
            }
            other => panic!("expected TweenBegin, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::AssetFailure { kind, locator, .. } => {
                assert_eq!(*kind, AssetErrorKind::Decode);
                assert_eq!(locator, "figures/plot.png");
            }
            other => panic!("expected AssetFailure, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::ContentReflow(e) => {
                assert_eq!(e.offset, 1013.5, "floats keep their exact bits");
                assert!(e.clamped);
            }
            other => panic!("expected ContentReflow, got {other:?}"),
        }
        match &events[4] {
            RecordedEvent::LookupMiss(e) => assert_eq!(e.operation, "go_to_paper"),
            other => panic!("expected LookupMiss, got {other:?}"),
        }
        let times: Vec<_> = events.iter().map(RecordedEvent::at).collect();
        assert!(times.is_sorted(), "events keep recording order");
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        record_session(&mut rec);
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 4, "the partial last record is dropped");
    }

    #[test]
    fn unknown_operation_records_as_placeholder() {
        let mut rec = RecorderSink::new();
        rec.on_lookup_miss(&LookupMissEvent {
            at: HostTime(0),
            paper: PaperId(1),
            operation: "something_else",
        });
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::LookupMiss(e)) => assert_eq!(e.operation, "?"),
            other => panic!("expected LookupMiss, got {other:?}"),
        }
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0, "no events in an empty buffer");
    }
}
