// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each paper gets its own track (`tid` = paper id + 1); viewer-wide events
//! (navigation, tick counters) go on track 0. Tweens become complete (`X`)
//! events spanning from their begin time to when they finished or were
//! cancelled.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use paperstack_core::animator::TweenEnd;
use paperstack_core::paper::PaperId;
use paperstack_core::time::{HostTime, Timebase};

use crate::pretty::{error_name, navigation_name, outcome_name, tween_name};
use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let us = |t: HostTime| timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0;
    let mut events: Vec<Value> = Vec::new();
    // token -> (paper, kind name, begin, planned end)
    let mut open: BTreeMap<u64, (PaperId, &'static str, HostTime, HostTime)> = BTreeMap::new();

    let span = |events: &mut Vec<Value>,
                    paper: PaperId,
                    name: &str,
                    begin: HostTime,
                    end: HostTime,
                    how: &str| {
        let end = end.max(begin);
        events.push(json!({
            "ph": "X",
            "name": name,
            "cat": "Tween",
            "ts": us(begin),
            "dur": us(end) - us(begin),
            "pid": 0,
            "tid": track(paper),
            "args": { "end": how }
        }));
    };

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameTick(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Activity",
                    "ts": us(e.now),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tweens": e.active_tweens,
                        "jobs": e.active_jobs,
                    }
                }));
            }
            RecordedEvent::Navigation(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": navigation_name(e.kind),
                    "cat": "Navigation",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "from": e.from.map(|p| p.0),
                        "to": e.to.map(|p| p.0),
                        "outcome": outcome_name(e.outcome),
                    }
                }));
            }
            RecordedEvent::TweenBegin(e) => {
                open.insert(e.token.0, (e.paper, tween_name(e.kind), e.begin, e.end));
            }
            RecordedEvent::TweenEnd(e) => {
                if let Some((paper, name, begin, _)) = open.remove(&e.token.0) {
                    let how = match e.end {
                        TweenEnd::Finished => "finished",
                        TweenEnd::Cancelled => "cancelled",
                    };
                    span(&mut events, paper, name, begin, e.at, how);
                }
            }
            RecordedEvent::LookupMiss(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "LookupMiss",
                    "cat": "Error",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "paper": e.paper.0,
                        "operation": e.operation,
                    }
                }));
            }
            RecordedEvent::AssetFailure {
                at,
                paper,
                kind,
                locator,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "AssetFailure",
                    "cat": "Error",
                    "ts": us(at),
                    "pid": 0,
                    "tid": track(paper),
                    "s": "t",
                    "args": {
                        "kind": error_name(kind),
                        "locator": locator,
                    }
                }));
            }
            RecordedEvent::ContentReflow(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Reflow",
                    "cat": "Document",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": track(e.paper),
                    "s": "t",
                    "args": {
                        "height": e.height,
                        "offset": e.offset,
                        "clamped": e.clamped,
                    }
                }));
            }
            RecordedEvent::ViewportRedraw(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Redraw",
                    "cat": "Document",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": track(e.paper),
                    "s": "t",
                    "args": { "offset": e.offset }
                }));
            }
        }
    }

    // Tweens still running when the recording stopped end where planned.
    for (paper, name, begin, end) in open.into_values() {
        span(&mut events, paper, name, begin, end, "unfinished");
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn track(paper: PaperId) -> u64 {
    u64::from(paper.0) + 1
}
