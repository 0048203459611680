// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Word tokenization and greedy line wrapping.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;

use super::inline::InlineRun;
use super::text::{TextBackend, TextStyle};
use super::{LayoutResult, LinkRegion, Segment};

/// A word or whitespace token from one inline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub(crate) text: &'a str,
    pub(crate) space: bool,
    pub(crate) run: usize,
}

/// Splits runs into alternating word and whitespace tokens.
///
/// Whitespace is kept as its own token so that wrapped lines advance by the
/// measured width of the spaces that separate words in the source.
pub(crate) fn tokenize(runs: &[InlineRun]) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for (run, r) in runs.iter().enumerate() {
        let mut start = 0;
        let mut in_space: Option<bool> = None;
        for (i, ch) in r.text.char_indices() {
            let space = ch.is_whitespace();
            match in_space {
                Some(prev) if prev != space => {
                    tokens.push(Token {
                        text: &r.text[start..i],
                        space: prev,
                        run,
                    });
                    start = i;
                }
                _ => {}
            }
            in_space = Some(space);
        }
        if let Some(space) = in_space {
            tokens.push(Token {
                text: &r.text[start..],
                space,
                run,
            });
        }
    }
    tokens
}

/// Horizontal and vertical frame for the lines of one block.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LineFrame {
    /// Left edge of text, after margin and indent.
    pub(crate) left: f64,
    /// Width available to text.
    pub(crate) usable: f64,
    /// Vertical advance per visual line.
    pub(crate) line_height: f64,
    /// Baseline offset from the top of a line.
    pub(crate) ascent: f64,
    /// Link band above the baseline.
    pub(crate) band_above: f64,
    /// Link band below the baseline.
    pub(crate) band_below: f64,
}

/// Greedily wraps `runs` into visual lines starting at `top`.
///
/// Returns the y coordinate just below the last emitted line. A single word
/// wider than the usable width is placed alone and allowed to overflow.
pub(crate) fn wrap_runs<T: TextBackend + ?Sized>(
    runs: &[InlineRun],
    base: TextStyle,
    frame: &LineFrame,
    top: f64,
    text: &T,
    out: &mut LayoutResult,
) -> f64 {
    let tokens = tokenize(runs);
    let style_of = |run: usize| TextStyle {
        bold: base.bold || runs[run].bold,
        italic: base.italic || runs[run].italic,
        ..base
    };

    let mut y = top;
    let mut line: Vec<(Token<'_>, f64)> = Vec::new();
    let mut line_width = 0.0;

    for tok in tokens {
        if tok.space && line.is_empty() {
            continue;
        }
        let w = text.measure(tok.text, &style_of(tok.run));
        if !tok.space && !line.is_empty() && line_width + w > frame.usable {
            emit_line(&mut line, runs, &style_of, frame, y, out);
            y += frame.line_height;
            line_width = 0.0;
        }
        line.push((tok, w));
        line_width += w;
    }
    if !line.is_empty() {
        emit_line(&mut line, runs, &style_of, frame, y, out);
        y += frame.line_height;
    }
    y
}

fn emit_line(
    line: &mut Vec<(Token<'_>, f64)>,
    runs: &[InlineRun],
    style_of: &dyn Fn(usize) -> TextStyle,
    frame: &LineFrame,
    top: f64,
    out: &mut LayoutResult,
) {
    while line.last().is_some_and(|(t, _)| t.space) {
        line.pop();
    }
    let baseline = top + frame.ascent;
    let mut x = frame.left;
    // Open link region for the current line: (url run, x0, x1).
    let mut open: Option<(usize, f64, f64)> = None;

    for &(tok, w) in line.iter() {
        let link = runs[tok.run].link.as_deref();
        match (open, link) {
            (Some((r, x0, x1)), Some(url)) if runs[r].link.as_deref() == Some(url) => {
                open = Some((r, x0, if tok.space { x1 } else { x + w }));
            }
            _ => {
                close_region(open.take(), runs, baseline, frame, out);
                if link.is_some() && !tok.space {
                    open = Some((tok.run, x, x + w));
                }
            }
        }
        if !tok.space {
            out.segments.push(Segment {
                text: String::from(tok.text),
                x,
                y: baseline,
                width: w,
                style: style_of(tok.run),
                link: link.map(String::from),
            });
        }
        x += w;
    }
    close_region(open, runs, baseline, frame, out);
    line.clear();
}

fn close_region(
    open: Option<(usize, f64, f64)>,
    runs: &[InlineRun],
    baseline: f64,
    frame: &LineFrame,
    out: &mut LayoutResult,
) {
    let Some((run, x0, x1)) = open else {
        return;
    };
    let Some(url) = runs[run].link.as_ref() else {
        return;
    };
    out.links.push(LinkRegion {
        url: url.clone(),
        rect: Rect::new(
            x0,
            baseline - frame.band_above,
            x1,
            baseline + frame.band_below,
        ),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::inline::parse_inline;
    use crate::layout::text::BlockGlyphs;

    fn frame(usable: f64) -> LineFrame {
        LineFrame {
            left: 10.0,
            usable,
            line_height: 20.0,
            ascent: 14.0,
            band_above: 14.0,
            band_below: 4.0,
        }
    }

    #[test]
    fn tokenize_preserves_whitespace() {
        let runs = parse_inline("ab  cd **e**");
        let toks: Vec<_> = tokenize(&runs).iter().map(|t| (t.text, t.space)).collect();
        assert_eq!(
            toks,
            [("ab", false), ("  ", true), ("cd", false), (" ", true), ("e", false)]
        );
    }

    #[test]
    fn wraps_on_overflow_and_drops_trailing_space() {
        // Each char is 5px at size 10; usable 50px fits "aaaa bbbb" (45px).
        let runs = parse_inline("aaaa bbbb cccc");
        let mut out = LayoutResult::default();
        let end = wrap_runs(
            &runs,
            TextStyle::regular(10.0),
            &frame(50.0),
            0.0,
            &BlockGlyphs::default(),
            &mut out,
        );
        assert_eq!(end, 40.0, "two lines");
        let ys: Vec<f64> = out.segments.iter().map(|s| s.y).collect();
        assert_eq!(ys, [14.0, 14.0, 34.0]);
        assert_eq!(out.segments[2].x, 10.0, "wrapped word starts at left edge");
    }

    #[test]
    fn oversized_word_overflows_alone() {
        let runs = parse_inline("tiny enormousword tail");
        let mut out = LayoutResult::default();
        wrap_runs(
            &runs,
            TextStyle::regular(10.0),
            &frame(30.0),
            0.0,
            &BlockGlyphs::default(),
            &mut out,
        );
        let big = &out.segments[1];
        assert_eq!(big.text, "enormousword");
        assert_eq!(big.x, 10.0);
        assert!(big.width > 30.0, "overflow is accepted");
        assert_eq!(out.segments[2].y, big.y + 20.0, "next word moves on");
    }

    #[test]
    fn adjacent_link_words_share_one_region() {
        let runs = parse_inline("go [two words](https://a.b) end");
        let mut out = LayoutResult::default();
        wrap_runs(
            &runs,
            TextStyle::regular(10.0),
            &frame(500.0),
            0.0,
            &BlockGlyphs::default(),
            &mut out,
        );
        assert_eq!(out.links.len(), 1);
        let region = &out.links[0];
        assert_eq!(region.url, "https://a.b");
        // "go " is 15px, "two words" is 45px.
        assert_eq!(region.rect, Rect::new(25.0, 0.0, 70.0, 18.0));
    }
}
