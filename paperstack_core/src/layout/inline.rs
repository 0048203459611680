// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inline emphasis and link parsing.
//!
//! Recognised spans are `[text](url)`, `**bold**`, and `*italic*`. Parsing is
//! a single left-to-right pass. Link text may carry bold/italic one level
//! deep; emphasis spans are taken literally inside (no nested links or
//! nested emphasis). An opening marker without a matching close is plain
//! text.

use alloc::string::String;
use alloc::vec::Vec;

/// A formatted run of inline text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineRun {
    /// The run's text with markup removed.
    pub text: String,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Link target, when the run is part of a link.
    pub link: Option<String>,
}

/// Splits one source line into formatted runs.
#[must_use]
pub fn parse_inline(line: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            if let Some((text, url, tail)) = split_link(rest) {
                flush_plain(&mut plain, &mut runs);
                runs.extend(parse_emphasis(text, Some(url)));
                rest = tail;
                continue;
            }
        } else if ch == '*' {
            if let Some((run, tail)) = split_emphasis(rest, None) {
                flush_plain(&mut plain, &mut runs);
                runs.push(run);
                rest = tail;
                continue;
            }
        }
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush_plain(&mut plain, &mut runs);
    runs
}

/// Parses emphasis only; used for link text.
fn parse_emphasis(text: &str, link: Option<&str>) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if ch == '*' {
            if let Some((run, tail)) = split_emphasis(rest, link) {
                if !plain.is_empty() {
                    runs.push(plain_run(core::mem::take(&mut plain), link));
                }
                runs.push(run);
                rest = tail;
                continue;
            }
        }
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    if !plain.is_empty() {
        runs.push(plain_run(plain, link));
    }
    runs
}

fn plain_run(text: String, link: Option<&str>) -> InlineRun {
    InlineRun {
        text,
        bold: false,
        italic: false,
        link: link.map(String::from),
    }
}

fn flush_plain(plain: &mut String, runs: &mut Vec<InlineRun>) {
    if !plain.is_empty() {
        runs.push(plain_run(core::mem::take(plain), None));
    }
}

/// Splits `[text](url)tail` at the start of `s`.
fn split_link(s: &str) -> Option<(&str, &str, &str)> {
    let body = s.strip_prefix('[')?;
    let close = body.find("](")?;
    let text = &body[..close];
    let after = &body[close + 2..];
    let end = after.find(')')?;
    let url = &after[..end];
    if url.is_empty() {
        return None;
    }
    Some((text, url, &after[end + 1..]))
}

/// Splits `**bold**tail` or `*italic*tail` at the start of `s`.
fn split_emphasis<'a>(s: &'a str, link: Option<&str>) -> Option<(InlineRun, &'a str)> {
    let (marker, bold) = if s.starts_with("**") {
        ("**", true)
    } else {
        ("*", false)
    };
    let body = &s[marker.len()..];
    let end = body.find(marker)?;
    if end == 0 {
        return None;
    }
    let run = InlineRun {
        text: String::from(&body[..end]),
        bold,
        italic: !bold,
        link: link.map(String::from),
    };
    Some((run, &body[end + marker.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(runs: &[InlineRun]) -> Vec<&str> {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn plain_line_is_one_run() {
        let runs = parse_inline("just words here");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "just words here");
        assert!(!runs[0].bold && !runs[0].italic && runs[0].link.is_none());
    }

    #[test]
    fn bold_and_italic_spans() {
        let runs = parse_inline("a **b** c *d* e");
        assert_eq!(texts(&runs), ["a ", "b", " c ", "d", " e"]);
        assert!(runs[1].bold && !runs[1].italic);
        assert!(runs[3].italic && !runs[3].bold);
    }

    #[test]
    fn link_text_may_carry_emphasis() {
        let runs = parse_inline("see [the **docs** page](https://x.dev) now");
        assert_eq!(texts(&runs), ["see ", "the ", "docs", " page", " now"]);
        for run in &runs[1..4] {
            assert_eq!(run.link.as_deref(), Some("https://x.dev"));
        }
        assert!(runs[2].bold);
        assert!(runs[4].link.is_none());
    }

    #[test]
    fn emphasis_does_not_nest_links() {
        let runs = parse_inline("**[a](u)**");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "[a](u)");
        assert!(runs[0].bold);
        assert!(runs[0].link.is_none());
    }

    #[test]
    fn unmatched_markers_are_literal() {
        let runs = parse_inline("2 * 3 and [broken](");
        assert_eq!(texts(&runs), ["2 * 3 and [broken]("]);
    }
}
