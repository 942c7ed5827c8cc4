//! # Text Wrapping and Shrink-to-Fit
//!
//! Greedy word wrapping against a width-measurement callback, and the
//! linear font-size search that shrinks text until it fits a bounded
//! width. Both are pure: they read the metric, never the canvas.
//!
//! The wrap contract is deliberately simple. Paragraphs split on explicit
//! line breaks (blank lines survive), words pack greedily, and a word
//! wider than the whole box is split character by character so no call
//! ever produces a line wider than the box, short of a single character
//! that is itself too wide.

use log::warn;

use crate::canvas::{FontRef, MeasureText};

/// Slack allowed when comparing a measured width against a box width.
///
/// Boundary-width text measures a hair over the box on some metrics; without
/// this slack the shrink loop oscillates at the boundary and runs to the
/// floor on text that visually fits.
pub const WIDTH_TOLERANCE: f64 = 0.1;

/// Font size decrement used by every shrink loop.
pub const SHRINK_STEP: f64 = 0.5;

/// The outcome of wrapping (and possibly shrinking) a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapResult {
    /// Wrapped lines, top to bottom.
    pub lines: Vec<String>,
    /// The font size the lines were wrapped at.
    pub font_size: f64,
    /// Vertical advance per line at that size.
    pub line_height: f64,
}

impl WrapResult {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Break `text` into lines no wider than `max_width` at `font_size`.
///
/// Degenerate inputs degrade instead of failing: empty text yields a
/// single empty line, and a non-finite or non-positive `max_width` (or a
/// metric that cannot measure anything) returns the text split only on
/// explicit line breaks.
pub fn wrap_text<M: MeasureText + ?Sized>(
    measure: &M,
    font: FontRef,
    text: &str,
    font_size: f64,
    max_width: f64,
) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    if !max_width.is_finite() || max_width <= 0.0 {
        return normalized.split('\n').map(str::to_string).collect();
    }

    // Probe the metric once. A callback returning NaN or zero widths would
    // make every fit check fail and degrade wrapping to one word per line,
    // so fall back to explicit line breaks only.
    let probe = measure.measure_text_width("M", font, font_size);
    if !probe.is_finite() || probe <= 0.0 {
        warn!("text metric returned a non-positive width; wrapping disabled");
        return normalized.split('\n').map(str::to_string).collect();
    }

    let fits = |candidate: &str| {
        measure.measure_text_width(candidate, font, font_size) <= max_width + WIDTH_TOLERANCE
    };

    let mut lines: Vec<String> = Vec::new();
    for paragraph in normalized.split('\n') {
        wrap_paragraph(paragraph, &fits, &mut lines);
    }

    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Wrap a single paragraph (no embedded line breaks) into `out`.
fn wrap_paragraph(paragraph: &str, fits: &dyn Fn(&str) -> bool, out: &mut Vec<String>) {
    let mut words = paragraph.split_whitespace().peekable();
    if words.peek().is_none() {
        // Empty (or whitespace-only) paragraph: preserve the blank line.
        out.push(String::new());
        return;
    }

    let mut line = String::new();
    for word in words {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if fits(&candidate) {
            line = candidate;
            continue;
        }

        if !line.is_empty() {
            out.push(std::mem::take(&mut line));
        }
        if fits(word) {
            line = word.to_string();
        } else {
            line = split_long_word(word, fits, out);
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
}

/// Split a word wider than the box into longest-prefix pieces.
///
/// Emits every full piece into `out` and returns the remainder, which
/// starts the next line. Each piece keeps at least one character, so the
/// loop always makes progress even when a single character overflows the
/// box.
fn split_long_word(word: &str, fits: &dyn Fn(&str) -> bool, out: &mut Vec<String>) -> String {
    let mut piece = String::new();
    for ch in word.chars() {
        let mut next = piece.clone();
        next.push(ch);
        if !piece.is_empty() && !fits(&next) {
            out.push(piece);
            piece = ch.to_string();
        } else {
            piece = next;
        }
    }
    piece
}

/// Width of the widest line at `font_size`, per the same metric wrapping used.
pub fn widest_line<M: MeasureText + ?Sized>(
    measure: &M,
    font: FontRef,
    lines: &[String],
    font_size: f64,
) -> f64 {
    lines
        .iter()
        .map(|l| measure.measure_text_width(l, font, font_size))
        .fold(0.0, f64::max)
}

/// Wrap `text`, lowering the font size in [`SHRINK_STEP`] decrements until
/// the widest line fits `max_width`, or `min_size` is reached.
///
/// This is a forward linear scan, not a binary search: re-wrapping at a
/// smaller size can change line counts non-monotonically, so only probing
/// every step is safe. The loop is bounded by the number of steps between
/// `desired_size` and `min_size` regardless of what the metric returns.
pub fn resolve_width<M: MeasureText + ?Sized>(
    measure: &M,
    font: FontRef,
    text: &str,
    desired_size: f64,
    min_size: f64,
    line_height_multiplier: f64,
    max_width: f64,
) -> WrapResult {
    let floor = min_size.min(desired_size);
    let mut size = desired_size;
    let max_steps = ((desired_size - floor) / SHRINK_STEP).max(0.0) as usize + 1;

    let mut lines = wrap_text(measure, font, text, size, max_width);
    for _ in 0..max_steps {
        let widest = widest_line(measure, font, &lines, size);
        if widest <= max_width + WIDTH_TOLERANCE || size <= floor {
            break;
        }
        size = (size - SHRINK_STEP).max(floor);
        lines = wrap_text(measure, font, text, size, max_width);
    }

    WrapResult {
        lines,
        font_size: size,
        line_height: size * line_height_multiplier,
    }
}
