//! # Field Boxes and the Pagination Cursor
//!
//! This is the heart of the engine.
//!
//! A report form is a fixed canvas with unbounded content. Every widget
//! rect can receive more text than it holds, every section can carry more
//! rows than a page. The rules here are applied in a fixed order:
//!
//! 1. Wrap the text to the box width at the preferred size.
//! 2. If it doesn't fit the box height, shrink the font in half-point
//!    steps down to the field's floor size.
//! 3. Whatever still doesn't fit at the floor is *diverted*, never cut:
//!    field overflow is routed to appended annex pages, and flowed
//!    sections continue onto fresh pages with their headers repeated.
//!
//! [`layout_in_box`] implements steps 1-2 and reports the diverted
//! remainder. [`PageCursor`] is the single vertical position every flowed
//! drawing operation advances; it lives for exactly one assembly call.

pub mod overflow;
pub mod table;

use log::debug;

use crate::canvas::{Canvas, MeasureText, FontRef, PageHandle};
use crate::model::{FieldStyle, PageConfig, Rect};
use crate::text::{wrap_text, SHRINK_STEP};

/// Inner padding between a widget rect and its text, on every side.
pub const FIELD_PADDING: f64 = 2.0;

/// Multiline is only worthwhile when the usable height clears this many
/// line heights at the preferred size; a short single-line field should
/// not wrap just because its value is long.
const MULTILINE_MIN_LINE_FACTOR: f64 = 1.8;

/// The outcome of laying a field value into its widget rect.
///
/// `field_text` and `overflow_text` carry the wrapped lines joined by
/// newlines; together they reconstruct the full wrap of the input at
/// `applied_font_size` (overflow-side leading blank lines excepted).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayoutResult {
    /// Lines that fit inside the widget, joined by newlines.
    pub field_text: String,
    /// Lines diverted to the overflow annex, joined by newlines.
    pub overflow_text: String,
    /// True iff the overflow carries any non-whitespace content.
    pub overflow_detected: bool,
    /// Line count of the full wrap.
    pub total_lines: usize,
    /// Lines kept inside the widget.
    pub displayed_lines: usize,
    /// Font size after shrinking.
    pub applied_font_size: f64,
    /// Vertical advance per line at the applied size.
    pub line_height: f64,
}

impl FieldLayoutResult {
    /// Displayed lines, ready to draw top to bottom.
    pub fn field_lines(&self) -> impl Iterator<Item = &str> {
        self.field_text.split('\n')
    }
}

/// Lay `text` into a widget rect, shrinking toward the style's floor size
/// until the box holds everything, and reporting what still overflows.
///
/// Pure: callers decide what to draw. The shrink loop is bounded by the
/// step count between the preferred and floor sizes.
pub fn layout_in_box<M: MeasureText + ?Sized>(
    measure: &M,
    font: FontRef,
    text: &str,
    rect: Rect,
    style: &FieldStyle,
) -> FieldLayoutResult {
    let usable_width = (rect.width - 2.0 * FIELD_PADDING).max(0.0);
    let usable_height = (rect.height - 2.0 * FIELD_PADDING).max(0.0);
    let floor = style.min_font_size.min(style.font_size);

    // The multiline gate is decided once, at the preferred size.
    let preferred_line_height = style.font_size * style.line_height;
    let multiline = style.multiline
        && usable_height >= MULTILINE_MIN_LINE_FACTOR * preferred_line_height;

    let attempt = |size: f64| -> FieldLayoutResult {
        let line_height = size * style.line_height;
        let lines = wrap_text(measure, font, text, size, usable_width);

        let max_lines = if line_height > 0.0 {
            (usable_height / line_height).floor() as usize
        } else {
            1
        };
        let keep = if multiline && max_lines >= 2 {
            max_lines.min(lines.len())
        } else {
            1
        };

        let (kept, rest) = lines.split_at(keep.min(lines.len()));
        let rest: Vec<&String> = rest
            .iter()
            .skip_while(|l| l.trim().is_empty())
            .collect();
        let overflow_detected = rest.iter().any(|l| !l.trim().is_empty());

        FieldLayoutResult {
            field_text: kept.join("\n"),
            overflow_text: rest
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            overflow_detected,
            total_lines: lines.len(),
            displayed_lines: kept.len(),
            applied_font_size: size,
            line_height,
        }
    };

    let mut size = style.font_size;
    let max_steps = ((style.font_size - floor) / SHRINK_STEP).max(0.0) as usize + 1;
    let mut result = attempt(size);
    for _ in 0..max_steps {
        if !result.overflow_detected || size <= floor {
            break;
        }
        size = (size - SHRINK_STEP).max(floor);
        result = attempt(size);
    }
    result
}

/// Tracks the current page and vertical position during flowed layout.
///
/// One cursor per assembly call. Y runs downward from `page_height -
/// margin.top`; content may never be drawn below `margin.bottom`, which
/// is what [`PageCursor::fits`] checks before anything is placed.
#[derive(Debug, Clone)]
pub struct PageCursor {
    pub page: PageHandle,
    pub y: f64,
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
}

impl PageCursor {
    /// Add the first page and position the cursor at the top margin.
    pub fn open<C: Canvas + ?Sized>(canvas: &mut C, config: &PageConfig) -> Self {
        let (page_width, page_height) = config.size.dimensions();
        let page = canvas.add_page(page_width, page_height);
        Self {
            page,
            y: page_height - config.margin.top,
            page_width,
            page_height,
            margin_top: config.margin.top,
            margin_bottom: config.margin.bottom,
            margin_left: config.margin.left,
            margin_right: config.margin.right,
        }
    }

    pub fn content_left(&self) -> f64 {
        self.margin_left
    }

    /// Horizontal space between the margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Would a block of `required` height still end above the bottom margin?
    pub fn fits(&self, required: f64) -> bool {
        self.y - required >= self.margin_bottom
    }

    /// Move down by `dy`.
    pub fn advance(&mut self, dy: f64) {
        self.y -= dy;
    }

    /// Append a continuation page and reset to its top margin.
    pub fn break_page<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.page = canvas.add_page(self.page_width, self.page_height);
        self.y = self.page_height - self.margin_top;
        debug!("page break: continuing on page {}", self.page.0 + 1);
    }
}
