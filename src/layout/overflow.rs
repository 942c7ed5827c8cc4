//! # Overflow Annex Packing
//!
//! Field values that did not fit their widget at any permitted size end
//! up here as labeled entries. The packer groups them onto appended
//! pages using a running line-count estimate, then draws every page:
//! fixed annex title, then per entry its label and the re-wrapped text.
//!
//! Packing order is the order entries arrive, which is the order fields
//! were declared in the form definition. Reports stay reproducible that
//! way: the same submission always yields the same annex.

use log::debug;
use serde::Serialize;

use crate::canvas::{Canvas, Color, FontRef, MeasureText, BODY_FONT, BOLD_FONT};
use crate::text::{resolve_width, wrap_text};

/// Title drawn at the top of every annex page.
pub const ANNEX_TITLE: &str = "Additional entries";

/// Body size annex text starts at; shrink may go down to the floor.
const ANNEX_BODY_SIZE: f64 = 10.0;
const ANNEX_MIN_SIZE: f64 = 7.0;
const ANNEX_LINE_HEIGHT: f64 = 1.4;
const ANNEX_TITLE_SIZE: f64 = 12.0;

/// Estimated extra lines per entry: one for the label, one for spacing.
const ENTRY_EXTRA_LINES: usize = 2;

/// Lines the annex title block consumes at the top of every page.
const TITLE_COST_LINES: usize = 2;

/// One diverted field value. Produced by field layout, consumed exactly
/// once by the packer.
#[derive(Debug, Clone, PartialEq)]
pub struct OverflowEntry {
    /// Field name the text came from.
    pub source_id: String,
    /// Label drawn above the text on the annex page.
    pub label: String,
    /// The diverted lines, newline-joined.
    pub text: String,
    /// Font size the field ended up at; the annex starts from it.
    pub font_size: f64,
}

/// Where an entry landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub source_id: String,
    pub page_index: usize,
}

/// Group entries into pages by estimated line consumption.
///
/// Capacity is how many base-height lines fit between the margins, less
/// the allowance for the page title; each entry costs its wrapped line
/// count plus [`ENTRY_EXTRA_LINES`]. A page closes when the next entry
/// would exceed capacity, so even an entry estimated larger than a whole
/// page gets a page of its own.
pub fn pack<M: MeasureText + ?Sized>(
    measure: &M,
    font: FontRef,
    entries: &[OverflowEntry],
    page_width: f64,
    page_height: f64,
    margin: f64,
) -> Vec<Vec<usize>> {
    let base_line_height = ANNEX_BODY_SIZE * ANNEX_LINE_HEIGHT;
    let page_lines = ((page_height - 2.0 * margin) / base_line_height).floor() as usize;
    let capacity = page_lines.saturating_sub(TITLE_COST_LINES).max(1);
    let text_width = page_width - 2.0 * margin;

    let mut pages: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut used = 0usize;

    for (index, entry) in entries.iter().enumerate() {
        let lines = wrap_text(measure, font, &entry.text, entry.font_size, text_width).len();
        let cost = lines + ENTRY_EXTRA_LINES;
        if !current.is_empty() && used + cost > capacity {
            pages.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(index);
        used += cost;
    }
    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// Append annex pages for all diverted entries and draw them.
///
/// Takes ownership of the entries; each is rendered exactly once. The
/// returned placements are in entry order.
pub fn render_annex<C: Canvas + ?Sized>(
    canvas: &mut C,
    entries: Vec<OverflowEntry>,
    page_width: f64,
    page_height: f64,
    margin: f64,
) -> Vec<Placement> {
    if entries.is_empty() {
        return Vec::new();
    }

    let groups = pack(canvas, BODY_FONT, &entries, page_width, page_height, margin);
    debug!(
        "overflow annex: {} entries across {} pages",
        entries.len(),
        groups.len()
    );
    let text_width = page_width - 2.0 * margin;
    let mut placements = Vec::with_capacity(entries.len());

    for group in groups {
        let page = canvas.add_page(page_width, page_height);
        let mut y = page_height - margin;

        canvas.draw_text(
            page,
            ANNEX_TITLE,
            margin,
            y - ANNEX_TITLE_SIZE,
            ANNEX_TITLE_SIZE,
            BOLD_FONT,
            Color::BLACK,
        );
        y -= 2.0 * ANNEX_TITLE_SIZE;

        for index in group {
            let entry = &entries[index];
            let label_height = ANNEX_BODY_SIZE * ANNEX_LINE_HEIGHT;
            canvas.draw_text(
                page,
                &entry.label,
                margin,
                y - ANNEX_BODY_SIZE,
                ANNEX_BODY_SIZE,
                BOLD_FONT,
                Color::BLACK,
            );
            y -= label_height;

            let wrapped = resolve_width(
                canvas,
                BODY_FONT,
                &entry.text,
                entry.font_size,
                ANNEX_MIN_SIZE,
                ANNEX_LINE_HEIGHT,
                text_width,
            );
            for line in &wrapped.lines {
                y -= wrapped.line_height;
                if !line.is_empty() {
                    canvas.draw_text(
                        page,
                        line,
                        margin,
                        y,
                        wrapped.font_size,
                        BODY_FONT,
                        Color::BLACK,
                    );
                }
            }
            // Blank line between entries.
            y -= label_height;

            placements.push(Placement {
                source_id: entry.source_id.clone(),
                page_index: page.0,
            });
        }
    }

    placements
}
