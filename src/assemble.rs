//! # Report Assembly
//!
//! The top-level pipeline: take a form definition and one submission,
//! draw the filled report onto a canvas, and return the audit metadata.
//!
//! Page one carries the title, the field widgets at their declared rects,
//! and the signature boxes. Flowed sections (checklist, parts table,
//! employee timesheet) continue below the widgets under the pagination
//! cursor. Then come appended pages: one per submitted photo, and the
//! overflow annex holding every field value that did not fit its widget.
//!
//! The engine is synchronous and owns the canvas exclusively for the
//! duration of one call; nothing here is shared between assemblies.

use log::debug;
use serde::Serialize;

use crate::canvas::{Canvas, Color, ImageHandle, PageHandle, BODY_FONT, BOLD_FONT};
use crate::error::RapportError;
use crate::image_loader::{fit_within, load_image, LoadedImage};
use crate::layout::overflow::{render_annex, OverflowEntry, Placement};
use crate::layout::table::{draw_table, TableSpec, TableTheme};
use crate::layout::{layout_in_box, PageCursor, FIELD_PADDING};
use crate::model::{
    FieldDef, FormDefinition, ImageKind, Submission, SubmittedImage, TableColumn,
};
use crate::timesheet::{format_minutes, summarize, BreakCode, ShiftSummary};

const TITLE_SIZE: f64 = 16.0;
const TITLE_ADVANCE: f64 = 28.0;
const LABEL_SIZE: f64 = 7.0;
const CAPTION_SIZE: f64 = 10.0;
const SECTION_GAP: f64 = 14.0;

/// Where a submitted image ended up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlacement {
    pub name: String,
    pub page_index: usize,
}

/// Audit metadata returned to the host after a successful assembly.
///
/// The host logs this; the engine never interprets it further.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyReport {
    pub page_count: usize,
    pub image_placements: Vec<ImagePlacement>,
    pub signature_placements: Vec<ImagePlacement>,
    pub overflow_placements: Vec<Placement>,
    pub parts_rows_rendered: usize,
    pub parts_rows_hidden: usize,
    pub employees: ShiftSummary,
}

/// Assemble one submission into a filled report on `canvas`.
pub fn assemble<C: Canvas + ?Sized>(
    canvas: &mut C,
    form: &FormDefinition,
    submission: &Submission,
) -> Result<AssemblyReport, RapportError> {
    form.validate()?;

    let mut cursor = PageCursor::open(canvas, &form.page);
    let first_page = cursor.page;

    canvas.draw_text(
        first_page,
        &form.title,
        cursor.content_left(),
        cursor.y - TITLE_SIZE,
        TITLE_SIZE,
        BOLD_FONT,
        Color::BLACK,
    );
    cursor.advance(TITLE_ADVANCE);

    // Widgets are positioned absolutely; flowed content starts below the
    // lowest of them.
    let mut widgets_bottom = cursor.y;

    let mut overflow_entries: Vec<OverflowEntry> = Vec::new();
    for field in &form.fields {
        widgets_bottom = widgets_bottom.min(field.rect.y);
        draw_field(canvas, first_page, &mut overflow_entries, field, submission);
    }

    let mut signature_placements = Vec::new();
    for sig in &form.signatures {
        widgets_bottom = widgets_bottom.min(sig.rect.y - 2.0 * LABEL_SIZE);
        canvas.draw_rectangle(
            first_page,
            sig.rect.x,
            sig.rect.y,
            sig.rect.width,
            sig.rect.height,
            Some(Color::DARK_GRAY),
            None,
        );
        canvas.draw_text(
            first_page,
            &sig.label,
            sig.rect.x,
            sig.rect.y - LABEL_SIZE - 2.0,
            LABEL_SIZE,
            BODY_FONT,
            Color::DARK_GRAY,
        );

        let submitted = submission
            .images
            .iter()
            .find(|i| i.kind == ImageKind::Signature && i.name == sig.name);
        if let Some(img) = submitted {
            let (loaded, handle) = embed_submitted(canvas, img)?;
            let (w, h) = fit_within(
                loaded.width_px,
                loaded.height_px,
                sig.rect.width - 2.0 * FIELD_PADDING,
                sig.rect.height - 2.0 * FIELD_PADDING,
            );
            canvas.draw_image(
                first_page,
                handle,
                sig.rect.x + (sig.rect.width - w) / 2.0,
                sig.rect.y + (sig.rect.height - h) / 2.0,
                w,
                h,
            );
            signature_placements.push(ImagePlacement {
                name: img.name.clone(),
                page_index: first_page.0,
            });
        }
    }

    cursor.y = cursor.y.min(widgets_bottom - SECTION_GAP);

    let theme = TableTheme::default();
    draw_checklist(canvas, &mut cursor, form, submission, &theme);
    let (parts_rows_rendered, parts_rows_hidden) =
        draw_parts(canvas, &mut cursor, form, submission, &theme);
    let employees = summarize(&submission.employees);
    draw_timesheet(canvas, &mut cursor, &employees, &theme);

    let image_placements = draw_photo_pages(canvas, &cursor, submission)?;

    let overflow_placements = render_annex(
        canvas,
        overflow_entries,
        cursor.page_width,
        cursor.page_height,
        form.page.margin.top,
    );

    Ok(AssemblyReport {
        page_count: canvas.page_count(),
        image_placements,
        signature_placements,
        overflow_placements,
        parts_rows_rendered,
        parts_rows_hidden,
        employees,
    })
}

/// Parse both inputs and assemble. Convenience entry for hosts holding
/// JSON, and the path the CLI takes.
pub fn assemble_json<C: Canvas + ?Sized>(
    canvas: &mut C,
    form_json: &str,
    submission_json: &str,
) -> Result<AssemblyReport, RapportError> {
    let form: FormDefinition = serde_json::from_str(form_json)?;
    let submission: Submission = serde_json::from_str(submission_json)?;
    assemble(canvas, &form, &submission)
}

/// Draw one field widget: box, label, laid-out value. Overflowing values
/// append an annex entry in field declaration order.
fn draw_field<C: Canvas + ?Sized>(
    canvas: &mut C,
    page: PageHandle,
    overflow_entries: &mut Vec<OverflowEntry>,
    field: &FieldDef,
    submission: &Submission,
) {
    canvas.draw_rectangle(
        page,
        field.rect.x,
        field.rect.y,
        field.rect.width,
        field.rect.height,
        Some(Color::DARK_GRAY),
        None,
    );
    canvas.draw_text(
        page,
        &field.label,
        field.rect.x,
        field.rect.top() + 3.0,
        LABEL_SIZE,
        BODY_FONT,
        Color::DARK_GRAY,
    );

    let value = submission
        .values
        .get(&field.name)
        .map(|v| v.as_text())
        .unwrap_or_default();
    if value.trim().is_empty() {
        return;
    }

    let result = layout_in_box(canvas, BODY_FONT, &value, field.rect, &field.style);
    for (i, line) in result.field_lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = field.rect.top()
            - FIELD_PADDING
            - result.applied_font_size
            - i as f64 * result.line_height;
        canvas.draw_text(
            page,
            line,
            field.rect.x + FIELD_PADDING,
            baseline,
            result.applied_font_size,
            BODY_FONT,
            Color::BLACK,
        );
    }

    if result.overflow_detected {
        debug!(
            "field '{}' overflows its widget at size {}; diverting {} of {} lines",
            field.name,
            result.applied_font_size,
            result.total_lines - result.displayed_lines,
            result.total_lines,
        );
        overflow_entries.push(OverflowEntry {
            source_id: field.name.clone(),
            label: field.label.clone(),
            text: result.overflow_text,
            font_size: result.applied_font_size,
        });
    }
}

/// Checklist section: checked items and items carrying a note. Fully
/// unchecked, unnoted items are not rendered at all.
fn draw_checklist<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &mut PageCursor,
    form: &FormDefinition,
    submission: &Submission,
    theme: &TableTheme,
) {
    if form.checklist.is_empty() {
        return;
    }

    let rows: Vec<Vec<String>> = form
        .checklist
        .iter()
        .filter_map(|item| {
            let checked = submission.checkboxes.get(&item.name).copied().unwrap_or(false);
            let note = submission
                .notes
                .get(&item.name)
                .map(String::as_str)
                .unwrap_or("")
                .trim();
            if !checked && note.is_empty() {
                return None;
            }
            Some(vec![
                item.label.clone(),
                if checked { "Yes".to_string() } else { String::new() },
                note.to_string(),
            ])
        })
        .collect();

    let spec = TableSpec {
        title: "Checklist".to_string(),
        headers: vec!["Item".to_string(), "Done".to_string(), "Note".to_string()],
        columns: vec![
            TableColumn::ratio(0.45),
            TableColumn::ratio(0.15),
            TableColumn::ratio(0.40),
        ],
    };
    if draw_table(canvas, cursor, &spec, &rows, theme) > 0 {
        cursor.advance(SECTION_GAP);
    }
}

/// Parts table section. All-empty rows are hidden; returns
/// (rendered, hidden) counts for the audit report.
fn draw_parts<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &mut PageCursor,
    form: &FormDefinition,
    submission: &Submission,
    theme: &TableTheme,
) -> (usize, usize) {
    if form.parts.columns.is_empty() {
        return (0, 0);
    }

    let qualifying: Vec<Vec<String>> = submission
        .parts_rows
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .cloned()
        .collect();
    let hidden = submission.parts_rows.len() - qualifying.len();

    let spec = TableSpec {
        title: form.parts.title.clone(),
        headers: form.parts.headers.clone(),
        columns: form.parts.columns.clone(),
    };
    let rendered = draw_table(canvas, cursor, &spec, &qualifying, theme);
    if rendered > 0 {
        cursor.advance(SECTION_GAP);
    }
    (rendered, hidden)
}

/// Employee timesheet section with the aggregate summary line.
fn draw_timesheet<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &mut PageCursor,
    summary: &ShiftSummary,
    theme: &TableTheme,
) {
    if summary.entries.is_empty() {
        return;
    }

    let rows: Vec<Vec<String>> = summary
        .entries
        .iter()
        .map(|entry| {
            let pending = entry.shift.break_code == BreakCode::Unknown;
            let show = |iso: &str| {
                if iso.is_empty() {
                    "-".to_string()
                } else {
                    iso.to_string()
                }
            };
            vec![
                (entry.index + 1).to_string(),
                entry.name.clone(),
                entry.role.clone(),
                show(&entry.shift.arrival_iso),
                show(&entry.shift.departure_iso),
                if pending {
                    "-".to_string()
                } else {
                    format_minutes(entry.shift.duration_minutes)
                },
                entry.shift.break_code.label().to_string(),
            ]
        })
        .collect();

    let spec = TableSpec {
        title: "Employee timesheet".to_string(),
        headers: ["#", "Name", "Role", "Arrival", "Departure", "Duration", "Break"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        columns: [0.05, 0.21, 0.16, 0.16, 0.16, 0.13, 0.13]
            .iter()
            .map(|r| TableColumn::ratio(*r))
            .collect(),
    };
    draw_table(canvas, cursor, &spec, &rows, theme);

    let mut summary_line = format!(
        "Total: {} worked, {} mandated break",
        format_minutes(summary.total_minutes),
        format_minutes(summary.total_break_minutes),
    );
    if summary.pending_count() > 0 {
        summary_line.push_str(&format!(", {} entries pending", summary.pending_count()));
    }

    let line_height = theme.font_size * theme.line_height;
    if !cursor.fits(line_height + 4.0) {
        cursor.break_page(canvas);
    }
    cursor.advance(4.0);
    canvas.draw_text(
        cursor.page,
        &summary_line,
        cursor.content_left(),
        cursor.y - theme.font_size,
        theme.font_size,
        theme.header_font,
        Color::BLACK,
    );
    cursor.advance(line_height + SECTION_GAP);
}

/// One appended page per submitted photo, captioned, aspect preserved.
fn draw_photo_pages<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &PageCursor,
    submission: &Submission,
) -> Result<Vec<ImagePlacement>, RapportError> {
    let mut placements = Vec::new();
    for img in submission.images.iter().filter(|i| i.kind == ImageKind::Photo) {
        let (loaded, handle) = embed_submitted(canvas, img)?;

        let page = canvas.add_page(cursor.page_width, cursor.page_height);
        let caption_y = cursor.page_height - cursor.margin_top - CAPTION_SIZE;
        canvas.draw_text(
            page,
            &img.name,
            cursor.margin_left,
            caption_y,
            CAPTION_SIZE,
            BOLD_FONT,
            Color::BLACK,
        );

        let max_w = cursor.content_width();
        let max_h = caption_y - CAPTION_SIZE - cursor.margin_bottom;
        let (w, h) = fit_within(loaded.width_px, loaded.height_px, max_w, max_h);
        let x = cursor.margin_left + (max_w - w) / 2.0;
        let y = cursor.margin_bottom + (max_h - h) / 2.0;
        canvas.draw_image(page, handle, x, y, w, h);

        placements.push(ImagePlacement {
            name: img.name.clone(),
            page_index: page.0,
        });
    }
    Ok(placements)
}

/// Decode and embed a submitted image, making sure any canvas-side
/// rejection names the submitted file.
fn embed_submitted<C: Canvas + ?Sized>(
    canvas: &mut C,
    img: &SubmittedImage,
) -> Result<(LoadedImage, ImageHandle), RapportError> {
    let loaded = load_image(&img.name, &img.data)?;
    match canvas.embed_image(&loaded.bytes, loaded.mime) {
        Ok(handle) => Ok((loaded, handle)),
        Err(RapportError::Image { reason, .. }) => Err(RapportError::Image {
            name: img.name.clone(),
            reason,
        }),
        Err(other) => Err(other),
    }
}
