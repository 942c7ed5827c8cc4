//! Integration tests for the full assembly pipeline.
//!
//! These exercise the path from form definition + submission to a drawn
//! canvas and audit report. They verify:
//! - field values land in their widgets and overflow into the annex
//! - flowed sections paginate with repeated headers
//! - the timesheet summary numbers reach the report
//! - photo and signature placements are recorded
//! - bad images abort the whole assembly

use base64::Engine;

use rapport::canvas::{Canvas, RecordingCanvas, BODY_FONT};
use rapport::layout::overflow::ANNEX_TITLE;
use rapport::model::*;
use rapport::{assemble, assemble_json, wrap_text};

// ─── Helpers ────────────────────────────────────────────────────

// The recording canvas measures every character as 0.5 × font size.

fn custom_page(width: f64, height: f64, margin: f64) -> PageConfig {
    PageConfig {
        size: PageSize::Custom { width, height },
        margin: Edges::uniform(margin),
    }
}

fn field(name: &str, label: &str, rect: Rect, style: FieldStyle) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        label: label.to_string(),
        rect,
        style,
    }
}

fn png_data_uri() -> String {
    let mut img = image::RgbaImage::new(4, 2);
    for p in img.pixels_mut() {
        *p = image::Rgba([200, 30, 30, 255]);
    }
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), 4, 2, image::ColorType::Rgba8)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buf)
    )
}

fn submitted_image(name: &str, kind: ImageKind) -> SubmittedImage {
    SubmittedImage {
        name: name.to_string(),
        mime: "image/png".to_string(),
        data: png_data_uri(),
        kind,
    }
}

/// A service-report form with one of everything.
fn service_form() -> FormDefinition {
    FormDefinition {
        title: "Service report".to_string(),
        page: custom_page(400.0, 500.0, 20.0),
        fields: vec![
            field(
                "customer",
                "Customer",
                Rect::new(20.0, 420.0, 170.0, 20.0),
                FieldStyle::default(),
            ),
            field(
                "work_done",
                "Work done",
                Rect::new(20.0, 360.0, 170.0, 40.0),
                FieldStyle {
                    font_size: 10.0,
                    min_font_size: 10.0,
                    line_height: 1.0,
                    multiline: true,
                },
            ),
        ],
        signatures: vec![SignatureDef {
            name: "customer_signature".to_string(),
            label: "Customer signature".to_string(),
            rect: Rect::new(210.0, 360.0, 150.0, 40.0),
        }],
        checklist: vec![
            ChecklistItemDef {
                name: "safety_briefing".to_string(),
                label: "Safety briefing held".to_string(),
            },
            ChecklistItemDef {
                name: "area_cleaned".to_string(),
                label: "Work area cleaned".to_string(),
            },
        ],
        parts: PartsDef {
            title: "Parts".to_string(),
            headers: vec!["Part".to_string(), "Qty".to_string(), "State".to_string()],
            columns: vec![
                TableColumn::ratio(0.6),
                TableColumn::ratio(0.15),
                TableColumn::ratio(0.25),
            ],
        },
    }
}

fn service_submission() -> Submission {
    let mut submission = Submission::default();
    submission.values.insert(
        "customer".to_string(),
        FieldValue::Text("Hartmann Facility Services GmbH".to_string()),
    );
    // Five 30-character words: one per line in the 166-unit widget, and
    // the 36-unit-high box only holds three lines.
    submission.values.insert(
        "work_done".to_string(),
        FieldValue::Text(
            (1..=5)
                .map(|i| format!("comprehensive-realignment-{i:04}"))
                .collect::<Vec<_>>()
                .join(" "),
        ),
    );
    submission
        .checkboxes
        .insert("safety_briefing".to_string(), true);
    submission.parts_rows = vec![
        vec!["Belt segment B-220".to_string(), "1".to_string(), "replaced".to_string()],
        vec!["".to_string(), " ".to_string(), "".to_string()],
        vec!["Chain lubricant".to_string(), "2".to_string(), "consumed".to_string()],
    ];
    submission.employees = vec![
        EmployeeRow {
            name: "A. Keller".to_string(),
            role: "technician".to_string(),
            arrival: "2024-06-24 08:00".to_string(),
            departure: "2024-06-24 17:30".to_string(),
        },
        EmployeeRow {
            name: "S. Brandt".to_string(),
            role: "apprentice".to_string(),
            arrival: "2024-06-24 09:00".to_string(),
            departure: String::new(),
        },
    ];
    submission.images = vec![
        submitted_image("site_photo.png", ImageKind::Photo),
        submitted_image("customer_signature", ImageKind::Signature),
    ];
    submission
}

fn page_text(canvas: &RecordingCanvas, page: usize) -> String {
    canvas.texts(page).join("\n")
}

// ─── Full pipeline ──────────────────────────────────────────────

#[test]
fn full_report_assembles_three_pages() {
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &service_submission()).unwrap();

    // Page 1: widgets + sections. Page 2: the photo. Page 3: the annex.
    assert_eq!(report.page_count, 3);
    assert_eq!(canvas.page_count(), 3);

    let first = page_text(&canvas, 0);
    assert!(first.contains("Service report"));
    assert!(first.contains("Hartmann Facility Services GmbH"));
    assert!(first.contains("Checklist"));
    assert!(first.contains("Safety briefing held"));
    assert!(first.contains("Parts"));
    assert!(first.contains("Employee timesheet"));
}

#[test]
fn overflowing_field_is_diverted_to_the_annex() {
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &service_submission()).unwrap();

    assert_eq!(report.overflow_placements.len(), 1);
    let placement = &report.overflow_placements[0];
    assert_eq!(placement.source_id, "work_done");
    assert_eq!(placement.page_index, 2);

    let annex = page_text(&canvas, 2);
    assert!(annex.contains(ANNEX_TITLE));
    assert!(annex.contains("Work done"));
    assert!(annex.contains("comprehensive-realignment-0004"));
    assert!(annex.contains("comprehensive-realignment-0005"));
    // The displayed lines stay on page one; line four does not.
    let first = page_text(&canvas, 0);
    assert!(first.contains("comprehensive-realignment-0003"));
    assert!(!first.contains("comprehensive-realignment-0004"));
}

#[test]
fn empty_parts_rows_are_hidden_from_the_table() {
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &service_submission()).unwrap();
    assert_eq!(report.parts_rows_rendered, 2);
    assert_eq!(report.parts_rows_hidden, 1);
}

#[test]
fn unchecked_checklist_items_without_notes_are_skipped() {
    let mut canvas = RecordingCanvas::new();
    assemble(&mut canvas, &service_form(), &service_submission()).unwrap();
    let first = page_text(&canvas, 0);
    assert!(first.contains("Safety briefing held"));
    assert!(!first.contains("Work area cleaned"));
}

#[test]
fn a_note_keeps_an_unchecked_item_in_the_checklist() {
    let mut submission = service_submission();
    submission.notes.insert(
        "area_cleaned".to_string(),
        "oil residue left near dock gate".to_string(),
    );
    let mut canvas = RecordingCanvas::new();
    assemble(&mut canvas, &service_form(), &submission).unwrap();
    let first = page_text(&canvas, 0);
    assert!(first.contains("Work area cleaned"));
}

#[test]
fn timesheet_summary_reaches_the_report() {
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &service_submission()).unwrap();

    // 08:00-17:30 is 570 minutes (45 min break); the missing departure
    // defaults to one hour (no break).
    assert_eq!(report.employees.total_minutes, 630);
    assert_eq!(report.employees.total_break_minutes, 45);
    assert_eq!(report.employees.break_stats.none, 1);
    assert_eq!(report.employees.break_stats.min45, 1);
    assert_eq!(report.employees.break_stats.unknown, 0);

    // The summary line is a single unwrapped draw.
    let first = page_text(&canvas, 0);
    assert!(first.contains("Total: 10 h 30 min worked, 0 h 45 min mandated break"));
    assert!(first.contains("45 min")); // break column cell
}

#[test]
fn photo_and_signature_placements_are_recorded() {
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &service_submission()).unwrap();

    assert_eq!(report.signature_placements.len(), 1);
    assert_eq!(report.signature_placements[0].page_index, 0);

    assert_eq!(report.image_placements.len(), 1);
    assert_eq!(report.image_placements[0].name, "site_photo.png");
    assert_eq!(report.image_placements[0].page_index, 1);
    assert!(page_text(&canvas, 1).contains("site_photo.png"));
}

#[test]
fn missing_signature_leaves_the_box_empty() {
    let mut submission = service_submission();
    submission.images.retain(|i| i.kind == ImageKind::Photo);
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &submission).unwrap();
    assert!(report.signature_placements.is_empty());
}

#[test]
fn corrupt_image_aborts_the_assembly_naming_the_file() {
    let mut submission = service_submission();
    submission.images.push(SubmittedImage {
        name: "evidence_7.png".to_string(),
        mime: "image/png".to_string(),
        data: "!!!not base64!!!".to_string(),
        kind: ImageKind::Photo,
    });
    let mut canvas = RecordingCanvas::new();
    let err = assemble(&mut canvas, &service_form(), &submission).unwrap_err();
    assert!(err.to_string().contains("evidence_7.png"));
}

#[test]
fn minimal_submission_produces_a_single_page() {
    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &service_form(), &Submission::default()).unwrap();
    assert_eq!(report.page_count, 1);
    assert!(report.overflow_placements.is_empty());
    assert!(report.employees.entries.is_empty());

    // Empty sections leave no trace: no headings, no header rows.
    let first = page_text(&canvas, 0);
    assert!(!first.contains("Checklist"));
    assert!(!first.contains("Employee timesheet"));
}

// ─── Pagination across continuation pages ───────────────────────

#[test]
fn long_parts_table_repeats_headers_on_continuation_pages() {
    let mut form = service_form();
    form.page = custom_page(400.0, 150.0, 15.0);
    form.fields.clear();
    form.signatures.clear();
    form.checklist.clear();

    let mut submission = Submission::default();
    submission.parts_rows = (0..9)
        .map(|i| vec![format!("part {i}"), "1".to_string(), "ok".to_string()])
        .collect();

    let mut canvas = RecordingCanvas::new();
    let report = assemble(&mut canvas, &form, &submission).unwrap();

    assert_eq!(report.page_count, 3);
    assert_eq!(report.parts_rows_rendered, 9);
    assert_eq!(canvas.count_text("Parts"), 1);
    assert_eq!(canvas.count_text("Parts (cont.)"), 2);
    assert_eq!(canvas.count_text("Part"), 3); // header row, once per page
    assert!(page_text(&canvas, 1).contains("Parts (cont.)"));
    assert!(page_text(&canvas, 2).contains("Parts (cont.)"));
}

// ─── JSON front door ────────────────────────────────────────────

#[test]
fn assemble_json_round_trips() {
    let form_json = serde_json::to_string(&service_form()).unwrap();
    let submission_json = serde_json::to_string(&service_submission()).unwrap();
    let mut canvas = RecordingCanvas::new();
    let report = assemble_json(&mut canvas, &form_json, &submission_json).unwrap();
    assert_eq!(report.page_count, 3);

    let serialized = serde_json::to_value(&report).unwrap();
    assert_eq!(serialized["partsRowsRendered"], 2);
    assert_eq!(serialized["employees"]["breakStats"]["min45"], 1);
    assert_eq!(serialized["overflowPlacements"][0]["sourceId"], "work_done");
}

#[test]
fn broken_input_json_reports_a_hint() {
    let mut canvas = RecordingCanvas::new();
    let err = assemble_json(&mut canvas, "{", "{}").unwrap_err();
    assert!(err.to_string().contains("Hint:"));
}

#[test]
fn assembly_is_deterministic() {
    let form = service_form();
    let submission = service_submission();

    let mut first = RecordingCanvas::new();
    assemble(&mut first, &form, &submission).unwrap();
    let mut second = RecordingCanvas::new();
    assemble(&mut second, &form, &submission).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ─── Literal engine scenarios through the public API ────────────

#[test]
fn ten_a_characters_wrap_into_four_four_two() {
    let canvas = RecordingCanvas::new();
    // 4 characters of size 10 are 20 units wide on the recording metric.
    let lines = wrap_text(&canvas, BODY_FONT, "AAAAAAAAAA", 10.0, 20.0);
    assert_eq!(lines, vec!["AAAA", "AAAA", "AA"]);
}
