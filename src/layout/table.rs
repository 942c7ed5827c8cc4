//! # Section and Table Rendering
//!
//! Draws titled tabular sections along the pagination cursor. Row heights
//! come from the wrapped content of the tallest cell, pages break before
//! a row would cross the bottom margin, and every continuation page
//! repeats the section title (suffixed `" (cont.)"`) and the column
//! header row, so header context is never lost at a page boundary.
//!
//! Sections with nothing to show are skipped outright: no heading, no
//! consumed height. Callers filter their rows first and pass only the
//! qualifying ones.

use log::debug;

use crate::canvas::{Canvas, Color, FontRef, MeasureText, BODY_FONT, BOLD_FONT};
use crate::layout::PageCursor;
use crate::model::TableColumn;
use crate::text::wrap_text;

/// What a tabular section looks like: title, header row, column ratios.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub title: String,
    pub headers: Vec<String>,
    pub columns: Vec<TableColumn>,
}

/// Sizing and font choices shared by all sections of a report.
#[derive(Debug, Clone)]
pub struct TableTheme {
    pub title_size: f64,
    /// Vertical space consumed by a section title block.
    pub title_advance: f64,
    pub font_size: f64,
    /// Line height as a multiple of `font_size`.
    pub line_height: f64,
    pub cell_padding: f64,
    /// Rows never get shorter than this, even when empty.
    pub base_row_height: f64,
    pub body_font: FontRef,
    pub header_font: FontRef,
}

impl Default for TableTheme {
    fn default() -> Self {
        Self {
            title_size: 12.0,
            title_advance: 20.0,
            font_size: 9.0,
            line_height: 1.3,
            cell_padding: 3.0,
            base_row_height: 18.0,
            body_font: BODY_FONT,
            header_font: BOLD_FONT,
        }
    }
}

impl TableTheme {
    fn line_height_abs(&self) -> f64 {
        self.font_size * self.line_height
    }
}

/// Draw a section title at the cursor, with the continuation suffix on
/// repeated headings.
pub fn draw_section_title<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &mut PageCursor,
    title: &str,
    continuation: bool,
    theme: &TableTheme,
) {
    let text = if continuation {
        format!("{title} (cont.)")
    } else {
        title.to_string()
    };
    canvas.draw_text(
        cursor.page,
        &text,
        cursor.content_left(),
        cursor.y - theme.title_size,
        theme.title_size,
        theme.header_font,
        Color::BLACK,
    );
    cursor.advance(theme.title_advance);
}

/// Render a titled table, breaking onto continuation pages as needed.
///
/// `rows` must already be filtered to the qualifying ones; an empty slice
/// skips the section entirely. Returns the number of data rows drawn.
pub fn draw_table<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &mut PageCursor,
    spec: &TableSpec,
    rows: &[Vec<String>],
    theme: &TableTheme,
) -> usize {
    if rows.is_empty() {
        debug!("section '{}' has no qualifying rows; skipped", spec.title);
        return 0;
    }

    let widths = column_widths(&spec.columns, cursor.content_width());
    let header_height = row_height(canvas, &spec.headers, &widths, theme.header_font, theme);
    let first_row_height = row_height(canvas, &rows[0], &widths, theme.body_font, theme);

    // The heading never sits alone at a page bottom: it must fit together
    // with the header row and the first data row.
    if !cursor.fits(theme.title_advance + header_height + first_row_height) {
        cursor.break_page(canvas);
    }
    draw_section_title(canvas, cursor, &spec.title, false, theme);
    draw_row(canvas, cursor, &spec.headers, &widths, header_height, true, theme);

    for cells in rows {
        let height = row_height(canvas, cells, &widths, theme.body_font, theme);
        if !cursor.fits(height) {
            cursor.break_page(canvas);
            draw_section_title(canvas, cursor, &spec.title, true, theme);
            draw_row(canvas, cursor, &spec.headers, &widths, header_height, true, theme);
        }
        draw_row(canvas, cursor, cells, &widths, height, false, theme);
    }

    rows.len()
}

/// Scale the ratio columns so the widths always sum to the content width.
fn column_widths(columns: &[TableColumn], content_width: f64) -> Vec<f64> {
    let total: f64 = columns.iter().map(|c| c.width_ratio).sum();
    if !(total > 0.0) {
        return vec![content_width / columns.len().max(1) as f64; columns.len().max(1)];
    }
    columns
        .iter()
        .map(|c| c.width_ratio / total * content_width)
        .collect()
}

/// Height of one row: the configured minimum, or the tallest wrapped cell.
///
/// `font` must be the font the row is drawn with; a bold header cell can
/// wrap differently than the same text in the body font.
fn row_height<M: MeasureText + ?Sized>(
    measure: &M,
    cells: &[String],
    widths: &[f64],
    font: FontRef,
    theme: &TableTheme,
) -> f64 {
    let line_height = theme.line_height_abs();
    let mut tallest = 0.0f64;
    for (i, width) in widths.iter().enumerate() {
        let text = cells.get(i).map(String::as_str).unwrap_or("");
        let lines = wrap_text(
            measure,
            font,
            text,
            theme.font_size,
            width - 2.0 * theme.cell_padding,
        );
        let cell = (lines.len() as f64 * line_height + 2.0 * theme.cell_padding).ceil();
        tallest = tallest.max(cell);
    }
    theme.base_row_height.max(tallest)
}

/// Draw one bordered row at the cursor and advance past it.
fn draw_row<C: Canvas + ?Sized>(
    canvas: &mut C,
    cursor: &mut PageCursor,
    cells: &[String],
    widths: &[f64],
    height: f64,
    header: bool,
    theme: &TableTheme,
) {
    let line_height = theme.line_height_abs();
    let font = if header { theme.header_font } else { theme.body_font };
    let fill = header.then_some(Color::LIGHT_GRAY);

    let mut x = cursor.content_left();
    for (i, width) in widths.iter().enumerate() {
        canvas.draw_rectangle(
            cursor.page,
            x,
            cursor.y - height,
            *width,
            height,
            Some(Color::DARK_GRAY),
            fill,
        );

        let text = cells.get(i).map(String::as_str).unwrap_or("");
        let lines = wrap_text(
            canvas,
            font,
            text,
            theme.font_size,
            width - 2.0 * theme.cell_padding,
        );
        for (line_index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let baseline = cursor.y
                - theme.cell_padding
                - theme.font_size
                - line_index as f64 * line_height;
            canvas.draw_text(
                cursor.page,
                line,
                x + theme.cell_padding,
                baseline,
                theme.font_size,
                font,
                Color::BLACK,
            );
        }
        x += width;
    }

    cursor.advance(height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use crate::model::{Edges, PageConfig, PageSize};

    fn small_page() -> PageConfig {
        PageConfig {
            size: PageSize::Custom {
                width: 400.0,
                height: 150.0,
            },
            margin: Edges::uniform(15.0),
        }
    }

    fn spec() -> TableSpec {
        TableSpec {
            title: "Parts".to_string(),
            headers: vec!["Name".to_string(), "Qty".to_string()],
            columns: vec![TableColumn::ratio(3.0), TableColumn::ratio(1.0)],
        }
    }

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| vec![format!("part {i}"), format!("{i}")])
            .collect()
    }

    #[test]
    fn ratios_scale_to_the_content_width() {
        let widths = column_widths(
            &[TableColumn::ratio(3.0), TableColumn::ratio(1.0)],
            370.0,
        );
        assert_eq!(widths, vec![277.5, 92.5]);
        assert!((widths.iter().sum::<f64>() - 370.0).abs() < 1e-9);
    }

    #[test]
    fn single_line_rows_use_the_base_height() {
        let canvas = RecordingCanvas::new();
        let theme = TableTheme::default();
        // One line: ceil(11.7 + 6) = 18 = base height.
        let h = row_height(&canvas, &rows(1)[0], &[200.0, 100.0], BODY_FONT, &theme);
        assert_eq!(h, 18.0);
    }

    #[test]
    fn tall_cells_grow_the_row() {
        let canvas = RecordingCanvas::new();
        let theme = TableTheme::default();
        let cells = vec!["a long description that needs to wrap".to_string()];
        // 4.5/char at size 9: the text is wider than 60 - 6 = 54 units.
        let h = row_height(&canvas, &cells, &[60.0], BODY_FONT, &theme);
        assert!(h > theme.base_row_height);
    }

    // Bold glyphs twice as wide as body glyphs.
    struct BoldWideMetric;

    impl MeasureText for BoldWideMetric {
        fn measure_text_width(&self, text: &str, font: FontRef, size: f64) -> f64 {
            let advance = if font == BOLD_FONT { 1.0 } else { 0.5 };
            text.chars().count() as f64 * advance * size
        }
    }

    #[test]
    fn header_rows_measure_with_the_header_font() {
        let theme = TableTheme::default();
        let cells = vec!["Material designation".to_string()];
        // 20 chars in a 94-unit cell: one body line, but two bold lines.
        let body = row_height(&BoldWideMetric, &cells, &[100.0], theme.body_font, &theme);
        let header = row_height(&BoldWideMetric, &cells, &[100.0], theme.header_font, &theme);
        assert_eq!(body, 18.0);
        assert!(header > body);
    }

    #[test]
    fn empty_sections_draw_nothing() {
        let mut canvas = RecordingCanvas::new();
        let mut cursor = PageCursor::open(&mut canvas, &small_page());
        let before = cursor.y;
        let drawn = draw_table(&mut canvas, &mut cursor, &spec(), &[], &TableTheme::default());
        assert_eq!(drawn, 0);
        assert_eq!(cursor.y, before);
        assert!(canvas.ops(0).is_empty());
    }

    #[test]
    fn continuation_pages_repeat_title_and_header() {
        let mut canvas = RecordingCanvas::new();
        let mut cursor = PageCursor::open(&mut canvas, &small_page());
        // Content height 120: title (20) + header (18) + four 18-unit rows
        // fit per page, so nine rows need two continuation pages.
        let drawn = draw_table(
            &mut canvas,
            &mut cursor,
            &spec(),
            &rows(9),
            &TableTheme::default(),
        );
        assert_eq!(drawn, 9);
        assert_eq!(canvas.page_count(), 3);
        assert_eq!(canvas.count_text("Name"), 3);
        assert_eq!(canvas.count_text("Parts"), 1);
        assert_eq!(canvas.count_text("Parts (cont.)"), 2);
        assert!(canvas.texts(1).contains(&"Parts (cont.)"));
        assert!(canvas.texts(2).contains(&"Parts (cont.)"));
    }

    #[test]
    fn section_near_the_bottom_starts_on_a_fresh_page() {
        let mut canvas = RecordingCanvas::new();
        let mut cursor = PageCursor::open(&mut canvas, &small_page());
        cursor.advance(100.0); // 20 units left: not enough for title + rows
        draw_table(
            &mut canvas,
            &mut cursor,
            &spec(),
            &rows(1),
            &TableTheme::default(),
        );
        assert_eq!(canvas.page_count(), 2);
        assert!(canvas.ops(0).is_empty());
        assert!(canvas.texts(1).contains(&"Parts"));
    }
}
