//! # Canvas Abstraction
//!
//! The engine never talks to a concrete document library. It draws through
//! the narrow [`Canvas`] trait a host provides: page creation, text, rules,
//! rectangles, and image embedding, plus one width-measurement primitive.
//!
//! The measurement primitive lives on its own supertrait, [`MeasureText`],
//! so the pure layout functions (wrapping, shrink-to-fit, field boxes) can
//! take just the measuring capability without a mutable canvas.
//!
//! [`RecordingCanvas`] is the built-in implementation: a deterministic
//! proportional metric and a serializable log of every draw operation.
//! The CLI renders onto it, and the test suite asserts against its ops.

use serde::Serialize;

use crate::error::RapportError;

/// Opaque reference to a font registered with the host canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FontRef(pub u32);

/// The regular body font every canvas is expected to provide.
pub const BODY_FONT: FontRef = FontRef(0);
/// The bold font used for titles, labels, and table headers.
pub const BOLD_FONT: FontRef = FontRef(1);

/// Handle to a page created via [`Canvas::add_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageHandle(pub usize);

/// Handle to an image registered via [`Canvas::embed_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageHandle(pub usize);

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const DARK_GRAY: Color = Color::rgb(0.25, 0.25, 0.25);
    pub const LIGHT_GRAY: Color = Color::rgb(0.85, 0.85, 0.85);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
}

/// Width measurement for a string at a font size.
///
/// Implementations may be approximate; the layout code only requires that
/// a string's width grows when characters are appended and scales with the
/// font size. A defective implementation (NaN, zero) degrades layout to
/// unwrapped text but must not crash or hang the engine.
pub trait MeasureText {
    fn measure_text_width(&self, text: &str, font: FontRef, size: f64) -> f64;
}

/// The drawing surface the engine assembles a report onto.
///
/// Coordinates follow document conventions: origin at the bottom-left of
/// the page, y increasing upward. One canvas belongs to exactly one
/// assembly call; the engine never shares it across threads.
pub trait Canvas: MeasureText {
    /// Append a fresh page and return its handle.
    fn add_page(&mut self, width: f64, height: f64) -> PageHandle;

    /// Draw a single line of text with its baseline at `(x, y)`.
    fn draw_text(
        &mut self,
        page: PageHandle,
        text: &str,
        x: f64,
        y: f64,
        size: f64,
        font: FontRef,
        color: Color,
    );

    /// Draw a rectangle with `(x, y)` at its bottom-left corner.
    #[allow(clippy::too_many_arguments)]
    fn draw_rectangle(
        &mut self,
        page: PageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        stroke: Option<Color>,
        fill: Option<Color>,
    );

    /// Draw a straight line segment.
    fn draw_line(
        &mut self,
        page: PageHandle,
        from: (f64, f64),
        to: (f64, f64),
        thickness: f64,
        color: Color,
    );

    /// Handle of an already created page. `index` must be below
    /// [`Canvas::page_count`].
    fn get_page(&self, index: usize) -> PageHandle;

    /// Register image bytes for later drawing. Hosts that validate on embed
    /// return an error here; the engine treats it as fatal for the assembly.
    fn embed_image(&mut self, bytes: &[u8], mime: &str) -> Result<ImageHandle, RapportError>;

    /// Draw a previously embedded image into the given rectangle.
    #[allow(clippy::too_many_arguments)]
    fn draw_image(
        &mut self,
        page: PageHandle,
        image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    );

    /// Number of pages added so far.
    fn page_count(&self) -> usize;
}

// ─── Recording implementation ───────────────────────────────────────

/// A single recorded draw operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        font: FontRef,
        color: Color,
    },
    #[serde(rename_all = "camelCase")]
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        stroke: Option<Color>,
        fill: Option<Color>,
    },
    #[serde(rename_all = "camelCase")]
    Line {
        from: (f64, f64),
        to: (f64, f64),
        thickness: f64,
        color: Color,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// One recorded page with its dimensions and draw log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPage {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

/// A canvas that records every operation instead of rasterizing.
///
/// Text is measured with a flat per-character advance (`char_advance ×
/// size` per character), which keeps layout arithmetic exact and easy to
/// reason about in tests: a box of width `4 × 0.5 × size` holds exactly
/// four characters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingCanvas {
    pub pages: Vec<RecordedPage>,
    char_advance: f64,
    #[serde(skip)]
    embedded: Vec<usize>,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            char_advance: 0.5,
            embedded: Vec::new(),
        }
    }

    /// Override the per-character advance factor (default 0.5).
    pub fn with_char_advance(advance: f64) -> Self {
        Self {
            char_advance: advance,
            ..Self::new()
        }
    }

    /// All ops recorded on a page. Panics on an out-of-range index, which
    /// in a test means the expected page was never created.
    pub fn ops(&self, page_index: usize) -> &[DrawOp] {
        &self.pages[page_index].ops
    }

    /// Every drawn text string on a page, in draw order.
    pub fn texts(&self, page_index: usize) -> Vec<&str> {
        self.pages[page_index]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Count text ops across all pages whose string equals `needle`.
    pub fn count_text(&self, needle: &str) -> usize {
        self.pages
            .iter()
            .flat_map(|p| &p.ops)
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text == needle))
            .count()
    }

    fn page_mut(&mut self, page: PageHandle) -> &mut RecordedPage {
        &mut self.pages[page.0]
    }
}

impl MeasureText for RecordingCanvas {
    fn measure_text_width(&self, text: &str, _font: FontRef, size: f64) -> f64 {
        text.chars().count() as f64 * self.char_advance * size
    }
}

impl Canvas for RecordingCanvas {
    fn add_page(&mut self, width: f64, height: f64) -> PageHandle {
        self.pages.push(RecordedPage {
            width,
            height,
            ops: Vec::new(),
        });
        PageHandle(self.pages.len() - 1)
    }

    fn draw_text(
        &mut self,
        page: PageHandle,
        text: &str,
        x: f64,
        y: f64,
        size: f64,
        font: FontRef,
        color: Color,
    ) {
        self.page_mut(page).ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size,
            font,
            color,
        });
    }

    fn draw_rectangle(
        &mut self,
        page: PageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        stroke: Option<Color>,
        fill: Option<Color>,
    ) {
        self.page_mut(page).ops.push(DrawOp::Rectangle {
            x,
            y,
            width,
            height,
            stroke,
            fill,
        });
    }

    fn draw_line(
        &mut self,
        page: PageHandle,
        from: (f64, f64),
        to: (f64, f64),
        thickness: f64,
        color: Color,
    ) {
        self.page_mut(page).ops.push(DrawOp::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    fn get_page(&self, index: usize) -> PageHandle {
        assert!(index < self.pages.len(), "page {index} was never created");
        PageHandle(index)
    }

    fn embed_image(&mut self, bytes: &[u8], mime: &str) -> Result<ImageHandle, RapportError> {
        if bytes.is_empty() {
            return Err(RapportError::Image {
                name: String::new(),
                reason: format!("refusing to embed empty {mime} data"),
            });
        }
        self.embedded.push(bytes.len());
        Ok(ImageHandle(self.embedded.len() - 1))
    }

    fn draw_image(
        &mut self,
        page: PageHandle,
        image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) {
        self.page_mut(page).ops.push(DrawOp::Image {
            image,
            x,
            y,
            width,
            height,
        });
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}
