//! # Form and Submission Model
//!
//! The input representation for the assembly engine, designed for direct
//! JSON construction by a hosting request layer.
//!
//! Two halves. The [`FormDefinition`] describes the report template:
//! where each field's widget sits, which sections exist, how the parts
//! table is shaped. The [`Submission`] carries one filled-out form: field
//! values, checkbox states, tabular rows, timesheet rows, and decoded
//! images. The engine combines the two onto a canvas.
//!
//! Field styling is a closed set of values resolved when the definition
//! is loaded. There is no name-pattern matching at render time; a field
//! renders exactly the way its definition says.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::RapportError;

/// A complete form template ready to be filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    /// Report title drawn at the top of page one.
    pub title: String,

    /// Page size and margins for every page of the report.
    #[serde(default)]
    pub page: PageConfig,

    /// Field widgets in declaration order. Overflow pages preserve this
    /// order, so it must match the source form.
    #[serde(default)]
    pub fields: Vec<FieldDef>,

    /// Signature boxes drawn on page one.
    #[serde(default)]
    pub signatures: Vec<SignatureDef>,

    /// Checklist items rendered as a flowed section.
    #[serde(default)]
    pub checklist: Vec<ChecklistItemDef>,

    /// Shape of the parts table section.
    #[serde(default)]
    pub parts: PartsDef,
}

impl FormDefinition {
    /// Validate internal consistency before assembly.
    pub fn validate(&self) -> Result<(), RapportError> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(RapportError::Definition(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            if field.rect.width <= 0.0 || field.rect.height <= 0.0 {
                return Err(RapportError::Definition(format!(
                    "field '{}' has a degenerate widget rect",
                    field.name
                )));
            }
            if field.style.min_font_size > field.style.font_size {
                return Err(RapportError::Definition(format!(
                    "field '{}' has min font size above its base size",
                    field.name
                )));
            }
        }
        if !self.parts.columns.is_empty() {
            let total: f64 = self.parts.columns.iter().map(|c| c.width_ratio).sum();
            if !(total > 0.0) {
                return Err(RapportError::Definition(
                    "parts table column ratios must sum to a positive value".to_string(),
                ));
            }
            if self.parts.headers.len() != self.parts.columns.len() {
                return Err(RapportError::Definition(format!(
                    "parts table has {} headers for {} columns",
                    self.parts.headers.len(),
                    self.parts.columns.len()
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for a page: size and margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default = "PageSize::default")]
    pub size: PageSize,

    /// Page margins in layout units (points).
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

fn default_margin() -> Edges {
    Edges::uniform(40.0)
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) for page margins.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An axis-aligned rectangle with its origin at the bottom-left corner,
/// in page coordinates (y grows upward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// One field widget: a labeled box somewhere on page one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Stable identifier; keys into [`Submission::values`].
    pub name: String,
    /// Human-readable label drawn with the box and on overflow pages.
    pub label: String,
    /// The widget rectangle on page one.
    pub rect: Rect,
    /// Resolved style for this field.
    #[serde(default)]
    pub style: FieldStyle,
}

/// Resolved text styling for a field widget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyle {
    /// Preferred font size.
    pub font_size: f64,
    /// Smallest size the shrink search may reach.
    pub min_font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Whether the widget may hold more than one line.
    pub multiline: bool,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            min_font_size: 6.0,
            line_height: 1.2,
            multiline: false,
        }
    }
}

impl FieldStyle {
    /// The default style for free-text comment fields.
    pub fn multiline() -> Self {
        Self {
            multiline: true,
            ..Self::default()
        }
    }
}

/// A signature box on page one, filled from a submitted signature image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDef {
    pub name: String,
    pub label: String,
    pub rect: Rect,
}

/// One checklist item. Unchecked items without a note are not rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemDef {
    pub name: String,
    pub label: String,
}

/// Shape of the parts table: title, column headers, and width ratios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartsDef {
    #[serde(default = "default_parts_title")]
    pub title: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
}

impl Default for PartsDef {
    fn default() -> Self {
        Self {
            title: default_parts_title(),
            headers: Vec::new(),
            columns: Vec::new(),
        }
    }
}

fn default_parts_title() -> String {
    "Parts and materials".to_string()
}

/// A table column sized as a ratio of the available width. Ratios are
/// scaled uniformly so the columns always fill the inter-margin width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub width_ratio: f64,
}

impl TableColumn {
    pub fn ratio(width_ratio: f64) -> Self {
        Self { width_ratio }
    }
}

// ─── Submission ─────────────────────────────────────────────────────

/// One filled-out form as delivered by the host request layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Field name to entered value.
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,

    /// Checklist item name to checked state.
    #[serde(default)]
    pub checkboxes: BTreeMap<String, bool>,

    /// Checklist item name to free-text note.
    #[serde(default)]
    pub notes: BTreeMap<String, String>,

    /// Raw parts table rows, outer order preserved.
    #[serde(default)]
    pub parts_rows: Vec<Vec<String>>,

    /// Raw employee timesheet rows.
    #[serde(default)]
    pub employees: Vec<EmployeeRow>,

    /// Submitted images: photos and signatures.
    #[serde(default)]
    pub images: Vec<SubmittedImage>,
}

/// A field value: a single string or an array of strings.
///
/// Arrays come from multi-select inputs; they render joined by newlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// The renderable text for this value.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join("\n"),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// One raw timesheet row. Arrival and departure stay as entered strings;
/// classification happens during assembly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRow {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub arrival: String,
    #[serde(default)]
    pub departure: String,
}

/// What a submitted image is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    /// Evidence photo; rendered on appended photo pages.
    Photo,
    /// Signature; rendered into its matching [`SignatureDef`] box.
    Signature,
}

/// A submitted image with base64-encoded data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedImage {
    /// Original file name, used in captions and error messages.
    pub name: String,
    /// Declared MIME type (verified against the actual bytes on load).
    pub mime: String,
    /// Base64-encoded image bytes, optionally as a data URI.
    pub data: String,
    pub kind: ImageKind,
}
