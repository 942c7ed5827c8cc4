//! # Rapport
//!
//! A form-report assembly engine.
//!
//! A report form is the inverse of a free layout problem: the page canvas
//! is fixed, the widgets sit at fixed rects, and the content is whatever
//! a user typed. Something always has too much of it. Most fillers react
//! by clipping. Clipped text in a signed service report is lost evidence,
//! so Rapport never clips: text shrinks toward a floor size first, and
//! whatever still doesn't fit is *diverted*: onto continuation pages for
//! flowed sections, onto an appended overflow annex for field widgets.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]     - Form definition + submission values
//!       ↓
//!   [text]      - Word wrap, shrink-to-fit width resolution
//!       ↓
//!   [layout]    - Field boxes, pagination cursor, tables, overflow annex
//!       ↓
//!   [assemble]  - Draw onto the host canvas, emit audit metadata
//! ```
//!
//! The engine draws through the narrow [`canvas::Canvas`] trait and never
//! touches a concrete document library. One assembly call owns its canvas
//! and cursor exclusively; concurrent submissions each get their own.

pub mod assemble;
pub mod canvas;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod text;
pub mod timesheet;

pub use assemble::{assemble, assemble_json, AssemblyReport, ImagePlacement};
pub use canvas::{Canvas, Color, FontRef, ImageHandle, MeasureText, PageHandle, RecordingCanvas};
pub use error::RapportError;
pub use layout::overflow::{OverflowEntry, Placement};
pub use layout::{layout_in_box, FieldLayoutResult, PageCursor};
pub use model::{FieldStyle, FormDefinition, Submission};
pub use text::{resolve_width, wrap_text, WrapResult};
pub use timesheet::{classify, summarize, BreakCode, ShiftSummary};
