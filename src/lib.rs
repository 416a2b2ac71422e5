//! # labelpress - Label Rendering and Export
//!
//! labelpress turns a label design (an ordered list of text, shape, image and
//! barcode elements on a piece of label stock) into print-exact output:
//!
//! - **PDF** whose page box is exactly the label's physical size in millimetres
//! - **PNG/JPEG** rasters at 203 or 300 DPI
//!
//! The same render path serves single exports, previews, and batch jobs that
//! stamp one artifact per data row.
//!
//! ## Quick Start
//!
//! ```no_run
//! use labelpress::{
//!     assets::{AssetContext, HttpImageSource, DEFAULT_USER_AGENT},
//!     document::{Document, Element},
//!     export::{ExportEngine, ExportFormat},
//!     label::LabelCatalog,
//!     units::Dpi,
//! };
//!
//! # async fn example() -> Result<(), labelpress::LabelError> {
//! let source = HttpImageSource::new(DEFAULT_USER_AGENT, None)
//!     .map_err(|e| labelpress::LabelError::Server(e.to_string()))?;
//! let engine = ExportEngine::new(AssetContext::standard(source));
//!
//! let label = LabelCatalog::built_in().get("2x1").cloned().unwrap();
//! let doc = Document::for_label(label)
//!     .with_element(Element::text(10.0, 10.0, 380.0, 40.0, "SKU 1042"))
//!     .with_element(Element::barcode(10.0, 60.0, 380.0, 120.0, "1042"));
//!
//! let artifact = engine.export(&doc, Dpi::Dpi300, ExportFormat::Pdf).await?;
//! std::fs::write(&artifact.filename, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`units`] | mm / pixel / point conversion at a DPI |
//! | [`label`] | Label stock catalog |
//! | [`document`] | Design document model and data binding |
//! | [`surface`] | Drawing surface abstraction (raster and recording) |
//! | [`render`] | Per-element renderers |
//! | [`assets`] | Image fetching/caching and barcode symbol generation |
//! | [`orchestrator`] | Render passes, async image loads, generation tokens |
//! | [`export`] | Offscreen export to PDF/PNG/JPEG |
//! | [`batch`] | One artifact per data row with per-row isolation |
//! | [`store`] | Document and artifact storage |
//! | [`server`] | HTTP endpoint |
//! | [`error`] | Error types |

pub mod assets;
pub mod batch;
pub mod document;
pub mod error;
pub mod export;
pub mod label;
pub mod orchestrator;
pub mod render;
pub mod server;
pub mod store;
pub mod surface;
pub mod units;

// Re-exports for convenience
pub use document::{Bindings, Document, Element};
pub use error::LabelError;
pub use export::{Artifact, ExportEngine, ExportFormat};
pub use units::Dpi;
