//! Core entry point for the ebook_delivery crate.
//!
//! Markup text flows through [`markup::Segmenter`] into blocks, through
//! [`layout::layout`] into flowables, and through [`render::Renderer`] onto a
//! [`render::Canvas`] backend.  [`pipeline::render_document`] wires these up
//! with default settings; [`delivery::DeliveryAgent`] wraps the pipeline in the
//! payment-slip and mail workflow.

pub mod config;
pub mod content;
pub mod delivery;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod render;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use config::{DeliveryConfig, Margins, PageSize, RenderConfig};
pub use error::{ContentError, RenderError, Result};
pub use model::{Block, Flowable, Language, StyleSheet};
pub use pipeline::{render_document, DocumentPipeline, RenderRequest};
pub use render::RenderedDocument;
