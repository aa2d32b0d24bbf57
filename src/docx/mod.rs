//! OOXML container access and structural conversion.
//!
//! The container is opened and validated once per conversion call; the four
//! registries (styles, numbering, fonts, images) are then built from their
//! auxiliary parts before any body conversion starts.

pub mod document;
pub mod fonts;
pub mod images;
pub mod model;
pub mod numbering;
pub mod package;
pub mod styles;
pub mod xmltree;

pub use document::StructuralConverter;
pub use fonts::FontRegistry;
pub use images::ImageRegistry;
pub use model::DocumentModel;
pub use numbering::NumberingRegistry;
pub use package::{ContainerManifest, DocxPackage};
pub use styles::StyleRegistry;
