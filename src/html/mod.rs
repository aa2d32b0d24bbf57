//! HTML output: escaping, color canonicalization, the document renderer and
//! the heading heuristic normalizer.

pub mod color;
pub mod css;
pub mod escape;
pub mod headings;
pub mod render;

pub use escape::escape_html;
pub use headings::normalize_headings;
pub use render::render_document;
