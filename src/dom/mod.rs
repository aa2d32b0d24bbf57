//! Arena-backed HTML DOM.
//!
//! This is the crate's render surface: the high-fidelity renderer, the
//! heading normalizer and the export composer all parse HTML into this
//! arena and walk or rewrite it. Nodes live in one contiguous vector;
//! parent/child/sibling links are indices into it. Only the calling thread
//! ever constructs one - the background worker deliberately has no access
//! to this machinery.

mod arena;
mod serialize;
mod sink;

pub use arena::{Dom, Node, NodeData, NodeId};
pub use serialize::{serialize_children, serialize_node};
pub use sink::{parse_fragment, parse_html};
