//! XML plumbing shared by every vendor format
//!
//! - `navigation`: owned element tree with depth-aware queries (roxmltree, quick-xml recovery)
//! - `markup`: escaping and fragment emission for generators
//! - `pretty`: line-based re-indentation

pub mod markup;
pub mod navigation;
pub mod pretty;

pub use markup::{escape, Tag};
pub use navigation::{decode_entities, Element, XmlDocument, XmlError};
pub use pretty::pretty_print;
