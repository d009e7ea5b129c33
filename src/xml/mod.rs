//! XML assembly primitives.
//!
//! - [`escape`] / [`unescape`] for the five reserved characters
//! - [`inject_namespaces`] to merge namespace declarations into a fragment's
//!   root tag in canonical attribute order
//! - [`XmlElement`], a small element tree rendered through `quick_xml`

mod escape;
mod namespaces;
mod tree;

pub use escape::{escape, unescape};
pub use namespaces::{canonical_order, inject_namespaces, is_namespace_declaration};
pub use tree::{XmlElement, XmlNode};

pub(crate) use namespaces::RootTag;

/// Namespace URIs used by FacturaE and its signatures.
pub mod ns {
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
    pub const XADES: &str = "http://uri.etsi.org/01903/v1.3.2#";
}
