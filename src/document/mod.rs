//! FacturaE document rendering.
//!
//! Turns an [`Invoice`](crate::core::Invoice) into the unsigned
//! `fe:Facturae` document. Numbers go through the
//! [`NumericFormatter`](crate::core::NumericFormatter) of the invoice's
//! schema version, text through canonical escaping.
//!
//! # Example
//!
//! ```no_run
//! use facturae::core::*;
//! use facturae::document;
//!
//! let invoice: Invoice = todo!(); // build via InvoiceBuilder
//! let xml = document::to_facturae_xml(&invoice).unwrap();
//! ```

mod invoice;
mod party;

pub use invoice::{facturae_element, to_facturae_xml};
