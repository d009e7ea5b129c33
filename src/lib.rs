//! # facturae
//!
//! Spanish FacturaE e-invoicing: the invoice model, schema-dependent numeric
//! formatting, the unsigned XML document and an enveloped XAdES-EPES
//! signature over it.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use facturae::core::*;
//! use rust_decimal_macros::dec;
//!
//! let seller = PartyBuilder::legal_entity(
//!     "A00000000",
//!     "Perico de los Palotes S.A.",
//!     AddressBuilder::new("C/ Falsa, 123", "28001", "Madrid", "Madrid").build(),
//! )
//! .build();
//! let buyer = PartyBuilder::individual(
//!     "00000000A",
//!     "Antonio",
//!     "García",
//!     "Pérez",
//!     AddressBuilder::new("Avda. Mayor, 7", "08001", "Barcelona", "Barcelona").build(),
//! )
//! .build();
//!
//! let invoice = InvoiceBuilder::new("FAC201804", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .series("SERIE")
//!     .seller(seller)
//!     .buyer(buyer)
//!     .add_item(
//!         LineItemBuilder::new("Lámpara de pie", dec!(20.14), dec!(3))
//!             .tax(TaxType::Iva, dec!(21))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let totals = calculate_totals(&invoice).unwrap();
//! assert_eq!(totals.invoice_total, dec!(73.11));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Invoice types, builders, validation, totals, numeric formatting |
//! | `xml` | Escaping, namespace injection, element tree, FacturaE document |
//! | `xades` (default) | XAdES-EPES signing and [`xades::export`] |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "xml")]
pub mod document;

#[cfg(feature = "xades")]
pub mod xades;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
