//! Core invoice types, validation, totals and numeric formatting.
//!
//! This module provides the FacturaE data model independent of any XML
//! rendering: parties, administrative centres, line items and the
//! schema-dependent rules that decide how every decimal is written.

mod builder;
mod error;
pub mod numeric;
mod totals;
mod types;
mod validation;

pub use builder::*;
pub use error::*;
pub use numeric::{DigitRange, NumericFormatter, digit_range, format_decimal};
pub use totals::*;
pub use types::*;
pub use validation::*;
