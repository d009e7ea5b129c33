//! Schema-dependent decimal rendering.
//!
//! Every number in a FacturaE document is written with a number of decimal
//! digits that depends on the schema version and on the element being
//! written. Rules are looked up by schema version and field path, then in a
//! version-agnostic table, then fall back to exactly two digits.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::FacturaeError;
use super::types::SchemaVersion;

/// Field paths used as keys into the digit-range tables.
pub mod field {
    pub const ITEM_QUANTITY: &str = "Item/Quantity";
    pub const ITEM_UNIT_PRICE: &str = "Item/UnitPriceWithoutTax";
    pub const ITEM_TOTAL_AMOUNT: &str = "Item/TotalAmountWithoutTax";
    pub const ITEM_GROSS_AMOUNT: &str = "Item/GrossAmount";
    pub const TAX_RATE: &str = "Tax/Rate";
    pub const TAX_BASE: &str = "Tax/Base";
    pub const TAX_AMOUNT: &str = "Tax/Amount";
    pub const TAX_SURCHARGE: &str = "Tax/Surcharge";
    pub const TAX_SURCHARGE_AMOUNT: &str = "Tax/SurchargeAmount";
    pub const DISCOUNT_RATE: &str = "Discount/Rate";
    pub const DISCOUNT_AMOUNT: &str = "Discount/Amount";
    /// Invoice-level totals; resolves to the global default.
    pub const TOTAL: &str = "Total";
}

/// Inclusive range of decimal digits allowed for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitRange {
    pub min: u32,
    pub max: u32,
}

impl DigitRange {
    pub const DEFAULT: DigitRange = DigitRange { min: 2, max: 2 };

    const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

const DEFAULT_RULES: &[(&str, DigitRange)] = &[
    (field::ITEM_QUANTITY, DigitRange::new(2, 8)),
    (field::ITEM_UNIT_PRICE, DigitRange::new(2, 8)),
    (field::ITEM_GROSS_AMOUNT, DigitRange::new(2, 8)),
    (field::TAX_RATE, DigitRange::new(2, 8)),
    (field::DISCOUNT_RATE, DigitRange::new(2, 8)),
    (field::DISCOUNT_AMOUNT, DigitRange::new(2, 2)),
];

const V3_2_RULES: &[(&str, DigitRange)] = &[
    (field::ITEM_QUANTITY, DigitRange::new(2, 6)),
    (field::ITEM_TOTAL_AMOUNT, DigitRange::new(6, 6)),
    (field::ITEM_UNIT_PRICE, DigitRange::new(6, 6)),
    (field::ITEM_GROSS_AMOUNT, DigitRange::new(6, 6)),
    (field::DISCOUNT_RATE, DigitRange::new(4, 4)),
    (field::DISCOUNT_AMOUNT, DigitRange::new(6, 6)),
];

/// Fields whose domain excludes negative values.
const NON_NEGATIVE: &[&str] = &[
    field::ITEM_QUANTITY,
    field::ITEM_UNIT_PRICE,
    field::TAX_RATE,
    field::DISCOUNT_RATE,
];

fn schema_rules(version: SchemaVersion) -> &'static [(&'static str, DigitRange)] {
    match version {
        SchemaVersion::V3_2 => V3_2_RULES,
        SchemaVersion::V3_2_1 | SchemaVersion::V3_2_2 => &[],
    }
}

fn lookup(table: &[(&str, DigitRange)], path: &str) -> Option<DigitRange> {
    table.iter().find(|(p, _)| *p == path).map(|(_, r)| *r)
}

/// Digit range that applies to `path` under `version`.
pub fn digit_range(path: &str, version: SchemaVersion) -> DigitRange {
    lookup(schema_rules(version), path)
        .or_else(|| lookup(DEFAULT_RULES, path))
        .unwrap_or(DigitRange::DEFAULT)
}

/// Formats decimals for a fixed schema version.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericFormatter {
    version: SchemaVersion,
}

impl NumericFormatter {
    pub fn new(version: SchemaVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Round `value` half away from zero to the field's maximum digits.
    pub fn round(&self, value: Decimal, path: &str) -> Result<Decimal, FacturaeError> {
        if value.is_sign_negative() && !value.is_zero() && NON_NEGATIVE.contains(&path) {
            return Err(self.error(path, format!("negative value {value} not allowed")));
        }
        let range = digit_range(path, self.version);
        let rounded = value.round_dp_with_strategy(range.max, RoundingStrategy::MidpointAwayFromZero);
        // drops the sign of a zero result
        Ok(rounded.normalize())
    }

    /// Render `value` in fixed-point notation with between `min` and `max`
    /// decimal digits.
    pub fn format(&self, value: Decimal, path: &str) -> Result<String, FacturaeError> {
        let range = digit_range(path, self.version);
        let mut rounded = self.round(value, path)?;
        if rounded.scale() < range.min {
            rounded.rescale(range.min);
            // rescale stops short when the mantissa has no room left
            if rounded.scale() < range.min {
                return Err(self.error(
                    path,
                    format!("value {value} cannot be represented with {} decimals", range.min),
                ));
            }
        }
        Ok(rounded.to_string())
    }

    /// Like [`format`](Self::format) for binary floating point input.
    pub fn format_f64(&self, value: f64, path: &str) -> Result<String, FacturaeError> {
        if !value.is_finite() {
            return Err(self.error(path, format!("non-finite value {value}")));
        }
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| self.error(path, format!("value {value} out of decimal range")))?;
        self.format(decimal, path)
    }

    /// `a × b`, or a formatting error for `path` on overflow.
    pub fn checked_mul(&self, a: Decimal, b: Decimal, path: &str) -> Result<Decimal, FacturaeError> {
        a.checked_mul(b)
            .ok_or_else(|| self.error(path, format!("{a} × {b} overflows")))
    }

    /// `a + b`, or a formatting error for `path` on overflow.
    pub fn checked_add(&self, a: Decimal, b: Decimal, path: &str) -> Result<Decimal, FacturaeError> {
        a.checked_add(b)
            .ok_or_else(|| self.error(path, format!("{a} + {b} overflows")))
    }

    /// `a - b`, or a formatting error for `path` on overflow.
    pub fn checked_sub(&self, a: Decimal, b: Decimal, path: &str) -> Result<Decimal, FacturaeError> {
        a.checked_sub(b)
            .ok_or_else(|| self.error(path, format!("{a} - {b} overflows")))
    }

    /// `rate` percent of `base`.
    pub fn percent_of(&self, base: Decimal, rate: Decimal, path: &str) -> Result<Decimal, FacturaeError> {
        let product = self.checked_mul(base, rate, path)?;
        product
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or_else(|| self.error(path, format!("{product} / 100 overflows")))
    }

    fn error(&self, path: &str, message: String) -> FacturaeError {
        FacturaeError::Formatting {
            field: path.to_string(),
            schema: self.version,
            message,
        }
    }
}

/// Shorthand for `NumericFormatter::new(version).format(value, path)`.
pub fn format_decimal(
    value: Decimal,
    path: &str,
    version: SchemaVersion,
) -> Result<String, FacturaeError> {
    NumericFormatter::new(version).format(value, path)
}
