use rust_decimal::Decimal;
use serde::Serialize;

use super::error::FacturaeError;
use super::numeric::{NumericFormatter, field};
use super::types::*;

/// A discount or charge with its amount resolved against a base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedAdjustment {
    pub reason: String,
    /// Percentage, when the adjustment was given as a rate.
    pub rate: Option<Decimal>,
    pub amount: Decimal,
}

/// One row of a taxes block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxLine {
    pub tax_type: TaxType,
    pub rate: Decimal,
    pub surcharge: Decimal,
    pub base: Decimal,
    pub amount: Decimal,
    pub surcharge_amount: Decimal,
}

/// Amounts derived from a single line item.
#[derive(Debug, Clone, Serialize)]
pub struct LineTotals {
    /// Quantity × unit price.
    pub total_cost: Decimal,
    pub discounts: Vec<AppliedAdjustment>,
    pub charges: Vec<AppliedAdjustment>,
    /// Total cost less discounts plus charges; the taxable base of the line.
    pub gross_amount: Decimal,
    pub taxes_outputs: Vec<TaxLine>,
    pub taxes_withheld: Vec<TaxLine>,
}

/// Amounts derived from the whole invoice.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceTotals {
    pub lines: Vec<LineTotals>,
    pub gross_amount: Decimal,
    pub general_discounts: Vec<AppliedAdjustment>,
    pub general_charges: Vec<AppliedAdjustment>,
    pub total_general_discounts: Decimal,
    pub total_general_charges: Decimal,
    pub gross_amount_before_taxes: Decimal,
    /// Output taxes grouped by type, rate and surcharge in first-seen order.
    pub taxes_outputs: Vec<TaxLine>,
    pub taxes_withheld: Vec<TaxLine>,
    pub total_taxes_outputs: Decimal,
    pub total_taxes_withheld: Decimal,
    pub invoice_total: Decimal,
}

/// Compute line and invoice totals.
///
/// Every intermediate amount is rounded with the same digit rules used to
/// render it, so the document always adds up as written. Amounts outside the
/// decimal range fail with [`FacturaeError::Formatting`].
pub fn calculate_totals(invoice: &Invoice) -> Result<InvoiceTotals, FacturaeError> {
    let fmt = NumericFormatter::new(invoice.schema_version);

    let mut lines = Vec::with_capacity(invoice.items.len());
    for item in &invoice.items {
        lines.push(line_totals(&fmt, item)?);
    }

    let mut taxes_outputs: Vec<TaxLine> = Vec::new();
    let mut taxes_withheld: Vec<TaxLine> = Vec::new();
    let mut total_taxes_outputs = Decimal::ZERO;
    let mut total_taxes_withheld = Decimal::ZERO;
    let mut gross = Decimal::ZERO;

    for line in &lines {
        gross = fmt.checked_add(gross, line.gross_amount, field::TOTAL)?;
        for tax in &line.taxes_outputs {
            total_taxes_outputs = add_tax(&fmt, total_taxes_outputs, tax)?;
            merge_tax(&fmt, &mut taxes_outputs, tax)?;
        }
        for tax in &line.taxes_withheld {
            total_taxes_withheld = add_tax(&fmt, total_taxes_withheld, tax)?;
            merge_tax(&fmt, &mut taxes_withheld, tax)?;
        }
    }
    for tax in taxes_outputs.iter_mut().chain(taxes_withheld.iter_mut()) {
        tax.base = fmt.round(tax.base, field::TAX_BASE)?;
        tax.amount = fmt.round(tax.amount, field::TAX_AMOUNT)?;
        tax.surcharge_amount = fmt.round(tax.surcharge_amount, field::TAX_SURCHARGE_AMOUNT)?;
    }

    let gross_amount = fmt.round(gross, field::TOTAL)?;
    let general_discounts = apply_adjustments(&fmt, &invoice.discounts, gross_amount)?;
    let general_charges = apply_adjustments(&fmt, &invoice.charges, gross_amount)?;
    let total_general_discounts = fmt.round(sum(&fmt, &general_discounts)?, field::TOTAL)?;
    let total_general_charges = fmt.round(sum(&fmt, &general_charges)?, field::TOTAL)?;
    let total_taxes_outputs = fmt.round(total_taxes_outputs, field::TOTAL)?;
    let total_taxes_withheld = fmt.round(total_taxes_withheld, field::TOTAL)?;

    let gross_amount_before_taxes = fmt.round(
        fmt.checked_add(
            fmt.checked_sub(gross_amount, total_general_discounts, field::TOTAL)?,
            total_general_charges,
            field::TOTAL,
        )?,
        field::TOTAL,
    )?;
    let invoice_total = fmt.round(
        fmt.checked_sub(
            fmt.checked_add(gross_amount_before_taxes, total_taxes_outputs, field::TOTAL)?,
            total_taxes_withheld,
            field::TOTAL,
        )?,
        field::TOTAL,
    )?;

    Ok(InvoiceTotals {
        lines,
        gross_amount,
        general_discounts,
        general_charges,
        total_general_discounts,
        total_general_charges,
        gross_amount_before_taxes,
        taxes_outputs,
        taxes_withheld,
        total_taxes_outputs,
        total_taxes_withheld,
        invoice_total,
    })
}

fn line_totals(fmt: &NumericFormatter, item: &LineItem) -> Result<LineTotals, FacturaeError> {
    let quantity = fmt.round(item.quantity, field::ITEM_QUANTITY)?;
    let unit_price = fmt.round(item.unit_price_without_tax, field::ITEM_UNIT_PRICE)?;
    let total_cost = fmt.round(
        fmt.checked_mul(quantity, unit_price, field::ITEM_TOTAL_AMOUNT)?,
        field::ITEM_TOTAL_AMOUNT,
    )?;

    let discounts = apply_adjustments(fmt, &item.discounts, total_cost)?;
    let charges = apply_adjustments(fmt, &item.charges, total_cost)?;
    let gross_amount = fmt.round(
        fmt.checked_add(
            fmt.checked_sub(total_cost, sum(fmt, &discounts)?, field::ITEM_GROSS_AMOUNT)?,
            sum(fmt, &charges)?,
            field::ITEM_GROSS_AMOUNT,
        )?,
        field::ITEM_GROSS_AMOUNT,
    )?;

    let mut taxes_outputs = Vec::new();
    let mut taxes_withheld = Vec::new();
    for tax in &item.taxes {
        let rate = fmt.round(tax.rate, field::TAX_RATE)?;
        let surcharge = fmt.round(tax.surcharge, field::TAX_SURCHARGE)?;
        let line = TaxLine {
            tax_type: tax.tax_type,
            rate,
            surcharge,
            base: fmt.round(gross_amount, field::TAX_BASE)?,
            amount: fmt.round(
                fmt.percent_of(gross_amount, rate, field::TAX_AMOUNT)?,
                field::TAX_AMOUNT,
            )?,
            surcharge_amount: fmt.round(
                fmt.percent_of(gross_amount, surcharge, field::TAX_SURCHARGE_AMOUNT)?,
                field::TAX_SURCHARGE_AMOUNT,
            )?,
        };
        if tax.withheld {
            taxes_withheld.push(line);
        } else {
            taxes_outputs.push(line);
        }
    }

    Ok(LineTotals {
        total_cost,
        discounts,
        charges,
        gross_amount,
        taxes_outputs,
        taxes_withheld,
    })
}

fn apply_adjustments(
    fmt: &NumericFormatter,
    adjustments: &[DiscountOrCharge],
    base: Decimal,
) -> Result<Vec<AppliedAdjustment>, FacturaeError> {
    adjustments
        .iter()
        .map(|adj| {
            let (rate, amount) = match adj.value {
                DiscountValue::Rate(rate) => {
                    let rate = fmt.round(rate, field::DISCOUNT_RATE)?;
                    (Some(rate), fmt.percent_of(base, rate, field::DISCOUNT_AMOUNT)?)
                }
                DiscountValue::Amount(amount) => (None, amount),
            };
            Ok(AppliedAdjustment {
                reason: adj.reason.clone(),
                rate,
                amount: fmt.round(amount, field::DISCOUNT_AMOUNT)?,
            })
        })
        .collect()
}

fn sum(fmt: &NumericFormatter, adjustments: &[AppliedAdjustment]) -> Result<Decimal, FacturaeError> {
    adjustments.iter().try_fold(Decimal::ZERO, |acc, a| {
        fmt.checked_add(acc, a.amount, field::DISCOUNT_AMOUNT)
    })
}

fn add_tax(fmt: &NumericFormatter, total: Decimal, tax: &TaxLine) -> Result<Decimal, FacturaeError> {
    let total = fmt.checked_add(total, tax.amount, field::TOTAL)?;
    fmt.checked_add(total, tax.surcharge_amount, field::TOTAL)
}

fn merge_tax(fmt: &NumericFormatter, groups: &mut Vec<TaxLine>, tax: &TaxLine) -> Result<(), FacturaeError> {
    match groups.iter_mut().find(|g| {
        g.tax_type == tax.tax_type && g.rate == tax.rate && g.surcharge == tax.surcharge
    }) {
        Some(group) => {
            group.base = fmt.checked_add(group.base, tax.base, field::TAX_BASE)?;
            group.amount = fmt.checked_add(group.amount, tax.amount, field::TAX_AMOUNT)?;
            group.surcharge_amount = fmt.checked_add(
                group.surcharge_amount,
                tax.surcharge_amount,
                field::TAX_SURCHARGE_AMOUNT,
            )?;
        }
        None => groups.push(tax.clone()),
    }
    Ok(())
}
