use rust_decimal::Decimal;

use super::error::ValidationError;
use super::types::*;

/// Validate an invoice before rendering.
/// Returns all validation errors found (not just the first).
pub fn validate_invoice(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.number.trim().is_empty() {
        errors.push(ValidationError::new(
            "number",
            "invoice number must not be empty",
        ));
    }

    if invoice.currency_code.len() != 3 {
        errors.push(ValidationError::new(
            "currency_code",
            "currency code must be 3 characters (ISO 4217)",
        ));
    }

    validate_party(&invoice.seller, "seller", &mut errors);
    validate_party(&invoice.buyer, "buyer", &mut errors);
    if let Some(assignee) = &invoice.assignee {
        validate_party(assignee, "assignee", &mut errors);
    }

    if invoice.items.is_empty() {
        errors.push(ValidationError::new(
            "items",
            "at least one line item is required",
        ));
    }
    for (i, item) in invoice.items.iter().enumerate() {
        validate_item(item, &format!("items[{i}]"), &mut errors);
    }

    validate_adjustments(&invoice.discounts, "discounts", &mut errors);
    validate_adjustments(&invoice.charges, "charges", &mut errors);

    if let Some(period) = &invoice.billing_period {
        if period.start > period.end {
            errors.push(ValidationError::new(
                "billing_period",
                "billing period start must not be after its end",
            ));
        }
    }

    if let Some(payment) = &invoice.payment {
        let needs_account = matches!(
            payment.method,
            PaymentMethod::Transfer | PaymentMethod::DirectDebit
        );
        let has_iban = payment.iban.as_deref().is_some_and(|s| !s.trim().is_empty());
        if needs_account && !has_iban {
            errors.push(ValidationError::new(
                "payment.iban",
                "transfer and direct debit payments require an IBAN",
            ));
        }
    }

    for (i, attachment) in invoice.attachments.iter().enumerate() {
        if !attachment.mime_type.contains('/') {
            errors.push(ValidationError::new(
                format!("attachments[{i}].mime_type"),
                "attachment MIME type must look like type/subtype",
            ));
        }
    }

    errors
}

fn validate_party(party: &Party, prefix: &str, errors: &mut Vec<ValidationError>) {
    if party.tax_number.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.tax_number"),
            "tax number must not be empty",
        ));
    }
    if party.name.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.name"),
            "name must not be empty",
        ));
    }
    if let PartyIdentity::Individual {
        first_surname,
        last_surname,
    } = &party.identity
    {
        if first_surname.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.first_surname"),
                "individuals require a first surname",
            ));
        }
        if last_surname.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.last_surname"),
                "individuals require a second surname",
            ));
        }
    }
    if party.address.country_code.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.address.country_code"),
            "country code must not be empty",
        ));
    }
    for (i, centre) in party.centres.iter().enumerate() {
        if centre.code.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.centres[{i}].code"),
                "centre code must not be empty",
            ));
        }
    }
}

fn validate_item(item: &LineItem, prefix: &str, errors: &mut Vec<ValidationError>) {
    if item.description.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.description"),
            "description must not be empty",
        ));
    }
    if item.quantity < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.quantity"),
            "quantity must not be negative",
        ));
    }
    if item.unit_price_without_tax < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.unit_price_without_tax"),
            "unit price must not be negative",
        ));
    }
    if item.taxes.is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.taxes"),
            "at least one tax is required",
        ));
    }
    for (i, tax) in item.taxes.iter().enumerate() {
        if tax.rate < Decimal::ZERO || tax.surcharge < Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("{prefix}.taxes[{i}]"),
                "tax rates must not be negative",
            ));
        }
    }
    validate_adjustments(&item.discounts, &format!("{prefix}.discounts"), errors);
    validate_adjustments(&item.charges, &format!("{prefix}.charges"), errors);
}

fn validate_adjustments(
    adjustments: &[DiscountOrCharge],
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    for (i, adj) in adjustments.iter().enumerate() {
        let value = match adj.value {
            DiscountValue::Rate(v) | DiscountValue::Amount(v) => v,
        };
        if value < Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("{prefix}[{i}]"),
                "discount and charge values must not be negative",
            ));
        }
    }
}
