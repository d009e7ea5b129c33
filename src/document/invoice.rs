use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;

use crate::core::numeric::field;
use crate::core::*;
use crate::xml::{XmlElement, ns};

use super::party::party_element;

/// Render the unsigned FacturaE document for `invoice`.
///
/// The invoice is validated first; no XML is produced for an invalid one.
pub fn to_facturae_xml(invoice: &Invoice) -> Result<String, FacturaeError> {
    facturae_element(invoice)?.to_document()
}

/// Build the `fe:Facturae` root element for `invoice`.
pub fn facturae_element(invoice: &Invoice) -> Result<XmlElement, FacturaeError> {
    let errors = validate_invoice(invoice);
    if !errors.is_empty() {
        return Err(FacturaeError::Validation(errors));
    }

    let fmt = NumericFormatter::new(invoice.schema_version);
    let totals = calculate_totals(invoice)?;
    let total = fmt.format(totals.invoice_total, field::TOTAL)?;

    tracing::debug!(
        number = %invoice.number,
        schema = %invoice.schema_version,
        items = invoice.items.len(),
        total = %total,
        "rendering FacturaE document"
    );

    let payment = payment_details(invoice, &total);

    let invoice_element = XmlElement::new("Invoice")
        .child(invoice_header(invoice))
        .child(issue_data(invoice))
        .opt_child(taxes_block("TaxesOutputs", &totals.taxes_outputs, &fmt)?)
        .opt_child(taxes_block("TaxesWithheld", &totals.taxes_withheld, &fmt)?)
        .child(invoice_totals(&totals, &fmt)?)
        .child(items(invoice, &totals, &fmt)?)
        .opt_child(payment.clone())
        .opt_child(legal_literals(invoice))
        .opt_child(additional_data(invoice));

    Ok(XmlElement::new("fe:Facturae")
        .attr("xmlns:ds", ns::DS)
        .attr("xmlns:fe", invoice.schema_version.namespace())
        .child(file_header(invoice, &total, payment))
        .child(
            XmlElement::new("Parties")
                .child(party_element("SellerParty", &invoice.seller))
                .child(party_element("BuyerParty", &invoice.buyer)),
        )
        .child(XmlElement::new("Invoices").child(invoice_element)))
}

fn total_amount(tag: &str, amount: &str) -> XmlElement {
    XmlElement::new(tag).text_child("TotalAmount", amount)
}

fn file_header(invoice: &Invoice, total: &str, payment: Option<XmlElement>) -> XmlElement {
    let batch_identifier = format!(
        "{}{}{}",
        invoice.seller.tax_number, invoice.number, invoice.series
    );
    XmlElement::new("FileHeader")
        .text_child("SchemaVersion", invoice.schema_version.code())
        .text_child("Modality", "I")
        .text_child("InvoiceIssuerType", "EM")
        .child(
            XmlElement::new("Batch")
                .text_child("BatchIdentifier", batch_identifier)
                .text_child("InvoicesCount", "1")
                .child(total_amount("TotalInvoicesAmount", total))
                .child(total_amount("TotalOutstandingAmount", total))
                .child(total_amount("TotalExecutableAmount", total))
                .text_child("InvoiceCurrencyCode", invoice.currency_code.as_str()),
        )
        .opt_child(factoring_assignment(invoice, payment))
}

/// `FactoringAssignmentData`, present only for assigned invoices. Repeats
/// the invoice's payment details.
fn factoring_assignment(invoice: &Invoice, payment: Option<XmlElement>) -> Option<XmlElement> {
    let assignee = invoice.assignee.as_ref()?;
    Some(
        XmlElement::new("FactoringAssignmentData")
            .child(party_element("Assignee", assignee))
            .opt_child(payment)
            .opt_text_child(
                "FactoringAssignmentClauses",
                invoice.assignment_clauses.as_deref(),
            ),
    )
}

fn invoice_header(invoice: &Invoice) -> XmlElement {
    XmlElement::new("InvoiceHeader")
        .text_child("InvoiceNumber", invoice.number.as_str())
        .text_child("InvoiceSeriesCode", invoice.series.as_str())
        .text_child("InvoiceDocumentType", "FC")
        .text_child("InvoiceClass", "OO")
}

fn issue_data(invoice: &Invoice) -> XmlElement {
    let period = invoice.billing_period.as_ref().map(|p| {
        XmlElement::new("InvoicingPeriod")
            .text_child("StartDate", p.start.format("%Y-%m-%d").to_string())
            .text_child("EndDate", p.end.format("%Y-%m-%d").to_string())
    });
    XmlElement::new("InvoiceIssueData")
        .text_child("IssueDate", invoice.issue_date.format("%Y-%m-%d").to_string())
        .opt_child(period)
        .text_child("InvoiceCurrencyCode", invoice.currency_code.as_str())
        .text_child("TaxCurrencyCode", invoice.currency_code.as_str())
        .text_child("LanguageName", invoice.language.as_str())
        .opt_text_child("InvoiceDescription", invoice.description.as_deref())
        .opt_text_child(
            "ReceiverTransactionReference",
            invoice.receiver_transaction_reference.as_deref(),
        )
        .opt_text_child("FileReference", invoice.file_reference.as_deref())
        .opt_text_child(
            "ReceiverContractReference",
            invoice.receiver_contract_reference.as_deref(),
        )
}

fn taxes_block(
    tag: &str,
    taxes: &[TaxLine],
    fmt: &NumericFormatter,
) -> Result<Option<XmlElement>, FacturaeError> {
    if taxes.is_empty() {
        return Ok(None);
    }
    let mut block = XmlElement::new(tag);
    for tax in taxes {
        let mut el = XmlElement::new("Tax")
            .text_child("TaxTypeCode", tax.tax_type.code())
            .text_child("TaxRate", fmt.format(tax.rate, field::TAX_RATE)?)
            .child(total_amount("TaxableBase", &fmt.format(tax.base, field::TAX_BASE)?))
            .child(total_amount("TaxAmount", &fmt.format(tax.amount, field::TAX_AMOUNT)?));
        if !tax.surcharge.is_zero() {
            el = el
                .text_child(
                    "EquivalenceSurcharge",
                    fmt.format(tax.surcharge, field::TAX_SURCHARGE)?,
                )
                .child(total_amount(
                    "EquivalenceSurchargeAmount",
                    &fmt.format(tax.surcharge_amount, field::TAX_SURCHARGE_AMOUNT)?,
                ));
        }
        block.push(el);
    }
    Ok(Some(block))
}

/// `GeneralDiscounts`/`Discount` style groups, shared by invoice and lines.
fn adjustments_block(
    group_tag: &str,
    tag: &str,
    adjustments: &[AppliedAdjustment],
    fmt: &NumericFormatter,
) -> Result<Option<XmlElement>, FacturaeError> {
    if adjustments.is_empty() {
        return Ok(None);
    }
    let mut group = XmlElement::new(group_tag);
    for adj in adjustments {
        let mut el = XmlElement::new(tag).text_child(&format!("{tag}Reason"), adj.reason.as_str());
        if let Some(rate) = adj.rate {
            el = el.text_child(&format!("{tag}Rate"), fmt.format(rate, field::DISCOUNT_RATE)?);
        }
        el = el.text_child(
            &format!("{tag}Amount"),
            fmt.format(adj.amount, field::DISCOUNT_AMOUNT)?,
        );
        group.push(el);
    }
    Ok(Some(group))
}

fn invoice_totals(
    totals: &InvoiceTotals,
    fmt: &NumericFormatter,
) -> Result<XmlElement, FacturaeError> {
    let amount = |v| fmt.format(v, field::TOTAL);
    let invoice_total = amount(totals.invoice_total)?;
    Ok(XmlElement::new("InvoiceTotals")
        .text_child("TotalGrossAmount", amount(totals.gross_amount)?)
        .opt_child(adjustments_block(
            "GeneralDiscounts",
            "Discount",
            &totals.general_discounts,
            fmt,
        )?)
        .opt_child(adjustments_block(
            "GeneralSurcharges",
            "Charge",
            &totals.general_charges,
            fmt,
        )?)
        .text_child("TotalGeneralDiscounts", amount(totals.total_general_discounts)?)
        .text_child("TotalGeneralSurcharges", amount(totals.total_general_charges)?)
        .text_child(
            "TotalGrossAmountBeforeTaxes",
            amount(totals.gross_amount_before_taxes)?,
        )
        .text_child("TotalTaxOutputs", amount(totals.total_taxes_outputs)?)
        .text_child("TotalTaxesWithheld", amount(totals.total_taxes_withheld)?)
        .text_child("InvoiceTotal", invoice_total.as_str())
        .text_child("TotalOutstandingAmount", invoice_total.as_str())
        .text_child("TotalExecutableAmount", invoice_total))
}

fn items(
    invoice: &Invoice,
    totals: &InvoiceTotals,
    fmt: &NumericFormatter,
) -> Result<XmlElement, FacturaeError> {
    let mut items = XmlElement::new("Items");
    for (item, line) in invoice.items.iter().zip(&totals.lines) {
        let el = line_references(XmlElement::new("InvoiceLine"), &item.references)
            .text_child("ItemDescription", item.description.as_str())
            .text_child("Quantity", fmt.format(item.quantity, field::ITEM_QUANTITY)?)
            .text_child("UnitOfMeasure", item.unit.code())
            .text_child(
                "UnitPriceWithoutTax",
                fmt.format(item.unit_price_without_tax, field::ITEM_UNIT_PRICE)?,
            )
            .text_child(
                "TotalCost",
                fmt.format(line.total_cost, field::ITEM_TOTAL_AMOUNT)?,
            )
            .opt_child(adjustments_block(
                "DiscountsAndRebates",
                "Discount",
                &line.discounts,
                fmt,
            )?)
            .opt_child(adjustments_block("Charges", "Charge", &line.charges, fmt)?)
            .text_child(
                "GrossAmount",
                fmt.format(line.gross_amount, field::ITEM_GROSS_AMOUNT)?,
            )
            // withheld precedes outputs at line level
            .opt_child(taxes_block("TaxesWithheld", &line.taxes_withheld, fmt)?)
            .opt_child(taxes_block("TaxesOutputs", &line.taxes_outputs, fmt)?)
            .opt_text_child(
                "AdditionalLineItemInformation",
                item.additional_information.as_deref(),
            )
            .opt_text_child("ArticleCode", item.article_code.as_deref());
        items.push(el);
    }
    Ok(items)
}

fn line_references(line: XmlElement, refs: &LineReferences) -> XmlElement {
    let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
    line.opt_text_child("IssuerContractReference", refs.issuer_contract_reference.as_deref())
        .opt_text_child("IssuerContractDate", date(refs.issuer_contract_date).as_deref())
        .opt_text_child(
            "IssuerTransactionReference",
            refs.issuer_transaction_reference.as_deref(),
        )
        .opt_text_child("IssuerTransactionDate", date(refs.issuer_transaction_date).as_deref())
        .opt_text_child(
            "ReceiverContractReference",
            refs.receiver_contract_reference.as_deref(),
        )
        .opt_text_child("ReceiverContractDate", date(refs.receiver_contract_date).as_deref())
        .opt_text_child(
            "ReceiverTransactionReference",
            refs.receiver_transaction_reference.as_deref(),
        )
        .opt_text_child(
            "ReceiverTransactionDate",
            date(refs.receiver_transaction_date).as_deref(),
        )
        .opt_text_child("FileReference", refs.file_reference.as_deref())
        .opt_text_child("FileDate", date(refs.file_date).as_deref())
        .opt_text_child("SequenceNumber", refs.sequence_number.as_deref())
}

fn payment_details(invoice: &Invoice, total: &str) -> Option<XmlElement> {
    let payment = invoice.payment.as_ref()?;
    let due_date = payment.due_date.unwrap_or(invoice.issue_date);

    let account = payment.iban.as_deref().map(|iban| {
        let tag = if payment.method == PaymentMethod::DirectDebit {
            "AccountToBeDebited"
        } else {
            "AccountToBeCredited"
        };
        XmlElement::new(tag)
            .text_child("IBAN", normalize_bank_code(iban))
            .opt_text_child("BIC", payment.bic.as_deref().map(normalize_bic).as_deref())
    });

    Some(
        XmlElement::new("PaymentDetails").child(
            XmlElement::new("Installment")
                .text_child("InstallmentDueDate", due_date.format("%Y-%m-%d").to_string())
                .text_child("InstallmentAmount", total)
                .text_child("PaymentMeans", payment.method.code())
                .opt_child(account),
        ),
    )
}

/// Keep only `A-Z0-9`, upper-casing letters.
fn normalize_bank_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Normalized BIC right-padded with `X` to 11 characters.
fn normalize_bic(bic: &str) -> String {
    format!("{:X<11}", normalize_bank_code(bic))
}

fn legal_literals(invoice: &Invoice) -> Option<XmlElement> {
    if invoice.legal_literals.is_empty() {
        return None;
    }
    Some(
        XmlElement::new("LegalLiterals").children_from(
            invoice
                .legal_literals
                .iter()
                .map(|l| XmlElement::with_text("LegalReference", l.as_str())),
        ),
    )
}

fn additional_data(invoice: &Invoice) -> Option<XmlElement> {
    let related = invoice.related_invoice.as_deref().filter(|s| !s.is_empty());
    let info = invoice
        .additional_information
        .as_deref()
        .filter(|s| !s.is_empty());
    if related.is_none() && info.is_none() && invoice.attachments.is_empty() {
        return None;
    }
    let documents = (!invoice.attachments.is_empty()).then(|| {
        XmlElement::new("RelatedDocuments")
            .children_from(invoice.attachments.iter().map(attachment_element))
    });
    Some(
        XmlElement::new("AdditionalData")
            .opt_text_child("RelatedInvoice", related)
            .opt_child(documents)
            .opt_text_child("InvoiceAdditionalInformation", info),
    )
}

fn attachment_element(attachment: &Attachment) -> XmlElement {
    XmlElement::new("Attachment")
        .text_child("AttachmentCompressionAlgorithm", "NONE")
        .text_child("AttachmentFormat", attachment.format())
        .text_child("AttachmentEncoding", "BASE64")
        .text_child("AttachmentDescription", attachment.description.as_str())
        .text_child("AttachmentData", STANDARD.encode(&attachment.data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_codes() {
        assert_eq!(normalize_bank_code("es91 2100-0418 4502 0005 1332"), "ES9121000418450200051332");
        assert_eq!(normalize_bic("caix es bb"), "CAIXESBBXXX");
        assert_eq!(normalize_bic("CAIXESBB666"), "CAIXESBB666");
    }
}
