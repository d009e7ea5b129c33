use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::FacturaeError;
use super::types::*;
use super::validation;

/// Builder for constructing valid invoices.
///
/// ```
/// use facturae::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let address = AddressBuilder::new("Calle Falsa 123", "28001", "Madrid", "Madrid").build();
/// let invoice = InvoiceBuilder::new("0001", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
///     .series("FAC")
///     .seller(PartyBuilder::legal_entity("A00000000", "Perico de los Palotes S.A.", address.clone()).build())
///     .buyer(PartyBuilder::individual("00000000A", "Antonio", "García", "Pérez", address).build())
///     .add_item(LineItemBuilder::new("Lámpara de pie", dec!(20.14), dec!(3))
///         .tax(TaxType::Iva, dec!(21))
///         .build())
///     .build()
///     .unwrap();
/// assert_eq!(invoice.items.len(), 1);
/// ```
pub struct InvoiceBuilder {
    number: String,
    series: String,
    issue_date: NaiveDate,
    schema_version: SchemaVersion,
    seller: Option<Party>,
    buyer: Option<Party>,
    items: Vec<LineItem>,
    billing_period: Option<Period>,
    currency_code: String,
    language: String,
    description: Option<String>,
    file_reference: Option<String>,
    receiver_transaction_reference: Option<String>,
    receiver_contract_reference: Option<String>,
    discounts: Vec<DiscountOrCharge>,
    charges: Vec<DiscountOrCharge>,
    payment: Option<PaymentDetails>,
    legal_literals: Vec<String>,
    related_invoice: Option<String>,
    additional_information: Option<String>,
    assignee: Option<Party>,
    assignment_clauses: Option<String>,
    attachments: Vec<Attachment>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            number: number.into(),
            series: String::new(),
            issue_date,
            schema_version: SchemaVersion::default(),
            seller: None,
            buyer: None,
            items: Vec::new(),
            billing_period: None,
            currency_code: "EUR".to_string(),
            language: "es".to_string(),
            description: None,
            file_reference: None,
            receiver_transaction_reference: None,
            receiver_contract_reference: None,
            discounts: Vec::new(),
            charges: Vec::new(),
            payment: None,
            legal_literals: Vec::new(),
            related_invoice: None,
            additional_information: None,
            assignee: None,
            assignment_clauses: None,
            attachments: Vec::new(),
        }
    }

    pub fn series(mut self, series: impl Into<String>) -> Self {
        self.series = series.into();
        self
    }

    pub fn schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }

    pub fn seller(mut self, party: Party) -> Self {
        self.seller = Some(party);
        self
    }

    pub fn buyer(mut self, party: Party) -> Self {
        self.buyer = Some(party);
        self
    }

    pub fn add_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn billing_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.billing_period = Some(Period { start, end });
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = code.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn file_reference(mut self, reference: impl Into<String>) -> Self {
        self.file_reference = Some(reference.into());
        self
    }

    pub fn receiver_transaction_reference(mut self, reference: impl Into<String>) -> Self {
        self.receiver_transaction_reference = Some(reference.into());
        self
    }

    pub fn receiver_contract_reference(mut self, reference: impl Into<String>) -> Self {
        self.receiver_contract_reference = Some(reference.into());
        self
    }

    pub fn add_discount(mut self, reason: impl Into<String>, value: DiscountValue) -> Self {
        self.discounts.push(DiscountOrCharge {
            reason: reason.into(),
            value,
        });
        self
    }

    pub fn add_charge(mut self, reason: impl Into<String>, value: DiscountValue) -> Self {
        self.charges.push(DiscountOrCharge {
            reason: reason.into(),
            value,
        });
        self
    }

    pub fn payment(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn legal_literal(mut self, literal: impl Into<String>) -> Self {
        self.legal_literals.push(literal.into());
        self
    }

    pub fn related_invoice(mut self, number: impl Into<String>) -> Self {
        self.related_invoice = Some(number.into());
        self
    }

    pub fn additional_information(mut self, info: impl Into<String>) -> Self {
        self.additional_information = Some(info.into());
        self
    }

    /// Assign the invoice to a factoring company.
    pub fn assignee(mut self, party: Party) -> Self {
        self.assignee = Some(party);
        self
    }

    pub fn assignment_clauses(mut self, clauses: impl Into<String>) -> Self {
        self.assignment_clauses = Some(clauses.into());
        self
    }

    pub fn add_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Build the invoice and run validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Invoice, FacturaeError> {
        let invoice = self.build_unchecked()?;
        let errors = validation::validate_invoice(&invoice);
        if !errors.is_empty() {
            return Err(FacturaeError::Validation(errors));
        }
        Ok(invoice)
    }

    /// Build without validation, for tests or data imported from elsewhere.
    pub fn build_unchecked(self) -> Result<Invoice, FacturaeError> {
        let seller = self
            .seller
            .ok_or_else(|| FacturaeError::Builder("seller is required".into()))?;
        let buyer = self
            .buyer
            .ok_or_else(|| FacturaeError::Builder("buyer is required".into()))?;

        if self.items.len() > 10_000 {
            return Err(FacturaeError::Builder(
                "invoice cannot have more than 10,000 line items".into(),
            ));
        }

        Ok(Invoice {
            number: self.number,
            series: self.series,
            issue_date: self.issue_date,
            schema_version: self.schema_version,
            seller,
            buyer,
            items: self.items,
            billing_period: self.billing_period,
            currency_code: self.currency_code,
            language: self.language,
            description: self.description,
            file_reference: self.file_reference,
            receiver_transaction_reference: self.receiver_transaction_reference,
            receiver_contract_reference: self.receiver_contract_reference,
            discounts: self.discounts,
            charges: self.charges,
            payment: self.payment,
            legal_literals: self.legal_literals,
            related_invoice: self.related_invoice,
            additional_information: self.additional_information,
            assignee: self.assignee,
            assignment_clauses: self.assignment_clauses,
            attachments: self.attachments,
        })
    }
}

/// Builder for seller and buyer parties.
pub struct PartyBuilder {
    identity: PartyIdentity,
    tax_number: String,
    name: String,
    address: Address,
    contact: ContactDetails,
    centres: Vec<AdministrativeCentre>,
}

impl PartyBuilder {
    /// A company (`PersonTypeCode` J).
    pub fn legal_entity(
        tax_number: impl Into<String>,
        corporate_name: impl Into<String>,
        address: Address,
    ) -> Self {
        Self::with_identity(
            PartyIdentity::LegalEntity {
                registration: RegistrationData::default(),
            },
            tax_number.into(),
            corporate_name.into(),
            address,
        )
    }

    /// A natural person (`PersonTypeCode` F).
    pub fn individual(
        tax_number: impl Into<String>,
        name: impl Into<String>,
        first_surname: impl Into<String>,
        last_surname: impl Into<String>,
        address: Address,
    ) -> Self {
        Self::with_identity(
            PartyIdentity::Individual {
                first_surname: first_surname.into(),
                last_surname: last_surname.into(),
            },
            tax_number.into(),
            name.into(),
            address,
        )
    }

    fn with_identity(
        identity: PartyIdentity,
        tax_number: String,
        name: String,
        address: Address,
    ) -> Self {
        Self {
            identity,
            tax_number,
            name,
            address,
            contact: ContactDetails::default(),
            centres: Vec::new(),
        }
    }

    /// Mercantile registry data. Ignored for individuals.
    pub fn registration(mut self, data: RegistrationData) -> Self {
        if let PartyIdentity::LegalEntity { registration } = &mut self.identity {
            *registration = data;
        }
        self
    }

    pub fn contact(mut self, contact: ContactDetails) -> Self {
        self.contact = contact;
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.contact.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.contact.phone = Some(phone.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.contact.website = Some(website.into());
        self
    }

    pub fn add_centre(mut self, centre: AdministrativeCentre) -> Self {
        self.centres.push(centre);
        self
    }

    pub fn build(self) -> Party {
        Party {
            identity: self.identity,
            tax_number: self.tax_number,
            name: self.name,
            address: self.address,
            contact: self.contact,
            centres: self.centres,
        }
    }
}

/// Builder for postal addresses. Country defaults to Spain (`ESP`).
pub struct AddressBuilder {
    address: String,
    post_code: String,
    town: String,
    province: String,
    country_code: String,
}

impl AddressBuilder {
    pub fn new(
        address: impl Into<String>,
        post_code: impl Into<String>,
        town: impl Into<String>,
        province: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            post_code: post_code.into(),
            town: town.into(),
            province: province.into(),
            country_code: Address::SPAIN.to_string(),
        }
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    pub fn build(self) -> Address {
        Address {
            address: self.address,
            post_code: self.post_code,
            town: self.town,
            province: self.province,
            country_code: self.country_code,
        }
    }
}

/// Builder for administrative centres.
pub struct CentreBuilder {
    centre: AdministrativeCentre,
}

impl CentreBuilder {
    pub fn new(code: impl Into<String>, role: CentreRole, name: impl Into<String>) -> Self {
        Self {
            centre: AdministrativeCentre {
                code: code.into(),
                role,
                name: name.into(),
                first_surname: None,
                last_surname: None,
                address: CentreAddress::default(),
                description: None,
            },
        }
    }

    pub fn surnames(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.centre.first_surname = Some(first.into());
        self.centre.last_surname = Some(last.into());
        self
    }

    /// Partial or complete centre address. Any missing field makes the
    /// centre fall back to its party's address as a whole.
    pub fn address(mut self, address: CentreAddress) -> Self {
        self.centre.address = address;
        self
    }

    pub fn full_address(self, address: Address) -> Self {
        self.address(CentreAddress {
            address: Some(address.address),
            post_code: Some(address.post_code),
            town: Some(address.town),
            province: Some(address.province),
            country_code: Some(address.country_code),
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.centre.description = Some(description.into());
        self
    }

    pub fn build(self) -> AdministrativeCentre {
        self.centre
    }
}

/// Builder for invoice lines.
pub struct LineItemBuilder {
    item: LineItem,
}

impl LineItemBuilder {
    pub fn new(description: impl Into<String>, unit_price: Decimal, quantity: Decimal) -> Self {
        Self {
            item: LineItem {
                description: description.into(),
                unit_price_without_tax: unit_price,
                quantity,
                unit: UnitOfMeasure::default(),
                taxes: Vec::new(),
                discounts: Vec::new(),
                charges: Vec::new(),
                additional_information: None,
                article_code: None,
                references: LineReferences::default(),
            },
        }
    }

    /// Add a tax. IRPF is recorded as withheld, everything else as output.
    pub fn tax(self, tax_type: TaxType, rate: Decimal) -> Self {
        let withheld = tax_type.is_withholding();
        self.push_tax(tax_type, rate, Decimal::ZERO, withheld)
    }

    /// Add an output tax with an equivalence surcharge.
    pub fn tax_with_surcharge(self, tax_type: TaxType, rate: Decimal, surcharge: Decimal) -> Self {
        self.push_tax(tax_type, rate, surcharge, false)
    }

    /// Add a tax withheld by the buyer regardless of its type.
    pub fn withheld_tax(self, tax_type: TaxType, rate: Decimal) -> Self {
        self.push_tax(tax_type, rate, Decimal::ZERO, true)
    }

    fn push_tax(mut self, tax_type: TaxType, rate: Decimal, surcharge: Decimal, withheld: bool) -> Self {
        self.item.taxes.push(ItemTax {
            tax_type,
            rate,
            surcharge,
            withheld,
        });
        self
    }

    pub fn unit(mut self, unit: UnitOfMeasure) -> Self {
        self.item.unit = unit;
        self
    }

    pub fn discount(mut self, reason: impl Into<String>, value: DiscountValue) -> Self {
        self.item.discounts.push(DiscountOrCharge {
            reason: reason.into(),
            value,
        });
        self
    }

    pub fn charge(mut self, reason: impl Into<String>, value: DiscountValue) -> Self {
        self.item.charges.push(DiscountOrCharge {
            reason: reason.into(),
            value,
        });
        self
    }

    pub fn article_code(mut self, code: impl Into<String>) -> Self {
        self.item.article_code = Some(code.into());
        self
    }

    pub fn additional_information(mut self, info: impl Into<String>) -> Self {
        self.item.additional_information = Some(info.into());
        self
    }

    pub fn references(mut self, references: LineReferences) -> Self {
        self.item.references = references;
        self
    }

    pub fn issuer_contract(mut self, reference: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.item.references.issuer_contract_reference = Some(reference.into());
        self.item.references.issuer_contract_date = date;
        self
    }

    pub fn receiver_transaction(mut self, reference: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.item.references.receiver_transaction_reference = Some(reference.into());
        self.item.references.receiver_transaction_date = date;
        self
    }

    pub fn file_reference(mut self, reference: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.item.references.file_reference = Some(reference.into());
        self.item.references.file_date = date;
        self
    }

    pub fn sequence_number(mut self, number: impl Into<String>) -> Self {
        self.item.references.sequence_number = Some(number.into());
        self
    }

    pub fn build(self) -> LineItem {
        self.item
    }
}
