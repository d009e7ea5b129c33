#![cfg(feature = "xml")]

use chrono::NaiveDate;
use facturae::core::*;
use facturae::document::{facturae_element, to_facturae_xml};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn madrid() -> Address {
    AddressBuilder::new("C/ Falsa, 123", "23456", "Madrid", "Madrid").build()
}

fn seller() -> Party {
    PartyBuilder::legal_entity("A00000000", "Perico de los Palotes S.A.", madrid()).build()
}

fn buyer() -> Party {
    PartyBuilder::individual(
        "00000000A",
        "Antonio",
        "García",
        "Pérez",
        AddressBuilder::new("Avda. Mayor, 7", "08001", "Barcelona", "Barcelona").build(),
    )
    .build()
}

fn lamp() -> LineItem {
    LineItemBuilder::new("Lámpara de pie", dec!(20.14), dec!(3))
        .tax(TaxType::Iva, dec!(21))
        .build()
}

fn invoice_with(seller: Party, buyer: Party) -> Invoice {
    InvoiceBuilder::new("FAC201804", date(2024, 6, 15))
        .series("SERIE")
        .seller(seller)
        .buyer(buyer)
        .add_item(lamp())
        .build()
        .unwrap()
}

/// Text between the first `<tag>` and its closing tag.
fn text_of<'a>(xml: &'a str, tag: &str) -> &'a str {
    let open = format!("<{tag}>");
    let start = xml.find(&open).unwrap() + open.len();
    let end = start + xml[start..].find(&format!("</{tag}>")).unwrap();
    &xml[start..end]
}

#[test]
fn single_lamp_invoice() {
    let xml = to_facturae_xml(&invoice_with(seller(), buyer())).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<fe:Facturae "));
    assert_eq!(xml.matches("<InvoiceLine>").count(), 1);
    assert_eq!(text_of(&xml, "UnitPriceWithoutTax"), "20.14");
    assert_eq!(text_of(&xml, "TaxRate"), "21.00");
    assert_eq!(text_of(&xml, "ItemDescription"), "Lámpara de pie");
    assert_eq!(text_of(&xml, "Quantity"), "3.00");
    assert_eq!(text_of(&xml, "InvoiceTotal"), "73.11");
    assert_eq!(text_of(&xml, "SchemaVersion"), "3.2.1");
    assert_eq!(text_of(&xml, "BatchIdentifier"), "A00000000FAC201804SERIE");
}

#[test]
fn root_declares_schema_namespace() {
    let inv = InvoiceBuilder::new("1", date(2024, 1, 1))
        .schema_version(SchemaVersion::V3_2_2)
        .seller(seller())
        .buyer(buyer())
        .add_item(lamp())
        .build()
        .unwrap();
    let root = facturae_element(&inv).unwrap();
    assert_eq!(root.name(), "fe:Facturae");
    assert_eq!(
        root.get_attr("xmlns:fe"),
        Some(SchemaVersion::V3_2_2.namespace())
    );
    assert_eq!(root.get_attr("xmlns:ds"), Some(facturae::xml::ns::DS));
}

#[test]
fn legal_entity_and_individual_shapes() {
    let xml = to_facturae_xml(&invoice_with(seller(), buyer())).unwrap();
    let seller_xml = text_of(&xml, "SellerParty");
    let buyer_xml = text_of(&xml, "BuyerParty");

    assert!(seller_xml.contains("<PersonTypeCode>J</PersonTypeCode>"));
    assert!(seller_xml.contains("<CorporateName>Perico de los Palotes S.A.</CorporateName>"));
    assert!(!seller_xml.contains("<RegistrationData>"));

    assert!(buyer_xml.contains("<PersonTypeCode>F</PersonTypeCode>"));
    assert!(buyer_xml.contains(
        "<Individual><Name>Antonio</Name><FirstSurname>García</FirstSurname><SecondSurname>Pérez</SecondSurname>"
    ));
}

#[test]
fn registration_data_only_populated_fields() {
    let seller = PartyBuilder::legal_entity("A00000000", "Perico S.A.", madrid())
        .registration(RegistrationData {
            book: Some("0".into()),
            register_location: Some("Madrid".into()),
            sheet: Some("".into()),
            ..Default::default()
        })
        .build();
    let xml = to_facturae_xml(&invoice_with(seller, buyer())).unwrap();
    assert_eq!(
        text_of(&xml, "RegistrationData"),
        "<Book>0</Book><RegisterOfCompaniesLocation>Madrid</RegisterOfCompaniesLocation>"
    );
}

#[test]
fn overseas_address() {
    let buyer = PartyBuilder::legal_entity(
        "FR12345678901",
        "Lumière SARL",
        AddressBuilder::new("1 Rue de Rivoli", "75001", "Paris", "Paris")
            .country("FRA")
            .build(),
    )
    .build();
    let xml = to_facturae_xml(&invoice_with(seller(), buyer)).unwrap();
    let buyer_xml = text_of(&xml, "BuyerParty");
    assert!(buyer_xml.contains("<OverseasAddress>"));
    assert!(buyer_xml.contains("<PostCodeAndTown>75001 Paris</PostCodeAndTown>"));
    assert!(!buyer_xml.contains("<AddressInSpain>"));
    assert!(text_of(&xml, "SellerParty").contains("<AddressInSpain>"));
}

#[test]
fn centre_with_partial_address_uses_party_address() {
    let buyer = PartyBuilder::legal_entity("P0000000A", "Ayuntamiento", madrid())
        .add_centre(
            CentreBuilder::new("L01234567", CentreRole::AccountingOffice, "Oficina contable")
                .address(CentreAddress {
                    address: Some("Plaza Mayor, 1".into()),
                    ..Default::default()
                })
                .build(),
        )
        .add_centre(
            CentreBuilder::new("L07654321", CentreRole::ProcessingUnit, "Unidad tramitadora")
                .full_address(
                    AddressBuilder::new("C/ Tramite, 9", "28002", "Madrid", "Madrid").build(),
                )
                .build(),
        )
        .build();
    let xml = to_facturae_xml(&invoice_with(seller(), buyer)).unwrap();
    let centres = text_of(&xml, "AdministrativeCentres");

    assert_eq!(centres.matches("<AdministrativeCentre>").count(), 2);
    let (first, second) = centres.split_at(centres.find("L07654321").unwrap());
    assert!(first.contains("<RoleTypeCode>01</RoleTypeCode>"));
    assert!(first.contains("<Address>C/ Falsa, 123</Address>"));
    assert!(!first.contains("Plaza Mayor"));
    assert!(second.contains("<Address>C/ Tramite, 9</Address>"));
}

#[test]
fn contact_details_omitted_when_empty() {
    let xml = to_facturae_xml(&invoice_with(seller(), buyer())).unwrap();
    assert!(!xml.contains("<ContactDetails>"));

    let seller = PartyBuilder::legal_entity("A00000000", "Perico S.A.", madrid())
        .email("facturas@perico.es")
        .phone("910000000")
        .build();
    let xml = to_facturae_xml(&invoice_with(seller, buyer())).unwrap();
    assert_eq!(
        text_of(&xml, "ContactDetails"),
        "<Telephone>910000000</Telephone><ElectronicMail>facturas@perico.es</ElectronicMail>"
    );
}

#[test]
fn text_is_escaped() {
    let seller = PartyBuilder::legal_entity("A00000000", "Smith & Sons <Ibérica>", madrid()).build();
    let xml = to_facturae_xml(&invoice_with(seller, buyer())).unwrap();
    assert!(xml.contains("<CorporateName>Smith &amp; Sons &lt;Ibérica&gt;</CorporateName>"));
}

#[test]
fn invalid_invoice_produces_no_xml() {
    let inv = InvoiceBuilder::new("FAC1", date(2024, 6, 15))
        .seller(seller())
        .buyer(
            PartyBuilder::legal_entity("", "Sin NIF", madrid()).build(),
        )
        .add_item(lamp())
        .build_unchecked()
        .unwrap();
    let err = to_facturae_xml(&inv).unwrap_err();
    assert!(
        err.validation_errors()
            .iter()
            .any(|e| e.field == "buyer.tax_number")
    );
}

#[test]
fn schema_3_2_uses_six_digit_prices() {
    let inv = InvoiceBuilder::new("FAC1", date(2024, 6, 15))
        .schema_version(SchemaVersion::V3_2)
        .seller(seller())
        .buyer(buyer())
        .add_item(lamp())
        .build()
        .unwrap();
    let xml = to_facturae_xml(&inv).unwrap();
    assert_eq!(text_of(&xml, "UnitPriceWithoutTax"), "20.140000");
    assert_eq!(text_of(&xml, "TotalCost"), "60.420000");
    assert_eq!(text_of(&xml, "SchemaVersion"), "3.2");
}

#[test]
fn withheld_and_payment_blocks() {
    let inv = InvoiceBuilder::new("FAC2", date(2024, 6, 15))
        .seller(seller())
        .buyer(buyer())
        .add_item(
            LineItemBuilder::new("Consultoría", dec!(1000), dec!(1))
                .unit(UnitOfMeasure::Hours)
                .tax(TaxType::Iva, dec!(21))
                .tax(TaxType::Irpf, dec!(15))
                .build(),
        )
        .payment(PaymentDetails {
            method: PaymentMethod::Transfer,
            due_date: Some(date(2024, 7, 15)),
            iban: Some("ES91 2100 0418 4502 0005 1332".into()),
            bic: Some("CAIXESBB".into()),
        })
        .legal_literal("Art. 20 LIVA")
        .build()
        .unwrap();
    let xml = to_facturae_xml(&inv).unwrap();

    assert_eq!(text_of(&xml, "TotalTaxesWithheld"), "150.00");
    assert_eq!(text_of(&xml, "InvoiceTotal"), "1060.00");
    assert_eq!(text_of(&xml, "UnitOfMeasure"), "02");
    assert_eq!(text_of(&xml, "InstallmentDueDate"), "2024-07-15");
    assert_eq!(text_of(&xml, "PaymentMeans"), "04");
    assert!(xml.contains(
        "<AccountToBeCredited><IBAN>ES9121000418450200051332</IBAN><BIC>CAIXESBBXXX</BIC></AccountToBeCredited>"
    ));
    assert_eq!(text_of(&xml, "LegalReference"), "Art. 20 LIVA");
}

#[test]
fn rendering_is_deterministic() {
    let inv = invoice_with(seller(), buyer());
    assert_eq!(to_facturae_xml(&inv).unwrap(), to_facturae_xml(&inv).unwrap());
}

#[test]
fn overflowing_amounts_fail_without_xml() {
    let inv = InvoiceBuilder::new("FAC3", date(2024, 6, 15))
        .seller(seller())
        .buyer(buyer())
        .add_item(
            LineItemBuilder::new("Turbina", dec!(100000000000000), dec!(100000000000000000))
                .tax(TaxType::Iva, dec!(21))
                .build(),
        )
        .build()
        .unwrap();
    assert!(matches!(
        to_facturae_xml(&inv),
        Err(FacturaeError::Formatting { .. })
    ));
}

#[test]
fn factoring_assignment_in_file_header() {
    let factor = PartyBuilder::legal_entity(
        "B11111111",
        "Factoring Ibérico S.L.",
        AddressBuilder::new("Paseo de Gracia, 10", "08007", "Barcelona", "Barcelona").build(),
    )
    .build();
    let inv = InvoiceBuilder::new("FAC4", date(2024, 6, 15))
        .seller(seller())
        .buyer(buyer())
        .add_item(lamp())
        .payment(PaymentDetails {
            method: PaymentMethod::Transfer,
            due_date: None,
            iban: Some("ES9121000418450200051332".into()),
            bic: None,
        })
        .assignee(factor)
        .assignment_clauses("Cesión de crédito irrevocable")
        .build()
        .unwrap();
    let xml = to_facturae_xml(&inv).unwrap();
    let header = text_of(&xml, "FileHeader");

    let factoring = text_of(header, "FactoringAssignmentData");
    assert!(header.find("</Batch>").unwrap() < header.find("<FactoringAssignmentData>").unwrap());
    assert!(factoring.starts_with("<Assignee><TaxIdentification>"));
    assert!(text_of(factoring, "Assignee").contains("<CorporateName>Factoring Ibérico S.L.</CorporateName>"));
    assert_eq!(text_of(factoring, "InstallmentDueDate"), "2024-06-15");
    assert!(factoring.ends_with(
        "</PaymentDetails><FactoringAssignmentClauses>Cesión de crédito irrevocable</FactoringAssignmentClauses>"
    ));
    // payment details are still emitted in the invoice body
    assert_eq!(xml.matches("<PaymentDetails>").count(), 2);
}

#[test]
fn no_factoring_block_without_assignee() {
    let inv = InvoiceBuilder::new("FAC5", date(2024, 6, 15))
        .seller(seller())
        .buyer(buyer())
        .add_item(lamp())
        .assignment_clauses("ignored without an assignee")
        .build()
        .unwrap();
    let xml = to_facturae_xml(&inv).unwrap();
    assert!(!xml.contains("FactoringAssignment"));
}

#[test]
fn line_references_precede_description() {
    let item = LineItemBuilder::new("Lámpara de pie", dec!(20.14), dec!(3))
        .tax(TaxType::Iva, dec!(21))
        .issuer_contract("CT-2024-7", Some(date(2024, 1, 10)))
        .receiver_transaction("PED-981", None)
        .file_reference("EXP-33", Some(date(2024, 5, 2)))
        .sequence_number("1")
        .build();
    let inv = InvoiceBuilder::new("FAC6", date(2024, 6, 15))
        .seller(seller())
        .buyer(buyer())
        .add_item(item)
        .build()
        .unwrap();
    let xml = to_facturae_xml(&inv).unwrap();
    let line = text_of(&xml, "InvoiceLine");
    assert!(line.starts_with(
        "<IssuerContractReference>CT-2024-7</IssuerContractReference>\
         <IssuerContractDate>2024-01-10</IssuerContractDate>\
         <ReceiverTransactionReference>PED-981</ReceiverTransactionReference>\
         <FileReference>EXP-33</FileReference>\
         <FileDate>2024-05-02</FileDate>\
         <SequenceNumber>1</SequenceNumber>\
         <ItemDescription>"
    ));
}

#[test]
fn attachments_embedded_as_base64() {
    let inv = InvoiceBuilder::new("FAC7", date(2024, 6, 15))
        .seller(seller())
        .buyer(buyer())
        .add_item(lamp())
        .related_invoice("FAC6")
        .additional_information("Ver albarán adjunto")
        .add_attachment(Attachment::new("Albarán & firma", "application/pdf", b"%PDF-".to_vec()))
        .build()
        .unwrap();
    let xml = to_facturae_xml(&inv).unwrap();
    assert_eq!(
        text_of(&xml, "AdditionalData"),
        "<RelatedInvoice>FAC6</RelatedInvoice>\
         <RelatedDocuments><Attachment>\
         <AttachmentCompressionAlgorithm>NONE</AttachmentCompressionAlgorithm>\
         <AttachmentFormat>pdf</AttachmentFormat>\
         <AttachmentEncoding>BASE64</AttachmentEncoding>\
         <AttachmentDescription>Albarán &amp; firma</AttachmentDescription>\
         <AttachmentData>JVBERi0=</AttachmentData>\
         </Attachment></RelatedDocuments>\
         <InvoiceAdditionalInformation>Ver albarán adjunto</InvoiceAdditionalInformation>"
    );
}
