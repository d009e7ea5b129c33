use chrono::NaiveDate;
use facturae::core::*;
use facturae::xades::{self, PrivateKeyHandle, SigningCredential, XadesSigner};
use rust_decimal_macros::dec;

fn main() {
    // Spanish company invoicing a private individual
    let invoice = InvoiceBuilder::new("FAC201804", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        .series("SERIE")
        .seller(
            PartyBuilder::legal_entity(
                "A00000000",
                "Perico de los Palotes S.A.",
                AddressBuilder::new("C/ Falsa, 123", "23456", "Madrid", "Madrid").build(),
            )
            .email("facturas@perico.es")
            .build(),
        )
        .buyer(
            PartyBuilder::individual(
                "00000000A",
                "Antonio",
                "García",
                "Pérez",
                AddressBuilder::new("Avda. Mayor, 7", "08001", "Barcelona", "Barcelona").build(),
            )
            .build(),
        )
        .add_item(
            LineItemBuilder::new("Lámpara de pie", dec!(20.14), dec!(3))
                .tax(TaxType::Iva, dec!(21))
                .build(),
        )
        .payment(PaymentDetails {
            method: PaymentMethod::Transfer,
            due_date: NaiveDate::from_ymd_opt(2024, 7, 15),
            iban: Some("ES91 2100 0418 4502 0005 1332".into()),
            bic: Some("CAIXESBB".into()),
        })
        .build()
        .expect("invoice should be valid");

    let totals = calculate_totals(&invoice).expect("totals");
    println!("Invoice: {}{}", invoice.series, invoice.number);
    println!("Seller:  {}", invoice.seller.name);
    println!("Buyer:   {}", invoice.buyer.name);
    println!("Gross:   {} {}", totals.gross_amount, invoice.currency_code);
    println!("Taxes:   {} {}", totals.total_taxes_outputs, invoice.currency_code);
    println!("Total:   {} {}", totals.invoice_total, invoice.currency_code);

    let credential = SigningCredential::from_pem(
        include_str!("../tests/fixtures/signer_cert.pem"),
        PrivateKeyHandle::from_pem(include_str!("../tests/fixtures/signer_key.pem")),
    )
    .expect("certificate should decode");
    let signer = XadesSigner::new(credential);

    match xades::export(&invoice, Some(&signer)) {
        Ok(bytes) => println!("---\n{}", String::from_utf8_lossy(&bytes)),
        Err(e) => eprintln!("Export failed: {e}"),
    }
}
