use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// FacturaE schema versions supported for output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// 3.2 (2009).
    #[serde(rename = "3.2")]
    V3_2,
    /// 3.2.1 (2014), the version accepted by FACe.
    #[default]
    #[serde(rename = "3.2.1")]
    V3_2_1,
    /// 3.2.2.
    #[serde(rename = "3.2.2")]
    V3_2_2,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [Self::V3_2, Self::V3_2_1, Self::V3_2_2];

    /// Value of the `SchemaVersion` header element.
    pub fn code(&self) -> &'static str {
        match self {
            Self::V3_2 => "3.2",
            Self::V3_2_1 => "3.2.1",
            Self::V3_2_2 => "3.2.2",
        }
    }

    /// Root namespace URI bound to the `fe` prefix.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::V3_2 => "http://www.facturae.es/Facturae/2009/v3.2/Facturae",
            Self::V3_2_1 => "http://www.facturae.es/Facturae/2014/v3.2.1/Facturae",
            Self::V3_2_2 => "http://www.facturae.gob.es/formato/Versiones/Facturaev3_2_2.xml",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.code() == code)
    }

    /// Detect the schema version from a root namespace URI.
    pub fn from_namespace(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.namespace() == uri)
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// An invoice: header data, both parties and the ordered line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice number within its series.
    pub number: String,
    /// Series code (may be empty).
    pub series: String,
    pub issue_date: NaiveDate,
    pub schema_version: SchemaVersion,
    pub seller: Party,
    pub buyer: Party,
    pub items: Vec<LineItem>,
    /// Billing period covered by the invoice.
    pub billing_period: Option<Period>,
    /// ISO 4217 code used for both invoice and tax currency.
    pub currency_code: String,
    /// ISO 639-1 language code.
    pub language: String,
    pub description: Option<String>,
    pub file_reference: Option<String>,
    pub receiver_transaction_reference: Option<String>,
    pub receiver_contract_reference: Option<String>,
    /// Document-level discounts applied to the gross amount.
    pub discounts: Vec<DiscountOrCharge>,
    /// Document-level charges applied to the gross amount.
    pub charges: Vec<DiscountOrCharge>,
    pub payment: Option<PaymentDetails>,
    /// Free-text legal references (e.g. exemption articles).
    pub legal_literals: Vec<String>,
    pub related_invoice: Option<String>,
    pub additional_information: Option<String>,
    /// Factoring company the invoice has been assigned to.
    pub assignee: Option<Party>,
    pub assignment_clauses: Option<String>,
    /// Documents embedded under `RelatedDocuments`.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Seller or buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub identity: PartyIdentity,
    /// NIF / CIF or foreign tax identifier.
    pub tax_number: String,
    /// Corporate name for legal entities, given name for individuals.
    pub name: String,
    pub address: Address,
    pub contact: ContactDetails,
    /// Administrative centres (DIR3 codes for public administrations).
    pub centres: Vec<AdministrativeCentre>,
}

impl Party {
    pub fn is_legal_entity(&self) -> bool {
        matches!(self.identity, PartyIdentity::LegalEntity { .. })
    }

    /// `J` for legal entities, `F` for individuals.
    pub fn person_type_code(&self) -> &'static str {
        if self.is_legal_entity() { "J" } else { "F" }
    }
}

/// Either a company (with optional mercantile registration) or a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyIdentity {
    LegalEntity {
        registration: RegistrationData,
    },
    Individual {
        first_surname: String,
        last_surname: String,
    },
}

/// Mercantile registry entry of a legal entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationData {
    /// Libro.
    pub book: Option<String>,
    /// Registro mercantil.
    pub register_location: Option<String>,
    /// Hoja.
    pub sheet: Option<String>,
    pub folio: Option<String>,
    /// Sección.
    pub section: Option<String>,
    /// Tomo.
    pub volume: Option<String>,
}

impl RegistrationData {
    /// Populated fields paired with their element names, in schema order.
    pub fn populated(&self) -> Vec<(&'static str, &str)> {
        [
            ("Book", &self.book),
            ("RegisterOfCompaniesLocation", &self.register_location),
            ("Sheet", &self.sheet),
            ("Folio", &self.folio),
            ("Section", &self.section),
            ("Volume", &self.volume),
        ]
        .into_iter()
        .filter_map(|(tag, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (tag, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated().is_empty()
    }
}

/// Postal address. A country code of `ESP` selects the Spanish address shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub post_code: String,
    pub town: String,
    pub province: String,
    /// ISO 3166-1 alpha-3 country code.
    pub country_code: String,
}

impl Address {
    pub const SPAIN: &'static str = "ESP";

    pub fn is_in_spain(&self) -> bool {
        self.country_code == Self::SPAIN
    }
}

/// Address of an administrative centre. Used only when every field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentreAddress {
    pub address: Option<String>,
    pub post_code: Option<String>,
    pub town: Option<String>,
    pub province: Option<String>,
    pub country_code: Option<String>,
}

impl CentreAddress {
    /// The complete address, or `None` when any single field is missing.
    pub fn complete(&self) -> Option<Address> {
        fn field(v: &Option<String>) -> Option<String> {
            v.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
        }
        Some(Address {
            address: field(&self.address)?,
            post_code: field(&self.post_code)?,
            town: field(&self.town)?,
            province: field(&self.province)?,
            country_code: field(&self.country_code)?,
        })
    }
}

/// Contact block. Omitted from the document when every field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub contact_people: Option<String>,
    /// CNAE activity code.
    pub industry_code: Option<String>,
    /// INE municipality code.
    pub town_code: Option<String>,
}

impl ContactDetails {
    /// Populated fields paired with their element names, in schema order.
    pub fn populated(&self) -> Vec<(&'static str, &str)> {
        [
            ("Telephone", &self.phone),
            ("TeleFax", &self.fax),
            ("WebAddress", &self.website),
            ("ElectronicMail", &self.email),
            ("ContactPersons", &self.contact_people),
            ("CnoCnae", &self.industry_code),
            ("INETownCode", &self.town_code),
        ]
        .into_iter()
        .filter_map(|(tag, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (tag, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated().is_empty()
    }
}

/// Office or department of a party with its own routing code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrativeCentre {
    pub code: String,
    pub role: CentreRole,
    pub name: String,
    pub first_surname: Option<String>,
    pub last_surname: Option<String>,
    pub address: CentreAddress,
    pub description: Option<String>,
}

/// FACe role type codes for administrative centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentreRole {
    /// 01: Oficina contable.
    AccountingOffice,
    /// 02: Órgano gestor.
    ManagingBody,
    /// 03: Unidad tramitadora.
    ProcessingUnit,
    /// 04: Órgano proponente.
    ProposingBody,
}

impl CentreRole {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountingOffice => "01",
            Self::ManagingBody => "02",
            Self::ProcessingUnit => "03",
            Self::ProposingBody => "04",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::AccountingOffice),
            "02" => Some(Self::ManagingBody),
            "03" => Some(Self::ProcessingUnit),
            "04" => Some(Self::ProposingBody),
            _ => None,
        }
    }
}

/// Invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub unit_price_without_tax: Decimal,
    pub quantity: Decimal,
    pub unit: UnitOfMeasure,
    /// Taxes applied to the line. The first entry is the primary tax.
    pub taxes: Vec<ItemTax>,
    pub discounts: Vec<DiscountOrCharge>,
    pub charges: Vec<DiscountOrCharge>,
    pub additional_information: Option<String>,
    pub article_code: Option<String>,
    #[serde(default)]
    pub references: LineReferences,
}

/// Optional contract, transaction and file references of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReferences {
    pub issuer_contract_reference: Option<String>,
    pub issuer_contract_date: Option<NaiveDate>,
    pub issuer_transaction_reference: Option<String>,
    pub issuer_transaction_date: Option<NaiveDate>,
    pub receiver_contract_reference: Option<String>,
    pub receiver_contract_date: Option<NaiveDate>,
    pub receiver_transaction_reference: Option<String>,
    pub receiver_transaction_date: Option<NaiveDate>,
    pub file_reference: Option<String>,
    pub file_date: Option<NaiveDate>,
    pub sequence_number: Option<String>,
}

/// One tax applied to a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTax {
    pub tax_type: TaxType,
    /// Percentage, e.g. `21` for 21 %.
    pub rate: Decimal,
    /// Equivalence surcharge percentage (recargo de equivalencia).
    pub surcharge: Decimal,
    /// Withheld taxes (e.g. IRPF) are subtracted from the invoice total.
    pub withheld: bool,
}

/// A discount or charge, either as a percentage or a fixed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountOrCharge {
    pub reason: String,
    pub value: DiscountValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DiscountValue {
    /// Percentage of the base amount.
    Rate(Decimal),
    /// Fixed amount.
    Amount(Decimal),
}

/// Payment instructions for the single installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    /// Defaults to the issue date when absent.
    pub due_date: Option<NaiveDate>,
    pub iban: Option<String>,
    pub bic: Option<String>,
}

/// A document embedded in the invoice, e.g. the signed delivery note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub description: String,
    /// Full MIME type such as `application/pdf`.
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        description: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            description: description.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Subtype of the MIME type (`pdf` for `application/pdf`).
    pub fn format(&self) -> &str {
        self.mime_type.rsplit('/').next().unwrap_or(&self.mime_type)
    }
}

/// Billing period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Two-digit FacturaE code.
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

coded_enum! {
    /// FacturaE tax type codes.
    TaxType {
        /// Impuesto sobre el Valor Añadido.
        Iva => "01",
        /// Impuesto sobre la Producción, los Servicios y la Importación (Ceuta y Melilla).
        Ipsi => "02",
        /// Impuesto General Indirecto Canario.
        Igic => "03",
        /// Impuesto sobre la Renta de las Personas Físicas.
        Irpf => "04",
        Other => "05",
        Itpajd => "06",
        Ie => "07",
        Ra => "08",
        Igtecm => "09",
        Iecdpcac => "10",
        Iiimab => "11",
        Icio => "12",
        Imvdn => "13",
        Imsn => "14",
        Imgsn => "15",
        Impn => "16",
        /// Régimen especial de IVA.
        Reiva => "17",
        Reigic => "18",
        Reipsi => "19",
        Ips => "20",
        Rlea => "21",
        Ivpee => "22",
        Ipcng => "23",
        Iacng => "24",
        Idec => "25",
        Iltcac => "26",
        Igfei => "27",
        Irnr => "28",
        Iss => "29",
    }
}

coded_enum! {
    /// FacturaE units of measure.
    UnitOfMeasure {
        Units => "01",
        Hours => "02",
        Kilograms => "03",
        Liters => "04",
        Other => "05",
        Boxes => "06",
        Trays => "07",
        Barrels => "08",
        Jerricans => "09",
        Bags => "10",
        Carboys => "11",
        Bottles => "12",
        Canisters => "13",
        Tetrabriks => "14",
        Centiliters => "15",
        Centimeters => "16",
        Bins => "17",
        Dozens => "18",
        Cases => "19",
        Demijohns => "20",
        Grams => "21",
        Kilometers => "22",
        Cans => "23",
        Bunches => "24",
        Meters => "25",
        Millimeters => "26",
        SixPacks => "27",
        Packages => "28",
        Portions => "29",
        Rolls => "30",
        Envelopes => "31",
        Tubs => "32",
        CubicMeters => "33",
        Seconds => "34",
        Watts => "35",
        KilowattHours => "36",
    }
}

coded_enum! {
    /// FacturaE payment means.
    PaymentMethod {
        Cash => "01",
        /// Recibo domiciliado. The IBAN is the account to be debited.
        DirectDebit => "02",
        Receipt => "03",
        /// Transferencia. The IBAN is the account to be credited.
        Transfer => "04",
        AcceptedBillOfExchange => "05",
        DocumentaryCredit => "06",
        ContractAward => "07",
        BillOfExchange => "08",
        TransferableIou => "09",
        Iou => "10",
        Cheque => "11",
        Reimbursement => "12",
        Special => "13",
        Setoff => "14",
        Postgiro => "15",
        CertifiedCheque => "16",
        BankersDraft => "17",
        CashOnDelivery => "18",
        Card => "19",
    }
}

impl Default for UnitOfMeasure {
    fn default() -> Self {
        Self::Units
    }
}

impl TaxType {
    /// Taxes that are withheld by the buyer rather than charged by the seller.
    pub fn is_withholding(&self) -> bool {
        matches!(self, Self::Irpf)
    }
}
