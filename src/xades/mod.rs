//! XAdES-EPES enveloped signatures for FacturaE documents.
//!
//! A [`XadesSigner`] holds a [`SigningCredential`] (certificate, private key
//! and signature policy) and embeds a `ds:Signature` before the closing tag
//! of the document root. The cryptography sits behind [`CryptoProvider`];
//! [`RustCryptoProvider`] is the default.
//!
//! Digest and signature algorithms follow the document's schema version
//! (see [`SignatureProfile`]). Element IDs are random per signature.
//!
//! # Example
//!
//! ```no_run
//! use facturae::xades::{self, PrivateKeyHandle, SigningCredential, XadesSigner};
//! # let invoice: facturae::core::Invoice = todo!();
//!
//! let cert = std::fs::read_to_string("cert.pem").unwrap();
//! let key = PrivateKeyHandle::from_pem(std::fs::read_to_string("key.pem").unwrap());
//! let signer = XadesSigner::new(SigningCredential::from_pem(&cert, key).unwrap());
//!
//! let signed = xades::export(&invoice, Some(&signer)).unwrap();
//! ```

mod algorithm;
mod credential;
mod encoding;
mod ids;
mod profile;
mod provider;
mod signer;

pub use algorithm::{C14N, DigestAlgorithm, ENVELOPED_SIGNATURE, SIGNED_PROPERTIES_TYPE, SignatureAlgorithm};
pub use credential::{KeyEncoding, PrivateKeyHandle, SignaturePolicy, SigningCredential};
pub use encoding::{LINE_WIDTH, pem_body, prettify, to_base64};
pub use ids::{ID_RANGE, SignatureIds, ids_in_use};
pub use profile::SignatureProfile;
pub use provider::{CertificateInfo, CryptoProvider, RsaComponents, RustCryptoProvider};
pub use signer::{SignerOptions, SigningFailure, XadesSigner};

use crate::core::{FacturaeError, Invoice};

/// Render `invoice` and, with a signer, sign it.
///
/// Signing errors are returned, not downgraded to an unsigned export. Call
/// [`XadesSigner::sign`] directly to get the unsigned bytes back on failure.
pub fn export(invoice: &Invoice, signer: Option<&XadesSigner>) -> Result<Vec<u8>, FacturaeError> {
    let document = crate::document::to_facturae_xml(invoice)?.into_bytes();
    match signer {
        Some(signer) => signer.sign(document).map_err(|failure| failure.error),
        None => Ok(document),
    }
}
