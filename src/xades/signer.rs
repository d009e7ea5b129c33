//! Enveloped XAdES-EPES signing of a serialized FacturaE document.
//!
//! Signing runs as a fixed sequence of stages, each consuming the previous
//! one: [`Unsigned`] → [`ReferencesComputed`] → [`SignedInfoAssembled`] →
//! [`Signed`] → embedded bytes. A failure at any stage abandons the whole
//! run and hands the caller back the untouched input.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use thiserror::Error;

use super::algorithm::{C14N, ENVELOPED_SIGNATURE, SIGNED_PROPERTIES_TYPE};
use super::credential::SigningCredential;
use super::encoding::to_base64;
use super::ids::SignatureIds;
use super::profile::SignatureProfile;
use super::provider::{CertificateInfo, CryptoProvider, RustCryptoProvider};
use crate::core::{FacturaeError, SchemaVersion, SigningStage};
use crate::xml::{RootTag, XmlElement, inject_namespaces, ns};

/// A failed signing call. Carries the document exactly as it was passed in.
#[derive(Debug, Error)]
#[error("signing failed: {error}")]
pub struct SigningFailure {
    #[source]
    pub error: FacturaeError,
    pub document: Vec<u8>,
}

impl SigningFailure {
    pub fn into_parts(self) -> (FacturaeError, Vec<u8>) {
        (self.error, self.document)
    }
}

/// Per-signer settings.
#[derive(Debug, Clone)]
pub struct SignerOptions {
    /// Overrides the profile selected from the document's schema version.
    pub profile: Option<SignatureProfile>,
    /// Fixed signing time. Defaults to the current local time.
    pub signing_time: Option<DateTime<FixedOffset>>,
    pub claimed_role: String,
    /// Wrap certificate, signature value and modulus at 76 columns.
    pub pretty_base64: bool,
    pub data_object_description: String,
}

impl Default for SignerOptions {
    fn default() -> Self {
        Self {
            profile: None,
            signing_time: None,
            claimed_role: "emisor".to_string(),
            pretty_base64: true,
            data_object_description: "Factura electrónica".to_string(),
        }
    }
}

impl SignerOptions {
    pub fn profile(mut self, profile: SignatureProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn signing_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.signing_time = Some(time);
        self
    }

    pub fn claimed_role(mut self, role: impl Into<String>) -> Self {
        self.claimed_role = role.into();
        self
    }

    pub fn pretty_base64(mut self, pretty: bool) -> Self {
        self.pretty_base64 = pretty;
        self
    }

    /// Text of `DataObjectFormat/Description`.
    pub fn data_object_description(mut self, description: impl Into<String>) -> Self {
        self.data_object_description = description.into();
        self
    }
}

/// Signs serialized FacturaE documents with one credential.
///
/// ```no_run
/// use facturae::xades::{PrivateKeyHandle, SigningCredential, XadesSigner};
///
/// let cert = std::fs::read_to_string("cert.pem").unwrap();
/// let key = PrivateKeyHandle::from_pem(std::fs::read_to_string("key.pem").unwrap());
/// let signer = XadesSigner::new(SigningCredential::from_pem(&cert, key).unwrap());
/// let signed = signer.sign(b"<fe:Facturae>...</fe:Facturae>".to_vec());
/// ```
#[derive(Clone)]
pub struct XadesSigner {
    credential: SigningCredential,
    provider: Arc<dyn CryptoProvider>,
    options: SignerOptions,
}

impl std::fmt::Debug for XadesSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XadesSigner")
            .field("credential", &self.credential)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl XadesSigner {
    pub fn new(credential: SigningCredential) -> Self {
        Self {
            credential,
            provider: Arc::new(RustCryptoProvider),
            options: SignerOptions::default(),
        }
    }

    pub fn with_provider(mut self, provider: impl CryptoProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn with_options(mut self, options: SignerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SignerOptions {
        &self.options
    }

    /// Embed an enveloped signature into `document`.
    ///
    /// On failure the returned [`SigningFailure`] holds `document` unchanged.
    pub fn sign(&self, document: Vec<u8>) -> Result<Vec<u8>, SigningFailure> {
        match self.run(&document) {
            Ok(signed) => {
                tracing::info!(bytes = signed.len(), "document signed");
                Ok(signed)
            }
            Err(error) => {
                tracing::warn!(%error, "signing failed, returning unsigned document");
                Err(SigningFailure { error, document })
            }
        }
    }

    fn run(&self, document: &[u8]) -> Result<Vec<u8>, FacturaeError> {
        Unsigned::parse(document, &self.options)?
            .compute_references(self)?
            .assemble_signed_info()?
            .sign(self)?
            .embed()
    }

    fn digest_base64(&self, profile: &SignatureProfile, data: &[u8]) -> Result<String, FacturaeError> {
        let digest = self.provider.digest(profile.reference_digest, data)?;
        Ok(to_base64(&digest, false))
    }
}

/// Stage 0: the unsigned document with its root element located.
pub struct Unsigned<'a> {
    document: &'a str,
    root_start: usize,
    /// Offset of the root's closing tag, where the signature is spliced.
    splice_at: usize,
    root_end: usize,
    /// Namespace declarations in scope for the signature subtree.
    namespaces: Vec<(String, String)>,
    /// Whether `ds:Signature` must declare the `ds` prefix itself.
    declare_ds: bool,
    schema: Option<SchemaVersion>,
    profile: SignatureProfile,
    ids: SignatureIds,
}

impl<'a> Unsigned<'a> {
    fn parse(document: &'a [u8], options: &SignerOptions) -> Result<Self, FacturaeError> {
        let doc_error = |msg: String| FacturaeError::crypto(SigningStage::Document, msg);
        let document = std::str::from_utf8(document)
            .map_err(|e| doc_error(format!("document is not UTF-8: {e}")))?;
        let root = RootTag::parse(document)?;
        if root.self_closing {
            return Err(doc_error("root element is empty".into()));
        }

        let closing = format!("</{}>", root.name);
        let splice_at = document
            .rfind(&closing)
            .filter(|&pos| pos >= root.end)
            .ok_or_else(|| doc_error(format!("missing closing tag {closing}")))?;

        let root_prefix = root.name.split_once(':').map(|(p, _)| p);
        let root_ns = match root_prefix {
            Some(prefix) => root.attribute(&format!("xmlns:{prefix}")),
            None => root.attribute("xmlns"),
        };
        let schema = root_ns.and_then(SchemaVersion::from_namespace);
        let profile = options
            .profile
            .unwrap_or_else(|| SignatureProfile::for_schema(schema.unwrap_or_default()));

        let mut namespaces: Vec<(String, String)> = root
            .namespace_declarations()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        let declare_ds = !namespaces.iter().any(|(n, v)| n == "xmlns:ds" && v == ns::DS);
        if declare_ds {
            namespaces.retain(|(n, _)| n != "xmlns:ds");
            namespaces.push(("xmlns:ds".into(), ns::DS.into()));
        }
        namespaces.retain(|(n, _)| n != "xmlns:xades");
        namespaces.push(("xmlns:xades".into(), ns::XADES.into()));

        let ids = SignatureIds::generate_for(document);
        tracing::debug!(
            schema = schema.map(|s| s.code()).unwrap_or("unknown"),
            signature_method = profile.signature.uri(),
            signature_id = ids.signature,
            "signing: unsigned document parsed"
        );

        Ok(Self {
            document,
            root_start: root.start,
            splice_at,
            root_end: splice_at + closing.len(),
            namespaces,
            declare_ds,
            schema,
            profile,
            ids,
        })
    }

    /// Canonical bytes of `element` as it will read in place, with every
    /// namespace in scope declared on it.
    fn in_scope(&self, element: &XmlElement) -> Result<String, FacturaeError> {
        let decls: Vec<(&str, &str)> = self
            .namespaces
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        inject_namespaces(&element.to_xml_string()?, &decls)
    }

    fn compute_references(self, signer: &XadesSigner) -> Result<ReferencesComputed<'a>, FacturaeError> {
        let credential = &signer.credential;
        let provider = &signer.provider;
        let pretty = signer.options.pretty_base64;

        let cert_info = provider.certificate_info(credential.certificate_der())?;
        let fingerprint = provider
            .certificate_fingerprint(self.profile.reference_digest, credential.certificate_der())?;

        let signed_properties = signed_properties(
            &self.ids,
            &signer.options,
            credential,
            &cert_info,
            &self.profile,
            &to_base64(&fingerprint, false),
        )?;
        let key_info = key_info(
            &self.ids,
            &to_base64(credential.certificate_der(), pretty),
            &cert_info,
            pretty,
        );

        let digest_error = |e: FacturaeError| match e {
            FacturaeError::Crypto { message, .. } => {
                FacturaeError::crypto(SigningStage::Digest, message)
            }
            other => other,
        };
        let props_digest = signer
            .digest_base64(&self.profile, self.in_scope(&signed_properties)?.as_bytes())
            .map_err(digest_error)?;
        let key_info_digest = signer
            .digest_base64(&self.profile, self.in_scope(&key_info)?.as_bytes())
            .map_err(digest_error)?;
        let document_digest = signer
            .digest_base64(
                &self.profile,
                self.document[self.root_start..self.root_end].as_bytes(),
            )
            .map_err(digest_error)?;

        tracing::debug!(stage = "references", "signing: references digested");
        Ok(ReferencesComputed {
            unsigned: self,
            signed_properties,
            key_info,
            props_digest,
            key_info_digest,
            document_digest,
        })
    }
}

/// Stage 1: every referenced element built and digested.
pub struct ReferencesComputed<'a> {
    unsigned: Unsigned<'a>,
    signed_properties: XmlElement,
    key_info: XmlElement,
    props_digest: String,
    key_info_digest: String,
    document_digest: String,
}

impl<'a> ReferencesComputed<'a> {
    fn assemble_signed_info(self) -> Result<SignedInfoAssembled<'a>, FacturaeError> {
        let ids = &self.unsigned.ids;
        let profile = &self.unsigned.profile;

        let digest = |value: &str| {
            [
                XmlElement::new("ds:DigestMethod").attr("Algorithm", profile.reference_digest.uri()),
                XmlElement::with_text("ds:DigestValue", value),
            ]
        };

        let signed_info = XmlElement::new("ds:SignedInfo")
            .attr("Id", format!("Signature-SignedInfo{}", ids.signed_info))
            .child(XmlElement::new("ds:CanonicalizationMethod").attr("Algorithm", C14N))
            .child(XmlElement::new("ds:SignatureMethod").attr("Algorithm", profile.signature.uri()))
            .child(
                XmlElement::new("ds:Reference")
                    .attr("Id", format!("SignedPropertiesID{}", ids.signed_properties_reference))
                    .attr("Type", SIGNED_PROPERTIES_TYPE)
                    .attr("URI", format!("#{}", ids.signed_properties_id()))
                    .children_from(digest(&self.props_digest)),
            )
            .child(
                XmlElement::new("ds:Reference")
                    .attr("URI", format!("#{}", ids.certificate_id()))
                    .children_from(digest(&self.key_info_digest)),
            )
            .child(
                XmlElement::new("ds:Reference")
                    .attr("Id", ids.document_reference_id())
                    .attr("URI", "")
                    .child(
                        XmlElement::new("ds:Transforms").child(
                            XmlElement::new("ds:Transform").attr("Algorithm", ENVELOPED_SIGNATURE),
                        ),
                    )
                    .children_from(digest(&self.document_digest)),
            );

        let canonical = self.unsigned.in_scope(&signed_info)?;
        tracing::debug!(stage = "signed_info", "signing: SignedInfo assembled");
        Ok(SignedInfoAssembled {
            references: self,
            signed_info,
            canonical,
        })
    }
}

/// Stage 2: SignedInfo built and canonicalized, ready to sign.
pub struct SignedInfoAssembled<'a> {
    references: ReferencesComputed<'a>,
    signed_info: XmlElement,
    canonical: String,
}

impl<'a> SignedInfoAssembled<'a> {
    fn sign(self, signer: &XadesSigner) -> Result<Signed<'a>, FacturaeError> {
        let algorithm = self.references.unsigned.profile.signature;
        // the provider parses the key and drops it before returning
        let value = signer
            .provider
            .sign(algorithm, signer.credential.private_key(), self.canonical.as_bytes())?;
        tracing::debug!(stage = "signature", bytes = value.len(), "signing: signature computed");
        Ok(Signed {
            signature_value: to_base64(&value, signer.options.pretty_base64),
            assembled: self,
        })
    }
}

/// Stage 3: signature value computed.
pub struct Signed<'a> {
    assembled: SignedInfoAssembled<'a>,
    signature_value: String,
}

impl Signed<'_> {
    /// Splice the `ds:Signature` subtree before the root's closing tag.
    fn embed(self) -> Result<Vec<u8>, FacturaeError> {
        let SignedInfoAssembled {
            references,
            signed_info,
            ..
        } = self.assembled;
        let unsigned = &references.unsigned;
        let ids = &unsigned.ids;

        let mut signature = XmlElement::new("ds:Signature")
            .attr("xmlns:xades", ns::XADES)
            .attr("Id", ids.signature_id())
            .child(signed_info)
            .child(
                XmlElement::with_text("ds:SignatureValue", self.signature_value)
                    .attr("Id", format!("SignatureValue{}", ids.signature_value)),
            )
            .child(references.key_info.clone())
            .child(
                XmlElement::new("ds:Object")
                    .attr("Id", format!("{}-Object{}", ids.signature_id(), ids.object))
                    .child(
                        XmlElement::new("xades:QualifyingProperties")
                            .attr("Target", format!("#{}", ids.signature_id()))
                            .child(references.signed_properties.clone()),
                    ),
            );
        if unsigned.declare_ds {
            signature.set_attr("xmlns:ds", ns::DS);
        }

        let signature = signature
            .to_bytes()
            .map_err(|e| FacturaeError::crypto(SigningStage::Embedding, e.to_string()))?;
        let doc = unsigned.document.as_bytes();
        let mut out = Vec::with_capacity(doc.len() + signature.len());
        out.extend_from_slice(&doc[..unsigned.splice_at]);
        out.extend_from_slice(&signature);
        out.extend_from_slice(&doc[unsigned.splice_at..]);

        tracing::debug!(
            stage = "embedded",
            schema = unsigned.schema.map(|s| s.code()).unwrap_or("unknown"),
            "signing: signature embedded"
        );
        Ok(out)
    }
}

fn signed_properties(
    ids: &SignatureIds,
    options: &SignerOptions,
    credential: &SigningCredential,
    cert: &CertificateInfo,
    profile: &SignatureProfile,
    fingerprint: &str,
) -> Result<XmlElement, FacturaeError> {
    let signing_time = options
        .signing_time
        .unwrap_or_else(|| chrono::Local::now().fixed_offset())
        .to_rfc3339_opts(SecondsFormat::Secs, false);
    let policy = credential.policy();

    let signing_certificate = XmlElement::new("xades:SigningCertificate").child(
        XmlElement::new("xades:Cert")
            .child(
                XmlElement::new("xades:CertDigest")
                    .child(
                        XmlElement::new("ds:DigestMethod")
                            .attr("Algorithm", profile.reference_digest.uri()),
                    )
                    .text_child("ds:DigestValue", fingerprint),
            )
            .child(
                XmlElement::new("xades:IssuerSerial")
                    .text_child("ds:X509IssuerName", cert.issuer_name.as_str())
                    .text_child("ds:X509SerialNumber", cert.serial_number.as_str()),
            ),
    );

    let policy_identifier = XmlElement::new("xades:SignaturePolicyIdentifier").child(
        XmlElement::new("xades:SignaturePolicyId")
            .child(
                XmlElement::new("xades:SigPolicyId")
                    .text_child("xades:Identifier", policy.url.as_str())
                    .text_child("xades:Description", policy.name.as_str()),
            )
            .child(
                XmlElement::new("xades:SigPolicyHash")
                    .child(
                        XmlElement::new("ds:DigestMethod")
                            .attr("Algorithm", policy.digest_algorithm.uri()),
                    )
                    .text_child("ds:DigestValue", policy.digest.as_str()),
            ),
    );

    let signer_role = XmlElement::new("xades:SignerRole").child(
        XmlElement::new("xades:ClaimedRoles")
            .text_child("xades:ClaimedRole", options.claimed_role.as_str()),
    );

    Ok(XmlElement::new("xades:SignedProperties")
        .attr("Id", ids.signed_properties_id())
        .child(
            XmlElement::new("xades:SignedSignatureProperties")
                .text_child("xades:SigningTime", signing_time)
                .child(signing_certificate)
                .child(policy_identifier)
                .child(signer_role),
        )
        .child(
            XmlElement::new("xades:SignedDataObjectProperties").child(
                XmlElement::new("xades:DataObjectFormat")
                    .attr("ObjectReference", format!("#{}", ids.document_reference_id()))
                    .text_child(
                        "xades:Description",
                        options.data_object_description.as_str(),
                    )
                    .text_child("xades:MimeType", "text/xml"),
            ),
        ))
}

fn key_info(ids: &SignatureIds, certificate: &str, cert: &CertificateInfo, pretty: bool) -> XmlElement {
    let key_value = cert.rsa_key.as_ref().map(|rsa| {
        XmlElement::new("ds:KeyValue").child(
            XmlElement::new("ds:RSAKeyValue")
                .text_child("ds:Modulus", to_base64(&rsa.modulus, pretty))
                .text_child("ds:Exponent", to_base64(&rsa.exponent, false)),
        )
    });
    XmlElement::new("ds:KeyInfo")
        .attr("Id", ids.certificate_id())
        .child(XmlElement::new("ds:X509Data").text_child("ds:X509Certificate", certificate))
        .opt_child(key_value)
}
