use thiserror::Error;

use super::types::SchemaVersion;

/// Errors that can occur during invoice construction, rendering or signing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FacturaeError {
    /// One or more validation rules failed. No XML is emitted.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// A numeric value cannot be represented under its digit-range rule.
    #[error("cannot format {field} for schema {schema}: {message}")]
    Formatting {
        field: String,
        schema: SchemaVersion,
        message: String,
    },

    /// An XML fragment violated an assembly invariant.
    #[error("malformed XML fragment: {0}")]
    MalformedFragment(String),

    /// Certificate, key or signing primitive failure.
    #[error("crypto error during {stage}: {message}")]
    Crypto {
        stage: SigningStage,
        message: String,
    },

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),
}

impl FacturaeError {
    pub(crate) fn crypto(stage: SigningStage, message: impl Into<String>) -> Self {
        Self::Crypto {
            stage,
            message: message.into(),
        }
    }

    /// Field-level validation errors, empty for every other variant.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Step of the signing pipeline in which a [`FacturaeError::Crypto`] arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    /// Reading the unsigned document's root element.
    Document,
    /// Decoding or fingerprinting the certificate.
    Certificate,
    /// Digesting a referenced element.
    Digest,
    /// Loading the private key or computing the signature value.
    Signature,
    /// Splicing the signature subtree into the document.
    Embedding,
}

impl std::fmt::Display for SigningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Document => "document parsing",
            Self::Certificate => "certificate encoding",
            Self::Digest => "reference digesting",
            Self::Signature => "signature computation",
            Self::Embedding => "signature embedding",
        };
        f.write_str(name)
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "buyer.tax_number").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
