use super::algorithm::{DigestAlgorithm, SignatureAlgorithm};
use crate::core::SchemaVersion;

/// Digest and signature algorithm pairing for one schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureProfile {
    /// Algorithm for reference digests and the certificate fingerprint.
    pub reference_digest: DigestAlgorithm,
    pub signature: SignatureAlgorithm,
}

const PROFILES: &[(SchemaVersion, SignatureProfile)] = &[
    (
        SchemaVersion::V3_2,
        SignatureProfile {
            reference_digest: DigestAlgorithm::Sha512,
            signature: SignatureAlgorithm::RsaSha1,
        },
    ),
    (
        SchemaVersion::V3_2_1,
        SignatureProfile {
            reference_digest: DigestAlgorithm::Sha512,
            signature: SignatureAlgorithm::RsaSha1,
        },
    ),
    (
        SchemaVersion::V3_2_2,
        SignatureProfile {
            reference_digest: DigestAlgorithm::Sha512,
            signature: SignatureAlgorithm::RsaSha512,
        },
    ),
];

impl SignatureProfile {
    pub fn for_schema(version: SchemaVersion) -> Self {
        PROFILES
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, p)| *p)
            .unwrap_or(Self::LEGACY)
    }

    /// SHA-512 references signed with RSA-SHA1.
    pub const LEGACY: SignatureProfile = SignatureProfile {
        reference_digest: DigestAlgorithm::Sha512,
        signature: SignatureAlgorithm::RsaSha1,
    };
}

impl Default for SignatureProfile {
    fn default() -> Self {
        Self::for_schema(SchemaVersion::default())
    }
}
