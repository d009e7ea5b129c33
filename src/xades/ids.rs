use rand::Rng;

/// Range random signature identifiers are drawn from.
pub const ID_RANGE: std::ops::RangeInclusive<u32> = 0x1000_0000..=0x7FFF_FFFF;

/// Identifiers of every element the signature references, pairwise distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureIds {
    pub signature: u32,
    pub signed_info: u32,
    pub signed_properties_reference: u32,
    pub signed_properties: u32,
    pub signature_value: u32,
    pub certificate: u32,
    pub document_reference: u32,
    pub object: u32,
}

impl SignatureIds {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::generate_avoiding(rng, &[])
    }

    /// Identifiers for a new signature in `document`, none of which is
    /// already used by an `Id` attribute there (earlier signatures included).
    pub fn generate_for(document: &str) -> Self {
        Self::generate_avoiding(&mut rand::thread_rng(), &ids_in_use(document))
    }

    pub fn generate_avoiding<R: Rng + ?Sized>(rng: &mut R, taken: &[u32]) -> Self {
        let mut drawn: Vec<u32> = Vec::with_capacity(8);
        while drawn.len() < 8 {
            let id = rng.gen_range(ID_RANGE);
            if !drawn.contains(&id) && !taken.contains(&id) {
                drawn.push(id);
            }
        }
        Self {
            signature: drawn[0],
            signed_info: drawn[1],
            signed_properties_reference: drawn[2],
            signed_properties: drawn[3],
            signature_value: drawn[4],
            certificate: drawn[5],
            document_reference: drawn[6],
            object: drawn[7],
        }
    }

    pub fn all(&self) -> [u32; 8] {
        [
            self.signature,
            self.signed_info,
            self.signed_properties_reference,
            self.signed_properties,
            self.signature_value,
            self.certificate,
            self.document_reference,
            self.object,
        ]
    }

    pub(crate) fn signature_id(&self) -> String {
        format!("Signature{}", self.signature)
    }

    pub(crate) fn signed_properties_id(&self) -> String {
        format!("{}-SignedProperties{}", self.signature_id(), self.signed_properties)
    }

    pub(crate) fn certificate_id(&self) -> String {
        format!("Certificate{}", self.certificate)
    }

    pub(crate) fn document_reference_id(&self) -> String {
        format!("Reference-ID-{}", self.document_reference)
    }
}

/// Every number in [`ID_RANGE`] that appears inside an `Id="..."` value.
pub fn ids_in_use(document: &str) -> Vec<u32> {
    let mut taken = Vec::new();
    for (pos, _) in document.match_indices(" Id=\"") {
        let value = &document[pos + 5..];
        let Some(end) = value.find('"') else { break };
        taken.extend(
            value[..end]
                .split(|c: char| !c.is_ascii_digit())
                .filter_map(|run| run.parse::<u32>().ok())
                .filter(|id| ID_RANGE.contains(id)),
        );
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ids_distinct_and_in_range() {
        for _ in 0..100 {
            let ids = SignatureIds::generate().all();
            for (i, id) in ids.iter().enumerate() {
                assert!(ID_RANGE.contains(id));
                assert!(!ids[i + 1..].contains(id));
            }
        }
    }

    #[test]
    fn collects_ids_from_id_attributes() {
        let doc = r#"<ds:Signature Id="Signature268435457"><ds:Object Id="Signature268435457-Object536870912"></ds:Object><a Id="x12"></a></ds:Signature>"#;
        assert_eq!(ids_in_use(doc), vec![268435457, 268435457, 536870912]);
    }

    #[test]
    fn avoids_taken_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let first = SignatureIds::generate_avoiding(&mut rng, &[]);
        let mut rng = StdRng::seed_from_u64(7);
        let second = SignatureIds::generate_avoiding(&mut rng, &first.all());
        for id in second.all() {
            assert!(!first.all().contains(&id));
        }
    }
}
