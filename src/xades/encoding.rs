use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::core::{FacturaeError, SigningStage};

/// Line width used when wrapping base64 for embedding.
pub const LINE_WIDTH: usize = 76;

/// Base64-encode `bytes`, optionally wrapped at [`LINE_WIDTH`].
pub fn to_base64(bytes: &[u8], pretty: bool) -> String {
    let encoded = STANDARD.encode(bytes);
    if pretty { prettify(&encoded) } else { encoded }
}

/// Split `input` into lines of [`LINE_WIDTH`] characters, each ending in `\n`.
pub fn prettify(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / LINE_WIDTH + 1);
    for chunk in input.as_bytes().chunks(LINE_WIDTH) {
        // base64 is ASCII, chunks never split a character
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out
}

/// Body of a PEM block with header, footer and line breaks removed.
pub fn pem_body(pem: &str) -> String {
    pem.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

pub fn decode_base64(input: &str, stage: SigningStage) -> Result<Vec<u8>, FacturaeError> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FacturaeError::crypto(stage, format!("invalid base64: {e}")))
}
