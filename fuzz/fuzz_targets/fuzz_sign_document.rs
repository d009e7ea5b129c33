#![no_main]

use facturae::xades::{PrivateKeyHandle, SigningCredential, XadesSigner};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let credential = SigningCredential::from_pem(
        include_str!("../../tests/fixtures/signer_cert.pem"),
        PrivateKeyHandle::from_pem(include_str!("../../tests/fixtures/signer_key.pem")),
    )
    .unwrap();
    // Failures must hand back the input untouched.
    if let Err(failure) = XadesSigner::new(credential).sign(data.to_vec()) {
        assert_eq!(failure.document, data);
    }
});
