#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        if let Ok(once) = facturae::xml::inject_namespaces(s, &[("xmlns:ds", "urn:ds")]) {
            let twice = facturae::xml::inject_namespaces(&once, &[("xmlns:ds", "urn:ds")]);
            assert_eq!(twice.ok().as_deref(), Some(once.as_str()));
        }
    }
});
