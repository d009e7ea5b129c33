#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let escaped = facturae::xml::escape(s);
        assert_eq!(facturae::xml::unescape(&escaped).ok().as_deref(), Some(s));
    }
});
