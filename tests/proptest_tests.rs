//! Property-based tests for numeric formatting and XML primitives.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "xml")]

use facturae::core::numeric::field;
use facturae::core::*;
use facturae::xml::{escape, inject_namespaces, unescape};
use proptest::prelude::*;
use rust_decimal::Decimal;

const FIELDS: &[&str] = &[
    field::ITEM_QUANTITY,
    field::ITEM_UNIT_PRICE,
    field::ITEM_TOTAL_AMOUNT,
    field::ITEM_GROSS_AMOUNT,
    field::TAX_RATE,
    field::TAX_AMOUNT,
    field::DISCOUNT_RATE,
    field::DISCOUNT_AMOUNT,
    field::TOTAL,
];

fn schema() -> impl Strategy<Value = SchemaVersion> {
    prop::sample::select(SchemaVersion::ALL.to_vec())
}

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000_000, 0u32..12).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

/// Any non-negative decimal, up to `Decimal::MAX`.
fn any_amount() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, scale)| Decimal::from_parts(lo, mid, hi, false, scale))
}

proptest! {
    #[test]
    fn formatted_digits_within_range(
        value in amount(),
        version in schema(),
        path in prop::sample::select(FIELDS),
    ) {
        let out = NumericFormatter::new(version).format(value, path).unwrap();
        let range = digit_range(path, version);
        let digits = out.split_once('.').map(|(_, frac)| frac.len() as u32).unwrap_or(0);

        prop_assert!(digits >= range.min && digits <= range.max, "{out} outside {range:?}");
        prop_assert!(!out.contains('e') && !out.contains('E') && !out.contains(','));
    }

    #[test]
    fn formatted_value_is_rounded_input(
        value in amount(),
        version in schema(),
        path in prop::sample::select(FIELDS),
    ) {
        let fmt = NumericFormatter::new(version);
        let out: Decimal = fmt.format(value, path).unwrap().parse().unwrap();
        let max = digit_range(path, version).max;
        let expected = value.round_dp_with_strategy(max, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn full_range_formats_or_fails_cleanly(
        value in any_amount(),
        version in schema(),
        path in prop::sample::select(FIELDS),
    ) {
        let range = digit_range(path, version);
        match NumericFormatter::new(version).format(value, path) {
            Ok(out) => {
                let digits = out.split_once('.').map(|(_, frac)| frac.len() as u32).unwrap_or(0);
                prop_assert!(digits >= range.min && digits <= range.max, "{out} outside {range:?}");
                let expected = value.round_dp_with_strategy(range.max, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
                prop_assert_eq!(out.parse::<Decimal>().unwrap(), expected);
            }
            Err(FacturaeError::Formatting { field, .. }) => prop_assert_eq!(field, path),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    #[test]
    fn escape_round_trips(text in "\\PC*") {
        let escaped = escape(&text);
        prop_assert!(!escaped.contains('<') && !escaped.contains('"'));
        prop_assert_eq!(unescape(&escaped).unwrap(), text);
    }

    #[test]
    fn inject_orders_and_is_idempotent(
        attrs in prop::collection::btree_map("[a-zA-Z][a-zA-Z0-9]{0,6}", "[a-z0-9 ]{0,8}", 0..5),
        prefixes in prop::collection::btree_set("[a-z]{1,5}", 0..4),
    ) {
        let mut tag = String::from("<root");
        for (name, value) in &attrs {
            if name.starts_with("xmlns") {
                continue;
            }
            tag.push_str(&format!(" {name}=\"{value}\""));
        }
        tag.push_str("><child a=\"1\"/></root>");

        let decls: Vec<(String, String)> = prefixes
            .iter()
            .map(|p| (format!("xmlns:{p}"), format!("urn:{p}")))
            .collect();
        let decl_refs: Vec<(&str, &str)> = decls.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();

        let once = inject_namespaces(&tag, &decl_refs).unwrap();
        let twice = inject_namespaces(&once, &decl_refs).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.ends_with("><child a=\"1\"/></root>"));

        // namespace declarations all precede ordinary attributes
        let open = &once[..once.find('>').unwrap()];
        let names: Vec<&str> = open
            .split(' ')
            .skip(1)
            .filter_map(|part| part.split_once('=').map(|(n, _)| n))
            .collect();
        if let Some(first_plain) = names.iter().position(|n| !n.starts_with("xmlns")) {
            prop_assert!(names[first_plain..].iter().all(|n| !n.starts_with("xmlns")));
        }
    }
}
