#![allow(unused)]
//! Filter evaluator harness.
//!
//! # What this covers
//!
//! - **Empty combinators**: `And([])` matches every entry, `Or([])` none.
//! - **Distributivity**: `And`/`Or` over two children agree with `&&`/`||`
//!   of the children evaluated alone, for arbitrary entries and filters.
//!   Verified with proptest.
//! - **Case-insensitive names**: `Present("CN")` and `Present("cn")` agree.
//! - **Substring anchoring** on concrete values.
//! - **Filter text**: rendering a parsed filter and parsing it again gives
//!   the same tree.
//!
//! # What this does NOT cover
//!
//! - Matching rules beyond exact, case-sensitive value comparison
//!
//! # Running
//!
//! ```sh
//! cargo test --test filter_harness
//! ```

mod common;
use common::*;
use devldap_core::filter::{matches, substring_pattern};
use devldap_core::{Entry, Filter, SubstringFragment};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const NAMES: &[&str] = &["cn", "sn", "mail", "uid"];
const VALUES: &[&str] = &["a", "b", "ab", "ba", "a*b"];

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(NAMES).prop_map(str::to_string)
}

fn value() -> impl Strategy<Value = String> {
    prop::sample::select(VALUES).prop_map(str::to_string)
}

fn entry() -> impl Strategy<Value = Entry> {
    prop::collection::btree_map(
        name(),
        prop_oneof![
            value().prop_map(|v| vec![v]),
            prop::collection::vec(value(), 0..3),
        ],
        0..4,
    )
    .prop_map(|attrs| {
        attrs.into_iter().fold(Entry::new(), |entry, (name, mut values)| {
            if values.len() == 1 {
                entry.with(name, values.remove(0))
            } else {
                entry.with(name, values)
            }
        })
    })
}

fn fragment() -> impl Strategy<Value = Vec<SubstringFragment>> {
    (
        prop::option::of(value()),
        prop::collection::vec(value(), 0..2),
        prop::option::of(value()),
    )
        .prop_map(|(initial, any, last)| {
            let mut out = Vec::new();
            out.extend(initial.map(SubstringFragment::Initial));
            out.extend(any.into_iter().map(SubstringFragment::Any));
            out.extend(last.map(SubstringFragment::Final));
            out
        })
}

fn filter() -> impl Strategy<Value = Filter> {
    let leaf = prop_oneof![
        (name(), value()).prop_map(|(a, v)| Filter::equality(a, v)),
        name().prop_map(Filter::present),
        (name(), fragment()).prop_map(|(a, f)| Filter::substrings(a, f)),
        (name(), value()).prop_map(|(attribute, value)| Filter::GreaterOrEqual { attribute, value }),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Filter::And),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Filter::Or),
            inner.prop_map(Filter::not),
        ]
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn empty_and_matches_everything(e in entry()) {
        prop_assert!(matches(&e, &Filter::And(vec![])));
    }

    #[test]
    fn empty_or_matches_nothing(e in entry()) {
        prop_assert!(!matches(&e, &Filter::Or(vec![])));
    }

    #[test]
    fn and_is_conjunction(e in entry(), f1 in filter(), f2 in filter()) {
        let both = matches(&e, &f1) && matches(&e, &f2);
        prop_assert_eq!(matches(&e, &Filter::And(vec![f1, f2])), both);
    }

    #[test]
    fn or_is_disjunction(e in entry(), f1 in filter(), f2 in filter()) {
        let either = matches(&e, &f1) || matches(&e, &f2);
        prop_assert_eq!(matches(&e, &Filter::Or(vec![f1, f2])), either);
    }

    #[test]
    fn presence_ignores_name_case(e in entry(), n in name()) {
        prop_assert_eq!(
            matches(&e, &Filter::present(n.to_uppercase())),
            matches(&e, &Filter::present(n))
        );
    }

    #[test]
    fn not_never_matches(e in entry(), f in filter()) {
        prop_assert!(!matches(&e, &Filter::not(f)));
    }

    #[test]
    fn rendered_filters_parse_back(f in filter()) {
        let text = f.to_string();
        let parsed = Filter::parse(&text);
        prop_assert!(parsed.is_ok(), "{} did not parse: {:?}", text, parsed);
        prop_assert_eq!(parsed.map(|p| p.to_string()).unwrap_or_default(), text);
    }
}

// ---------------------------------------------------------------------------
// Substrings
// ---------------------------------------------------------------------------

#[rstest]
#[case("abcz", true)]
#[case("abXXczYz", true)]
#[case("xabcz", false)]
#[case("abczq", false)]
#[case("abz", false)]
fn initial_any_final(#[case] value: &str, #[case] expected: bool) {
    let filter = Filter::parse("(cn=ab*c*z)").unwrap();
    let entry = Entry::new().with("cn", value);
    assert_eq!(matches(&entry, &filter), expected);
}

#[test]
fn pattern_collapses_wildcards() {
    let fragments = vec![
        SubstringFragment::Any("a".into()),
        SubstringFragment::Any("b".into()),
    ];
    assert_eq!(substring_pattern(&fragments), "^.*a.*b.*$");
}

#[test]
fn repeated_wildcards_mean_presence() {
    let filter = Filter::parse("(cn=**)").unwrap();
    let entry = Entry::new().with("cn", "Ada");
    assert!(matches(&entry, &filter));
    let reparsed = Filter::parse(&filter.to_string()).unwrap();
    assert_eq!(reparsed, filter);
    assert!(matches(&entry, &reparsed));
}

#[test]
fn regex_metacharacters_are_literal() {
    let entry = Entry::new().with("cn", "a.b");
    assert!(matches(&entry, &Filter::parse("(cn=a.*)").unwrap()));
    let other = Entry::new().with("cn", "axb");
    assert!(!matches(&other, &Filter::parse("(cn=a.*)").unwrap()));
}

#[test]
fn equality_scenario_from_store() {
    let dir = directory(MAIL_JSON);
    let entry = dir.get("cn=x,o=y").unwrap();
    assert!(matches(entry, &Filter::equality("mail", "b@x.com")));
    assert!(!matches(entry, &Filter::equality("mail", "c@x.com")));
}
