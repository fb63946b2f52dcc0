//! Property-based tests for dirtab parsing and glob matching

use proptest::prelude::*;
use snapcat::dirtab::{Dirtab, GlobPattern};

/// Pattern text built from path-ish characters and wildcards, never an escape
fn pattern_strategy() -> impl Strategy<Value = String> {
    "(/[a-z.*?]{1,6}){1,4}"
}

/// Absolute paths with one to four components
fn path_strategy() -> impl Strategy<Value = String> {
    "(/[a-z.]{1,6}){1,4}"
}

fn rule_file_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            pattern_strategy(),
            pattern_strategy().prop_map(|p| format!("! {}", p)),
            Just("# comment".to_string()),
            Just(String::new()),
        ],
        0..12,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn parse_is_deterministic(text in rule_file_strategy()) {
        let a = Dirtab::parse(&text);
        let b = Dirtab::parse(&text);
        prop_assert_eq!(a.rules(), b.rules());
        prop_assert_eq!(a.is_valid(), b.is_valid());
        prop_assert_eq!(a.errors(), b.errors());
    }

    #[test]
    fn rule_count_is_positive_plus_negative(text in rule_file_strategy()) {
        let dirtab = Dirtab::parse(&text);
        prop_assert_eq!(
            dirtab.rule_count(),
            dirtab.positive_rule_count() + dirtab.negative_rule_count()
        );
    }

    #[test]
    fn comments_and_blanks_only_yield_nothing(lines in prop::collection::vec(
        prop_oneof![Just("# x".to_string()), Just("   ".to_string()), Just(String::new())],
        0..10,
    )) {
        let dirtab = Dirtab::parse(&lines.join("\n"));
        prop_assert!(dirtab.is_valid());
        prop_assert_eq!(dirtab.rule_count(), 0);
        prop_assert!(!dirtab.is_matching("/usr"));
    }

    #[test]
    fn wildcards_never_match_a_slash(prefix in "[a-z]{0,3}", suffix in "[a-z]{0,3}") {
        let star = GlobPattern::parse(&format!("/{}*{}", prefix, suffix), 1).unwrap();
        let one = GlobPattern::parse(&format!("/{}?{}", prefix, suffix), 1).unwrap();
        let across = format!("/{}/{}", prefix, suffix);
        prop_assert!(!star.matches(&across));
        prop_assert!(!one.matches(&across));
    }

    #[test]
    fn literal_patterns_match_only_themselves(path in path_strategy(), other in path_strategy()) {
        let pattern = GlobPattern::parse(&path, 1).unwrap();
        prop_assert!(pattern.matches(&path));
        prop_assert_eq!(pattern.matches(&other), path == other);
    }

    #[test]
    fn negative_rule_for_every_positive_invalidates(patterns in prop::collection::vec(pattern_strategy(), 1..5)) {
        let mut text = String::new();
        for p in &patterns {
            text.push_str(p);
            text.push('\n');
            text.push_str(&format!("!{}\n", p));
        }
        let dirtab = Dirtab::parse(&text);
        prop_assert!(!dirtab.is_valid());
        prop_assert!(!dirtab.contradictions().is_empty());
    }

    #[test]
    fn negative_match_always_wins(path in path_strategy()) {
        let dirtab = Dirtab::parse(&format!("{}\n! {}\n", path, path));
        prop_assert!(!dirtab.is_matching(&path));
    }
}
