// Identifier derivation tests
//
// One uppercased character per alphanumeric token, in order.

use project_identifier::identifier::generate;
use rstest::rstest;

#[rstest]
#[case("My Awesome Project", "MAP")]
#[case("foo-bar_baz", "FBB")]
#[case("123 abc", "1A")]
#[case("  leading and trailing  ", "LAT")]
#[case("camelCaseName", "C")]
#[case("v2.0-release", "V0R")]
fn test_generate_known_names(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(generate(name), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
#[case("--__..")]
fn test_generate_without_tokens_is_empty(#[case] name: &str) {
    assert_eq!(generate(name), "");
}

#[test]
fn test_one_character_per_token() {
    let names = [
        "a b c d e",
        "über-straße 42",
        "x/y\\z:w",
        "Δelta Ωmega",
    ];
    for name in names {
        let tokens = name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .count();
        assert_eq!(generate(name).chars().count(), tokens, "name: {name}");
    }
}

#[test]
fn test_output_has_no_lowercase_letters() {
    for name in ["lower case words", "MiXeD cAsE", "élan vital"] {
        assert!(!generate(name).chars().any(char::is_lowercase), "name: {name}");
    }
}
