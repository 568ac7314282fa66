use pretty_assertions::assert_eq;
use scraper_core::{parse_input, replace_all, ScriptError, Value};

fn row(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn every_match_becomes_a_row_of_groups() {
    let value = parse_input("a1 b2 a3 b4", r"([a-z])(\d)").unwrap();
    assert_eq!(
        value,
        Value::Groups(vec![
            row(&["a", "1"]),
            row(&["b", "2"]),
            row(&["a", "3"]),
            row(&["b", "4"]),
        ])
    );
    assert_eq!(value.select(0, Some(0)), Some(Value::from("a")));
    assert_eq!(value.select(1, Some(1)), Some(Value::from("2")));
}

#[test]
fn no_match_is_empty() {
    let value = parse_input("nothing here", r"(\d+)").unwrap();
    assert!(value.is_empty());
    assert_eq!(value.encode(), "");
}

#[test]
fn non_participating_group_is_empty_text() {
    let value = parse_input("x=1 y", r"(\w)(?:=(\d))?").unwrap();
    assert_eq!(value, Value::Groups(vec![row(&["x", "1"]), row(&["y", ""])]));
}

#[test]
fn lazy_patterns_scan_left_to_right() {
    let value = parse_input("<li>A</li><li>B</li>", "<li>(.*?)</li>").unwrap();
    assert_eq!(value, Value::Groups(vec![row(&["A"]), row(&["B"])]));
}

#[test]
fn malformed_regex_is_fatal() {
    let err = parse_input("data", "(unclosed").unwrap_err();
    assert!(matches!(err, ScriptError::InvalidRegex { ref pattern, .. } if pattern == "(unclosed"));
}

#[test]
fn replace_rewrites_every_match_with_group_references() {
    assert_eq!(
        replace_all("2024-01-31", r"(\d+)-(\d+)-(\d+)", "$3.$2.$1").unwrap(),
        "31.01.2024"
    );
    assert_eq!(replace_all("a b  c", r"\s+", "_").unwrap(), "a_b_c");
    assert!(replace_all("x", "[", "y").is_err());
}

#[test]
fn group_reference_may_be_followed_by_text() {
    assert_eq!(replace_all("12px", r"(\d+)px", "$1em").unwrap(), "12em");
    assert_eq!(replace_all("a1", r"([a-z])(\d)", "$2$1_x").unwrap(), "1a_x");
    assert_eq!(replace_all("5", r"(\d)", "$$$1").unwrap(), "$5");
}
