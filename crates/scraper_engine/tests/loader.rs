use std::fs;
use std::sync::Once;

use pretty_assertions::assert_eq;
use scraper_core::{Item, MathOp, ResultType, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};
use scraper_engine::{escape_literals, load_script, parse_script, LoadError};
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

const SCRIPT: &str = r#"
(
    details: (
        name: "Example",
        author: "someone",
        type: "MovieDetailsFetcher",
        language: "fr",
        version: Some((major: 1, minor: 2, point: 3)),
        published: Some((day: 3, month: 11, year: 2009)),
    ),
    debug: true,
    actions: [
        (
            attributes: {"name": "search"},
            steps: [
                Retrieve(name: "page", url: "http://x/${id}", timeout: Some(500), cookies: "a=1&b=2"),
                Parse(name: "rows", input: "${page}", regex: "<li>(.*?)</li>"),
                If(test: "${rows}!=", steps: [
                    Set(name: "found", value: "yes"),
                ]),
                Loop(name: "row", on: "rows", limit: Some(2), steps: [
                    Math(name: "n", op: "add", value1: "${count}", value2: "1", result_type: "float"),
                ]),
                Replace(name: "clean", input: "${page}", pattern: "<[^>]*>", with: " "),
            ],
        ),
        (
            attributes: {"name": "get_details"},
        ),
    ],
)
"#;

#[test]
fn document_becomes_scope_tree() {
    init_logging();
    let script = parse_script(SCRIPT).unwrap();

    assert_eq!(script.name(), "Example");
    assert_eq!(script.kind(), "MovieDetailsFetcher");
    assert_eq!(script.author, "someone");
    assert_eq!(script.language, "fr");
    assert_eq!(script.version, "1.2.3");
    assert_eq!(script.published, "3.11.2009");
    assert!(script.debug());

    let sections = script.sections("action", "");
    assert_eq!(sections.len(), 2);
    let tree = script.tree();
    let search = tree.scope(sections[0]);
    assert_eq!(search.attribute("name"), "search");
    assert_eq!(
        search.items(),
        &[
            Item::Retrieve("page".to_string()),
            Item::Parse("rows".to_string()),
            Item::Content(0),
            Item::Content(1),
            Item::Replace("clean".to_string()),
        ]
    );

    let retrieve = search.retrieve("page").unwrap();
    assert_eq!(retrieve.retries, DEFAULT_RETRIES);
    assert_eq!(retrieve.timeout_ms, 500);
    assert_eq!(retrieve.cookie_pairs().len(), 2);

    let branch = tree.scope(search.child(0).unwrap());
    assert_eq!(branch.name(), "if");
    assert_eq!(branch.attribute("test"), "${rows}!=");
    assert_eq!(branch.set_text("found"), "yes");

    let body = tree.scope(search.child(1).unwrap());
    assert_eq!(body.name(), "loop");
    assert_eq!(body.attribute("on"), "rows");
    assert_eq!(body.attribute("limit"), "2");
    let math = body.math("n").unwrap();
    assert_eq!(math.op, MathOp::Add);
    assert_eq!(math.result_type, ResultType::Float);
}

#[test]
fn missing_details_and_defaults() {
    let script = parse_script(r#"(actions: [(steps: [Retrieve(name: "p", url: "http://a")])])"#)
        .unwrap();
    assert_eq!(script.name(), "");
    assert_eq!(script.version, "");
    let section = script.sections("action", "")[0];
    let retrieve = script.tree().scope(section).retrieve("p").unwrap();
    assert_eq!(retrieve.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(retrieve.encoding, None);
}

#[test]
fn incomplete_steps_are_skipped() {
    init_logging();
    let script = parse_script(r#"(actions: [(steps: [Set(name: "", value: "x"), Retrieve(name: "p", url: "")])])"#)
        .unwrap();
    let section = script.sections("action", "")[0];
    assert!(script.tree().scope(section).items().is_empty());
}

#[test]
fn unknown_math_operator_is_rejected() {
    let err = parse_script(
        r#"(actions: [(steps: [Math(name: "m", op: "modulo", value1: "1", value2: "2")])])"#,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::MathOp(_)));
}

#[test]
fn syntax_errors_are_typed() {
    let err = parse_script("(actions: [").unwrap_err();
    assert!(matches!(err, LoadError::Syntax(_)));
}

#[test]
fn legacy_escapes_are_taken_literally() {
    assert_eq!(escape_literals(r"\bword\b"), r"\\bword\\b");
    assert_eq!(escape_literals(r"\d+\s"), r"\d+\s");
}

#[test]
fn loads_from_file() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("example.ron");
    fs::write(&path, SCRIPT).unwrap();

    let script = load_script(&path).unwrap();
    assert_eq!(script.name(), "Example");

    let missing = load_script(&temp.path().join("missing.ron")).unwrap_err();
    assert!(matches!(missing, LoadError::Io { .. }));
}
