use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::Once;

use pretty_assertions::assert_eq;
use scraper_core::{ScriptError, Value};
use scraper_engine::{
    parse_script, FailureKind, FetchError, RetrieveRequest, Retriever, RunError, Runner, ScriptRun,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Serves fixed pages by URL; anything else is a 404.
struct Pages(HashMap<String, String>);

impl Pages {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self(
            pages
                .iter()
                .map(|(url, page)| (url.to_string(), page.to_string()))
                .collect(),
        )
    }
}

impl Retriever for Pages {
    fn retrieve(&self, request: &RetrieveRequest) -> Result<String, FetchError> {
        self.0.get(&request.url).cloned().ok_or(FetchError {
            kind: FailureKind::HttpStatus(404),
            message: request.url.clone(),
        })
    }
}

/// Replays queued responses, then empty pages; records every request.
#[derive(Default)]
struct Flaky {
    responses: RefCell<VecDeque<Result<String, FetchError>>>,
    calls: RefCell<Vec<RetrieveRequest>>,
}

impl Retriever for Flaky {
    fn retrieve(&self, request: &RetrieveRequest) -> Result<String, FetchError> {
        self.calls.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

fn timeout() -> FetchError {
    FetchError {
        kind: FailureKind::Timeout,
        message: "slow".to_string(),
    }
}

fn one_action(steps: &str) -> String {
    format!("(actions: [(attributes: {{\"name\": \"main\"}}, steps: [{steps}])])")
}

#[test]
fn retrieved_page_is_parsed_into_rows() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Retrieve(name: "page", url: "http://x/${id}"),
           Parse(name: "rows", input: "${page}", regex: "<li>(.*?)</li>")"#,
    ))
    .unwrap();
    let pages = Pages::new(&[("http://x/42", "<li>A</li><li>B</li>")]);

    let mut run = ScriptRun::new(&script);
    run.set_global("id", "42");
    let sections = Runner::new(&pages)
        .run_sections(&mut run, "action", "main")
        .unwrap();

    let tree = run.tree();
    let section = sections[0];
    assert_eq!(tree.get_variable(section, "rows[0][0]"), "A");
    assert_eq!(tree.get_variable(section, "rows[1][0]"), "B");
    assert_eq!(tree.get_variable(section, "page"), "<li>A</li><li>B</li>");
    // Writes from an action stay on the action.
    assert_eq!(run.global("rows"), "");
    // The loaded script is untouched.
    assert!(script.tree().scope(section).variables().is_empty());
}

#[test]
fn loop_runs_once_per_row_up_to_limit() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Set(name: "rows", value: "${list}"),
           Loop(name: "row", on: "rows", limit: Some(2), steps: [
               Set(name: "title_${count}", value: "${row[0]}"),
           ])"#,
    ))
    .unwrap();

    let mut run = ScriptRun::new(&script);
    run.set_global(
        "list",
        Value::Groups(vec![
            vec!["A".to_string()],
            vec!["B".to_string()],
            vec!["C".to_string()],
        ]),
    );
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();

    let tree = run.tree();
    let section = sections[0];
    assert_eq!(tree.get_variable(section, "title_0"), "A");
    assert_eq!(tree.get_variable(section, "title_1"), "B");
    assert!(!tree.has_variable(section, "title_2"));
}

#[test]
fn loop_over_missing_variable_is_skipped() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Loop(name: "row", on: "nothing", steps: [Set(name: "ran", value: "yes")])"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();
    assert!(!run.tree().has_variable(sections[0], "ran"));
}

#[test]
fn failed_condition_skips_the_branch() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Set(name: "n", value: "3"),
           If(test: "${n}>5", steps: [Set(name: "big", value: "yes")]),
           If(test: "${n}<5", steps: [Set(name: "small", value: "yes")])"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();

    let tree = run.tree();
    assert!(!tree.has_variable(sections[0], "big"));
    assert_eq!(tree.get_variable(sections[0], "small"), "yes");
}

#[test]
fn math_formats_by_result_type() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Math(name: "f", op: "divide", value1: "7", value2: "2", result_type: "float"),
           Math(name: "i", op: "divide", value1: "7", value2: "2"),
           Math(name: "z", op: "divide", value1: "7", value2: "0"),
           Math(name: "p", op: "multiply", value1: "${i}", value2: "1.5", result_type: "float")"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();

    let tree = run.tree();
    assert_eq!(tree.get_variable(sections[0], "f"), "3.5");
    assert_eq!(tree.get_variable(sections[0], "i"), "4");
    assert_eq!(tree.get_variable(sections[0], "z"), "0");
    assert_eq!(tree.get_variable(sections[0], "p"), "6.0");
}

#[test]
fn replace_rewrites_compiled_input() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Set(name: "page", value: "<li>A</li><li>B</li>"),
           Replace(name: "clean", input: "${page}", pattern: "</?li>", with: "-")"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();
    assert_eq!(run.tree().get_variable(sections[0], "clean"), "-A--B-");
}

#[test]
fn replace_group_reference_keeps_following_text() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Set(name: "size", value: "12px"),
           Replace(name: "scaled", input: "${size}", pattern: "(\\d+)px", with: "$1em")"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();
    assert_eq!(run.tree().get_variable(sections[0], "scaled"), "12em");
}

#[test]
fn loop_over_scalar_runs_once() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Set(name: "one", value: "solo"),
           Loop(name: "item", on: "one", steps: [
               Set(name: "seen_${count}", value: "${item}"),
           ])"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap();

    let tree = run.tree();
    assert_eq!(tree.get_variable(sections[0], "seen_0"), "solo");
    assert!(!tree.has_variable(sections[0], "seen_1"));
}

#[test]
fn retrieve_retries_until_a_page_arrives() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Retrieve(name: "page", url: "http://x/", retries: Some(3), cookies: "sid=1")"#,
    ))
    .unwrap();
    let flaky = Flaky::default();
    flaky.responses.borrow_mut().extend([
        Err(timeout()),
        Ok("  ".to_string()),
        Ok("line one\r\nline two".to_string()),
        Ok("never fetched".to_string()),
    ]);

    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&flaky)
        .run_sections(&mut run, "action", "")
        .unwrap();

    assert_eq!(run.tree().get_variable(sections[0], "page"), "line one line two");
    let calls = flaky.calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].cookies, vec![("sid".to_string(), "1".to_string())]);
}

#[test]
fn retrieve_gives_up_after_retries() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Retrieve(name: "page", url: "http://x/", retries: Some(1))"#,
    ))
    .unwrap();
    let flaky = Flaky::default();

    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&flaky)
        .run_sections(&mut run, "action", "")
        .unwrap();

    assert_eq!(flaky.calls.borrow().len(), 2);
    assert!(run.tree().has_variable(sections[0], "page"));
    assert_eq!(run.tree().get_variable(sections[0], "page"), "");
}

#[test]
fn bad_regex_aborts_the_run() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Set(name: "page", value: "x"),
           Parse(name: "rows", input: "${page}", regex: "(unclosed")"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let err = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap_err();
    assert!(matches!(err, RunError::Script(ScriptError::InvalidRegex { .. })));
}

#[test]
fn non_numeric_operand_aborts_the_run() {
    init_logging();
    let script = parse_script(&one_action(
        r#"Math(name: "m", op: "add", value1: "abc", value2: "1")"#,
    ))
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let err = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "")
        .unwrap_err();
    assert!(matches!(err, RunError::Script(ScriptError::NotANumber { .. })));
}

#[test]
fn sections_are_selected_by_name() {
    init_logging();
    let script = parse_script(
        r#"(actions: [
            (attributes: {"name": "search"}, steps: [Set(name: "a", value: "1")]),
            (attributes: {"name": "details"}, steps: [Set(name: "b", value: "2")]),
        ])"#,
    )
    .unwrap();
    let mut run = ScriptRun::new(&script);
    let sections = Runner::new(&Pages::new(&[]))
        .run_sections(&mut run, "action", "details")
        .unwrap();

    assert_eq!(sections.len(), 1);
    assert_eq!(run.tree().get_variable(sections[0], "b"), "2");
    let search = run.sections("action", "search")[0];
    assert!(!run.tree().has_variable(search, "a"));
}
