//! `${...}` placeholder compiler.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Stands in for literal `$` while placeholders are resolved.
const DOLLAR_SENTINEL: &str = "__DOLLAR_SIGN__";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__DOLLAR_SIGN__\{([^{}]+)\}").expect("static placeholder pattern")
});

/// Source of placeholder values.
pub trait Resolver {
    /// Text bound to `name`, or `None` when nothing is bound.
    fn resolve(&self, name: &str) -> Option<String>;
}

impl Resolver for std::collections::HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolves every `${name}` in `text`, innermost first, until a pass makes
/// no progress, then normalizes whitespace around `|` alternatives.
///
/// Substituted text is never rescanned for placeholders: only `$` signs that
/// were in the original text can open one.
pub fn compile(text: &str, resolver: &dyn Resolver) -> String {
    let mut current = text.replace('$', DOLLAR_SENTINEL);

    while current.contains(DOLLAR_SENTINEL) {
        let mut substituted = false;
        let next = PLACEHOLDER.replace_all(&current, |caps: &Captures<'_>| {
            match resolver.resolve(&caps[1]) {
                Some(value) => {
                    substituted = true;
                    value
                }
                None => caps[0].to_string(),
            }
        });
        let next = next.into_owned();

        if !substituted {
            current = next.replace(DOLLAR_SENTINEL, "$");
            break;
        }
        current = next;
    }

    normalize(&current)
}

/// Trims the text and each `|` alternative, dropping empty alternatives.
fn normalize(text: &str) -> String {
    let trimmed = trim_control(text);
    if !trimmed.contains('|') {
        return trimmed.to_string();
    }
    trimmed
        .split('|')
        .map(trim_control)
        .filter(|alternative| !alternative.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

/// Strips leading and trailing characters up to and including U+0020.
pub(crate) fn trim_control(text: &str) -> &str {
    text.trim_matches(|c: char| c <= ' ')
}
