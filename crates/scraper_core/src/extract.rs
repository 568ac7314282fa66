use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::ScriptError;
use crate::value::Value;

/// Collects the capture groups of every non-overlapping match of `regex` in
/// `data`, one row per match. Groups that do not participate give empty text.
pub fn parse_input(data: &str, regex: &str) -> Result<Value, ScriptError> {
    let pattern = Regex::new(regex).map_err(|err| ScriptError::invalid_regex(regex, err))?;

    let rows = pattern
        .captures_iter(data)
        .map(|caps| {
            caps.iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(Value::Groups(rows))
}

static GROUP_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\$|\d+)").expect("static group reference pattern"));

/// Replaces every match of `pattern` in `input`; `$1`/`${name}` refer to groups.
///
/// A bare `$1` ends at the last digit, so `$1em` is group 1 followed by `em`.
pub fn replace_all(input: &str, pattern: &str, with: &str) -> Result<String, ScriptError> {
    let regex = Regex::new(pattern).map_err(|err| ScriptError::invalid_regex(pattern, err))?;
    let with = delimit_group_references(with);
    Ok(regex.replace_all(input, with.as_ref()).into_owned())
}

/// Rewrites `$N` as `${N}`; `$$` and `${...}` are left alone.
fn delimit_group_references(with: &str) -> Cow<'_, str> {
    GROUP_REFERENCE.replace_all(with, |caps: &Captures<'_>| match &caps[1] {
        "$" => "$$".to_string(),
        digits => format!("${{{digits}}}"),
    })
}
