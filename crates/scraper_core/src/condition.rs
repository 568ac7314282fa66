//! Single binary comparison: `left op right` with `op` in `!=`, `=`, `<`, `>`.

use std::sync::LazyLock;

use regex::Regex;

use engine_logging::engine_warn;

use crate::error::{parse_number, ScriptError};
use crate::template::{self, Resolver};

// The left operand may not end in `!`, so `a!=b` never reads as `a!` `=` `b`.
static COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*[^!])(!=|=|<|>)(.*)").expect("static comparison pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    NotEqual,
    Equal,
    Less,
    Greater,
}

impl Comparison {
    fn from_operator(op: &str) -> Option<Self> {
        match op {
            "!=" => Some(Comparison::NotEqual),
            "=" => Some(Comparison::Equal),
            "<" => Some(Comparison::Less),
            ">" => Some(Comparison::Greater),
            _ => None,
        }
    }

    /// Compares compiled operands. Ordering comparisons are numeric.
    pub fn evaluate(self, left: &str, right: &str) -> Result<bool, ScriptError> {
        Ok(match self {
            Comparison::NotEqual => left != right,
            Comparison::Equal => left == right,
            Comparison::Less => parse_number(left)? < parse_number(right)?,
            Comparison::Greater => parse_number(left)? > parse_number(right)?,
        })
    }
}

/// Compiles both operands of `text` and compares them.
///
/// Text without a recognised operator is logged and tests false.
pub fn test(text: &str, resolver: &dyn Resolver) -> Result<bool, ScriptError> {
    let Some(caps) = COMPARISON.captures(text) else {
        engine_warn!("test_condition: unsupported condition {:?}", text);
        return Ok(false);
    };
    let Some(comparison) = Comparison::from_operator(&caps[2]) else {
        engine_warn!("test_condition: unsupported operator {:?}", &caps[2]);
        return Ok(false);
    };

    let left = template::compile(&caps[1], resolver);
    let right = template::compile(&caps[3], resolver);
    comparison.evaluate(&left, &right)
}
