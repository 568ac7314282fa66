use std::fmt;
use std::str::FromStr;

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// A declared page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveDescriptor {
    pub url: String,
    pub encoding: Option<String>,
    pub retries: u32,
    pub timeout_ms: u64,
    pub cookies: String,
}

impl RetrieveDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            encoding: None,
            retries: DEFAULT_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cookies: String::new(),
        }
    }

    /// Cookie pairs from the `name=value&name=value` cookie string.
    pub fn cookie_pairs(&self) -> Vec<(String, String)> {
        self.cookies
            .split('&')
            .filter(|pair| !pair.trim().is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                None => (pair.trim().to_string(), String::new()),
            })
            .collect()
    }
}

/// A declared regex extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDescriptor {
    pub input: String,
    pub regex: String,
}

/// A declared regex substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceDescriptor {
    pub input: String,
    pub pattern: String,
    pub with: String,
}

/// A declared arithmetic step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathDescriptor {
    pub op: MathOp,
    pub value1: String,
    pub value2: String,
    pub result_type: ResultType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MathOp {
    pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            MathOp::Add => lhs + rhs,
            MathOp::Subtract => lhs - rhs,
            MathOp::Multiply => lhs * rhs,
            // Non-positive divisors yield zero.
            MathOp::Divide if rhs > 0.0 => lhs / rhs,
            MathOp::Divide => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Subtract => "subtract",
            MathOp::Multiply => "multiply",
            MathOp::Divide => "divide",
        }
    }
}

impl FromStr for MathOp {
    type Err = UnknownMathOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "add" => Ok(MathOp::Add),
            "subtract" => Ok(MathOp::Subtract),
            "multiply" => Ok(MathOp::Multiply),
            "divide" => Ok(MathOp::Divide),
            other => Err(UnknownMathOp(other.to_string())),
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown math operation {0:?}")]
pub struct UnknownMathOp(pub String);

/// Output formatting of a math result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultType {
    #[default]
    Int,
    Float,
}

impl ResultType {
    /// Any tag other than `float` means `int`.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim() == "float" {
            ResultType::Float
        } else {
            ResultType::Int
        }
    }

    /// `Float` keeps one decimal at least (`3.0`, `2.5`) and switches to
    /// `1.0E10` notation outside `[1e-3, 1e7)`; `Int` rounds half up,
    /// saturating at the 32-bit integer range.
    pub fn format(self, value: f32) -> String {
        match self {
            ResultType::Float => format_float(value),
            ResultType::Int => format!("{}", (value + 0.5).floor() as i32),
        }
    }
}

fn format_float(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if value == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return if value.fract() == 0.0 {
            format!("{value:.1}")
        } else {
            value.to_string()
        };
    }
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

/// One entry of a scope's item log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Retrieve(String),
    Set(String),
    Parse(String),
    Replace(String),
    Math(String),
    /// Index of an attached child scope in its parent's child list.
    Content(usize),
}

impl Item {
    pub fn kind(&self) -> &'static str {
        match self {
            Item::Retrieve(_) => "retrieve",
            Item::Set(_) => "set",
            Item::Parse(_) => "parse",
            Item::Replace(_) => "replace",
            Item::Math(_) => "math",
            Item::Content(_) => "content",
        }
    }

    pub fn key(&self) -> String {
        match self {
            Item::Retrieve(name)
            | Item::Set(name)
            | Item::Parse(name)
            | Item::Replace(name)
            | Item::Math(name) => name.clone(),
            Item::Content(index) => index.to_string(),
        }
    }
}
