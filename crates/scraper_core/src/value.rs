use std::borrow::Cow;
use std::fmt;

/// Terminates every item in the legacy string encoding.
pub const ITEM_DELIMITER: &str = ",-=<>=-,";
/// Terminates every group (row) in the legacy string encoding.
pub const GROUP_DELIMITER: &str = ";-=<>=-;";

/// A script value.
///
/// Extraction produces rows of capture groups, so besides plain text a value
/// can hold a flat item list or a list of groups. The delimiter-encoded string
/// form only appears where values meet templates (see [`Value::encode`] and
/// [`Value::decode`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Items(Vec<String>),
    Groups(Vec<Vec<String>>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(String::new())
    }
}

impl Value {
    /// Decodes legacy delimiter-encoded text. Text with neither delimiter is a scalar.
    pub fn decode(text: &str) -> Self {
        if text.contains(GROUP_DELIMITER) {
            Value::Groups(split_terminated(text, GROUP_DELIMITER).map(decode_items).collect())
        } else if text.contains(ITEM_DELIMITER) {
            Value::Items(decode_items(text))
        } else {
            Value::Scalar(text.to_string())
        }
    }

    /// Renders the value in the legacy delimiter encoding.
    pub fn encode(&self) -> Cow<'_, str> {
        match self {
            Value::Scalar(text) => Cow::Borrowed(text),
            Value::Items(items) => Cow::Owned(encode_items(items)),
            Value::Groups(groups) => {
                let mut out = String::new();
                for group in groups {
                    out.push_str(&encode_items(group));
                    out.push_str(GROUP_DELIMITER);
                }
                Cow::Owned(out)
            }
        }
    }

    /// Selects `[group]` or `[group][item]`.
    ///
    /// On grouped values `[i]` is a row and `[i][j]` an item of that row. On
    /// item lists and scalars only `[i]` is meaningful; a scalar acts as a
    /// one-item list.
    pub fn select(&self, group: usize, item: Option<usize>) -> Option<Value> {
        match self {
            Value::Groups(groups) => {
                let row = groups.get(group)?;
                match item {
                    Some(item) => row.get(item).cloned().map(Value::Scalar),
                    None => Some(Value::Items(row.clone())),
                }
            }
            Value::Items(items) => match item {
                Some(_) => None,
                None => items.get(group).cloned().map(Value::Scalar),
            },
            Value::Scalar(text) => match (group, item) {
                (0, None) => Some(Value::Scalar(text.clone())),
                _ => None,
            },
        }
    }

    /// Rows a loop iterates over: each group of a grouped value, otherwise the value itself.
    pub fn rows(&self) -> Vec<Value> {
        match self {
            Value::Groups(groups) => groups.iter().cloned().map(Value::Items).collect(),
            other => vec![other.clone()],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Scalar(text) => text.is_empty(),
            Value::Items(items) => items.is_empty(),
            Value::Groups(groups) => groups.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(text)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::Items(items)
    }
}

impl From<Vec<Vec<String>>> for Value {
    fn from(groups: Vec<Vec<String>>) -> Self {
        Value::Groups(groups)
    }
}

fn encode_items(items: &[String]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item);
        out.push_str(ITEM_DELIMITER);
    }
    out
}

fn decode_items(text: &str) -> Vec<String> {
    split_terminated(text, ITEM_DELIMITER).map(str::to_string).collect()
}

/// Splits delimiter-terminated text. One trailing delimiter is dropped first;
/// empty input has no parts.
fn split_terminated<'a>(text: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> {
    let body = text.strip_suffix(delimiter).unwrap_or(text);
    let empty = text.is_empty();
    body.split(delimiter).filter(move |_| !empty)
}
