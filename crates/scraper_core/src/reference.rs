//! Variable references: `name`, `name[i]`, `name[i][j]` and `:modifier` tags.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use unicode_normalization::UnicodeNormalization;

use engine_logging::engine_error;

static INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\](\[(\d+)\])?").expect("static index pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static tag pattern"));

/// A parsed variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    /// Key of the variable map entry.
    pub key: &'a str,
    /// `[group]` and optional `[item]` selection.
    pub index: Option<(usize, Option<usize>)>,
    pub modifiers: Modifiers<'a>,
}

/// String modifiers, applied in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers<'a> {
    pub safe: bool,
    pub charset: Option<&'a str>,
    pub striptags: bool,
    pub htmldecode: bool,
}

impl<'a> Reference<'a> {
    /// Parses a reference. Blank text is not a reference.
    ///
    /// Everything after the first `:` is modifier text. Index suffixes are only
    /// recognised on undotted names; `movie[0].site_id` is a literal key.
    pub fn parse(text: &'a str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }

        let name = text.split(':').next().unwrap_or(text);
        let mut key = name;
        let mut index = None;
        if !name.contains('.') {
            if let Some(caps) = INDEX.captures(name) {
                let group = parse_index(&caps[1]);
                let item = caps.get(3).map(|m| parse_index(m.as_str()));
                index = Some((group, item));
                if let Some(bracket) = name.find('[') {
                    key = &name[..bracket];
                }
            }
        }

        Some(Self {
            key,
            index,
            modifiers: Modifiers::parse(text),
        })
    }
}

impl<'a> Modifiers<'a> {
    fn parse(text: &'a str) -> Self {
        let charset = text.find(":safe(").and_then(|start| {
            let rest = &text[start + ":safe(".len()..];
            rest.find(')').map(|end| &rest[..end])
        });

        Self {
            safe: text.contains(":safe"),
            charset,
            striptags: text.contains(":striptags"),
            htmldecode: text.contains(":htmldecode"),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.safe && !self.striptags && !self.htmldecode
    }

    pub fn apply(&self, text: String) -> String {
        let mut result = text;
        if self.safe {
            result = make_safe(&result);
            if let Some(charset) = self.charset {
                result = match form_encode(&result, charset) {
                    Some(encoded) => encoded,
                    None => {
                        engine_error!("Unsupported charset {:?} in safe modifier", charset);
                        String::new()
                    }
                };
            }
        }
        if self.striptags {
            result = strip_tags(&result);
        }
        if self.htmldecode {
            result = decode_html(&result);
        }
        result
    }
}

fn parse_index(digits: &str) -> usize {
    // Indices too large to represent are simply out of range.
    digits.parse().unwrap_or(usize::MAX)
}

/// Drops Latin diacritics (U+0300..U+036F after decomposition) and turns
/// spaces into `+`.
pub fn make_safe(text: &str) -> String {
    text.nfd()
        .filter(|c| !('\u{0300}'..='\u{036F}').contains(c))
        .map(|c| if c == ' ' { '+' } else { c })
        .collect()
}

/// Form-url-encodes `text` after converting it to `charset`.
pub fn form_encode(text: &str, charset: &str) -> Option<String> {
    let encoding = encoding_rs::Encoding::for_label(charset.trim().as_bytes())?;
    let (bytes, _, _) = encoding.encode(text);
    Some(url::form_urlencoded::byte_serialize(&bytes).collect())
}

pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Decodes HTML character references, leaving markup untouched.
pub fn decode_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // Escaping `<` keeps tags as text so the parser only resolves references.
    let escaped = text.replace('<', "&lt;");
    let fragment = Html::parse_fragment(&escaped);
    fragment.root_element().text().collect()
}
