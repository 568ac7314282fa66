//! RON script documents.
//!
//! A document looks like:
//!
//! ```ron
//! (
//!     details: (name: "Example", type: "MovieDetailsFetcher", version: Some((major: 1, minor: 0, point: 2))),
//!     actions: [
//!         (
//!             attributes: {"name": "search"},
//!             steps: [
//!                 Retrieve(name: "page", url: "http://example.org/?q=${title:safe}"),
//!                 Parse(name: "rows", input: "${page}", regex: "<li>(.*?)</li>"),
//!                 Loop(name: "row", on: "rows", limit: Some(5), steps: [
//!                     Set(name: "title_${count}", value: "${row[0]}"),
//!                 ]),
//!             ],
//!         ),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use engine_logging::{engine_info, engine_warn};
use scraper_core::{
    MathDescriptor, MathOp, ParseDescriptor, ReplaceDescriptor, ResultType, RetrieveDescriptor,
    Script, ScopeId, ScopeTree, UnknownMathOp, ACTION_SCOPE, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS,
};

static LITERAL_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\\[AbBEGQzZ])").expect("static escape pattern"));

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read script {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed script: {0}")]
    Syntax(#[from] ron::error::SpannedError),
    #[error(transparent)]
    MathOp(#[from] UnknownMathOp),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub actions: Vec<ActionDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Details {
    pub name: String,
    pub author: String,
    pub description: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub language: String,
    pub version: Option<Version>,
    pub published: Option<Published>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub point: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Published {
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDocument {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Set {
        name: String,
        value: String,
    },
    Retrieve {
        name: String,
        url: String,
        #[serde(default)]
        encoding: Option<String>,
        #[serde(default)]
        retries: Option<u32>,
        #[serde(default)]
        timeout: Option<u64>,
        #[serde(default)]
        cookies: String,
    },
    Parse {
        name: String,
        input: String,
        regex: String,
    },
    Replace {
        name: String,
        input: String,
        pattern: String,
        with: String,
    },
    Math {
        name: String,
        op: String,
        value1: String,
        value2: String,
        #[serde(default)]
        result_type: String,
    },
    If {
        test: String,
        #[serde(default)]
        steps: Vec<Step>,
    },
    Loop {
        name: String,
        on: String,
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        steps: Vec<Step>,
    },
}

pub fn load_script(path: &Path) -> Result<Script, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let script = parse_script(&text)?;
    engine_info!("Loaded script {:?} from {:?}", script.name(), path);
    Ok(script)
}

pub fn parse_script(text: &str) -> Result<Script, LoadError> {
    let document: ScriptDocument = ron::from_str(text)?;
    build_script(&document)
}

pub fn build_script(document: &ScriptDocument) -> Result<Script, LoadError> {
    let mut script = Script::new();
    script.set_debug(document.debug);

    let details = &document.details;
    script.set_name(&details.name);
    script.set_kind(&details.kind);
    script.author = details.author.clone();
    script.description = details.description.clone();
    script.id = details.id.clone();
    script.language = details.language.clone();
    if let Some(version) = details.version {
        script.version = format!("{}.{}.{}", version.major, version.minor, version.point);
    }
    if let Some(published) = details.published {
        script.published = format!("{}.{}.{}", published.day, published.month, published.year);
    }

    for action in &document.actions {
        let section = script.add_section(ACTION_SCOPE);
        let tree = script.tree_mut();
        for (name, value) in &action.attributes {
            tree.scope_mut(section).set_attribute(name, value.as_str());
        }
        fill_steps(tree, section, &action.steps)?;
    }
    Ok(script)
}

fn fill_steps(tree: &mut ScopeTree, id: ScopeId, steps: &[Step]) -> Result<(), LoadError> {
    for step in steps {
        let scope = tree.scope_mut(id);
        let defined = match step {
            Step::Set { name, value } => scope.define_set(name, value.as_str()),
            Step::Retrieve {
                name,
                url,
                encoding,
                retries,
                timeout,
                cookies,
            } => scope.define_retrieve(
                name,
                RetrieveDescriptor {
                    url: url.clone(),
                    encoding: encoding.clone(),
                    retries: retries.unwrap_or(DEFAULT_RETRIES),
                    timeout_ms: timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
                    cookies: cookies.clone(),
                },
            ),
            Step::Parse { name, input, regex } => scope.define_parse(
                name,
                ParseDescriptor {
                    input: input.clone(),
                    regex: escape_literals(regex),
                },
            ),
            Step::Replace {
                name,
                input,
                pattern,
                with,
            } => scope.define_replace(
                name,
                ReplaceDescriptor {
                    input: input.clone(),
                    pattern: pattern.clone(),
                    with: with.clone(),
                },
            ),
            Step::Math {
                name,
                op,
                value1,
                value2,
                result_type,
            } => scope.define_math(
                name,
                MathDescriptor {
                    op: op.parse::<MathOp>()?,
                    value1: value1.clone(),
                    value2: value2.clone(),
                    result_type: ResultType::from_tag(result_type),
                },
            ),
            Step::If { test, steps } => {
                let child = tree.add_scope(id, "if");
                tree.scope_mut(child).set_attribute("test", test.as_str());
                fill_steps(tree, child, steps)?;
                true
            }
            Step::Loop {
                name,
                on,
                limit,
                steps,
            } => {
                let child = tree.add_scope(id, "loop");
                let scope = tree.scope_mut(child);
                scope.set_attribute("name", name.as_str());
                scope.set_attribute("on", on.as_str());
                if let Some(limit) = limit {
                    scope.set_attribute("limit", limit.to_string());
                }
                fill_steps(tree, child, steps)?;
                true
            }
        };
        if !defined {
            engine_warn!("Ignoring incomplete step {step:?}");
        }
    }
    Ok(())
}

/// Doubles the backslash of `\A \b \B \E \G \Q \z \Z` so they match literally.
pub fn escape_literals(regex: &str) -> String {
    LITERAL_ESCAPE.replace_all(regex, r"\$1").into_owned()
}
