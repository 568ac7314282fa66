use std::collections::BTreeMap;

use serde_json::{json, Value as Json};

use scraper_core::{ScopeId, Value};
use scraper_engine::ScriptRun;

/// One entry per executed section: its `name` attribute and its variables.
pub fn sections_report(run: &ScriptRun, sections: &[ScopeId]) -> Json {
    let entries = sections
        .iter()
        .map(|&id| {
            let scope = run.tree().scope(id);
            let variables: BTreeMap<&str, Json> = scope
                .variables()
                .iter()
                .map(|(name, value)| (name.as_str(), to_json(value)))
                .collect();
            json!({
                "name": scope.attribute("name"),
                "variables": variables,
            })
        })
        .collect();
    Json::Array(entries)
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Scalar(text) => json!(text),
        Value::Items(items) => json!(items),
        Value::Groups(groups) => json!(groups),
    }
}
