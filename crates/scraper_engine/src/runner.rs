use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use scraper_core::{
    parse_input, parse_number, replace_all, Item, Script, ScopeId, ScopeTree, ScriptError, Value,
};

use crate::{RetrieveRequest, Retriever};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("loop limit {limit:?} is not a number")]
    InvalidLimit { limit: String },
}

/// Per-run copy of a loaded script's scope tree.
///
/// Runs write their results into the tree, so the loaded [`Script`] stays
/// untouched and can seed further runs.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    tree: ScopeTree,
}

impl ScriptRun {
    pub fn new(script: &Script) -> Self {
        Self {
            tree: script.tree().clone(),
        }
    }

    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ScopeTree {
        &mut self.tree
    }

    /// Seeds a variable on the root, visible to every section.
    pub fn set_global(&mut self, name: &str, value: impl Into<Value>) {
        let root = self.tree.root();
        self.tree.set_variable(root, name, value);
    }

    pub fn global(&self, name: &str) -> String {
        self.tree.get_variable(self.tree.root(), name)
    }

    pub fn sections(&self, title: &str, name: &str) -> Vec<ScopeId> {
        self.tree.sections(title, name)
    }
}

/// Replays item logs against a [`Retriever`].
pub struct Runner<'a> {
    retriever: &'a dyn Retriever,
}

impl<'a> Runner<'a> {
    pub fn new(retriever: &'a dyn Retriever) -> Self {
        Self { retriever }
    }

    /// Runs every top-level section titled `title` (filtered by its `name`
    /// attribute when `name` is non-blank) and returns the sections run.
    pub fn run_sections(
        &self,
        run: &mut ScriptRun,
        title: &str,
        name: &str,
    ) -> Result<Vec<ScopeId>, RunError> {
        let sections = run.sections(title, name);
        for &section in &sections {
            engine_info!(
                "Running {} {:?}",
                title,
                run.tree.scope(section).attribute("name")
            );
            self.run(&mut run.tree, section)?;
        }
        Ok(sections)
    }

    pub fn run(&self, tree: &mut ScopeTree, id: ScopeId) -> Result<(), RunError> {
        let items = tree.scope(id).items().to_vec();
        for item in items {
            if tree.debug() {
                engine_debug!("{} : {} : {}", tree.scope(id).name(), item.kind(), item.key());
            }
            match item {
                Item::Retrieve(key) => self.retrieve(tree, id, &key),
                Item::Set(key) => set(tree, id, &key),
                Item::Parse(key) => parse(tree, id, &key)?,
                Item::Replace(key) => replace(tree, id, &key)?,
                Item::Math(key) => math(tree, id, &key)?,
                Item::Content(index) => self.content(tree, id, index)?,
            }
        }
        Ok(())
    }

    fn retrieve(&self, tree: &mut ScopeTree, id: ScopeId, key: &str) {
        let Some(descriptor) = tree.scope(id).retrieve(key).cloned() else {
            return;
        };
        let url = tree.compile_value(id, &descriptor.url);
        if url.is_empty() {
            engine_warn!("Skipping retrieve {key}: url {:?} is empty", descriptor.url);
            return;
        }

        let request = RetrieveRequest {
            url,
            encoding: descriptor
                .encoding
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string),
            timeout: Duration::from_millis(descriptor.timeout_ms),
            cookies: descriptor.cookie_pairs(),
        };
        let page = self.fetch_with_retries(&request, descriptor.retries);

        let name = tree.compile_value(id, key);
        tree.set_global_variable(id, &name, Value::Scalar(page));
    }

    fn fetch_with_retries(&self, request: &RetrieveRequest, retries: u32) -> String {
        for attempt in 1..=retries.saturating_add(1) {
            match self.retriever.retrieve(request) {
                Ok(page) if !page.trim().is_empty() => return flatten_lines(&page),
                Ok(_) => engine_warn!("Attempt {attempt}: {} returned an empty page", request.url),
                Err(err) => engine_warn!("Attempt {attempt}: {} failed: {err}", request.url),
            }
        }
        engine_error!("Giving up on {} after {} attempts", request.url, retries.saturating_add(1));
        String::new()
    }

    fn content(&self, tree: &mut ScopeTree, id: ScopeId, index: usize) -> Result<(), RunError> {
        let Some(child) = tree.scope(id).child(index) else {
            engine_error!("{} has no child #{index}", tree.scope(id).name());
            return Ok(());
        };

        let kind = tree.scope(child).name().to_string();
        match kind.as_str() {
            "if" => {
                let test = tree.scope(child).attribute("test").to_string();
                if !test.trim().is_empty() && tree.test_condition(child, &test)? {
                    self.run(tree, child)?;
                }
            }
            "loop" => self.run_loop(tree, child)?,
            other => engine_debug!("Skipping child scope {other:?}"),
        }
        Ok(())
    }

    fn run_loop(&self, tree: &mut ScopeTree, id: ScopeId) -> Result<(), RunError> {
        let scope = tree.scope(id);
        let name = scope.attribute("name").trim().to_string();
        let on = scope.attribute("on").trim().to_string();
        let limit = scope.attribute("limit").trim().to_string();
        if name.is_empty() || on.is_empty() {
            engine_error!("Loop needs both a name and an on attribute");
            return Ok(());
        }

        let Some(value) = tree.variable(id, &on).filter(|value| !value.is_empty()) else {
            engine_error!("Loop variable {on:?} does not exist");
            return Ok(());
        };

        let rows = value.rows();
        let limit = if limit.is_empty() {
            rows.len()
        } else {
            limit
                .parse::<usize>()
                .map_err(|_| RunError::InvalidLimit { limit })?
        };

        for (count, row) in rows.into_iter().take(limit).enumerate() {
            tree.set_variable(id, &name, row);
            tree.set_variable(id, "count", count.to_string());
            self.run(tree, id)?;
        }
        Ok(())
    }
}

fn set(tree: &mut ScopeTree, id: ScopeId, key: &str) {
    let text = tree.scope(id).set_text(key).to_string();
    let name = tree.compile_value(id, key);
    let value = tree.compile_value(id, &text);
    tree.set_global_variable(id, &name, Value::decode(&value));
}

fn parse(tree: &mut ScopeTree, id: ScopeId, key: &str) -> Result<(), RunError> {
    let Some(descriptor) = tree.scope(id).parse(key).cloned() else {
        return Ok(());
    };
    let name = tree.compile_value(id, key);
    let input = tree.compile_value(id, &descriptor.input);
    let regex = tree.compile_value(id, &descriptor.regex);
    let value = parse_input(&input, &regex)?;
    tree.set_global_variable(id, &name, value);
    Ok(())
}

fn replace(tree: &mut ScopeTree, id: ScopeId, key: &str) -> Result<(), RunError> {
    let Some(descriptor) = tree.scope(id).replace(key).cloned() else {
        return Ok(());
    };
    let name = tree.compile_value(id, key);
    let input = tree.compile_value(id, &descriptor.input);
    let pattern = tree.compile_value(id, &descriptor.pattern);
    let with = tree.compile_value(id, &descriptor.with);
    let result = replace_all(&input, &pattern, &with)?;
    tree.set_global_variable(id, &name, Value::decode(&result));
    Ok(())
}

fn math(tree: &mut ScopeTree, id: ScopeId, key: &str) -> Result<(), RunError> {
    let Some(descriptor) = tree.scope(id).math(key).cloned() else {
        return Ok(());
    };
    let name = tree.compile_value(id, key);
    let lhs = parse_number(&tree.compile_value(id, &descriptor.value1))?;
    let rhs = parse_number(&tree.compile_value(id, &descriptor.value2))?;
    let result = descriptor.result_type.format(descriptor.op.apply(lhs, rhs));
    tree.set_global_variable(id, &name, Value::Scalar(result));
    Ok(())
}

/// Drops carriage returns and turns line feeds into spaces.
fn flatten_lines(page: &str) -> String {
    page.chars()
        .filter(|&c| c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::flatten_lines;

    #[test]
    fn line_breaks_become_spaces() {
        assert_eq!(flatten_lines("a\r\nb\nc"), "a b c");
        assert_eq!(flatten_lines("plain"), "plain");
    }
}
