use engine_logging::engine_debug;

use crate::condition;
use crate::descriptor::Item;
use crate::error::ScriptError;
use crate::reference::Reference;
use crate::scope::{Scope, ScopeId};
use crate::template::{self, Resolver};
use crate::value::Value;

/// Name of the root scope.
pub const GLOBAL_SCOPE: &str = "global";
/// Scopes with this name keep global writes issued inside them.
pub const ACTION_SCOPE: &str = "action";

/// Arena of scopes. Children are owned by the tree and listed by their
/// parent; a scope's parent is a plain index used for chain lookups.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    debug: bool,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(GLOBAL_SCOPE, None)],
            debug: false,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// # Panics
    /// If `id` was not issued by this tree (or a clone of it).
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// # Panics
    /// If `id` was not issued by this tree (or a clone of it).
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    /// Attaches a new child scope and logs it in the parent's item log.
    pub fn add_scope(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(name, Some(parent)));

        let parent_scope = &mut self.scopes[parent.0];
        let index = parent_scope.children.len();
        parent_scope.children.push(id);
        parent_scope.items.push(Item::Content(index));
        if self.debug {
            engine_debug!(
                "add_scope: {} attached to {} at index {}",
                name,
                self.scopes[parent.0].name(),
                index
            );
        }
        id
    }

    /// The scope itself followed by its ancestors up to the root.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |current| self.scopes[current.0].parent)
    }

    /// Top-level scopes named `title` whose `name` attribute matches `name`
    /// (any when `name` is blank).
    pub fn sections(&self, title: &str, name: &str) -> Vec<ScopeId> {
        self.scope(self.root())
            .children()
            .iter()
            .copied()
            .filter(|child| {
                let scope = self.scope(*child);
                scope.name() == title && (name.trim().is_empty() || scope.attribute("name") == name)
            })
            .collect()
    }

    /// Resolves `name` along the scope chain, modifiers applied.
    pub fn variable(&self, id: ScopeId, name: &str) -> Option<Value> {
        let reference = Reference::parse(name)?;
        let value = self
            .ancestors(id)
            .find_map(|scope| self.scopes[scope.0].lookup(&reference))?;
        if reference.modifiers.is_empty() {
            return Some(value);
        }
        Some(Value::Scalar(
            reference.modifiers.apply(value.encode().into_owned()),
        ))
    }

    /// Chain lookup rendered as text; unresolved names give empty string.
    pub fn get_variable(&self, id: ScopeId, name: &str) -> String {
        let result = self
            .variable(id, name)
            .map(|value| value.encode().into_owned())
            .unwrap_or_default();
        if self.debug {
            engine_debug!(
                "get_variable: {} in {}: {:?}",
                name,
                self.scope(id).name(),
                result
            );
        }
        result
    }

    pub fn has_variable(&self, id: ScopeId, name: &str) -> bool {
        let Some(reference) = Reference::parse(name) else {
            return false;
        };
        self.ancestors(id)
            .any(|scope| self.scopes[scope.0].lookup(&reference).is_some())
    }

    /// Binds `name` on the scope itself. Blank names are ignored.
    pub fn set_variable(&mut self, id: ScopeId, name: &str, value: impl Into<Value>) {
        if name.trim().is_empty() {
            return;
        }
        let value = value.into();
        if self.debug {
            engine_debug!(
                "set_variable to {}: name: {} value: {:?}",
                self.scope(id).name(),
                name,
                value
            );
        }
        self.scopes[id.0].insert_variable(name, value);
    }

    pub fn get_global_variable(&self, _id: ScopeId, name: &str) -> String {
        self.get_variable(self.root(), name)
    }

    pub fn has_global_variable(&self, _id: ScopeId, name: &str) -> bool {
        self.has_variable(self.root(), name)
    }

    /// Writes a global binding.
    ///
    /// Writes travel toward the root one scope at a time but stop at the first
    /// scope named `"action"`, which keeps the binding; otherwise they land
    /// on the root.
    pub fn set_global_variable(&mut self, id: ScopeId, name: &str, value: impl Into<Value>) {
        if name.trim().is_empty() {
            return;
        }
        let target = self.global_write_target(id);
        self.set_variable(target, name, value);
    }

    /// Scope that receives a global write issued from `id`.
    pub fn global_write_target(&self, id: ScopeId) -> ScopeId {
        self.ancestors(id)
            .find(|scope| {
                let scope = &self.scopes[scope.0];
                scope.parent.is_none() || scope.name() == ACTION_SCOPE
            })
            .unwrap_or(self.root())
    }

    /// A resolver bound to one scope.
    pub fn view(&self, id: ScopeId) -> ScopeView<'_> {
        ScopeView { tree: self, id }
    }

    pub fn compile_value(&self, id: ScopeId, text: &str) -> String {
        let compiled = template::compile(text, &self.view(id));
        if self.debug {
            engine_debug!("compile_value: {:?} compiled: {:?}", text, compiled);
        }
        compiled
    }

    pub fn test_condition(&self, id: ScopeId, text: &str) -> Result<bool, ScriptError> {
        let result = condition::test(text, &self.view(id))?;
        if self.debug {
            engine_debug!("test_condition: {:?} in {}: {}", text, self.scope(id).name(), result);
        }
        Ok(result)
    }
}

/// Placeholder lookup from one scope: the global binding when there is one,
/// otherwise the scope chain.
#[derive(Debug, Clone, Copy)]
pub struct ScopeView<'a> {
    tree: &'a ScopeTree,
    id: ScopeId,
}

impl ScopeView<'_> {
    pub fn id(&self) -> ScopeId {
        self.id
    }
}

impl Resolver for ScopeView<'_> {
    fn resolve(&self, name: &str) -> Option<String> {
        if self.tree.has_global_variable(self.id, name) {
            Some(self.tree.get_global_variable(self.id, name))
        } else if self.tree.has_variable(self.id, name) {
            Some(self.tree.get_variable(self.id, name))
        } else {
            None
        }
    }
}
