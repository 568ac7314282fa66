use std::collections::HashMap;

use crate::descriptor::{
    Item, MathDescriptor, ParseDescriptor, ReplaceDescriptor, RetrieveDescriptor,
};
use crate::reference::Reference;
use crate::value::Value;

/// Index of a scope inside its [`ScopeTree`](crate::ScopeTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the scope tree: its own bindings and declarations.
///
/// Nothing here looks past the scope itself; chain and global resolution live
/// on the tree.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    name: String,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: Vec<ScopeId>,
    attributes: HashMap<String, String>,
    variables: HashMap<String, Value>,
    sets: HashMap<String, String>,
    retrieves: HashMap<String, RetrieveDescriptor>,
    parses: HashMap<String, ParseDescriptor>,
    replaces: HashMap<String, ReplaceDescriptor>,
    maths: HashMap<String, MathDescriptor>,
    pub(crate) items: Vec<Item>,
}

impl Scope {
    pub(crate) fn new(name: &str, parent: Option<ScopeId>) -> Self {
        let mut scope = Self {
            parent,
            ..Self::default()
        };
        scope.set_name(name);
        scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names are fixed once non-blank; blank names are ignored.
    pub fn set_name(&mut self, name: &str) -> bool {
        if name.trim().is_empty() || !self.name.trim().is_empty() {
            return false;
        }
        self.name = name.to_string();
        true
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<ScopeId> {
        self.children.get(index).copied()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Returns the attribute or empty string.
    pub fn attribute(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        if !name.trim().is_empty() {
            self.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Variables bound directly on this scope.
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub(crate) fn insert_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// Resolves `reference` against this scope only. An out-of-range index is a miss.
    pub(crate) fn lookup(&self, reference: &Reference<'_>) -> Option<Value> {
        let value = self.variables.get(reference.key)?;
        match reference.index {
            Some((group, item)) => value.select(group, item),
            None => Some(value.clone()),
        }
    }

    /// Returns the `set` template or empty string.
    pub fn set_text(&self, name: &str) -> &str {
        self.sets.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn define_set(&mut self, name: &str, value: impl Into<String>) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        if self.sets.insert(name.to_string(), value.into()).is_none() {
            self.items.push(Item::Set(name.to_string()));
        }
        true
    }

    pub fn retrieve(&self, name: &str) -> Option<&RetrieveDescriptor> {
        self.retrieves.get(name)
    }

    pub fn define_retrieve(&mut self, name: &str, retrieve: RetrieveDescriptor) -> bool {
        if name.trim().is_empty() || retrieve.url.trim().is_empty() {
            return false;
        }
        if self.retrieves.insert(name.to_string(), retrieve).is_none() {
            self.items.push(Item::Retrieve(name.to_string()));
        }
        true
    }

    pub fn parse(&self, name: &str) -> Option<&ParseDescriptor> {
        self.parses.get(name)
    }

    pub fn define_parse(&mut self, name: &str, parse: ParseDescriptor) -> bool {
        if name.trim().is_empty() || parse.input.trim().is_empty() {
            return false;
        }
        if self.parses.insert(name.to_string(), parse).is_none() {
            self.items.push(Item::Parse(name.to_string()));
        }
        true
    }

    pub fn replace(&self, name: &str) -> Option<&ReplaceDescriptor> {
        self.replaces.get(name)
    }

    pub fn define_replace(&mut self, name: &str, replace: ReplaceDescriptor) -> bool {
        if [name, replace.input.as_str(), replace.pattern.as_str(), replace.with.as_str()]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return false;
        }
        if self.replaces.insert(name.to_string(), replace).is_none() {
            self.items.push(Item::Replace(name.to_string()));
        }
        true
    }

    pub fn math(&self, name: &str) -> Option<&MathDescriptor> {
        self.maths.get(name)
    }

    pub fn define_math(&mut self, name: &str, math: MathDescriptor) -> bool {
        if [name, math.value1.as_str(), math.value2.as_str()]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return false;
        }
        if self.maths.insert(name.to_string(), math).is_none() {
            self.items.push(Item::Math(name.to_string()));
        }
        true
    }
}
