use crate::scope::ScopeId;
use crate::tree::ScopeTree;

/// A loaded script: descriptive metadata plus the scope tree.
#[derive(Debug, Clone, Default)]
pub struct Script {
    name: String,
    pub author: String,
    pub description: String,
    pub id: String,
    pub version: String,
    pub published: String,
    kind: String,
    pub language: String,
    tree: ScopeTree,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blank names are ignored.
    pub fn set_name(&mut self, name: &str) {
        if !name.trim().is_empty() {
            self.name = name.to_string();
        }
    }

    /// The script `type`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Blank types are ignored.
    pub fn set_kind(&mut self, kind: &str) {
        if !kind.trim().is_empty() {
            self.kind = kind.to_string();
        }
    }

    pub fn debug(&self) -> bool {
        self.tree.debug()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.tree.set_debug(debug);
    }

    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ScopeTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> ScopeTree {
        self.tree
    }

    /// Attaches a new top-level section under the root.
    pub fn add_section(&mut self, name: &str) -> ScopeId {
        let root = self.tree.root();
        self.tree.add_scope(root, name)
    }

    /// See [`ScopeTree::sections`].
    pub fn sections(&self, title: &str, name: &str) -> Vec<ScopeId> {
        self.tree.sections(title, name)
    }
}
