//! Scraper core: the script model.
//!
//! Scopes, values, the `${...}` template compiler, the condition evaluator,
//! regex extraction and the declarative operation descriptors. Nothing here
//! performs I/O; a driver replays each scope's item log.
mod condition;
mod descriptor;
mod error;
mod extract;
mod reference;
mod scope;
mod script;
mod template;
mod tree;
mod value;

pub use condition::{test as test_condition, Comparison};
pub use descriptor::{
    Item, MathDescriptor, MathOp, ParseDescriptor, ReplaceDescriptor, ResultType,
    RetrieveDescriptor, UnknownMathOp, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS,
};
pub use error::{parse_number, ScriptError};
pub use extract::{parse_input, replace_all};
pub use reference::{decode_html, form_encode, make_safe, strip_tags, Modifiers, Reference};
pub use scope::{Scope, ScopeId};
pub use script::Script;
pub use template::{compile, Resolver};
pub use tree::{ScopeTree, ScopeView, ACTION_SCOPE, GLOBAL_SCOPE};
pub use value::{Value, GROUP_DELIMITER, ITEM_DELIMITER};
