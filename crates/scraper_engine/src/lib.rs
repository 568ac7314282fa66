//! Scraper engine: script loading, page retrieval and item-log replay.
mod decode;
mod fetch;
mod loader;
mod runner;
mod settings;
mod types;

pub use decode::{decode_page, DecodeError, DecodedPage};
pub use fetch::{HttpRetriever, ReqwestFetcher, Retriever};
pub use loader::{
    build_script, escape_literals, load_script, parse_script, ActionDocument, Details, LoadError,
    Published, ScriptDocument, Step, Version,
};
pub use runner::{RunError, Runner, ScriptRun};
pub use settings::{FetchSettings, RunSettings};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, RetrieveRequest};
