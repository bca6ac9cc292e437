//! Script symbol extraction, per-project module indexes and completion.

pub mod completion;
pub mod merge;
pub mod parser;

pub use completion::query_completions;
pub use merge::{ModuleLayer, merge_module_indexes};
pub use parser::SymbolIndexer;
