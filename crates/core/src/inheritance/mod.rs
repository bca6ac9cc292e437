//! Project inheritance: the parent graph and shadow resolution over it.

pub mod graph;
pub mod resolver;

pub use graph::{AncestorChain, InheritanceGraph};
pub use resolver::{AncestorLayer, InheritanceResolver};
