pub mod completion;
pub mod event;
pub mod project;
pub mod resource;
pub mod symbol;
pub mod warning;

pub use completion::*;
pub use event::*;
pub use project::*;
pub use resource::*;
pub use symbol::*;
pub use warning::*;
