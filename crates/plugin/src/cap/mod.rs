pub mod manifest;
pub mod resource_type;

pub use manifest::*;
pub use resource_type::*;
