pub mod registration;
pub mod resource_type;

pub use registration::builtin_caps;
