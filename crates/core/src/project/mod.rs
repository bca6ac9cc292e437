pub mod discovery;
pub mod scanner;
pub mod watcher;

pub use discovery::{DiscoveredProject, discover_projects, read_project};
pub use scanner::{ProjectScanner, ScanOutput, content_hash};
