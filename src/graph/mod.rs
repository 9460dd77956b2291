// Type declaration graph: file cache, user-defined tracking, name resolution

pub mod loader;
pub mod resolve;

pub use loader::TypeGraph;
pub use resolve::{lookup_interface, resolve_path_alias, resolve_qualified, ResolvedName};
