// Parser module for extracting declaration models from source files

pub mod ast;
mod typescript;

pub use ast::*;
pub use typescript::DeclarationParser;
