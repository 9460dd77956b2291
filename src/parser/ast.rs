// Declaration model for parsed TypeScript type-declaration files.
//
// These types capture just enough structure to resolve and flatten interface
// declarations: namespaces, interfaces with inheritance, enums, property
// signatures, and imports. They are designed to be serializable for caching
// and debugging.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed declaration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFile {
    /// Absolute path the file was loaded from
    pub path: PathBuf,
    /// Import statements, in declaration order
    pub imports: Vec<Import>,
    /// Top-level declarations
    pub module: ModuleBody,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            imports: Vec::new(),
            module: ModuleBody::default(),
        }
    }

    /// Check if the file declares anything we care about
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.module.is_empty()
    }
}

/// Declarations scoped to a file top level or a namespace body.
///
/// Doubles as the namespace context for qualified-name resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleBody {
    pub interfaces: Vec<Interface>,
    pub enums: Vec<EnumDecl>,
    pub namespaces: Vec<Namespace>,
}

impl ModuleBody {
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.enums.is_empty() && self.namespaces.is_empty()
    }

    /// Find an interface declared directly in this scope
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Find a child namespace declared directly in this scope
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|n| n.name == name)
    }

    /// Find an enum declared directly in this scope
    pub fn enum_decl(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.name == name)
    }
}

/// A namespace declaration (`namespace Foo { ... }`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub body: ModuleBody,
    pub line: usize,
}

impl Namespace {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            body: ModuleBody::default(),
            line,
        }
    }
}

/// An interface declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interface {
    pub name: String,
    /// Extended type names as written, in declared order
    pub extends: Vec<String>,
    /// Property signatures, in declaration order
    pub properties: Vec<Property>,
    pub line: usize,
}

impl Interface {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            extends: Vec::new(),
            properties: Vec::new(),
            line,
        }
    }
}

/// A property signature inside an interface or anonymous object type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub name: String,
    /// Declared with a question token
    pub optional: bool,
    pub ty: TypeExpr,
    /// Preceding block documentation comment, cleaned
    pub doc: Option<String>,
    /// Trailing same-line comment, cleaned
    pub trailing: Option<String>,
    pub line: usize,
}

impl Property {
    pub fn new(name: &str, ty: TypeExpr, line: usize) -> Self {
        Self {
            name: name.to_string(),
            optional: false,
            ty,
            doc: None,
            trailing: None,
            line,
        }
    }

    /// Documentation text for this property.
    ///
    /// A trailing same-line comment wins over a preceding block comment.
    pub fn description(&self) -> Option<&str> {
        self.trailing.as_deref().or(self.doc.as_deref())
    }
}

/// A property's declared type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TypeExpr {
    /// A type reference by name, possibly dotted (`Person`, `Ns.Person`, `string`)
    Named(String),
    /// An array type (`T[]` or `Array<T>`)
    Array(Box<TypeExpr>),
    /// An anonymous object type with its member signatures
    Object(Vec<Property>),
    /// Anything else (unions, literals, mapped types), kept as rendered text
    Other(String),
}

impl TypeExpr {
    /// The referenced type name, looking through one level of array
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) => Some(name),
            TypeExpr::Array(inner) => match inner.as_ref() {
                TypeExpr::Named(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Member signatures of an anonymous object type, looking through arrays
    pub fn object_members(&self) -> Option<&[Property]> {
        match self {
            TypeExpr::Object(members) => Some(members),
            TypeExpr::Array(inner) => inner.object_members(),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeExpr::Array(_))
    }

    /// Render the type roughly as written, for diagnostics
    pub fn render(&self) -> String {
        match self {
            TypeExpr::Named(name) => name.clone(),
            TypeExpr::Array(inner) => format!("{}[]", inner.render()),
            TypeExpr::Object(_) => "object".to_string(),
            TypeExpr::Other(text) => text.clone(),
        }
    }
}

/// An enum declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub line: usize,
}

impl EnumDecl {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            line,
        }
    }
}

/// A single enum member with its literal initializer, if any
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub literal: Option<EnumLiteral>,
}

/// A literal enum initializer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EnumLiteral {
    /// String literal, quotes stripped
    Str(String),
    /// Numeric literal, as written
    Num(String),
}

impl EnumLiteral {
    pub fn text(&self) -> &str {
        match self {
            EnumLiteral::Str(s) => s,
            EnumLiteral::Num(n) => n,
        }
    }
}

/// An import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Import {
    /// Module specifier as written, quotes stripped
    pub module: String,
    /// Named import bindings as visible in the importing file
    pub names: Vec<String>,
    pub line: usize,
}

impl Import {
    pub fn new(module: &str, names: Vec<String>, line: usize) -> Self {
        Self {
            module: module.to_string(),
            names,
            line,
        }
    }

    /// Whether the module specifier is a relative path
    pub fn is_relative(&self) -> bool {
        self.module.starts_with('.')
    }
}
