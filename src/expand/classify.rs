// Structural type classification and documentation labels.
//
// Classification works over the declaration model rather than rendered type
// text, so an unrelated type whose name happens to contain "[]" or a native
// name never misclassifies.

use crate::graph::TypeGraph;
use crate::parser::{EnumDecl, EnumLiteral, ModuleBody, SourceFile, TypeExpr};

/// Fixed set of native type names, matched case-insensitively
const NATIVE_TYPES: [&str; 5] = ["boolean", "string", "number", "date", "any"];

/// Classification of a property's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Native,
    Enum,
    Object,
    Array,
}

impl PropKind {
    /// Whether expansion should recurse into the type's members
    pub fn is_composite(&self) -> bool {
        matches!(self, PropKind::Object | PropKind::Array)
    }
}

/// A classified type with its documentation label
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: PropKind,
    pub label: String,
}

/// Check a type name against the fixed native set, any casing
pub fn is_native_type(name: &str) -> bool {
    NATIVE_TYPES.iter().any(|n| name.eq_ignore_ascii_case(n))
}

/// Capitalize a type name: first character upper, rest lower
pub fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Classify a property type and derive its label.
///
/// Enum resolution searches the property's namespace scope, then its file's
/// top level, then every loaded file - mirroring how an imported enum is
/// visible at the property's declaration site.
pub fn classify(
    ty: &TypeExpr,
    scope: &ModuleBody,
    file: &SourceFile,
    graph: &TypeGraph,
) -> Classification {
    match ty {
        TypeExpr::Array(_) => Classification {
            kind: PropKind::Array,
            label: "Object[]".to_string(),
        },
        TypeExpr::Object(_) => Classification {
            kind: PropKind::Object,
            label: "Object".to_string(),
        },
        TypeExpr::Named(name) => classify_named(name, scope, file, graph),
        TypeExpr::Other(text) => classify_named(text, scope, file, graph),
    }
}

fn classify_named(
    name: &str,
    scope: &ModuleBody,
    file: &SourceFile,
    graph: &TypeGraph,
) -> Classification {
    if is_native_type(name) {
        return Classification {
            kind: PropKind::Native,
            label: capitalized(name),
        };
    }
    if let Some(decl) = find_enum(name, scope, file, graph) {
        return Classification {
            kind: PropKind::Enum,
            label: enum_label(&decl),
        };
    }
    Classification {
        kind: PropKind::Object,
        label: "Object".to_string(),
    }
}

fn find_enum(
    name: &str,
    scope: &ModuleBody,
    file: &SourceFile,
    graph: &TypeGraph,
) -> Option<EnumDecl> {
    scope
        .enum_decl(name)
        .or_else(|| file.module.enum_decl(name))
        .cloned()
        .or_else(|| graph.find_enum(name))
}

/// Label for an enum type, derived from its literal initializers.
///
/// All-textual literals list as `String=a,b`, all-numeric as `Number=0,1`;
/// mixed or initializer-free enums stay a plain `Enum`.
fn enum_label(decl: &EnumDecl) -> String {
    let mut all_strings = true;
    let mut all_numbers = true;
    let mut literals = Vec::new();

    for member in &decl.members {
        match &member.literal {
            Some(EnumLiteral::Str(text)) => {
                all_numbers = false;
                literals.push(text.as_str());
            }
            Some(EnumLiteral::Num(text)) => {
                all_strings = false;
                literals.push(text.as_str());
            }
            None => {}
        }
    }

    if literals.is_empty() {
        return "Enum".to_string();
    }
    if all_strings {
        return format!("String={}", literals.join(","));
    }
    if all_numbers {
        return format!("Number={}", literals.join(","));
    }
    "Enum".to_string()
}
