// TypeScript declaration parser using tree-sitter.
//
// Extracts interfaces, enums, namespaces, and imports from .ts/.d.ts sources.
// JavaScript sources parse too (annotations may live in .js files), they just
// carry no type declarations.

use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Parser for TypeScript/JavaScript declaration sources
pub struct DeclarationParser {
    ts_parser: Parser,
    js_parser: Parser,
}

impl DeclarationParser {
    /// Create a new declaration parser
    pub fn new() -> Result<Self> {
        let mut ts_parser = Parser::new();
        let ts_language = tree_sitter_typescript::language_typescript();
        ts_parser
            .set_language(&ts_language)
            .map_err(|e| Error::Parser(format!("Failed to set TypeScript language: {}", e)))?;

        let mut js_parser = Parser::new();
        let js_language = tree_sitter_javascript::language();
        js_parser
            .set_language(&js_language)
            .map_err(|e| Error::Parser(format!("Failed to set JavaScript language: {}", e)))?;

        Ok(Self { ts_parser, js_parser })
    }

    /// Parse a declaration file from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        self.parse_source(&source, path.to_path_buf())
    }

    /// Parse declaration source text
    pub fn parse_source(&mut self, source: &str, path: PathBuf) -> Result<SourceFile> {
        let parser = if is_javascript(&path) {
            &mut self.js_parser
        } else {
            &mut self.ts_parser
        };

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(&path, "tree-sitter failed to parse"))?;

        let mut file = SourceFile::new(path);
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.visit_top_level(&child, source.as_bytes(), &mut file);
        }

        Ok(file)
    }

    /// Visit a top-level statement
    fn visit_top_level(&self, node: &Node, source: &[u8], file: &mut SourceFile) {
        match node.kind() {
            "import_statement" => {
                if let Some(import) = parse_import(node, source) {
                    file.imports.push(import);
                }
            }
            // export / declare wrappers - recurse into the declaration.
            // A bare `namespace X {}` is wrapped by the grammar in an
            // `expression_statement`, so recurse through that too.
            "export_statement" | "ambient_declaration" | "expression_statement" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.visit_top_level(&child, source, file);
                }
            }
            _ => visit_declaration(node, source, &mut file.module),
        }
    }
}

/// File extensions handled by the JavaScript grammar
fn is_javascript(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("js" | "jsx" | "mjs" | "cjs")
    )
}

/// Visit a declaration statement inside a file or namespace scope
fn visit_declaration(node: &Node, source: &[u8], scope: &mut ModuleBody) {
    match node.kind() {
        "interface_declaration" => {
            if let Some(interface) = parse_interface(node, source) {
                scope.interfaces.push(interface);
            }
        }
        "enum_declaration" => {
            if let Some(decl) = parse_enum(node, source) {
                scope.enums.push(decl);
            }
        }
        "internal_module" | "module" => {
            if let Some(namespace) = parse_namespace(node, source) {
                scope.namespaces.push(namespace);
            }
        }
        "export_statement" | "ambient_declaration" | "expression_statement" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                visit_declaration(&child, source, scope);
            }
        }
        _ => {}
    }
}

/// Parse an interface declaration
fn parse_interface(node: &Node, source: &[u8]) -> Option<Interface> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut interface = Interface::new(&name, node.start_position().row + 1);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            // Grammar versions differ on the clause node name
            "extends_type_clause" | "extends_clause" => {
                let mut clause_cursor = child.walk();
                for clause_child in child.named_children(&mut clause_cursor) {
                    match clause_child.kind() {
                        "type_identifier" | "nested_type_identifier" | "identifier" => {
                            interface
                                .extends
                                .push(get_text(&clause_child, source).to_string());
                        }
                        "generic_type" => {
                            if let Some(name_node) = clause_child.child_by_field_name("name") {
                                interface
                                    .extends
                                    .push(get_text(&name_node, source).to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            "interface_body" | "object_type" => {
                interface.properties = parse_object_members(&child, source);
            }
            _ => {}
        }
    }

    Some(interface)
}

/// Parse the member signatures of an interface body or anonymous object type
fn parse_object_members(body: &Node, source: &[u8]) -> Vec<Property> {
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() == "property_signature" {
            if let Some(property) = parse_property(&child, source) {
                members.push(property);
            }
        }
        // method_signature, index_signature, call_signature carry no
        // documentable parameter shape and are skipped
    }
    members
}

/// Parse a single property signature
fn parse_property(node: &Node, source: &[u8]) -> Option<Property> {
    let name_node = node.child_by_field_name("name")?;
    let name = strip_quotes(get_text(&name_node, source)).to_string();

    let ty = node
        .child_by_field_name("type")
        .and_then(|annotation| first_type_child(&annotation))
        .map(|type_node| parse_type_expr(&type_node, source))
        .unwrap_or_else(|| TypeExpr::Other("any".to_string()));

    let mut property = Property::new(&name, ty, node.start_position().row + 1);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "?" {
            property.optional = true;
        }
    }

    property.doc = leading_doc(node, source);
    property.trailing = trailing_comment(node, source);

    Some(property)
}

/// First named non-comment child of a type annotation
fn first_type_child<'a>(annotation: &Node<'a>) -> Option<Node<'a>> {
    let mut cursor = annotation.walk();
    let children: Vec<Node> = annotation.named_children(&mut cursor).collect();
    children.into_iter().find(|c| c.kind() != "comment")
}

/// Parse a type expression node into the declaration model
fn parse_type_expr(node: &Node, source: &[u8]) -> TypeExpr {
    match node.kind() {
        "predefined_type" | "type_identifier" | "nested_type_identifier" => {
            TypeExpr::Named(get_text(node, source).to_string())
        }
        "array_type" => {
            let inner = first_type_child(node)
                .map(|n| parse_type_expr(&n, source))
                .unwrap_or_else(|| TypeExpr::Other(get_text(node, source).to_string()));
            TypeExpr::Array(Box::new(inner))
        }
        "generic_type" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| get_text(&n, source).to_string())
                .unwrap_or_default();
            if name == "Array" {
                let inner = node
                    .child_by_field_name("type_arguments")
                    .and_then(|args| first_type_child(&args))
                    .map(|n| parse_type_expr(&n, source));
                if let Some(inner) = inner {
                    return TypeExpr::Array(Box::new(inner));
                }
            }
            TypeExpr::Named(name)
        }
        "object_type" => TypeExpr::Object(parse_object_members(node, source)),
        "parenthesized_type" => first_type_child(node)
            .map(|n| parse_type_expr(&n, source))
            .unwrap_or_else(|| TypeExpr::Other(get_text(node, source).to_string())),
        _ => TypeExpr::Other(get_text(node, source).to_string()),
    }
}

/// Parse an enum declaration
fn parse_enum(node: &Node, source: &[u8]) -> Option<EnumDecl> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut decl = EnumDecl::new(&name, node.start_position().row + 1);

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "enum_assignment" => {
                    let member_name = child
                        .child_by_field_name("name")
                        .map(|n| strip_quotes(get_text(&n, source)).to_string());
                    if let Some(member_name) = member_name {
                        let literal = child
                            .child_by_field_name("value")
                            .and_then(|v| parse_enum_literal(&v, source));
                        decl.members.push(EnumMember {
                            name: member_name,
                            literal,
                        });
                    }
                }
                "property_identifier" | "string" => {
                    decl.members.push(EnumMember {
                        name: strip_quotes(get_text(&child, source)).to_string(),
                        literal: None,
                    });
                }
                _ => {}
            }
        }
    }

    Some(decl)
}

/// Parse an enum member initializer into a literal, if it is one
fn parse_enum_literal(node: &Node, source: &[u8]) -> Option<EnumLiteral> {
    match node.kind() {
        "string" => Some(EnumLiteral::Str(
            strip_quotes(get_text(node, source)).to_string(),
        )),
        "number" => Some(EnumLiteral::Num(get_text(node, source).to_string())),
        "unary_expression" => {
            // Negative numeric initializers like -1
            let text = get_text(node, source);
            if text.chars().skip(1).all(|c| c.is_ascii_digit() || c == '.') {
                Some(EnumLiteral::Num(text.to_string()))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Parse a namespace declaration, expanding dotted names into nesting
fn parse_namespace(node: &Node, source: &[u8]) -> Option<Namespace> {
    let name_node = node.child_by_field_name("name")?;
    let name = get_text(&name_node, source).to_string();
    let line = node.start_position().row + 1;

    let mut body = ModuleBody::default();
    if let Some(body_node) = node.child_by_field_name("body") {
        let mut cursor = body_node.walk();
        for child in body_node.children(&mut cursor) {
            visit_declaration(&child, source, &mut body);
        }
    }

    // `namespace A.B { ... }` declares B inside A
    let mut segments = name.split('.').rev();
    let leaf_name = segments.next()?;
    let mut namespace = Namespace::new(leaf_name, line);
    namespace.body = body;
    for outer in segments {
        let mut wrapper = Namespace::new(outer, line);
        wrapper.body.namespaces.push(namespace);
        namespace = wrapper;
    }

    Some(namespace)
}

/// Parse an import statement, collecting the local binding names
fn parse_import(node: &Node, source: &[u8]) -> Option<Import> {
    let mut module = String::new();
    let mut names = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string" => {
                module = strip_quotes(get_text(&child, source)).to_string();
            }
            "import_clause" => {
                let mut clause_cursor = child.walk();
                for clause_child in child.children(&mut clause_cursor) {
                    match clause_child.kind() {
                        "identifier" => {
                            // Default import
                            names.push(get_text(&clause_child, source).to_string());
                        }
                        "named_imports" => {
                            let mut named_cursor = clause_child.walk();
                            for named_child in clause_child.children(&mut named_cursor) {
                                if named_child.kind() != "import_specifier" {
                                    continue;
                                }
                                // The local binding is the alias when present
                                let binding = named_child
                                    .child_by_field_name("alias")
                                    .or_else(|| named_child.child_by_field_name("name"));
                                if let Some(binding) = binding {
                                    names.push(get_text(&binding, source).to_string());
                                }
                            }
                        }
                        "namespace_import" => {
                            if let Some(name_node) = clause_child.child_by_field_name("name") {
                                names.push(get_text(&name_node, source).to_string());
                            } else {
                                // Grammar variants expose the binding as a bare child
                                let mut ns_cursor = clause_child.walk();
                                for ns_child in clause_child.named_children(&mut ns_cursor) {
                                    if ns_child.kind() == "identifier" {
                                        names.push(get_text(&ns_child, source).to_string());
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    if module.is_empty() {
        return None;
    }

    Some(Import::new(&module, names, node.start_position().row + 1))
}

/// Preceding block documentation comment, if one belongs to this node
fn leading_doc(node: &Node, source: &[u8]) -> Option<String> {
    let mut prev = node.prev_sibling();
    while let Some(p) = prev {
        match p.kind() {
            ";" | "," => prev = p.prev_sibling(),
            "comment" => {
                let text = get_text(&p, source);
                if !text.starts_with("/**") {
                    return None;
                }
                // A block comment on the same line as the previous member is
                // that member's trailing comment, not our documentation
                if let Some(before) = p.prev_sibling() {
                    if before.end_position().row == p.start_position().row {
                        return None;
                    }
                }
                if p.end_position().row >= node.start_position().row {
                    return None;
                }
                let cleaned = clean_block_comment(text);
                return if cleaned.is_empty() { None } else { Some(cleaned) };
            }
            _ => return None,
        }
    }
    None
}

/// Trailing same-line comment, if present
fn trailing_comment(node: &Node, source: &[u8]) -> Option<String> {
    let row = node.end_position().row;
    let mut next = node.next_sibling();
    while let Some(n) = next {
        match n.kind() {
            ";" | "," => next = n.next_sibling(),
            "comment" if n.start_position().row == row => {
                let cleaned = clean_trailing_comment(get_text(&n, source));
                return if cleaned.is_empty() { None } else { Some(cleaned) };
            }
            _ => return None,
        }
    }
    None
}

/// Get text content of a node
fn get_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// Strip one layer of matching quotes
fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Clean a `/** ... */` comment to its description text
fn clean_block_comment(comment: &str) -> String {
    comment
        .trim_start_matches("/**")
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.starts_with('@'))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Clean a trailing `// ...` or `/* ... */` comment
fn clean_trailing_comment(comment: &str) -> String {
    if let Some(rest) = comment.strip_prefix("//") {
        return rest.trim().to_string();
    }
    comment
        .trim_start_matches("/*")
        .trim_end_matches("*/")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceFile {
        let mut parser = DeclarationParser::new().unwrap();
        parser
            .parse_source(source, PathBuf::from("test.ts"))
            .unwrap()
    }

    #[test]
    fn test_parse_interface_properties() {
        let file = parse(
            r#"
export interface Person {
  name: string
  age?: number
  dateOfBirth: Date
}
"#,
        );

        assert_eq!(file.module.interfaces.len(), 1);
        let person = &file.module.interfaces[0];
        assert_eq!(person.name, "Person");
        assert_eq!(person.properties.len(), 3);
        assert_eq!(person.properties[0].name, "name");
        assert!(!person.properties[0].optional);
        assert!(person.properties[1].optional);
        assert_eq!(
            person.properties[2].ty,
            TypeExpr::Named("Date".to_string())
        );
    }

    #[test]
    fn test_parse_extends_in_order() {
        let file = parse(
            r#"
interface Shape { color: string }
interface Skill { level: number }
interface ShapedSkill extends Skill, Shape { }
"#,
        );

        let shaped = file.module.interface("ShapedSkill").unwrap();
        assert_eq!(shaped.extends, vec!["Skill", "Shape"]);
        assert!(shaped.properties.is_empty());
    }

    #[test]
    fn test_parse_array_types() {
        let file = parse(
            r#"
interface Employer {
  skills: Skill[]
  picks: Array<Pick>
}
"#,
        );

        let employer = &file.module.interfaces[0];
        assert_eq!(
            employer.properties[0].ty,
            TypeExpr::Array(Box::new(TypeExpr::Named("Skill".to_string())))
        );
        assert_eq!(
            employer.properties[1].ty,
            TypeExpr::Array(Box::new(TypeExpr::Named("Pick".to_string())))
        );
    }

    #[test]
    fn test_parse_anonymous_object_type() {
        let file = parse(
            r#"
interface Person {
  address: {
    address_line_1: string
    postcode?: number
  }
}
"#,
        );

        let address = &file.module.interfaces[0].properties[0];
        let members = address.ty.object_members().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "address_line_1");
        assert!(members[1].optional);
    }

    #[test]
    fn test_parse_doc_comments() {
        let file = parse(
            r#"
interface Employer {
  /**
   * The job title string
   */
  jobTitle?: string
  level: number // seniority level
}
"#,
        );

        let props = &file.module.interfaces[0].properties;
        assert_eq!(props[0].doc.as_deref(), Some("The job title string"));
        assert_eq!(props[0].trailing, None);
        assert_eq!(props[1].trailing.as_deref(), Some("seniority level"));
    }

    #[test]
    fn test_trailing_wins_over_doc() {
        let file = parse(
            r#"
interface Skill {
  /**
   * Block documentation
   */
  description: string // short note
}
"#,
        );

        let prop = &file.module.interfaces[0].properties[0];
        assert_eq!(prop.description(), Some("short note"));
    }

    #[test]
    fn test_parse_namespace() {
        let file = parse(
            r#"
export namespace CustomNamespace {
  interface InternalInterface {
    internal_id: string
  }

  export interface PublicInterface extends InternalInterface {
    public_id: string
  }
}
"#,
        );

        let ns = file.module.namespace("CustomNamespace").unwrap();
        assert!(ns.body.interface("InternalInterface").is_some());
        assert!(ns.body.interface("PublicInterface").is_some());
    }

    #[test]
    fn test_parse_dotted_namespace() {
        let file = parse(
            r#"
namespace Api.Models {
  export interface User { id: string }
}
"#,
        );

        let api = file.module.namespace("Api").unwrap();
        let models = api.body.namespace("Models").unwrap();
        assert!(models.body.interface("User").is_some());
    }

    #[test]
    fn test_parse_string_enum() {
        let file = parse(
            r#"
enum Level {
  High = 'HIGH',
  Low = 'LOW'
}
"#,
        );

        let level = file.module.enum_decl("Level").unwrap();
        assert_eq!(level.members.len(), 2);
        assert_eq!(
            level.members[0].literal,
            Some(EnumLiteral::Str("HIGH".to_string()))
        );
    }

    #[test]
    fn test_parse_numeric_enum() {
        let file = parse(
            r#"
enum Rank {
  First = 0,
  Second = 1
}
"#,
        );

        let rank = file.module.enum_decl("Rank").unwrap();
        assert_eq!(
            rank.members[1].literal,
            Some(EnumLiteral::Num("1".to_string()))
        );
    }

    #[test]
    fn test_parse_plain_enum() {
        let file = parse("enum Direction { Up, Down }");
        let direction = file.module.enum_decl("Direction").unwrap();
        assert_eq!(direction.members.len(), 2);
        assert!(direction.members[0].literal.is_none());
    }

    #[test]
    fn test_parse_imports() {
        let file = parse(
            r#"
import { Location, SearchAttributes as Attrs } from './interfaces2'
import { Person } from '@app/models/person'
"#,
        );

        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].module, "./interfaces2");
        assert_eq!(file.imports[0].names, vec!["Location", "Attrs"]);
        assert!(file.imports[0].is_relative());
        assert_eq!(file.imports[1].module, "@app/models/person");
        assert!(!file.imports[1].is_relative());
    }

    #[test]
    fn test_parse_generic_interface_reference() {
        let file = parse(
            r#"
interface Wrapper {
  value: Box<string>
}
"#,
        );

        let prop = &file.module.interfaces[0].properties[0];
        assert_eq!(prop.ty, TypeExpr::Named("Box".to_string()));
    }

    #[test]
    fn test_parse_union_is_other() {
        let file = parse(
            r#"
interface Flexible {
  value: string | number
}
"#,
        );

        let prop = &file.module.interfaces[0].properties[0];
        assert!(matches!(prop.ty, TypeExpr::Other(_)));
    }

    #[test]
    fn test_javascript_source_has_no_declarations() {
        let mut parser = DeclarationParser::new().unwrap();
        let file = parser
            .parse_source("const x = 1;\n", PathBuf::from("code.js"))
            .unwrap();
        assert!(file.module.is_empty());
    }

    #[test]
    fn test_clean_block_comment() {
        let text = "/**\n * The name of the person\n * @deprecated\n */";
        assert_eq!(clean_block_comment(text), "The name of the person");
    }

    #[test]
    fn test_clean_trailing_comment() {
        assert_eq!(clean_trailing_comment("// description"), "description");
        assert_eq!(clean_trailing_comment("/* note */"), "note");
    }
}
