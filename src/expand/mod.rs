// Directive expansion: interface flattening and symbol-level object walking.
//
// Expansion is a read over the declaration graph. Every resolution failure is
// local - the affected branch is skipped with a diagnostic and the rest of
// the expansion (and the documentation run) continues.

pub mod classify;
pub mod element;

pub use classify::{classify, is_native_type, Classification, PropKind};
pub use element::Element;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::directive::{match_array_target, Directive};
use crate::expand::element::{format_description, format_param_line};
use crate::graph::{lookup_interface, resolve_path_alias, resolve_qualified, TypeGraph};
use crate::parser::{Interface, ModuleBody, Property, SourceFile, TypeExpr};
use classify::capitalized;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Element name the host tool assigns to our annotation
pub const CUSTOM_ELEMENT_NAME: &str = "apiinterface";

/// Budget for anonymous/external nesting, the backstop against reference
/// cycles the visiting set cannot see
const MAX_NESTING_DEPTH: usize = 64;

/// Expands parsed annotations into documentation elements.
///
/// Owns the declaration graph, which is built lazily on the first expansion
/// and reused for every one after - the caching strategy for a whole
/// documentation run. Construct one per process, or per test.
#[derive(Default)]
pub struct Expander {
    graph: Option<TypeGraph>,
}

impl Expander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already-constructed graph (preloaded ambient context, custom
    /// project configuration)
    pub fn with_graph(graph: TypeGraph) -> Self {
        Self { graph: Some(graph) }
    }

    pub fn graph(&self) -> Option<&TypeGraph> {
        self.graph.as_ref()
    }

    /// Host hook entry: act on a discovered annotation element.
    ///
    /// Only elements named [`CUSTOM_ELEMENT_NAME`] are acted on. The trigger
    /// element is removed from `elements` and the generated elements are
    /// spliced in at the point of removal.
    pub fn parse_elements(
        &mut self,
        elements: &mut Vec<Element>,
        element: &Element,
        _block: &str,
        filename: &Path,
        sink: &mut dyn DiagnosticSink,
    ) {
        if element.name != CUSTOM_ELEMENT_NAME {
            return;
        }

        let generated = self.expand(element.content.trim(), filename, sink);
        match elements.iter().position(|e| e == element) {
            Some(i) => {
                elements.splice(i..=i, generated);
            }
            None => elements.extend(generated),
        }
    }

    /// Expand one annotation body into documentation elements.
    ///
    /// Failures yield an empty vector with warnings recorded on `sink`;
    /// expansion itself never aborts the run.
    pub fn expand(
        &mut self,
        content: &str,
        filename: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<Element> {
        let directive = match Directive::parse(content, sink) {
            Some(directive) => directive,
            None => return Vec::new(),
        };

        // Build the graph on first use, discovering project configuration
        // relative to the annotation's own file
        if self.graph.is_none() {
            match TypeGraph::for_anchor(filename) {
                Ok(graph) => self.graph = Some(graph),
                Err(e) => {
                    sink.warn(Diagnostic::new(format!(
                        "could not initialize declaration graph: {}",
                        e
                    )));
                    return Vec::new();
                }
            }
        }
        let graph = self.graph.as_mut().expect("graph initialized above");

        let target_path = match &directive.path {
            Some(path) => filename.parent().unwrap_or(Path::new("")).join(path),
            None => filename.to_path_buf(),
        };
        let root_file = match graph.load_file(&target_path, sink) {
            Some(file) => file,
            None => return Vec::new(),
        };

        let mut out = Vec::new();
        let mut expansion = Expansion {
            graph,
            sink,
            directive: &directive,
            guard: WalkGuard::default(),
        };
        expansion.expand_target(&root_file, &mut out);
        out
    }
}

/// Guard threaded through every recursive call: a revisit set for named
/// interfaces plus a remaining-depth budget for everything else
#[derive(Default)]
struct WalkGuard {
    visiting: Vec<(PathBuf, String)>,
    depth: usize,
}

impl WalkGuard {
    fn descend(&mut self) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }
}

/// One directive expansion in flight
struct Expansion<'a> {
    graph: &'a mut TypeGraph,
    sink: &'a mut dyn DiagnosticSink,
    directive: &'a Directive,
    guard: WalkGuard,
}

impl Expansion<'_> {
    /// Resolve the directive's target in the root file and dispatch on its
    /// form: native leaf, array request, or plain interface
    fn expand_target(&mut self, root_file: &Arc<SourceFile>, out: &mut Vec<Element>) {
        let (base_target, wants_array) = match match_array_target(&self.directive.target) {
            Some(inner) => (inner.to_string(), true),
            None => (self.directive.target.clone(), false),
        };

        let resolved = resolve_qualified(&root_file.module, &base_target, &root_file.path, self.sink);

        if !wants_array && is_native_type(&resolved.leaf) {
            let line = format!("{{{}}} {}", capitalized(&resolved.leaf), self.directive.kind);
            out.push(Element::new(&line, self.directive.kind));
            return;
        }

        if let Some(scope) = resolved.scope {
            if wants_array {
                match scope.interface(&resolved.leaf) {
                    Some(interface) => {
                        let kind_name = self.directive.kind.as_str();
                        let line = format!("{{Object[]}} {} {}", kind_name, kind_name);
                        out.push(Element::new(&line, self.directive.kind));
                        self.expand_interface(interface, scope, root_file, out, Some(kind_name));
                    }
                    None => self.sink.warn_in(
                        format!("could not find interface «{}»", resolved.leaf),
                        &root_file.path,
                    ),
                }
                return;
            }

            if let Some(interface) = scope.interface(&resolved.leaf) {
                self.expand_interface(interface, scope, root_file, out, None);
                return;
            }
        }

        // Direct resolution failed: retry once through a module-path alias
        let alias_path = resolve_path_alias(root_file.as_ref(), &base_target, self.graph.config());
        if let Some(alias_path) = alias_path {
            if let Some(aliased) = self.graph.load_file(&alias_path, self.sink) {
                let resolved =
                    resolve_qualified(&aliased.module, &base_target, &aliased.path, self.sink);
                if let Some(interface) =
                    resolved.scope.and_then(|scope| scope.interface(&resolved.leaf))
                {
                    let scope = resolved.scope.expect("interface found in scope");
                    self.expand_interface(interface, scope, &aliased, out, None);
                    return;
                }
                self.sink.warn_in(
                    format!("could not find interface «{}»", self.directive.target),
                    &aliased.path,
                );
            }
            return;
        }

        self.sink.warn_in(
            format!("could not find interface «{}»", self.directive.target),
            &root_file.path,
        );
    }

    /// Flatten an interface: inherited properties first (depth-first through
    /// the extends chain, declared order), then own properties, all at the
    /// same nesting level.
    fn expand_interface(
        &mut self,
        interface: &Interface,
        scope: &ModuleBody,
        file: &Arc<SourceFile>,
        out: &mut Vec<Element>,
        prefix: Option<&str>,
    ) {
        let key = (file.path.clone(), interface.name.clone());
        if self.guard.visiting.contains(&key) {
            self.sink.warn_in(
                format!(
                    "cyclic reference to «{}», stopping expansion of this branch",
                    interface.name
                ),
                &file.path,
            );
            return;
        }
        self.guard.visiting.push(key);

        for extended in &interface.extends {
            // Resolved against the interface's own namespace scope; a missing
            // target skips this branch only
            let resolved = resolve_qualified(scope, extended, &file.path, self.sink);
            if let Some(parent_scope) = resolved.scope {
                match parent_scope.interface(&resolved.leaf) {
                    Some(parent) => {
                        self.expand_interface(parent, parent_scope, file, out, prefix);
                    }
                    None => self.sink.warn_in(
                        format!("could not find extended interface «{}»", extended),
                        &file.path,
                    ),
                }
            }
        }

        for property in &interface.properties {
            self.emit_property(property, scope, file, None, out, prefix);
        }

        self.guard.visiting.pop();
    }

    /// Walk member signatures that have no resolvable named interface:
    /// anonymous object types and externally-declared members. Members whose
    /// declaring file is not user-defined are omitted entirely.
    fn walk_properties(
        &mut self,
        members: &[Property],
        scope: &ModuleBody,
        file: &Arc<SourceFile>,
        declaring: &Path,
        out: &mut Vec<Element>,
        prefix: &str,
    ) {
        for property in members {
            self.emit_property(property, scope, file, Some(declaring), out, Some(prefix));
        }
    }

    /// Emit one documentation element for a property, then recurse into its
    /// members when the type is composite
    fn emit_property(
        &mut self,
        property: &Property,
        scope: &ModuleBody,
        file: &Arc<SourceFile>,
        declaring: Option<&Path>,
        out: &mut Vec<Element>,
        prefix: Option<&str>,
    ) {
        if let Some(declaring) = declaring {
            if !self.graph.is_user_defined(declaring) {
                return;
            }
        }

        let qualified = match prefix {
            Some(prefix) => format!("{}.{}", prefix, property.name),
            None => property.name.clone(),
        };
        let description = format_description(&qualified, property.description());
        let classification = classify(&property.ty, scope, file.as_ref(), self.graph);

        // The directive's nest prefix applies to the emitted path exactly
        // once; it never enters the description or the recursion prefix
        let path = match &self.directive.nest {
            Some(nest) => format!("{}.{}", nest, qualified),
            None => qualified.clone(),
        };
        let line = format_param_line(&classification.label, &path, property.optional, &description);
        out.push(Element::new(&line, self.directive.kind));

        if classification.kind.is_composite() {
            self.expand_composite(&property.ty, scope, file, out, &qualified);
        }
    }

    /// Recurse into a composite property type. Resolution strategies, in
    /// order: anonymous members, named interface in the current scope, named
    /// interface at the file top level, interface of the same name in any
    /// other loaded file (walked with that file as the declaring file).
    fn expand_composite(
        &mut self,
        ty: &TypeExpr,
        scope: &ModuleBody,
        file: &Arc<SourceFile>,
        out: &mut Vec<Element>,
        prefix: &str,
    ) {
        if !self.guard.descend() {
            self.sink.warn_in(
                format!("nesting budget exhausted at «{}», stopping this branch", prefix),
                &file.path,
            );
            return;
        }

        if let Some(members) = ty.object_members() {
            let declaring = file.path.clone();
            self.walk_properties(members, scope, file, &declaring, out, prefix);
        } else if let Some(name) = ty.base_name() {
            if let Some((inner_scope, interface)) = lookup_interface(scope, name) {
                self.expand_interface(interface, inner_scope, file, out, Some(prefix));
            } else if let Some((inner_scope, interface)) = lookup_interface(&file.module, name) {
                self.expand_interface(interface, inner_scope, file, out, Some(prefix));
            } else if let Some(external) = self.graph.find_interface(name) {
                if let Some(interface) = external.module.interface(name) {
                    let declaring = external.path.clone();
                    self.walk_properties(
                        &interface.properties,
                        &external.module,
                        &external,
                        &declaring,
                        out,
                        prefix,
                    );
                }
            }
        }

        self.guard.ascend();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::diagnostics::Diagnostics;
    use crate::directive::ElementKind;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn expand_in(dir: &TempDir, file: &str, content: &str) -> (Vec<Element>, Diagnostics) {
        let mut expander = Expander::new();
        let mut sink = Diagnostics::new();
        let elements = expander.expand(content, &dir.path().join(file), &mut sink);
        (elements, sink)
    }

    fn contents(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.content.trim_end()).collect()
    }

    #[test]
    fn test_flat_interface_in_declaration_order() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            r#"
export interface Account {
  id: string
  balance: number
  active: boolean
}
"#,
        );

        let (elements, sink) = expand_in(&dir, "api.ts", "{apiParam::Account}");
        assert!(sink.is_empty());
        assert_eq!(
            contents(&elements),
            vec![
                "{String} id `id`",
                "{Number} balance `balance`",
                "{Boolean} active `active`",
            ]
        );
    }

    #[test]
    fn test_optional_properties_bracketed() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            "export interface Opts { required: string\n  maybe?: number }",
        );

        let (elements, _) = expand_in(&dir, "api.ts", "{Opts}");
        assert_eq!(
            contents(&elements),
            vec!["{String} required `required`", "{Number} [maybe] `maybe`"]
        );
    }

    #[test]
    fn test_extends_chain_ancestors_first() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "shapes.ts",
            r#"
export interface Shape {
  color: string
  radius: number
}

export interface Square extends Shape {
  sideLength: number
}

export interface InnerSquare extends Square {
  bottomLength: number
}
"#,
        );

        let (elements, sink) = expand_in(&dir, "shapes.ts", "{InnerSquare}");
        assert!(sink.is_empty());
        assert_eq!(
            contents(&elements),
            vec![
                "{String} color `color`",
                "{Number} radius `radius`",
                "{Number} sideLength `sideLength`",
                "{Number} bottomLength `bottomLength`",
            ]
        );
    }

    #[test]
    fn test_multiple_extends_in_declared_order() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "shapes.ts",
            r#"
export interface Skill { level: number }
export interface Shape { color: string }
export interface ShapedSkill extends Skill, Shape { }
"#,
        );

        let (elements, _) = expand_in(&dir, "shapes.ts", "{ShapedSkill}");
        assert_eq!(
            contents(&elements),
            vec!["{Number} level `level`", "{String} color `color`"]
        );
    }

    #[test]
    fn test_missing_extends_skips_branch_only() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            r#"
export interface Known { a: string }
export interface Both extends Ghost, Known { own: number }
"#,
        );

        let (elements, sink) = expand_in(&dir, "api.ts", "{Both}");
        assert_eq!(
            contents(&elements),
            vec!["{String} a `a`", "{Number} own `own`"]
        );
        assert_eq!(sink.len(), 1);
        assert!(sink.warnings()[0].message.contains("Ghost"));
    }

    #[test]
    fn test_nest_prefix_applied_once() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            r#"
export interface Inner { value: string }
export interface Outer { inner: Inner }
"#,
        );

        let (elements, _) = expand_in(&dir, "api.ts", "{Outer} [payload]");
        assert_eq!(
            contents(&elements),
            vec![
                "{Object} payload.inner `inner`",
                "{String} payload.inner.value `inner.value`",
            ]
        );
    }

    #[test]
    fn test_namespaced_target() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "ns.ts",
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

        let (elements, sink) =
            expand_in(&dir, "ns.ts", "{apiSuccess::CustomNamespace.PublicInterface}");
        assert!(sink.is_empty());
        assert_eq!(
            contents(&elements),
            vec![
                "{String} internal_id `internal_id`",
                "{String} public_id `public_id`",
            ]
        );
    }

    #[test]
    fn test_native_target() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "api.ts", "export interface Unused { a: string }");

        let (elements, sink) = expand_in(&dir, "api.ts", "{apiSuccess::string}");
        assert!(sink.is_empty());
        assert_eq!(contents(&elements), vec!["{String} apiSuccess"]);
    }

    #[test]
    fn test_array_target_emits_root_element() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            "export interface Person { name: string }",
        );

        let (elements, sink) = expand_in(&dir, "api.ts", "{apiSuccess::Person[]}");
        assert!(sink.is_empty());
        assert_eq!(
            contents(&elements),
            vec![
                "{Object[]} apiSuccess apiSuccess",
                "{String} apiSuccess.name `apiSuccess.name`",
            ]
        );
    }

    #[test]
    fn test_generic_array_target() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            "export interface Person { name: string }",
        );

        let (elements, _) = expand_in(&dir, "api.ts", "{apiBody::Array<Person>}");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].content, "{Object[]} apiBody apiBody\n");
    }

    #[test]
    fn test_unresolvable_target_zero_elements_one_warning() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "api.ts", "export interface Known { a: string }");

        let (elements, sink) = expand_in(&dir, "api.ts", "{apiSuccess::DoesNotExist}");
        assert!(elements.is_empty());
        assert_eq!(sink.len(), 1);
        assert!(sink.warnings()[0].message.contains("DoesNotExist"));
    }

    #[test]
    fn test_path_override() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "types/models.ts",
            "export interface Model { id: string }",
        );
        write(dir.path(), "routes/handler.ts", "// annotations live here");

        let (elements, sink) =
            expand_in(&dir, "routes/handler.ts", "(../types/models.ts) {apiParam::Model}");
        assert!(sink.is_empty());
        assert_eq!(contents(&elements), vec!["{String} id `id`"]);
    }

    #[test]
    fn test_descriptions_from_comments() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            r#"
export interface Skill {
  /**
   * Skill description
   */
  description: string // short note
  level: number
}
"#,
        );

        let (elements, _) = expand_in(&dir, "api.ts", "{Skill}");
        assert_eq!(
            contents(&elements),
            vec![
                "{String} description `description` - short note",
                "{Number} level `level`",
            ]
        );
    }

    #[test]
    fn test_self_referential_interface_stops() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tree.ts",
            "export interface Node { name: string\n  parent: Node }",
        );

        let (elements, sink) = expand_in(&dir, "tree.ts", "{Node}");
        assert_eq!(
            contents(&elements),
            vec!["{String} name `name`", "{Object} parent `parent`"]
        );
        assert_eq!(sink.len(), 1);
        assert!(sink.warnings()[0].message.contains("cyclic"));
    }

    #[test]
    fn test_mutual_recursion_stops() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pair.ts",
            r#"
export interface Ping { pong: Pong }
export interface Pong { ping: Ping }
"#,
        );

        let (elements, sink) = expand_in(&dir, "pair.ts", "{Ping}");
        assert_eq!(
            contents(&elements),
            vec!["{Object} pong `pong`", "{Object} pong.ping `pong.ping`"]
        );
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_ambient_members_omitted() {
        let dir = TempDir::new().unwrap();
        let lib = write(
            dir.path(),
            "lib.d.ts",
            "interface External { secret: string }",
        );
        write(
            dir.path(),
            "api.ts",
            "export interface Wrapper { ext: External }",
        );

        let mut graph = TypeGraph::new(ProjectConfig::default()).unwrap();
        let mut sink = Diagnostics::new();
        graph.add_ambient(&lib, &mut sink).unwrap();

        let mut expander = Expander::with_graph(graph);
        let elements = expander.expand("{Wrapper}", &dir.path().join("api.ts"), &mut sink);

        // The external interface is found in ambient context, but its
        // members are not user-defined and are omitted entirely
        assert_eq!(contents(&elements), vec!["{Object} ext `ext`"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_imported_interface_members_included() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "other.ts",
            "export interface Extra { tag: string }",
        );
        write(
            dir.path(),
            "api.ts",
            "import { Extra } from './other'\nexport interface Wrapper { extra: Extra }",
        );

        let (elements, sink) = expand_in(&dir, "api.ts", "{Wrapper}");
        assert!(sink.is_empty());
        assert_eq!(
            contents(&elements),
            vec!["{Object} extra `extra`", "{String} extra.tag `extra.tag`"]
        );
    }

    #[test]
    fn test_determinism() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            r#"
export interface Inner { value: string }
export interface Outer {
  inner: Inner
  count: number
}
"#,
        );

        let mut expander = Expander::new();
        let mut sink = Diagnostics::new();
        let first = expander.expand("{Outer}", &dir.path().join("api.ts"), &mut sink);
        let second = expander.expand("{Outer}", &dir.path().join("api.ts"), &mut sink);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_elements_splices_in_place() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "api.ts",
            "export interface Pair { a: string\n  b: number }",
        );

        let trigger = Element {
            content: "{apiParam::Pair}".to_string(),
            name: CUSTOM_ELEMENT_NAME.to_string(),
            source: "@apiInterface {apiParam::Pair}".to_string(),
            source_name: "apiInterface".to_string(),
        };
        let before = Element::new("{String} before `before`", ElementKind::Param);
        let after = Element::new("{String} after `after`", ElementKind::Param);
        let mut elements = vec![before.clone(), trigger.clone(), after.clone()];

        let mut expander = Expander::new();
        let mut sink = Diagnostics::new();
        expander.parse_elements(
            &mut elements,
            &trigger,
            "",
            &dir.path().join("api.ts"),
            &mut sink,
        );

        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0], before);
        assert_eq!(elements[1].content, "{String} a `a`\n");
        assert_eq!(elements[2].content, "{Number} b `b`\n");
        assert_eq!(elements[3], after);
    }

    #[test]
    fn test_parse_elements_ignores_other_elements() {
        let dir = TempDir::new().unwrap();
        let other = Element::new("{String} x `x`", ElementKind::Param);
        let mut elements = vec![other.clone()];

        let mut expander = Expander::new();
        let mut sink = Diagnostics::new();
        expander.parse_elements(
            &mut elements,
            &other,
            "",
            &dir.path().join("api.ts"),
            &mut sink,
        );

        assert_eq!(elements, vec![other]);
    }

    #[test]
    fn test_malformed_directive_drops_quietly() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "api.ts", "export interface A { a: string }");

        let (elements, sink) = expand_in(&dir, "api.ts", "not a directive");
        assert!(elements.is_empty());
        assert_eq!(sink.len(), 1);
    }
}
