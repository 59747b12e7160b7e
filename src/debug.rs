//! Debug rendering of a resolved scope graph
//!
//! Produces a deterministic, nested description of a scope: its definitions
//! (with the references bound to each), its imports and its child scopes.
//! Everything is sorted by range, so the output does not depend on capture
//! or traversal order. Each entry shows one line of source context with the
//! interesting range fenced by `§`:
//!
//! ```text
//! scope {
//!     definitions: [
//!         x {
//!             kind: variable,
//!             context: let §x§ = 1;,
//!             referenced in (1): [
//!                 `print(§x§);`,
//!             ],
//!         },
//!     ],
//!     child scopes: [],
//! }
//! ```

use crate::namespace::NameSpaces;
use crate::node::NodeKind;
use crate::range::TextRange;
use crate::scope::ScopeGraph;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::fmt;

const INDENT: &str = "    ";

/// A reference, shown by its context line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefDebug {
    pub context: String,
}

impl fmt::Display for RefDebug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.context)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefDebug {
    pub name: String,
    pub kind: String,
    pub context: String,
    pub range: TextRange,
    pub references: Vec<RefDebug>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDebug {
    pub name: String,
    pub context: String,
    pub range: TextRange,
    pub references: Vec<RefDebug>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeDebug {
    pub range: TextRange,
    pub definitions: Vec<DefDebug>,
    pub imports: Vec<ImportDebug>,
    pub scopes: Vec<ScopeDebug>,
}

impl ScopeDebug {
    /// Describe `start` and everything nested in it
    pub fn new(graph: &ScopeGraph, start: NodeIndex, src: &str, namespaces: &NameSpaces) -> Self {
        let range = graph.node(start).map(NodeKind::range).unwrap_or_default();

        let definitions = graph
            .definitions_in_scope(start)
            .into_iter()
            .filter_map(|idx| {
                let def = graph.node(idx)?.as_def()?;
                Some(DefDebug {
                    name: def.name.clone(),
                    kind: namespaces.label_of(def.symbol_id).to_string(),
                    context: context(&def.range, src),
                    range: def.range,
                    references: reference_contexts(graph, idx, src),
                })
            })
            .collect();

        let imports = graph
            .imports_in_scope(start)
            .into_iter()
            .filter_map(|idx| {
                let import = graph.node(idx)?.as_import()?;
                Some(ImportDebug {
                    name: import.name.clone(),
                    context: context(&import.range, src),
                    range: import.range,
                    references: reference_contexts(graph, idx, src),
                })
            })
            .collect();

        let scopes = graph
            .child_scopes(start)
            .into_iter()
            .map(|child| ScopeDebug::new(graph, child, src, namespaces))
            .collect();

        Self {
            range,
            definitions,
            imports,
            scopes,
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = INDENT.repeat(depth);
        let inner = INDENT.repeat(depth + 1);

        writeln!(f, "scope {{")?;

        write!(f, "{inner}definitions: ")?;
        write_list(f, &self.definitions, depth + 1, |f, def, depth| {
            def.fmt_indented(f, depth)
        })?;

        if !self.imports.is_empty() {
            write!(f, "{inner}imports: ")?;
            write_list(f, &self.imports, depth + 1, |f, import, depth| {
                import.fmt_indented(f, depth)
            })?;
        }

        write!(f, "{inner}child scopes: ")?;
        write_list(f, &self.scopes, depth + 1, |f, scope, depth| {
            scope.fmt_indented(f, depth)
        })?;

        write!(f, "{pad}}}")
    }
}

impl fmt::Display for ScopeDebug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)?;
        writeln!(f)
    }
}

impl DefDebug {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let inner = INDENT.repeat(depth + 1);
        writeln!(f, "{} {{", self.name)?;
        writeln!(f, "{inner}kind: {},", self.kind)?;
        writeln!(f, "{inner}context: {},", self.context)?;
        write_references(f, &self.references, depth + 1)?;
        write!(f, "{}}}", INDENT.repeat(depth))
    }
}

impl ImportDebug {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let inner = INDENT.repeat(depth + 1);
        writeln!(f, "{} {{", self.name)?;
        writeln!(f, "{inner}context: {},", self.context)?;
        write_references(f, &self.references, depth + 1)?;
        write!(f, "{}}}", INDENT.repeat(depth))
    }
}

/// Write `[]` or a bracketed, one-item-per-line list followed by `,\n`
fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    depth: usize,
    mut item: impl FnMut(&mut fmt::Formatter<'_>, &T, usize) -> fmt::Result,
) -> fmt::Result {
    if items.is_empty() {
        return writeln!(f, "[],");
    }
    writeln!(f, "[")?;
    for entry in items {
        write!(f, "{}", INDENT.repeat(depth + 1))?;
        item(f, entry, depth + 1)?;
        writeln!(f, ",")?;
    }
    writeln!(f, "{}],", INDENT.repeat(depth))
}

fn write_references(f: &mut fmt::Formatter<'_>, refs: &[RefDebug], depth: usize) -> fmt::Result {
    if refs.is_empty() {
        return Ok(());
    }
    let pad = INDENT.repeat(depth);
    writeln!(f, "{pad}referenced in ({}): [", refs.len())?;
    for r in refs {
        writeln!(f, "{pad}{INDENT}{},", r)?;
    }
    writeln!(f, "{pad}],")
}

fn reference_contexts(graph: &ScopeGraph, binding: NodeIndex, src: &str) -> Vec<RefDebug> {
    graph
        .references_of(binding)
        .into_iter()
        .filter_map(|r| graph.node(r))
        .map(|r| RefDebug {
            context: context(&r.range(), src),
        })
        .collect()
}

/// Render the whole graph of a source unit, starting at its root scope
pub fn render(graph: &ScopeGraph, src: &str, namespaces: &NameSpaces) -> String {
    ScopeDebug::new(graph, graph.root(), src, namespaces).to_string()
}

/// The source line(s) around `range`, with the range fenced by `§`.
///
/// Leading whitespace before the range and trailing whitespace after it are
/// trimmed.
pub fn context(range: &TextRange, src: &str) -> String {
    let bytes = src.as_bytes();
    let start = range.start.byte.min(src.len());
    let end = range.end.byte.clamp(start, src.len());

    let line_start = bytes[..start]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let line_end = bytes[end..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| end + i)
        .unwrap_or(src.len());

    let before = src.get(line_start..start).unwrap_or("").trim_start();
    let text = src.get(start..end).unwrap_or("");
    let after = src.get(end..line_end).unwrap_or("").trim_end();

    [before, text, after].join("§")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{resolve, CaptureEvent, ScopeGraphBuilder};

    fn namespaces() -> NameSpaces {
        NameSpaces::from_static(&[&["function", "variable"]])
    }

    /// Byte span of the `nth` occurrence of `needle`
    fn find(src: &str, needle: &str, nth: usize) -> TextRange {
        let start = src.match_indices(needle).nth(nth).map(|(i, _)| i).unwrap();
        TextRange::from_byte_span(src, start, start + needle.len())
    }

    /// Range from the `nth` `{` to its matching `}`, inclusive
    fn block(src: &str, nth: usize) -> TextRange {
        let open = src.match_indices('{').nth(nth).map(|(i, _)| i).unwrap();
        let mut depth = 0;
        for (i, c) in src[open..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return TextRange::from_byte_span(src, open, open + i + 1);
                    }
                }
                _ => {}
            }
        }
        panic!("unbalanced braces");
    }

    const SRC: &str = "import os\nlet x = 1;\n{\n    print(x);\n    let y = x;\n}\n{\n    os.exit(y);\n}\n";

    fn events(src: &str) -> Vec<CaptureEvent> {
        let first = block(src, 0);
        let second = block(src, 1);
        vec![
            CaptureEvent::import(find(src, "os", 0), "os"),
            CaptureEvent::definition(find(src, "x", 0), "x", Some("variable")),
            CaptureEvent::scope_start(first),
            CaptureEvent::reference(find(src, "print", 0), "print", None),
            CaptureEvent::reference(find(src, "x", 1), "x", None),
            CaptureEvent::definition(find(src, "y", 0), "y", Some("variable")),
            CaptureEvent::reference(find(src, "x", 2), "x", None),
            CaptureEvent::scope_end(first),
            CaptureEvent::scope_start(second),
            CaptureEvent::reference(find(src, "os", 1), "os", None),
            CaptureEvent::reference(find(src, "y", 1), "y", None),
            CaptureEvent::scope_end(second),
        ]
    }

    fn resolved(events: Vec<CaptureEvent>) -> ScopeGraph {
        let ns = namespaces();
        let mut graph =
            ScopeGraphBuilder::build(TextRange::from_byte_span(SRC, 0, SRC.len()), events, &ns).unwrap();
        resolve(&mut graph).unwrap();
        graph
    }

    #[test]
    fn test_context() {
        let src = "fn main() {\n    let answer = 42;   \n}";
        let range = find(src, "answer", 0);
        assert_eq!(context(&range, src), "let §answer§ = 42;");

        let first_line = find(src, "main", 0);
        assert_eq!(context(&first_line, src), "fn §main§() {");
    }

    #[test]
    fn test_render_shape() {
        let graph = resolved(events(SRC));
        let rendered = render(&graph, SRC, &namespaces());

        let expected = "\
scope {
    definitions: [
        x {
            kind: variable,
            context: let §x§ = 1;,
            referenced in (2): [
                `print(§x§);`,
                `let y = §x§;`,
            ],
        },
    ],
    imports: [
        os {
            context: import §os§,
            referenced in (1): [
                `§os§.exit(y);`,
            ],
        },
    ],
    child scopes: [
        scope {
            definitions: [
                y {
                    kind: variable,
                    context: let §y§ = x;,
                },
            ],
            child scopes: [],
        },
        scope {
            definitions: [],
            child scopes: [],
        },
    ],
}
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_independent_of_sibling_order() {
        let original = events(SRC);

        // Swap the two sibling blocks and reorder bindings at the top level
        let mut shuffled = Vec::new();
        shuffled.extend_from_slice(&original[8..12]);
        shuffled.extend_from_slice(&original[2..8]);
        shuffled.push(original[1].clone());
        shuffled.push(original[0].clone());

        let a = render(&resolved(original), SRC, &namespaces());
        let b = render(&resolved(shuffled), SRC, &namespaces());
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_roundtrip_after_reresolve() {
        let graph = resolved(events(SRC));
        let before = render(&graph, SRC, &namespaces());

        let mut copy = graph.clone();
        resolve(&mut copy).unwrap();
        assert_eq!(render(&copy, SRC, &namespaces()), before);
    }

    #[test]
    fn test_unknown_symbol_renders_unclassified() {
        let graph = resolved(events(SRC));
        let other = NameSpaces::from_static(&[&["function"]]);
        let rendered = render(&graph, SRC, &other);
        assert!(rendered.contains("kind: unclassified"));
    }

    #[test]
    fn test_scenario_nested_reference() {
        // scope A { def x [10,15); scope B { ref x [20,24) } }
        let src = format!("{:<10}{:<5}{:<5}{:<4}{:<36}", "", "xxxxx", "", "xxxx", "");
        let ns = namespaces();
        let a = TextRange::from_byte_span(&src, 0, 50);
        let b = TextRange::from_byte_span(&src, 18, 30);
        let mut graph = ScopeGraphBuilder::build(
            TextRange::from_byte_span(&src, 0, src.len()),
            vec![
                CaptureEvent::scope_start(a),
                CaptureEvent::definition(TextRange::from_byte_span(&src, 10, 15), "x", None),
                CaptureEvent::scope_start(b),
                CaptureEvent::reference(TextRange::from_byte_span(&src, 20, 24), "x", None),
                CaptureEvent::scope_end(b),
                CaptureEvent::scope_end(a),
            ],
            &ns,
        )
        .unwrap();
        resolve(&mut graph).unwrap();

        let scope_a = graph.child_scopes(graph.root())[0];
        let debug = ScopeDebug::new(&graph, scope_a, &src, &ns);
        assert_eq!(debug.definitions.len(), 1);
        assert_eq!(debug.definitions[0].name, "x");
        assert_eq!(debug.definitions[0].kind, "none");
        assert_eq!(debug.definitions[0].references.len(), 1);
        assert_eq!(debug.scopes.len(), 1);
        assert!(debug.scopes[0].definitions.is_empty());
    }
}
