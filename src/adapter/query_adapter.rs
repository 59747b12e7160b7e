//! Query-based Language Adapter
//!
//! Language support is declared with Tree-sitter query files (.scm) whose
//! capture names describe scoping:
//!
//! - `local.scope` → a node that opens a lexical scope
//! - `local.definition[.<symbol>]` → a name defined in the innermost scope
//! - `hoist.definition[.<symbol>]` → a name defined in the enclosing scope
//! - `global.definition[.<symbol>]` → a name defined in the root scope
//! - `local.import` → a name brought in by an import
//! - `local.reference[.<symbol>]` → a use of a name
//! - `local.ignore` → a name that is never a use, even if another pattern
//!   captures it as a reference (attribute and keyword names)
//!
//! `<symbol>` is looked up in the adapter's namespace table. Captures with
//! any other name are ignored, so queries may carry helper captures.

use crate::{Result, Error};
use crate::namespace::NameSpaces;
use crate::range::{Point, TextRange};
use crate::scope::{CaptureEvent, Scoping};
use super::framework::{CaptureStream, LanguageAdapter};
use std::cmp::Reverse;
use std::collections::HashSet;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

/// Role of a capture, ordered the way same-position captures are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRole {
    Scope,
    Definition(Scoping),
    Import,
    Reference,
    Ignore,
}

impl CaptureRole {
    fn rank(&self) -> u8 {
        match self {
            CaptureRole::Scope => 0,
            CaptureRole::Definition(_) => 1,
            CaptureRole::Import => 2,
            CaptureRole::Reference => 3,
            CaptureRole::Ignore => 4,
        }
    }
}

/// A query capture before it is turned into builder events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    pub role: CaptureRole,
    pub symbol: Option<String>,
    pub range: TextRange,
    pub text: String,
}

/// Split a capture name into its role and optional symbol classification
pub fn classify_capture(name: &str) -> Option<(CaptureRole, Option<String>)> {
    let mut parts = name.splitn(3, '.');
    let head = parts.next()?;
    let role = parts.next()?;
    let symbol = parts.next().map(str::to_string);

    let role = match (head, role) {
        ("local", "scope") => return Some((CaptureRole::Scope, None)),
        ("local", "import") => return Some((CaptureRole::Import, None)),
        ("local", "ignore") => return Some((CaptureRole::Ignore, None)),
        ("local", "definition") => CaptureRole::Definition(Scoping::Local),
        ("hoist", "definition") => CaptureRole::Definition(Scoping::Hoisted),
        ("global", "definition") => CaptureRole::Definition(Scoping::Global),
        ("local", "reference") => CaptureRole::Reference,
        _ => return None,
    };
    Some((role, symbol))
}

/// Name an import binds: quotes stripped, last path segment kept
pub fn normalize_import(text: &str) -> &str {
    let trimmed = text.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Order captures and interleave scope ends so the stream is balanced.
///
/// Captures are sorted by start (ascending), end (descending) and role, so
/// an enclosing scope always precedes what it contains. Before each capture,
/// every open scope ending at or before its start is closed; scopes still
/// open at the end are closed last. References sharing a range with an
/// `Ignore` capture are dropped.
pub fn into_event_stream(mut captures: Vec<RawCapture>) -> Vec<CaptureEvent> {
    let ignored: HashSet<TextRange> = captures
        .iter()
        .filter(|c| c.role == CaptureRole::Ignore)
        .map(|c| c.range)
        .collect();
    captures.retain(|c| match c.role {
        CaptureRole::Ignore => false,
        CaptureRole::Reference => !ignored.contains(&c.range),
        _ => true,
    });

    captures.sort_by_key(|c| (c.range.start.byte, Reverse(c.range.end.byte), c.role.rank()));
    captures.dedup_by(|b, a| a.role == CaptureRole::Scope && b.role == CaptureRole::Scope && a.range == b.range);

    let mut events = Vec::with_capacity(captures.len() * 2);
    let mut open: Vec<TextRange> = Vec::new();

    for capture in captures {
        while let Some(top) = open.last().copied() {
            if top.end.byte > capture.range.start.byte {
                break;
            }
            events.push(CaptureEvent::scope_end(top));
            open.pop();
        }

        let RawCapture { role, symbol, range, text } = capture;
        match role {
            CaptureRole::Scope => {
                events.push(CaptureEvent::scope_start(range));
                open.push(range);
            }
            CaptureRole::Definition(scoping) => {
                events.push(CaptureEvent::definition(range, text, symbol.as_deref()).with_scoping(scoping));
            }
            CaptureRole::Import => {
                events.push(CaptureEvent::import(range, normalize_import(&text)));
            }
            CaptureRole::Reference => {
                events.push(CaptureEvent::reference(range, text, symbol.as_deref()));
            }
            CaptureRole::Ignore => {}
        }
    }

    while let Some(top) = open.pop() {
        events.push(CaptureEvent::scope_end(top));
    }
    events
}

fn node_range(node: &Node) -> TextRange {
    let start = node.start_position();
    let end = node.end_position();
    TextRange::new(
        Point::new(node.start_byte(), start.row, start.column),
        Point::new(node.end_byte(), end.row, end.column),
    )
}

/// A language adapter that uses Tree-sitter queries for extraction
pub struct QueryAdapter {
    language: Language,
    language_name: String,
    extensions: Vec<String>,
    query: Query,
    namespaces: NameSpaces,
}

impl QueryAdapter {
    /// Lowercase names of the built-in adapters
    pub const BUILTIN: [&'static str; 4] = ["python", "javascript", "rust", "go"];

    /// Create a new query adapter from a language and query string
    pub fn new(
        language: Language,
        language_name: &str,
        extensions: &[&str],
        query_source: &str,
        namespaces: NameSpaces,
    ) -> Result<Self> {
        let query = Self::compile(&language, language_name, query_source)?;

        Ok(Self {
            language,
            language_name: language_name.to_string(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            query,
            namespaces,
        })
    }

    fn compile(language: &Language, language_name: &str, source: &str) -> Result<Query> {
        Query::new(language, source)
            .map_err(|e| Error::Adapter(format!("{} query parse error: {}", language_name, e)))
    }

    /// Replace the capture query
    pub fn with_query(mut self, query_source: &str) -> Result<Self> {
        self.query = Self::compile(&self.language, &self.language_name, query_source)?;
        Ok(self)
    }

    /// Replace the namespace table
    pub fn with_namespaces(mut self, namespaces: NameSpaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Create a Python query adapter with embedded queries
    pub fn python() -> Result<Self> {
        let language = tree_sitter_python::LANGUAGE.into();
        let query_source = include_str!("../../queries/python.scm");
        let namespaces = NameSpaces::from_static(&[&["class", "function", "parameter", "variable"]]);
        Self::new(language, "Python", &["py", "pyi"], query_source, namespaces)
    }

    /// Create a JavaScript query adapter with embedded queries
    pub fn javascript() -> Result<Self> {
        let language = tree_sitter_javascript::LANGUAGE.into();
        let query_source = include_str!("../../queries/javascript.scm");
        let namespaces = NameSpaces::from_static(&[&["class", "function", "parameter", "variable"]]);
        Self::new(language, "JavaScript", &["js", "jsx", "mjs", "cjs"], query_source, namespaces)
    }

    /// Create a Rust query adapter with embedded queries
    pub fn rust() -> Result<Self> {
        let language = tree_sitter_rust::LANGUAGE.into();
        let query_source = include_str!("../../queries/rust.scm");
        let namespaces = NameSpaces::from_static(&[
            &["const", "function", "variable", "field", "enumerator"],
            &["struct", "enum", "union", "typedef", "interface", "module"],
            &["label"],
            &["lifetime"],
        ]);
        Self::new(language, "Rust", &["rs"], query_source, namespaces)
    }

    /// Create a Go query adapter with embedded queries
    pub fn go() -> Result<Self> {
        let language = tree_sitter_go::LANGUAGE.into();
        let query_source = include_str!("../../queries/go.scm");
        let namespaces = NameSpaces::from_static(&[
            &["const", "function", "method", "variable"],
            &["type"],
        ]);
        Self::new(language, "Go", &["go"], query_source, namespaces)
    }

    /// Get all supported query adapters
    pub fn all() -> Vec<Result<Self>> {
        vec![
            Self::python(),
            Self::javascript(),
            Self::rust(),
            Self::go(),
        ]
    }

    /// Run the query over `content` and collect the captures it understands
    pub fn raw_captures(&self, content: &str) -> Result<Vec<RawCapture>> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;

        let tree = parser.parse(content, None)
            .ok_or_else(|| Error::Parse(format!("{} parser produced no tree", self.language_name)))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!("{} source contains syntax errors, continuing", self.language_name);
        }

        let source_bytes = content.as_bytes();
        let capture_names = self.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut captures = Vec::new();

        for query_match in cursor.matches(&self.query, root, source_bytes) {
            for capture in query_match.captures {
                let name = capture_names[capture.index as usize];
                let Some((role, symbol)) = classify_capture(name) else {
                    continue;
                };
                let text = capture.node.utf8_text(source_bytes).unwrap_or("").to_string();
                captures.push(RawCapture {
                    role,
                    symbol,
                    range: node_range(&capture.node),
                    text,
                });
            }
        }

        tracing::trace!("{}: {} captures", self.language_name, captures.len());
        Ok(captures)
    }
}

/// Implement LanguageAdapter trait for QueryAdapter
impl LanguageAdapter for QueryAdapter {
    fn language_name(&self) -> &str {
        &self.language_name
    }

    fn file_extensions(&self) -> &[String] {
        &self.extensions
    }

    fn namespaces(&self) -> &NameSpaces {
        &self.namespaces
    }

    fn capture_stream(&self, content: &str) -> Result<CaptureStream> {
        let captures = self.raw_captures(content)?;
        Ok(CaptureStream {
            root: TextRange::from_byte_span(content, 0, content.len()),
            events: into_event_stream(captures),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::framework::ParsedUnit;
    use crate::node::NodeKind;
    use crate::scope::CaptureKind;

    fn range(start: usize, end: usize) -> TextRange {
        TextRange::new(Point::new(start, 0, start), Point::new(end, 0, end))
    }

    fn raw(role: CaptureRole, start: usize, end: usize, text: &str) -> RawCapture {
        RawCapture {
            role,
            symbol: None,
            range: range(start, end),
            text: text.to_string(),
        }
    }

    /// Byte offset of `pattern` in `src`, plus `skip`
    fn at(src: &str, pattern: &str, skip: usize) -> usize {
        src.find(pattern).unwrap_or_else(|| panic!("`{}` not in source", pattern)) + skip
    }

    /// Start byte of whatever the reference at `byte` is bound to
    fn bound_to(unit: &ParsedUnit, byte: usize) -> Option<usize> {
        let reference = unit.graph.node_at_byte(byte)?;
        assert!(
            matches!(unit.graph.node(reference), Some(NodeKind::Ref(_))),
            "node at {} is not a reference",
            byte
        );
        let binding = unit.graph.binding_of(reference)?;
        Some(unit.graph.node(binding)?.range().start.byte)
    }

    #[test]
    fn test_classify_capture() {
        assert_eq!(classify_capture("local.scope"), Some((CaptureRole::Scope, None)));
        assert_eq!(
            classify_capture("hoist.definition.function"),
            Some((CaptureRole::Definition(Scoping::Hoisted), Some("function".to_string())))
        );
        assert_eq!(
            classify_capture("local.reference"),
            Some((CaptureRole::Reference, None))
        );
        assert_eq!(classify_capture("local.import"), Some((CaptureRole::Import, None)));
        assert_eq!(classify_capture("local.ignore"), Some((CaptureRole::Ignore, None)));
        assert_eq!(classify_capture("name"), None);
        assert_eq!(classify_capture("call.name"), None);
    }

    #[test]
    fn test_normalize_import() {
        assert_eq!(normalize_import("\"net/http\""), "http");
        assert_eq!(normalize_import("'fmt'"), "fmt");
        assert_eq!(normalize_import("os"), "os");
    }

    #[test]
    fn test_event_stream_is_balanced() {
        // outer [0,40) holds inner [10,20); a reference follows both
        let events = into_event_stream(vec![
            raw(CaptureRole::Reference, 30, 31, "b"),
            raw(CaptureRole::Scope, 10, 20, ""),
            raw(CaptureRole::Definition(Scoping::Local), 12, 13, "a"),
            raw(CaptureRole::Scope, 0, 40, ""),
            raw(CaptureRole::Scope, 10, 20, ""),
            raw(CaptureRole::Reference, 45, 46, "c"),
        ]);

        let kinds: Vec<(&str, usize)> = events
            .iter()
            .map(|e| {
                let tag = match e.kind {
                    CaptureKind::ScopeStart => "start",
                    CaptureKind::ScopeEnd => "end",
                    CaptureKind::Definition { .. } => "def",
                    CaptureKind::Import => "import",
                    CaptureKind::Reference { .. } => "ref",
                };
                (tag, e.range.start.byte)
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("start", 0),
                ("start", 10),
                ("def", 12),
                ("end", 10),
                ("ref", 30),
                ("end", 0),
                ("ref", 45),
            ]
        );
    }

    #[test]
    fn test_same_range_definition_precedes_reference() {
        let events = into_event_stream(vec![
            raw(CaptureRole::Reference, 4, 5, "x"),
            raw(CaptureRole::Definition(Scoping::Hoisted), 4, 5, "x"),
            raw(CaptureRole::Import, 8, 16, "\"a/b/c\""),
        ]);
        assert!(matches!(
            &events[0].kind,
            CaptureKind::Definition { scoping: Scoping::Hoisted, .. }
        ));
        assert!(matches!(events[1].kind, CaptureKind::Reference { .. }));
        assert_eq!(events[2].text, "c");
    }

    #[test]
    fn test_ignored_range_drops_reference() {
        let events = into_event_stream(vec![
            raw(CaptureRole::Reference, 2, 3, "x"),
            raw(CaptureRole::Ignore, 2, 3, "x"),
            raw(CaptureRole::Reference, 6, 7, "y"),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "y");
    }

    #[test]
    fn test_builtin_queries_compile() {
        for adapter in QueryAdapter::all() {
            let adapter = adapter.unwrap();
            assert!(!adapter.namespaces().is_empty());
        }
    }

    #[test]
    fn test_invalid_query_override() {
        let adapter = QueryAdapter::python().unwrap();
        assert!(matches!(
            adapter.with_query("(no_such_node) @local.scope"),
            Err(Error::Adapter(_))
        ));
    }

    #[test]
    fn test_python_resolution() {
        let adapter = QueryAdapter::python().unwrap();
        let src = r#"import os

def greet(name):
    message = "hi " + name
    return message

def main():
    greet(os.getcwd())
"#;
        let unit = adapter.analyze("greet.py", src).unwrap();

        // parameter
        assert_eq!(bound_to(&unit, at(src, "+ name", 2)), Some(at(src, "(name)", 1)));
        // local variable
        assert_eq!(bound_to(&unit, at(src, "return message", 7)), Some(at(src, "message =", 0)));
        // function defined at module level, used from another function
        assert_eq!(bound_to(&unit, at(src, "greet(os", 0)), Some(at(src, "def greet", 4)));
        // import
        assert_eq!(bound_to(&unit, at(src, "os.getcwd", 0)), Some(at(src, "import os", 7)));
    }

    #[test]
    fn test_python_shadowing() {
        let adapter = QueryAdapter::python().unwrap();
        let src = "x = 1\n\ndef f():\n    x = 2\n    return x\n\nprint(x)\n";
        let unit = adapter.analyze("shadow.py", src).unwrap();

        assert_eq!(bound_to(&unit, at(src, "return x", 7)), Some(at(src, "    x = 2", 4)));
        assert_eq!(bound_to(&unit, at(src, "print(x)", 6)), Some(0));
    }

    #[test]
    fn test_python_attribute_and_keyword_names_stay_unbound() {
        let adapter = QueryAdapter::python().unwrap();

        let src = "x = 1\nclass A:\n    pass\na = A()\nprint(a.x)\n";
        let unit = adapter.analyze("attr.py", src).unwrap();
        assert_eq!(bound_to(&unit, at(src, "a.x", 2)), None);
        assert_eq!(bound_to(&unit, at(src, "a.x", 0)), Some(at(src, "a = A", 0)));

        let src = "def f(name):\n    g(name=1)\n    self.name = name\n";
        let unit = adapter.analyze("kwarg.py", src).unwrap();
        assert_eq!(bound_to(&unit, at(src, "name=1", 0)), None);
        assert_eq!(bound_to(&unit, at(src, ".name =", 1)), None);
        assert_eq!(bound_to(&unit, at(src, "= name\n", 2)), Some(at(src, "(name)", 1)));
    }

    #[test]
    fn test_javascript_resolution() {
        let adapter = QueryAdapter::javascript().unwrap();
        let src = r#"import { sum } from "./math.js";

function total(items) {
    let acc = 0;
    for (const item of items) {
        acc = sum(acc, item);
    }
    return acc;
}

const answer = total([1, 2]);
"#;
        let unit = adapter.analyze("total.js", src).unwrap();

        assert_eq!(bound_to(&unit, at(src, "sum(acc", 0)), Some(at(src, "{ sum }", 2)));
        assert_eq!(bound_to(&unit, at(src, "of items", 3)), Some(at(src, "(items)", 1)));
        assert_eq!(bound_to(&unit, at(src, "return acc", 7)), Some(at(src, "let acc", 4)));
        assert_eq!(bound_to(&unit, at(src, ", item)", 2)), Some(at(src, "const item", 6)));
        assert_eq!(bound_to(&unit, at(src, "total([", 0)), Some(at(src, "function total", 9)));
    }

    #[test]
    fn test_rust_resolution() {
        let adapter = QueryAdapter::rust().unwrap();
        let src = r#"use std::collections::HashMap;

struct Point {
    x: i32,
}

fn make(x: i32) -> Point {
    let total = x + 1;
    Point { x: total }
}

fn main() {
    let map: HashMap<i32, Point> = HashMap::new();
    let p = make(2);
}
"#;
        let unit = adapter.analyze("main.rs", src).unwrap();

        // the parameter, not the struct field
        assert_eq!(bound_to(&unit, at(src, "x + 1", 0)), Some(at(src, "make(x", 5)));
        assert_eq!(bound_to(&unit, at(src, "x: total", 3)), Some(at(src, "let total", 4)));
        assert_eq!(bound_to(&unit, at(src, "make(2)", 0)), Some(at(src, "fn make", 3)));
        // type position reference into the type namespace
        assert_eq!(bound_to(&unit, at(src, "-> Point", 3)), Some(at(src, "struct Point", 7)));
        // imported name, used as a type
        assert_eq!(bound_to(&unit, at(src, "HashMap<", 0)), Some(at(src, "HashMap;", 0)));
    }

    #[test]
    fn test_go_resolution() {
        let adapter = QueryAdapter::go().unwrap();
        let src = r#"package main

import (
	"fmt"
	str "strings"
)

type Greeter struct{}

func greet(name string) string {
	msg := str.ToUpper(name)
	return msg
}

func main() {
	var g Greeter
	fmt.Println(greet("go"), g)
}
"#;
        let unit = adapter.analyze("main.go", src).unwrap();

        assert_eq!(bound_to(&unit, at(src, "fmt.Println", 0)), Some(at(src, "\"fmt\"", 0)));
        assert_eq!(bound_to(&unit, at(src, "str.ToUpper", 0)), Some(at(src, "str \"strings\"", 0)));
        assert_eq!(bound_to(&unit, at(src, "ToUpper(name)", 8)), Some(at(src, "(name string)", 1)));
        assert_eq!(bound_to(&unit, at(src, "return msg", 7)), Some(at(src, "msg :=", 0)));
        assert_eq!(bound_to(&unit, at(src, "greet(\"go\")", 0)), Some(at(src, "func greet", 5)));
        assert_eq!(bound_to(&unit, at(src, "g Greeter", 2)), Some(at(src, "type Greeter", 5)));
        assert_eq!(bound_to(&unit, at(src, "), g)", 3)), Some(at(src, "var g", 4)));
    }
}
