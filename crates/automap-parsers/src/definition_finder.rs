//! Reference definition finder built on the full PHP syntax tree
//!
//! Parses each file with mago-syntax after lowering Hack-only syntax (see
//! `dialect`), then collects class-like, function and constant
//! declarations from the top level and from namespace bodies.

use crate::dialect::{self, TypeAlias};
use automap_core::names::{qualify, unquote_literal};
use automap_core::{Definition, ParseError, Parser, SymbolKind, Visitor};
use mago_database::file::FileId;
use mago_span::HasSpan;
use mago_syntax::ast::*;
use std::path::Path;

/// AST-based parser; the reference family
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionFinder;

impl DefinitionFinder {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for DefinitionFinder {
    fn name(&self) -> &'static str {
        "definition-finder"
    }

    fn parse(&self, content: &[u8], path: &Path) -> Result<Vec<Definition>, ParseError> {
        let text = String::from_utf8_lossy(content);
        let lowered = dialect::lower(&text, path);
        let source = lowered.source.as_str();

        let arena = bumpalo::Bump::new();
        let file_id = FileId::new(path.to_string_lossy().as_ref());
        let (program, parse_error) =
            mago_syntax::parser::parse_file_content(&arena, file_id, source);

        if let Some(error) = parse_error {
            return Err(ParseError::new(path, error.to_string()));
        }

        let collector = DeclarationCollector::new(source, path);
        Ok(collector.collect(program, &lowered.type_aliases))
    }
}

/// Where a namespace declaration applies
#[derive(Debug, Clone)]
struct NamespaceScope {
    start: usize,
    end: usize,
    name: Option<String>,
    braced: bool,
}

/// Collects top-level declarations using the Visitor pattern
struct DeclarationCollector<'s> {
    source: &'s str,
    path: &'s Path,
    current_namespace: Option<String>,
    scopes: Vec<NamespaceScope>,
    definitions: Vec<Definition>,
}

impl<'s> DeclarationCollector<'s> {
    fn new(source: &'s str, path: &'s Path) -> Self {
        Self {
            source,
            path,
            current_namespace: None,
            scopes: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// Collect all definitions from a program plus the lifted type aliases
    fn collect(mut self, program: &Program<'_>, aliases: &[TypeAlias]) -> Vec<Definition> {
        self.visit_program(program, self.source);

        for alias in aliases {
            let namespace = self.namespace_at(alias.offset).map(str::to_string);
            let name = qualify(namespace.as_deref(), &alias.name);
            self.definitions
                .push(Definition::new(SymbolKind::Type, name, self.path));
        }

        self.definitions
    }

    /// Get text for a span
    fn get_span_text(&self, span: &mago_span::Span) -> &'s str {
        &self.source[span.start.offset as usize..span.end.offset as usize]
    }

    fn push(&mut self, kind: SymbolKind, name_span: &mago_span::Span) {
        let name = self.get_span_text(name_span);
        let full_name = qualify(self.current_namespace.as_deref(), name);
        self.definitions.push(Definition::new(kind, full_name, self.path));
    }

    /// Namespace in effect at a byte offset outside of any statement
    ///
    /// The last namespace declared before the offset applies, unless it is
    /// a braced block that has already closed.
    fn namespace_at(&self, offset: usize) -> Option<&str> {
        let scope = self.scopes.iter().rev().find(|s| s.start <= offset)?;
        if scope.braced && offset >= scope.end {
            return None;
        }
        scope.name.as_deref()
    }

    /// Declared namespace name; `None` for `namespace { ... }`
    fn namespace_name(&self, ns: &Namespace<'_>) -> Option<String> {
        let name = self.get_span_text(&ns.name.as_ref()?.span()).trim_matches('\\');
        (!name.is_empty()).then(|| name.to_string())
    }

    /// `define('NAME', ...)` as a statement
    fn collect_define(&mut self, call: &FunctionCall<'_>) {
        let Expression::Identifier(ident) = call.function else {
            return;
        };
        let function = self.get_span_text(&ident.span());
        if !function.trim_start_matches('\\').eq_ignore_ascii_case("define") {
            return;
        }

        let Some(first) = call.argument_list.arguments.iter().next() else {
            return;
        };
        let value: &Expression<'_> = match first {
            Argument::Positional(pos) => &pos.value,
            _ => return,
        };

        if let Expression::Literal(Literal::String(literal)) = value {
            let text = self.get_span_text(&literal.span());
            if let Some(name) = unquote_literal(text) {
                let name = name.trim_start_matches('\\').to_string();
                self.definitions
                    .push(Definition::new(SymbolKind::Constant, name, self.path));
            }
        }
    }
}

impl<'a, 's> Visitor<'a> for DeclarationCollector<'s> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        match stmt {
            Statement::Namespace(ns) => {
                let span = ns.span();
                let name = self.namespace_name(ns);
                self.scopes.push(NamespaceScope {
                    start: span.start.offset as usize,
                    end: span.end.offset as usize,
                    name: name.clone(),
                    braced: matches!(ns.body, NamespaceBody::BraceDelimited(_)),
                });
                self.current_namespace = name;
            }
            Statement::Class(class) => self.push(SymbolKind::Class, &class.name.span),
            Statement::Interface(interface) => self.push(SymbolKind::Class, &interface.name.span),
            Statement::Trait(trait_def) => self.push(SymbolKind::Class, &trait_def.name.span),
            Statement::Enum(enum_def) => self.push(SymbolKind::Class, &enum_def.name.span),
            Statement::Function(func) => self.push(SymbolKind::Function, &func.name.span),
            Statement::Constant(const_def) => {
                for entry in const_def.items.iter() {
                    self.push(SymbolKind::Constant, &entry.name.span);
                }
            }
            Statement::Expression(expr_stmt) => {
                let expression: &Expression<'a> = &expr_stmt.expression;
                if let Expression::Call(Call::Function(call)) = expression {
                    self.collect_define(call);
                }
            }
            _ => {}
        }
        true
    }

    fn leave_statement(&mut self, stmt: &Statement<'a>, _source: &str) {
        // An implicit namespace lasts until the next namespace statement
        if let Statement::Namespace(ns) = stmt {
            if matches!(ns.body, NamespaceBody::BraceDelimited(_)) {
                self.current_namespace = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(source: &str) -> Vec<(SymbolKind, String)> {
        let mut found: Vec<_> = DefinitionFinder::new()
            .parse(source.as_bytes(), Path::new("test.php"))
            .unwrap()
            .into_iter()
            .map(|d| (d.kind, d.name))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_collect_class_like() {
        let source = r#"<?php
abstract class Base {}
interface Nameable {}
trait Greets {}
enum Suit: string { case Hearts = 'H'; }
"#;
        assert_eq!(find(source), vec![
            (SymbolKind::Class, "Base".to_string()),
            (SymbolKind::Class, "Greets".to_string()),
            (SymbolKind::Class, "Nameable".to_string()),
            (SymbolKind::Class, "Suit".to_string()),
        ]);
    }

    #[test]
    fn test_nested_declarations_are_ignored() {
        let source = r#"<?php
function outer() {
    function nested() {}
}
if (!function_exists('maybe')) {
    function maybe() {}
}
class Holder {
    const INNER = 1;
    public function method() {}
}
$anon = new class {};
"#;
        assert_eq!(find(source), vec![
            (SymbolKind::Class, "Holder".to_string()),
            (SymbolKind::Function, "outer".to_string()),
        ]);
    }

    #[test]
    fn test_constants_and_define() {
        let source = r#"<?php
namespace App;
const LIMIT = 10, OTHER = 'x';
define('GLOBAL_FLAG', true);
\define("App\\QUALIFIED", 1);
define($dynamic, 2);
define('JOINED_' . 'NAME', 3);
"#;
        assert_eq!(find(source), vec![
            (SymbolKind::Constant, "App\\LIMIT".to_string()),
            (SymbolKind::Constant, "App\\OTHER".to_string()),
            (SymbolKind::Constant, "App\\QUALIFIED".to_string()),
            (SymbolKind::Constant, "GLOBAL_FLAG".to_string()),
        ]);
    }

    #[test]
    fn test_braced_namespaces() {
        let source = r#"<?php
namespace App\Models {
    class User {}
    function helper() {}
}
namespace {
    class Root {}
}
"#;
        assert_eq!(find(source), vec![
            (SymbolKind::Class, "App\\Models\\User".to_string()),
            (SymbolKind::Class, "Root".to_string()),
            (SymbolKind::Function, "App\\Models\\helper".to_string()),
        ]);
    }

    #[test]
    fn test_hack_file() {
        let source = r#"<?hh // strict
namespace Fixtures;

type Point = shape('x' => int, 'y' => int);
newtype UserId as int = int;

class :example:xhp-class {}

function example_function(): void {}
"#;
        assert_eq!(find(source), vec![
            (SymbolKind::Class, "Fixtures\\xhp_example__xhp_class".to_string()),
            (SymbolKind::Function, "Fixtures\\example_function".to_string()),
            (SymbolKind::Type, "Fixtures\\Point".to_string()),
            (SymbolKind::Type, "Fixtures\\UserId".to_string()),
        ]);
    }

    #[test]
    fn test_hack_generics_and_enums() {
        let source = r#"<?hh
namespace Fixtures;
class Box<T> extends Base<T> {}
enum Status: int as int {
  ACTIVE = 1;
}
function identity<T>(T $x): T { return $x; }
"#;
        assert_eq!(find(source), vec![
            (SymbolKind::Class, "Fixtures\\Box".to_string()),
            (SymbolKind::Class, "Fixtures\\Status".to_string()),
            (SymbolKind::Function, "Fixtures\\identity".to_string()),
        ]);
    }

    #[test]
    fn test_headerless_hack_file() {
        let source = b"namespace Fx;\nclass Headerless {}\nfunction f(): void {}\ntype Id = int;\n";
        let mut found: Vec<_> = DefinitionFinder::new()
            .parse(source, Path::new("x.hack"))
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        found.sort();
        assert_eq!(found, vec!["Fx\\Headerless", "Fx\\Id", "Fx\\f"]);
    }

    #[test]
    fn test_namespace_name_ignores_comments() {
        let source = "<?php\nnamespace /* legacy */ App\\Models;\nclass User {}\nnamespace # vendor\nLib;\nfunction helper() {}\n";
        assert_eq!(find(source), vec![
            (SymbolKind::Class, "App\\Models\\User".to_string()),
            (SymbolKind::Function, "Lib\\helper".to_string()),
        ]);
    }

    #[test]
    fn test_type_alias_after_braced_namespace_is_global() {
        let source = "<?hh\nnamespace A {\n  class X {}\n}\ntype Outside = int;\n";
        assert!(find(source).contains(&(SymbolKind::Type, "Outside".to_string())));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = DefinitionFinder::new()
            .parse(b"<?php\nclass {\n", Path::new("broken.php"))
            .unwrap_err();
        assert_eq!(err.path, Path::new("broken.php"));
        assert!(!err.message.is_empty());
    }
}
