//! Visitor over the top-level declarations of a PHP syntax tree
//!
//! Only the file scope and namespace bodies are walked: definitions
//! nested in functions, classes or control flow are never autoloadable,
//! so the traversal stops there.

use mago_syntax::ast::*;

/// Trait for visiting top-level PHP statements
///
/// `visit_statement` is called before a namespace body is entered and
/// `leave_statement` after it has been walked, so implementors can keep
/// track of the namespace in effect.
pub trait Visitor<'a> {
    /// Called for each top-level statement. Return `true` to descend into
    /// namespace bodies.
    fn visit_statement(&mut self, _stmt: &Statement<'a>, _source: &str) -> bool {
        true
    }

    /// Called once a statement and its namespace body have been walked
    fn leave_statement(&mut self, _stmt: &Statement<'a>, _source: &str) {}

    /// Visit a program (entry point)
    fn visit_program(&mut self, program: &Program<'a>, source: &str) {
        for stmt in program.statements.iter() {
            self.traverse_statement(stmt, source);
        }
    }

    /// Traverse a statement, descending only into namespace bodies
    fn traverse_statement(&mut self, stmt: &Statement<'a>, source: &str) {
        if !self.visit_statement(stmt, source) {
            return;
        }

        if let Statement::Namespace(ns) = stmt {
            match &ns.body {
                NamespaceBody::Implicit(body) => {
                    for inner in body.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
                NamespaceBody::BraceDelimited(body) => {
                    for inner in body.statements.iter() {
                        self.traverse_statement(inner, source);
                    }
                }
            }
        }

        self.leave_statement(stmt, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mago_database::file::FileId;

    #[derive(Default)]
    struct Counter {
        functions: usize,
        namespaces_left: usize,
    }

    impl<'a> Visitor<'a> for Counter {
        fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
            if let Statement::Function(_) = stmt {
                self.functions += 1;
            }
            true
        }

        fn leave_statement(&mut self, stmt: &Statement<'a>, _source: &str) {
            if let Statement::Namespace(_) = stmt {
                self.namespaces_left += 1;
            }
        }
    }

    fn count(source: &str) -> Counter {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        let mut counter = Counter::default();
        counter.visit_program(program, source);
        counter
    }

    #[test]
    fn test_counts_top_level_functions_only() {
        let source = r#"<?php
function outer() {
    function inner() {}
}
if (true) {
    function conditional() {}
}
"#;
        let counter = count(source);
        assert_eq!(counter.functions, 1);
    }

    #[test]
    fn test_descends_into_namespace_bodies() {
        let source = r#"<?php
namespace A {
    function a() {}
}
namespace B {
    function b() {}
}
"#;
        let counter = count(source);
        assert_eq!(counter.functions, 2);
        assert_eq!(counter.namespaces_left, 2);
    }
}
