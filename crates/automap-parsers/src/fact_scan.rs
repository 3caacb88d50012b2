//! Fast definition scanner
//!
//! Extracts declaration facts in a single pass over the token stream
//! without building a syntax tree. Only brace depth and the namespace in
//! effect are tracked; a declaration keyword counts when it starts a
//! statement at file or namespace level.

use crate::dialect;
use crate::lexer::{self, Brace, Nesting, Spanned, Token};
use automap_core::names::{qualify, unquote_literal, xhp_class_name};
use automap_core::{Definition, ParseError, Parser, SymbolKind};
use std::path::Path;

/// Single-pass declaration scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct FactScanner;

impl FactScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for FactScanner {
    fn name(&self) -> &'static str {
        "fact-scan"
    }

    fn parse(&self, content: &[u8], path: &Path) -> Result<Vec<Definition>, ParseError> {
        let source = String::from_utf8_lossy(content);
        let tokens = if dialect::starts_in_code(path, &source) {
            lexer::tokenize_code(&source)
        } else {
            lexer::tokenize(&source)
        };
        let tokens = tokens.map_err(|e| {
            ParseError::new(path, format!("{} on line {}", e.message, line_of(&source, e.offset)))
        })?;

        let mut extractor = Extractor::new(&source, &tokens, path);
        extractor.run()?;
        Ok(extractor.definitions)
    }
}

/// 1-based line number of a byte offset
fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

struct Extractor<'s, 't> {
    source: &'s str,
    tokens: &'t [Spanned<'s>],
    path: &'t Path,
    namespace: Option<String>,
    nesting: Nesting,
    definitions: Vec<Definition>,
}

impl<'s, 't> Extractor<'s, 't> {
    fn new(source: &'s str, tokens: &'t [Spanned<'s>], path: &'t Path) -> Self {
        Self {
            source,
            tokens,
            path,
            namespace: None,
            nesting: Nesting::default(),
            definitions: Vec::new(),
        }
    }

    fn token(&self, index: usize) -> Option<Token<'s>> {
        self.tokens.get(index).map(|t| t.token)
    }

    fn ident(&self, index: usize) -> Option<&'s str> {
        match self.token(index) {
            Some(Token::Ident(name)) => Some(name),
            _ => None,
        }
    }

    fn error(&self, offset: usize, message: &str) -> ParseError {
        ParseError::new(
            self.path,
            format!("{} on line {}", message, line_of(self.source, offset)),
        )
    }

    fn push(&mut self, kind: SymbolKind, name: &str) {
        let name = qualify(self.namespace.as_deref(), name);
        self.definitions.push(Definition::new(kind, name, self.path));
    }

    fn run(&mut self) -> Result<(), ParseError> {
        let mut index = 0;
        while index < self.tokens.len() {
            let spanned = self.tokens[index];
            match spanned.token {
                Token::Punct(b'{') => self.nesting.open(),
                Token::Punct(b'}') => match self.nesting.close() {
                    Some(Brace::Namespace) => self.namespace = None,
                    Some(Brace::Block) => {}
                    None => return Err(self.error(spanned.start, "unexpected '}'")),
                },
                Token::Ident(word)
                    if self.nesting.is_top_level() && lexer::starts_statement(self.tokens, index) =>
                {
                    let keyword = word.trim_start_matches('\\').to_ascii_lowercase();
                    if keyword == "__halt_compiler" {
                        return Ok(());
                    }
                    index = self.declaration(&keyword, index);
                }
                _ => {}
            }
            index += 1;
        }

        if self.nesting.is_balanced() {
            Ok(())
        } else {
            let end = self.tokens.last().map_or(0, |t| t.end);
            Err(self.error(end, "unclosed '{'"))
        }
    }

    /// Handle a statement-initial keyword, returning the last index consumed
    fn declaration(&mut self, keyword: &str, index: usize) -> usize {
        let next = index + 1;
        match keyword {
            "namespace" => self.namespace_declaration(index),
            "class" if self.token(next) == Some(Token::Punct(b':')) => {
                if let Some(name) = self.xhp_name(next) {
                    self.push(SymbolKind::Class, &name);
                }
                index
            }
            "class" | "interface" | "trait" => {
                if let Some(name) = self.ident(next) {
                    let is_clause = ["extends", "implements"]
                        .iter()
                        .any(|kw| name.eq_ignore_ascii_case(kw));
                    if !is_clause {
                        self.push(SymbolKind::Class, name);
                    }
                }
                index
            }
            "enum" => {
                if let Some(name) = self.ident(next) {
                    let opens_body = match self.token(next + 1) {
                        Some(Token::Punct(b'{' | b':')) => true,
                        Some(Token::Ident(word)) => word.eq_ignore_ascii_case("implements"),
                        _ => false,
                    };
                    if opens_body {
                        self.push(SymbolKind::Class, name);
                    }
                }
                index
            }
            "function" => {
                let at = if self.token(next) == Some(Token::Punct(b'&')) { next + 1 } else { next };
                if let Some(name) = self.ident(at) {
                    // Hack generics: `function id<T>(T $x): T`
                    if matches!(self.token(at + 1), Some(Token::Punct(b'(' | b'<'))) {
                        self.push(SymbolKind::Function, name);
                    }
                }
                index
            }
            "type" | "newtype" => {
                if let Some(name) = self.ident(next) {
                    let is_alias = match self.token(next + 1) {
                        Some(Token::Punct(b'=' | b'<')) => true,
                        Some(Token::Ident(word)) => word.eq_ignore_ascii_case("as"),
                        _ => false,
                    };
                    if is_alias {
                        self.push(SymbolKind::Type, name);
                    }
                }
                index
            }
            "const" => self.constant_declaration(index),
            "define" => {
                // Only a lone literal names the constant, not `'A' . 'B'`
                let literal_argument = self.token(next) == Some(Token::Punct(b'('))
                    && matches!(self.token(next + 2), Some(Token::Punct(b',' | b')')));
                if literal_argument {
                    if let Some(Token::Str(literal)) = self.token(next + 1) {
                        if let Some(name) = unquote_literal(literal) {
                            let name = name.trim_start_matches('\\').to_string();
                            self.definitions
                                .push(Definition::new(SymbolKind::Constant, name, self.path));
                        }
                    }
                }
                index
            }
            _ => index,
        }
    }

    /// `namespace Name;`, `namespace Name {` or `namespace {`
    fn namespace_declaration(&mut self, index: usize) -> usize {
        let next = index + 1;
        match (self.token(next), self.token(next + 1)) {
            (Some(Token::Ident(name)), Some(Token::Punct(b';'))) => {
                self.namespace = Some(name.trim_matches('\\').to_string());
                next + 1
            }
            (Some(Token::Ident(name)), Some(Token::Punct(b'{'))) => {
                self.namespace = Some(name.trim_matches('\\').to_string());
                self.nesting.expect_namespace_body();
                next
            }
            (Some(Token::Punct(b'{')), _) => {
                self.namespace = None;
                self.nesting.expect_namespace_body();
                index
            }
            _ => index,
        }
    }

    /// Raw XHP element name starting at the `:` token, mangled
    fn xhp_name(&self, colon: usize) -> Option<String> {
        let start = self.tokens[colon].start;
        let mut end = self.tokens[colon].end;
        let mut at = colon + 1;
        while let Some(spanned) = self.tokens.get(at) {
            let joins = spanned.start == end
                && matches!(spanned.token, Token::Ident(_) | Token::Punct(b':' | b'-'));
            if !joins {
                break;
            }
            end = spanned.end;
            at += 1;
        }

        if at == colon + 1 {
            return None;
        }
        Some(xhp_class_name(&self.source[start..end]))
    }

    /// `const A = ..., B = ...;`, returning the index of the terminator
    fn constant_declaration(&mut self, index: usize) -> usize {
        let mut at = index + 1;
        let mut depth = 0usize;
        let mut last_ident: Option<&'s str> = None;
        let mut in_value = false;

        while let Some(token) = self.token(at) {
            match token {
                Token::Punct(b'(' | b'[' | b'{') => depth += 1,
                Token::Punct(b')' | b']' | b'}') => depth = depth.saturating_sub(1),
                Token::Punct(b'=') if depth == 0 && !in_value => {
                    if let Some(name) = last_ident.take() {
                        self.push(SymbolKind::Constant, name);
                    }
                    in_value = true;
                }
                Token::Punct(b',') if depth == 0 => in_value = false,
                Token::Punct(b';') if depth == 0 => return at,
                Token::CloseTag if depth == 0 => return at,
                Token::Ident(name) if !in_value => last_ident = Some(name),
                _ => {}
            }
            at += 1;
        }

        at.saturating_sub(1)
    }
}
