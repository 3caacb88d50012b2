//! Lowering of Hack-only syntax to PHP the AST parser accepts
//!
//! Rewritten before parsing:
//! - `<?hh` open tags become `<?php`; headerless `.hack`/`.hck` files get one
//! - XHP class names (`class :ui:button`) become their mangled names
//! - `type`/`newtype` aliases are blanked out and reported separately
//! - generic parameters of class-like and function declarations are blanked
//! - Hack enum bodies (`FOO = 1;`) are blanked, leaving an empty enum
//!
//! Aliases, generics and enums are found with the shared lexer, so comments,
//! strings and heredocs are never rewritten. Blanking keeps every byte
//! offset stable, so alias offsets can later be matched against namespace
//! spans from the parsed program.

use crate::lexer::{self, Nesting, Spanned, Token};
use automap_core::names::xhp_class_name;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;

/// Extensions of Hack files that are code from the first byte
pub const HEADERLESS_EXTENSIONS: [&str; 2] = ["hack", "hck"];

/// Open tag put in front of headerless files, kept on the first line
const CODE_PREFIX: &str = "<?php ";

/// A type alias lifted out of the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    /// Unqualified alias name
    pub name: String,
    /// Byte offset of the declaration in the lowered source
    pub offset: usize,
}

/// Source rewritten for the AST parser
#[derive(Debug, Clone)]
pub struct LoweredSource {
    pub source: String,
    pub type_aliases: Vec<TypeAlias>,
}

fn hh_open_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<\?hh\b").unwrap())
}

fn xhp_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)(^|[^:\w$>])((?i:class|extends)\s+):([A-Za-z_][\w\-]*(?::[A-Za-z_][\w\-]*)*)",
        )
        .unwrap()
    })
}

/// Whether a file is code from its first byte
///
/// Only `.hack` and `.hck` files may omit the open tag. One that carries a
/// tag anyway (after an optional shebang line) is read like any other file.
pub fn starts_in_code(path: &Path, source: &str) -> bool {
    let headerless_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HEADERLESS_EXTENSIONS.iter().any(|h| ext.eq_ignore_ascii_case(h)));
    if !headerless_extension {
        return false;
    }

    let body = match source.strip_prefix("#!") {
        Some(rest) => rest.split_once('\n').map_or("", |(_, body)| body),
        None => source,
    };
    !body.trim_start().starts_with("<?")
}

/// Rewrite Hack-only constructs; plain PHP passes through unchanged
pub fn lower(source: &str, path: &Path) -> LoweredSource {
    let source = if starts_in_code(path, source) {
        Cow::Owned(format!("{CODE_PREFIX}{source}"))
    } else {
        Cow::Borrowed(source)
    };
    let source = hh_open_tag().replace_all(&source, "<?php");
    let source = xhp_class().replace_all(&source, |caps: &regex::Captures<'_>| {
        format!("{}{}{}", &caps[1], &caps[2], xhp_class_name(&caps[3]))
    });

    // The parser reports the same problem with its own message
    let Ok(tokens) = lexer::tokenize(&source) else {
        return LoweredSource {
            source: source.to_string(),
            type_aliases: Vec::new(),
        };
    };

    let mut lowering = Lowering::new(&tokens);
    lowering.run();

    LoweredSource {
        source: blank_ranges(&source, &mut lowering.blanks),
        type_aliases: lowering.type_aliases,
    }
}

/// Finds the byte ranges to blank in one file
struct Lowering<'s, 't> {
    tokens: &'t [Spanned<'s>],
    nesting: Nesting,
    blanks: Vec<(usize, usize)>,
    type_aliases: Vec<TypeAlias>,
}

impl<'s, 't> Lowering<'s, 't> {
    fn new(tokens: &'t [Spanned<'s>]) -> Self {
        Self {
            tokens,
            nesting: Nesting::default(),
            blanks: Vec::new(),
            type_aliases: Vec::new(),
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

    /// Blank tokens `first..=last` and the space between them
    fn blank(&mut self, first: usize, last: usize) {
        self.blanks.push((self.tokens[first].start, self.tokens[last].end));
    }

    fn run(&mut self) {
        let mut index = 0;
        while index < self.tokens.len() {
            let spanned = self.tokens[index];
            match spanned.token {
                Token::Punct(b'{') => self.nesting.open(),
                Token::Punct(b'}') => {
                    self.nesting.close();
                }
                Token::Ident(word)
                    if self.nesting.is_top_level() && lexer::starts_statement(self.tokens, index) =>
                {
                    index = self.statement(word, index);
                }
                _ => {}
            }
            index += 1;
        }
    }

    /// Handle a statement-initial word, returning the last index consumed
    fn statement(&mut self, word: &str, index: usize) -> usize {
        let next = index + 1;
        match word.trim_start_matches('\\').to_ascii_lowercase().as_str() {
            "__halt_compiler" => self.tokens.len(),
            "namespace" => {
                let opens_body = match self.token(next) {
                    Some(Token::Punct(b'{')) => true,
                    Some(Token::Ident(_)) => self.token(next + 1) == Some(Token::Punct(b'{')),
                    _ => false,
                };
                if opens_body {
                    self.nesting.expect_namespace_body();
                }
                index
            }
            "type" | "newtype" => self.type_alias(index),
            "class" | "interface" | "trait" => {
                self.header_generics(next);
                index
            }
            "function" => {
                let at = if self.token(next) == Some(Token::Punct(b'&')) { next + 1 } else { next };
                if self.ident(at).is_some() && self.token(at + 1) == Some(Token::Punct(b'<')) {
                    if let Some(close) = lexer::matching_angle(self.tokens, at + 1) {
                        self.blank(at + 1, close);
                    }
                }
                index
            }
            "enum" => {
                self.hack_enum(index);
                index
            }
            _ => index,
        }
    }

    /// `type Name = ...;` or `newtype Name as T = ...;`
    fn type_alias(&mut self, index: usize) -> usize {
        let Some(name) = self.ident(index + 1) else {
            return index;
        };
        let is_alias = match self.token(index + 2) {
            Some(Token::Punct(b'=' | b'<')) => true,
            Some(Token::Ident(word)) => word.eq_ignore_ascii_case("as"),
            _ => false,
        };
        if !is_alias {
            return index;
        }
        let Some(end) = self.statement_end(index) else {
            return index;
        };

        self.blank(index, end);
        self.type_aliases.push(TypeAlias {
            name: name.to_string(),
            offset: self.tokens[index].start,
        });
        end
    }

    /// Index of the `;` ending the statement at `index`
    fn statement_end(&self, index: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (at, spanned) in self.tokens.iter().enumerate().skip(index) {
            match spanned.token {
                Token::Punct(b'(' | b'[' | b'{') => depth += 1,
                Token::Punct(b')' | b']' | b'}') => depth = depth.saturating_sub(1),
                Token::Punct(b';') if depth == 0 => return Some(at),
                Token::CloseTag => return None,
                _ => {}
            }
        }
        None
    }

    /// Blank every `<...>` group in a class-like header
    fn header_generics(&mut self, from: usize) {
        let mut at = from;
        while let Some(token) = self.token(at) {
            match token {
                Token::Punct(b'{' | b';') => return,
                Token::Punct(b'<') => match lexer::matching_angle(self.tokens, at) {
                    Some(close) => {
                        self.blank(at, close);
                        at = close;
                    }
                    None => return,
                },
                _ => {}
            }
            at += 1;
        }
    }

    /// `enum Name: int as int { A = 1; }` becomes `enum Name { }`
    ///
    /// PHP enums (`case A = 1;`) are left alone.
    fn hack_enum(&mut self, index: usize) {
        let name = index + 1;
        if self.ident(name).is_none() {
            return;
        }

        let mut open = name + 1;
        loop {
            match self.token(open) {
                Some(Token::Punct(b'{')) => break,
                Some(Token::Punct(b';' | b'}')) | None => return,
                _ => open += 1,
            }
        }

        let hack_members =
            self.ident(open + 1).is_some() && self.token(open + 2) == Some(Token::Punct(b'='));
        if !hack_members {
            return;
        }
        let Some(close) = self.matching_brace(open) else {
            return;
        };

        if open > name + 1 {
            self.blank(name + 1, open - 1);
        }
        if close > open + 1 {
            self.blank(open + 1, close - 1);
        }
    }

    fn matching_brace(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (at, spanned) in self.tokens.iter().enumerate().skip(open) {
            match spanned.token {
                Token::Punct(b'{') => depth += 1,
                Token::Punct(b'}') => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(at);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Replace each range with whitespace of the same byte length, keeping
/// line breaks
fn blank_ranges(source: &str, ranges: &mut [(usize, usize)]) -> String {
    ranges.sort_unstable();

    let mut lowered = String::with_capacity(source.len());
    let mut last = 0;
    for &(start, end) in ranges.iter() {
        if start < last {
            continue;
        }
        lowered.push_str(&source[last..start]);
        for ch in source[start..end].chars() {
            match ch {
                '\n' | '\r' => lowered.push(ch),
                _ => lowered.extend(std::iter::repeat(' ').take(ch.len_utf8())),
            }
        }
        last = end;
    }
    lowered.push_str(&source[last..]);
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_php(source: &str) -> LoweredSource {
        lower(source, Path::new("test.php"))
    }

    fn alias_names(lowered: &LoweredSource) -> Vec<&str> {
        lowered.type_aliases.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_plain_php_is_untouched() {
        let source = "<?php\nclass Foo {}\n$type = 'x';\nenum Suit: string { case H = 'h'; }\n";
        let lowered = lower_php(source);
        assert_eq!(lowered.source, source);
        assert!(lowered.type_aliases.is_empty());
    }

    #[test]
    fn test_hh_header_is_rewritten() {
        let lowered = lower_php("<?hh // strict\nclass Foo {}\n");
        assert!(lowered.source.starts_with("<?php // strict"));
    }

    #[test]
    fn test_type_aliases_are_blanked_with_stable_offsets() {
        let source = "<?php\ntype Point = shape(\n  'x' => int,\n);\nnewtype Id as int = int;\nclass After {}\n";
        let lowered = lower_php(source);

        assert_eq!(lowered.source.len(), source.len());
        assert_eq!(alias_names(&lowered), vec!["Point", "Id"]);
        assert_eq!(lowered.type_aliases[0].offset, source.find("type Point").unwrap());
        assert!(!lowered.source.contains("Point"));
        assert!(lowered.source.contains("class After {}"));
        assert_eq!(lowered.source.lines().count(), source.lines().count());
    }

    #[test]
    fn test_aliases_in_comments_and_strings_are_kept() {
        let source = r#"<?hh
/*
type Hidden = int;
*/
// newtype AlsoHidden = string;
const BANNER = <<<EOT
type InHeredoc = string;
EOT;
function banner(): string {
  type Nested = int;
  return "type InString = int;";
}
type Visible = int;
"#;
        let lowered = lower_php(source);
        assert_eq!(alias_names(&lowered), vec!["Visible"]);
        assert!(lowered.source.contains("type Hidden = int;"));
        assert!(lowered.source.contains("type InHeredoc = string;"));
        assert!(lowered.source.contains("\"type InString = int;\""));
        assert!(lowered.source.contains("type Nested = int;"));
    }

    #[test]
    fn test_xhp_class_names_are_mangled() {
        let lowered = lower_php("<?php\nclass :example:xhp-class extends :x:element {}\n$a = Foo::class;\n");
        assert!(lowered
            .source
            .contains("class xhp_example__xhp_class extends xhp_x__element {}"));
        assert!(lowered.source.contains("Foo::class;"));
    }

    #[test]
    fn test_declaration_generics_are_blanked() {
        let source = "<?php\nclass Box<T> extends Base<T> implements Boxed<Map<string, T>> {}\nfunction id<T as arraykey>(T $x): T { return $x < 1; }\n";
        let lowered = lower_php(source);

        assert_eq!(lowered.source.len(), source.len());
        assert!(lowered.source.contains("class Box    extends Base    implements Boxed"));
        assert!(lowered.source.contains("function id               (T $x): T"));
        assert!(lowered.source.contains("return $x < 1;"));
        assert!(!lowered.source.contains("<T"));
    }

    #[test]
    fn test_hack_enum_body_is_blanked() {
        let source = "<?php\nenum Status: int as int {\n  ACTIVE = 1;\n  INACTIVE = 2;\n}\n";
        let lowered = lower_php(source);

        assert_eq!(lowered.source.len(), source.len());
        assert!(lowered.source.starts_with("<?php\nenum Status"));
        assert!(!lowered.source.contains("ACTIVE"));
        assert!(!lowered.source.contains("int"));
        assert_eq!(lowered.source.matches('{').count(), 1);
        assert_eq!(lowered.source.matches('}').count(), 1);
    }

    #[test]
    fn test_headerless_hack_files() {
        assert!(starts_in_code(Path::new("x.hack"), "namespace Fx;\n"));
        assert!(starts_in_code(Path::new("x.HCK"), "#!/usr/bin/env hhvm\nnamespace Fx;\n"));
        assert!(!starts_in_code(Path::new("x.hack"), "<?hh\nnamespace Fx;\n"));
        assert!(!starts_in_code(Path::new("x.php"), "namespace Fx;\n"));

        let source = "namespace Fx;\nclass Headerless {}\ntype Id = int;\n";
        let lowered = lower(source, Path::new("x.hack"));
        assert!(lowered.source.starts_with("<?php namespace Fx;\n"));
        assert_eq!(alias_names(&lowered), vec!["Id"]);
        assert_eq!(lowered.source.lines().count(), source.lines().count());
    }
}
