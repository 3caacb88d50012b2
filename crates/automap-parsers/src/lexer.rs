//! Byte-level PHP/Hack lexer
//!
//! Produces just enough tokens to find declarations: names, a handful of
//! punctuation, and opaque placeholders for strings, heredocs, numbers
//! and variables. Comments and inline HTML are dropped.
//!
//! Shared by the fact scanner and by the Hack lowering pass, so both agree
//! on what is code and what is a comment or string.

/// A lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'s> {
    OpenTag,
    CloseTag,
    /// Identifier, keyword or (possibly qualified) name
    Ident(&'s str),
    Variable,
    /// Single- or double-quoted string, quotes included
    Str(&'s str),
    /// Heredoc, nowdoc or backtick string
    Template,
    Number,
    /// `->` or `?->`
    Arrow,
    DoubleColon,
    Punct(u8),
}

/// A token with its byte range in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned<'s> {
    pub token: Token<'s>,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

impl LexError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'\\' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'\\' || b >= 0x80
}

/// Tokenize a whole file that starts in inline HTML
pub fn tokenize(source: &str) -> Result<Vec<Spanned<'_>>, LexError> {
    Lexer::new(source, false).collect_tokens()
}

/// Tokenize a file that is code from the first byte (no open tag)
pub fn tokenize_code(source: &str) -> Result<Vec<Spanned<'_>>, LexError> {
    Lexer::new(source, true).collect_tokens()
}

/// Whether the token at `index` begins a statement
pub fn starts_statement(tokens: &[Spanned<'_>], index: usize) -> bool {
    let Some(prev) = index.checked_sub(1).and_then(|i| tokens.get(i)) else {
        return true;
    };
    match prev.token {
        Token::OpenTag | Token::CloseTag => true,
        Token::Punct(b';' | b'{' | b'}' | b']') => true,
        Token::Ident(word) => ["abstract", "final", "readonly"]
            .iter()
            .any(|m| word.eq_ignore_ascii_case(m)),
        _ => false,
    }
}

/// Index of the `>` closing the `<` at `open`, counting nested pairs
pub fn matching_angle(tokens: &[Spanned<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (at, spanned) in tokens.iter().enumerate().skip(open) {
        match spanned.token {
            Token::Punct(b'<') => depth += 1,
            Token::Punct(b'>') => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(at);
                }
            }
            Token::Punct(b'{' | b'}' | b';') => return None,
            _ => {}
        }
    }
    None
}

/// Kind of an open brace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brace {
    Namespace,
    Block,
}

/// Brace nesting, telling namespace bodies apart from code blocks
#[derive(Debug, Default)]
pub struct Nesting {
    braces: Vec<Brace>,
    namespace_pending: bool,
}

impl Nesting {
    /// The next `{` opens a namespace body
    pub fn expect_namespace_body(&mut self) {
        self.namespace_pending = true;
    }

    pub fn open(&mut self) {
        let brace = if std::mem::take(&mut self.namespace_pending) {
            Brace::Namespace
        } else {
            Brace::Block
        };
        self.braces.push(brace);
    }

    /// Close the innermost brace; `None` when nothing is open
    pub fn close(&mut self) -> Option<Brace> {
        self.braces.pop()
    }

    /// Outside every code block (namespace bodies do not count)
    pub fn is_top_level(&self) -> bool {
        self.braces.iter().all(|b| *b == Brace::Namespace)
    }

    pub fn is_balanced(&self) -> bool {
        self.braces.is_empty()
    }
}

struct Lexer<'s> {
    text: &'s str,
    src: &'s [u8],
    pos: usize,
    in_php: bool,
}

impl<'s> Lexer<'s> {
    fn new(text: &'s str, in_php: bool) -> Self {
        Self {
            text,
            src: text.as_bytes(),
            pos: 0,
            in_php,
        }
    }

    fn collect_tokens(mut self) -> Result<Vec<Spanned<'s>>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn starts_with_ignore_case(&self, at: usize, needle: &[u8]) -> bool {
        self.src
            .get(at..at + needle.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    }

    fn spanned(&self, token: Token<'s>, start: usize) -> Spanned<'s> {
        Spanned {
            token,
            start,
            end: self.pos,
        }
    }

    fn next_token(&mut self) -> Result<Option<Spanned<'s>>, LexError> {
        loop {
            if !self.in_php {
                return Ok(self.skip_inline_html());
            }

            while self.peek(0).is_some_and(|b| b.is_ascii_whitespace()) {
                self.pos += 1;
            }

            let start = self.pos;
            let Some(c) = self.peek(0) else {
                return Ok(None);
            };

            match c {
                b'?' if self.peek(1) == Some(b'>') => {
                    self.pos += 2;
                    self.in_php = false;
                    return Ok(Some(self.spanned(Token::CloseTag, start)));
                }
                b'?' if self.peek(1) == Some(b'-') && self.peek(2) == Some(b'>') => {
                    self.pos += 3;
                    return Ok(Some(self.spanned(Token::Arrow, start)));
                }
                b'-' if self.peek(1) == Some(b'>') => {
                    self.pos += 2;
                    return Ok(Some(self.spanned(Token::Arrow, start)));
                }
                b':' if self.peek(1) == Some(b':') => {
                    self.pos += 2;
                    return Ok(Some(self.spanned(Token::DoubleColon, start)));
                }
                b'#' if self.peek(1) == Some(b'[') => {
                    self.pos += 1;
                    return Ok(Some(self.spanned(Token::Punct(b'#'), start)));
                }
                b'#' => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'\'' => {
                    self.skip_quoted(b'\'')?;
                    let token = Token::Str(&self.text[start..self.pos]);
                    return Ok(Some(self.spanned(token, start)));
                }
                b'"' => {
                    self.skip_quoted(b'"')?;
                    let token = Token::Str(&self.text[start..self.pos]);
                    return Ok(Some(self.spanned(token, start)));
                }
                b'`' => {
                    self.skip_quoted(b'`')?;
                    return Ok(Some(self.spanned(Token::Template, start)));
                }
                b'<' if self.peek(1) == Some(b'<') && self.peek(2) == Some(b'<') => {
                    self.skip_heredoc()?;
                    return Ok(Some(self.spanned(Token::Template, start)));
                }
                b'$' if self.peek(1).is_some_and(|b| is_ident_start(b) && b != b'\\') => {
                    self.pos += 1;
                    self.skip_while(is_ident_char);
                    return Ok(Some(self.spanned(Token::Variable, start)));
                }
                b'0'..=b'9' => {
                    self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
                    return Ok(Some(self.spanned(Token::Number, start)));
                }
                c if is_ident_start(c) => {
                    self.skip_while(is_ident_char);
                    let token = Token::Ident(&self.text[start..self.pos]);
                    return Ok(Some(self.spanned(token, start)));
                }
                c => {
                    self.pos += 1;
                    return Ok(Some(self.spanned(Token::Punct(c), start)));
                }
            }
        }
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek(0).is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// Skip to the next open tag, returning it if found
    fn skip_inline_html(&mut self) -> Option<Spanned<'s>> {
        while self.pos < self.src.len() {
            if self.src[self.pos] != b'<' || self.peek(1) != Some(b'?') {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            let after = self.pos + 2;
            let tag_len = if self.starts_with_ignore_case(after, b"php")
                && self.src.get(after + 3).map_or(true, |b| b.is_ascii_whitespace())
            {
                Some(5)
            } else if self.starts_with_ignore_case(after, b"hh")
                && self.src.get(after + 2).map_or(true, |b| !is_ident_char(*b))
            {
                Some(4)
            } else if self.src.get(after) == Some(&b'=') {
                Some(3)
            } else if self.src.get(after).map_or(true, |b| b.is_ascii_whitespace()) {
                Some(2)
            } else {
                None
            };

            match tag_len {
                Some(len) => {
                    self.pos += len;
                    self.in_php = true;
                    return Some(self.spanned(Token::OpenTag, start));
                }
                None => self.pos += 2,
            }
        }
        None
    }

    /// `//` and `#` comments end at a newline or a close tag
    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' || (b == b'?' && self.peek(1) == Some(b'>')) {
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 2;
        while self.pos < self.src.len() {
            if self.src[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(LexError::new(start, "unterminated comment"))
    }

    /// Skip a quoted string starting at the opening quote
    fn skip_quoted(&mut self, quote: u8) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                b'{' if quote != b'\'' && self.peek(1) == Some(b'$') => self.skip_interpolation()?,
                b'$' if quote != b'\'' && self.peek(1) == Some(b'{') => {
                    self.pos += 1;
                    self.skip_interpolation()?;
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError::new(start, "unterminated string"))
    }

    /// Skip a `{...}` interpolation inside a string, honoring nested strings
    fn skip_interpolation(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.peek(0) {
            match b {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\'' | b'"' => self.skip_quoted(b)?,
                _ => self.pos += 1,
            }
        }
        Err(LexError::new(start, "unterminated string interpolation"))
    }

    /// Skip a heredoc or nowdoc starting at `<<<`
    fn skip_heredoc(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 3;
        self.skip_while(|b| b == b' ' || b == b'\t');

        let quote = match self.peek(0) {
            Some(q @ (b'\'' | b'"')) => {
                self.pos += 1;
                Some(q)
            }
            _ => None,
        };

        let label_start = self.pos;
        self.skip_while(is_ident_char);
        let label = &self.src[label_start..self.pos];
        if label.is_empty() {
            return Err(LexError::new(start, "missing heredoc label"));
        }

        if let Some(q) = quote {
            if self.peek(0) != Some(q) {
                return Err(LexError::new(start, "unterminated heredoc label"));
            }
            self.pos += 1;
        }

        // The body starts on the next line; the closing label is the first
        // line whose indentation is followed by the label and a non-name byte.
        while let Some(b) = self.peek(0) {
            self.pos += 1;
            if b != b'\n' {
                continue;
            }

            let mut line = self.pos;
            while self.src.get(line).is_some_and(|b| *b == b' ' || *b == b'\t') {
                line += 1;
            }
            let end = line + label.len();
            if self.src.get(line..end) == Some(label)
                && self.src.get(end).map_or(true, |b| !is_ident_char(*b))
            {
                self.pos = end;
                return Ok(());
            }
        }

        Err(LexError::new(start, "unterminated heredoc"))
    }
}
