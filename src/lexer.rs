//! Tokenizer for the supported ECMAScript 5 subset.
//!
//! Tokens carry their line/column and whether a line terminator preceded them,
//! which the parser needs for automatic semicolon insertion and the restricted
//! productions (`return`, postfix `++`/`--`).
//!
//! A `/` starts a regular expression literal unless the previous significant
//! token ends an expression (identifier, literal, `this`, `)` or `]`).

use crate::{JsrtError, Result};

/// Reserved words recognized by the lexer.
pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "in",
    "instanceof",
    "new",
    "null",
    "return",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
];

/// Punctuators, longest first so that greedy matching works.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "{", "}", "(", ")", "[", "]",
    ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(&'static str),
    Punct(&'static str),
    Number(f64),
    String(String),
    Regex { pattern: String, flags: String },
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    pub fn is_keyword(&self, k: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword(q) if q == k)
    }

    /// Short human-readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Keyword(k) => format!("keyword '{}'", k),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Regex { .. } => "regular expression".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_alphanumeric()
}

/// Converts source text into tokens. The last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' || (c == '\r' && self.peek() != Some('\n')) || c == '\u{2028}' || c == '\u{2029}'
        {
            self.line += 1;
            self.column = 1;
        } else if c != '\r' {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> JsrtError {
        JsrtError::syntax(self.line, self.column, message)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        loop {
            let newline_before = self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let kind = match self.peek() {
                None => TokenKind::Eof,
                Some(c) => self.scan(c)?,
            };
            let done = kind == TokenKind::Eof;
            self.tokens.push(Token {
                kind,
                line,
                column,
                newline_before,
            });
            if done {
                return Ok(self.tokens);
            }
        }
    }

    /// Skips whitespace and comments; reports whether a line terminator was crossed.
    fn skip_trivia(&mut self) -> Result<bool> {
        let mut newline = false;
        while let Some(c) = self.peek() {
            if is_line_terminator(c) {
                newline = true;
                self.bump();
            } else if c.is_whitespace() || c == '\u{feff}' {
                self.bump();
            } else if c == '/' && self.peek_at(1) == Some('/') {
                while let Some(c) = self.peek() {
                    if is_line_terminator(c) {
                        break;
                    }
                    self.bump();
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.bump();
                self.bump();
                loop {
                    match self.bump() {
                        None => return Err(self.error("unterminated comment")),
                        Some('*') if self.peek() == Some('/') => {
                            self.bump();
                            break;
                        }
                        Some(c) if is_line_terminator(c) => newline = true,
                        Some(_) => {}
                    }
                }
            } else {
                break;
            }
        }
        Ok(newline)
    }

    fn scan(&mut self, c: char) -> Result<TokenKind> {
        if is_identifier_start(c) || c == '\\' {
            return self.scan_word();
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            return self.scan_number();
        }
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }
        if c == '/' && self.regex_allowed() {
            return self.scan_regex();
        }
        self.scan_punct()
    }

    /// A regex may start wherever an expression may start.
    fn regex_allowed(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            None => true,
            Some(TokenKind::Identifier(_))
            | Some(TokenKind::Number(_))
            | Some(TokenKind::String(_))
            | Some(TokenKind::Regex { .. }) => false,
            Some(TokenKind::Keyword(k)) => !matches!(*k, "this" | "null" | "true" | "false"),
            Some(TokenKind::Punct(p)) => !matches!(*p, ")" | "]" | "}"),
            Some(TokenKind::Eof) => false,
        }
    }

    fn scan_word(&mut self) -> Result<TokenKind> {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                if self.bump() != Some('u') {
                    return Err(self.error("invalid escape in identifier"));
                }
                word.push(self.scan_unicode_escape()?);
            } else if is_identifier_part(c) {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(match KEYWORDS.iter().find(|k| **k == word) {
            Some(k) => TokenKind::Keyword(*k),
            None => TokenKind::Identifier(word),
        })
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                digits.push(c);
                self.bump();
            }
            if digits.is_empty() {
                return Err(self.error("missing hexadecimal digits"));
            }
            let value = digits
                .chars()
                .filter_map(|d| d.to_digit(16))
                .fold(0f64, |acc, d| acc * 16.0 + f64::from(d));
            return self.finish_number(value);
        }

        let mut text = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(c);
            self.bump();
        }
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                text.push(c);
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = self.peek_at(1);
            let exponent_follows = match sign {
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|d| d.is_ascii_digit()),
                Some(d) => d.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                text.push('e');
                self.bump();
                if let Some(s @ ('+' | '-')) = self.peek() {
                    text.push(s);
                    self.bump();
                }
                while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                    text.push(c);
                    self.bump();
                }
            }
        }
        let value: f64 = text
            .parse()
            .map_err(|_| self.error(format!("invalid number literal '{}'", text)))?;
        self.finish_number(value)
    }

    fn finish_number(&mut self, value: f64) -> Result<TokenKind> {
        if self.peek().is_some_and(is_identifier_start) {
            return Err(self.error("identifier starts immediately after numeric literal"));
        }
        Ok(TokenKind::Number(value))
    }

    fn scan_unicode_escape(&mut self) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        Ok(char::from_u32(code).unwrap_or('\u{fffd}'))
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => break,
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error("unterminated string literal"))
                }
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated string literal"))?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                            value.push('\0')
                        }
                        'x' => {
                            let hi = self.bump().and_then(|c| c.to_digit(16));
                            let lo = self.bump().and_then(|c| c.to_digit(16));
                            match (hi, lo) {
                                (Some(hi), Some(lo)) => {
                                    value.push(char::from_u32(hi * 16 + lo).unwrap_or('\u{fffd}'))
                                }
                                _ => return Err(self.error("invalid hexadecimal escape")),
                            }
                        }
                        'u' => value.push(self.scan_unicode_escape()?),
                        '\r' => {
                            if self.peek() == Some('\n') {
                                self.bump();
                            }
                        }
                        c if is_line_terminator(c) => {}
                        other => value.push(other),
                    }
                }
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::String(value))
    }

    fn scan_regex(&mut self) -> Result<TokenKind> {
        self.bump();
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated regular expression")),
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error("unterminated regular expression"))
                }
                Some('\\') => {
                    pattern.push('\\');
                    match self.bump() {
                        Some(c) if !is_line_terminator(c) => pattern.push(c),
                        _ => return Err(self.error("unterminated regular expression")),
                    }
                }
                Some('[') => {
                    in_class = true;
                    pattern.push('[');
                }
                Some(']') => {
                    in_class = false;
                    pattern.push(']');
                }
                Some('/') if !in_class => break,
                Some(c) => pattern.push(c),
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek().filter(|c| is_identifier_part(*c)) {
            flags.push(c);
            self.bump();
        }
        Ok(TokenKind::Regex { pattern, flags })
    }

    fn scan_punct(&mut self) -> Result<TokenKind> {
        for p in PUNCTUATORS {
            let matches = p
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c));
            if matches {
                for _ in 0..p.chars().count() {
                    self.bump();
                }
                return Ok(TokenKind::Punct(p));
            }
        }
        let c = self.peek().unwrap_or(' ');
        Err(self.error(format!("unexpected character '{}'", c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_member_call_tokens() {
        assert_eq!(
            kinds("foo.bar.foobar();"),
            vec![
                TokenKind::Identifier("foo".into()),
                TokenKind::Punct("."),
                TokenKind::Identifier("bar".into()),
                TokenKind::Punct("."),
                TokenKind::Identifier("foobar".into()),
                TokenKind::Punct("("),
                TokenKind::Punct(")"),
                TokenKind::Punct(";"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = kinds("x = a / b; y = /foo[/]bar/gi");
        assert!(tokens.contains(&TokenKind::Punct("/")));
        assert!(tokens.contains(&TokenKind::Regex {
            pattern: "foo[/]bar".into(),
            flags: "gi".into(),
        }));
    }

    #[test]
    fn test_regex_after_call_argument_paren() {
        let tokens = kinds("expect(s).toMatch(/foobar/);");
        assert!(tokens.contains(&TokenKind::Regex {
            pattern: "foobar".into(),
            flags: String::new(),
        }));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0x1F")[0], TokenKind::Number(31.0));
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
        assert_eq!(kinds("1e3")[0], TokenKind::Number(1000.0));
        assert_eq!(kinds("2.5E-1")[0], TokenKind::Number(0.25));
        assert!(tokenize("3in").is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'a\n\x41B\'"'"#)[0],
            TokenKind::String("a\nAB'\"".into())
        );
        assert!(tokenize("'open").is_err());
    }

    #[test]
    fn test_newline_tracking() {
        let tokens = tokenize("a\n/* x\n */ b // c\nd").unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].line, 3);
        assert!(tokens[2].newline_before);
        assert_eq!(tokens[2].line, 4);
    }
}
