//! Tokenizer for schema source.

use crate::error::{CompileError, Result};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal.
    Number(f64),
    /// String literal, escapes resolved.
    String(String),
    /// Identifier or keyword.
    Ident(String),
    /// Punctuator.
    Punct(&'static str),
    /// Regular expression literal.
    Regex {
        /// Pattern between the slashes.
        source: String,
        /// Flags after the closing slash.
        flags: String,
    },
}

impl Token {
    /// Whether this is the punctuator `p`.
    pub fn is(&self, p: &str) -> bool {
        matches!(self, Self::Punct(q) if *q == p)
    }

    /// Whether this is the identifier or keyword `name`.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Self::Ident(n) if n == name)
    }

    /// Description used in "Unexpected ..." messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Number(_) => "number".to_string(),
            Self::String(_) => "string".to_string(),
            Self::Ident(name) if is_reserved(name) => format!("token '{name}'"),
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::Punct(p) => format!("token '{p}'"),
            Self::Regex { .. } => "regular expression".to_string(),
        }
    }

    /// Whether a `/` after this token divides rather than starts a regex.
    fn ends_operand(&self) -> bool {
        match self {
            Self::Number(_) | Self::String(_) | Self::Regex { .. } => true,
            Self::Ident(name) => !matches!(
                name.as_str(),
                "typeof" | "void" | "return" | "in" | "instanceof" | "new" | "delete"
            ),
            Self::Punct(p) => matches!(*p, ")" | "]" | "}"),
        }
    }
}

/// Words that cannot be used as identifiers.
pub fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "let"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
    )
}

/// Punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    "...", "===", "!==", "**", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "{", "}", "(",
    ")", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":",
    ".", "=",
];

fn invalid_token() -> CompileError {
    CompileError::syntax("Invalid or unexpected token")
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        Some(c)
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c))
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.pos += 1;
            } else if self.starts_with("//") {
                while self.peek(0).is_some_and(|c| c != '\n' && c != '\r') {
                    self.pos += 1;
                }
            } else if self.starts_with("/*") {
                self.skip_block_comment()?;
            } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
                let token = self.number()?;
                self.tokens.push(token);
            } else if c == '"' || c == '\'' {
                let token = self.string(c)?;
                self.tokens.push(token);
            } else if c == '`' {
                return Err(CompileError::syntax("Template literals are not supported"));
            } else if is_ident_start(c) {
                let token = self.ident();
                self.tokens.push(token);
            } else if c == '/' && !self.tokens.last().is_some_and(Token::ends_operand) {
                let token = self.regex()?;
                self.tokens.push(token);
            } else {
                let token = self.punct()?;
                self.tokens.push(token);
            }
        }
        Ok(self.tokens)
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        self.pos += 2;
        loop {
            if self.starts_with("*/") {
                self.pos += 2;
                return Ok(());
            }
            if self.bump().is_none() {
                return Err(invalid_token());
            }
        }
    }

    fn digits(&mut self, radix: u32) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_digit(radix) {
                out.push(c);
            } else if c != '_' || !self.peek(1).is_some_and(|d| d.is_digit(radix)) || out.is_empty() {
                break;
            }
            self.pos += 1;
        }
        out
    }

    fn number(&mut self) -> Result<Token> {
        let radix = match (self.peek(0), self.peek(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.pos += 2;
            let digits = self.digits(radix);
            if digits.is_empty() {
                return Err(invalid_token());
            }
            #[allow(clippy::cast_precision_loss)]
            u128::from_str_radix(&digits, radix).map_or(f64::INFINITY, |n| n as f64)
        } else {
            if self.peek(0) == Some('0') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                return Err(CompileError::syntax(
                    "Octal literals are not allowed in strict mode.",
                ));
            }
            let mut text = self.digits(10);
            if self.peek(0) == Some('.') {
                self.pos += 1;
                text.push('.');
                text.push_str(&self.digits(10));
            }
            if matches!(self.peek(0), Some('e' | 'E')) {
                let sign = self.peek(1).filter(|c| matches!(c, '+' | '-'));
                let digit_at = if sign.is_some() { 2 } else { 1 };
                if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    text.push('e');
                    self.pos += 1;
                    if let Some(sign) = sign {
                        text.push(sign);
                        self.pos += 1;
                    }
                    text.push_str(&self.digits(10));
                } else {
                    return Err(invalid_token());
                }
            }
            if text.starts_with('.') {
                text.insert(0, '0');
            }
            text.parse::<f64>().map_err(|_| invalid_token())?
        };

        // `3in`, `1n` and similar glue are rejected like the engine does
        if self.peek(0).is_some_and(is_ident_part) {
            return Err(invalid_token());
        }
        Ok(Token::Number(value))
    }

    fn hex_escape(&mut self, len: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self.bump().and_then(|c| c.to_digit(16)).ok_or_else(invalid_token)?;
            code = code * 16 + digit;
        }
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn unicode_escape(&mut self) -> Result<char> {
        if self.peek(0) != Some('{') {
            return self.hex_escape(4);
        }
        self.pos += 1;
        let mut code = 0u32;
        let mut count = 0;
        loop {
            match self.bump() {
                Some('}') if count > 0 => break,
                Some(c) if c.is_ascii_hexdigit() && code <= 0x10_FFFF => {
                    code = code * 16 + c.to_digit(16).unwrap_or(0);
                    count += 1;
                }
                _ => return Err(invalid_token()),
            }
        }
        if code > 0x10_FFFF {
            return Err(CompileError::syntax("Undefined Unicode code-point"));
        }
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(invalid_token)?;
            match c {
                c if c == quote => return Ok(Token::String(out)),
                '\n' | '\r' => return Err(invalid_token()),
                '\\' => {
                    let escaped = self.bump().ok_or_else(invalid_token)?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'v' => out.push('\u{b}'),
                        '0' if !self.peek(0).is_some_and(|d| d.is_ascii_digit()) => out.push('\0'),
                        '0'..='9' => {
                            return Err(CompileError::syntax(
                                "Octal escape sequences are not allowed in strict mode.",
                            ));
                        }
                        'x' => out.push(self.hex_escape(2)?),
                        'u' => out.push(self.unicode_escape()?),
                        // Line continuation
                        '\n' => {}
                        '\r' => {
                            if self.peek(0) == Some('\n') {
                                self.pos += 1;
                            }
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn ident(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek(0).filter(|c| is_ident_part(*c)) {
            name.push(c);
            self.pos += 1;
        }
        Token::Ident(name)
    }

    fn regex(&mut self) -> Result<Token> {
        self.pos += 1;
        let mut source = String::new();
        let mut in_class = false;
        loop {
            let c = self
                .bump()
                .filter(|c| *c != '\n' && *c != '\r')
                .ok_or_else(|| CompileError::syntax("Invalid regular expression: missing /"))?;
            match c {
                '/' if !in_class => break,
                '\\' => {
                    source.push(c);
                    let next = self
                        .bump()
                        .ok_or_else(|| CompileError::syntax("Invalid regular expression: missing /"))?;
                    source.push(next);
                    continue;
                }
                '[' => in_class = true,
                ']' => in_class = false,
                _ => {}
            }
            source.push(c);
        }

        let mut flags = String::new();
        while let Some(c) = self.peek(0).filter(|c| is_ident_part(*c)) {
            if !"dgimsuyv".contains(c) || flags.contains(c) {
                return Err(CompileError::syntax("Invalid regular expression flags"));
            }
            flags.push(c);
            self.pos += 1;
        }
        Ok(Token::Regex { source, flags })
    }

    fn punct(&mut self) -> Result<Token> {
        for p in PUNCTUATORS {
            if self.starts_with(p) {
                // `a?.5:1` is a conditional, not optional chaining
                if *p == "?." && self.peek(2).is_some_and(|c| c.is_ascii_digit()) {
                    continue;
                }
                self.pos += p.chars().count();
                return Ok(Token::Punct(p));
            }
        }
        Err(invalid_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::Ident(name.to_string())
    }

    #[test]
    fn test_member_call_chain() {
        let tokens = tokenize("z.string().min(1);").unwrap();
        assert_eq!(
            tokens,
            vec![
                ident("z"),
                Token::Punct("."),
                ident("string"),
                Token::Punct("("),
                Token::Punct(")"),
                Token::Punct("."),
                ident("min"),
                Token::Punct("("),
                Token::Number(1.0),
                Token::Punct(")"),
                Token::Punct(";"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("0x1F 1_000 .5 2e3 0b11").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(31.0),
                Token::Number(1000.0),
                Token::Number(0.5),
                Token::Number(2000.0),
                Token::Number(3.0),
            ]
        );
        assert!(tokenize("017").is_err());
        assert!(tokenize("3in").is_err());
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"'it\'s' "A\u{1F600}\x41\n""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::String("it's".to_string()),
                Token::String("A\u{1F600}A\n".to_string()),
            ]
        );
        assert_eq!(
            tokenize("'open").unwrap_err().message,
            "Invalid or unexpected token"
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = tokenize("x.regex(/^[a/]+$/i)").unwrap();
        assert_eq!(
            tokens[4],
            Token::Regex {
                source: "^[a/]+$".to_string(),
                flags: "i".to_string(),
            }
        );

        let tokens = tokenize("(a) / 2").unwrap();
        assert!(tokens[3].is("/"));
        assert!(tokenize("/a/gg").is_err());
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("// line\nz /* block */ . any()").unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(tokenize("/* open").is_err());
    }

    #[test]
    fn test_optional_chaining_versus_conditional() {
        let tokens = tokenize("a?.b").unwrap();
        assert!(tokens[1].is("?."));
        let tokens = tokenize("a?.5:1").unwrap();
        assert!(tokens[1].is("?"));
    }
}
