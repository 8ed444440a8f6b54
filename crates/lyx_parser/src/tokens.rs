use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::errors::{ParseError, Result};
use crate::keywords::{Keyword, keyword_from_str};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    /// Unparsed number literal.
    Number(String),
    /// Contents of a single quoted string with escaped quotes collapsed.
    SingleQuotedString(String),
    /// Positional parameter, e.g. `$1`.
    Placeholder(String),
    Whitespace,
    /// '='
    Eq,
    /// '<>' or '!='
    Neq,
    /// '<'
    Lt,
    /// '<='
    LtEq,
    /// '>'
    Gt,
    /// '>='
    GtEq,
    /// '+'
    Plus,
    /// '-'
    Minus,
    /// '*'
    Mul,
    /// '/'
    Div,
    /// '%'
    Mod,
    /// '::'
    DoubleColon,
    Comma,
    Period,
    SemiColon,
    LeftParen,
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{w}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::SingleQuotedString(s) => write!(f, "'{s}'"),
            Self::Placeholder(p) => write!(f, "{p}"),
            Self::Whitespace => write!(f, "whitespace"),
            Self::Eq => write!(f, "="),
            Self::Neq => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Mod => write!(f, "%"),
            Self::DoubleColon => write!(f, "::"),
            Self::Comma => write!(f, ","),
            Self::Period => write!(f, "."),
            Self::SemiColon => write!(f, ";"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: String,
    /// Quote character if this was a delimited identifier.
    pub quote: Option<char>,
    /// Only set for unquoted words.
    pub keyword: Option<Keyword>,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            Some(q) => write!(f, "{q}{}{q}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithLocation {
    pub token: Token,
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub col: usize,
}

impl TokenWithLocation {
    pub fn is_keyword(&self, other: Keyword) -> bool {
        self.keyword() == Some(other)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match &self.token {
            Token::Word(w) => w.keyword,
            _ => None,
        }
    }
}

#[derive(Debug)]
struct State<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl State<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        match self.chars.next() {
            Some(c) => {
                if c == '\n' {
                    self.line += 1;
                    self.col = 1;
                } else {
                    self.col += 1;
                }
                Some(c)
            }
            None => None,
        }
    }

    /// Consume characters while `predicate` holds, appending them to `buf`.
    fn take_while(&mut self, buf: &mut String, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            buf.push(c);
            self.next();
        }
    }
}

#[derive(Debug)]
pub struct Tokenizer<'a> {
    state: State<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(sql: &'a str) -> Self {
        Tokenizer {
            state: State {
                chars: sql.chars().peekable(),
                line: 1,
                col: 1,
            },
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithLocation>> {
        let mut toks = Vec::new();
        loop {
            let line = self.state.line;
            let col = self.state.col;
            let token = match self.next_token(line, col)? {
                Some(tok) => tok,
                None => break,
            };
            toks.push(TokenWithLocation { token, line, col });
        }
        Ok(toks)
    }

    fn next_token(&mut self, line: usize, col: usize) -> Result<Option<Token>> {
        let c = match self.state.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        let tok = match c {
            c if c.is_whitespace() => {
                let mut discard = String::new();
                self.state.take_while(&mut discard, char::is_whitespace);
                Token::Whitespace
            }
            '\'' => {
                self.state.next();
                Token::SingleQuotedString(self.quoted('\'', line, col)?)
            }
            '"' => {
                self.state.next();
                let value = self.quoted('"', line, col)?;
                Token::Word(Word {
                    value,
                    quote: Some('"'),
                    keyword: None,
                })
            }
            '$' => {
                self.state.next();
                let mut param = String::from("$");
                self.state.take_while(&mut param, |c| c.is_ascii_digit());
                if param.len() == 1 {
                    return Err(ParseError::UnexpectedToken {
                        expected: "positional parameter".to_string(),
                        found: "$".to_string(),
                        line,
                        col,
                    });
                }
                Token::Placeholder(param)
            }
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                self.state
                    .take_while(&mut num, |c| c.is_ascii_digit() || c == '.');
                Token::Number(num)
            }
            c if is_ident_start(c) => {
                let mut value = String::new();
                self.state.take_while(&mut value, is_ident_continue);
                let keyword = keyword_from_str(&value);
                Token::Word(Word {
                    value,
                    quote: None,
                    keyword,
                })
            }
            '-' => {
                self.state.next();
                if self.state.peek() == Some('-') {
                    // Line comment, treat as whitespace.
                    let mut discard = String::new();
                    self.state.take_while(&mut discard, |c| c != '\n');
                    Token::Whitespace
                } else {
                    Token::Minus
                }
            }
            '/' => {
                self.state.next();
                if self.state.peek() == Some('*') {
                    self.state.next();
                    self.block_comment(line, col)?;
                    Token::Whitespace
                } else {
                    Token::Div
                }
            }
            '<' => {
                self.state.next();
                match self.state.peek() {
                    Some('=') => {
                        self.state.next();
                        Token::LtEq
                    }
                    Some('>') => {
                        self.state.next();
                        Token::Neq
                    }
                    _ => Token::Lt,
                }
            }
            '>' => {
                self.state.next();
                if self.state.peek() == Some('=') {
                    self.state.next();
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '!' => {
                self.state.next();
                if self.state.peek() == Some('=') {
                    self.state.next();
                    Token::Neq
                } else {
                    return Err(ParseError::UnexpectedToken {
                        expected: "'!='".to_string(),
                        found: "!".to_string(),
                        line,
                        col,
                    });
                }
            }
            ':' => {
                self.state.next();
                if self.state.peek() == Some(':') {
                    self.state.next();
                    Token::DoubleColon
                } else {
                    return Err(ParseError::UnexpectedToken {
                        expected: "'::'".to_string(),
                        found: ":".to_string(),
                        line,
                        col,
                    });
                }
            }
            other => {
                self.state.next();
                match other {
                    '=' => Token::Eq,
                    '+' => Token::Plus,
                    '*' => Token::Mul,
                    '%' => Token::Mod,
                    ',' => Token::Comma,
                    '.' => Token::Period,
                    ';' => Token::SemiColon,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    other => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "a SQL token".to_string(),
                            found: other.to_string(),
                            line,
                            col,
                        });
                    }
                }
            }
        };

        Ok(Some(tok))
    }

    /// Skip a block comment, the opening `/*` has already been consumed.
    /// Block comments nest.
    fn block_comment(&mut self, line: usize, col: usize) -> Result<()> {
        let mut depth = 1;
        while depth > 0 {
            match self.state.next() {
                Some('*') if self.state.peek() == Some('/') => {
                    self.state.next();
                    depth -= 1;
                }
                Some('/') if self.state.peek() == Some('*') => {
                    self.state.next();
                    depth += 1;
                }
                Some(_) => (),
                None => return Err(ParseError::UnterminatedComment { line, col }),
            }
        }
        Ok(())
    }

    /// Read until the closing `quote`, the opening quote has already been
    /// consumed. A doubled quote is an escaped quote.
    fn quoted(&mut self, quote: char, line: usize, col: usize) -> Result<String> {
        let mut s = String::new();
        loop {
            match self.state.next() {
                Some(c) if c == quote => {
                    if self.state.peek() == Some(quote) {
                        self.state.next();
                        s.push(quote);
                    } else {
                        return Ok(s);
                    }
                }
                Some(c) => s.push(c),
                None => return Err(ParseError::UnterminatedString { line, col }),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
