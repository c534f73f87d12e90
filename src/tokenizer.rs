use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    token_type: TokenType,
    offset: usize,
}

impl Token {
    pub fn new(token_type: TokenType, offset: usize) -> Self {
        Self { token_type, offset }
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    /// Byte offset of the first character of the token in the source.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    AndAnd,
    OrOr,

    // Literals
    Identifier(String),
    String(String),
    Number(f64),

    // Keywords
    Var,
    If,
    Else,
    While,
    Print,

    // End of input
    Eof,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Bang => write!(f, "!"),
            TokenType::BangEqual => write!(f, "!="),
            TokenType::Equal => write!(f, "="),
            TokenType::EqualEqual => write!(f, "=="),
            TokenType::Greater => write!(f, ">"),
            TokenType::GreaterEqual => write!(f, ">="),
            TokenType::Less => write!(f, "<"),
            TokenType::LessEqual => write!(f, "<="),
            TokenType::AndAnd => write!(f, "&&"),
            TokenType::OrOr => write!(f, "||"),
            TokenType::Identifier(_) => write!(f, "identifier"),
            TokenType::String(_) => write!(f, "string"),
            TokenType::Number(_) => write!(f, "number"),
            TokenType::Var => write!(f, "var"),
            TokenType::If => write!(f, "if"),
            TokenType::Else => write!(f, "else"),
            TokenType::While => write!(f, "while"),
            TokenType::Print => write!(f, "print"),
            TokenType::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{character}'")]
    UnexpectedChar { offset: usize, character: char },
    #[error("unterminated string")]
    UnterminatedString { offset: usize },
}

impl LexError {
    /// Byte offset into the source where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnexpectedChar { offset, .. } => *offset,
            LexError::UnterminatedString { offset } => *offset,
        }
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut remaining = source;

    loop {
        while let Some((_, rest)) = maximal(&[whitespace, line_comment, block_comment], remaining)
        {
            remaining = rest;
        }

        let offset = source.len() - remaining.len();

        let Some(first) = remaining.chars().next() else {
            tokens.push(Token::new(TokenType::Eof, offset));
            return Ok(tokens);
        };

        match maximal(
            &[
                // Single-character tokens
                left_paren,
                right_paren,
                left_brace,
                right_brace,
                semicolon,
                plus,
                minus,
                star,
                slash,
                // One or two character tokens
                bang,
                bang_equal,
                equal,
                equal_equal,
                greater,
                greater_equal,
                less,
                less_equal,
                and_and,
                or_or,
                // Keywords (before identifier, so exact matches win the tie)
                var,
                if_,
                else_,
                while_,
                print_,
                // Literals
                identifier,
                string,
                number,
            ],
            remaining,
        ) {
            Some((token_type, rest)) => {
                tokens.push(Token::new(token_type, offset));
                remaining = rest;
            }
            None if first == '"' => return Err(LexError::UnterminatedString { offset }),
            None => {
                return Err(LexError::UnexpectedChar {
                    offset,
                    character: first,
                })
            }
        }
    }
}

/// Runs every parser against the source and keeps the longest match.
/// Ties go to the earliest parser in the list.
fn maximal<'a, T>(
    parsers: &[fn(&str) -> Option<(T, &str)>],
    source: &'a str,
) -> Option<(T, &'a str)> {
    let mut min_left = source.len() + 1;
    let mut max_match = None;

    let matching_parsers = parsers.iter().filter_map(|parser| parser(source));
    for (m, rest) in matching_parsers {
        let left = rest.len();
        if left < min_left {
            min_left = left;
            max_match = Some((m, rest));
        }
    }

    max_match
}

fn whitespace(source: &str) -> Option<((), &str)> {
    let len = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Some(((), &source[len..]))
    } else {
        None
    }
}

fn line_comment(source: &str) -> Option<((), &str)> {
    if source.starts_with("//") {
        let len = source
            .chars()
            .take_while(|c| *c != '\n')
            .map(char::len_utf8)
            .sum();
        Some(((), &source[len..]))
    } else {
        None
    }
}

fn block_comment(source: &str) -> Option<((), &str)> {
    if source.starts_with("/*") {
        match source[2..].find("*/") {
            Some(end) => Some(((), &source[2 + end + 2..])),
            // An unterminated block comment swallows the rest of the input
            None => Some(((), "")),
        }
    } else {
        None
    }
}

macro_rules! match_literal {
    ($name:ident, $word:literal, $token_type:expr) => {
        fn $name(source: &str) -> Option<(TokenType, &str)> {
            if source.starts_with($word) {
                Some(($token_type, &source[$word.len()..]))
            } else {
                None
            }
        }
    };
}

match_literal! { left_paren, "(", TokenType::LeftParen }
match_literal! { right_paren, ")", TokenType::RightParen }
match_literal! { left_brace, "{", TokenType::LeftBrace }
match_literal! { right_brace, "}", TokenType::RightBrace }
match_literal! { semicolon, ";", TokenType::Semicolon }
match_literal! { plus, "+", TokenType::Plus }
match_literal! { minus, "-", TokenType::Minus }
match_literal! { star, "*", TokenType::Star }
match_literal! { slash, "/", TokenType::Slash }
match_literal! { bang, "!", TokenType::Bang }
match_literal! { equal, "=", TokenType::Equal }
match_literal! { greater, ">", TokenType::Greater }
match_literal! { less, "<", TokenType::Less }
match_literal! { bang_equal, "!=", TokenType::BangEqual }
match_literal! { equal_equal, "==", TokenType::EqualEqual }
match_literal! { greater_equal, ">=", TokenType::GreaterEqual }
match_literal! { less_equal, "<=", TokenType::LessEqual }
match_literal! { and_and, "&&", TokenType::AndAnd }
match_literal! { or_or, "||", TokenType::OrOr }
match_literal! { var, "var", TokenType::Var }
match_literal! { if_, "if", TokenType::If }
match_literal! { else_, "else", TokenType::Else }
match_literal! { while_, "while", TokenType::While }
match_literal! { print_, "print", TokenType::Print }

fn identifier(source: &str) -> Option<(TokenType, &str)> {
    let mut chars = source.chars();

    let first = chars.next()?;
    if !first.is_ascii_alphabetic() && first != '_' {
        return None;
    }

    let len = first.len_utf8()
        + chars
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(char::len_utf8)
            .sum::<usize>();

    Some((
        TokenType::Identifier(source[..len].to_string()),
        &source[len..],
    ))
}

fn string(source: &str) -> Option<(TokenType, &str)> {
    if !source.starts_with('"') {
        return None;
    }

    let mut len = 1;
    for c in source.chars().skip(1) {
        len += c.len_utf8();
        if c == '"' {
            return Some((
                TokenType::String(source[1..len - 1].to_string()),
                &source[len..],
            ));
        }
    }
    None
}

fn number(source: &str) -> Option<(TokenType, &str)> {
    let digits = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();

    let mut len = digits(source);
    if len == 0 {
        return None;
    }

    // The dot only belongs to the number when a digit follows it,
    // otherwise it is left for the next token
    if source[len..].starts_with('.') {
        let fraction = digits(&source[len + 1..]);
        if fraction > 0 {
            len += 1 + fraction;
        }
    }

    let value = source[..len].parse().ok()?;
    Some((TokenType::Number(value), &source[len..]))
}
