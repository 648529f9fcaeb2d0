//! Cypher lexer: tokenizes a query string.
//!
//! The parser only needs a buffered stream of typed tokens with byte spans;
//! this module is the reference source of that stream. Keywords are matched
//! case-insensitively and each gets its own [`TokenKind`], but the parser
//! still accepts any keyword where a symbolic name is expected.
//!
//! Arrows are never fused: `<`, `-` and `>` are separate tokens and the
//! pattern grammar assembles them, so `a<-1` stays a comparison.

use std::fmt;
use std::sync::LazyLock;

use hashbrown::HashMap;
use serde::Serialize;

use crate::{Error, Result};

/// A token from the lexer.
///
/// `text` holds the cooked value for strings, identifiers and parameters
/// (quotes, backticks and `$` stripped, escapes resolved) and the raw lexeme
/// for everything else. `span` always covers the raw source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span (byte offsets, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span { start: self.start.min(other.start), end: self.end.max(other.end) }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice of `source` this span covers, when `source` starts at `base`.
    pub fn slice<'s>(&self, source: &'s str, base: usize) -> &'s str {
        &source[self.start - base..self.end - base]
    }
}

/// Token kinds.
///
/// Keywords are declared contiguously between [`TokenKind::All`] and
/// [`TokenKind::Zoned`]; [`TokenKind::is_keyword`] relies on that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TokenKind {
    // Keywords
    All, AllShortestPaths, And, Any, Array, As, Asc, Ascending,
    Bool, Boolean, Both, Break, By,
    Call, Case, Collect, Concurrent, Constraint, Constraints, Contains,
    Continue, Count, Create, Csv,
    Database, Databases, Date, Datetime, Delete, Desc, Descending, Detach,
    Different, Distinct, Drop, Duration,
    Edge, Elements, Else, End, Ends, Error, Exists,
    Fail, False, FieldTerminator, Finish, Float, For, Foreach, From,
    Function, Functions,
    Group, Groups, Headers,
    If, In, Index, Indexes, Inf, Infinity, Insert, Int, Integer, Is,
    Join, Key, Leading, Limit, List, Load, Local,
    Map, Match, Merge,
    NaN, Nfc, Nfd, Nfkc, Nfkd, Node, Nodetach, None, Normalize, Normalized,
    Not, Nothing, Null,
    Of, Offset, On, Optional, Options, Or, Order,
    Path, Paths, Point, Procedure, Procedures, Property,
    Range, Reduce, Relationship, Relationships, Remove, Repeatable, Report,
    Require, Return, Rows,
    Scan, Seek, Set, Setting, Settings, Shortest, ShortestPath, Show,
    Signed, Single, Skip, Starts, Status, String,
    Text, Then, Time, Timestamp, Timezone, Trailing, Transaction,
    Transactions, Trim, True, Typed,
    Union, Unique, Unwind, Use, Using,
    Value, Varchar, Vertex,
    When, Where, With, Without,
    Xor, Yield, Zoned,

    // Literals
    DecimalInteger, HexInteger, OctalInteger, DecimalFloat,
    SingleQuotedString, DoubleQuotedString,

    // Identifiers and parameters
    Identifier, EscapedIdentifier, Parameter,

    // Punctuation
    LParen, RParen, LBracket, RBracket, LBrace, RBrace,
    Dot, DotDot, Comma, Colon, DoubleColon, Semicolon,
    Pipe, Ampersand, Bang,

    // Operators
    Eq, Neq, Lt, Lte, Gt, Gte,
    Plus, Minus, Star, Slash, Percent, Caret,
    PlusEq,     // +=
    RegexMatch, // =~
    DoublePipe, // ||

    // Arrow glyphs other than the ASCII `<`, `-`, `>`
    ArrowLine,
    ArrowLeftHead,
    ArrowRightHead,

    Eof,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        self >= TokenKind::All && self <= TokenKind::Zoned
    }

    pub fn is_integer(self) -> bool {
        matches!(self, TokenKind::DecimalInteger | TokenKind::HexInteger | TokenKind::OctalInteger)
    }

    pub fn is_number(self) -> bool {
        self.is_integer() || self == TokenKind::DecimalFloat
    }

    pub fn is_string(self) -> bool {
        matches!(self, TokenKind::SingleQuotedString | TokenKind::DoubleQuotedString)
    }

    /// Tokens that can be used as a symbolic name (identifiers and all keywords).
    pub fn is_name(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::EscapedIdentifier) || self.is_keyword()
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        if self.is_keyword() {
            return KEYWORDS
                .iter()
                .find(|(_, kind)| *kind == self)
                .map(|(text, _)| *text)
                .unwrap_or("keyword");
        }
        match self {
            TokenKind::DecimalInteger => "integer",
            TokenKind::HexInteger => "hexadecimal integer",
            TokenKind::OctalInteger => "octal integer",
            TokenKind::DecimalFloat => "float",
            TokenKind::SingleQuotedString | TokenKind::DoubleQuotedString => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::EscapedIdentifier => "escaped identifier",
            TokenKind::Parameter => "parameter",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::DoubleColon => "'::'",
            TokenKind::Semicolon => "';'",
            TokenKind::Pipe => "'|'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Bang => "'!'",
            TokenKind::Eq => "'='",
            TokenKind::Neq => "'<>'",
            TokenKind::Lt => "'<'",
            TokenKind::Lte => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Gte => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::PlusEq => "'+='",
            TokenKind::RegexMatch => "'=~'",
            TokenKind::DoublePipe => "'||'",
            TokenKind::ArrowLine => "arrow line",
            TokenKind::ArrowLeftHead => "left arrow head",
            TokenKind::ArrowRightHead => "right arrow head",
            TokenKind::Eof => "end of input",
            _ => "token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Keyword spellings, upper case.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("ALL", TokenKind::All),
    ("ALLSHORTESTPATHS", TokenKind::AllShortestPaths),
    ("AND", TokenKind::And),
    ("ANY", TokenKind::Any),
    ("ARRAY", TokenKind::Array),
    ("AS", TokenKind::As),
    ("ASC", TokenKind::Asc),
    ("ASCENDING", TokenKind::Ascending),
    ("BOOL", TokenKind::Bool),
    ("BOOLEAN", TokenKind::Boolean),
    ("BOTH", TokenKind::Both),
    ("BREAK", TokenKind::Break),
    ("BY", TokenKind::By),
    ("CALL", TokenKind::Call),
    ("CASE", TokenKind::Case),
    ("COLLECT", TokenKind::Collect),
    ("CONCURRENT", TokenKind::Concurrent),
    ("CONSTRAINT", TokenKind::Constraint),
    ("CONSTRAINTS", TokenKind::Constraints),
    ("CONTAINS", TokenKind::Contains),
    ("CONTINUE", TokenKind::Continue),
    ("COUNT", TokenKind::Count),
    ("CREATE", TokenKind::Create),
    ("CSV", TokenKind::Csv),
    ("DATABASE", TokenKind::Database),
    ("DATABASES", TokenKind::Databases),
    ("DATE", TokenKind::Date),
    ("DATETIME", TokenKind::Datetime),
    ("DELETE", TokenKind::Delete),
    ("DESC", TokenKind::Desc),
    ("DESCENDING", TokenKind::Descending),
    ("DETACH", TokenKind::Detach),
    ("DIFFERENT", TokenKind::Different),
    ("DISTINCT", TokenKind::Distinct),
    ("DROP", TokenKind::Drop),
    ("DURATION", TokenKind::Duration),
    ("EDGE", TokenKind::Edge),
    ("ELEMENTS", TokenKind::Elements),
    ("ELSE", TokenKind::Else),
    ("END", TokenKind::End),
    ("ENDS", TokenKind::Ends),
    ("ERROR", TokenKind::Error),
    ("EXISTS", TokenKind::Exists),
    ("FAIL", TokenKind::Fail),
    ("FALSE", TokenKind::False),
    ("FIELDTERMINATOR", TokenKind::FieldTerminator),
    ("FINISH", TokenKind::Finish),
    ("FLOAT", TokenKind::Float),
    ("FOR", TokenKind::For),
    ("FOREACH", TokenKind::Foreach),
    ("FROM", TokenKind::From),
    ("FUNCTION", TokenKind::Function),
    ("FUNCTIONS", TokenKind::Functions),
    ("GROUP", TokenKind::Group),
    ("GROUPS", TokenKind::Groups),
    ("HEADERS", TokenKind::Headers),
    ("IF", TokenKind::If),
    ("IN", TokenKind::In),
    ("INDEX", TokenKind::Index),
    ("INDEXES", TokenKind::Indexes),
    ("INF", TokenKind::Inf),
    ("INFINITY", TokenKind::Infinity),
    ("INSERT", TokenKind::Insert),
    ("INT", TokenKind::Int),
    ("INTEGER", TokenKind::Integer),
    ("IS", TokenKind::Is),
    ("JOIN", TokenKind::Join),
    ("KEY", TokenKind::Key),
    ("LEADING", TokenKind::Leading),
    ("LIMIT", TokenKind::Limit),
    ("LIST", TokenKind::List),
    ("LOAD", TokenKind::Load),
    ("LOCAL", TokenKind::Local),
    ("MAP", TokenKind::Map),
    ("MATCH", TokenKind::Match),
    ("MERGE", TokenKind::Merge),
    ("NAN", TokenKind::NaN),
    ("NFC", TokenKind::Nfc),
    ("NFD", TokenKind::Nfd),
    ("NFKC", TokenKind::Nfkc),
    ("NFKD", TokenKind::Nfkd),
    ("NODE", TokenKind::Node),
    ("NODETACH", TokenKind::Nodetach),
    ("NONE", TokenKind::None),
    ("NORMALIZE", TokenKind::Normalize),
    ("NORMALIZED", TokenKind::Normalized),
    ("NOT", TokenKind::Not),
    ("NOTHING", TokenKind::Nothing),
    ("NULL", TokenKind::Null),
    ("OF", TokenKind::Of),
    ("OFFSET", TokenKind::Offset),
    ("ON", TokenKind::On),
    ("OPTIONAL", TokenKind::Optional),
    ("OPTIONS", TokenKind::Options),
    ("OR", TokenKind::Or),
    ("ORDER", TokenKind::Order),
    ("PATH", TokenKind::Path),
    ("PATHS", TokenKind::Paths),
    ("POINT", TokenKind::Point),
    ("PROCEDURE", TokenKind::Procedure),
    ("PROCEDURES", TokenKind::Procedures),
    ("PROPERTY", TokenKind::Property),
    ("RANGE", TokenKind::Range),
    ("REDUCE", TokenKind::Reduce),
    ("RELATIONSHIP", TokenKind::Relationship),
    ("RELATIONSHIPS", TokenKind::Relationships),
    ("REMOVE", TokenKind::Remove),
    ("REPEATABLE", TokenKind::Repeatable),
    ("REPORT", TokenKind::Report),
    ("REQUIRE", TokenKind::Require),
    ("RETURN", TokenKind::Return),
    ("ROWS", TokenKind::Rows),
    ("SCAN", TokenKind::Scan),
    ("SEEK", TokenKind::Seek),
    ("SET", TokenKind::Set),
    ("SETTING", TokenKind::Setting),
    ("SETTINGS", TokenKind::Settings),
    ("SHORTEST", TokenKind::Shortest),
    ("SHORTESTPATH", TokenKind::ShortestPath),
    ("SHOW", TokenKind::Show),
    ("SIGNED", TokenKind::Signed),
    ("SINGLE", TokenKind::Single),
    ("SKIP", TokenKind::Skip),
    ("STARTS", TokenKind::Starts),
    ("STATUS", TokenKind::Status),
    ("STRING", TokenKind::String),
    ("TEXT", TokenKind::Text),
    ("THEN", TokenKind::Then),
    ("TIME", TokenKind::Time),
    ("TIMESTAMP", TokenKind::Timestamp),
    ("TIMEZONE", TokenKind::Timezone),
    ("TRAILING", TokenKind::Trailing),
    ("TRANSACTION", TokenKind::Transaction),
    ("TRANSACTIONS", TokenKind::Transactions),
    ("TRIM", TokenKind::Trim),
    ("TRUE", TokenKind::True),
    ("TYPED", TokenKind::Typed),
    ("UNION", TokenKind::Union),
    ("UNIQUE", TokenKind::Unique),
    ("UNWIND", TokenKind::Unwind),
    ("USE", TokenKind::Use),
    ("USING", TokenKind::Using),
    ("VALUE", TokenKind::Value),
    ("VARCHAR", TokenKind::Varchar),
    ("VERTEX", TokenKind::Vertex),
    ("WHEN", TokenKind::When),
    ("WHERE", TokenKind::Where),
    ("WITH", TokenKind::With),
    ("WITHOUT", TokenKind::Without),
    ("XOR", TokenKind::Xor),
    ("YIELD", TokenKind::Yield),
    ("ZONED", TokenKind::Zoned),
];

static KEYWORD_TABLE: LazyLock<HashMap<&'static str, TokenKind>> =
    LazyLock::new(|| KEYWORDS.iter().copied().collect());

/// Tokenize a Cypher query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    tokenize_at(input, 0)
}

/// Tokenize `input` as if it started at byte offset `base` of a larger
/// source. Re-parsing a sub-node's text with its span start as `base`
/// reproduces the original spans exactly.
pub fn tokenize_at(input: &str, base: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    let lex_err = |pos: usize, message: String| Error::Lexical { position: base + pos, message };

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            // Skip whitespace
            c if c.is_whitespace() => { chars.next(); }

            // Skip block comments /* ... */
            '/' if matches!(chars.clone().nth(1), Some((_, '*'))) => {
                chars.next();
                chars.next();
                loop {
                    match chars.next() {
                        Some((_, '*')) => {
                            if matches!(chars.peek(), Some(&(_, '/'))) {
                                chars.next();
                                break;
                            }
                        }
                        Some(_) => {}
                        None => return Err(lex_err(pos, "Unterminated block comment".into())),
                    }
                }
            }

            // Skip line comments
            '/' if matches!(chars.clone().nth(1), Some((_, '/'))) => {
                while chars.peek().is_some_and(|&(_, c)| c != '\n') {
                    chars.next();
                }
            }

            // String literals
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((esc_pos, '\\')) => match chars.next() {
                            Some((_, 'n')) => s.push('\n'),
                            Some((_, 't')) => s.push('\t'),
                            Some((_, 'r')) => s.push('\r'),
                            Some((_, 'b')) => s.push('\u{0008}'),
                            Some((_, 'f')) => s.push('\u{000C}'),
                            Some((_, '\\')) => s.push('\\'),
                            Some((_, '\'')) => s.push('\''),
                            Some((_, '"')) => s.push('"'),
                            Some((_, 'u')) => {
                                let mut hex = String::with_capacity(4);
                                for _ in 0..4 {
                                    match chars.next() {
                                        Some((_, h)) if h.is_ascii_hexdigit() => hex.push(h),
                                        _ => return Err(lex_err(esc_pos, "Invalid unicode escape".into())),
                                    }
                                }
                                let code = u32::from_str_radix(&hex, 16)
                                    .ok()
                                    .and_then(char::from_u32)
                                    .ok_or_else(|| lex_err(esc_pos, format!("Invalid unicode escape \\u{hex}")))?;
                                s.push(code);
                            }
                            Some((_, c)) => { s.push('\\'); s.push(c); }
                            None => return Err(lex_err(pos, "Unterminated string literal".into())),
                        },
                        Some((end, c)) if c == quote => {
                            let kind = if quote == '\'' {
                                TokenKind::SingleQuotedString
                            } else {
                                TokenKind::DoubleQuotedString
                            };
                            tokens.push(Token {
                                kind,
                                span: Span::new(base + pos, base + end + 1),
                                text: s,
                            });
                            break;
                        }
                        Some((_, c)) => s.push(c),
                        None => return Err(lex_err(pos, "Unterminated string literal".into())),
                    }
                }
            }

            // Escaped identifiers: `weird name`, `` doubles as an escaped backtick
            '`' => {
                chars.next();
                let (name, end) = lex_escaped_name(&mut chars).ok_or_else(|| {
                    lex_err(pos, "Unterminated escaped identifier".into())
                })?;
                tokens.push(Token {
                    kind: TokenKind::EscapedIdentifier,
                    span: Span::new(base + pos, base + end),
                    text: name,
                });
            }

            // Numbers
            c if c.is_ascii_digit() => {
                let (kind, text) = lex_number(&mut chars);
                if chars.peek().is_some_and(|&(_, c)| c.is_alphabetic() || c == '_') {
                    return Err(lex_err(pos, format!("Invalid number literal '{text}'")));
                }
                tokens.push(Token {
                    kind,
                    span: Span::new(base + pos, base + pos + text.len()),
                    text,
                });
            }

            // Parameter: $name, $0, $`escaped name`
            '$' => {
                chars.next();
                let (name, end) = if matches!(chars.peek(), Some(&(_, '`'))) {
                    chars.next();
                    lex_escaped_name(&mut chars).ok_or_else(|| {
                        lex_err(pos, "Unterminated escaped parameter name".into())
                    })?
                } else {
                    let mut name = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let end = pos + 1 + name.len();
                    (name, end)
                };
                if name.is_empty() {
                    return Err(lex_err(pos, "Expected parameter name after '$'".into()));
                }
                tokens.push(Token {
                    kind: TokenKind::Parameter,
                    span: Span::new(base + pos, base + end),
                    text: name,
                });
            }

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = keyword_or_ident(&ident);
                tokens.push(Token {
                    kind,
                    span: Span::new(base + pos, base + pos + ident.len()),
                    text: ident,
                });
            }

            // Punctuation
            '(' => { chars.next(); tokens.push(punct(TokenKind::LParen, base + pos, "(")); }
            ')' => { chars.next(); tokens.push(punct(TokenKind::RParen, base + pos, ")")); }
            '[' => { chars.next(); tokens.push(punct(TokenKind::LBracket, base + pos, "[")); }
            ']' => { chars.next(); tokens.push(punct(TokenKind::RBracket, base + pos, "]")); }
            '{' => { chars.next(); tokens.push(punct(TokenKind::LBrace, base + pos, "{")); }
            '}' => { chars.next(); tokens.push(punct(TokenKind::RBrace, base + pos, "}")); }
            ',' => { chars.next(); tokens.push(punct(TokenKind::Comma, base + pos, ",")); }
            ';' => { chars.next(); tokens.push(punct(TokenKind::Semicolon, base + pos, ";")); }
            '&' => { chars.next(); tokens.push(punct(TokenKind::Ampersand, base + pos, "&")); }
            '*' => { chars.next(); tokens.push(punct(TokenKind::Star, base + pos, "*")); }
            '/' => { chars.next(); tokens.push(punct(TokenKind::Slash, base + pos, "/")); }
            '%' => { chars.next(); tokens.push(punct(TokenKind::Percent, base + pos, "%")); }
            '^' => { chars.next(); tokens.push(punct(TokenKind::Caret, base + pos, "^")); }
            '-' => { chars.next(); tokens.push(punct(TokenKind::Minus, base + pos, "-")); }
            ':' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, ':'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::DoubleColon, base + pos, "::"));
                } else {
                    tokens.push(punct(TokenKind::Colon, base + pos, ":"));
                }
            }
            '|' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '|'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::DoublePipe, base + pos, "||"));
                } else {
                    tokens.push(punct(TokenKind::Pipe, base + pos, "|"));
                }
            }
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Neq, base + pos, "!="));
                } else {
                    tokens.push(punct(TokenKind::Bang, base + pos, "!"));
                }
            }
            '.' => {
                let next = chars.clone().nth(1).map(|(_, c)| c);
                if next == Some('.') {
                    chars.next();
                    chars.next();
                    tokens.push(punct(TokenKind::DotDot, base + pos, ".."));
                } else if next.is_some_and(|c| c.is_ascii_digit()) {
                    let (kind, text) = lex_number(&mut chars);
                    tokens.push(Token {
                        kind,
                        span: Span::new(base + pos, base + pos + text.len()),
                        text,
                    });
                } else {
                    chars.next();
                    tokens.push(punct(TokenKind::Dot, base + pos, "."));
                }
            }
            '+' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::PlusEq, base + pos, "+="));
                } else {
                    tokens.push(punct(TokenKind::Plus, base + pos, "+"));
                }
            }
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '~'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::RegexMatch, base + pos, "=~"));
                } else {
                    tokens.push(punct(TokenKind::Eq, base + pos, "="));
                }
            }
            '<' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Lte, base + pos, "<="));
                } else if matches!(chars.peek(), Some(&(_, '>'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Neq, base + pos, "<>"));
                } else {
                    tokens.push(punct(TokenKind::Lt, base + pos, "<"));
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Gte, base + pos, ">="));
                } else {
                    tokens.push(punct(TokenKind::Gt, base + pos, ">"));
                }
            }

            // Unicode arrow glyphs
            '\u{00AD}' | '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}' => {
                chars.next();
                tokens.push(glyph(TokenKind::ArrowLine, base + pos, ch));
            }
            '\u{27E8}' | '\u{3008}' | '\u{FE64}' | '\u{FF1C}' => {
                chars.next();
                tokens.push(glyph(TokenKind::ArrowLeftHead, base + pos, ch));
            }
            '\u{27E9}' | '\u{3009}' | '\u{FE65}' | '\u{FF1E}' => {
                chars.next();
                tokens.push(glyph(TokenKind::ArrowRightHead, base + pos, ch));
            }

            other => {
                return Err(lex_err(pos, format!("Unexpected character: '{other}'")));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(base + input.len(), base + input.len()),
        text: String::new(),
    });

    Ok(tokens)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

/// Lex a number starting at the cursor. Never consumes a `..` range operator.
fn lex_number(chars: &mut Chars<'_>) -> (TokenKind, String) {
    let mut num = String::new();
    let first = chars.peek().map(|&(_, c)| c);
    let second = chars.clone().nth(1).map(|(_, c)| c);

    if first == Some('0') && matches!(second, Some('x' | 'X' | 'o' | 'O')) {
        let hex = matches!(second, Some('x' | 'X'));
        for _ in 0..2 {
            if let Some((_, c)) = chars.next() {
                num.push(c);
            }
        }
        while let Some(&(_, c)) = chars.peek() {
            let ok = if hex { c.is_ascii_hexdigit() } else { c.is_digit(8) };
            if ok || c == '_' {
                num.push(c);
                chars.next();
            } else {
                break;
            }
        }
        let kind = if hex { TokenKind::HexInteger } else { TokenKind::OctalInteger };
        return (kind, num);
    }

    let mut is_float = false;
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() || (c == '_' && !num.is_empty()) {
            num.push(c);
            chars.next();
        } else if c == '.' && !is_float {
            // `1..3` is a range, `1.5` is a float
            let after = chars.clone().nth(1).map(|(_, c)| c);
            if after.is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                num.push(c);
                chars.next();
            } else {
                break;
            }
        } else if matches!(c, 'e' | 'E') {
            let mut look = chars.clone();
            look.next();
            let mut exp = String::from(c);
            if let Some(&(_, sign @ ('+' | '-'))) = look.peek() {
                exp.push(sign);
                look.next();
            }
            if look.peek().is_some_and(|&(_, d)| d.is_ascii_digit()) {
                is_float = true;
                num.push_str(&exp);
                for _ in 0..exp.len() {
                    chars.next();
                }
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            break;
        } else {
            break;
        }
    }

    let kind = if is_float {
        TokenKind::DecimalFloat
    } else if num.len() > 1 && num.starts_with('0') {
        TokenKind::OctalInteger
    } else {
        TokenKind::DecimalInteger
    };
    (kind, num)
}

/// Lex the body of a backtick-quoted name; the opening backtick is already
/// consumed. Returns the cooked name and the end offset past the closing
/// backtick.
fn lex_escaped_name(chars: &mut Chars<'_>) -> Option<(String, usize)> {
    let mut name = String::new();
    loop {
        let (at, c) = chars.next()?;
        if c == '`' {
            if matches!(chars.peek(), Some(&(_, '`'))) {
                chars.next();
                name.push('`');
            } else {
                return Some((name, at + 1));
            }
        } else {
            name.push(c);
        }
    }
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span::new(pos, pos + text.len()),
        text: text.to_string(),
    }
}

fn glyph(kind: TokenKind, pos: usize, ch: char) -> Token {
    Token {
        kind,
        span: Span::new(pos, pos + ch.len_utf8()),
        text: ch.to_string(),
    }
}

fn keyword_or_ident(s: &str) -> TokenKind {
    KEYWORD_TABLE
        .get(s.to_uppercase().as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier)
}
