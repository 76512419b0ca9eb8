use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    Bang,

    EqualEqual,
    BangEqual,
    LessThan,
    GreaterThan,

    // Delimiters
    Comma,
    Semicolon,
    Colon,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // Identifiers & Literals
    // Number literals keep their source text, the parser converts them
    Identifier(String),
    Integer(String),
    Float(String),
    String(String),

    // Keywords
    True,
    False,
    Function,
    Let,
    If,
    Else,
    Return,

    // Special
    Illegal(String),
    Eof,
}

/// The payload-free category of a [`Token`], used in diagnostics and precedence lookup.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TokenKind {
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    Bang,
    EqualEqual,
    BangEqual,
    LessThan,
    GreaterThan,
    Comma,
    Semicolon,
    Colon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Identifier,
    Integer,
    Float,
    String,
    True,
    False,
    Function,
    Let,
    If,
    Else,
    Return,
    Illegal,
    Eof,
}

impl Token {
    /// Get the Token for the given keyword, if valid.
    pub fn lookup_keyword(s: &str) -> Option<Token> {
        use Token::*;

        match s {
            "true" => Some(True),
            "false" => Some(False),
            "function" => Some(Function),
            "let" => Some(Let),
            "if" => Some(If),
            "else" => Some(Else),
            "return" => Some(Return),
            _ => None,
        }
    }

    pub fn kind(&self) -> TokenKind {
        use Token::*;

        match self {
            Plus => TokenKind::Plus,
            Minus => TokenKind::Minus,
            Star => TokenKind::Star,
            Slash => TokenKind::Slash,
            Equal => TokenKind::Equal,
            Bang => TokenKind::Bang,
            EqualEqual => TokenKind::EqualEqual,
            BangEqual => TokenKind::BangEqual,
            LessThan => TokenKind::LessThan,
            GreaterThan => TokenKind::GreaterThan,
            Comma => TokenKind::Comma,
            Semicolon => TokenKind::Semicolon,
            Colon => TokenKind::Colon,
            LeftParen => TokenKind::LeftParen,
            RightParen => TokenKind::RightParen,
            LeftBrace => TokenKind::LeftBrace,
            RightBrace => TokenKind::RightBrace,
            LeftBracket => TokenKind::LeftBracket,
            RightBracket => TokenKind::RightBracket,
            Identifier(_) => TokenKind::Identifier,
            Integer(_) => TokenKind::Integer,
            Float(_) => TokenKind::Float,
            String(_) => TokenKind::String,
            True => TokenKind::True,
            False => TokenKind::False,
            Function => TokenKind::Function,
            Let => TokenKind::Let,
            If => TokenKind::If,
            Else => TokenKind::Else,
            Return => TokenKind::Return,
            Illegal(_) => TokenKind::Illegal,
            Eof => TokenKind::Eof,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Identifier(name) => write!(f, "{}", name),
            Integer(literal) | Float(literal) => write!(f, "{}", literal),
            String(value) => write!(f, "\"{}\"", value),
            Illegal(literal) => write!(f, "{}", literal),
            token => write!(f, "{}", token.kind()),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        let s = match self {
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Equal => "=",
            Bang => "!",

            EqualEqual => "==",
            BangEqual => "!=",
            LessThan => "<",
            GreaterThan => ">",

            Comma => ",",
            Semicolon => ";",
            Colon => ":",

            LeftParen => "(",
            RightParen => ")",
            LeftBrace => "{",
            RightBrace => "}",
            LeftBracket => "[",
            RightBracket => "]",

            Identifier => "IDENT",
            Integer => "INT",
            Float => "FLOAT",
            String => "STRING",

            True => "true",
            False => "false",
            Function => "function",
            Let => "let",
            If => "if",
            Else => "else",
            Return => "return",

            Illegal => "ILLEGAL",
            Eof => "EOF",
        };

        write!(f, "{}", s)
    }
}
