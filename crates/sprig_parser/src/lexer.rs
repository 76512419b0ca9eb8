use std::iter::Peekable;
use std::str::Chars;

use log::trace;

use crate::span::{BytePos, Span, WithSpan};
use crate::token::Token;

/// Turns source text into tokens on demand.
///
/// Lexing never fails: characters that do not start any token come out as
/// [`Token::Illegal`] and are reported by the parser. Once the input is
/// exhausted, `next_token` keeps returning [`Token::Eof`], while the
/// [`Iterator`] implementation yields a single `Eof` and then stops.
#[derive(Clone)]
pub struct Lexer<'a> {
    input_iter: Peekable<Chars<'a>>,
    current_position: BytePos,
    reached_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input_iter: input.chars().peekable(),
            current_position: BytePos::new(0),
            reached_eof: false,
        }
    }

    /// Consume the next character from the list.
    fn read_char(&mut self) -> Option<char> {
        let next = self.input_iter.next();
        if let Some(c) = next {
            self.current_position = self.current_position.shift(c);
        }
        next
    }

    /// Get the next character from the list without consuming it.
    fn peek_char(&mut self) -> Option<&char> {
        self.input_iter.peek()
    }

    /// Get the character after the next one without consuming anything.
    fn peek_second_char(&self) -> Option<char> {
        let mut ahead = self.input_iter.clone();
        ahead.next();
        ahead.next()
    }

    /// Consume whitespace until a non-whitespace character is found.
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek_char() {
            if c.is_whitespace() {
                self.read_char();
            } else {
                break;
            }
        }
    }

    /// Read everything up to the closing quote as-is.
    fn read_string(&mut self) -> Token {
        let mut str = String::new();

        loop {
            match self.read_char() {
                Some('"') => return Token::String(str),
                Some(ch) => str.push(ch),
                // Unterminated strings are reported downstream
                None => return Token::Illegal(format!("\"{}", str)),
            }
        }
    }

    /// Read a digit run, optionally followed by `.` and a second digit run.
    fn read_number(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);

        self.read_digits(&mut s);

        // Only a `.` followed by a digit makes this a float
        let is_float = matches!(self.peek_char(), Some('.'))
            && matches!(self.peek_second_char(), Some(c) if is_digit(c));

        if is_float {
            // Consume the `.`
            if let Some(dot) = self.read_char() {
                s.push(dot);
            }
            self.read_digits(&mut s);
            Token::Float(s)
        } else {
            Token::Integer(s)
        }
    }

    fn read_digits(&mut self, s: &mut String) {
        while let Some(&ch) = self.peek_char() {
            if is_digit(ch) {
                s.push(ch);
                self.read_char();
            } else {
                break;
            }
        }
    }

    /// Read the current and following characters as an identifier or a keyword (if it exists).
    fn read_identifier_or_keyword(&mut self, first: char) -> Token {
        let mut identifier = String::new();
        identifier.push(first);

        while let Some(&ch) = self.peek_char() {
            if is_identifier_char(ch) || is_digit(ch) {
                identifier.push(ch);
                self.read_char();
            } else {
                break;
            }
        }

        match Token::lookup_keyword(&identifier) {
            Some(keyword_token) => keyword_token,
            None => Token::Identifier(identifier),
        }
    }

    /// Read a new token from the characters list.
    pub fn next_token(&mut self) -> WithSpan<Token> {
        self.skip_whitespace();

        let initial_position = self.current_position;

        let token = if let Some(c) = self.read_char() {
            match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,

                '=' => match self.peek_char() {
                    Some('=') => {
                        self.read_char();
                        Token::EqualEqual
                    }
                    _ => Token::Equal,
                },
                '!' => match self.peek_char() {
                    Some('=') => {
                        self.read_char();
                        Token::BangEqual
                    }
                    _ => Token::Bang,
                },
                '<' => Token::LessThan,
                '>' => Token::GreaterThan,

                ',' => Token::Comma,
                ';' => Token::Semicolon,
                ':' => Token::Colon,

                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                '{' => Token::LeftBrace,
                '}' => Token::RightBrace,
                '[' => Token::LeftBracket,
                ']' => Token::RightBracket,

                '"' => self.read_string(),

                c if is_digit(c) => self.read_number(c),
                c if is_identifier_char(c) => self.read_identifier_or_keyword(c),

                c => Token::Illegal(c.to_string()),
            }
        } else {
            Token::Eof
        };

        let span = Span::new(initial_position, self.current_position);
        trace!("token {:?} at {}", token, span);

        WithSpan::new(token, span)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = WithSpan<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reached_eof {
            return None;
        }

        let token = self.next_token();
        if token.value == Token::Eof {
            self.reached_eof = true;
        }
        Some(token)
    }
}

/// Whether or not the given character is a digit
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Whether or not the given character may start an identifier
fn is_identifier_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
