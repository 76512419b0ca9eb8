use std::rc::Rc;

use log::{debug, trace};
use thiserror::Error;

use crate::ast::{
    ArrayLiteral, BlockStatement, CallExpression, Expression, FunctionLiteral, HashLiteral,
    IdentifierLiteral, IfExpression, IndexExpression, InfixExpression, PrefixExpression, Program,
    Statement,
};
use crate::lexer::Lexer;
use crate::span::{Span, WithSpan};
use crate::token::{Token, TokenKind};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {got} instead (at {span})")]
    UnexpectedToken {
        expected: TokenKind,
        got: Token,
        span: Span,
    },
    #[error("no prefix parse function found for {kind} (at {span})")]
    NoPrefixParseFn { kind: TokenKind, span: Span },
    #[error("could not parse {literal} as integer (at {span})")]
    InvalidInteger { literal: String, span: Span },
    #[error("could not parse {literal} as float (at {span})")]
    InvalidFloat { literal: String, span: Span },
    #[error("illegal token {literal} (at {span})")]
    IllegalToken { literal: String, span: Span },
    #[error("expression nested too deeply, limit is {limit} (at {span})")]
    NestedTooDeeply { limit: usize, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        use ParseError::*;

        match self {
            UnexpectedToken { span, .. }
            | NoPrefixParseFn { span, .. }
            | InvalidInteger { span, .. }
            | InvalidFloat { span, .. }
            | IllegalToken { span, .. }
            | NestedTooDeeply { span, .. } => *span,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// How deep expressions and blocks may nest before parsing gives up on the statement
pub const MAX_NESTING_DEPTH: usize = 128;

/// Binding power of operators, lowest to highest
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Precedence {
    Lowest,
    /// `==` `!=`
    Equals,
    /// `<` `>`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `-x` `!x`
    Prefix,
    /// `f(x)`
    Call,
    /// `a[i]`
    Index,
}

impl Precedence {
    fn of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
            TokenKind::LessThan | TokenKind::GreaterThan => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Star | TokenKind::Slash => Precedence::Product,
            TokenKind::LeftParen => Precedence::Call,
            TokenKind::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

/// Parse a whole source text, returning the program along with every diagnostic found.
///
/// The program is always returned; statements that failed to parse are left out of it.
/// A non-empty diagnostics list means the program should not be evaluated.
pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    (program, parser.into_errors())
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,

    current_token: WithSpan<Token>,
    peek_token: WithSpan<Token>,

    errors: Vec<ParseError>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Parser<'a> {
        let cur = lexer.next_token();
        let next = lexer.next_token();
        Parser {
            lexer,
            current_token: cur,
            peek_token: next,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Diagnostics collected so far, in the order they were found
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.current_token_is(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(statement) => {
                    trace!("parsed statement {}", statement);
                    program.statements.push(statement)
                }
                Err(error) => self.record(error),
            }
            self.next_token();
        }

        program
    }

    fn record(&mut self, error: ParseError) {
        debug!("parse error: {}", error);
        self.errors.push(error);
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current_token.value {
            Token::Let => self.parse_let_statement(),
            Token::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> ParseResult<Statement> {
        let name = self.expect_peek_identifier()?;

        self.expect_peek(TokenKind::Equal)?;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        // A bare `return` gives back null
        if self.peek_token_is(TokenKind::Semicolon)
            || self.peek_token_is(TokenKind::RightBrace)
            || self.peek_token_is(TokenKind::Eof)
        {
            self.skip_optional_semicolon();
            return Ok(Statement::Return { value: None });
        }

        // Consume the `return` token
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Ok(Statement::Return { value: Some(value) })
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Ok(Statement::Expression { expression })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        self.enter_nested()?;
        let expression = self.parse_operators(precedence);
        self.depth -= 1;

        expression
    }

    fn parse_operators(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let mut left = self.parse_prefix()?;

        while !self.peek_token_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expression> {
        match self.current_token.value.kind() {
            TokenKind::Bang | TokenKind::Minus => return self.parse_prefix_expression(),
            TokenKind::LeftParen => return self.parse_grouped_expression(),
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_hash_literal(),
            TokenKind::If => return self.parse_if_expression(),
            TokenKind::Function => return self.parse_function_literal(),
            _ => {}
        }

        let span = self.current_token.span;

        match &self.current_token.value {
            Token::Identifier(name) => Ok(Expression::Identifier(IdentifierLiteral::from(
                name.as_str(),
            ))),
            Token::Integer(literal) => match literal.parse() {
                Ok(value) => Ok(Expression::Integer(value)),
                Err(_) => Err(ParseError::InvalidInteger {
                    literal: literal.clone(),
                    span,
                }),
            },
            Token::Float(literal) => match literal.parse() {
                Ok(value) => Ok(Expression::Float(value)),
                Err(_) => Err(ParseError::InvalidFloat {
                    literal: literal.clone(),
                    span,
                }),
            },
            Token::String(value) => Ok(Expression::String(value.clone())),
            Token::True => Ok(Expression::Boolean(true)),
            Token::False => Ok(Expression::Boolean(false)),
            Token::Illegal(literal) => Err(ParseError::IllegalToken {
                literal: literal.clone(),
                span,
            }),
            token => Err(ParseError::NoPrefixParseFn {
                kind: token.kind(),
                span,
            }),
        }
    }

    fn parse_infix(&mut self, left: Expression) -> ParseResult<Expression> {
        match self.current_token.value.kind() {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::EqualEqual
            | TokenKind::BangEqual
            | TokenKind::LessThan
            | TokenKind::GreaterThan => self.parse_infix_expression(left),
            TokenKind::LeftParen => self.parse_call_expression(left),
            TokenKind::LeftBracket => self.parse_index_expression(left),
            // Tokens without a precedence never get here
            _ => Ok(left),
        }
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Expression> {
        let operator = self.current_token.value.clone();
        self.next_token();

        let right = self.parse_expression(Precedence::Prefix)?;

        Ok(Expression::Prefix(Box::new(PrefixExpression {
            operator,
            right,
        })))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        let operator = self.current_token.value.clone();
        let precedence = self.current_precedence();
        self.next_token();

        // Parsing the right side at the operator's own precedence keeps operators left-associative
        let right = self.parse_expression(precedence)?;

        Ok(Expression::Infix(Box::new(InfixExpression {
            left,
            operator,
            right,
        })))
    }

    fn parse_grouped_expression(&mut self) -> ParseResult<Expression> {
        self.next_token();

        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        Ok(expression)
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expression> {
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;

        Ok(Expression::Array(Box::new(ArrayLiteral { elements })))
    }

    fn parse_hash_literal(&mut self) -> ParseResult<Expression> {
        let mut pairs = Vec::new();

        while !self.peek_token_is(TokenKind::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek_token_is(TokenKind::RightBrace) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }

        self.expect_peek(TokenKind::RightBrace)?;

        Ok(Expression::Hash(Box::new(HashLiteral { pairs })))
    }

    fn parse_if_expression(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::RightParen)?;
        self.expect_peek(TokenKind::LeftBrace)?;

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token_is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If(Box::new(IfExpression {
            condition,
            consequence,
            alternative,
        })))
    }

    /// Parse statements up to the closing `}`, expecting the current token to be the opening `{`.
    fn parse_block_statement(&mut self) -> ParseResult<BlockStatement> {
        self.enter_nested()?;
        let block = self.parse_block_contents();
        self.depth -= 1;

        block
    }

    fn parse_block_contents(&mut self) -> ParseResult<BlockStatement> {
        let mut block = BlockStatement::default();
        self.next_token();

        while !self.current_token_is(TokenKind::RightBrace) {
            if self.current_token_is(TokenKind::Eof) {
                return Err(ParseError::UnexpectedToken {
                    expected: TokenKind::RightBrace,
                    got: Token::Eof,
                    span: self.current_token.span,
                });
            }

            match self.parse_statement() {
                Ok(statement) => block.statements.push(statement),
                Err(error) => self.record(error),
            }
            self.next_token();
        }

        Ok(block)
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expression::Function(Box::new(FunctionLiteral {
            parameters,
            body: Rc::new(body),
        })))
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<IdentifierLiteral>> {
        let mut parameters = Vec::new();

        if self.peek_token_is(TokenKind::RightParen) {
            self.next_token();
            return Ok(parameters);
        }

        parameters.push(self.expect_peek_identifier()?);

        while self.peek_token_is(TokenKind::Comma) {
            self.next_token();
            parameters.push(self.expect_peek_identifier()?);
        }

        self.expect_peek(TokenKind::RightParen)?;

        Ok(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> ParseResult<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;

        Ok(Expression::Call(Box::new(CallExpression {
            function,
            arguments,
        })))
    }

    fn parse_index_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        self.next_token();

        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;

        Ok(Expression::Index(Box::new(IndexExpression { left, index })))
    }

    /// Parse comma-separated expressions up to `end`, expecting the current token to be the opening delimiter.
    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_token_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;

        Ok(list)
    }

    /// Every successful call must be paired with a decrement of `depth`
    fn enter_nested(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestedTooDeeply {
                limit: MAX_NESTING_DEPTH,
                span: self.current_token.span,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.current_token = std::mem::replace(&mut self.peek_token, next);
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_token_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn current_token_is(&self, kind: TokenKind) -> bool {
        self.current_token.value.is(kind)
    }

    fn peek_token_is(&self, kind: TokenKind) -> bool {
        self.peek_token.value.is(kind)
    }

    fn current_precedence(&self) -> Precedence {
        Precedence::of(self.current_token.value.kind())
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek_token.value.kind())
    }

    fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_token_is(kind) {
            self.next_token();
            Ok(())
        } else {
            Err(self.peek_error(kind))
        }
    }

    fn expect_peek_identifier(&mut self) -> ParseResult<IdentifierLiteral> {
        let name = match &self.peek_token.value {
            Token::Identifier(name) => IdentifierLiteral::from(name.as_str()),
            _ => return Err(self.peek_error(TokenKind::Identifier)),
        };

        self.next_token();
        Ok(name)
    }

    fn peek_error(&self, expected: TokenKind) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            got: self.peek_token.value.clone(),
            span: self.peek_token.span,
        }
    }
}
