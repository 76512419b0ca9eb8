use crate::token::Token;
use std::{fmt::Display, rc::Rc};

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Program {
        Program {
            statements: Vec::new(),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join(&self.statements, "; "))
    }
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Let {
        /// The name/identifier of the variable
        name: IdentifierLiteral,
        /// The value being assigned
        value: Expression,
    },
    Return {
        /// The value being returned, `return;` returns null
        value: Option<Expression>,
    },
    Expression {
        /// The expression for this statement
        expression: Expression,
    },
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Statement::*;

        match self {
            Let { name, value } => write!(
                f,
                "{tok} {ident} = {val}",
                tok = Token::Let,
                ident = name,
                val = value
            ),
            Return { value: Some(value) } => write!(f, "{} {}", Token::Return, value),
            Return { value: None } => write!(f, "{}", Token::Return),
            Expression { expression } => write!(f, "{}", expression),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Expression {
    // Literal
    Identifier(IdentifierLiteral),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),

    // Complex
    Prefix(Box<PrefixExpression>),
    Infix(Box<InfixExpression>),
    If(Box<IfExpression>),
    Function(Box<FunctionLiteral>),
    Call(Box<CallExpression>),
    Array(Box<ArrayLiteral>),
    Hash(Box<HashLiteral>),
    Index(Box<IndexExpression>),
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Expression::*;

        match self {
            Identifier(name) => write!(f, "{}", name),
            Integer(value) => write!(f, "{}", value),
            // Same rendering as float objects, so function bodies print their literals unchanged
            Float(value) => write!(f, "{}", ryu::Buffer::new().format(*value)),
            Boolean(value) => write!(f, "{}", value),
            String(value) => write!(f, "\"{}\"", value),

            Prefix(prefix) => write!(f, "{}", prefix),
            Infix(infix) => write!(f, "{}", infix),
            If(if_exp) => write!(f, "{}", if_exp),
            Function(func) => write!(f, "{}", func),
            Call(call) => write!(f, "{}", call),
            Array(arr) => write!(f, "{}", arr),
            Hash(hash) => write!(f, "{}", hash),
            Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct IdentifierLiteral {
    pub name: String,
}

impl Display for IdentifierLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for IdentifierLiteral {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl From<String> for IdentifierLiteral {
    fn from(name: String) -> Self {
        Self { name }
    }
}

#[derive(Debug, PartialEq)]
pub struct PrefixExpression {
    pub operator: Token,
    pub right: Expression,
}

impl Display for PrefixExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({op}{r})", op = self.operator, r = self.right)
    }
}

#[derive(Debug, PartialEq)]
pub struct InfixExpression {
    pub left: Expression,
    pub operator: Token,
    pub right: Expression,
}

impl Display for InfixExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({l} {op} {r})",
            l = self.left,
            op = self.operator,
            r = self.right
        )
    }
}

/// An ordered list of statements between `{` and `}`
#[derive(Debug, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join(&self.statements, "; "))
    }
}

#[derive(Debug, PartialEq)]
pub struct IfExpression {
    pub condition: Expression,
    /// Block if condition is truthy
    pub consequence: BlockStatement,
    /// Block if condition is falsy
    pub alternative: Option<BlockStatement>,
}

impl Display for IfExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "if {} {{ {} }}", self.condition, self.consequence)?;

        if let Some(ref alt) = self.alternative {
            write!(f, " else {{ {} }}", alt)?;
        }

        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub struct FunctionLiteral {
    /// Parameter identifiers
    pub parameters: Vec<IdentifierLiteral>,
    /// Shared with every function object created from this literal
    pub body: Rc<BlockStatement>,
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}) {{ {} }}",
            Token::Function,
            join(&self.parameters, ", "),
            self.body
        )
    }
}

#[derive(Debug, PartialEq)]
pub struct CallExpression {
    pub function: Expression,
    pub arguments: Vec<Expression>,
}

impl Display for CallExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.function, join(&self.arguments, ", "))
    }
}

#[derive(Debug, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
}

impl Display for ArrayLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", join(&self.elements, ", "))
    }
}

#[derive(Debug, PartialEq)]
pub struct HashLiteral {
    /// Key/value pairs in source order; keys are evaluated at runtime
    pub pairs: Vec<(Expression, Expression)>,
}

impl Display for HashLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self
            .pairs
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();

        write!(f, "{{{}}}", pairs.join(", "))
    }
}

#[derive(Debug, PartialEq)]
pub struct IndexExpression {
    pub left: Expression,
    pub index: Expression,
}

impl Display for IndexExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}[{}])", self.left, self.index)
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<String>>()
        .join(separator)
}
