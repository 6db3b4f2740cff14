use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// Arithmetic negation: -x
    Negation,
    /// Logical not: not x, !x
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LogicalAnd,
    LogicalOr,
    Equality,
    Inequality,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// An expression AST node.
#[derive(Debug, Clone)]
pub enum Expression {
    // Literals
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    NoneLiteral,
    /// f"..." with `{expr}` interpolations
    FormatString(TemplateString),
    ListLiteral(Vec<Expression>),
    MapLiteral(Vec<(Expression, Expression)>),

    // References
    VariableReference(String, Range<usize>),

    // Postfix
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        span: Range<usize>,
    },
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
        span: Range<usize>,
    },

    // Operations
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

/// A format string split into literal text and embedded expressions.
#[derive(Debug, Clone)]
pub struct TemplateString {
    pub parts: Vec<TemplateStringPart>,
}

#[derive(Debug, Clone)]
pub enum TemplateStringPart {
    /// Literal text content, escapes already resolved.
    Literal(String),
    /// An embedded expression to be evaluated and rendered.
    Expression(Expression),
}

impl TemplateString {
    pub fn literal(s: impl Into<String>) -> Self {
        TemplateString {
            parts: vec![TemplateStringPart::Literal(s.into())],
        }
    }
}

/// A single statement. Statements run in order against one shared scope.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `variable = expression`
    Assignment {
        variable: String,
        value: Expression,
        span: Range<usize>,
    },
    /// Expression evaluated for its side effects, result discarded.
    Expression {
        value: Expression,
        span: Range<usize>,
    },
    /// `if c { } else if c { } else { }`
    If {
        branches: Vec<(Expression, Vec<Statement>)>,
        otherwise: Option<Vec<Statement>>,
        span: Range<usize>,
    },
    /// `for name in iterable { }`
    For {
        variable: String,
        iterable: Expression,
        body: Vec<Statement>,
        span: Range<usize>,
    },
}

impl Statement {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Statement::Assignment { span, .. } => span,
            Statement::Expression { span, .. } => span,
            Statement::If { span, .. } => span,
            Statement::For { span, .. } => span,
        }
    }
}
