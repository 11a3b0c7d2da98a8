//! FILENAME: core/parser/src/error.rs
//! PURPOSE: Error taxonomy shared by the tokenizer, the registries and the evaluator.
//! CONTEXT: Every failure aborts the current calculation and surfaces here with
//! the offending token, name or span needed to render a message.

use crate::ast::NodeType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    // Syntax
    #[error("Unexpected end of input.")]
    UnexpectedEnd,

    #[error("Unexpected token '{0}'.")]
    UnexpectedToken(String),

    #[error("Invalid or unexpected token")]
    InvalidToken,

    #[error("variable name can not be empty.")]
    VariableNameEmpty,

    #[error("Function name cannot be empty.")]
    FunctionNameEmpty,

    #[error("The group cannot be empty")]
    GroupEmpty,

    #[error("The group should end with \")\".")]
    UnexpectedGroupEnd,

    #[error("Cannot follow string after operator.")]
    StringFollowOperator,

    // Type
    #[error("Unexpected {0}.")]
    UnexpectedType(String),

    #[error("Argument of type '{actual}' is not assignable to parameter of type '{expected}'.")]
    NotAssignableParameter { actual: NodeType, expected: NodeType },

    #[error("Type '{actual}' is not assignable to type '{expected}'.")]
    NotAssignableType { actual: NodeType, expected: NodeType },

    #[error("Invalid data: {0}.")]
    InvalidData(String),

    // Reference
    #[error("{0} is not defined.")]
    VariableNotDefined(String),

    #[error("{0} is not a function.")]
    NotAFunction(String),

    #[error("Method ${0} not called.")]
    NotCalled(String),

    // Arity
    #[error("At least {0} arguments is required.")]
    LeastNArgumentsIsRequired(usize),

    #[error("Expected {expected} arguments, but got {got}.")]
    ExpectedNArguments { expected: usize, got: usize },

    #[error("Expected {min} to {max} arguments, but got {got}.")]
    ExpectedN2MArguments { min: usize, max: usize, got: usize },

    #[error("At most {0} arguments is required.")]
    MostNArgumentsIsRequired(usize),

    #[error("[method {0}] A required parameter cannot follow an optional parameter.")]
    RequiredFollowOptional(String),

    // Numeric
    #[error("The number will become Infinity.")]
    WillBeInfinity,

    #[error("Division by zero.")]
    DivisionByZero,

    // Registration
    #[error("Cannot redeclare variable '{0}'.")]
    RedeclareVariable(String),

    // Custom
    /// Free-form failure raised by a plugin callable.
    #[error("{0}")]
    Message(String),

    /// A plugin callable failed; `span` is the source text of the call.
    #[error("[{span}] {source}")]
    Custom {
        span: String,
        #[source]
        source: Box<FormulaError>,
    },
}

/// Coarse grouping of error kinds.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorCategory {
    Syntax,
    Type,
    Reference,
    Arity,
    Numeric,
    Registration,
    Custom,
}

impl FormulaError {
    pub fn message(message: impl Into<String>) -> Self {
        FormulaError::Message(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FormulaError::UnexpectedEnd
            | FormulaError::UnexpectedToken(_)
            | FormulaError::InvalidToken
            | FormulaError::VariableNameEmpty
            | FormulaError::FunctionNameEmpty
            | FormulaError::GroupEmpty
            | FormulaError::UnexpectedGroupEnd
            | FormulaError::StringFollowOperator => ErrorCategory::Syntax,

            FormulaError::UnexpectedType(_)
            | FormulaError::NotAssignableParameter { .. }
            | FormulaError::NotAssignableType { .. }
            | FormulaError::InvalidData(_) => ErrorCategory::Type,

            FormulaError::VariableNotDefined(_)
            | FormulaError::NotAFunction(_)
            | FormulaError::NotCalled(_) => ErrorCategory::Reference,

            FormulaError::LeastNArgumentsIsRequired(_)
            | FormulaError::ExpectedNArguments { .. }
            | FormulaError::ExpectedN2MArguments { .. }
            | FormulaError::MostNArgumentsIsRequired(_)
            | FormulaError::RequiredFollowOptional(_) => ErrorCategory::Arity,

            FormulaError::WillBeInfinity | FormulaError::DivisionByZero => ErrorCategory::Numeric,

            FormulaError::RedeclareVariable(_) => ErrorCategory::Registration,

            FormulaError::Message(_) | FormulaError::Custom { .. } => ErrorCategory::Custom,
        }
    }
}

pub type FormulaResult<T> = Result<T, FormulaError>;
