//! Validation failure types.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldErrorKind {
    /// Declared `required` but absent from the attribute set.
    Required,
    /// Present but not declared by the schema.
    NotAllowed,
    /// Explicit `null` on a rule that is not nullable.
    Null,
    /// Value cannot be read as the rule type, even after conversion.
    InvalidType { expected: &'static str },
    /// Empty string on a rule that does not allow it.
    Empty,
    TooShort { min: usize },
    TooLong { max: usize },
    BelowMinimum { min: f64 },
    AboveMaximum { max: f64 },
    PatternMismatch { pattern: String },
    InvalidUuid,
    InvalidDate,
    NotOneOf { allowed: Vec<String> },
}

impl Display for FieldErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::NotAllowed => write!(f, "is not allowed"),
            Self::Null => write!(f, "must not be null"),
            Self::InvalidType { expected } => write!(f, "must be a {expected}"),
            Self::Empty => write!(f, "is not allowed to be empty"),
            Self::TooShort { min } => write!(f, "must be at least {min} characters long"),
            Self::TooLong { max } => {
                write!(f, "must be less than or equal to {max} characters long")
            }
            Self::BelowMinimum { min } => write!(f, "must be greater than or equal to {min}"),
            Self::AboveMaximum { max } => write!(f, "must be less than or equal to {max}"),
            Self::PatternMismatch { pattern } => {
                write!(f, "fails to match the required pattern: {pattern}")
            }
            Self::InvalidUuid => write!(f, "must be a valid GUID"),
            Self::InvalidDate => write!(f, "must be a valid date"),
            Self::NotOneOf { allowed } => write!(f, "must be one of [{}]", allowed.join(", ")),
        }
    }
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` {}", self.field, self.kind)
    }
}

/// Schema validation failure.
///
/// `details` is never empty. `table` is attached by the pre-save hook so
/// callers can tell which model rejected the write.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub table: Option<String>,
    pub details: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(details: Vec<FieldError>) -> Self {
        Self {
            table: None,
            details,
        }
    }

    /// Shorthand for a failure on exactly one field.
    pub fn single(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self::new(vec![FieldError::new(field, kind)])
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Returns the failure recorded for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&FieldErrorKind> {
        self.details
            .iter()
            .find(|detail| detail.field == field)
            .map(|detail| &detail.kind)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.table {
            Some(table) => write!(f, "validation failed for `{table}`: ")?,
            None => write!(f, "validation failed: ")?,
        }
        for (index, detail) in self.details.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{detail}")?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}
