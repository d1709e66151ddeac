//! Declarative per-field acceptance rules.
//!
//! # Responsibility
//! - Describe the type, optionality and constraints of one field.
//! - Convert loosely typed input into its canonical JSON form.
//!
//! # Invariants
//! - Rules are optional unless `required()` is called.
//! - Conversion never widens the accepted set beyond what the rule type
//!   can represent (e.g. `"4.5"` is rejected by an integer rule).
//! - Dates normalize to Unix epoch milliseconds.

use super::error::FieldErrorKind;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Number, Value};
use uuid::Uuid;

/// Base type a rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    String,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 / `YYYY-MM-DD` string or epoch milliseconds.
    Date,
    /// Any JSON value, passed through untouched.
    Any,
}

impl RuleKind {
    fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Any => "value",
        }
    }
}

/// Validation rule for a single field.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    required: bool,
    nullable: bool,
    allow_empty: bool,
    trim: bool,
    lowercase: bool,
    uuid: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<Regex>,
    one_of: Vec<String>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Rule {
    fn of(kind: RuleKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
            allow_empty: false,
            trim: false,
            lowercase: false,
            uuid: false,
            min_len: None,
            max_len: None,
            pattern: None,
            one_of: Vec::new(),
            min: None,
            max: None,
        }
    }

    pub fn string() -> Self {
        Self::of(RuleKind::String)
    }

    pub fn integer() -> Self {
        Self::of(RuleKind::Integer)
    }

    pub fn number() -> Self {
        Self::of(RuleKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(RuleKind::Boolean)
    }

    pub fn date() -> Self {
        Self::of(RuleKind::Date)
    }

    pub fn any() -> Self {
        Self::of(RuleKind::Any)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Accepts an explicit JSON `null`.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accepts `""` for string rules.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Trims surrounding whitespace before any other check.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Requires a UUID; output is normalized to lowercase hyphenated form.
    pub fn uuid(mut self) -> Self {
        self.uuid = true;
        self
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn one_of<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = allowed.into_iter().map(Into::into).collect();
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Checks `value` and returns its normalized form.
    pub fn apply(&self, value: &Value) -> Result<Value, FieldErrorKind> {
        if value.is_null() {
            return if self.nullable || self.kind == RuleKind::Any {
                Ok(Value::Null)
            } else {
                Err(FieldErrorKind::Null)
            };
        }

        match self.kind {
            RuleKind::String => self.apply_string(value),
            RuleKind::Integer => {
                let parsed = read_integer(value).ok_or(self.type_error())?;
                self.check_range(parsed as f64)?;
                Ok(Value::from(parsed))
            }
            RuleKind::Number => {
                let parsed = read_number(value).ok_or(self.type_error())?;
                if let Some(float) = parsed.as_f64() {
                    self.check_range(float)?;
                }
                Ok(parsed)
            }
            RuleKind::Boolean => read_boolean(value)
                .map(Value::Bool)
                .ok_or(self.type_error()),
            RuleKind::Date => read_epoch_millis(value)
                .map(Value::from)
                .ok_or(FieldErrorKind::InvalidDate),
            RuleKind::Any => Ok(value.clone()),
        }
    }

    fn apply_string(&self, value: &Value) -> Result<Value, FieldErrorKind> {
        let raw = value.as_str().ok_or(self.type_error())?;
        let mut text = if self.trim {
            raw.trim().to_string()
        } else {
            raw.to_string()
        };
        if self.lowercase {
            text = text.to_lowercase();
        }

        if text.is_empty() && !self.allow_empty {
            return Err(FieldErrorKind::Empty);
        }

        let length = text.chars().count();
        if let Some(min) = self.min_len {
            if length < min {
                return Err(FieldErrorKind::TooShort { min });
            }
        }
        if let Some(max) = self.max_len {
            if length > max {
                return Err(FieldErrorKind::TooLong { max });
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&text) {
                return Err(FieldErrorKind::PatternMismatch {
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        if self.uuid {
            let parsed = Uuid::parse_str(&text).map_err(|_| FieldErrorKind::InvalidUuid)?;
            text = parsed.hyphenated().to_string();
        }

        if !self.one_of.is_empty() && !self.one_of.iter().any(|allowed| *allowed == text) {
            return Err(FieldErrorKind::NotOneOf {
                allowed: self.one_of.clone(),
            });
        }

        Ok(Value::String(text))
    }

    fn check_range(&self, value: f64) -> Result<(), FieldErrorKind> {
        if let Some(min) = self.min {
            if value < min {
                return Err(FieldErrorKind::BelowMinimum { min });
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(FieldErrorKind::AboveMaximum { max });
            }
        }
        Ok(())
    }

    fn type_error(&self) -> FieldErrorKind {
        FieldErrorKind::InvalidType {
            expected: self.kind.label(),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_float(value: f64) -> Option<i64> {
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value <= i64::MAX as f64
    {
        Some(value as i64)
    } else {
        None
    }
}

fn read_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral_float)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral_float))
        }
        _ => None,
    }
}

fn read_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(integer) = text.parse::<i64>() {
                return Some(Value::from(integer));
            }
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

fn read_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn read_epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => read_integer(value),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(millis) = text.parse::<i64>() {
                return Some(millis);
            }
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.timestamp_millis());
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc().timestamp_millis())
        }
        _ => None,
    }
}
