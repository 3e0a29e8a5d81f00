//! SQL statement model.
//!
//! A `Statement` is caller-supplied SQL text with `?` placeholders plus the
//! values bound to them by 1-based position. The text is passed to the driver
//! verbatim; the only inspection performed is the leading-keyword check that
//! decides whether the statement is a read or a write.

use crate::error::{PersistError, PersistResult};
use crate::models::Value;
use std::collections::BTreeMap;

const SELECT_KEYWORD: &str = "SELECT";

/// Whether a statement reads (SELECT) or modifies data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    parameters: BTreeMap<usize, Value>,
}

impl Statement {
    /// Create a statement from SQL text. Blank text is rejected.
    pub fn new(text: impl Into<String>) -> PersistResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PersistError::null_argument(
                "SQL statement text must be non-empty",
            ));
        }
        Ok(Self {
            text,
            parameters: BTreeMap::new(),
        })
    }

    /// Bind `value` at `index` (the first parameter is 1), replacing any
    /// previous value at that position.
    pub fn set_parameter(&mut self, index: usize, value: impl Into<Value>) -> PersistResult<&mut Self> {
        if index < 1 {
            return Err(PersistError::invalid_argument(
                "Parameter index starts at 1",
            ));
        }
        self.parameters.insert(index, value.into());
        Ok(self)
    }

    /// Consuming form of `set_parameter` for builder-style construction.
    pub fn with_parameter(mut self, index: usize, value: impl Into<Value>) -> PersistResult<Self> {
        self.set_parameter(index, value)?;
        Ok(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bound parameters ordered by position.
    pub fn parameters(&self) -> &BTreeMap<usize, Value> {
        &self.parameters
    }

    pub fn kind(&self) -> StatementKind {
        if leading_keyword_is(&self.text, SELECT_KEYWORD) {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }

    pub fn is_read(&self) -> bool {
        self.kind() == StatementKind::Read
    }

    /// Check if the statement text starts with `keyword`, ignoring case and
    /// leading whitespace.
    pub fn starts_with_keyword(&self, keyword: &str) -> bool {
        leading_keyword_is(&self.text, keyword)
    }

    /// Parameter values in bind order.
    ///
    /// Drivers bind positionally, so the bound positions must be exactly
    /// `1..=n`. A gap is reported as a data access error naming the first
    /// unbound position.
    pub fn ordered_values(&self) -> PersistResult<Vec<&Value>> {
        let mut values = Vec::with_capacity(self.parameters.len());
        for (expected, (&index, value)) in (1..).zip(self.parameters.iter()) {
            if index != expected {
                return Err(PersistError::data_access(
                    format!("Parameter {} is not bound", expected),
                    None,
                    "Bind every placeholder position from 1 without gaps",
                ));
            }
            values.push(value);
        }
        Ok(values)
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn leading_keyword_is(text: &str, keyword: &str) -> bool {
    text.trim_start()
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}
