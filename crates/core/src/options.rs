//! UI option pairs and the helpers that strip them down to bare ids.
//!
//! Select widgets hand back `{ value, label }` pairs. Everything that goes
//! over the wire wants the bare id, so the unwrapping lives here once and
//! is shared by the query builder and the publish-scope serializer.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::DbId;

/// A `{ value, label }` pair as produced by a select widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOption {
    pub value: DbId,
    #[serde(default)]
    pub label: String,
}

impl RuleOption {
    pub fn new(value: DbId, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }

    /// An option with no display label.
    pub fn bare(value: DbId) -> Self {
        Self::new(value, "")
    }
}

/// A course selection: either already a plain number or still an option pair.
///
/// Parsing a `CourseInput` directly is strict: a string such as `"2"` is an
/// error. Editor rule rows read their course through [`lenient_course`]
/// instead, where such a value counts as no course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseInput {
    Number(DbId),
    Option(RuleOption),
}

/// Deserialize an optional course, treating anything that is neither a
/// number nor an option pair (strings, booleans, `null`) as no course.
pub fn lenient_course<'de, D>(deserializer: D) -> Result<Option<CourseInput>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

/// Anything that carries a single bare id.
pub trait OptionValue {
    fn option_value(&self) -> DbId;
}

impl OptionValue for DbId {
    fn option_value(&self) -> DbId {
        *self
    }
}

impl OptionValue for RuleOption {
    fn option_value(&self) -> DbId {
        self.value
    }
}

impl OptionValue for CourseInput {
    fn option_value(&self) -> DbId {
        match self {
            CourseInput::Number(n) => *n,
            CourseInput::Option(opt) => opt.value,
        }
    }
}

/// Unwrap an optional selection to its bare id, `None` when nothing is selected.
pub fn unwrap_value<T: OptionValue>(selection: Option<&T>) -> Option<DbId> {
    selection.map(OptionValue::option_value)
}

/// Unwrap a multi-selection to bare ids, preserving selection order.
pub fn unwrap_values<T: OptionValue>(selection: &[T]) -> Vec<DbId> {
    selection.iter().map(OptionValue::option_value).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
