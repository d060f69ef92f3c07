// Cross-field "must not be greater than" rule for form models.
//
// Field values are read through accessors handed over when the rule is built,
// so the rule never needs to inspect the model by name at runtime.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// A model field value as the rule sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Ordering between two values, or `None` when they cannot be ordered against each other.
    ///
    /// Integers and floats compare numerically; every other kind only orders
    /// against itself. `Null` never orders.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Float(b)) => compare_integer_float(*a, *b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => {
                compare_integer_float(*b, *a).map(Ordering::reverse)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Exact ordering of an integer against a float; no rounding of `int` through `f64`.
fn compare_integer_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float above every i64
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if float < -I64_BOUND {
        return Some(Ordering::Greater);
    }

    // In range, so the truncated value converts to i64 exactly.
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&float),
        unequal => Some(unequal),
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            FieldValue::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::DateTime(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Models that can hand out field values by name.
pub trait FieldSource {
    /// `None` means the model has no field called `name`.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// The rule points at a field the model does not have.
    #[error("Rule on '{field}' refers to unknown field '{missing}'")]
    Configuration { field: String, missing: String },
    #[error("'{field}' ({field_value}) must be less than or equal to '{other}' ({other_value})")]
    Comparison {
        field: String,
        field_value: String,
        other: String,
        other_value: String,
    },
}

impl ValidationFailure {
    /// Display names of the fields the failure should be attached to.
    pub fn member_names(&self) -> Vec<&str> {
        match self {
            ValidationFailure::Configuration { field, .. } => vec![field.as_str()],
            ValidationFailure::Comparison { field, other, .. } => vec![field.as_str(), other.as_str()],
        }
    }
}

type Accessor<M> = Box<dyn Fn(&M) -> Option<FieldValue>>;

/// Fails when the guarded field is greater than its sibling.
pub struct LessOrEqualRule<M> {
    field: String,
    other: String,
    field_display: Option<String>,
    other_display: Option<String>,
    value_of: Accessor<M>,
    other_value_of: Accessor<M>,
}

impl<M> LessOrEqualRule<M> {
    /// `value_of` reads the guarded field, `other_value_of` the sibling.
    /// Either accessor returning `None` marks the rule as misconfigured.
    pub fn new(
        field: impl Into<String>,
        other: impl Into<String>,
        value_of: impl Fn(&M) -> Option<FieldValue> + 'static,
        other_value_of: impl Fn(&M) -> Option<FieldValue> + 'static,
    ) -> Self {
        Self {
            field: field.into(),
            other: other.into(),
            field_display: None,
            other_display: None,
            value_of: Box::new(value_of),
            other_value_of: Box::new(other_value_of),
        }
    }

    /// Names used in failure messages instead of the field names.
    pub fn with_display_names(mut self, field: impl Into<String>, other: impl Into<String>) -> Self {
        self.field_display = Some(field.into());
        self.other_display = Some(other.into());
        self
    }

    pub fn validate(&self, model: &M) -> Result<(), ValidationFailure> {
        let value = (self.value_of)(model).ok_or_else(|| self.misconfigured(&self.field))?;
        let other_value = (self.other_value_of)(model).ok_or_else(|| self.misconfigured(&self.other))?;

        if value.compare(&other_value) == Some(Ordering::Greater) {
            let failure = ValidationFailure::Comparison {
                field: self.field_display().to_string(),
                field_value: value.to_string(),
                other: self.other_display().to_string(),
                other_value: other_value.to_string(),
            };
            log::debug!("[Compare] {}", failure);
            return Err(failure);
        }
        Ok(())
    }

    fn field_display(&self) -> &str {
        self.field_display.as_deref().unwrap_or(&self.field)
    }

    fn other_display(&self) -> &str {
        self.other_display.as_deref().unwrap_or(&self.other)
    }

    fn misconfigured(&self, missing: &str) -> ValidationFailure {
        log::warn!("[Compare] rule on '{}' cannot read field '{}'", self.field, missing);
        ValidationFailure::Configuration {
            field: self.field_display().to_string(),
            missing: missing.to_string(),
        }
    }
}

impl<M: FieldSource + 'static> LessOrEqualRule<M> {
    /// Builds the rule from field names, reading both values through [`FieldSource`].
    pub fn by_name(field: impl Into<String>, other: impl Into<String>) -> Self {
        let field = field.into();
        let other = other.into();
        let (a, b) = (field.clone(), other.clone());
        Self::new(field, other, move |m: &M| m.field(&a), move |m: &M| m.field(&b))
    }
}
