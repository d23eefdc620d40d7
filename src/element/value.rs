use std::collections::BTreeMap;
use std::sync::Arc;

/// Keyed attribute values for one attribute group (shape, style or extra).
pub type PropMap = BTreeMap<String, PropValue>;

/// One attribute value.
///
/// Arrays are reference-counted so that instance identity survives cloning of the
/// surrounding maps; [`PropValue::same_instance`] exposes it and
/// [`PropValue::deep_clone`] breaks it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Scalar number.
    Number(f64),
    /// Flag.
    Bool(bool),
    /// String value (colors, path data, image sources, text content).
    Text(String),
    /// Flat numeric array (point lists, dash patterns).
    Array(Arc<Vec<f64>>),
}

impl PropValue {
    /// Build an array value from owned numbers.
    pub fn array(values: impl Into<Vec<f64>>) -> Self {
        Self::Array(Arc::new(values.into()))
    }

    /// Numeric payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Array payload, if this is an array.
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Self::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// String payload, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns `true` for arrays and for finite numbers.
    pub fn is_interpolable(&self) -> bool {
        match self {
            Self::Number(v) => v.is_finite(),
            Self::Array(_) => true,
            Self::Bool(_) | Self::Text(_) => false,
        }
    }

    /// Returns `true` when both values are arrays backed by the same allocation.
    pub fn same_instance(&self, other: &PropValue) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Clone the value, giving arrays a fresh allocation.
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Array(v) => Self::Array(Arc::new(v.as_ref().clone())),
            other => other.clone(),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b) || a.as_slice() == b.as_slice(),
            _ => false,
        }
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<f64>> for PropValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(Arc::new(v))
    }
}

impl From<Arc<Vec<f64>>> for PropValue {
    fn from(v: Arc<Vec<f64>>) -> Self {
        Self::Array(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/value.rs"]
mod tests;
