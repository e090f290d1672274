// churnflow-core/src/domain/table/key.rs

use super::value::{Value, parse_int};
use std::fmt;

/// Normalized customer identifier used for joins and churn membership.
///
/// `7`, `7.0` and `"7"` all map to `CustomerKey::Id(7)`, so a key column that was widened
/// to float by missing values still joins with an integer one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CustomerKey {
    Id(i64),
    Code(String),
}

impl CustomerKey {
    /// `Ok(None)` for a missing value, `Err(rendered value)` when the value cannot be a key.
    pub fn from_value(value: &Value) -> Result<Option<Self>, String> {
        match value {
            v if v.is_null() => Ok(None),
            Value::Int(i) => Ok(Some(Self::Id(*i))),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Ok(Some(Self::Id(*f as i64)))
                } else {
                    Err(f.to_string())
                }
            }
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                Ok(Some(match parse_int(trimmed) {
                    Some(i) => Self::Id(i),
                    None => Self::Code(trimmed.to_string()),
                }))
            }
            other => Err(other.to_text().unwrap_or_default()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Id(i) => Value::Int(*i),
            Self::Code(s) => Value::Text(s.clone()),
        }
    }
}

impl fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(i) => write!(f, "{}", i),
            Self::Code(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_values_share_a_key() {
        let from_int = CustomerKey::from_value(&Value::Int(7));
        let from_float = CustomerKey::from_value(&Value::Float(7.0));
        let from_text = CustomerKey::from_value(&Value::Text(" 7 ".into()));
        assert_eq!(from_int, Ok(Some(CustomerKey::Id(7))));
        assert_eq!(from_float, Ok(Some(CustomerKey::Id(7))));
        assert_eq!(from_text, Ok(Some(CustomerKey::Id(7))));
    }

    #[test]
    fn test_missing_and_invalid_keys() {
        assert_eq!(CustomerKey::from_value(&Value::Null), Ok(None));
        assert_eq!(CustomerKey::from_value(&Value::Float(f64::NAN)), Ok(None));
        assert!(CustomerKey::from_value(&Value::Float(7.5)).is_err());
        assert_eq!(
            CustomerKey::from_value(&Value::Text("C-001".into())),
            Ok(Some(CustomerKey::Code("C-001".into())))
        );
    }
}
