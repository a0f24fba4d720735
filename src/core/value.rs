use std::fmt;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Integers up to this magnitude convert to f64 exactly.
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;
const TWO_POW_63: f64 = 9.223372036854775808e18;

/// Scalar value of an indexed member or a bound statement parameter.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Uuid(_) => "UUID",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert the value to `target`, allowing only lossless conversions.
    ///
    /// Returns `None` when the value cannot represent the declared type, e.g. a
    /// float with a fractional part stored in an integer member, or an integer
    /// beyond 2^53 stored in a float member.
    pub fn coerce_to(&self, target: DataType) -> Option<Value> {
        match (self, target) {
            (Self::Null, _) => Some(Self::Null),
            (Self::Integer(_), DataType::Integer)
            | (Self::Float(_), DataType::Float)
            | (Self::Text(_), DataType::Text)
            | (Self::Boolean(_), DataType::Boolean)
            | (Self::Timestamp(_), DataType::Timestamp)
            | (Self::Uuid(_), DataType::Uuid) => Some(self.clone()),

            (Self::Integer(i), DataType::Float) => {
                (i.unsigned_abs() <= MAX_EXACT_FLOAT_INT).then(|| Self::Float(*i as f64))
            }
            (Self::Float(f), DataType::Integer) => {
                // i64::MAX as f64 rounds up to 2^63, which is already out of range.
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < TWO_POW_63 {
                    Some(Self::Integer(*f as i64))
                } else {
                    None
                }
            }
            (Self::Boolean(b), DataType::Integer) => Some(Self::Integer(i64::from(*b))),
            (Self::Uuid(u), DataType::Text) => Some(Self::Text(u.to_string())),
            (Self::Text(s), DataType::Uuid) => Uuid::parse_str(s).ok().map(Self::Uuid),
            (Self::Text(s), DataType::Timestamp) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| Self::Timestamp(dt.with_timezone(&Utc))),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Uuid(u) => write!(f, "{}", u),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Storage data type of an indexed member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Uuid,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        value.coerce_to(*self).is_some()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Uuid => write!(f, "UUID"),
        }
    }
}
