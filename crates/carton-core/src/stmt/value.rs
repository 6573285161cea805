use crate::{Error, Result};

/// A scalar value crossing the driver boundary.
///
/// Row data, query parameters, and record fields are all expressed in terms
/// of this type. Conversions to native types are explicit and return a
/// type-conversion error on mismatch; integer conversions tolerate
/// signed/unsigned crossings when the value fits.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// Unsigned 64-bit integer
    U64(u64),

    /// 64-bit floating point value
    F64(f64),

    /// String value
    String(String),

    /// Raw byte string
    Bytes(Vec<u8>),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The variant name, used in type-conversion error messages.
    pub(crate) fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::I64(_) => "I64",
            Self::U64(_) => "U64",
            Self::F64(_) => "F64",
            Self::String(_) => "String",
            Self::Bytes(_) => "Bytes",
        }
    }

    pub fn to_bool(self) -> Result<bool> {
        match self {
            Self::Bool(v) => Ok(v),
            _ => Err(Error::type_conversion(&self, "bool")),
        }
    }

    pub fn to_i64(self) -> Result<i64> {
        match self {
            Self::I64(v) => Ok(v),
            Self::U64(v) => i64::try_from(v).map_err(|_| Error::type_conversion(&self, "i64")),
            _ => Err(Error::type_conversion(&self, "i64")),
        }
    }

    pub fn to_u64(self) -> Result<u64> {
        match self {
            Self::U64(v) => Ok(v),
            Self::I64(v) => u64::try_from(v).map_err(|_| Error::type_conversion(&self, "u64")),
            _ => Err(Error::type_conversion(&self, "u64")),
        }
    }

    pub fn to_f64(self) -> Result<f64> {
        match self {
            Self::F64(v) => Ok(v),
            _ => Err(Error::type_conversion(&self, "f64")),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn to_string(self) -> Result<String> {
        match self {
            Self::String(v) => Ok(v),
            _ => Err(Error::type_conversion(&self, "String")),
        }
    }

    pub fn to_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(v) => Ok(v),
            _ => Err(Error::type_conversion(&self, "Vec<u8>")),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            Self::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I64(src.into())
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<u32> for Value {
    fn from(src: u32) -> Self {
        Self::U64(src.into())
    }
}

impl From<u64> for Value {
    fn from(src: u64) -> Self {
        Self::U64(src)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_owned())
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<Vec<u8>> for Value {
    fn from(src: Vec<u8>) -> Self {
        Self::Bytes(src)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(src: Option<T>) -> Self {
        match src {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_crossings() {
        assert_eq!(Value::U64(7).to_i64().unwrap(), 7);
        assert_eq!(Value::I64(7).to_u64().unwrap(), 7);
        assert!(Value::U64(u64::MAX).to_i64().is_err());
        assert!(Value::I64(-1).to_u64().is_err());
    }

    #[test]
    fn mismatch_is_type_conversion() {
        let err = Value::String("x".into()).to_i64().unwrap_err();
        assert!(err.is_type_conversion());
        assert_eq!(err.to_string(), "cannot convert String to i64");
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::I64(3));
    }
}
