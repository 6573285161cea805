use crate::schema::Schema;
use crate::stmt::Value;
use crate::{Error, Result};

/// Conversion from a driver [`Value`] into a native field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Conversion from a native field type into a driver [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! value_round_trip {
    ($ty:ty, $to:ident, $variant:ident) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                value.$to()
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

value_round_trip!(bool, to_bool, Bool);
value_round_trip!(i64, to_i64, I64);
value_round_trip!(u64, to_u64, U64);
value_round_trip!(f64, to_f64, F64);
value_round_trip!(String, to_string, String);
value_round_trip!(Vec<u8>, to_bytes, Bytes);

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = value.clone().to_i64()?;
        wide.try_into()
            .map_err(|_| Error::type_conversion(&value, "i32"))
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::I64(self.into())
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = value.clone().to_u64()?;
        wide.try_into()
            .map_err(|_| Error::type_conversion(&value, "u32"))
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::U64(self.into())
    }
}

/// One scalar record field.
///
/// `Unset` marks a column that was absent from the originating row: joined
/// and partial results leave fields unset rather than defaulting them to
/// null, so an unset field never round-trips back into a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Unset,
    Null,
    Set(T),
}

impl<T> Field<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn set(&mut self, value: T) {
        *self = Self::Set(value);
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

impl<T> Field<T>
where
    T: FromValue + IntoValue + Clone,
{
    /// Assigns a raw row value to this field.
    pub fn assign(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Null => Self::Null,
            value => Self::Set(T::from_value(value)?),
        };
        Ok(())
    }

    /// The field as a driver value; `None` when unset.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Unset => None,
            Self::Null => Some(Value::Null),
            Self::Set(value) => Some(value.clone().into_value()),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}

/// One foreign-key record field, carrying its resolution state explicitly.
///
/// A freshly built record holds the raw key (`Raw`); preloading or lazy
/// resolution upgrades the field to `Loaded`, keeping the key alongside the
/// nested record so the field still serializes as the key value.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignField<T> {
    Unset,
    Raw(Value),
    Loaded { key: Value, record: Box<T> },
}

impl<T> Default for ForeignField<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: Schema> ForeignField<T> {
    /// Assigns the raw key value from a row.
    pub fn assign(&mut self, value: Value) {
        *self = Self::Raw(value);
    }

    /// Upgrades the field to its resolved state.
    pub fn load(&mut self, key: Value, record: T) {
        *self = Self::Loaded {
            key,
            record: Box::new(record),
        };
    }

    /// The key as a driver value; `None` when unset.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Unset => None,
            Self::Raw(value) => Some(value.clone()),
            Self::Loaded { key, .. } => Some(key.clone()),
        }
    }

    pub fn key(&self) -> Option<&Value> {
        match self {
            Self::Unset => None,
            Self::Raw(value) => Some(value),
            Self::Loaded { key, .. } => Some(key),
        }
    }

    /// The nested record, once resolved.
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Loaded { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// True when the field holds a non-null key that has not been resolved
    /// yet.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Raw(value) if !value.is_null())
    }
}
