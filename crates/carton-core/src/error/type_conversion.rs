use super::Error;
use crate::stmt::Value;

/// Error when a [`Value`] cannot be converted to the requested native type.
#[derive(Debug)]
pub(super) struct TypeConversionError {
    variant: &'static str,
    target: &'static str,
}

impl std::error::Error for TypeConversionError {}

impl core::fmt::Display for TypeConversionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cannot convert {} to {}", self.variant, self.target)
    }
}

impl Error {
    /// Creates a type-conversion error for the given value and target type
    /// name.
    pub fn type_conversion(value: &Value, target: &'static str) -> Error {
        Error::from(super::ErrorKind::TypeConversion(TypeConversionError {
            variant: value.variant_name(),
            target,
        }))
    }

    /// Returns `true` if this error is a type-conversion error.
    pub fn is_type_conversion(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TypeConversion(_))
    }
}
