use super::Error;

/// Error when a caller supplies a field or column name that is not part of
/// the table's mapping.
#[derive(Debug)]
pub(super) struct UnknownFieldError {
    table: Box<str>,
    field: Box<str>,
}

impl std::error::Error for UnknownFieldError {}

impl core::fmt::Display for UnknownFieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unknown field `{}` for table `{}`", self.field, self.table)
    }
}

impl Error {
    /// Creates an unknown-field error for the given table and field name.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownField(UnknownFieldError {
            table: table.into().into(),
            field: field.into().into(),
        }))
    }

    /// Returns `true` if this error is an unknown-field error.
    pub fn is_unknown_field(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnknownField(_))
    }
}
