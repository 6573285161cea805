use super::Error;

/// Error when a keyed operation (update, delete, fetch by identifier) is
/// invoked on a schema whose definition declares no identifier column.
#[derive(Debug)]
pub(super) struct NoIdentifierError {
    table: Box<str>,
}

impl std::error::Error for NoIdentifierError {}

impl core::fmt::Display for NoIdentifierError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "table `{}` has no identifier column", self.table)
    }
}

impl Error {
    /// Creates a no-identifier error for the given table.
    pub fn no_identifier(table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NoIdentifier(NoIdentifierError {
            table: table.into().into(),
        }))
    }

    /// Returns `true` if this error is a no-identifier error.
    pub fn is_no_identifier(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NoIdentifier(_))
    }
}
