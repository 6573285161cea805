use super::Error;

/// Error when a directory lookup misses: no directory has been registered
/// for the requested table.
#[derive(Debug)]
pub(super) struct NotRegisteredError {
    table: Box<str>,
}

impl std::error::Error for NotRegisteredError {}

impl core::fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "no directory registered for table `{}`", self.table)
    }
}

impl Error {
    /// Creates a not-registered error for the given table.
    pub fn not_registered(table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NotRegistered(NotRegisteredError {
            table: table.into().into(),
        }))
    }

    /// Returns `true` if this error is a not-registered error.
    pub fn is_not_registered(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NotRegistered(_))
    }
}
