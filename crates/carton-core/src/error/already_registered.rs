use super::Error;

/// Error when a directory is registered for a table that already has one.
#[derive(Debug)]
pub(super) struct AlreadyRegisteredError {
    table: Box<str>,
}

impl std::error::Error for AlreadyRegisteredError {}

impl core::fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "a directory is already registered for table `{}`",
            self.table
        )
    }
}

impl Error {
    /// Creates an already-registered error for the given table.
    pub fn already_registered(table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::AlreadyRegistered(AlreadyRegisteredError {
            table: table.into().into(),
        }))
    }

    /// Returns `true` if this error is an already-registered error.
    pub fn is_already_registered(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::AlreadyRegistered(_))
    }
}
