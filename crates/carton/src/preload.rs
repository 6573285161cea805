use crate::column::{ColumnDefinition, FetchMode};

/// An eagerly-joined foreign-key relationship.
///
/// Derived once per table from the column definitions flagged
/// [`FetchMode::Always`] and cached on the table mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preload {
    foreign_table: String,
    foreign_key: String,
    local_column: String,
}

impl Preload {
    /// Derives a preload from a column definition, if the column is an
    /// always-fetch foreign key.
    pub fn from_column(column: &ColumnDefinition) -> Option<Self> {
        let foreign = column.foreign()?;
        if foreign.fetch() != FetchMode::Always {
            return None;
        }
        Some(Self {
            foreign_table: foreign.table().to_owned(),
            foreign_key: foreign.key().to_owned(),
            local_column: column.name().to_owned(),
        })
    }

    /// The table the relationship points at.
    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    /// The key column on the foreign table.
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    /// The foreign-key column on the owning table.
    pub fn local_column(&self) -> &str {
        &self.local_column
    }
}
