use crate::column::ColumnDefinition;
use crate::preload::Preload;
use crate::schema::Schema;
use crate::{Error, Result};

use indexmap::IndexMap;

/// The cached translation rules for one table: the ordered column
/// definitions, the bidirectional column-name ↔ field-name map, the
/// identifier column, and the derived preload list.
///
/// A mapping is built exactly once, when the table's directory is
/// registered with a repository, and is never rebuilt. Construction fails
/// if any declared column has no corresponding field on the record type.
#[derive(Debug)]
pub struct TableMapping {
    table: String,
    columns: Vec<ColumnDefinition>,
    column_to_field: IndexMap<String, String>,
    field_to_column: IndexMap<String, String>,
    identifier: Option<String>,
    preloads: Vec<Preload>,
}

impl TableMapping {
    /// Derives the mapping for record type `R` from its declared column
    /// definitions and field descriptors.
    pub fn build<R: Schema>() -> Result<Self> {
        let columns = R::definition();
        let descriptors = R::fields();

        let mut column_to_field = IndexMap::with_capacity(columns.len());
        let mut field_to_column = IndexMap::with_capacity(columns.len());

        for column in &columns {
            if column.table() != R::TABLE {
                return Err(Error::configuration(format!(
                    "column `{}` belongs to table `{}`, not `{}`",
                    column.name(),
                    column.table(),
                    R::TABLE,
                )));
            }

            let field = column.field_name();
            if !descriptors.iter().any(|d| d.field() == field) {
                return Err(Error::configuration(format!(
                    "record type for table `{}` has no field `{}` for column `{}`",
                    R::TABLE,
                    field,
                    column.name(),
                )));
            }
            if column_to_field.contains_key(column.name()) {
                return Err(Error::configuration(format!(
                    "column `{}` is declared twice for table `{}`",
                    column.name(),
                    R::TABLE,
                )));
            }

            column_to_field.insert(column.name().to_owned(), field.clone());
            field_to_column.insert(field, column.name().to_owned());
        }

        let identifier = columns
            .iter()
            .find(|c| c.is_primary() && !c.is_composite())
            .map(|c| c.name().to_owned());

        let preloads = columns.iter().filter_map(Preload::from_column).collect();

        Ok(Self {
            table: R::TABLE.to_owned(),
            columns,
            column_to_field,
            field_to_column,
            identifier,
            preloads,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The ordered column definitions the mapping was built from.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// The identifier column, if the definition declares one.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// The cached preload list: one entry per always-fetch foreign key.
    pub fn preloads(&self) -> &[Preload] {
        &self.preloads
    }

    pub fn field_for_column(&self, column: &str) -> Option<&str> {
        self.column_to_field.get(column).map(String::as_str)
    }

    pub fn column_for_field(&self, field: &str) -> Option<&str> {
        self.field_to_column.get(field).map(String::as_str)
    }

    /// Ordered `(column, field)` pairs.
    pub fn column_field_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.column_to_field
            .iter()
            .map(|(c, f)| (c.as_str(), f.as_str()))
    }

    /// Resolves a caller-supplied key, which may be either a column name or
    /// a field name, to the canonical column name.
    pub fn canonical_column<'a>(&'a self, key: &'a str) -> Result<&'a str> {
        if self.column_to_field.contains_key(key) {
            return Ok(key);
        }
        if let Some(column) = self.column_for_field(key) {
            return Ok(column);
        }
        Err(Error::unknown_field(&self.table, key))
    }
}
