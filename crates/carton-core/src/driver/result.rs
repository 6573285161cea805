use crate::stmt::{Row, RowStream};
use crate::Result;

/// Describes one column of a result set: where it came from and what it is
/// called. Joined results carry field definitions from every participating
/// table, which is what lets the mapping layer split them apart again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Name of the database (schema) the column belongs to.
    pub database: String,

    /// Name of the originating table.
    pub table: String,

    /// Column name as reported by the driver.
    pub column: String,
}

impl FieldDef {
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Row data attached to a query result.
#[derive(Debug)]
pub enum Rows {
    /// The statement returned no row data (INSERT, UPDATE, DELETE, DDL).
    None,

    /// Fully buffered row data.
    Buffered(Vec<Row>),

    /// Row data still streaming from the driver.
    Stream(RowStream),
}

impl Rows {
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

/// The result of executing one statement through the client.
#[derive(Debug)]
pub struct QueryResult {
    /// Number of rows affected by the statement.
    pub affected_rows: u64,

    /// Number of warnings the server attached to the statement.
    pub warnings: u16,

    /// Identifier assigned by the server for an auto-increment insert.
    pub insert_id: Option<u64>,

    /// Ordered field definitions for row-returning statements.
    pub fields: Vec<FieldDef>,

    /// Row data, if any.
    pub rows: Rows,
}

impl QueryResult {
    /// A result carrying only an affected-row count.
    pub fn of_count(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            warnings: 0,
            insert_id: None,
            fields: vec![],
            rows: Rows::None,
        }
    }

    /// A buffered, row-returning result.
    pub fn of_rows(fields: Vec<FieldDef>, rows: Vec<Row>) -> Self {
        Self {
            affected_rows: rows.len() as u64,
            warnings: 0,
            insert_id: None,
            fields,
            rows: Rows::Buffered(rows),
        }
    }

    /// Awaits a streaming result into its buffered form. Buffered and
    /// row-less results pass through unchanged.
    pub async fn buffer(self) -> Result<Self> {
        match self.rows {
            Rows::Stream(stream) => {
                let rows = stream.collect().await?;
                Ok(Self {
                    rows: Rows::Buffered(rows),
                    ..self
                })
            }
            _ => Ok(self),
        }
    }

    /// The buffered rows, or `None` for row-less and still-streaming
    /// results.
    pub fn buffered_rows(&self) -> Option<&[Row]> {
        match &self.rows {
            Rows::Buffered(rows) => Some(rows),
            _ => None,
        }
    }

    /// Field definitions originating from the given table.
    pub fn fields_of_table<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a FieldDef> {
        self.fields.iter().filter(move |f| f.table == table)
    }
}
