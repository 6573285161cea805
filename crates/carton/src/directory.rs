use crate::collection::{AnyCollection, AnyRecord};
use crate::driver::QueryResult;
use crate::mapping::TableMapping;
use crate::repository::Repository;
use crate::stmt::{Row, Value};
use crate::{async_trait, Result};

/// The per-table gateway registered with a [`Repository`].
///
/// A directory is the only component that issues queries. This trait is the
/// object-safe surface the repository routes through; the concrete
/// [`SqlDirectory`](crate::sql::SqlDirectory) additionally exposes the
/// typed operations application code calls directly.
#[async_trait]
pub trait Directory: std::fmt::Debug + Send + Sync + 'static {
    /// The table this directory serves.
    fn table(&self) -> &'static str;

    /// Derives the table mapping for the served record type. Invoked once,
    /// at registration time.
    fn build_mapping(&self) -> Result<TableMapping>;

    /// Materializes one record from a row. Used to build the nested side of
    /// a preload from a sliced join row.
    fn build_record(&self, repository: &Repository, row: &Row) -> Result<AnyRecord>;

    /// Turns a buffered, row-returning result into a collection. This is
    /// what the repository's result chokepoint calls.
    fn build_collection(&self, repository: &Repository, result: QueryResult)
        -> Result<AnyCollection>;

    /// Fetches at most one record by column value. Used by lazy foreign-key
    /// resolution.
    async fn fetch_record(
        &self,
        repository: &Repository,
        column: &str,
        value: Value,
    ) -> Result<Option<AnyRecord>>;

    /// Inserts one row of field-or-column keyed values.
    async fn insert_row(&self, repository: &Repository, data: Row) -> Result<AnyCollection>;

    /// Updates the rows matching `column = value` and re-fetches the
    /// current row state.
    async fn update_rows(
        &self,
        repository: &Repository,
        data: Row,
        column: &str,
        value: Value,
    ) -> Result<AnyCollection>;

    /// Deletes the rows matching `column = value`. Returns the raw driver
    /// result; no schema wrapping.
    async fn delete_rows(
        &self,
        repository: &Repository,
        column: &str,
        value: Value,
    ) -> Result<QueryResult>;
}
