mod convert;
use convert::{from_query_values, to_query_value};

use crate::collection::{AnyCollection, AnyRecord};
use crate::directory::Directory;
use crate::driver::{IsolationLevel, QueryResult, Rows};
use crate::mapping::TableMapping;
use crate::repository::{Executed, Repository};
use crate::schema::{Schema, SchemaExt};
use crate::stmt::{Row, Value};
use crate::{async_trait, Error, Result, SchemaCollection};

use sea_query::{Alias, Asterisk, Expr, MysqlQueryBuilder, OnConflict, Query, SimpleExpr};

use std::marker::PhantomData;

/// How a batched insert treats rows that collide with an existing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Keep the existing row, discard the colliding insert.
    DoNothing,

    /// Overwrite the named columns with the colliding row's values.
    UpdateColumns(Vec<String>),
}

/// Options for [`SqlDirectory::insert_all`].
#[derive(Debug, Clone, Default)]
pub struct InsertAllOptions {
    /// Isolation level for the batch transaction; the repository default
    /// when unset.
    pub isolation: Option<IsolationLevel>,

    /// Shorthand for `conflict_resolution = DoNothing`.
    pub ignore_conflict: bool,

    /// Explicit conflict strategy; takes precedence over `ignore_conflict`.
    pub conflict_resolution: Option<ConflictResolution>,
}

impl InsertAllOptions {
    fn effective_conflict(&self) -> Option<ConflictResolution> {
        self.conflict_resolution
            .clone()
            .or_else(|| self.ignore_conflict.then_some(ConflictResolution::DoNothing))
    }
}

/// The SQL implementation of the per-table gateway.
///
/// Builds every query through the external query builder, honors the
/// table's preloads on fetches, and applies the partial-vs-complete insert
/// decision (see [`insert`](Self::insert)).
pub struct SqlDirectory<R> {
    _record: PhantomData<R>,
}

impl<R> Default for SqlDirectory<R> {
    fn default() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R> Clone for SqlDirectory<R> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<R> std::fmt::Debug for SqlDirectory<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDirectory")
            .field("table", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R: Schema> SqlDirectory<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches by the identifier column.
    pub async fn fetch(
        &self,
        repository: &Repository,
        value: impl Into<Value> + Send,
    ) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        let identifier = mapping
            .identifier()
            .ok_or_else(|| Error::no_identifier(R::TABLE))?
            .to_owned();
        self.fetch_by(repository, &identifier, value).await
    }

    /// Fetches by an arbitrary column (or field) name, joining in the
    /// table's preloads.
    pub async fn fetch_by(
        &self,
        repository: &Repository,
        column: &str,
        value: impl Into<Value> + Send,
    ) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        let column = mapping.canonical_column(column)?.to_owned();
        let (sql, params) = self.select_sql(repository, &mapping, Some((&column, value.into())))?;

        let collection = self.run_select(repository, &sql, &params).await?;
        self.handle_preload_result(repository, collection)
    }

    /// Fetches every row of the table, joining in the table's preloads.
    pub async fn fetch_all(&self, repository: &Repository) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        let (sql, params) = self.select_sql(repository, &mapping, None)?;

        let collection = self.run_select(repository, &sql, &params).await?;
        self.handle_preload_result(repository, collection)
    }

    /// Inserts one row of field-or-column keyed values.
    ///
    /// The result depends on how complete the supplied data is:
    /// - no identifier column declared: the record is built directly from
    ///   the supplied values;
    /// - all columns (or all but the identifier) supplied: built directly,
    ///   with the driver-assigned insert id injected into the identifier;
    /// - otherwise: if the driver assigned an insert id, the full row is
    ///   re-fetched by it, since server-side defaults are unknown to the
    ///   client; without an insert id the partial data is used as-is.
    pub async fn insert(&self, repository: &Repository, data: Row) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        let canonical = canonicalize(&mapping, data)?;
        if canonical.is_empty() {
            return Err(Error::empty_insert(R::TABLE));
        }

        let columns: Vec<String> = canonical.keys().cloned().collect();
        let (sql, params) = build_insert(&mapping, &columns, Some(&canonical), None)?;
        tracing::debug!(table = R::TABLE, sql = %sql, param_count = params.len(), "insert");

        let result = repository.execute(&sql, &params).await?.into_raw()?;
        self.finish_insert(repository, canonical, result).await
    }

    /// Inserts a batch of rows inside one transaction.
    ///
    /// A single statement covering the union of the batch's columns is
    /// prepared once and executed once per row, in order; rows missing a
    /// column relative to the union bind null. Any failure rolls the whole
    /// transaction back and propagates the driver error.
    pub async fn insert_all(
        &self,
        repository: &Repository,
        rows: Vec<Row>,
        options: InsertAllOptions,
    ) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        if rows.is_empty() {
            return Err(Error::empty_insert(R::TABLE));
        }

        let mut canonical_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let canonical = canonicalize(&mapping, row)?;
            if canonical.is_empty() {
                return Err(Error::empty_insert(R::TABLE));
            }
            canonical_rows.push(canonical);
        }

        // Union of the batch's columns, in first-seen order.
        let mut columns: Vec<String> = vec![];
        for row in &canonical_rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let conflict = options.effective_conflict();
        let (sql, _) = build_insert(&mapping, &columns, None, conflict.as_ref())?;
        tracing::debug!(
            table = R::TABLE,
            sql = %sql,
            rows = canonical_rows.len(),
            "batch insert"
        );

        let mut transaction = repository.begin_transaction(options.isolation).await?;
        let mut statement = transaction.prepare(&sql).await?;

        let outcome: Result<(Vec<R>, QueryResult)> = async {
            let mut schemas = Vec::with_capacity(canonical_rows.len());
            let mut affected_rows = 0;
            let mut warnings = 0;
            let mut insert_id = None;

            for row in canonical_rows {
                let params: Vec<Value> = columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect();

                let result = statement.execute(&params).await?.into_raw()?;
                affected_rows += result.affected_rows;
                warnings += result.warnings;
                if result.insert_id.is_some() {
                    insert_id = result.insert_id;
                }

                let single = self.finish_insert(repository, row, result).await?;
                schemas.extend(single);
            }

            let result = QueryResult {
                affected_rows,
                warnings,
                insert_id,
                fields: vec![],
                rows: Rows::None,
            };
            Ok((schemas, result))
        }
        .await;

        match outcome {
            Ok((schemas, result)) => {
                transaction.commit().await?;
                Ok(SchemaCollection::new(schemas, result))
            }
            Err(err) => {
                let _ = transaction.rollback().await;
                Err(err)
            }
        }
    }

    /// Updates the rows matching `column = value`, then re-fetches by the
    /// same key to return the current row state, since the update result
    /// itself carries no row data.
    pub async fn update(
        &self,
        repository: &Repository,
        data: Row,
        column: &str,
        value: impl Into<Value> + Send,
    ) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        let canonical = canonicalize(&mapping, data)?;
        if canonical.is_empty() {
            return Err(Error::empty_insert(R::TABLE));
        }
        let column = mapping.canonical_column(column)?.to_owned();
        let value = value.into();

        let mut statement = Query::update();
        statement.table(Alias::new(R::TABLE));
        for (col, val) in &canonical {
            statement.value(Alias::new(col.as_str()), to_query_value(val));
        }
        statement.and_where(Expr::col(Alias::new(column.as_str())).eq(to_query_value(&value)));

        let (sql, values) = statement.build(MysqlQueryBuilder);
        let params = from_query_values(values)?;
        tracing::debug!(table = R::TABLE, sql = %sql, param_count = params.len(), "update");

        repository.execute(&sql, &params).await?.into_raw()?;
        self.fetch_by(repository, &column, value).await
    }

    /// Deletes by the identifier column.
    pub async fn delete(
        &self,
        repository: &Repository,
        value: impl Into<Value> + Send,
    ) -> Result<QueryResult> {
        let mapping = repository.mapping(R::TABLE)?;
        let identifier = mapping
            .identifier()
            .ok_or_else(|| Error::no_identifier(R::TABLE))?
            .to_owned();
        self.delete_by(repository, &identifier, value).await
    }

    /// Deletes the rows matching `column = value`. Returns the raw driver
    /// result; deletes are never schema-wrapped.
    pub async fn delete_by(
        &self,
        repository: &Repository,
        column: &str,
        value: impl Into<Value> + Send,
    ) -> Result<QueryResult> {
        let mapping = repository.mapping(R::TABLE)?;
        let column = mapping.canonical_column(column)?.to_owned();

        let mut statement = Query::delete();
        statement.from_table(Alias::new(R::TABLE));
        statement
            .and_where(Expr::col(Alias::new(column.as_str())).eq(to_query_value(&value.into())));

        let (sql, values) = statement.build(MysqlQueryBuilder);
        let params = from_query_values(values)?;
        tracing::debug!(table = R::TABLE, sql = %sql, "delete");

        repository.execute(&sql, &params).await?.into_raw()
    }

    /// Builds one record per buffered row.
    pub fn build_schemas(
        &self,
        repository: &Repository,
        result: QueryResult,
    ) -> Result<SchemaCollection<R>> {
        let schemas = {
            let rows = result.buffered_rows().ok_or_else(|| {
                Error::invalid_result("cannot build schemas from an unbuffered result")
            })?;
            rows.iter()
                .map(|row| R::build(repository, row))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(SchemaCollection::new(schemas, result))
    }

    /// Splits a joined, multi-table result back into per-record single-row
    /// views and drives each record's preload hook, then re-validates.
    fn handle_preload_result(
        &self,
        repository: &Repository,
        mut collection: SchemaCollection<R>,
    ) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;
        let preloads = mapping.preloads();
        if preloads.is_empty() || collection.is_empty() {
            return Ok(collection);
        }

        let singles: Vec<QueryResult> = {
            let result = collection.result();
            let rows = result.buffered_rows().unwrap_or(&[]);
            rows.iter()
                .map(|row| QueryResult {
                    affected_rows: result.affected_rows,
                    warnings: result.warnings,
                    insert_id: result.insert_id,
                    fields: result.fields.clone(),
                    rows: Rows::Buffered(vec![row.clone()]),
                })
                .collect()
        };

        for (schema, single) in collection.schemas_mut().iter_mut().zip(&singles) {
            schema.after_preload_hook(repository, single, preloads)?;
            schema.validate()?;
        }

        Ok(collection)
    }

    async fn run_select(
        &self,
        repository: &Repository,
        sql: &str,
        params: &[Value],
    ) -> Result<SchemaCollection<R>> {
        tracing::debug!(table = R::TABLE, sql = %sql, param_count = params.len(), "select");
        match repository.execute(sql, params).await? {
            Executed::Collection(collection) => collection.into_typed::<R>(),
            // Empty results pass the chokepoint unwrapped.
            Executed::Raw(result) => Ok(SchemaCollection::new(vec![], result)),
        }
    }

    /// `SELECT table.*, preload columns FROM table LEFT JOIN ... [WHERE]`.
    ///
    /// Every preload target must have a registered sibling directory; its
    /// mapping supplies the joined column list.
    fn select_sql(
        &self,
        repository: &Repository,
        mapping: &TableMapping,
        filter: Option<(&str, Value)>,
    ) -> Result<(String, Vec<Value>)> {
        let mut statement = Query::select();
        statement.from(Alias::new(R::TABLE));
        statement.column((Alias::new(R::TABLE), Asterisk));

        for preload in mapping.preloads() {
            let foreign_mapping = repository.mapping(preload.foreign_table())?;
            for column in foreign_mapping.columns() {
                statement.column((
                    Alias::new(preload.foreign_table()),
                    Alias::new(column.name()),
                ));
            }
            statement.left_join(
                Alias::new(preload.foreign_table()),
                Expr::col((Alias::new(R::TABLE), Alias::new(preload.local_column()))).equals((
                    Alias::new(preload.foreign_table()),
                    Alias::new(preload.foreign_key()),
                )),
            );
        }

        if let Some((column, value)) = filter {
            statement.and_where(
                Expr::col((Alias::new(R::TABLE), Alias::new(column))).eq(to_query_value(&value)),
            );
        }

        let (sql, values) = statement.build(MysqlQueryBuilder);
        Ok((sql, from_query_values(values)?))
    }

    /// Applies the three-way build-or-refetch decision to one insert
    /// result.
    async fn finish_insert(
        &self,
        repository: &Repository,
        mut canonical: Row,
        result: QueryResult,
    ) -> Result<SchemaCollection<R>> {
        let mapping = repository.mapping(R::TABLE)?;

        let Some(identifier) = mapping.identifier().map(str::to_owned) else {
            return self.collection_from_row(repository, &canonical, result);
        };

        if canonical.len() + 1 >= mapping.columns().len() {
            if let Some(insert_id) = result.insert_id {
                canonical.insert(identifier, Value::U64(insert_id));
            }
            return self.collection_from_row(repository, &canonical, result);
        }

        match result.insert_id {
            // Partial data: only a re-fetch yields the server defaults.
            Some(insert_id) => self.fetch(repository, Value::U64(insert_id)).await,
            None => self.collection_from_row(repository, &canonical, result),
        }
    }

    fn collection_from_row(
        &self,
        repository: &Repository,
        row: &Row,
        result: QueryResult,
    ) -> Result<SchemaCollection<R>> {
        let record = R::build(repository, row)?;
        Ok(SchemaCollection::single(record, result))
    }
}

#[async_trait]
impl<R: Schema> Directory for SqlDirectory<R> {
    fn table(&self) -> &'static str {
        R::TABLE
    }

    fn build_mapping(&self) -> Result<TableMapping> {
        TableMapping::build::<R>()
    }

    fn build_record(&self, repository: &Repository, row: &Row) -> Result<AnyRecord> {
        Ok(AnyRecord::new(R::build(repository, row)?))
    }

    fn build_collection(
        &self,
        repository: &Repository,
        result: QueryResult,
    ) -> Result<AnyCollection> {
        Ok(AnyCollection::new(self.build_schemas(repository, result)?))
    }

    async fn fetch_record(
        &self,
        repository: &Repository,
        column: &str,
        value: Value,
    ) -> Result<Option<AnyRecord>> {
        let collection = self.fetch_by(repository, column, value).await?;
        let (schemas, _) = collection.into_parts();
        Ok(schemas.into_iter().next().map(AnyRecord::new))
    }

    async fn insert_row(&self, repository: &Repository, data: Row) -> Result<AnyCollection> {
        Ok(AnyCollection::new(self.insert(repository, data).await?))
    }

    async fn update_rows(
        &self,
        repository: &Repository,
        data: Row,
        column: &str,
        value: Value,
    ) -> Result<AnyCollection> {
        Ok(AnyCollection::new(
            self.update(repository, data, column, value).await?,
        ))
    }

    async fn delete_rows(
        &self,
        repository: &Repository,
        column: &str,
        value: Value,
    ) -> Result<QueryResult> {
        self.delete_by(repository, column, value).await
    }
}

/// Maps caller-supplied field-or-column keys to canonical column names.
fn canonicalize(mapping: &TableMapping, data: Row) -> Result<Row> {
    let mut canonical = Row::with_capacity(data.len());
    for (key, value) in data {
        let column = mapping.canonical_column(&key)?.to_owned();
        canonical.insert(column, value);
    }
    Ok(canonical)
}

/// Builds a parameterized `INSERT`. With `row` set, the parameters carry
/// that row's values; without, every column binds null and the caller is
/// preparing a statement template it will execute per row.
fn build_insert(
    mapping: &TableMapping,
    columns: &[String],
    row: Option<&Row>,
    conflict: Option<&ConflictResolution>,
) -> Result<(String, Vec<Value>)> {
    let mut statement = Query::insert();
    statement.into_table(Alias::new(mapping.table()));
    statement.columns(columns.iter().map(|c| Alias::new(c.as_str())));

    let exprs: Vec<SimpleExpr> = columns
        .iter()
        .map(|column| {
            let value = row
                .and_then(|row| row.get(column))
                .cloned()
                .unwrap_or(Value::Null);
            SimpleExpr::Value(to_query_value(&value))
        })
        .collect();
    statement.values_panic(exprs);

    if let Some(resolution) = conflict {
        statement.on_conflict(build_conflict(mapping, resolution));
    }

    let (sql, values) = statement.build(MysqlQueryBuilder);
    Ok((sql, from_query_values(values)?))
}

/// Conflicts target the primary-key columns; for a keyless table the first
/// declared column stands in.
fn build_conflict(mapping: &TableMapping, resolution: &ConflictResolution) -> OnConflict {
    let mut targets: Vec<Alias> = mapping
        .columns()
        .iter()
        .filter(|c| c.is_primary())
        .map(|c| Alias::new(c.name()))
        .collect();
    if targets.is_empty() {
        if let Some(first) = mapping.columns().first() {
            targets.push(Alias::new(first.name()));
        }
    }

    match resolution {
        ConflictResolution::DoNothing => OnConflict::columns(targets).do_nothing().to_owned(),
        ConflictResolution::UpdateColumns(columns) => OnConflict::columns(targets)
            .update_columns(columns.iter().map(|c| Alias::new(c.as_str())))
            .to_owned(),
    }
}
